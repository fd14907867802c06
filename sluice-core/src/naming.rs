//! Naming conventions shared by the engine and the document

/// Directory holding cached task results; also a task input/output so the
/// cache travels between the tasks of one orchestrator job
pub const CACHE_DIR: &str = "tasks";

/// Directory the pipeline entrypoint is provisioned into inside task containers
pub const SCRIPT_DIR: &str = "scripts";

/// Canonical dash-case form of a job or task name
pub fn normalize_name(name: &str) -> String {
    name.trim().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("set_dev_version"), "set-dev-version");
        assert_eq!(normalize_name("set-dev-version"), "set-dev-version");
        assert_eq!(normalize_name(" build "), "build");
    }
}
