//! Execution context
//!
//! A pipeline binary runs either on a developer machine (local) or inside a
//! task container started by the orchestrator (remote). The context decides
//! where task outputs are placed and how resource handles locate their data.
//! It is chosen once per process and passed explicitly to everything that
//! depends on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Running on a workstation; outputs go to a private scratch directory
    #[default]
    Local,
    /// Running inside an orchestrator task container
    Remote,
}

impl ExecutionContext {
    pub fn is_remote(self) -> bool {
        matches!(self, ExecutionContext::Remote)
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Local => write!(f, "local"),
            ExecutionContext::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for ExecutionContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "false" | "0" | "no" | "n" | "off" | "" => Ok(ExecutionContext::Local),
            "remote" | "concourse" | "true" | "1" | "yes" | "y" | "on" => {
                Ok(ExecutionContext::Remote)
            }
            other => Err(format!("unknown execution context '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local() {
        assert_eq!(ExecutionContext::default(), ExecutionContext::Local);
        assert!(!ExecutionContext::default().is_remote());
    }

    #[test]
    fn test_parse() {
        assert_eq!("remote".parse::<ExecutionContext>(), Ok(ExecutionContext::Remote));
        assert_eq!("TRUE".parse::<ExecutionContext>(), Ok(ExecutionContext::Remote));
        assert_eq!("0".parse::<ExecutionContext>(), Ok(ExecutionContext::Local));
        assert!("sometimes".parse::<ExecutionContext>().is_err());
    }

    #[test]
    fn test_parse_accepts_flag_style_values() {
        for value in ["yes", "on", "Y"] {
            assert_eq!(value.parse::<ExecutionContext>(), Ok(ExecutionContext::Remote));
        }
        for value in ["no", "off", "n"] {
            assert_eq!(value.parse::<ExecutionContext>(), Ok(ExecutionContext::Local));
        }
    }
}
