//! Action strategies
//!
//! An [`Action`] is the capability the batch controller invokes per
//! candidate file. The returned code drives the status state machine:
//! `0` = success, `1..=9` = ignore (not a failure), `> 9` = hard failure.
//! A `Err` return is a failure of the action itself and propagates out of
//! the controller untouched.

use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Capability invoked once per processed file.
///
/// Receives the candidate path and its status key; implementations decide
/// what "processing" means (shelling out, extracting metadata, copying)
/// and report the outcome through the integer code.
pub trait Action {
    fn invoke(&mut self, path: &Path, key: &str) -> Result<i32>;
}

/// Any closure of the right shape is an action.
impl<F> Action for F
where
    F: FnMut(&Path, &str) -> Result<i32>,
{
    fn invoke(&mut self, path: &Path, key: &str) -> Result<i32> {
        self(path, key)
    }
}

/// Does nothing and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAction;

impl Action for NoopAction {
    fn invoke(&mut self, _path: &Path, _key: &str) -> Result<i32> {
        Ok(0)
    }
}

/// Logs the candidate and its key, then succeeds.
///
/// The injectable stand-in for a real action when only the bookkeeping is
/// wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAction;

impl Action for EchoAction {
    fn invoke(&mut self, path: &Path, key: &str) -> Result<i32> {
        info!(path = %path.display(), key, "echo");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_action_succeeds() {
        assert_eq!(NoopAction.invoke(Path::new("a"), "k").unwrap(), 0);
    }

    #[test]
    fn test_echo_action_succeeds() {
        assert_eq!(EchoAction.invoke(Path::new("a"), "k").unwrap(), 0);
    }

    #[test]
    fn test_closures_are_actions() {
        let mut seen = Vec::new();
        let mut action = |path: &Path, key: &str| -> Result<i32> {
            seen.push((path.to_path_buf(), key.to_string()));
            Ok(7)
        };
        assert_eq!(action.invoke(Path::new("x"), "k1").unwrap(), 7);
        assert_eq!(seen.len(), 1);
    }
}
