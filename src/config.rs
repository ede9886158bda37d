//! Per-invocation run context
//!
//! Holds the state that option actions write during parsing and that later
//! stages read: verbosity for error reporting, the inherited glob root, and
//! the log handle used by `--debug`.

use crate::{LogHandle, cli::options::Ref};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Status returned by the process on any uncaught failure
pub const FAILURE_STATUS: i32 = 0xBAD;

/// State threaded through parsing and dispatch for one invocation
#[derive(Debug, Default)]
pub struct RunContext {
    /// Report failures with their full chain
    pub verbose: Ref<bool>,
    /// Root directory for glob mode, inherited by subcommands
    pub glob_dir: Ref<Option<PathBuf>>,
    log: Option<LogHandle>,
}

impl RunContext {
    /// Create a context without a log handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context whose `--debug` option raises the log level
    pub fn with_log_handle(log: LogHandle) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    /// Raise logging to debug level, if logging was set up
    pub fn enable_debug(&self) {
        match &self.log {
            Some(handle) => {
                if let Err(e) = handle.enable_debug() {
                    warn!("{:#}", e);
                } else {
                    debug!("Debug logging enabled");
                }
            }
            None => debug!("Debug requested without a log handle"),
        }
    }

    /// Render a failure the way the process boundary reports it
    pub fn describe_failure(&self, error: &anyhow::Error) -> String {
        if self.verbose.get() {
            format!("{:?}", error)
        } else {
            error.root_cause().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CsminError;
    use std::io;

    fn failure() -> anyhow::Error {
        anyhow::Error::new(CsminError::io(
            "missing.cs",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        ))
        .context("Failed to read sources")
    }

    #[test]
    fn test_describe_failure_quiet() {
        let context = RunContext::new();
        assert_eq!(context.describe_failure(&failure()), "missing.cs: file not found");
    }

    #[test]
    fn test_describe_failure_verbose() {
        let context = RunContext::new();
        context.verbose.set(true);

        let message = context.describe_failure(&failure());
        assert!(message.starts_with("Failed to read sources"));
        assert!(message.contains("missing.cs: file not found"));
    }

    #[test]
    fn test_enable_debug_without_handle_is_noop() {
        RunContext::new().enable_debug();
    }
}
