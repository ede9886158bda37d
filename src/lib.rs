//! # csmin
//!
//! Command-line front end for a C# minifier. This library resolves textual
//! sources (standard input, explicit files, or include/exclude globs under a
//! root directory), parses a strict command-line grammar and dispatches to
//! the `min`, `help`, `tokens`, `hash`, `color` and `glob` commands.
//!
//! ## Features
//!
//! - Strict option parsing: once the positional tail starts, everything
//!   after it is positional, even tokens that look like options
//! - Lazy source resolution with a pluggable content reader
//! - Glob mode with `!`-prefixed exclude patterns
//!
//! ## Example
//!
//! ```no_run
//! use csmin::core::sources::read_sources;
//!
//! let files = vec!["Program.cs".to_string()];
//! for source in read_sources(&files, None) {
//!     let source = source?;
//!     println!("{}: {} bytes", source.label, source.content.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod minifier;
pub mod utils;

use anyhow::Result;
use std::fmt;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Environment variable holding log filter directives
pub const LOG_ENV: &str = "CSMIN_LOG";

/// Handle for changing the log filter after logging is initialized
#[derive(Clone)]
pub struct LogHandle(reload::Handle<EnvFilter, Registry>);

impl LogHandle {
    /// Switch the live filter to debug level
    pub fn enable_debug(&self) -> Result<()> {
        self.0
            .modify(|filter| *filter = EnvFilter::new("debug"))
            .map_err(|e| anyhow::anyhow!("Failed to raise log level: {}", e))
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogHandle")
    }
}

/// Initialize logging on stderr, filtered by `CSMIN_LOG` (default `warn`)
pub fn setup_logging() -> Result<LogHandle> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(LogHandle(handle))
}
