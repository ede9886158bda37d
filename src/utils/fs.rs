//! File system and console input helpers
//!
//! Reads source text with logging, and computes source labels.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Utility struct for reading sources
#[derive(Debug, Clone, Copy)]
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Read file contents as string
    #[instrument(skip(self))]
    pub fn read_file_to_string<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<String> {
        let path = path.as_ref();
        debug!("Reading file: {}", path.display());
        fs::read_to_string(path)
    }

    /// Read all of standard input as a string
    #[instrument(skip(self))]
    pub fn read_stdin_to_string(&self) -> io::Result<String> {
        let mut text = String::new();
        io::stdin().lock().read_to_string(&mut text)?;
        debug!("Read {} bytes from stdin", text.len());
        Ok(text)
    }

    /// Absolute form of `path`, resolved against the current directory
    pub fn absolute<P: AsRef<Path>>(&self, path: P) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }

    /// Label for `path` relative to `root`, with `/` separators
    pub fn relative_label(&self, root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        parts.join("/")
    }
}

impl Default for FileSystemUtils {
    fn default() -> Self {
        Self::new()
    }
}
