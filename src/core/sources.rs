//! Source resolution
//!
//! Turns positional tokens into a lazy, ordered sequence of labeled sources.
//! With no tokens the single source is standard input. Without a root
//! directory each non-empty token is a file path; with one, tokens are
//! include/exclude globs evaluated under it.

use crate::{
    core::glob::{GlobSpec, Matches},
    error::{CsminError, Result},
    utils::fs::FileSystemUtils,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Label of the source read from standard input
pub const STDIN_LABEL: &str = "STDIN";

/// A labeled unit of content to be processed by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry<T = String> {
    /// File path as given, path relative to the glob root, or `STDIN`
    pub label: String,
    /// Content produced by the reader
    pub content: T,
}

impl<T> SourceEntry<T> {
    /// Create a new source entry
    pub fn new(label: impl Into<String>, content: T) -> Self {
        Self {
            label: label.into(),
            content,
        }
    }
}

enum Mode<'a> {
    Files(std::slice::Iter<'a, String>),
    PendingGlob { root: PathBuf, spec: GlobSpec },
    Glob(Matches),
    Done,
}

/// Lazy sequence of sources; each entry is read only when pulled
pub struct Sources<'a, T, S, R> {
    stdin: Option<S>,
    reader: R,
    mode: Mode<'a>,
    fs_utils: FileSystemUtils,
    _content: std::marker::PhantomData<fn() -> T>,
}

/// Resolve `tokens` into sources, reading through the given readers.
///
/// `stdin` is called at most once, and only when `tokens` is empty.
/// `reader` receives a token as a path, or the full path of a glob match.
pub fn resolve<'a, T, S, R>(
    tokens: &'a [String],
    root: Option<&Path>,
    stdin: S,
    reader: R,
) -> Sources<'a, T, S, R>
where
    S: FnOnce() -> io::Result<T>,
    R: FnMut(&Path) -> io::Result<T>,
{
    let mode = match root {
        Some(root) => Mode::PendingGlob {
            root: root.to_path_buf(),
            spec: GlobSpec::from_tokens(tokens),
        },
        None => Mode::Files(tokens.iter()),
    };

    Sources {
        stdin: tokens.is_empty().then_some(stdin),
        reader,
        mode,
        fs_utils: FileSystemUtils::new(),
        _content: std::marker::PhantomData,
    }
}

/// Resolve `tokens` against the real standard input and file system
pub fn read_sources<'a>(
    tokens: &'a [String],
    root: Option<&Path>,
) -> Sources<
    'a,
    String,
    impl FnOnce() -> io::Result<String>,
    impl FnMut(&Path) -> io::Result<String>,
> {
    let fs_utils = FileSystemUtils::new();
    resolve(
        tokens,
        root,
        move || fs_utils.read_stdin_to_string(),
        move |path| fs_utils.read_file_to_string(path),
    )
}

impl<T, S, R> Sources<'_, T, S, R>
where
    S: FnOnce() -> io::Result<T>,
    R: FnMut(&Path) -> io::Result<T>,
{
    fn read(&mut self, label: String, path: &Path) -> Result<SourceEntry<T>> {
        match (self.reader)(path) {
            Ok(content) => Ok(SourceEntry::new(label, content)),
            Err(e) => Err(CsminError::io(label, e)),
        }
    }
}

impl<T, S, R> Iterator for Sources<'_, T, S, R>
where
    S: FnOnce() -> io::Result<T>,
    R: FnMut(&Path) -> io::Result<T>,
{
    type Item = Result<SourceEntry<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(stdin) = self.stdin.take() {
            debug!("No sources given, reading standard input");
            return Some(
                stdin()
                    .map(|content| SourceEntry::new(STDIN_LABEL, content))
                    .map_err(|e| CsminError::io(STDIN_LABEL, e)),
            );
        }

        loop {
            match &mut self.mode {
                Mode::Files(tokens) => {
                    let token = tokens.find(|t| !t.is_empty())?;
                    return Some(self.read(token.clone(), Path::new(token)));
                }
                Mode::PendingGlob { root, spec } => {
                    let root = std::mem::take(root);
                    self.mode = match spec.compile() {
                        Ok(matcher) => Mode::Glob(matcher.matches(&root)),
                        Err(e) => {
                            self.mode = Mode::Done;
                            return Some(Err(e));
                        }
                    };
                }
                Mode::Glob(matches) => {
                    let path = match matches.next()? {
                        Ok(path) => path,
                        Err(e) => return Some(Err(e)),
                    };
                    let label = self.fs_utils.relative_label(matches.root(), &path);
                    return Some(self.read(label, &path));
                }
                Mode::Done => return None,
            }
        }
    }
}
