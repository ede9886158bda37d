//! Include/exclude glob matching under a root directory
//!
//! Tokens starting with `!` are exclude patterns, every other non-empty
//! token is an include pattern. Excludes only filter what the includes
//! matched, so token order does not change the result.

use crate::error::{CsminError, Result};
use glob::{MatchOptions, Paths, Pattern};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Patterns ignore case, `*` stays within one directory
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Include and exclude patterns classified from positional tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobSpec {
    /// Patterns selecting files
    pub includes: Vec<String>,
    /// Patterns removing files from the selection (without the `!`)
    pub excludes: Vec<String>,
}

impl GlobSpec {
    /// Classify tokens into includes and excludes, skipping empty ones
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::default();
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            match token.strip_prefix('!') {
                Some(exclude) => spec.excludes.push(exclude.to_string()),
                None => spec.includes.push(token.to_string()),
            }
        }
        spec
    }

    /// Compile every pattern, failing on the first that does not parse
    pub fn compile(&self) -> Result<Matcher> {
        let includes = self
            .includes
            .iter()
            .map(|p| compile_pattern(p).map(|_| p.clone()))
            .collect::<Result<Vec<_>>>()?;
        let excludes = self
            .excludes
            .iter()
            .map(|p| compile_pattern(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Matcher { includes, excludes })
    }
}

fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| CsminError::pattern(pattern, e))
}

/// Compiled glob spec, ready to run against a directory
#[derive(Debug, Clone)]
pub struct Matcher {
    includes: Vec<String>,
    excludes: Vec<Pattern>,
}

impl Matcher {
    /// Whether `relative` (or one of its parent directories) is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        relative
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.excludes.iter().any(|e| e.matches_path_with(p, MATCH_OPTIONS)))
    }

    /// Lazily walk `root`, yielding full paths of matching files
    #[instrument(skip(self))]
    pub fn matches(&self, root: &Path) -> Matches {
        debug!(
            "Matching {} include(s) and {} exclude(s)",
            self.includes.len(),
            self.excludes.len()
        );
        Matches {
            root: root.to_path_buf(),
            pending: self.includes.iter().cloned().collect(),
            current: None,
            matcher: self.clone(),
            seen: HashSet::new(),
        }
    }
}

/// Iterator over files matched under a root, one include pattern at a time
pub struct Matches {
    root: PathBuf,
    pending: VecDeque<String>,
    current: Option<Paths>,
    matcher: Matcher,
    seen: HashSet<PathBuf>,
}

impl fmt::Debug for Matches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matches")
            .field("root", &self.root)
            .field("pending", &self.pending)
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl Matches {
    /// Root directory the walk is relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn start_next_pattern(&mut self) -> Option<Result<()>> {
        let include = self.pending.pop_front()?;
        let full = format!(
            "{}/{}",
            Pattern::escape(&self.root.to_string_lossy()),
            include
        );
        debug!("Expanding {}", full);

        Some(match glob::glob_with(&full, MATCH_OPTIONS) {
            Ok(paths) => {
                self.current = Some(paths);
                Ok(())
            }
            Err(e) => Err(CsminError::pattern(include, e)),
        })
    }
}

impl Iterator for Matches {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(paths) = self.current.as_mut() else {
                if let Err(e) = self.start_next_pattern()? {
                    return Some(Err(e));
                }
                continue;
            };

            let Some(entry) = paths.next() else {
                self.current = None;
                continue;
            };

            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    let label = e.path().display().to_string();
                    warn!("Cannot read {}", label);
                    return Some(Err(CsminError::io(label, io::Error::from(e))));
                }
            };

            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            if self.matcher.is_excluded(relative) {
                debug!("Excluded {}", relative.display());
                continue;
            }

            if self.seen.insert(path.clone()) {
                return Some(Ok(path));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, *file).unwrap();
        }
        temp_dir
    }

    fn relative_matches(spec: &GlobSpec, root: &Path) -> Vec<String> {
        let mut found: Vec<String> = spec
            .compile()
            .unwrap()
            .matches(root)
            .map(|p| {
                p.unwrap()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_classify_tokens() {
        let spec = GlobSpec::from_tokens(["!gen/*.cs", "*.cs", "", "**/*.csx"]);

        assert_eq!(spec.includes, vec!["*.cs", "**/*.csx"]);
        assert_eq!(spec.excludes, vec!["gen/*.cs"]);
    }

    #[test]
    fn test_include_then_exclude() {
        let root = tree(&["a.cs", "b.txt", "gen/c.cs", "sub/d.cs", "sub/gen/e.cs"]);
        let spec = GlobSpec::from_tokens(["**/*.cs", "!gen/*.cs"]);

        assert_eq!(
            relative_matches(&spec, root.path()),
            vec!["a.cs", "sub/d.cs", "sub/gen/e.cs"]
        );
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let root = tree(&["a.cs", "sub/d.cs"]);
        let spec = GlobSpec::from_tokens(["*.cs"]);

        assert_eq!(relative_matches(&spec, root.path()), vec!["a.cs"]);
    }

    #[test]
    fn test_exclude_directory_removes_its_contents() {
        let root = tree(&["a.cs", "gen/deep/c.cs"]);
        let spec = GlobSpec::from_tokens(["!gen", "**/*.cs"]);

        assert_eq!(relative_matches(&spec, root.path()), vec!["a.cs"]);
    }

    #[test]
    fn test_matching_ignores_case() {
        let root = tree(&["A.CS", "b.cs", "Program.Cs", "GEN/c.cs", "notes.txt"]);
        let spec = GlobSpec::from_tokens(["**/*.cs", "!gen/*.CS"]);

        assert_eq!(
            relative_matches(&spec, root.path()),
            vec!["A.CS", "Program.Cs", "b.cs"]
        );
    }

    #[test]
    fn test_overlapping_includes_yield_once() {
        let root = tree(&["a.cs"]);
        let spec = GlobSpec::from_tokens(["*.cs", "a.*"]);

        assert_eq!(relative_matches(&spec, root.path()), vec!["a.cs"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let spec = GlobSpec::from_tokens(["a[.cs"]);

        let err = spec.compile().unwrap_err();
        assert!(matches!(err, CsminError::Pattern { pattern, .. } if pattern == "a[.cs"));
    }
}
