//! Source resolution
//!
//! Maps positional arguments to labeled sources, either as file paths or as
//! include/exclude globs under a root directory.

pub mod glob;
pub mod sources;

pub use glob::{GlobSpec, Matcher, Matches};
pub use sources::{STDIN_LABEL, SourceEntry, Sources, read_sources, resolve};
