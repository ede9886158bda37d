//! Command-line interface module
//!
//! Provides the strict option grammar, global option declarations and
//! command routing.

pub mod args;
pub mod commands;
pub mod options;

pub use args::{Command, Options, utf8_args};
pub use commands::{run, write_fragments};
pub use options::{Arity, CliOption, OptionSet, Ref};
