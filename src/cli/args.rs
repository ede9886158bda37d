//! Global option declarations and command names

use crate::{
    cli::options::{CliOption, OptionSet, Ref},
    config::RunContext,
    error::{CsminError, Result},
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Convert raw process arguments to strings.
///
/// A token that is not valid UTF-8 is an invalid argument, reported with
/// its lossy rendering.
pub fn utf8_args<I>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| CsminError::invalid_argument(raw.to_string_lossy()))
        })
        .collect()
}

/// Commands the router knows by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Minify and print (also the default)
    Min,
    /// Print usage for the program or a command
    Help,
    /// List lexical tokens
    Tokens,
    /// Hash the minified form
    Hash,
    /// Print with ANSI colors
    Color,
    /// List resolved sources without reading them
    Glob,
}

impl Command {
    /// Look up a command by its case-sensitive name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "help" => Some(Self::Help),
            "tokens" => Some(Self::Tokens),
            "hash" => Some(Self::Hash),
            "color" | "colour" => Some(Self::Color),
            "glob" => Some(Self::Glob),
            _ => None,
        }
    }

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Help => "help",
            Self::Tokens => "tokens",
            Self::Hash => "hash",
            Self::Color => "color",
            Self::Glob => "glob",
        }
    }

    /// One-line summary for usage output
    pub fn summary(self) -> &'static str {
        match self {
            Self::Min => "minify sources (default)",
            Self::Help => "print help for the program or a command",
            Self::Tokens => "list the lexical tokens of sources",
            Self::Hash => "hash the minified form of sources",
            Self::Color => "print sources with syntax colors (alias: colour)",
            Self::Glob => "list the sources a set of arguments resolves to",
        }
    }

    /// Arguments shown after the name in usage output
    pub fn synopsis(self) -> &'static str {
        match self {
            Self::Help => "[COMMAND]",
            _ => "[options] [FILE...]",
        }
    }

    /// All commands in usage order
    pub const ALL: [Command; 6] = [
        Self::Min,
        Self::Help,
        Self::Tokens,
        Self::Hash,
        Self::Color,
        Self::Glob,
    ];
}

/// Reusable option declarations
pub struct Options;

impl Options {
    /// `-?|--help|-h`
    pub fn help(value: &Ref<bool>) -> CliOption<'_> {
        CliOption::new("?|help|h", "prints out the options", move |_| value.set(true))
    }

    /// `--verbose|-v`
    pub fn verbose(value: &Ref<bool>) -> CliOption<'_> {
        CliOption::new("verbose|v", "enable additional output", move |_| value.set(true))
    }

    /// `-d|--debug`
    pub fn debug(context: &RunContext) -> CliOption<'_> {
        CliOption::new("d|debug", "debug logging", move |_| context.enable_debug())
    }

    /// `--glob=DIR`
    pub fn glob(value: &Ref<Option<PathBuf>>) -> CliOption<'_> {
        CliOption::new("glob=", "glob base directory", move |dir| {
            value.set(Some(PathBuf::from(dir)))
        })
    }

    /// Options accepted before the command name (and after `min`)
    pub fn global<'a>(context: &'a RunContext, help: &'a Ref<bool>) -> OptionSet<'a> {
        OptionSet::new()
            .with(Self::help(help))
            .with(Self::verbose(&context.verbose))
            .with(Self::debug(context))
            .with(Self::glob(&context.glob_dir))
    }
}
