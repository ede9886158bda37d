//! Strict option grammar
//!
//! Options are declared up front with an action each; parsing runs the
//! actions and returns the positional tail. Once the tail starts, every
//! following token belongs to it, even one that looks like an option. Before
//! that, an option-shaped token that matches nothing is an error.

use crate::error::{CsminError, Result};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

/// Single-slot cell that option actions write and callers read after parsing
#[derive(Debug, Default)]
pub struct Ref<T> {
    slot: RefCell<T>,
}

impl<T> Ref<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        Self {
            slot: RefCell::new(value),
        }
    }

    /// Overwrite the value; the last write wins
    pub fn set(&self, value: T) {
        *self.slot.borrow_mut() = value;
    }
}

impl<T: Clone> Ref<T> {
    /// Current value
    pub fn get(&self) -> T {
        self.slot.borrow().clone()
    }
}

/// Whether an option stands alone or takes a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Present or absent, no value
    Flag,
    /// Requires a value, inline (`--name=value`) or as the next token
    Value,
}

type Action<'a> = Box<dyn Fn(&str) + 'a>;

/// A declared command-line option
pub struct CliOption<'a> {
    names: Vec<String>,
    description: String,
    arity: Arity,
    action: Action<'a>,
}

impl<'a> CliOption<'a> {
    /// Declare an option from a prototype such as `"?|help|h"` or `"glob="`.
    ///
    /// Aliases are separated by `|`; a trailing `=` makes the option take a
    /// value. Flags call `action` with the token that matched, value options
    /// with the value.
    pub fn new(
        prototype: &str,
        description: impl Into<String>,
        action: impl Fn(&str) + 'a,
    ) -> Self {
        let (names, arity) = match prototype.strip_suffix('=') {
            Some(names) => (names, Arity::Value),
            None => (prototype, Arity::Flag),
        };

        Self {
            names: names
                .split('|')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            description: description.into(),
            arity,
            action: Box::new(action),
        }
    }

    /// Aliases this option answers to
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Flag or value-taking
    pub fn arity(&self) -> Arity {
        self.arity
    }

    fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names as shown in help output, e.g. `-?, --help, -h`
    fn synopsis(&self) -> String {
        let mut names: Vec<String> = self
            .names
            .iter()
            .map(|name| {
                if name.chars().count() == 1 {
                    format!("-{}", name)
                } else {
                    format!("--{}", name)
                }
            })
            .collect();

        if self.arity == Arity::Value {
            if let Some(last) = names.last_mut() {
                last.push_str("=VALUE");
            }
        }

        names.join(", ")
    }
}

impl fmt::Debug for CliOption<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliOption")
            .field("names", &self.names)
            .field("description", &self.description)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// An ordered set of declared options with strict tail parsing
#[derive(Debug, Default)]
pub struct OptionSet<'a> {
    options: Vec<CliOption<'a>>,
}

impl<'a> OptionSet<'a> {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option declaration
    #[must_use]
    pub fn with(mut self, option: CliOption<'a>) -> Self {
        self.options.push(option);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Run matching actions over `args` and return the positional tail.
    ///
    /// A literal `--` in option mode ends option mode without joining the
    /// tail.
    pub fn parse<I, S>(&self, args: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut tail = Vec::new();
        let mut tail_started = false;

        while let Some(arg) = args.next() {
            // once a tail, always a tail
            if tail_started {
                tail.push(arg);
                continue;
            }

            if arg == "--" {
                debug!("Option mode ended by '--'");
                tail_started = true;
                continue;
            }

            if self.try_apply(&arg, &mut args)? {
                continue;
            }

            if looks_like_option(&arg) {
                return Err(CsminError::invalid_argument(arg));
            }

            debug!("Positional tail starts at '{}'", arg);
            tail_started = true;
            tail.push(arg);
        }

        Ok(tail)
    }

    /// Match `arg` against the declared options and run the action.
    ///
    /// Returns false when nothing matches.
    fn try_apply(&self, arg: &str, rest: &mut impl Iterator<Item = String>) -> Result<bool> {
        let Some((name, inline)) = split_option(arg) else {
            return Ok(false);
        };
        let Some(option) = self.options.iter().find(|o| o.answers_to(name)) else {
            return Ok(false);
        };

        match (option.arity, inline) {
            (Arity::Flag, None) => (option.action)(arg),
            (Arity::Flag, Some(_)) => return Ok(false),
            (Arity::Value, Some(value)) => (option.action)(value),
            (Arity::Value, None) => {
                let value = rest.next().ok_or_else(|| CsminError::missing_value(arg))?;
                (option.action)(&value);
            }
        }

        Ok(true)
    }

    /// Write one line per option: synopsis padded to a column, then
    /// description
    pub fn write_options(&self, out: &mut dyn Write) -> io::Result<()> {
        for option in &self.options {
            let synopsis = option.synopsis();
            if synopsis.len() < 27 {
                writeln!(out, "  {:<27}{}", synopsis, option.description)?;
            } else {
                writeln!(out, "  {}", synopsis)?;
                writeln!(out, "  {:<27}{}", "", option.description)?;
            }
        }
        Ok(())
    }
}

fn looks_like_option(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-')
}

/// Split `--name=value`, `-name:value` or `--name` into name and inline value
fn split_option(arg: &str) -> Option<(&str, Option<&str>)> {
    let body = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    if body.is_empty() {
        return None;
    }

    match body.find(['=', ':']) {
        Some(at) => Some((&body[..at], Some(&body[at + 1..]))),
        None => Some((body, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_flags_and_values_run_actions() {
        let help = Ref::new(false);
        let glob = Ref::new(None::<String>);
        let options = OptionSet::new()
            .with(CliOption::new("?|help|h", "help", |_| help.set(true)))
            .with(CliOption::new("glob=", "root", |v| glob.set(Some(v.to_string()))));

        let tail = options.parse(args(&["-h", "--glob=src", "min"])).unwrap();

        assert!(help.get());
        assert_eq!(glob.get().as_deref(), Some("src"));
        assert_eq!(tail, vec!["min"]);
    }

    #[test]
    fn test_value_from_next_token_and_last_write_wins() {
        let glob = Ref::new(String::new());
        let options =
            OptionSet::new().with(CliOption::new("glob=", "root", |v| glob.set(v.to_string())));

        let tail = options
            .parse(args(&["--glob", "a", "-glob:b", "x"]))
            .unwrap();

        assert_eq!(glob.get(), "b");
        assert_eq!(tail, vec!["x"]);
    }

    #[test]
    fn test_once_a_tail_always_a_tail() {
        let verbose = Ref::new(false);
        let options = OptionSet::new().with(CliOption::new("verbose|v", "v", |_| verbose.set(true)));

        let tail = options
            .parse(args(&["min", "-foo.cs", "-v", "--verbose", "b.cs"]))
            .unwrap();

        assert!(!verbose.get());
        assert_eq!(tail, vec!["min", "-foo.cs", "-v", "--verbose", "b.cs"]);
    }

    #[test]
    fn test_unknown_option_in_option_mode_fails() {
        let options = OptionSet::new().with(CliOption::new("verbose|v", "v", |_| {}));

        let err = options.parse(args(&["-v", "-x", "min"])).unwrap_err();

        match err {
            CsminError::InvalidArgument { argument } => assert_eq!(argument, "-x"),
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_flag_with_inline_value_is_invalid() {
        let options = OptionSet::new().with(CliOption::new("verbose|v", "v", |_| {}));

        let err = options.parse(args(&["--verbose=yes"])).unwrap_err();
        assert!(matches!(err, CsminError::InvalidArgument { .. }));
    }

    #[test]
    fn test_single_dash_and_empty_tokens_start_the_tail() {
        let options = OptionSet::new();

        assert_eq!(options.parse(args(&["-", "-x"])).unwrap(), vec!["-", "-x"]);
        assert_eq!(options.parse(args(&["", "-x"])).unwrap(), vec!["", "-x"]);
    }

    #[test]
    fn test_double_dash_ends_option_mode() {
        let options = OptionSet::new();

        let tail = options.parse(args(&["--", "-weird.cs"])).unwrap();
        assert_eq!(tail, vec!["-weird.cs"]);
    }

    #[test]
    fn test_missing_value_at_end() {
        let options = OptionSet::new().with(CliOption::new("glob=", "root", |_| {}));

        let err = options.parse(args(&["--glob"])).unwrap_err();
        assert!(matches!(err, CsminError::MissingValue { option } if option == "--glob"));
    }

    #[test]
    fn test_write_options() {
        let options = OptionSet::new()
            .with(CliOption::new("?|help|h", "prints out the options", |_| {}))
            .with(CliOption::new("glob=", "glob base directory", |_| {}));

        let mut out = Vec::new();
        options.write_options(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("  -?, --help, -h"));
        assert!(text.contains("prints out the options"));
        assert!(text.contains("--glob=VALUE"));
    }
}
