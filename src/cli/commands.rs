//! Command routing and implementations
//!
//! The first positional token names the command and the rest are its
//! arguments. Unknown or missing names fall back to minifying the whole
//! tail, so `csmin a.cs` and `csmin min a.cs` do the same thing.

use crate::{
    cli::{
        args::{Command, Options},
        options::{CliOption, OptionSet, Ref},
    },
    config::RunContext,
    core::sources::{STDIN_LABEL, read_sources, resolve},
    minifier::{self, Fragment, Token, TokenKind, minify, tokenize},
    utils::fs::FileSystemUtils,
};
use anyhow::{Context, Result};
use console::Style;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const PROGRAM: &str = "csmin";

/// Parse global options from `args` and run the selected command.
///
/// Returns the process status on success.
#[instrument(skip(context, out))]
pub fn run(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<i32> {
    let help = Ref::new(false);
    let options = Options::global(context, &help);
    let tail = options.parse(args.iter().cloned())?;

    if help.get() {
        write_usage(out, &options)?;
        return Ok(0);
    }

    let command = tail.first().and_then(|name| Command::from_name(name));
    dispatch(context, command, &tail, out)
}

/// Route `tail` to `command`, or to the default handler when there is none
fn dispatch(
    context: &RunContext,
    command: Option<Command>,
    tail: &[String],
    out: &mut dyn Write,
) -> Result<i32> {
    let command_args = tail.get(1..).unwrap_or_default();
    debug!("Dispatching {:?} with {} argument(s)", command, command_args.len());

    match command {
        // the nested status is discarded
        Some(Command::Min) => run(context, command_args, out).map(|_| 0),
        Some(Command::Help) => help_command(context, command_args, out),
        Some(Command::Tokens) => tokens_command(context, command_args, out).map(|()| 0),
        Some(Command::Hash) => hash_command(context, command_args, out),
        Some(Command::Color) => color_command(context, command_args, out).map(|()| 0),
        Some(Command::Glob) => glob_command(context, command_args, out).map(|()| 0),
        None => default_command(context, tail, out).map(|()| 0),
    }
}

/// Minify every source and print it, each ending on its own line
#[instrument(skip(context, out))]
fn default_command(context: &RunContext, files: &[String], out: &mut dyn Write) -> Result<()> {
    let root = glob_root(&context.glob_dir)?;

    for source in read_sources(files, root.as_deref()) {
        let source = source.context("Failed to read source")?;
        debug!("Minifying {}", source.label);
        write_fragments(out, minify(&source.content))?;
    }

    Ok(())
}

/// Write minified fragments, then a newline unless the last one was a
/// newline
pub fn write_fragments<'a>(
    out: &mut dyn Write,
    fragments: impl IntoIterator<Item = Fragment<'a>>,
) -> io::Result<()> {
    let mut newline = false;
    for fragment in fragments {
        match fragment {
            Fragment::NewLine => writeln!(out)?,
            Fragment::Text(text) => out.write_all(text.as_bytes())?,
        }
        newline = fragment == Fragment::NewLine;
    }

    if !newline {
        writeln!(out)?;
    }
    Ok(())
}

fn help_command(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<i32> {
    let name = match args.first().map(String::as_str) {
        Some("help") => {
            write_command_usage(out, Command::Help, &OptionSet::new())?;
            return Ok(0);
        }
        name => name,
    };

    match name.and_then(|name| Command::from_name(name).map(|c| (name, c))) {
        Some((name, command)) => dispatch(
            context,
            Some(command),
            &[name.to_string(), "--help".to_string()],
            out,
        ),
        None => {
            if let Some(name) = name {
                debug!("No help for unknown command '{}'", name);
            }
            let scratch = RunContext::new();
            let help = Ref::new(false);
            write_usage(out, &Options::global(&scratch, &help))?;
            Ok(0)
        }
    }
}

#[derive(Serialize)]
struct TokenRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    token: Token,
    text: &'a str,
}

/// List the lexical tokens of every source
#[instrument(skip(context, out))]
fn tokens_command(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<()> {
    let help = Ref::new(false);
    let json = Ref::new(false);
    let glob_dir = Ref::new(context.glob_dir.get());
    let options = OptionSet::new()
        .with(Options::help(&help))
        .with(CliOption::new("j|json", "print one JSON object per token", |_| {
            json.set(true)
        }))
        .with(Options::glob(&glob_dir));

    let files = options.parse(args.iter().cloned())?;
    if help.get() {
        return write_command_usage(out, Command::Tokens, &options);
    }

    let root = glob_root(&glob_dir)?;
    let json = json.get();

    for source in read_sources(&files, root.as_deref()) {
        let source = source.context("Failed to read source")?;
        let content = source.content.as_str();

        if !json && source.label != STDIN_LABEL {
            writeln!(out, "==> {} <==", source.label)?;
        }

        for token in tokenize(content) {
            let text = token.text(content);
            if json {
                let record = TokenRecord {
                    source: &source.label,
                    token,
                    text,
                };
                serde_json::to_writer(&mut *out, &record)
                    .context("Failed to write token record")?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "{:<28}{}-{}\t{}",
                    token.kind,
                    token.start,
                    token.end,
                    serde_json::to_string(text)?
                )?;
            }
        }
    }

    Ok(())
}

/// Print the hash of every source; with `--compare`, the status is 1 when
/// any source hashes differently
#[instrument(skip(context, out))]
fn hash_command(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<i32> {
    let help = Ref::new(false);
    let compare = Ref::new(None::<String>);
    let glob_dir = Ref::new(context.glob_dir.get());
    let options = OptionSet::new()
        .with(Options::help(&help))
        .with(CliOption::new(
            "c|compare=",
            "expected hash; exit status is 1 on mismatch",
            |hash| compare.set(Some(hash.to_string())),
        ))
        .with(Options::glob(&glob_dir));

    let files = options.parse(args.iter().cloned())?;
    if help.get() {
        write_command_usage(out, Command::Hash, &options)?;
        return Ok(0);
    }

    let root = glob_root(&glob_dir)?;
    let expected = compare.get();
    let mut status = 0;

    for source in read_sources(&files, root.as_deref()) {
        let source = source.context("Failed to read source")?;
        let digest = minifier::hash(&source.content);
        writeln!(out, "{}  {}", digest, source.label)?;

        if let Some(expected) = &expected {
            if !digest.eq_ignore_ascii_case(expected) {
                warn!("{} does not match {}", source.label, expected);
                status = 1;
            }
        }
    }

    Ok(status)
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "var",
    "virtual", "void", "volatile", "while",
];

fn token_style(kind: TokenKind) -> Option<Style> {
    let style = match kind {
        TokenKind::SingleLineComment | TokenKind::MultiLineComment => Style::new().green(),
        TokenKind::String
        | TokenKind::VerbatimString
        | TokenKind::InterpolatedString
        | TokenKind::InterpolatedVerbatimString
        | TokenKind::Char => Style::new().yellow(),
        TokenKind::PreprocessorDirective => Style::new().magenta(),
        TokenKind::WhiteSpace | TokenKind::NewLine | TokenKind::Text => return None,
    };
    Some(style.force_styling(true))
}

/// Write a text run, highlighting the keywords inside it
fn write_text_run(out: &mut dyn Write, text: &str) -> io::Result<()> {
    let keyword = Style::new().blue().bold().force_styling(true);
    let mut rest = text;

    while let Some(first) = rest.chars().next() {
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let wordy = is_word(first);
        let end = rest.find(|c: char| is_word(c) != wordy).unwrap_or(rest.len());
        let (part, tail) = rest.split_at(end);

        if wordy && KEYWORDS.contains(&part) {
            write!(out, "{}", keyword.apply_to(part))?;
        } else {
            out.write_all(part.as_bytes())?;
        }
        rest = tail;
    }
    Ok(())
}

/// Reprint every source with ANSI colors by token kind
#[instrument(skip(context, out))]
fn color_command(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<()> {
    let help = Ref::new(false);
    let glob_dir = Ref::new(context.glob_dir.get());
    let options = OptionSet::new()
        .with(Options::help(&help))
        .with(Options::glob(&glob_dir));

    let files = options.parse(args.iter().cloned())?;
    if help.get() {
        return write_command_usage(out, Command::Color, &options);
    }

    let root = glob_root(&glob_dir)?;

    for source in read_sources(&files, root.as_deref()) {
        let source = source.context("Failed to read source")?;
        let content = source.content.as_str();
        let mut newline = false;

        for token in tokenize(content) {
            let text = token.text(content);
            match token_style(token.kind) {
                Some(style) => write!(out, "{}", style.apply_to(text))?,
                None if token.kind == TokenKind::Text => write_text_run(out, text)?,
                None => out.write_all(text.as_bytes())?,
            }
            newline = token.kind == TokenKind::NewLine;
        }

        if !newline {
            writeln!(out)?;
        }
    }

    Ok(())
}

/// Print the label of every source the arguments resolve to, without
/// reading any content
#[instrument(skip(context, out))]
fn glob_command(context: &RunContext, args: &[String], out: &mut dyn Write) -> Result<()> {
    let help = Ref::new(false);
    let glob_dir = Ref::new(context.glob_dir.get());
    let options = OptionSet::new()
        .with(Options::help(&help))
        .with(Options::glob(&glob_dir));

    let files = options.parse(args.iter().cloned())?;
    if help.get() {
        return write_command_usage(out, Command::Glob, &options);
    }

    let root = glob_root(&glob_dir)?;
    let sources = resolve(
        &files,
        root.as_deref(),
        || Ok(PathBuf::new()),
        |path: &Path| Ok(path.to_path_buf()),
    );

    for source in sources {
        let source = source.context("Failed to resolve sources")?;
        writeln!(out, "{}", source.label)?;
    }

    Ok(())
}

/// Absolute glob root from a `--glob` cell, if one was given
fn glob_root(glob_dir: &Ref<Option<PathBuf>>) -> Result<Option<PathBuf>> {
    glob_dir
        .get()
        .map(|dir| {
            FileSystemUtils::new()
                .absolute(&dir)
                .with_context(|| format!("Invalid glob directory: {}", dir.display()))
        })
        .transpose()
}

fn write_usage(out: &mut dyn Write, options: &OptionSet<'_>) -> Result<()> {
    writeln!(out, "Usage: {} [options] [min] [FILE...]", PROGRAM)?;
    writeln!(out, "       {} [options] COMMAND [ARGS...]", PROGRAM)?;
    writeln!(out)?;
    writeln!(
        out,
        "Minifies C# read from each FILE, or from standard input when no FILE is given."
    )?;
    writeln!(
        out,
        "With --glob=DIR, arguments are glob patterns under DIR; prefix a pattern with ! to exclude."
    )?;
    writeln!(out)?;
    writeln!(out, "Commands:")?;
    for command in Command::ALL {
        writeln!(out, "  {:<10}{}", command.name(), command.summary())?;
    }
    writeln!(out)?;
    writeln!(out, "Options:")?;
    options.write_options(out)?;
    Ok(())
}

fn write_command_usage(out: &mut dyn Write, command: Command, options: &OptionSet<'_>) -> Result<()> {
    writeln!(out, "Usage: {} {} {}", PROGRAM, command.name(), command.synopsis())?;
    writeln!(out)?;
    writeln!(out, "{}", command.summary())?;
    if !options.is_empty() {
        writeln!(out)?;
        writeln!(out, "Options:")?;
        options.write_options(out)?;
    }
    Ok(())
}
