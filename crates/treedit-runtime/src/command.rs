#![forbid(unsafe_code)]

//! Command language: tokenizing a line and parsing it into a [`Command`].
//!
//! One command per line. Arguments are separated by whitespace; single
//! quotes take everything literally, double quotes allow `\` escapes, and
//! quoted pieces glue onto adjacent text (`a"b c"` is the argument `ab c`).
//! Blank lines and lines starting with `#` carry no command.
//!
//! Only an unknown command name is fatal. Arity or argument problems are
//! reported and the stream continues.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Widest indent `print-indent` and `[render] indent` accept.
pub const MAX_INDENT: usize = 16;

/// Fields of a new element for `insert` and `append`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub id: String,
    pub parent_id: String,
    pub text: String,
}

impl ElementSpec {
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        id: impl Into<String>,
        parent_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            id: id.into(),
            parent_id: parent_id.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.tag.len()
            + self.id.len()
            + self.parent_id.len()
            + self.text.len()
    }
}

/// A parsed editor command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert(ElementSpec),
    Append(ElementSpec),
    Delete { id: String },
    EditText { id: String, text: String },
    EditId { old_id: String, new_id: String },
    Undo,
    Redo,
    Init,
    Read { path: PathBuf },
    Save { path: PathBuf },
    PrintTree,
    /// `None` uses the configured default width.
    PrintIndent { indent: Option<usize> },
    SpellCheck,
}

/// Errors produced while turning a line into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("usage: {usage}")]
    BadArguments {
        command: &'static str,
        usage: &'static str,
    },

    #[error("{command}: {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },

    #[error("unterminated {quote} quote")]
    Unterminated { quote: char },
}

impl CommandError {
    /// Fatal errors abort the whole command stream.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownCommand { .. })
    }
}

/// Every command name with its usage line.
pub const COMMANDS: &[(&str, &str)] = &[
    ("insert", "insert <tag> <id> <parent-id> [text]"),
    ("append", "append <tag> <id> <parent-id> [text]"),
    ("delete", "delete <id>"),
    ("edit-text", "edit-text <id> <text>"),
    ("edit-id", "edit-id <old-id> <new-id>"),
    ("undo", "undo"),
    ("redo", "redo"),
    ("init", "init"),
    ("read", "read <path>"),
    ("save", "save <path>"),
    ("print-tree", "print-tree"),
    ("print-indent", "print-indent [indent]"),
    ("spell-check", "spell-check"),
];

impl Command {
    /// Parse one line. Returns `Ok(None)` for blank and comment lines.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let mut tokens = tokenize(trimmed)?;
        if tokens.is_empty() {
            return Ok(None);
        }
        let name = tokens.remove(0);
        Self::from_parts(&name, tokens).map(Some)
    }

    /// Build a command from its name and positional arguments.
    pub fn from_parts(name: &str, args: Vec<String>) -> Result<Self, CommandError> {
        let (name, usage) = COMMANDS
            .iter()
            .copied()
            .find(|(known, _)| *known == name)
            .ok_or_else(|| CommandError::UnknownCommand {
                name: name.to_owned(),
            })?;
        let bad = || CommandError::BadArguments {
            command: name,
            usage,
        };

        let mut args = args.into_iter();
        let mut next = || args.next();
        let command = match name {
            "insert" | "append" => {
                let (Some(tag), Some(id), Some(parent_id)) = (next(), next(), next()) else {
                    return Err(bad());
                };
                let text = next().unwrap_or_default();
                let spec = ElementSpec {
                    tag,
                    id,
                    parent_id,
                    text,
                };
                if name == "insert" {
                    Self::Insert(spec)
                } else {
                    Self::Append(spec)
                }
            }
            "delete" => Self::Delete {
                id: next().ok_or_else(bad)?,
            },
            "edit-text" => {
                let (Some(id), Some(text)) = (next(), next()) else {
                    return Err(bad());
                };
                Self::EditText { id, text }
            }
            "edit-id" => {
                let (Some(old_id), Some(new_id)) = (next(), next()) else {
                    return Err(bad());
                };
                Self::EditId { old_id, new_id }
            }
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "init" => Self::Init,
            "read" => Self::Read {
                path: next().ok_or_else(bad)?.into(),
            },
            "save" => Self::Save {
                path: next().ok_or_else(bad)?.into(),
            },
            "print-tree" => Self::PrintTree,
            "print-indent" => {
                let indent = match next() {
                    None => None,
                    Some(raw) => Some(parse_indent(&raw)?),
                };
                Self::PrintIndent { indent }
            }
            "spell-check" => Self::SpellCheck,
            other => {
                return Err(CommandError::UnknownCommand {
                    name: other.to_owned(),
                });
            }
        };

        if next().is_some() {
            return Err(bad());
        }
        Ok(command)
    }

    /// The command's name as typed.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Append(_) => "append",
            Self::Delete { .. } => "delete",
            Self::EditText { .. } => "edit-text",
            Self::EditId { .. } => "edit-id",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Init => "init",
            Self::Read { .. } => "read",
            Self::Save { .. } => "save",
            Self::PrintTree => "print-tree",
            Self::PrintIndent { .. } => "print-indent",
            Self::SpellCheck => "spell-check",
        }
    }

    /// Whether a successful run is recorded in history.
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            Self::Insert(_)
                | Self::Append(_)
                | Self::Delete { .. }
                | Self::EditText { .. }
                | Self::EditId { .. }
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        let args: Vec<String> = match self {
            Self::Insert(spec) | Self::Append(spec) => {
                let mut args = vec![spec.tag.clone(), spec.id.clone(), spec.parent_id.clone()];
                if !spec.text.is_empty() {
                    args.push(spec.text.clone());
                }
                args
            }
            Self::Delete { id } => vec![id.clone()],
            Self::EditText { id, text } => vec![id.clone(), text.clone()],
            Self::EditId { old_id, new_id } => vec![old_id.clone(), new_id.clone()],
            Self::Read { path } | Self::Save { path } => vec![path.display().to_string()],
            Self::PrintIndent { indent: Some(indent) } => vec![indent.to_string()],
            _ => Vec::new(),
        };
        for arg in &args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn parse_indent(raw: &str) -> Result<usize, CommandError> {
    let invalid = |message: String| CommandError::InvalidArgument {
        command: "print-indent",
        message,
    };
    match raw.parse::<usize>() {
        Ok(indent) if indent <= MAX_INDENT => Ok(indent),
        Ok(_) => Err(invalid(format!("indent must be at most {MAX_INDENT}, got {raw}"))),
        Err(_) => Err(invalid(format!(
            "indent must be a non-negative integer, got '{raw}'"
        ))),
    }
}

/// Split a line into arguments, honoring quotes.
pub fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(CommandError::Unterminated { quote: '\'' }),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => current.push('\n'),
                            Some('t') => current.push('\t'),
                            Some(c) => current.push(c),
                            None => return Err(CommandError::Unterminated { quote: '"' }),
                        },
                        Some(c) => current.push(c),
                        None => return Err(CommandError::Unterminated { quote: '"' }),
                    }
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Quote an argument so [`tokenize`] reads it back unchanged.
#[must_use]
pub fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && !arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '#'));
    if plain {
        return arg.to_owned();
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
