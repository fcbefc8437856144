//! Commands typed into the interactive shell.

use std::path::PathBuf;

use shared::domain::DocumentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Select { path: PathBuf },
    Upload,
    List,
    Generate { document: DocumentId },
    Extract { document: DocumentId },
    Status,
    Result,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Upload => "upload",
            Self::List => "list",
            Self::Generate { .. } => "generate",
            Self::Extract { .. } => "extract",
            Self::Status => "status",
            Self::Result => "result",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
}

pub const HELP_TEXT: &str = "\
commands:
  select <path>       choose a local PDF to upload
  upload              upload the selected PDF
  list                reload the uploaded document list
  generate <name>     generate arguments for an uploaded document
  extract <name>      show the first lines the service extracts
  status              show the current workflow state
  result              print the last generated arguments
  help                show this text
  quit                wait for pending requests and exit";

/// Parses one input line; blank lines yield `None`.
///
/// Arguments keep their inner spacing so filenames with spaces work.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, CommandParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "select" => ShellCommand::Select {
            path: PathBuf::from(required(rest, "select", "a file path")?),
        },
        "upload" => ShellCommand::Upload,
        "list" | "ls" => ShellCommand::List,
        "generate" | "gen" => ShellCommand::Generate {
            document: DocumentId::new(required(rest, "generate", "a document name")?),
        },
        "extract" => ShellCommand::Extract {
            document: DocumentId::new(required(rest, "extract", "a document name")?),
        },
        "status" => ShellCommand::Status,
        "result" => ShellCommand::Result,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandParseError> {
    if rest.is_empty() {
        Err(CommandParseError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}
