use leon::{ParseError, RenderError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The sub process exited with a non-success code.")]
    SubProcessExit,

    #[error("Unable to run sub process: {}", _0)]
    SubProcess(#[from] std::io::Error),

    #[error("Error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("Error parsing placeholder string: {}", .0)]
    Parse(#[from] ParseError),

    #[error("Error placeholder template string: {}", .0)]
    Render(#[from] RenderError),

    #[error("{}", .0)]
    Core(#[from] cmdtree_core::error::Error),

    #[error("{}", .original)]
    Dispatch {
        path: String,
        original: cmdtree_core::error::Error,
    },

    #[error("Invalid name: a command name may not be empty")]
    EmptyName,

    #[error("Invalid name `{}`: names may not contain spaces", .0)]
    NameWithSpace(String),

    #[error("Invalid name `{}`: names may not start with `-`", .0)]
    NameWithDash(String),

    #[error("Found a non-unique command name or alias under `{}`: `{}`", .0, .1)]
    NonUniqueCommandName(String, String),

    #[error("Found a non-unique flag name on command `{}`: `{}`", .0, .1)]
    NonUniqueFlagName(String, String),

    #[error("Found a non-unique shorthand on command `{}`: `-{}`", .0, .1)]
    NonUniqueShorthand(String, char),

    #[error("Invalid default `{}` for {} flag `{}`", .value, .kind, .flag)]
    InvalidDefault {
        flag: String,
        kind: String,
        value: String,
    },

    #[error("Found a placeholder that is not a flag in scope of command `{}`: `{}`", .0, .1)]
    NotFoundPlaceholder(String, String),
}

impl Error {
    pub fn yaml_error(
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            file_description,
            path,
            original,
        }
    }

    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }

    pub fn invalid_default(flag: &str, kind: &str, value: &str) -> Self {
        Self::InvalidDefault {
            flag: flag.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether a usage hint should follow the message.
    ///
    /// Failures from the shell command itself aren't usage mistakes.
    #[must_use]
    pub fn wants_usage_hint(&self) -> bool {
        match self {
            Self::Dispatch { original, .. } => !matches!(
                original,
                cmdtree_core::error::Error::Hook(_) | cmdtree_core::error::Error::Io(_)
            ),
            _ => false,
        }
    }
}
