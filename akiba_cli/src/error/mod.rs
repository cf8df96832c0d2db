use akiba_core::Error as CoreError;
use colored::*;
use std::error::Error as StdError;
use thiserror::Error;

use crate::file_discovery::DiscoveryError;

/// CLI-specific error type with semantic exit codes
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    /// The main error message
    message: String,

    /// Error category for exit code determination
    category: ErrorCategory,

    /// Suggestions for recovery
    pub suggestions: Vec<String>,

    /// Source error if any
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Usage,
    Config,
    Io,
    Protocol,
    Template,
}

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    Usage = 2,
    ConfigError = 3,
    IoError = 4,
    ProtocolError = 5,
    TemplateError = 6,
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::General, message)
    }

    /// Create a command misuse error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Usage, message)
            .with_suggestion("Run 'akiba --help' for usage information")
    }

    /// Create a configuration error pointing at `akiba config`
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Config, message)
            .with_suggestion("Inspect the configuration with 'akiba config list'")
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Io, message)
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }

    pub fn with_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Usage => ExitCode::Usage,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Protocol => ExitCode::ProtocolError,
            ErrorCategory::Template => ExitCode::TemplateError,
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let prefix = match self.category {
            ErrorCategory::General => "Error".red(),
            ErrorCategory::Usage => "Usage Error".yellow(),
            ErrorCategory::Config => "Configuration Error".red(),
            ErrorCategory::Io => "File Error".red(),
            ErrorCategory::Protocol => "AniDB Error".red(),
            ErrorCategory::Template => "Format Error".red(),
        };

        let mut output = format!("{}: {}\n", prefix, self.message);

        // Error chain in debug mode
        if debug && let Some(source) = &self.source {
            output.push_str("\nCaused by:\n");
            let mut current: Option<&dyn StdError> = Some(source.as_ref());
            let mut level = 1;

            while let Some(err) = current {
                output.push_str(&format!("  {level}: {err}\n"));
                current = err.source();
                level += 1;
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        let message = error.to_string();
        let cli = match &error {
            CoreError::Io(_) => Self::io(message),
            CoreError::Protocol(protocol) => {
                let mut cli = Self::new(ErrorCategory::Protocol, message);
                if protocol.is_banned() || protocol.is_transient() {
                    cli = cli.with_suggestion(
                        "Wait before retrying, further requests may extend a ban",
                    );
                }
                cli
            }
            CoreError::Template(_) => Self::new(ErrorCategory::Template, message)
                .with_suggestion("Check the tags of the rename format"),
            CoreError::Validation(_) => Self::usage(message),
            CoreError::Remote(_) | CoreError::Internal(_) => Self::general(message),
        };
        cli.with_source(Box::new(error))
    }
}

impl From<DiscoveryError> for CliError {
    fn from(error: DiscoveryError) -> Self {
        Self::io(error.to_string()).with_source(Box::new(error))
    }
}

/// Convert anyhow errors to CLI errors
impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::general(format!("{error:#}"))
    }
}
