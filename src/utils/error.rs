use crate::domain::model::StepKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Cannot determine the invoking user's home directory")]
    HomeDirError,

    #[error("Failed to start '{program}' during {step}: {source}")]
    CommandSpawnError {
        step: StepKind,
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' failed during {step} (exit code {code:?})")]
    CommandFailedError {
        step: StepKind,
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Command,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProvisionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProvisionError::ConfigValidationError { .. }
            | ProvisionError::InvalidConfigValueError { .. }
            | ProvisionError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ProvisionError::CommandSpawnError { .. }
            | ProvisionError::CommandFailedError { .. } => ErrorCategory::Command,
            ProvisionError::IoError(_)
            | ProvisionError::SerializationError(_)
            | ProvisionError::HomeDirError => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProvisionError::SerializationError(_) => ErrorSeverity::Medium,
            ProvisionError::ConfigValidationError { .. }
            | ProvisionError::InvalidConfigValueError { .. }
            | ProvisionError::MissingConfigError { .. }
            | ProvisionError::CommandFailedError { .. } => ErrorSeverity::High,
            ProvisionError::IoError(_)
            | ProvisionError::HomeDirError
            | ProvisionError::CommandSpawnError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 給使用者的修復建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProvisionError::ConfigValidationError { field, .. }
            | ProvisionError::InvalidConfigValueError { field, .. }
            | ProvisionError::MissingConfigError { field } => {
                format!("Check the '{}' setting in your config file or CLI flags", field)
            }
            ProvisionError::HomeDirError => {
                "Set HOME, or pass an explicit --project-dir".to_string()
            }
            ProvisionError::CommandSpawnError { program, .. } => format!(
                "'{}' is not installed or not on PATH; install it and re-run",
                program
            ),
            ProvisionError::CommandFailedError { step, .. } => match step {
                StepKind::UpdatePackageIndex | StepKind::InstallSystemPackages => {
                    "Run with sufficient privileges (root/sudo) and check network access"
                        .to_string()
                }
                StepKind::CloneRepository => {
                    "If the project directory already contains a checkout, remove it first; \
                     otherwise check the repository URL and network access"
                        .to_string()
                }
                StepKind::InstallRequirements => {
                    "Check that requirements.txt exists at the root of the cloned repository"
                        .to_string()
                }
                _ => "Inspect the tool's stderr above and re-run".to_string(),
            },
            ProvisionError::IoError(_) => {
                "Check filesystem permissions and free disk space".to_string()
            }
            ProvisionError::SerializationError(_) => {
                "Check the report output path is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProvisionError::CommandFailedError {
                step,
                program,
                stderr,
                ..
            } => {
                let tail: String = stderr
                    .lines()
                    .rev()
                    .take(3)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect::<Vec<_>>()
                    .join("\n");
                if tail.is_empty() {
                    format!("Provisioning stopped: {} failed while trying to {}", program, step.describe())
                } else {
                    format!(
                        "Provisioning stopped: {} failed while trying to {}\n{}",
                        program,
                        step.describe(),
                        tail
                    )
                }
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
