use crate::domain::model::{CommandOutput, CommandSpec, StepKind};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Runs provisioning commands as real subprocesses, capturing their output.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, step: StepKind, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let output = command
            .output()
            .await
            .map_err(|source| ProvisionError::CommandSpawnError {
                step,
                program: spec.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ProvisionError::CommandFailedError {
                step,
                program: spec.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command_captures_stdout() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("echo", &["hello"]);

        let output = runner.run(StepKind::CloneRepository, &spec).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_maps_to_command_failed() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("false", &[]);

        let err = runner
            .run(StepKind::InstallRequirements, &spec)
            .await
            .unwrap_err();
        match err {
            ProvisionError::CommandFailedError { step, code, .. } => {
                assert_eq!(step, StepKind::InstallRequirements);
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_maps_to_spawn_error() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-tool-xyz", &[]);

        let err = runner
            .run(StepKind::CreateVirtualenv, &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::CommandSpawnError { .. }));
    }

    #[tokio::test]
    async fn test_cwd_is_honored() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("pwd", &[]).in_dir(temp.path().to_path_buf());

        let output = runner.run(StepKind::UpgradePip, &spec).await.unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());
    }
}
