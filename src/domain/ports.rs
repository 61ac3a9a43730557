use crate::domain::model::{CommandOutput, CommandSpec, StepKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Executes one external-tool invocation and waits for it to finish.
/// Non-zero exit must surface as `ProvisionError::CommandFailed`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, step: StepKind, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// 計畫需要的所有可調參數，由 CLI 或 TOML 配置提供
pub trait ConfigProvider: Send + Sync {
    fn repo_url(&self) -> &str;
    fn project_dir(&self) -> PathBuf;
    fn venv_dir_name(&self) -> &str;
    fn requirements_file(&self) -> &str;
    fn system_packages(&self) -> &[String];
    fn package_manager(&self) -> &str;
    fn git_command(&self) -> &str;
    fn python_command(&self) -> &str;
    fn skip_system_packages(&self) -> bool;
    fn upgrade_pip(&self) -> bool;
    fn dry_run(&self) -> bool;
}
