use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 佈建步驟種類，順序固定 (見 core::plan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    UpdatePackageIndex,
    InstallSystemPackages,
    CreateProjectDir,
    CloneRepository,
    CreateVirtualenv,
    UpgradePip,
    InstallRequirements,
}

impl StepKind {
    pub fn describe(&self) -> &'static str {
        match self {
            StepKind::UpdatePackageIndex => "refresh system package index",
            StepKind::InstallSystemPackages => "install runtime prerequisites",
            StepKind::CreateProjectDir => "create project directory",
            StepKind::CloneRepository => "clone bot repository",
            StepKind::CreateVirtualenv => "create virtual environment",
            StepKind::UpgradePip => "upgrade pip inside the venv",
            StepKind::InstallRequirements => "install declared dependencies",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StepKind::UpdatePackageIndex => "update_package_index",
            StepKind::InstallSystemPackages => "install_system_packages",
            StepKind::CreateProjectDir => "create_project_dir",
            StepKind::CloneRepository => "clone_repository",
            StepKind::CreateVirtualenv => "create_virtualenv",
            StepKind::UpgradePip => "upgrade_pip",
            StepKind::InstallRequirements => "install_requirements",
        };
        f.write_str(name)
    }
}

/// One external-tool invocation: program plus fixed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<P: Into<String>>(program: P, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
        }
    }

    pub fn with_args<P: Into<String>>(program: P, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn in_dir(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// 顯示用的完整命令行
    pub fn render(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// What a step does when the engine reaches it. The directory step is a
/// local filesystem operation; everything else shells out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    CreateDir(PathBuf),
    Run(CommandSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub action: StepAction,
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: StepKind,
    pub status: StepStatus,
    pub command: Option<String>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Tail of the tool's stderr when the step failed.
    pub detail: Option<String>,
}

/// Full run record, serializable for `--report-json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub project_dir: PathBuf,
    pub outcomes: Vec<StepOutcome>,
}

impl ProvisionReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status != StepStatus::Failed)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
