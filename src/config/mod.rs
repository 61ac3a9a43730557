pub mod plan_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ProvisionError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use plan_config::PlanConfig;
use std::path::PathBuf;

/// 與原始部署腳本一致的預設值
pub mod defaults {
    pub const REPO_URL: &str = "https://github.com/coinone/coinone-bot.git";
    pub const PROJECT_DIR_NAME: &str = "coinone-bot";
    pub const VENV_DIR: &str = "venv";
    pub const REQUIREMENTS_FILE: &str = "requirements.txt";
    pub const PACKAGE_MANAGER: &str = "apt-get";
    pub const GIT: &str = "git";
    pub const PYTHON: &str = "python3";

    pub fn system_packages() -> Vec<String> {
        ["python3", "python3-pip", "python3-venv", "tmux", "git"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "coinone-provision")]
#[command(about = "Provisions a fresh host for the coinone trading bot")]
pub struct CliConfig {
    /// TOML 佈建計畫；省略時完全使用預設值
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub repo_url: Option<String>,

    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    #[arg(long)]
    pub venv_dir: Option<String>,

    #[arg(long)]
    pub requirements: Option<String>,

    #[arg(long, help = "Skip the package index refresh and prerequisite install")]
    pub skip_system_packages: bool,

    #[arg(long, help = "Print the plan without executing anything")]
    pub dry_run: bool,

    #[arg(long, help = "Write the run report as JSON to this path")]
    pub report_json: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// CLI 與 TOML 合併後的最終配置 (CLI flag > TOML > 預設值)
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    repo_url: String,
    project_dir: PathBuf,
    venv_dir: String,
    requirements_file: String,
    system_packages: Vec<String>,
    package_manager: String,
    git_command: String,
    python_command: String,
    skip_system_packages: bool,
    upgrade_pip: bool,
    dry_run: bool,
    report_json: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let plan = match &cli.config {
            Some(path) => PlanConfig::from_file(path)?,
            None => PlanConfig::default(),
        };
        Self::merge(cli, &plan)
    }

    pub fn merge(cli: &CliConfig, plan: &PlanConfig) -> Result<Self> {
        plan.validate()?;

        let project_dir = cli
            .project_dir
            .clone()
            .or_else(|| plan.project_directory().map(PathBuf::from))
            .map(Ok)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|home| home.join(defaults::PROJECT_DIR_NAME))
                    .ok_or(ProvisionError::HomeDirError)
            })?;

        let resolved = Self {
            repo_url: cli
                .repo_url
                .clone()
                .or_else(|| plan.repo_url().map(String::from))
                .unwrap_or_else(|| defaults::REPO_URL.to_string()),
            project_dir,
            venv_dir: cli
                .venv_dir
                .clone()
                .or_else(|| plan.venv_dir().map(String::from))
                .unwrap_or_else(|| defaults::VENV_DIR.to_string()),
            requirements_file: cli
                .requirements
                .clone()
                .or_else(|| plan.requirements().map(String::from))
                .unwrap_or_else(|| defaults::REQUIREMENTS_FILE.to_string()),
            system_packages: plan
                .system_packages()
                .map(<[String]>::to_vec)
                .unwrap_or_else(defaults::system_packages),
            package_manager: plan
                .package_manager()
                .map(String::from)
                .unwrap_or_else(|| defaults::PACKAGE_MANAGER.to_string()),
            git_command: plan
                .git_command()
                .map(String::from)
                .unwrap_or_else(|| defaults::GIT.to_string()),
            python_command: plan
                .python_command()
                .map(String::from)
                .unwrap_or_else(|| defaults::PYTHON.to_string()),
            skip_system_packages: cli.skip_system_packages || plan.skip_system_packages(),
            upgrade_pip: plan.upgrade_pip(),
            dry_run: cli.dry_run,
            report_json: cli
                .report_json
                .clone()
                .or_else(|| plan.report_json().map(PathBuf::from)),
        };

        resolved.validate()?;
        Ok(resolved)
    }

    pub fn report_json(&self) -> Option<&PathBuf> {
        self.report_json.as_ref()
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_repo_url("repo_url", &self.repo_url)?;
        validation::validate_path("project_dir", &self.project_dir.to_string_lossy())?;
        validation::validate_relative_dir_name("venv_dir", &self.venv_dir)?;
        validation::validate_non_empty_string("requirements", &self.requirements_file)?;
        validation::validate_non_empty_string("tools.git", &self.git_command)?;
        validation::validate_non_empty_string("tools.python", &self.python_command)?;
        if !self.skip_system_packages {
            validation::validate_non_empty_string("system.package_manager", &self.package_manager)?;
        }
        Ok(())
    }
}

impl ConfigProvider for ResolvedConfig {
    fn repo_url(&self) -> &str {
        &self.repo_url
    }

    fn project_dir(&self) -> PathBuf {
        self.project_dir.clone()
    }

    fn venv_dir_name(&self) -> &str {
        &self.venv_dir
    }

    fn requirements_file(&self) -> &str {
        &self.requirements_file
    }

    fn system_packages(&self) -> &[String] {
        &self.system_packages
    }

    fn package_manager(&self) -> &str {
        &self.package_manager
    }

    fn git_command(&self) -> &str {
        &self.git_command
    }

    fn python_command(&self) -> &str {
        &self.python_command
    }

    fn skip_system_packages(&self) -> bool {
        self.skip_system_packages
    }

    fn upgrade_pip(&self) -> bool {
        self.upgrade_pip
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_cli() -> CliConfig {
        CliConfig::parse_from(["coinone-provision"])
    }

    #[test]
    fn test_zero_arg_run_matches_original_script() {
        let config = ResolvedConfig::merge(&bare_cli(), &PlanConfig::default()).unwrap();

        assert_eq!(config.repo_url(), defaults::REPO_URL);
        assert!(config
            .project_dir()
            .ends_with(defaults::PROJECT_DIR_NAME));
        assert_eq!(config.venv_dir_name(), "venv");
        assert_eq!(config.requirements_file(), "requirements.txt");
        assert_eq!(config.package_manager(), "apt-get");
        assert_eq!(
            config.system_packages(),
            defaults::system_packages().as_slice()
        );
        assert!(!config.skip_system_packages());
        assert!(config.upgrade_pip());
        assert!(!config.dry_run());
    }

    #[test]
    fn test_cli_flags_override_toml() {
        let cli = CliConfig::parse_from([
            "coinone-provision",
            "--repo-url",
            "https://github.com/acme/fork.git",
            "--project-dir",
            "/srv/bot",
            "--skip-system-packages",
        ]);
        let plan = PlanConfig::from_toml_str(
            r#"
[project]
repo_url = "https://github.com/acme/original.git"
directory = "/opt/bot"
"#,
        )
        .unwrap();

        let config = ResolvedConfig::merge(&cli, &plan).unwrap();
        assert_eq!(config.repo_url(), "https://github.com/acme/fork.git");
        assert_eq!(config.project_dir(), PathBuf::from("/srv/bot"));
        assert!(config.skip_system_packages());
    }

    #[test]
    fn test_toml_fills_in_when_cli_silent() {
        let plan = PlanConfig::from_toml_str(
            r#"
[python]
venv_dir = ".venv"
upgrade_pip = false

[tools]
git = "/usr/local/bin/git"
"#,
        )
        .unwrap();

        let config = ResolvedConfig::merge(&bare_cli(), &plan).unwrap();
        assert_eq!(config.venv_dir_name(), ".venv");
        assert!(!config.upgrade_pip());
        assert_eq!(config.git_command(), "/usr/local/bin/git");
        // untouched fields keep defaults
        assert_eq!(config.python_command(), "python3");
    }

    #[test]
    fn test_merge_rejects_invalid_override() {
        let cli = CliConfig::parse_from(["coinone-provision", "--repo-url", "junk"]);
        assert!(ResolvedConfig::merge(&cli, &PlanConfig::default()).is_err());
    }
}
