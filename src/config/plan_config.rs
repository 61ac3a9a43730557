use crate::utils::error::{ProvisionError, Result};
use crate::utils::validation::{
    self, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML 佈建計畫配置。所有欄位皆可省略，省略時使用與原始部署
/// 腳本一致的預設值 (見 config::defaults)。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    pub provision: Option<ProvisionInfo>,
    pub system: Option<SystemConfig>,
    pub project: Option<ProjectConfig>,
    pub python: Option<PythonConfig>,
    pub tools: Option<ToolsConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    /// apt 套件清單
    pub packages: Option<Vec<String>>,
    pub package_manager: Option<String>,
    pub skip: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// 目標目錄；省略時為 <home>/coinone-bot
    pub directory: Option<PathBuf>,
    pub repo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PythonConfig {
    pub venv_dir: Option<String>,
    pub requirements: Option<String>,
    pub upgrade_pip: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub git: Option<String>,
    pub python: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub report_json: Option<PathBuf>,
}

impl PlanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProvisionError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ProvisionError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DEPLOY_REPO_URL})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn repo_url(&self) -> Option<&str> {
        self.project.as_ref()?.repo_url.as_deref()
    }

    pub fn project_directory(&self) -> Option<&Path> {
        self.project.as_ref()?.directory.as_deref()
    }

    pub fn venv_dir(&self) -> Option<&str> {
        self.python.as_ref()?.venv_dir.as_deref()
    }

    pub fn requirements(&self) -> Option<&str> {
        self.python.as_ref()?.requirements.as_deref()
    }

    pub fn upgrade_pip(&self) -> bool {
        self.python
            .as_ref()
            .and_then(|p| p.upgrade_pip)
            .unwrap_or(true)
    }

    pub fn system_packages(&self) -> Option<&[String]> {
        self.system.as_ref()?.packages.as_deref()
    }

    pub fn package_manager(&self) -> Option<&str> {
        self.system.as_ref()?.package_manager.as_deref()
    }

    pub fn skip_system_packages(&self) -> bool {
        self.system
            .as_ref()
            .and_then(|s| s.skip)
            .unwrap_or(false)
    }

    pub fn git_command(&self) -> Option<&str> {
        self.tools.as_ref()?.git.as_deref()
    }

    pub fn python_command(&self) -> Option<&str> {
        self.tools.as_ref()?.python.as_deref()
    }

    pub fn report_json(&self) -> Option<&Path> {
        self.output.as_ref()?.report_json.as_deref()
    }
}

impl Validate for PlanConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = self.repo_url() {
            validation::validate_repo_url("project.repo_url", url)?;
        }

        if let Some(dir) = self.project_directory() {
            validation::validate_path("project.directory", &dir.to_string_lossy())?;
        }

        if let Some(venv) = self.venv_dir() {
            validation::validate_relative_dir_name("python.venv_dir", venv)?;
        }

        if let Some(req) = self.requirements() {
            validation::validate_non_empty_string("python.requirements", req)?;
        }

        if let Some(packages) = self.system_packages() {
            if packages.is_empty() && !self.skip_system_packages() {
                return Err(ProvisionError::InvalidConfigValueError {
                    field: "system.packages".to_string(),
                    value: "[]".to_string(),
                    reason: "Package list cannot be empty unless system.skip = true"
                        .to_string(),
                });
            }
            for pkg in packages {
                validation::validate_non_empty_string("system.packages", pkg)?;
            }
        }

        Ok(())
    }
}
