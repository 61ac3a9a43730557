use crate::domain::model::{CommandSpec, Step, StepAction, StepKind};
use crate::domain::ports::ConfigProvider;
use std::path::{Path, PathBuf};

/// venv 內部的可執行檔目錄
fn venv_bin_dir(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts")
    } else {
        venv.join("bin")
    }
}

/// Derive the fixed provisioning sequence from configuration. The order
/// never changes; configuration only removes the system-package steps,
/// the optional pip upgrade, and substitutes tool commands and paths.
pub fn build_plan<C: ConfigProvider>(config: &C) -> Vec<Step> {
    let project_dir = config.project_dir();
    let venv_dir = project_dir.join(config.venv_dir_name());
    let venv_bin = venv_bin_dir(&venv_dir);
    let venv_python = venv_bin.join(if cfg!(windows) { "python.exe" } else { "python" });
    let venv_pip = venv_bin.join(if cfg!(windows) { "pip.exe" } else { "pip" });

    let mut plan = Vec::new();

    if !config.skip_system_packages() {
        plan.push(Step {
            kind: StepKind::UpdatePackageIndex,
            action: StepAction::Run(CommandSpec::new(config.package_manager(), &["update"])),
        });

        let mut install_args = vec!["install".to_string(), "-y".to_string()];
        install_args.extend(config.system_packages().iter().cloned());
        plan.push(Step {
            kind: StepKind::InstallSystemPackages,
            action: StepAction::Run(CommandSpec::with_args(
                config.package_manager(),
                install_args,
            )),
        });
    }

    plan.push(Step {
        kind: StepKind::CreateProjectDir,
        action: StepAction::CreateDir(project_dir.clone()),
    });

    plan.push(Step {
        kind: StepKind::CloneRepository,
        action: StepAction::Run(CommandSpec::with_args(
            config.git_command(),
            vec![
                "clone".to_string(),
                config.repo_url().to_string(),
                project_dir.to_string_lossy().into_owned(),
            ],
        )),
    });

    plan.push(Step {
        kind: StepKind::CreateVirtualenv,
        action: StepAction::Run(CommandSpec::with_args(
            config.python_command(),
            vec![
                "-m".to_string(),
                "venv".to_string(),
                venv_dir.to_string_lossy().into_owned(),
            ],
        )),
    });

    // 之後的步驟一律使用 venv 內的直譯器/安裝器 (等同 shell 的 activate)
    if config.upgrade_pip() {
        plan.push(Step {
            kind: StepKind::UpgradePip,
            action: StepAction::Run(
                CommandSpec::new(
                    venv_python.to_string_lossy().into_owned(),
                    &["-m", "pip", "install", "--upgrade", "pip"],
                )
                .in_dir(project_dir.clone()),
            ),
        });
    }

    plan.push(Step {
        kind: StepKind::InstallRequirements,
        action: StepAction::Run(
            CommandSpec::with_args(
                venv_pip.to_string_lossy().into_owned(),
                vec![
                    "install".to_string(),
                    "-r".to_string(),
                    config.requirements_file().to_string(),
                ],
            )
            .in_dir(project_dir),
        ),
    });

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;

    struct MockConfig {
        project_dir: PathBuf,
        skip_system_packages: bool,
        upgrade_pip: bool,
        system_packages: Vec<String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                project_dir: PathBuf::from("/home/trader/coinone-bot"),
                skip_system_packages: false,
                upgrade_pip: true,
                system_packages: vec![
                    "python3".to_string(),
                    "python3-pip".to_string(),
                    "python3-venv".to_string(),
                    "tmux".to_string(),
                    "git".to_string(),
                ],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn repo_url(&self) -> &str {
            "https://github.com/coinone/coinone-bot.git"
        }

        fn project_dir(&self) -> PathBuf {
            self.project_dir.clone()
        }

        fn venv_dir_name(&self) -> &str {
            "venv"
        }

        fn requirements_file(&self) -> &str {
            "requirements.txt"
        }

        fn system_packages(&self) -> &[String] {
            &self.system_packages
        }

        fn package_manager(&self) -> &str {
            "apt-get"
        }

        fn git_command(&self) -> &str {
            "git"
        }

        fn python_command(&self) -> &str {
            "python3"
        }

        fn skip_system_packages(&self) -> bool {
            self.skip_system_packages
        }

        fn upgrade_pip(&self) -> bool {
            self.upgrade_pip
        }

        fn dry_run(&self) -> bool {
            false
        }
    }

    fn kinds(plan: &[Step]) -> Vec<StepKind> {
        plan.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_full_plan_is_the_fixed_sequence() {
        let plan = build_plan(&MockConfig::new());

        assert_eq!(
            kinds(&plan),
            vec![
                StepKind::UpdatePackageIndex,
                StepKind::InstallSystemPackages,
                StepKind::CreateProjectDir,
                StepKind::CloneRepository,
                StepKind::CreateVirtualenv,
                StepKind::UpgradePip,
                StepKind::InstallRequirements,
            ]
        );
    }

    #[test]
    fn test_skip_system_packages_drops_first_two_steps() {
        let mut config = MockConfig::new();
        config.skip_system_packages = true;
        let plan = build_plan(&config);

        assert_eq!(plan.len(), 5);
        assert_eq!(plan[0].kind, StepKind::CreateProjectDir);
    }

    #[test]
    fn test_upgrade_pip_toggle() {
        let mut config = MockConfig::new();
        config.upgrade_pip = false;
        let plan = build_plan(&config);

        assert!(!kinds(&plan).contains(&StepKind::UpgradePip));
        assert_eq!(plan.last().unwrap().kind, StepKind::InstallRequirements);
    }

    #[test]
    fn test_install_command_lists_all_packages() {
        let plan = build_plan(&MockConfig::new());
        let install = &plan[1];

        match &install.action {
            StepAction::Run(spec) => {
                assert_eq!(spec.program, "apt-get");
                assert_eq!(spec.args[0], "install");
                assert_eq!(spec.args[1], "-y");
                assert_eq!(
                    &spec.args[2..],
                    &["python3", "python3-pip", "python3-venv", "tmux", "git"]
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_clone_targets_project_dir() {
        let plan = build_plan(&MockConfig::new());
        let clone = plan
            .iter()
            .find(|s| s.kind == StepKind::CloneRepository)
            .unwrap();

        match &clone.action {
            StepAction::Run(spec) => {
                assert_eq!(spec.program, "git");
                assert_eq!(
                    spec.args,
                    vec![
                        "clone",
                        "https://github.com/coinone/coinone-bot.git",
                        "/home/trader/coinone-bot"
                    ]
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_venv_steps_use_venv_binaries() {
        let plan = build_plan(&MockConfig::new());

        let upgrade = plan
            .iter()
            .find(|s| s.kind == StepKind::UpgradePip)
            .unwrap();
        match &upgrade.action {
            StepAction::Run(spec) => {
                assert_eq!(spec.program, "/home/trader/coinone-bot/venv/bin/python");
                assert_eq!(spec.args, vec!["-m", "pip", "install", "--upgrade", "pip"]);
                assert_eq!(
                    spec.cwd.as_deref(),
                    Some(Path::new("/home/trader/coinone-bot"))
                );
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let install = plan
            .iter()
            .find(|s| s.kind == StepKind::InstallRequirements)
            .unwrap();
        match &install.action {
            StepAction::Run(spec) => {
                assert_eq!(spec.program, "/home/trader/coinone-bot/venv/bin/pip");
                assert_eq!(spec.args, vec!["install", "-r", "requirements.txt"]);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_project_dir_step_is_local_fs_operation() {
        let plan = build_plan(&MockConfig::new());
        let mkdir = plan
            .iter()
            .find(|s| s.kind == StepKind::CreateProjectDir)
            .unwrap();

        assert_eq!(
            mkdir.action,
            StepAction::CreateDir(PathBuf::from("/home/trader/coinone-bot"))
        );
    }
}
