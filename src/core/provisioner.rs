use crate::core::plan::build_plan;
use crate::domain::model::{
    ProvisionReport, Step, StepAction, StepOutcome, StepStatus,
};
use crate::domain::ports::{CommandRunner, ConfigProvider};
use crate::utils::error::{ProvisionError, Result};
use chrono::Utc;
use std::time::Instant;

/// A failed run still carries the partial outcome list, so the report
/// can be written before the error is surfaced.
#[derive(Debug)]
pub struct RunFailure {
    pub error: ProvisionError,
    pub report: ProvisionReport,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives the fixed provisioning sequence: derive the plan from config,
/// execute it step by step, stop at the first failure.
pub struct ProvisionEngine<R: CommandRunner, C: ConfigProvider> {
    runner: R,
    config: C,
}

impl<R: CommandRunner, C: ConfigProvider> ProvisionEngine<R, C> {
    pub fn new(runner: R, config: C) -> Self {
        Self { runner, config }
    }

    pub async fn run(&self) -> std::result::Result<ProvisionReport, RunFailure> {
        let started_at = Utc::now();
        let plan = build_plan(&self.config);
        let project_dir = self.config.project_dir();

        if self.config.dry_run() {
            return Ok(self.dry_run_report(started_at, &plan));
        }

        tracing::info!(
            "🚀 Provisioning host for the coinone bot ({} steps)",
            plan.len()
        );

        let mut outcomes = Vec::with_capacity(plan.len());
        for (index, step) in plan.iter().enumerate() {
            tracing::info!("[{}/{}] {}...", index + 1, plan.len(), step.kind.describe());
            let start = Instant::now();

            let command = match &step.action {
                StepAction::CreateDir(_) => None,
                StepAction::Run(spec) => Some(spec.render()),
            };

            match self.execute(step).await {
                Ok(()) => {
                    let duration = start.elapsed();
                    tracing::info!("✅ {} ({:?})", step.kind.describe(), duration);
                    outcomes.push(StepOutcome {
                        step: step.kind,
                        status: StepStatus::Succeeded,
                        command,
                        duration,
                        detail: None,
                    });
                }
                Err(error) => {
                    let duration = start.elapsed();
                    tracing::error!("❌ Step {} failed after {:?}", step.kind, duration);
                    outcomes.push(StepOutcome {
                        step: step.kind,
                        status: StepStatus::Failed,
                        command,
                        duration,
                        detail: Some(failure_detail(&error)),
                    });
                    let report = ProvisionReport {
                        started_at,
                        finished_at: Utc::now(),
                        project_dir,
                        outcomes,
                    };
                    return Err(RunFailure { error, report });
                }
            }
        }

        let report = ProvisionReport {
            started_at,
            finished_at: Utc::now(),
            project_dir,
            outcomes,
        };

        self.print_next_steps();
        Ok(report)
    }

    async fn execute(&self, step: &Step) -> Result<()> {
        match &step.action {
            StepAction::CreateDir(path) => {
                // 已存在不算錯 (create_dir_all 本身冪等)
                std::fs::create_dir_all(path)?;
                tracing::debug!("Project directory ready at {}", path.display());
            }
            StepAction::Run(spec) => {
                tracing::debug!("Running: {}", spec.render());
                let output = self.runner.run(step.kind, spec).await?;
                if !output.stdout.is_empty() {
                    tracing::debug!(
                        "{} produced {} bytes of stdout",
                        spec.program,
                        output.stdout.len()
                    );
                }
            }
        }
        Ok(())
    }

    fn dry_run_report(&self, started_at: chrono::DateTime<Utc>, plan: &[Step]) -> ProvisionReport {
        println!("Dry run: {} steps, nothing will be executed", plan.len());
        let outcomes = plan
            .iter()
            .map(|step| {
                let command = match &step.action {
                    StepAction::CreateDir(path) => {
                        println!("  {}: mkdir -p {}", step.kind, path.display());
                        None
                    }
                    StepAction::Run(spec) => {
                        println!("  {}: {}", step.kind, spec.render());
                        Some(spec.render())
                    }
                };
                StepOutcome {
                    step: step.kind,
                    status: StepStatus::Skipped,
                    command,
                    duration: std::time::Duration::ZERO,
                    detail: None,
                }
            })
            .collect();

        ProvisionReport {
            started_at,
            finished_at: Utc::now(),
            project_dir: self.config.project_dir(),
            outcomes,
        }
    }

    /// 與原始腳本結尾的說明文字相同：啟動指令、tmux 建議、API 金鑰提醒
    fn print_next_steps(&self) {
        let project_dir = self.config.project_dir();
        let venv = self.config.venv_dir_name();

        println!();
        println!("✅ Provisioning complete!");
        println!();
        println!("Next steps:");
        println!("  cd {}", project_dir.display());
        println!("  source {}/bin/activate", venv);
        println!("  python main.py");
        println!();
        println!("Tip: run the bot inside tmux so it survives logout:");
        println!("  tmux new -s coinone");
        println!();
        println!("⚠️  Add your Coinone API keys before starting the bot.");
    }
}

/// 失敗步驟的 detail：工具 stderr 的最後幾行，否則錯誤本身
fn failure_detail(error: &ProvisionError) -> String {
    match error {
        ProvisionError::CommandFailedError { stderr, .. } if !stderr.is_empty() => stderr
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
