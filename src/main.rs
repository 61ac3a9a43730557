use clap::Parser;
use coinone_provision::utils::logger;
use coinone_provision::{CliConfig, ProvisionEngine, ResolvedConfig, SystemRunner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting coinone-provision");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match ResolvedConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let report_path = config.report_json().cloned();

    // 建立引擎並執行佈建序列
    let engine = ProvisionEngine::new(SystemRunner::new(), config);

    match engine.run().await {
        Ok(report) => {
            tracing::info!(
                "✅ Provisioning finished: {} steps in {}",
                report.outcomes.len(),
                report.finished_at - report.started_at
            );

            if let Some(path) = report_path {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, json)?;
                tracing::info!("📁 Report written to: {}", path.display());
            }
        }
        Err(failure) => {
            // 失敗時仍輸出部分執行報告
            if let Some(path) = report_path {
                let json = serde_json::to_string_pretty(&failure.report)?;
                std::fs::write(&path, json)?;
                tracing::info!("📁 Partial report written to: {}", path.display());
            }

            let e = &failure.error;

            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Provisioning failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                coinone_provision::utils::error::ErrorSeverity::Low => 0,
                coinone_provision::utils::error::ErrorSeverity::Medium => 2,
                coinone_provision::utils::error::ErrorSeverity::High => 1,
                coinone_provision::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
