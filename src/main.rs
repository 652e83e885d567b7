use careers_e2e::core::config::DEFAULT_CONFIG_PATH;
use careers_e2e::{BrowserDriver, ChromeDriver, Config, Scenario, ScenarioReport};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run the careers site end-to-end scenario in Chrome.
#[derive(Parser, Debug)]
#[command(name = "careers-e2e", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CAREERS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run without a visible browser window
    #[arg(long)]
    headless: bool,

    /// Write the JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::from(2);
        }
    };
    if cli.headless {
        config.browser.headless = true;
    }

    let report = match run(&config) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Scenario could not start");
            return ExitCode::from(2);
        }
    };

    println!("{}", report.summary());

    if let Some(path) = &cli.report {
        if let Err(e) = write_report(&report, path) {
            error!(path = %path.display(), error = %e, "Failed to write report");
        }
    }

    if report.passed() {
        info!("All steps passed");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(config: &Config) -> careers_e2e::Result<ScenarioReport> {
    let mut driver = ChromeDriver::launch(&config.browser, &config.timeouts)?;
    let report = Scenario::new(&driver, config).map(|scenario| scenario.run());
    if let Err(e) = driver.quit() {
        error!(error = %e, "Failed to close browser session");
    }
    report
}

fn write_report(report: &ScenarioReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    info!(path = %path.display(), "Report written");
    Ok(())
}
