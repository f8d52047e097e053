mod config;
mod console;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use classroom_core::Clock;
use classroom_core::report::MonthKey;
use serde::Serialize;
use services::AppServices;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{AppConfig, ConfigFile};
use crate::console::{Command as ConsoleCommand, Console};

#[derive(Parser)]
#[command(name = "attendance", version, about = "Classroom attendance sessions", long_about = None)]
struct Cli {
    /// Optional TOML file with classroom settings and a roster.
    #[arg(long, env = "ATTENDANCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Simulated capture latency in milliseconds.
    #[arg(long, global = true)]
    capture_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive attendance session on stdin.
    Run {
        /// Photo used by `capture` when no path is typed.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Print the dashboard and a monthly report.
    Report {
        /// Month to report, `YYYY-MM`. Defaults to the latest month with data.
        #[arg(long)]
        month: Option<MonthKey>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    dashboard: &'a classroom_core::report::DashboardOverview,
    report: &'a classroom_core::report::MonthlyReport,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the session itself.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    Ok(file.resolve(cli.capture_delay_ms)?)
}

async fn run_console(services: AppServices, photo: Option<PathBuf>) -> anyhow::Result<()> {
    let mut console = Console::open(services, photo).await?;
    println!("{}", console.greeting());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match line.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match console.handle(command).await {
            Ok(out) => print!("{out}"),
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                println!("error: {err:#}");
            }
        }
    }
    if let Some(finished) = console.unsaved() {
        tracing::warn!(summary = %finished.summary, "exiting with unsaved attendance");
    }
    Ok(())
}

async fn print_report(services: &AppServices, month: Option<MonthKey>, json: bool) -> anyhow::Result<()> {
    let reports = services.reports();
    let month = match month {
        Some(month) => month,
        None => reports.default_month().await?,
    };
    let dashboard = reports.dashboard().await?;
    let report = reports.monthly_report(month).await?;

    if json {
        let output = ReportOutput {
            dashboard: &dashboard,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!(
            "{}",
            render::dashboard(services.settings().teacher_name(), &dashboard)
        );
        println!();
        print!("{}", render::monthly_report(&report));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let AppConfig { settings, roster } = load_config(&cli)?;
    tracing::info!(
        teacher = settings.teacher_name(),
        class = settings.class_name(),
        "configuration loaded"
    );

    let services = AppServices::in_memory(settings, Clock::default(), roster)?;
    match cli.command {
        None => run_console(services, None).await,
        Some(Command::Run { photo }) => run_console(services, photo).await,
        Some(Command::Report { month, json }) => print_report(&services, month, json).await,
    }
}
