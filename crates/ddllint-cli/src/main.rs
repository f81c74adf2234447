use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ddllint_core::{Config, OutputConfig, OutputMode, Report};
use ddllint_engine::RuleEngine;
use ddllint_sql::DdlExtractor;

mod render;

use render::{generate_html_report, generate_text_report, print_report_summary};

/// Default config file looked up in the working directory
const DEFAULT_CONFIG: &str = "ddllint.toml";

/// ddllint - Structural checks for SQL DDL scripts
#[derive(Parser)]
#[command(name = "ddllint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DDL script to analyze
    file: PathBuf,

    /// Report format (overrides the config file)
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Report file (html/json default to ddl_analysis_report.<ext>)
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Path to config file (default: ddllint.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Evaluate rules on worker threads
    #[arg(long)]
    concurrent: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => OutputMode::Text,
            OutputFormat::Html => OutputMode::Html,
            OutputFormat::Json => OutputMode::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref(), cli.verbose)?;
    if let Some(format) = cli.output {
        config.output.mode = format.into();
    }
    if let Some(path) = cli.output_path.clone() {
        config.output.path = Some(path);
    }

    let report = check_file(&cli.file, &config, cli.concurrent, cli.verbose)?;
    write_report(&report, &config.output, cli.verbose)?;

    // Exit with error code if there are errors
    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    Ok(config)
}

/// Extract, validate and build the report for one DDL file
fn check_file(path: &Path, config: &Config, concurrent: bool, verbose: bool) -> Result<Report> {
    let ddl = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read DDL file {}", path.display()))?;

    if verbose {
        eprintln!("{} {}", "Analyzing".cyan(), path.display());
    }

    let extraction = DdlExtractor::from_config(config).extract(&ddl);
    let engine = RuleEngine::new(config);
    tracing::info!(
        tables = extraction.schema.len(),
        parse_findings = extraction.findings.len(),
        "extraction finished"
    );

    let mut findings = engine.screen(extraction.findings);
    if concurrent {
        findings.extend(engine.validate_concurrent(&extraction.schema));
    } else {
        findings.extend(engine.validate(&extraction.schema));
    }

    Ok(Report::from_findings(findings, extraction.schema.len()).with_source(path.display().to_string()))
}

fn write_report(report: &Report, output: &OutputConfig, verbose: bool) -> Result<()> {
    let path = output.resolved_path();

    match (output.mode, &path) {
        (OutputMode::Text, None) => {}
        (OutputMode::Text, Some(path)) => {
            std::fs::write(path, generate_text_report(report))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        (OutputMode::Html, Some(path)) => {
            std::fs::write(path, generate_html_report(report))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        (OutputMode::Json, Some(path)) => {
            report
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        (mode, None) => anyhow::bail!("No output path for {:?} report", mode),
    }

    print_report_summary(report);

    if let Some(path) = path {
        if verbose || output.mode != OutputMode::Text {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "ddllint",
            "schema.sql",
            "--output",
            "html",
            "--output-path",
            "out.html",
            "--concurrent",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("schema.sql"));
        assert_eq!(cli.output, Some(OutputFormat::Html));
        assert_eq!(cli.output_path, Some(PathBuf::from("out.html")));
        assert!(cli.concurrent);
        assert!(cli.verbose);
    }

    #[test]
    fn file_is_required() {
        assert!(Cli::try_parse_from(["ddllint"]).is_err());
    }

    #[test]
    fn check_fixture_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/shop.sql");
        let config = Config::default();

        let sequential = check_file(&path, &config, false, false).unwrap();
        let concurrent = check_file(&path, &config, true, false).unwrap();

        assert_eq!(sequential.summary.tables_checked, 6);
        assert_eq!(sequential.findings, concurrent.findings);
        assert!(sequential.has_errors());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = check_file(Path::new("does/not/exist.sql"), &Config::default(), false, false)
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.sql"));
    }
}
