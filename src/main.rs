// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compliancebot CLI - Component Compliance Validation Engine
//!
//! Part of the gitbot-fleet ecosystem.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use compliancebot::analyzers::AccessibilityReport;
use compliancebot::config::{self, Config};
use compliancebot::dom::Document;
use compliancebot::orchestrator;
use compliancebot::performance::{
    export_report, quick_performance_validation, BundleSizes, PerformanceValidator, ReportStore,
};
use compliancebot::report::{generate_report, OutputFormat};
use compliancebot::scanner;
use compliancebot::theme::MunicipalityThemeTester;
use compliancebot::validation::RunStatus;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Component compliance validation for gitbot-fleet
#[derive(Parser)]
#[command(name = "compliancebot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every validating subcommand
#[derive(Args)]
struct CommonArgs {
    /// Config file (YAML or TOML); defaults to the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: FormatArg,

    /// Output file (stdout if not specified)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the theme checks for one brand
    Theme {
        /// Rendered HTML snapshot
        file: PathBuf,

        /// Brand identifier
        #[arg(long)]
        brand: String,

        /// Selector of the component under test (first element in <body> if empty)
        #[arg(long, default_value = "")]
        selector: String,

        /// Also compare against every other brand
        #[arg(long)]
        cross_theme: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the accessibility rule modules
    A11y {
        /// Rendered HTML snapshot
        file: PathBuf,

        /// Selector of the component under test
        #[arg(long, default_value = "")]
        selector: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the performance budget checks
    Perf {
        /// Rendered HTML snapshot
        file: PathBuf,

        /// Component name used for the budget category lookup
        #[arg(long)]
        component: String,

        /// Selector of the component under test
        #[arg(long, default_value = "")]
        selector: String,

        /// Only Core Web Vitals, rendering and bundle size
        #[arg(long)]
        quick: bool,

        #[command(flatten)]
        bundle: BundleArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the theme checks across several brands
    Sweep {
        /// Rendered HTML snapshot
        file: PathBuf,

        /// Brand identifiers (all catalog brands if empty)
        #[arg(long, value_delimiter = ',')]
        brands: Vec<String>,

        /// Selector of the component under test
        #[arg(long, default_value = "")]
        selector: String,

        /// Wall-clock budget in seconds, overriding the config
        #[arg(long)]
        budget_secs: Option<u64>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the accessibility modules over a directory of snapshots
    Scan {
        /// Directory to scan
        dir: PathBuf,

        /// Selector of the component under test in every snapshot
        #[arg(long, default_value = "")]
        selector: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run the performance checks and write a graded report file
    Export {
        /// Rendered HTML snapshot
        file: PathBuf,

        /// Component name used for the budget category lookup
        #[arg(long)]
        component: String,

        /// Selector of the component under test
        #[arg(long, default_value = "")]
        selector: String,

        /// Directory the report file is written to
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        bundle: BundleArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Write a default config file
    Init {
        /// Target path (.yml or .toml); defaults to the user config directory
        path: Option<PathBuf>,
    },

    /// Print the effective config
    Show {
        /// Config file to read
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Reported bundle sizes; estimated from the budget when omitted
#[derive(Args)]
struct BundleArgs {
    /// Reported script size in KB
    #[arg(long)]
    script_kb: Option<f64>,

    /// Reported style size in KB
    #[arg(long)]
    style_kb: Option<f64>,
}

impl BundleArgs {
    fn sizes(&self) -> Option<BundleSizes> {
        match (self.script_kb, self.style_kb) {
            (None, None) => None,
            (script, style) => Some(BundleSizes {
                script_kb: script.unwrap_or(0.0),
                style_kb: style.unwrap_or(0.0),
            }),
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("compliancebot=debug")
    } else {
        EnvFilter::new("compliancebot=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Theme { file, brand, selector, cross_theme, common } => {
            init_logging(common.verbose);
            let config = load(common.config.as_deref())?;
            let catalog = config.catalog();
            let document = read_document(&file)?;
            let element = document.component(&selector)?;

            let mut options = config.theme_options();
            options.test_cross_theme |= cross_theme;
            let report = MunicipalityThemeTester::new(&catalog, &brand)?
                .run_complete_theme_tests(&element, &options);
            write_output(&generate_report(&report, common.format.into()), common.output.as_deref())?;

            if report.summary.status != RunStatus::Passed {
                std::process::exit(1);
            }
        }

        Commands::A11y { file, selector, common } => {
            init_logging(common.verbose);
            let document = read_document(&file)?;
            let element = document.component(&selector)?;

            let report = AccessibilityReport::of(&element);
            write_output(&generate_report(&report, common.format.into()), common.output.as_deref())?;

            if !report.is_accessible() {
                std::process::exit(1);
            }
        }

        Commands::Perf { file, component, selector, quick, bundle, common } => {
            init_logging(common.verbose);
            let config = load(common.config.as_deref())?;
            let catalog = config.catalog();
            let document = read_document(&file)?;
            let element = document.component(&selector)?;

            let mut metrics = config.metrics();
            if let Some(sizes) = bundle.sizes() {
                metrics = metrics.with_bundle_size(&component, sizes);
            }

            let passed = if quick {
                let quick = quick_performance_validation(&catalog, &element, &component, metrics);
                write_output(&generate_report(&quick, common.format.into()), common.output.as_deref())?;
                quick.passed()
            } else {
                let report = PerformanceValidator::new(&catalog, &component)
                    .with_metrics(metrics)
                    .with_options(config.performance_options())
                    .run_comprehensive_performance_tests(&element);
                write_output(&generate_report(&report, common.format.into()), common.output.as_deref())?;
                report.summary.status == RunStatus::Passed
            };

            if !passed {
                std::process::exit(1);
            }
        }

        Commands::Sweep { file, brands, selector, budget_secs, common } => {
            init_logging(common.verbose);
            let config = load(common.config.as_deref())?;
            let catalog = config.catalog();
            let document = read_document(&file)?;
            let element = document.component(&selector)?;

            let control = match budget_secs {
                Some(secs) => config.sweep_control().with_budget(Duration::from_secs(secs)),
                None => config.sweep_control(),
            };
            let options = config.theme_options();
            let report = if brands.is_empty() {
                orchestrator::test_component_across_all_brands(&catalog, &element, &options, &control)
            } else {
                let ids: Vec<&str> = brands.iter().map(String::as_str).collect();
                orchestrator::test_component_across_brands(&catalog, &element, &ids, &options, &control)
            };
            write_output(&generate_report(&report, common.format.into()), common.output.as_deref())?;

            if !report.passed() {
                std::process::exit(1);
            }
        }

        Commands::Scan { dir, selector, common } => {
            init_logging(common.verbose);
            let scan = scanner::scan_directory(&dir, &selector)?;
            write_output(&generate_report(&scan, common.format.into()), common.output.as_deref())?;

            if !scan.is_accessible() {
                std::process::exit(1);
            }
        }

        Commands::Export { file, component, selector, dir, bundle, common } => {
            init_logging(common.verbose);
            let config = load(common.config.as_deref())?;
            let catalog = config.catalog();
            let document = read_document(&file)?;
            let element = document.component(&selector)?;

            let mut metrics = config.metrics();
            if let Some(sizes) = bundle.sizes() {
                metrics = metrics.with_bundle_size(&component, sizes);
            }
            let mut store = ReportStore::new();
            store.append(
                PerformanceValidator::new(&catalog, &component)
                    .with_metrics(metrics)
                    .with_options(config.performance_options())
                    .run_comprehensive_performance_tests(&element),
            );

            let exported = export_report(&store, &config.environment, chrono::Utc::now())?;
            let path = exported.write_to(&dir)?;
            eprintln!("Report written to {}", path.display());
            write_output(&generate_report(&exported, common.format.into()), common.output.as_deref())?;
        }

        Commands::Init { path } => {
            let path = path.unwrap_or_else(config::default_config_path);
            if path.exists() {
                anyhow::bail!("Config already exists at {}", path.display());
            }
            config::write_default_config(&path)?;
            println!("Wrote default config to {}", path.display());
        }

        Commands::Show { config: path } => {
            let path = path.unwrap_or_else(config::default_config_path);
            let config = config::load_config(&path)?;
            println!("{}", config::render_config(&config, &path)?);
        }
    }

    Ok(())
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    config::load_config(&path).with_context(|| format!("loading config from {}", path.display()))
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let markup = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    Ok(Document::parse(&markup))
}

/// Write output to file or stdout
fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Report written to {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
