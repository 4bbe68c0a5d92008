mod config;
mod status_cmd;
mod terminal_output;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use labelscan_analysis::LabelAnalyzer;
use labelscan_config::{load_and_prepare, redact, validate, LabelScanConfig};
use labelscan_core::{AnalysisReport, RawText};
use labelscan_gateway::{start_server, GatewayState};
use labelscan_logging::{init_console_logger, init_logger};
use labelscan_media::validate_upload;
use labelscan_providers::{PapagoTranslator, TesseractOcr};

use config::Config;
use terminal_output::{note_warn, render_report, supports_color};

#[derive(Parser)]
#[command(name = "labelscan")]
#[command(about = "LabelScan: nutrient and allergen extraction from food label photos")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $LABELSCAN_CONFIG or ~/.labelscan/labelscan.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload API server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// OCR and analyze one label image
    Analyze {
        image: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_translate: bool,
    },
    /// Analyze already-recognized label text ("-" reads stdin)
    AnalyzeText {
        file: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_translate: bool,
    },
    /// Check whether a gateway is running
    Status {
        /// Gateway base URL (defaults to the configured port on localhost)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let env = Config::from_env();
    let config_path = cli.config.clone().unwrap_or_else(|| env.config_path.clone());

    let mut config = load_and_prepare(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    env.apply(&mut config);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = Some(host);
            }
            if let Some(port) = port {
                config.gateway.port = Some(port);
            }
            init_logger(config.logging.dir(), config.logging.level())?;
            log_validation(&config);
            run_server(config).await?;
        }
        Commands::Analyze {
            image,
            json,
            no_translate,
        } => {
            init_console_logger(env.log_level.as_deref().unwrap_or("warn"));
            let analyzer = build_analyzer(&config, !no_translate)?;
            let report = analyze_image(&config, &analyzer, &image).await?;
            print_report(&report, json)?;
        }
        Commands::AnalyzeText {
            file,
            json,
            no_translate,
        } => {
            init_console_logger(env.log_level.as_deref().unwrap_or("warn"));
            let analyzer = build_analyzer(&config, !no_translate)?;
            let text = read_text(&file).await?;
            let report = analyzer.analyze(RawText::new(text)).await;
            print_report(&report, json)?;
        }
        Commands::Status { url } => {
            let url = url.unwrap_or_else(|| format!("http://localhost:{}", config.gateway.port()));
            if !status_cmd::run(&url).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config => {
            let value = serde_json::to_value(&config)?;
            println!("{}", serde_json::to_string_pretty(&redact(&value))?);
            let report = validate(&config);
            for warning in &report.warnings {
                note_warn(&format!("{}: {}", warning.path, warning.message));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn log_validation(config: &LabelScanConfig) {
    for warning in validate(config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
}

fn build_analyzer(config: &LabelScanConfig, translate: bool) -> Result<LabelAnalyzer> {
    let analyzer = LabelAnalyzer::new(config)?;
    if !translate {
        return Ok(analyzer);
    }
    Ok(match PapagoTranslator::from_config(&config.translation) {
        Some(translator) => analyzer.with_translator(Arc::new(translator)),
        None => analyzer,
    })
}

async fn analyze_image(
    config: &LabelScanConfig,
    analyzer: &LabelAnalyzer,
    image: &Path,
) -> Result<AnalysisReport> {
    let data = tokio::fs::read(image)
        .await
        .with_context(|| format!("cannot read {}", image.display()))?;
    validate_upload(&data, None, config.gateway.max_upload_bytes())?;
    let ocr = TesseractOcr::from_config(&config.ocr);
    Ok(analyzer.analyze_image(&ocr, &data).await?)
}

async fn read_text(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("cannot read stdin")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))
}

fn print_report(report: &AnalysisReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_report(report, supports_color()));
    }
    Ok(())
}

async fn run_server(config: LabelScanConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.host(), config.gateway.port())
        .parse()
        .context("invalid bind address")?;

    let analyzer = build_analyzer(&config, true)?;
    info!(
        %addr,
        upload_dir = %config.gateway.upload_dir().display(),
        translation = analyzer.translation_enabled(),
        ocr_languages = %config.ocr.language_hint(),
        "Starting LabelScan"
    );

    let ocr = Arc::new(TesseractOcr::from_config(&config.ocr));
    let state = GatewayState::new(&config.gateway, analyzer, ocr);
    start_server(addr, state).await
}
