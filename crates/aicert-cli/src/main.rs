//! aicert - model validation and certification CLI
//!
//! ## Commands
//!
//! - `validate`: run the check battery and issue a certification
//! - `red-team`: run the red-team probes and report vulnerabilities
//! - `generate`: write a synthetic dataset and a matching reference model

mod dataset_io;
mod generate;

use std::path::{Path, PathBuf};

use aicert_core::{
    render_certificate, render_redteam_summary, render_summary, telemetry, ComplianceStandard,
    Dataset, LogisticModel, RedTeamAssessment, RedTeamConfig, ValidationConfig, Validator,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "aicert")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI model validation and certification", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Model and dataset inputs shared by the assessment commands.
#[derive(Args)]
struct Inputs {
    /// Logistic model parameters (JSON)
    #[arg(long, env = "AICERT_MODEL")]
    model: PathBuf,

    /// Evaluation dataset (CSV with a header row)
    #[arg(long, env = "AICERT_DATASET")]
    dataset: PathBuf,

    /// Name of the label column
    #[arg(long, default_value = "label")]
    label_column: String,

    /// Evaluate on a seeded random split holding this fraction of rows
    #[arg(long)]
    holdout: Option<f64>,

    /// Seed for perturbations and the holdout split
    #[arg(long, env = "AICERT_SEED")]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model and issue a certification
    Validate {
        #[command(flatten)]
        inputs: Inputs,

        /// TOML configuration with thresholds and weights
        #[arg(long, env = "AICERT_CONFIG")]
        config: Option<PathBuf>,

        /// Compliance standard (nist-ai-rmf, eu-ai-act, iso-iec-42001, owasp-ml-top-10)
        #[arg(long)]
        standard: Option<ComplianceStandard>,

        /// Name of the AI system on the certificate
        #[arg(long)]
        model_name: Option<String>,

        /// Report output path (JSON)
        #[arg(short, long, default_value = "results/validation_report.json")]
        output: PathBuf,

        /// Certificate document output path
        #[arg(long, default_value = "results/certificate.txt")]
        certificate: PathBuf,
    },

    /// Probe a model for vulnerabilities
    RedTeam {
        #[command(flatten)]
        inputs: Inputs,

        /// TOML configuration for the probes
        #[arg(long, env = "AICERT_REDTEAM_CONFIG")]
        config: Option<PathBuf>,

        /// Name of the target system
        #[arg(long)]
        model_name: Option<String>,

        /// Noise scale of the adversarial probe
        #[arg(long)]
        epsilon: Option<f64>,

        /// Report output path (JSON)
        #[arg(short, long, default_value = "results/red_team_report.json")]
        output: PathBuf,
    },

    /// Generate a synthetic dataset and reference model
    Generate {
        /// Directory for the dataset CSV and model JSON
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// Number of rows
        #[arg(long, default_value = "1500")]
        samples: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing(cli.json, telemetry::level_for(cli.verbose));

    match cli.command {
        Commands::Validate {
            inputs,
            config,
            standard,
            model_name,
            output,
            certificate,
        } => {
            let mut cfg = match config {
                Some(path) => ValidationConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {:?}", path))?,
                None => ValidationConfig::default(),
            };
            if let Some(standard) = standard {
                cfg.compliance_standard = standard;
            }
            if let Some(name) = model_name {
                cfg.subject_name = name;
            }
            if inputs.seed.is_some() {
                cfg.seed = inputs.seed;
            }
            cmd_validate(&inputs, &cfg, &output, &certificate)
        }
        Commands::RedTeam {
            inputs,
            config,
            model_name,
            epsilon,
            output,
        } => {
            let mut cfg = match config {
                Some(path) => RedTeamConfig::load(&path)
                    .with_context(|| format!("Failed to load config: {:?}", path))?,
                None => RedTeamConfig::default(),
            };
            if let Some(name) = model_name {
                cfg.model_name = name;
            }
            if let Some(epsilon) = epsilon {
                cfg.epsilon = epsilon;
            }
            if inputs.seed.is_some() {
                cfg.seed = inputs.seed;
            }
            cmd_red_team(&inputs, &cfg, &output)
        }
        Commands::Generate {
            output_dir,
            samples,
            seed,
        } => cmd_generate(&output_dir, samples, seed),
    }
}

/// Load the model and dataset, apply the holdout split, and check widths.
fn load_inputs(inputs: &Inputs) -> Result<(LogisticModel, Dataset)> {
    info!(path = ?inputs.model, "loading model");
    let json = std::fs::read_to_string(&inputs.model)
        .with_context(|| format!("Failed to read model: {:?}", inputs.model))?;
    let model = LogisticModel::from_json(&json)
        .with_context(|| format!("Invalid model: {:?}", inputs.model))?;

    info!(path = ?inputs.dataset, "loading dataset");
    let table = dataset_io::load_csv(&inputs.dataset, &inputs.label_column)?;
    let dataset = match inputs.holdout {
        Some(fraction) => dataset_io::holdout(&table.dataset, fraction, inputs.seed.unwrap_or(42))?,
        None => table.dataset,
    };

    if dataset.is_empty() {
        bail!("dataset {:?} has no rows to evaluate", inputs.dataset);
    }
    if dataset.width() != model.width() {
        bail!(
            "model expects {} features but dataset has {}",
            model.width(),
            dataset.width()
        );
    }
    println!("Loaded {} evaluation samples", dataset.len());
    Ok((model, dataset))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
}

fn cmd_validate(
    inputs: &Inputs,
    config: &ValidationConfig,
    output: &Path,
    certificate: &Path,
) -> Result<()> {
    let validator = Validator::from_config(config).context("Invalid validation config")?;
    let (model, dataset) = load_inputs(inputs)?;

    let report = validator.assess(&model, &dataset);

    print!("{}", render_summary(&report));
    write_file(output, &report.to_json_pretty()?)?;
    println!("Validation report saved to {:?}", output);
    write_file(certificate, &render_certificate(&report))?;
    println!("Certificate document saved to {:?}", certificate);
    Ok(())
}

fn cmd_red_team(inputs: &Inputs, config: &RedTeamConfig, output: &Path) -> Result<()> {
    let assessment = RedTeamAssessment::from_config(config).context("Invalid red-team config")?;
    let (model, dataset) = load_inputs(inputs)?;

    let report = assessment.run(&model, &dataset);

    print!("{}", render_redteam_summary(&report));
    write_file(output, &report.to_json_pretty()?)?;
    println!("Red-team report saved to {:?}", output);
    Ok(())
}

fn cmd_generate(output_dir: &Path, samples: usize, seed: u64) -> Result<()> {
    if samples == 0 {
        bail!("--samples must be at least 1");
    }
    let sample = generate::generate(samples, seed)?;
    let (dataset_path, model_path) = generate::write_sample(output_dir, &sample)?;
    println!(
        "Generated {} samples with {} features",
        sample.table.dataset.len(),
        sample.table.feature_names.len()
    );
    println!("Dataset saved to {:?}", dataset_path);
    println!("Model saved to {:?}", model_path);
    Ok(())
}
