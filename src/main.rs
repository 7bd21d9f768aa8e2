use clap::{Args, Parser, Subcommand, ValueEnum};
use wallet_risk_scorer::{
    models::{CollectionReport, RiskBand, WalletId},
    config::Settings,
    output::{write_skipped, CsvEmitter, JsonEmitter, ResultEmitter},
    scoring::{AccountCollector, PipelineOutcome, RiskPipeline, WeightTable},
    sources::{ExplorerClient, FixtureSource, LendingDataSource, SubgraphClient, WalletAgeSource},
    utils,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, error};

#[derive(Parser)]
#[clap(name = "wallet-risk")]
#[clap(about = "Score wallets 0-1000 by lending-protocol credit risk", long_about = None)]
struct Cli {
    /// Settings file (defaults to config/default + config/local + env)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect source data for wallets and score them
    Score {
        /// CSV file with a wallet id column
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Wallet id, may be repeated
        #[clap(short, long = "wallet")]
        wallets: Vec<String>,

        /// Serve source data from a JSON fixture instead of the network
        #[clap(long)]
        fixtures: Option<PathBuf>,

        /// Save the collected records for later `rescore`
        #[clap(long)]
        save_collected: Option<PathBuf>,

        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Score a previously saved collection without network access
    Rescore {
        /// Collection report written by `score --save-collected`
        #[clap(long)]
        collected: PathBuf,

        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Print the effective weight table
    Weights {
        /// Strict weights file to load instead of settings. Weights are
        /// non-negative magnitudes: each feature's direction is fixed, and a
        /// negative value is rejected as a configuration error
        #[clap(long)]
        weights: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (stdout when omitted)
    #[clap(short, long)]
    output: Option<PathBuf>,

    #[clap(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Strict weights file overriding the configured table. Weights are
    /// non-negative magnitudes: each feature's direction is fixed, and a
    /// negative value is rejected as a configuration error
    #[clap(long)]
    weights: Option<PathBuf>,

    /// Write skipped wallets and reasons to this CSV
    #[clap(long)]
    skipped: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };
    Ok(settings)
}

fn resolve_weights(settings: &Settings, path: Option<&Path>) -> anyhow::Result<WeightTable> {
    match path {
        Some(path) => Ok(WeightTable::from_file(path)?),
        None => Ok(settings.scoring.weights.clone()),
    }
}

fn build_pipeline(settings: &Settings, weights_path: Option<&Path>) -> anyhow::Result<RiskPipeline> {
    let weights = resolve_weights(settings, weights_path)?;
    let pipeline = RiskPipeline::new(weights, settings.normalizer(), settings.scoring.missing_data)?;
    Ok(pipeline)
}

fn gather_wallets(settings: &Settings, input: Option<&Path>, raw: &[String]) -> anyhow::Result<Vec<WalletId>> {
    let mut wallets = match input {
        Some(path) => utils::load_wallet_file(path, &settings.input.wallet_column)?,
        None => Vec::new(),
    };
    for w in raw {
        wallets.push(WalletId::parse(w)?);
    }
    Ok(utils::dedupe(wallets))
}

fn build_collector(settings: &Settings, fixtures: Option<&Path>) -> anyhow::Result<AccountCollector> {
    let (lending, age): (Arc<dyn LendingDataSource>, Arc<dyn WalletAgeSource>) = match fixtures {
        Some(path) => {
            let source = Arc::new(FixtureSource::from_json_file(path)?);
            info!("Using {} fixture wallets from {}", source.len(), path.display());
            (source.clone() as Arc<dyn LendingDataSource>, source as Arc<dyn WalletAgeSource>)
        }
        None => {
            let timeout = settings.collector.request_timeout_seconds;
            let lending = SubgraphClient::new(settings.sources.lending_client_config(timeout))?;
            let age = ExplorerClient::new(settings.sources.explorer_client_config(timeout))?;
            (
                Arc::new(lending) as Arc<dyn LendingDataSource>,
                Arc::new(age) as Arc<dyn WalletAgeSource>,
            )
        }
    };

    Ok(AccountCollector::new(lending, age, settings.collector_config()))
}

fn emit(outcome: &PipelineOutcome, output: &OutputArgs) -> anyhow::Result<()> {
    let rows = outcome.rows();
    let writer: Box<dyn Write> = match &output.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    match output.format {
        OutputFormat::Csv => CsvEmitter::new(writer).emit(&rows)?,
        OutputFormat::Json => JsonEmitter::new(writer).emit(&rows)?,
    }

    if let Some(path) = &output.skipped {
        write_skipped(BufWriter::new(File::create(path)?), &outcome.skipped)?;
        info!("Wrote {} skipped wallets to {}", outcome.skipped.len(), path.display());
    }

    let mut bands: BTreeMap<&'static str, usize> = BTreeMap::new();
    for scored in &outcome.scored {
        *bands.entry(scored.band().as_str()).or_default() += 1;
    }
    info!(
        "Emitted {} scores, {} skipped; risk bands: {:?}",
        rows.len(),
        outcome.skipped.len(),
        bands
    );
    let very_high = bands.get(RiskBand::VeryHigh.as_str()).copied().unwrap_or(0);
    if very_high > 0 {
        warn!("{} wallets in the very_high risk band", very_high);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.app.log_level);

    // Validate settings
    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(e.into());
    }

    match cli.command {
        Commands::Score {
            input,
            wallets,
            fixtures,
            save_collected,
            output,
        } => {
            let pipeline = build_pipeline(&settings, output.weights.as_deref())?;
            let wallets = gather_wallets(&settings, input.as_deref(), &wallets)?;
            if wallets.is_empty() {
                anyhow::bail!("No wallets given; use --input or --wallet");
            }

            info!("{}: scoring {} wallets", settings.app.name, wallets.len());
            let collector = build_collector(&settings, fixtures.as_deref())?;
            let report = collector.collect(&wallets).await;

            if let Some(path) = &save_collected {
                serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &report)?;
                info!("Saved collection report to {}", path.display());
            }

            let outcome = pipeline.score_report(&report)?;
            emit(&outcome, &output)?;
        }

        Commands::Rescore { collected, output } => {
            let pipeline = build_pipeline(&settings, output.weights.as_deref())?;
            let raw = std::fs::read_to_string(&collected)?;
            let report: CollectionReport = serde_json::from_str(&raw)?;
            info!(
                "Rescoring {} collected wallets frozen at {}",
                report.collected.len(),
                report.as_of
            );

            let outcome = pipeline.score_report(&report)?;
            emit(&outcome, &output)?;
        }

        Commands::Weights { weights } => {
            let table = resolve_weights(&settings, weights.as_deref())?;
            table.validate()?;
            for (field, w) in table.entries() {
                println!("{} = {}", field, w);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_weights_help_explains_sign_rule() {
        let cli = Cli::command();
        for sub in ["score", "rescore", "weights"] {
            let help = cli
                .find_subcommand(sub)
                .and_then(|c| c.get_arguments().find(|a| a.get_id() == "weights"))
                .and_then(|a| a.get_help())
                .map(|h| h.to_string())
                .unwrap();
            assert!(help.contains("non-negative"), "{}: {}", sub, help);
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
