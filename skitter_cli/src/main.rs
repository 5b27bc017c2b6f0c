use skitter_core::archive::CrashArchive;
use skitter_core::campaign::FuzzCampaign;
use skitter_core::config::SkitterConfig;
use skitter_core::corpus::CorpusStore;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; falls back to ./config.toml when present.
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    /// Target command, executable plus fixed flags (the input path is
    /// appended per run). Overrides the config.
    #[clap(long, num_args = 1.., value_name = "CMD")]
    target_command: Option<Vec<String>>,
    /// Seed corpus directory override.
    #[clap(long)]
    corpus_dir: Option<PathBuf>,
    /// Crash output directory override.
    #[clap(long)]
    crashes_dir: Option<PathBuf>,
    /// Worker count override.
    #[clap(short, long)]
    workers: Option<usize>,
    /// Per-worker iteration bound; omit to fuzz until killed.
    #[clap(short, long)]
    iterations: Option<u64>,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let mut config = match cli.config_file {
        Some(config_path) => {
            println!("Loading configuration from specified path: {config_path:?}");
            SkitterConfig::load_from_file(&config_path)?
        }
        None => {
            let default_config_path = PathBuf::from("config.toml");
            if default_config_path.exists() {
                println!(
                    "No config file specified via CLI, loading default: {default_config_path:?}",
                );
                SkitterConfig::load_from_file(&default_config_path)?
            } else {
                println!(
                    "No config file specified and default 'config.toml' not found, using built-in defaults."
                );
                SkitterConfig::default()
            }
        }
    };

    if let Some(command) = cli.target_command {
        config.target.command = command;
    }
    if let Some(corpus_dir) = cli.corpus_dir {
        config.paths.corpus_dir = corpus_dir;
    }
    if let Some(crashes_dir) = cli.crashes_dir {
        config.paths.crashes_dir = crashes_dir;
    }
    if let Some(workers) = cli.workers {
        config.campaign.workers = workers;
    }
    if let Some(iterations) = cli.iterations {
        config.campaign.max_iterations = Some(iterations);
    }

    if config.target.command.is_empty() {
        anyhow::bail!(
            "no target command configured; set [target] command in the config or pass --target-command"
        );
    }

    println!("Effective configuration: {config:#?}");

    let corpus: Arc<CorpusStore<Vec<u8>>> = Arc::new(CorpusStore::load(&config.paths.corpus_dir)?);
    let archive = Arc::new(CrashArchive::new(config.paths.crashes_dir.clone())?);
    println!(
        "Loaded {} distinct seeds from {:?}; crashes go to {:?}",
        corpus.len(),
        config.paths.corpus_dir,
        config.paths.crashes_dir,
    );

    let campaign = FuzzCampaign::new(corpus, archive, config.target, config.campaign);
    let stats = campaign.stats();
    campaign.run()?;

    println!(
        "Campaign finished: {} cases in {:.2?} ({:.2} cases/sec)",
        stats.total_cases(),
        stats.elapsed(),
        stats.cases_per_second(),
    );
    Ok(())
}
