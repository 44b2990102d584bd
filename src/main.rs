mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use iris::config::IrisConfig;

#[derive(Parser)]
#[command(name = "iris", version, about = "Iterative prompt critique and rewrite with memory recall")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or upgrade the memory database
    Init,
    /// Critique and rewrite a prompt until its clarity is stable, then save it
    Refine {
        prompt: String,
        /// Maximum critique passes
        #[arg(long)]
        max_passes: Option<u32>,
        /// Clarity score (1-10) that counts as done
        #[arg(long)]
        stop_score: Option<u8>,
        /// Skip recalling similar past prompts
        #[arg(long)]
        no_memory: bool,
        /// Split the prompt into subtasks before refining
        #[arg(long)]
        decompose: bool,
        /// Fall back to the raw critique when no rewritten prompt is found
        #[arg(long)]
        permissive: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a prompt directly
    Save {
        text: String,
        /// Clarity score (1-10) to record with it
        #[arg(long)]
        clarity: Option<u8>,
    },
    /// Find stored prompts similar to a query
    Search {
        query: String,
        /// Number of results
        #[arg(short = 'n', long, default_value_t = 3)]
        limit: usize,
    },
    /// Break a complex prompt into refined subtasks
    Decompose { prompt: String },
    /// Show memory statistics
    Stats,
    /// Check database health
    Doctor {
        /// Also embed a probe string and report its dimension and norm
        #[arg(long)]
        probe_embedding: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = IrisConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Every command makes blocking HTTP and SQLite calls, so it runs off the async runtime.
    tokio::task::spawn_blocking(move || run(cli.command, &config)).await?
}

fn run(command: Command, config: &IrisConfig) -> Result<()> {
    match command {
        Command::Init => cli::init::init(config),
        Command::Refine {
            prompt,
            max_passes,
            stop_score,
            no_memory,
            decompose,
            permissive,
            json,
        } => {
            let args = cli::refine::RefineArgs {
                max_passes,
                stop_score,
                no_memory,
                decompose,
                permissive,
                json,
            };
            cli::refine::refine(config, &prompt, &args)
        }
        Command::Save { text, clarity } => cli::save::save(config, &text, clarity),
        Command::Search { query, limit } => cli::search::search(config, &query, limit),
        Command::Decompose { prompt } => cli::decompose::decompose(config, &prompt),
        Command::Stats => cli::stats::stats(config),
        Command::Doctor { probe_embedding } => cli::doctor::doctor(config, probe_embedding),
    }
}
