use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use reply_guard::config::validate_min_human_score;
use reply_guard::{
    logging, save_records, AppConfig, FeedQuery, FetchRequest, Fetcher, JsonFileFeed, Record,
    ReplyFilter, RetryingFetcher, Ruleset,
};

#[derive(Parser)]
#[command(
    name = "reply-guard",
    about = "Filter social posts down to human, reply-worthy conversations",
    version
)]
struct Cli {
    /// Configuration file (defaults to ./reply-guard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter a JSON array of records and print the ranked survivors
    Filter {
        /// Records file (reads stdin if omitted)
        file: Option<PathBuf>,

        /// Minimum human score to keep a record
        #[arg(long)]
        min_score: Option<f64>,

        /// Ruleset TOML file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Keyword or @handle to select records from FILE before filtering
        #[arg(long, requires = "file")]
        query: Option<String>,

        /// Upper bound on records selected by --query
        #[arg(long, requires = "query")]
        max_results: Option<u32>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print drop counters to stderr
        #[arg(long)]
        stats: bool,
    },
    /// Print the detector verdicts for each file (reads stdin if none provided)
    Analyze {
        files: Vec<PathBuf>,

        /// Ruleset TOML file
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Print the effective ruleset as TOML
    Rules {
        /// Ruleset TOML file to merge over the defaults
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn load_ruleset(config: &AppConfig, rules: Option<&Path>) -> Result<Ruleset> {
    match rules {
        Some(path) => Ruleset::from_file(path)
            .with_context(|| format!("failed to load ruleset {}", path.display())),
        None => config.ruleset().context("failed to load configured ruleset"),
    }
}

fn load_records(
    config: &AppConfig,
    file: Option<&Path>,
    query: Option<&str>,
    max_results: Option<u32>,
) -> Result<Vec<Record>> {
    match (file, query) {
        (Some(path), Some(query)) => {
            let request = FetchRequest::new(
                FeedQuery::parse(query),
                max_results.unwrap_or(config.fetch.max_results),
            );
            let fetcher =
                RetryingFetcher::new(JsonFileFeed::new(path), config.fetch.retry_policy());
            fetcher
                .fetch(&request)
                .with_context(|| format!("failed to fetch {} from {}", query, path.display()))
        }
        (Some(path), None) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse records in {}", path.display()))
        }
        (None, _) => serde_json::from_str(&read_stdin()?).context("failed to parse records on stdin"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    logging::init_logging(level)?;

    match cli.command {
        Command::Filter {
            file,
            min_score,
            rules,
            query,
            max_results,
            output,
            stats,
        } => {
            let filter = ReplyFilter::new(load_ruleset(&config, rules.as_deref())?)?;
            let records = load_records(&config, file.as_deref(), query.as_deref(), max_results)?;
            let min_score = min_score.unwrap_or(config.filter.min_human_score);
            validate_min_human_score(min_score)?;

            let outcome = filter.filter_with_stats(records, min_score);
            if stats {
                eprintln!("{}", serde_json::to_string_pretty(&outcome.stats)?);
            }
            match output {
                Some(path) => save_records(&path, &outcome.records)?,
                None => println!("{}", serde_json::to_string_pretty(&outcome.records)?),
            }
        }
        Command::Analyze { files, rules } => {
            let filter = ReplyFilter::new(load_ruleset(&config, rules.as_deref())?)?;
            if files.is_empty() {
                let result = filter.analyze(read_stdin()?.trim_end_matches('\n'));
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for path in &files {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let result = filter.analyze(text.trim_end_matches('\n'));
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
            }
        }
        Command::Rules { rules } => {
            let ruleset = load_ruleset(&config, rules.as_deref())?;
            print!("{}", ruleset.to_toml_string()?);
        }
    }

    Ok(())
}
