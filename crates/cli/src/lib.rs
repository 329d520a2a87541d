pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use fengshui_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

use commands::analyze::AnalyzeArgs;
use commands::catalog::CatalogAction;
use commands::compatibility::CompatibilityQuery;
use commands::rank::RankArgs;
use commands::rule::RuleAction;

#[derive(Debug, Parser)]
#[command(
    name = "fengshui",
    about = "Five-element compatibility engine operator CLI",
    long_about = "Classify birth years, inspect element rules and compatibility, and rank catalog items by element affinity.",
    after_help = "Examples:\n  fengshui seed --demo-catalog\n  fengshui analyze --year 1990 --focus career\n  fengshui compatibility Wood Fire\n  fengshui rank --year 1984 --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Insert the default element rules when the rule store is empty")]
    Seed {
        #[arg(long, help = "Also import the bundled demo catalog")]
        demo_catalog: bool,
    },
    #[command(about = "Classify a birth year into its element")]
    Classify {
        #[arg(long)]
        year: i32,
    },
    #[command(about = "Produce a personal element analysis for a birth year")]
    Analyze {
        #[arg(long)]
        year: i32,
        #[arg(long, help = "male | female")]
        gender: Option<String>,
        #[arg(long, help = "career | health | relationship | wealth")]
        focus: Option<String>,
        #[arg(long, help = "Free-text preferences; adds a suggestions block")]
        preferences: Option<String>,
    },
    #[command(subcommand, about = "Inspect and administer element rules")]
    Rule(RuleCommand),
    #[command(about = "Directional compatibility between two elements")]
    Compatibility {
        #[arg(required_unless_present = "matrix")]
        first: Option<String>,
        #[arg(required_unless_present = "matrix")]
        second: Option<String>,
        #[arg(long, conflicts_with_all = ["first", "second"], help = "Evaluate every ordered pair")]
        matrix: bool,
    },
    #[command(about = "Rank catalog items for a birth year")]
    Rank {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, help = "Score beneficial colors at 20 instead of 30")]
        plain_beneficial: bool,
    },
    #[command(subcommand, about = "Manage catalog items")]
    Catalog(CatalogCommand),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

#[derive(Debug, Subcommand)]
enum RuleCommand {
    #[command(about = "Show the active rule for an element")]
    Show { element: String },
    #[command(about = "List rules sorted by element name")]
    List {
        #[arg(long, help = "Include soft-deleted records")]
        include_deleted: bool,
    },
    #[command(about = "Find the rule whose birth-year table lists a year")]
    ByYear { year: i32 },
    #[command(about = "Create a rule from a JSON document")]
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Patch the active rule for an element from a JSON document")]
    Update {
        element: String,
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Soft-delete the active rule for an element")]
    Delete { element: String },
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    #[command(about = "Import items from a JSON array")]
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Show one catalog item")]
    Show { id: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report configuration problems themselves.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("logging disabled: {error}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed { demo_catalog } => commands::seed::run(demo_catalog),
        Command::Classify { year } => commands::classify::run(year),
        Command::Analyze { year, gender, focus, preferences } => {
            commands::analyze::run(AnalyzeArgs { year, gender, focus, preferences })
        }
        Command::Rule(rule) => commands::rule::run(match rule {
            RuleCommand::Show { element } => RuleAction::Show { element },
            RuleCommand::List { include_deleted } => RuleAction::List { include_deleted },
            RuleCommand::ByYear { year } => RuleAction::ByYear { year },
            RuleCommand::Create { file } => RuleAction::Create { file },
            RuleCommand::Update { element, file } => RuleAction::Update { element, file },
            RuleCommand::Delete { element } => RuleAction::Delete { element },
        }),
        Command::Compatibility { first, second, matrix } => {
            let query = match (matrix, first, second) {
                (false, Some(first), Some(second)) => CompatibilityQuery::Pair { first, second },
                _ => CompatibilityQuery::Matrix,
            };
            commands::compatibility::run(query)
        }
        Command::Rank { year, category, limit, plain_beneficial } => {
            commands::rank::run(RankArgs { year, category, limit, plain_beneficial })
        }
        Command::Catalog(catalog) => commands::catalog::run(match catalog {
            CatalogCommand::Import { file } => CatalogAction::Import { file },
            CatalogCommand::Show { id } => CatalogAction::Show { id },
        }),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr; stdout carries only the JSON payload.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|error| anyhow!("invalid log filter: {error}"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("could not install tracing subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compatibility_requires_pair_or_matrix() {
        use clap::Parser;

        assert!(Cli::try_parse_from(["fengshui", "compatibility", "Wood", "Fire"]).is_ok());
        assert!(Cli::try_parse_from(["fengshui", "compatibility", "--matrix"]).is_ok());
        assert!(Cli::try_parse_from(["fengshui", "compatibility", "Wood"]).is_err());
        assert!(Cli::try_parse_from(["fengshui", "compatibility"]).is_err());
    }
}
