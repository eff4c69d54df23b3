mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_day, cmd_delete, cmd_food_add, cmd_food_delete, cmd_food_import, cmd_food_list, cmd_log,
    cmd_prune, cmd_range, cmd_report, cmd_search, cmd_show, cmd_update,
};
use crate::config::Config;
use foodlog_core::db::Database;
use foodlog_core::render::TabularRenderer;

/// Longest window `report days` accepts (about a century).
const MAX_REPORT_DAYS: i64 = 36_500;

#[derive(Parser)]
#[command(
    name = "foodlog",
    version,
    about = "Log what you eat and see where the calories come from"
)]
struct Cli {
    /// Database file (overrides config and `FOODLOG_DB`)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a food log entry
    Log {
        /// Food name (at most 30 characters)
        food: String,
        /// Number of servings (e.g. "1", "1.5")
        #[arg(default_value = "1")]
        servings: String,
        /// Meal type: breakfast, brunch, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single entry by ID
    Show {
        /// Entry ID
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries for a day (defaults to today)
    Day {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries between two dates, inclusive
    Range {
        /// First date
        from: String,
        /// Last date
        to: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find entries whose food name contains some text
    Search {
        /// Text to look for (case-insensitive)
        text: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update fields of an entry
    Update {
        /// Entry ID to update
        entry_id: i64,
        /// New food name
        #[arg(long)]
        food: Option<String>,
        /// New number of servings
        #[arg(short, long)]
        servings: Option<String>,
        /// New meal type
        #[arg(long)]
        meal: Option<String>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete entries older than N days
    Prune {
        /// Keep entries from the last N days
        #[arg(long)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the calorie reference table
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Calorie and meal reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to the calorie table
    Add {
        /// Food name (at most 30 characters)
        name: String,
        /// Calories per serving
        #[arg(long)]
        calories: u32,
        /// Category: grain, fruit, vegetable, dairy, protein, other
        #[arg(long, default_value = "other")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a food from the calorie table
    Delete {
        /// Food name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the calorie table
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import foods from a CSV file (`food_name,calories_per_serving,category`)
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum ReportCommands {
    /// Report for yesterday
    Yesterday {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report for a single day
    Date {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report for a date range, inclusive
    Range {
        /// First date
        from: String,
        /// Last date
        to: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report for the last N days, today included
    Days {
        /// Number of days
        #[arg(
            default_value = "7",
            value_parser = clap::value_parser!(u32).range(1..=MAX_REPORT_DAYS)
        )]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(level: &str) {
    // Log to stderr so stdout stays clean for tables and JSON.
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_tracing(&config.log_level);
    tracing::debug!(db = %config.db_path.display(), "configuration loaded");

    let db = Database::open(&config.db_path)?;
    let renderer = TabularRenderer::new(config.columns);

    match cli.command {
        Commands::Log {
            food,
            servings,
            meal,
            date,
            notes,
            json,
        } => cmd_log(&db, &food, &servings, &meal, date, &notes, json),
        Commands::Show { entry_id, json } => cmd_show(&db, &renderer, entry_id, json),
        Commands::Day { date, json } => cmd_day(&db, &renderer, date, json),
        Commands::Range { from, to, json } => cmd_range(&db, &renderer, &from, &to, json),
        Commands::Search { text, json } => cmd_search(&db, &renderer, &text, json),
        Commands::Update {
            entry_id,
            food,
            servings,
            meal,
            date,
            notes,
            json,
        } => cmd_update(
            &db,
            entry_id,
            food.as_deref(),
            servings.as_deref(),
            meal.as_deref(),
            date,
            notes,
            json,
        ),
        Commands::Delete { entry_id, json } => cmd_delete(&db, entry_id, json),
        Commands::Prune { days, json } => cmd_prune(&db, days, json),
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                calories,
                category,
                json,
            } => cmd_food_add(&db, &name, calories, &category, json),
            FoodCommands::Delete { name, json } => cmd_food_delete(&db, &name, json),
            FoodCommands::List { json } => cmd_food_list(&db, json),
            FoodCommands::Import {
                file,
                dry_run,
                json,
            } => cmd_food_import(&db, &file, dry_run, json),
        },
        Commands::Report { command } => cmd_report(&db, command),
    }
}
