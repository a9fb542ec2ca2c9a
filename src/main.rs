use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use habit_progress::aggregate::{self, HabitContext};
use habit_progress::config::Settings;
use habit_progress::{calendar, db, report};

#[derive(Parser)]
#[command(name = "habit-progress")]
#[command(about = "Habit goal progress and streak dashboard", long_about = None)]
struct Cli {
    /// Evaluate as of this local date instead of the clock.
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
    /// The user's offset from UTC in minutes.
    #[arg(long, global = true, env = "HABIT_UTC_OFFSET_MINUTES", default_value_t = 0, allow_hyphen_values = true)]
    utc_offset_minutes: i32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample habits, groups and entries
    Seed,
    /// Import habit entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print today's progress, optionally for a single group
    Dashboard {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "habit-report.md")]
        out: PathBuf,
    },
    /// Delete a group, leaving its habits ungrouped
    DeleteGroup {
        #[arg(long)]
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(cli.utc_offset_minutes, cli.today, Utc::now())?;
    tracing::debug!(today = %settings.today, offset = %settings.offset, "resolved settings");

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool, settings.today).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv, settings.today).await?;
            println!(
                "Inserted {} entries from {} ({} duplicates, {} rejected).",
                summary.inserted,
                csv.display(),
                summary.duplicates,
                summary.rejected
            );
        }
        Commands::Dashboard { group, json } => {
            let contexts = load_contexts(&pool, settings.today).await?;
            let groups = db::fetch_groups(&pool).await?;
            let mut group_stats = aggregate::group_stats(&groups, &contexts);

            if let Some(name) = group.as_deref() {
                group_stats.retain(|g| g.name.eq_ignore_ascii_case(name));
                if group_stats.is_empty() {
                    anyhow::bail!("no habit group named {name:?}");
                }
            }

            let portfolio = aggregate::portfolio_stats(&contexts, settings.today);

            if json {
                let body = serde_json::json!({
                    "today": settings.today,
                    "portfolio": portfolio,
                    "groups": group_stats,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }

            println!(
                "{}: {}% weighted completion across {} active habits",
                settings.today, portfolio.weighted_completion_rate_percent, portfolio.active_habits
            );
            for stats in &group_stats {
                println!(
                    "- {} {}/{} at goal ({}%), avg progress {}%, avg streak {:.1}",
                    stats.name,
                    stats.at_goal_count,
                    stats.count,
                    stats.weighted_completion_rate_percent,
                    stats.avg_progress_percent,
                    stats.avg_streak
                );
            }
            for habit in &portfolio.at_risk {
                println!(
                    "! {} has a {} day streak at risk (last logged {})",
                    habit.name,
                    habit.current_streak,
                    calendar::describe_days_since(habit.days_since_last_entry)
                );
            }
        }
        Commands::Report { out } => {
            let contexts = load_contexts(&pool, settings.today).await?;
            let groups = db::fetch_groups(&pool).await?;
            let group_stats = aggregate::group_stats(&groups, &contexts);
            let portfolio = aggregate::portfolio_stats(&contexts, settings.today);
            let report = report::build_report(settings.today, &portfolio, &group_stats, &contexts);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::DeleteGroup { id } => {
            let orphaned = db::delete_group(&pool, id).await?;
            println!("Group deleted; {orphaned} habits are now ungrouped.");
        }
    }

    Ok(())
}

async fn load_contexts(pool: &sqlx::PgPool, today: NaiveDate) -> anyhow::Result<Vec<HabitContext>> {
    let habits = db::fetch_habits(pool).await?;
    let daily_sums = db::fetch_daily_sums(pool, today).await?;
    let stats = db::fetch_habit_stats(pool, today).await?;
    Ok(HabitContext::join(habits, &daily_sums, &stats))
}
