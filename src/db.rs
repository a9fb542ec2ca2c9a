use std::collections::HashMap;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::calendar;
use crate::entry;
use crate::models::{DailySum, GoalPeriod, Habit, HabitGroup, HabitStatRecord, RawHabit};
use crate::progress::format_number;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, today: NaiveDate) -> anyhow::Result<()> {
    let groups = vec![
        (
            Uuid::parse_str("6f1c2b8e-0d4a-4c55-9a7e-2b1f0c9d8e11")?,
            "Health",
            "#22c55e",
            1,
        ),
        (
            Uuid::parse_str("a3e9d7c1-5b2f-4e8a-8c6d-4f7e1a2b3c44")?,
            "Mind",
            "#6366f1",
            2,
        ),
    ];

    for &(id, name, color, display_order) in &groups {
        sqlx::query(
            r#"
            INSERT INTO habit_tracker.habit_groups (id, name, color, display_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET color = EXCLUDED.color, display_order = EXCLUDED.display_order
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(color)
        .bind(display_order)
        .execute(pool)
        .await?;
    }

    let health = groups[0].0;
    let mind = groups[1].0;
    let habits = vec![
        ("Water", "count", Some(8.0), "per_day", Some("cups"), Some(health)),
        ("Floss", "binary", None, "per_day", None, Some(health)),
        ("Run", "distance", Some(15.0), "per_week", Some("km"), Some(health)),
        ("Read", "duration", Some(30.0), "per_day", Some("minutes"), Some(mind)),
        ("Budget review", "binary", None, "per_month", None, None),
    ];

    for (name, tracking_type, goal, goal_period, unit, group_id) in habits {
        sqlx::query(
            r#"
            INSERT INTO habit_tracker.habits
            (id, name, tracking_type, goal, goal_period, unit, group_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO UPDATE
            SET tracking_type = EXCLUDED.tracking_type,
                goal = EXCLUDED.goal,
                goal_period = EXCLUDED.goal_period,
                unit = EXCLUDED.unit,
                group_id = EXCLUDED.group_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(tracking_type)
        .bind(goal)
        .bind(goal_period)
        .bind(unit)
        .bind(group_id)
        .execute(pool)
        .await?;
    }

    let entries = vec![
        ("Water", 0, 5.0),
        ("Water", 1, 8.0),
        ("Water", 2, 9.0),
        ("Floss", 1, 1.0),
        ("Floss", 2, 1.0),
        ("Floss", 3, 1.0),
        ("Run", 1, 5.0),
        ("Run", 3, 6.5),
        ("Read", 0, 35.0),
        ("Read", 1, 20.0),
    ];

    for (name, days_ago, value) in entries {
        let entry_date = today - Duration::days(days_ago);
        let habit_id: Uuid = sqlx::query("SELECT id FROM habit_tracker.habits WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await?
            .get("id");

        sqlx::query(
            r#"
            INSERT INTO habit_tracker.habit_entries
            (id, habit_id, entry_date, value, note, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(habit_id)
        .bind(entry_date)
        .bind(value)
        .bind("seed")
        .bind(format!("seed-{name}-{entry_date}"))
        .execute(pool)
        .await?;
    }

    tracing::info!(%today, "seeded habits and entries");
    Ok(())
}

pub async fn fetch_habits(pool: &PgPool) -> anyhow::Result<Vec<Habit>> {
    let rows = sqlx::query(
        "SELECT id, name, tracking_type, goal, goal_period, unit, unit_display, \
         min_value, max_value, status, is_archived, group_id \
         FROM habit_tracker.habits ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("failed to load habits")?;

    let mut habits = Vec::with_capacity(rows.len());
    for row in rows {
        let raw = RawHabit {
            id: row.get("id"),
            name: row.get("name"),
            tracking_type: row.get("tracking_type"),
            goal: row.get("goal"),
            goal_period: row.get("goal_period"),
            unit: row.get("unit"),
            unit_display: row.get("unit_display"),
            min_value: row.get("min_value"),
            max_value: row.get("max_value"),
            status: row.get("status"),
            is_archived: row.get("is_archived"),
            group_id: row.get("group_id"),
        };
        habits.push(raw.normalize());
    }

    tracing::debug!(count = habits.len(), "loaded habits");
    Ok(habits)
}

pub async fn fetch_groups(pool: &PgPool) -> anyhow::Result<Vec<HabitGroup>> {
    let rows = sqlx::query(
        "SELECT id, name, color, display_order FROM habit_tracker.habit_groups \
         ORDER BY display_order, name",
    )
    .fetch_all(pool)
    .await
    .context("failed to load habit groups")?;

    Ok(rows
        .into_iter()
        .map(|row| HabitGroup {
            id: row.get("id"),
            name: row.get("name"),
            color: row.get("color"),
            display_order: row.get("display_order"),
        })
        .collect())
}

pub async fn fetch_daily_sums(pool: &PgPool, today: NaiveDate) -> anyhow::Result<Vec<DailySum>> {
    let rows = sqlx::query(
        "SELECT habit_id, SUM(value) AS total FROM habit_tracker.habit_entries \
         WHERE entry_date = $1 GROUP BY habit_id",
    )
    .bind(today)
    .fetch_all(pool)
    .await
    .context("failed to load daily sums")?;

    Ok(rows
        .into_iter()
        .map(|row| DailySum {
            habit_id: row.get("habit_id"),
            total: row.get::<Option<f64>, _>("total").unwrap_or(0.0),
        })
        .collect())
}

/// Streaks count consecutive days with a positive entry; a streak is current
/// when its last day is today or yesterday.
pub async fn fetch_habit_stats(
    pool: &PgPool,
    today: NaiveDate,
) -> anyhow::Result<Vec<HabitStatRecord>> {
    let week_start = calendar::period_start(GoalPeriod::PerWeek, today);
    let month_start = calendar::period_start(GoalPeriod::PerMonth, today);

    let rows = sqlx::query(
        r#"
        WITH days AS (
            SELECT habit_id, entry_date
            FROM habit_tracker.habit_entries
            WHERE entry_date <= $1
            GROUP BY habit_id, entry_date
            HAVING SUM(value) > 0
        ),
        islands AS (
            SELECT habit_id, entry_date,
                   entry_date - (ROW_NUMBER() OVER (PARTITION BY habit_id ORDER BY entry_date))::int AS island
            FROM days
        ),
        runs AS (
            SELECT habit_id, COUNT(*) AS run_length, MAX(entry_date) AS run_end
            FROM islands
            GROUP BY habit_id, island
        ),
        streaks AS (
            SELECT habit_id,
                   MAX(run_length) AS longest_streak,
                   COALESCE(MAX(run_length) FILTER (WHERE run_end >= $1::date - 1), 0) AS current_streak
            FROM runs
            GROUP BY habit_id
        ),
        totals AS (
            SELECT habit_id,
                   SUM(value) FILTER (WHERE entry_date >= $2) AS week_total,
                   SUM(value) FILTER (WHERE entry_date >= $3) AS month_total,
                   COUNT(DISTINCT entry_date) FILTER (WHERE entry_date >= $2 AND value > 0) AS week_days,
                   MAX(entry_date) FILTER (WHERE value > 0) AS last_entry_date
            FROM habit_tracker.habit_entries
            WHERE entry_date <= $1
            GROUP BY habit_id
        )
        SELECT h.id AS habit_id, h.goal_period,
               s.current_streak, s.longest_streak,
               t.week_total, t.month_total, t.week_days, t.last_entry_date
        FROM habit_tracker.habits h
        LEFT JOIN streaks s ON s.habit_id = h.id
        LEFT JOIN totals t ON t.habit_id = h.id
        "#,
    )
    .bind(today)
    .bind(week_start)
    .bind(month_start)
    .fetch_all(pool)
    .await
    .context("failed to load habit stats")?;

    let days_in_week = ((today - week_start).num_days() + 1) as f64;
    let mut stats = Vec::with_capacity(rows.len());

    for row in rows {
        let goal_period: Option<String> = row.get("goal_period");
        let period_total = match GoalPeriod::parse(goal_period.as_deref()) {
            GoalPeriod::PerWeek => row.get::<Option<f64>, _>("week_total"),
            GoalPeriod::PerMonth => row.get::<Option<f64>, _>("month_total"),
            GoalPeriod::PerDay => None,
        };
        let week_days = row.get::<Option<i64>, _>("week_days").unwrap_or(0);

        stats.push(HabitStatRecord {
            habit_id: row.get("habit_id"),
            current_streak: to_streak(row.get("current_streak")),
            longest_streak: to_streak(row.get("longest_streak")),
            period_total,
            week_completion_percent: Some((week_days as f64 / days_in_week * 100.0).min(100.0)),
            last_entry_date: row.get("last_entry_date"),
        });
    }

    Ok(stats)
}

/// Dedupe key for imported rows that carry none, stable across re-imports of
/// the same file.
fn fallback_source_key(habit_name: &str, entry_date: NaiveDate, value: f64) -> String {
    format!(
        "import-{}|{}|{}",
        habit_name.trim().to_lowercase(),
        entry_date,
        format_number(value)
    )
}

fn to_streak(value: Option<i64>) -> u32 {
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    today: NaiveDate,
) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        habit: String,
        entry_date: String,
        value: f64,
        note: Option<String>,
        source_key: Option<String>,
    }

    let habits: HashMap<String, Habit> = fetch_habits(pool)
        .await?
        .into_iter()
        .map(|habit| (habit.name.to_lowercase(), habit))
        .collect();

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed csv row {}", line + 1))?;

        let Some(habit) = habits.get(&row.habit.trim().to_lowercase()) else {
            tracing::warn!(habit = %row.habit, row = line + 1, "unknown habit, skipping row");
            summary.rejected += 1;
            continue;
        };

        let Some(entry_date) = calendar::parse_local_date(&row.entry_date) else {
            tracing::warn!(habit = %habit.name, date = %row.entry_date, row = line + 1, "unreadable entry date, skipping row");
            summary.rejected += 1;
            continue;
        };

        if entry_date > today {
            tracing::warn!(habit = %habit.name, date = %entry_date, "entry dated in the future, skipping row");
            summary.rejected += 1;
            continue;
        }

        let value = match entry::validate_entry_value(habit, row.value) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(habit = %habit.name, row = line + 1, error = %err, "invalid entry value, skipping row");
                summary.rejected += 1;
                continue;
            }
        };

        let source_key = row
            .source_key
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| fallback_source_key(&habit.name, entry_date, value));

        let result = sqlx::query(
            r#"
            INSERT INTO habit_tracker.habit_entries
            (id, habit_id, entry_date, value, note, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(habit.id)
        .bind(entry_date)
        .bind(value)
        .bind(&row.note)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "csv import finished"
    );
    Ok(summary)
}

/// Deletes a group and leaves its habits ungrouped. Returns how many habits
/// were detached.
pub async fn delete_group(pool: &PgPool, group_id: Uuid) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await?;

    let orphaned = sqlx::query("UPDATE habit_tracker.habits SET group_id = NULL WHERE group_id = $1")
        .bind(group_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM habit_tracker.habit_groups WHERE id = $1")
        .bind(group_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        anyhow::bail!("habit group {group_id} not found");
    }

    tx.commit().await?;
    tracing::info!(%group_id, orphaned, "deleted habit group");
    Ok(orphaned)
}
