use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{BucketStats, GroupStats, HabitContext, PortfolioStats};
use crate::calendar;
use crate::progress::{self, format_number};

/// One line of habit progress, e.g. `Water: 6 / 8 cups per day (75%)`.
pub fn progress_line(ctx: &HabitContext) -> String {
    let habit = &ctx.habit;
    let evaluation = &ctx.evaluation;
    let period = habit.goal_period.label();

    if habit.is_binary() {
        return format!(
            "{}: {} {} ({:.0}%)",
            habit.name,
            progress::format_value(habit, evaluation.effective_current_value),
            period,
            evaluation.progress_percent
        );
    }

    format!(
        "{}: {} / {} {} {} ({:.0}%)",
        habit.name,
        progress::format_value(habit, evaluation.effective_current_value),
        format_number(evaluation.effective_goal),
        evaluation.display_unit,
        period,
        evaluation.progress_percent
    )
}

fn bucket_line(label: &str, bucket: &BucketStats) -> String {
    format!(
        "- {}: {} of {} at goal ({}%), avg progress {}%, avg streak {:.1}",
        label,
        bucket.at_goal_count,
        bucket.count,
        bucket.completion_rate_percent,
        bucket.avg_progress_percent,
        bucket.avg_streak
    )
}

pub fn build_report(
    today: NaiveDate,
    portfolio: &PortfolioStats,
    groups: &[GroupStats],
    contexts: &[HabitContext],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Habit Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} across {} active habits",
        today, portfolio.active_habits
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(
        output,
        "- Weighted completion: {}%",
        portfolio.weighted_completion_rate_percent
    );
    let _ = writeln!(output, "- Average progress: {}%", portfolio.avg_progress_percent);
    let _ = writeln!(output, "- Average streak: {:.1} days", portfolio.avg_streak);
    let _ = writeln!(
        output,
        "- Best streak: {} days (longest ever {})",
        portfolio.best_current_streak, portfolio.best_longest_streak
    );
    let _ = writeln!(output, "{}", bucket_line("Today", &portfolio.today));
    let _ = writeln!(output, "{}", bucket_line("This week", &portfolio.week));
    let _ = writeln!(output, "{}", bucket_line("This month", &portfolio.month));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Groups");

    if groups.is_empty() {
        let _ = writeln!(output, "No groups or habits yet.");
    } else {
        for group in groups {
            let _ = writeln!(
                output,
                "- {}: {} of {} at goal, weighted {}%, avg progress {}%, avg streak {:.1}",
                group.name,
                group.at_goal_count,
                group.count,
                group.weighted_completion_rate_percent,
                group.avg_progress_percent,
                group.avg_streak
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## At Risk");

    if portfolio.at_risk.is_empty() {
        let _ = writeln!(output, "No streaks at risk today.");
    } else {
        for habit in &portfolio.at_risk {
            let _ = writeln!(
                output,
                "- {} ({} day streak, last logged {})",
                habit.name,
                habit.current_streak,
                calendar::describe_days_since(habit.days_since_last_entry)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Habits");

    let mut active: Vec<&HabitContext> = contexts.iter().filter(|c| c.habit.is_active()).collect();
    active.sort_by(|a, b| a.habit.name.cmp(&b.habit.name));

    if active.is_empty() {
        let _ = writeln!(output, "No active habits.");
    } else {
        for ctx in active {
            let _ = writeln!(output, "- {}", progress_line(ctx));
        }
    }

    output
}
