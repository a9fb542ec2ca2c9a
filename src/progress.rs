//! Per-habit goal and progress evaluation.
//!
//! Everything here is pure: a normalized [`Habit`] plus the logged numbers in,
//! a number, string or flag out.

use serde::Serialize;

use crate::models::{GoalPeriod, Habit, LoggedValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitEvaluation {
    pub effective_goal: f64,
    pub is_goal_met: bool,
    pub progress_percent: f64,
    pub display_unit: String,
    pub effective_current_value: f64,
}

/// Binary habits always target 1, whatever the stored goal says.
pub fn effective_goal(habit: &Habit) -> f64 {
    if habit.is_binary() {
        1.0
    } else {
        habit.goal
    }
}

pub fn is_goal_met(habit: &Habit, current_value: f64) -> bool {
    if habit.is_binary() {
        current_value >= 1.0
    } else {
        current_value >= effective_goal(habit)
    }
}

/// Percentage of the effective goal reached, clamped to `0..=100`.
pub fn progress_percent(habit: &Habit, current_value: f64) -> f64 {
    let goal = effective_goal(habit);
    if goal == 0.0 {
        return 0.0;
    }

    let percent = current_value / goal * 100.0;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Weekly and monthly habits read the period total only; the daily value is
/// ignored even when the total is unknown.
pub fn effective_current_value(habit: &Habit, daily_value: f64, period_total: Option<f64>) -> f64 {
    match habit.goal_period {
        GoalPeriod::PerWeek | GoalPeriod::PerMonth => period_total.unwrap_or(0.0),
        GoalPeriod::PerDay => daily_value,
    }
}

pub fn display_unit(habit: &Habit) -> String {
    if habit.is_binary() {
        return String::new();
    }

    habit
        .unit_display
        .as_deref()
        .or(habit.unit.as_deref())
        .unwrap_or("unit")
        .to_string()
}

/// Label for a goal period as stored; anything unrecognized reads "per day".
pub fn goal_period_label(goal_period: Option<&str>) -> &'static str {
    GoalPeriod::parse(goal_period).label()
}

pub fn format_value(habit: &Habit, value: f64) -> String {
    if habit.is_binary() {
        return if value >= 1.0 {
            "Completed".to_string()
        } else {
            "Not completed".to_string()
        };
    }

    format_number(value)
}

pub(crate) fn format_number(value: f64) -> String {
    value.to_string()
}

pub fn evaluate(habit: &Habit, logged: LoggedValue) -> HabitEvaluation {
    let current = effective_current_value(habit, logged.daily_value, logged.period_total);

    HabitEvaluation {
        effective_goal: effective_goal(habit),
        is_goal_met: is_goal_met(habit, current),
        progress_percent: progress_percent(habit, current),
        display_unit: display_unit(habit),
        effective_current_value: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawHabit, TrackingType};

    fn habit(tracking_type: &str, goal: Option<f64>, goal_period: Option<&str>) -> Habit {
        RawHabit {
            name: "Sample".to_string(),
            tracking_type: Some(tracking_type.to_string()),
            goal,
            goal_period: goal_period.map(str::to_string),
            ..RawHabit::default()
        }
        .normalize()
    }

    #[test]
    fn binary_goal_is_always_one() {
        for goal in [None, Some(-4.0), Some(0.0), Some(99.0), Some(1e9)] {
            let habit = habit("binary", goal, None);
            assert_eq!(habit.tracking_type, TrackingType::Binary);
            assert_eq!(effective_goal(&habit), 1.0);
        }
    }

    #[test]
    fn goal_defaults_to_one_and_keeps_zero() {
        assert_eq!(effective_goal(&habit("count", None, None)), 1.0);
        assert_eq!(effective_goal(&habit("count", Some(0.0), None)), 0.0);
    }

    #[test]
    fn progress_stays_within_bounds() {
        let cases = [
            ("count", Some(8.0), 0.0),
            ("count", Some(8.0), 4.0),
            ("count", Some(8.0), 80.0),
            ("duration", Some(-10.0), 5.0),
            ("binary", Some(50.0), 3.0),
            ("distance", Some(0.5), f64::INFINITY),
            ("count", Some(8.0), f64::NAN),
        ];
        for (kind, goal, current) in cases {
            let percent = progress_percent(&habit(kind, goal, None), current);
            assert!((0.0..=100.0).contains(&percent), "{kind} {goal:?} {current}");
        }
    }

    #[test]
    fn nan_current_value_reports_no_progress() {
        assert_eq!(progress_percent(&habit("count", Some(8.0), None), f64::NAN), 0.0);
    }

    #[test]
    fn zero_goal_reports_no_progress() {
        let habit = habit("count", Some(0.0), None);
        assert_eq!(progress_percent(&habit, 0.0), 0.0);
        assert_eq!(progress_percent(&habit, 12.0), 0.0);
    }

    #[test]
    fn weekly_and_monthly_ignore_daily_value() {
        for period in ["per_week", "per_month"] {
            let habit = habit("count", Some(3.0), Some(period));
            assert_eq!(effective_current_value(&habit, 7.0, Some(2.0)), 2.0);
            assert_eq!(effective_current_value(&habit, 7.0, None), 0.0);
        }
    }

    #[test]
    fn daily_habits_pass_daily_value_through() {
        let habit = habit("count", Some(3.0), None);
        assert_eq!(effective_current_value(&habit, 7.0, Some(2.0)), 7.0);
        assert_eq!(effective_current_value(&habit, 0.0, Some(20.0)), 0.0);
    }

    #[test]
    fn display_unit_prefers_override() {
        let mut habit = habit("volume", Some(2.0), None);
        assert_eq!(display_unit(&habit), "unit");
        habit.unit = Some("ml".to_string());
        assert_eq!(display_unit(&habit), "ml");
        habit.unit_display = Some("glasses".to_string());
        assert_eq!(display_unit(&habit), "glasses");
        habit.tracking_type = TrackingType::Binary;
        assert_eq!(display_unit(&habit), "");
    }

    #[test]
    fn period_labels_fail_safe_to_per_day() {
        assert_eq!(goal_period_label(Some("per_day")), "per day");
        assert_eq!(goal_period_label(Some("per_week")), "per week");
        assert_eq!(goal_period_label(Some("per_month")), "per month");
        assert_eq!(goal_period_label(Some("fortnightly")), "per day");
        assert_eq!(goal_period_label(None), "per day");
        assert_eq!(goal_period_label(Some("PER_WEEK")), "per week");
        assert_eq!(goal_period_label(Some(" per_month ")), "per month");
    }

    #[test]
    fn format_value_by_tracking_type() {
        let binary = habit("binary", None, None);
        assert_eq!(format_value(&binary, 1.0), "Completed");
        assert_eq!(format_value(&binary, 0.0), "Not completed");

        let weight = habit("weight", Some(70.0), None);
        assert_eq!(format_value(&weight, 72.0), "72");
        assert_eq!(format_value(&weight, 71.5), "71.5");
        assert_eq!(format_value(&weight, 1e20), "100000000000000000000");
    }

    #[test]
    fn evaluate_weekly_duration() {
        let mut habit = habit("duration", Some(60.0), Some("per_week"));
        habit.unit = Some("minutes".to_string());
        let evaluation = evaluate(
            &habit,
            LoggedValue {
                daily_value: 200.0,
                period_total: Some(45.0),
            },
        );
        assert_eq!(evaluation.effective_current_value, 45.0);
        assert_eq!(evaluation.progress_percent, 75.0);
        assert!(!evaluation.is_goal_met);
        assert_eq!(evaluation.display_unit, "minutes");
    }
}
