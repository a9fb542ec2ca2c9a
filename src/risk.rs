use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::HabitContext;
use crate::calendar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskHabit {
    pub habit_id: Uuid,
    pub name: String,
    pub current_streak: u32,
    pub days_since_last_entry: i64,
}

/// A live streak with nothing logged today. A zero-valued entry dated today
/// does not count as logged.
pub fn is_at_risk(current_streak: u32, daily_value: f64) -> bool {
    current_streak > 0 && daily_value == 0.0
}

/// At-risk habits, longest streak at stake first.
pub fn find_at_risk(contexts: &[&HabitContext], today: NaiveDate) -> Vec<AtRiskHabit> {
    let mut at_risk: Vec<AtRiskHabit> = contexts
        .iter()
        .filter_map(|ctx| {
            let stat = ctx.stat.as_ref()?;
            let days = calendar::days_since(stat.last_entry_date, today);
            is_at_risk(stat.current_streak, ctx.daily_value).then(|| AtRiskHabit {
                habit_id: ctx.habit.id,
                name: ctx.habit.name.clone(),
                current_streak: stat.current_streak,
                days_since_last_entry: days,
            })
        })
        .collect();

    at_risk.sort_by(|a, b| {
        b.current_streak
            .cmp(&a.current_streak)
            .then_with(|| a.name.cmp(&b.name))
    });
    at_risk
}
