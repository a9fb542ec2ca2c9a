use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingType {
    Binary,
    Count,
    Duration,
    Distance,
    Weight,
    Volume,
    Custom,
}

impl TrackingType {
    /// Unknown or missing values fall back to `Count`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("binary") => TrackingType::Binary,
            Some("count") | None | Some("") => TrackingType::Count,
            Some("duration") => TrackingType::Duration,
            Some("distance") => TrackingType::Distance,
            Some("weight") => TrackingType::Weight,
            Some("volume") => TrackingType::Volume,
            Some("custom") => TrackingType::Custom,
            Some(other) => {
                tracing::warn!(tracking_type = other, "unknown tracking type, using count");
                TrackingType::Count
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    PerDay,
    PerWeek,
    PerMonth,
}

impl GoalPeriod {
    /// Unknown or missing values fall back to `PerDay`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("per_week") => GoalPeriod::PerWeek,
            Some("per_month") => GoalPeriod::PerMonth,
            Some("per_day") | None | Some("") => GoalPeriod::PerDay,
            Some(other) => {
                tracing::warn!(goal_period = other, "unknown goal period, using per_day");
                GoalPeriod::PerDay
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GoalPeriod::PerDay => "per day",
            GoalPeriod::PerWeek => "per week",
            GoalPeriod::PerMonth => "per month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitStatus {
    Active,
    Inactive,
}

impl HabitStatus {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("active") => HabitStatus::Active,
            _ => HabitStatus::Inactive,
        }
    }
}

/// A habit row as it comes out of the store, before any defaulting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHabit {
    pub id: Uuid,
    pub name: String,
    pub tracking_type: Option<String>,
    pub goal: Option<f64>,
    pub goal_period: Option<String>,
    pub unit: Option<String>,
    pub unit_display: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub status: Option<String>,
    pub is_archived: Option<bool>,
    pub group_id: Option<Uuid>,
}

impl RawHabit {
    pub fn normalize(self) -> Habit {
        let goal = match self.goal {
            Some(goal) if goal.is_finite() => goal,
            Some(_) => {
                tracing::warn!(habit_id = %self.id, "non-finite goal, using 1");
                1.0
            }
            None => 1.0,
        };

        Habit {
            id: self.id,
            name: self.name,
            tracking_type: TrackingType::parse(self.tracking_type.as_deref()),
            goal,
            goal_period: GoalPeriod::parse(self.goal_period.as_deref()),
            unit: non_empty(self.unit),
            unit_display: non_empty(self.unit_display),
            min_value: self.min_value.filter(|v| v.is_finite()),
            max_value: self.max_value.filter(|v| v.is_finite()),
            status: HabitStatus::parse(self.status.as_deref()),
            is_archived: self.is_archived.unwrap_or(false),
            group_id: self.group_id,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub tracking_type: TrackingType,
    pub goal: f64,
    pub goal_period: GoalPeriod,
    pub unit: Option<String>,
    pub unit_display: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub status: HabitStatus,
    pub is_archived: bool,
    pub group_id: Option<Uuid>,
}

impl Habit {
    pub fn is_binary(&self) -> bool {
        self.tracking_type == TrackingType::Binary
    }

    pub fn is_active(&self) -> bool {
        self.status == HabitStatus::Active && !self.is_archived
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitGroup {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub display_order: i32,
}

pub fn sort_groups(groups: &mut [HabitGroup]) {
    groups.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Aggregates computed by the store for one habit. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStatRecord {
    pub habit_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub period_total: Option<f64>,
    pub week_completion_percent: Option<f64>,
    pub last_entry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySum {
    pub habit_id: Uuid,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoggedValue {
    pub daily_value: f64,
    pub period_total: Option<f64>,
}
