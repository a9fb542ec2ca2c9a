//! Folds per-habit evaluations into group and portfolio statistics.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    sort_groups, DailySum, GoalPeriod, Habit, HabitGroup, HabitStatRecord, LoggedValue,
};
use crate::progress::{self, HabitEvaluation};
use crate::risk::{self, AtRiskHabit};

/// A habit joined with everything needed to evaluate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitContext {
    pub habit: Habit,
    pub daily_value: f64,
    pub stat: Option<HabitStatRecord>,
    pub evaluation: HabitEvaluation,
}

impl HabitContext {
    pub fn new(habit: Habit, daily_value: f64, stat: Option<HabitStatRecord>) -> Self {
        let logged = LoggedValue {
            daily_value,
            period_total: stat.as_ref().and_then(|s| s.period_total),
        };
        let evaluation = progress::evaluate(&habit, logged);
        Self {
            habit,
            daily_value,
            stat,
            evaluation,
        }
    }

    /// Joins habits with their daily sums and stat records by habit id.
    pub fn join(
        habits: Vec<Habit>,
        daily_sums: &[DailySum],
        stats: &[HabitStatRecord],
    ) -> Vec<HabitContext> {
        let mut sums: HashMap<Uuid, f64> = HashMap::new();
        for sum in daily_sums {
            *sums.entry(sum.habit_id).or_insert(0.0) += sum.total;
        }

        let stats: HashMap<Uuid, &HabitStatRecord> =
            stats.iter().map(|stat| (stat.habit_id, stat)).collect();

        habits
            .into_iter()
            .map(|habit| {
                let daily_value = sums.get(&habit.id).copied().unwrap_or(0.0);
                let stat = stats.get(&habit.id).map(|stat| (*stat).clone());
                if stat.is_none() {
                    tracing::debug!(habit_id = %habit.id, "no stat record for habit");
                }
                HabitContext::new(habit, daily_value, stat)
            })
            .collect()
    }

    pub fn current_streak(&self) -> Option<u32> {
        self.stat.as_ref().map(|s| s.current_streak)
    }
}

/// Stats for habits sharing one goal period. The weighted rate of a single
/// bucket equals its completion rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketStats {
    pub count: usize,
    pub at_goal_count: usize,
    pub completion_rate_percent: u32,
    pub avg_streak: f64,
    pub avg_progress_percent: u32,
    pub weighted_completion_rate_percent: u32,
}

impl BucketStats {
    pub fn from_contexts(contexts: &[&HabitContext]) -> Self {
        let count = contexts.len();
        let at_goal_count = contexts
            .iter()
            .filter(|ctx| ctx.evaluation.is_goal_met)
            .count();
        let completion_rate_percent = completion_rate(at_goal_count, count);
        Self {
            count,
            at_goal_count,
            completion_rate_percent,
            avg_streak: avg_streak(contexts),
            avg_progress_percent: avg_progress_percent(contexts),
            weighted_completion_rate_percent: completion_rate_percent,
        }
    }
}

/// `at_goal / count` as a rounded percentage; 0 for an empty bucket.
pub fn completion_rate(at_goal_count: usize, count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    round_percent(at_goal_count as f64 / count as f64 * 100.0)
}

/// Blends bucket rates weighting every habit equally.
pub fn weighted_completion_rate(buckets: &[BucketStats]) -> u32 {
    let (weighted, size) = buckets
        .iter()
        .filter(|bucket| bucket.count > 0)
        .fold((0.0, 0usize), |(weighted, size), bucket| {
            (
                weighted + bucket.completion_rate_percent as f64 * bucket.count as f64,
                size + bucket.count,
            )
        });

    if size == 0 {
        return 0;
    }
    round_percent(weighted / size as f64)
}

pub fn avg_progress_percent(contexts: &[&HabitContext]) -> u32 {
    if contexts.is_empty() {
        return 0;
    }
    let total: f64 = contexts
        .iter()
        .map(|ctx| ctx.evaluation.progress_percent)
        .sum();
    round_percent(total / contexts.len() as f64)
}

/// Mean current streak over habits that have a stat record.
pub fn avg_streak(contexts: &[&HabitContext]) -> f64 {
    let streaks: Vec<u32> = contexts.iter().filter_map(|ctx| ctx.current_streak()).collect();
    if streaks.is_empty() {
        return 0.0;
    }
    streaks.iter().map(|s| *s as f64).sum::<f64>() / streaks.len() as f64
}

fn round_percent(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodBreakdown {
    pub daily: BucketStats,
    pub weekly: BucketStats,
    pub monthly: BucketStats,
}

impl PeriodBreakdown {
    pub fn from_contexts(contexts: &[&HabitContext]) -> Self {
        let bucket = |period: GoalPeriod| {
            let members: Vec<&HabitContext> = contexts
                .iter()
                .copied()
                .filter(|ctx| ctx.habit.goal_period == period)
                .collect();
            BucketStats::from_contexts(&members)
        };

        Self {
            daily: bucket(GoalPeriod::PerDay),
            weekly: bucket(GoalPeriod::PerWeek),
            monthly: bucket(GoalPeriod::PerMonth),
        }
    }

    pub fn weighted_completion_rate_percent(&self) -> u32 {
        weighted_completion_rate(&[self.daily, self.weekly, self.monthly])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group_id: Option<Uuid>,
    pub name: String,
    pub count: usize,
    pub at_goal_count: usize,
    pub completion_rate_percent: u32,
    pub avg_streak: f64,
    pub avg_progress_percent: u32,
    pub weighted_completion_rate_percent: u32,
    pub breakdown: PeriodBreakdown,
}

impl GroupStats {
    pub fn from_contexts(group_id: Option<Uuid>, name: &str, contexts: &[&HabitContext]) -> Self {
        let overall = BucketStats::from_contexts(contexts);
        let breakdown = PeriodBreakdown::from_contexts(contexts);
        Self {
            group_id,
            name: name.to_string(),
            count: overall.count,
            at_goal_count: overall.at_goal_count,
            completion_rate_percent: overall.completion_rate_percent,
            avg_streak: overall.avg_streak,
            avg_progress_percent: overall.avg_progress_percent,
            weighted_completion_rate_percent: breakdown.weighted_completion_rate_percent(),
            breakdown,
        }
    }
}

pub const UNGROUPED: &str = "Ungrouped";

/// Stats per group in display order, followed by an "Ungrouped" entry when
/// any active habit has no known group. Inactive and archived habits are left
/// out.
pub fn group_stats(groups: &[HabitGroup], contexts: &[HabitContext]) -> Vec<GroupStats> {
    let mut groups = groups.to_vec();
    sort_groups(&mut groups);

    let mut members: HashMap<Uuid, Vec<&HabitContext>> = HashMap::new();
    let mut ungrouped: Vec<&HabitContext> = Vec::new();
    for ctx in contexts.iter().filter(|ctx| ctx.habit.is_active()) {
        match ctx.habit.group_id {
            Some(id) if groups.iter().any(|g| g.id == id) => {
                members.entry(id).or_default().push(ctx)
            }
            _ => ungrouped.push(ctx),
        }
    }

    let mut stats: Vec<GroupStats> = groups
        .iter()
        .map(|group| {
            let list = members.remove(&group.id).unwrap_or_default();
            GroupStats::from_contexts(Some(group.id), &group.name, &list)
        })
        .collect();

    if !ungrouped.is_empty() {
        stats.push(GroupStats::from_contexts(None, UNGROUPED, &ungrouped));
    }
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub active_habits: usize,
    pub today: BucketStats,
    pub week: BucketStats,
    pub month: BucketStats,
    pub weighted_completion_rate_percent: u32,
    pub avg_progress_percent: u32,
    pub avg_streak: f64,
    pub best_current_streak: u32,
    pub best_longest_streak: u32,
    pub at_risk: Vec<AtRiskHabit>,
}

pub fn portfolio_stats(contexts: &[HabitContext], today: NaiveDate) -> PortfolioStats {
    let active: Vec<&HabitContext> = contexts.iter().filter(|ctx| ctx.habit.is_active()).collect();
    let breakdown = PeriodBreakdown::from_contexts(&active);

    PortfolioStats {
        active_habits: active.len(),
        today: breakdown.daily,
        week: breakdown.weekly,
        month: breakdown.monthly,
        weighted_completion_rate_percent: breakdown.weighted_completion_rate_percent(),
        avg_progress_percent: avg_progress_percent(&active),
        avg_streak: avg_streak(&active),
        best_current_streak: active
            .iter()
            .filter_map(|ctx| ctx.current_streak())
            .max()
            .unwrap_or(0),
        best_longest_streak: active
            .iter()
            .filter_map(|ctx| ctx.stat.as_ref().map(|s| s.longest_streak))
            .max()
            .unwrap_or(0),
        at_risk: risk::find_at_risk(&active, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawHabit;

    fn habit(name: &str, goal: f64, period: &str, group_id: Option<Uuid>) -> Habit {
        RawHabit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            tracking_type: Some("count".to_string()),
            goal: Some(goal),
            goal_period: Some(period.to_string()),
            group_id,
            ..RawHabit::default()
        }
        .normalize()
    }

    fn stat(habit: &Habit, streak: u32, period_total: Option<f64>) -> HabitStatRecord {
        HabitStatRecord {
            habit_id: habit.id,
            current_streak: streak,
            longest_streak: streak + 2,
            period_total,
            week_completion_percent: None,
            last_entry_date: None,
        }
    }

    fn bucket(count: usize, rate: u32) -> BucketStats {
        BucketStats {
            count,
            completion_rate_percent: rate,
            weighted_completion_rate_percent: rate,
            ..BucketStats::default()
        }
    }

    #[test]
    fn completion_rate_rounds_and_handles_empty() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn weighted_rate_weights_by_habit_count() {
        assert_eq!(weighted_completion_rate(&[bucket(3, 100), bucket(1, 0)]), 75);
        assert_eq!(
            weighted_completion_rate(&[bucket(9, 100), bucket(0, 0), bucket(1, 0)]),
            90
        );
        assert_eq!(weighted_completion_rate(&[bucket(0, 0), bucket(0, 0)]), 0);
    }

    #[test]
    fn weighted_rate_stays_between_bucket_extremes() {
        let sizes = [1usize, 2, 5, 13];
        let rates = [0u32, 33, 50, 99, 100];
        for &a in &sizes {
            for &b in &sizes {
                for &ra in &rates {
                    for &rb in &rates {
                        let rate = weighted_completion_rate(&[bucket(a, ra), bucket(b, rb)]);
                        assert!(rate >= ra.min(rb) && rate <= ra.max(rb));
                    }
                }
            }
        }
    }

    #[test]
    fn join_sums_daily_values_and_reads_period_totals() {
        let daily = habit("Water", 8.0, "per_day", None);
        let weekly = habit("Run", 3.0, "per_week", None);
        let sums = vec![
            DailySum { habit_id: daily.id, total: 5.0 },
            DailySum { habit_id: daily.id, total: 3.0 },
            DailySum { habit_id: weekly.id, total: 1.0 },
        ];
        let stats = vec![stat(&weekly, 2, Some(3.0))];

        let contexts = HabitContext::join(vec![daily, weekly], &sums, &stats);
        assert_eq!(contexts[0].daily_value, 8.0);
        assert!(contexts[0].evaluation.is_goal_met);
        assert!(contexts[0].stat.is_none());
        assert_eq!(contexts[1].evaluation.effective_current_value, 3.0);
        assert!(contexts[1].evaluation.is_goal_met);
    }

    #[test]
    fn empty_collections_report_zero() {
        let empty: Vec<&HabitContext> = Vec::new();
        assert_eq!(avg_progress_percent(&empty), 0);
        assert_eq!(avg_streak(&empty), 0.0);
        assert_eq!(BucketStats::from_contexts(&empty).completion_rate_percent, 0);
        let stats = GroupStats::from_contexts(None, "Empty", &empty);
        assert_eq!(stats.weighted_completion_rate_percent, 0);
    }

    #[test]
    fn avg_streak_skips_habits_without_stats() {
        let a = habit("A", 1.0, "per_day", None);
        let b = habit("B", 1.0, "per_day", None);
        let c = habit("C", 1.0, "per_day", None);
        let stats = vec![stat(&a, 4, None), stat(&b, 0, None)];
        let contexts = HabitContext::join(vec![a, b, c], &[], &stats);
        let refs: Vec<&HabitContext> = contexts.iter().collect();
        assert_eq!(avg_streak(&refs), 2.0);
    }

    #[test]
    fn group_with_mixed_periods() {
        let group = HabitGroup {
            id: Uuid::new_v4(),
            name: "Health".to_string(),
            color: "#22c55e".to_string(),
            display_order: 0,
        };
        let mut habits: Vec<Habit> = (0..3)
            .map(|i| habit(&format!("Daily {i}"), 1.0, "per_day", Some(group.id)))
            .collect();
        habits.push(habit("Weekly", 5.0, "per_week", Some(group.id)));
        let sums: Vec<DailySum> = habits
            .iter()
            .map(|h| DailySum { habit_id: h.id, total: 1.0 })
            .collect();

        let contexts = HabitContext::join(habits, &sums, &[]);
        let stats = group_stats(&[group.clone()], &contexts);
        assert_eq!(stats.len(), 1);
        let health = &stats[0];
        assert_eq!(health.group_id, Some(group.id));
        assert_eq!(health.count, 4);
        assert_eq!(health.at_goal_count, 3);
        assert_eq!(health.breakdown.daily.completion_rate_percent, 100);
        assert_eq!(health.breakdown.weekly.completion_rate_percent, 0);
        assert_eq!(health.weighted_completion_rate_percent, 75);
        assert_eq!(health.avg_progress_percent, 75);
    }

    #[test]
    fn orphaned_and_ungrouped_habits_collect_under_ungrouped() {
        let loose = habit("Loose", 1.0, "per_day", None);
        let orphan = habit("Orphan", 1.0, "per_day", Some(Uuid::new_v4()));
        let mut archived = habit("Old", 1.0, "per_day", None);
        archived.is_archived = true;

        let contexts = HabitContext::join(vec![loose, orphan, archived], &[], &[]);
        let stats = group_stats(&[], &contexts);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, UNGROUPED);
        assert_eq!(stats[0].group_id, None);
        assert_eq!(stats[0].count, 2);
    }

    #[test]
    fn portfolio_splits_by_period_and_skips_inactive() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let daily = habit("Floss", 1.0, "per_day", None);
        let weekly = habit("Gym", 3.0, "per_week", None);
        let monthly = habit("Budget", 1.0, "per_month", None);
        let mut inactive = habit("Paused", 1.0, "per_day", None);
        inactive.status = crate::models::HabitStatus::Inactive;

        let sums = vec![DailySum { habit_id: daily.id, total: 1.0 }];
        let stats = vec![
            stat(&daily, 6, None),
            stat(&weekly, 2, Some(1.0)),
            stat(&monthly, 0, Some(1.0)),
            stat(&inactive, 40, None),
        ];
        let contexts = HabitContext::join(vec![daily, weekly, monthly, inactive], &sums, &stats);
        let portfolio = portfolio_stats(&contexts, today);

        assert_eq!(portfolio.active_habits, 3);
        assert_eq!(portfolio.today.completion_rate_percent, 100);
        assert_eq!(portfolio.week.completion_rate_percent, 0);
        assert_eq!(portfolio.month.completion_rate_percent, 100);
        assert_eq!(portfolio.weighted_completion_rate_percent, 67);
        assert_eq!(portfolio.best_current_streak, 6);
        assert_eq!(portfolio.best_longest_streak, 8);
        assert_eq!(portfolio.at_risk.len(), 1);
        assert_eq!(portfolio.at_risk[0].name, "Gym");
    }

    #[test]
    fn portfolio_buckets_carry_progress_and_streak_averages() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let water = habit("Water", 8.0, "per_day", None);
        let steps = habit("Steps", 4.0, "per_day", None);
        let gym = habit("Gym", 3.0, "per_week", None);

        let sums = vec![
            DailySum { habit_id: water.id, total: 4.0 },
            DailySum { habit_id: steps.id, total: 4.0 },
        ];
        let stats = vec![stat(&water, 3, None), stat(&gym, 5, Some(1.5))];
        let contexts = HabitContext::join(vec![water, steps, gym], &sums, &stats);
        let portfolio = portfolio_stats(&contexts, today);

        assert_eq!(portfolio.today.count, 2);
        assert_eq!(portfolio.today.at_goal_count, 1);
        assert_eq!(portfolio.today.avg_progress_percent, 75);
        assert_eq!(portfolio.today.avg_streak, 3.0);
        assert_eq!(portfolio.today.weighted_completion_rate_percent, 50);
        assert_eq!(portfolio.week.avg_progress_percent, 50);
        assert_eq!(portfolio.week.avg_streak, 5.0);
        assert_eq!(portfolio.month, BucketStats::default());
    }
}
