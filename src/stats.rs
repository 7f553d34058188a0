use crate::models::{
    AnalyticsResponse, BestHabit, CalendarDay, CategoryTotal, CompletionSet, DashboardStats,
    HabitSummary, HeatTier, HeatmapCell, TrackedHabit, TrendPoint,
};
use chrono::{Duration, NaiveDate};

pub const WEEK_DAYS: usize = 7;
pub const TREND_DAYS: usize = 30;
pub const HEATMAP_DAYS: usize = 121;

/// How far back completion dates are visible to a streak count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
    #[default]
    Unbounded,
    /// Only `today` and the `n - 1` days before it are visible.
    Days(u32),
}

impl Lookback {
    pub fn from_days(days: u32) -> Self {
        if days == 0 {
            Lookback::Unbounded
        } else {
            Lookback::Days(days)
        }
    }

    fn earliest(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Lookback::Unbounded => None,
            // A window reaching past the calendar's first date hides nothing.
            Lookback::Days(days) => Duration::try_days(i64::from(days) - 1)
                .and_then(|span| today.checked_sub_signed(span)),
        }
    }
}

/// Consecutive done days ending today, or ending yesterday when today has not
/// been marked yet.
pub fn habit_streak(done: &CompletionSet, today: NaiveDate, lookback: Lookback) -> u32 {
    let earliest = lookback.earliest(today);
    let visible =
        |date: NaiveDate| earliest.is_none_or(|first| date >= first) && done.contains(date);

    let mut cursor = if visible(today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if visible(yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while visible(cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

pub fn longest_streak(done: &CompletionSet) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for date in done.sorted() {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}

/// Dates on which at least one habit was completed.
pub fn active_dates(habits: &[TrackedHabit]) -> CompletionSet {
    let mut dates = CompletionSet::new();
    for tracked in habits {
        dates.extend(tracked.completed_dates.iter());
    }
    dates
}

pub fn user_streak(habits: &[TrackedHabit], today: NaiveDate, lookback: Lookback) -> u32 {
    habit_streak(&active_dates(habits), today, lookback)
}

pub fn completed_on(habits: &[TrackedHabit], date: NaiveDate) -> usize {
    habits
        .iter()
        .filter(|tracked| tracked.completed_dates.contains(date))
        .count()
}

pub fn habits_due_on(habits: &[TrackedHabit], date: NaiveDate) -> Vec<&TrackedHabit> {
    habits
        .iter()
        .filter(|tracked| tracked.habit.frequency.is_due_on(date))
        .collect()
}

/// Percentage of due habit-days completed over today and the six days before.
pub fn weekly_average(habits: &[TrackedHabit], today: NaiveDate) -> u32 {
    let mut due = 0usize;
    let mut completed = 0usize;

    for offset in (0..WEEK_DAYS).rev() {
        let date = today - Duration::days(offset as i64);
        for tracked in habits_due_on(habits, date) {
            due += 1;
            if tracked.completed_dates.contains(date) {
                completed += 1;
            }
        }
    }

    percentage(completed, due)
}

pub fn dashboard_stats(
    habits: &[TrackedHabit],
    today: NaiveDate,
    lookback: Lookback,
) -> DashboardStats {
    DashboardStats {
        current_streak: user_streak(habits, today, lookback),
        completed_today: completed_on(habits, today),
        total_active_today: habits_due_on(habits, today).len(),
        weekly_average: weekly_average(habits, today),
    }
}

/// Completed-habit counts for the trailing `days` days, oldest first.
pub fn completion_trend(habits: &[TrackedHabit], today: NaiveDate, days: usize) -> Vec<TrendPoint> {
    let mut trend = Vec::with_capacity(days);
    for offset in (0..days).rev() {
        let date = today - Duration::days(offset as i64);
        trend.push(TrendPoint {
            date,
            label: date.format("%b %d").to_string(),
            count: completed_on(habits, date),
        });
    }
    trend
}

/// All-time completions per category, in order of first appearance.
pub fn category_distribution(habits: &[TrackedHabit]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for tracked in habits {
        let completions = tracked.completed_dates.len();
        if completions == 0 {
            continue;
        }
        match totals.iter_mut().find(|total| total.name == tracked.habit.category) {
            Some(total) => total.value += completions,
            None => totals.push(CategoryTotal {
                name: tracked.habit.category.clone(),
                value: completions,
            }),
        }
    }
    totals
}

/// Share of existing habits completed on `date`. Every habit that exists now
/// is counted as active on past dates too.
pub fn heatmap_intensity(habits: &[TrackedHabit], date: NaiveDate) -> f64 {
    if habits.is_empty() {
        return 0.0;
    }
    completed_on(habits, date) as f64 / habits.len() as f64
}

pub fn heatmap(habits: &[TrackedHabit], today: NaiveDate, days: usize) -> Vec<HeatmapCell> {
    let mut cells = Vec::with_capacity(days);
    for offset in (0..days).rev() {
        let date = today - Duration::days(offset as i64);
        let intensity = heatmap_intensity(habits, date);
        cells.push(HeatmapCell {
            date,
            intensity,
            tier: HeatTier::from_intensity(intensity),
        });
    }
    cells
}

pub fn analytics(
    habits: &[TrackedHabit],
    today: NaiveDate,
    lookback: Lookback,
) -> AnalyticsResponse {
    let trend = completion_trend(habits, today, TREND_DAYS);
    let completions_in_window: usize = trend.iter().map(|point| point.count).sum();

    let mut best_habit: Option<BestHabit> = None;
    for tracked in habits {
        let streak = habit_streak(&tracked.completed_dates, today, lookback);
        // Ties go to the later habit.
        if best_habit.as_ref().is_none_or(|best| streak >= best.streak) {
            best_habit = Some(BestHabit {
                name: tracked.habit.name.clone(),
                streak,
            });
        }
    }

    AnalyticsResponse {
        categories: category_distribution(habits),
        total_completions: habits.iter().map(|tracked| tracked.completed_dates.len()).sum(),
        best_habit,
        completion_rate: percentage(completions_in_window, habits.len() * TREND_DAYS),
        total_habits: habits.len(),
        trend,
    }
}

/// Habits completed on each of today and the six days before, oldest first.
pub fn calendar_week(habits: &[TrackedHabit], today: NaiveDate) -> Vec<CalendarDay> {
    (0..WEEK_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset as i64);
            CalendarDay {
                date,
                completed: habits
                    .iter()
                    .filter(|tracked| tracked.completed_dates.contains(date))
                    .map(|tracked| HabitSummary::from(&tracked.habit))
                    .collect(),
            }
        })
        .collect()
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as u32
}
