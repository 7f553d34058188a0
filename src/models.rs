use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub type UserId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(Ulid);

impl HabitId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for HabitId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// How often a habit is due. Weekday indices run 0..=6 starting on Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    #[serde(alias = "weekly", alias = "custom")]
    Weekdays {
        #[serde(default)]
        days: BTreeSet<u8>,
    },
}

impl Frequency {
    /// An empty weekday set counts as due every day. Older records were
    /// written that way and are still honored when reading.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::Weekdays { days } => days.is_empty() || days.contains(&weekday_index(date)),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Frequency::Daily => Ok(()),
            Frequency::Weekdays { days } if days.is_empty() => {
                Err("weekday frequency needs at least one day".to_string())
            }
            Frequency::Weekdays { days } => match days.iter().find(|day| **day > 6) {
                Some(day) => Err(format!("weekday index {day} is out of range 0..=6")),
                None => Ok(()),
            },
        }
    }
}

pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Reminder {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Reminder {
    pub fn validate(&self) -> Result<(), String> {
        match &self.time {
            Some(time) if NaiveTime::parse_from_str(time, "%H:%M").is_err() => {
                Err(format!("reminder time '{time}' is not HH:MM"))
            }
            None if self.enabled => Err("enabled reminder needs a time".to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub color: String,
    pub icon: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub reminder: Reminder,
    /// Cached copy of the streak, refreshed from the completion log on every
    /// mutation of this habit.
    #[serde(default)]
    pub current_streak: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: Ulid,
    pub user_id: UserId,
    pub summary: String,
    #[serde(default)]
    pub recommendations: serde_json::Value,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

/// Dates on which a single habit was marked done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet(HashSet<NaiveDate>);

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    pub fn insert(&mut self, date: NaiveDate) -> bool {
        self.0.insert(date)
    }

    pub fn remove(&mut self, date: NaiveDate) -> bool {
        self.0.remove(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }

    pub fn sorted(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.iter().collect();
        dates.sort();
        dates
    }
}

impl FromIterator<NaiveDate> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<NaiveDate> for CompletionSet {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl Serialize for CompletionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sorted().serialize(serializer)
    }
}

/// A habit joined with its completion dates; the input shape of the stats
/// functions.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedHabit {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed_dates: CompletionSet,
}

#[derive(Debug, Deserialize)]
pub struct NewHabit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub reminder: Reminder,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_color() -> String {
    "#3B82F6".to_string()
}

fn default_icon() -> String {
    "star".to_string()
}

#[derive(Debug, Deserialize, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub frequency: Option<Frequency>,
    pub reminder: Option<Reminder>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ToggleRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewInsight {
    pub summary: String,
    #[serde(default)]
    pub recommendations: serde_json::Value,
    #[serde(default)]
    pub range_start: Option<String>,
    #[serde(default)]
    pub range_end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub habit_id: HabitId,
    pub date: NaiveDate,
    pub done: bool,
    pub current_streak: u32,
}

#[derive(Debug, Serialize)]
pub struct HabitDetailResponse {
    #[serde(flatten)]
    pub habit: TrackedHabit,
    pub longest_streak: u32,
    pub total_completions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardStats {
    pub current_streak: u32,
    pub completed_today: usize,
    pub total_active_today: usize,
    pub weekly_average: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatTier {
    None,
    Low,
    Medium,
    High,
}

impl HeatTier {
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity <= 0.0 {
            HeatTier::None
        } else if intensity < 0.4 {
            HeatTier::Low
        } else if intensity < 0.7 {
            HeatTier::Medium
        } else {
            HeatTier::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub intensity: f64,
    pub tier: HeatTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestHabit {
    pub name: String,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub trend: Vec<TrendPoint>,
    pub categories: Vec<CategoryTotal>,
    pub total_completions: usize,
    pub best_habit: Option<BestHabit>,
    pub completion_rate: u32,
    pub total_habits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub id: HabitId,
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl From<&Habit> for HabitSummary {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name.clone(),
            icon: habit.icon.clone(),
            color: habit.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub completed: Vec<HabitSummary>,
}
