//! Habit, completion and insight records for each user, held in memory.
//!
//! Every operation is scoped to one user; records owned by somebody else are
//! reported as not found.

use crate::errors::AppError;
use crate::models::{
    AppData, CompletionRecord, CompletionSet, Habit, HabitId, HabitPatch, Insight, NewHabit,
    NewInsight, ToggleResponse, TrackedHabit, parse_date,
};
use crate::stats::{Lookback, habit_streak};
use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

impl AppData {
    /// The user's habits joined with their completions, newest first.
    pub fn tracked_habits(&self, user_id: &str) -> Vec<TrackedHabit> {
        let mut habits: Vec<&Habit> = self
            .habits
            .iter()
            .filter(|habit| habit.user_id == user_id)
            .collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        habits
            .into_iter()
            .map(|habit| TrackedHabit {
                completed_dates: self.completion_set(habit.id),
                habit: habit.clone(),
            })
            .collect()
    }

    pub fn tracked_habit(&self, user_id: &str, id: HabitId) -> Result<TrackedHabit, AppError> {
        let habit = self.owned_habit(user_id, id)?;
        Ok(TrackedHabit {
            completed_dates: self.completion_set(id),
            habit: habit.clone(),
        })
    }

    pub fn completion_set(&self, habit_id: HabitId) -> CompletionSet {
        self.completions
            .iter()
            .filter(|record| record.habit_id == habit_id && record.done)
            .map(|record| record.date)
            .collect()
    }

    pub fn create_habit(
        &mut self,
        user_id: &str,
        input: NewHabit,
        now: DateTime<Utc>,
    ) -> Result<Habit, AppError> {
        let name = require_name(&input.name)?;
        input.frequency.validate().map_err(AppError::bad_request)?;
        input.reminder.validate().map_err(AppError::bad_request)?;

        let habit = Habit {
            id: HabitId::new(),
            user_id: user_id.to_string(),
            name,
            description: input.description,
            category: input.category,
            color: input.color,
            icon: input.icon,
            frequency: input.frequency,
            reminder: input.reminder,
            current_streak: 0,
            created_at: now,
        };
        self.habits.push(habit.clone());
        Ok(habit)
    }

    pub fn update_habit(
        &mut self,
        user_id: &str,
        id: HabitId,
        patch: HabitPatch,
    ) -> Result<Habit, AppError> {
        let name = patch.name.as_deref().map(require_name).transpose()?;
        if let Some(frequency) = &patch.frequency {
            frequency.validate().map_err(AppError::bad_request)?;
        }
        if let Some(reminder) = &patch.reminder {
            reminder.validate().map_err(AppError::bad_request)?;
        }

        let habit = self.owned_habit_mut(user_id, id)?;
        if let Some(name) = name {
            habit.name = name;
        }
        if let Some(description) = patch.description {
            habit.description = Some(description).filter(|text| !text.trim().is_empty());
        }
        if let Some(category) = patch.category {
            habit.category = category;
        }
        if let Some(color) = patch.color {
            habit.color = color;
        }
        if let Some(icon) = patch.icon {
            habit.icon = icon;
        }
        if let Some(frequency) = patch.frequency {
            habit.frequency = frequency;
        }
        if let Some(reminder) = patch.reminder {
            habit.reminder = reminder;
        }
        Ok(habit.clone())
    }

    /// Removes the habit together with all of its completion records.
    pub fn delete_habit(&mut self, user_id: &str, id: HabitId) -> Result<(), AppError> {
        self.owned_habit(user_id, id)?;
        self.habits.retain(|habit| habit.id != id);
        self.completions.retain(|record| record.habit_id != id);
        Ok(())
    }

    /// Marks `date` done when it is not, and clears it otherwise. The cached
    /// streak is recomputed from the completion log afterwards.
    pub fn toggle_completion(
        &mut self,
        user_id: &str,
        id: HabitId,
        date: NaiveDate,
        today: NaiveDate,
        lookback: Lookback,
    ) -> Result<ToggleResponse, AppError> {
        self.owned_habit(user_id, id)?;

        let existing = self
            .completions
            .iter()
            .position(|record| record.habit_id == id && record.date == date);
        let done = match existing {
            Some(index) if self.completions[index].done => {
                self.completions.remove(index);
                false
            }
            Some(index) => {
                self.completions[index].done = true;
                true
            }
            None => {
                self.completions.push(CompletionRecord {
                    user_id: user_id.to_string(),
                    habit_id: id,
                    date,
                    done: true,
                });
                true
            }
        };

        let current_streak = habit_streak(&self.completion_set(id), today, lookback);
        self.owned_habit_mut(user_id, id)?.current_streak = current_streak;

        Ok(ToggleResponse {
            habit_id: id,
            date,
            done,
            current_streak,
        })
    }

    pub fn latest_insight(&self, user_id: &str) -> Option<&Insight> {
        self.insights
            .iter()
            .filter(|insight| insight.user_id == user_id)
            .max_by_key(|insight| insight.generated_at)
    }

    pub fn create_insight(
        &mut self,
        user_id: &str,
        input: NewInsight,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Insight, AppError> {
        let summary = input.summary.trim();
        if summary.is_empty() {
            return Err(AppError::bad_request("summary must not be empty"));
        }
        let range_start = optional_date(input.range_start.as_deref())?.unwrap_or(today);
        let range_end = optional_date(input.range_end.as_deref())?.unwrap_or(today);
        if range_end < range_start {
            return Err(AppError::bad_request("range_end is before range_start"));
        }

        let insight = Insight {
            id: Ulid::new(),
            user_id: user_id.to_string(),
            summary: summary.to_string(),
            recommendations: input.recommendations,
            range_start,
            range_end,
            generated_at: now,
        };
        self.insights.push(insight.clone());
        Ok(insight)
    }

    fn owned_habit(&self, user_id: &str, id: HabitId) -> Result<&Habit, AppError> {
        self.habits
            .iter()
            .find(|habit| habit.id == id && habit.user_id == user_id)
            .ok_or_else(|| habit_not_found(id))
    }

    fn owned_habit_mut(&mut self, user_id: &str, id: HabitId) -> Result<&mut Habit, AppError> {
        self.habits
            .iter_mut()
            .find(|habit| habit.id == id && habit.user_id == user_id)
            .ok_or_else(|| habit_not_found(id))
    }
}

fn habit_not_found(id: HabitId) -> AppError {
    AppError::not_found(format!("habit {id} not found"))
}

fn require_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    Ok(name.to_string())
}

/// Normalizes an optional `YYYY-MM-DD` value; malformed input rejects the
/// request.
pub fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|raw| {
            parse_date(raw)
                .map_err(|err| AppError::bad_request(format!("invalid date '{raw}': {err}")))
        })
        .transpose()
}
