use crate::config::Config;
use crate::errors::AppError;
use crate::models::AppData;
use crate::stats::Lookback;
use crate::storage::persist_data;
use chrono::{Local, NaiveDate};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub lookback: Lookback,
    pub fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: &Config, data: AppData) -> Self {
        Self {
            data_path: config.data_path.clone(),
            data: Arc::new(Mutex::new(data)),
            lookback: config.lookback,
            fixed_today: config.fixed_today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Applies `change` to a copy of the data and persists it. The shared
    /// data is only replaced once the write succeeded.
    pub async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let output = change(&mut next)?;
        persist_data(&self.data_path, &next).await?;
        *data = next;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, NewHabit, Reminder};
    use axum::http::StatusCode;
    use chrono::Utc;

    fn walk() -> NewHabit {
        NewHabit {
            name: "Walk".to_string(),
            description: None,
            category: "Health".to_string(),
            color: "#10B981".to_string(),
            icon: "walk".to_string(),
            frequency: Frequency::Daily,
            reminder: Reminder::default(),
        }
    }

    fn state_at(data_path: PathBuf) -> AppState {
        let config = Config {
            data_path,
            ..Config::default()
        };
        AppState::new(&config, AppData::default())
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_data() {
        // A directory cannot be written as a file.
        let state = state_at(std::env::temp_dir());

        let result = state
            .mutate(|data| data.create_habit("u1", walk(), Utc::now()))
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.data.lock().await.habits.is_empty());
    }

    #[tokio::test]
    async fn rejected_change_is_not_written() {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!("habit_tracker_state_{nanos}.json"));
        let state = state_at(path.clone());

        let mut blank = walk();
        blank.name = "  ".to_string();
        let err = state
            .mutate(|data| data.create_habit("u1", blank, Utc::now()))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn successful_write_replaces_data() {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let path = std::env::temp_dir().join(format!("habit_tracker_state_ok_{nanos}.json"));
        let state = state_at(path.clone());

        state
            .mutate(|data| data.create_habit("u1", walk(), Utc::now()))
            .await
            .unwrap();

        assert_eq!(state.data.lock().await.habits.len(), 1);
        assert_eq!(crate::storage::load_data(&path).await.habits.len(), 1);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
