use crate::errors::AppError;
use crate::models::AppData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<AppData>(&bytes) {
            Ok(data) => {
                info!(
                    habits = data.habits.len(),
                    completions = data.completions.len(),
                    "loaded data file"
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await.map_err(|err| {
        error!("failed to write data file {}: {err}", path.display());
        AppError::internal(err)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletionRecord, HabitId};
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let file = format!("habit_tracker_{name}_{}_{nanos}.json", std::process::id());
        std::env::temp_dir().join(file)
    }

    #[tokio::test]
    async fn missing_file_loads_empty_data() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.habits.is_empty());
        assert!(data.completions.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty_data() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.habits.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_completions_load_back() {
        let path = temp_path("persist");
        let mut data = AppData::default();
        data.completions.push(CompletionRecord {
            user_id: "u1".to_string(),
            habit_id: HabitId::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            done: true,
        });

        persist_data(&path, &data).await.unwrap();
        let loaded = load_data(&path).await;
        assert_eq!(loaded.completions, data.completions);
        let _ = fs::remove_file(&path).await;
    }
}
