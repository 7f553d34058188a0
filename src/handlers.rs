use crate::errors::AppError;
use crate::models::{
    AnalyticsResponse, CalendarDay, DashboardStats, DateQuery, Habit, HabitDetailResponse, HabitId,
    HabitPatch, HeatmapCell, Insight, NewHabit, NewInsight, ToggleRequest, ToggleResponse,
    TrackedHabit,
};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::stats::{self, HEATMAP_DAYS, habit_streak, longest_streak};
use crate::store::optional_date;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_habits(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<TrackedHabit>>, AppError> {
    let data = state.data.lock().await;
    let habits = with_fresh_streaks(&state, data.tracked_habits(user.id()));
    Ok(Json(habits))
}

pub async fn create_habit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewHabit>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state
        .mutate(|data| data.create_habit(user.id(), payload, Utc::now()))
        .await?;
    info!(user = user.id(), habit = %habit.id, "created habit");
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn habits_due(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<TrackedHabit>>, AppError> {
    let date = optional_date(query.date.as_deref())?.unwrap_or_else(|| state.today());
    let data = state.data.lock().await;
    let habits = with_fresh_streaks(&state, data.tracked_habits(user.id()));
    let due = stats::habits_due_on(&habits, date).into_iter().cloned().collect();
    Ok(Json(due))
}

pub async fn get_habit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<HabitDetailResponse>, AppError> {
    let id = parse_habit_id(&id)?;
    let data = state.data.lock().await;
    let mut tracked = data.tracked_habit(user.id(), id)?;
    tracked.habit.current_streak =
        habit_streak(&tracked.completed_dates, state.today(), state.lookback);

    Ok(Json(HabitDetailResponse {
        longest_streak: longest_streak(&tracked.completed_dates),
        total_completions: tracked.completed_dates.len(),
        habit: tracked,
    }))
}

pub async fn update_habit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<HabitPatch>,
) -> Result<Json<Habit>, AppError> {
    let id = parse_habit_id(&id)?;
    let habit = state
        .mutate(|data| data.update_habit(user.id(), id, patch))
        .await?;
    info!(user = user.id(), habit = %id, "updated habit");
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_habit_id(&id)?;
    state.mutate(|data| data.delete_habit(user.id(), id)).await?;
    info!(user = user.id(), habit = %id, "deleted habit");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ToggleResponse>, AppError> {
    let id = parse_habit_id(&id)?;
    let request = toggle_request(&body)?;
    let today = state.today();
    let date = optional_date(request.date.as_deref())?.unwrap_or(today);

    let response = state
        .mutate(|data| data.toggle_completion(user.id(), id, date, today, state.lookback))
        .await?;
    info!(
        user = user.id(),
        habit = %id,
        %date,
        done = response.done,
        "toggled completion"
    );
    Ok(Json(response))
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DashboardStats>, AppError> {
    let data = state.data.lock().await;
    let habits = data.tracked_habits(user.id());
    Ok(Json(stats::dashboard_stats(&habits, state.today(), state.lookback)))
}

pub async fn analytics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let data = state.data.lock().await;
    let habits = data.tracked_habits(user.id());
    Ok(Json(stats::analytics(&habits, state.today(), state.lookback)))
}

pub async fn heatmap(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<HeatmapCell>>, AppError> {
    let data = state.data.lock().await;
    let habits = data.tracked_habits(user.id());
    Ok(Json(stats::heatmap(&habits, state.today(), HEATMAP_DAYS)))
}

pub async fn calendar(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let data = state.data.lock().await;
    let habits = data.tracked_habits(user.id());
    Ok(Json(stats::calendar_week(&habits, state.today())))
}

pub async fn latest_insight(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Option<Insight>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(data.latest_insight(user.id()).cloned()))
}

pub async fn create_insight(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewInsight>,
) -> Result<(StatusCode, Json<Insight>), AppError> {
    let today = state.today();
    let insight = state
        .mutate(|data| data.create_insight(user.id(), payload, today, Utc::now()))
        .await?;
    info!(user = user.id(), insight = %insight.id, "stored insight");
    Ok((StatusCode::CREATED, Json(insight)))
}

/// An empty body toggles today; anything else must be a valid request.
fn toggle_request(body: &[u8]) -> Result<ToggleRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ToggleRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| AppError::bad_request(format!("invalid toggle request: {err}")))
}

fn parse_habit_id(raw: &str) -> Result<HabitId, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("habit {raw} not found")))
}

fn with_fresh_streaks(state: &AppState, mut habits: Vec<TrackedHabit>) -> Vec<TrackedHabit> {
    let today = state.today();
    for tracked in &mut habits {
        tracked.habit.current_streak =
            habit_streak(&tracked.completed_dates, today, state.lookback);
    }
    habits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toggle_body_means_today() {
        assert_eq!(toggle_request(b"").unwrap().date, None);
        assert_eq!(toggle_request(b"  \n").unwrap().date, None);
        assert_eq!(toggle_request(b"{}").unwrap().date, None);
    }

    #[test]
    fn toggle_body_with_date_is_read() {
        let request = toggle_request(br#"{"date":"2024-01-02"}"#).unwrap();
        assert_eq!(request.date.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn malformed_toggle_body_is_rejected() {
        let bodies: [&[u8]; 3] = [br#"{"date": 20231225}"#, b"not json", br#"{"date": true}"#];
        for body in bodies {
            let err = toggle_request(body).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }
}
