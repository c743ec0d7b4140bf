use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use serde_json::{Value, json};
use standard_error::{StandardError, Status};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};

use crate::{
    pkg::{
        internal::{
            adaptors::jobs::{mutators::JobMutator, selectors::JobSelector, spec::JobEntry},
            auth::User,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

#[derive(Deserialize)]
pub struct CreateJobInput {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobSort {
    #[default]
    Newest,
    Oldest,
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: JobSort,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Json(input): Json<CreateJobInput>,
) -> Result<Json<JobEntry>> {
    if input.title.trim().is_empty() || input.description.trim().is_empty() {
        return Err(StandardError::new("ERR-JOB-INPUT").code(StatusCode::UNPROCESSABLE_ENTITY));
    }
    let input = CreateJobInput {
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        company: trimmed(input.company),
        location: trimmed(input.location),
    };

    let mut tx = state.db_pool.begin_txn().await?;
    let job = JobMutator::new(&mut tx).create(input).await?;
    tx.commit().await?;

    tracing::info!("job {} created by {}", job.id, &user.name);
    refresh_feed(&state).await?;
    Ok(Json(job))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobEntry>>> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let mut tx = state.db_pool.begin_txn().await?;
    let jobs = JobSelector::new(&mut tx).get_all(search, params.sort).await?;
    Ok(Json(jobs))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(job_id): Path<i32>,
) -> Result<Json<JobEntry>> {
    let mut tx = state.db_pool.begin_txn().await?;
    match JobSelector::new(&mut tx).get_by_id(job_id).await? {
        Some(job) => Ok(Json(job)),
        None => Err(StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND)),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
    Path(job_id): Path<i32>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let removed = JobMutator::new(&mut tx).delete(job_id).await?;
    tx.commit().await?;
    if !removed {
        return Err(StandardError::new("ERR-JOB-404").code(StatusCode::NOT_FOUND));
    }

    // applications for the job stay in place, there is no cascade
    tracing::info!("job {} deleted by {}", job_id, &user.name);
    refresh_feed(&state).await?;
    Ok(Json(json!({"status": "deleted"})))
}

/// SSE stream of job-list snapshots: the current list on attach, then one
/// snapshot per mutation until the client disconnects.
pub async fn feed(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = core::result::Result<Event, axum::Error>>>> {
    refresh_feed(&state).await?;
    let stream = WatchStream::new(state.feed.subscribe())
        .map(|jobs| Event::default().event("jobs").json_data(&jobs));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn refresh_feed(state: &AppState) -> Result<()> {
    let mut tx = state.db_pool.begin_txn().await?;
    let jobs = JobSelector::new(&mut tx).get_all(None, JobSort::Newest).await?;
    state.feed.publish(jobs);
    Ok(())
}

fn trimmed(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{JobSort, ListJobsQuery, trimmed};

    #[test]
    fn test_trimmed_drops_blank_fields() {
        assert_eq!(trimmed(Some(" Acme ".into())), Some("Acme".to_string()));
        assert_eq!(trimmed(Some("   ".into())), None);
        assert_eq!(trimmed(None), None);
    }

    #[test]
    fn test_sort_defaults_to_newest() {
        let query: ListJobsQuery = serde_json::from_str(r#"{"search": "rust"}"#).unwrap();
        assert_eq!(query.sort, JobSort::Newest);

        let query: ListJobsQuery = serde_json::from_str(r#"{"sort": "oldest"}"#).unwrap();
        assert_eq!(query.sort, JobSort::Oldest);
    }
}
