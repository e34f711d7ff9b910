use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compose::{BlueprintId, Compose};
use lifecycle::{project_row, RowContext, RowView};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::state::SharedState;

const FIRST_SNAPSHOT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
pub struct RowQuery {
    #[serde(default)]
    pub search: String,
    pub blueprint_id: Option<BlueprintId>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("compose {0} not found")]
    NotFound(Uuid),

    #[error("image-builder request failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (code, self.to_string()).into_response()
    }
}

async fn project(
    state: &SharedState,
    compose: &Compose,
    ctx: &RowContext,
    deadline: Instant,
    now: chrono::DateTime<chrono::Utc>,
) -> RowView {
    let snapshot = state.subscriptions.current_by(compose.id, deadline).await;
    project_row(compose, &snapshot, ctx, now)
}

pub async fn list_composes(
    State(state): State<SharedState>,
    Query(q): Query<RowQuery>,
) -> Result<Json<Vec<RowView>>, ApiError> {
    let composes = state.api.composes().await?;
    let ctx = state.row_context(&q.search, q.blueprint_id).await;

    // one wait for the whole table; start every poller before waiting on any of them
    let deadline = Instant::now() + FIRST_SNAPSHOT_WAIT;
    for c in &composes {
        state.subscriptions.subscribe(c.id).await;
    }

    // one clock reading for the whole table
    let now = chrono::Utc::now();
    let mut rows = Vec::with_capacity(composes.len());
    for c in &composes {
        rows.push(project(&state, c, &ctx, deadline, now).await);
    }
    Ok(Json(rows))
}

pub async fn get_compose(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(q): Query<RowQuery>,
) -> Result<Json<RowView>, ApiError> {
    let composes = state.api.composes().await?;
    let compose = composes.iter().find(|c| c.id == id).ok_or(ApiError::NotFound(id))?;
    let ctx = state.row_context(&q.search, q.blueprint_id).await;

    let deadline = Instant::now() + FIRST_SNAPSHOT_WAIT;
    Ok(Json(project(&state, compose, &ctx, deadline, chrono::Utc::now()).await))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::ImageBuilderApi;
    use crate::config::AppConfig;
    use crate::provisioning::CheckedWizard;
    use crate::state::AppState;
    use async_trait::async_trait;
    use compose::{BlueprintItem, ComposeId, ComposeStatus};
    use lifecycle::{ExpiryPolicy, ModuleState, Provider, RowAction};
    use serde_json::json;

    const COMPOSE_ID: &str = "5f9b7a0e-3a43-4a2e-9f59-3c6d2c0b6d11";
    const BLUEPRINT_ID: &str = "0c2b1f6e-8c69-4f2b-a3c6-6f1b2d3e4a5b";

    fn aws_compose(id: &str) -> anyhow::Result<Compose> {
        Ok(serde_json::from_value(json!({
            "id": id,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "blueprint_id": BLUEPRINT_ID,
            "blueprint_version": 1,
            "request": {
                "distribution": "rhel-9",
                "image_requests": [{
                    "architecture": "x86_64",
                    "image_type": "aws",
                    "upload_request": {
                        "type": "aws",
                        "options": {
                            "share_with_accounts": ["123456789012"],
                            "share_with_sources": []
                        }
                    }
                }]
            }
        }))?)
    }

    struct Fixed;

    #[async_trait]
    impl ImageBuilderApi for Fixed {
        async fn composes(&self) -> anyhow::Result<Vec<Compose>> {
            Ok(vec![aws_compose(COMPOSE_ID)?])
        }

        async fn compose_status(&self, _id: ComposeId) -> anyhow::Result<ComposeStatus> {
            Ok(serde_json::from_value(json!({"image_status": {"status": "success"}}))?)
        }

        async fn blueprints(&self, _search: &str) -> anyhow::Result<Vec<BlueprintItem>> {
            Ok(serde_json::from_value(json!([{"id": BLUEPRINT_ID, "name": "web", "version": 2}]))?)
        }
    }

    /// Lists composes but never answers a status request.
    struct Hanging;

    #[async_trait]
    impl ImageBuilderApi for Hanging {
        async fn composes(&self) -> anyhow::Result<Vec<Compose>> {
            (0..3).map(|_| aws_compose(&Uuid::new_v4().to_string())).collect()
        }

        async fn compose_status(&self, _id: ComposeId) -> anyhow::Result<ComposeStatus> {
            std::future::pending().await
        }

        async fn blueprints(&self, _search: &str) -> anyhow::Result<Vec<BlueprintItem>> {
            Ok(vec![])
        }
    }

    fn state() -> SharedState {
        state_with(Arc::new(Fixed))
    }

    fn state_with(api: Arc<dyn ImageBuilderApi>) -> SharedState {
        let cfg = AppConfig {
            image_builder_url: "http://image-builder.test".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            provisioning_enabled: true,
            wizard_url: None,
            permissions: vec![Provider::Aws],
            status_poll_every: Duration::from_millis(10),
            expiry_policy: ExpiryPolicy::default(),
        };
        Arc::new(AppState::new(cfg, api, CheckedWizard::fixed(ModuleState::Loaded)))
    }

    #[tokio::test]
    async fn list_marks_outdated_launch() {
        let q =
            RowQuery { search: String::new(), blueprint_id: Some(BLUEPRINT_ID.parse().unwrap()) };
        let Json(rows) = list_composes(State(state()), Query(q)).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0].action, RowAction::LaunchTooltipOutdated { .. }));
        assert_eq!(rows[0].status_lines[0].text, "Ready");
    }

    #[tokio::test]
    async fn unknown_compose_is_404() {
        let err = get_compose(State(state()), Path(Uuid::nil()), Query(RowQuery::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_row_without_blueprint_is_plain_launch() {
        let id: Uuid = COMPOSE_ID.parse().unwrap();
        let Json(row) =
            get_compose(State(state()), Path(id), Query(RowQuery::default())).await.unwrap();
        assert!(matches!(row.action, RowAction::LaunchAvailable { .. }));
    }

    #[tokio::test]
    async fn slow_upstream_shares_one_wait_across_rows() {
        let started = std::time::Instant::now();
        let Json(rows) =
            list_composes(State(state_with(Arc::new(Hanging))), Query(RowQuery::default()))
                .await
                .unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.action == RowAction::Loading));
        assert!(started.elapsed() < FIRST_SNAPSHOT_WAIT + Duration::from_secs(1));
    }
}
