use chrono::{DateTime, Utc};
use compose::{BuildStatus, Compose, ComposeId, ImageType};
use serde::Serialize;
use tracing::debug;

use crate::action::{resolve_action, RowAction};
use crate::error::LifecycleError;
use crate::expiry::Expiry;
use crate::ports::{RowContext, StatusSnapshot};
use crate::status::{LifecycleState, StatusLine};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RowView {
    pub compose_id: ComposeId,
    pub name: String,
    pub image_type: Option<ImageType>,
    pub state: Option<LifecycleState>,
    pub status_lines: Vec<StatusLine>,
    pub expiry: Option<Expiry>,
    pub action: RowAction,
}

/// Badge state. A successful compose with an expiry window shows the
/// window instead of "Ready".
pub fn display_state(
    status: BuildStatus,
    expiry: Option<Expiry>,
) -> Result<LifecycleState, LifecycleError> {
    match (status, expiry) {
        (BuildStatus::Success, Some(e)) if e.is_expired => Ok(LifecycleState::Expired),
        (BuildStatus::Success, Some(e)) => {
            Ok(LifecycleState::Expiring { remaining_hours: e.remaining_hours })
        }
        (status, _) => LifecycleState::try_from(status),
    }
}

/// Project one row. Every row of a listing should be given the same `now`.
pub fn project_row(
    compose: &Compose,
    snapshot: &StatusSnapshot,
    ctx: &RowContext,
    now: DateTime<Utc>,
) -> RowView {
    let expiry = ctx.expiry_policy.window_for(compose).map(|w| w.at(now));

    let state = snapshot.data.as_ref().and_then(|status| {
        display_state(status.status(), expiry)
            .map_err(|error| debug!(compose_id = %compose.id, %error, "no status badge"))
            .ok()
    });

    RowView {
        compose_id: compose.id,
        name: compose.display_name(),
        image_type: compose.image_request().map(|r| r.image_type),
        state,
        status_lines: state.map(|s| s.lines()).unwrap_or_default(),
        expiry,
        action: resolve_action(compose, snapshot, expiry, ctx),
    }
}
