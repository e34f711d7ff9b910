use std::sync::Arc;

use compose::{blueprint_version, BlueprintId};
use lifecycle::RowContext;
use tracing::warn;

use crate::client::ImageBuilderApi;
use crate::config::AppConfig;
use crate::provisioning::{ConfiguredPermissions, CheckedWizard};
use crate::subscriptions::StatusSubscriptions;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub cfg: AppConfig,
    pub api: Arc<dyn ImageBuilderApi>,
    pub subscriptions: StatusSubscriptions,
    pub wizard: CheckedWizard,
    pub permissions: ConfiguredPermissions,
}

impl AppState {
    pub fn new(cfg: AppConfig, api: Arc<dyn ImageBuilderApi>, wizard: CheckedWizard) -> Self {
        let subscriptions = StatusSubscriptions::new(api.clone(), cfg.status_poll_every);
        let permissions = ConfiguredPermissions::new(cfg.permissions.clone());
        Self { cfg, api, subscriptions, wizard, permissions }
    }

    /// Facts shared by all rows of one response.
    pub async fn row_context(&self, search: &str, blueprint_id: Option<BlueprintId>) -> RowContext {
        let selected_blueprint_version = match blueprint_id {
            Some(id) => match self.api.blueprints(search).await {
                Ok(items) => blueprint_version(&items, id),
                Err(e) => {
                    // outdated tooltip is best effort
                    warn!(blueprint_id = %id, "blueprint lookup failed: {e:?}");
                    None
                }
            },
            None => None,
        };

        RowContext::gather(
            self.cfg.provisioning_enabled,
            &self.wizard,
            &self.permissions,
            selected_blueprint_version,
            self.cfg.expiry_policy,
        )
    }
}
