//! What the projection consumes from its collaborators: the status
//! subscription, the provisioning wizard loader and the permission source.

use std::collections::HashMap;

use compose::ComposeStatus;
use serde::Serialize;

use crate::expiry::ExpiryPolicy;
use crate::provider::Provider;

/// One observation of a compose's status subscription.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct StatusSnapshot {
    pub data: Option<ComposeStatus>,
    pub is_success: bool,
    pub is_fetching: bool,
    pub is_error: bool,
}

impl StatusSnapshot {
    /// Nothing received yet, first fetch in flight.
    pub fn loading() -> Self {
        Self { is_fetching: true, ..Self::default() }
    }

    pub fn settled(data: ComposeStatus) -> Self {
        Self { data: Some(data), is_success: true, is_fetching: false, is_error: false }
    }

    /// Keeps the last good data around, like a refetch would.
    pub fn refetching(mut self) -> Self {
        self.is_fetching = true;
        self
    }

    pub fn failed(mut self) -> Self {
        self.is_fetching = false;
        self.is_error = true;
        self.is_success = false;
        self
    }

    pub fn has_settled(&self) -> bool {
        self.data.is_some() || self.is_error
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModuleState {
    Pending,
    Loaded,
    Failed { reason: String },
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct PermissionSnapshot {
    pub is_loading: bool,
    pub permissions: HashMap<Provider, bool>,
}

impl PermissionSnapshot {
    pub fn granted(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            is_loading: false,
            permissions: providers.into_iter().map(|p| (p, true)).collect(),
        }
    }

    /// `None` while still loading.
    pub fn allows(&self, provider: Provider) -> Option<bool> {
        if self.is_loading {
            return None;
        }
        Some(self.permissions.get(&provider).copied().unwrap_or(false))
    }
}

pub trait WizardProvider: Send + Sync {
    fn module_state(&self) -> ModuleState;
}

pub trait PermissionProvider: Send + Sync {
    fn permissions(&self) -> PermissionSnapshot;
}

/// Facts shared by every row of one rendering pass.
#[derive(Clone, Debug)]
pub struct RowContext {
    pub provisioning_enabled: bool,
    pub wizard: ModuleState,
    pub permissions: PermissionSnapshot,
    pub selected_blueprint_version: Option<i32>,
    pub expiry_policy: ExpiryPolicy,
}

impl RowContext {
    pub fn gather(
        provisioning_enabled: bool,
        wizard: &dyn WizardProvider,
        permissions: &dyn PermissionProvider,
        selected_blueprint_version: Option<i32>,
        expiry_policy: ExpiryPolicy,
    ) -> Self {
        Self {
            provisioning_enabled,
            wizard: wizard.module_state(),
            permissions: permissions.permissions(),
            selected_blueprint_version,
            expiry_policy,
        }
    }
}
