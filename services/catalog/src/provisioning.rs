use lifecycle::{ModuleState, PermissionProvider, PermissionSnapshot, Provider, WizardProvider};
use tokio::sync::watch;
use tracing::{info, warn};

/// The provisioning wizard module, checked once in the background.
/// Rows never wait on it: until the check settles the wizard is `Pending`.
pub struct CheckedWizard {
    state: watch::Receiver<ModuleState>,
}

impl CheckedWizard {
    pub fn spawn(url: Option<String>, client: reqwest::Client) -> Self {
        let Some(url) = url else {
            let (_tx, state) = watch::channel(ModuleState::Failed {
                reason: "no wizard module configured".to_string(),
            });
            return Self { state };
        };

        let (tx, state) = watch::channel(ModuleState::Pending);
        tokio::spawn(async move {
            let next = match check_reachable(&client, &url).await {
                Ok(()) => {
                    info!(%url, "provisioning wizard: ok");
                    ModuleState::Loaded
                }
                Err(e) => {
                    warn!(%url, "provisioning wizard unavailable: {e:?}");
                    ModuleState::Failed { reason: e.to_string() }
                }
            };
            let _ = tx.send(next);
        });
        Self { state }
    }

    #[cfg(test)]
    pub fn fixed(state: ModuleState) -> Self {
        let (_tx, state) = watch::channel(state);
        Self { state }
    }
}

async fn check_reachable(client: &reqwest::Client, url: &str) -> anyhow::Result<()> {
    client.get(url).send().await?.error_for_status()?;
    Ok(())
}

impl WizardProvider for CheckedWizard {
    fn module_state(&self) -> ModuleState {
        self.state.borrow().clone()
    }
}

/// Launch permissions granted through configuration.
pub struct ConfiguredPermissions {
    granted: Vec<Provider>,
}

impl ConfiguredPermissions {
    pub fn new(granted: Vec<Provider>) -> Self {
        Self { granted }
    }
}

impl PermissionProvider for ConfiguredPermissions {
    fn permissions(&self) -> PermissionSnapshot {
        PermissionSnapshot::granted(self.granted.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_is_a_failed_module() {
        let wizard = CheckedWizard::spawn(None, reqwest::Client::new());
        assert!(matches!(wizard.module_state(), ModuleState::Failed { .. }));
    }

    #[test]
    fn configured_permissions() {
        let perms = ConfiguredPermissions::new(vec![Provider::Gcp]).permissions();
        assert_eq!(perms.allows(Provider::Gcp), Some(true));
        assert_eq!(perms.allows(Provider::Aws), Some(false));
    }
}
