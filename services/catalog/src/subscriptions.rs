use std::{collections::HashMap, sync::Arc, time::Duration};

use compose::ComposeId;
use lifecycle::StatusSnapshot;
use tokio::{
    sync::{watch, Mutex},
    time::{sleep, timeout, timeout_at, Instant},
};
use tracing::{debug, warn};

use crate::client::ImageBuilderApi;

/// A poller gives up after this many failed polls in a row.
const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// A subscription nobody asked for in this many poll intervals is dropped.
const IDLE_POLLS: u32 = 60;

struct Subscription {
    rx: watch::Receiver<StatusSnapshot>,
    last_seen: Instant,
}

type Registry = Arc<Mutex<HashMap<ComposeId, Subscription>>>;

/// Per-compose status subscriptions. Subscribing twice to the same id shares
/// one poller. Polling stops once the compose reaches a terminal status, after
/// repeated upstream errors, or when nobody has asked for the compose lately.
pub struct StatusSubscriptions {
    api: Arc<dyn ImageBuilderApi>,
    poll_every: Duration,
    idle_after: Duration,
    subs: Registry,
}

impl StatusSubscriptions {
    pub fn new(api: Arc<dyn ImageBuilderApi>, poll_every: Duration) -> Self {
        Self {
            api,
            poll_every,
            idle_after: poll_every.saturating_mul(IDLE_POLLS),
            subs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn subscribe(&self, id: ComposeId) -> watch::Receiver<StatusSnapshot> {
        let mut subs = self.subs.lock().await;
        // settled and abandoned entries go; their pollers notice on the next round
        subs.retain(|key, s| *key == id || s.last_seen.elapsed() < self.idle_after);

        if let Some(sub) = subs.get_mut(&id) {
            sub.last_seen = Instant::now();
            return sub.rx.clone();
        }

        let (tx, rx) = watch::channel(StatusSnapshot::loading());
        subs.insert(id, Subscription { rx: rx.clone(), last_seen: Instant::now() });
        let poller = Poller {
            api: self.api.clone(),
            subs: self.subs.clone(),
            id,
            own: rx.clone(),
            every: self.poll_every,
            idle_after: self.idle_after,
        };
        tokio::spawn(poller.run(tx));
        rx
    }

    /// Latest snapshot, waiting until `deadline` at most for the first response.
    pub async fn current_by(&self, id: ComposeId, deadline: Instant) -> StatusSnapshot {
        let mut rx = self.subscribe(id).await;
        let _ = timeout_at(deadline, rx.wait_for(StatusSnapshot::has_settled)).await;
        let snapshot = rx.borrow().clone();
        snapshot
    }

    #[cfg(test)]
    async fn is_subscribed(&self, id: ComposeId) -> bool {
        self.subs.lock().await.contains_key(&id)
    }
}

struct Poller {
    api: Arc<dyn ImageBuilderApi>,
    subs: Registry,
    id: ComposeId,
    own: watch::Receiver<StatusSnapshot>,
    every: Duration,
    idle_after: Duration,
}

impl Poller {
    async fn run(self, tx: watch::Sender<StatusSnapshot>) {
        let id = self.id;
        let mut errors = 0;
        loop {
            tx.send_modify(|s| s.is_fetching = true);

            // a hung request counts as a failed poll
            let polled = match timeout(self.idle_after, self.api.compose_status(id)).await {
                Ok(polled) => polled,
                Err(_) => Err(anyhow::anyhow!("status request timed out")),
            };
            match polled {
                Ok(status) => {
                    errors = 0;
                    let terminal = status.status().is_terminal();
                    tx.send_replace(StatusSnapshot::settled(status));
                    if terminal {
                        debug!(compose_id = %id, "status settled, polling stopped");
                        return;
                    }
                }
                Err(e) => {
                    errors += 1;
                    warn!(compose_id = %id, errors, "status poll failed: {e:?}");
                    tx.send_modify(|s| *s = s.clone().failed());
                    if errors >= MAX_CONSECUTIVE_ERRORS {
                        warn!(compose_id = %id, "giving up on status polling");
                        self.forget().await;
                        return;
                    }
                }
            }

            if !self.still_wanted().await {
                debug!(compose_id = %id, "status subscription idle, polling stopped");
                return;
            }
            sleep(self.every).await;
        }
    }

    /// False once the entry is idle, removed, or replaced by a newer poller.
    async fn still_wanted(&self) -> bool {
        let mut subs = self.subs.lock().await;
        match subs.get(&self.id) {
            Some(sub) if sub.rx.same_channel(&self.own) => {
                if sub.last_seen.elapsed() < self.idle_after {
                    return true;
                }
                subs.remove(&self.id);
                false
            }
            _ => false,
        }
    }

    async fn forget(&self) {
        let mut subs = self.subs.lock().await;
        if subs.get(&self.id).is_some_and(|sub| sub.rx.same_channel(&self.own)) {
            subs.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use async_trait::async_trait;
    use compose::{BlueprintItem, Compose, ComposeStatus};
    use serde_json::json;

    struct Scripted {
        calls: AtomicUsize,
        statuses: Vec<&'static str>,
    }

    #[async_trait]
    impl ImageBuilderApi for Scripted {
        async fn composes(&self) -> anyhow::Result<Vec<Compose>> {
            Ok(vec![])
        }

        async fn compose_status(&self, _id: ComposeId) -> anyhow::Result<ComposeStatus> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let status = self.statuses[n.min(self.statuses.len() - 1)];
            if status == "error" {
                anyhow::bail!("upstream unavailable");
            }
            Ok(serde_json::from_value(json!({"image_status": {"status": status}}))?)
        }

        async fn blueprints(&self, _search: &str) -> anyhow::Result<Vec<BlueprintItem>> {
            Ok(vec![])
        }
    }

    fn scripted(statuses: Vec<&'static str>) -> Arc<Scripted> {
        Arc::new(Scripted { calls: AtomicUsize::new(0), statuses })
    }

    #[tokio::test]
    async fn polls_until_terminal() {
        let api = scripted(vec!["pending", "building", "success"]);
        let subs = StatusSubscriptions::new(api.clone(), Duration::from_millis(5));

        let mut rx = subs.subscribe(uuid::Uuid::nil()).await;
        rx.wait_for(|s| s.data.as_ref().is_some_and(|d| d.is_success())).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn subscriptions_are_shared() {
        let api = scripted(vec!["failure"]);
        let subs = StatusSubscriptions::new(api.clone(), Duration::from_millis(5));
        let id = uuid::Uuid::new_v4();

        let deadline = Instant::now() + Duration::from_secs(1);
        let a = subs.current_by(id, deadline).await;
        let b = subs.current_by(id, deadline).await;

        assert_eq!(a, b);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_keep_last_data() {
        let api = scripted(vec!["building", "error"]);
        let subs = StatusSubscriptions::new(api, Duration::from_millis(5));

        let mut rx = subs.subscribe(uuid::Uuid::new_v4()).await;
        let snapshot = rx.wait_for(|s| s.is_error && !s.is_fetching).await.unwrap().clone();
        assert!(snapshot.data.is_some());
        assert!(!snapshot.is_fetching);
    }

    /// Waits until the poller drops its sender.
    async fn until_stopped(rx: &mut watch::Receiver<StatusSnapshot>) {
        let stopped = async { while rx.changed().await.is_ok() {} };
        tokio::time::timeout(Duration::from_secs(5), stopped).await.unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_repeated_errors() {
        let api = scripted(vec!["error"]);
        let subs = StatusSubscriptions::new(api.clone(), Duration::from_millis(1));
        let id = uuid::Uuid::new_v4();

        let mut rx = subs.subscribe(id).await;
        until_stopped(&mut rx).await;

        assert_eq!(api.calls.load(Ordering::SeqCst), MAX_CONSECUTIVE_ERRORS as usize);
        assert!(rx.borrow().is_error);
        assert!(!subs.is_subscribed(id).await);
    }

    #[tokio::test]
    async fn idle_subscription_stops_polling() {
        let api = scripted(vec!["building"]);
        let subs = StatusSubscriptions::new(api.clone(), Duration::from_millis(1));
        let id = uuid::Uuid::new_v4();

        let mut rx = subs.subscribe(id).await;
        until_stopped(&mut rx).await;
        assert!(!subs.is_subscribed(id).await);

        let calls = api.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), calls);

        // asking again starts a fresh poller
        subs.subscribe(id).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(api.calls.load(Ordering::SeqCst) > calls);
    }
}
