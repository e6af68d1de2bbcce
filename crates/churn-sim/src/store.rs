//! Intent state tracking for the simulator

use chrono::{DateTime, Utc};
use churn_core::{AppId, Intent, IntentKey};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a stored intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentState {
    /// Accepted, installation pending
    InstallRequested,
    /// Installed
    Installed,
    /// Accepted for withdrawal
    WithdrawRequested,
    /// Installation failed
    Failed,
}

/// A stored intent and its state
#[derive(Debug, Clone)]
pub struct IntentRecord {
    pub intent: Intent,
    pub state: IntentState,
    pub updated: DateTime<Utc>,
}

impl IntentRecord {
    fn new(intent: Intent, state: IntentState) -> Self {
        Self {
            intent,
            state,
            updated: Utc::now(),
        }
    }

    fn set_state(&mut self, state: IntentState) {
        self.state = state;
        self.updated = Utc::now();
    }
}

type StoreKey = (AppId, IntentKey);

/// Intents known to the simulator, keyed by owning application and key
#[derive(Default)]
pub struct IntentStore {
    intents: RwLock<HashMap<StoreKey, IntentRecord>>,
}

impl IntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an install request, replacing any previous record
    pub fn request_install(&self, intent: Intent) {
        let key = (intent.app_id.clone(), intent.key);
        self.intents
            .write()
            .insert(key, IntentRecord::new(intent, IntentState::InstallRequested));
    }

    /// Finish an install. Returns false if the request was superseded
    /// (withdrawn or re-submitted) in the meantime.
    pub fn complete_install(&self, app_id: &AppId, key: IntentKey, success: bool) -> bool {
        let mut intents = self.intents.write();
        match intents.get_mut(&(app_id.clone(), key)) {
            Some(record) if record.state == IntentState::InstallRequested => {
                record.set_state(if success {
                    IntentState::Installed
                } else {
                    IntentState::Failed
                });
                true
            }
            _ => false,
        }
    }

    /// Mark an intent as being withdrawn. Unknown intents are tracked too,
    /// so a withdraw always completes.
    pub fn request_withdraw(&self, intent: Intent) {
        let key = (intent.app_id.clone(), intent.key);
        self.intents
            .write()
            .entry(key)
            .and_modify(|record| record.set_state(IntentState::WithdrawRequested))
            .or_insert_with(|| IntentRecord::new(intent, IntentState::WithdrawRequested));
    }

    /// Drop an intent once withdrawn
    pub fn complete_withdraw(&self, app_id: &AppId, key: IntentKey) -> Option<IntentRecord> {
        self.intents.write().remove(&(app_id.clone(), key))
    }

    /// Current state of an intent
    pub fn state(&self, app_id: &AppId, key: IntentKey) -> Option<IntentState> {
        self.intents
            .read()
            .get(&(app_id.clone(), key))
            .map(|record| record.state)
    }

    /// Number of intents tracked
    pub fn len(&self) -> usize {
        self.intents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{ConnectPoint, MacAddress, TrafficSelector};

    fn intent(key: u64) -> Intent {
        Intent {
            app_id: AppId::default(),
            key: IntentKey(key),
            ingress: ConnectPoint::new("dev1", 1),
            egress: ConnectPoint::new("dev2", 2),
            selector: TrafficSelector::ipv4_from(MacAddress::from_u64(key)),
        }
    }

    #[test]
    fn test_install_lifecycle() {
        let store = IntentStore::new();
        let app = AppId::default();

        store.request_install(intent(1));
        assert_eq!(store.state(&app, IntentKey(1)), Some(IntentState::InstallRequested));

        assert!(store.complete_install(&app, IntentKey(1), true));
        assert_eq!(store.state(&app, IntentKey(1)), Some(IntentState::Installed));

        // A second completion is stale
        assert!(!store.complete_install(&app, IntentKey(1), true));
    }

    #[test]
    fn test_withdraw_supersedes_install() {
        let store = IntentStore::new();
        let app = AppId::default();

        store.request_install(intent(7));
        store.request_withdraw(intent(7));
        assert!(!store.complete_install(&app, IntentKey(7), true));

        assert!(store.complete_withdraw(&app, IntentKey(7)).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_are_scoped_by_app() {
        let store = IntentStore::new();
        let mut other = intent(1);
        other.app_id = AppId::new("other.app");

        store.request_install(intent(1));
        store.request_install(other);
        assert_eq!(store.len(), 2);
        assert_eq!(store.state(&AppId::new("other.app"), IntentKey(2)), None);
    }
}
