//! Batch generation
//!
//! A batch is the fixed set of intents one harness invocation pushes
//! through the service. Keys are `key_offset + i`, so two runs with the same
//! offset produce the same identifiers, and every selector carries a source
//! MAC derived from the key so the service treats siblings as independent.

use churn_core::{AppId, ChurnError, ConnectPoint, Intent, IntentKey, MacAddress, Result, TrafficSelector};
use serde::Serialize;

/// An immutable, ordered set of intents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    intents: Vec<Intent>,
}

impl Batch {
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter()
    }

    /// Keys in generation order
    pub fn keys(&self) -> impl Iterator<Item = IntentKey> + '_ {
        self.intents.iter().map(|intent| intent.key)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Generate `count` point-to-point intents from `ingress` to `egress`
pub fn generate_batch(
    app_id: &AppId,
    ingress: &ConnectPoint,
    egress: &ConnectPoint,
    count: usize,
    key_offset: u64,
) -> Result<Batch> {
    if count == 0 {
        return Err(ChurnError::InvalidArgument(
            "number of intents must be positive".into(),
        ));
    }
    if ingress == egress {
        return Err(ChurnError::InvalidArgument(format!(
            "ingress and egress must differ (both {})",
            ingress
        )));
    }
    let last = (count as u64 - 1)
        .checked_add(key_offset)
        .ok_or_else(|| ChurnError::InvalidArgument(format!(
            "key offset {} overflows with {} intents",
            key_offset, count
        )))?;

    let intents = (key_offset..=last)
        .map(|key| Intent {
            app_id: app_id.clone(),
            key: IntentKey(key),
            ingress: ingress.clone(),
            egress: egress.clone(),
            selector: TrafficSelector::ipv4_from(MacAddress::from_u64(key)),
        })
        .collect();

    Ok(Batch { intents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn endpoints() -> (ConnectPoint, ConnectPoint) {
        ("dev1/1".parse().unwrap(), "dev2/2".parse().unwrap())
    }

    #[test]
    fn test_keys_follow_offset() {
        let (ingress, egress) = endpoints();
        let batch = generate_batch(&AppId::default(), &ingress, &egress, 4, 10).unwrap();

        let keys: Vec<u64> = batch.keys().map(|k| k.0).collect();
        assert_eq!(keys, vec![10, 11, 12, 13]);
        assert!(batch.iter().all(|i| i.ingress == ingress && i.egress == egress));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let (ingress, egress) = endpoints();
        let a = generate_batch(&AppId::default(), &ingress, &egress, 50, 1).unwrap();
        let b = generate_batch(&AppId::default(), &ingress, &egress, 50, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selectors_are_distinct() {
        let (ingress, egress) = endpoints();
        let batch = generate_batch(&AppId::default(), &ingress, &egress, 100, 1).unwrap();

        let selectors: HashSet<_> = batch.iter().map(|i| i.selector.clone()).collect();
        assert_eq!(selectors.len(), 100);
        assert_eq!(batch.intents()[0].selector.eth_src.to_string(), "00:00:00:00:00:01");
    }

    #[test]
    fn test_rejects_zero_count() {
        let (ingress, egress) = endpoints();
        let err = generate_batch(&AppId::default(), &ingress, &egress, 0, 1).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_rejects_equal_endpoints() {
        let (ingress, _) = endpoints();
        let err = generate_batch(&AppId::default(), &ingress, &ingress, 3, 1).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_rejects_offset_overflow() {
        let (ingress, egress) = endpoints();
        assert!(generate_batch(&AppId::default(), &ingress, &egress, 2, u64::MAX).is_err());
        assert!(generate_batch(&AppId::default(), &ingress, &egress, 1, u64::MAX).is_ok());
    }
}
