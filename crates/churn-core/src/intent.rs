//! Point-to-point intent types
//!
//! The harness only needs the handful of fields required to submit a
//! point-to-point connectivity request: an owning application, a key,
//! two attachment points and a selector that keeps siblings distinct.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ChurnError, Result};

/// EtherType matched by every generated selector (IPv4)
pub const ETH_TYPE_IPV4: u16 = 0x0800;

/// Identity of the application that owns a batch of intents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AppId {
    fn default() -> Self {
        Self("churn.cli".to_string())
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Intent key, unique within one application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentKey(pub u64);

impl fmt::Display for IntentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Device identifier, e.g. `of:0000000000000001`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A device-and-port attachment point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectPoint {
    pub device: DeviceId,
    pub port: u64,
}

impl ConnectPoint {
    pub fn new(device: impl Into<String>, port: u64) -> Self {
        Self {
            device: DeviceId(device.into()),
            port,
        }
    }
}

impl FromStr for ConnectPoint {
    type Err = ChurnError;

    /// Parse `device/port`. Device ids may contain ':' but the port is
    /// always the part after the last '/'.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| ChurnError::InvalidEndpoint {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (device, port) = s.rsplit_once('/').ok_or_else(|| invalid("expected device/port"))?;
        if device.is_empty() {
            return Err(invalid("empty device id"));
        }
        if device.contains('/') {
            return Err(invalid("device id must not contain '/'"));
        }
        let port = port
            .parse::<u64>()
            .map_err(|_| invalid("port must be a non-negative integer"))?;

        Ok(Self::new(device, port))
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

/// 48-bit Ethernet address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Build an address from the low 48 bits of `value`
    pub fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[2..]);
        Self(mac)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Match criteria attached to an intent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficSelector {
    pub eth_type: u16,
    pub eth_src: MacAddress,
}

impl TrafficSelector {
    /// IPv4 selector keyed on source MAC
    pub fn ipv4_from(eth_src: MacAddress) -> Self {
        Self {
            eth_type: ETH_TYPE_IPV4,
            eth_src,
        }
    }
}

impl fmt::Display for TrafficSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETH_TYPE:{:#06x}, ETH_SRC:{}", self.eth_type, self.eth_src)
    }
}

/// A point-to-point connectivity request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub app_id: AppId,
    pub key: IntentKey,
    pub ingress: ConnectPoint,
    pub egress: ConnectPoint,
    pub selector: TrafficSelector,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key={}, appId={}, {} -> {}, selector=[{}]",
            self.key, self.app_id, self.ingress, self.egress, self.selector
        )
    }
}
