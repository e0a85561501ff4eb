mod bucket;
mod source;
mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use bucket::{BUCKET_SIZE_MS, BucketWindow, Clock, FixedClock, SystemClock};
pub use source::{OfflineSource, SourceError, UsageSource};
pub use store::{StoreError, UsageStore};

/// Persisted identifier of the whole-device aggregate.
pub const DEVICE_UID: i64 = -1;

/// Label used when an app can no longer be resolved to a name.
pub const UNKNOWN_APP_NAME: &str = "Unknown App";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    Vpn,
}

impl Transport {
    pub const ALL: [Transport; 4] = [
        Transport::Wifi,
        Transport::Cellular,
        Transport::Ethernet,
        Transport::Vpn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::Ethernet => "ethernet",
            Self::Vpn => "vpn",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport {0}")]
pub struct ParseTransportError(pub String);

impl FromStr for Transport {
    type Err = ParseTransportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wifi" => Ok(Self::Wifi),
            "cellular" | "mobile" => Ok(Self::Cellular),
            "ethernet" => Ok(Self::Ethernet),
            "vpn" => Ok(Self::Vpn),
            _ => Err(ParseTransportError(value.to_string())),
        }
    }
}

/// What a usage record measures: the whole device or a single app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Entity {
    Device,
    App(u32),
}

impl Entity {
    pub fn uid(&self) -> i64 {
        match self {
            Self::Device => DEVICE_UID,
            Self::App(uid) => i64::from(*uid),
        }
    }

    /// Inverse of [`Entity::uid`]; `None` for negative ids other than the device sentinel.
    pub fn from_uid(uid: i64) -> Option<Self> {
        if uid == DEVICE_UID {
            return Some(Self::Device);
        }
        u32::try_from(uid).ok().map(Self::App)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteCounts {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl ByteCounts {
    pub fn new(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self { rx_bytes, tx_bytes }
    }

    pub fn total(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Cache key of a usage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UsageKey {
    pub transport: Transport,
    pub entity: Entity,
    pub window: BucketWindow,
}

/// One materialized bucket of usage for a transport/entity pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub transport: Transport,
    pub entity: Entity,
    pub display_name: String,
    pub window: BucketWindow,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl UsageRecord {
    pub fn new(
        transport: Transport,
        entity: Entity,
        display_name: impl Into<String>,
        window: BucketWindow,
        counts: ByteCounts,
    ) -> Self {
        Self {
            transport,
            entity,
            display_name: display_name.into(),
            window,
            rx_bytes: counts.rx_bytes,
            tx_bytes: counts.tx_bytes,
        }
    }

    pub fn key(&self) -> UsageKey {
        UsageKey {
            transport: self.transport,
            entity: self.entity,
            window: self.window,
        }
    }

    pub fn counts(&self) -> ByteCounts {
        ByteCounts::new(self.rx_bytes, self.tx_bytes)
    }

    pub fn total_bytes(&self) -> u64 {
        self.counts().total()
    }
}

/// Formats a byte count with decimal units (B, KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    const KILOBYTE: u64 = 1_000;
    const MEGABYTE: u64 = KILOBYTE * 1_000;
    const GIGABYTE: u64 = MEGABYTE * 1_000;

    if bytes < KILOBYTE {
        format!("{} B", bytes)
    } else if bytes < MEGABYTE {
        format!("{:.2} KB", bytes as f64 / KILOBYTE as f64)
    } else if bytes < GIGABYTE {
        format!("{:.2} MB", bytes as f64 / MEGABYTE as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GIGABYTE as f64)
    }
}
