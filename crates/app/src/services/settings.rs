use netmeter_core::Transport;
use serde::Serialize;

use crate::error::Result;
use crate::services::{SharedConfig, open_db};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapStatus {
    pub transport: Transport,
    pub bootstrapped: bool,
}

#[derive(Clone)]
pub struct SettingsService {
    config: SharedConfig,
}

impl SettingsService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn bootstrap_status(&self) -> Result<Vec<BootstrapStatus>> {
        let db = open_db(&self.config)?;
        Transport::ALL
            .iter()
            .map(|transport| -> Result<BootstrapStatus> {
                Ok(BootstrapStatus {
                    transport: *transport,
                    bootstrapped: db.is_bootstrapped(*transport)?,
                })
            })
            .collect()
    }

    /// Clears the bootstrap flag for one transport, or all when `None`.
    pub fn reset_bootstrap(&self, transport: Option<Transport>) -> Result<()> {
        let db = open_db(&self.config)?;
        let transports = match transport {
            Some(transport) => vec![transport],
            None => Transport::ALL.to_vec(),
        };
        for transport in transports {
            db.set_bootstrapped(transport, false)?;
        }
        Ok(())
    }

    pub fn bucket_size_ms(&self) -> Result<Option<i64>> {
        let db = open_db(&self.config)?;
        Ok(db.stored_bucket_size()?)
    }
}
