//! Logger capability handed to extensions.
//!
//! Extension log records flow into the host's `tracing` pipeline tagged with
//! the extension id, so one subscriber configuration covers host and
//! extension output alike.

use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Namespaced logging facade for one extension.
#[derive(Debug, Clone)]
pub struct ExtensionLogger {
    extension_id: String,
}

impl ExtensionLogger {
    #[must_use]
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
        }
    }

    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        match meta {
            Some(meta) => debug!(extension_id = %self.extension_id, %meta, "{message}"),
            None => debug!(extension_id = %self.extension_id, "{message}"),
        }
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        match meta {
            Some(meta) => info!(extension_id = %self.extension_id, %meta, "{message}"),
            None => info!(extension_id = %self.extension_id, "{message}"),
        }
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        match meta {
            Some(meta) => warn!(extension_id = %self.extension_id, %meta, "{message}"),
            None => warn!(extension_id = %self.extension_id, "{message}"),
        }
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        match meta {
            Some(meta) => error!(extension_id = %self.extension_id, %meta, "{message}"),
            None => error!(extension_id = %self.extension_id, "{message}"),
        }
    }
}
