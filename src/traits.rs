//! Common traits used throughout this crate to fetch and republish printer
//! fleet state.

use async_trait::async_trait;
use serde_json::Value;

/// Something that can produce the current list of printers, each as the raw
/// JSON object the vendor returned for it.
///
/// The [crate::Coordinator] only ever talks to its printers through this
/// trait, and treats every error the same way.
#[async_trait]
pub trait PrinterSource: Send + Sync {
    /// Fetch every printer visible to this installation.
    async fn list_printers(&self) -> anyhow::Result<Vec<Value>>;
}

#[async_trait]
impl PrinterSource for formlabs::Client {
    async fn list_printers(&self) -> anyhow::Result<Vec<Value>> {
        Ok(formlabs::Client::list_printers(self).await?)
    }
}
