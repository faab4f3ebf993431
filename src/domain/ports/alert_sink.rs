use std::collections::BTreeMap;

use async_trait::async_trait;

/// External error-tracking sink.
///
/// Implementations swallow their own failures.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn capture(&self, error: &str, tags: &BTreeMap<String, String>);
}
