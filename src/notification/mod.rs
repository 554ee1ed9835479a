//! Side channel used to surface new approvals to a human.

pub mod browser;

use uuid::Uuid;

/// Fire-and-forget hook run once for every new pending approval.
///
/// Implementations must not block and must not fail the approval: the record
/// exists regardless and can be completed by visiting its URL directly.
pub trait PendingNotifier: Send + Sync {
    fn notify(&self, id: &Uuid, url: &str);
}

/// Notifier that only writes the approval URL to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl PendingNotifier for LogNotifier {
    fn notify(&self, id: &Uuid, url: &str) {
        tracing::info!(%id, "transaction pending: {}", url);
    }
}
