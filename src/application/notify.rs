use std::collections::HashMap;

use mockall::automock;
use uuid::Uuid;

/// Template-keyed message for the external notification collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub recipient: Uuid,
    pub template_key: &'static str,
    pub variables: HashMap<String, String>,
}

/// Fire-and-forget dispatch. Implementations must never block the caller;
/// delivery failures are logged, not surfaced.
#[automock]
pub trait NotificationSender: Send + Sync {
    fn dispatch(&self, request: NotificationRequest);
}
