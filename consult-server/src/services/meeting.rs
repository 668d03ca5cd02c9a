//! Meeting-link provisioning capability
//!
//! Assigning a meeting link is an external concern (Google Meet, Zoom, an
//! internal scheduler). The engine only depends on this trait; payment
//! confirmation calls it and refuses to confirm a booking it could not get
//! a link for.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Provisioning errors
#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("Provisioning failed: {0}")]
    Failed(String),
}

/// Capability interface for obtaining a meeting URL for a booking
#[async_trait]
pub trait MeetingProvisioner: Send + Sync {
    async fn provision(&self, booking_id: &str) -> Result<String, MeetingError>;
}

/// Local link generator, stands in for the external meeting platform
pub struct MeetLinkProvisioner {
    base_url: String,
}

impl MeetLinkProvisioner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Meet-style room code, `xxx-xxxx-xxx`
    fn room_code() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", &hex[0..3], &hex[3..7], &hex[7..10])
    }
}

impl Default for MeetLinkProvisioner {
    fn default() -> Self {
        Self::new("https://meet.google.com")
    }
}

#[async_trait]
impl MeetingProvisioner for MeetLinkProvisioner {
    async fn provision(&self, booking_id: &str) -> Result<String, MeetingError> {
        let url = format!("{}/{}", self.base_url, Self::room_code());
        tracing::debug!(booking_id, url = %url, "Meeting link provisioned");
        Ok(url)
    }
}
