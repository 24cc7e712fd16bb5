//! In-memory transport for testing
//!
//! Keeps every sent email so tests can assert on what would have been
//! delivered.

use crate::error::Result;
use crate::traits::transport::{Email, Receipt, Transport};
use async_trait::async_trait;
use std::any::Any;
use std::sync::{Mutex, PoisonError};

/// A transport that stores emails in memory instead of sending them
///
/// Reach it through a manager handle with
/// [`ManagedTransport::downcast_ref`](crate::ManagedTransport::downcast_ref):
///
/// ```rust,ignore
/// let handle = manager.get("memory")?;
/// handle.send(&email).await?;
///
/// let memory = handle.downcast_ref::<MemoryTransport>().unwrap();
/// assert_eq!(memory.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<Email>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every email sent so far, oldest first
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently sent email
    pub fn last(&self) -> Option<Email> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all stored emails
    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, email: &Email) -> Result<Receipt> {
        email.validate()?;

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());

        Ok(Receipt::for_email(email))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_records_emails() {
        let transport = MemoryTransport::new();
        let first = Email::new("from@test.com", "a@test.com", "First").text("1");
        let second = Email::new("from@test.com", "b@test.com", "Second").text("2");

        transport.send(&first).await.unwrap();
        transport.send(&second).await.unwrap();

        assert_eq!(transport.len(), 2);
        assert_eq!(transport.sent(), vec![first, second.clone()]);
        assert_eq!(transport.last(), Some(second));

        transport.clear();
        assert!(transport.is_empty());
    }

    #[tokio::test]
    async fn test_memory_transport_does_not_store_invalid_emails() {
        let transport = MemoryTransport::new();
        let email = Email::new("from@test.com", "to@test.com", "No body");

        assert!(transport.send(&email).await.is_err());
        assert!(transport.is_empty());
    }
}
