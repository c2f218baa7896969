//! Key-value metadata store collaborator.
//!
//! The wallet persists long-lived backend credentials in its encrypted
//! metadata store. The engine only reads and writes them; storage format
//! and encryption are the wallet's concern.

use async_trait::async_trait;
use thiserror::Error;

use pelican_core::Credentials;

/// Errors from the metadata store collaborator.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A read failed (decryption, deserialization, transport).
    #[error("metadata read failed: {0}")]
    Read(String),
    /// A write failed.
    #[error("metadata write failed: {0}")]
    Write(String),
}

/// Durable per-wallet key-value storage.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the stored backend credentials, if any.
    ///
    /// `Ok(None)` means this wallet never registered a backend user.
    async fn credentials(&self) -> Result<Option<Credentials>, MetadataError>;

    /// Persist backend credentials after registration.
    async fn store_credentials(&self, credentials: &Credentials) -> Result<(), MetadataError>;

    /// Partner user id carried over from a legacy integration, if any.
    /// Forwarded to user registration so the backend can merge records.
    async fn partner_id(&self) -> Result<Option<String>, MetadataError>;
}
