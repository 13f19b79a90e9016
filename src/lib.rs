//! Ulimi Store holds the client-side state of the Ulimi agricultural marketplace.
//!
//! Farmers register farms and crops and list produce, customers fill a cart and place
//! orders, and admins review listings and manage users. Every collection is mirrored to
//! a key-value [`StorageMedium`] so state survives a restart.
//!
//! ## Core Components
//! - [`model`]: Entity types (users, farms, crops, products, orders, sensors, cart).
//! - [`engine`]: Storage media, the collection repository, and the two stores.
//! - [`policy`]: Role and ownership checks shared by every front end.
//! - [`stats`]: Dashboard and analytics aggregates derived from the collections.
//! - [`context`]: Wires configuration, medium and stores together at start-up.

pub mod config;
pub mod context;
pub mod engine;
pub mod model;
pub mod policy;
pub mod seed;
pub mod stats;

pub use config::Config;
pub use context::AppContext;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewUser, Role, User};
use crate::policy::Action;

/// Errors returned by the Ulimi stores.
#[derive(Error, Debug)]
pub enum Error {
    /// A foreign key on a new or updated record names nothing.
    #[error("invalid reference: {entity} '{id}' does not exist")]
    InvalidReference { entity: &'static str, id: String },
    /// A status field was asked to move along an edge its state machine does not have.
    #[error("invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
    /// The caller supplied a value the operation cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No demo user matches the supplied email.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The operation needs a signed-in user and there is none.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The current user may not perform the action.
    #[error("forbidden: {role} may not {action}")]
    Forbidden { role: Role, action: Action },
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred in the storage medium.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for Ulimi Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A synchronous key-value string store that survives restarts.
///
/// Keys are short fixed strings (`ulimi_farms`, `ulimi_user`, ...); values are whole
/// JSON documents.
pub trait StorageMedium: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Tracks the single signed-in user of a process.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Signs in the user whose email matches exactly. The password is not checked.
    async fn login(&self, email: &str, password: &str) -> Result<User>;
    /// Creates a user record and signs it in. Always succeeds unless persistence fails.
    async fn signup(&self, data: NewUser) -> Result<User>;
    /// Signs out and forgets the persisted session.
    fn logout(&self) -> Result<()>;
    /// Returns the signed-in user, if any.
    fn current_user(&self) -> Option<User>;
}
