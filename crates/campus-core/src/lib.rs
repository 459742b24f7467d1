//! Core types and trait definitions for the campus administration backend.
//!
//! No HTTP or database dependencies live here. The crate owns the
//! identity/profile model, credential derivation, the authorization
//! policy, the [`store::CampusStore`] abstraction and the provisioning
//! workflows that keep identities, profiles and their dependent records
//! consistent.

pub mod bulk;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod policy;
pub mod profile;
pub mod provision;
pub mod record;
pub mod secret;
pub mod store;

pub use error::{Error, Result};
