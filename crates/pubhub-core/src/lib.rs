//! # pubhub-core: Domain Model for Pubhub
//!
//! This crate contains the domain model of the Pubhub venue and event
//! discovery client as plain values with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pubhub Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            App code (screens, background services)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ DbManager / AsyncManager               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pubhub-db (Data Access)                      │   │
//! │  │        records, mapping, repositories, manager builder          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pubhub-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐                 │   │
//! │  │   │   types   │  │ aggregate  │  │ validation│                 │   │
//! │  │   │ User, Pub │  │  PubList   │  │   rules   │                 │   │
//! │  │   │   Event   │  │ EventList  │  │           │                 │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain values (User, Pub, Event) and their builders
//! - [`aggregate`] - PubList / EventList returned by relationship queries
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use pubhub_core::User;
//!
//! let user = User::builder("58b2aef6d9f0163f6eee636e")
//!     .name("Irene")
//!     .email("irene@gmail.com")
//!     .photo_url("http://images.com/irene.jpg")
//!     .favorites(["1111", "2222"])
//!     .build()
//!     .unwrap();
//!
//! assert!(user.is_favorite("1111"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{EventList, PubList};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an entity id.
pub const MAX_ID_LENGTH: usize = 64;

/// Maximum length of names and emails.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of free text (descriptions, addresses).
pub const MAX_TEXT_LENGTH: usize = 4000;

/// Maximum length of photo URLs.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum length of a push-notification registration token.
pub const MAX_TOKEN_LENGTH: usize = 4096;

/// Generates an id for an entity created locally rather than by the server.
///
/// 32 lowercase hex characters (a UUID v4 without hyphens).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_is_valid_entity_id() {
        let id = generate_id();
        assert_eq!(id.len(), 32);
        assert!(validation::validate_entity_id("id", &id).is_ok());
        assert_ne!(id, generate_id());
    }
}
