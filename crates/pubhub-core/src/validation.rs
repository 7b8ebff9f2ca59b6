//! # Validation Module
//!
//! Field validators shared by the domain builders.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Domain builders (THIS MODULE)                                │
//! │  ├── UserBuilder::build / PubBuilder::build / EventBuilder::build      │
//! │  └── No partially valid value ever escapes a builder                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Record mapping (pubhub-db)                                   │
//! │  └── Rows are rebuilt through the same builders                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── PRIMARY KEY / NOT NULL constraints                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pubhub_core::validation::{validate_entity_id, validate_email};
//!
//! validate_entity_id("id", "58b2aef6d9f0163f6eee636e").unwrap();
//! validate_email("irene@gmail.com").unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_TOKEN_LENGTH, MAX_URL_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity identifier (user, pub or event id).
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - No whitespace (ids are opaque server tokens such as Mongo ObjectIds)
///
/// ## Example
/// ```rust
/// use pubhub_core::validation::validate_entity_id;
///
/// assert!(validate_entity_id("id", "1111").is_ok());
/// assert!(validate_entity_id("id", "").is_err());
/// assert!(validate_entity_id("id", "has space").is_err());
/// ```
pub fn validate_entity_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.is_empty() {
        return Err(ValidationError::required(field));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid(field, "must not contain whitespace"));
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name (pubs and events).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    validate_max_length(field, name, MAX_NAME_LENGTH)
}

/// Validates a length limit on free text.
pub fn validate_max_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part and domain
/// - Domain contains a dot
///
/// ## Example
/// ```rust
/// use pubhub_core::validation::validate_email;
///
/// assert!(validate_email("irene@gmail.com").is_ok());
/// assert!(validate_email("irene").is_err());
/// assert!(validate_email("@gmail.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValidationError::invalid("email", "must contain exactly one '@'"));
    };

    if local.is_empty() || domain.is_empty() {
        return Err(ValidationError::invalid(
            "email",
            "local part and domain must not be empty",
        ));
    }

    if !domain.contains('.') || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid("email", "domain is not valid"));
    }

    validate_max_length("email", email, MAX_NAME_LENGTH)
}

/// Validates an http(s) URL such as a photo URL.
pub fn validate_url(field: &str, url: &str) -> ValidationResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::invalid(
            field,
            "must start with http:// or https://",
        ));
    }

    validate_max_length(field, url, MAX_URL_LENGTH)
}

/// Validates a push-notification registration token.
pub fn validate_registration_token(token: &str) -> ValidationResult<()> {
    if token.trim().is_empty() {
        return Err(ValidationError::required("registration_token"));
    }

    validate_max_length("registration_token", token, MAX_TOKEN_LENGTH)
}

// =============================================================================
// Coordinate Validators
// =============================================================================

/// Validates a latitude in degrees.
pub fn validate_latitude(value: f64) -> ValidationResult<()> {
    validate_coordinate("latitude", value, 90.0)
}

/// Validates a longitude in degrees.
pub fn validate_longitude(value: f64) -> ValidationResult<()> {
    validate_coordinate("longitude", value, 180.0)
}

fn validate_coordinate(field: &str, value: f64, limit: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(-limit..=limit).contains(&value) {
        return Err(ValidationError::CoordinateOutOfRange {
            field: field.to_string(),
            value,
            min: -limit,
            max: limit,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entity_id() {
        assert!(validate_entity_id("id", "58b2aef6d9f0163f6eee636e").is_ok());
        assert!(validate_entity_id("id", "1111").is_ok());

        assert!(validate_entity_id("id", "").is_err());
        assert!(validate_entity_id("id", "a b").is_err());
        assert!(validate_entity_id("id", &"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "The Crown").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("irene@gmail.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("irene@").is_err());
        assert!(validate_email("irene@gmail").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("ir ene@gmail.com").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("photo_url", "http://images.com/irene.jpg").is_ok());
        assert!(validate_url("photo_url", "https://images.com/irene.jpg").is_ok());
        assert!(validate_url("photo_url", "ftp://images.com/irene.jpg").is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_latitude(40.4168).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.01).is_err());
        assert!(validate_latitude(f64::NAN).is_err());

        assert!(validate_longitude(-3.7038).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.5).is_err());
    }

    #[test]
    fn test_validate_registration_token() {
        assert!(validate_registration_token("fcm-token-123").is_ok());
        assert!(validate_registration_token(" ").is_err());
    }
}
