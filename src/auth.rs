//! Actor identity and the service-to-service boundary secret.
//!
//! Identity verification itself is external: the embedding layer hands this
//! crate an already-authenticated [`AuthenticatedActor`]. The engine never
//! re-derives authorization from raw credentials — the only credential-shaped
//! thing here is [`ServiceSecret`], the pre-shared key a machine caller
//! presents at the boundary before any engine call is made.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Owns resources and availability windows; blocks periods, manages the roster.
    Provider,
    /// Books and cancels slots.
    Consumer,
}

/// An identity the external auth layer has already verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedActor {
    pub id: String,
    pub role: Role,
}

impl AuthenticatedActor {
    pub fn provider(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Provider,
        }
    }

    pub fn consumer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Consumer,
        }
    }

    pub fn is_provider(&self) -> bool {
        self.role == Role::Provider
    }

    pub fn is_consumer(&self) -> bool {
        self.role == Role::Consumer
    }
}

/// The configured pre-shared secret for service-to-service calls.
#[derive(Debug, Clone)]
pub struct ServiceSecret {
    secret: String,
}

impl ServiceSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compare a presented key against the configured secret without
    /// short-circuiting on the first mismatched byte.
    pub fn verify(&self, presented: &str) -> bool {
        let a = self.secret.as_bytes();
        let b = presented.as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
