//! slotbook — a time-slot scheduling and booking engine.
//!
//! Providers declare recurring availability windows (a date range crossed
//! with a daily time range, cut into fixed-duration slots); consumers book
//! the resulting slots. The engine owns three things:
//!
//! - validating a window and expanding it into discrete, non-overlapping
//!   slots ([`engine::SlotIter`]);
//! - the slot state machine (Free / Booked / Blocked) and the use-cases
//!   built on it — book, cancel, rebook, block-period;
//! - the concurrency discipline that guarantees at most one winner when
//!   several callers race for the same slot ([`engine::BookingLedger`]).
//!
//! Identity verification, durable storage, notification delivery, and
//! report rendering are external: callers pass an already-authenticated
//! [`auth::AuthenticatedActor`] into every mutating call, and the read-side
//! projections in `engine::queries` feed the presentation and export layers.

pub mod auth;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;

pub use auth::{AuthenticatedActor, Role, ServiceSecret};
pub use engine::{BookingLedger, Engine, EngineError};
