//! Certification compliance and expiry-notification engine for school
//! athletics programs.
//!
//! The crate is organized around two feature areas: [`compliance`] computes
//! whether a coach satisfies the certification requirements of the programs
//! they are assigned to, and [`notifications`] resolves reminder schedules and
//! runs the idempotent expiry-notification dispatch cycle. Storage and email
//! delivery sit behind traits so the engine can be exercised against in-memory
//! fakes; production wiring plugs a relational store into the same seams.

pub mod actor;
pub mod compliance;
pub mod config;
pub mod error;
pub mod notifications;
pub mod store;
pub mod telemetry;
