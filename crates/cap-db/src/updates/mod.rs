//! Partial-update payloads. `None` leaves a column untouched;
//! `Some(None)` on a nullable column clears it.

pub mod allocation;
pub mod investor;
pub mod project;
pub mod subscription;
