//! # cap-core
//!
//! Core types shared across all captable crates:
//! - Entity structs for projects, cap tables, investors, subscriptions,
//!   token allocations, redemptions, multi-signature wallets and activity
//!   entries
//! - Status enums and the entity-kind catalogue
//! - ID prefix constants
//! - Actor / capability model guarding every mutation
//! - Activity-log search, tab patterns and CSV export
//! - Cross-cutting error types

pub mod activity;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod ids;
