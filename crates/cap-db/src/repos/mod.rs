//! Repository modules. Each adds methods to `CapService` via `impl CapService`.

pub mod activity;
pub mod allocation;
pub mod group;
pub mod investor;
pub mod project;
pub mod redemption;
pub mod subscription;
pub mod wallet;
