pub mod activity;
pub mod allocation;
pub mod dispatch;
pub mod investor;
pub mod project;
pub mod schema;
pub mod shared;
pub mod subscription;
pub mod wallet;
