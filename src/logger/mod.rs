//! Activity logging: typed events written as append-only JSONL.

pub mod activity;
pub mod jsonl;

pub use activity::{ActivityEvent, ActivityLog};
