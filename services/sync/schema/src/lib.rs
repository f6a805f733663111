//! sea-orm entities for the sync service database.

pub mod block_user;
pub mod road_issues;
pub mod sync_logs;
pub mod sync_meta;
pub mod users;
