pub mod health;
pub mod road_issue;
pub mod sync_cycle;
pub mod sync_log;
pub mod user;
