pub mod driver;
pub mod outbox;
pub mod pull;
pub mod push;
pub mod road_issue;
pub mod user;
