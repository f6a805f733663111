pub mod cloud;
pub mod db;
