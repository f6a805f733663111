//! Service plumbing shared by Roadwatch services: health probes, request-id
//! and trace layers, tracing initialization and wire serde helpers.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
