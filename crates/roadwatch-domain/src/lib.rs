//! Domain types shared by the Roadwatch crates.
//!
//! Pure types with no framework dependencies: identifiers, the closed
//! enumerations for issue status and danger level, and the sync vocabulary.

pub mod id;
pub mod issue;
pub mod sync;

mod code;
