//! Command-line command handlers for coopdoor.
//!
//! One-shot commands live here, one per submodule. Running the controller itself
//! goes through [`crate::CoopDoor`].

pub mod help;
pub mod schedule;
pub mod simulate;
