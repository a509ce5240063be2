// lectern-common: shared types and the course outline engine.

pub mod outline;
pub mod protocol;
pub mod types;
