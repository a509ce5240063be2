// lectern-server: persistence gateway and HTTP API for course structures.

pub mod api;
pub mod config;
pub mod store;
