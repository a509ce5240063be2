// Persistence: schema-versioned SQLite course database and its stores.

pub mod course_db;
pub mod courses;
pub mod progress;
