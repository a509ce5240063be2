// lesson_progress table access: viewer completion marks.
//
// Rows are keyed by (course, lesson) and cleared wholesale whenever the
// course structure is replaced, since every save recreates lesson rows
// with fresh ids.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub struct ProgressStore;

impl ProgressStore {
    /// Mark a lesson complete. Returns `false` when the lesson does not
    /// belong to the course (stale viewer state after a structure save).
    pub fn mark_complete(conn: &Connection, course_id: Uuid, lesson_id: Uuid) -> Result<bool> {
        let belongs: i64 = conn
            .query_row(
                "SELECT COUNT(1) FROM lessons WHERE lesson_id = ?1 AND course_id = ?2",
                params![lesson_id.to_string(), course_id.to_string()],
                |row| row.get(0),
            )
            .context("failed to check lesson ownership")?;
        if belongs == 0 {
            return Ok(false);
        }

        conn.execute(
            "INSERT OR REPLACE INTO lesson_progress (course_id, lesson_id, completed_at) \
             VALUES (?1, ?2, datetime('now'))",
            params![course_id.to_string(), lesson_id.to_string()],
        )
        .context("failed to insert lesson progress row")?;
        Ok(true)
    }

    /// Ids of completed lessons for a course, in completion order.
    pub fn completed_lessons(conn: &Connection, course_id: Uuid) -> Result<Vec<Uuid>> {
        let mut stmt = conn
            .prepare(
                "SELECT lesson_id FROM lesson_progress \
                 WHERE course_id = ?1 ORDER BY completed_at ASC, rowid ASC",
            )
            .context("failed to prepare lesson progress query")?;

        let rows = stmt
            .query_map(params![course_id.to_string()], |row| {
                let raw: String = row.get(0)?;
                Uuid::parse_str(&raw).map_err(|error| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(error),
                    )
                })
            })
            .context("failed to query lesson progress")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to collect lesson progress rows")
    }
}
