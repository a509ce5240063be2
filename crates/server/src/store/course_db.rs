use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE courses (
    course_id   TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    share_key   TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE sections (
    section_id              TEXT PRIMARY KEY,
    course_id               TEXT NOT NULL REFERENCES courses (course_id) ON DELETE CASCADE,
    title                   TEXT NOT NULL,
    description             TEXT NOT NULL DEFAULT '',
    position                INTEGER NULL,
    lesson_count            INTEGER NOT NULL DEFAULT 0,
    total_duration_seconds  INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX sections_course_idx
    ON sections (course_id);

CREATE TABLE lessons (
    lesson_id        TEXT PRIMARY KEY,
    course_id        TEXT NOT NULL REFERENCES courses (course_id) ON DELETE CASCADE,
    section_id       TEXT NULL REFERENCES sections (section_id),
    title            TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    video_ref        TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL CHECK (duration_seconds >= 0),
    level            INTEGER NOT NULL CHECK (level IN (0, 1)),
    local_index      INTEGER NOT NULL,
    global_index     INTEGER NOT NULL
);

CREATE INDEX lessons_course_order_idx
    ON lessons (course_id, global_index);

CREATE INDEX lessons_section_idx
    ON lessons (section_id, local_index);

CREATE TABLE lesson_progress (
    course_id     TEXT NOT NULL REFERENCES courses (course_id) ON DELETE CASCADE,
    lesson_id     TEXT NOT NULL,
    completed_at  TEXT NOT NULL,
    PRIMARY KEY (course_id, lesson_id)
);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

/// The course database: schema-versioned SQLite file holding courses,
/// sections, lessons, and lesson progress.
#[derive(Debug)]
pub struct CourseDb {
    conn: Connection,
}

impl CourseDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create course db parent directory `{}`", parent.display())
            })?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("failed to open course db at `{}`", path.display()))?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            ",
        )
        .context("failed to configure sqlite pragmas for course db")?;

        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;

        Ok(Self { conn })
    }

    /// In-memory database for tests and ephemeral runs.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn =
            Connection::open_in_memory().context("failed to open in-memory course db")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("failed to configure sqlite pragmas for in-memory course db")?;
        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .context("failed to ensure schema_migrations table exists")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .context("failed to read current schema version")
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply course db migration v{version}"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .with_context(|| format!("failed to record migration v{version}"))?;
        tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
        current_version = *version;
    }

    Ok(())
}
