// Course persistence gateway: full-structure replacement and reads.
//
// The editor always saves the entire course structure; `replace_structure`
// deletes the prior rows and recreates them inside one transaction, so a
// failed save leaves the previously persisted structure intact. Readers
// get back a `Course` whose row lists preserve insertion order, which the
// projector relies on for its stable tie-breaks.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use lectern_common::types::{Course, CourseOutline, Lesson, LessonLevel, OutlineItem, Section};

/// Gateway operations over the `courses`/`sections`/`lessons` tables.
pub struct CourseStore;

impl CourseStore {
    /// Create an empty course with a fresh share key.
    pub fn create_course(conn: &Connection, title: &str) -> Result<Course> {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            share_key: Uuid::new_v4().simple().to_string(),
            sections: Vec::new(),
            standalone_lessons: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO courses (course_id, title, share_key, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                course.id.to_string(),
                course.title,
                course.share_key,
                course.created_at.to_rfc3339(),
                course.updated_at.to_rfc3339(),
            ],
        )
        .context("failed to insert course row")?;

        Ok(course)
    }

    /// Load a course with its full structure, or `None` if the id is
    /// unknown.
    pub fn load_structure(conn: &Connection, course_id: Uuid) -> Result<Option<Course>> {
        let header = conn
            .query_row(
                "SELECT course_id, title, share_key, created_at, updated_at \
                 FROM courses WHERE course_id = ?1",
                params![course_id.to_string()],
                row_to_course_header,
            )
            .optional()
            .context("failed to query course row")?;

        match header {
            Some(course) => Ok(Some(Self::fill_structure(conn, course)?)),
            None => Ok(None),
        }
    }

    /// Load a course by its share key (the read-only shared-link page).
    pub fn load_structure_by_share_key(conn: &Connection, share_key: &str) -> Result<Option<Course>> {
        let header = conn
            .query_row(
                "SELECT course_id, title, share_key, created_at, updated_at \
                 FROM courses WHERE share_key = ?1",
                params![share_key],
                row_to_course_header,
            )
            .optional()
            .context("failed to query course row by share key")?;

        match header {
            Some(course) => Ok(Some(Self::fill_structure(conn, course)?)),
            None => Ok(None),
        }
    }

    fn fill_structure(conn: &Connection, mut course: Course) -> Result<Course> {
        let mut stmt = conn
            .prepare(
                "SELECT section_id, title, description, position, lesson_count, \
                        total_duration_seconds \
                 FROM sections WHERE course_id = ?1 ORDER BY rowid ASC",
            )
            .context("failed to prepare sections query")?;
        let sections = stmt
            .query_map(params![course.id.to_string()], row_to_section)
            .context("failed to query sections")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to decode section rows")?;

        let mut section_slots: HashMap<Uuid, usize> = HashMap::new();
        course.sections = sections;
        for (idx, section) in course.sections.iter().enumerate() {
            section_slots.insert(section.id, idx);
        }

        let mut stmt = conn
            .prepare(
                "SELECT lesson_id, section_id, title, description, video_ref, \
                        duration_seconds, level, local_index, global_index \
                 FROM lessons WHERE course_id = ?1 ORDER BY rowid ASC",
            )
            .context("failed to prepare lessons query")?;
        let lessons = stmt
            .query_map(params![course.id.to_string()], row_to_lesson)
            .context("failed to query lessons")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to decode lesson rows")?;

        for lesson in lessons {
            match lesson.section_id {
                Some(section_id) => {
                    let Some(idx) = section_slots.get(&section_id) else {
                        bail!(
                            "lesson {} references section {section_id} missing from course {}",
                            lesson.id,
                            course.id
                        );
                    };
                    course.sections[*idx].lessons.push(lesson);
                }
                None => course.standalone_lessons.push(lesson),
            }
        }

        Ok(course)
    }

    /// Atomically replace the course's structure with an assigned outline.
    ///
    /// Deletes prior progress rows, lessons, and sections, then inserts the
    /// new rows in unified walk order. Returns `false` (with nothing
    /// written) when the course does not exist; any mid-write failure rolls
    /// the whole transaction back.
    pub fn replace_structure(
        conn: &mut Connection,
        course_id: Uuid,
        outline: &CourseOutline,
    ) -> Result<bool> {
        let tx = conn.transaction().context("failed to start structure replacement")?;
        let course_key = course_id.to_string();

        let exists: i64 = tx
            .query_row(
                "SELECT COUNT(1) FROM courses WHERE course_id = ?1",
                params![course_key],
                |row| row.get(0),
            )
            .context("failed to check course existence")?;
        if exists == 0 {
            return Ok(false);
        }

        tx.execute("DELETE FROM lesson_progress WHERE course_id = ?1", params![course_key])
            .context("failed to clear lesson progress")?;
        tx.execute("DELETE FROM lessons WHERE course_id = ?1", params![course_key])
            .context("failed to clear lessons")?;
        tx.execute("DELETE FROM sections WHERE course_id = ?1", params![course_key])
            .context("failed to clear sections")?;

        for item in &outline.items {
            match item {
                OutlineItem::Section(section) => {
                    tx.execute(
                        "INSERT INTO sections \
                         (section_id, course_id, title, description, position, \
                          lesson_count, total_duration_seconds) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            section.id.to_string(),
                            course_key,
                            section.title,
                            section.description,
                            section.position,
                            section.lesson_count,
                            section.total_duration_seconds,
                        ],
                    )
                    .context("failed to insert section row")?;

                    for lesson in &section.lessons {
                        insert_lesson(&tx, &course_key, lesson)?;
                    }
                }
                OutlineItem::Lesson(lesson) => insert_lesson(&tx, &course_key, lesson)?,
            }
        }

        tx.execute(
            "UPDATE courses SET updated_at = ?1 WHERE course_id = ?2",
            params![Utc::now().to_rfc3339(), course_key],
        )
        .context("failed to bump course updated_at")?;

        tx.commit().context("failed to commit structure replacement")?;
        Ok(true)
    }
}

fn insert_lesson(conn: &Connection, course_key: &str, lesson: &Lesson) -> Result<()> {
    conn.execute(
        "INSERT INTO lessons \
         (lesson_id, course_id, section_id, title, description, video_ref, \
          duration_seconds, level, local_index, global_index) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            lesson.id.to_string(),
            course_key,
            lesson.section_id.map(|id| id.to_string()),
            lesson.title,
            lesson.description,
            lesson.video_ref,
            lesson.duration_seconds,
            lesson.level.as_i64(),
            lesson.local_index,
            lesson.global_index,
        ],
    )
    .context("failed to insert lesson row")?;
    Ok(())
}

fn parse_uuid(raw: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

fn parse_timestamp(raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw).map(|dt| dt.with_timezone(&Utc)).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

fn row_to_course_header(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: parse_uuid(row.get(0)?)?,
        title: row.get(1)?,
        share_key: row.get(2)?,
        sections: Vec::new(),
        standalone_lessons: Vec::new(),
        created_at: parse_timestamp(row.get(3)?)?,
        updated_at: parse_timestamp(row.get(4)?)?,
    })
}

fn row_to_section(row: &rusqlite::Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        id: parse_uuid(row.get(0)?)?,
        title: row.get(1)?,
        description: row.get(2)?,
        position: row.get(3)?,
        lesson_count: row.get(4)?,
        total_duration_seconds: row.get(5)?,
        lessons: Vec::new(),
    })
}

fn row_to_lesson(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lesson> {
    let section_id: Option<String> = row.get(1)?;
    let section_id = section_id.map(parse_uuid).transpose()?;
    let level_raw: i64 = row.get(6)?;
    let level = LessonLevel::from_i64(level_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Integer,
            format!("invalid lesson level {level_raw}").into(),
        )
    })?;

    Ok(Lesson {
        id: parse_uuid(row.get(0)?)?,
        section_id,
        title: row.get(2)?,
        description: row.get(3)?,
        video_ref: row.get(4)?,
        duration_seconds: row.get(5)?,
        level,
        local_index: row.get(7)?,
        global_index: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::course_db::CourseDb;
    use lectern_common::outline::assigner::assign_indices;
    use lectern_common::outline::projector::project;
    use lectern_common::protocol::{build_outline, LessonPayload, OutlineEntry, SaveOutlineRequest};

    fn payload_lesson(title: &str, duration: u32) -> LessonPayload {
        LessonPayload {
            title: title.to_string(),
            description: String::new(),
            video_ref: format!("yt:{title}"),
            duration_seconds: duration,
        }
    }

    fn sample_outline() -> CourseOutline {
        let mut outline = build_outline(SaveOutlineRequest {
            entries: vec![
                OutlineEntry::Section {
                    title: "Intro".to_string(),
                    description: "basics".to_string(),
                    lessons: vec![payload_lesson("L1", 60), payload_lesson("L2", 90)],
                },
                OutlineEntry::Lesson(payload_lesson("Standalone-A", 120)),
                OutlineEntry::Section {
                    title: "Adv".to_string(),
                    description: String::new(),
                    lessons: vec![payload_lesson("L3", 30)],
                },
            ],
        });
        assign_indices(&mut outline);
        outline
    }

    #[test]
    fn replace_and_load_round_trips_through_the_projector() {
        let mut db = CourseDb::open_in_memory().expect("db should open");
        let course =
            CourseStore::create_course(db.connection(), "Rust 101").expect("create should succeed");

        let outline = sample_outline();
        let replaced = CourseStore::replace_structure(db.connection_mut(), course.id, &outline)
            .expect("replace should succeed");
        assert!(replaced);

        let loaded = CourseStore::load_structure(db.connection(), course.id)
            .expect("load should succeed")
            .expect("course should exist");
        assert_eq!(project(&loaded), outline);
    }

    #[test]
    fn shared_key_read_reconstructs_the_same_order() {
        let mut db = CourseDb::open_in_memory().expect("db should open");
        let course =
            CourseStore::create_course(db.connection(), "Rust 101").expect("create should succeed");

        let outline = sample_outline();
        CourseStore::replace_structure(db.connection_mut(), course.id, &outline)
            .expect("replace should succeed");

        let by_id = CourseStore::load_structure(db.connection(), course.id)
            .expect("load should succeed")
            .expect("course should exist");
        let by_key = CourseStore::load_structure_by_share_key(db.connection(), &course.share_key)
            .expect("shared load should succeed")
            .expect("course should exist");

        assert_eq!(project(&by_id), project(&by_key));
    }

    #[test]
    fn replacing_discards_all_prior_structure_rows() {
        let mut db = CourseDb::open_in_memory().expect("db should open");
        let course =
            CourseStore::create_course(db.connection(), "Rust 101").expect("create should succeed");

        CourseStore::replace_structure(db.connection_mut(), course.id, &sample_outline())
            .expect("first replace should succeed");

        let mut second = build_outline(SaveOutlineRequest {
            entries: vec![OutlineEntry::Lesson(payload_lesson("Only", 45))],
        });
        assign_indices(&mut second);
        CourseStore::replace_structure(db.connection_mut(), course.id, &second)
            .expect("second replace should succeed");

        let loaded = CourseStore::load_structure(db.connection(), course.id)
            .expect("load should succeed")
            .expect("course should exist");
        assert!(loaded.sections.is_empty());
        assert_eq!(loaded.standalone_lessons.len(), 1);
        assert_eq!(loaded.standalone_lessons[0].title, "Only");
    }

    #[test]
    fn replace_for_unknown_course_writes_nothing() {
        let mut db = CourseDb::open_in_memory().expect("db should open");
        let replaced =
            CourseStore::replace_structure(db.connection_mut(), Uuid::new_v4(), &sample_outline())
                .expect("replace call should not error");
        assert!(!replaced);

        let lesson_rows: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM lessons", [], |row| row.get(0))
            .expect("count query should succeed");
        assert_eq!(lesson_rows, 0);
    }

    #[test]
    fn failed_replacement_rolls_back_to_the_previous_structure() {
        let mut db = CourseDb::open_in_memory().expect("db should open");
        let course =
            CourseStore::create_course(db.connection(), "Rust 101").expect("create should succeed");

        let good = sample_outline();
        CourseStore::replace_structure(db.connection_mut(), course.id, &good)
            .expect("initial replace should succeed");

        // A duplicated lesson id violates the primary key mid-transaction.
        let mut broken = sample_outline();
        let duplicate = match &broken.items[0] {
            OutlineItem::Section(section) => section.lessons[0].clone(),
            _ => panic!("expected a section first"),
        };
        broken.items.push(OutlineItem::Lesson(duplicate));

        let result = CourseStore::replace_structure(db.connection_mut(), course.id, &broken);
        assert!(result.is_err());

        let loaded = CourseStore::load_structure(db.connection(), course.id)
            .expect("load should succeed")
            .expect("course should exist");
        assert_eq!(project(&loaded), good);
    }
}
