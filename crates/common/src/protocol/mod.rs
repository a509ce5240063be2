// Editor save payload: the wire shape of a full-course structure write.
//
// The editor always sends the entire desired structure as an ordered list
// of tagged entries; the server validates it, builds a `CourseOutline`,
// runs the assigner, and hands the result to the persistence gateway.
// There is no partial-reorder write.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{CourseOutline, Lesson, LessonLevel, OutlineItem, Section};

/// Upper bounds enforced before any write.
pub const MAX_OUTLINE_ENTRIES: usize = 500;
pub const MAX_LESSONS_PER_SECTION: usize = 500;
pub const MAX_TITLE_CHARS: usize = 300;
/// 24 hours; anything beyond this is a mangled duration, not a lesson.
pub const MAX_DURATION_SECONDS: u32 = 86_400;

/// Lesson attributes as sent by the editor (order fields are assigned
/// server-side, never trusted from the client).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_ref: String,
    pub duration_seconds: u32,
}

/// One top-level entry of the save payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlineEntry {
    Section {
        title: String,
        #[serde(default)]
        description: String,
        lessons: Vec<LessonPayload>,
    },
    Lesson(LessonPayload),
}

/// Body of `PUT /api/courses/{id}/outline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveOutlineRequest {
    pub entries: Vec<OutlineEntry>,
}

/// Payload rejected before any write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("outline has {0} entries, maximum is {MAX_OUTLINE_ENTRIES}")]
    TooManyEntries(usize),
    #[error("section `{section}` has {count} lessons, maximum is {MAX_LESSONS_PER_SECTION}")]
    TooManyLessons { section: String, count: usize },
    #[error("{kind} title must not be empty")]
    EmptyTitle { kind: &'static str },
    #[error("{kind} title exceeds {MAX_TITLE_CHARS} characters")]
    TitleTooLong { kind: &'static str },
    #[error("lesson `{title}` duration {duration_seconds}s exceeds {MAX_DURATION_SECONDS}s")]
    DurationOutOfRange { title: String, duration_seconds: u32 },
}

fn validate_title(kind: &'static str, title: &str) -> Result<(), PayloadError> {
    if title.trim().is_empty() {
        return Err(PayloadError::EmptyTitle { kind });
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(PayloadError::TitleTooLong { kind });
    }
    Ok(())
}

fn validate_lesson(payload: &LessonPayload) -> Result<(), PayloadError> {
    validate_title("lesson", &payload.title)?;
    if payload.duration_seconds > MAX_DURATION_SECONDS {
        return Err(PayloadError::DurationOutOfRange {
            title: payload.title.clone(),
            duration_seconds: payload.duration_seconds,
        });
    }
    Ok(())
}

/// Validate a save payload. Rejection happens up front, before any row is
/// touched.
pub fn validate_payload(request: &SaveOutlineRequest) -> Result<(), PayloadError> {
    if request.entries.len() > MAX_OUTLINE_ENTRIES {
        return Err(PayloadError::TooManyEntries(request.entries.len()));
    }
    for entry in &request.entries {
        match entry {
            OutlineEntry::Section { title, lessons, .. } => {
                validate_title("section", title)?;
                if lessons.len() > MAX_LESSONS_PER_SECTION {
                    return Err(PayloadError::TooManyLessons {
                        section: title.clone(),
                        count: lessons.len(),
                    });
                }
                for lesson in lessons {
                    validate_lesson(lesson)?;
                }
            }
            OutlineEntry::Lesson(lesson) => validate_lesson(lesson)?,
        }
    }
    Ok(())
}

fn lesson_from_payload(payload: LessonPayload, section_id: Option<Uuid>) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        title: payload.title,
        description: payload.description,
        video_ref: payload.video_ref,
        duration_seconds: payload.duration_seconds,
        level: match section_id {
            Some(_) => LessonLevel::InSection,
            None => LessonLevel::Standalone,
        },
        section_id,
        local_index: 0,
        global_index: 0,
    }
}

/// Build an outline from a validated payload, minting fresh ids. Order
/// fields are left at zero for the assigner to fill in.
pub fn build_outline(request: SaveOutlineRequest) -> CourseOutline {
    let items = request
        .entries
        .into_iter()
        .map(|entry| match entry {
            OutlineEntry::Section { title, description, lessons } => {
                let section_id = Uuid::new_v4();
                OutlineItem::Section(Section {
                    id: section_id,
                    title,
                    description,
                    position: None,
                    lesson_count: lessons.len() as i64,
                    total_duration_seconds: 0,
                    lessons: lessons
                        .into_iter()
                        .map(|payload| lesson_from_payload(payload, Some(section_id)))
                        .collect(),
                })
            }
            OutlineEntry::Lesson(payload) => {
                OutlineItem::Lesson(lesson_from_payload(payload, None))
            }
        })
        .collect();
    CourseOutline::new(items)
}

/// A structure that failed invariant checks at the gateway boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("duplicate id {0} in course structure")]
    DuplicateId(Uuid),
    #[error("lesson {lesson_id} level/section reference is incoherent")]
    IncoherentOwnership { lesson_id: Uuid },
    #[error("lesson {lesson_id} references section {section_id} which is not part of the course")]
    UnknownSection { lesson_id: Uuid, section_id: Uuid },
    #[error("global indices are not contiguous 1..={expected}")]
    NonContiguousGlobalIndices { expected: usize },
}

/// Check the invariants an assigned outline must satisfy before it is
/// written: unique ids, level/section coherence (every lesson's
/// `section_id` names the section actually holding it, or nothing for a
/// standalone lesson), and contiguous 1-based global indices.
pub fn validate_structure(outline: &CourseOutline) -> Result<(), StructureError> {
    let mut ids = HashSet::new();
    let section_ids: HashSet<Uuid> = outline
        .items
        .iter()
        .filter_map(|item| match item {
            OutlineItem::Section(section) => Some(section.id),
            _ => None,
        })
        .collect();

    for item in &outline.items {
        match item {
            OutlineItem::Section(section) => {
                if !ids.insert(section.id) {
                    return Err(StructureError::DuplicateId(section.id));
                }
                for lesson in &section.lessons {
                    if !ids.insert(lesson.id) {
                        return Err(StructureError::DuplicateId(lesson.id));
                    }
                    // A nested lesson must point back at the section that
                    // holds it, not merely at some section.
                    match lesson.section_id {
                        Some(owner) if owner == section.id => {}
                        Some(owner) if !section_ids.contains(&owner) => {
                            return Err(StructureError::UnknownSection {
                                lesson_id: lesson.id,
                                section_id: owner,
                            });
                        }
                        _ => {
                            return Err(StructureError::IncoherentOwnership {
                                lesson_id: lesson.id,
                            });
                        }
                    }
                }
            }
            OutlineItem::Lesson(lesson) => {
                if !ids.insert(lesson.id) {
                    return Err(StructureError::DuplicateId(lesson.id));
                }
                if let Some(owner) = lesson.section_id {
                    if !section_ids.contains(&owner) {
                        return Err(StructureError::UnknownSection {
                            lesson_id: lesson.id,
                            section_id: owner,
                        });
                    }
                    return Err(StructureError::IncoherentOwnership { lesson_id: lesson.id });
                }
            }
        }
    }

    for lesson in outline.flattened_lessons() {
        if !matches!(
            (lesson.level, lesson.section_id),
            (LessonLevel::InSection, Some(_)) | (LessonLevel::Standalone, None)
        ) {
            return Err(StructureError::IncoherentOwnership { lesson_id: lesson.id });
        }
        if let Some(section_id) = lesson.section_id {
            if !section_ids.contains(&section_id) {
                return Err(StructureError::UnknownSection { lesson_id: lesson.id, section_id });
            }
        }
    }

    let mut globals: Vec<i64> = outline.flattened_lessons().map(|l| l.global_index).collect();
    globals.sort();
    let expected = globals.len();
    if globals.iter().enumerate().any(|(idx, g)| *g != idx as i64 + 1) {
        return Err(StructureError::NonContiguousGlobalIndices { expected });
    }

    Ok(())
}
