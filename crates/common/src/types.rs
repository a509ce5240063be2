// Core domain types shared across all Lectern crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a lesson sits inside a section or directly at the top level
/// of the course. Persisted as INTEGER 0|1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LessonLevel {
    Standalone,
    InSection,
}

impl LessonLevel {
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Standalone => 0,
            Self::InSection => 1,
        }
    }

    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Standalone),
            1 => Some(Self::InSection),
            _ => None,
        }
    }
}

/// A single lesson: either standalone or owned by a section.
///
/// Invariant: `level == InSection` iff `section_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// External video reference; parsed by the video layer, opaque here.
    pub video_ref: String,
    pub duration_seconds: u32,
    pub level: LessonLevel,
    /// Owning section, present iff `level == InSection`.
    pub section_id: Option<Uuid>,
    /// 1-based position within the lesson's own container: its section's
    /// lesson list, or the standalone-lesson list.
    pub local_index: i64,
    /// 1-based position in the whole-course unified order.
    pub global_index: i64,
}

impl Lesson {
    /// Point the lesson at a section (or at the top level with `None`),
    /// keeping `level` and `section_id` coherent.
    pub fn set_container(&mut self, section_id: Option<Uuid>) {
        self.level = match section_id {
            Some(_) => LessonLevel::InSection,
            None => LessonLevel::Standalone,
        };
        self.section_id = section_id;
    }
}

/// A named container holding an ordered list of lessons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Explicit top-level position: the section's 1-based slot in the
    /// unified sequence, unique per section. `None` only for rows persisted
    /// before the column existed; the projector then falls back to the
    /// minimum child `global_index`.
    pub position: Option<i64>,
    pub lesson_count: i64,
    pub total_duration_seconds: i64,
    pub lessons: Vec<Lesson>,
}

/// A persisted course: sections plus standalone lessons, in row order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    /// Opaque key backing the read-only shared-link page.
    pub share_key: String,
    pub sections: Vec<Section>,
    pub standalone_lessons: Vec<Lesson>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in the unified top-level order: a section or a standalone
/// lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutlineItem {
    Section(Section),
    Lesson(Lesson),
}

impl OutlineItem {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Section(section) => section.id,
            Self::Lesson(lesson) => lesson.id,
        }
    }
}

/// The single editable source of truth for a course's structure: the mixed
/// ordered list of sections and standalone lessons. Any section-only or
/// lesson-only view is derived by filtering, never maintained separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseOutline {
    pub items: Vec<OutlineItem>,
}

impl CourseOutline {
    pub fn new(items: Vec<OutlineItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All lessons in unified display order: sections expanded in place,
    /// standalone lessons taken individually.
    pub fn flattened_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.items.iter().flat_map(|item| match item {
            OutlineItem::Section(section) => section.lessons.iter(),
            OutlineItem::Lesson(lesson) => std::slice::from_ref(lesson).iter(),
        })
    }

    /// Total number of lessons across sections and the top level.
    pub fn lesson_count(&self) -> usize {
        self.flattened_lessons().count()
    }

    pub fn section(&self, section_id: Uuid) -> Option<&Section> {
        self.items.iter().find_map(|item| match item {
            OutlineItem::Section(section) if section.id == section_id => Some(section),
            _ => None,
        })
    }

    pub fn section_mut(&mut self, section_id: Uuid) -> Option<&mut Section> {
        self.items.iter_mut().find_map(|item| match item {
            OutlineItem::Section(section) if section.id == section_id => Some(section),
            _ => None,
        })
    }
}
