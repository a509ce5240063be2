// Order index assignment: in-memory outline -> persisted order fields.
//
// Inverse of the projector: a single left-to-right walk over the unified
// sequence rewrites every lesson's `local_index`/`global_index`, every
// section's explicit `position`, and the per-section aggregates, so the
// rows handed to the persistence gateway satisfy the ordering invariants
// by construction.

use crate::types::{CourseOutline, OutlineItem};

/// Recompute all persisted order fields in place.
///
/// - `global_index`: 1-based, contiguous over all lessons in unified order.
/// - `local_index`: 1-based within the lesson's own container; standalone
///   lessons count against a separate standalone counter.
/// - `Section::position`: the section's 1-based slot in the unified
///   top-level sequence. Slots are unique across sections (an empty
///   section still occupies one), so the projector can rebuild the exact
///   sequence from positions and `global_index` alone, independent of row
///   order.
/// - Section aggregates (`lesson_count`, `total_duration_seconds`) are
///   recomputed from the current lesson list.
pub fn assign_indices(outline: &mut CourseOutline) {
    let mut global = 1i64;
    let mut standalone = 1i64;

    for (slot, item) in outline.items.iter_mut().enumerate() {
        match item {
            OutlineItem::Section(section) => {
                section.position = Some(slot as i64 + 1);
                for (idx, lesson) in section.lessons.iter_mut().enumerate() {
                    lesson.set_container(Some(section.id));
                    lesson.local_index = idx as i64 + 1;
                    lesson.global_index = global;
                    global += 1;
                }
                section.lesson_count = section.lessons.len() as i64;
                section.total_duration_seconds =
                    section.lessons.iter().map(|lesson| lesson.duration_seconds as i64).sum();
            }
            OutlineItem::Lesson(lesson) => {
                lesson.set_container(None);
                lesson.local_index = standalone;
                lesson.global_index = global;
                standalone += 1;
                global += 1;
            }
        }
    }
}
