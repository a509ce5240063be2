// Pure reorder operations over a `CourseOutline`.
//
// Every operation mutates the outline in place and returns whether a change
// was applied. A `false` return is the defensive no-op path: boundary moves,
// drops onto self, and ids absent from the current outline (a stale-UI race,
// not a user-facing failure) all leave the outline untouched.
//
// The UI layer is a thin adapter translating pointer events and button
// clicks into these calls; no pointer-event state lives here.

use uuid::Uuid;

use crate::outline::{ContainerRef, Direction, Edge};
use crate::types::{CourseOutline, Lesson, OutlineItem};

/// Where a lesson currently lives in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    /// Standalone: index into `outline.items`.
    TopLevel(usize),
    /// Inside a section: indices into `outline.items` and its lesson list.
    InSection { item_idx: usize, lesson_idx: usize },
}

fn locate_lesson(outline: &CourseOutline, lesson_id: Uuid) -> Option<Located> {
    for (item_idx, item) in outline.items.iter().enumerate() {
        match item {
            OutlineItem::Lesson(lesson) if lesson.id == lesson_id => {
                return Some(Located::TopLevel(item_idx));
            }
            OutlineItem::Section(section) => {
                if let Some(lesson_idx) =
                    section.lessons.iter().position(|lesson| lesson.id == lesson_id)
                {
                    return Some(Located::InSection { item_idx, lesson_idx });
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove the dragged element and re-insert it relative to the target,
/// with both indices captured before the removal.
///
/// Removing an element that sat before the target shifts the target one
/// slot left, so the insert index is decremented whenever
/// `source_idx < target_idx`; drops behind the target (`source > target`)
/// need no correction because the removal happened after it.
fn reinsert<T>(items: &mut Vec<T>, source_idx: usize, target_idx: usize, edge: Edge) {
    let dragged = items.remove(source_idx);
    let mut insert_idx = match edge {
        Edge::Top => target_idx,
        Edge::Bottom => target_idx + 1,
    };
    if source_idx < target_idx {
        insert_idx -= 1;
    }
    items.insert(insert_idx, dragged);
}

fn swap_adjacent<T>(items: &mut [T], idx: usize, direction: Direction) -> bool {
    match direction {
        Direction::Up => {
            if idx == 0 {
                return false;
            }
            items.swap(idx - 1, idx);
        }
        Direction::Down => {
            if idx + 1 >= items.len() {
                return false;
            }
            items.swap(idx, idx + 1);
        }
    }
    true
}

/// Swap a top-level item (section or standalone lesson) with its neighbor.
pub fn move_item_adjacent(
    outline: &mut CourseOutline,
    item_id: Uuid,
    direction: Direction,
) -> bool {
    let Some(idx) = outline.items.iter().position(|item| item.id() == item_id) else {
        return false;
    };
    swap_adjacent(&mut outline.items, idx, direction)
}

/// Swap a lesson with its neighbor inside one section's lesson list.
/// Never touches `level` or `section_id`.
pub fn move_lesson_adjacent(
    outline: &mut CourseOutline,
    section_id: Uuid,
    lesson_id: Uuid,
    direction: Direction,
) -> bool {
    let Some(section) = outline.section_mut(section_id) else {
        return false;
    };
    let Some(idx) = section.lessons.iter().position(|lesson| lesson.id == lesson_id) else {
        return false;
    };
    swap_adjacent(&mut section.lessons, idx, direction)
}

/// Same-container drag-and-drop: re-insert the dragged element immediately
/// before (`Edge::Top`) or after (`Edge::Bottom`) the target.
///
/// Works on the top-level item list when both ids are top-level entries, or
/// on one section's lesson list when both lessons live in the same section.
pub fn drop_at(
    outline: &mut CourseOutline,
    dragged_id: Uuid,
    target_id: Uuid,
    edge: Edge,
) -> bool {
    if dragged_id == target_id {
        return false;
    }

    let source = outline.items.iter().position(|item| item.id() == dragged_id);
    let target = outline.items.iter().position(|item| item.id() == target_id);
    if let (Some(source_idx), Some(target_idx)) = (source, target) {
        reinsert(&mut outline.items, source_idx, target_idx, edge);
        return true;
    }

    // Both lessons inside the same section.
    for item in &mut outline.items {
        let OutlineItem::Section(section) = item else {
            continue;
        };
        let source = section.lessons.iter().position(|lesson| lesson.id == dragged_id);
        let target = section.lessons.iter().position(|lesson| lesson.id == target_id);
        if let (Some(source_idx), Some(target_idx)) = (source, target) {
            reinsert(&mut section.lessons, source_idx, target_idx, edge);
            return true;
        }
    }

    false
}

/// Move a lesson between containers (standalone list and sections, in any
/// combination), re-pointing `level`/`section_id` at the target container.
///
/// `anchor` names an existing element of the target container and the edge
/// to land on; `None` appends, which is also the degenerate empty-container
/// case (insert as the only element). A transfer whose source and target
/// container coincide degrades to `drop_at` semantics; with no anchor it
/// moves the lesson to the end of its container, a no-op when it is
/// already last.
pub fn transfer_lesson(
    outline: &mut CourseOutline,
    lesson_id: Uuid,
    target: ContainerRef,
    anchor: Option<(Uuid, Edge)>,
) -> bool {
    let Some(source) = locate_lesson(outline, lesson_id) else {
        return false;
    };

    let same_container = match (source, target) {
        (Located::TopLevel(_), ContainerRef::TopLevel) => true,
        (Located::InSection { item_idx, .. }, ContainerRef::Section(section_id)) => {
            matches!(&outline.items[item_idx], OutlineItem::Section(s) if s.id == section_id)
        }
        _ => false,
    };
    if same_container {
        return match anchor {
            Some((anchor_id, edge)) => drop_at(outline, lesson_id, anchor_id, edge),
            None => match source {
                Located::TopLevel(item_idx) => {
                    if item_idx + 1 == outline.items.len() {
                        return false;
                    }
                    let lesson = remove_lesson(outline, source);
                    outline.items.push(OutlineItem::Lesson(lesson));
                    true
                }
                Located::InSection { item_idx, lesson_idx } => {
                    let OutlineItem::Section(section) = &mut outline.items[item_idx] else {
                        return false;
                    };
                    if lesson_idx + 1 == section.lessons.len() {
                        return false;
                    }
                    let lesson = section.lessons.remove(lesson_idx);
                    section.lessons.push(lesson);
                    true
                }
            },
        };
    }

    // Resolve the insert position in the target container before mutating
    // anything, so an unknown anchor stays a pure no-op.
    let insert_idx = match target {
        ContainerRef::TopLevel => match anchor {
            Some((anchor_id, edge)) => {
                let Some(target_idx) =
                    outline.items.iter().position(|item| item.id() == anchor_id)
                else {
                    return false;
                };
                match edge {
                    Edge::Top => target_idx,
                    Edge::Bottom => target_idx + 1,
                }
            }
            None => outline.items.len(),
        },
        ContainerRef::Section(section_id) => {
            let Some(section) = outline.section(section_id) else {
                return false;
            };
            match anchor {
                Some((anchor_id, edge)) => {
                    let Some(target_idx) =
                        section.lessons.iter().position(|lesson| lesson.id == anchor_id)
                    else {
                        return false;
                    };
                    match edge {
                        Edge::Top => target_idx,
                        Edge::Bottom => target_idx + 1,
                    }
                }
                None => section.lessons.len(),
            }
        }
    };

    // Cross-container: removal from the source never shifts indices in the
    // target, so the captured insert index stays valid.
    let mut lesson = remove_lesson(outline, source);
    match target {
        ContainerRef::TopLevel => {
            lesson.set_container(None);
            outline.items.insert(insert_idx, OutlineItem::Lesson(lesson));
        }
        ContainerRef::Section(section_id) => {
            lesson.set_container(Some(section_id));
            let Some(section) = outline.section_mut(section_id) else {
                // Existence was checked above; outline was not touched since.
                return false;
            };
            section.lessons.insert(insert_idx, lesson);
        }
    }
    true
}

fn remove_lesson(outline: &mut CourseOutline, location: Located) -> Lesson {
    match location {
        Located::TopLevel(item_idx) => match outline.items.remove(item_idx) {
            OutlineItem::Lesson(lesson) => lesson,
            OutlineItem::Section(_) => unreachable!("located index points at a lesson item"),
        },
        Located::InSection { item_idx, lesson_idx } => match &mut outline.items[item_idx] {
            OutlineItem::Section(section) => section.lessons.remove(lesson_idx),
            OutlineItem::Lesson(_) => unreachable!("located index points at a section item"),
        },
    }
}

/// Pull a lesson out of its section to the top level, landing immediately
/// after the section it came from.
pub fn promote_lesson(outline: &mut CourseOutline, lesson_id: Uuid) -> bool {
    let Some(Located::InSection { item_idx, .. }) = locate_lesson(outline, lesson_id) else {
        return false;
    };
    let section_item_id = outline.items[item_idx].id();
    transfer_lesson(
        outline,
        lesson_id,
        ContainerRef::TopLevel,
        Some((section_item_id, Edge::Bottom)),
    )
}

/// Move a standalone lesson into a section, appended at the end of its
/// lesson list.
pub fn demote_lesson(outline: &mut CourseOutline, lesson_id: Uuid, section_id: Uuid) -> bool {
    match locate_lesson(outline, lesson_id) {
        Some(Located::TopLevel(_)) => {
            transfer_lesson(outline, lesson_id, ContainerRef::Section(section_id), None)
        }
        _ => false,
    }
}
