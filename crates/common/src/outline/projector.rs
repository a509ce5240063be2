// Unified order projection: persisted course rows -> `CourseOutline`.
//
// Every reader goes through this single function so the editor, the viewer,
// and the shared-link page all reconstruct exactly the same order from the
// same rows.

use crate::types::{Course, CourseOutline, Lesson, OutlineItem, Section};

/// Reconstruct the unified top-level order from persisted rows.
///
/// When every section carries a stored `position` (its unique slot in the
/// unified sequence, written by the assigner), the sequence is rebuilt by
/// merging position-sorted sections with `global_index`-sorted standalone
/// lessons, so the result does not depend on row order at all. Rows
/// persisted before the position column existed go through the legacy
/// derived-key sort instead.
///
/// Pure and idempotent: projecting the same course twice yields the same
/// outline. Within each section, lessons are ordered by stored
/// `local_index` ascending regardless of row order.
pub fn project(course: &Course) -> CourseOutline {
    let mut sections: Vec<Section> = course.sections.to_vec();
    for section in &mut sections {
        section.lessons.sort_by_key(|lesson| lesson.local_index);
    }
    let lessons = course.standalone_lessons.to_vec();

    let items = if sections.iter().all(|section| section.position.is_some()) {
        merge_assigned_slots(sections, lessons)
    } else {
        sort_legacy_rows(sections, lessons)
    };
    CourseOutline::new(items)
}

/// Slot merge over fully assigned rows.
///
/// Sections claim the slots their positions name; standalone lessons fill
/// the remaining slots in `global_index` order. An empty section occupies
/// a slot like any other, so it lands exactly where it was saved.
fn merge_assigned_slots(mut sections: Vec<Section>, mut lessons: Vec<Lesson>) -> Vec<OutlineItem> {
    sections.sort_by_key(|section| section.position);
    lessons.sort_by_key(|lesson| lesson.global_index);

    let mut items = Vec::with_capacity(sections.len() + lessons.len());
    let mut sections = sections.into_iter().peekable();
    let mut lessons = lessons.into_iter().peekable();
    let mut slot = 1i64;
    loop {
        let section_due = match sections.peek() {
            Some(section) => section.position.unwrap_or(slot) <= slot,
            None => false,
        };
        let item = if section_due {
            sections.next().map(OutlineItem::Section)
        } else if let Some(lesson) = lessons.next() {
            Some(OutlineItem::Lesson(lesson))
        } else {
            // Lessons exhausted: any sections left go out in position order.
            sections.next().map(OutlineItem::Section)
        };
        match item {
            Some(item) => items.push(item),
            None => break,
        }
        slot += 1;
    }
    items
}

/// Rank used to break key ties in the legacy sort: sections before
/// standalone lessons.
const RANK_SECTION: u8 = 0;
const RANK_LESSON: u8 = 1;

/// Ordering for rows written before the position column existed: a
/// section's key is the minimum child `global_index`, a lesson's its own
/// `global_index`. A legacy section with no lessons at all sorts after
/// every keyed entry (`i64::MAX`), keeping its row order among such
/// sections.
fn sort_legacy_rows(sections: Vec<Section>, lessons: Vec<Lesson>) -> Vec<OutlineItem> {
    let mut entries: Vec<(i64, u8, OutlineItem)> =
        Vec::with_capacity(sections.len() + lessons.len());

    for section in sections {
        let key = section
            .position
            .or_else(|| section.lessons.iter().map(|lesson| lesson.global_index).min())
            .unwrap_or(i64::MAX);
        entries.push((key, RANK_SECTION, OutlineItem::Section(section)));
    }
    for lesson in lessons {
        entries.push((lesson.global_index, RANK_LESSON, OutlineItem::Lesson(lesson)));
    }

    // Stable: remaining ties keep original row order.
    entries.sort_by_key(|(key, rank, _)| (*key, *rank));
    entries.into_iter().map(|(_, _, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::project;
    use crate::types::{Course, Lesson, LessonLevel, OutlineItem, Section};

    fn lesson(title: &str, section_id: Option<Uuid>, local: i64, global: i64) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            video_ref: format!("yt:{title}"),
            duration_seconds: 60,
            level: if section_id.is_some() { LessonLevel::InSection } else { LessonLevel::Standalone },
            section_id,
            local_index: local,
            global_index: global,
        }
    }

    fn section(title: &str, position: Option<i64>, lessons: Vec<Lesson>) -> Section {
        Section {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            position,
            lesson_count: lessons.len() as i64,
            total_duration_seconds: lessons.iter().map(|l| l.duration_seconds as i64).sum(),
            lessons,
        }
    }

    fn course(sections: Vec<Section>, standalone_lessons: Vec<Lesson>) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Course".to_string(),
            share_key: "share-key".to_string(),
            sections,
            standalone_lessons,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn titles(course: &Course) -> Vec<String> {
        project(course)
            .items
            .iter()
            .map(|item| match item {
                OutlineItem::Section(s) => s.title.clone(),
                OutlineItem::Lesson(l) => l.title.clone(),
            })
            .collect()
    }

    #[test]
    fn interleaves_sections_and_standalone_lessons_by_slot() {
        let intro_id = Uuid::new_v4();
        let adv_id = Uuid::new_v4();
        let mut intro = section(
            "Intro",
            Some(1),
            vec![lesson("L1", Some(intro_id), 1, 1), lesson("L2", Some(intro_id), 2, 2)],
        );
        intro.id = intro_id;
        let mut adv = section("Adv", Some(3), vec![lesson("L3", Some(adv_id), 1, 4)]);
        adv.id = adv_id;

        // Row order deliberately does not match display order.
        let course = course(vec![adv, intro], vec![lesson("Standalone-A", None, 1, 3)]);

        assert_eq!(titles(&course), vec!["Intro", "Standalone-A", "Adv"]);
    }

    #[test]
    fn empty_section_slots_do_not_depend_on_row_order() {
        // Saved order was: [Empty, Full(L)]; the rows come back reversed.
        let full_id = Uuid::new_v4();
        let mut full = section("Full", Some(2), vec![lesson("L", Some(full_id), 1, 1)]);
        full.id = full_id;
        let empty = section("Empty", Some(1), vec![]);

        let forward = course(vec![empty.clone(), full.clone()], vec![]);
        let reversed = course(vec![full, empty], vec![]);

        assert_eq!(titles(&forward), vec!["Empty", "Full"]);
        assert_eq!(project(&forward), project(&reversed));
    }

    #[test]
    fn falls_back_to_minimum_child_global_index_for_legacy_rows() {
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let mut a = section("A", None, vec![lesson("A1", Some(a_id), 1, 5)]);
        a.id = a_id;
        let mut b = section("B", None, vec![lesson("B1", Some(b_id), 1, 2)]);
        b.id = b_id;

        let course = course(vec![a, b], vec![lesson("S", None, 1, 1)]);

        assert_eq!(titles(&course), vec!["S", "B", "A"]);
    }

    #[test]
    fn empty_section_keeps_its_stored_slot_between_lessons() {
        // Saved order was: lesson(g=1), empty section (slot 2), lesson(g=2).
        let course = course(
            vec![section("Empty", Some(2), vec![])],
            vec![lesson("First", None, 1, 1), lesson("Second", None, 2, 2)],
        );

        assert_eq!(titles(&course), vec!["First", "Empty", "Second"]);
    }

    #[test]
    fn legacy_empty_sections_sort_last_in_row_order() {
        let course = course(
            vec![section("Empty-1", None, vec![]), section("Empty-2", None, vec![])],
            vec![lesson("S", None, 1, 1)],
        );

        assert_eq!(titles(&course), vec!["S", "Empty-1", "Empty-2"]);
    }

    #[test]
    fn section_lessons_are_reordered_by_local_index() {
        let id = Uuid::new_v4();
        let mut s = section(
            "S",
            Some(1),
            vec![
                lesson("third", Some(id), 3, 3),
                lesson("first", Some(id), 1, 1),
                lesson("second", Some(id), 2, 2),
            ],
        );
        s.id = id;

        let outline = project(&course(vec![s], vec![]));
        let OutlineItem::Section(projected) = &outline.items[0] else {
            panic!("expected a section item");
        };
        let titles: Vec<_> = projected.lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn projection_is_idempotent() {
        let id = Uuid::new_v4();
        let mut s = section("S", Some(1), vec![lesson("L", Some(id), 1, 1)]);
        s.id = id;
        let course = course(vec![s], vec![lesson("A", None, 1, 2), lesson("B", None, 2, 3)]);

        assert_eq!(project(&course), project(&course));
    }
}
