// The course outline engine: projection from persisted rows, pure reorder
// operations, and order index assignment.
//
// All three parts operate on `CourseOutline`, the single ordered list of
// sections and standalone lessons. Readers (editor load, viewer, shared
// page) use only the projector; the editor mutates the outline through the
// reorder operations and hands it to the assigner before persisting.

pub mod assigner;
pub mod projector;
pub mod reorder;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction for an adjacent move (the up/down arrow buttons).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Which edge of the drop target the dragged item lands on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    Bottom,
}

/// A lesson container: the top-level standalone list or one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRef {
    TopLevel,
    Section(Uuid),
}
