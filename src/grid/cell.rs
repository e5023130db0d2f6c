use glam::{IVec2, Quat, Vec3};

/// Grid coordinate: `x` is the column, `y` is the row.
pub type GridCoord = IVec2;

/// Index of a cell in its grid's configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single placement slot: coordinate, optional occupant, snap anchor.
///
/// Occupancy is only written through [`SpatialGrid`](super::SpatialGrid),
/// which is why the mutators are crate-private.
#[derive(Debug, Clone)]
pub struct GridCell {
    coord: GridCoord,
    content: Option<hecs::Entity>,
    anchor: Vec3,
    anchor_rotation: Quat,
}

impl GridCell {
    pub fn new(anchor: Vec3, anchor_rotation: Quat) -> Self {
        Self {
            coord: IVec2::ZERO,
            content: None,
            anchor,
            anchor_rotation,
        }
    }

    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    pub fn content(&self) -> Option<hecs::Entity> {
        self.content
    }

    pub fn is_occupied(&self) -> bool {
        self.content.is_some()
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn anchor_rotation(&self) -> Quat {
        self.anchor_rotation
    }

    /// Anchor position raised by `height_offset`.
    pub fn snap_position(&self, height_offset: f32) -> Vec3 {
        self.anchor + Vec3::Y * height_offset
    }

    pub(crate) fn set_coord(&mut self, coord: GridCoord) {
        self.coord = coord;
    }

    /// Check-and-set. Succeeds when empty or already holding `occupant`.
    pub(crate) fn try_set_content(&mut self, occupant: hecs::Entity) -> bool {
        match self.content {
            Some(current) if current != occupant => false,
            _ => {
                self.content = Some(occupant);
                true
            }
        }
    }

    /// Clears only when the cell currently holds `occupant`.
    pub(crate) fn clear_content(&mut self, occupant: hecs::Entity) {
        if self.content == Some(occupant) {
            self.content = None;
        }
    }
}
