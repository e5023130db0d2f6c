pub mod cell;

use std::collections::HashMap;

use glam::{IVec2, Quat, Vec3};

pub use self::cell::{CellId, GridCell, GridCoord};

/// Default thickness (half height) of a cell's hit box.
const CELL_HALF_THICKNESS: f32 = 0.01;

/// Placement slot definition as loaded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct CellDef {
    pub anchor: Vec3,
    pub rotation: Quat,
}

/// Grid layout, provided once at load time.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub columns: usize,
    /// Cells in configuration order; this order defines coordinates.
    pub cells: Vec<CellDef>,
    /// Half extents of each cell's hit box. The box top sits on the anchor.
    pub cell_half_extents: Vec3,
}

impl GridConfig {
    /// Uniform `columns` x `rows` table on the XZ plane, row-major.
    pub fn regular(columns: usize, rows: usize, origin: Vec3, spacing: f32) -> Self {
        let columns = columns.max(1);
        let cells = (0..columns * rows)
            .map(|i| CellDef {
                anchor: origin
                    + Vec3::new(
                        (i % columns) as f32 * spacing,
                        0.0,
                        (i / columns) as f32 * spacing,
                    ),
                rotation: Quat::IDENTITY,
            })
            .collect();
        Self {
            columns,
            cells,
            cell_half_extents: Vec3::new(spacing * 0.5, CELL_HALF_THICKNESS, spacing * 0.5),
        }
    }
}

/// Authoritative occupancy map over a fixed set of cells.
///
/// Every occupancy change goes through [`try_place`](Self::try_place),
/// [`clear`](Self::clear) or [`try_move`](Self::try_move); each is a
/// single check-and-set, so there is no partially applied state.
pub struct SpatialGrid {
    cells: Vec<GridCell>,
    columns: usize,
    lookup: HashMap<GridCoord, CellId>,
}

impl SpatialGrid {
    pub fn new(config: &GridConfig) -> Self {
        let cells = config
            .cells
            .iter()
            .map(|def| GridCell::new(def.anchor, def.rotation))
            .collect();
        let mut grid = Self {
            cells,
            columns: 0,
            lookup: HashMap::new(),
        };
        grid.initialize(config.columns);
        grid
    }

    /// Assign coordinates in index order and rebuild the lookup table.
    /// Occupancy is left untouched, so calling this again is harmless.
    pub fn initialize(&mut self, columns: usize) {
        if columns == 0 {
            log::warn!("grid configured with 0 columns, treating as 1");
        }
        self.columns = columns.max(1);
        self.lookup.clear();
        self.lookup.reserve(self.cells.len());
        for (index, cell) in self.cells.iter_mut().enumerate() {
            let coord = IVec2::new(
                (index % self.columns) as i32,
                (index / self.columns) as i32,
            );
            cell.set_coord(coord);
            self.lookup.insert(coord, CellId(index));
        }
        log::debug!(
            "grid initialized: {} cells, {} columns",
            self.cells.len(),
            self.columns
        );
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> {
        (0..self.cells.len()).map(CellId)
    }

    /// First configured cell, if any.
    pub fn first(&self) -> Option<CellId> {
        (!self.cells.is_empty()).then_some(CellId(0))
    }

    pub fn cell(&self, id: CellId) -> Option<&GridCell> {
        self.cells.get(id.0)
    }

    pub fn lookup(&self, coord: GridCoord) -> Option<CellId> {
        self.lookup.get(&coord).copied()
    }

    /// True iff `id` is a known cell and currently unoccupied.
    pub fn can_place(&self, id: CellId) -> bool {
        self.cell(id).is_some_and(|cell| !cell.is_occupied())
    }

    /// Atomic check-and-set. Idempotent for the same occupant.
    pub fn try_place(&mut self, id: CellId, occupant: hecs::Entity) -> bool {
        let Some(cell) = self.cells.get_mut(id.0) else {
            log::trace!("place rejected: unknown cell {:?}", id);
            return false;
        };
        let placed = cell.try_set_content(occupant);
        if !placed {
            log::trace!(
                "place rejected: cell {} holds {:?}",
                cell.coord(),
                cell.content()
            );
        }
        placed
    }

    /// Clear `id` only if it currently holds `occupant`.
    pub fn clear(&mut self, id: CellId, occupant: hecs::Entity) {
        if let Some(cell) = self.cells.get_mut(id.0) {
            cell.clear_content(occupant);
        }
    }

    /// Move `occupant` from `from` (if any) into `to` in one step.
    /// Fails without mutation when `to` is unknown or held by someone else.
    pub fn try_move(&mut self, from: Option<CellId>, to: CellId, occupant: hecs::Entity) -> bool {
        match self.cell(to) {
            Some(cell) if cell.content().map_or(true, |c| c == occupant) => {}
            _ => return false,
        }
        if let Some(from) = from.filter(|&f| f != to) {
            self.clear(from, occupant);
        }
        self.try_place(to, occupant)
    }

    /// Cell currently holding `occupant`.
    pub fn cell_of(&self, occupant: hecs::Entity) -> Option<CellId> {
        self.cells
            .iter()
            .position(|cell| cell.content() == Some(occupant))
            .map(CellId)
    }

    /// Existing cells in the 3x3 block centred on `coord`, row by row.
    pub fn neighborhood(&self, coord: GridCoord) -> impl Iterator<Item = CellId> + '_ {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).filter_map(move |dx| self.lookup(coord + IVec2::new(dx, dy)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(columns: usize, rows: usize) -> SpatialGrid {
        SpatialGrid::new(&GridConfig::regular(columns, rows, Vec3::ZERO, 1.0))
    }

    fn entities(n: usize) -> Vec<hecs::Entity> {
        let mut world = hecs::World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    #[test]
    fn coordinates_follow_column_count() {
        let config = GridConfig {
            columns: 5,
            cells: (0..12)
                .map(|i| CellDef {
                    anchor: Vec3::splat(i as f32),
                    rotation: Quat::IDENTITY,
                })
                .collect(),
            cell_half_extents: Vec3::splat(0.5),
        };
        let grid = SpatialGrid::new(&config);

        assert_eq!(grid.cells()[7].coord(), IVec2::new(2, 1));
        assert_eq!(grid.lookup(IVec2::new(2, 1)), Some(CellId(7)));
        assert_eq!(grid.lookup(IVec2::new(1, 2)), Some(CellId(11)));
        assert_eq!(grid.lookup(IVec2::new(2, 2)), None);
    }

    #[test]
    fn lookup_matches_cells_after_reinitialize() {
        let mut g = grid(4, 3);
        g.initialize(3);
        for id in g.ids() {
            let coord = g.cell(id).unwrap().coord();
            assert_eq!(g.lookup(coord), Some(id));
        }
        assert_eq!(g.cells()[5].coord(), IVec2::new(2, 1));
    }

    #[test]
    fn reinitialize_keeps_occupancy() {
        let e = entities(1);
        let mut g = grid(3, 3);
        assert!(g.try_place(CellId(4), e[0]));
        g.initialize(3);
        assert_eq!(g.cell(CellId(4)).unwrap().content(), Some(e[0]));
    }

    #[test]
    fn zero_columns_treated_as_one() {
        let mut g = grid(2, 2);
        g.initialize(0);
        assert_eq!(g.columns(), 1);
        assert_eq!(g.cells()[3].coord(), IVec2::new(0, 3));
    }

    #[test]
    fn try_place_is_idempotent() {
        let e = entities(1);
        let mut g = grid(3, 3);
        assert!(g.try_place(CellId(0), e[0]));
        assert!(g.try_place(CellId(0), e[0]));
        assert_eq!(g.cell(CellId(0)).unwrap().content(), Some(e[0]));
        assert_eq!(g.cells().iter().filter(|c| c.is_occupied()).count(), 1);
    }

    #[test]
    fn try_place_rejects_foreign_occupant() {
        let e = entities(2);
        let mut g = grid(3, 3);
        assert!(g.try_place(CellId(2), e[0]));
        assert!(!g.try_place(CellId(2), e[1]));
        assert_eq!(g.cell(CellId(2)).unwrap().content(), Some(e[0]));
    }

    #[test]
    fn unknown_cell_is_rejected() {
        let e = entities(1);
        let mut g = grid(2, 2);
        assert!(!g.can_place(CellId(99)));
        assert!(!g.try_place(CellId(99), e[0]));
        g.clear(CellId(99), e[0]);
    }

    #[test]
    fn can_place_tracks_occupancy() {
        let e = entities(1);
        let mut g = grid(2, 2);
        assert!(g.can_place(CellId(1)));
        g.try_place(CellId(1), e[0]);
        assert!(!g.can_place(CellId(1)));
        g.clear(CellId(1), e[0]);
        assert!(g.can_place(CellId(1)));
    }

    #[test]
    fn clear_ignores_other_occupants() {
        let e = entities(2);
        let mut g = grid(2, 2);
        g.try_place(CellId(0), e[0]);
        g.clear(CellId(0), e[1]);
        assert_eq!(g.cell(CellId(0)).unwrap().content(), Some(e[0]));
    }

    #[test]
    fn try_move_transfers_in_one_step() {
        let e = entities(2);
        let mut g = grid(3, 1);
        g.try_place(CellId(0), e[0]);
        g.try_place(CellId(2), e[1]);

        assert!(g.try_move(Some(CellId(0)), CellId(1), e[0]));
        assert_eq!(g.cell_of(e[0]), Some(CellId(1)));
        assert!(!g.cell(CellId(0)).unwrap().is_occupied());

        assert!(!g.try_move(Some(CellId(1)), CellId(2), e[0]));
        assert_eq!(g.cell_of(e[0]), Some(CellId(1)));
        assert_eq!(g.cell(CellId(2)).unwrap().content(), Some(e[1]));
    }

    #[test]
    fn neighborhood_clips_at_edges() {
        let g = grid(5, 5);
        assert_eq!(g.neighborhood(IVec2::new(2, 2)).count(), 9);
        assert_eq!(g.neighborhood(IVec2::new(0, 0)).count(), 4);
        assert_eq!(g.neighborhood(IVec2::new(4, 2)).count(), 6);
    }
}
