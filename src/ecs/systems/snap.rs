use hecs::{Entity, World};

use super::pick::{self, PickEvent, PickListener, Pickable};
use super::{parent_of, set_parent, TickContext};
use crate::camera::Camera;
use crate::ecs::components::{SceneParent, Transform};
use crate::grid::{CellId, SpatialGrid};
use crate::input::FrameInput;
use crate::spatial::{LayerMask, RayCaster, RayHit};

const DEFAULT_CELL_RAY_DISTANCE: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSnapConfig {
    /// Layers probed when the drag itself did not end over a cell.
    pub cell_mask: LayerMask,
    /// Extra height above the cell anchor.
    pub height_offset: f32,
    /// Parent the actor to its cell once placed.
    pub attach_to_cell: bool,
    pub max_ray_distance: f32,
}

impl Default for GridSnapConfig {
    fn default() -> Self {
        Self {
            cell_mask: LayerMask::CELLS,
            height_offset: 0.0,
            attach_to_cell: true,
            max_ray_distance: DEFAULT_CELL_RAY_DISTANCE,
        }
    }
}

/// Marks a pickable actor as snapping into grid cells on drop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridSnap {
    pub config: GridSnapConfig,
    committed: Option<CellId>,
}

impl GridSnap {
    pub fn new(config: GridSnapConfig) -> Self {
        Self {
            config,
            committed: None,
        }
    }

    /// Cell the actor held when the current drag began.
    pub fn committed_cell(&self) -> Option<CellId> {
        self.committed
    }

    pub(crate) fn forget_cell(&mut self) {
        self.committed = None;
    }
}

/// Turns pick events of [`GridSnap`] actors into grid occupancy changes.
///
/// Pick-up releases the actor's cell. A drop either lands in the cell under
/// the pointer or restores the actor to where it rested before, taking its
/// old cell back.
#[derive(Debug, Default)]
pub struct GridSnapListener;

impl PickListener for GridSnapListener {
    fn on_pick_event(
        &mut self,
        event: PickEvent,
        actor: Entity,
        world: &mut World,
        ctx: &mut TickContext<'_>,
    ) {
        if world.get::<&GridSnap>(actor).is_err() {
            return;
        }
        match event {
            PickEvent::PickStarted => on_pick_started(world, ctx, actor),
            PickEvent::DropRequested => on_drop_requested(world, ctx, actor),
            PickEvent::CancelRequested => on_cancel_requested(world, ctx, actor),
        }
    }
}

fn on_pick_started(world: &mut World, ctx: &mut TickContext<'_>, actor: Entity) {
    let resting_cell = world
        .get::<&Pickable>(actor)
        .ok()
        .and_then(|pick| pick.resting_cell());
    if let Ok(mut snap) = world.get::<&mut GridSnap>(actor) {
        snap.committed = resting_cell;
    }
    if let (Some(grid), Some(cell)) = (ctx.grid.as_deref_mut(), resting_cell) {
        grid.clear(cell, actor);
        log::trace!("{:?} lifted out of cell {}", actor, cell.index());
    }
}

fn on_drop_requested(world: &mut World, ctx: &mut TickContext<'_>, actor: Entity) {
    let Some(grid) = ctx.grid.as_deref_mut() else {
        pick::restore_resting_state(world, actor, ctx.rays);
        return;
    };
    let Ok(snap) = world.get::<&GridSnap>(actor).map(|snap| *snap) else {
        return;
    };

    let target = hovered_cell(world, ctx.camera, ctx.rays, ctx.input, actor, &snap.config);
    let accepted = match target {
        Some(cell) if grid.can_place(cell) || Some(cell) == snap.committed => {
            snap_into_cell(world, grid, ctx.rays, actor, cell, None)
        }
        _ => false,
    };

    if !accepted {
        log::debug!("drop of {:?} rejected (target {:?})", actor, target);
        pick::restore_resting_state(world, actor, ctx.rays);
        reoccupy(world, grid, ctx.rays, actor, snap.committed);
    }
}

fn on_cancel_requested(world: &mut World, ctx: &mut TickContext<'_>, actor: Entity) {
    let committed = world
        .get::<&GridSnap>(actor)
        .ok()
        .and_then(|snap| snap.committed);
    let rays = ctx.rays;
    if let Some(grid) = ctx.grid.as_deref_mut() {
        reoccupy(world, grid, rays, actor, committed);
    }
}

/// Cell under the drop: the last placement hit if it was a cell, else a
/// fresh pointer ray against the cell layers.
fn hovered_cell(
    world: &World,
    camera: Option<&Camera>,
    rays: &dyn RayCaster,
    input: &FrameInput,
    actor: Entity,
    config: &GridSnapConfig,
) -> Option<CellId> {
    let from_drag = world
        .get::<&Pickable>(actor)
        .ok()
        .and_then(|pick| pick.last_hit().and_then(RayHit::cell));
    if from_drag.is_some() {
        return from_drag;
    }
    let ray = camera?.screen_point_to_ray(input.pointer);
    rays.cast_ray(ray, config.max_ray_distance, config.cell_mask)?
        .cell()
}

/// Take back the cell held before the pickup. If someone else moved in
/// meanwhile, the actor rests where it stands with no cell.
fn reoccupy(
    world: &mut World,
    grid: &mut SpatialGrid,
    rays: &dyn RayCaster,
    actor: Entity,
    committed: Option<CellId>,
) {
    let Some(cell) = committed else {
        return;
    };
    if grid.try_place(cell, actor) {
        return;
    }
    log::warn!(
        "{:?} could not take back cell {}: now held by {:?}",
        actor,
        cell.index(),
        grid.cell(cell).and_then(|c| c.content())
    );
    if let Ok(mut snap) = world.get::<&mut GridSnap>(actor) {
        snap.committed = None;
    }
    if matches!(parent_of(world, actor), SceneParent::Cell(_)) {
        set_parent(world, actor, SceneParent::Root);
    }
    let lock = pick::locks_when_placed(world, actor);
    pick::cache_resting_state(world, actor, None, lock, rays);
}

/// Occupy `target` (moving out of `from`), then pose, parent and cache the
/// actor there.
fn snap_into_cell(
    world: &mut World,
    grid: &mut SpatialGrid,
    rays: &dyn RayCaster,
    actor: Entity,
    target: CellId,
    from: Option<CellId>,
) -> bool {
    let config = world
        .get::<&GridSnap>(actor)
        .map(|snap| snap.config)
        .unwrap_or_default();
    if !grid.try_move(from, target, actor) {
        return false;
    }
    let Some(cell) = grid.cell(target) else {
        return false;
    };
    let position = cell.snap_position(config.height_offset);
    let coord = cell.coord();

    if let Ok(mut transform) = world.get::<&mut Transform>(actor) {
        transform.position = position;
    }
    if config.attach_to_cell {
        set_parent(world, actor, SceneParent::Cell(target));
    }
    if let Ok(mut snap) = world.get::<&mut GridSnap>(actor) {
        snap.committed = Some(target);
    }
    let lock = pick::locks_when_placed(world, actor);
    pick::cache_resting_state(world, actor, Some(target), lock, rays);

    log::debug!("{:?} placed in cell {}", actor, coord);
    true
}

/// Place a resting actor straight into `cell`, releasing whatever cell it
/// held. Returns `false` (changing nothing) if the actor is being dragged
/// or the cell belongs to someone else.
pub fn place_in_cell(
    world: &mut World,
    grid: &mut SpatialGrid,
    rays: &dyn RayCaster,
    actor: Entity,
    cell: CellId,
) -> bool {
    if world
        .get::<&Pickable>(actor)
        .is_ok_and(|pick| pick.is_held())
    {
        return false;
    }
    let from = world
        .get::<&GridSnap>(actor)
        .ok()
        .and_then(|snap| snap.committed)
        .or_else(|| grid.cell_of(actor));
    snap_into_cell(world, grid, rays, actor, cell, from)
}
