use glam::{IVec2, Vec3};
use hecs::{Entity, World};

use crate::camera::Camera;
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::ecs::components::{ActorName, Body, Parent, SceneParent, SpotLight, Transform};
use crate::ecs::systems;
use crate::ecs::systems::lamp::{self, Lamp, LampConfig, LampMode};
use crate::ecs::systems::pick::{self, PickConfig, PickListener, Pickable};
use crate::ecs::systems::snap::{self, GridSnap, GridSnapConfig, GridSnapListener};
use crate::grid::{GridConfig, SpatialGrid};
use crate::input::{InputSource, PointerState};
use crate::spatial::{Aabb, Collider, ColliderSet, HitKind, LayerMask};

/// Lamp body hit box, sitting on the lamp's position.
const LAMP_HALF_EXTENTS: Vec3 = Vec3::new(0.15, 0.125, 0.15);
/// Button hit box, centred on the button's rest offset.
const BUTTON_HALF_EXTENTS: Vec3 = Vec3::new(0.05, 0.02, 0.05);

/// Everything one interactive table needs: the actor world, the occupancy
/// grid, the ray-casting scene, input edge state and the event listeners.
/// Owned by the caller and passed around explicitly.
pub struct Tabletop {
    pub world: World,
    grid: Option<SpatialGrid>,
    pub camera: Option<Camera>,
    colliders: ColliderSet,
    pointer: PointerState,
    listeners: Vec<Box<dyn PickListener>>,
    pub timers: SystemTimers,
    tick_count: u64,
}

impl Tabletop {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            grid: None,
            camera: None,
            colliders: ColliderSet::new(),
            pointer: PointerState::new(),
            listeners: vec![Box::new(GridSnapListener)],
            timers: SystemTimers::new(),
            tick_count: 0,
        }
    }

    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    /// Build the grid and register one hit box per cell, its top face on
    /// the cell anchor. Replaces any previously loaded grid: actors keep
    /// their poses but lose their cells, and lamps wait to be placed again.
    pub fn load_grid(&mut self, config: &GridConfig) {
        if self.grid.is_some() {
            log::warn!("replacing loaded grid; existing occupancy is dropped");
            self.colliders
                .retain(|c| !matches!(c.kind, HitKind::Cell(_)));
            self.release_cells();
        }

        let grid = SpatialGrid::new(config);
        let half = config.cell_half_extents;
        for id in grid.ids() {
            let Some(cell) = grid.cell(id) else {
                continue;
            };
            let bounds = Aabb::from_center(cell.anchor() - Vec3::Y * half.y, half);
            self.colliders
                .add(Collider::fixed(bounds, LayerMask::CELLS, HitKind::Cell(id)));
        }
        log::info!(
            "grid loaded: {} cells, {} columns",
            grid.len(),
            grid.columns()
        );
        self.grid = Some(grid);
    }

    /// Forget every cell id held by an actor.
    fn release_cells(&mut self) {
        for (_, pick) in self.world.query_mut::<&mut Pickable>() {
            pick.forget_cell();
        }
        for (_, snap) in self.world.query_mut::<&mut GridSnap>() {
            snap.forget_cell();
        }
        for (_, parent) in self.world.query_mut::<&mut Parent>() {
            if matches!(parent.0, SceneParent::Cell(_)) {
                parent.0 = SceneParent::Root;
            }
        }
        for (_, lamp) in self.world.query_mut::<&mut Lamp>() {
            lamp.unplace();
        }
    }

    /// Static walkable surface.
    pub fn add_ground(&mut self, bounds: Aabb) {
        self.colliders
            .add(Collider::fixed(bounds, LayerMask::GROUND, HitKind::Other));
    }

    pub fn add_listener(&mut self, listener: Box<dyn PickListener>) {
        self.listeners.push(listener);
    }

    /// Pickable, grid-snapping actor with a box of `half_extents` standing on
    /// `position`. It settles onto the surface below and rests there.
    pub fn spawn_item(&mut self, name: &str, position: Vec3, half_extents: Vec3) -> Entity {
        self.spawn_item_with(name, position, half_extents, PickConfig::default(), GridSnapConfig::default())
    }

    pub fn spawn_item_with(
        &mut self,
        name: &str,
        position: Vec3,
        half_extents: Vec3,
        pick_config: PickConfig,
        snap_config: GridSnapConfig,
    ) -> Entity {
        let entity = self.world.spawn((
            Transform::from_position(position),
            Parent::default(),
            Body::dynamic(),
            Pickable::new(pick_config),
            GridSnap::new(snap_config),
            ActorName(name.to_string()),
        ));
        self.colliders.add(Collider::following(
            entity,
            Vec3::Y * half_extents.y,
            half_extents,
            LayerMask::ACTORS,
            HitKind::Actor(entity),
        ));
        let lock = pick::locks_when_placed(&self.world, entity);
        pick::cache_resting_state(&mut self.world, entity, None, lock, &self.colliders);
        systems::spatial::sync(&self.world, &mut self.colliders);
        log::debug!("spawned {} as {:?}", name, entity);
        entity
    }

    /// Lamp waiting at `position` until its first activation places it on
    /// the grid. Its button is a pressable control on top.
    pub fn spawn_lamp(&mut self, position: Vec3, config: LampConfig, mode: LampMode) -> Entity {
        let entity = self.world.spawn((
            Transform::from_position(position),
            Parent::default(),
            Lamp::new(config, mode),
            SpotLight::default(),
            ActorName("lamp".to_string()),
        ));
        self.colliders.add(Collider::following(
            entity,
            Vec3::Y * LAMP_HALF_EXTENTS.y,
            LAMP_HALF_EXTENTS,
            LayerMask::ACTORS,
            HitKind::Actor(entity),
        ));
        self.colliders.add(
            Collider::following(
                entity,
                config.button_rest,
                BUTTON_HALF_EXTENTS,
                LayerMask::CONTROLS,
                HitKind::Control(entity),
            )
            .with_ancestors(vec![HitKind::Actor(entity)]),
        );
        systems::spatial::sync(&self.world, &mut self.colliders);
        entity
    }

    /// Drop a resting item straight into the cell at `coord`.
    pub fn place_item(&mut self, actor: Entity, coord: IVec2) -> bool {
        let Some(grid) = self.grid.as_mut() else {
            return false;
        };
        let Some(cell) = grid.lookup(coord) else {
            return false;
        };
        let placed = snap::place_in_cell(&mut self.world, grid, &self.colliders, actor, cell);
        systems::spatial::sync(&self.world, &mut self.colliders);
        placed
    }

    pub fn set_lamp_mode(&mut self, lamp_entity: Entity, mode: LampMode) {
        lamp::set_mode(&mut self.world, self.grid.as_mut(), lamp_entity, mode);
    }

    pub fn move_lamp(&mut self, lamp_entity: Entity, direction: IVec2) -> bool {
        lamp::try_move(&mut self.world, self.grid.as_mut(), lamp_entity, direction)
    }

    pub fn place_lamp(&mut self, lamp_entity: Entity, coord: IVec2) -> bool {
        let Some(grid) = self.grid.as_mut() else {
            return false;
        };
        let Some(cell) = grid.lookup(coord) else {
            return false;
        };
        lamp::place_at(&mut self.world, grid, lamp_entity, cell)
    }

    /// Poll input once and run every interaction system.
    pub fn tick(&mut self, source: &dyn InputSource, dt: f32) {
        self.timers.begin();
        let input = self.pointer.update(source);
        self.timers.end(SystemPhase::Input);

        systems::tick(
            &mut self.world,
            self.grid.as_mut(),
            self.camera.as_ref(),
            &mut self.colliders,
            &input,
            &mut self.listeners,
            &mut self.timers,
            dt,
        );
        self.tick_count += 1;
    }
}

impl Default for Tabletop {
    fn default() -> Self {
        Self::new()
    }
}
