pub mod lamp;
pub mod pick;
pub mod snap;
pub mod spatial;

use hecs::{Entity, World};

use crate::camera::Camera;
use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::ecs::components::{Body, Parent, SceneParent};
use crate::grid::SpatialGrid;
use crate::input::FrameInput;
use crate::spatial::{ColliderSet, RayCaster};
use pick::PickListener;

/// Shared services handed to systems and listeners for one tick.
pub struct TickContext<'a> {
    /// `None` until a grid has been loaded.
    pub grid: Option<&'a mut SpatialGrid>,
    pub camera: Option<&'a Camera>,
    pub rays: &'a dyn RayCaster,
    pub input: &'a FrameInput,
}

/// Run all interaction systems for one tick.
pub fn tick(
    world: &mut World,
    grid: Option<&mut SpatialGrid>,
    camera: Option<&Camera>,
    colliders: &mut ColliderSet,
    input: &FrameInput,
    listeners: &mut [Box<dyn PickListener>],
    timers: &mut SystemTimers,
    dt: f32,
) {
    // 1. Move entity-following colliders to their actors
    timers.begin();
    spatial::sync(world, colliders);
    timers.end(SystemPhase::ColliderSync);

    let mut ctx = TickContext {
        grid,
        camera,
        rays: &*colliders,
        input,
    };

    // 2. Grab / drag / drop / cancel
    timers.begin();
    pick::update(world, &mut ctx, listeners, dt);
    timers.end(SystemPhase::Pick);

    // 3. Lamp button, joystick and coverage
    timers.begin();
    lamp::update(world, &mut ctx, dt);
    timers.end(SystemPhase::Lamp);
}

pub(crate) fn parent_of(world: &World, entity: Entity) -> SceneParent {
    world
        .get::<&Parent>(entity)
        .map(|parent| parent.0)
        .unwrap_or_default()
}

/// Reparent, keeping the world pose.
pub(crate) fn set_parent(world: &mut World, entity: Entity, parent: SceneParent) {
    if let Ok(mut current) = world.get::<&mut Parent>(entity) {
        current.0 = parent;
        return;
    }
    if world.insert_one(entity, Parent(parent)).is_err() {
        log::warn!("cannot reparent despawned entity {:?}", entity);
    }
}

pub(crate) fn set_physics_locked(world: &mut World, entity: Entity, locked: bool) {
    if let Ok(mut body) = world.get::<&mut Body>(entity) {
        body.set_kinematic_locked(locked);
    }
}
