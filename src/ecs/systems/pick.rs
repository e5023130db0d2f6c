use glam::{Quat, Vec3};
use hecs::{Entity, World};

use super::{parent_of, set_parent, set_physics_locked, TickContext};
use crate::ecs::components::{SceneParent, Transform};
use crate::grid::CellId;
use crate::spatial::{LayerMask, Plane, Ray, RayCaster, RayHit};

/// Reach of the pointer ray used to grab an actor.
const GRAB_RAY_DISTANCE: f32 = 1000.0;
/// Ground probes start this far above the probed position.
const GROUND_PROBE_LIFT: f32 = 0.05;

const DEFAULT_MAX_RAY_DISTANCE: f32 = 100.0;
const DEFAULT_HOVER_HEIGHT: f32 = 0.15;
const DEFAULT_FOLLOW_SPEED: f32 = 20.0;
const DEFAULT_GROUND_PROBE_DISTANCE: f32 = 2.0;

/// Per-actor pick-up tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickConfig {
    /// Surfaces the held actor hovers over.
    pub placement_mask: LayerMask,
    pub max_ray_distance: f32,
    pub block_when_pointer_over_ui: bool,
    /// Height kept above the hovered point while held.
    pub hover_height: f32,
    /// Exponential follow rate, per second.
    pub follow_speed: f32,
    /// Parent used while dragged, if any.
    pub drag_parent: Option<SceneParent>,
    /// Keep the body kinematic once it comes to rest.
    pub lock_when_placed: bool,
    /// Settle onto the surface below when resting outside a cell.
    pub ground_probe: bool,
    pub ground_probe_distance: f32,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            placement_mask: LayerMask::GROUND | LayerMask::CELLS,
            max_ray_distance: DEFAULT_MAX_RAY_DISTANCE,
            block_when_pointer_over_ui: true,
            hover_height: DEFAULT_HOVER_HEIGHT,
            follow_speed: DEFAULT_FOLLOW_SPEED,
            drag_parent: None,
            lock_when_placed: true,
            ground_probe: true,
            ground_probe_distance: DEFAULT_GROUND_PROBE_DISTANCE,
        }
    }
}

/// Stable pose an actor returns to after a cancelled or rejected drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestingState {
    pub position: Vec3,
    pub rotation: Quat,
    pub parent: SceneParent,
    /// `None` means resting on open ground.
    pub cell: Option<CellId>,
    pub physics_locked: bool,
}

impl Default for RestingState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            parent: SceneParent::Root,
            cell: None,
            physics_locked: true,
        }
    }
}

/// Lifecycle events raised by a pickable actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickEvent {
    PickStarted,
    /// Listeners must settle the actor before returning.
    DropRequested,
    CancelRequested,
}

/// Observer of pick lifecycle events. Called synchronously, in
/// registration order, before the raising system continues.
pub trait PickListener {
    fn on_pick_event(
        &mut self,
        event: PickEvent,
        actor: Entity,
        world: &mut World,
        ctx: &mut TickContext<'_>,
    );
}

/// "Can be picked up" state for one actor.
#[derive(Debug, Clone)]
pub struct Pickable {
    pub config: PickConfig,
    held: bool,
    drop_handled: bool,
    hover_point: Vec3,
    last_hit: Option<RayHit>,
    resting: RestingState,
    parent_before_drag: SceneParent,
}

impl Pickable {
    pub fn new(config: PickConfig) -> Self {
        Self {
            config,
            held: false,
            drop_handled: true,
            hover_point: Vec3::ZERO,
            last_hit: None,
            resting: RestingState::default(),
            parent_before_drag: SceneParent::Root,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn hover_point(&self) -> Vec3 {
        self.hover_point
    }

    /// Placement surface under the pointer on the last held tick.
    pub fn last_hit(&self) -> Option<&RayHit> {
        self.last_hit.as_ref()
    }

    pub fn has_valid_hit(&self) -> bool {
        self.last_hit.is_some()
    }

    pub fn resting(&self) -> &RestingState {
        &self.resting
    }

    pub fn resting_cell(&self) -> Option<CellId> {
        self.resting.cell
    }

    /// Tell the drop path a listener already settled the actor.
    pub fn mark_drop_handled(&mut self) {
        self.drop_handled = true;
    }

    /// Drop every reference to a grid cell, keeping the resting pose.
    pub(crate) fn forget_cell(&mut self) {
        self.resting.cell = None;
        if matches!(self.resting.parent, SceneParent::Cell(_)) {
            self.resting.parent = SceneParent::Root;
        }
        if matches!(self.parent_before_drag, SceneParent::Cell(_)) {
            self.parent_before_drag = SceneParent::Root;
        }
        if self.last_hit.as_ref().is_some_and(|hit| hit.cell().is_some()) {
            self.last_hit = None;
        }
    }
}

impl Default for Pickable {
    fn default() -> Self {
        Self::new(PickConfig::default())
    }
}

/// The actor currently held by the pointer, if any.
pub fn held_actor(world: &World) -> Option<Entity> {
    world
        .query::<&Pickable>()
        .iter()
        .find(|(_, pick)| pick.held)
        .map(|(entity, _)| entity)
}

/// Grab on primary press, follow while held, drop on release, cancel on
/// secondary press.
pub fn update(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    listeners: &mut [Box<dyn PickListener>],
    dt: f32,
) {
    if ctx.input.primary_pressed && held_actor(world).is_none() {
        if let Some(actor) = actor_under_pointer(world, ctx) {
            begin_pickup(world, ctx, listeners, actor);
        }
    }

    let Some(actor) = held_actor(world) else {
        return;
    };

    update_hover_point(world, ctx, actor);
    follow_pointer(world, actor, dt);

    if ctx.input.primary_released {
        end_pickup(world, ctx, listeners, actor);
    } else if ctx.input.secondary_pressed {
        cancel_pickup(world, ctx, listeners, actor);
    }
}

fn actor_under_pointer(world: &World, ctx: &TickContext<'_>) -> Option<Entity> {
    let camera = ctx.camera?;
    let ray = camera.screen_point_to_ray(ctx.input.pointer);
    let actor = ctx
        .rays
        .cast_ray(ray, GRAB_RAY_DISTANCE, LayerMask::ALL)?
        .actor()?;
    world.get::<&Pickable>(actor).is_ok().then_some(actor)
}

fn begin_pickup(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    listeners: &mut [Box<dyn PickListener>],
    actor: Entity,
) {
    let parent = parent_of(world, actor);
    let Ok(position) = world.get::<&Transform>(actor).map(|t| t.position) else {
        return;
    };

    let drag_parent = {
        let Ok(mut pick) = world.get::<&mut Pickable>(actor) else {
            return;
        };
        if pick.held {
            return;
        }
        if pick.config.block_when_pointer_over_ui && ctx.input.pointer_over_ui {
            log::trace!("pickup of {:?} blocked by UI", actor);
            return;
        }
        pick.held = true;
        pick.drop_handled = false;
        pick.last_hit = None;
        // Start the hover target where the actor already is.
        pick.hover_point = position - Vec3::Y * pick.config.hover_height;
        pick.parent_before_drag = parent;
        pick.config.drag_parent
    };

    if let Some(drag_parent) = drag_parent {
        set_parent(world, actor, drag_parent);
    }
    set_physics_locked(world, actor, true);

    log::debug!("pick started: {:?}", actor);
    dispatch(world, ctx, listeners, PickEvent::PickStarted, actor);
}

fn update_hover_point(world: &mut World, ctx: &TickContext<'_>, actor: Entity) {
    let Some(camera) = ctx.camera else {
        return;
    };
    let ray = camera.screen_point_to_ray(ctx.input.pointer);
    let Ok((pick, transform)) = world.query_one_mut::<(&mut Pickable, &Transform)>(actor) else {
        return;
    };

    match ctx
        .rays
        .cast_ray(ray, pick.config.max_ray_distance, pick.config.placement_mask)
    {
        Some(hit) => {
            pick.hover_point = hit.point;
            pick.last_hit = Some(hit);
        }
        None => {
            // Keep tracking laterally on the actor's own height.
            if let Some(t) = Plane::horizontal(transform.position).intersect(&ray) {
                pick.hover_point = ray.point_at(t);
            }
            pick.last_hit = None;
        }
    }
}

fn follow_pointer(world: &mut World, actor: Entity, dt: f32) {
    let Ok((pick, transform)) = world.query_one_mut::<(&Pickable, &mut Transform)>(actor) else {
        return;
    };
    let target = pick.hover_point + Vec3::Y * pick.config.hover_height;
    let t = (dt * pick.config.follow_speed).clamp(0.0, 1.0);
    transform.position = transform.position.lerp(target, t);
}

/// Parent to restore after a drag, if the drag reparented the actor.
fn release_hold(world: &mut World, actor: Entity) -> Option<Option<SceneParent>> {
    let mut pick = world.get::<&mut Pickable>(actor).ok()?;
    if !pick.held {
        return None;
    }
    pick.held = false;
    pick.drop_handled = false;
    Some(pick.config.drag_parent.map(|_| pick.parent_before_drag))
}

fn end_pickup(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    listeners: &mut [Box<dyn PickListener>],
    actor: Entity,
) {
    let Some(restore_parent) = release_hold(world, actor) else {
        return;
    };
    if let Some(parent) = restore_parent {
        set_parent(world, actor, parent);
    }

    log::debug!("drop requested: {:?}", actor);
    dispatch(world, ctx, listeners, PickEvent::DropRequested, actor);

    let handled = world
        .get::<&Pickable>(actor)
        .map(|pick| pick.drop_handled)
        .unwrap_or(true);
    if !handled {
        let lock = locks_when_placed(world, actor);
        cache_resting_state(world, actor, None, lock, ctx.rays);
    }
}

fn cancel_pickup(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    listeners: &mut [Box<dyn PickListener>],
    actor: Entity,
) {
    let Some(restore_parent) = release_hold(world, actor) else {
        return;
    };
    if let Some(parent) = restore_parent {
        set_parent(world, actor, parent);
    }

    restore_resting_state(world, actor, ctx.rays);
    log::debug!("pick cancelled: {:?}", actor);
    dispatch(world, ctx, listeners, PickEvent::CancelRequested, actor);
}

fn dispatch(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    listeners: &mut [Box<dyn PickListener>],
    event: PickEvent,
    actor: Entity,
) {
    for listener in listeners.iter_mut() {
        listener.on_pick_event(event, actor, world, ctx);
    }
}

/// The actor's configured rest lock, `true` when it has no pick state.
pub fn locks_when_placed(world: &World, actor: Entity) -> bool {
    world
        .get::<&Pickable>(actor)
        .map(|pick| pick.config.lock_when_placed)
        .unwrap_or(true)
}

fn probe_ground(rays: &dyn RayCaster, from: Vec3, config: &PickConfig) -> Option<f32> {
    let ray = Ray::new(from + Vec3::Y * GROUND_PROBE_LIFT, Vec3::NEG_Y);
    rays.cast_ray(
        ray,
        config.ground_probe_distance + GROUND_PROBE_LIFT,
        config.placement_mask,
    )
    .map(|hit| hit.point.y)
}

/// Commit the actor's current pose as its resting state.
///
/// Without a cell the actor is first settled onto the surface below it,
/// when one is within probe range. Physics is locked or released per
/// `lock_physics`. Marks any in-flight drop as handled.
pub fn cache_resting_state(
    world: &mut World,
    actor: Entity,
    cell: Option<CellId>,
    lock_physics: bool,
    rays: &dyn RayCaster,
) {
    let parent = parent_of(world, actor);
    {
        let Ok((pick, transform)) = world.query_one_mut::<(&mut Pickable, &mut Transform)>(actor)
        else {
            return;
        };
        if cell.is_none() && pick.config.ground_probe {
            if let Some(y) = probe_ground(rays, transform.position, &pick.config) {
                transform.position.y = y;
            }
        }
        pick.resting = RestingState {
            position: transform.position,
            rotation: transform.rotation,
            parent,
            cell,
            physics_locked: lock_physics,
        };
        pick.drop_handled = true;
    }
    set_physics_locked(world, actor, lock_physics);
}

/// Put the actor back exactly as last cached. Cell-less rests are probed
/// again so the actor lands on whatever surface is below it now.
pub fn restore_resting_state(world: &mut World, actor: Entity, rays: &dyn RayCaster) {
    let resting = {
        let Ok((pick, transform)) = world.query_one_mut::<(&mut Pickable, &mut Transform)>(actor)
        else {
            return;
        };
        if pick.resting.cell.is_none() && pick.config.ground_probe {
            if let Some(y) = probe_ground(rays, pick.resting.position, &pick.config) {
                pick.resting.position.y = y;
            }
        }
        transform.position = pick.resting.position;
        transform.rotation = pick.resting.rotation;
        pick.drop_handled = true;
        pick.resting
    };
    set_parent(world, actor, resting.parent);
    set_physics_locked(world, actor, resting.physics_locked);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::{Vec2, Vec3};

    use super::*;
    use crate::camera::Camera;
    use crate::ecs::components::{Body, Parent};
    use crate::ecs::systems::spatial;
    use crate::input::FrameInput;
    use crate::spatial::{Aabb, Collider, ColliderSet, HitKind};

    const DT: f32 = 1.0 / 60.0;

    struct Fixture {
        world: World,
        colliders: ColliderSet,
        camera: Camera,
        listeners: Vec<Box<dyn PickListener>>,
        events: Rc<RefCell<Vec<PickEvent>>>,
    }

    struct Recorder(Rc<RefCell<Vec<PickEvent>>>);

    impl PickListener for Recorder {
        fn on_pick_event(&mut self, event: PickEvent, _: Entity, _: &mut World, _: &mut TickContext<'_>) {
            self.0.borrow_mut().push(event);
        }
    }

    fn fixture(with_ground: bool) -> Fixture {
        let mut colliders = ColliderSet::new();
        if with_ground {
            colliders.add(Collider::fixed(
                Aabb::new(Vec3::new(-10.0, -1.0, -10.0), Vec3::new(10.0, 0.0, 10.0)),
                LayerMask::GROUND,
                HitKind::Other,
            ));
        }
        let events = Rc::new(RefCell::new(Vec::new()));
        Fixture {
            world: World::new(),
            colliders,
            camera: Camera::look_at(
                Vec3::new(2.0, 10.0, 2.0),
                Vec3::new(2.0, 0.0, 2.0),
                60f32.to_radians(),
                Vec2::new(800.0, 600.0),
            ),
            listeners: vec![Box::new(Recorder(events.clone()))],
            events,
        }
    }

    fn spawn(fx: &mut Fixture, position: Vec3) -> Entity {
        let e = fx.world.spawn((
            Transform::from_position(position),
            Parent::default(),
            Body::dynamic(),
            Pickable::default(),
        ));
        fx.colliders.add(Collider::following(
            e,
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::splat(0.2),
            LayerMask::ACTORS,
            HitKind::Actor(e),
        ));
        cache_resting_state(&mut fx.world, e, None, true, &fx.colliders);
        spatial::sync(&fx.world, &mut fx.colliders);
        e
    }

    fn input_at(fx: &Fixture, point: Vec3) -> FrameInput {
        FrameInput {
            pointer: fx.camera.world_to_screen(point).unwrap(),
            ..Default::default()
        }
    }

    fn step(fx: &mut Fixture, input: FrameInput) {
        spatial::sync(&fx.world, &mut fx.colliders);
        let mut ctx = TickContext {
            grid: None,
            camera: Some(&fx.camera),
            rays: &fx.colliders,
            input: &input,
        };
        update(&mut fx.world, &mut ctx, &mut fx.listeners, DT);
    }

    fn press(fx: &mut Fixture, point: Vec3) {
        let input = FrameInput {
            primary_down: true,
            primary_pressed: true,
            ..input_at(fx, point)
        };
        step(fx, input);
    }

    fn release(fx: &mut Fixture, point: Vec3) {
        let input = FrameInput {
            primary_released: true,
            ..input_at(fx, point)
        };
        step(fx, input);
    }

    fn drag(fx: &mut Fixture, point: Vec3, ticks: usize) {
        for _ in 0..ticks {
            let input = FrameInput {
                primary_down: true,
                ..input_at(fx, point)
            };
            step(fx, input);
        }
    }

    fn pose(fx: &Fixture, e: Entity) -> Transform {
        *fx.world.get::<&Transform>(e).unwrap()
    }

    fn pick(fx: &Fixture, e: Entity) -> Pickable {
        (*fx.world.get::<&Pickable>(e).unwrap()).clone()
    }

    #[test]
    fn spawn_settles_onto_ground() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.5, 1.0));

        assert_eq!(pose(&fx, e).position, Vec3::new(1.0, 0.0, 1.0));
        let p = pick(&fx, e);
        assert_eq!(p.resting().cell, None);
        assert!(p.resting().physics_locked);
        assert!(fx.world.get::<&Body>(e).unwrap().is_locked());
    }

    #[test]
    fn probe_without_ground_keeps_position() {
        let mut fx = fixture(false);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.5, 1.0));
        assert_eq!(pose(&fx, e).position, Vec3::new(1.0, 0.5, 1.0));
    }

    #[test]
    fn press_on_actor_starts_hold() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));

        assert!(pick(&fx, e).is_held());
        assert_eq!(held_actor(&fx.world), Some(e));
        assert_eq!(*fx.events.borrow(), vec![PickEvent::PickStarted]);
    }

    #[test]
    fn press_elsewhere_does_nothing() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        press(&mut fx, Vec3::new(3.0, 0.0, 3.0));

        assert!(!pick(&fx, e).is_held());
        assert!(fx.events.borrow().is_empty());
    }

    #[test]
    fn press_over_ui_is_blocked() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        let input = FrameInput {
            primary_down: true,
            primary_pressed: true,
            pointer_over_ui: true,
            ..input_at(&fx, Vec3::new(1.0, 0.4, 1.0))
        };
        step(&mut fx, input);

        assert!(!pick(&fx, e).is_held());
    }

    #[test]
    fn held_actor_follows_pointer_at_hover_height() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        drag(&mut fx, Vec3::new(4.0, 0.0, 1.0), 60);

        let pos = pose(&fx, e).position;
        assert!((pos - Vec3::new(4.0, DEFAULT_HOVER_HEIGHT, 1.0)).length() < 1e-2);
        assert!(pick(&fx, e).has_valid_hit());
    }

    #[test]
    fn missing_surface_tracks_on_actor_plane() {
        let mut fx = fixture(false);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        drag(&mut fx, Vec3::new(3.0, 0.0, 1.0), 1);

        let p = pick(&fx, e);
        assert!(!p.has_valid_hit());
        assert!((p.hover_point().x - 3.0).abs() < 0.05);
        assert!((p.hover_point().z - 1.0).abs() < 0.05);
    }

    #[test]
    fn release_without_listener_rests_in_place() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        drag(&mut fx, Vec3::new(4.0, 0.0, 1.0), 60);
        release(&mut fx, Vec3::new(4.0, 0.0, 1.0));

        let p = pick(&fx, e);
        assert!(!p.is_held());
        assert_eq!(p.resting().cell, None);
        assert_eq!(p.resting().position.y, 0.0);
        assert!((p.resting().position.x - 4.0).abs() < 1e-2);
        assert_eq!(pose(&fx, e).position, p.resting().position);
        assert_eq!(
            *fx.events.borrow(),
            vec![PickEvent::PickStarted, PickEvent::DropRequested]
        );
    }

    #[test]
    fn cancel_restores_exact_pose() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        let rotation = Quat::from_rotation_y(0.7);
        fx.world.get::<&mut Transform>(e).unwrap().rotation = rotation;
        cache_resting_state(&mut fx.world, e, None, true, &fx.colliders);
        let before = pose(&fx, e);

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        drag(&mut fx, Vec3::new(3.0, 0.0, 3.0), 10);
        assert_ne!(pose(&fx, e).position, before.position);

        let input = FrameInput {
            primary_down: true,
            secondary_pressed: true,
            ..input_at(&fx, Vec3::new(3.0, 0.0, 3.0))
        };
        step(&mut fx, input);

        assert_eq!(pose(&fx, e), before);
        assert_eq!(fx.world.get::<&Parent>(e).unwrap().0, SceneParent::Root);
        assert!(fx.world.get::<&Body>(e).unwrap().is_locked());
        assert!(!pick(&fx, e).is_held());
        assert_eq!(fx.events.borrow().last(), Some(&PickEvent::CancelRequested));
    }

    #[test]
    fn drag_parent_is_used_and_restored() {
        let mut fx = fixture(true);
        let anchor = fx.world.spawn(());
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        fx.world.get::<&mut Pickable>(e).unwrap().config.drag_parent =
            Some(SceneParent::Node(anchor));

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        assert_eq!(fx.world.get::<&Parent>(e).unwrap().0, SceneParent::Node(anchor));

        release(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(fx.world.get::<&Parent>(e).unwrap().0, SceneParent::Root);
    }

    #[test]
    fn unlocked_rest_releases_physics() {
        let mut fx = fixture(true);
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        fx.world.get::<&mut Pickable>(e).unwrap().config.lock_when_placed = false;

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        assert!(fx.world.get::<&Body>(e).unwrap().is_locked());

        release(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        let body = *fx.world.get::<&Body>(e).unwrap();
        assert!(!body.is_locked() && body.gravity);
    }

    struct Relocate(Vec3);

    impl PickListener for Relocate {
        fn on_pick_event(&mut self, event: PickEvent, actor: Entity, world: &mut World, _: &mut TickContext<'_>) {
            if event == PickEvent::DropRequested {
                world.get::<&mut Transform>(actor).unwrap().position = self.0;
                world.get::<&mut Pickable>(actor).unwrap().mark_drop_handled();
            }
        }
    }

    #[test]
    fn handled_drop_skips_fallback_rest() {
        let mut fx = fixture(true);
        fx.listeners.push(Box::new(Relocate(Vec3::new(7.0, 3.0, 7.0))));
        let e = spawn(&mut fx, Vec3::new(1.0, 0.0, 1.0));
        let before = *pick(&fx, e).resting();

        press(&mut fx, Vec3::new(1.0, 0.4, 1.0));
        release(&mut fx, Vec3::new(2.0, 0.0, 2.0));

        assert_eq!(pose(&fx, e).position, Vec3::new(7.0, 3.0, 7.0));
        assert_eq!(*pick(&fx, e).resting(), before);
    }
}
