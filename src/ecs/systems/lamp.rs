use glam::{EulerRot, IVec2, Quat, Vec2, Vec3};
use hecs::{Entity, World};

use super::TickContext;
use crate::ecs::components::{SpotLight, Transform};
use crate::grid::{CellId, GridCell, SpatialGrid};
use crate::spatial::LayerMask;

const BUTTON_RAY_DISTANCE: f32 = 1000.0;

/// Lighting mode, cycled by the lamp's button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LampMode {
    #[default]
    Off,
    Narrow,
    Wide,
}

impl LampMode {
    /// Off -> Narrow -> Wide -> Off.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Narrow,
            Self::Narrow => Self::Wide,
            Self::Wide => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }
}

/// Spot cone in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotAngle {
    pub inner: f32,
    pub outer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampConfig {
    pub narrow: SpotAngle,
    pub wide: SpotAngle,
    /// Stick deflection below this counts as released.
    pub dead_zone: f32,
    /// Max visual joystick tilt in degrees.
    pub tilt_angle: f32,
    /// Joystick slerp rate, per second.
    pub tilt_speed: f32,
    /// How far the button sinks while held.
    pub button_press_depth: f32,
    /// Button offset from the lamp when released.
    pub button_rest: Vec3,
    pub joystick_rest: Quat,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            narrow: SpotAngle {
                inner: 10.0,
                outer: 20.0,
            },
            wide: SpotAngle {
                inner: 35.0,
                outer: 60.0,
            },
            dead_zone: 0.35,
            tilt_angle: 12.0,
            tilt_speed: 12.0,
            button_press_depth: 0.01,
            button_rest: Vec3::new(0.0, 0.3, 0.0),
            joystick_rest: Quat::IDENTITY,
        }
    }
}

/// A grid-bound light that steps cell to cell and lights a footprint.
#[derive(Debug, Clone)]
pub struct Lamp {
    pub config: LampConfig,
    mode: LampMode,
    current_cell: Option<CellId>,
    covered: Vec<CellId>,
    placed: bool,
    /// Stick has been out of the dead zone since the last move.
    engaged: bool,
    button_held: bool,
    button_offset: Vec3,
    joystick_rotation: Quat,
}

impl Lamp {
    pub fn new(config: LampConfig, mode: LampMode) -> Self {
        Self {
            config,
            mode,
            current_cell: None,
            covered: Vec::new(),
            placed: false,
            engaged: false,
            button_held: false,
            button_offset: config.button_rest,
            joystick_rotation: config.joystick_rest,
        }
    }

    pub fn mode(&self) -> LampMode {
        self.mode
    }

    pub fn current_cell(&self) -> Option<CellId> {
        self.current_cell
    }

    /// Cells lit by the current mode.
    pub fn covered_cells(&self) -> &[CellId] {
        &self.covered
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn is_button_held(&self) -> bool {
        self.button_held
    }

    pub fn button_offset(&self) -> Vec3 {
        self.button_offset
    }

    pub fn joystick_rotation(&self) -> Quat {
        self.joystick_rotation
    }

    /// Back to waiting for first placement, keeping the mode.
    pub(crate) fn unplace(&mut self) {
        self.current_cell = None;
        self.placed = false;
        self.covered.clear();
    }

    fn refresh_coverage(&mut self, grid: Option<&SpatialGrid>) {
        self.covered = coverage(self.mode, self.current_cell, grid);
    }

    fn tilt_joystick(&mut self, axis: Vec2, dt: f32) {
        let rest = self.config.joystick_rest;
        let target = if axis.length_squared() <= f32::EPSILON {
            rest
        } else {
            let tilt_x = (-axis.y * self.config.tilt_angle).to_radians();
            let tilt_z = (-axis.x * self.config.tilt_angle).to_radians();
            rest * Quat::from_euler(EulerRot::YXZ, 0.0, tilt_x, tilt_z)
        };
        let t = (dt * self.config.tilt_speed).clamp(0.0, 1.0);
        self.joystick_rotation = self.joystick_rotation.slerp(target, t);
    }
}

/// Cells lit from `current` in `mode`: none when off or unplaced, the
/// current cell when narrow, the clipped 3x3 block around it when wide.
pub fn coverage(mode: LampMode, current: Option<CellId>, grid: Option<&SpatialGrid>) -> Vec<CellId> {
    let Some(current) = current else {
        return Vec::new();
    };
    match (mode, grid) {
        (LampMode::Off, _) => Vec::new(),
        (LampMode::Narrow, _) | (LampMode::Wide, None) => vec![current],
        (LampMode::Wide, Some(grid)) => {
            let Some(origin) = grid.cell(current).map(GridCell::coord) else {
                return vec![current];
            };
            let mut cells: Vec<CellId> = Vec::with_capacity(9);
            for id in grid.neighborhood(origin) {
                if !cells.contains(&id) {
                    cells.push(id);
                }
            }
            cells
        }
    }
}

/// Unit grid step for a stick deflection. Ties favour the vertical axis.
pub fn dominant_direction(axis: Vec2) -> IVec2 {
    if axis.x.abs() > axis.y.abs() {
        IVec2::new(if axis.x > 0.0 { 1 } else { -1 }, 0)
    } else {
        IVec2::new(0, if axis.y > 0.0 { 1 } else { -1 })
    }
}

/// Button, joystick and first placement for every lamp.
pub fn update(world: &mut World, ctx: &mut TickContext<'_>, dt: f32) {
    let lamps: Vec<(Entity, bool, LampMode)> = world
        .query::<&Lamp>()
        .iter()
        .map(|(entity, lamp)| (entity, lamp.placed, lamp.mode))
        .collect();
    if lamps.is_empty() {
        return;
    }

    let pressed = if ctx.input.primary_pressed {
        control_under_pointer(ctx)
    } else {
        None
    };

    for (entity, placed, mode) in lamps {
        let mut grid = ctx.grid.as_deref_mut();

        if !placed && mode != LampMode::Off {
            initialize_placement(world, grid.as_deref_mut(), entity);
        }
        if pressed == Some(entity) {
            press_button(world, grid.as_deref_mut(), entity);
        }
        if ctx.input.primary_released {
            release_button(world, entity);
        }
        handle_joystick(world, grid, entity, ctx.input.move_axis, dt);
    }
}

fn control_under_pointer(ctx: &TickContext<'_>) -> Option<Entity> {
    if ctx.input.pointer_over_ui {
        return None;
    }
    let ray = ctx.camera?.screen_point_to_ray(ctx.input.pointer);
    ctx.rays
        .cast_ray(ray, BUTTON_RAY_DISTANCE, LayerMask::ALL)?
        .control()
}

/// First activation: take the first configured cell, if it is free.
fn initialize_placement(world: &mut World, grid: Option<&mut SpatialGrid>, entity: Entity) -> bool {
    let Some(grid) = grid else {
        return false;
    };
    let Some(first) = grid.first() else {
        return false;
    };
    if !grid.try_place(first, entity) {
        log::trace!("lamp {:?} waiting for first cell", entity);
        return false;
    }
    settle_in(world, grid, entity, first);
    if let Ok((mode, config)) = world.get::<&Lamp>(entity).map(|lamp| (lamp.mode, lamp.config)) {
        apply_light(world, entity, mode, &config);
    }
    true
}

fn settle_in(world: &mut World, grid: &SpatialGrid, entity: Entity, cell: CellId) {
    let Some(target) = grid.cell(cell) else {
        return;
    };
    if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
        transform.position = target.snap_position(0.0);
    }
    if let Ok(mut lamp) = world.get::<&mut Lamp>(entity) {
        lamp.current_cell = Some(cell);
        lamp.placed = true;
        lamp.refresh_coverage(Some(grid));
    }
    log::debug!("lamp {:?} at cell {}", entity, target.coord());
}

/// Switch mode, drive the spot light and refresh coverage. Turning on an
/// unplaced lamp also places it.
pub fn set_mode(world: &mut World, mut grid: Option<&mut SpatialGrid>, entity: Entity, mode: LampMode) {
    let (placed, config) = {
        let Ok(mut lamp) = world.get::<&mut Lamp>(entity) else {
            return;
        };
        lamp.mode = mode;
        (lamp.placed, lamp.config)
    };
    log::info!("lamp {:?} -> {}", entity, mode.label());

    if !placed && mode != LampMode::Off {
        initialize_placement(world, grid.as_deref_mut(), entity);
    }
    apply_light(world, entity, mode, &config);
    if let Ok(mut lamp) = world.get::<&mut Lamp>(entity) {
        lamp.refresh_coverage(grid.as_deref());
    }
}

fn apply_light(world: &mut World, entity: Entity, mode: LampMode, config: &LampConfig) {
    let Ok(mut light) = world.get::<&mut SpotLight>(entity) else {
        return;
    };
    match mode {
        LampMode::Off => light.enabled = false,
        LampMode::Narrow | LampMode::Wide => {
            let angle = if mode == LampMode::Narrow {
                config.narrow
            } else {
                config.wide
            };
            light.enabled = true;
            light.inner_angle = angle.inner;
            light.outer_angle = angle.outer;
        }
    }
}

fn press_button(world: &mut World, grid: Option<&mut SpatialGrid>, entity: Entity) {
    let Some(next) = world.get::<&Lamp>(entity).ok().map(|lamp| lamp.mode.next()) else {
        return;
    };
    set_mode(world, grid, entity, next);
    if let Ok(mut lamp) = world.get::<&mut Lamp>(entity) {
        if !lamp.button_held {
            lamp.button_held = true;
            lamp.button_offset = lamp.config.button_rest - Vec3::Y * lamp.config.button_press_depth;
        }
    }
}

fn release_button(world: &mut World, entity: Entity) {
    if let Ok(mut lamp) = world.get::<&mut Lamp>(entity) {
        if lamp.button_held {
            lamp.button_held = false;
            lamp.button_offset = lamp.config.button_rest;
        }
    }
}

/// One step per deflection: the stick must come back inside the dead zone
/// before it can move the lamp again.
fn handle_joystick(
    world: &mut World,
    grid: Option<&mut SpatialGrid>,
    entity: Entity,
    axis: Vec2,
    dt: f32,
) {
    let direction = {
        let Ok(mut lamp) = world.get::<&mut Lamp>(entity) else {
            return;
        };
        lamp.tilt_joystick(axis, dt);
        let dead_zone = lamp.config.dead_zone;
        if axis.length_squared() < dead_zone * dead_zone {
            lamp.engaged = false;
            return;
        }
        if lamp.engaged {
            return;
        }
        lamp.engaged = true;
        dominant_direction(axis)
    };
    try_move(world, grid, entity, direction);
}

/// Step the lamp one cell in `direction`. Fails without change at the
/// grid edge, into a cell held by another actor, or before placement.
pub fn try_move(
    world: &mut World,
    grid: Option<&mut SpatialGrid>,
    entity: Entity,
    direction: IVec2,
) -> bool {
    let Some(grid) = grid else {
        return false;
    };
    let Some(current) = world.get::<&Lamp>(entity).ok().and_then(|lamp| lamp.current_cell) else {
        return false;
    };
    let Some(target) = grid
        .cell(current)
        .and_then(|cell| grid.lookup(cell.coord() + direction))
    else {
        log::trace!("lamp {:?} at grid edge", entity);
        return false;
    };
    if !grid.try_move(Some(current), target, entity) {
        log::trace!("lamp {:?} blocked by occupied cell", entity);
        return false;
    }
    settle_in(world, grid, entity, target);
    true
}

/// Put the lamp in `cell`, releasing its current one.
pub fn place_at(world: &mut World, grid: &mut SpatialGrid, entity: Entity, cell: CellId) -> bool {
    let Ok(current) = world.get::<&Lamp>(entity).map(|lamp| lamp.current_cell) else {
        return false;
    };
    if !grid.try_move(current, cell, entity) {
        return false;
    }
    settle_in(world, grid, entity, cell);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use crate::input::FrameInput;
    use crate::spatial::ColliderSet;

    const DT: f32 = 1.0 / 60.0;

    fn setup(columns: usize, rows: usize) -> (World, SpatialGrid, Entity) {
        let mut world = World::new();
        let grid = SpatialGrid::new(&GridConfig::regular(columns, rows, Vec3::ZERO, 1.0));
        let lamp = world.spawn((
            Transform::from_position(Vec3::new(-5.0, 0.0, -5.0)),
            Lamp::new(LampConfig::default(), LampMode::Off),
            SpotLight::default(),
        ));
        (world, grid, lamp)
    }

    fn step(world: &mut World, grid: &mut SpatialGrid, axis: Vec2) {
        let colliders = ColliderSet::new();
        let input = FrameInput {
            move_axis: axis,
            ..Default::default()
        };
        let mut ctx = TickContext {
            grid: Some(grid),
            camera: None,
            rays: &colliders,
            input: &input,
        };
        update(world, &mut ctx, DT);
    }

    fn lamp(world: &World, e: Entity) -> Lamp {
        (*world.get::<&Lamp>(e).unwrap()).clone()
    }

    fn coord_of(world: &World, grid: &SpatialGrid, e: Entity) -> IVec2 {
        grid.cell(lamp(world, e).current_cell().unwrap()).unwrap().coord()
    }

    #[test]
    fn mode_cycles() {
        assert_eq!(LampMode::Off.next(), LampMode::Narrow);
        assert_eq!(LampMode::Narrow.next(), LampMode::Wide);
        assert_eq!(LampMode::Wide.next(), LampMode::Off);
    }

    #[test]
    fn dominant_direction_picks_larger_axis() {
        assert_eq!(dominant_direction(Vec2::new(0.9, 0.3)), IVec2::new(1, 0));
        assert_eq!(dominant_direction(Vec2::new(-0.9, 0.3)), IVec2::new(-1, 0));
        assert_eq!(dominant_direction(Vec2::new(0.2, -0.8)), IVec2::new(0, -1));
        assert_eq!(dominant_direction(Vec2::new(0.5, 0.5)), IVec2::new(0, 1));
    }

    #[test]
    fn wide_coverage_is_clipped_block() {
        let (_, grid, _) = setup(5, 5);
        let center = grid.lookup(IVec2::new(2, 2));
        let cells = coverage(LampMode::Wide, center, Some(&grid));
        assert_eq!(cells.len(), 9);
        for id in &cells {
            let c = grid.cell(*id).unwrap().coord();
            assert!((1..=3).contains(&c.x) && (1..=3).contains(&c.y));
        }

        let corner = grid.lookup(IVec2::new(0, 0));
        assert_eq!(coverage(LampMode::Wide, corner, Some(&grid)).len(), 4);
        assert_eq!(coverage(LampMode::Narrow, corner, Some(&grid)), vec![corner.unwrap()]);
        assert!(coverage(LampMode::Off, corner, Some(&grid)).is_empty());
        assert!(coverage(LampMode::Wide, None, Some(&grid)).is_empty());
    }

    #[test]
    fn turning_on_places_at_first_cell() {
        let (mut world, mut grid, e) = setup(3, 3);
        set_mode(&mut world, Some(&mut grid), e, LampMode::Narrow);

        let first = grid.first().unwrap();
        let l = lamp(&world, e);
        assert!(l.is_placed());
        assert_eq!(l.current_cell(), Some(first));
        assert_eq!(l.covered_cells(), &[first]);
        assert_eq!(grid.cell(first).unwrap().content(), Some(e));
        assert_eq!(world.get::<&Transform>(e).unwrap().position, Vec3::ZERO);

        let light = *world.get::<&SpotLight>(e).unwrap();
        assert!(light.enabled);
        assert_eq!(light.outer_angle, LampConfig::default().narrow.outer);
    }

    #[test]
    fn lamp_on_at_spawn_lights_on_first_tick() {
        let (mut world, mut grid, e) = setup(3, 3);
        world.get::<&mut Lamp>(e).unwrap().mode = LampMode::Narrow;

        step(&mut world, &mut grid, Vec2::ZERO);

        assert!(lamp(&world, e).is_placed());
        let light = *world.get::<&SpotLight>(e).unwrap();
        let narrow = LampConfig::default().narrow;
        assert!(light.enabled);
        assert_eq!(light.inner_angle, narrow.inner);
        assert_eq!(light.outer_angle, narrow.outer);
    }

    #[test]
    fn off_lamp_stays_unplaced() {
        let (mut world, mut grid, e) = setup(3, 3);
        step(&mut world, &mut grid, Vec2::ZERO);
        assert!(!lamp(&world, e).is_placed());
        assert!(grid.can_place(grid.first().unwrap()));
    }

    #[test]
    fn blocked_first_cell_is_retried_each_tick() {
        let (mut world, mut grid, e) = setup(3, 3);
        let other = world.spawn(());
        let first = grid.first().unwrap();
        assert!(grid.try_place(first, other));

        world.get::<&mut Lamp>(e).unwrap().mode = LampMode::Wide;
        step(&mut world, &mut grid, Vec2::ZERO);
        assert!(!lamp(&world, e).is_placed());

        grid.clear(first, other);
        step(&mut world, &mut grid, Vec2::ZERO);
        assert_eq!(lamp(&world, e).current_cell(), Some(first));
    }

    #[test]
    fn stick_moves_one_cell_per_deflection() {
        let (mut world, mut grid, e) = setup(5, 5);
        let start = grid.lookup(IVec2::new(1, 1)).unwrap();
        assert!(place_at(&mut world, &mut grid, e, start));

        for _ in 0..10 {
            step(&mut world, &mut grid, Vec2::new(1.0, 0.0));
        }
        assert_eq!(coord_of(&world, &grid, e), IVec2::new(2, 1));
        assert!(grid.can_place(start));

        step(&mut world, &mut grid, Vec2::ZERO);
        step(&mut world, &mut grid, Vec2::new(0.0, 1.0));
        assert_eq!(coord_of(&world, &grid, e), IVec2::new(2, 2));
    }

    #[test]
    fn dead_zone_ignores_small_deflection() {
        let (mut world, mut grid, e) = setup(5, 5);
        let start = grid.lookup(IVec2::new(2, 2)).unwrap();
        place_at(&mut world, &mut grid, e, start);

        step(&mut world, &mut grid, Vec2::new(0.2, 0.1));
        assert_eq!(lamp(&world, e).current_cell(), Some(start));
    }

    #[test]
    fn edge_blocks_move() {
        let (mut world, mut grid, e) = setup(3, 1);
        let start = grid.lookup(IVec2::new(0, 0)).unwrap();
        place_at(&mut world, &mut grid, e, start);

        assert!(!try_move(&mut world, Some(&mut grid), e, IVec2::new(-1, 0)));
        assert!(!try_move(&mut world, Some(&mut grid), e, IVec2::new(0, 1)));
        assert_eq!(lamp(&world, e).current_cell(), Some(start));
        assert_eq!(grid.cell(start).unwrap().content(), Some(e));
    }

    #[test]
    fn stick_left_in_single_column_stays_put() {
        let (mut world, mut grid, e) = setup(1, 3);
        let start = grid.lookup(IVec2::new(0, 1)).unwrap();
        assert!(place_at(&mut world, &mut grid, e, start));

        for _ in 0..5 {
            step(&mut world, &mut grid, Vec2::new(-1.0, 0.0));
        }

        assert_eq!(lamp(&world, e).current_cell(), Some(start));
        assert_eq!(grid.cell(start).unwrap().content(), Some(e));
        assert_eq!(grid.cells().iter().filter(|c| c.is_occupied()).count(), 1);
    }

    #[test]
    fn foreign_occupant_blocks_move() {
        let (mut world, mut grid, e) = setup(3, 3);
        let other = world.spawn(());
        let start = grid.lookup(IVec2::new(0, 0)).unwrap();
        let blocked = grid.lookup(IVec2::new(1, 0)).unwrap();
        grid.try_place(blocked, other);
        place_at(&mut world, &mut grid, e, start);

        step(&mut world, &mut grid, Vec2::new(1.0, 0.0));

        assert_eq!(lamp(&world, e).current_cell(), Some(start));
        assert_eq!(grid.cell(blocked).unwrap().content(), Some(other));
        assert_eq!(grid.cell(start).unwrap().content(), Some(e));
    }

    #[test]
    fn move_without_placement_is_noop() {
        let (mut world, mut grid, e) = setup(3, 3);
        assert!(!try_move(&mut world, Some(&mut grid), e, IVec2::new(1, 0)));
        assert!(!try_move(&mut world, None, e, IVec2::new(1, 0)));
        assert!(grid.ids().all(|id| grid.can_place(id)));
    }

    #[test]
    fn coverage_follows_moves() {
        let (mut world, mut grid, e) = setup(5, 5);
        set_mode(&mut world, Some(&mut grid), e, LampMode::Wide);
        assert_eq!(lamp(&world, e).covered_cells().len(), 4);

        assert!(try_move(&mut world, Some(&mut grid), e, IVec2::new(1, 0)));
        assert!(try_move(&mut world, Some(&mut grid), e, IVec2::new(0, 1)));
        assert_eq!(lamp(&world, e).covered_cells().len(), 9);

        set_mode(&mut world, Some(&mut grid), e, LampMode::Off);
        assert!(lamp(&world, e).covered_cells().is_empty());
        assert!(!world.get::<&SpotLight>(e).unwrap().enabled);
    }

    #[test]
    fn joystick_tilts_and_recentres() {
        let (mut world, mut grid, e) = setup(5, 5);
        for _ in 0..120 {
            step(&mut world, &mut grid, Vec2::new(1.0, 0.0));
        }
        let tilted = lamp(&world, e).joystick_rotation();
        assert!((tilted.angle_between(Quat::IDENTITY) - 12f32.to_radians()).abs() < 1e-3);

        for _ in 0..120 {
            step(&mut world, &mut grid, Vec2::ZERO);
        }
        assert!(lamp(&world, e).joystick_rotation().angle_between(Quat::IDENTITY) < 1e-2);
    }
}
