use glam::{IVec2, Vec2, Vec3};
use hecs::Entity;
use instant::Instant;

use snapgrid::camera::Camera;
use snapgrid::debug::timer::SystemPhase;
use snapgrid::ecs::components::{ActorName, Transform};
use snapgrid::ecs::systems::lamp::{Lamp, LampConfig, LampMode};
use snapgrid::ecs::systems::pick::Pickable;
use snapgrid::grid::GridConfig;
use snapgrid::input::RawInput;
use snapgrid::spatial::Aabb;
use snapgrid::table::Tabletop;

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// Relative spread of simulated frame times around the tick rate.
const FRAME_JITTER: f64 = 0.6;
/// Pointer noise in pixels, like a hand that is not perfectly still.
const POINTER_JITTER: f32 = 0.75;
/// How often to log timing stats (ticks).
const STATS_LOG_INTERVAL: u64 = 240;
const SESSION_SEED: u64 = 0x5eed_7ab1e;

const GRID_COLUMNS: usize = 5;
const GRID_ROWS: usize = 5;
const CELL_SPACING: f32 = 1.0;
const ITEM_HALF_EXTENTS: Vec3 = Vec3::new(0.2, 0.2, 0.2);
/// Table surface sits just below the cell tops.
const GROUND_TOP: f32 = -0.02;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    started: Instant,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            started: Instant::now(),
        }
    }

    fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frame_time_sum += dt;
        self.frame_time_min = self.frame_time_min.min(dt);
        self.frame_time_max = self.frame_time_max.max(dt);
    }

    fn log_summary(&self, ticks: u64) {
        if self.frame_count == 0 {
            return;
        }
        let avg_ms = self.frame_time_sum / self.frame_count as f64 * 1000.0;
        log::info!(
            "frames: {} | ticks: {} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | wall: {:.1}ms",
            self.frame_count,
            ticks,
            avg_ms,
            self.frame_time_min * 1000.0,
            self.frame_time_max * 1000.0,
            self.started.elapsed().as_secs_f64() * 1000.0,
        );
    }
}

// ---------------------------------------------------------------------------
// Scripted user
// ---------------------------------------------------------------------------

/// Where the scripted pointer aims.
#[derive(Debug, Clone, Copy)]
enum Target {
    TopOf(Entity),
    Cell(IVec2),
    Ground(Vec3),
    Button(Entity),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Press(Target),
    Drag(Target),
    Release(Target),
    Cancel,
    Stick(Vec2),
    Wait,
}

/// Drives the table the way a person would: aim, press, drag, let go.
struct ScriptedUser {
    steps: Vec<(Action, u32)>,
    index: usize,
    elapsed: u32,
    raw: RawInput,
    rng: fastrand::Rng,
}

impl ScriptedUser {
    fn new(steps: Vec<(Action, u32)>, seed: u64) -> Self {
        Self {
            steps,
            index: 0,
            elapsed: 0,
            raw: RawInput::default(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn finished(&self) -> bool {
        self.index >= self.steps.len()
    }

    /// Input for the next tick, or `None` once the script has run out.
    fn next_input(&mut self, table: &Tabletop) -> Option<RawInput> {
        let (action, ticks) = *self.steps.get(self.index)?;

        match action {
            Action::Press(target) => {
                self.aim(table, target);
                self.raw.primary_down = true;
            }
            Action::Drag(target) => self.aim(table, target),
            Action::Release(target) => {
                self.aim(table, target);
                self.raw.primary_down = false;
            }
            Action::Cancel => self.raw.secondary_down = self.elapsed == 0,
            Action::Stick(axis) => self.raw.stick = axis,
            Action::Wait => {}
        }

        self.elapsed += 1;
        if self.elapsed >= ticks.max(1) {
            self.index += 1;
            self.elapsed = 0;
        }
        Some(self.raw)
    }

    fn aim(&mut self, table: &Tabletop, target: Target) {
        let Some(camera) = table.camera.as_ref() else {
            return;
        };
        let Some(point) = resolve(table, target) else {
            log::warn!("script target {:?} no longer resolves", target);
            return;
        };
        if let Some(screen) = camera.world_to_screen(point) {
            let jitter = Vec2::new(self.rng.f32() - 0.5, self.rng.f32() - 0.5) * 2.0 * POINTER_JITTER;
            self.raw.pointer = screen + jitter;
        }
    }
}

fn resolve(table: &Tabletop, target: Target) -> Option<Vec3> {
    match target {
        Target::TopOf(entity) => {
            let position = table.world.get::<&Transform>(entity).ok()?.position;
            Some(position + Vec3::Y * ITEM_HALF_EXTENTS.y * 2.0)
        }
        Target::Cell(coord) => {
            let grid = table.grid()?;
            grid.cell(grid.lookup(coord)?).map(|cell| cell.anchor())
        }
        Target::Ground(point) => Some(point),
        Target::Button(entity) => {
            let position = table.world.get::<&Transform>(entity).ok()?.position;
            let lamp = table.world.get::<&Lamp>(entity).ok()?;
            Some(position + lamp.button_offset())
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Session {
    table: Tabletop,
    crate_item: Entity,
    barrel: Entity,
    lamp: Entity,
}

fn build_session() -> Result<Session, Box<dyn std::error::Error>> {
    let mut table = Tabletop::new();
    table.load_grid(&GridConfig::regular(
        GRID_COLUMNS,
        GRID_ROWS,
        Vec3::ZERO,
        CELL_SPACING,
    ));
    table.add_ground(Aabb::new(
        Vec3::new(-10.0, -1.0, -10.0),
        Vec3::new(10.0, GROUND_TOP, 10.0),
    ));
    table.set_camera(Camera::look_at(
        Vec3::new(2.0, 10.0, 2.0),
        Vec3::new(2.0, 0.0, 2.0),
        60f32.to_radians(),
        Vec2::new(1280.0, 720.0),
    ));

    let crate_item = table.spawn_item("crate", Vec3::new(6.0, 0.5, 1.0), ITEM_HALF_EXTENTS);
    let barrel = table.spawn_item("barrel", Vec3::ZERO, ITEM_HALF_EXTENTS);
    if !table.place_item(barrel, IVec2::new(3, 3)) {
        return Err("barrel could not be placed at (3, 3)".into());
    }
    let lamp = table.spawn_lamp(Vec3::new(2.0, 0.0, -1.5), LampConfig::default(), LampMode::Off);

    Ok(Session {
        table,
        crate_item,
        barrel,
        lamp,
    })
}

fn script(crate_item: Entity, barrel: Entity, lamp: Entity) -> Vec<(Action, u32)> {
    vec![
        (Action::Wait, 10),
        // Crate from the floor into a free cell.
        (Action::Press(Target::TopOf(crate_item)), 1),
        (Action::Drag(Target::Cell(IVec2::new(1, 2))), 40),
        (Action::Release(Target::Cell(IVec2::new(1, 2))), 1),
        // Barrel onto the crate's cell: rejected, barrel goes home.
        (Action::Press(Target::TopOf(barrel)), 1),
        (Action::Drag(Target::Cell(IVec2::new(1, 2))), 40),
        (Action::Release(Target::Cell(IVec2::new(1, 2))), 1),
        // Barrel dragged around then cancelled.
        (Action::Press(Target::TopOf(barrel)), 1),
        (Action::Drag(Target::Ground(Vec3::new(-1.5, GROUND_TOP, 4.0))), 30),
        (Action::Cancel, 2),
        (Action::Release(Target::TopOf(barrel)), 1),
        // Lamp on, then wide.
        (Action::Press(Target::Button(lamp)), 1),
        (Action::Release(Target::Button(lamp)), 5),
        (Action::Press(Target::Button(lamp)), 1),
        (Action::Release(Target::Button(lamp)), 5),
        // Walk the lamp two cells right and two up.
        (Action::Stick(Vec2::new(1.0, 0.0)), 10),
        (Action::Stick(Vec2::ZERO), 5),
        (Action::Stick(Vec2::new(1.0, 0.1)), 10),
        (Action::Stick(Vec2::ZERO), 5),
        (Action::Stick(Vec2::new(0.0, 1.0)), 10),
        (Action::Stick(Vec2::ZERO), 5),
        (Action::Stick(Vec2::new(-0.2, 0.9)), 10),
        (Action::Stick(Vec2::ZERO), 30),
    ]
}

fn report(table: &Tabletop, items: &[Entity], lamp: Entity) {
    let Some(grid) = table.grid() else {
        return;
    };
    for &item in items {
        let name = table
            .world
            .get::<&ActorName>(item)
            .map(|n| n.0.clone())
            .unwrap_or_default();
        let cell = grid
            .cell_of(item)
            .and_then(|id| grid.cell(id))
            .map(|cell| cell.coord());
        let held = table
            .world
            .get::<&Pickable>(item)
            .map(|p| p.is_held())
            .unwrap_or(false);
        log::info!("{name}: cell {:?}, held {held}", cell);
    }
    if let Ok(l) = table.world.get::<&Lamp>(lamp) {
        let cell = l
            .current_cell()
            .and_then(|id| grid.cell(id))
            .map(|cell| cell.coord());
        log::info!(
            "lamp: {} at {:?}, lighting {} cells",
            l.mode().label(),
            cell,
            l.covered_cells().len()
        );
    }
    for phase in SystemPhase::ALL {
        log::debug!("{}: {:.1}us", phase.label(), table.timers.duration_us(phase));
    }
}

/// Run a scripted headless session on a fixed timestep.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Session {
        mut table,
        crate_item,
        barrel,
        lamp,
    } = build_session()?;
    let mut user = ScriptedUser::new(script(crate_item, barrel, lamp), SESSION_SEED);
    let mut rng = fastrand::Rng::with_seed(SESSION_SEED.rotate_left(17));
    let mut stats = FrameStats::new();
    let mut accumulator = 0.0f64;

    while !user.finished() {
        let frame_dt = TICK_RATE * (1.0 + (rng.f64() - 0.5) * FRAME_JITTER);
        stats.record_frame(frame_dt);

        accumulator += frame_dt;
        if accumulator > MAX_ACCUMULATOR {
            accumulator = MAX_ACCUMULATOR;
        }

        while accumulator >= TICK_RATE {
            let Some(raw) = user.next_input(&table) else {
                break;
            };
            table.tick(&raw, TICK_RATE as f32);
            accumulator -= TICK_RATE;

            if table.tick_count() % STATS_LOG_INTERVAL == 0 {
                log::info!("tick {}: {}", table.tick_count(), table.timers.summary());
            }
        }
    }

    stats.log_summary(table.tick_count());
    report(&table, &[crate_item, barrel], lamp);
    Ok(())
}
