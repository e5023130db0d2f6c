use glam::Vec2;

/// Raw device polling. Whatever backend sits behind it (mouse, touch,
/// gamepad, keyboard), the systems only ever see this interface.
pub trait InputSource {
    /// Pointer position in screen pixels, origin bottom-left.
    fn pointer_position(&self) -> Vec2;
    fn primary_down(&self) -> bool;
    fn secondary_down(&self) -> bool;
    /// Directional axis, each component in [-1, 1].
    fn move_axis(&self) -> Vec2;
    /// Whether an opaque UI element currently sits under the pointer.
    fn pointer_over_ui(&self) -> bool {
        false
    }
}

/// Digital direction keys (WASD / arrows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

impl DirectionKeys {
    pub fn axis(self) -> Vec2 {
        let x = self.right as i32 as f32 - self.left as i32 as f32;
        let y = self.up as i32 as f32 - self.down as i32 as f32;
        Vec2::new(x, y).clamp_length_max(1.0)
    }
}

/// Plain snapshot of device state for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawInput {
    pub pointer: Vec2,
    pub primary_down: bool,
    pub secondary_down: bool,
    /// Analog stick; wins over the keys whenever it is deflected.
    pub stick: Vec2,
    pub keys: DirectionKeys,
    pub over_ui: bool,
}

impl InputSource for RawInput {
    fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    fn primary_down(&self) -> bool {
        self.primary_down
    }

    fn secondary_down(&self) -> bool {
        self.secondary_down
    }

    fn move_axis(&self) -> Vec2 {
        if self.stick.length_squared() > 0.0 {
            self.stick.clamp_length_max(1.0)
        } else {
            self.keys.axis()
        }
    }

    fn pointer_over_ui(&self) -> bool {
        self.over_ui
    }
}

/// Input for one tick with press/release edges resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub pointer: Vec2,
    pub primary_down: bool,
    /// Set for one tick when the primary button goes down.
    pub primary_pressed: bool,
    /// Set for one tick when the primary button comes up.
    pub primary_released: bool,
    /// Set for one tick when the secondary button goes down.
    pub secondary_pressed: bool,
    pub move_axis: Vec2,
    pub pointer_over_ui: bool,
}

/// Tracks button state between ticks to derive edges.
#[derive(Debug, Default)]
pub struct PointerState {
    primary_was_down: bool,
    secondary_was_down: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll `source` once and edge-detect. Call once per tick.
    pub fn update(&mut self, source: &dyn InputSource) -> FrameInput {
        let primary = source.primary_down();
        let secondary = source.secondary_down();

        let frame = FrameInput {
            pointer: source.pointer_position(),
            primary_down: primary,
            primary_pressed: primary && !self.primary_was_down,
            primary_released: !primary && self.primary_was_down,
            secondary_pressed: secondary && !self.secondary_was_down,
            move_axis: source.move_axis(),
            pointer_over_ui: source.pointer_over_ui(),
        };

        self.primary_was_down = primary;
        self.secondary_was_down = secondary;
        frame
    }
}
