use glam::{Quat, Vec3};

use crate::grid::CellId;

/// World-space pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Where an actor hangs in the scene hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneParent {
    #[default]
    Root,
    Node(hecs::Entity),
    Cell(CellId),
}

/// Current parent context. Reparenting keeps the world pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parent(pub SceneParent);

/// Physics simulation handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub kinematic: bool,
    pub gravity: bool,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Body {
    /// Free-falling body under gravity.
    pub fn dynamic() -> Self {
        Self {
            kinematic: false,
            gravity: true,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    /// Locking makes the body kinematic, disables gravity and stops it dead.
    pub fn set_kinematic_locked(&mut self, locked: bool) {
        self.kinematic = locked;
        self.gravity = !locked;
        if locked {
            self.zero_velocities();
        }
    }

    pub fn zero_velocities(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    pub fn is_locked(&self) -> bool {
        self.kinematic
    }
}

/// Spot light handle driven by a lamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub enabled: bool,
    /// Inner cone angle in degrees.
    pub inner_angle: f32,
    /// Outer cone angle in degrees.
    pub outer_angle: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            enabled: false,
            inner_angle: 0.0,
            outer_angle: 30.0,
        }
    }
}

/// Display name for logs.
#[derive(Debug, Clone)]
pub struct ActorName(pub String);
