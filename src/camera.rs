use glam::{Mat3, Quat, Vec2, Vec3};

use crate::spatial::Ray;

/// Perspective camera. Looks down its local -Z with +Y up.
///
/// Screen points are in pixels with the origin at the bottom-left corner,
/// matching how pointer positions are reported to the systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub vertical_fov: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(position: Vec3, rotation: Quat, vertical_fov: f32, viewport: Vec2) -> Self {
        Self {
            position,
            rotation,
            vertical_fov,
            viewport,
        }
    }

    /// Camera at `eye` facing `target`. Straight-down views use world +X as
    /// screen right.
    pub fn look_at(eye: Vec3, target: Vec3, vertical_fov: f32, viewport: Vec2) -> Self {
        let forward = (target - eye).normalize_or_zero();
        let rotation = if forward == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            let mut right = forward.cross(Vec3::Y);
            if right.length_squared() < 1e-6 {
                right = Vec3::X;
            }
            let right = right.normalize();
            let up = right.cross(forward);
            Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
        };
        Self::new(eye, rotation, vertical_fov, viewport)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    fn aspect(&self) -> f32 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }

    fn tan_half_fov(&self) -> f32 {
        (self.vertical_fov * 0.5).tan()
    }

    /// Ray from the eye through a screen pixel.
    pub fn screen_point_to_ray(&self, screen: Vec2) -> Ray {
        let viewport = self.viewport.max(Vec2::ONE);
        let ndc = screen / viewport * 2.0 - Vec2::ONE;
        let tan_half = self.tan_half_fov();
        let local = Vec3::new(ndc.x * tan_half * self.aspect(), ndc.y * tan_half, -1.0);
        Ray::new(self.position, self.rotation * local)
    }

    /// Pixel a world point projects to, or `None` if it is behind the eye.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let local = self.rotation.inverse() * (point - self.position);
        let depth = -local.z;
        if depth <= f32::EPSILON {
            return None;
        }
        let tan_half = self.tan_half_fov();
        let ndc = Vec2::new(
            local.x / (depth * tan_half * self.aspect()),
            local.y / (depth * tan_half),
        );
        Some((ndc + Vec2::ONE) * 0.5 * self.viewport.max(Vec2::ONE))
    }
}
