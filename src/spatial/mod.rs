use std::ops::BitOr;

use glam::Vec3;

use crate::grid::CellId;

/// Rays closer to parallel than this are treated as missing a plane.
const PARALLEL_EPSILON: f32 = 1e-6;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Infinite plane `dot(normal, p) == distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Horizontal plane through `point`.
    pub fn horizontal(point: Vec3) -> Self {
        Self::from_point_normal(point, Vec3::Y)
    }

    /// Distance along `ray` to the plane, if it lies ahead of the origin.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.distance - self.normal.dot(ray.origin)) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Returns entry distance and the outward normal of the
    /// entered face. Rays starting inside the box do not hit it.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir.abs() < PARALLEL_EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let (mut t0, mut t1) = ((lo - origin) * inv, (hi - origin) * inv);
            // Entering through the min face means the outward normal is negative.
            let mut face = -1.0;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                face = 1.0;
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = Vec3::ZERO;
                normal[axis] = face;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        (t_enter >= 0.0 && normal != Vec3::ZERO).then_some((t_enter, normal))
    }
}

// ---------------------------------------------------------------------------
// Layers and hit results
// ---------------------------------------------------------------------------

/// Collision layer bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1 << 0);
    pub const CELLS: Self = Self(1 << 1);
    pub const ACTORS: Self = Self(1 << 2);
    pub const CONTROLS: Self = Self(1 << 3);
    pub const ALL: Self = Self(u32::MAX);

    /// True if the masks share any layer.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// What a surface belongs to, resolved by whoever registered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Cell(CellId),
    Actor(hecs::Entity),
    /// Pressable control owned by an entity (e.g. a lamp button).
    Control(hecs::Entity),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub kind: HitKind,
    /// Owners of the hit surface, nearest first.
    pub ancestors: Vec<HitKind>,
}

impl RayHit {
    /// The hit surface followed by its ancestry chain.
    pub fn lineage(&self) -> impl Iterator<Item = HitKind> + '_ {
        std::iter::once(self.kind).chain(self.ancestors.iter().copied())
    }

    pub fn cell(&self) -> Option<CellId> {
        self.lineage().find_map(|kind| match kind {
            HitKind::Cell(id) => Some(id),
            _ => None,
        })
    }

    pub fn actor(&self) -> Option<hecs::Entity> {
        self.lineage().find_map(|kind| match kind {
            HitKind::Actor(entity) => Some(entity),
            _ => None,
        })
    }

    pub fn control(&self) -> Option<hecs::Entity> {
        self.lineage().find_map(|kind| match kind {
            HitKind::Control(entity) => Some(entity),
            _ => None,
        })
    }
}

/// Ray-casting provider consumed by the interaction systems.
pub trait RayCaster {
    /// Nearest hit within `max_distance` on any layer in `mask`.
    fn cast_ray(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;
}

// ---------------------------------------------------------------------------
// Collider set
// ---------------------------------------------------------------------------

/// Keeps a box glued to an entity's transform.
#[derive(Debug, Clone, Copy)]
pub struct Follow {
    pub entity: hecs::Entity,
    pub offset: Vec3,
    pub half_extents: Vec3,
}

#[derive(Debug, Clone)]
pub struct Collider {
    pub bounds: Aabb,
    pub layer: LayerMask,
    pub kind: HitKind,
    pub ancestors: Vec<HitKind>,
    pub follow: Option<Follow>,
}

impl Collider {
    pub fn fixed(bounds: Aabb, layer: LayerMask, kind: HitKind) -> Self {
        Self {
            bounds,
            layer,
            kind,
            ancestors: Vec::new(),
            follow: None,
        }
    }

    /// Box that tracks `entity`, centred at its position plus `offset`.
    pub fn following(
        entity: hecs::Entity,
        offset: Vec3,
        half_extents: Vec3,
        layer: LayerMask,
        kind: HitKind,
    ) -> Self {
        Self {
            bounds: Aabb::from_center(offset, half_extents),
            layer,
            kind,
            ancestors: Vec::new(),
            follow: Some(Follow {
                entity,
                offset,
                half_extents,
            }),
        }
    }

    pub fn with_ancestors(mut self, ancestors: Vec<HitKind>) -> Self {
        self.ancestors = ancestors;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColliderId(usize);

/// Headless ray-casting world made of axis-aligned boxes.
#[derive(Default)]
pub struct ColliderSet {
    colliders: Vec<Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: Collider) -> ColliderId {
        self.colliders.push(collider);
        ColliderId(self.colliders.len() - 1)
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Keep only the colliders for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Collider) -> bool) {
        self.colliders.retain(keep);
    }

    /// Drop every collider attached to `entity`.
    pub fn remove_entity(&mut self, entity: hecs::Entity) {
        self.colliders
            .retain(|c| c.follow.map_or(true, |f| f.entity != entity));
    }

    /// Follow targets, so the owner can feed back fresh positions.
    pub fn followers(&self) -> impl Iterator<Item = (ColliderId, hecs::Entity)> + '_ {
        self.colliders
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.follow.map(|f| (ColliderId(i), f.entity)))
    }

    /// Recentre a following collider on `position`.
    pub fn move_follower(&mut self, id: ColliderId, position: Vec3) {
        if let Some(collider) = self.colliders.get_mut(id.0) {
            if let Some(follow) = collider.follow {
                collider.bounds = Aabb::from_center(position + follow.offset, follow.half_extents);
            }
        }
    }
}

impl RayCaster for ColliderSet {
    fn cast_ray(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        if ray.direction == Vec3::ZERO {
            return None;
        }

        let mut nearest: Option<(f32, Vec3, &Collider)> = None;
        for collider in &self.colliders {
            if !collider.layer.intersects(mask) {
                continue;
            }
            let Some((t, normal)) = collider.bounds.intersect(&ray) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if nearest.map_or(true, |(best, _, _)| t < best) {
                nearest = Some((t, normal, collider));
            }
        }

        nearest.map(|(t, normal, collider)| {
            let mut point = ray.point_at(t);
            // Pin the coordinate across the entered face to the face itself.
            for axis in 0..3 {
                if normal[axis] > 0.0 {
                    point[axis] = collider.bounds.max[axis];
                } else if normal[axis] < 0.0 {
                    point[axis] = collider.bounds.min[axis];
                }
            }
            RayHit {
                point,
                normal,
                distance: t,
                kind: collider.kind,
                ancestors: collider.ancestors.clone(),
            }
        })
    }
}
