use crate::ecs::components::Transform;
use crate::spatial::ColliderSet;

/// Move every entity-following collider onto its entity's current pose.
/// Colliders of despawned entities are dropped.
pub fn sync(world: &hecs::World, colliders: &mut ColliderSet) {
    let followers: Vec<_> = colliders.followers().collect();
    let mut dead = Vec::new();
    for (id, entity) in followers {
        match world.get::<&Transform>(entity) {
            Ok(transform) => colliders.move_follower(id, transform.position),
            Err(_) if !world.contains(entity) => dead.push(entity),
            Err(_) => {}
        }
    }
    for entity in dead {
        colliders.remove_entity(entity);
    }
}
