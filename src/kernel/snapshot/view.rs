use tracing::debug;

use super::round4;
use super::types::{CameraTarget, SightHit, ViewSnapshot};
use crate::kernel::event::ActorId;
use crate::kernel::query::{normalize_name, EnvironmentQuery, Vec3};

/// Unit look direction for the host's yaw/pitch convention (degrees).
pub fn gaze_direction(yaw: f64, pitch: f64) -> Vec3 {
    let yaw = yaw.to_radians();
    let pitch = pitch.to_radians();
    let xz = pitch.cos();
    Vec3::new(-xz * yaw.sin(), -pitch.sin(), xz * yaw.cos())
}

/// Resolves what the actor sees from `eye` along `direction`.
///
/// A targeted entity takes precedence over the first block hit for the
/// camera target. Ray and target lookups that fail count as "nothing seen".
pub fn resolve_view(
    env: &dyn EnvironmentQuery,
    actor: &ActorId,
    world: &str,
    eye: Vec3,
    direction: Vec3,
    max_distance: f64,
) -> ViewSnapshot {
    let mut line_of_sight = Vec::new();
    match env.ray_cast_block(world, eye, direction, max_distance) {
        Ok(Some(hit)) => {
            let distance = match hit.hit_position {
                Some(at) => at.distance(eye),
                None => eye.distance(hit.block.corner()),
            };
            line_of_sight.push(SightHit {
                name: normalize_name(&hit.material),
                distance: round4(distance),
                position: hit.block,
            });
        }
        Ok(None) => {}
        Err(err) => debug!(%err, "line-of-sight ray cast failed"),
    }

    let target = match env.target_entity(actor, max_distance) {
        Ok(target) => target,
        Err(err) => {
            debug!(%err, "target entity lookup failed");
            None
        }
    };

    let camera_target = match (target, line_of_sight.first()) {
        (Some(entity), _) => Some(CameraTarget::Entity {
            name: normalize_name(&entity.kind),
            distance: round4(entity.position.distance(eye)),
            position: round_vec(entity.position),
        }),
        (None, Some(hit)) => Some(CameraTarget::Block(hit.clone())),
        (None, None) => None,
    };

    ViewSnapshot {
        look_vector: round_vec(direction),
        line_of_sight,
        camera_target,
    }
}

pub(crate) fn round_vec(v: Vec3) -> Vec3 {
    Vec3::new(round4(v.x), round4(v.y), round4(v.z))
}
