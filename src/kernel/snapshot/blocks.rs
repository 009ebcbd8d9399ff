use tracing::debug;

use super::round4;
use super::types::{BlockRow, LightLevel};
use crate::kernel::query::{normalize_name, BlockInfo, BlockPos, EnvironmentQuery, Vec3};

/// Largest neighborhood radius scanned; larger requests are clamped.
pub const MAX_NEIGHBORHOOD_RADIUS: u32 = 32;

/// Enumerates the `(2R+1)^3` cube around the floor of `center`, with `R`
/// clamped to [`MAX_NEIGHBORHOOD_RADIUS`].
///
/// Order is fixed: `dx` outermost, then `dy`, then `dz`, each ascending.
/// A failed lookup still yields its row, with null block fields.
pub fn scan_neighborhood(env: &dyn EnvironmentQuery, world: &str, center: Vec3, radius: u32) -> Vec<BlockRow> {
    let radius = radius.min(MAX_NEIGHBORHOOD_RADIUS);
    let r = radius as i32;
    let base = center.block();
    let divisor = f64::from(r.max(1));
    let side = (2 * radius as usize) + 1;
    let mut rows = Vec::with_capacity(side * side * side);

    for dx in -r..=r {
        for dy in -r..=r {
            for dz in -r..=r {
                let info = match env.block_at(world, base.offset(dx, dy, dz)) {
                    Ok(info) => Some(info),
                    Err(err) => {
                        debug!(%err, dx, dy, dz, "neighborhood block lookup failed");
                        None
                    }
                };
                rows.push(block_row(dx, dy, dz, divisor, info.as_ref()));
            }
        }
    }

    rows
}

fn block_row(dx: i32, dy: i32, dz: i32, divisor: f64, info: Option<&BlockInfo>) -> BlockRow {
    let name = info.map(|b| normalize_name(&b.material));
    BlockRow {
        dx,
        dy,
        dz,
        ndx: round4(f64::from(dx) / divisor),
        ndy: round4(f64::from(dy) / divisor),
        ndz: round4(f64::from(dz) / divisor),
        fluid_type: name.as_deref().and_then(fluid_type),
        block: name,
        data: info.map(|b| b.data.clone()),
        light_level: info.map(|b| LightLevel {
            sky: b.sky_light,
            block: b.block_light,
        }),
        flammable: info.is_some_and(|b| b.flammable),
        breakable_by_hand: info.is_some_and(|b| !b.solid),
    }
}

fn fluid_type(name: &str) -> Option<&'static str> {
    match name {
        "water" => Some("water"),
        "lava" => Some("lava"),
        _ => None,
    }
}

/// Normalized material name at `pos`, or `None` if the lookup failed.
pub fn block_name(env: &dyn EnvironmentQuery, world: &str, pos: BlockPos) -> Option<String> {
    match env.block_at(world, pos) {
        Ok(info) => Some(normalize_name(&info.material)),
        Err(err) => {
            debug!(%err, ?pos, "block lookup failed");
            None
        }
    }
}
