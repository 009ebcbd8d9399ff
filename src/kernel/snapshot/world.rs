use tracing::debug;

use super::types::{ChunkRegion, TimeOfDay, Weather};
use crate::kernel::query::{BiomeInfo, BlockPos, EnvironmentQuery, WorldInfo};

pub const TICKS_PER_DAY: i64 = 24_000;
/// Last time-of-day tick still counted as daytime.
pub const DAY_END_TICK: i64 = 12_300;

pub fn is_day(time: i64) -> bool {
    (0..=DAY_END_TICK).contains(&time.rem_euclid(TICKS_PER_DAY))
}

/// Snow needs rain and a biome whose identifier mentions snow.
pub fn is_snowing(raining: bool, biome_name: &str) -> bool {
    raining && biome_name.to_lowercase().contains("snow")
}

pub fn weather(info: Option<&WorldInfo>, biome: Option<&BiomeInfo>) -> Weather {
    let Some(info) = info else {
        return Weather::default();
    };
    Weather {
        rain: info.storm,
        thunder: info.thundering,
        snow: is_snowing(info.storm, biome.map_or("", |b| b.name.as_str())),
    }
}

pub fn time_of_day(info: &WorldInfo) -> TimeOfDay {
    TimeOfDay {
        age: info.full_time,
        day: info.full_time / TICKS_PER_DAY,
        time: info.time,
        is_day: is_day(info.time),
    }
}

pub fn chunk_region(env: &dyn EnvironmentQuery, world: &str, pos: BlockPos) -> ChunkRegion {
    let (chunk_x, chunk_z) = pos.chunk();
    let loaded = match env.chunk_loaded(world, chunk_x, chunk_z) {
        Ok(loaded) => loaded,
        Err(err) => {
            debug!(%err, chunk_x, chunk_z, "chunk state lookup failed");
            false
        }
    };
    ChunkRegion {
        chunk_x,
        chunk_z,
        region_x: chunk_x >> 5,
        region_z: chunk_z >> 5,
        loaded,
    }
}
