//! Read-only view of the host environment.
//!
//! The host implements [`EnvironmentQuery`]; the assembler only ever reads
//! through it. Every lookup is fallible so hosts can report missing worlds,
//! unloaded chunks or actors that logged off mid-tick.

use std::ops::{Add, Mul, Sub};

use thiserror::Error;

use super::event::ActorId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("actor {0} is not online")]
    ActorOffline(ActorId),
    #[error("{what} is unavailable")]
    Unavailable { what: String },
    #[error("host query failed: {0}")]
    Host(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector; the zero vector stays zero.
    pub fn normalize(&self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            *self
        } else {
            *self * (1.0 / len)
        }
    }

    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn distance(&self, other: Vec3) -> f64 {
        (*self - other).length()
    }

    pub fn block(&self) -> BlockPos {
        BlockPos {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, k: f64) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }
}

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> BlockPos {
        BlockPos::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Minimum corner of the block.
    pub fn corner(&self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    pub fn chunk(&self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorProfile {
    pub id: ActorId,
    pub name: String,
    pub world: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    pub world: String,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Degrees, host convention (0 = +z, 90 = -x).
    pub yaw: f64,
    /// Degrees, positive looks down.
    pub pitch: f64,
    pub eye_height: f64,
    pub on_ground: bool,
    pub health: f64,
    pub food_level: i32,
    /// `None` when the host exposes no armor attribute.
    pub armor: Option<f64>,
    pub held_slot: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockInfo {
    /// Host material identifier, not yet normalized.
    pub material: String,
    pub solid: bool,
    pub flammable: bool,
    pub sky_light: u8,
    pub block_light: u8,
    /// Opaque block-state string.
    pub data: String,
}

impl BlockInfo {
    pub fn air() -> Self {
        Self {
            material: "AIR".into(),
            solid: false,
            flammable: false,
            sky_light: 15,
            block_light: 0,
            data: "minecraft:air".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub entity_id: i64,
    pub uuid: ActorId,
    pub name: String,
    pub kind: String,
    pub is_actor: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub block: BlockPos,
    pub material: String,
    /// Exact intersection point, when the host reports one.
    pub hit_position: Option<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldInfo {
    pub storm: bool,
    pub thundering: bool,
    /// Total elapsed world ticks.
    pub full_time: i64,
    /// Time of day in ticks.
    pub time: i64,
    pub environment: String,
    pub min_height: i32,
    pub max_height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiomeInfo {
    pub name: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub material: String,
    pub amount: u32,
    /// Numeric material code reported as the item `type`.
    pub type_code: u32,
}

impl ItemStack {
    pub fn is_air(&self) -> bool {
        normalize_name(&self.material) == "air"
    }
}

pub trait EnvironmentQuery: Send + Sync {
    fn online_actors(&self) -> Vec<ActorProfile>;

    fn actor_state(&self, actor: &ActorId) -> Result<ActorState, QueryError>;

    fn block_at(&self, world: &str, pos: BlockPos) -> Result<BlockInfo, QueryError>;

    /// Entities inside the cube of half-extent `distance` around the actor.
    /// May include the actor itself.
    fn nearby_entities(&self, actor: &ActorId, distance: f64) -> Result<Vec<EntityInfo>, QueryError>;

    /// First solid block along the ray, if any within `max_distance`.
    fn ray_cast_block(
        &self,
        world: &str,
        origin: Vec3,
        direction: Vec3,
        max_distance: f64,
    ) -> Result<Option<RayHit>, QueryError>;

    /// Living entity the actor is looking at within `max_distance`.
    fn target_entity(&self, actor: &ActorId, max_distance: f64) -> Result<Option<EntityInfo>, QueryError>;

    fn world_info(&self, world: &str) -> Result<WorldInfo, QueryError>;

    fn biome_at(&self, world: &str, pos: BlockPos) -> Result<BiomeInfo, QueryError>;

    /// Slot-indexed inventory contents; `None` marks an empty slot.
    fn inventory(&self, actor: &ActorId) -> Result<Vec<Option<ItemStack>>, QueryError>;

    fn chunk_loaded(&self, world: &str, chunk_x: i32, chunk_z: i32) -> Result<bool, QueryError>;
}

/// Canonical material/type name: trimmed and lowercase (`GRASS_BLOCK` -> `grass_block`).
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}
