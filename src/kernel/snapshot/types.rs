use crate::kernel::action::ActionRecord;
use crate::kernel::query::{ActorProfile, BlockPos, Vec3};
use crate::kernel::value::{Value, ValueMap};

/// One fully assembled sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// ISO-8601 UTC, millisecond precision.
    pub timestamp: String,
    pub timestamp_ms: i64,
    pub actor: ActorProfile,
    pub state: ActorSnapshot,
    pub action: ActionRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub on_ground: bool,
    pub health: f64,
    pub hunger: i32,
    pub armor: f64,
    pub held_item: Option<ItemRow>,
    pub selected_slot: usize,
    pub inventory: Vec<ItemRow>,
    pub block_below: Option<String>,
    pub block_front: Option<String>,
    pub nearby_blocks: Vec<BlockRow>,
    pub nearby_entities: Vec<EntityRow>,
    pub view: ViewSnapshot,
    pub weather: Weather,
    pub time_of_day: Option<TimeOfDay>,
    pub biome: Option<BiomeRow>,
    pub dimension: Option<String>,
    pub height_limits: Option<HeightLimits>,
    pub chunk_region: ChunkRegion,
    pub light_level: Option<LightLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub name: String,
    pub count: u32,
    pub slot: usize,
    pub type_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightLevel {
    pub sky: u8,
    pub block: u8,
}

/// One cell of the neighborhood scan. `block` is `None` when the lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub ndx: f64,
    pub ndy: f64,
    pub ndz: f64,
    pub block: Option<String>,
    pub data: Option<String>,
    pub fluid_type: Option<&'static str>,
    pub light_level: Option<LightLevel>,
    pub flammable: bool,
    pub breakable_by_hand: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub is_player: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f64,
    pub pitch: f64,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SightHit {
    pub name: String,
    pub distance: f64,
    pub position: BlockPos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraTarget {
    Entity { name: String, distance: f64, position: Vec3 },
    Block(SightHit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub look_vector: Vec3,
    pub line_of_sight: Vec<SightHit>,
    pub camera_target: Option<CameraTarget>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Weather {
    pub rain: bool,
    pub thunder: bool,
    pub snow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub age: i64,
    pub day: i64,
    pub time: i64,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiomeRow {
    pub name: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightLimits {
    pub floor: i32,
    pub ceiling: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRegion {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub region_x: i32,
    pub region_z: i32,
    pub loaded: bool,
}

// Key names and order below are the wire format read by the training pipeline.

impl TelemetrySnapshot {
    pub fn to_value(&self) -> Value {
        let player = ValueMap::new()
            .with("name", self.actor.name.as_str())
            .with("uuid", self.actor.id.to_string())
            .with("world", self.actor.world.as_str());

        ValueMap::new()
            .with("timestamp", self.timestamp.as_str())
            .with("timestampMs", self.timestamp_ms)
            .with("player", player)
            .with("state", self.state.to_value())
            .with("action", self.action.to_value())
            .into()
    }
}

impl ActorSnapshot {
    pub fn to_value(&self) -> Value {
        let view = self.view.to_value();
        let line_of_sight = view.get("lineOfSight").cloned().unwrap_or(Value::List(Vec::new()));
        let camera_target = view.get("cameraTarget").cloned().unwrap_or(Value::Null);
        let look_target = view.get("lookVector").cloned().unwrap_or(Value::Null);

        let time_of_day = match &self.time_of_day {
            Some(t) => ValueMap::new()
                .with("age", t.age)
                .with("day", t.day)
                .with("time", t.time)
                .with("isDay", t.is_day),
            None => null_fields(&["age", "day", "time", "isDay"]),
        };

        let biome = match &self.biome {
            Some(b) => ValueMap::new()
                .with("id", b.name.as_str())
                .with("name", b.name.as_str())
                .with("category", "minecraft")
                .with("temperature", b.temperature)
                .with("rainfall", Value::Null),
            None => null_fields(&["id", "name", "category", "temperature", "rainfall"]),
        };

        let height_limits = match &self.height_limits {
            Some(h) => ValueMap::new().with("floor", h.floor).with("ceiling", h.ceiling),
            None => null_fields(&["floor", "ceiling"]),
        };

        let c = &self.chunk_region;
        let chunk_region = ValueMap::new()
            .with("chunkX", c.chunk_x)
            .with("chunkZ", c.chunk_z)
            .with("regionX", c.region_x)
            .with("regionZ", c.region_z)
            .with("loaded", c.loaded);

        ValueMap::new()
            .with("position", xyz(self.position))
            .with("velocity", velocity(self.velocity))
            .with("yaw", self.yaw)
            .with("pitch", self.pitch)
            .with("onGround", self.on_ground)
            .with("health", self.health)
            .with("hunger", self.hunger)
            .with("armor", self.armor)
            .with("heldItem", self.held_item.as_ref().map(ItemRow::to_value))
            .with("selectedHotbarSlot", self.selected_slot)
            .with("inventory", self.inventory.iter().map(ItemRow::to_value).collect::<Vec<_>>())
            .with("blockBelow", self.block_below.clone())
            .with("blockFront", self.block_front.clone())
            .with("nearbyBlocksRaw", self.nearby_blocks.iter().map(BlockRow::to_value).collect::<Vec<_>>())
            .with("nearbyEntities", self.nearby_entities.iter().map(EntityRow::to_value).collect::<Vec<_>>())
            .with("view", view)
            .with("lineOfSight", line_of_sight)
            .with("cameraTarget", camera_target)
            .with("playerLookTarget", look_target)
            .with(
                "weather",
                ValueMap::new()
                    .with("rain", self.weather.rain)
                    .with("thunder", self.weather.thunder)
                    .with("snow", self.weather.snow),
            )
            .with("timeOfDay", time_of_day)
            .with("biome", biome)
            .with("dimension", self.dimension.clone())
            .with("heightLimits", height_limits)
            .with("chunkRegion", chunk_region)
            .with("lightLevel", light(self.light_level))
            .into()
    }
}

impl ItemRow {
    pub fn to_value(&self) -> Value {
        // Durability and enchantments are not resolved; the keys stay for shape.
        ValueMap::new()
            .with("name", self.name.as_str())
            .with("count", self.count)
            .with("slot", self.slot)
            .with("type", self.type_code)
            .with("metadata", 0)
            .with("durability", Value::Null)
            .with("enchantments", Value::List(Vec::new()))
            .into()
    }
}

impl BlockRow {
    pub fn to_value(&self) -> Value {
        ValueMap::new()
            .with("dx", self.dx)
            .with("dy", self.dy)
            .with("dz", self.dz)
            .with("ndx", self.ndx)
            .with("ndy", self.ndy)
            .with("ndz", self.ndz)
            .with("block", self.block.clone())
            .with("hardness", Value::Null)
            .with("metadata", self.data.clone())
            .with("fluidType", self.fluid_type)
            .with("fluidLevel", Value::Null)
            .with("lightLevel", light(self.light_level))
            .with(
                "tags",
                ValueMap::new()
                    .with("flammable", self.flammable)
                    .with("breakableByHand", self.breakable_by_hand),
            )
            .into()
    }
}

impl EntityRow {
    pub fn to_value(&self) -> Value {
        ValueMap::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
            .with("type", self.kind.as_str())
            .with("distance", Value::Null)
            .with("isPlayer", self.is_player)
            .with("hostile", false)
            .with("position", xyz(self.position))
            .with("velocity", velocity(self.velocity))
            .with("yaw", self.yaw)
            .with("pitch", self.pitch)
            .with("onGround", self.on_ground)
            .with("heldItem", Value::Null)
            .with("projectile", Value::Null)
            .into()
    }
}

impl SightHit {
    pub fn to_value(&self) -> Value {
        ValueMap::new()
            .with("type", "block")
            .with("name", self.name.as_str())
            .with("distance", self.distance)
            .with("position", block_xyz(self.position))
            .into()
    }
}

impl CameraTarget {
    pub fn to_value(&self) -> Value {
        match self {
            CameraTarget::Entity { name, distance, position } => ValueMap::new()
                .with("type", "entity")
                .with("name", name.as_str())
                .with("distance", *distance)
                .with("position", xyz(*position))
                .into(),
            CameraTarget::Block(hit) => hit.to_value(),
        }
    }
}

impl ViewSnapshot {
    pub fn to_value(&self) -> Value {
        ValueMap::new()
            .with("lookVector", xyz(self.look_vector))
            .with("lineOfSight", self.line_of_sight.iter().map(SightHit::to_value).collect::<Vec<_>>())
            .with("cameraTarget", self.camera_target.as_ref().map(CameraTarget::to_value))
            .into()
    }
}

fn xyz(v: Vec3) -> ValueMap {
    ValueMap::new().with("x", v.x).with("y", v.y).with("z", v.z)
}

fn velocity(v: Vec3) -> ValueMap {
    ValueMap::new().with("vx", v.x).with("vy", v.y).with("vz", v.z)
}

fn block_xyz(p: BlockPos) -> ValueMap {
    ValueMap::new().with("x", p.x).with("y", p.y).with("z", p.z)
}

fn light(level: Option<LightLevel>) -> ValueMap {
    match level {
        Some(l) => ValueMap::new().with("skyLight", u32::from(l.sky)).with("blockLight", u32::from(l.block)),
        None => null_fields(&["skyLight", "blockLight"]),
    }
}

fn null_fields(keys: &[&str]) -> ValueMap {
    keys.iter().map(|k| (*k, Value::Null)).collect()
}
