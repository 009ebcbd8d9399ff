//! In-memory environment for the demo driver and tests.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::kernel::event::ActorId;
use crate::kernel::query::{
    ActorProfile, ActorState, BiomeInfo, BlockInfo, BlockPos, EntityInfo, EnvironmentQuery, ItemStack,
    QueryError, RayHit, Vec3, WorldInfo,
};

const RAY_STEP: f64 = 0.05;
/// How far off the gaze ray an entity may sit and still count as targeted.
const TARGET_TOLERANCE: f64 = 0.8;

/// Lookups that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    ActorState,
    Blocks,
    Entities,
    RayCast,
    TargetEntity,
    World,
    Biome,
    Inventory,
    Chunk,
}

#[derive(Debug, Clone)]
pub struct SimActor {
    pub profile: ActorProfile,
    pub entity_id: i64,
    pub state: ActorState,
    pub inventory: Vec<Option<ItemStack>>,
    pub online: bool,
}

#[derive(Debug, Clone)]
struct SimWorldData {
    info: WorldInfo,
    biome: BiomeInfo,
    /// Solid ground fills every y below this level.
    floor_y: Option<i32>,
}

#[derive(Debug, Default)]
struct SimState {
    actors: Vec<SimActor>,
    worlds: HashMap<String, SimWorldData>,
    blocks: HashMap<(String, BlockPos), BlockInfo>,
    entities: Vec<(String, EntityInfo)>,
    failing: HashSet<Lookup>,
}

#[derive(Debug, Default)]
pub struct SimWorld {
    state: RwLock<SimState>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flat overworld named `world` with ground up to y = 63, one actor
    /// named `name` standing on it, a stone pillar ahead and a zombie beside it.
    pub fn demo(name: &str) -> (Self, ActorId) {
        let sim = SimWorld::new();
        sim.add_world("world", overworld(), BiomeInfo { name: "PLAINS".into(), temperature: 0.8 }, Some(64));

        let id = ActorId::new_v4();
        sim.add_actor(
            ActorProfile { id, name: name.to_string(), world: "world".into() },
            standing_at(Vec3::new(0.5, 64.0, 0.5)),
        );
        sim.set_inventory(
            &id,
            vec![
                Some(item("DIAMOND_PICKAXE", 1, 1)),
                None,
                Some(item("COOKED_BEEF", 12, 2)),
            ],
        );
        for y in 64..67 {
            sim.set_block("world", BlockPos::new(0, y, 4), solid("STONE"));
        }
        sim.add_entity("world", zombie(42, Vec3::new(3.5, 64.0, 2.5)));
        (sim, id)
    }

    pub fn add_world(&self, name: &str, info: WorldInfo, biome: BiomeInfo, floor_y: Option<i32>) {
        self.state
            .write()
            .worlds
            .insert(name.to_string(), SimWorldData { info, biome, floor_y });
    }

    pub fn update_world(&self, name: &str, f: impl FnOnce(&mut WorldInfo, &mut BiomeInfo)) {
        if let Some(world) = self.state.write().worlds.get_mut(name) {
            f(&mut world.info, &mut world.biome);
        }
    }

    pub fn add_actor(&self, profile: ActorProfile, state: ActorState) {
        let mut guard = self.state.write();
        let entity_id = 1000 + guard.actors.len() as i64;
        let state = ActorState { world: profile.world.clone(), ..state };
        guard.actors.push(SimActor {
            profile,
            entity_id,
            state,
            inventory: Vec::new(),
            online: true,
        });
    }

    pub fn update_actor(&self, id: &ActorId, f: impl FnOnce(&mut ActorState)) {
        if let Some(actor) = self.state.write().actors.iter_mut().find(|a| a.profile.id == *id) {
            f(&mut actor.state);
        }
    }

    pub fn set_online(&self, id: &ActorId, online: bool) {
        if let Some(actor) = self.state.write().actors.iter_mut().find(|a| a.profile.id == *id) {
            actor.online = online;
        }
    }

    pub fn set_inventory(&self, id: &ActorId, slots: Vec<Option<ItemStack>>) {
        if let Some(actor) = self.state.write().actors.iter_mut().find(|a| a.profile.id == *id) {
            actor.inventory = slots;
        }
    }

    pub fn set_block(&self, world: &str, pos: BlockPos, block: BlockInfo) {
        self.state.write().blocks.insert((world.to_string(), pos), block);
    }

    pub fn add_entity(&self, world: &str, entity: EntityInfo) {
        self.state.write().entities.push((world.to_string(), entity));
    }

    pub fn fail(&self, lookup: Lookup) {
        self.state.write().failing.insert(lookup);
    }

    pub fn heal(&self, lookup: Lookup) {
        self.state.write().failing.remove(&lookup);
    }
}

impl SimState {
    fn check(&self, lookup: Lookup) -> Result<(), QueryError> {
        if self.failing.contains(&lookup) {
            Err(QueryError::Host(format!("{:?} lookup forced to fail", lookup)))
        } else {
            Ok(())
        }
    }

    fn actor(&self, id: &ActorId) -> Result<&SimActor, QueryError> {
        self.actors
            .iter()
            .find(|a| a.profile.id == *id && a.online)
            .ok_or(QueryError::ActorOffline(*id))
    }

    fn world(&self, name: &str) -> Result<&SimWorldData, QueryError> {
        self.worlds.get(name).ok_or_else(|| QueryError::Unavailable {
            what: format!("world {}", name),
        })
    }

    fn block(&self, world: &str, pos: BlockPos) -> BlockInfo {
        if let Some(block) = self.blocks.get(&(world.to_string(), pos)) {
            return block.clone();
        }
        match self.worlds.get(world).and_then(|w| w.floor_y) {
            Some(floor) if pos.y < floor - 1 => solid("DIRT"),
            Some(floor) if pos.y == floor - 1 => solid("GRASS_BLOCK"),
            _ => BlockInfo::air(),
        }
    }

    /// Online actors and plain entities in `world`, as entities.
    fn all_entities(&self, world: &str) -> Vec<EntityInfo> {
        let actors = self
            .actors
            .iter()
            .filter(|a| a.online && a.profile.world == world)
            .map(|a| EntityInfo {
                entity_id: a.entity_id,
                uuid: a.profile.id,
                name: a.profile.name.clone(),
                kind: "PLAYER".into(),
                is_actor: true,
                position: a.state.position,
                velocity: a.state.velocity,
                yaw: a.state.yaw,
                pitch: a.state.pitch,
                on_ground: a.state.on_ground,
            });
        let others = self
            .entities
            .iter()
            .filter(|(w, _)| w == world)
            .map(|(_, e)| e.clone());
        actors.chain(others).collect()
    }
}

impl EnvironmentQuery for SimWorld {
    fn online_actors(&self) -> Vec<ActorProfile> {
        self.state
            .read()
            .actors
            .iter()
            .filter(|a| a.online)
            .map(|a| a.profile.clone())
            .collect()
    }

    fn actor_state(&self, actor: &ActorId) -> Result<ActorState, QueryError> {
        let state = self.state.read();
        state.check(Lookup::ActorState)?;
        Ok(state.actor(actor)?.state.clone())
    }

    fn block_at(&self, world: &str, pos: BlockPos) -> Result<BlockInfo, QueryError> {
        let state = self.state.read();
        state.check(Lookup::Blocks)?;
        state.world(world)?;
        Ok(state.block(world, pos))
    }

    fn nearby_entities(&self, actor: &ActorId, distance: f64) -> Result<Vec<EntityInfo>, QueryError> {
        let state = self.state.read();
        state.check(Lookup::Entities)?;
        let me = state.actor(actor)?;
        let center = me.state.position;
        Ok(state
            .all_entities(&me.profile.world)
            .into_iter()
            .filter(|e| {
                let d = e.position - center;
                d.x.abs() <= distance && d.y.abs() <= distance && d.z.abs() <= distance
            })
            .collect())
    }

    fn ray_cast_block(
        &self,
        world: &str,
        origin: Vec3,
        direction: Vec3,
        max_distance: f64,
    ) -> Result<Option<RayHit>, QueryError> {
        let state = self.state.read();
        state.check(Lookup::RayCast)?;
        state.world(world)?;
        let dir = direction.normalize();
        let steps = (max_distance / RAY_STEP).floor() as u64;
        for i in 0..=steps {
            let point = origin + dir * (i as f64 * RAY_STEP);
            let pos = point.block();
            let block = state.block(world, pos);
            if block.solid {
                return Ok(Some(RayHit {
                    block: pos,
                    material: block.material,
                    hit_position: Some(point),
                }));
            }
        }
        Ok(None)
    }

    fn target_entity(&self, actor: &ActorId, max_distance: f64) -> Result<Option<EntityInfo>, QueryError> {
        let state = self.state.read();
        state.check(Lookup::TargetEntity)?;
        let me = state.actor(actor)?;
        let eye = me.state.position + Vec3::new(0.0, me.state.eye_height, 0.0);
        let dir = crate::kernel::snapshot::view::gaze_direction(me.state.yaw, me.state.pitch);

        let mut best: Option<(f64, EntityInfo)> = None;
        for entity in state.all_entities(&me.profile.world) {
            if entity.uuid == *actor {
                continue;
            }
            let to = entity.position - eye;
            let along = to.dot(dir);
            if along <= 0.0 || along > max_distance {
                continue;
            }
            let off_axis = (to - dir * along).length();
            if off_axis <= TARGET_TOLERANCE && best.as_ref().map_or(true, |(d, _)| along < *d) {
                best = Some((along, entity));
            }
        }
        Ok(best.map(|(_, e)| e))
    }

    fn world_info(&self, world: &str) -> Result<WorldInfo, QueryError> {
        let state = self.state.read();
        state.check(Lookup::World)?;
        Ok(state.world(world)?.info.clone())
    }

    fn biome_at(&self, world: &str, _pos: BlockPos) -> Result<BiomeInfo, QueryError> {
        let state = self.state.read();
        state.check(Lookup::Biome)?;
        Ok(state.world(world)?.biome.clone())
    }

    fn inventory(&self, actor: &ActorId) -> Result<Vec<Option<ItemStack>>, QueryError> {
        let state = self.state.read();
        state.check(Lookup::Inventory)?;
        Ok(state.actor(actor)?.inventory.clone())
    }

    fn chunk_loaded(&self, world: &str, _chunk_x: i32, _chunk_z: i32) -> Result<bool, QueryError> {
        let state = self.state.read();
        state.check(Lookup::Chunk)?;
        state.world(world)?;
        Ok(true)
    }
}

pub fn overworld() -> WorldInfo {
    WorldInfo {
        storm: false,
        thundering: false,
        full_time: 1000,
        time: 1000,
        environment: "NORMAL".into(),
        min_height: -64,
        max_height: 320,
    }
}

/// Actor standing still on the ground at `position`, facing +z.
pub fn standing_at(position: Vec3) -> ActorState {
    ActorState {
        world: String::new(),
        position,
        velocity: Vec3::default(),
        yaw: 0.0,
        pitch: 0.0,
        eye_height: 1.62,
        on_ground: true,
        health: 20.0,
        food_level: 20,
        armor: None,
        held_slot: 0,
    }
}

pub fn solid(material: &str) -> BlockInfo {
    BlockInfo {
        material: material.to_string(),
        solid: true,
        flammable: false,
        sky_light: 0,
        block_light: 0,
        data: format!("minecraft:{}", material.to_lowercase()),
    }
}

pub fn item(material: &str, amount: u32, type_code: u32) -> ItemStack {
    ItemStack {
        material: material.to_string(),
        amount,
        type_code,
    }
}

pub fn zombie(entity_id: i64, position: Vec3) -> EntityInfo {
    EntityInfo {
        entity_id,
        uuid: ActorId::new_v4(),
        name: "Zombie".into(),
        kind: "ZOMBIE".into(),
        is_actor: false,
        position,
        velocity: Vec3::default(),
        yaw: 0.0,
        pitch: 0.0,
        on_ground: true,
    }
}
