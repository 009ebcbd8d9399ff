use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;

use super::blocks::{block_name, scan_neighborhood};
use super::types::{ActorSnapshot, BiomeRow, EntityRow, HeightLimits, ItemRow, LightLevel, TelemetrySnapshot};
use super::view::{gaze_direction, resolve_view, round_vec};
use super::{round4, world};
use crate::kernel::action::ActionRecord;
use crate::kernel::event::ActorId;
use crate::kernel::query::{
    normalize_name, ActorProfile, EntityInfo, EnvironmentQuery, ItemStack, QueryError, Vec3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    pub line_of_sight_max_distance: u32,
    pub nearby_block_radius: u32,
    pub nearby_entity_distance: u32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            line_of_sight_max_distance: 8,
            nearby_block_radius: 2,
            nearby_entity_distance: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("state of actor {actor} unavailable: {source}")]
    ActorState {
        actor: ActorId,
        #[source]
        source: QueryError,
    },
}

/// Builds one [`TelemetrySnapshot`] from read-only environment queries.
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    config: AssemblerConfig,
}

impl SnapshotAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Only the actor's own state is essential; every other lookup degrades
    /// to a null or empty field.
    pub fn assemble(
        &self,
        env: &dyn EnvironmentQuery,
        actor: &ActorProfile,
        action: ActionRecord,
        now_ms: i64,
    ) -> Result<TelemetrySnapshot, AssembleError> {
        let me = env.actor_state(&actor.id).map_err(|source| AssembleError::ActorState {
            actor: actor.id,
            source,
        })?;
        let world_name = me.world.as_str();
        let feet = me.position.block();

        let direction = gaze_direction(me.yaw, me.pitch);
        let eye = me.position + Vec3::new(0.0, me.eye_height, 0.0);

        let slots = lookup(env.inventory(&actor.id), "inventory");
        let held_item = slots.as_deref().map(|slots| held_row(slots, me.held_slot));
        let slots = slots.unwrap_or_default();

        let world_info = lookup(env.world_info(world_name), "world attributes");
        let biome = lookup(env.biome_at(world_name, feet), "biome");
        let here = lookup(env.block_at(world_name, feet), "block at actor");

        let state = ActorSnapshot {
            position: round_vec(me.position),
            velocity: round_vec(me.velocity),
            yaw: round4(me.yaw),
            pitch: round4(me.pitch),
            on_ground: me.on_ground,
            health: round4(me.health),
            hunger: me.food_level,
            armor: round4(me.armor.unwrap_or(0.0)),
            held_item,
            selected_slot: me.held_slot,
            inventory: map_inventory(&slots),
            block_below: block_name(env, world_name, (me.position - Vec3::new(0.0, 1.0, 0.0)).block()),
            block_front: block_name(env, world_name, (me.position + direction.normalize()).block()),
            nearby_blocks: scan_neighborhood(env, world_name, me.position, self.config.nearby_block_radius),
            nearby_entities: self.nearby_entities(env, &actor.id),
            view: resolve_view(
                env,
                &actor.id,
                world_name,
                eye,
                direction,
                f64::from(self.config.line_of_sight_max_distance),
            ),
            weather: world::weather(world_info.as_ref(), biome.as_ref()),
            time_of_day: world_info.as_ref().map(world::time_of_day),
            biome: biome.map(|b| BiomeRow {
                name: normalize_name(&b.name),
                temperature: round4(b.temperature),
            }),
            dimension: world_info.as_ref().map(|w| normalize_name(&w.environment)),
            height_limits: world_info.as_ref().map(|w| HeightLimits {
                floor: w.min_height,
                ceiling: w.max_height,
            }),
            chunk_region: world::chunk_region(env, world_name, feet),
            light_level: here.map(|b| LightLevel {
                sky: b.sky_light,
                block: b.block_light,
            }),
        };

        Ok(TelemetrySnapshot {
            timestamp: iso_timestamp(now_ms),
            timestamp_ms: now_ms,
            actor: actor.clone(),
            state,
            action,
        })
    }

    fn nearby_entities(&self, env: &dyn EnvironmentQuery, actor: &ActorId) -> Vec<EntityRow> {
        let distance = f64::from(self.config.nearby_entity_distance);
        lookup(env.nearby_entities(actor, distance), "nearby entities")
            .unwrap_or_default()
            .iter()
            .filter(|e| e.uuid != *actor)
            .map(entity_row)
            .collect()
    }
}

fn lookup<T>(result: Result<T, QueryError>, what: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(err) => {
            debug!(%err, "{} lookup failed, reporting as missing", what);
            None
        }
    }
}

fn map_inventory(slots: &[Option<ItemStack>]) -> Vec<ItemRow> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(slot, item)| {
            let item = item.as_ref().filter(|i| !i.is_air())?;
            Some(item_row(item, slot))
        })
        .collect()
}

/// An empty hand is reported as an air stack of count zero.
fn held_row(slots: &[Option<ItemStack>], held_slot: usize) -> ItemRow {
    match slots.get(held_slot).and_then(Option::as_ref).filter(|item| !item.is_air()) {
        Some(item) => item_row(item, held_slot),
        None => ItemRow {
            name: "air".to_string(),
            count: 0,
            slot: held_slot,
            type_code: 0,
        },
    }
}

fn item_row(item: &ItemStack, slot: usize) -> ItemRow {
    ItemRow {
        name: normalize_name(&item.material),
        count: item.amount,
        slot,
        type_code: item.type_code,
    }
}

fn entity_row(entity: &EntityInfo) -> EntityRow {
    EntityRow {
        id: entity.entity_id,
        name: entity.name.clone(),
        kind: normalize_name(&entity.kind),
        is_player: entity.is_actor,
        position: round_vec(entity.position),
        velocity: round_vec(entity.velocity),
        yaw: round4(entity.yaw),
        pitch: round4(entity.pitch),
        on_ground: entity.on_ground,
    }
}

fn iso_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
