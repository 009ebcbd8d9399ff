use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::query::normalize_name;
use super::snapshot::round4;
use super::value::ValueMap;

/// Stable identity of an actor in the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new_v4() -> Self {
        ActorId(Uuid::new_v4())
    }
}

impl From<Uuid> for ActorId {
    fn from(id: Uuid) -> Self {
        ActorId(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionLabel {
    BreakBlock,
    PlaceBlock,
    Interact,
    Eat,
    StartSprint,
    StopSprint,
    StartSneak,
    StopSneak,
    Attack,
    /// Nothing current: no action recorded, or the last one expired.
    #[serde(rename = "OBSERVER_IDLE")]
    Idle,
}

impl ActionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionLabel::BreakBlock => "BREAK_BLOCK",
            ActionLabel::PlaceBlock => "PLACE_BLOCK",
            ActionLabel::Interact => "INTERACT",
            ActionLabel::Eat => "EAT",
            ActionLabel::StartSprint => "START_SPRINT",
            ActionLabel::StopSprint => "STOP_SPRINT",
            ActionLabel::StartSneak => "START_SNEAK",
            ActionLabel::StopSneak => "STOP_SNEAK",
            ActionLabel::Attack => "ATTACK",
            ActionLabel::Idle => "OBSERVER_IDLE",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete action attributed to one actor, ready for the register.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub actor: ActorId,
    pub label: ActionLabel,
    pub success: Option<bool>,
    pub metadata: ValueMap,
}

/// Notifications the host delivers, in host terms.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    BlockBreak { actor: ActorId, block: String },
    BlockPlace { actor: ActorId, block: String },
    Interact { actor: ActorId, interaction: String, clicked_block: Option<String> },
    ItemConsume { actor: ActorId, item: String },
    ToggleSprint { actor: ActorId, sprinting: bool },
    ToggleSneak { actor: ActorId, sneaking: bool },
    /// `damager` is `None` when the damage source is not an actor.
    DamageByEntity { damager: Option<ActorId>, target_kind: String, damage: f64 },
}

impl HostEvent {
    /// Maps a host notification to the action it represents, if any.
    pub fn into_action(self) -> Option<ActionEvent> {
        let (actor, label, metadata) = match self {
            HostEvent::BlockBreak { actor, block } => (
                actor,
                ActionLabel::BreakBlock,
                ValueMap::new().with("block", normalize_name(&block)),
            ),
            HostEvent::BlockPlace { actor, block } => (
                actor,
                ActionLabel::PlaceBlock,
                ValueMap::new().with("block", normalize_name(&block)),
            ),
            HostEvent::Interact { actor, interaction, clicked_block } => {
                let mut metadata = ValueMap::new().with("interaction", interaction);
                if let Some(block) = clicked_block {
                    metadata.insert("block", normalize_name(&block));
                }
                (actor, ActionLabel::Interact, metadata)
            }
            HostEvent::ItemConsume { actor, item } => (
                actor,
                ActionLabel::Eat,
                ValueMap::new().with("item", normalize_name(&item)),
            ),
            HostEvent::ToggleSprint { actor, sprinting } => (
                actor,
                if sprinting { ActionLabel::StartSprint } else { ActionLabel::StopSprint },
                ValueMap::new().with("sprinting", sprinting),
            ),
            HostEvent::ToggleSneak { actor, sneaking } => (
                actor,
                if sneaking { ActionLabel::StartSneak } else { ActionLabel::StopSneak },
                ValueMap::new().with("sneaking", sneaking),
            ),
            HostEvent::DamageByEntity { damager, target_kind, damage } => {
                let actor = damager?;
                let metadata = ValueMap::new()
                    .with("target", normalize_name(&target_kind))
                    .with("damage", round4(damage));
                (actor, ActionLabel::Attack, metadata)
            }
        };

        Some(ActionEvent {
            actor,
            label,
            success: Some(true),
            metadata,
        })
    }
}

/// Messages accepted by the sampling loop.
#[derive(Debug, Clone)]
pub enum Event {
    Action(ActionEvent),
    /// Host notification; `cancelled` ones are dropped.
    Host { event: HostEvent, cancelled: bool },
}
