use pov_recorder::kernel::event::{ActionLabel, ActorId, HostEvent};
use pov_recorder::Value;

#[test]
fn test_block_events_normalize_material() {
    let actor = ActorId::new_v4();
    let action = HostEvent::BlockBreak { actor, block: "GRASS_BLOCK".into() }.into_action().unwrap();

    assert_eq!(action.actor, actor);
    assert_eq!(action.label, ActionLabel::BreakBlock);
    assert_eq!(action.success, Some(true));
    assert_eq!(action.metadata.get("block"), Some(&Value::from("grass_block")));

    let placed = HostEvent::BlockPlace { actor, block: " Oak_Planks ".into() }.into_action().unwrap();
    assert_eq!(placed.label, ActionLabel::PlaceBlock);
    assert_eq!(placed.metadata.get("block"), Some(&Value::from("oak_planks")));
}

#[test]
fn test_interact_records_clicked_block_when_present() {
    let actor = ActorId::new_v4();
    let with_block = HostEvent::Interact {
        actor,
        interaction: "RIGHT_CLICK_BLOCK".into(),
        clicked_block: Some("CHEST".into()),
    }
    .into_action()
    .unwrap();
    assert_eq!(with_block.label, ActionLabel::Interact);
    assert_eq!(with_block.metadata.keys().collect::<Vec<_>>(), ["interaction", "block"]);
    assert_eq!(with_block.metadata.get("block"), Some(&Value::from("chest")));

    let in_air = HostEvent::Interact { actor, interaction: "RIGHT_CLICK_AIR".into(), clicked_block: None }
        .into_action()
        .unwrap();
    assert!(!in_air.metadata.contains_key("block"));
}

#[test]
fn test_toggle_events_pick_direction() {
    let actor = ActorId::new_v4();
    let labels: Vec<ActionLabel> = [
        HostEvent::ToggleSprint { actor, sprinting: true },
        HostEvent::ToggleSprint { actor, sprinting: false },
        HostEvent::ToggleSneak { actor, sneaking: true },
        HostEvent::ToggleSneak { actor, sneaking: false },
    ]
    .into_iter()
    .filter_map(|e| e.into_action().map(|a| a.label))
    .collect();

    assert_eq!(
        labels,
        [ActionLabel::StartSprint, ActionLabel::StopSprint, ActionLabel::StartSneak, ActionLabel::StopSneak]
    );
}

#[test]
fn test_consume_is_eat() {
    let actor = ActorId::new_v4();
    let action = HostEvent::ItemConsume { actor, item: "COOKED_BEEF".into() }.into_action().unwrap();
    assert_eq!(action.label, ActionLabel::Eat);
    assert_eq!(action.metadata.get("item"), Some(&Value::from("cooked_beef")));
}

#[test]
fn test_damage_by_actor_is_attack() {
    let actor = ActorId::new_v4();
    let action = HostEvent::DamageByEntity {
        damager: Some(actor),
        target_kind: "ZOMBIE".into(),
        damage: 4.123456,
    }
    .into_action()
    .unwrap();

    assert_eq!(action.actor, actor);
    assert_eq!(action.label, ActionLabel::Attack);
    assert_eq!(action.metadata.get("target"), Some(&Value::from("zombie")));
    assert_eq!(action.metadata.get("damage"), Some(&Value::Float(4.1235)));
}

#[test]
fn test_damage_by_non_actor_is_ignored() {
    let event = HostEvent::DamageByEntity { damager: None, target_kind: "PLAYER".into(), damage: 2.0 };
    assert!(event.into_action().is_none());
}

#[test]
fn test_label_wire_names() {
    assert_eq!(ActionLabel::Idle.as_str(), "OBSERVER_IDLE");
    assert_eq!(serde_json::to_string(&ActionLabel::Idle).unwrap(), r#""OBSERVER_IDLE""#);
    assert_eq!(serde_json::to_string(&ActionLabel::StartSneak).unwrap(), r#""START_SNEAK""#);
    assert_eq!(ActionLabel::BreakBlock.to_string(), "BREAK_BLOCK");
}
