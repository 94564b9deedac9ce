//! End-to-end tests of selection, commands, continuations and turn handoff.

use tactics_core::prelude::*;
use tactics_test_utils::fixtures::{run_until_idle, spawn_at, BattleBuilder, InputScript};

fn events_of(orchestrator: &mut Orchestrator) -> Vec<BattleEvent> {
    orchestrator.drain_events()
}

// =============================================================================
// Path construction scenarios
// =============================================================================

#[test]
fn test_budget_two_allows_exactly_two_steps() {
    let battle = BattleBuilder::new(12, 12)
        .spawn(ActorSpawn {
            stats: ActorStats {
                move_budget: 2,
                ..ActorStats::default()
            },
            ..spawn_at(0, 1, 1)
        })
        .build();
    let actor = battle.actor(ActorId(0)).unwrap();
    let mut session = PathSession::begin(actor);
    assert!(session.append_translate(battle.grid(), Direction::Right));
    assert!(session.append_translate(battle.grid(), Direction::Right));
    assert!(!session.append_translate(battle.grid(), Direction::Right));
    assert_eq!(session.cumulative_cost(), 2);
    assert_eq!(session.current_pose().cell, CellCoord::new(3, 1));
}

#[test]
fn test_bar_footprint_fits_after_quarter_turn() {
    let mut grid = tactics_test_utils::fixtures::open_grid(12, 12);
    grid.set_passability(CellCoord::new(5, 6), Passability::Blocked);
    let bar = Footprint::new(1, 3).unwrap();
    let pivot = CellCoord::new(5, 5);

    assert!(!bar.fits(&grid, pivot, Rotation::IDENTITY));
    let turned = Rotation::from_quarter_turns(1);
    assert!(bar.fits(&grid, pivot, turned));
    let mut covered: Vec<CellCoord> = bar.covered_cells(pivot, turned).collect();
    covered.sort();
    assert_eq!(
        covered,
        vec![CellCoord::new(4, 5), CellCoord::new(5, 5), CellCoord::new(6, 5)]
    );
}

#[test]
fn test_bar_cannot_turn_onto_wall() {
    let battle = BattleBuilder::new(9, 9)
        .block(6, 5)
        .spawn(ActorSpawn {
            footprint: Footprint::new(1, 3).unwrap(),
            ..spawn_at(0, 5, 5)
        })
        .build();
    let actor = battle.actor(ActorId(0)).unwrap();
    let mut session = PathSession::begin(actor);
    // Either quarter turn lays the bar across (6,5).
    assert!(!session.append_rotate(battle.grid(), true));
    assert!(!session.append_rotate(battle.grid(), false));
    assert_eq!(session.steps().len(), 1);

    assert!(session.append_translate(battle.grid(), Direction::Left));
    assert!(session.append_rotate(battle.grid(), true));
    assert_eq!(
        session.current_pose(),
        Pose::new(CellCoord::new(4, 5), Rotation::from_quarter_turns(1))
    );
    assert_eq!(session.cumulative_cost(), 1);
}

// =============================================================================
// Turn handoff
// =============================================================================

#[test]
fn test_two_sides_one_move_each_hand_off_once() {
    let mut o = BattleBuilder::new(12, 12).actor(0, 1, 1).actor(1, 10, 10).orchestrate(Vec::new());
    let a = ActorId(0);
    let b = ActorId(1);
    assert_eq!(o.activity(), ActivityKind::Idle);

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert!(o.choose(MenuChoice::Action(ActionKind::Move)));
    InputScript::new()
        .dir(Direction::Right)
        .press(Button::Confirm)
        .idle(5)
        .run(&mut o);

    let battle = o.battle();
    assert_eq!(battle.actor(a).unwrap().pose.cell, CellCoord::new(2, 1));
    assert_eq!(battle.turns().handoffs(), 1);
    assert_eq!(battle.turns().active_side(), SideId(1));
    assert!(battle.turns().roster(SideId(0)).unwrap().pending().is_empty());
    let red = battle.turns().roster(SideId(1)).unwrap();
    assert_eq!(red.pending(), red.actors());
    assert_eq!(red.pending(), &[b]);
    let flags = battle.actor(b).unwrap().actions;
    assert!(!flags.is_spent());
    assert!(!flags.is_performing_action());
    assert!(ActionKind::ALL.iter().all(|kind| !flags.performed(*kind)));

    let banners = events_of(&mut o)
        .iter()
        .filter(|event| matches!(event, BattleEvent::TurnBanner { .. }))
        .count();
    // Opening banner plus exactly one handoff.
    assert_eq!(banners, 2);
}

#[test]
fn test_handoff_locks_input_until_banner_ends() {
    let timing = TimingConfig {
        banner_ticks: 3,
        ..TimingConfig::instant()
    };
    let mut o = BattleBuilder::new(8, 8).timing(timing).actor(0, 1, 1).actor(1, 6, 6).orchestrate(Vec::new());
    run_until_idle(&mut o, 10);

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert!(o.choose(MenuChoice::Wait));
    assert_eq!(o.activity(), ActivityKind::PassingTurn);
    assert!(o.is_input_locked());
    assert_eq!(o.cursor(), CellCoord::new(6, 6));

    o.tick(Some(InputEvent::direction(Direction::Left)));
    assert_eq!(o.cursor(), CellCoord::new(6, 6));
    assert!(!o.parse_command(CommandPayload::new(ActorId(1), Command::EndTurn)));

    run_until_idle(&mut o, 10);
    assert_eq!(o.activity(), ActivityKind::Idle);
    o.tick(Some(InputEvent::direction(Direction::Left)));
    assert_eq!(o.cursor(), CellCoord::new(5, 6));
}

#[test]
fn test_automated_side_plays_and_hands_back() {
    let mut o = BattleBuilder::new(12, 12)
        .actor(0, 1, 1)
        .actor(1, 8, 1)
        .orchestrate(vec![Box::new(MenuDelegate), Box::new(AdvancePolicy)]);

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert!(o.choose(MenuChoice::Wait));
    run_until_idle(&mut o, 5);
    for _ in 0..10 {
        o.tick(None);
    }

    let battle = o.battle();
    assert_eq!(battle.turns().handoffs(), 2);
    assert_eq!(battle.turns().turn(), 3);
    assert_eq!(battle.turns().active_side(), SideId(0));
    assert_eq!(battle.actor(ActorId(1)).unwrap().pose.cell, CellCoord::new(4, 1));
}

// =============================================================================
// Attacks
// =============================================================================

#[test]
fn test_signalled_attack_waits_for_presentation() {
    let timing = TimingConfig {
        presentation: PresentationMode::Signalled,
        ..TimingConfig::instant()
    };
    let mut o = BattleBuilder::new(8, 8).timing(timing).actor(0, 3, 3).actor(1, 3, 4).orchestrate(Vec::new());
    assert_eq!(o.activity(), ActivityKind::PassingTurn);
    assert!(o.presentation_complete());

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert!(o.choose(MenuChoice::Action(ActionKind::Attack)));
    let (owner, spaces) = o.shown_spaces().unwrap();
    assert_eq!(owner, ActorId(0));
    let valid: Vec<CellCoord> = spaces.iter().filter(|s| !s.invalid).map(|s| s.cell).collect();
    assert_eq!(valid, vec![CellCoord::new(3, 4)]);

    events_of(&mut o);
    InputScript::new().dir(Direction::Up).press(Button::Confirm).idle(4).run(&mut o);
    assert_eq!(o.activity(), ActivityKind::AwaitingAttack);
    assert_eq!(o.battle().actor(ActorId(1)).unwrap().health, 7);
    assert!(!o.battle().actor(ActorId(0)).unwrap().actions.performed(ActionKind::Attack));
    assert!(events_of(&mut o).contains(&BattleEvent::AttackResolved {
        attacker: ActorId(0),
        target: ActorId(1),
        damage: 3,
        remaining_health: 7,
    }));

    assert!(o.presentation_complete());
    assert!(o.battle().actor(ActorId(0)).unwrap().actions.performed(ActionKind::Attack));
    // Move is still on offer, so the actor is reselected into the menu.
    assert_eq!(
        o.focus(),
        Focus::Menu {
            depth: 1,
            pending: Some(ActorId(0))
        }
    );
}

#[test]
fn test_lethal_attack_ends_match() {
    let mut o = BattleBuilder::new(8, 8)
        .spawn(ActorSpawn {
            stats: ActorStats {
                attack_power: 10,
                ..ActorStats::default()
            },
            ..spawn_at(0, 3, 3)
        })
        .actor(1, 4, 3)
        .orchestrate(Vec::new());

    let attack = CommandPayload::new(ActorId(0), Command::Attack).with_target(CellCoord::new(4, 3));
    assert!(o.parse_command(attack));
    assert_eq!(o.outcome(), Some(Some(SideId(0))));
    assert_eq!(o.battle().actor_at(CellCoord::new(4, 3)).map(|a| a.id), None);
    assert!(o.battle().validate_occupancy().is_empty());
    assert!(!o.parse_command(CommandPayload::new(ActorId(0), Command::EndTurn)));

    let events = events_of(&mut o);
    assert!(events.contains(&BattleEvent::ActorDefeated { actor: ActorId(1) }));
    assert_eq!(events.last(), Some(&BattleEvent::MatchOver { winner: Some(SideId(0)) }));
}

#[test]
fn test_attack_on_empty_cell_is_rejected() {
    let mut o = BattleBuilder::new(8, 8).actor(0, 3, 3).actor(1, 3, 4).orchestrate(Vec::new());
    let miss = CommandPayload::new(ActorId(0), Command::Attack).with_target(CellCoord::new(2, 3));
    assert!(!o.parse_command(miss));
    assert!(!o.battle().is_performing_action(ActorId(0)));
    assert_eq!(o.battle().actor(ActorId(1)).unwrap().health, 10);
}

// =============================================================================
// Dispatch rules and continuations
// =============================================================================

#[test]
fn test_continuations_run_in_order_after_effect() {
    let mut o = BattleBuilder::new(8, 8).actor(0, 1, 1).actor(0, 2, 2).actor(1, 6, 6).orchestrate(Vec::new());
    events_of(&mut o);

    let payload = CommandPayload::new(ActorId(0), Command::GenerateMoveSpaces)
        .then(Continuation::Signal(1))
        .then(Continuation::Then(Box::new(CommandPayload::new(ActorId(0), Command::EndTurn))))
        .then(Continuation::Signal(2));
    assert!(o.parse_command(payload));

    let order: Vec<String> = events_of(&mut o)
        .into_iter()
        .filter_map(|event| match event {
            BattleEvent::CommandCompleted { command, .. } => Some(format!("{command:?}")),
            BattleEvent::Signal { marker, .. } => Some(format!("signal{marker}")),
            _ => None,
        })
        .collect();
    assert_eq!(order, ["GenerateMoveSpaces", "signal1", "EndTurn", "signal2"]);
    assert!(o.battle().actor(ActorId(0)).unwrap().actions.is_spent());
    // The other blue actor still owes its move, so no handoff yet.
    assert_eq!(o.battle().turns().handoffs(), 0);
    assert_eq!(o.battle().turns().active_roster().pending(), &[ActorId(1)]);
}

#[test]
fn test_other_actor_rejected_while_one_is_performing() {
    let mut o = BattleBuilder::new(8, 8).actor(0, 1, 1).actor(0, 3, 3).actor(1, 6, 6).orchestrate(Vec::new());
    assert!(o.parse_command(CommandPayload::new(ActorId(0), Command::InitializeMove)));
    assert_eq!(o.focus(), Focus::PathConstruction);
    assert!(!o.parse_command(CommandPayload::new(ActorId(1), Command::GenerateMoveSpaces)));
    assert!(!o.parse_command(CommandPayload::new(ActorId(1), Command::EndTurn)));

    assert!(o.parse_command(CommandPayload::new(ActorId(0), Command::Cancel)));
    assert_eq!(o.focus(), Focus::Neutral);
    assert!(o.battle().performing_actor().is_none());
    assert!(!o.battle().actor(ActorId(0)).unwrap().actions.performed(ActionKind::Move));
    assert!(o.parse_command(CommandPayload::new(ActorId(1), Command::GenerateMoveSpaces)));
}

/// Answers every decision by showing move spaces instead of opening a menu.
struct Inspector;

impl DecisionDelegate for Inspector {
    fn decide(&mut self, request: &DecisionRequest, _battle: &Battle) -> Decision {
        Decision::Command(CommandPayload::new(request.actor, Command::GenerateMoveSpaces).with_target(request.target))
    }
}

#[test]
fn test_confirm_on_shown_move_space_moves_there() {
    let mut o = BattleBuilder::new(8, 8).actor(0, 1, 1).actor(1, 6, 6).orchestrate(vec![Box::new(Inspector)]);

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert_eq!(o.selection(), Some(ActorId(0)));
    assert_eq!(o.focus(), Focus::Neutral);
    let (_, spaces) = o.shown_spaces().unwrap();
    assert!(spaces.iter().all(|space| !space.invalid && space.command == CommandKind::Move));

    InputScript::new()
        .repeat(Direction::Right, 2)
        .press(Button::Confirm)
        .idle(4)
        .run(&mut o);
    assert_eq!(o.battle().actor(ActorId(0)).unwrap().pose.cell, CellCoord::new(3, 1));
    assert_eq!(o.battle().turns().handoffs(), 1);
}

#[test]
fn test_multi_cell_move_with_turn_keeps_occupancy() {
    let mut o = BattleBuilder::new(10, 10)
        .spawn(ActorSpawn {
            footprint: Footprint::new(1, 3).unwrap(),
            ..spawn_at(0, 2, 2)
        })
        .actor(1, 8, 8)
        .orchestrate(Vec::new());

    InputScript::new().press(Button::Confirm).run(&mut o);
    assert!(o.choose(MenuChoice::Action(ActionKind::Move)));
    InputScript::new()
        .dir(Direction::Right)
        .press(Button::Rotate(1))
        .dir(Direction::Right)
        .press(Button::Confirm)
        .idle(6)
        .run(&mut o);

    let bar = o.battle().actor(ActorId(0)).unwrap();
    assert_eq!(bar.pose, Pose::new(CellCoord::new(4, 2), Rotation::from_quarter_turns(1)));
    for x in 3..=5 {
        assert_eq!(o.battle().grid().cover(CellCoord::new(x, 2)), Some(ActorId(0)));
    }
    assert_eq!(o.battle().grid().cover(CellCoord::new(2, 3)), None);
    assert!(o.battle().validate_occupancy().is_empty());
    assert!(o.battle().actor(ActorId(0)).unwrap().actions.performed(ActionKind::Move));
}
