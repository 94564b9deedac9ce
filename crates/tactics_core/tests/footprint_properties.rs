//! Property tests for footprints and path construction.

use proptest::prelude::*;
use tactics_core::prelude::*;
use tactics_test_utils::fixtures::{open_grid, BattleBuilder};
use tactics_test_utils::strategies::{arb_cell_near, arb_dimensions, arb_direction, arb_footprint, arb_rotation};

fn centred(footprint: Footprint, budget: u32) -> Battle {
    BattleBuilder::new(11, 11)
        .spawn(ActorSpawn {
            side: SideId(0),
            name: "probe".to_string(),
            pose: Pose::new(CellCoord::new(5, 5), Rotation::IDENTITY),
            footprint,
            movement_class: MovementClass::Ground,
            stats: ActorStats {
                move_budget: budget,
                ..ActorStats::default()
            },
        })
        .build()
}

proptest! {
    /// `fits` holds exactly when every covered cell is in bounds and open.
    #[test]
    fn prop_fits_rejects_blocked_and_out_of_bounds(
        (width, height) in arb_dimensions(9),
        footprint in arb_footprint(),
        rotation in arb_rotation(),
        seed in (0u32..9, 0u32..9),
    ) {
        let mut grid = open_grid(width, height);
        let blocked = CellCoord::new(
            i32::try_from(seed.0 % width).unwrap(),
            i32::try_from(seed.1 % height).unwrap(),
        );
        grid.set_passability(blocked, Passability::Blocked);

        for pivot in [CellCoord::new(0, 0), blocked, CellCoord::new(4, 4)] {
            let expected = footprint
                .covered_cells(pivot, rotation)
                .all(|cell| grid.in_bounds(cell) && grid.is_passable(cell));
            prop_assert_eq!(footprint.fits(&grid, pivot, rotation), expected);
            if footprint.covered_cells(pivot, rotation).any(|cell| cell == blocked) {
                prop_assert!(!footprint.fits(&grid, pivot, rotation));
            }
        }
    }

    /// Out-of-bounds pivots never fit.
    #[test]
    fn prop_out_of_bounds_pivot_never_fits(
        footprint in arb_footprint(),
        rotation in arb_rotation(),
        pivot in arb_cell_near(6, 6),
    ) {
        let grid = open_grid(6, 6);
        if !grid.in_bounds(pivot) {
            prop_assert!(!footprint.fits(&grid, pivot, rotation));
        }
    }

    /// A translation followed by its reverse leaves the session unchanged.
    #[test]
    fn prop_translate_then_reverse_restores(
        footprint in arb_footprint(),
        direction in arb_direction(),
    ) {
        let battle = centred(footprint, 4);
        let actor = battle.actor(ActorId(0)).unwrap();
        let mut session = PathSession::begin(actor);
        let before = (session.steps().len(), session.cumulative_cost(), session.current_pose());

        if session.append_translate(battle.grid(), direction) {
            prop_assert!(session.append_translate(battle.grid(), direction.reverse()));
        }
        prop_assert_eq!(
            (session.steps().len(), session.cumulative_cost(), session.current_pose()),
            before
        );
    }

    /// Four clockwise quarter turns come back to the start at no cost.
    #[test]
    fn prop_four_turns_are_free_and_idempotent(footprint in arb_footprint()) {
        let battle = centred(footprint, 4);
        let actor = battle.actor(ActorId(0)).unwrap();
        let mut session = PathSession::begin(actor);
        for _ in 0..4 {
            prop_assert!(session.append_rotate(battle.grid(), true));
        }
        prop_assert_eq!(session.current_pose().rotation.quarter_turns(), 0);
        prop_assert_eq!(session.cumulative_cost(), 0);
        prop_assert_eq!(session.steps().len(), 5);
    }

    /// A step whose weight equals the remaining budget is allowed; one more is not.
    #[test]
    fn prop_budget_boundary(budget in 1u32..8, weight in 1u32..10) {
        let battle = BattleBuilder::new(4, 1)
            .weight(1, 0, weight, weight)
            .spawn(ActorSpawn {
                stats: ActorStats {
                    move_budget: budget,
                    ..ActorStats::default()
                },
                ..tactics_test_utils::fixtures::spawn_at(0, 0, 0)
            })
            .build();
        let actor = battle.actor(ActorId(0)).unwrap();
        let mut session = PathSession::begin(actor);
        prop_assert_eq!(session.append_translate(battle.grid(), Direction::Right), weight <= budget);
    }

    /// Whatever the player presses, occupancy stays consistent and two runs agree.
    #[test]
    fn prop_random_input_keeps_occupancy_consistent(
        script in tactics_test_utils::strategies::arb_input_script(80),
    ) {
        let mut config = MatchConfig::skirmish();
        config.timing = TimingConfig::instant();
        prop_assert!(tactics_test_utils::determinism::verify_scripted_determinism(&config, &script));

        let mut orchestrator = Orchestrator::from_config(&config).unwrap();
        for input in &script {
            orchestrator.tick(*input);
            prop_assert!(orchestrator.battle().validate_occupancy().is_empty());
        }
    }
}
