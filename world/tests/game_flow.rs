use std::time::Duration;

use dice_arena_core::{
    Action, CellCoord, Command, DieAction, DieFace, Event, GameOverCause, GameState, ObjId,
    ObjKind, PickupKind,
};
use dice_arena_system_waves::WaveEntry;
use dice_arena_world::{
    apply,
    config::{DiceConfig, FaceWeight},
    query, GameConfig, Level, Obj, World, DEFAULT_ARENA,
};

const FRAME: Duration = Duration::from_millis(16);

fn only_faces(face: DieFace) -> GameConfig {
    GameConfig {
        dice: DiceConfig {
            weights: vec![FaceWeight { face, weight: 1 }],
            ..DiceConfig::default()
        },
        ..GameConfig::default()
    }
}

fn build(config: GameConfig, layout: &str) -> World {
    World::new(config, &Level::parse(layout).expect("valid level"))
}

fn tick(world: &mut World, frames: usize, events: &mut Vec<Event>) {
    for _ in 0..frames {
        apply(world, Command::Tick { dt: FRAME }, events);
    }
}

/// Leaves the opening intermission and lets the dice settle.
fn start_first_wave(world: &mut World, events: &mut Vec<Event>) {
    tick(world, 1, events);
    assert_eq!(query::action(world), Action::Break);
    apply(world, Command::UnpauseGame, events);
    tick(world, 40, events);
}

fn ids_of(world: &World, kind: ObjKind) -> Vec<ObjId> {
    query::objects(world)
        .iter()
        .filter(|obj| obj.kind() == kind)
        .map(Obj::id)
        .collect()
}

fn count_rolls(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::DieRolled { .. }))
        .count()
}

#[test]
fn fresh_load_prepares_first_wave() {
    let world = build(GameConfig::default(), DEFAULT_ARENA);

    assert_eq!(query::count_kind(&world, ObjKind::Player), 1);
    assert_eq!(query::count_kind(&world, ObjKind::Target), 1);
    assert_eq!(query::state(&world), GameState::Playing);
    assert_eq!(query::action(&world), Action::Roll);
    for die in query::dice(&world).slots() {
        assert_ne!(die.face(), DieFace::Empty);
        assert!(die.is_rolling());
    }
    assert_eq!(
        query::wave_timer(&world),
        GameConfig::default().wave_table().first_duration()
    );
    assert_eq!(query::current_wave(&world), 0);
    assert!(query::queued_actions(&world).any(|action| action == Action::Break));

    let target = query::target(&world).expect("target exists");
    let target_cell = target.cell(query::layout(&world).cell_size());
    assert_eq!(query::distance_field(&world).distance(target_cell), Some(0));
}

#[test]
fn enemy_contact_kills_player_and_gates_retry() {
    let config = GameConfig {
        player: dice_arena_world::config::PlayerConfig {
            health: 1,
            ..Default::default()
        },
        ..only_faces(DieFace::Enemy)
    };
    let mut world = build(config, "######\n#EPT.#\n######");
    let mut events = Vec::new();

    tick(&mut world, 1, &mut events);
    assert_eq!(query::action(&world), Action::MoveEnemy);

    let enemy = ids_of(&world, ObjKind::Enemy)[0];
    assert_eq!(query::enemy_destinations(&world, enemy), vec![CellCoord::new(2, 1)]);
    apply(&mut world, Command::SelectEnemy { enemy }, &mut events);

    events.clear();
    apply(
        &mut world,
        Command::MoveEnemy {
            cell: CellCoord::new(2, 1),
        },
        &mut events,
    );
    assert!(events.contains(&Event::PlayerDamaged { health: 0 }));
    assert!(events.contains(&Event::GameOver {
        cause: GameOverCause::PlayerKilled
    }));
    assert_eq!(query::state(&world), GameState::GameOver);
    assert_eq!(query::game_over_cause(&world), Some(GameOverCause::PlayerKilled));
    let freeze = GameConfig::default().timing.game_over_freeze_frames;
    assert_eq!(query::stop_frames(&world), freeze);

    events.clear();
    apply(&mut world, Command::RollDie { slot: 0 }, &mut events);
    apply(&mut world, Command::UnpauseGame, &mut events);
    assert!(events.is_empty(), "input is ignored after death");

    tick(&mut world, freeze as usize, &mut events);
    assert_eq!(query::stop_frames(&world), 0);
    assert!(!query::can_retry(&world));

    tick(&mut world, 70, &mut events);
    assert!(query::can_retry(&world));
}

#[test]
fn enemy_reaching_target_ends_the_run() {
    let mut world = build(only_faces(DieFace::Enemy), "#####\n#ET.#\n#P..#\n#####");
    let mut events = Vec::new();

    tick(&mut world, 1, &mut events);
    let enemy = ids_of(&world, ObjKind::Enemy)[0];
    apply(&mut world, Command::SelectEnemy { enemy }, &mut events);
    apply(
        &mut world,
        Command::MoveEnemy {
            cell: CellCoord::new(2, 1),
        },
        &mut events,
    );

    assert_eq!(query::state(&world), GameState::GameOver);
    assert_eq!(query::game_over_cause(&world), Some(GameOverCause::TargetReached));
}

#[test]
fn blocked_enemy_redirects_selection() {
    let mut world = build(only_faces(DieFace::Enemy), "######\n#EE.T#\n#P...#\n######");
    let mut events = Vec::new();

    tick(&mut world, 1, &mut events);
    let cell_size = query::layout(&world).cell_size();
    let enemies = ids_of(&world, ObjKind::Enemy);
    let (back, front) = (enemies[0], enemies[1]);

    apply(&mut world, Command::SelectEnemy { enemy: back }, &mut events);
    events.clear();
    apply(
        &mut world,
        Command::MoveEnemy {
            cell: CellCoord::new(2, 1),
        },
        &mut events,
    );
    assert_eq!(events, vec![Event::EnemySelected { enemy: front }]);
    assert_eq!(query::selected_enemy(&world), Some(front));
    assert_eq!(query::action(&world), Action::MoveEnemy);

    apply(
        &mut world,
        Command::MoveEnemy {
            cell: CellCoord::new(3, 1),
        },
        &mut events,
    );
    assert!(events.contains(&Event::EnemyMoved {
        enemy: front,
        from: CellCoord::new(2, 1),
        to: CellCoord::new(3, 1),
    }));
    assert_eq!(query::action(&world), Action::Roll);
    let moved = query::object(&world, front).expect("front enemy");
    assert_eq!(moved.cell(cell_size), CellCoord::new(3, 1));
    let stayed = query::object(&world, back).expect("back enemy");
    assert_eq!(stayed.cell(cell_size), CellCoord::new(1, 1));
}

#[test]
fn enemies_only_step_down_the_distance_field() {
    let world = build(GameConfig::default(), "########\n#E..#..#\n#..##..#\n#P....T#\n########");
    let field = query::distance_field(&world);
    let cell_size = query::layout(&world).cell_size();
    let enemy = ids_of(&world, ObjKind::Enemy)[0];
    let from = query::object(&world, enemy).expect("enemy").cell(cell_size);

    assert_eq!(field.distance(from), None, "the flood skips occupied cells");

    let destinations = query::enemy_destinations(&world, enemy);
    let flooded: Vec<CellCoord> = from
        .neighbors()
        .into_iter()
        .filter(|cell| field.distance(*cell).is_some())
        .collect();
    assert!(!destinations.is_empty());
    assert_eq!(destinations, flooded);

    for cell in destinations {
        let to = field.distance(cell).expect("destination is reachable");
        for next in cell.neighbors() {
            if field.is_step_acceptable(cell, next) {
                assert!(field.distance(next).expect("next step is reachable") < to);
            }
        }
    }
}

#[test]
fn player_blocks_the_distance_field_but_stays_attackable() {
    let world = build(only_faces(DieFace::Enemy), "#######\n#T.PE.#\n#######");
    let field = query::distance_field(&world);

    assert_eq!(field.distance(CellCoord::new(1, 1)), Some(0));
    assert_eq!(field.distance(CellCoord::new(2, 1)), Some(1));
    assert_eq!(field.distance(CellCoord::new(3, 1)), None);
    assert_eq!(field.distance(CellCoord::new(4, 1)), None);
    assert_eq!(field.distance(CellCoord::new(5, 1)), None);

    let enemy = ids_of(&world, ObjKind::Enemy)[0];
    assert_eq!(query::enemy_destinations(&world, enemy), vec![CellCoord::new(3, 1)]);
}

#[test]
fn timer_expiry_rerolls_stuck_dice_and_queues_next_wave() {
    let config = GameConfig {
        waves: vec![WaveEntry::new(1, 0.1)],
        ..only_faces(DieFace::Stuck)
    };
    let mut world = build(config, "#####\n#PT.#\n#####");
    let mut events = Vec::new();

    tick(&mut world, 1, &mut events);
    apply(&mut world, Command::UnpauseGame, &mut events);
    assert_eq!(query::current_wave(&world), 1);
    assert!(query::dice(&world).any_stuck());
    assert!(query::can_unstuck(&world));

    events.clear();
    tick(&mut world, 10, &mut events);
    assert!(events.contains(&Event::WaveBoundary {
        timed: true,
        intermission: false,
    }));
    assert_eq!(count_rolls(&events), 3, "every stuck die is rerolled");
    assert_eq!(query::current_wave(&world), 2);
    assert!(events.contains(&Event::WaveStarted { wave: 2, enemies: 2 }));
}

#[test]
fn timer_expiry_inside_the_table_queues_an_intermission() {
    let config = GameConfig {
        waves: vec![WaveEntry::new(1, 0.1), WaveEntry::new(3, 20.0)],
        ..only_faces(DieFace::Move)
    };
    let mut world = build(config, "#####\n#PT.#\n#####");
    let mut events = Vec::new();

    start_first_wave(&mut world, &mut events);
    let boundaries: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::WaveBoundary { .. }))
        .collect();
    assert_eq!(
        boundaries,
        vec![&Event::WaveBoundary {
            timed: true,
            intermission: true
        }]
    );
    assert_eq!(query::action(&world), Action::Break);
    assert_eq!(query::new_wave_enemies(&world), 3);

    let frozen = query::wave_timer(&world);
    tick(&mut world, 20, &mut events);
    assert_eq!(query::wave_timer(&world), frozen, "timer waits during breaks");

    apply(&mut world, Command::UnpauseGame, &mut events);
    assert_eq!(query::current_wave(&world), 2);
    assert_eq!(query::wave_timer(&world), Duration::from_secs(20));
}

#[test]
fn unstuck_triggers_an_early_boundary() {
    let mut world = build(only_faces(DieFace::Stuck), "#####\n#PT.#\n#####");
    let mut events = Vec::new();
    start_first_wave(&mut world, &mut events);

    events.clear();
    apply(&mut world, Command::Unstuck, &mut events);
    assert_eq!(count_rolls(&events), 3);
    assert!(events.contains(&Event::WaveBoundary {
        timed: false,
        intermission: true,
    }));
}

#[test]
fn wave_enemies_are_placed_and_moved_one_at_a_time() {
    let config = GameConfig {
        waves: vec![WaveEntry::new(2, 30.0)],
        ..only_faces(DieFace::Move)
    };
    let layout = "#########\n#S.....T#\n#.......#\n#...P...#\n#########";
    let mut world = build(config, layout);
    let mut events = Vec::new();

    tick(&mut world, 1, &mut events);
    apply(&mut world, Command::UnpauseGame, &mut events);
    tick(&mut world, 1, &mut events);
    assert_eq!(query::action(&world), Action::NewWave);
    assert_eq!(query::new_wave_enemies(&world), 2);

    let spawn = ids_of(&world, ObjKind::Spawn)[0];
    for placed in 1..=2 {
        assert_eq!(query::free_spawns(&world), vec![spawn]);
        events.clear();
        apply(&mut world, Command::SpawnEnemy { spawn }, &mut events);
        let Some(Event::EnemySpawned { enemy, cell, .. }) = events
            .iter()
            .find(|event| matches!(event, Event::EnemySpawned { .. }))
            .cloned()
        else {
            panic!("enemy {placed} was not spawned");
        };
        assert_eq!(cell, CellCoord::new(1, 1));
        assert_eq!(query::action(&world), Action::MoveEnemy);
        assert_eq!(query::selected_enemy(&world), Some(enemy));

        let step = query::enemy_destinations(&world, enemy)
            .into_iter()
            .find(|cell| query::entity_at_cell(&world, *cell).is_none())
            .expect("an empty step");
        apply(&mut world, Command::MoveEnemy { cell: step }, &mut events);
        assert_eq!(query::action(&world), Action::Roll);
        tick(&mut world, 30, &mut events);
    }

    assert_eq!(query::new_wave_enemies(&world), 0);
    let spawned = query::count_kind(&world, ObjKind::Enemy) + query::count_kind(&world, ObjKind::EnemyBig);
    assert_eq!(spawned, 2);
    assert!(!query::queued_actions(&world).any(|action| action == Action::NewWave));
}

#[test]
fn move_action_spends_budget_and_collects_pickups() {
    let mut world = build(only_faces(DieFace::Move), "#######\n#Pg..T#\n#.....#\n#######");
    let mut events = Vec::new();
    start_first_wave(&mut world, &mut events);

    assert!(query::can_take(&world, DieAction::Move));
    assert!(!query::can_take(&world, DieAction::Shoot));
    events.clear();
    apply(
        &mut world,
        Command::TakeAction {
            action: DieAction::Move,
        },
        &mut events,
    );
    assert!(events.contains(&Event::ActionTaken {
        action: DieAction::Move
    }));
    assert_eq!(query::action(&world), Action::MovePlayer);
    let empty = query::dice(&world)
        .slots()
        .iter()
        .filter(|die| die.face() == DieFace::Empty)
        .count();
    assert_eq!(empty, 1, "Move consumes exactly one die");

    let destinations = query::player_destinations(&world);
    assert!(destinations.contains(&CellCoord::new(2, 1)));
    assert!(!destinations.contains(&CellCoord::new(0, 1)), "walls block");

    apply(
        &mut world,
        Command::MovePlayer {
            cell: CellCoord::new(2, 1),
        },
        &mut events,
    );
    assert!(events.contains(&Event::PickupCollected {
        kind: PickupKind::Shotgun
    }));
    assert!(query::player(&world).expect("player").has_shotgun());

    apply(
        &mut world,
        Command::MovePlayer {
            cell: CellCoord::new(3, 1),
        },
        &mut events,
    );
    assert_eq!(query::action(&world), Action::MovePlayer, "busy while animating");

    tick(&mut world, 20, &mut events);
    apply(
        &mut world,
        Command::MovePlayer {
            cell: CellCoord::new(3, 2),
        },
        &mut events,
    );
    assert_eq!(query::action(&world), Action::Roll);
    tick(&mut world, 20, &mut events);
    let cell_size = query::layout(&world).cell_size();
    assert_eq!(
        query::player(&world).expect("player").cell(cell_size),
        CellCoord::new(3, 2)
    );
    assert_eq!(query::count_kind(&world, ObjKind::Pickup(PickupKind::Shotgun)), 0);
}

#[test]
fn reload_refills_ammo_without_changing_phase() {
    let mut world = build(only_faces(DieFace::Reload), "#####\n#PT.#\n#####");
    let mut events = Vec::new();
    start_first_wave(&mut world, &mut events);

    events.clear();
    apply(
        &mut world,
        Command::TakeAction {
            action: DieAction::Reload,
        },
        &mut events,
    );
    assert!(events.contains(&Event::Reloaded { ammo: 6 }));
    assert_eq!(query::action(&world), Action::Roll);
}

#[test]
fn checkpoint_restores_untouched_state() {
    let mut world = build(GameConfig::default(), DEFAULT_ARENA);
    let mut events = Vec::new();
    start_first_wave(&mut world, &mut events);

    let checkpoint = world.checkpoint();
    let before = world.clone();

    let mut copy = checkpoint.restore();
    tick(&mut copy, 120, &mut events);
    for slot in 0..3 {
        apply(&mut copy, Command::RollDie { slot }, &mut events);
    }
    tick(&mut copy, 30, &mut events);
    assert_ne!(copy, before);

    assert_eq!(world, before);
    assert_eq!(checkpoint.restore(), before);
}

#[test]
fn identical_inputs_replay_identically() {
    let script = |world: &mut World| -> Vec<Event> {
        let mut events = Vec::new();
        start_first_wave(world, &mut events);
        for round in 0..6 {
            apply(world, Command::RollDie { slot: round % 3 }, &mut events);
            tick(world, 30, &mut events);
            for action in DieAction::ALL {
                apply(world, Command::TakeAction { action }, &mut events);
            }
            apply(world, Command::Cancel, &mut events);
            tick(world, 5, &mut events);
        }
        events
    };

    let mut first = build(GameConfig::default(), DEFAULT_ARENA);
    let mut second = build(GameConfig::default(), DEFAULT_ARENA);
    assert_eq!(script(&mut first), script(&mut second));
    assert_eq!(first, second);
}

#[test]
fn commands_in_the_wrong_phase_are_ignored() {
    let mut world = build(only_faces(DieFace::Move), "#####\n#PT.#\n#####");
    let mut events = Vec::new();
    start_first_wave(&mut world, &mut events);
    let before = world.clone();

    events.clear();
    apply(
        &mut world,
        Command::MovePlayer {
            cell: CellCoord::new(1, 2),
        },
        &mut events,
    );
    apply(&mut world, Command::Fire { target: glam::Vec2::ZERO }, &mut events);
    apply(&mut world, Command::UnpauseGame, &mut events);
    apply(&mut world, Command::Cancel, &mut events);
    apply(&mut world, Command::CompleteTutorial, &mut events);
    assert!(events.is_empty());
    assert_eq!(world, before);
}
