use std::time::Duration;

use dice_arena_core::ObjKind;
use dice_arena_system_waves::{ScalingRule, WaveEntry, WaveTable};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn table() -> WaveTable {
    WaveTable::new(
        vec![WaveEntry::new(2, 20.0), WaveEntry::new(4, 25.0)],
        ScalingRule {
            extra_enemies_per_wave: 3,
            big_enemy_chance: 0.1,
            big_enemy_chance_per_wave: 0.2,
            max_big_enemy_chance: 0.6,
        },
    )
}

#[test]
fn configured_waves_follow_the_table_with_intermissions() {
    let table = table();

    let first = table.plan(1);
    assert_eq!(first.enemies, 2);
    assert_eq!(first.duration, Duration::from_secs(20));
    assert!(first.intermission);

    let second = table.plan(2);
    assert_eq!(second.enemies, 4);
    assert_eq!(second.duration, Duration::from_secs(25));
    assert!(second.intermission);

    assert_eq!(table.first_duration(), Duration::from_secs(20));
    assert_eq!(table.configured_waves(), 2);
}

#[test]
fn waves_past_the_table_scale_without_intermission() {
    let table = table();

    let third = table.plan(3);
    assert_eq!(third.enemies, 7);
    assert_eq!(third.duration, Duration::from_secs(25));
    assert!(!third.intermission);

    let fifth = table.plan(5);
    assert_eq!(fifth.enemies, 13);
    assert!(!fifth.intermission);
}

#[test]
fn big_enemy_chance_grows_and_saturates() {
    let table = table();
    assert!((table.big_enemy_chance(1) - 0.1).abs() < 1e-6);
    assert!((table.big_enemy_chance(2) - 0.3).abs() < 1e-6);
    assert!((table.big_enemy_chance(10) - 0.6).abs() < 1e-6);
}

#[test]
fn enemy_kind_selection_is_deterministic_per_seed() {
    let table = table();
    let draw = |seed: u64| -> Vec<ObjKind> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..32).map(|_| table.pick_enemy_kind(4, &mut rng)).collect()
    };

    let first = draw(0x5eed);
    let second = draw(0x5eed);
    assert_eq!(first, second, "same seed must pick the same enemies");
    assert!(first.iter().all(|kind| kind.is_enemy()));
    assert!(first.contains(&ObjKind::EnemyBig));
    assert!(first.contains(&ObjKind::Enemy));
}

#[test]
fn zero_chance_never_spawns_big_enemies() {
    let table = WaveTable::new(
        vec![WaveEntry::new(1, 10.0)],
        ScalingRule {
            extra_enemies_per_wave: 1,
            big_enemy_chance: 0.0,
            big_enemy_chance_per_wave: 0.0,
            max_big_enemy_chance: 0.0,
        },
    );
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..64 {
        assert_eq!(table.pick_enemy_kind(9, &mut rng), ObjKind::Enemy);
    }
}

#[test]
fn unrepresentable_countdowns_saturate() {
    let table = WaveTable::new(
        vec![WaveEntry::new(1, f32::INFINITY), WaveEntry::new(1, -5.0)],
        ScalingRule::default(),
    );

    assert_eq!(table.plan(1).duration, Duration::MAX);
    assert_eq!(table.plan(2).duration, Duration::ZERO);
}
