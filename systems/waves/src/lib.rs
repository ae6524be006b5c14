#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave planner that decides enemy quotas, countdowns and enemy types.
//!
//! Waves listed in the configured table are played as written and each one is
//! preceded by an intermission. Past the end of the table the planner keeps
//! the last entry's countdown and grows the quota linearly, without breaks.

use std::time::Duration;

use dice_arena_core::ObjKind;
use rand::Rng;
use serde::Deserialize;

const FALLBACK_ENEMIES: u32 = 1;
const FALLBACK_DURATION_SECS: f32 = 30.0;

/// One row of the configured wave table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WaveEntry {
    /// Enemies the player must place when the wave starts.
    pub enemies: u32,
    /// Countdown until the following wave boundary, in seconds.
    pub duration_secs: f32,
}

impl WaveEntry {
    /// Creates a new wave table entry.
    #[must_use]
    pub const fn new(enemies: u32, duration_secs: f32) -> Self {
        Self {
            enemies,
            duration_secs,
        }
    }

    fn duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.duration_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Growth rules applied once the configured table runs out.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScalingRule {
    /// Additional enemies per wave beyond the last configured one.
    pub extra_enemies_per_wave: u32,
    /// Probability that a spawned enemy is big during the first wave.
    pub big_enemy_chance: f32,
    /// Increase of the big-enemy probability per wave.
    pub big_enemy_chance_per_wave: f32,
    /// Upper bound of the big-enemy probability.
    pub max_big_enemy_chance: f32,
}

impl Default for ScalingRule {
    fn default() -> Self {
        Self {
            extra_enemies_per_wave: 1,
            big_enemy_chance: 0.0,
            big_enemy_chance_per_wave: 0.08,
            max_big_enemy_chance: 0.5,
        }
    }
}

/// Plan for a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavePlan {
    /// One-based wave number.
    pub wave: u32,
    /// Enemies the player must place.
    pub enemies: u32,
    /// Countdown until the following boundary.
    pub duration: Duration,
    /// Whether the wave is preceded by an intermission.
    pub intermission: bool,
}

/// Pure planner built from the configured wave table.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveTable {
    entries: Vec<WaveEntry>,
    scaling: ScalingRule,
}

impl WaveTable {
    /// Creates a planner from table rows and the scaling rule.
    #[must_use]
    pub fn new(entries: Vec<WaveEntry>, scaling: ScalingRule) -> Self {
        Self { entries, scaling }
    }

    /// Configured table rows in wave order.
    #[must_use]
    pub fn entries(&self) -> &[WaveEntry] {
        &self.entries
    }

    /// Number of configured waves.
    #[must_use]
    pub fn configured_waves(&self) -> usize {
        self.entries.len()
    }

    /// Countdown of the first wave.
    #[must_use]
    pub fn first_duration(&self) -> Duration {
        self.plan(1).duration
    }

    /// Resolves the plan of the provided one-based wave.
    #[must_use]
    pub fn plan(&self, wave: u32) -> WavePlan {
        let wave = wave.max(1);
        let index = usize::try_from(wave - 1).unwrap_or(usize::MAX);

        if let Some(entry) = self.entries.get(index) {
            return WavePlan {
                wave,
                enemies: entry.enemies,
                duration: entry.duration(),
                intermission: true,
            };
        }

        let (base_enemies, duration) = match self.entries.last() {
            Some(last) => (last.enemies, last.duration()),
            None => (
                FALLBACK_ENEMIES,
                Duration::from_secs_f32(FALLBACK_DURATION_SECS),
            ),
        };
        let configured = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        let waves_past_table = wave.saturating_sub(configured.max(1));
        let enemies = base_enemies.saturating_add(
            waves_past_table.saturating_mul(self.scaling.extra_enemies_per_wave),
        );

        WavePlan {
            wave,
            enemies,
            duration,
            intermission: false,
        }
    }

    /// Probability that an enemy spawned during `wave` is a big one.
    #[must_use]
    pub fn big_enemy_chance(&self, wave: u32) -> f32 {
        let waves_elapsed = wave.saturating_sub(1) as f32;
        let chance =
            self.scaling.big_enemy_chance + self.scaling.big_enemy_chance_per_wave * waves_elapsed;
        chance.clamp(0.0, self.scaling.max_big_enemy_chance.clamp(0.0, 1.0))
    }

    /// Draws the type of the next enemy spawned during `wave`.
    pub fn pick_enemy_kind<R>(&self, wave: u32, rng: &mut R) -> ObjKind
    where
        R: Rng + ?Sized,
    {
        let roll: f32 = rng.gen();
        if roll < self.big_enemy_chance(wave) {
            ObjKind::EnemyBig
        } else {
            ObjKind::Enemy
        }
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::new(
            vec![
                WaveEntry::new(2, 30.0),
                WaveEntry::new(3, 30.0),
                WaveEntry::new(4, 35.0),
                WaveEntry::new(5, 40.0),
            ],
            ScalingRule::default(),
        )
    }
}
