//! Tunable game parameters loaded from TOML.

use std::time::Duration;

use dice_arena_core::{DieAction, DieFace, DICE_COUNT};
use dice_arena_system_waves::{ScalingRule, WaveEntry, WaveTable};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Tunables measured in seconds, degrees or pixels must be finite numbers.
    #[error("{field} must be a finite number (received {value})")]
    NonFinite {
        /// Dotted path of the offending key.
        field: String,
        /// Rejected value.
        value: f32,
    },
    /// Grid cells must have a positive size.
    #[error("cell size must be positive (received {0})")]
    InvalidCellSize(f32),
    /// The frame rate must be positive.
    #[error("frame rate must be positive")]
    InvalidFrameRate,
    /// Every action needs between one and all of the dice.
    #[error("{action:?} requires {required} dice but only 1 to 3 dice exist")]
    InvalidThreshold {
        /// Action whose threshold is out of range.
        action: DieAction,
        /// Configured number of dice.
        required: usize,
    },
    /// Dice weights must list rollable faces with a positive total.
    #[error("dice weights must contain at least one rollable face with positive weight")]
    NoRollableFace,
    /// `Empty` is a consumed state, never a roll outcome.
    #[error("{0:?} cannot appear in the dice weight table")]
    UnrollableFace(DieFace),
}

/// Weight of a single roll outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct FaceWeight {
    /// Outcome face.
    pub face: DieFace,
    /// Relative likelihood.
    pub weight: u32,
}

impl FaceWeight {
    const fn new(face: DieFace, weight: u32) -> Self {
        Self { face, weight }
    }
}

/// Number of matching dice each action consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionThresholds {
    /// Dice required for a Move action.
    #[serde(rename = "move")]
    pub move_dice: usize,
    /// Dice required for a Shoot action.
    pub shoot: usize,
    /// Dice required for a Reload action.
    pub reload: usize,
}

impl ActionThresholds {
    /// Dice required by the provided action.
    #[must_use]
    pub const fn required(&self, action: DieAction) -> usize {
        match action {
            DieAction::Move => self.move_dice,
            DieAction::Shoot => self.shoot,
            DieAction::Reload => self.reload,
        }
    }
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            move_dice: 1,
            shoot: 2,
            reload: 1,
        }
    }
}

/// Dice economy parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiceConfig {
    /// Weighted roll outcomes.
    pub weights: Vec<FaceWeight>,
    /// Dice consumed per action.
    pub thresholds: ActionThresholds,
    /// Length of the roll animation, in seconds.
    pub roll_secs: f32,
}

impl DiceConfig {
    /// Length of the roll animation.
    #[must_use]
    pub fn roll_duration(&self) -> Duration {
        secs(self.roll_secs)
    }
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            weights: vec![
                FaceWeight::new(DieFace::Move, 3),
                FaceWeight::new(DieFace::Shoot, 3),
                FaceWeight::new(DieFace::Reload, 2),
                FaceWeight::new(DieFace::Enemy, 2),
                FaceWeight::new(DieFace::Stuck, 1),
            ],
            thresholds: ActionThresholds::default(),
            roll_secs: 0.4,
        }
    }
}

/// Player and weapon parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health.
    pub health: i32,
    /// Starting and maximum ammunition.
    pub ammo: u32,
    /// Steps granted by one Move action.
    pub moves_per_action: u32,
    /// Shots granted by one Shoot action.
    pub shots_per_action: u32,
    /// Bullet speed in pixels per second.
    pub bullet_speed: f32,
    /// Angle between the centre bullet and each shotgun bullet, in degrees.
    pub shotgun_spread_degrees: f32,
    /// Random jitter added to each shotgun bullet, in degrees.
    pub spread_jitter_degrees: f32,
    /// Amplitude of the aim wobble while the fire input is held, in degrees.
    pub aim_wobble_degrees: f32,
    /// Frequency of the aim wobble, in hertz.
    pub aim_wobble_hz: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: 3,
            ammo: 6,
            moves_per_action: 2,
            shots_per_action: 2,
            bullet_speed: 320.0,
            shotgun_spread_degrees: 12.0,
            spread_jitter_degrees: 3.0,
            aim_wobble_degrees: 6.0,
            aim_wobble_hz: 1.5,
        }
    }
}

/// Durations of animations and cosmetic timers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Eased enemy step duration, in seconds.
    pub enemy_move_secs: f32,
    /// Eased player step duration, in seconds.
    pub player_move_secs: f32,
    /// Frozen ticks after the player dies.
    pub game_over_freeze_frames: u32,
    /// Camera shake after the player dies, in seconds.
    pub camera_shake_secs: f32,
    /// Delay before a retry click is accepted, in seconds.
    pub retry_cooldown_secs: f32,
    /// Lifetime of floating notifications, in seconds.
    pub notification_secs: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enemy_move_secs: 0.25,
            player_move_secs: 0.15,
            game_over_freeze_frames: 20,
            camera_shake_secs: 0.5,
            retry_cooldown_secs: 1.0,
            notification_secs: 1.2,
        }
    }
}

/// Complete set of tunables consumed by the world.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed of the world's random number generator.
    pub seed: u64,
    /// Simulation ticks per second.
    pub fps: u32,
    /// Side length of a grid cell in pixels.
    pub cell_size: f32,
    /// Whether the session opens with the tutorial.
    pub start_with_tutorial: bool,
    /// Dice economy.
    pub dice: DiceConfig,
    /// Player and weapon.
    pub player: PlayerConfig,
    /// Animation and cosmetic timers.
    pub timing: TimingConfig,
    /// Configured waves in order.
    pub waves: Vec<WaveEntry>,
    /// Growth beyond the configured waves.
    pub scaling: ScalingRule,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x00d1_ce5e_ed00_0001,
            fps: 60,
            cell_size: 16.0,
            start_with_tutorial: false,
            dice: DiceConfig::default(),
            player: PlayerConfig::default(),
            timing: TimingConfig::default(),
            waves: WaveTable::default().entries().to_vec(),
            scaling: ScalingRule::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the world relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((field, value)) = self.float_fields().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::NonFinite { field, value });
        }

        if self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }

        if self.fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }

        for action in DieAction::ALL {
            let required = self.dice.thresholds.required(action);
            if required == 0 || required > DICE_COUNT {
                return Err(ConfigError::InvalidThreshold { action, required });
            }
        }

        if let Some(weight) = self
            .dice
            .weights
            .iter()
            .find(|weight| !DieFace::ROLLABLE.contains(&weight.face))
        {
            return Err(ConfigError::UnrollableFace(weight.face));
        }

        let total: u64 = self
            .dice
            .weights
            .iter()
            .map(|weight| u64::from(weight.weight))
            .sum();
        if total == 0 {
            return Err(ConfigError::NoRollableFace);
        }

        Ok(())
    }

    fn float_fields(&self) -> impl Iterator<Item = (String, f32)> + '_ {
        let player = &self.player;
        let timing = &self.timing;
        let scaling = &self.scaling;
        let named = [
            ("cell_size", self.cell_size),
            ("dice.roll_secs", self.dice.roll_secs),
            ("player.bullet_speed", player.bullet_speed),
            ("player.shotgun_spread_degrees", player.shotgun_spread_degrees),
            ("player.spread_jitter_degrees", player.spread_jitter_degrees),
            ("player.aim_wobble_degrees", player.aim_wobble_degrees),
            ("player.aim_wobble_hz", player.aim_wobble_hz),
            ("timing.enemy_move_secs", timing.enemy_move_secs),
            ("timing.player_move_secs", timing.player_move_secs),
            ("timing.camera_shake_secs", timing.camera_shake_secs),
            ("timing.retry_cooldown_secs", timing.retry_cooldown_secs),
            ("timing.notification_secs", timing.notification_secs),
            ("scaling.big_enemy_chance", scaling.big_enemy_chance),
            ("scaling.big_enemy_chance_per_wave", scaling.big_enemy_chance_per_wave),
            ("scaling.max_big_enemy_chance", scaling.max_big_enemy_chance),
        ];

        named
            .into_iter()
            .map(|(field, value)| (field.to_owned(), value))
            .chain(self.waves.iter().enumerate().map(|(index, wave)| {
                (format!("waves[{index}].duration_secs"), wave.duration_secs)
            }))
    }

    /// Simulated time covered by one tick.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    /// Wave planner built from the configured table.
    #[must_use]
    pub fn wave_table(&self) -> WaveTable {
        WaveTable::new(self.waves.clone(), self.scaling.clone())
    }
}

pub(crate) fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dice.thresholds.required(DieAction::Move), 1);
        assert_eq!(config.dice.thresholds.required(DieAction::Shoot), 2);
        assert_eq!(config.dice.thresholds.required(DieAction::Reload), 1);
        assert_eq!(config.waves.len(), WaveTable::default().configured_waves());
    }

    #[test]
    fn partial_documents_keep_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            seed = 7

            [dice.thresholds]
            shoot = 3

            [[waves]]
            enemies = 9
            duration_secs = 12.5
            "#,
        )
        .expect("valid configuration");

        assert_eq!(config.seed, 7);
        assert_eq!(config.dice.thresholds.required(DieAction::Shoot), 3);
        assert_eq!(config.dice.thresholds.required(DieAction::Move), 1);
        assert_eq!(config.waves, vec![WaveEntry::new(9, 12.5)]);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn threshold_beyond_dice_count_is_rejected() {
        let error = GameConfig::from_toml_str("[dice.thresholds]\nreload = 4\n")
            .expect_err("four dice do not exist");
        assert!(matches!(
            error,
            ConfigError::InvalidThreshold {
                action: DieAction::Reload,
                required: 4
            }
        ));
    }

    #[test]
    fn empty_face_cannot_be_weighted() {
        let error = GameConfig::from_toml_str(
            "[dice]\nweights = [{ face = \"Empty\", weight = 1 }]\n",
        )
        .expect_err("empty is not a roll outcome");
        assert!(matches!(error, ConfigError::UnrollableFace(DieFace::Empty)));
    }

    #[test]
    fn zero_total_weight_is_rejected() {
        let error = GameConfig::from_toml_str(
            "[dice]\nweights = [{ face = \"Move\", weight = 0 }]\n",
        )
        .expect_err("zero weight");
        assert!(matches!(error, ConfigError::NoRollableFace));
    }

    #[test]
    fn infinite_wave_duration_is_rejected() {
        let error = GameConfig::from_toml_str("[[waves]]\nenemies = 1\nduration_secs = inf\n")
            .expect_err("infinite countdown");
        assert!(matches!(
            error,
            ConfigError::NonFinite { ref field, .. } if field == "waves[0].duration_secs"
        ));
    }

    #[test]
    fn nan_tunables_are_rejected() {
        for (document, expected) in [
            ("[player]\nspread_jitter_degrees = nan\n", "player.spread_jitter_degrees"),
            ("[player]\nbullet_speed = -inf\n", "player.bullet_speed"),
            ("[timing]\nenemy_move_secs = nan\n", "timing.enemy_move_secs"),
            ("cell_size = inf\n", "cell_size"),
        ] {
            let error = GameConfig::from_toml_str(document).expect_err(document);
            assert!(
                matches!(error, ConfigError::NonFinite { ref field, .. } if field == expected),
                "{document}: {error}"
            );
        }
    }

    #[test]
    fn oversized_durations_saturate() {
        assert_eq!(secs(f32::MAX), Duration::MAX);
        assert_eq!(secs(-1.0), Duration::ZERO);
    }

    #[test]
    fn malformed_documents_report_parse_errors() {
        let error = GameConfig::from_toml_str("seed = \"many\"").expect_err("wrong type");
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
