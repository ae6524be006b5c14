#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dice Arena engine.
//!
//! This crate defines the message surface that connects adapters with the
//! authoritative world. Adapters submit [`Command`] values describing the
//! player's intent, the world executes them via its `apply` entry point and
//! broadcasts [`Event`] values that adapters turn into sounds, notifications
//! and log lines. Geometry and collision helpers live in [`geometry`] so both
//! the world and the presentation layer agree on them.

pub mod geometry;

use std::time::Duration;

use glam::Vec2;
use serde::Deserialize;

pub use geometry::{BoundingBox, Collider};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Dice Arena.";

/// Number of dice available to the player.
pub const DICE_COUNT: usize = 3;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so neighbourhood offsets may step outside the grid;
/// grid-aware queries reject such cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Cell displaced by the provided column and row offsets.
    #[must_use]
    pub const fn offset(&self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// The eight surrounding cells, column offset major.
    #[must_use]
    pub fn neighbors(self) -> [CellCoord; 8] {
        let mut cells = [self; 8];
        let mut index = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                cells[index] = self.offset(dx, dy);
                index += 1;
            }
        }
        cells
    }
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Pickups the player can collect by stepping onto them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupKind {
    /// Fires two extra spread bullets per shot.
    Shotgun,
    /// Raises the movement budget granted by a Move action.
    Speed,
    /// Restores one point of health.
    Health,
}

/// Closed set of entity types that can be placed in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// The player character.
    Player,
    /// Regular enemy.
    Enemy,
    /// Sturdier enemy with more health.
    EnemyBig,
    /// Corpse left behind by a killed enemy.
    EnemyDead,
    /// Static blocking geometry.
    Wall,
    /// Projectile fired by the player.
    Bullet,
    /// Cell the player clicks to place wave enemies.
    Spawn,
    /// Point the player defends; an enemy reaching it ends the game.
    Target,
    /// Decorative floor and remnants.
    Background,
    /// Collectable item.
    Pickup(PickupKind),
    /// Floating text marker.
    Text,
}

impl ObjKind {
    /// Reports whether the kind is one of the living enemy types.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, Self::Enemy | Self::EnemyBig)
    }
}

/// Sprite keys understood by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// Animated player sprite.
    Player,
    /// Animated enemy sprite.
    Enemy,
    /// Animated big enemy sprite.
    EnemyBig,
    /// Enemy corpse.
    EnemyDead,
    /// Wall tile.
    Wall,
    /// Bullet in flight.
    Bullet,
    /// Spent shell left on impact.
    BulletShell,
    /// Enemy spawn marker.
    Spawn,
    /// Defended target.
    Target,
    /// Floor tile.
    Floor,
    /// Shotgun pickup.
    PickupShotgun,
    /// Speed pickup.
    PickupSpeed,
    /// Health pickup.
    PickupHealth,
    /// Text entities carry no sprite of their own.
    None,
}

/// Faces a die can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum DieFace {
    /// Consumed or not yet rolled.
    Empty,
    /// Pays for a Move action.
    Move,
    /// Pays for a Shoot action.
    Shoot,
    /// Pays for a Reload action.
    Reload,
    /// Forces an enemy move as soon as it is rolled.
    Enemy,
    /// Locks the die until the next wave boundary.
    Stuck,
}

impl DieFace {
    /// Faces that a roll may produce.
    pub const ROLLABLE: [DieFace; 5] = [
        DieFace::Move,
        DieFace::Shoot,
        DieFace::Reload,
        DieFace::Enemy,
        DieFace::Stuck,
    ];

    /// Short label drawn on the die.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "-",
            Self::Move => "RUN",
            Self::Shoot => "SHOOT",
            Self::Reload => "RELOAD",
            Self::Enemy => "ENEMY",
            Self::Stuck => "STUCK",
        }
    }
}

/// Player actions paid for with dice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DieAction {
    /// Step the player across neighbouring cells.
    Move,
    /// Fire bullets toward the cursor.
    Shoot,
    /// Refill the player's ammunition.
    Reload,
}

impl DieAction {
    /// Every die-gated action in button order.
    pub const ALL: [DieAction; 3] = [DieAction::Move, DieAction::Shoot, DieAction::Reload];

    /// Die face that pays for the action.
    #[must_use]
    pub const fn face(self) -> DieFace {
        match self {
            Self::Move => DieFace::Move,
            Self::Shoot => DieFace::Shoot,
            Self::Reload => DieFace::Reload,
        }
    }
}

/// Turn phase currently being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// The player may roll dice and pick actions.
    Roll,
    /// The player is choosing destination cells.
    MovePlayer,
    /// An enemy is being moved toward the target.
    MoveEnemy,
    /// The player is aiming and firing.
    Shoot,
    /// The player places wave enemies on spawn points.
    NewWave,
    /// Intermission before the next wave.
    Break,
}

/// Top-level session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Scripted introduction; the wave timer is frozen.
    Tutorial,
    /// Regular play.
    Playing,
    /// The run ended; only the retry prompt remains.
    GameOver,
}

/// Reason a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverCause {
    /// The player's health reached zero.
    PlayerKilled,
    /// An enemy stepped onto the defended target.
    TargetReached,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by one frame.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Rerolls the die in the provided slot.
    RollDie {
        /// Zero-based die slot.
        slot: usize,
    },
    /// Spends dice to start an action.
    TakeAction {
        /// Action the player wants to take.
        action: DieAction,
    },
    /// Steps the player onto a highlighted neighbouring cell.
    MovePlayer {
        /// Destination cell.
        cell: CellCoord,
    },
    /// Picks the enemy that should be moved.
    SelectEnemy {
        /// Enemy chosen by the player.
        enemy: ObjId,
    },
    /// Moves the selected enemy onto a highlighted neighbouring cell.
    MoveEnemy {
        /// Destination cell.
        cell: CellCoord,
    },
    /// Updates the aim while the fire input is held.
    Aim {
        /// Pixel-space point the player aims at.
        target: Vec2,
        /// Whether the aim input is held this frame.
        held: bool,
    },
    /// Fires toward the provided point.
    Fire {
        /// Pixel-space point the player aims at.
        target: Vec2,
    },
    /// Places the next wave enemy on a spawn point.
    SpawnEnemy {
        /// Spawn entity that was clicked.
        spawn: ObjId,
    },
    /// Leaves the intermission and starts the next wave.
    UnpauseGame,
    /// Frees stuck dice by triggering the wave boundary early.
    Unstuck,
    /// Abandons the current move or shoot action.
    Cancel,
    /// Finishes the tutorial and begins regular play.
    CompleteTutorial,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A die received a new logical face.
    DieRolled {
        /// Zero-based die slot.
        slot: usize,
        /// Face the die will show once its animation ends.
        face: DieFace,
    },
    /// A new turn phase became current.
    ActionStarted {
        /// Phase that became current.
        action: Action,
    },
    /// Dice were spent on an action.
    ActionTaken {
        /// Action that was paid for.
        action: DieAction,
    },
    /// The player stepped onto a new cell.
    PlayerMoved {
        /// Cell the player left.
        from: CellCoord,
        /// Cell the player entered.
        to: CellCoord,
    },
    /// The player collected a pickup.
    PickupCollected {
        /// Kind of pickup collected.
        kind: PickupKind,
    },
    /// A wave enemy was placed.
    EnemySpawned {
        /// Identifier of the new enemy.
        enemy: ObjId,
        /// Cell the enemy occupies.
        cell: CellCoord,
        /// Enemy type that was spawned.
        kind: ObjKind,
    },
    /// An enemy was chosen for movement.
    EnemySelected {
        /// Identifier of the selected enemy.
        enemy: ObjId,
    },
    /// An enemy started moving between two cells.
    EnemyMoved {
        /// Identifier of the moving enemy.
        enemy: ObjId,
        /// Cell the enemy left.
        from: CellCoord,
        /// Cell the enemy is moving into.
        to: CellCoord,
    },
    /// The player lost health.
    PlayerDamaged {
        /// Health remaining after the hit.
        health: i32,
    },
    /// Bullets left the player's gun.
    ShotFired {
        /// Number of bullets spawned by the shot.
        bullets: usize,
        /// Ammunition left afterwards.
        ammo: u32,
    },
    /// A bullet hit an enemy without killing it.
    EnemyHit {
        /// Identifier of the enemy that was hit.
        enemy: ObjId,
    },
    /// An enemy was killed.
    EnemyKilled {
        /// Identifier of the enemy that died.
        enemy: ObjId,
    },
    /// A shot was attempted without ammunition.
    NoAmmo,
    /// Ammunition was refilled.
    Reloaded {
        /// Ammunition available afterwards.
        ammo: u32,
    },
    /// A wave boundary was reached.
    WaveBoundary {
        /// Whether the wave timer triggered the boundary.
        timed: bool,
        /// Whether an intermission was queued.
        intermission: bool,
    },
    /// A wave began and its enemies await placement.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Enemies the player must place.
        enemies: u32,
    },
    /// The run ended.
    GameOver {
        /// Reason the run ended.
        cause: GameOverCause,
    },
    /// The tutorial finished.
    TutorialCompleted,
}
