#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Dice Arena.
//!
//! The [`World`] owns every entity, the dice, the action queue and the wave
//! clock. Adapters mutate it exclusively through [`apply`] and observe it
//! through [`query`].

pub mod config;
pub mod dice;
pub mod easing;
pub mod entity;
pub mod grid;
pub mod level;

mod combat;
mod turn;

use std::{collections::VecDeque, time::Duration};

use dice_arena_core::{
    Action, CellCoord, Command, Event, GameOverCause, GameState, ObjId, ObjKind, WELCOME_BANNER,
};
use dice_arena_system_waves::WaveTable;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use config::{ConfigError, GameConfig};
pub use dice::{Dice, Die};
pub use entity::Obj;
pub use grid::{DistanceField, RoomLayout};
pub use level::{Level, LevelError, DEFAULT_ARENA};

use crate::config::secs;

/// Largest camera displacement while shaking, in pixels.
const SHAKE_AMPLITUDE: f32 = 3.0;

/// Camera framing the current room.
#[derive(Clone, Debug, PartialEq)]
struct Camera {
    position: Vec2,
    shake: Duration,
    offset: Vec2,
}

/// Aim state accumulated while the fire input is held.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Aim {
    target: Vec2,
    held: bool,
    elapsed: Duration,
}

/// Running score of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    enemies_killed: u32,
    elapsed: Duration,
}

impl Score {
    /// Enemies killed so far.
    #[must_use]
    pub const fn enemies_killed(&self) -> u32 {
        self.enemies_killed
    }

    /// Playing time so far.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Represents the authoritative Dice Arena world state.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    layout: RoomLayout,
    waves: WaveTable,
    objects: Vec<Obj>,
    next_id: u32,
    player: ObjId,
    target: ObjId,
    camera: Camera,
    stop_frames: u32,
    state: GameState,
    dice: Dice,
    action: Action,
    action_queue: VecDeque<Action>,
    current_wave: u32,
    wave_timer: Duration,
    new_wave_enemies: u32,
    selected_enemy: Option<ObjId>,
    score: Score,
    distance_field: DistanceField,
    frame_count: u64,
    time_since_game_over: Duration,
    aim: Aim,
    game_over_cause: Option<GameOverCause>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world from a validated configuration and a parsed level.
    ///
    /// The distance field is flooded from the target once, the dice receive
    /// their opening roll and the first wave boundary is queued.
    ///
    /// # Panics
    ///
    /// Panics unless the level holds exactly one player and one target.
    #[must_use]
    pub fn new(config: GameConfig, level: &Level) -> Self {
        let layout = RoomLayout::new(config.cell_size, level.columns(), level.rows());
        let mut objects = Vec::with_capacity(level.placements().len());
        let mut next_id = 0;

        for placement in level.placements() {
            let position = layout.cell_to_world(placement.cell, Vec2::ZERO);
            let mut obj = Obj::new(ObjId::new(next_id), placement.kind, position, config.cell_size);
            if placement.kind == ObjKind::Player {
                obj.equip(&config.player);
            }
            objects.push(obj);
            next_id += 1;
        }

        let find = |kind: ObjKind| -> Vec<ObjId> {
            objects
                .iter()
                .filter(|obj| obj.kind() == kind)
                .map(Obj::id)
                .collect()
        };
        let targets = find(ObjKind::Target);
        let players = find(ObjKind::Player);
        assert_eq!(targets.len(), 1, "level must contain exactly one target");
        assert_eq!(players.len(), 1, "level must contain exactly one player");
        let (target, player) = (targets[0], players[0]);

        let cell_size = config.cell_size;
        let target_cell = objects
            .iter()
            .find(|obj| obj.id() == target)
            .map_or(CellCoord::new(0, 0), |obj| obj.cell(cell_size));
        let distance_field = DistanceField::flood_fill(
            layout.columns(),
            layout.rows(),
            target_cell,
            |cell| grid::is_cell_free(&objects, cell, cell_size),
        );

        let waves = config.wave_table();
        let state = if config.start_with_tutorial {
            GameState::Tutorial
        } else {
            GameState::Playing
        };

        let mut world = Self {
            banner: WELCOME_BANNER,
            dice: Dice::new(&config.dice),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            wave_timer: waves.first_duration(),
            layout,
            waves,
            objects,
            next_id,
            player,
            target,
            camera: Camera {
                position: layout.room_origin(layout.world_to_room(Vec2::ZERO)),
                shake: Duration::ZERO,
                offset: Vec2::ZERO,
            },
            stop_frames: 0,
            state,
            action: Action::Roll,
            action_queue: VecDeque::new(),
            current_wave: 0,
            new_wave_enemies: 0,
            selected_enemy: None,
            score: Score::default(),
            distance_field,
            frame_count: 0,
            time_since_game_over: Duration::ZERO,
            aim: Aim {
                target: Vec2::ZERO,
                held: false,
                elapsed: Duration::ZERO,
            },
            game_over_cause: None,
            config,
        };

        let mut opening = Vec::new();
        world.start_new_wave(true, &mut opening);
        world
    }

    /// Captures a deep copy of the world for a later retry.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.clone())
    }

    fn allocate_id(&mut self) -> ObjId {
        let id = ObjId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn spawn(&mut self, obj: Obj) -> ObjId {
        let id = obj.id();
        self.objects.push(obj);
        id
    }

    fn obj(&self, id: ObjId) -> Option<&Obj> {
        self.objects.iter().find(|obj| obj.id() == id && !obj.is_destroyed())
    }

    fn obj_mut(&mut self, id: ObjId) -> Option<&mut Obj> {
        self.objects
            .iter_mut()
            .find(|obj| obj.id() == id && !obj.is_destroyed())
    }

    fn player(&self) -> Option<&Obj> {
        self.obj(self.player)
    }

    fn player_mut(&mut self) -> Option<&mut Obj> {
        let id = self.player;
        self.obj_mut(id)
    }

    fn player_busy(&self) -> bool {
        self.player().map_or(true, Obj::is_moving)
    }

    /// Shows a floating notification above the player.
    fn notify(&mut self, text: impl Into<String>) {
        let cell_size = self.layout.cell_size();
        let anchor = self
            .player()
            .map_or(Vec2::ZERO, |player| player.position() - Vec2::new(0.0, cell_size));
        let id = self.allocate_id();
        let lifetime = secs(self.config.timing.notification_secs);
        let _ = self.spawn(Obj::notification(id, anchor, text, lifetime, cell_size));
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });

        if self.stop_frames > 0 {
            self.stop_frames -= 1;
            return;
        }

        self.frame_count = self.frame_count.saturating_add(1);
        self.update_camera(dt);

        match self.state {
            GameState::GameOver => {
                self.time_since_game_over = self.time_since_game_over.saturating_add(dt);
                return;
            }
            GameState::Tutorial => {
                self.dice.tick(dt, &mut self.rng);
                self.update_objects(dt);
                return;
            }
            GameState::Playing => {}
        }

        self.dice.tick(dt, &mut self.rng);
        self.advance_action_queue(out_events);
        self.update_wave_timer(dt, out_events);
        self.score.elapsed = self.score.elapsed.saturating_add(dt);
        self.update_aim(dt);
        self.update_bullets(dt, out_events);
        self.update_objects(dt);
    }

    fn update_camera(&mut self, dt: Duration) {
        if self.camera.shake.is_zero() {
            self.camera.offset = Vec2::ZERO;
            return;
        }

        self.camera.shake = self.camera.shake.saturating_sub(dt);
        let total = secs(self.config.timing.camera_shake_secs).as_secs_f32().max(f32::EPSILON);
        let strength = SHAKE_AMPLITUDE * (self.camera.shake.as_secs_f32() / total).min(1.0);
        self.camera.offset = Vec2::new(
            self.rng.gen_range(-1.0f32..=1.0) * strength,
            self.rng.gen_range(-1.0f32..=1.0) * strength,
        );
    }

    fn update_aim(&mut self, dt: Duration) {
        if self.action == Action::Shoot && self.aim.held {
            self.aim.elapsed = self.aim.elapsed.saturating_add(dt);
        }
    }

    /// Advances eased moves and notification lifetimes, then sweeps destroyed entities.
    fn update_objects(&mut self, dt: Duration) {
        for obj in &mut self.objects {
            obj.advance_move(dt);
            obj.age(dt);
        }

        self.objects.retain(|obj| !obj.is_destroyed());
        if let Some(selected) = self.selected_enemy {
            if self.obj(selected).is_none() {
                self.selected_enemy = None;
            }
        }
    }

    fn game_over(&mut self, cause: GameOverCause, out_events: &mut Vec<Event>) {
        self.stop_frames = self.config.timing.game_over_freeze_frames;
        self.camera.shake = secs(self.config.timing.camera_shake_secs);
        self.state = GameState::GameOver;
        self.time_since_game_over = Duration::ZERO;
        self.game_over_cause = Some(cause);
        self.selected_enemy = None;
        out_events.push(Event::GameOver { cause });
        tracing::info!(
            ?cause,
            wave = self.current_wave,
            kills = self.score.enemies_killed,
            elapsed = ?self.score.elapsed,
            "game over"
        );
    }
}

/// Deep copy of a [`World`] captured for "try again".
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint(World);

impl Checkpoint {
    /// Fresh world equal to the captured state. The checkpoint stays reusable.
    #[must_use]
    pub fn restore(&self) -> World {
        self.0.clone()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that are not legal in the current state are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::CompleteTutorial => {
            if world.state == GameState::Tutorial {
                world.state = GameState::Playing;
                out_events.push(Event::TutorialCompleted);
                tracing::info!("tutorial completed");
            }
        }
        command => {
            if world.state != GameState::Playing {
                return;
            }

            match command {
                Command::RollDie { slot } => world.request_roll(slot, out_events),
                Command::TakeAction { action } => world.take_action(action, out_events),
                Command::MovePlayer { cell } => world.move_player(cell, out_events),
                Command::SelectEnemy { enemy } => world.select_enemy(enemy, out_events),
                Command::MoveEnemy { cell } => world.move_enemy(cell, out_events),
                Command::Aim { target, held } => world.aim(target, held),
                Command::Fire { target } => world.fire(target, out_events),
                Command::SpawnEnemy { spawn } => world.spawn_enemy(spawn, out_events),
                Command::UnpauseGame => world.unpause(out_events),
                Command::Unstuck => world.unstuck(out_events),
                Command::Cancel => world.cancel(out_events),
                Command::Tick { .. } | Command::CompleteTutorial => {}
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use dice_arena_core::{Action, CellCoord, DieAction, GameOverCause, GameState, ObjId, ObjKind};
    use glam::Vec2;

    use super::{Dice, DistanceField, Obj, RoomLayout, Score, World};
    use crate::{config::secs, grid};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Top-level session state.
    #[must_use]
    pub fn state(world: &World) -> GameState {
        world.state
    }

    /// Turn phase currently being resolved.
    #[must_use]
    pub fn action(world: &World) -> Action {
        world.action
    }

    /// Pending turn phases in resolution order.
    pub fn queued_actions(world: &World) -> impl Iterator<Item = Action> + '_ {
        world.action_queue.iter().copied()
    }

    /// The player's dice.
    #[must_use]
    pub fn dice(world: &World) -> &Dice {
        &world.dice
    }

    /// Reports whether the player could roll the die right now.
    #[must_use]
    pub fn can_roll(world: &World, slot: usize) -> bool {
        world.state == GameState::Playing && world.dice.can_roll(slot, world.action, false)
    }

    /// Reports whether the player could pay for the action right now.
    #[must_use]
    pub fn can_take(world: &World, action: DieAction) -> bool {
        world.state == GameState::Playing
            && world.action == Action::Roll
            && !world.player_busy()
            && world.dice.can_take(action)
    }

    /// Reports whether the unstuck button is available.
    #[must_use]
    pub fn can_unstuck(world: &World) -> bool {
        world.state == GameState::Playing
            && world.action == Action::Roll
            && !world.player_busy()
            && world.dice.any_stuck()
    }

    /// One-based number of the current wave, zero before the first one.
    #[must_use]
    pub fn current_wave(world: &World) -> u32 {
        world.current_wave
    }

    /// Time left until the next wave boundary.
    #[must_use]
    pub fn wave_timer(world: &World) -> Duration {
        world.wave_timer
    }

    /// Enemies of the current wave still waiting to be placed.
    #[must_use]
    pub fn new_wave_enemies(world: &World) -> u32 {
        world.new_wave_enemies
    }

    /// Enemy chosen for the current move, if any.
    #[must_use]
    pub fn selected_enemy(world: &World) -> Option<ObjId> {
        world.selected_enemy
    }

    /// Running score.
    #[must_use]
    pub fn score(world: &World) -> Score {
        world.score
    }

    /// Room dimensions and pixel mapping.
    #[must_use]
    pub fn layout(world: &World) -> &RoomLayout {
        &world.layout
    }

    /// Distance field flooded from the target.
    #[must_use]
    pub fn distance_field(world: &World) -> &DistanceField {
        &world.distance_field
    }

    /// Every live entity in list order.
    #[must_use]
    pub fn objects(world: &World) -> &[Obj] {
        &world.objects
    }

    /// Entity with the provided identifier.
    #[must_use]
    pub fn object(world: &World, id: ObjId) -> Option<&Obj> {
        world.obj(id)
    }

    /// The player entity.
    #[must_use]
    pub fn player(world: &World) -> Option<&Obj> {
        world.player()
    }

    /// The defended target entity.
    #[must_use]
    pub fn target(world: &World) -> Option<&Obj> {
        world.obj(world.target)
    }

    /// First colliding entity occupying the cell.
    #[must_use]
    pub fn entity_at_cell(world: &World, cell: CellCoord) -> Option<&Obj> {
        grid::entity_at_cell(&world.objects, cell, world.layout.cell_size())
    }

    /// Global frame counter that drives animations.
    #[must_use]
    pub fn frame_count(world: &World) -> u64 {
        world.frame_count
    }

    /// Camera position including the shake offset.
    #[must_use]
    pub fn camera(world: &World) -> Vec2 {
        world.camera.position + world.camera.offset
    }

    /// Remaining freeze-frame ticks.
    #[must_use]
    pub fn stop_frames(world: &World) -> u32 {
        world.stop_frames
    }

    /// Time spent on the game over screen after the freeze.
    #[must_use]
    pub fn time_since_game_over(world: &World) -> Duration {
        world.time_since_game_over
    }

    /// Reports whether the retry input is accepted.
    #[must_use]
    pub fn can_retry(world: &World) -> bool {
        world.state == GameState::GameOver
            && world.stop_frames == 0
            && world.time_since_game_over >= secs(world.config.timing.retry_cooldown_secs)
    }

    /// Reason the run ended, once it has.
    #[must_use]
    pub fn game_over_cause(world: &World) -> Option<GameOverCause> {
        world.game_over_cause
    }

    /// Cells the player may step onto during a Move action.
    #[must_use]
    pub fn player_destinations(world: &World) -> Vec<CellCoord> {
        world.player_destinations()
    }

    /// Cells the enemy may step onto.
    #[must_use]
    pub fn enemy_destinations(world: &World, enemy: ObjId) -> Vec<CellCoord> {
        world.enemy_destinations(enemy)
    }

    /// Enemies that have at least one acceptable step.
    #[must_use]
    pub fn movable_enemies(world: &World) -> Vec<ObjId> {
        world.movable_enemies()
    }

    /// Spawn points whose cell is free.
    #[must_use]
    pub fn free_spawns(world: &World) -> Vec<ObjId> {
        world.free_spawns()
    }

    /// Cells the current phase lets the player click.
    #[must_use]
    pub fn highlighted_cells(world: &World) -> Vec<CellCoord> {
        if world.state != GameState::Playing {
            return Vec::new();
        }

        let cell_size = world.layout.cell_size();
        let cells_of = |ids: Vec<ObjId>| -> Vec<CellCoord> {
            ids.into_iter()
                .filter_map(|id| world.obj(id))
                .map(|obj| obj.cell(cell_size))
                .collect()
        };

        match world.action {
            Action::MovePlayer if !world.player_busy() => world.player_destinations(),
            Action::MoveEnemy => match world.selected_enemy {
                Some(enemy) => world.enemy_destinations(enemy),
                None => cells_of(world.movable_enemies()),
            },
            Action::NewWave => cells_of(world.free_spawns()),
            _ => Vec::new(),
        }
    }

    /// Direction bullets would travel if fired at `target` now.
    #[must_use]
    pub fn aim_direction(world: &World, target: Vec2) -> Option<Vec2> {
        world.aim_direction(target)
    }

    /// Pixel point currently aimed at.
    #[must_use]
    pub fn aim_target(world: &World) -> Vec2 {
        world.aim.target
    }

    /// Counts living entities of the provided kind.
    #[must_use]
    pub fn count_kind(world: &World, kind: ObjKind) -> usize {
        world.objects.iter().filter(|obj| obj.kind() == kind).count()
    }
}
