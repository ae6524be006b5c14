//! Dice, action queue, wave clock and grid moves.

use std::time::Duration;

use dice_arena_core::{
    Action, CellCoord, DieAction, DieFace, Event, GameOverCause, ObjId, ObjKind, PickupKind,
};

use crate::{config::secs, entity::Obj, grid, World};

impl World {
    /// Rolls a die on the player's request, ignoring illegal requests.
    pub(crate) fn request_roll(&mut self, slot: usize, out_events: &mut Vec<Event>) {
        if self.player_busy() || !self.dice.can_roll(slot, self.action, false) {
            return;
        }

        self.roll_die(slot, false, out_events);
    }

    fn roll_die(&mut self, slot: usize, ignore_stuck: bool, out_events: &mut Vec<Event>) {
        let face = self.dice.roll(slot, self.action, ignore_stuck, &mut self.rng);
        out_events.push(Event::DieRolled { slot, face });
        tracing::debug!(slot, ?face, ignore_stuck, "die rolled");

        if face == DieFace::Enemy {
            self.action_queue.push_front(Action::MoveEnemy);
        }
    }

    /// Handles a wave boundary: frees locked dice and queues the next wave.
    pub(crate) fn start_new_wave(&mut self, timed: bool, out_events: &mut Vec<Event>) {
        for slot in self.dice.locked_slots() {
            self.roll_die(slot, true, out_events);
        }

        let plan = self.waves.plan(self.current_wave + 1);
        if plan.intermission {
            self.new_wave_enemies = plan.enemies;
            self.action_queue.push_back(Action::Break);
        } else {
            self.current_wave = plan.wave;
            self.wave_timer = plan.duration;
            self.new_wave_enemies = plan.enemies;
            self.action_queue.push_back(Action::NewWave);
        }

        out_events.push(Event::WaveBoundary {
            timed,
            intermission: plan.intermission,
        });
        tracing::info!(
            timed,
            intermission = plan.intermission,
            wave = plan.wave,
            enemies = plan.enemies,
            "wave boundary"
        );

        if !plan.intermission {
            self.announce_wave(out_events);
        }
    }

    fn announce_wave(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::WaveStarted {
            wave: self.current_wave,
            enemies: self.new_wave_enemies,
        });
        self.notify(format!("Wave {}", self.current_wave));
    }

    /// Leaves the intermission and starts the next wave.
    pub(crate) fn unpause(&mut self, out_events: &mut Vec<Event>) {
        if self.action != Action::Break {
            return;
        }

        self.current_wave += 1;
        let plan = self.waves.plan(self.current_wave);
        self.wave_timer = plan.duration;
        self.new_wave_enemies = plan.enemies;
        self.set_action(Action::Roll, out_events);
        self.action_queue.push_front(Action::NewWave);
        tracing::info!(wave = self.current_wave, enemies = plan.enemies, "wave started");
        self.announce_wave(out_events);
    }

    /// Triggers the wave boundary early to free stuck dice.
    pub(crate) fn unstuck(&mut self, out_events: &mut Vec<Event>) {
        if self.action != Action::Roll || self.player_busy() || !self.dice.any_stuck() {
            return;
        }

        self.start_new_wave(false, out_events);
    }

    pub(crate) fn set_action(&mut self, action: Action, out_events: &mut Vec<Event>) {
        self.action = action;
        if action != Action::MoveEnemy {
            self.selected_enemy = None;
        }
        out_events.push(Event::ActionStarted { action });
        tracing::debug!(?action, "action started");
    }

    /// Pops the next queued phase once the player is back in `Roll`.
    pub(crate) fn advance_action_queue(&mut self, out_events: &mut Vec<Event>) {
        if self.action == Action::MoveEnemy {
            self.release_stranded_enemy_move(out_events);
        }

        if self.action == Action::NewWave && self.free_spawns().is_empty() {
            tracing::debug!(dropped = self.new_wave_enemies, "no free spawn point");
            self.new_wave_enemies = 0;
            self.set_action(Action::Roll, out_events);
        }

        if self.action != Action::Roll {
            return;
        }

        let Some(next) = self.action_queue.pop_front() else {
            return;
        };

        let resolvable = match next {
            Action::MoveEnemy => !self.movable_enemies().is_empty(),
            Action::NewWave => self.new_wave_enemies > 0 && !self.free_spawns().is_empty(),
            _ => true,
        };

        if resolvable {
            self.set_action(next, out_events);
        } else {
            if next == Action::NewWave {
                self.new_wave_enemies = 0;
            }
            tracing::debug!(action = ?next, "queued action has nothing to resolve");
        }
    }

    /// Leaves `MoveEnemy` once no enemy can take the step, e.g. after a
    /// bullet in flight killed the last one.
    fn release_stranded_enemy_move(&mut self, out_events: &mut Vec<Event>) {
        if let Some(enemy) = self.selected_enemy {
            if !self.selected_is_moving() && self.enemy_destinations(enemy).is_empty() {
                self.selected_enemy = None;
            }
        }

        if self.selected_enemy.is_none() && self.movable_enemies().is_empty() {
            tracing::debug!("no enemy left to move");
            self.set_action(Action::Roll, out_events);
        }
    }

    /// Counts the wave clock down unless a boundary is already pending.
    pub(crate) fn update_wave_timer(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let boundary_pending = matches!(self.action, Action::Break | Action::NewWave)
            || self
                .action_queue
                .iter()
                .any(|action| matches!(action, Action::Break | Action::NewWave));
        if boundary_pending {
            return;
        }

        self.wave_timer = self.wave_timer.saturating_sub(dt);
        if self.wave_timer.is_zero() {
            self.start_new_wave(true, out_events);
        }
    }

    /// Spends dice on an action.
    pub(crate) fn take_action(&mut self, action: DieAction, out_events: &mut Vec<Event>) {
        if self.action != Action::Roll || self.player_busy() || !self.dice.can_take(action) {
            return;
        }

        if action == DieAction::Shoot && self.player().map_or(0, Obj::ammo) == 0 {
            out_events.push(Event::NoAmmo);
            self.notify("No Ammo!");
            return;
        }

        self.dice.take(action);
        out_events.push(Event::ActionTaken { action });
        tracing::debug!(?action, "action taken");

        match action {
            DieAction::Move => {
                if let Some(player) = self.player_mut() {
                    player.grant_moves();
                }
                self.set_action(Action::MovePlayer, out_events);
            }
            DieAction::Shoot => {
                if let Some(player) = self.player_mut() {
                    player.grant_shots();
                }
                self.aim.held = false;
                self.aim.elapsed = Duration::ZERO;
                self.set_action(Action::Shoot, out_events);
            }
            DieAction::Reload => {
                if let Some(player) = self.player_mut() {
                    player.reload();
                    let ammo = player.ammo();
                    out_events.push(Event::Reloaded { ammo });
                }
            }
        }
    }

    /// Abandons the current move or shoot action.
    pub(crate) fn cancel(&mut self, out_events: &mut Vec<Event>) {
        if !matches!(self.action, Action::MovePlayer | Action::Shoot) || self.player_busy() {
            return;
        }

        self.aim.held = false;
        self.set_action(Action::Roll, out_events);
    }

    pub(crate) fn player_destinations(&self) -> Vec<CellCoord> {
        let Some(player) = self.player() else {
            return Vec::new();
        };

        let cell_size = self.layout.cell_size();
        player
            .cell(cell_size)
            .neighbors()
            .into_iter()
            .filter(|cell| {
                self.layout.contains(*cell) && grid::is_cell_free(&self.objects, *cell, cell_size)
            })
            .collect()
    }

    /// Steps the player onto a neighbouring free cell.
    pub(crate) fn move_player(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.action != Action::MovePlayer
            || self.player_busy()
            || !self.player_destinations().contains(&cell)
        {
            return;
        }

        let cell_size = self.layout.cell_size();
        let destination = self.layout.cell_to_world(cell, self.camera.position);
        let duration = secs(self.config.timing.player_move_secs);
        let frame_count = self.frame_count;
        let Some(player) = self.player_mut() else {
            return;
        };

        let from = player.cell(cell_size);
        player.start_move(destination, duration);
        player.mark_action(frame_count);
        out_events.push(Event::PlayerMoved { from, to: cell });

        self.collect_pickup(cell, out_events);

        let moves_left = self.player_mut().map_or(false, Obj::spend_move);
        if !moves_left {
            self.set_action(Action::Roll, out_events);
        }
    }

    fn collect_pickup(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let cell_size = self.layout.cell_size();
        let Some(pickup) = self.objects.iter_mut().find(|obj| {
            matches!(obj.kind(), ObjKind::Pickup(_))
                && !obj.is_destroyed()
                && obj.cell(cell_size) == cell
        }) else {
            return;
        };

        let ObjKind::Pickup(kind) = pickup.kind() else {
            return;
        };
        pickup.mark_destroyed();

        if let Some(player) = self.player_mut() {
            match kind {
                PickupKind::Shotgun => player.equip_shotgun(),
                PickupKind::Speed => player.raise_move_budget(),
                PickupKind::Health => player.heal(1),
            }
        }

        out_events.push(Event::PickupCollected { kind });
        tracing::debug!(?kind, "pickup collected");
        self.notify(match kind {
            PickupKind::Shotgun => "Shotgun!",
            PickupKind::Speed => "Speed up!",
            PickupKind::Health => "+1 Health",
        });
    }

    pub(crate) fn enemy_destinations(&self, enemy: ObjId) -> Vec<CellCoord> {
        let Some(obj) = self.obj(enemy).filter(|obj| obj.kind().is_enemy()) else {
            return Vec::new();
        };

        let cell_size = self.layout.cell_size();
        let from = obj.cell(cell_size);
        from.neighbors()
            .into_iter()
            .filter(|cell| {
                match grid::entity_at_cell(&self.objects, *cell, cell_size).map(Obj::kind) {
                    None | Some(ObjKind::Target) => {
                        self.distance_field.is_step_acceptable(from, *cell)
                    }
                    Some(kind) if kind == ObjKind::Player || kind.is_enemy() => {
                        self.distance_field.is_step_onto_acceptable(from, *cell)
                    }
                    Some(_) => false,
                }
            })
            .collect()
    }

    pub(crate) fn movable_enemies(&self) -> Vec<ObjId> {
        self.objects
            .iter()
            .filter(|obj| obj.kind().is_enemy() && !obj.is_destroyed())
            .map(Obj::id)
            .filter(|id| !self.enemy_destinations(*id).is_empty())
            .collect()
    }

    pub(crate) fn free_spawns(&self) -> Vec<ObjId> {
        let cell_size = self.layout.cell_size();
        self.objects
            .iter()
            .filter(|obj| obj.kind() == ObjKind::Spawn && !obj.is_destroyed())
            .filter(|obj| grid::is_cell_free(&self.objects, obj.cell(cell_size), cell_size))
            .map(Obj::id)
            .collect()
    }

    /// Chooses the enemy to move during `MoveEnemy`.
    pub(crate) fn select_enemy(&mut self, enemy: ObjId, out_events: &mut Vec<Event>) {
        if self.action != Action::MoveEnemy
            || self.selected_is_moving()
            || self.obj(enemy).map_or(true, Obj::is_moving)
            || !self.movable_enemies().contains(&enemy)
        {
            return;
        }

        self.selected_enemy = Some(enemy);
        out_events.push(Event::EnemySelected { enemy });
    }

    fn selected_is_moving(&self) -> bool {
        self.selected_enemy
            .and_then(|enemy| self.obj(enemy))
            .map_or(false, Obj::is_moving)
    }

    /// Resolves the selected enemy's step onto a highlighted cell.
    pub(crate) fn move_enemy(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.action != Action::MoveEnemy || self.selected_is_moving() {
            return;
        }
        let Some(enemy) = self.selected_enemy else {
            return;
        };
        if !self.enemy_destinations(enemy).contains(&cell) {
            return;
        }

        let cell_size = self.layout.cell_size();
        let occupant = grid::entity_at_cell(&self.objects, cell, cell_size)
            .map(|occupant| (occupant.id(), occupant.kind()));

        match occupant {
            Some((_, ObjKind::Player)) => {
                let damage = self.obj(enemy).map_or(0, Obj::damage);
                let Some(player) = self.player_mut() else {
                    return;
                };
                let killed = player.take_damage(damage);
                let health = player.health();
                out_events.push(Event::PlayerDamaged { health });
                tracing::debug!(?enemy, damage, health, "player damaged");

                if killed {
                    self.game_over(GameOverCause::PlayerKilled, out_events);
                } else {
                    self.camera.shake = secs(self.config.timing.camera_shake_secs) / 2;
                    self.set_action(Action::Roll, out_events);
                }
            }
            Some((_, ObjKind::Target)) => {
                tracing::debug!(?enemy, ?cell, "enemy reached the target");
                self.game_over(GameOverCause::TargetReached, out_events);
            }
            Some((other, _)) => {
                if self.enemy_destinations(other).is_empty() {
                    self.set_action(Action::Roll, out_events);
                } else {
                    self.selected_enemy = Some(other);
                    out_events.push(Event::EnemySelected { enemy: other });
                    tracing::debug!(from = ?enemy, to = ?other, "enemy move redirected");
                }
            }
            None => {
                let destination = self.layout.cell_to_world(cell, self.camera.position);
                let duration = secs(self.config.timing.enemy_move_secs);
                let frame_count = self.frame_count;
                let Some(obj) = self.obj_mut(enemy) else {
                    return;
                };

                let from = obj.cell(cell_size);
                obj.start_move(destination, duration);
                obj.mark_action(frame_count);
                out_events.push(Event::EnemyMoved {
                    enemy,
                    from,
                    to: cell,
                });
                tracing::debug!(?enemy, ?from, to = ?cell, "enemy moved");
                self.set_action(Action::Roll, out_events);
            }
        }
    }

    /// Places the next wave enemy on a free spawn point.
    pub(crate) fn spawn_enemy(&mut self, spawn: ObjId, out_events: &mut Vec<Event>) {
        if self.action != Action::NewWave
            || self.new_wave_enemies == 0
            || !self.free_spawns().contains(&spawn)
        {
            return;
        }

        let cell_size = self.layout.cell_size();
        let Some((position, cell)) = self
            .obj(spawn)
            .map(|obj| (obj.position(), obj.cell(cell_size)))
        else {
            return;
        };

        let kind = self.waves.pick_enemy_kind(self.current_wave, &mut self.rng);
        let id = self.allocate_id();
        let mut enemy = Obj::new(id, kind, position, cell_size);
        enemy.mark_action(self.frame_count);
        let enemy = self.spawn(enemy);
        self.new_wave_enemies -= 1;
        out_events.push(Event::EnemySpawned { enemy, cell, kind });
        tracing::debug!(?enemy, ?cell, ?kind, left = self.new_wave_enemies, "enemy spawned");

        if self.new_wave_enemies > 0 {
            self.action_queue.push_front(Action::NewWave);
        }

        if self.enemy_destinations(enemy).is_empty() {
            self.set_action(Action::Roll, out_events);
            return;
        }

        self.set_action(Action::MoveEnemy, out_events);
        self.selected_enemy = Some(enemy);
        out_events.push(Event::EnemySelected { enemy });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        apply,
        config::{DiceConfig, FaceWeight, GameConfig},
        dice::Dice,
        level::Level,
        query,
    };
    use dice_arena_core::{Command, GameState, DICE_COUNT};

    const CORRIDOR: &str = "#####\n#PT.#\n#####";

    fn world_with(config: GameConfig) -> World {
        World::new(config, &Level::parse(CORRIDOR).expect("valid level"))
    }

    fn settle(world: &mut World, events: &mut Vec<Event>) {
        for _ in 0..60 {
            apply(
                world,
                Command::Tick {
                    dt: Duration::from_millis(16),
                },
                events,
            );
        }
    }

    #[test]
    fn wave_boundary_rerolls_every_locked_die() {
        let mut world = world_with(GameConfig::default());
        world.dice = Dice::new(&world.config.dice);

        let mut events = Vec::new();
        world.start_new_wave(true, &mut events);
        let rolled = events
            .iter()
            .filter(|event| matches!(event, Event::DieRolled { .. }))
            .count();
        assert_eq!(rolled, DICE_COUNT);
        assert!(world.dice.locked_slots().is_empty() || world.dice.any_stuck());
    }

    #[test]
    fn enemy_face_interrupts_the_queue() {
        let config = GameConfig {
            dice: DiceConfig {
                weights: vec![FaceWeight {
                    face: DieFace::Enemy,
                    weight: 1,
                }],
                ..DiceConfig::default()
            },
            ..GameConfig::default()
        };
        let mut world = world_with(config);
        world.action_queue.clear();
        world.action_queue.push_back(Action::Break);
        world.dice = Dice::new(&world.config.dice);

        let mut events = Vec::new();
        world.roll_die(0, true, &mut events);

        assert_eq!(events, vec![Event::DieRolled { slot: 0, face: DieFace::Enemy }]);
        assert_eq!(world.action_queue.front(), Some(&Action::MoveEnemy));
        assert_eq!(world.action_queue.back(), Some(&Action::Break));
    }

    #[test]
    fn move_enemy_without_enemies_resolves_to_roll() {
        let mut world = world_with(GameConfig::default());
        world.action_queue.clear();
        world.action_queue.push_back(Action::MoveEnemy);
        let mut events = Vec::new();
        settle(&mut world, &mut events);
        assert_eq!(query::action(&world), Action::Roll);
        assert!(world.action_queue.is_empty());
        assert_eq!(query::state(&world), GameState::Playing);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ActionStarted { action: Action::MoveEnemy })));
    }
}
