//! Frame loop that turns backend input into world commands and mirrors the
//! world into the scene after every frame.

use std::time::Duration;

use dice_arena_core::{Action, Command, DieAction, Event, GameState, ObjKind, Sprite, DICE_COUNT};
use dice_arena_rendering::{
    AimLine, AudioCue, DiePresentation, FrameInput, HudButton, HudPresentation, Overlay, Scene,
    SceneLabel, SceneSprite,
};
use dice_arena_world::{apply, query, Checkpoint, GameConfig, Level, World};
use glam::Vec2;

/// Upper bound on simulation ticks run for a single rendered frame.
const MAX_TICKS_PER_FRAME: u32 = 5;

const TUTORIAL_LINES: [&str; 6] = [
    "Defend the target from the waves.",
    "Roll dice, then spend them on actions:",
    "RUN 1 move die, SHOOT 2 shoot dice, RELOAD 1 reload die.",
    "Enemy faces force you to move an enemy.",
    "Stuck dice stay stuck until the next wave.",
    "Press space to start.",
];

/// Owns the world and the retry checkpoint for the lifetime of the window.
pub(crate) struct Simulation {
    world: World,
    checkpoint: Checkpoint,
    frame_time: Duration,
    accumulator: Duration,
    aiming: bool,
    debug: bool,
    events: Vec<Event>,
}

impl Simulation {
    pub(crate) fn new(config: GameConfig, level: &Level) -> Self {
        let frame_time = config.frame_time();
        let world = World::new(config, level);
        let checkpoint = world.checkpoint();

        Self {
            world,
            checkpoint,
            frame_time,
            accumulator: Duration::ZERO,
            aiming: false,
            debug: false,
            events: Vec::new(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Applies the frame's input, runs the fixed-step ticks that fit into
    /// `dt` and rewrites the scene.
    pub(crate) fn frame(&mut self, dt: Duration, input: &FrameInput, scene: &mut Scene) {
        if input.toggle_debug {
            self.debug = !self.debug;
        }

        for command in self.commands_for(input, scene) {
            apply(&mut self.world, command, &mut self.events);
        }

        self.accumulator += dt;
        let mut ticks = 0;
        while self.accumulator >= self.frame_time {
            if ticks == MAX_TICKS_PER_FRAME {
                self.accumulator = Duration::ZERO;
                break;
            }
            apply(
                &mut self.world,
                Command::Tick {
                    dt: self.frame_time,
                },
                &mut self.events,
            );
            self.accumulator -= self.frame_time;
            ticks += 1;
        }

        if self.events.contains(&Event::TutorialCompleted) {
            self.checkpoint = self.world.checkpoint();
        }

        scene.cues.clear();
        scene
            .cues
            .extend(self.events.drain(..).filter_map(|event| AudioCue::from_event(&event)));
        self.populate_scene(scene);
    }

    fn commands_for(&mut self, input: &FrameInput, scene: &Scene) -> Vec<Command> {
        let mut commands = Vec::new();
        let world = &self.world;

        match query::state(world) {
            GameState::Tutorial => {
                if input.confirm || input.primary_pressed {
                    commands.push(Command::CompleteTutorial);
                }
                return commands;
            }
            GameState::GameOver => {
                if query::can_retry(world) && (input.confirm || input.primary_pressed) {
                    tracing::info!(
                        enemies_killed = query::score(world).enemies_killed(),
                        "retrying from checkpoint"
                    );
                    self.world = self.checkpoint.restore();
                    self.accumulator = Duration::ZERO;
                    self.aiming = false;
                }
                return commands;
            }
            GameState::Playing => {}
        }

        for (slot, pressed) in input.die_hotkeys.iter().enumerate() {
            if *pressed {
                commands.push(Command::RollDie { slot });
            }
        }

        if input.secondary_pressed {
            commands.push(Command::Cancel);
        }

        let action = query::action(world);
        if let (Some((columns, rows)), Action::MovePlayer) = (input.step, action) {
            if let Some(player) = query::player(world) {
                let cell = player.cell(query::layout(world).cell_size());
                commands.push(Command::MovePlayer {
                    cell: cell.offset(columns, rows),
                });
            }
        }

        let Some(cursor) = input.cursor else {
            return commands;
        };

        if action == Action::Shoot {
            if self.aiming && input.primary_released {
                commands.push(Command::Fire { target: cursor });
                self.aiming = false;
            } else {
                commands.push(Command::Aim {
                    target: cursor,
                    held: self.aiming && input.primary_held,
                });
            }
        } else {
            self.aiming = false;
        }

        if !input.primary_pressed {
            return commands;
        }

        if let Some(button) = scene.hud_layout().hit_test(cursor) {
            commands.push(match button {
                HudButton::Die(slot) => Command::RollDie { slot },
                HudButton::Action(action) => Command::TakeAction { action },
                HudButton::Unstuck => Command::Unstuck,
                HudButton::NextWave => Command::UnpauseGame,
            });
            return commands;
        }

        let Some(cell) = scene.grid.cell_at(cursor) else {
            return commands;
        };

        match action {
            Action::MovePlayer => commands.push(Command::MovePlayer { cell }),
            Action::MoveEnemy => {
                let destination = query::selected_enemy(world).map_or(false, |enemy| {
                    query::enemy_destinations(world, enemy).contains(&cell)
                });
                let clicked_enemy = query::entity_at_cell(world, cell)
                    .filter(|obj| obj.kind().is_enemy())
                    .map(|obj| obj.id());

                match (destination, clicked_enemy) {
                    (false, Some(enemy)) => commands.push(Command::SelectEnemy { enemy }),
                    _ => commands.push(Command::MoveEnemy { cell }),
                }
            }
            Action::NewWave => {
                let cell_size = query::layout(world).cell_size();
                let spawn = query::free_spawns(world).into_iter().find(|spawn| {
                    query::object(world, *spawn).map_or(false, |obj| obj.cell(cell_size) == cell)
                });
                if let Some(spawn) = spawn {
                    commands.push(Command::SpawnEnemy { spawn });
                }
            }
            Action::Shoot => {
                self.aiming = true;
                commands.push(Command::Aim {
                    target: cursor,
                    held: true,
                });
            }
            Action::Roll | Action::Break => {}
        }

        commands
    }

    /// Mirrors the current world state into the scene.
    pub(crate) fn populate_scene(&self, scene: &mut Scene) {
        let world = &self.world;
        let frame_count = query::frame_count(world);
        let cell_size = query::layout(world).cell_size();

        scene.camera = query::camera(world);

        let mut drawable: Vec<_> = query::objects(world)
            .iter()
            .filter(|obj| obj.sprite() != Sprite::None)
            .collect();
        drawable.sort_by_key(|obj| obj.draw_priority());
        scene.sprites.clear();
        scene
            .sprites
            .extend(drawable.into_iter().map(|obj| SceneSprite {
                sprite: obj.sprite(),
                position: obj.position(),
                frame: obj.animation_frame(frame_count) as usize,
                flipped: obj.flipped(),
            }));

        scene.labels.clear();
        scene.labels.extend(
            query::objects(world)
                .iter()
                .filter(|obj| obj.kind() == ObjKind::Text)
                .filter_map(|obj| {
                    obj.text().map(|text| SceneLabel {
                        text: text.to_owned(),
                        position: obj.position(),
                    })
                }),
        );

        scene.highlighted_cells = query::highlighted_cells(world);
        scene.selected_cell = query::selected_enemy(world)
            .and_then(|enemy| query::object(world, enemy))
            .map(|obj| obj.cell(cell_size));

        scene.aim = if query::action(world) == Action::Shoot {
            query::player(world).and_then(|player| {
                let from = player.midpoint();
                let target = query::aim_target(world);
                query::aim_direction(world, target).map(|direction| AimLine {
                    from,
                    to: from + direction * from.distance(target),
                })
            })
        } else {
            None
        };

        scene.hud = hud_presentation(world);
        scene.overlay = overlay(world);

        scene.debug_boxes.clear();
        if self.debug {
            scene.debug_boxes.extend(
                query::objects(world)
                    .iter()
                    .filter(|obj| obj.collides())
                    .map(|obj| obj.world_bounding_box()),
            );
        }
    }
}

fn hud_presentation(world: &World) -> HudPresentation {
    let mut dice = [DiePresentation::default(); DICE_COUNT];
    let slots = query::dice(world).slots();
    for (slot, (presentation, die)) in dice.iter_mut().zip(slots).enumerate() {
        *presentation = DiePresentation {
            face: die.shown(),
            rolling: die.is_rolling(),
            rollable: query::can_roll(world, slot),
        };
    }

    let mut hud = HudPresentation {
        dice,
        affordable: DieAction::ALL.map(|action| query::can_take(world, action)),
        unstuck_available: query::can_unstuck(world),
        next_wave_available: query::state(world) == GameState::Playing
            && query::action(world) == Action::Break,
        wave: query::current_wave(world),
        timer: query::wave_timer(world),
        enemies_pending: query::new_wave_enemies(world),
        action: query::action(world),
        ..HudPresentation::default()
    };

    if let Some(player) = query::player(world) {
        hud.health = player.health();
        hud.max_health = player.max_health();
        hud.ammo = player.ammo();
        hud.max_ammo = player.max_ammo();
    }

    hud
}

fn overlay(world: &World) -> Overlay {
    match query::state(world) {
        GameState::Playing => Overlay::None,
        GameState::Tutorial => Overlay::Tutorial {
            lines: TUTORIAL_LINES.iter().map(|line| (*line).to_owned()).collect(),
        },
        GameState::GameOver => match query::game_over_cause(world) {
            Some(cause) => {
                let score = query::score(world);
                Overlay::GameOver {
                    cause,
                    enemies_killed: score.enemies_killed(),
                    elapsed: score.elapsed(),
                    can_retry: query::can_retry(world),
                }
            }
            None => Overlay::None,
        },
    }
}
