//! Aiming, firing and bullet flight.

use std::{f32::consts::TAU, time::Duration};

use dice_arena_core::{
    geometry::{boxes_overlap, segment_rect_intersection, vector_length, vector_normalized},
    Action, BoundingBox, Event, ObjId, ObjKind,
};
use glam::Vec2;
use rand::Rng;

use crate::{entity::Obj, World};

/// Outcome of one bullet's flight during a tick.
#[derive(Clone, Copy, Debug)]
enum Flight {
    Advance { bullet: usize, position: Vec2 },
    Impact { bullet: usize, victim: ObjId, point: Vec2 },
    Escaped { bullet: usize },
}

impl World {
    /// Records the aim point and whether the fire input is held.
    pub(crate) fn aim(&mut self, target: Vec2, held: bool) {
        if self.action != Action::Shoot {
            return;
        }

        self.aim.target = target;
        if !held {
            self.aim.elapsed = Duration::ZERO;
        }
        self.aim.held = held;
    }

    /// Current wobble rotation in radians.
    fn wobble(&self) -> f32 {
        if !self.aim.held {
            return 0.0;
        }

        let player = &self.config.player;
        let phase = TAU * player.aim_wobble_hz * self.aim.elapsed.as_secs_f32();
        player.aim_wobble_degrees.to_radians() * phase.sin()
    }

    pub(crate) fn aim_direction(&self, target: Vec2) -> Option<Vec2> {
        let origin = self.player()?.midpoint();
        let direction = target - origin;
        if vector_length(direction) == 0.0 {
            return None;
        }

        Some(Vec2::from_angle(self.wobble()).rotate(vector_normalized(direction)))
    }

    /// Fires toward `target`, adding spread bullets with the shotgun.
    pub(crate) fn fire(&mut self, target: Vec2, out_events: &mut Vec<Event>) {
        if self.action != Action::Shoot || self.player_busy() {
            return;
        }

        let Some((origin, shotgun, ammo)) = self
            .player()
            .map(|player| (player.midpoint(), player.has_shotgun(), player.ammo()))
        else {
            return;
        };

        if ammo == 0 {
            out_events.push(Event::NoAmmo);
            self.notify("No Ammo!");
            self.set_action(Action::Roll, out_events);
            return;
        }

        let Some(direction) = self.aim_direction(target) else {
            return;
        };

        let player_config = self.config.player.clone();
        let mut angles = vec![0.0_f32];
        if shotgun {
            let spread = player_config.shotgun_spread_degrees;
            let jitter = player_config.spread_jitter_degrees.abs();
            for side in [-1.0_f32, 1.0] {
                let noise = if jitter > 0.0 {
                    self.rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
                angles.push((side * spread + noise).to_radians());
            }
        }

        let cell_size = self.layout.cell_size();
        for angle in &angles {
            let velocity = Vec2::from_angle(*angle).rotate(direction) * player_config.bullet_speed;
            let id = self.allocate_id();
            let _ = self.spawn(Obj::bullet(id, origin, velocity, cell_size));
        }

        let frame_count = self.frame_count;
        let Some(player) = self.player_mut() else {
            return;
        };
        player.spend_shot();
        player.mark_action(frame_count);
        let (shots, ammo) = (player.shots(), player.ammo());

        out_events.push(Event::ShotFired {
            bullets: angles.len(),
            ammo,
        });
        tracing::debug!(bullets = angles.len(), shots, ammo, "shot fired");

        self.aim.held = false;
        self.aim.elapsed = Duration::ZERO;
        if shots == 0 || ammo == 0 {
            self.set_action(Action::Roll, out_events);
        }
    }

    /// Moves bullets, resolving hits only after every flight was computed.
    pub(crate) fn update_bullets(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let room = BoundingBox::new(0.0, 0.0, self.layout.width(), self.layout.height())
            .translated(self.camera.position);
        let seconds = dt.as_secs_f32();

        let flights: Vec<Flight> = self
            .objects
            .iter()
            .enumerate()
            .filter(|(_, obj)| obj.kind() == ObjKind::Bullet && !obj.is_destroyed())
            .map(|(bullet, obj)| {
                let step = obj.velocity() * seconds;
                let start = obj.midpoint();
                let end = start + step;

                match self.nearest_hit(obj, start, end, step) {
                    Some((victim, point)) => Flight::Impact {
                        bullet,
                        victim,
                        point,
                    },
                    None if !room.contains(end) => Flight::Escaped { bullet },
                    None => Flight::Advance {
                        bullet,
                        position: obj.position() + step,
                    },
                }
            })
            .collect();

        for flight in flights {
            match flight {
                Flight::Advance { bullet, position } => self.objects[bullet].set_position(position),
                Flight::Escaped { bullet } => self.objects[bullet].mark_destroyed(),
                Flight::Impact {
                    bullet,
                    victim,
                    point,
                } => {
                    self.objects[bullet].mark_destroyed();
                    let id = self.allocate_id();
                    let cell_size = self.layout.cell_size();
                    let _ = self.spawn(Obj::shell(id, point, cell_size));
                    self.hit(victim, out_events);
                }
            }
        }
    }

    /// Nearest collider crossed by the bullet's path this tick.
    fn nearest_hit(&self, bullet: &Obj, start: Vec2, end: Vec2, step: Vec2) -> Option<(ObjId, Vec2)> {
        let moved = bullet.position() + step;
        self.objects
            .iter()
            .filter(|other| {
                other.collides()
                    && !other.is_destroyed()
                    && !matches!(other.kind(), ObjKind::Player | ObjKind::Bullet)
            })
            .filter_map(|other| {
                let rect = other.world_bounding_box();
                segment_rect_intersection(start, end, rect)
                    .or_else(|| {
                        boxes_overlap(moved, bullet.bounding_box(), other.position(), other.bounding_box())
                            .then_some(start)
                    })
                    .map(|point| (other.id(), point))
            })
            .min_by(|(_, a), (_, b)| {
                vector_length(*a - start).total_cmp(&vector_length(*b - start))
            })
    }

    fn hit(&mut self, victim: ObjId, out_events: &mut Vec<Event>) {
        let cell_size = self.layout.cell_size();
        let Some(obj) = self.obj_mut(victim) else {
            return;
        };
        if !obj.kind().is_enemy() {
            return;
        }

        if !obj.take_damage(1) {
            out_events.push(Event::EnemyHit { enemy: victim });
            return;
        }

        obj.mark_destroyed();
        let position = obj.position();
        let id = self.allocate_id();
        let _ = self.spawn(Obj::new(id, ObjKind::EnemyDead, position, cell_size));
        self.score.enemies_killed += 1;
        out_events.push(Event::EnemyKilled { enemy: victim });
        tracing::debug!(enemy = ?victim, kills = self.score.enemies_killed, "enemy killed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, config::GameConfig, level::Level, query};
    use dice_arena_core::{CellCoord, Command};

    fn shooting_world(layout: &str) -> World {
        let mut world = World::new(GameConfig::default(), &Level::parse(layout).expect("level"));
        world.action_queue.clear();
        world.action = Action::Shoot;
        if let Some(player) = world.player_mut() {
            player.grant_shots();
        }
        world
    }

    fn run(world: &mut World, ticks: usize, events: &mut Vec<Event>) {
        for _ in 0..ticks {
            apply(
                world,
                Command::Tick {
                    dt: Duration::from_millis(16),
                },
                events,
            );
        }
    }

    fn cell_centre(world: &World, column: i32, row: i32) -> Vec2 {
        let layout = query::layout(world);
        layout.cell_to_world(CellCoord::new(column, row), Vec2::ZERO)
            + Vec2::splat(layout.cell_size() * 0.5)
    }

    #[test]
    fn bullet_kills_enemy_and_leaves_remnants() {
        let mut world = shooting_world("########\n#P...ET#\n########");
        let target = cell_centre(&world, 5, 1);
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target }, &mut events);
        assert!(events.contains(&Event::ShotFired { bullets: 1, ammo: 5 }));
        assert_eq!(query::count_kind(&world, ObjKind::Bullet), 1);

        run(&mut world, 30, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyKilled { .. })));
        assert_eq!(query::count_kind(&world, ObjKind::Bullet), 0);
        assert_eq!(query::count_kind(&world, ObjKind::Enemy), 0);
        assert_eq!(query::count_kind(&world, ObjKind::EnemyDead), 1);
        assert_eq!(query::score(&world).enemies_killed(), 1);
        assert!(query::objects(&world)
            .iter()
            .any(|obj| obj.sprite() == dice_arena_core::Sprite::BulletShell));
    }

    #[test]
    fn enemy_killed_in_flight_releases_the_enemy_move() {
        let mut world = shooting_world("#########\n#P...E.T#\n#########");
        let target = cell_centre(&world, 5, 1);
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target }, &mut events);
        apply(&mut world, Command::Cancel, &mut events);
        world.action_queue.push_front(Action::MoveEnemy);
        run(&mut world, 1, &mut events);
        assert_eq!(query::action(&world), Action::MoveEnemy);

        run(&mut world, 60, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyKilled { .. })));
        assert!(query::movable_enemies(&world).is_empty());
        assert_eq!(query::selected_enemy(&world), None);
        assert_eq!(query::action(&world), Action::Roll);
    }

    #[test]
    fn big_enemy_survives_a_single_hit() {
        let mut world = shooting_world("########\n#P...BT#\n########");
        let target = cell_centre(&world, 5, 1);
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target }, &mut events);
        run(&mut world, 30, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyHit { .. })));
        assert_eq!(query::count_kind(&world, ObjKind::EnemyBig), 1);
    }

    #[test]
    fn shot_budget_returns_to_roll() {
        let mut world = shooting_world("#######\n#P...T#\n#######");
        let target = cell_centre(&world, 4, 1);
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target }, &mut events);
        assert_eq!(query::action(&world), Action::Shoot);
        apply(&mut world, Command::Fire { target }, &mut events);
        assert_eq!(query::action(&world), Action::Roll);
        assert_eq!(query::player(&world).map(Obj::ammo), Some(4));
    }

    #[test]
    fn shotgun_fires_three_bullets() {
        let mut world = shooting_world("#######\n#P...T#\n#######");
        if let Some(player) = world.player_mut() {
            player.equip_shotgun();
        }
        let target = cell_centre(&world, 4, 1);
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target }, &mut events);
        assert!(events.contains(&Event::ShotFired { bullets: 3, ammo: 5 }));
        assert_eq!(query::count_kind(&world, ObjKind::Bullet), 3);
    }

    #[test]
    fn firing_at_the_player_is_ignored() {
        let mut world = shooting_world("#######\n#P...T#\n#######");
        let origin = query::player(&world).map(Obj::midpoint).unwrap_or_default();
        let mut events = Vec::new();

        apply(&mut world, Command::Fire { target: origin }, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::count_kind(&world, ObjKind::Bullet), 0);
    }

    #[test]
    fn empty_gun_reports_no_ammo() {
        let mut world = shooting_world("#######\n#P...T#\n#######");
        for _ in 0..6 {
            if let Some(player) = world.player_mut() {
                player.spend_shot();
            }
        }
        let mut events = Vec::new();
        apply(&mut world, Command::Fire { target: Vec2::new(60.0, 24.0) }, &mut events);
        assert!(events.contains(&Event::NoAmmo));
        assert_eq!(query::action(&world), Action::Roll);
    }

    #[test]
    fn held_aim_wobbles() {
        let mut world = shooting_world("#######\n#P...T#\n#######");
        let target = cell_centre(&world, 4, 1);
        let straight = query::aim_direction(&world, target).expect("direction");

        let mut events = Vec::new();
        apply(&mut world, Command::Aim { target, held: true }, &mut events);
        run(&mut world, 10, &mut events);
        let wobbled = query::aim_direction(&world, target).expect("direction");
        assert!(straight.angle_between(wobbled).abs() > 1e-3);
        assert_eq!(query::aim_target(&world), target);

        apply(&mut world, Command::Aim { target, held: false }, &mut events);
        let released = query::aim_direction(&world, target).expect("direction");
        assert!(straight.angle_between(released).abs() < 1e-6);
    }
}
