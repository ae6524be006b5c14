//! Entity record shared by every object placed in the arena.

use std::time::Duration;

use dice_arena_core::{BoundingBox, CellCoord, Collider, ObjId, ObjKind, PickupKind, Sprite};
use glam::Vec2;

use crate::{
    config::PlayerConfig,
    easing::{interp, Easing},
};

/// Draw priority of floating notifications, above every world entity.
const NOTIFICATION_PRIORITY: i32 = 5;
/// Draw priority of shell remnants, above the floor.
const REMNANT_PRIORITY: i32 = 1;
/// Side of a shell remnant as a fraction of a cell.
const REMNANT_FRACTION: f32 = 0.25;

/// Construction-time attributes of an entity kind.
///
/// Boxes are expressed as fractions of a cell so the table does not depend on
/// the configured cell size.
#[derive(Clone, Copy, Debug)]
struct KindDefaults {
    bbox: [f32; 4],
    draw_priority: i32,
    collides: bool,
    sprite: Sprite,
    frames: u32,
    anim_speed: u32,
    health: i32,
    damage: i32,
}

const FULL_CELL: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

const fn defaults(kind: ObjKind) -> KindDefaults {
    let base = KindDefaults {
        bbox: FULL_CELL,
        draw_priority: 0,
        collides: true,
        sprite: Sprite::None,
        frames: 1,
        anim_speed: 18,
        health: 1,
        damage: 0,
    };

    match kind {
        ObjKind::Player => KindDefaults {
            bbox: [0.3125, 0.4375, 0.6875, 1.0],
            draw_priority: 3,
            sprite: Sprite::Player,
            frames: 4,
            health: 3,
            ..base
        },
        ObjKind::Enemy => KindDefaults {
            bbox: [0.1875, 0.25, 0.8125, 1.0],
            draw_priority: 3,
            sprite: Sprite::Enemy,
            frames: 2,
            anim_speed: 24,
            damage: 1,
            ..base
        },
        ObjKind::EnemyBig => KindDefaults {
            bbox: [0.0625, 0.125, 0.9375, 1.0],
            draw_priority: 3,
            sprite: Sprite::EnemyBig,
            frames: 2,
            anim_speed: 30,
            health: 3,
            damage: 2,
            ..base
        },
        ObjKind::EnemyDead => KindDefaults {
            draw_priority: 1,
            collides: false,
            sprite: Sprite::EnemyDead,
            ..base
        },
        ObjKind::Wall => KindDefaults {
            sprite: Sprite::Wall,
            ..base
        },
        ObjKind::Bullet => KindDefaults {
            bbox: [0.4375, 0.4375, 0.5625, 0.5625],
            draw_priority: 4,
            sprite: Sprite::Bullet,
            ..base
        },
        ObjKind::Spawn => KindDefaults {
            draw_priority: 1,
            collides: false,
            sprite: Sprite::Spawn,
            ..base
        },
        ObjKind::Target => KindDefaults {
            draw_priority: 2,
            sprite: Sprite::Target,
            ..base
        },
        ObjKind::Background => KindDefaults {
            collides: false,
            sprite: Sprite::Floor,
            ..base
        },
        ObjKind::Pickup(pickup) => KindDefaults {
            bbox: [0.25, 0.25, 0.75, 0.75],
            draw_priority: 2,
            collides: false,
            sprite: match pickup {
                PickupKind::Shotgun => Sprite::PickupShotgun,
                PickupKind::Speed => Sprite::PickupSpeed,
                PickupKind::Health => Sprite::PickupHealth,
            },
            ..base
        },
        ObjKind::Text => KindDefaults {
            draw_priority: 2,
            collides: false,
            ..base
        },
    }
}

/// Eased transition between two pixel positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct MoveAnimation {
    from: Vec2,
    to: Vec2,
    elapsed: Duration,
    duration: Duration,
}

/// Anything placed in the arena: characters, tiles, projectiles and markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Obj {
    id: ObjId,
    kind: ObjKind,
    position: Vec2,
    bounding_box: BoundingBox,
    collides: bool,
    draw_priority: i32,
    sprite: Sprite,
    frames: u32,
    anim_speed: u32,
    anim_offset: u64,
    last_action_frame: u64,
    health: i32,
    max_health: i32,
    damage: i32,
    ammo: u32,
    max_ammo: u32,
    moves: u32,
    max_moves: u32,
    shots: u32,
    max_shots: u32,
    shotgun: bool,
    flip: bool,
    velocity: Vec2,
    movement: Option<MoveAnimation>,
    destroy: bool,
    text: Option<String>,
    lifetime: Option<Duration>,
}

impl Obj {
    /// Creates an entity of the provided kind with its default attributes.
    #[must_use]
    pub fn new(id: ObjId, kind: ObjKind, position: Vec2, cell_size: f32) -> Self {
        let defaults = defaults(kind);
        let [left, top, right, bottom] = defaults.bbox;
        let anim_offset = positional_noise(position, defaults.anim_speed);

        Self {
            id,
            kind,
            position,
            bounding_box: BoundingBox::new(
                left * cell_size,
                top * cell_size,
                right * cell_size,
                bottom * cell_size,
            ),
            collides: defaults.collides,
            draw_priority: defaults.draw_priority,
            sprite: defaults.sprite,
            frames: defaults.frames,
            anim_speed: defaults.anim_speed,
            anim_offset,
            last_action_frame: 0,
            health: defaults.health,
            max_health: defaults.health,
            damage: defaults.damage,
            ammo: 0,
            max_ammo: 0,
            moves: 0,
            max_moves: 0,
            shots: 0,
            max_shots: 0,
            shotgun: false,
            flip: false,
            velocity: Vec2::ZERO,
            movement: None,
            destroy: false,
            text: None,
            lifetime: None,
        }
    }

    /// Floating notification that expires after `lifetime`.
    pub(crate) fn notification(
        id: ObjId,
        position: Vec2,
        text: impl Into<String>,
        lifetime: Duration,
        cell_size: f32,
    ) -> Self {
        let mut obj = Self::new(id, ObjKind::Text, position, cell_size);
        obj.draw_priority = NOTIFICATION_PRIORITY;
        obj.text = Some(text.into());
        obj.lifetime = Some(lifetime);
        obj
    }

    /// Spent shell left where a bullet hit something.
    pub(crate) fn shell(id: ObjId, impact: Vec2, cell_size: f32) -> Self {
        let half = cell_size * 0.5;
        let mut obj = Self::new(id, ObjKind::Background, impact - Vec2::splat(half), cell_size);
        let inset = half * (1.0 - REMNANT_FRACTION);
        obj.bounding_box = BoundingBox::new(inset, inset, cell_size - inset, cell_size - inset);
        obj.sprite = Sprite::BulletShell;
        obj.draw_priority = REMNANT_PRIORITY;
        obj
    }

    /// Bullet centred on `origin` travelling with `velocity` pixels per second.
    pub(crate) fn bullet(id: ObjId, origin: Vec2, velocity: Vec2, cell_size: f32) -> Self {
        let half = cell_size * 0.5;
        let mut obj = Self::new(id, ObjKind::Bullet, origin - Vec2::splat(half), cell_size);
        obj.velocity = velocity;
        obj
    }

    /// Applies the player's starting loadout.
    pub(crate) fn equip(&mut self, loadout: &PlayerConfig) {
        self.health = loadout.health;
        self.max_health = loadout.health;
        self.ammo = loadout.ammo;
        self.max_ammo = loadout.ammo;
        self.max_moves = loadout.moves_per_action;
        self.max_shots = loadout.shots_per_action;
    }

    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> ObjId {
        self.id
    }

    /// Type tag.
    #[must_use]
    pub const fn kind(&self) -> ObjKind {
        self.kind
    }

    /// Top-left pixel position the bounding box is relative to.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Local bounding box.
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Bounding box in pixel space.
    #[must_use]
    pub fn world_bounding_box(&self) -> BoundingBox {
        self.bounding_box.translated(self.position)
    }

    /// Centre of the world-space bounding box.
    #[must_use]
    pub fn midpoint(&self) -> Vec2 {
        self.world_bounding_box().center()
    }

    /// Cell the entity belongs to, derived from its bounding box centre.
    ///
    /// A moving entity already belongs to its destination.
    #[must_use]
    pub fn cell(&self, cell_size: f32) -> CellCoord {
        let anchor = self.movement.map_or(self.position, |movement| movement.to);
        let centre = self.bounding_box.translated(anchor).center();
        CellCoord::new(
            (centre.x / cell_size).floor() as i32,
            (centre.y / cell_size).floor() as i32,
        )
    }

    /// Whether the entity takes part in collision checks.
    #[must_use]
    pub const fn collides(&self) -> bool {
        self.collides
    }

    /// Painter's-algorithm ordering; higher values are drawn later.
    #[must_use]
    pub const fn draw_priority(&self) -> i32 {
        self.draw_priority
    }

    /// Sprite drawn for the entity.
    #[must_use]
    pub const fn sprite(&self) -> Sprite {
        self.sprite
    }

    /// Whether the sprite is mirrored horizontally.
    #[must_use]
    pub const fn flipped(&self) -> bool {
        self.flip
    }

    /// Animation frame to show at the provided global frame counter.
    #[must_use]
    pub fn animation_frame(&self, frame_count: u64) -> u32 {
        if self.frames <= 1 {
            return 0;
        }

        let elapsed = frame_count
            .saturating_sub(self.last_action_frame)
            .wrapping_add(self.anim_offset);
        let step = elapsed / u64::from(self.anim_speed.max(1));
        (step % u64::from(self.frames)) as u32
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Health removed from the player on contact.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        self.damage
    }

    /// Loaded ammunition.
    #[must_use]
    pub const fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Magazine size.
    #[must_use]
    pub const fn max_ammo(&self) -> u32 {
        self.max_ammo
    }

    /// Steps left in the current Move action.
    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    /// Steps granted per Move action.
    #[must_use]
    pub const fn max_moves(&self) -> u32 {
        self.max_moves
    }

    /// Shots left in the current Shoot action.
    #[must_use]
    pub const fn shots(&self) -> u32 {
        self.shots
    }

    /// Shots granted per Shoot action.
    #[must_use]
    pub const fn max_shots(&self) -> u32 {
        self.max_shots
    }

    /// Whether the shotgun pickup was collected.
    #[must_use]
    pub const fn has_shotgun(&self) -> bool {
        self.shotgun
    }

    /// Notification text carried by `Text` entities.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether an eased move is still in progress.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    /// Whether the entity is flagged for removal at the end of the tick.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroy
    }

    pub(crate) const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroy = true;
    }

    pub(crate) fn mark_action(&mut self, frame_count: u64) {
        self.last_action_frame = frame_count;
    }

    /// Starts an eased move toward `to`, facing the direction of travel.
    pub(crate) fn start_move(&mut self, to: Vec2, duration: Duration) {
        if to.x < self.position.x {
            self.flip = true;
        } else if to.x > self.position.x {
            self.flip = false;
        }

        self.movement = Some(MoveAnimation {
            from: self.position,
            to,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    /// Advances the eased move, snapping onto the destination when it ends.
    pub(crate) fn advance_move(&mut self, dt: Duration) {
        let Some(mut movement) = self.movement else {
            return;
        };

        movement.elapsed = movement.elapsed.saturating_add(dt);
        if movement.elapsed >= movement.duration {
            self.position = movement.to;
            self.movement = None;
            return;
        }

        self.position = Vec2::new(
            interp(
                movement.from.x,
                movement.to.x,
                movement.elapsed,
                movement.duration,
                Easing::EaseOutCubic,
            ),
            interp(
                movement.from.y,
                movement.to.y,
                movement.elapsed,
                movement.duration,
                Easing::EaseOutCubic,
            ),
        );
        self.movement = Some(movement);
    }

    /// Counts down the notification lifetime and flags expiry.
    pub(crate) fn age(&mut self, dt: Duration) {
        let Some(remaining) = self.lifetime else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.destroy = true;
        }
        self.lifetime = Some(remaining);
    }

    /// Removes health and reports whether the entity died.
    pub(crate) fn take_damage(&mut self, amount: i32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health <= 0
    }

    pub(crate) fn heal(&mut self, amount: i32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    pub(crate) fn grant_moves(&mut self) {
        self.moves = self.max_moves;
    }

    /// Spends one step and reports whether any remain.
    pub(crate) fn spend_move(&mut self) -> bool {
        self.moves = self.moves.saturating_sub(1);
        self.moves > 0
    }

    pub(crate) fn raise_move_budget(&mut self) {
        self.max_moves = self.max_moves.saturating_add(1);
    }

    pub(crate) fn grant_shots(&mut self) {
        self.shots = self.max_shots;
    }

    /// Spends one shot and one round of ammunition.
    pub(crate) fn spend_shot(&mut self) {
        self.shots = self.shots.saturating_sub(1);
        self.ammo = self.ammo.saturating_sub(1);
    }

    pub(crate) fn reload(&mut self) {
        self.ammo = self.max_ammo;
    }

    pub(crate) fn equip_shotgun(&mut self) {
        self.shotgun = true;
    }
}

impl Collider for Obj {
    fn collider_id(&self) -> ObjId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    fn collides(&self) -> bool {
        self.collides
    }
}

/// Frame offset derived from the spawn position so identical entities do not
/// animate in lockstep.
fn positional_noise(position: Vec2, anim_speed: u32) -> u64 {
    let x = position.x.max(0.0) as u64;
    let y = position.y.max(0.0) as u64;
    x.wrapping_mul(7).wrapping_add(y.wrapping_mul(13)) % u64::from(anim_speed.max(1))
}
