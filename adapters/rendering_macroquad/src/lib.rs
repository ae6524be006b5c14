#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Dice Arena.
//!
//! Built without macroquad's `audio` feature: audio cues are reported
//! through `tracing` instead of being played. Sprites are drawn as colored
//! primitives using a TOML [`Palette`].

mod hud;
mod palette;

pub use palette::{Palette, DEFAULT_PALETTE};

use anyhow::Result;
use dice_arena_core::{Sprite, DICE_COUNT};
use dice_arena_rendering::{Color, FrameInput, Presentation, RenderingBackend, Scene, SceneSprite};
use glam::Vec2;
use macroquad::{
    input::{
        is_key_pressed, is_mouse_button_down, is_mouse_button_pressed, is_mouse_button_released,
        mouse_position, show_mouse, KeyCode, MouseButton,
    },
    shapes::{draw_circle, draw_circle_lines, draw_line, draw_rectangle, draw_rectangle_lines},
    text::draw_text,
};
use std::time::Duration;

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` quits the game loop.
    quit_requested: bool,
    /// `F1` toggles the bounding-box overlay.
    toggle_debug: bool,
    /// `Space` or `Enter` confirms tutorial pages and retries.
    confirm: bool,
    /// `1`, `2` and `3` roll the matching die.
    die_hotkeys: [bool; DICE_COUNT],
    /// Arrow keys or WASD step the player.
    step: Option<(i32, i32)>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let pressed = |keys: &[KeyCode]| keys.iter().any(|key| is_key_pressed(*key));
        let step = [
            ([KeyCode::Left, KeyCode::A], (-1, 0)),
            ([KeyCode::Right, KeyCode::D], (1, 0)),
            ([KeyCode::Up, KeyCode::W], (0, -1)),
            ([KeyCode::Down, KeyCode::S], (0, 1)),
        ]
        .into_iter()
        .find(|(keys, _)| pressed(keys))
        .map(|(_, offset)| offset);

        Self {
            quit_requested: pressed(&[KeyCode::Escape]),
            toggle_debug: pressed(&[KeyCode::F1]),
            confirm: pressed(&[KeyCode::Space, KeyCode::Enter]),
            die_hotkeys: [
                pressed(&[KeyCode::Key1]),
                pressed(&[KeyCode::Key2]),
                pressed(&[KeyCode::Key3]),
            ],
            step,
        }
    }
}

/// Raw pointer observations for one frame.
#[derive(Clone, Copy, Debug, Default)]
struct PointerObservation {
    position: Vec2,
    primary_pressed: bool,
    primary_held: bool,
    primary_released: bool,
    secondary_pressed: bool,
}

impl PointerObservation {
    fn poll() -> Self {
        let (x, y) = mouse_position();
        Self {
            position: Vec2::new(x, y),
            primary_pressed: is_mouse_button_pressed(MouseButton::Left),
            primary_held: is_mouse_button_down(MouseButton::Left),
            primary_released: is_mouse_button_released(MouseButton::Left),
            secondary_pressed: is_mouse_button_pressed(MouseButton::Right),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    palette: Option<Palette>,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            palette: None,
        }
    }
}

impl MacroquadBackend {
    /// Backend with the platform swap interval and the built-in palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an explicit swap interval, `None` keeps the platform default.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Turns vertical sync on or off.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        self.with_swap_interval(Some(i32::from(enabled)))
    }

    /// Configures whether the backend logs frame timing once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Replaces the built-in palette.
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }
}

/// Frame statistics reported once per second of rendered time.
#[derive(Debug, Default)]
struct FrameRate {
    elapsed: Duration,
    frames: u32,
    slowest: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FrameRateReport {
    fps: f32,
    slowest_ms: f32,
}

impl FrameRate {
    fn record(&mut self, frame: Duration) -> Option<FrameRateReport> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.slowest = self.slowest.max(frame);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let report = FrameRateReport {
            fps: self.frames as f32 / self.elapsed.as_secs_f32(),
            slowest_ms: self.slowest.as_secs_f32() * 1000.0,
        };
        *self = Self::default();
        Some(report)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            palette,
        } = self;
        let palette = match palette {
            Some(palette) => palette,
            None => Palette::from_default_manifest()?,
        };

        let Presentation {
            window_title,
            clear_color,
            zoom,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: (scene.grid.width() * zoom).round() as i32,
            window_height: (scene.total_height() * zoom).round() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut frame_rate = FrameRate::default();
            show_mouse(false);

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);
                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let frame_dt =
                    Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                let metrics_before = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let pointer = PointerObservation::poll();
                let frame_input =
                    gather_frame_input_from_observations(&scene, &metrics_before, pointer, keyboard);
                let cursor = frame_input.cursor;

                update_scene(frame_dt, frame_input, &mut scene);

                for cue in scene.cues.drain(..) {
                    tracing::trace!(cue = cue.name(), "audio cue");
                }

                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                draw_field(&scene, &metrics, &palette);
                hud::draw_hud(&scene, &metrics);
                hud::draw_overlay(&scene, &metrics);
                if let Some(cursor) = cursor {
                    draw_cursor(cursor, &scene, &metrics);
                }

                if let Some(report) = frame_rate.record(frame_dt) {
                    if show_fps {
                        tracing::info!(
                            fps = report.fps,
                            slowest_ms = report.slowest_ms,
                            "frame rate"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Mapping from logical scene pixels to screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SceneMetrics {
    pub(crate) scale: f32,
    offset: Vec2,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let world_width = scene.grid.width();
        let world_height = scene.total_height();
        let scale = if world_width <= f32::EPSILON || world_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world_width).min(screen_height / world_height)
        };

        let offset = Vec2::new(
            ((screen_width - world_width * scale) * 0.5).max(0.0),
            ((screen_height - world_height * scale) * 0.5).max(0.0),
        );
        Self { scale, offset }
    }

    /// Screen position of a logical point.
    pub(crate) fn to_screen(&self, point: Vec2) -> (f32, f32) {
        let screen = self.offset + point * self.scale;
        (screen.x, screen.y)
    }

    fn to_logical(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.scale
    }
}

fn gather_frame_input_from_observations(
    scene: &Scene,
    metrics: &SceneMetrics,
    pointer: PointerObservation,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let mut input = FrameInput {
        die_hotkeys: keyboard.die_hotkeys,
        step: keyboard.step,
        toggle_debug: keyboard.toggle_debug,
        confirm: keyboard.confirm,
        ..FrameInput::default()
    };

    if metrics.scale <= f32::EPSILON {
        return input;
    }

    let logical = metrics.to_logical(pointer.position);
    let inside = logical.x >= 0.0
        && logical.y >= 0.0
        && logical.x < scene.grid.width()
        && logical.y < scene.total_height();
    if !inside {
        return input;
    }

    input.cursor = Some(logical);
    input.primary_pressed = pointer.primary_pressed;
    input.primary_held = pointer.primary_held;
    input.primary_released = pointer.primary_released;
    input.secondary_pressed = pointer.secondary_pressed;
    input
}

fn draw_field(scene: &Scene, metrics: &SceneMetrics, palette: &Palette) {
    let cell = scene.grid.cell_size;
    let world = |point: Vec2| metrics.to_screen(point - scene.camera);

    for sprite in &scene.sprites {
        draw_sprite(sprite, cell, metrics, palette, world(sprite.position));
    }

    let highlight = to_macroquad_color(scene.grid.highlight_color);
    for highlighted in &scene.highlighted_cells {
        let (x, y) = world(scene.grid.cell_origin(*highlighted));
        let side = cell * metrics.scale;
        let tint = scene.grid.highlight_color.with_alpha(0.2);
        draw_rectangle(x, y, side, side, to_macroquad_color(tint));
        draw_rectangle_lines(x, y, side, side, metrics.scale, highlight);
    }

    if let Some(selected) = scene.selected_cell {
        let (x, y) = world(scene.grid.cell_origin(selected));
        let side = cell * metrics.scale;
        draw_rectangle_lines(x, y, side, side, 2.0 * metrics.scale, highlight);
    }

    if let Some(aim) = scene.aim {
        let (x1, y1) = world(aim.from);
        let (x2, y2) = world(aim.to);
        draw_line(x1, y1, x2, y2, metrics.scale, highlight);
    }

    let text = to_macroquad_color(Color::from_rgb_u8(255, 255, 255));
    for label in &scene.labels {
        let (x, y) = world(label.position);
        draw_text(&label.text, x, y, cell * 0.6 * metrics.scale, text);
    }

    let debug = to_macroquad_color(Color::new(0.2, 1.0, 0.2, 0.8));
    for bounds in &scene.debug_boxes {
        let (x, y) = world(Vec2::new(bounds.left, bounds.top));
        draw_rectangle_lines(
            x,
            y,
            bounds.width() * metrics.scale,
            bounds.height() * metrics.scale,
            1.0,
            debug,
        );
    }
}

fn draw_sprite(
    sprite: &SceneSprite,
    cell: f32,
    metrics: &SceneMetrics,
    palette: &Palette,
    at: (f32, f32),
) {
    let color = palette.color(sprite.sprite);
    let fill = to_macroquad_color(color);
    let side = cell * metrics.scale;
    let (x, y) = at;
    let bob = if sprite.frame % 2 == 1 { metrics.scale } else { 0.0 };

    match sprite.sprite {
        Sprite::None => {}
        Sprite::Floor | Sprite::Wall => draw_rectangle(x, y, side, side, fill),
        Sprite::Spawn => {
            let inset = side * 0.1;
            draw_rectangle_lines(x + inset, y + inset, side * 0.8, side * 0.8, metrics.scale, fill);
        }
        Sprite::Target => {
            draw_circle(x + side * 0.5, y + side * 0.5, side * 0.35, fill);
            draw_circle_lines(x + side * 0.5, y + side * 0.5, side * 0.45, metrics.scale, fill);
        }
        Sprite::Player | Sprite::Enemy | Sprite::EnemyBig => {
            let radius = if sprite.sprite == Sprite::EnemyBig { 0.45 } else { 0.32 };
            let centre = (x + side * 0.5, y + side * 0.6 - bob);
            draw_circle(centre.0, centre.1, side * radius, fill);
            let facing = if sprite.flipped { -1.0 } else { 1.0 };
            draw_circle(
                centre.0 + facing * side * radius * 0.45,
                centre.1 - side * radius * 0.3,
                side * 0.06,
                to_macroquad_color(color.lighten(0.8)),
            );
        }
        Sprite::EnemyDead => {
            draw_rectangle(x + side * 0.15, y + side * 0.6, side * 0.7, side * 0.3, fill);
        }
        Sprite::Bullet => draw_circle(x + side * 0.5, y + side * 0.5, side * 0.08, fill),
        Sprite::BulletShell => {
            draw_rectangle(x + side * 0.45, y + side * 0.45, side * 0.1, side * 0.06, fill);
        }
        Sprite::PickupShotgun | Sprite::PickupSpeed | Sprite::PickupHealth => {
            draw_rectangle(x + side * 0.25, y + side * 0.25 - bob, side * 0.5, side * 0.5, fill);
        }
    }
}

fn draw_cursor(cursor: Vec2, scene: &Scene, metrics: &SceneMetrics) {
    let (x, y) = metrics.to_screen(cursor);
    let arm = scene.grid.cell_size * 0.3 * metrics.scale;
    let color = to_macroquad_color(Color::from_rgb_u8(255, 255, 255));
    draw_line(x - arm, y, x + arm, y, metrics.scale, color);
    draw_line(x, y - arm, x, y + arm, metrics.scale, color);
}

pub(crate) fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
