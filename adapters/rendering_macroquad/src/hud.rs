//! HUD strip and full-screen overlays.
//!
//! Everything here is drawn in unshifted logical pixels so the HUD does not
//! follow the camera shake.

use dice_arena_core::{Action, BoundingBox, DieAction, DieFace, GameOverCause};
use dice_arena_rendering::{Color, HudButton, HudLayout, HudPresentation, Overlay, Scene};
use macroquad::{
    shapes::{draw_rectangle, draw_rectangle_lines},
    text::{draw_text, measure_text},
};

use crate::{to_macroquad_color, SceneMetrics};

const PANEL: Color = Color::from_rgb_u8(24, 22, 34);
const BUTTON: Color = Color::from_rgb_u8(60, 56, 88);
const TEXT: Color = Color::from_rgb_u8(236, 232, 244);
const MUTED: Color = Color::from_rgb_u8(110, 104, 130);
const HEART: Color = Color::from_rgb_u8(224, 72, 96);
const AMMO: Color = Color::from_rgb_u8(248, 224, 96);

pub(crate) fn draw_hud(scene: &Scene, metrics: &SceneMetrics) {
    let layout = scene.hud_layout();
    let hud = &scene.hud;

    let (x, y) = metrics.to_screen(glam::Vec2::new(0.0, layout.top()));
    draw_rectangle(
        x,
        y,
        layout.width() * metrics.scale,
        layout.height() * metrics.scale,
        to_macroquad_color(PANEL),
    );

    for (slot, die) in hud.dice.iter().enumerate() {
        let rect = layout.button_rect(HudButton::Die(slot));
        let fill = face_color(die.face);
        let fill = if die.rolling { fill.lighten(0.4) } else { fill };
        draw_box(rect, metrics, fill, die.rollable.then_some(TEXT));
        draw_centered(die.face.label(), rect, metrics, 0.3, TEXT);
    }

    for (index, action) in DieAction::ALL.into_iter().enumerate() {
        let rect = layout.button_rect(HudButton::Action(action));
        let affordable = hud.affordable[index];
        let fill = if affordable { BUTTON } else { PANEL.lighten(0.05) };
        let text = if affordable { TEXT } else { MUTED };
        draw_box(rect, metrics, fill, affordable.then_some(face_color(action.face())));
        draw_centered(action_label(action), rect, metrics, 0.45, text);
    }

    if hud.unstuck_available {
        let rect = layout.button_rect(HudButton::Unstuck);
        draw_box(rect, metrics, face_color(DieFace::Stuck), Some(TEXT));
        draw_centered("UNSTUCK", rect, metrics, 0.45, TEXT);
    }

    if hud.next_wave_available {
        let rect = layout.button_rect(HudButton::NextWave);
        draw_box(rect, metrics, BUTTON.lighten(0.2), Some(TEXT));
        draw_centered("NEXT WAVE", rect, metrics, 0.45, TEXT);
    }

    let unit = scene.grid.cell_size;
    let pip = unit * 0.4;
    let hearts = layout.hearts_origin();
    for index in 0..hud.max_health.max(0) {
        let rect = BoundingBox::new(0.0, 0.0, pip, pip)
            .translated(hearts + glam::Vec2::new(index as f32 * pip * 1.5, 0.0));
        let filled = index < hud.health;
        draw_box(rect, metrics, if filled { HEART } else { PANEL }, Some(HEART));
    }

    let ammo = layout.ammo_origin();
    for index in 0..hud.max_ammo {
        let rect = BoundingBox::new(0.0, 0.0, pip * 0.5, pip)
            .translated(ammo + glam::Vec2::new(index as f32 * pip, 0.0));
        let filled = index < hud.ammo;
        draw_box(rect, metrics, if filled { AMMO } else { PANEL }, Some(AMMO));
    }

    let seconds = hud.timer.as_secs();
    let mut status = format!("Wave {}  {}:{:02}", hud.wave, seconds / 60, seconds % 60);
    if hud.action == Action::NewWave && hud.enemies_pending > 0 {
        status.push_str(&format!("  place {} enemies", hud.enemies_pending));
    }
    let (x, y) = metrics.to_screen(layout.wave_label_origin());
    draw_text(&status, x, y, unit * 0.6 * metrics.scale, to_macroquad_color(TEXT));
}

pub(crate) fn draw_overlay(scene: &Scene, metrics: &SceneMetrics) {
    let lines: Vec<String> = match &scene.overlay {
        Overlay::None => return,
        Overlay::Tutorial { lines } => lines.clone(),
        Overlay::GameOver {
            cause,
            enemies_killed,
            elapsed,
            can_retry,
        } => {
            let seconds = elapsed.as_secs();
            let mut lines = vec![
                match cause {
                    GameOverCause::PlayerKilled => "You died".to_owned(),
                    GameOverCause::TargetReached => "The target was reached".to_owned(),
                },
                format!("Enemies killed: {enemies_killed}"),
                format!("Time survived: {}:{:02}", seconds / 60, seconds % 60),
            ];
            if *can_retry {
                lines.push("Click to try again".to_owned());
            }
            lines
        }
    };

    let (x, y) = metrics.to_screen(glam::Vec2::ZERO);
    let width = scene.grid.width() * metrics.scale;
    let height = scene.total_height() * metrics.scale;
    draw_rectangle(x, y, width, height, to_macroquad_color(PANEL.with_alpha(0.8)));

    let font_size = scene.grid.cell_size * 0.75 * metrics.scale;
    let line_height = font_size * 1.4;
    let top = y + (height - line_height * lines.len() as f32) * 0.5;
    for (index, line) in lines.iter().enumerate() {
        let size = measure_text(line, None, font_size as u16, 1.0);
        draw_text(
            line,
            x + (width - size.width) * 0.5,
            top + line_height * (index as f32 + 1.0),
            font_size,
            to_macroquad_color(TEXT),
        );
    }
}

fn draw_box(rect: BoundingBox, metrics: &SceneMetrics, fill: Color, outline: Option<Color>) {
    let (x, y) = metrics.to_screen(glam::Vec2::new(rect.left, rect.top));
    let (w, h) = (rect.width() * metrics.scale, rect.height() * metrics.scale);
    draw_rectangle(x, y, w, h, to_macroquad_color(fill));
    if let Some(outline) = outline {
        draw_rectangle_lines(x, y, w, h, metrics.scale.max(1.0), to_macroquad_color(outline));
    }
}

fn draw_centered(text: &str, rect: BoundingBox, metrics: &SceneMetrics, size: f32, color: Color) {
    let font_size = rect.height() * size * metrics.scale;
    let dimensions = measure_text(text, None, font_size as u16, 1.0);
    let (x, y) = metrics.to_screen(rect.center());
    draw_text(
        text,
        x - dimensions.width * 0.5,
        y + dimensions.height * 0.5,
        font_size,
        to_macroquad_color(color),
    );
}

const fn face_color(face: DieFace) -> Color {
    match face {
        DieFace::Empty => Color::from_rgb_u8(40, 38, 52),
        DieFace::Move => Color::from_rgb_u8(64, 150, 96),
        DieFace::Shoot => Color::from_rgb_u8(200, 96, 64),
        DieFace::Reload => Color::from_rgb_u8(200, 170, 64),
        DieFace::Enemy => Color::from_rgb_u8(150, 48, 72),
        DieFace::Stuck => Color::from_rgb_u8(90, 90, 110),
    }
}

const fn action_label(action: DieAction) -> &'static str {
    match action {
        DieAction::Move => "RUN",
        DieAction::Shoot => "SHOOT",
        DieAction::Reload => "RELOAD",
    }
}
