#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Dice Arena adapters.
//!
//! The simulation fills a [`Scene`] every frame from world queries; rendering
//! backends only draw it and report raw input through [`FrameInput`]. The HUD
//! geometry lives here so both sides agree on where buttons are.

use anyhow::Result as AnyResult;
use dice_arena_core::{
    Action, BoundingBox, CellCoord, DieAction, DieFace, Event, GameOverCause, Sprite, DICE_COUNT,
};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor in logical pixels, camera offset not applied.
    pub cursor: Option<Vec2>,
    /// Primary button went down this frame.
    pub primary_pressed: bool,
    /// Primary button is down.
    pub primary_held: bool,
    /// Primary button went up this frame.
    pub primary_released: bool,
    /// Secondary button went down this frame.
    pub secondary_pressed: bool,
    /// Die hotkeys pressed this frame.
    pub die_hotkeys: [bool; DICE_COUNT],
    /// Directional step requested this frame as a column/row offset.
    pub step: Option<(i32, i32)>,
    /// Debug overlay toggle pressed this frame.
    pub toggle_debug: bool,
    /// Confirm key (tutorial and retry) pressed this frame.
    pub confirm: bool,
}

/// Describes the playing field in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Side length of a cell in pixels.
    pub cell_size: f32,
    /// Color of the highlight drawn on clickable cells.
    pub highlight_color: Color,
}

impl GridPresentation {
    /// Creates a grid descriptor, rejecting empty grids and non-positive cells.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: f32,
        highlight_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }
        if !(cell_size > 0.0) {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            highlight_color,
        })
    }

    /// Width of the field in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of the field in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Top-left pixel of a cell.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(cell.column() as f32, cell.row() as f32) * self.cell_size
    }

    /// Cell under a world-space point, `None` outside the field.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if point.x < 0.0 || point.y < 0.0 || point.x >= self.width() || point.y >= self.height() {
            return None;
        }

        let column = (point.x / self.cell_size).floor() as i32;
        let row = (point.y / self.cell_size).floor() as i32;
        Some(CellCoord::new(column, row))
    }
}

/// Clickable HUD element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HudButton {
    /// One of the dice.
    Die(usize),
    /// Button paying for an action.
    Action(DieAction),
    /// Frees stuck dice.
    Unstuck,
    /// Leaves the intermission.
    NextWave,
}

/// Pixel placement of every HUD element, laid out below the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudLayout {
    top: f32,
    unit: f32,
    width: f32,
    dice: [BoundingBox; DICE_COUNT],
    actions: [BoundingBox; 3],
    unstuck: BoundingBox,
    next_wave: BoundingBox,
}

impl HudLayout {
    /// Height of the HUD strip in cells.
    pub const HEIGHT_IN_CELLS: f32 = 3.0;

    /// Lays the HUD out under the provided grid.
    #[must_use]
    pub fn new(grid: &GridPresentation) -> Self {
        let unit = grid.cell_size;
        let top = grid.height();
        let width = grid.width();
        let boxed = |x: f32, y: f32, w: f32, h: f32| {
            BoundingBox::new(x * unit, top + y * unit, (x + w) * unit, top + (y + h) * unit)
        };

        let dice = std::array::from_fn(|slot| boxed(0.5 + slot as f32 * 1.5, 0.25, 1.25, 1.25));
        let actions = std::array::from_fn(|index| boxed(5.5 + index as f32 * 2.75, 0.375, 2.5, 1.0));
        let right = width / unit;

        Self {
            top,
            unit,
            width,
            dice,
            actions,
            unstuck: boxed(right - 6.5, 1.875, 2.75, 0.875),
            next_wave: boxed(right - 3.5, 1.875, 3.0, 0.875),
        }
    }

    /// Total height of the HUD strip in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        Self::HEIGHT_IN_CELLS * self.unit
    }

    /// Top edge of the HUD strip.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.top
    }

    /// Width of the HUD strip.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Anchor of the first health heart.
    #[must_use]
    pub fn hearts_origin(&self) -> Vec2 {
        Vec2::new(0.5 * self.unit, self.top + 1.875 * self.unit)
    }

    /// Anchor of the first ammo pip.
    #[must_use]
    pub fn ammo_origin(&self) -> Vec2 {
        Vec2::new(0.5 * self.unit, self.top + 2.5 * self.unit)
    }

    /// Anchor of the wave counter and timer text.
    #[must_use]
    pub fn wave_label_origin(&self) -> Vec2 {
        Vec2::new(self.width * 0.5 - 2.0 * self.unit, self.top + 2.5 * self.unit)
    }

    /// Rectangle occupied by a button.
    ///
    /// # Panics
    ///
    /// Panics when a die slot is out of range.
    #[must_use]
    pub fn button_rect(&self, button: HudButton) -> BoundingBox {
        match button {
            HudButton::Die(slot) => {
                assert!(slot < DICE_COUNT, "die slot {slot} out of range");
                self.dice[slot]
            }
            HudButton::Action(action) => self.actions[action_index(action)],
            HudButton::Unstuck => self.unstuck,
            HudButton::NextWave => self.next_wave,
        }
    }

    /// Button under the point, if any. Dice win over overlapping buttons.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Option<HudButton> {
        let dice = (0..DICE_COUNT).map(HudButton::Die);
        let actions = DieAction::ALL.into_iter().map(HudButton::Action);
        dice.chain(actions)
            .chain([HudButton::Unstuck, HudButton::NextWave])
            .find(|button| self.button_rect(*button).contains(point))
    }
}

const fn action_index(action: DieAction) -> usize {
    match action {
        DieAction::Move => 0,
        DieAction::Shoot => 1,
        DieAction::Reload => 2,
    }
}

/// Sprite instance placed in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSprite {
    /// Sprite key.
    pub sprite: Sprite,
    /// Top-left pixel.
    pub position: Vec2,
    /// Animation frame to show.
    pub frame: usize,
    /// Whether the sprite is mirrored horizontally.
    pub flipped: bool,
}

/// Floating world-space text.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLabel {
    /// Text to draw.
    pub text: String,
    /// Baseline anchor in world pixels.
    pub position: Vec2,
}

/// Line from the player toward the aim point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimLine {
    /// Start in world pixels.
    pub from: Vec2,
    /// End in world pixels.
    pub to: Vec2,
}

/// State of a die as drawn in the HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiePresentation {
    /// Face currently shown, shuffled while rolling.
    pub face: DieFace,
    /// Whether the roll animation is still running.
    pub rolling: bool,
    /// Whether clicking the die rolls it.
    pub rollable: bool,
}

impl Default for DiePresentation {
    fn default() -> Self {
        Self {
            face: DieFace::Empty,
            rolling: false,
            rollable: false,
        }
    }
}

/// Everything the HUD strip shows.
#[derive(Clone, Debug, PartialEq)]
pub struct HudPresentation {
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Rounds left.
    pub ammo: u32,
    /// Magazine size.
    pub max_ammo: u32,
    /// Dice in slot order.
    pub dice: [DiePresentation; DICE_COUNT],
    /// Affordability of each action in [`DieAction::ALL`] order.
    pub affordable: [bool; 3],
    /// Whether the unstuck button is active.
    pub unstuck_available: bool,
    /// Whether the next wave button is active.
    pub next_wave_available: bool,
    /// One-based wave number.
    pub wave: u32,
    /// Time left in the wave.
    pub timer: Duration,
    /// Enemies still to be placed.
    pub enemies_pending: u32,
    /// Turn phase being resolved.
    pub action: Action,
}

impl Default for HudPresentation {
    fn default() -> Self {
        Self {
            health: 0,
            max_health: 0,
            ammo: 0,
            max_ammo: 0,
            dice: [DiePresentation::default(); DICE_COUNT],
            affordable: [false; 3],
            unstuck_available: false,
            next_wave_available: false,
            wave: 0,
            timer: Duration::ZERO,
            enemies_pending: 0,
            action: Action::Roll,
        }
    }
}

/// Full-screen layer drawn above the field.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Overlay {
    /// Nothing above the field.
    #[default]
    None,
    /// Tutorial text, dismissed with the confirm input.
    Tutorial {
        /// Lines shown to the player.
        lines: Vec<String>,
    },
    /// End of run summary.
    GameOver {
        /// Reason the run ended.
        cause: GameOverCause,
        /// Enemies killed.
        enemies_killed: u32,
        /// Playing time.
        elapsed: Duration,
        /// Whether a click restarts the run.
        can_retry: bool,
    },
}

/// Named sound effect triggered by a world event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// A die started rolling.
    DiceRoll,
    /// Someone took a step.
    Step,
    /// The player fired.
    Shot,
    /// A bullet hit an enemy.
    EnemyHit,
    /// An enemy died.
    EnemyDeath,
    /// The player was hurt.
    PlayerHurt,
    /// A pickup was collected.
    Pickup,
    /// The gun was reloaded.
    Reload,
    /// The trigger clicked on an empty gun.
    NoAmmo,
    /// A wave started.
    WaveStart,
    /// The run ended.
    GameOver,
}

impl AudioCue {
    /// Sound cue associated with a world event, if any.
    #[must_use]
    pub fn from_event(event: &Event) -> Option<Self> {
        let cue = match event {
            Event::DieRolled { .. } => Self::DiceRoll,
            Event::PlayerMoved { .. } | Event::EnemyMoved { .. } => Self::Step,
            Event::ShotFired { .. } => Self::Shot,
            Event::EnemyHit { .. } => Self::EnemyHit,
            Event::EnemyKilled { .. } => Self::EnemyDeath,
            Event::PlayerDamaged { .. } => Self::PlayerHurt,
            Event::PickupCollected { .. } => Self::Pickup,
            Event::Reloaded { .. } => Self::Reload,
            Event::NoAmmo => Self::NoAmmo,
            Event::WaveStarted { .. } => Self::WaveStart,
            Event::GameOver { .. } => Self::GameOver,
            _ => return None,
        };
        Some(cue)
    }

    /// Asset name of the cue.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiceRoll => "dice_roll",
            Self::Step => "step",
            Self::Shot => "shot",
            Self::EnemyHit => "enemy_hit",
            Self::EnemyDeath => "enemy_death",
            Self::PlayerHurt => "player_hurt",
            Self::Pickup => "pickup",
            Self::Reload => "reload",
            Self::NoAmmo => "no_ammo",
            Self::WaveStart => "wave_start",
            Self::GameOver => "game_over",
        }
    }
}

/// Scene description combining the field, the HUD and overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Playing field geometry.
    pub grid: GridPresentation,
    /// Camera offset including shake.
    pub camera: Vec2,
    /// Sprites in draw order.
    pub sprites: Vec<SceneSprite>,
    /// Floating texts.
    pub labels: Vec<SceneLabel>,
    /// Cells the player may click.
    pub highlighted_cells: Vec<CellCoord>,
    /// Enemy currently being moved.
    pub selected_cell: Option<CellCoord>,
    /// Aim feedback while shooting.
    pub aim: Option<AimLine>,
    /// HUD contents.
    pub hud: HudPresentation,
    /// Layer drawn above everything else.
    pub overlay: Overlay,
    /// World bounding boxes drawn when the debug overlay is on.
    pub debug_boxes: Vec<BoundingBox>,
    /// Sounds triggered since the previous frame.
    pub cues: Vec<AudioCue>,
}

impl Scene {
    /// Creates an empty scene over the provided grid.
    #[must_use]
    pub fn new(grid: GridPresentation) -> Self {
        Self {
            grid,
            camera: Vec2::ZERO,
            sprites: Vec::new(),
            labels: Vec::new(),
            highlighted_cells: Vec::new(),
            selected_cell: None,
            aim: None,
            hud: HudPresentation::default(),
            overlay: Overlay::None,
            debug_boxes: Vec::new(),
            cues: Vec::new(),
        }
    }

    /// HUD placement derived from the grid.
    #[must_use]
    pub fn hud_layout(&self) -> HudLayout {
        HudLayout::new(&self.grid)
    }

    /// Height of the entire scene including the HUD strip.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.grid.height() + self.hud_layout().height()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Screen pixels per logical pixel.
    pub zoom: f32,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, zoom: f32, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            zoom,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Dice Arena scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and rewrites the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The grid has no cells.
    EmptyGrid {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
    /// Cells must have a positive side length.
    InvalidCellSize {
        /// Provided side length that failed validation.
        cell_size: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must contain cells (received {columns}x{rows})")
            }
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
        }
    }
}

impl Error for RenderingError {}
