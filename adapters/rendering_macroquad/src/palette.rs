use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use dice_arena_core::Sprite;
use dice_arena_rendering::Color;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Every sprite key that needs a color. [`Sprite::None`] is never drawn.
const ALL_SPRITES: [Sprite; 13] = [
    Sprite::Player,
    Sprite::Enemy,
    Sprite::EnemyBig,
    Sprite::EnemyDead,
    Sprite::Wall,
    Sprite::Bullet,
    Sprite::BulletShell,
    Sprite::Spawn,
    Sprite::Target,
    Sprite::Floor,
    Sprite::PickupShotgun,
    Sprite::PickupSpeed,
    Sprite::PickupHealth,
];

/// Palette shipped with the backend.
pub const DEFAULT_PALETTE: &str = include_str!("../assets/palette.toml");

/// Colors used to draw each sprite as primitives.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: HashMap<Sprite, Color>,
}

impl Palette {
    /// Parses the palette shipped with the backend.
    pub fn from_default_manifest() -> Result<Self> {
        Self::from_toml_str(DEFAULT_PALETTE).context("built-in palette is invalid")
    }

    /// Loads a palette manifest from disk.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read palette manifest at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid palette manifest at {}", path.display()))
    }

    /// Parses a palette manifest.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(contents).context("failed to parse palette manifest toml contents")?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            bail!(
                "unsupported palette manifest version {}; expected {}",
                manifest.version,
                SUPPORTED_MANIFEST_VERSION
            );
        }

        let mut colors = HashMap::with_capacity(ALL_SPRITES.len());
        for (name, value) in manifest.colors {
            let sprite = parse_sprite_key(&name)?;
            let color = parse_hex_color(&value)
                .with_context(|| format!("invalid color for `{name}`"))?;
            let _ = colors.insert(sprite, color);
        }

        for sprite in ALL_SPRITES {
            if !colors.contains_key(&sprite) {
                bail!("palette manifest missing entry for {sprite:?}");
            }
        }

        Ok(Self { colors })
    }

    /// Color of a sprite. Sprites without an entry are drawn transparent.
    #[must_use]
    pub fn color(&self, sprite: Sprite) -> Color {
        self.colors
            .get(&sprite)
            .copied()
            .unwrap_or(Color::new(0.0, 0.0, 0.0, 0.0))
    }
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    colors: HashMap<String, String>,
}

fn parse_sprite_key(name: &str) -> Result<Sprite> {
    ALL_SPRITES
        .into_iter()
        .find(|sprite| format!("{sprite:?}") == name)
        .with_context(|| format!("unknown sprite key `{name}` in palette manifest"))
}

fn parse_hex_color(value: &str) -> Result<Color> {
    let Some(digits) = value.strip_prefix('#') else {
        bail!("color `{value}` must start with '#'");
    };
    if digits.len() != 6 || !digits.chars().all(|digit| digit.is_ascii_hexdigit()) {
        bail!("color `{value}` must have six hex digits");
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16);
    Ok(Color::from_rgb_u8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
