//! Dice economy: weighted rolls, roll animation and action payment.

use std::time::Duration;

use dice_arena_core::{Action, DieAction, DieFace, DICE_COUNT};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::config::{ActionThresholds, DiceConfig, FaceWeight};

/// Single die slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Die {
    face: DieFace,
    shown: DieFace,
    rolling: Duration,
}

impl Die {
    const EMPTY: Self = Self {
        face: DieFace::Empty,
        shown: DieFace::Empty,
        rolling: Duration::ZERO,
    };

    /// Logical face, already fixed while the die is still animating.
    #[must_use]
    pub const fn face(&self) -> DieFace {
        self.face
    }

    /// Face currently drawn, shuffled while the die animates.
    #[must_use]
    pub const fn shown(&self) -> DieFace {
        self.shown
    }

    /// Whether the roll animation is still running.
    #[must_use]
    pub fn is_rolling(&self) -> bool {
        !self.rolling.is_zero()
    }
}

/// The player's three dice.
#[derive(Clone, Debug, PartialEq)]
pub struct Dice {
    slots: [Die; DICE_COUNT],
    weights: Vec<FaceWeight>,
    thresholds: ActionThresholds,
    roll_duration: Duration,
}

impl Dice {
    /// Creates three empty dice.
    #[must_use]
    pub fn new(config: &DiceConfig) -> Self {
        Self {
            slots: [Die::EMPTY; DICE_COUNT],
            weights: config.weights.clone(),
            thresholds: config.thresholds,
            roll_duration: config.roll_duration(),
        }
    }

    /// Every die in slot order.
    #[must_use]
    pub fn slots(&self) -> &[Die; DICE_COUNT] {
        &self.slots
    }

    /// Die in the provided slot.
    ///
    /// # Panics
    ///
    /// Panics when `slot` is not a valid die index.
    #[must_use]
    pub fn die(&self, slot: usize) -> &Die {
        assert!(slot < DICE_COUNT, "die slot {slot} out of range");
        &self.slots[slot]
    }

    /// Reports whether the die may be rolled in the current phase.
    ///
    /// With `ignore_stuck` every die can be rolled; otherwise only settled,
    /// usable dice during [`Action::Roll`].
    #[must_use]
    pub fn can_roll(&self, slot: usize, action: Action, ignore_stuck: bool) -> bool {
        let die = self.die(slot);
        if ignore_stuck {
            return true;
        }

        action == Action::Roll
            && !die.is_rolling()
            && !matches!(die.face, DieFace::Stuck | DieFace::Empty)
    }

    /// Rolls the die and returns its new logical face.
    ///
    /// # Panics
    ///
    /// Panics when the die may not be rolled; callers check
    /// [`Dice::can_roll`] first.
    pub fn roll<R>(&mut self, slot: usize, action: Action, ignore_stuck: bool, rng: &mut R) -> DieFace
    where
        R: Rng + ?Sized,
    {
        assert!(
            self.can_roll(slot, action, ignore_stuck),
            "die {slot} cannot be rolled during {action:?}"
        );

        let face = self.pick(rng);
        let shown = self.pick(rng);
        self.slots[slot] = Die {
            face,
            shown,
            rolling: self.roll_duration,
        };
        face
    }

    /// Advances roll animations, shuffling the drawn faces.
    pub fn tick<R>(&mut self, dt: Duration, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for slot in 0..DICE_COUNT {
            if !self.slots[slot].is_rolling() {
                continue;
            }

            let remaining = self.slots[slot].rolling.saturating_sub(dt);
            let shown = if remaining.is_zero() {
                self.slots[slot].face
            } else {
                self.pick(rng)
            };

            let die = &mut self.slots[slot];
            die.rolling = remaining;
            die.shown = shown;
        }
    }

    /// Reports whether enough settled dice show the action's face.
    #[must_use]
    pub fn can_take(&self, action: DieAction) -> bool {
        self.matching(action).count() >= self.thresholds.required(action)
    }

    /// Spends the dice required by the action, turning them `Empty`.
    ///
    /// # Panics
    ///
    /// Panics when the action is not affordable.
    pub fn take(&mut self, action: DieAction) {
        assert!(self.can_take(action), "{action:?} is not affordable");

        let spent: Vec<usize> = self
            .matching(action)
            .take(self.thresholds.required(action))
            .collect();
        for slot in spent {
            self.slots[slot] = Die::EMPTY;
        }
    }

    /// Reports whether any die is locked on `Stuck`.
    #[must_use]
    pub fn any_stuck(&self) -> bool {
        self.slots.iter().any(|die| die.face == DieFace::Stuck)
    }

    /// Slots a wave boundary rerolls: stuck or spent dice.
    #[must_use]
    pub fn locked_slots(&self) -> Vec<usize> {
        (0..DICE_COUNT)
            .filter(|&slot| matches!(self.slots[slot].face, DieFace::Stuck | DieFace::Empty))
            .collect()
    }

    fn matching(&self, action: DieAction) -> impl Iterator<Item = usize> + '_ {
        let face = action.face();
        (0..DICE_COUNT)
            .filter(move |&slot| self.slots[slot].face == face && !self.slots[slot].is_rolling())
    }

    fn pick<R>(&self, rng: &mut R) -> DieFace
    where
        R: Rng + ?Sized,
    {
        match WeightedIndex::new(self.weights.iter().map(|weight| weight.weight)) {
            Ok(distribution) => self.weights[distribution.sample(rng)].face,
            Err(_) => DieFace::Stuck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn settle(dice: &mut Dice, rng: &mut ChaCha8Rng) {
        dice.tick(Duration::from_secs(5), rng);
        assert!(!dice.slots().iter().any(Die::is_rolling));
    }

    fn only(face: DieFace) -> DiceConfig {
        DiceConfig {
            weights: vec![FaceWeight { face, weight: 1 }],
            ..DiceConfig::default()
        }
    }

    #[test]
    fn fresh_dice_are_empty_and_only_forced_rolls_apply() {
        let dice = Dice::new(&DiceConfig::default());
        for slot in 0..DICE_COUNT {
            assert_eq!(dice.die(slot).face(), DieFace::Empty);
            assert!(!dice.can_roll(slot, Action::Roll, false));
            assert!(dice.can_roll(slot, Action::Shoot, true));
        }
    }

    #[test]
    fn rolls_stay_in_weighted_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = DiceConfig {
            weights: vec![
                FaceWeight {
                    face: DieFace::Move,
                    weight: 1,
                },
                FaceWeight {
                    face: DieFace::Reload,
                    weight: 1,
                },
            ],
            ..DiceConfig::default()
        };
        let mut dice = Dice::new(&config);
        for _ in 0..64 {
            let face = dice.roll(0, Action::Roll, true, &mut rng);
            assert!(matches!(face, DieFace::Move | DieFace::Reload));
            assert!(dice.die(0).is_rolling());
            dice.tick(Duration::from_millis(100), &mut rng);
            assert!(matches!(dice.die(0).shown(), DieFace::Move | DieFace::Reload));
        }
    }

    #[test]
    fn animation_settles_on_logical_face() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut dice = Dice::new(&DiceConfig::default());
        let face = dice.roll(1, Action::Roll, true, &mut rng);
        assert!(!dice.can_roll(1, Action::Roll, false));
        settle(&mut dice, &mut rng);
        assert_eq!(dice.die(1).shown(), face);
    }

    #[test]
    fn rolling_dice_do_not_pay_for_actions() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut dice = Dice::new(&only(DieFace::Move));
        let _ = dice.roll(0, Action::Roll, true, &mut rng);
        assert!(!dice.can_take(DieAction::Move));
        settle(&mut dice, &mut rng);
        assert!(dice.can_take(DieAction::Move));
    }

    #[test]
    fn taking_action_empties_exactly_the_required_dice() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut dice = Dice::new(&only(DieFace::Shoot));
        for slot in 0..DICE_COUNT {
            let _ = dice.roll(slot, Action::Roll, true, &mut rng);
        }
        settle(&mut dice, &mut rng);

        assert!(!dice.can_take(DieAction::Move));
        dice.take(DieAction::Shoot);
        let faces: Vec<DieFace> = dice.slots().iter().map(Die::face).collect();
        assert_eq!(faces, vec![DieFace::Empty, DieFace::Empty, DieFace::Shoot]);
        assert!(!dice.can_take(DieAction::Shoot));
        assert_eq!(dice.locked_slots(), vec![0, 1]);
    }

    #[test]
    fn stuck_dice_need_forced_roll() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut dice = Dice::new(&only(DieFace::Stuck));
        let _ = dice.roll(2, Action::Roll, true, &mut rng);
        settle(&mut dice, &mut rng);
        assert!(dice.any_stuck());
        assert!(!dice.can_roll(2, Action::Roll, false));
        assert!(dice.can_roll(2, Action::Roll, true));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn slot_beyond_dice_count_panics() {
        let dice = Dice::new(&DiceConfig::default());
        let _ = dice.die(DICE_COUNT);
    }

    #[test]
    #[should_panic(expected = "not affordable")]
    fn taking_unaffordable_action_panics() {
        let mut dice = Dice::new(&DiceConfig::default());
        dice.take(DieAction::Reload);
    }
}
