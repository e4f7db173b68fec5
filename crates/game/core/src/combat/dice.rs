//! Dice pools and face tables.
//!
//! Face values are rules constants, not content data. Rolls are resolved
//! through the [`RngOracle`](crate::env::RngOracle) so every face is a pure
//! function of `(game_seed, nonce, context)`.

use crate::env::RngOracle;

/// Attack die colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackDie {
    Blue,
    Green,
    Yellow,
    Red,
}

/// Defense die colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefenseDie {
    White,
    Black,
}

/// Which pool a reroll or grant applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RollSide {
    Attack,
    Defense,
}

/// One rolled attack face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackFace {
    pub accuracy: u8,
    pub damage: u8,
    pub surge: u8,
}

/// One rolled defense face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseFace {
    pub block: u8,
    pub evade: u8,
    pub dodge: bool,
}

const fn af(accuracy: u8, damage: u8, surge: u8) -> AttackFace {
    AttackFace {
        accuracy,
        damage,
        surge,
    }
}

const fn df(block: u8, evade: u8) -> DefenseFace {
    DefenseFace {
        block,
        evade,
        dodge: false,
    }
}

const DODGE: DefenseFace = DefenseFace {
    block: 0,
    evade: 0,
    dodge: true,
};

impl AttackDie {
    pub fn faces(self) -> &'static [AttackFace; 6] {
        match self {
            // Accuracy-heavy ranged die.
            AttackDie::Blue => {
                const FACES: [AttackFace; 6] = [
                    af(2, 1, 0),
                    af(2, 0, 1),
                    af(3, 2, 0),
                    af(3, 1, 1),
                    af(4, 2, 0),
                    af(5, 1, 0),
                ];
                &FACES
            }
            // Balanced die.
            AttackDie::Green => {
                const FACES: [AttackFace; 6] = [
                    af(1, 1, 0),
                    af(1, 1, 1),
                    af(1, 2, 0),
                    af(2, 1, 1),
                    af(2, 2, 0),
                    af(3, 2, 0),
                ];
                &FACES
            }
            // Surge-heavy die.
            AttackDie::Yellow => {
                const FACES: [AttackFace; 6] = [
                    af(0, 0, 1),
                    af(0, 1, 2),
                    af(1, 2, 0),
                    af(1, 1, 1),
                    af(2, 0, 2),
                    af(2, 1, 1),
                ];
                &FACES
            }
            // Damage-heavy melee die, no accuracy.
            AttackDie::Red => {
                const FACES: [AttackFace; 6] = [
                    af(0, 1, 0),
                    af(0, 2, 0),
                    af(0, 2, 0),
                    af(0, 2, 1),
                    af(0, 3, 0),
                    af(0, 3, 1),
                ];
                &FACES
            }
        }
    }

    pub fn roll(self, rng: &dyn RngOracle, seed: u64) -> AttackFace {
        self.faces()[rng.roll_face(seed) as usize]
    }
}

impl DefenseDie {
    pub fn faces(self) -> &'static [DefenseFace; 6] {
        match self {
            // The white die carries the dodge face.
            DefenseDie::White => {
                const FACES: [DefenseFace; 6] =
                    [df(0, 0), df(1, 0), df(0, 1), df(1, 1), df(2, 0), DODGE];
                &FACES
            }
            DefenseDie::Black => {
                const FACES: [DefenseFace; 6] =
                    [df(1, 0), df(1, 0), df(2, 0), df(2, 0), df(3, 0), df(0, 1)];
                &FACES
            }
        }
    }

    pub fn roll(self, rng: &dyn RngOracle, seed: u64) -> DefenseFace {
        self.faces()[rng.roll_face(seed) as usize]
    }
}

/// Aggregated attack pool results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackTotals {
    pub accuracy: u32,
    pub damage: u32,
    pub surge: u32,
}

impl AttackTotals {
    pub fn sum(faces: &[AttackFace]) -> Self {
        faces.iter().fold(Self::default(), |mut acc, face| {
            acc.accuracy += face.accuracy as u32;
            acc.damage += face.damage as u32;
            acc.surge += face.surge as u32;
            acc
        })
    }
}

/// Aggregated defense pool results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseTotals {
    pub block: u32,
    pub evade: u32,
    pub dodge: bool,
}

impl DefenseTotals {
    pub fn sum(faces: &[DefenseFace]) -> Self {
        faces.iter().fold(Self::default(), |mut acc, face| {
            acc.block += face.block as u32;
            acc.evade += face.evade as u32;
            acc.dodge |= face.dodge;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PcgRng;

    #[test]
    fn rolls_are_deterministic_per_seed() {
        let rng = PcgRng;
        assert_eq!(AttackDie::Blue.roll(&rng, 17), AttackDie::Blue.roll(&rng, 17));
        assert_eq!(DefenseDie::White.roll(&rng, 17), DefenseDie::White.roll(&rng, 17));
    }

    #[test]
    fn totals_aggregate_per_die_results() {
        let faces = [af(2, 1, 0), af(0, 3, 1), af(1, 0, 2)];
        let totals = AttackTotals::sum(&faces);
        assert_eq!(totals.accuracy, 3);
        assert_eq!(totals.damage, 4);
        assert_eq!(totals.surge, 3);
    }

    #[test]
    fn any_dodge_face_marks_the_pool() {
        let faces = [df(2, 0), DODGE];
        assert!(DefenseTotals::sum(&faces).dodge);
        assert_eq!(DefenseTotals::sum(&faces).block, 2);
    }
}
