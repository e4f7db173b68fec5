//! Deterministic RNG oracle for dice rolls.
//!
//! Every roll derives its value from `(game_seed, action_nonce, context)`, so
//! replaying the same action sequence with the same seed reproduces every die
//! face. No RNG state is stored in the game record.

/// Source of deterministic random values.
pub trait RngOracle: Send + Sync {
    /// Produce a value from a seed. Must be a pure function of the seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll one six-sided die, returning a face index in `0..6`.
    fn roll_face(&self, seed: u64) -> u8 {
        (self.next_u32(seed) % 6) as u8
    }

    /// Flip a coin (initiative).
    fn coin_flip(&self, seed: u64) -> bool {
        self.next_u32(seed) & 1 == 0
    }
}

/// PCG-XSH-RR generator used statelessly: each call advances a fresh LCG step
/// from the seed and permutes the result. Fast, tiny, and passes statistical
/// test batteries, which is more than dice need.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Mixes the match seed, the action nonce, and a per-roll context into one
/// seed. Use distinct `context` values when one action needs several
/// independent rolls (one per die in a pool).
pub fn compute_seed(game_seed: u64, nonce: u64, context: u32) -> u64 {
    let mut hash = game_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (context as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_face() {
        let rng = PcgRng;
        let seed = compute_seed(42, 7, 3);
        assert_eq!(rng.roll_face(seed), rng.roll_face(seed));
    }

    #[test]
    fn contexts_decorrelate_rolls() {
        let rng = PcgRng;
        let faces: Vec<u8> = (0..12)
            .map(|die| rng.roll_face(compute_seed(42, 7, die)))
            .collect();
        // Not all twelve dice land on the same face.
        assert!(faces.iter().any(|f| *f != faces[0]));
    }

    #[test]
    fn faces_stay_in_range() {
        let rng = PcgRng;
        for nonce in 0..100 {
            let face = rng.roll_face(compute_seed(1, nonce, 0));
            assert!(face < 6);
        }
    }
}
