//! Deterministic Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. Used to pick the target input of
//! each challenge, so a given turn seed always produces the same prompts.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use qte_engine::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG for one combat turn.
    ///
    /// See [`derive_turn_seed`].
    pub fn for_turn(battle_id: &[u8; 16], turn: u32, acting_unit: &[u8; 16]) -> Self {
        Self::new(derive_turn_seed(battle_id, turn, acting_unit))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    ///
    /// The upper bound is exclusive, so `next_int(len)` reaches every index
    /// of a slice of length `len`.
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Select a random element from a slice, returning its index too.
    pub fn choose_indexed<'a, T>(&mut self, slice: &'a [T]) -> Option<(usize, &'a T)> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            Some((idx, &slice[idx]))
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        self.choose_indexed(slice).map(|(_, item)| item)
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive the target-selection seed for one combat turn.
///
/// # Parameters
///
/// - `battle_id`: Unique battle identifier
/// - `turn`: Turn number within the battle
/// - `acting_unit`: Unit performing the action
pub fn derive_turn_seed(battle_id: &[u8; 16], turn: u32, acting_unit: &[u8; 16]) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"QTE_TURN_SEED_V1");
    hasher.update(battle_id);
    hasher.update(turn.to_le_bytes());
    hasher.update(acting_unit);

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
