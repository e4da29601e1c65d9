//! Input Resolver
//!
//! Picks the one acceptable input the player has to press this attempt.

use crate::core::rng::DeterministicRng;
use crate::qte::spec::{InputBinding, InputHandle};

/// The input currently expected by the active challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInput {
    /// Position in the challenge's acceptable-input list.
    pub slot: usize,
    /// Chosen binding.
    pub binding: InputBinding,
}

impl TargetInput {
    /// Target input action.
    pub fn handle(&self) -> &InputHandle {
        &self.binding.handle
    }

    /// Whether `handle` is the expected input.
    #[inline]
    pub fn matches(&self, handle: &InputHandle) -> bool {
        self.binding.handle == *handle
    }
}

/// Choose the target among `inputs`.
///
/// A single candidate is returned without touching the RNG. With several,
/// every candidate has the same chance. Returns `None` only for an empty set.
pub fn select_target(inputs: &[InputBinding], rng: &mut DeterministicRng) -> Option<TargetInput> {
    let (slot, binding) = match inputs {
        [] => return None,
        [only] => (0, only),
        _ => rng.choose_indexed(inputs)?,
    };

    Some(TargetInput {
        slot,
        binding: binding.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(names: &[&str]) -> Vec<InputBinding> {
        names.iter().map(|n| InputBinding::from(*n)).collect()
    }

    #[test]
    fn test_single_input_is_deterministic() {
        let inputs = bindings(&["south"]);
        let mut rng = DeterministicRng::new(9);
        let before = rng.state();

        for _ in 0..10 {
            let target = select_target(&inputs, &mut rng).unwrap();
            assert_eq!(target.slot, 0);
            assert!(target.matches(&InputHandle::new("south")));
        }

        // No randomness consumed
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn test_empty_inputs() {
        let mut rng = DeterministicRng::new(9);
        assert!(select_target(&[], &mut rng).is_none());
    }

    #[test]
    fn test_every_input_reachable() {
        let inputs = bindings(&["north", "south", "east", "west"]);
        let mut rng = DeterministicRng::new(2024);
        let mut counts = [0u32; 4];

        for _ in 0..10_000 {
            let target = select_target(&inputs, &mut rng).unwrap();
            assert_eq!(inputs[target.slot], target.binding);
            counts[target.slot] += 1;
        }

        for (slot, count) in counts.iter().enumerate() {
            assert!(*count > 0, "slot {} was never selected", slot);
            // Roughly uniform: expected 2500 each
            assert!(*count > 2000 && *count < 3000, "slot {} picked {} times", slot, count);
        }
    }

    #[test]
    fn test_same_seed_same_targets() {
        let inputs = bindings(&["a", "b", "c"]);
        let mut rng1 = DeterministicRng::new(31);
        let mut rng2 = DeterministicRng::new(31);

        for _ in 0..100 {
            assert_eq!(
                select_target(&inputs, &mut rng1),
                select_target(&inputs, &mut rng2),
            );
        }
    }
}
