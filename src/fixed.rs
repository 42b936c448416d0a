//! A small rate-1/n convolutional trellis (component J), built from a
//! constraint length and a set of generator polynomials, exposed read-only
//! through [`TrellisView`].
//!
//! This is a convenience for tests, doc examples, and small standalone callers.
//! Callers with their own trellis-construction code are expected to implement
//! `TrellisView` directly instead of adapting to this type.

use crate::trellis::TrellisView;

/// A rate-1/n, single-input-bit convolutional trellis built from generator
/// polynomials.
///
/// Each state holds the `M = constraint_length - 1` most recent input bits
/// (newest at the top, shifting down and out as new bits arrive), so a branch
/// out of `from_state` on `input` lands on
/// `to_state = (from_state >> 1) | (input << (M - 1))`. For any active-state
/// set reachable after fewer than `M` steps of ramp-up, this map is injective
/// over `(from_state, input)`: two branches out of a set of simultaneously
/// reachable states never collide on the same `to_state`. It stops being
/// injective once the trellis is fully populated, which is exactly what makes
/// later steps' add-compare-select meaningful.
#[derive(Debug)]
pub struct FixedTrellis {
    states: usize,
    delay: usize,
    outputs: usize,
    block_bits: usize,
    terminate: bool,
    to_state: Vec<usize>,
    expected: Vec<Vec<f32>>,
}

impl FixedTrellis {
    /// `constraint_length` is `K`; `polynomials` gives the generator taps for
    /// each of the `n` outputs, MSB-first over a `K`-bit window where bit
    /// `K-1` taps the current input and bit `0` taps the oldest state bit
    /// (e.g. octal `(7, 5)` for `K = 3`).
    pub fn new(constraint_length: u32, polynomials: &[u32], block_bits: usize, terminate: bool) -> Self {
        assert!(constraint_length >= 1, "constraint length must be at least 1");
        assert!(!polynomials.is_empty(), "at least one generator polynomial is required");

        let m = (constraint_length - 1) as usize;
        let states = 1usize << m;
        let outputs = polynomials.len();

        let mut to_state = vec![0usize; states * 2];
        let mut expected = vec![Vec::with_capacity(outputs); states * 2];

        for from_state in 0..states {
            for input in 0..2usize {
                let idx = from_state * 2 + input;
                let window = (input << m) | from_state;

                to_state[idx] = if m == 0 {
                    0
                } else {
                    (from_state >> 1) | (input << (m - 1))
                };

                expected[idx] = polynomials
                    .iter()
                    .map(|&poly| {
                        let parity = (window & poly as usize).count_ones() & 1;
                        if parity == 1 { 1.0 } else { -1.0 }
                    })
                    .collect();
            }
        }

        FixedTrellis {
            states,
            delay: m,
            outputs,
            block_bits,
            terminate,
            to_state,
            expected,
        }
    }

    /// Encode `bits` (one `0`/`1` value per code-input bit) into BPSK-mapped
    /// `+-1.0` soft samples, appending a zero tail if this trellis terminates.
    /// Used by tests and doc examples to build decoder inputs without
    /// hand-computing expected outputs.
    pub fn encode(&self, bits: &[u8]) -> Vec<f32> {
        let mut state = 0usize;
        let mut out = Vec::with_capacity((bits.len() + self.delay) * self.outputs);

        for &bit in bits {
            let (next, expected) = self.branch(state, bit as usize);
            out.extend_from_slice(expected);
            state = next;
        }
        if self.terminate {
            for _ in 0..self.delay {
                let (next, expected) = self.branch(state, 0);
                out.extend_from_slice(expected);
                state = next;
            }
        }

        out
    }
}

impl TrellisView for FixedTrellis {
    fn states(&self) -> usize {
        self.states
    }

    fn code_inputs(&self) -> usize {
        1
    }

    fn code_outputs(&self) -> usize {
        self.outputs
    }

    fn delay(&self) -> usize {
        self.delay
    }

    fn block_bits(&self) -> usize {
        self.block_bits
    }

    fn terminate(&self) -> bool {
        self.terminate
    }

    fn branch(&self, from_state: usize, input: usize) -> (usize, &[f32]) {
        let idx = from_state * 2 + input;
        (self.to_state[idx], &self.expected[idx])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn k3_7_5_matches_worked_example() {
        let trellis = FixedTrellis::new(3, &[0o7, 0o5], 4, true);
        assert_eq!(trellis.states(), 4);
        assert_eq!(trellis.delay(), 2);
        assert_eq!(trellis.code_outputs(), 2);

        let soft = trellis.encode(&[1, 0, 1, 1]);
        let expect: Vec<f32> = [
            1, 1, 1, 0, 0, 0, 0, 1, 0, 1, 1, 1,
        ]
        .iter()
        .map(|&b| if b == 1 { 1.0 } else { -1.0 })
        .collect();

        assert_eq!(soft, expect);
    }

    #[test]
    fn zero_input_returns_to_state_zero_after_tail() {
        let trellis = FixedTrellis::new(3, &[0o7, 0o5], 4, true);
        let mut state = 0usize;
        for &bit in &[1u8, 0, 1, 1, 0, 0] {
            let (next, _) = trellis.branch(state, bit as usize);
            state = next;
        }
        assert_eq!(state, 0);
    }

    #[test]
    fn memoryless_single_state() {
        let trellis = FixedTrellis::new(1, &[0o1], 5, false);
        assert_eq!(trellis.states(), 1);
        assert_eq!(trellis.delay(), 0);

        let (to0, _) = trellis.branch(0, 0);
        let (to1, _) = trellis.branch(0, 1);
        assert_eq!(to0, 0);
        assert_eq!(to1, 0);
    }

    #[test]
    fn ramp_up_active_set_never_collides() {
        // For every step of ramp-up, branches out of the currently-reachable
        // set must land on distinct states (the invariant the decoder's
        // ramp-up phase relies on).
        let trellis = FixedTrellis::new(5, &[0o23, 0o35, 0o27], 8, true);
        let mut active = vec![0usize];

        for _ in 0..trellis.delay() {
            let mut next = Vec::new();
            for &from_state in &active {
                for input in 0..2 {
                    let (to_state, _) = trellis.branch(from_state, input);
                    assert!(!next.contains(&to_state), "collision in active set");
                    next.push(to_state);
                }
            }
            active = next;
        }
    }
}
