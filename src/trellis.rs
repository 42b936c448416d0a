//! Read-only view over an externally constructed convolutional trellis.
//!
//! The decoder never builds a trellis, parses an encoder specification, or knows
//! anything about generator polynomials. It only walks whatever implements
//! `TrellisView`. A small reference implementation is provided in [`crate::fixed`]
//! for tests and simple callers; production callers are expected to adapt their own
//! trellis-construction code to this trait instead.

/// Narrow, read-only capability interface over a convolutional trellis.
///
/// All indices are zero-based. `from_state` and `to_state` range over
/// `0..self.states()`; `input` ranges over `0..self.input_combinations()`.
pub trait TrellisView {
    /// Number of encoder states, `S`. Always a power of two.
    fn states(&self) -> usize;

    /// Number of code inputs per trellis step, `k`.
    fn code_inputs(&self) -> usize;

    /// Number of code outputs per trellis step, `n`.
    fn code_outputs(&self) -> usize;

    /// Number of input combinations per step, `I = 2^k`.
    fn input_combinations(&self) -> usize {
        1 << self.code_inputs()
    }

    /// Total delay line length, `M`. Also the number of termination tail steps.
    fn delay(&self) -> usize;

    /// Number of information bits per block, per input stream.
    fn block_bits(&self) -> usize;

    /// Whether a zero-tail termination is appended after `block_bits()` steps.
    fn terminate(&self) -> bool;

    /// Destination state and BPSK-mapped expected output pattern (length
    /// `code_outputs()`, each element `-1.0` or `1.0`) for the branch leaving
    /// `from_state` on `input`.
    fn branch(&self, from_state: usize, input: usize) -> (usize, &[f32]);
}
