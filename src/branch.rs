//! Branch metric kernel (component F): the dot product of received soft symbols
//! against a branch's expected `+-1`-valued output pattern, with the add-compare
//! -select early-skip rule from the source.

/// `sum(r[j] * e[j])` over one branch's output bits.
#[inline]
pub(crate) fn branch_metric(received: &[f32], expected: &[f32]) -> f32 {
    received
        .iter()
        .zip(expected.iter())
        .map(|(r, e)| r * e)
        .sum()
}

/// Largest possible magnitude a single sample can contribute to a branch metric,
/// given `outputs` code outputs per branch and the largest `|sample|` seen so far
/// in the call. For unit-magnitude samples this is exactly the source's hard-coded
/// `2n`; for larger-magnitude samples it scales up so the skip never discards a
/// branch that could still win.
#[inline]
pub(crate) fn skip_bound(outputs: usize, max_abs_sample: f32) -> f32 {
    2.0 * max_abs_sample.max(1.0) * outputs as f32
}

/// Whether the branch into `to_metric` from `from_metric` can be skipped without
/// computing it, because even the best possible addend couldn't make it win.
#[inline]
pub(crate) fn can_skip(from_metric: f32, to_metric: f32, bound: f32) -> bool {
    to_metric - from_metric > bound
}
