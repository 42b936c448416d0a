//! A soft-decision Viterbi decoder for convolutional codes.
//!
//! The decoder walks a trellis supplied by the caller through the narrow
//! [`TrellisView`] capability interface; it never constructs a trellis,
//! interprets generator polynomials, or encodes anything itself (a small
//! reference builder for simple fixed trellises lives in [`fixed`] for tests
//! and doc examples).
//!
//! A [`Decoder`] is built once per trellis and driven with repeated calls to
//! [`Decoder::decode`]. Each call accepts as many or as few input samples as
//! are on hand and writes as many or as few output bits as the caller's
//! budget allows; state persists across calls, so a block may be fed and
//! drained in arbitrarily small pieces with the same result as a single
//! unlimited call. Once built, a decoder never fails: invariant violations
//! (a caller handing over mismatched buffer sizes, or a `TrellisView`
//! implementation that isn't actually a trellis) are programmer errors and
//! panic rather than returning a `Result`. Only construction, which validates
//! the trellis's declared shape against this crate's size limits
//! ([`consts::MAX_BLOCK_SIZE_BITS`], [`consts::MAX_STREAMS`]), can fail.
//!
//! ```
//! use viterbi_decoder::{Decoder, fixed::FixedTrellis};
//!
//! // Rate 1/2, constraint length 3, generator polynomials (7, 5) octal.
//! let trellis = FixedTrellis::new(3, &[0o7, 0o5], 4, true);
//! let soft = trellis.encode(&[1, 0, 1, 1]);
//!
//! let mut decoder = Decoder::new(&trellis, 8, true).unwrap();
//! let mut out = [0u8; 1];
//! let inputs: [&[f32]; 1] = [&soft];
//! let mut outputs: [&mut [u8]; 1] = [&mut out];
//! let report = decoder.decode(&inputs, &mut outputs, 1);
//! assert_eq!(report.bits_produced, 4);
//! ```

mod active;
mod branch;
mod bits;
mod consts;
mod decoder;
pub mod error;
pub mod fixed;
mod fsm;
mod metrics;
mod savebuffer;
mod traceback;
mod trellis;

pub use consts::{MAX_BLOCK_SIZE_BITS, MAX_STREAMS};
pub use decoder::{DecodeReport, Decoder};
pub use error::DecoderError;
pub use trellis::TrellisView;
