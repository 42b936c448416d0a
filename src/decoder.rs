//! The decoder: streaming glue (component H) driving the five-state FSM
//! (component E) over the branch metric kernel (component F), state metric banks
//! (component B), active-state sets (component C), and traceback grid
//! (component D), emitting bits through the traceback/output layer (component G).

use crate::active::ActiveSets;
use crate::branch;
use crate::bits;
use crate::consts::MAX_STREAMS;
use crate::error::{DecoderError, Result};
use crate::fsm::{Continuation, FsmState};
use crate::metrics::{MetricBanks, SENTINEL};
use crate::savebuffer::SaveBuffer;
use crate::traceback::TracebackGrid;
use crate::trellis::TrellisView;

/// Outcome of one [`Decoder::decode`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeReport {
    /// Bits written to each output stream this call (same count for every
    /// stream, since all `k` streams advance through the trellis in lockstep).
    pub bits_produced: usize,
    /// Samples consumed from each input stream this call: one entry per stream
    /// as passed to `decode` (length 1 for muxed input, length `n` otherwise).
    pub symbols_consumed: Vec<usize>,
}

/// A soft-decision Viterbi decoder over a [`TrellisView`].
///
/// Construct once per trellis and call [`decode`](Decoder::decode) repeatedly;
/// state persists across calls so a block may be fed in arbitrarily small
/// pieces, and a decoded block may be drained in arbitrarily small pieces, with
/// identical results to a single unlimited call (see the crate root docs for the
/// streaming and pruning guarantees this upholds).
#[derive(Debug)]
pub struct Decoder<'t, T: TrellisView + ?Sized> {
    trellis: &'t T,
    sample_precision: u32,
    mux_inputs: bool,
    total_steps: usize,

    metrics: MetricBanks,
    active: ActiveSets,
    traceback: TracebackGrid,
    save: SaveBuffer,
    cont: Continuation,
}

impl<'t, T: TrellisView + ?Sized> Decoder<'t, T> {
    /// Build a decoder over `trellis`. `sample_precision` only constrains the
    /// accepted range (`0..=32`); the decoder does not otherwise act on it, since
    /// the metric arithmetic is plain `f32` regardless of the nominal ADC
    /// precision the samples came from. `mux_inputs` selects the input layout
    /// every subsequent `decode` call uses (see [`decode`](Decoder::decode)).
    pub fn new(trellis: &'t T, sample_precision: u32, mux_inputs: bool) -> Result<Self> {
        if sample_precision > 32 {
            return Err(DecoderError::InvalidSamplePrecision(sample_precision));
        }
        if trellis.block_bits() > crate::consts::MAX_BLOCK_SIZE_BITS {
            return Err(DecoderError::BlockTooLarge(trellis.block_bits()));
        }
        let widest = trellis.code_outputs().max(trellis.code_inputs());
        if widest > MAX_STREAMS {
            return Err(DecoderError::TooManyStreams(widest));
        }

        let states = trellis.states();
        let total_steps = trellis.block_bits() + if trellis.terminate() { trellis.delay() } else { 0 };

        Ok(Decoder {
            trellis,
            sample_precision,
            mux_inputs,
            total_steps,
            metrics: MetricBanks::new(states),
            active: ActiveSets::new(states),
            traceback: TracebackGrid::new(total_steps, states),
            save: SaveBuffer::new(trellis.code_inputs(), trellis.block_bits()),
            cont: Continuation::new(),
        })
    }

    /// The sample precision this decoder was constructed with.
    pub fn sample_precision(&self) -> u32 {
        self.sample_precision
    }

    /// Decode as much as `inputs` and `output_byte_budget` allow.
    ///
    /// `inputs` holds one slice per input stream: a single interleaved stream
    /// when this decoder was built with `mux_inputs = true` (step `i` reads
    /// samples `[i*n .. i*n+n)`), or `n` parallel streams otherwise (step `i`
    /// reads sample `i` of each). `outputs` holds `k` writable byte buffers, each
    /// at least `output_byte_budget` bytes; bits are packed LSB-first, byte index
    /// increasing. May decode across several blocks, or stop partway through one,
    /// depending on how far the budget and available samples reach; the next
    /// call resumes exactly where this one left off.
    pub fn decode(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [u8]],
        output_byte_budget: usize,
    ) -> DecodeReport {
        let n = self.trellis.code_outputs();
        let budget_bits = output_byte_budget * 8;
        let mut produced = 0usize;

        // Drain any tail left over from a previous call's block before doing any
        // new work; this can, by itself, exhaust the whole budget.
        if self.save.saved_bits > 0 {
            let copy = budget_bits.min(self.save.saved_bits);
            for (stream, out) in outputs.iter_mut().enumerate() {
                self.save.drain_into(stream, out, copy);
            }
            if copy < self.save.saved_bits {
                self.save.advance(copy);
                return DecodeReport {
                    bits_produced: copy,
                    symbols_consumed: vec![0; inputs.len()],
                };
            }
            self.save.clear();
            produced = copy;
        }

        let input_len = if self.mux_inputs {
            inputs[0].len() / n
        } else {
            inputs[0].len()
        };
        let mut in_idx = 0usize;

        loop {
            if produced >= budget_bits {
                break;
            }

            match self.cont.fsm {
                FsmState::Init => self.do_init(),

                FsmState::Up => {
                    // Capped at block_bits too: a block shorter than the delay
                    // line never finishes ramping up to S states before it has
                    // to start winding down again.
                    let up_end = self.trellis.delay().min(self.trellis.block_bits());
                    if self.cont.time_count < up_end && in_idx < input_len {
                        self.up_step(inputs, in_idx);
                        in_idx += 1;
                    }
                    if self.cont.time_count >= up_end {
                        self.cont.fsm = if up_end == self.trellis.block_bits() {
                            if self.trellis.terminate() {
                                FsmState::Term
                            } else {
                                FsmState::Output
                            }
                        } else {
                            FsmState::Middle
                        };
                    } else if in_idx >= input_len {
                        break;
                    }
                }

                FsmState::Middle => {
                    let block_bits = self.trellis.block_bits();
                    if self.cont.time_count < block_bits && in_idx < input_len {
                        self.middle_step(inputs, in_idx);
                        in_idx += 1;
                    }
                    if self.cont.time_count == block_bits {
                        self.cont.fsm = if self.trellis.terminate() {
                            FsmState::Term
                        } else {
                            FsmState::Output
                        };
                    } else if in_idx >= input_len {
                        break;
                    }
                }

                FsmState::Term => {
                    if self.cont.time_count < self.total_steps && in_idx < input_len {
                        self.term_step(inputs, in_idx);
                        in_idx += 1;
                    }
                    if self.cont.time_count == self.total_steps {
                        self.cont.fsm = FsmState::Output;
                    } else if in_idx >= input_len {
                        break;
                    }
                }

                FsmState::Output => {
                    let emitted = self.run_output(outputs, output_byte_budget, produced);
                    produced += emitted;
                    self.cont = Continuation::new();
                }
            }
        }

        let symbols_consumed = if self.mux_inputs {
            vec![in_idx * n]
        } else {
            vec![in_idx; inputs.len()]
        };

        DecodeReport {
            bits_produced: produced,
            symbols_consumed,
        }
    }

    fn do_init(&mut self) {
        self.cont.g = 0;
        self.cont.time_count = 0;
        self.metrics.zero_origin(0);
        self.active.reset_to_origin(0);
        self.save.clear();
        self.cont.fsm = FsmState::Up;
    }

    /// Gather the `n` received samples for trellis step `step` into `scratch`
    /// (only used for the non-muxed layout) and return a slice over them.
    fn received_for_step<'a>(&self, inputs: &'a [&'a [f32]], step: usize, n: usize, scratch: &'a mut [f32; MAX_STREAMS]) -> &'a [f32] {
        if self.mux_inputs {
            &inputs[0][step * n..step * n + n]
        } else {
            for (j, slot) in scratch.iter_mut().enumerate().take(n) {
                *slot = inputs[j][step];
            }
            &scratch[..n]
        }
    }

    /// Ramp-up step: the active set grows by a factor of `I`; every "to" state
    /// touched this step is written exactly once (see `fixed::FixedTrellis`'s
    /// doc comment on why this holds for a bijective shift-register trellis).
    fn up_step(&mut self, inputs: &[&[f32]], step: usize) {
        let n = self.trellis.code_outputs();
        let i_count = self.trellis.input_combinations();
        let g = self.cont.g;

        self.metrics.reset_side(g ^ 1);

        let mut scratch = [0f32; MAX_STREAMS];
        let received = self.received_for_step(inputs, step, n, &mut scratch);

        let active: Vec<usize> = self.active.current(g).to_vec();
        self.active.begin_next(g);

        for from_state in active {
            let from_metric = self.metrics.side(g)[from_state].metric;

            for input in 0..i_count {
                let (to_state, expected) = self.trellis.branch(from_state, input);

                debug_assert_eq!(
                    self.metrics.side(g ^ 1)[to_state].metric,
                    SENTINEL,
                    "trellis violates the ramp-up reachability invariant: two \
                     branches out of the active set collided on the same state"
                );

                let candidate = from_metric + branch::branch_metric(received, expected);
                let rec = &mut self.metrics.side_mut(g ^ 1)[to_state];
                rec.metric = candidate;
                rec.prev_state = from_state;
                rec.prev_input = input;

                self.active.push_next(g, to_state);
            }
        }

        self.finish_step();
    }

    /// Steady-state step: full add-compare-select across all `S` states.
    fn middle_step(&mut self, inputs: &[&[f32]], step: usize) {
        let n = self.trellis.code_outputs();
        let i_count = self.trellis.input_combinations();
        let states = self.trellis.states();
        let g = self.cont.g;

        self.metrics.reset_side(g ^ 1);

        let mut scratch = [0f32; MAX_STREAMS];
        let received = self.received_for_step(inputs, step, n, &mut scratch);
        let bound = branch::skip_bound(n, max_abs(received));

        for from_state in 0..states {
            let from_metric = self.metrics.side(g)[from_state].metric;

            for input in 0..i_count {
                let (to_state, expected) = self.trellis.branch(from_state, input);
                let to_metric = self.metrics.side(g ^ 1)[to_state].metric;

                if branch::can_skip(from_metric, to_metric, bound) {
                    continue;
                }

                let candidate = from_metric + branch::branch_metric(received, expected);
                if candidate > to_metric {
                    let rec = &mut self.metrics.side_mut(g ^ 1)[to_state];
                    rec.metric = candidate;
                    rec.prev_state = from_state;
                    rec.prev_input = input;
                }
            }
        }

        self.finish_step();
    }

    /// Termination step: only input 0 is evaluated; several active states may
    /// converge onto the same "to" state, so this still needs a real compare.
    fn term_step(&mut self, inputs: &[&[f32]], step: usize) {
        let n = self.trellis.code_outputs();
        let g = self.cont.g;

        self.metrics.reset_side(g ^ 1);

        let mut scratch = [0f32; MAX_STREAMS];
        let received = self.received_for_step(inputs, step, n, &mut scratch);
        let bound = branch::skip_bound(n, max_abs(received));

        let active: Vec<usize> = self.active.current(g).to_vec();
        self.active.begin_next(g);

        for from_state in active {
            let from_metric = self.metrics.side(g)[from_state].metric;
            let (to_state, expected) = self.trellis.branch(from_state, 0);
            let to_metric = self.metrics.side(g ^ 1)[to_state].metric;
            let first_visit = to_metric == SENTINEL;

            if !branch::can_skip(from_metric, to_metric, bound) {
                let candidate = from_metric + branch::branch_metric(received, expected);
                if candidate > to_metric {
                    let rec = &mut self.metrics.side_mut(g ^ 1)[to_state];
                    rec.metric = candidate;
                    rec.prev_state = from_state;
                    rec.prev_input = 0;
                }
            }

            if first_visit {
                self.active.push_next(g, to_state);
            }
        }

        self.finish_step();
    }

    /// Flip the generation parity, record the traceback cells for whichever
    /// states are now valid on the new "from" side, and advance `time_count`.
    fn finish_step(&mut self) {
        self.cont.g ^= 1;
        let g = self.cont.g;
        let t = self.cont.time_count;

        let states_to_record: Vec<usize> = match self.cont.fsm {
            FsmState::Middle => (0..self.trellis.states()).collect(),
            _ => self.active.current(g).to_vec(),
        };

        for s in states_to_record {
            let rec = self.metrics.side(g)[s];
            self.traceback.set(t + 1, s, rec.prev_state, rec.prev_input);
        }

        self.cont.time_count += 1;
    }

    /// Walk the traceback grid backward from the winning terminal cell, filling
    /// from the end of the block toward its start; the portion that doesn't fit
    /// in the remaining budget spills into the save buffer instead.
    fn run_output(&mut self, outputs: &mut [&mut [u8]], output_byte_budget: usize, produced_so_far: usize) -> usize {
        let k = self.trellis.code_inputs();
        let block_bits = self.trellis.block_bits();
        let terminate = self.trellis.terminate();

        let (mut state, mut time) = if terminate {
            (0usize, self.total_steps)
        } else {
            let g = self.cont.g;
            let side = self.metrics.side(g);
            let mut best = 0usize;
            for s in 1..side.len() {
                if side[s].metric > side[best].metric {
                    best = s;
                }
            }
            (best, block_bits)
        };

        if terminate {
            for _ in 0..self.trellis.delay() {
                let cell = self.traceback.get(time, state);
                state = cell.prev;
                time -= 1;
            }
        }

        let budget_bits = output_byte_budget * 8;
        let remaining = budget_bits.saturating_sub(produced_so_far);
        let produced_now = remaining.min(block_bits);
        let overflow = block_bits - produced_now;

        self.save.clear();

        for i in 0..block_bits {
            let cell = self.traceback.get(time, state);

            if i < overflow {
                let save_pos = overflow - 1 - i;
                for stream in 0..k {
                    let bit = (cell.input >> stream) & 1 != 0;
                    bits::set_bit(self.save.stream_mut(stream), save_pos, bit);
                }
            } else {
                let position = block_bits - 1 - i;
                let out_pos = produced_so_far + position;
                for stream in 0..k {
                    let bit = (cell.input >> stream) & 1 != 0;
                    bits::set_bit(outputs[stream], out_pos, bit);
                }
            }

            state = cell.prev;
            time -= 1;
        }

        if overflow > 0 {
            self.save.saved_bits = overflow;
            self.save.start_bit = 0;
        }

        produced_now
    }
}

fn max_abs(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}
