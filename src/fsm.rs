//! The five-state trellis-walk driver (component E). Transitions are an explicit
//! table inside [`crate::decoder::Decoder::decode`]; this module only holds the
//! tag and the handful of scalars that must survive a suspended call.

/// FSM state. `Init` seeds a fresh block; `Up` ramps from 1 reachable state to
/// `S`; `Middle` is the steady-state add-compare-select; `Term` (when the trellis
/// terminates) drives the tail back to state 0; `Output` walks the traceback grid
/// backwards and emits bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FsmState {
    Init,
    Up,
    Middle,
    Term,
    Output,
}

/// The state needed to resume a call suspended mid-block: everything that isn't
/// already captured by the metric banks, active sets, and traceback grid
/// themselves.
#[derive(Debug)]
pub(crate) struct Continuation {
    pub fsm: FsmState,
    /// Steps completed so far within the current block, `0..=block_bits + M`.
    pub time_count: usize,
    /// Parity selecting the metric banks' "from" side.
    pub g: usize,
}

impl Continuation {
    pub fn new() -> Self {
        Continuation {
            fsm: FsmState::Init,
            time_count: 0,
            g: 0,
        }
    }
}
