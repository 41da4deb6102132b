//! Contribution-phase gate.

use soroban_sdk::{panic_with_error, Env};

use crate::events;
use crate::storage::{load_round_state, save_round_state};
use crate::types::{Phase, RoundState};
use crate::Error;

/// Move a round to `phase`. Any phase may follow any other.
pub fn set_phase(env: &Env, round_id: u64, phase: Phase) {
    let mut state = load_round_state(env, round_id);
    let previous = state.phase;
    state.phase = phase;
    save_round_state(env, round_id, &state);

    events::emit_phase_changed(env, round_id, previous, phase);
}

/// Panics with `RoundNotOpen` unless the round is open and in `signed_phase`.
pub fn require_open(env: &Env, state: &RoundState, signed_phase: Phase) {
    if state.phase == Phase::Closed || state.phase != signed_phase {
        panic_with_error!(env, Error::RoundNotOpen);
    }
}
