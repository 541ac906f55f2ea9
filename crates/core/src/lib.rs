//! covenant-core: contract tree, ledger state, and environment types for
//! the Covenant engine.
//!
//! This crate holds the pure data model. Semantics (evaluation, reduction,
//! applicable actions) live in covenant-eval; wire formats live in
//! covenant-interchange; content-addressed packaging lives in
//! covenant-bundle.

pub mod contract;
pub mod environment;
pub mod input;
pub mod state;

pub use contract::{
    in_bounds, next_timeout_after, Action, Bound, Case, CaseContinuation, ChoiceId, Contract,
    Label, Observation, Party, Payee, Timeout, Token, Value, ValueId,
};
pub use environment::{Environment, IntervalError, TimeInterval};
pub use input::{Input, InputContent};
pub use state::{Payment, ReduceWarning, State};
