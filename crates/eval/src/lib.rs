//! covenant-eval: deterministic execution of Covenant contracts.
//!
//! The crate splits into four layers: pure evaluation of values and
//! observations, the reducer (single steps and the quiescence loop),
//! input application (whole transactions), and the applicable-actions
//! engine that answers "what can be done right now". Identical
//! (environment, state, contract) triples always produce identical
//! results; the only asynchronous boundary is the [`RuntimeClient`] that
//! resolves hash-referenced continuations and supplies runtime data.

pub mod action_space;
pub mod client;
pub mod eval;
pub mod input;
pub mod reduce;

pub use action_space::{
    merge_bounds, ActionEngine, ActionError, ActionSpace, ApplicableAction, AppliedAction,
    CanAdvance, CanChoose, CanDeposit, CanNotify, DepositKey,
};
pub use client::{ClientError, ContractDetails, InMemoryClient, RuntimeClient};
pub use eval::{eval_observation, eval_value};
pub use input::{apply_all_inputs, apply_input, ApplyError, TransactionResult};
pub use reduce::{reduce_step, reduce_until_quiescent, ReduceError, ReduceResult, StepResult};
