//! The contract reducer: single deterministic steps and the quiescence
//! loop.
//!
//! A step either makes progress (`Reduced`, possibly emitting a payment
//! and/or a warning) or stops (`NotReduced`: the contract needs external
//! input or is fully closed). A `When` whose timeout falls strictly inside
//! the environment's window cannot step deterministically and aborts the
//! whole session with `AmbiguousTimeInterval`.

use std::fmt;

use num_bigint::BigInt;
use num_traits::Zero;

use covenant_core::{
    Contract, Environment, Payee, Payment, ReduceWarning, State, Timeout,
};

use crate::eval::{eval_observation, eval_value};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Fatal reduction failures. Both abort the session; neither is retryable
/// without the caller changing its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// The environment's window straddles a `When` timeout. The caller
    /// must narrow the window and retry the whole reduction.
    AmbiguousTimeInterval { timeout: Timeout },
    /// `Let` and `Assert` are outside the executable subset.
    UnsupportedConstruct { construct: &'static str },
}

impl fmt::Display for ReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReduceError::AmbiguousTimeInterval { timeout } => {
                write!(f, "time interval straddles the timeout at {}", timeout)
            }
            ReduceError::UnsupportedConstruct { construct } => {
                write!(f, "unsupported construct: {}", construct)
            }
        }
    }
}

impl std::error::Error for ReduceError {}

// ──────────────────────────────────────────────
// Single step
// ──────────────────────────────────────────────

/// Outcome of one reduction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// No progress possible: the contract awaits input or is closed out.
    NotReduced,
    Reduced {
        state: State,
        continuation: Contract,
        payment: Option<Payment>,
        warning: Option<ReduceWarning>,
    },
}

pub fn reduce_step(
    env: &Environment,
    state: &State,
    contract: &Contract,
) -> Result<StepResult, ReduceError> {
    match contract {
        Contract::Close => {
            // Refund exactly one account per step, in key order.
            let Some(((party, token), balance)) = state.accounts.iter().next() else {
                return Ok(StepResult::NotReduced);
            };
            let party = party.clone();
            let token = token.clone();
            let balance = balance.clone();
            Ok(StepResult::Reduced {
                state: state.with_balance(&party, &token, BigInt::zero()),
                continuation: Contract::Close,
                payment: Some(Payment {
                    payment_from: party.clone(),
                    to: Payee::Party(party),
                    token,
                    amount: balance,
                }),
                warning: None,
            })
        }
        Contract::Pay {
            from_account,
            to,
            token,
            pay,
            then,
        } => {
            let amount = eval_value(env, state, pay);
            if amount <= BigInt::zero() {
                return Ok(StepResult::Reduced {
                    state: state.clone(),
                    continuation: (**then).clone(),
                    payment: None,
                    warning: Some(ReduceWarning::NonPositivePay {
                        account: from_account.clone(),
                        payee: to.clone(),
                        token: token.clone(),
                        asked_to_pay: amount,
                    }),
                });
            }
            let balance = state.available_money(from_account, token);
            let paid = balance.clone().min(amount.clone());
            let mut new_state = state.with_balance(from_account, token, balance - &paid);
            if let Payee::Account(account) = to {
                new_state = new_state.credit(account, token, &paid);
            }
            let warning = (paid < amount).then(|| ReduceWarning::PartialPay {
                account: from_account.clone(),
                payee: to.clone(),
                token: token.clone(),
                expected: amount,
                actual: paid.clone(),
            });
            Ok(StepResult::Reduced {
                state: new_state,
                continuation: (**then).clone(),
                payment: Some(Payment {
                    payment_from: from_account.clone(),
                    to: to.clone(),
                    token: token.clone(),
                    amount: paid,
                }),
                warning,
            })
        }
        Contract::If { obs, then, r#else } => {
            let branch = if eval_observation(env, state, obs) {
                then
            } else {
                r#else
            };
            Ok(StepResult::Reduced {
                state: state.clone(),
                continuation: (**branch).clone(),
                payment: None,
                warning: None,
            })
        }
        Contract::When {
            timeout,
            timeout_continuation,
            ..
        } => {
            if env.time_interval.to() < timeout {
                Ok(StepResult::NotReduced)
            } else if timeout <= env.time_interval.from() {
                Ok(StepResult::Reduced {
                    state: state.clone(),
                    continuation: (**timeout_continuation).clone(),
                    payment: None,
                    warning: None,
                })
            } else {
                Err(ReduceError::AmbiguousTimeInterval {
                    timeout: timeout.clone(),
                })
            }
        }
        Contract::Let { .. } => Err(ReduceError::UnsupportedConstruct { construct: "let" }),
        Contract::Assert { .. } => Err(ReduceError::UnsupportedConstruct {
            construct: "assert",
        }),
    }
}

// ──────────────────────────────────────────────
// Quiescence loop
// ──────────────────────────────────────────────

/// Accumulated outcome of reducing to quiescence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceResult {
    /// Whether any step made progress.
    pub reduced: bool,
    pub state: State,
    pub continuation: Contract,
    pub payments: Vec<Payment>,
    pub warnings: Vec<ReduceWarning>,
}

/// Step until the contract needs input or is closed out, accumulating
/// payments and warnings in emission order. On error the partial
/// accumulation is discarded; the caller must narrow its window and rerun.
pub fn reduce_until_quiescent(
    env: &Environment,
    state: &State,
    contract: &Contract,
) -> Result<ReduceResult, ReduceError> {
    let mut result = ReduceResult {
        reduced: false,
        state: state.clone(),
        continuation: contract.clone(),
        payments: Vec::new(),
        warnings: Vec::new(),
    };
    loop {
        match reduce_step(env, &result.state, &result.continuation)? {
            StepResult::NotReduced => return Ok(result),
            StepResult::Reduced {
                state,
                continuation,
                payment,
                warning,
            } => {
                result.reduced = true;
                result.state = state;
                result.continuation = continuation;
                result.payments.extend(payment);
                result.warnings.extend(warning);
            }
        }
    }
}
