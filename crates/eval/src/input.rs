//! Applying external inputs to a quiescent contract.
//!
//! An input is matched against the cases of the `When` the contract is
//! waiting at. Deposits must match parties, token and the evaluated amount
//! exactly; choices must name the same `ChoiceId` and fall inside one of
//! the case's bounds; a notify requires its observation to hold. A case
//! stored as a hash reference can only be taken when the input carries the
//! continuation content, and the content must hash to the reference.

use std::fmt;

use num_bigint::BigInt;
use num_traits::Zero;

use covenant_bundle::{hash_contract, BundleError};
use covenant_core::{
    in_bounds, Action, Case, CaseContinuation, Contract, Environment, Input, InputContent, Label,
    Payment, ReduceWarning, State,
};

use crate::eval::{eval_observation, eval_value};
use crate::reduce::{reduce_until_quiescent, ReduceError};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Failure to apply a transaction's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    Reduce(ReduceError),
    /// No case of the pending `When` accepts the input.
    NoMatchingInput,
    /// The transaction would change nothing: no inputs and no progress.
    UselessTransaction,
    /// The matched case is a hash reference and the input carried no
    /// continuation content.
    MissingContinuation { label: Label },
    /// The carried continuation does not hash to the case's reference.
    ContinuationHashMismatch { expected: Label, actual: Label },
    Bundle(BundleError),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Reduce(err) => write!(f, "{}", err),
            ApplyError::NoMatchingInput => write!(f, "no case accepts the input"),
            ApplyError::UselessTransaction => {
                write!(f, "transaction applies no input and makes no progress")
            }
            ApplyError::MissingContinuation { label } => {
                write!(f, "case references continuation '{}' but none was supplied", label)
            }
            ApplyError::ContinuationHashMismatch { expected, actual } => {
                write!(
                    f,
                    "continuation hashes to '{}', case references '{}'",
                    actual, expected
                )
            }
            ApplyError::Bundle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApplyError {}

impl From<ReduceError> for ApplyError {
    fn from(err: ReduceError) -> ApplyError {
        ApplyError::Reduce(err)
    }
}

impl From<BundleError> for ApplyError {
    fn from(err: BundleError) -> ApplyError {
        ApplyError::Bundle(err)
    }
}

// ──────────────────────────────────────────────
// Single input
// ──────────────────────────────────────────────

/// Whether `content` is accepted by `case`'s action under `env`/`state`.
fn action_accepts(
    env: &Environment,
    state: &State,
    action: &Action,
    content: &InputContent,
) -> bool {
    match (action, content) {
        (
            Action::Deposit {
                into_account,
                party,
                of_token,
                deposits,
            },
            InputContent::Deposit {
                into_account: input_into,
                input_from_party,
                of_token: input_token,
                that_deposits,
            },
        ) => {
            into_account == input_into
                && party == input_from_party
                && of_token == input_token
                && eval_value(env, state, deposits) == *that_deposits
        }
        (
            Action::Choice {
                for_choice,
                choose_between,
            },
            InputContent::Choice {
                for_choice_id,
                input_that_chooses_num,
            },
        ) => for_choice == for_choice_id && in_bounds(input_that_chooses_num, choose_between),
        (Action::Notify { notify_if }, InputContent::Notify) => {
            eval_observation(env, state, notify_if)
        }
        _ => false,
    }
}

/// The continuation a matched case leads to, verifying a carried
/// continuation against a hash reference.
fn case_continuation(case: &Case, input: &Input) -> Result<Contract, ApplyError> {
    match &case.then {
        CaseContinuation::Inline(c) | CaseContinuation::Merkleized(c) => Ok((**c).clone()),
        CaseContinuation::Reference(label) => {
            let Some((carried_label, contract)) = &input.continuation else {
                return Err(ApplyError::MissingContinuation {
                    label: label.clone(),
                });
            };
            let actual = hash_contract(contract)?;
            if actual != *label || carried_label != label {
                return Err(ApplyError::ContinuationHashMismatch {
                    expected: label.clone(),
                    actual,
                });
            }
            Ok(contract.clone())
        }
    }
}

/// Apply one input to a quiescent contract, yielding the new state and the
/// matched case's continuation.
pub fn apply_input(
    env: &Environment,
    state: &State,
    contract: &Contract,
    input: &Input,
) -> Result<(State, Contract), ApplyError> {
    let Contract::When { cases, .. } = contract else {
        return Err(ApplyError::NoMatchingInput);
    };
    let case = cases
        .iter()
        .find(|case| action_accepts(env, state, &case.action, &input.content))
        .ok_or(ApplyError::NoMatchingInput)?;
    let continuation = case_continuation(case, input)?;

    let state = match &input.content {
        InputContent::Deposit {
            into_account,
            of_token,
            that_deposits,
            ..
        } => {
            if *that_deposits > BigInt::zero() {
                state.credit(into_account, of_token, that_deposits)
            } else {
                state.clone()
            }
        }
        InputContent::Choice {
            for_choice_id,
            input_that_chooses_num,
        } => state.with_choice(for_choice_id.clone(), input_that_chooses_num.clone()),
        InputContent::Notify => state.clone(),
    };
    Ok((state, continuation))
}

// ──────────────────────────────────────────────
// Transactions
// ──────────────────────────────────────────────

/// The accumulated outcome of a whole transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub state: State,
    pub contract: Contract,
    pub warnings: Vec<ReduceWarning>,
    pub payments: Vec<Payment>,
}

/// Reduce to quiescence, apply each input in order (reducing again after
/// each), and return the accumulated outcome. A transaction with no inputs
/// that also makes no progress is rejected as useless.
pub fn apply_all_inputs(
    env: &Environment,
    state: &State,
    contract: &Contract,
    inputs: &[Input],
) -> Result<TransactionResult, ApplyError> {
    let mut reduction = reduce_until_quiescent(env, state, contract)?;
    if inputs.is_empty() && !reduction.reduced {
        return Err(ApplyError::UselessTransaction);
    }
    let mut warnings = std::mem::take(&mut reduction.warnings);
    let mut payments = std::mem::take(&mut reduction.payments);
    let mut state = reduction.state;
    let mut contract = reduction.continuation;

    for input in inputs {
        let (next_state, continuation) = apply_input(env, &state, &contract, input)?;
        let mut reduction = reduce_until_quiescent(env, &next_state, &continuation)?;
        warnings.append(&mut reduction.warnings);
        payments.append(&mut reduction.payments);
        state = reduction.state;
        contract = reduction.continuation;
    }

    Ok(TransactionResult {
        state,
        contract,
        warnings,
        payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{Bound, ChoiceId, Party, Payee, Token, Value};

    fn env() -> Environment {
        Environment::over(100, 200).unwrap()
    }

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    fn deposit_contract() -> Contract {
        Contract::when(
            [Party::role("buyer")
                .deposits(10, Token::ada())
                .into_account(Party::role("seller"))
                .then(Contract::Close)],
            1_000,
            Contract::Close,
        )
    }

    fn deposit_input(amount: i64) -> Input {
        Input::inline(InputContent::Deposit {
            into_account: Party::role("seller"),
            input_from_party: Party::role("buyer"),
            of_token: Token::ada(),
            that_deposits: big(amount),
        })
    }

    #[test]
    fn matching_deposit_credits_and_advances() {
        let result =
            apply_all_inputs(&env(), &State::empty(0), &deposit_contract(), &[deposit_input(10)])
                .unwrap();
        // The continuation is Close: the deposit is refunded on the way out.
        assert_eq!(result.contract, Contract::Close);
        assert!(result.state.accounts.is_empty());
        assert_eq!(
            result.payments,
            vec![Payment {
                payment_from: Party::role("seller"),
                to: Payee::Party(Party::role("seller")),
                token: Token::ada(),
                amount: big(10),
            }]
        );
    }

    #[test]
    fn wrong_amount_matches_nothing() {
        let err = apply_all_inputs(
            &env(),
            &State::empty(0),
            &deposit_contract(),
            &[deposit_input(11)],
        )
        .unwrap_err();
        assert_eq!(err, ApplyError::NoMatchingInput);
    }

    #[test]
    fn choice_must_hit_a_bound() {
        let contract = Contract::when(
            [Party::role("oracle")
                .chooses("price")
                .between([Bound::new(10, 20)])
                .then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        let choose = |n: i64| {
            Input::inline(InputContent::Choice {
                for_choice_id: ChoiceId::new("price", Party::role("oracle")),
                input_that_chooses_num: big(n),
            })
        };

        let result = apply_all_inputs(&env(), &State::empty(0), &contract, &[choose(15)]).unwrap();
        assert_eq!(
            result.state.choices[&ChoiceId::new("price", Party::role("oracle"))],
            big(15)
        );

        assert_eq!(
            apply_all_inputs(&env(), &State::empty(0), &contract, &[choose(21)]).unwrap_err(),
            ApplyError::NoMatchingInput
        );
    }

    #[test]
    fn notify_requires_a_true_observation() {
        let contract = Contract::when(
            [Action::notify(Value::from(1).gt(2)).then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        assert_eq!(
            apply_all_inputs(
                &env(),
                &State::empty(0),
                &contract,
                &[Input::inline(InputContent::Notify)]
            )
            .unwrap_err(),
            ApplyError::NoMatchingInput
        );
    }

    #[test]
    fn empty_transaction_without_progress_is_useless() {
        assert_eq!(
            apply_all_inputs(&env(), &State::empty(0), &deposit_contract(), &[]).unwrap_err(),
            ApplyError::UselessTransaction
        );
    }

    #[test]
    fn empty_transaction_with_progress_is_fine() {
        let state = State::empty(0).with_balance(&Party::role("a"), &Token::ada(), big(5));
        let result = apply_all_inputs(&env(), &state, &Contract::Close, &[]).unwrap();
        assert_eq!(result.payments.len(), 1);
    }

    #[test]
    fn referenced_case_needs_the_continuation() {
        let continuation = Contract::Close;
        let label = hash_contract(&continuation).unwrap();
        let contract = Contract::When {
            cases: vec![Case {
                action: Action::notify(true),
                then: CaseContinuation::Reference(label.clone()),
            }],
            timeout: big(1_000),
            timeout_continuation: Box::new(Contract::Close),
        };

        let bare = apply_all_inputs(
            &env(),
            &State::empty(0),
            &contract,
            &[Input::inline(InputContent::Notify)],
        )
        .unwrap_err();
        assert_eq!(
            bare,
            ApplyError::MissingContinuation {
                label: label.clone()
            }
        );

        let carried = Input::merkleized(InputContent::Notify, label, continuation);
        let result =
            apply_all_inputs(&env(), &State::empty(0), &contract, &[carried]).unwrap();
        assert_eq!(result.contract, Contract::Close);
    }

    #[test]
    fn mismatching_continuation_is_rejected() {
        let label = hash_contract(&Contract::Close).unwrap();
        let contract = Contract::When {
            cases: vec![Case {
                action: Action::notify(true),
                then: CaseContinuation::Reference(label.clone()),
            }],
            timeout: big(1_000),
            timeout_continuation: Box::new(Contract::Close),
        };
        // Carries content that hashes to something else.
        let wrong = Contract::when(
            [Action::notify(true).then(Contract::Close)],
            2_000,
            Contract::Close,
        );
        let input = Input::merkleized(InputContent::Notify, label, wrong);
        assert!(matches!(
            apply_all_inputs(&env(), &State::empty(0), &contract, &[input]).unwrap_err(),
            ApplyError::ContinuationHashMismatch { .. }
        ));
    }
}
