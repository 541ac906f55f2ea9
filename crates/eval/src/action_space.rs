//! The applicable-actions engine: what can be done to a contract right
//! now, and what happens if it is done.
//!
//! Given a contract's current state, the engine reduces to quiescence and
//! inspects the pending `When` (if any) to produce a deduplicated list of
//! actions. Each action carries everything needed to apply itself
//! synchronously; the only asynchronous work is resolving hash-referenced
//! continuations through the [`RuntimeClient`], cached per engine session.

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;

use covenant_core::{
    in_bounds, next_timeout_after, Action, Bound, CaseContinuation, ChoiceId, Contract,
    Environment, Input, InputContent, IntervalError, Label, Party, Payment, ReduceWarning, State,
    Token,
};

use crate::client::{ClientError, ContractDetails, RuntimeClient};
use crate::eval::{eval_observation, eval_value};
use crate::input::{apply_all_inputs, ApplyError};
use crate::reduce::{reduce_until_quiescent, ReduceError};

/// Width of the default environment window when no timeout is ahead.
const DEFAULT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    Reduce(ReduceError),
    Apply(ApplyError),
    /// A chosen number falls outside every merged bound.
    ChosenNumOutOfBounds { chosen: BigInt },
    Client(ClientError),
    Interval(IntervalError),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Reduce(err) => write!(f, "{}", err),
            ActionError::Apply(err) => write!(f, "{}", err),
            ActionError::ChosenNumOutOfBounds { chosen } => {
                write!(f, "chosen number {} is outside every bound", chosen)
            }
            ActionError::Client(err) => write!(f, "{}", err),
            ActionError::Interval(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<ReduceError> for ActionError {
    fn from(err: ReduceError) -> ActionError {
        ActionError::Reduce(err)
    }
}

impl From<ApplyError> for ActionError {
    fn from(err: ApplyError) -> ActionError {
        ActionError::Apply(err)
    }
}

impl From<ClientError> for ActionError {
    fn from(err: ClientError) -> ActionError {
        ActionError::Client(err)
    }
}

impl From<IntervalError> for ActionError {
    fn from(err: IntervalError) -> ActionError {
        ActionError::Interval(err)
    }
}

// ──────────────────────────────────────────────
// Actions
// ──────────────────────────────────────────────

/// The starting point an action applies against.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActionContext {
    environment: Environment,
    state: State,
    contract: Contract,
}

impl ActionContext {
    fn apply(&self, inputs: Vec<Input>) -> Result<AppliedAction, ActionError> {
        let result = apply_all_inputs(&self.environment, &self.state, &self.contract, &inputs)?;
        Ok(AppliedAction {
            inputs,
            environment: self.environment.clone(),
            state: result.state,
            contract: result.contract,
            warnings: result.warnings,
            payments: result.payments,
        })
    }
}

/// The outcome of applying an action: the transaction's inputs plus the
/// resulting state, continuation, warnings and payments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAction {
    pub inputs: Vec<Input>,
    pub environment: Environment,
    pub state: State,
    pub contract: Contract,
    pub warnings: Vec<ReduceWarning>,
    pub payments: Vec<Payment>,
}

/// The contract can make progress with no external input: timeouts have
/// passed or accounts can be refunded. Carries the already-computed
/// reduction outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanAdvance {
    context: ActionContext,
    pub state: State,
    pub contract: Contract,
    pub payments: Vec<Payment>,
    pub warnings: Vec<ReduceWarning>,
}

impl CanAdvance {
    pub fn apply(&self) -> Result<AppliedAction, ActionError> {
        self.context.apply(Vec::new())
    }
}

/// A deposit one party can make right now. `deposits` is the evaluated
/// amount the case demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanDeposit {
    context: ActionContext,
    pub into_account: Party,
    pub party: Party,
    pub of_token: Token,
    pub deposits: BigInt,
    continuation: Option<(Label, Contract)>,
}

impl CanDeposit {
    pub fn apply(&self) -> Result<AppliedAction, ActionError> {
        let input = Input {
            content: InputContent::Deposit {
                into_account: self.into_account.clone(),
                input_from_party: self.party.clone(),
                of_token: self.of_token.clone(),
                that_deposits: self.deposits.clone(),
            },
            continuation: self.continuation.clone(),
        };
        self.context.apply(vec![input])
    }
}

/// One original Choice case: its own bounds and resolved continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChoiceOption {
    bounds: Vec<Bound>,
    continuation: Option<(Label, Contract)>,
}

/// A choice a party can make right now. `choose_between` holds the merged
/// bounds across every case for the same `ChoiceId`; applying re-dispatches
/// to whichever original case contains the chosen number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanChoose {
    context: ActionContext,
    pub for_choice: ChoiceId,
    pub choose_between: Vec<Bound>,
    options: Vec<ChoiceOption>,
}

impl CanChoose {
    pub fn apply(&self, chosen: impl Into<BigInt>) -> Result<AppliedAction, ActionError> {
        let chosen = chosen.into();
        let option = self
            .options
            .iter()
            .find(|option| in_bounds(&chosen, &option.bounds))
            .ok_or_else(|| ActionError::ChosenNumOutOfBounds {
                chosen: chosen.clone(),
            })?;
        let input = Input {
            content: InputContent::Choice {
                for_choice_id: self.for_choice.clone(),
                input_that_chooses_num: chosen,
            },
            continuation: option.continuation.clone(),
        };
        self.context.apply(vec![input])
    }
}

/// A notification whose observation currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanNotify {
    context: ActionContext,
    continuation: Option<(Label, Contract)>,
}

impl CanNotify {
    pub fn apply(&self) -> Result<AppliedAction, ActionError> {
        let input = Input {
            content: InputContent::Notify,
            continuation: self.continuation.clone(),
        };
        self.context.apply(vec![input])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicableAction {
    Advance(CanAdvance),
    Deposit(CanDeposit),
    Choice(CanChoose),
    Notify(CanNotify),
}

/// The composite key deposit cases are deduplicated by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DepositKey {
    pub into_account: Party,
    pub party: Party,
    pub of_token: Token,
    pub deposits: BigInt,
}

/// Everything that can currently be done to a contract. `actions` is
/// ordered: advance first, then deposits, choices, notify. Deposit cases
/// that collide on their composite key keep the first representative and
/// surface the colliding key here.
#[derive(Debug, Clone, Default)]
pub struct ActionSpace {
    pub actions: Vec<ApplicableAction>,
    pub deposit_collisions: Vec<DepositKey>,
}

// ──────────────────────────────────────────────
// Bound merging
// ──────────────────────────────────────────────

/// Merge overlapping or touching bounds: sort by lower end, coalesce when
/// the next bound starts at or below the current upper end.
pub fn merge_bounds(mut bounds: Vec<Bound>) -> Vec<Bound> {
    bounds.sort_by(|a, b| a.from.cmp(&b.from));
    let mut merged: Vec<Bound> = Vec::with_capacity(bounds.len());
    for bound in bounds {
        if let Some(last) = merged.last_mut() {
            if bound.from <= last.to {
                if bound.to > last.to {
                    last.to = bound.to;
                }
                continue;
            }
        }
        merged.push(bound);
    }
    merged
}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

/// A session over one runtime client, caching continuation lookups.
pub struct ActionEngine<C> {
    client: C,
    continuations: BTreeMap<Label, Contract>,
}

impl<C: RuntimeClient> ActionEngine<C> {
    pub fn new(client: C) -> ActionEngine<C> {
        ActionEngine {
            client,
            continuations: BTreeMap::new(),
        }
    }

    /// The actions currently applicable to the contract known to the
    /// runtime as `contract_id`. With no environment supplied, a default
    /// window is computed from the runtime tip.
    pub async fn applicable_actions(
        &mut self,
        contract_id: &str,
        environment: Option<Environment>,
    ) -> Result<ActionSpace, ActionError> {
        let details = self.client.get_contract_details(contract_id).await?;
        self.actions_for(&details, environment).await
    }

    /// As [`applicable_actions`](Self::applicable_actions), starting from
    /// already-loaded contract details.
    pub async fn actions_for(
        &mut self,
        details: &ContractDetails,
        environment: Option<Environment>,
    ) -> Result<ActionSpace, ActionError> {
        let ContractDetails::Active { state, contract } = details else {
            return Ok(ActionSpace::default());
        };
        let environment = match environment {
            Some(environment) => environment,
            None => self.default_environment(contract).await?,
        };

        let reduction = reduce_until_quiescent(&environment, state, contract)?;
        let context = ActionContext {
            environment: environment.clone(),
            state: state.clone(),
            contract: contract.clone(),
        };

        let mut space = ActionSpace::default();

        let waiting_cases = match &reduction.continuation {
            Contract::When { cases, .. } if !cases.is_empty() => Some(cases),
            _ => None,
        };
        if reduction.reduced && waiting_cases.is_none() {
            space.actions.push(ApplicableAction::Advance(CanAdvance {
                context: context.clone(),
                state: reduction.state.clone(),
                contract: reduction.continuation.clone(),
                payments: reduction.payments.clone(),
                warnings: reduction.warnings.clone(),
            }));
        }
        let Some(cases) = waiting_cases else {
            return Ok(space);
        };

        let mut deposits: BTreeMap<DepositKey, CanDeposit> = BTreeMap::new();
        let mut choices: BTreeMap<ChoiceId, CanChoose> = BTreeMap::new();
        let mut notify: Option<CanNotify> = None;

        for case in cases {
            match &case.action {
                Action::Deposit {
                    into_account,
                    party,
                    of_token,
                    deposits: value,
                } => {
                    let amount = eval_value(&environment, &reduction.state, value);
                    let key = DepositKey {
                        into_account: into_account.clone(),
                        party: party.clone(),
                        of_token: of_token.clone(),
                        deposits: amount.clone(),
                    };
                    if deposits.contains_key(&key) {
                        if !space.deposit_collisions.contains(&key) {
                            space.deposit_collisions.push(key);
                        }
                        continue;
                    }
                    let continuation = self.resolve_case(&case.then).await?;
                    deposits.insert(
                        key,
                        CanDeposit {
                            context: context.clone(),
                            into_account: into_account.clone(),
                            party: party.clone(),
                            of_token: of_token.clone(),
                            deposits: amount,
                            continuation,
                        },
                    );
                }
                Action::Choice {
                    for_choice,
                    choose_between,
                } => {
                    let continuation = self.resolve_case(&case.then).await?;
                    let entry = choices.entry(for_choice.clone()).or_insert_with(|| CanChoose {
                        context: context.clone(),
                        for_choice: for_choice.clone(),
                        choose_between: Vec::new(),
                        options: Vec::new(),
                    });
                    entry.options.push(ChoiceOption {
                        bounds: choose_between.clone(),
                        continuation,
                    });
                }
                Action::Notify { notify_if } => {
                    if notify.is_some()
                        || !eval_observation(&environment, &reduction.state, notify_if)
                    {
                        continue;
                    }
                    notify = Some(CanNotify {
                        context: context.clone(),
                        continuation: self.resolve_case(&case.then).await?,
                    });
                }
            }
        }

        for choose in choices.values_mut() {
            choose.choose_between = merge_bounds(
                choose
                    .options
                    .iter()
                    .flat_map(|option| option.bounds.iter().cloned())
                    .collect(),
            );
        }

        space
            .actions
            .extend(deposits.into_values().map(ApplicableAction::Deposit));
        space
            .actions
            .extend(choices.into_values().map(ApplicableAction::Choice));
        space.actions.extend(notify.map(ApplicableAction::Notify));
        Ok(space)
    }

    /// The default window: from the runtime tip up to just before the next
    /// timeout (or a day out when none is ahead).
    pub async fn default_environment(
        &self,
        contract: &Contract,
    ) -> Result<Environment, ActionError> {
        let from = self.client.get_runtime_tip().await?;
        let to = next_timeout_after(contract, &from)
            .unwrap_or_else(|| &from + BigInt::from(DEFAULT_WINDOW_MS))
            - BigInt::from(1);
        Ok(Environment::over(from, to)?)
    }

    /// The input-continuation pair for a case, fetching and caching
    /// hash-referenced content. Inline content needs nothing carried.
    async fn resolve_case(
        &mut self,
        continuation: &CaseContinuation,
    ) -> Result<Option<(Label, Contract)>, ActionError> {
        match continuation {
            CaseContinuation::Inline(_) | CaseContinuation::Merkleized(_) => Ok(None),
            CaseContinuation::Reference(label) => {
                if let Some(contract) = self.continuations.get(label) {
                    return Ok(Some((label.clone(), contract.clone())));
                }
                let contract = self.client.get_contract_continuation(label).await?;
                self.continuations.insert(label.clone(), contract.clone());
                Ok(Some((label.clone(), contract)))
            }
        }
    }
}
