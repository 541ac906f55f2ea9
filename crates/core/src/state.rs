//! Ledger-like contract state: account balances, recorded choices, and
//! bound values.
//!
//! Every update produces a new `State`; nothing mutates in place. The
//! invariant maintained throughout is that `accounts` never stores an
//! entry with a balance of zero or less.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::contract::{ChoiceId, Party, Payee, Token, ValueId};

// ──────────────────────────────────────────────
// State
// ──────────────────────────────────────────────

/// The mutable-by-replacement state threaded through a reduction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// (party, token) -> positive balance. Entries with balance <= 0 are
    /// absent. Iteration order is the BTreeMap key order, which fixes the
    /// refund order of `Close` deterministically.
    pub accounts: BTreeMap<(Party, Token), BigInt>,
    /// Last recorded number for each choice.
    pub choices: BTreeMap<ChoiceId, BigInt>,
    /// `Let`-bound values.
    pub bound_values: BTreeMap<ValueId, BigInt>,
    /// Earliest instant this state is valid from (milliseconds).
    pub min_time: BigInt,
}

impl State {
    /// An empty state valid from `min_time`.
    pub fn empty(min_time: impl Into<BigInt>) -> State {
        State {
            accounts: BTreeMap::new(),
            choices: BTreeMap::new(),
            bound_values: BTreeMap::new(),
            min_time: min_time.into(),
        }
    }

    /// The balance held by `party` for `token`, zero when absent.
    pub fn available_money(&self, party: &Party, token: &Token) -> BigInt {
        self.accounts
            .get(&(party.clone(), token.clone()))
            .cloned()
            .unwrap_or_else(BigInt::zero)
    }

    /// A new state with the (party, token) balance replaced by `amount`.
    /// Non-positive amounts remove the entry.
    pub fn with_balance(&self, party: &Party, token: &Token, amount: BigInt) -> State {
        let mut accounts = self.accounts.clone();
        let key = (party.clone(), token.clone());
        if amount <= BigInt::zero() {
            accounts.remove(&key);
        } else {
            accounts.insert(key, amount);
        }
        State {
            accounts,
            ..self.clone()
        }
    }

    /// A new state with `amount` added to the (party, token) balance.
    pub fn credit(&self, party: &Party, token: &Token, amount: &BigInt) -> State {
        let balance = self.available_money(party, token);
        self.with_balance(party, token, balance + amount)
    }

    /// A new state recording `chosen` for `choice_id`.
    pub fn with_choice(&self, choice_id: ChoiceId, chosen: BigInt) -> State {
        let mut choices = self.choices.clone();
        choices.insert(choice_id, chosen);
        State {
            choices,
            ..self.clone()
        }
    }

    /// A new state binding `value_id`, returning the shadowed previous
    /// value when one existed.
    pub fn with_bound_value(&self, value_id: ValueId, value: BigInt) -> (State, Option<BigInt>) {
        let mut bound_values = self.bound_values.clone();
        let shadowed = bound_values.insert(value_id, value);
        (
            State {
                bound_values,
                ..self.clone()
            },
            shadowed,
        )
    }
}

// ──────────────────────────────────────────────
// Payments and warnings
// ──────────────────────────────────────────────

/// A payment emitted by the reducer. `amount` is what was actually moved,
/// which may be less than requested (see `ReduceWarning::PartialPay`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub payment_from: Party,
    pub to: Payee,
    pub token: Token,
    pub amount: BigInt,
}

/// A non-fatal anomaly observed during reduction. `Shadow` and `Assertion`
/// belong to the full warning taxonomy of the wire format; the reducer
/// itself only emits the pay warnings (Let/Assert are rejected outright).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceWarning {
    /// A `Pay` evaluated to a non-positive amount; nothing was paid.
    NonPositivePay {
        account: Party,
        payee: Payee,
        token: Token,
        asked_to_pay: BigInt,
    },
    /// A `Pay` could only be partially covered by the source account.
    PartialPay {
        account: Party,
        payee: Payee,
        token: Token,
        expected: BigInt,
        actual: BigInt,
    },
    /// A `Let` re-bound an already-bound identifier.
    Shadow {
        value_id: ValueId,
        had: BigInt,
        got: BigInt,
    },
    /// An `Assert` observation evaluated false.
    Assertion,
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
