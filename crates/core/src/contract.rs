//! Contract tree types for the Covenant engine.
//!
//! A contract is an immutable expression tree built once (by the combinator
//! builders below or by the interchange decoder) and never mutated. All
//! numeric leaves are arbitrary-precision `BigInt` -- timeouts, amounts and
//! choice bounds never pass through machine integers or floats.

use num_bigint::BigInt;

// ──────────────────────────────────────────────
// Participants and tokens
// ──────────────────────────────────────────────

/// A contract participant, identified either by a ledger address or by a
/// role name. Identity is value-based: two parties with the same variant
/// and payload are interchangeable as map keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Party {
    Address(String),
    Role(String),
}

impl Party {
    pub fn address(addr: impl Into<String>) -> Party {
        Party::Address(addr.into())
    }

    pub fn role(name: impl Into<String>) -> Party {
        Party::Role(name.into())
    }

    /// Start building a Deposit action: `party.deposits(10, Token::ada())`.
    pub fn deposits(&self, value: impl Into<Value>, token: Token) -> DepositBuilder {
        DepositBuilder {
            party: self.clone(),
            token,
            value: value.into(),
        }
    }

    /// Start building a Choice action: `party.chooses("price").between(..)`.
    pub fn chooses(&self, name: impl Into<String>) -> ChoiceBuilder {
        ChoiceBuilder {
            choice_id: ChoiceId {
                choice_name: name.into(),
                choice_owner: self.clone(),
            },
        }
    }

    /// The balance of this party's account for `token`.
    pub fn available_money(&self, token: Token) -> Value {
        Value::AvailableMoney {
            in_account: self.clone(),
            of_token: token,
        }
    }
}

/// A native or custom asset class. The pair `("", "")` denotes the base
/// currency of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token {
    pub currency_symbol: String,
    pub token_name: String,
}

impl Token {
    pub fn new(currency_symbol: impl Into<String>, token_name: impl Into<String>) -> Token {
        Token {
            currency_symbol: currency_symbol.into(),
            token_name: token_name.into(),
        }
    }

    /// The base currency token `("", "")`.
    pub fn ada() -> Token {
        Token::new("", "")
    }
}

/// Destination of a payment. `Account` credits an internal contract
/// account; `Party` represents an external payout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Payee {
    Party(Party),
    Account(Party),
}

// ──────────────────────────────────────────────
// Choices and bounds
// ──────────────────────────────────────────────

/// An inclusive numeric range for a choice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bound {
    pub from: BigInt,
    pub to: BigInt,
}

impl Bound {
    pub fn new(from: impl Into<BigInt>, to: impl Into<BigInt>) -> Bound {
        Bound {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn contains(&self, n: &BigInt) -> bool {
        self.from <= *n && *n <= self.to
    }
}

/// True when `n` falls inside at least one of `bounds`.
pub fn in_bounds(n: &BigInt, bounds: &[Bound]) -> bool {
    bounds.iter().any(|b| b.contains(n))
}

/// A named choice owned by a party.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceId {
    pub choice_name: String,
    pub choice_owner: Party,
}

impl ChoiceId {
    pub fn new(name: impl Into<String>, owner: Party) -> ChoiceId {
        ChoiceId {
            choice_name: name.into(),
            choice_owner: owner,
        }
    }

    /// The value last chosen for this choice (0 if never chosen).
    pub fn value(&self) -> Value {
        Value::ChoiceValue(self.clone())
    }
}

/// Identifier of a `Let`-bound value.
pub type ValueId = String;

/// A millisecond-resolution instant. Arbitrary precision, matching every
/// other integer on the wire.
pub type Timeout = BigInt;

// ──────────────────────────────────────────────
// Values and observations
// ──────────────────────────────────────────────

/// An arithmetic expression evaluated against an environment and a state
/// snapshot. Division truncates toward zero; all arithmetic is
/// arbitrary-precision signed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Constant(BigInt),
    AvailableMoney { in_account: Party, of_token: Token },
    ChoiceValue(ChoiceId),
    Neg(Box<Value>),
    Add(Box<Value>, Box<Value>),
    Sub(Box<Value>, Box<Value>),
    Mul(Box<Value>, Box<Value>),
    Div(Box<Value>, Box<Value>),
    UseValue(ValueId),
    Cond(Box<Observation>, Box<Value>, Box<Value>),
    TimeIntervalStart,
    TimeIntervalEnd,
}

impl Value {
    pub fn neg(self) -> Value {
        Value::Neg(Box::new(self))
    }

    pub fn add(self, right: impl Into<Value>) -> Value {
        Value::Add(Box::new(self), Box::new(right.into()))
    }

    pub fn sub(self, right: impl Into<Value>) -> Value {
        Value::Sub(Box::new(self), Box::new(right.into()))
    }

    pub fn mul(self, right: impl Into<Value>) -> Value {
        Value::Mul(Box::new(self), Box::new(right.into()))
    }

    pub fn div(self, by: impl Into<Value>) -> Value {
        Value::Div(Box::new(self), Box::new(by.into()))
    }

    pub fn eq(self, right: impl Into<Value>) -> Observation {
        Observation::ValueEQ(Box::new(self), Box::new(right.into()))
    }

    pub fn ge(self, right: impl Into<Value>) -> Observation {
        Observation::ValueGE(Box::new(self), Box::new(right.into()))
    }

    pub fn gt(self, right: impl Into<Value>) -> Observation {
        Observation::ValueGT(Box::new(self), Box::new(right.into()))
    }

    pub fn lt(self, right: impl Into<Value>) -> Observation {
        Observation::ValueLT(Box::new(self), Box::new(right.into()))
    }

    pub fn le(self, right: impl Into<Value>) -> Observation {
        Observation::ValueLE(Box::new(self), Box::new(right.into()))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Constant(BigInt::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Constant(BigInt::from(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Value {
        Value::Constant(n)
    }
}

/// A boolean expression evaluated against an environment and a state
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Observation {
    Constant(bool),
    And(Box<Observation>, Box<Observation>),
    Or(Box<Observation>, Box<Observation>),
    Not(Box<Observation>),
    ValueEQ(Box<Value>, Box<Value>),
    ValueGE(Box<Value>, Box<Value>),
    ValueGT(Box<Value>, Box<Value>),
    ValueLT(Box<Value>, Box<Value>),
    ValueLE(Box<Value>, Box<Value>),
    ChoseSomething(ChoiceId),
}

impl Observation {
    pub fn and(self, right: impl Into<Observation>) -> Observation {
        Observation::And(Box::new(self), Box::new(right.into()))
    }

    pub fn or(self, right: impl Into<Observation>) -> Observation {
        Observation::Or(Box::new(self), Box::new(right.into()))
    }

    pub fn not(self) -> Observation {
        Observation::Not(Box::new(self))
    }
}

impl From<bool> for Observation {
    fn from(b: bool) -> Observation {
        Observation::Constant(b)
    }
}

// ──────────────────────────────────────────────
// Actions and cases
// ──────────────────────────────────────────────

/// An externally triggerable event a `When` can wait for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Notify {
        notify_if: Observation,
    },
    Deposit {
        into_account: Party,
        party: Party,
        of_token: Token,
        deposits: Value,
    },
    Choice {
        for_choice: ChoiceId,
        choose_between: Vec<Bound>,
    },
}

impl Action {
    pub fn notify(obs: impl Into<Observation>) -> Action {
        Action::Notify {
            notify_if: obs.into(),
        }
    }

    /// Attach a continuation, producing an inline case.
    pub fn then(self, continuation: Contract) -> Case {
        Case {
            action: self,
            then: CaseContinuation::Inline(Box::new(continuation)),
        }
    }

    /// Attach a continuation that is stored out-of-line in the contract
    /// bundle, keyed by its structural hash.
    pub fn then_merkleized(self, continuation: Contract) -> Case {
        Case {
            action: self,
            then: CaseContinuation::Merkleized(Box::new(continuation)),
        }
    }
}

/// Builder produced by [`Party::deposits`].
#[derive(Debug, Clone)]
pub struct DepositBuilder {
    party: Party,
    token: Token,
    value: Value,
}

impl DepositBuilder {
    pub fn into_account(self, to: Party) -> Action {
        Action::Deposit {
            into_account: to,
            party: self.party,
            of_token: self.token,
            deposits: self.value,
        }
    }

    pub fn into_own_account(self) -> Action {
        Action::Deposit {
            into_account: self.party.clone(),
            party: self.party,
            of_token: self.token,
            deposits: self.value,
        }
    }
}

/// Builder produced by [`Party::chooses`].
#[derive(Debug, Clone)]
pub struct ChoiceBuilder {
    choice_id: ChoiceId,
}

impl ChoiceBuilder {
    pub fn between(self, bounds: impl IntoIterator<Item = Bound>) -> Action {
        Action::Choice {
            for_choice: self.choice_id,
            choose_between: bounds.into_iter().collect(),
        }
    }
}

/// A content-hash label identifying an out-of-line contract in a bundle.
/// Lowercase hex of the canonical structural hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The continuation of a case.
///
/// `Inline` holds the sub-contract in the tree. `Merkleized` still holds
/// the content but marks it for out-of-line storage: it serializes as a
/// bare `{ref}` pointer and the bundle builder stores the content under
/// its hash. `Reference` is the decoded form of that pointer -- content
/// must be fetched from a bundle or a continuation resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseContinuation {
    Inline(Box<Contract>),
    Merkleized(Box<Contract>),
    Reference(Label),
}

/// An (action, continuation) pair inside a `When`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Case {
    pub action: Action,
    pub then: CaseContinuation,
}

// ──────────────────────────────────────────────
// Contracts
// ──────────────────────────────────────────────

/// A financial contract. `Close` refunds remaining accounts; `Pay` moves
/// funds; `If` branches on an observation; `When` waits for external input
/// until a timeout; `Let` binds a value; `Assert` checks an observation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Contract {
    Close,
    Pay {
        from_account: Party,
        to: Payee,
        token: Token,
        pay: Value,
        then: Box<Contract>,
    },
    If {
        obs: Observation,
        then: Box<Contract>,
        r#else: Box<Contract>,
    },
    When {
        cases: Vec<Case>,
        timeout: Timeout,
        timeout_continuation: Box<Contract>,
    },
    Let {
        value_id: ValueId,
        be: Box<Value>,
        then: Box<Contract>,
    },
    Assert {
        obs: Observation,
        then: Box<Contract>,
    },
}

impl Contract {
    pub fn pay(
        from_account: Party,
        to: Payee,
        token: Token,
        pay: impl Into<Value>,
        then: Contract,
    ) -> Contract {
        Contract::Pay {
            from_account,
            to,
            token,
            pay: pay.into(),
            then: Box::new(then),
        }
    }

    pub fn if_else(obs: impl Into<Observation>, then: Contract, r#else: Contract) -> Contract {
        Contract::If {
            obs: obs.into(),
            then: Box::new(then),
            r#else: Box::new(r#else),
        }
    }

    pub fn when(
        cases: impl IntoIterator<Item = Case>,
        timeout: impl Into<Timeout>,
        timeout_continuation: Contract,
    ) -> Contract {
        Contract::When {
            cases: cases.into_iter().collect(),
            timeout: timeout.into(),
            timeout_continuation: Box::new(timeout_continuation),
        }
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Contract::Close)
    }
}

/// The earliest `When` timeout strictly greater than `after`, or `None`
/// when no such timeout is reachable. `If` considers both branches (the
/// branch taken cannot be known without an environment); a `When`'s own
/// timeout is considered before its timeout continuation.
pub fn next_timeout_after(contract: &Contract, after: &Timeout) -> Option<Timeout> {
    match contract {
        Contract::Close => None,
        Contract::Pay { then, .. }
        | Contract::Let { then, .. }
        | Contract::Assert { then, .. } => next_timeout_after(then, after),
        Contract::If { then, r#else, .. } => {
            match (
                next_timeout_after(then, after),
                next_timeout_after(r#else, after),
            ) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            }
        }
        Contract::When {
            timeout,
            timeout_continuation,
            ..
        } => {
            if *timeout > *after {
                Some(timeout.clone())
            } else {
                next_timeout_after(timeout_continuation, after)
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn party_identity_is_value_based() {
        assert_eq!(Party::role("buyer"), Party::role("buyer"));
        assert_ne!(Party::role("buyer"), Party::address("buyer"));
    }

    #[test]
    fn bound_contains_is_inclusive() {
        let b = Bound::new(0, 5);
        assert!(b.contains(&big(0)));
        assert!(b.contains(&big(5)));
        assert!(!b.contains(&big(6)));
        assert!(!b.contains(&big(-1)));
    }

    #[test]
    fn in_bounds_checks_every_range() {
        let bounds = vec![Bound::new(0, 2), Bound::new(10, 12)];
        assert!(in_bounds(&big(1), &bounds));
        assert!(in_bounds(&big(11), &bounds));
        assert!(!in_bounds(&big(5), &bounds));
    }

    #[test]
    fn builder_and_direct_construction_agree() {
        let buyer = Party::role("buyer");
        let seller = Party::role("seller");

        let built = buyer
            .deposits(100, Token::ada())
            .into_account(seller.clone())
            .then(Contract::Close);

        let direct = Case {
            action: Action::Deposit {
                into_account: seller,
                party: buyer,
                of_token: Token::ada(),
                deposits: Value::Constant(big(100)),
            },
            then: CaseContinuation::Inline(Box::new(Contract::Close)),
        };

        assert_eq!(built, direct);
    }

    #[test]
    fn choice_builder_orders_bounds_as_given() {
        let oracle = Party::role("oracle");
        let action = oracle.chooses("price").between([Bound::new(1, 10)]);
        match action {
            Action::Choice {
                for_choice,
                choose_between,
            } => {
                assert_eq!(for_choice.choice_name, "price");
                assert_eq!(choose_between, vec![Bound::new(1, 10)]);
            }
            other => panic!("expected Choice, got {:?}", other),
        }
    }

    #[test]
    fn next_timeout_skips_past_timeouts() {
        let inner = Contract::when([], 50, Contract::Close);
        let outer = Contract::when([], 10, inner);
        // Timeout 10 is not after 20; the continuation's 50 is.
        assert_eq!(next_timeout_after(&outer, &big(20)), Some(big(50)));
        assert_eq!(next_timeout_after(&outer, &big(5)), Some(big(10)));
        assert_eq!(next_timeout_after(&outer, &big(60)), None);
    }

    #[test]
    fn next_timeout_takes_minimum_across_if_branches() {
        let c = Contract::if_else(
            true,
            Contract::when([], 30, Contract::Close),
            Contract::when([], 20, Contract::Close),
        );
        assert_eq!(next_timeout_after(&c, &big(0)), Some(big(20)));
    }

    #[test]
    fn next_timeout_traverses_pay() {
        let c = Contract::pay(
            Party::role("a"),
            Payee::Party(Party::role("b")),
            Token::ada(),
            1,
            Contract::when([], 40, Contract::Close),
        );
        assert_eq!(next_timeout_after(&c, &big(0)), Some(big(40)));
    }
}
