//! Encoders from the typed contract tree to canonical interchange JSON.
//!
//! Every object is built through `serde_json::json!`, whose map type keeps
//! keys sorted, so the serialized text of a given tree is byte-stable.

use serde_json::json;

use covenant_core::{
    Action, Bound, Case, CaseContinuation, ChoiceId, Contract, Input, InputContent, Observation,
    Party, Payee, Token, Value,
};

use crate::number::bigint_to_json;
use crate::EncodeError;

pub fn encode_party(party: &Party) -> serde_json::Value {
    match party {
        Party::Address(addr) => json!({ "address": addr }),
        Party::Role(name) => json!({ "role_token": name }),
    }
}

pub fn encode_payee(payee: &Payee) -> serde_json::Value {
    match payee {
        Payee::Party(p) => json!({ "party": encode_party(p) }),
        Payee::Account(p) => json!({ "account": encode_party(p) }),
    }
}

pub fn encode_token(token: &Token) -> serde_json::Value {
    json!({
        "currency_symbol": token.currency_symbol,
        "token_name": token.token_name,
    })
}

pub fn encode_choice_id(choice_id: &ChoiceId) -> serde_json::Value {
    json!({
        "choice_name": choice_id.choice_name,
        "choice_owner": encode_party(&choice_id.choice_owner),
    })
}

pub fn encode_bound(bound: &Bound) -> serde_json::Value {
    json!({
        "from": bigint_to_json(&bound.from),
        "to": bigint_to_json(&bound.to),
    })
}

pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Constant(n) => bigint_to_json(n),
        Value::AvailableMoney {
            in_account,
            of_token,
        } => json!({
            "amount_of_token": encode_token(of_token),
            "in_account": encode_party(in_account),
        }),
        Value::ChoiceValue(choice_id) => json!({
            "value_of_choice": encode_choice_id(choice_id),
        }),
        Value::Neg(v) => json!({ "negate": encode_value(v) }),
        Value::Add(l, r) => json!({ "add": encode_value(l), "and": encode_value(r) }),
        Value::Sub(l, r) => json!({ "value": encode_value(l), "minus": encode_value(r) }),
        Value::Mul(l, r) => json!({ "multiply": encode_value(l), "times": encode_value(r) }),
        Value::Div(l, r) => json!({ "divide": encode_value(l), "by": encode_value(r) }),
        Value::UseValue(id) => json!({ "use_value": id }),
        Value::Cond(obs, then, otherwise) => json!({
            "if": encode_observation(obs),
            "then": encode_value(then),
            "else": encode_value(otherwise),
        }),
        Value::TimeIntervalStart => json!("time_interval_start"),
        Value::TimeIntervalEnd => json!("time_interval_end"),
    }
}

pub fn encode_observation(obs: &Observation) -> serde_json::Value {
    match obs {
        Observation::Constant(b) => json!(b),
        Observation::And(l, r) => json!({
            "both": encode_observation(l),
            "and": encode_observation(r),
        }),
        Observation::Or(l, r) => json!({
            "either": encode_observation(l),
            "or": encode_observation(r),
        }),
        Observation::Not(o) => json!({ "not": encode_observation(o) }),
        Observation::ValueEQ(l, r) => json!({
            "value": encode_value(l),
            "equal_to": encode_value(r),
        }),
        Observation::ValueGE(l, r) => json!({
            "value": encode_value(l),
            "ge_than": encode_value(r),
        }),
        Observation::ValueGT(l, r) => json!({
            "value": encode_value(l),
            "gt": encode_value(r),
        }),
        Observation::ValueLT(l, r) => json!({
            "value": encode_value(l),
            "lt": encode_value(r),
        }),
        Observation::ValueLE(l, r) => json!({
            "value": encode_value(l),
            "le_than": encode_value(r),
        }),
        Observation::ChoseSomething(choice_id) => json!({
            "chose_something_for": encode_choice_id(choice_id),
        }),
    }
}

pub fn encode_action(action: &Action) -> serde_json::Value {
    match action {
        Action::Notify { notify_if } => json!({ "notify_if": encode_observation(notify_if) }),
        Action::Deposit {
            into_account,
            party,
            of_token,
            deposits,
        } => json!({
            "party": encode_party(party),
            "deposits": encode_value(deposits),
            "of_token": encode_token(of_token),
            "into_account": encode_party(into_account),
        }),
        Action::Choice {
            for_choice,
            choose_between,
        } => json!({
            "for_choice": encode_choice_id(for_choice),
            "choose_between": choose_between.iter().map(encode_bound).collect::<Vec<_>>(),
        }),
    }
}

/// Encode a case. A merkleized continuation is emitted as a bare hash
/// reference, so the case carrying it must have been resolved first; an
/// unresolved `Merkleized` continuation is an error.
pub fn encode_case(case: &Case) -> Result<serde_json::Value, EncodeError> {
    let then = match &case.then {
        CaseContinuation::Inline(contract) => encode_contract(contract)?,
        CaseContinuation::Merkleized(_) => return Err(EncodeError::UnresolvedContinuation),
        CaseContinuation::Reference(label) => json!({ "ref": label.as_str() }),
    };
    Ok(json!({ "case": encode_action(&case.action), "then": then }))
}

pub fn encode_contract(contract: &Contract) -> Result<serde_json::Value, EncodeError> {
    Ok(match contract {
        Contract::Close => json!("close"),
        Contract::Pay {
            from_account,
            to,
            token,
            pay,
            then,
        } => json!({
            "from_account": encode_party(from_account),
            "to": encode_payee(to),
            "token": encode_token(token),
            "pay": encode_value(pay),
            "then": encode_contract(then)?,
        }),
        Contract::If { obs, then, r#else } => json!({
            "if": encode_observation(obs),
            "then": encode_contract(then)?,
            "else": encode_contract(r#else)?,
        }),
        Contract::When {
            cases,
            timeout,
            timeout_continuation,
        } => {
            let encoded_cases = cases
                .iter()
                .map(encode_case)
                .collect::<Result<Vec<_>, _>>()?;
            json!({
                "when": encoded_cases,
                "timeout": bigint_to_json(timeout),
                "timeout_continuation": encode_contract(timeout_continuation)?,
            })
        }
        Contract::Let { value_id, be, then } => json!({
            "let": value_id,
            "be": encode_value(be),
            "then": encode_contract(then)?,
        }),
        Contract::Assert { obs, then } => json!({
            "assert": encode_observation(obs),
            "then": encode_contract(then)?,
        }),
    })
}

/// Encode an input. An input carrying a merkleized continuation gains the
/// `continuation_hash` and `merkleized_continuation` fields; for a
/// merkleized notify the merkle fields alone are the whole object.
pub fn encode_input(input: &Input) -> Result<serde_json::Value, EncodeError> {
    let content = match &input.content {
        InputContent::Deposit {
            into_account,
            input_from_party,
            of_token,
            that_deposits,
        } => json!({
            "input_from_party": encode_party(input_from_party),
            "that_deposits": bigint_to_json(that_deposits),
            "of_token": encode_token(of_token),
            "into_account": encode_party(into_account),
        }),
        InputContent::Choice {
            for_choice_id,
            input_that_chooses_num,
        } => json!({
            "for_choice_id": encode_choice_id(for_choice_id),
            "input_that_chooses_num": bigint_to_json(input_that_chooses_num),
        }),
        InputContent::Notify => json!("input_notify"),
    };

    let Some((hash, continuation)) = &input.continuation else {
        return Ok(content);
    };

    let mut merkle = serde_json::Map::new();
    merkle.insert("continuation_hash".to_string(), json!(hash.as_str()));
    merkle.insert(
        "merkleized_continuation".to_string(),
        encode_contract(continuation)?,
    );

    match content {
        // A merkleized notify is just the merkle object.
        serde_json::Value::String(_) => Ok(serde_json::Value::Object(merkle)),
        serde_json::Value::Object(fields) => {
            merkle.extend(fields);
            Ok(serde_json::Value::Object(merkle))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::Label;

    #[test]
    fn close_encodes_as_bare_string() {
        let encoded = encode_contract(&Contract::Close).unwrap();
        assert_eq!(encoded, json!("close"));
    }

    #[test]
    fn pay_carries_all_fields() {
        let contract = Contract::pay(
            Party::role("buyer"),
            Payee::Party(Party::role("seller")),
            Token::ada(),
            50,
            Contract::Close,
        );
        let encoded = encode_contract(&contract).unwrap();
        assert_eq!(encoded["from_account"], json!({ "role_token": "buyer" }));
        assert_eq!(
            encoded["to"],
            json!({ "party": { "role_token": "seller" } })
        );
        assert_eq!(encoded["pay"], json!(50));
        assert_eq!(encoded["then"], json!("close"));
    }

    #[test]
    fn arithmetic_uses_distinct_field_pairs() {
        let v = Value::from(1).add(2);
        assert_eq!(encode_value(&v), json!({ "add": 1, "and": 2 }));
        let v = Value::from(5).sub(3);
        assert_eq!(encode_value(&v), json!({ "value": 5, "minus": 3 }));
        let v = Value::from(4).mul(6);
        assert_eq!(encode_value(&v), json!({ "multiply": 4, "times": 6 }));
        let v = Value::from(9).div(2);
        assert_eq!(encode_value(&v), json!({ "divide": 9, "by": 2 }));
    }

    #[test]
    fn interval_endpoints_encode_as_strings() {
        assert_eq!(
            encode_value(&Value::TimeIntervalStart),
            json!("time_interval_start")
        );
        assert_eq!(
            encode_value(&Value::TimeIntervalEnd),
            json!("time_interval_end")
        );
    }

    #[test]
    fn reference_continuation_encodes_as_ref_object() {
        let case = Case {
            action: Action::notify(true),
            then: CaseContinuation::Reference(Label("ab12".to_string())),
        };
        let encoded = encode_case(&case).unwrap();
        assert_eq!(encoded["then"], json!({ "ref": "ab12" }));
    }

    #[test]
    fn unresolved_merkleized_continuation_is_rejected() {
        let case = Case {
            action: Action::notify(true),
            then: CaseContinuation::Merkleized(Box::new(Contract::Close)),
        };
        assert_eq!(
            encode_case(&case),
            Err(EncodeError::UnresolvedContinuation)
        );
    }

    #[test]
    fn notify_input_is_bare_string() {
        let input = Input::inline(InputContent::Notify);
        assert_eq!(encode_input(&input).unwrap(), json!("input_notify"));
    }

    #[test]
    fn merkleized_notify_input_is_merkle_object_only() {
        let input = Input::merkleized(
            InputContent::Notify,
            Label("cafe".to_string()),
            Contract::Close,
        );
        assert_eq!(
            encode_input(&input).unwrap(),
            json!({
                "continuation_hash": "cafe",
                "merkleized_continuation": "close",
            })
        );
    }

    #[test]
    fn merkleized_deposit_input_keeps_content_fields() {
        let input = Input::merkleized(
            InputContent::Deposit {
                into_account: Party::role("seller"),
                input_from_party: Party::role("buyer"),
                of_token: Token::ada(),
                that_deposits: 10.into(),
            },
            Label("beef".to_string()),
            Contract::Close,
        );
        let encoded = encode_input(&input).unwrap();
        assert_eq!(encoded["continuation_hash"], json!("beef"));
        assert_eq!(encoded["merkleized_continuation"], json!("close"));
        assert_eq!(encoded["that_deposits"], json!(10));
        assert_eq!(encoded["input_from_party"], json!({ "role_token": "buyer" }));
    }

    #[test]
    fn encoding_is_byte_stable() {
        let contract = Contract::when(
            [Party::role("p").chooses("amount").between([Bound::new(1, 10)])
                .then(Contract::Close)],
            1_700_000_000_000i64,
            Contract::Close,
        );
        let a = serde_json::to_string(&encode_contract(&contract).unwrap()).unwrap();
        let b = serde_json::to_string(&encode_contract(&contract).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
