//! Decoders from interchange JSON back into the typed contract tree.
//!
//! Each shape is dispatched on its distinguishing field. A case whose
//! continuation arrives as a `{ref}` pointer decodes to
//! [`CaseContinuation::Reference`]; fetching the referenced content is the
//! caller's job.

use covenant_core::{
    Action, Bound, Case, CaseContinuation, ChoiceId, Contract, Input, InputContent, Label,
    Observation, Party, Payee, Token, Value,
};

use crate::number::bigint_from_json;
use crate::DecodeError;

// ── Decoding helpers ────────────────────────────────────────────────

fn malformed(message: impl Into<String>) -> DecodeError {
    DecodeError::Malformed {
        message: message.into(),
    }
}

fn field<'a>(
    obj: &'a serde_json::Value,
    name: &str,
) -> Result<&'a serde_json::Value, DecodeError> {
    obj.get(name)
        .ok_or_else(|| malformed(format!("missing '{}' field", name)))
}

fn required_str(obj: &serde_json::Value, name: &str) -> Result<String, DecodeError> {
    field(obj, name)?
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| malformed(format!("'{}' is not a string", name)))
}

// ── Sub-objects ─────────────────────────────────────────────────────

pub fn decode_party(v: &serde_json::Value) -> Result<Party, DecodeError> {
    if let Some(addr) = v.get("address") {
        let addr = addr
            .as_str()
            .ok_or_else(|| malformed("'address' is not a string"))?;
        return Ok(Party::Address(addr.to_string()));
    }
    if let Some(name) = v.get("role_token") {
        let name = name
            .as_str()
            .ok_or_else(|| malformed("'role_token' is not a string"))?;
        return Ok(Party::Role(name.to_string()));
    }
    Err(malformed(format!("not a party: {}", v)))
}

pub fn decode_payee(v: &serde_json::Value) -> Result<Payee, DecodeError> {
    if let Some(p) = v.get("party") {
        return Ok(Payee::Party(decode_party(p)?));
    }
    if let Some(p) = v.get("account") {
        return Ok(Payee::Account(decode_party(p)?));
    }
    Err(malformed(format!("not a payee: {}", v)))
}

pub fn decode_token(v: &serde_json::Value) -> Result<Token, DecodeError> {
    Ok(Token {
        currency_symbol: required_str(v, "currency_symbol")?,
        token_name: required_str(v, "token_name")?,
    })
}

pub fn decode_choice_id(v: &serde_json::Value) -> Result<ChoiceId, DecodeError> {
    Ok(ChoiceId {
        choice_name: required_str(v, "choice_name")?,
        choice_owner: decode_party(field(v, "choice_owner")?)?,
    })
}

pub fn decode_bound(v: &serde_json::Value) -> Result<Bound, DecodeError> {
    Ok(Bound {
        from: bigint_from_json(field(v, "from")?)?,
        to: bigint_from_json(field(v, "to")?)?,
    })
}

// ── Values and observations ─────────────────────────────────────────

pub fn decode_value(v: &serde_json::Value) -> Result<Value, DecodeError> {
    if v.is_number() {
        return Ok(Value::Constant(bigint_from_json(v)?));
    }
    if let Some(s) = v.as_str() {
        return match s {
            "time_interval_start" => Ok(Value::TimeIntervalStart),
            "time_interval_end" => Ok(Value::TimeIntervalEnd),
            other => Err(malformed(format!("unknown value marker: '{}'", other))),
        };
    }
    if !v.is_object() {
        return Err(malformed(format!("not a value: {}", v)));
    }

    if v.get("amount_of_token").is_some() {
        return Ok(Value::AvailableMoney {
            in_account: decode_party(field(v, "in_account")?)?,
            of_token: decode_token(field(v, "amount_of_token")?)?,
        });
    }
    if let Some(c) = v.get("value_of_choice") {
        return Ok(Value::ChoiceValue(decode_choice_id(c)?));
    }
    if let Some(inner) = v.get("negate") {
        return Ok(Value::Neg(Box::new(decode_value(inner)?)));
    }
    if v.get("add").is_some() {
        return Ok(Value::Add(
            Box::new(decode_value(field(v, "add")?)?),
            Box::new(decode_value(field(v, "and")?)?),
        ));
    }
    if v.get("minus").is_some() {
        return Ok(Value::Sub(
            Box::new(decode_value(field(v, "value")?)?),
            Box::new(decode_value(field(v, "minus")?)?),
        ));
    }
    if v.get("multiply").is_some() {
        return Ok(Value::Mul(
            Box::new(decode_value(field(v, "multiply")?)?),
            Box::new(decode_value(field(v, "times")?)?),
        ));
    }
    if v.get("divide").is_some() {
        return Ok(Value::Div(
            Box::new(decode_value(field(v, "divide")?)?),
            Box::new(decode_value(field(v, "by")?)?),
        ));
    }
    if let Some(id) = v.get("use_value") {
        let id = id
            .as_str()
            .ok_or_else(|| malformed("'use_value' is not a string"))?;
        return Ok(Value::UseValue(id.to_string()));
    }
    if v.get("if").is_some() {
        return Ok(Value::Cond(
            Box::new(decode_observation(field(v, "if")?)?),
            Box::new(decode_value(field(v, "then")?)?),
            Box::new(decode_value(field(v, "else")?)?),
        ));
    }
    Err(malformed(format!("not a value: {}", v)))
}

pub fn decode_observation(v: &serde_json::Value) -> Result<Observation, DecodeError> {
    if let Some(b) = v.as_bool() {
        return Ok(Observation::Constant(b));
    }
    if !v.is_object() {
        return Err(malformed(format!("not an observation: {}", v)));
    }

    if v.get("both").is_some() {
        return Ok(Observation::And(
            Box::new(decode_observation(field(v, "both")?)?),
            Box::new(decode_observation(field(v, "and")?)?),
        ));
    }
    if v.get("either").is_some() {
        return Ok(Observation::Or(
            Box::new(decode_observation(field(v, "either")?)?),
            Box::new(decode_observation(field(v, "or")?)?),
        ));
    }
    if let Some(inner) = v.get("not") {
        return Ok(Observation::Not(Box::new(decode_observation(inner)?)));
    }
    if let Some(c) = v.get("chose_something_for") {
        return Ok(Observation::ChoseSomething(decode_choice_id(c)?));
    }
    if v.get("value").is_some() {
        let left = Box::new(decode_value(field(v, "value")?)?);
        if v.get("equal_to").is_some() {
            return Ok(Observation::ValueEQ(
                left,
                Box::new(decode_value(field(v, "equal_to")?)?),
            ));
        }
        if v.get("ge_than").is_some() {
            return Ok(Observation::ValueGE(
                left,
                Box::new(decode_value(field(v, "ge_than")?)?),
            ));
        }
        if v.get("gt").is_some() {
            return Ok(Observation::ValueGT(
                left,
                Box::new(decode_value(field(v, "gt")?)?),
            ));
        }
        if v.get("lt").is_some() {
            return Ok(Observation::ValueLT(
                left,
                Box::new(decode_value(field(v, "lt")?)?),
            ));
        }
        if v.get("le_than").is_some() {
            return Ok(Observation::ValueLE(
                left,
                Box::new(decode_value(field(v, "le_than")?)?),
            ));
        }
    }
    Err(malformed(format!("not an observation: {}", v)))
}

// ── Actions, cases, contracts ───────────────────────────────────────

pub fn decode_action(v: &serde_json::Value) -> Result<Action, DecodeError> {
    if let Some(obs) = v.get("notify_if") {
        return Ok(Action::Notify {
            notify_if: decode_observation(obs)?,
        });
    }
    if v.get("deposits").is_some() {
        return Ok(Action::Deposit {
            into_account: decode_party(field(v, "into_account")?)?,
            party: decode_party(field(v, "party")?)?,
            of_token: decode_token(field(v, "of_token")?)?,
            deposits: decode_value(field(v, "deposits")?)?,
        });
    }
    if v.get("for_choice").is_some() {
        let bounds = field(v, "choose_between")?
            .as_array()
            .ok_or_else(|| malformed("'choose_between' is not an array"))?
            .iter()
            .map(decode_bound)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Action::Choice {
            for_choice: decode_choice_id(field(v, "for_choice")?)?,
            choose_between: bounds,
        });
    }
    Err(malformed(format!("not an action: {}", v)))
}

pub fn decode_case(v: &serde_json::Value) -> Result<Case, DecodeError> {
    let action = decode_action(field(v, "case")?)?;
    let then = field(v, "then")?;
    let then = match then.get("ref") {
        Some(label) => {
            let label = label
                .as_str()
                .ok_or_else(|| malformed("'ref' is not a string"))?;
            CaseContinuation::Reference(Label(label.to_string()))
        }
        None => CaseContinuation::Inline(Box::new(decode_contract(then)?)),
    };
    Ok(Case { action, then })
}

pub fn decode_contract(v: &serde_json::Value) -> Result<Contract, DecodeError> {
    if let Some(s) = v.as_str() {
        return match s {
            "close" => Ok(Contract::Close),
            other => Err(malformed(format!("unknown contract marker: '{}'", other))),
        };
    }
    if !v.is_object() {
        return Err(malformed(format!("not a contract: {}", v)));
    }

    if v.get("from_account").is_some() {
        return Ok(Contract::Pay {
            from_account: decode_party(field(v, "from_account")?)?,
            to: decode_payee(field(v, "to")?)?,
            token: decode_token(field(v, "token")?)?,
            pay: decode_value(field(v, "pay")?)?,
            then: Box::new(decode_contract(field(v, "then")?)?),
        });
    }
    if v.get("when").is_some() {
        let cases = field(v, "when")?
            .as_array()
            .ok_or_else(|| malformed("'when' is not an array"))?
            .iter()
            .map(decode_case)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Contract::When {
            cases,
            timeout: bigint_from_json(field(v, "timeout")?)?,
            timeout_continuation: Box::new(decode_contract(field(v, "timeout_continuation")?)?),
        });
    }
    if v.get("let").is_some() {
        return Ok(Contract::Let {
            value_id: required_str(v, "let")?,
            be: Box::new(decode_value(field(v, "be")?)?),
            then: Box::new(decode_contract(field(v, "then")?)?),
        });
    }
    if let Some(obs) = v.get("assert") {
        return Ok(Contract::Assert {
            obs: decode_observation(obs)?,
            then: Box::new(decode_contract(field(v, "then")?)?),
        });
    }
    if v.get("if").is_some() {
        return Ok(Contract::If {
            obs: decode_observation(field(v, "if")?)?,
            then: Box::new(decode_contract(field(v, "then")?)?),
            r#else: Box::new(decode_contract(field(v, "else")?)?),
        });
    }
    Err(malformed(format!("not a contract: {}", v)))
}

// ── Inputs ──────────────────────────────────────────────────────────

pub fn decode_input(v: &serde_json::Value) -> Result<Input, DecodeError> {
    if let Some(s) = v.as_str() {
        return match s {
            "input_notify" => Ok(Input::inline(InputContent::Notify)),
            other => Err(malformed(format!("unknown input marker: '{}'", other))),
        };
    }
    if !v.is_object() {
        return Err(malformed(format!("not an input: {}", v)));
    }

    let continuation = match v.get("continuation_hash") {
        Some(hash) => {
            let hash = hash
                .as_str()
                .ok_or_else(|| malformed("'continuation_hash' is not a string"))?;
            let contract = decode_contract(field(v, "merkleized_continuation")?)?;
            Some((Label(hash.to_string()), contract))
        }
        None => None,
    };

    let content = if v.get("that_deposits").is_some() {
        InputContent::Deposit {
            into_account: decode_party(field(v, "into_account")?)?,
            input_from_party: decode_party(field(v, "input_from_party")?)?,
            of_token: decode_token(field(v, "of_token")?)?,
            that_deposits: bigint_from_json(field(v, "that_deposits")?)?,
        }
    } else if v.get("for_choice_id").is_some() {
        InputContent::Choice {
            for_choice_id: decode_choice_id(field(v, "for_choice_id")?)?,
            input_that_chooses_num: bigint_from_json(field(v, "input_that_chooses_num")?)?,
        }
    } else if continuation.is_some() {
        // Merkle fields with no content fields: a merkleized notify.
        InputContent::Notify
    } else {
        return Err(malformed(format!("not an input: {}", v)));
    };

    Ok(Input {
        content,
        continuation,
    })
}
