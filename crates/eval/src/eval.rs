//! Pure evaluation of values and observations.
//!
//! Both functions are total: absent account, choice, or bound-value lookups
//! evaluate to zero, and an unrecorded choice observes false. Division
//! truncates toward zero; division by zero is defined as zero.

use num_bigint::BigInt;
use num_traits::Zero;

use covenant_core::{Environment, Observation, State, Value};

pub fn eval_value(env: &Environment, state: &State, value: &Value) -> BigInt {
    match value {
        Value::Constant(n) => n.clone(),
        Value::AvailableMoney {
            in_account,
            of_token,
        } => state.available_money(in_account, of_token),
        Value::ChoiceValue(choice_id) => state
            .choices
            .get(choice_id)
            .cloned()
            .unwrap_or_else(BigInt::zero),
        Value::Neg(v) => -eval_value(env, state, v),
        Value::Add(l, r) => eval_value(env, state, l) + eval_value(env, state, r),
        Value::Sub(l, r) => eval_value(env, state, l) - eval_value(env, state, r),
        Value::Mul(l, r) => eval_value(env, state, l) * eval_value(env, state, r),
        Value::Div(l, r) => {
            let divisor = eval_value(env, state, r);
            if divisor.is_zero() {
                BigInt::zero()
            } else {
                eval_value(env, state, l) / divisor
            }
        }
        Value::UseValue(id) => state
            .bound_values
            .get(id)
            .cloned()
            .unwrap_or_else(BigInt::zero),
        Value::Cond(obs, then, otherwise) => {
            if eval_observation(env, state, obs) {
                eval_value(env, state, then)
            } else {
                eval_value(env, state, otherwise)
            }
        }
        Value::TimeIntervalStart => env.time_interval.from().clone(),
        Value::TimeIntervalEnd => env.time_interval.to().clone(),
    }
}

pub fn eval_observation(env: &Environment, state: &State, obs: &Observation) -> bool {
    match obs {
        Observation::Constant(b) => *b,
        Observation::And(l, r) => {
            eval_observation(env, state, l) && eval_observation(env, state, r)
        }
        Observation::Or(l, r) => {
            eval_observation(env, state, l) || eval_observation(env, state, r)
        }
        Observation::Not(o) => !eval_observation(env, state, o),
        Observation::ValueEQ(l, r) => eval_value(env, state, l) == eval_value(env, state, r),
        Observation::ValueGE(l, r) => eval_value(env, state, l) >= eval_value(env, state, r),
        Observation::ValueGT(l, r) => eval_value(env, state, l) > eval_value(env, state, r),
        Observation::ValueLT(l, r) => eval_value(env, state, l) < eval_value(env, state, r),
        Observation::ValueLE(l, r) => eval_value(env, state, l) <= eval_value(env, state, r),
        Observation::ChoseSomething(choice_id) => state.choices.contains_key(choice_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{ChoiceId, Party, Token};

    fn env() -> Environment {
        Environment::over(100, 200).unwrap()
    }

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn absent_lookups_are_zero() {
        let state = State::empty(0);
        let party = Party::role("a");
        assert_eq!(
            eval_value(&env(), &state, &party.available_money(Token::ada())),
            big(0)
        );
        assert_eq!(
            eval_value(
                &env(),
                &state,
                &Value::ChoiceValue(ChoiceId::new("c", party))
            ),
            big(0)
        );
        assert_eq!(
            eval_value(&env(), &state, &Value::UseValue("x".to_string())),
            big(0)
        );
    }

    #[test]
    fn arithmetic() {
        let state = State::empty(0);
        let v = Value::from(2).add(3).mul(4); // (2 + 3) * 4
        assert_eq!(eval_value(&env(), &state, &v), big(20));
        assert_eq!(eval_value(&env(), &state, &Value::from(7).neg()), big(-7));
    }

    #[test]
    fn division_truncates_toward_zero() {
        let state = State::empty(0);
        assert_eq!(eval_value(&env(), &state, &Value::from(7).div(2)), big(3));
        assert_eq!(eval_value(&env(), &state, &Value::from(-7).div(2)), big(-3));
        assert_eq!(eval_value(&env(), &state, &Value::from(7).div(-2)), big(-3));
    }

    #[test]
    fn division_by_zero_is_zero() {
        let state = State::empty(0);
        assert_eq!(eval_value(&env(), &state, &Value::from(7).div(0)), big(0));
    }

    #[test]
    fn interval_endpoints() {
        let state = State::empty(0);
        assert_eq!(
            eval_value(&env(), &state, &Value::TimeIntervalStart),
            big(100)
        );
        assert_eq!(eval_value(&env(), &state, &Value::TimeIntervalEnd), big(200));
    }

    #[test]
    fn comparisons_and_connectives() {
        let state = State::empty(0);
        assert!(eval_observation(&env(), &state, &Value::from(1).lt(2)));
        assert!(eval_observation(&env(), &state, &Value::from(2).le(2)));
        assert!(!eval_observation(&env(), &state, &Value::from(2).gt(2)));
        assert!(eval_observation(
            &env(),
            &state,
            &Observation::from(true).and(Value::from(1).eq(1))
        ));
        assert!(eval_observation(
            &env(),
            &state,
            &Observation::from(false).or(true)
        ));
        assert!(eval_observation(&env(), &state, &Observation::from(false).not()));
    }

    #[test]
    fn chose_something_tracks_recorded_choices() {
        let choice = ChoiceId::new("price", Party::role("oracle"));
        let state = State::empty(0);
        assert!(!eval_observation(
            &env(),
            &state,
            &Observation::ChoseSomething(choice.clone())
        ));
        let state = state.with_choice(choice.clone(), big(5));
        assert!(eval_observation(
            &env(),
            &state,
            &Observation::ChoseSomething(choice)
        ));
    }
}
