//! Bundle maps: label-keyed object stores and the merkleization pass.

use std::collections::BTreeMap;

use covenant_core::{Case, CaseContinuation, Contract, Label};
use covenant_interchange::encode_contract;

use crate::hash::hash_encoded;
use crate::BundleError;

/// A tagged object stored in a bundle, in canonical encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleObject {
    Party(serde_json::Value),
    Value(serde_json::Value),
    Observation(serde_json::Value),
    Token(serde_json::Value),
    Contract(serde_json::Value),
    Action(serde_json::Value),
}

impl BundleObject {
    fn type_tag(&self) -> &'static str {
        match self {
            BundleObject::Party(_) => "party",
            BundleObject::Value(_) => "value",
            BundleObject::Observation(_) => "observation",
            BundleObject::Token(_) => "token",
            BundleObject::Contract(_) => "contract",
            BundleObject::Action(_) => "action",
        }
    }

    fn encoded(&self) -> &serde_json::Value {
        match self {
            BundleObject::Party(v)
            | BundleObject::Value(v)
            | BundleObject::Observation(v)
            | BundleObject::Token(v)
            | BundleObject::Contract(v)
            | BundleObject::Action(v) => v,
        }
    }
}

pub type BundleMap = BTreeMap<Label, BundleObject>;

/// Insert, treating an existing entry with different content as corruption.
fn insert_checked(
    map: &mut BundleMap,
    label: Label,
    object: BundleObject,
) -> Result<(), BundleError> {
    if let Some(existing) = map.get(&label) {
        if *existing != object {
            return Err(BundleError::LabelCollision { label });
        }
        return Ok(());
    }
    map.insert(label, object);
    Ok(())
}

/// Union of two bundle maps. A label present in both with differing content
/// is fatal corruption, never a silent overwrite.
pub fn merge_bundle_maps(a: &BundleMap, b: &BundleMap) -> Result<BundleMap, BundleError> {
    let mut merged = a.clone();
    for (label, object) in b {
        insert_checked(&mut merged, label.clone(), object.clone())?;
    }
    Ok(merged)
}

/// Resolve every merkleized continuation in a tree.
///
/// Returns the tree with each `Merkleized` continuation replaced by a
/// `Reference` to its hash, together with the map of all continuation
/// content collected along the way (nested merkleizations included).
pub fn merkleize(contract: &Contract) -> Result<(Contract, BundleMap), BundleError> {
    let mut objects = BundleMap::new();
    let resolved = merkleize_into(contract, &mut objects)?;
    Ok((resolved, objects))
}

fn merkleize_into(contract: &Contract, objects: &mut BundleMap) -> Result<Contract, BundleError> {
    Ok(match contract {
        Contract::Close => Contract::Close,
        Contract::Pay {
            from_account,
            to,
            token,
            pay,
            then,
        } => Contract::Pay {
            from_account: from_account.clone(),
            to: to.clone(),
            token: token.clone(),
            pay: pay.clone(),
            then: Box::new(merkleize_into(then, objects)?),
        },
        Contract::If { obs, then, r#else } => Contract::If {
            obs: obs.clone(),
            then: Box::new(merkleize_into(then, objects)?),
            r#else: Box::new(merkleize_into(r#else, objects)?),
        },
        Contract::When {
            cases,
            timeout,
            timeout_continuation,
        } => {
            let cases = cases
                .iter()
                .map(|case| merkleize_case(case, objects))
                .collect::<Result<Vec<_>, _>>()?;
            Contract::When {
                cases,
                timeout: timeout.clone(),
                timeout_continuation: Box::new(merkleize_into(timeout_continuation, objects)?),
            }
        }
        Contract::Let { value_id, be, then } => Contract::Let {
            value_id: value_id.clone(),
            be: be.clone(),
            then: Box::new(merkleize_into(then, objects)?),
        },
        Contract::Assert { obs, then } => Contract::Assert {
            obs: obs.clone(),
            then: Box::new(merkleize_into(then, objects)?),
        },
    })
}

fn merkleize_case(case: &Case, objects: &mut BundleMap) -> Result<Case, BundleError> {
    let then = match &case.then {
        CaseContinuation::Inline(c) => {
            CaseContinuation::Inline(Box::new(merkleize_into(c, objects)?))
        }
        CaseContinuation::Merkleized(c) => {
            let resolved = merkleize_into(c, objects)?;
            let encoded = encode_contract(&resolved)?;
            let label = hash_encoded(&encoded);
            insert_checked(objects, label.clone(), BundleObject::Contract(encoded))?;
            CaseContinuation::Reference(label)
        }
        CaseContinuation::Reference(label) => CaseContinuation::Reference(label.clone()),
    };
    Ok(Case {
        action: case.action.clone(),
        then,
    })
}

/// Every merkleized sub-contract reachable from the tree, recursively,
/// keyed by its hash.
pub fn continuations_of(contract: &Contract) -> Result<BundleMap, BundleError> {
    merkleize(contract).map(|(_, objects)| objects)
}

/// A whole tree packaged with its continuations map and a designated entry
/// point. The submission wire format for contracts with out-of-line
/// branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBundleMap {
    pub main: Label,
    pub objects: BundleMap,
}

impl ContractBundleMap {
    /// The encoded content stored under `label`, if any.
    pub fn get(&self, label: &Label) -> Option<&BundleObject> {
        self.objects.get(label)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let objects = self
            .objects
            .iter()
            .map(|(label, object)| {
                (
                    label.as_str().to_string(),
                    serde_json::json!({
                        "type": object.type_tag(),
                        "value": object.encoded(),
                    }),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::json!({
            "main": self.main.as_str(),
            "objects": objects,
        })
    }
}

/// Package a tree: merkleize it, then store the resolved root under its own
/// hash as the entry point.
pub fn to_runtime_object(contract: &Contract) -> Result<ContractBundleMap, BundleError> {
    let (resolved, mut objects) = merkleize(contract)?;
    let encoded = encode_contract(&resolved)?;
    let main = hash_encoded(&encoded);
    insert_checked(&mut objects, main.clone(), BundleObject::Contract(encoded))?;
    Ok(ContractBundleMap { main, objects })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_contract;
    use covenant_core::{Action, Bound, Party, Token};

    fn sample_continuation() -> Contract {
        Contract::when(
            [Party::role("oracle")
                .chooses("price")
                .between([Bound::new(0, 100)])
                .then(Contract::Close)],
            2_000,
            Contract::Close,
        )
    }

    #[test]
    fn plain_tree_has_no_continuations() {
        let contract = Contract::when(
            [Action::notify(true).then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        assert!(continuations_of(&contract).unwrap().is_empty());
    }

    #[test]
    fn merkleized_continuation_is_collected_under_its_hash() {
        let continuation = sample_continuation();
        let label = hash_contract(&continuation).unwrap();
        let contract = Contract::when(
            [Action::notify(true).then_merkleized(continuation.clone())],
            1_000,
            Contract::Close,
        );

        let (resolved, objects) = merkleize(&contract).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects.get(&label),
            Some(&BundleObject::Contract(
                encode_contract(&continuation).unwrap()
            ))
        );
        match &resolved {
            Contract::When { cases, .. } => {
                assert_eq!(cases[0].then, CaseContinuation::Reference(label));
            }
            other => panic!("expected When, got {:?}", other),
        }
    }

    #[test]
    fn nested_merkleization_collects_both_levels() {
        let inner = sample_continuation();
        let outer = Contract::when(
            [Party::role("buyer")
                .deposits(10, Token::ada())
                .into_account(Party::role("seller"))
                .then_merkleized(inner.clone())],
            1_500,
            Contract::Close,
        );
        let contract = Contract::when(
            [Action::notify(true).then_merkleized(outer)],
            1_000,
            Contract::Close,
        );

        let objects = continuations_of(&contract).unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects.contains_key(&hash_contract(&inner).unwrap()));
    }

    #[test]
    fn equal_subtrees_share_one_entry() {
        let continuation = sample_continuation();
        let contract = Contract::when(
            [
                Action::notify(true).then_merkleized(continuation.clone()),
                Action::notify(false).then_merkleized(continuation),
            ],
            1_000,
            Contract::Close,
        );
        assert_eq!(continuations_of(&contract).unwrap().len(), 1);
    }

    #[test]
    fn merge_detects_label_collision() {
        let label = Label("00".repeat(32));
        let mut a = BundleMap::new();
        a.insert(label.clone(), BundleObject::Contract(serde_json::json!("close")));
        let mut b = BundleMap::new();
        b.insert(
            label.clone(),
            BundleObject::Contract(serde_json::json!({ "assert": true, "then": "close" })),
        );

        assert_eq!(
            merge_bundle_maps(&a, &b),
            Err(BundleError::LabelCollision { label })
        );
    }

    #[test]
    fn merge_accepts_identical_entries() {
        let label = Label("ab".repeat(32));
        let mut a = BundleMap::new();
        a.insert(label.clone(), BundleObject::Contract(serde_json::json!("close")));
        let merged = merge_bundle_maps(&a, &a.clone()).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn runtime_object_stores_root_under_main() {
        let contract = Contract::when(
            [Action::notify(true).then_merkleized(sample_continuation())],
            1_000,
            Contract::Close,
        );
        let bundle = to_runtime_object(&contract).unwrap();
        assert_eq!(bundle.main, hash_contract(&contract).unwrap());
        assert_eq!(bundle.objects.len(), 2);
        assert!(bundle.get(&bundle.main).is_some());

        let json = bundle.to_json();
        assert_eq!(json["main"], serde_json::json!(bundle.main.as_str()));
        assert!(json["objects"][bundle.main.as_str()]["value"].is_object());
    }
}
