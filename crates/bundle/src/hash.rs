//! Canonical structural hashing of contracts.

use sha2::{Digest, Sha256};

use covenant_core::{Contract, Label};
use covenant_interchange::encode_contract;

use crate::map::merkleize;
use crate::BundleError;

/// Label for an already-encoded canonical JSON value: lowercase hex
/// SHA-256 of its serialized text.
pub(crate) fn hash_encoded(value: &serde_json::Value) -> Label {
    let digest = Sha256::digest(value.to_string().as_bytes());
    Label(hex::encode(digest))
}

/// The canonical structural hash of a contract.
///
/// Merkleized continuations hash as their `{ref}` pointer, so a tree hashes
/// the same whether a structurally equal subtree is held inline-merkleized
/// or as a resolved reference.
pub fn hash_contract(contract: &Contract) -> Result<Label, BundleError> {
    let (resolved, _) = merkleize(contract)?;
    Ok(hash_encoded(&encode_contract(&resolved)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_core::{Action, Bound, Case, CaseContinuation, Contract, Party, Token};

    #[test]
    fn labels_are_lowercase_hex_sha256() {
        let label = hash_contract(&Contract::Close).unwrap();
        assert_eq!(label.as_str().len(), 64);
        assert!(label
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn structurally_equal_trees_hash_equal() {
        // Same tree via the direct constructor and via builders.
        let direct = Contract::When {
            cases: vec![Case {
                action: Action::Deposit {
                    into_account: Party::Role("seller".to_string()),
                    party: Party::Role("buyer".to_string()),
                    of_token: Token::ada(),
                    deposits: 100.into(),
                },
                then: CaseContinuation::Inline(Box::new(Contract::Close)),
            }],
            timeout: 1_000.into(),
            timeout_continuation: Box::new(Contract::Close),
        };
        let built = Contract::when(
            [Party::role("buyer")
                .deposits(100, Token::ada())
                .into_account(Party::role("seller"))
                .then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        assert_eq!(hash_contract(&direct).unwrap(), hash_contract(&built).unwrap());
    }

    #[test]
    fn distinct_trees_hash_differently() {
        let a = Contract::when(
            [Action::notify(true).then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        let b = Contract::when(
            [Action::notify(false).then(Contract::Close)],
            1_000,
            Contract::Close,
        );
        assert_ne!(hash_contract(&a).unwrap(), hash_contract(&b).unwrap());
    }

    #[test]
    fn merkleized_and_referenced_forms_hash_equal() {
        let continuation = Contract::when(
            [Party::role("oracle")
                .chooses("price")
                .between([Bound::new(0, 100)])
                .then(Contract::Close)],
            2_000,
            Contract::Close,
        );
        let label = hash_contract(&continuation).unwrap();

        let merkleized = Contract::when(
            [Action::notify(true).then_merkleized(continuation)],
            1_000,
            Contract::Close,
        );
        let referenced = Contract::When {
            cases: vec![Case {
                action: Action::notify(true),
                then: CaseContinuation::Reference(label),
            }],
            timeout: 1_000.into(),
            timeout_continuation: Box::new(Contract::Close),
        };
        assert_eq!(
            hash_contract(&merkleized).unwrap(),
            hash_contract(&referenced).unwrap()
        );
    }
}
