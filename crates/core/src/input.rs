//! Inputs an external party submits against a waiting `When`.

use num_bigint::BigInt;

use crate::contract::{ChoiceId, Contract, Label, Party, Token};

/// The payload of an input, matching the action kinds a case can wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputContent {
    /// Funds moved into a contract account.
    Deposit {
        into_account: Party,
        input_from_party: Party,
        of_token: Token,
        that_deposits: BigInt,
    },
    /// A number chosen for a choice.
    Choice {
        for_choice_id: ChoiceId,
        input_that_chooses_num: BigInt,
    },
    /// A bare notification that an observation holds.
    Notify,
}

/// An input, optionally carrying the continuation of a merkleized case.
///
/// When the matched case stores its continuation as a hash reference, the
/// submitter must supply the continuation content alongside its hash; the
/// engine verifies the hash before applying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub content: InputContent,
    pub continuation: Option<(Label, Contract)>,
}

impl Input {
    pub fn inline(content: InputContent) -> Input {
        Input {
            content,
            continuation: None,
        }
    }

    pub fn merkleized(content: InputContent, hash: Label, continuation: Contract) -> Input {
        Input {
            content,
            continuation: Some((hash, continuation)),
        }
    }
}
