//! covenant-interchange: the canonical JSON wire format for contracts,
//! inputs, and their sub-objects.
//!
//! Encoding is deterministic: object keys are emitted in sorted order and
//! integers are printed exactly, with no precision loss, so the encoded
//! bytes of a contract are stable across processes. Content addressing in
//! covenant-bundle relies on this.

use std::fmt;

pub mod decode;
pub mod encode;
pub mod number;

pub use decode::{
    decode_action, decode_bound, decode_case, decode_choice_id, decode_contract, decode_input,
    decode_observation, decode_party, decode_payee, decode_token, decode_value,
};
pub use encode::{
    encode_action, encode_bound, encode_case, encode_choice_id, encode_contract, encode_input,
    encode_observation, encode_party, encode_payee, encode_token, encode_value,
};
pub use number::{bigint_from_json, bigint_to_json};

/// Failure to decode a wire-format JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The document does not match any known shape.
    Malformed { message: String },
    /// A numeric field is not an integer.
    NotAnInteger { value: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed { message } => {
                write!(f, "malformed interchange document: {}", message)
            }
            DecodeError::NotAnInteger { value } => {
                write!(f, "expected an integer, got: {}", value)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Failure to encode a contract to wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A case continuation is still in its pre-merkleization form and has
    /// no hash reference to emit. Resolve the contract with
    /// covenant-bundle before encoding.
    UnresolvedContinuation,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnresolvedContinuation => {
                write!(f, "merkleized continuation has no hash reference yet")
            }
        }
    }
}

impl std::error::Error for EncodeError {}
