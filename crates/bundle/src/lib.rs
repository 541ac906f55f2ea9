//! covenant-bundle: content-addressed packaging of contract trees.
//!
//! A contract whose cases carry merkleized continuations is shipped as a
//! bundle: the tree with each merkleized continuation replaced by a bare
//! hash pointer, plus a map from hash label to the continuation content.
//! Labels are lowercase hex SHA-256 of the canonical interchange encoding,
//! so structurally equal trees always share a label no matter how they
//! were built.

use covenant_core::Label;
use covenant_interchange::EncodeError;

pub mod hash;
pub mod map;

pub use hash::hash_contract;
pub use map::{
    continuations_of, merge_bundle_maps, merkleize, to_runtime_object, BundleMap, BundleObject,
    ContractBundleMap,
};

/// Failure while building or merging a bundle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    /// One label maps to two structurally different objects. Either a hash
    /// collision or an upstream logic error; never resolved by picking a
    /// side.
    #[error("bundle corrupt: label '{label}' maps to differing content")]
    LabelCollision { label: Label },
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
