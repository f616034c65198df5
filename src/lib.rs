// SPDX-License-Identifier: Apache-2.0

//! Discovers equivalence classes of syntactically equal Yul blocks.
//!
//! Two blocks land in the same class when they are structurally identical up
//! to a consistent renaming of their local and free identifiers. Each block is
//! fingerprinted bottom-up; blocks sharing a fingerprint are confirmed with an
//! [`syntactic_equality::EqualityOracle`] before they are grouped.
//!
//! ```
//! use yul_blockclass::block_class_finder::{find_block_classes, BlockClassFinderOptions};
//! use yul_blockclass::parser::parse_block;
//! use yul_blockclass::syntactic_equality::SyntacticEquality;
//!
//! let root = parse_block("{ { x := add(a, 1) } { y := add(b, 1) } }").unwrap();
//! let classes =
//!     find_block_classes(&root, &SyntacticEquality, &BlockClassFinderOptions::default())
//!         .unwrap();
//! assert_eq!(classes.duplicate_classes().count(), 1);
//! ```

pub mod ast;
pub mod ast_walker;
pub mod block_class_finder;
pub mod block_class_verify;
pub mod equivalence_index;
pub mod error;
pub mod fingerprint;
pub mod identifier_classifier;
pub mod parser;
pub mod syntactic_equality;

pub use block_class_finder::{find_block_classes, run, BlockClassFinderOptions};
pub use equivalence_index::{BlockClass, BlockClasses, ClassId, FreeReferences};
pub use error::BlockClassError;
