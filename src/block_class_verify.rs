// SPDX-License-Identifier: Apache-2.0

//! Validators for finished block class results, useful when debugging an
//! oracle or a change to the fingerprinting.

use crate::ast::Block;
use crate::ast_walker::collect_blocks;
use crate::equivalence_index::BlockClasses;
use crate::syntactic_equality::EqualityOracle;

/// Verifies that every member of every class is accepted by `oracle` against
/// the class representative and that the reverse lookup agrees with class
/// membership.
pub fn verify_block_classes(
    classes: &BlockClasses<'_>,
    oracle: &dyn EqualityOracle,
) -> Result<(), String> {
    for (i, class) in classes.classes().iter().enumerate() {
        if class.id().index() != i {
            return Err(format!(
                "class at position {} carries id {}",
                i,
                class.id()
            ));
        }
        if class.is_empty() {
            return Err(format!("class {} has no members", i));
        }
        let representative = class.representative();
        for (m, member) in class.members().iter().enumerate() {
            if member.free.names.len() != representative.free.names.len() {
                return Err(format!(
                    "class {} member {} has {} free names; representative has {}",
                    i,
                    m,
                    member.free.names.len(),
                    representative.free.names.len()
                ));
            }
            if !oracle.equal(
                member.block,
                &member.free.names,
                representative.block,
                &representative.free.names,
            ) {
                return Err(format!(
                    "class {} member {} is not equal to its representative: {} vs {}",
                    i, m, member.block, representative.block
                ));
            }
            if classes.class_of(member.block) != Some(class.id()) {
                return Err(format!(
                    "class {} member {} maps to {:?} in the reverse lookup",
                    i,
                    m,
                    classes.class_of(member.block)
                ));
            }
        }
    }
    Ok(())
}

/// Verifies that every block of `root` belongs to exactly one class.
pub fn verify_all_blocks_classified(
    root: &Block,
    classes: &BlockClasses<'_>,
) -> Result<(), String> {
    let blocks = collect_blocks(root);
    for (i, block) in blocks.iter().enumerate() {
        if classes.class_of(block).is_none() {
            return Err(format!("block {} in pre-order is not classified: {}", i, block));
        }
    }
    let member_count: usize = classes.classes().iter().map(|c| c.len()).sum();
    if member_count != blocks.len() {
        return Err(format!(
            "{} class members recorded for {} blocks",
            member_count,
            blocks.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_class_finder::{find_block_classes, BlockClassFinderOptions};
    use crate::parser::parse_block;
    use crate::syntactic_equality::SyntacticEquality;

    /// Rejects every pair, standing in for an oracle that disagrees with the
    /// one the classes were built with.
    struct NeverEqual;

    impl EqualityOracle for NeverEqual {
        fn equal(&self, _: &Block, _: &[String], _: &Block, _: &[String]) -> bool {
            false
        }
    }

    #[test]
    fn test_sound_result_verifies() {
        let root = parse_block(
            "{ { x := add(a, 1) } { y := add(b, 1) } { x := sub(a, 1) } if c { pop(c) } }",
        )
        .unwrap();
        let classes = find_block_classes(
            &root,
            &SyntacticEquality,
            &BlockClassFinderOptions::default(),
        )
        .unwrap();
        verify_block_classes(&classes, &SyntacticEquality).unwrap();
        verify_all_blocks_classified(&root, &classes).unwrap();
    }

    #[test]
    fn test_verification_flags_disagreeing_oracle() {
        let root = parse_block("{ { pop(1) } { pop(1) } }").unwrap();
        let classes = find_block_classes(
            &root,
            &SyntacticEquality,
            &BlockClassFinderOptions::default(),
        )
        .unwrap();
        let err = verify_block_classes(&classes, &NeverEqual).unwrap_err();
        assert!(err.contains("not equal to its representative"), "{}", err);
    }

    #[test]
    fn test_unrelated_tree_is_not_classified() {
        let root = parse_block("{ { } }").unwrap();
        let other = parse_block("{ { } }").unwrap();
        let classes = find_block_classes(
            &root,
            &SyntacticEquality,
            &BlockClassFinderOptions::default(),
        )
        .unwrap();
        assert!(verify_all_blocks_classified(&other, &classes).is_err());
    }
}
