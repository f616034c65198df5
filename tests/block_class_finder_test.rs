// SPDX-License-Identifier: Apache-2.0

use std::cell::Cell;

use pretty_assertions::assert_eq;
use test_case::test_case;
use yul_blockclass::ast::Block;
use yul_blockclass::ast_walker::collect_blocks;
use yul_blockclass::block_class_finder::{
    find_block_classes, fingerprint_block, run, BlockClassFinderOptions,
};
use yul_blockclass::block_class_verify::{verify_all_blocks_classified, verify_block_classes};
use yul_blockclass::equivalence_index::BlockClasses;
use yul_blockclass::parser::parse_block;
use yul_blockclass::syntactic_equality::{EqualityOracle, SyntacticEquality};
use yul_blockclass::BlockClassError;

/// Renders classes as lists of pre-order block positions, in class order.
fn partition(root: &Block, classes: &BlockClasses<'_>) -> Vec<Vec<usize>> {
    let blocks = collect_blocks(root);
    let position = |b: &Block| {
        blocks
            .iter()
            .position(|candidate| std::ptr::eq(*candidate, b))
            .expect("class member should be a block of the tree")
    };
    classes
        .classes()
        .iter()
        .map(|class| {
            class
                .members()
                .iter()
                .map(|member| position(member.block))
                .collect()
        })
        .collect()
}

fn classify(root: &Block) -> BlockClasses<'_> {
    find_block_classes(
        root,
        &SyntacticEquality,
        &BlockClassFinderOptions {
            verify_classes: true,
        },
    )
    .unwrap()
}

#[test_case("{ }", vec![vec![0]]; "lone root")]
#[test_case("{ { x := add(a, 1) } { y := add(b, 1) } }", vec![vec![1, 2], vec![0]]; "renamed free names")]
#[test_case("{ { x := add(a, 1) } { x := sub(a, 1) } }", vec![vec![1], vec![2], vec![0]]; "different builtins")]
#[test_case("{ { let t := 1 pop(t) } { let u := 1 pop(u) } }", vec![vec![1, 2], vec![0]]; "renamed locals")]
#[test_case("{ { let t := 1 pop(t) } { let u := 1 pop(t) } }", vec![vec![1], vec![2], vec![0]]; "local versus free")]
#[test_case("{ { pop(add(a, b)) } { pop(add(b, a)) } { pop(add(a, a)) } }", vec![vec![1, 2], vec![3], vec![0]]; "free name positions")]
#[test_case("{ if c { pop(1) } if d { pop(1) } }", vec![vec![1, 2], vec![0]]; "if bodies")]
#[test_case("{ switch x case 0 { pop(1) } case 1 { pop(1) } default { pop(2) } }", vec![vec![1, 2], vec![3], vec![0]]; "switch cases")]
#[test_case("{ function f(p) -> r { r := p } function g(q) -> s { s := q } }", vec![vec![1, 2], vec![0]]; "function bodies")]
#[test_case("{ for { let i := 0 } lt(i, 10) { i := add(i, 1) } { pop(i) } }", vec![vec![1], vec![2], vec![3], vec![0]]; "for loop blocks")]
#[test_case("{ for { } 1 { } { break } for { } 1 { } { continue } }", vec![vec![1, 2, 4, 5], vec![3], vec![6], vec![0]]; "break versus continue")]
#[test_case("{ { { } } { { } } }", vec![vec![2, 4], vec![1, 3], vec![0]]; "nested empties")]
fn test_block_partition(source: &str, want: Vec<Vec<usize>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let root = parse_block(source).unwrap();
    let classes = classify(&root);
    assert_eq!(partition(&root, &classes), want);
}

#[test]
fn test_analysis_is_deterministic() {
    let source = "{
        let v := 0
        { v := add(v, 1) }
        { w := add(w, 1) }
        if lt(v, 3) { { pop(v) } }
        function h(a) -> b { b := mul(a, 2) }
        { pop(w) }
    }";
    let root = parse_block(source).unwrap();
    let first = partition(&root, &classify(&root));
    let second = partition(&root, &classify(&root));
    assert_eq!(first, second);

    let reparsed = parse_block(source).unwrap();
    assert_eq!(first, partition(&reparsed, &classify(&reparsed)));
}

#[test]
fn test_every_block_is_its_own_equal() {
    let root = parse_block(
        "{ let x := 1 for { let i := 0 } lt(i, x) { i := add(i, 1) } { if eq(i, 2) { break } } }",
    )
    .unwrap();
    for block in collect_blocks(&root) {
        let (lhs_fp, lhs_free) = fingerprint_block(block).unwrap();
        let (rhs_fp, rhs_free) = fingerprint_block(block).unwrap();
        assert_eq!(lhs_fp, rhs_fp);
        assert!(SyntacticEquality.equal(block, &lhs_free.names, block, &rhs_free.names));
    }
}

#[test]
fn test_outer_local_is_free_inside_nested_block() {
    let root = parse_block("{ let v := 1 { pop(v) } { pop(w) } }").unwrap();
    let classes = classify(&root);
    // `v` is local to the root but free to the first nested block, so both
    // nested blocks share a class.
    assert_eq!(partition(&root, &classes), vec![vec![1, 2], vec![0]]);
    let root_member = classes.classes()[1].representative();
    assert_eq!(root_member.free.names, vec!["w".to_string()]);
    assert!(root_member.free.written.is_empty());
}

#[test]
fn test_run_returns_class_array() {
    let root = parse_block("{ { pop(1) } { pop(1) } }").unwrap();
    let classes = run(&root).unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].len(), 2);
    assert_eq!(classes[0].id().index(), 0);
    assert!(std::ptr::eq(classes[1].representative().block, &root));
}

#[test]
fn test_verifiers_accept_real_result() {
    let root = parse_block(
        "{ { a := calldataload(0) } { b := calldataload(0) } switch a case 0 { } default { } }",
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
fn test_malformed_tree_yields_no_result() {
    let root = parse_block("{ { let x := 1 } let y := 2 let y := 3 }").unwrap();
    let err = find_block_classes(
        &root,
        &SyntacticEquality,
        &BlockClassFinderOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "identifier 'y' declared in a scope that already maps it to local#0"
    );
    assert!(matches!(err, BlockClassError::DuplicateLocalDeclaration { .. }));
}

/// Delegates to the syntactic oracle and counts how often it is asked.
struct CountingOracle {
    calls: Cell<usize>,
}

impl EqualityOracle for CountingOracle {
    fn equal(&self, lhs: &Block, lhs_free: &[String], rhs: &Block, rhs_free: &[String]) -> bool {
        self.calls.set(self.calls.get() + 1);
        SyntacticEquality.equal(lhs, lhs_free, rhs, rhs_free)
    }
}

#[test]
fn test_oracle_only_consulted_within_fingerprint_bucket() {
    let root = parse_block("{ { pop(1) } { pop(2) } { pop(1) } }").unwrap();
    let oracle = CountingOracle {
        calls: Cell::new(0),
    };
    let classes =
        find_block_classes(&root, &oracle, &BlockClassFinderOptions::default()).unwrap();
    assert_eq!(partition(&root, &classes), vec![vec![1, 3], vec![2], vec![0]]);
    assert_eq!(oracle.calls.get(), 1);
}

/// Rejects every pair, so grouping can only come from the oracle.
struct NeverEqual;

impl EqualityOracle for NeverEqual {
    fn equal(&self, _: &Block, _: &[String], _: &Block, _: &[String]) -> bool {
        false
    }
}

#[test]
fn test_equal_fingerprints_alone_never_merge() {
    let root = parse_block("{ { pop(1) } { pop(1) } }").unwrap();
    let classes =
        find_block_classes(&root, &NeverEqual, &BlockClassFinderOptions::default()).unwrap();
    assert_eq!(partition(&root, &classes), vec![vec![1], vec![2], vec![0]]);
}
