// SPDX-License-Identifier: Apache-2.0

//! Partitions all blocks of a tree into classes of blocks that are
//! syntactically identical up to a consistent positional renaming of the
//! free identifiers they reference.
//!
//! Each block is visited by its own `BlockClassFinder`, which folds the block
//! into a fingerprint and records the free names it references. Once a nested
//! block is finished its fingerprint is folded into the enclosing finder, its
//! free names are re-classified in the enclosing scope, and the block is
//! registered with the shared `EquivalenceIndex`.
//!
//! Declared names become local *before* their initializer is visited, so in
//! `let x := x` the initializer reads the new local rather than an outer `x`.
//!
//! The input must use unique names throughout (as produced by a
//! disambiguation pass); re-declaring a name that a nested block already
//! exposed as free aborts with `DuplicateLocalDeclaration`.

use std::collections::BTreeSet;

use crate::ast::{
    builtin_to_name, Assignment, Block, BuiltinCall, ExpressionStatement, ForLoop, FunctionCall,
    FunctionDefinition, Identifier, If, Literal, Switch, VariableDeclaration,
};
use crate::ast_walker::{self, AstVisitor};
use crate::block_class_verify::{verify_all_blocks_classified, verify_block_classes};
use crate::equivalence_index::{BlockClass, BlockClasses, ClassId, EquivalenceIndex, FreeReferences};
use crate::error::BlockClassError;
use crate::fingerprint::{Fingerprint, FingerprintHasher, NodeTag};
use crate::identifier_classifier::{IdentifierClassifier, Identity};
use crate::syntactic_equality::{EqualityOracle, SyntacticEquality};

#[derive(Debug, Clone, Default)]
pub struct BlockClassFinderOptions {
    /// Re-check every class against the oracle once the analysis is done.
    pub verify_classes: bool,
}

/// Fingerprints one lexical block; nested blocks get their own finder.
pub struct BlockClassFinder<'a, 'i> {
    index: &'i mut EquivalenceIndex<'a>,
    oracle: &'i dyn EqualityOracle,
    classifier: IdentifierClassifier,
    hasher: FingerprintHasher,
    written: BTreeSet<String>,
    read: BTreeSet<String>,
}

impl<'a, 'i> BlockClassFinder<'a, 'i> {
    pub fn new(index: &'i mut EquivalenceIndex<'a>, oracle: &'i dyn EqualityOracle) -> Self {
        Self {
            index,
            oracle,
            classifier: IdentifierClassifier::new(),
            hasher: FingerprintHasher::new(),
            written: BTreeSet::new(),
            read: BTreeSet::new(),
        }
    }

    /// Fingerprint and free references of everything visited so far.
    pub fn finish(self) -> (Fingerprint, FreeReferences) {
        let fingerprint = self.hasher.finish();
        let free = FreeReferences {
            names: self.classifier.into_free_names(),
            written: self.written,
            read: self.read,
        };
        (fingerprint, free)
    }

    fn fold_identifier(&mut self, name: &str) -> Result<Identity, BlockClassError> {
        let identity = self.classifier.classify(name, false)?;
        self.hasher.fold_tag(NodeTag::Identifier);
        self.hasher.fold_identity(identity);
        Ok(identity)
    }

    fn visit_identifier_use(
        &mut self,
        name: &str,
        is_assignment_target: bool,
    ) -> Result<(), BlockClassError> {
        let identity = self.fold_identifier(name)?;
        if identity.is_free() {
            if is_assignment_target {
                self.written.insert(name.to_string());
            } else {
                self.read.insert(name.to_string());
            }
        }
        Ok(())
    }

    /// Runs a child finder over `block`, folds the result into this finder
    /// and registers `block` with the index.
    fn visit_nested_block(&mut self, block: &'a Block) -> Result<ClassId, BlockClassError> {
        self.hasher.fold_tag(NodeTag::Block);
        let oracle = self.oracle;
        let (fingerprint, free) = {
            let mut child = BlockClassFinder::new(&mut *self.index, oracle);
            for statement in block.statements.iter() {
                child.visit_statement(statement)?;
            }
            child.finish()
        };
        self.hasher.fold_fingerprint(fingerprint);

        // Every name still free here counts as read: a write inside the child
        // may not execute, so the incoming value can flow through it.
        for name in free.names.iter() {
            if self.fold_identifier(name)?.is_free() {
                self.read.insert(name.clone());
            }
        }
        for name in free.written.iter() {
            if self.classifier.is_free(name)? {
                self.written.insert(name.clone());
            }
        }

        log::trace!(
            "visit_nested_block; fingerprint: {}; free: {:?}",
            fingerprint,
            free.names
        );
        self.index.register(block, fingerprint, free, oracle)
    }
}

impl<'a, 'i> AstVisitor<'a> for BlockClassFinder<'a, 'i> {
    type Error = BlockClassError;

    fn visit_literal(&mut self, literal: &'a Literal) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::Literal);
        self.hasher.fold_str(&literal.value);
        self.hasher.fold_optional_str(literal.ty.as_deref());
        self.hasher.fold_u64(literal.kind.discriminant());
        Ok(())
    }

    fn visit_identifier(&mut self, identifier: &'a Identifier) -> Result<(), BlockClassError> {
        self.visit_identifier_use(&identifier.name, false)
    }

    fn visit_builtin_call(&mut self, call: &'a BuiltinCall) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::BuiltinCall);
        self.hasher.fold_str(builtin_to_name(call.builtin));
        self.hasher.fold_usize(call.arguments.len());
        ast_walker::walk_arguments(self, &call.arguments)
    }

    fn visit_function_call(&mut self, call: &'a FunctionCall) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::FunctionCall);
        self.hasher.fold_str(&call.function_name);
        self.hasher.fold_usize(call.arguments.len());
        ast_walker::walk_arguments(self, &call.arguments)
    }

    fn visit_expression_statement(
        &mut self,
        statement: &'a ExpressionStatement,
    ) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::ExpressionStatement);
        self.visit_expression(&statement.expression)
    }

    fn visit_assignment(&mut self, assignment: &'a Assignment) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::Assignment);
        self.hasher.fold_usize(assignment.variable_names.len());
        for target in assignment.variable_names.iter() {
            self.visit_identifier_use(&target.name, true)?;
        }
        self.visit_expression(&assignment.value)
    }

    fn visit_variable_declaration(
        &mut self,
        declaration: &'a VariableDeclaration,
    ) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::VariableDeclaration);
        self.hasher.fold_usize(declaration.variables.len());
        for variable in declaration.variables.iter() {
            self.classifier.classify(&variable.name, true)?;
        }
        ast_walker::walk_variable_declaration(self, declaration)
    }

    fn visit_if(&mut self, if_: &'a If) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::If);
        self.visit_expression(&if_.condition)?;
        self.visit_block(&if_.body)
    }

    fn visit_switch(&mut self, switch: &'a Switch) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::Switch);
        self.hasher.fold_usize(switch.cases.len());
        ast_walker::walk_switch(self, switch)
    }

    fn visit_for_loop(&mut self, for_loop: &'a ForLoop) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::ForLoop);
        ast_walker::walk_for_loop(self, for_loop)
    }

    fn visit_break(&mut self) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::Break);
        Ok(())
    }

    fn visit_continue(&mut self) -> Result<(), BlockClassError> {
        self.hasher.fold_tag(NodeTag::Continue);
        Ok(())
    }

    fn visit_function_definition(
        &mut self,
        definition: &'a FunctionDefinition,
    ) -> Result<(), BlockClassError> {
        // Parameters and return variables are not declared here; inside the
        // body they are free names like any other.
        self.hasher.fold_tag(NodeTag::FunctionDefinition);
        self.visit_block(&definition.body)
    }

    fn visit_block(&mut self, block: &'a Block) -> Result<(), BlockClassError> {
        self.visit_nested_block(block).map(|_| ())
    }
}

/// Classifies every block of `root` with the default oracle and returns the
/// class array.
pub fn run(root: &Block) -> Result<Vec<BlockClass<'_>>, BlockClassError> {
    let classes = find_block_classes(root, &SyntacticEquality, &BlockClassFinderOptions::default())?;
    Ok(classes.into_classes())
}

/// Classifies every block of `root`, the root included.
pub fn find_block_classes<'a>(
    root: &'a Block,
    oracle: &dyn EqualityOracle,
    options: &BlockClassFinderOptions,
) -> Result<BlockClasses<'a>, BlockClassError> {
    let mut index = EquivalenceIndex::new();
    {
        // The top-level finder only drives the root; its own fingerprint and
        // free references are dropped.
        let mut finder = BlockClassFinder::new(&mut index, oracle);
        finder.visit_block(root)?;
    }
    let classes = index.into_block_classes();
    log::debug!(
        "find_block_classes; classes: {}; duplicate classes: {}",
        classes.len(),
        classes.duplicate_classes().count()
    );

    if options.verify_classes {
        verify_block_classes(&classes, oracle)
            .and_then(|()| verify_all_blocks_classified(root, &classes))
            .map_err(|message| BlockClassError::ClassIntegrityViolation { message })?;
    }
    Ok(classes)
}

/// Fingerprint and free references of `block` as seen from an empty
/// enclosing scope.
pub fn fingerprint_block(block: &Block) -> Result<(Fingerprint, FreeReferences), BlockClassError> {
    let mut index = EquivalenceIndex::new();
    let mut finder = BlockClassFinder::new(&mut index, &SyntacticEquality);
    for statement in block.statements.iter() {
        finder.visit_statement(statement)?;
    }
    Ok(finder.finish())
}
