// SPDX-License-Identifier: Apache-2.0

//! Incrementally built index of block equivalence classes.
//!
//! Blocks are bucketed by fingerprint; inside a bucket the equality oracle
//! decides membership, so fingerprint collisions never merge distinct
//! blocks.

use std::collections::{BTreeSet, HashMap};

use crate::ast::Block;
use crate::error::BlockClassError;
use crate::fingerprint::Fingerprint;
use crate::syntactic_equality::EqualityOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free names referenced by one block instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeReferences {
    /// First-occurrence order; this is the renaming key.
    pub names: Vec<String>,
    /// Free names appearing as assignment targets.
    pub written: BTreeSet<String>,
    /// Free names appearing as reads.
    pub read: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct BlockClassMember<'a> {
    pub block: &'a Block,
    pub free: FreeReferences,
}

#[derive(Debug, Clone)]
pub struct BlockClass<'a> {
    id: ClassId,
    members: Vec<BlockClassMember<'a>>,
}

impl<'a> BlockClass<'a> {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn members(&self) -> &[BlockClassMember<'a>] {
        &self.members
    }

    /// The member that founded the class; candidates are compared against it.
    pub fn representative(&self) -> &BlockClassMember<'a> {
        &self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub struct EquivalenceIndex<'a> {
    fingerprint_to_classes: HashMap<Fingerprint, Vec<ClassId>>,
    classes: Vec<BlockClass<'a>>,
    /// Keyed by block address; the blocks outlive the index.
    block_to_class: HashMap<*const Block, ClassId>,
}

impl<'a> EquivalenceIndex<'a> {
    pub fn new() -> Self {
        Self {
            fingerprint_to_classes: HashMap::new(),
            classes: Vec::new(),
            block_to_class: HashMap::new(),
        }
    }

    pub fn class(&self, class_id: ClassId) -> Result<&BlockClass<'a>, BlockClassError> {
        self.classes
            .get(class_id.0)
            .ok_or(BlockClassError::MalformedCandidateLookup {
                class_id: class_id.0,
                class_count: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[BlockClass<'a>] {
        &self.classes
    }

    /// Class ids that hold at least one block with `fingerprint`, in
    /// discovery order.
    pub fn candidates(&self, fingerprint: Fingerprint) -> &[ClassId] {
        self.fingerprint_to_classes
            .get(&fingerprint)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn class_of(&self, block: &Block) -> Option<ClassId> {
        self.block_to_class.get(&(block as *const Block)).copied()
    }

    /// Places `block` into the first candidate class whose representative the
    /// oracle accepts, or founds a new class.
    pub fn register(
        &mut self,
        block: &'a Block,
        fingerprint: Fingerprint,
        free: FreeReferences,
        oracle: &dyn EqualityOracle,
    ) -> Result<ClassId, BlockClassError> {
        let bucket = self.fingerprint_to_classes.entry(fingerprint).or_default();
        let class_count = self.classes.len();

        let mut matched: Option<ClassId> = None;
        for &candidate_id in bucket.iter() {
            let candidate = self.classes.get(candidate_id.0).ok_or(
                BlockClassError::MalformedCandidateLookup {
                    class_id: candidate_id.0,
                    class_count,
                },
            )?;
            let representative = candidate.representative();
            if representative.free.names.len() != free.names.len() {
                continue;
            }
            if oracle.equal(
                block,
                &free.names,
                representative.block,
                &representative.free.names,
            ) {
                matched = Some(candidate_id);
                break;
            }
            log::debug!(
                "EquivalenceIndex::register; fingerprint {} collides with class {} but blocks differ",
                fingerprint,
                candidate_id
            );
        }

        let class_id = match matched {
            Some(class_id) => {
                self.classes[class_id.0]
                    .members
                    .push(BlockClassMember { block, free });
                class_id
            }
            None => {
                let class_id = ClassId(class_count);
                bucket.push(class_id);
                self.classes.push(BlockClass {
                    id: class_id,
                    members: vec![BlockClassMember { block, free }],
                });
                class_id
            }
        };
        log::trace!(
            "EquivalenceIndex::register; fingerprint: {}; class: {}",
            fingerprint,
            class_id
        );
        self.block_to_class.insert(block as *const Block, class_id);
        Ok(class_id)
    }

    pub fn into_block_classes(self) -> BlockClasses<'a> {
        BlockClasses {
            classes: self.classes,
            block_to_class: self.block_to_class,
        }
    }
}

impl<'a> Default for EquivalenceIndex<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Finished analysis result: the class array plus the block -> class lookup.
#[derive(Debug, Clone)]
pub struct BlockClasses<'a> {
    classes: Vec<BlockClass<'a>>,
    block_to_class: HashMap<*const Block, ClassId>,
}

impl<'a> BlockClasses<'a> {
    pub fn classes(&self) -> &[BlockClass<'a>] {
        &self.classes
    }

    pub fn into_classes(self) -> Vec<BlockClass<'a>> {
        self.classes
    }

    pub fn class_of(&self, block: &Block) -> Option<ClassId> {
        self.block_to_class.get(&(block as *const Block)).copied()
    }

    pub fn get(&self, class_id: ClassId) -> Option<&BlockClass<'a>> {
        self.classes.get(class_id.0)
    }

    /// Classes with more than one member, i.e. the blocks worth merging.
    pub fn duplicate_classes(&self) -> impl Iterator<Item = &BlockClass<'a>> {
        self.classes.iter().filter(|c| c.len() > 1)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
