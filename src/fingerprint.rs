// SPDX-License-Identifier: Apache-2.0

//! Order-sensitive structural fingerprints for blocks.

use crate::identifier_classifier::Identity;

/// Finished fingerprint of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Running accumulator; every fold is order sensitive.
pub struct FingerprintHasher {
    hasher: blake3::Hasher,
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn fold_u64(&mut self, x: u64) {
        self.hasher.update(&x.to_le_bytes());
    }

    pub fn fold_usize(&mut self, x: usize) {
        self.fold_u64(x as u64);
    }

    /// Strings are length-prefixed so adjacent folds cannot alias.
    pub fn fold_str(&mut self, s: &str) {
        self.fold_usize(s.len());
        self.hasher.update(s.as_bytes());
    }

    pub fn fold_tag(&mut self, tag: NodeTag) {
        self.fold_str(tag.as_str());
    }

    pub fn fold_identity(&mut self, identity: Identity) {
        let (kind, seq) = identity.to_parts();
        self.fold_u64(kind);
        self.fold_u64(seq);
    }

    pub fn fold_optional_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.fold_u64(1);
                self.fold_str(s);
            }
            None => self.fold_u64(0),
        }
    }

    pub fn fold_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.fold_u64(fingerprint.0);
    }

    pub fn finish(&self) -> Fingerprint {
        let hash = self.hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        Fingerprint(u64::from_le_bytes(prefix))
    }
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Node-kind tags folded ahead of each node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    Literal,
    Identifier,
    BuiltinCall,
    FunctionCall,
    ExpressionStatement,
    Assignment,
    VariableDeclaration,
    If,
    Switch,
    ForLoop,
    Break,
    Continue,
    FunctionDefinition,
    Block,
}

impl NodeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeTag::Literal => "literal",
            NodeTag::Identifier => "identifier",
            NodeTag::BuiltinCall => "builtin_call",
            NodeTag::FunctionCall => "function_call",
            NodeTag::ExpressionStatement => "expression_statement",
            NodeTag::Assignment => "assignment",
            NodeTag::VariableDeclaration => "variable_declaration",
            NodeTag::If => "if",
            NodeTag::Switch => "switch",
            NodeTag::ForLoop => "for_loop",
            NodeTag::Break => "break",
            NodeTag::Continue => "continue",
            NodeTag::FunctionDefinition => "function_definition",
            NodeTag::Block => "block",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_hashers_agree() {
        let mut a = FingerprintHasher::new();
        let mut b = FingerprintHasher::new();
        a.fold_tag(NodeTag::Break);
        b.fold_tag(NodeTag::Break);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_fold_order_matters() {
        let mut a = FingerprintHasher::new();
        a.fold_u64(1);
        a.fold_u64(2);
        let mut b = FingerprintHasher::new();
        b.fold_u64(2);
        b.fold_u64(1);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_break_and_continue_tags_differ() {
        let mut a = FingerprintHasher::new();
        a.fold_tag(NodeTag::Break);
        let mut b = FingerprintHasher::new();
        b.fold_tag(NodeTag::Continue);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_string_folds_do_not_alias() {
        let mut a = FingerprintHasher::new();
        a.fold_str("ab");
        a.fold_str("c");
        let mut b = FingerprintHasher::new();
        b.fold_str("a");
        b.fold_str("bc");
        assert_ne!(a.finish(), b.finish());
    }
}
