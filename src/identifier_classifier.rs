// SPDX-License-Identifier: Apache-2.0

//! Per-scope numbering of identifiers into local and free identities.

use std::collections::HashMap;

use crate::error::BlockClassError;

/// Scope-relative identity of a name. Locals and free names are numbered
/// independently, each in order of first encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    Local(usize),
    Free(usize),
}

impl Identity {
    pub fn is_free(&self) -> bool {
        matches!(self, Identity::Free(_))
    }

    /// Tag and sequence number, as folded into fingerprints.
    pub fn to_parts(&self) -> (u64, u64) {
        match self {
            Identity::Local(seq) => (0, *seq as u64),
            Identity::Free(seq) => (1, *seq as u64),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Local(seq) => write!(f, "local#{}", seq),
            Identity::Free(seq) => write!(f, "free#{}", seq),
        }
    }
}

pub struct IdentifierClassifier {
    name_to_identity: HashMap<String, Identity>,
    local_count: usize,
    /// Free names in first-occurrence order; position `i` holds `Free(i)`.
    free_names: Vec<String>,
}

impl IdentifierClassifier {
    pub fn new() -> Self {
        Self {
            name_to_identity: HashMap::new(),
            local_count: 0,
            free_names: Vec::new(),
        }
    }

    /// Returns the identity of `name`, assigning a fresh one on first
    /// encounter: `Local` for declarations, `Free` otherwise.
    ///
    /// Names must be unique across the whole tree: a name that already
    /// reached this scope as free from a nested block cannot be declared
    /// here afterwards.
    pub fn classify(
        &mut self,
        name: &str,
        as_declaration: bool,
    ) -> Result<Identity, BlockClassError> {
        if let Some(previous) = self.name_to_identity.get(name) {
            if as_declaration {
                return Err(BlockClassError::DuplicateLocalDeclaration {
                    name: name.to_string(),
                    previous: *previous,
                });
            }
            return Ok(*previous);
        }
        let identity = if as_declaration {
            let id = Identity::Local(self.local_count);
            self.local_count += 1;
            id
        } else {
            let id = Identity::Free(self.free_names.len());
            self.free_names.push(name.to_string());
            id
        };
        log::trace!("classify; name: {}; identity: {}", name, identity);
        self.name_to_identity.insert(name.to_string(), identity);
        Ok(identity)
    }

    pub fn lookup(&self, name: &str) -> Result<Identity, BlockClassError> {
        self.name_to_identity
            .get(name)
            .copied()
            .ok_or_else(|| BlockClassError::UnknownIdentifierLookup {
                name: name.to_string(),
            })
    }

    pub fn is_free(&self, name: &str) -> Result<bool, BlockClassError> {
        Ok(self.lookup(name)?.is_free())
    }

    pub fn free_names(&self) -> &[String] {
        &self.free_names
    }

    pub fn into_free_names(self) -> Vec<String> {
        self.free_names
    }
}

impl Default for IdentifierClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_names_in_first_occurrence_order() {
        let mut c = IdentifierClassifier::new();
        assert_eq!(c.classify("b", false).unwrap(), Identity::Free(0));
        assert_eq!(c.classify("a", false).unwrap(), Identity::Free(1));
        assert_eq!(c.classify("b", false).unwrap(), Identity::Free(0));
        assert_eq!(c.free_names(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_locals_and_frees_numbered_independently() {
        let mut c = IdentifierClassifier::new();
        assert_eq!(c.classify("x", true).unwrap(), Identity::Local(0));
        assert_eq!(c.classify("a", false).unwrap(), Identity::Free(0));
        assert_eq!(c.classify("y", true).unwrap(), Identity::Local(1));
        assert_eq!(c.classify("x", false).unwrap(), Identity::Local(0));
        assert!(c.free_names().len() == 1);
        assert!(!c.is_free("x").unwrap());
        assert!(c.is_free("a").unwrap());
    }

    #[test]
    fn test_redeclaration_is_rejected() {
        let mut c = IdentifierClassifier::new();
        c.classify("x", true).unwrap();
        let err = c.classify("x", true).unwrap_err();
        assert_eq!(
            err,
            BlockClassError::DuplicateLocalDeclaration {
                name: "x".to_string(),
                previous: Identity::Local(0),
            }
        );
    }

    #[test]
    fn test_declaring_a_known_free_name_is_rejected() {
        let mut c = IdentifierClassifier::new();
        c.classify("x", false).unwrap();
        assert!(matches!(
            c.classify("x", true),
            Err(BlockClassError::DuplicateLocalDeclaration { .. })
        ));
    }

    #[test]
    fn test_lookup_of_unknown_name() {
        let c = IdentifierClassifier::new();
        assert_eq!(
            c.lookup("nope"),
            Err(BlockClassError::UnknownIdentifierLookup {
                name: "nope".to_string()
            })
        );
    }
}
