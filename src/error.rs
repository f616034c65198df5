// SPDX-License-Identifier: Apache-2.0

use crate::identifier_classifier::Identity;

/// Invariant violations detected while classifying blocks.
///
/// These all indicate a malformed input tree (or a bug in a caller that built
/// one); the analysis stops at the first one and yields no partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockClassError {
    /// An identity was requested for a name that was never classified in the
    /// queried scope.
    UnknownIdentifierLookup { name: String },
    /// A name was declared in a scope that already knows it.
    DuplicateLocalDeclaration { name: String, previous: Identity },
    /// A fingerprint bucket referred to a class that does not exist.
    MalformedCandidateLookup { class_id: usize, class_count: usize },
    /// Post-run verification found a class whose members disagree.
    ClassIntegrityViolation { message: String },
}

impl std::fmt::Display for BlockClassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockClassError::UnknownIdentifierLookup { name } => {
                write!(f, "identifier '{}' was never classified in this scope", name)
            }
            BlockClassError::DuplicateLocalDeclaration { name, previous } => write!(
                f,
                "identifier '{}' declared in a scope that already maps it to {}",
                name, previous
            ),
            BlockClassError::MalformedCandidateLookup {
                class_id,
                class_count,
            } => write!(
                f,
                "candidate class id {} out of bounds; {} classes exist",
                class_id, class_count
            ),
            BlockClassError::ClassIntegrityViolation { message } => {
                write!(f, "block class integrity violation: {}", message)
            }
        }
    }
}

impl std::error::Error for BlockClassError {}
