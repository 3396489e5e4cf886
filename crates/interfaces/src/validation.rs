use crate::ConsensusError;
use kestrel_primitives::SealedHeader;

/// A stateless header validity rule: difficulty format, proof of work,
/// field bounds. Swappable per network.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait HeaderValidationRule: Send + Sync {
    /// Validates the header on its own.
    fn validate(&self, header: &SealedHeader) -> Result<(), ConsensusError>;
}

/// A parent-dependent header validity rule, e.g. difficulty-adjustment
/// consistency. Swappable per network.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait DependentHeaderRule: Send + Sync {
    /// Validates the header in relation to its parent.
    ///
    /// Parent linkage (hash and number) is checked by the caller before this
    /// rule runs; implementations may assume `parent` is the declared parent.
    fn validate(&self, header: &SealedHeader, parent: &SealedHeader)
        -> Result<(), ConsensusError>;
}
