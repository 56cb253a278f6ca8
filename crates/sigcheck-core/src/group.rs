//! Partitioning of a type's callable members by canonical signature.

use indexmap::IndexMap;

use crate::model::{MemberDeclaration, TypeDeclaration};
use crate::normalize::{CanonicalSignature, NormalizeError, SignatureNormalizer};

/// Two or more members of one type that share a [`CanonicalSignature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGroup<'a> {
    pub owner: &'a TypeDeclaration,
    pub signature: CanonicalSignature,
    /// Members in declaration order.
    pub members: Vec<&'a MemberDeclaration>,
}

impl ConflictGroup<'_> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictGrouper {
    normalizer: SignatureNormalizer,
}

impl ConflictGrouper {
    pub fn new(normalizer: SignatureNormalizer) -> Self {
        Self { normalizer }
    }

    /// Bucket every method and constructor of `ty` by signature.
    ///
    /// Buckets are ordered by their first member and keep declaration order inside.
    /// Fields are skipped.
    pub fn buckets<'a>(
        &self,
        ty: &'a TypeDeclaration,
    ) -> Result<IndexMap<CanonicalSignature, Vec<&'a MemberDeclaration>>, NormalizeError> {
        let mut buckets: IndexMap<CanonicalSignature, Vec<&'a MemberDeclaration>> =
            IndexMap::new();
        for member in ty.members().iter().filter(|m| m.kind().is_callable()) {
            let signature = self.normalizer.normalize(member)?;
            buckets.entry(signature).or_default().push(member);
        }
        Ok(buckets)
    }

    /// The buckets of `ty` holding at least two members.
    pub fn group<'a>(
        &self,
        ty: &'a TypeDeclaration,
    ) -> Result<Vec<ConflictGroup<'a>>, NormalizeError> {
        let groups = self
            .buckets(ty)?
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(signature, members)| ConflictGroup {
                owner: ty,
                signature,
                members,
            })
            .collect();
        Ok(groups)
    }
}
