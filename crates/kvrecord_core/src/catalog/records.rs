//! Lazy enumeration of catalogued records.

use crate::record::Record;
use crate::registry::Registry;
use crate::types::{ModelId, TypeName};
use std::iter::FusedIterator;
use std::sync::Arc;
use std::vec;

/// Iterator over the records of a type, produced by [`Registry::all_of`].
///
/// Records are materialized one at a time and carry only their id;
/// property values load on first access.
pub struct Records {
    registry: Arc<Registry>,
    model: TypeName,
    ids: vec::IntoIter<ModelId>,
}

impl Records {
    pub(crate) fn new(registry: Arc<Registry>, model: TypeName, ids: Vec<ModelId>) -> Self {
        Self {
            registry,
            model,
            ids: ids.into_iter(),
        }
    }

    /// Returns the remaining identifiers without materializing records.
    pub fn ids(&self) -> &[ModelId] {
        self.ids.as_slice()
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        Some(Record::hydrate(
            Arc::clone(&self.registry),
            self.model.clone(),
            id,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Records {}

impl FusedIterator for Records {}

impl std::fmt::Debug for Records {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Records")
            .field("model", &self.model)
            .field("remaining", &self.ids.as_slice())
            .finish()
    }
}
