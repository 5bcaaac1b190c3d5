//! Keyset pagination over tag-object associations
//!
//! Pages are addressed by the last object id seen, never by offset, so ids
//! inserted or removed between pages cannot cause skips or duplicates.

use crate::model::ObjectId;

/// Position after which the next page starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor(Option<ObjectId>);

impl Cursor {
    /// Cursor before the first id
    pub fn start() -> Self {
        Self(None)
    }

    /// Last id already returned, if any
    pub fn after(&self) -> Option<ObjectId> {
        self.0
    }
}

/// One page of object ids returned by the mapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    ids: Vec<ObjectId>,
    requested: usize,
}

impl Page {
    pub fn new(ids: Vec<ObjectId>, requested: usize) -> Self {
        Self { ids, requested }
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A short (or empty) page is the last one
    pub fn is_final(&self) -> bool {
        self.ids.len() < self.requested
    }

    /// Cursor for the following page, `None` once this page is final
    pub fn next_cursor(&self) -> Option<Cursor> {
        if self.is_final() {
            return None;
        }
        self.ids.last().map(|id| Cursor(Some(*id)))
    }
}
