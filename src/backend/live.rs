use std::collections::HashMap;

use super::queries::{Query, QueryResult};
use crate::error::Result;
use crate::storage::ChatDatabase;

struct LiveEntry {
    subscribers: usize,
    last: QueryResult,
}

/// Subscribed queries and the last result delivered for each.
///
/// Subscribing twice to the same query shares one entry; it is dropped when
/// the last subscriber leaves.
#[derive(Default)]
pub struct LiveQueries {
    entries: HashMap<Query, LiveEntry>,
}

impl LiveQueries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `query` and return its current result.
    pub fn subscribe(&mut self, query: Query, db: &ChatDatabase) -> Result<QueryResult> {
        if let Some(entry) = self.entries.get_mut(&query) {
            entry.subscribers += 1;
            return Ok(entry.last.clone());
        }

        let result = query.run(db)?;
        self.entries.insert(
            query,
            LiveEntry {
                subscribers: 1,
                last: result.clone(),
            },
        );
        Ok(result)
    }

    pub fn unsubscribe(&mut self, query: &Query) {
        if let Some(entry) = self.entries.get_mut(query) {
            entry.subscribers -= 1;
            if entry.subscribers == 0 {
                self.entries.remove(query);
            }
        }
    }

    /// Re-run every live query, returning the ones whose result changed.
    /// A query that fails keeps its previous result and is reported separately.
    pub fn refresh(&mut self, db: &ChatDatabase) -> Refresh {
        let mut refresh = Refresh::default();

        for (query, entry) in self.entries.iter_mut() {
            match query.run(db) {
                Ok(result) if result != entry.last => {
                    entry.last = result.clone();
                    refresh.changed.push((query.clone(), result));
                }
                Ok(_) => {}
                Err(err) => refresh.failed.push((query.clone(), err.to_string())),
            }
        }

        refresh
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Refresh {
    pub changed: Vec<(Query, QueryResult)>,
    pub failed: Vec<(Query, String)>,
}
