//! Alias store
//!
//! Maps a name to the most recently published step result. Aliased steps
//! reserve their name when their queue starts draining, so a read that runs
//! ahead of the publishing step is reported as a scheduling bug
//! (`NotYetSettled`) rather than a typo (`UnknownAlias`).

use std::collections::HashMap;

use serde_json::Value;

use crate::common::{Error, Result};

#[derive(Debug)]
enum AliasSlot {
    /// The publishing step is enqueued but has not settled successfully
    Reserved,
    /// Most recent published result
    Settled(Value),
}

/// Per-run mapping from alias name to last published result
#[derive(Debug, Default)]
pub struct AliasStore {
    entries: HashMap<String, AliasSlot>,
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name for a step that will publish later
    ///
    /// A previously settled value stays visible until overwritten, matching
    /// "resolve returns the most recent publication".
    pub(crate) fn reserve(&mut self, name: &str) {
        self.entries
            .entry(name.to_string())
            .or_insert(AliasSlot::Reserved);
    }

    /// Release a reservation whose step failed; earlier publications survive
    pub(crate) fn release(&mut self, name: &str) {
        if matches!(self.entries.get(name), Some(AliasSlot::Reserved)) {
            self.entries.remove(name);
        }
    }

    /// Publish a result under a name, overwriting any previous publication
    pub fn publish(&mut self, name: &str, value: Value) {
        self.entries
            .insert(name.to_string(), AliasSlot::Settled(value));
    }

    /// Resolve the most recent publication for a name
    pub fn resolve(&self, name: &str) -> Result<&Value> {
        match self.entries.get(name) {
            Some(AliasSlot::Settled(value)) => Ok(value),
            Some(AliasSlot::Reserved) => Err(Error::NotYetSettled(name.to_string())),
            None => Err(Error::UnknownAlias(name.to_string())),
        }
    }

    /// Whether a name has a live publication
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(AliasSlot::Settled(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_returns_exactly_what_was_published() {
        let mut store = AliasStore::new();
        store.publish("createUser", json!({"status": 201, "body": {"id": 7}}));
        assert_eq!(
            store.resolve("createUser").unwrap(),
            &json!({"status": 201, "body": {"id": 7}})
        );
    }

    #[test]
    fn unknown_alias() {
        let store = AliasStore::new();
        assert!(matches!(
            store.resolve("nope"),
            Err(Error::UnknownAlias(name)) if name == "nope"
        ));
    }

    #[test]
    fn reserved_alias_is_not_yet_settled() {
        let mut store = AliasStore::new();
        store.reserve("createUser");
        assert!(matches!(
            store.resolve("createUser"),
            Err(Error::NotYetSettled(_))
        ));
    }

    #[test]
    fn republish_overwrites() {
        let mut store = AliasStore::new();
        store.publish("user", json!(1));
        store.publish("user", json!(2));
        assert_eq!(store.resolve("user").unwrap(), &json!(2));
    }

    #[test]
    fn reserve_does_not_clobber_settled_value() {
        let mut store = AliasStore::new();
        store.publish("user", json!(1));
        store.reserve("user");
        assert_eq!(store.resolve("user").unwrap(), &json!(1));
    }

    #[test]
    fn release_drops_reservation_but_keeps_old_publication() {
        let mut store = AliasStore::new();
        store.reserve("a");
        store.release("a");
        assert!(matches!(store.resolve("a"), Err(Error::UnknownAlias(_))));

        store.publish("b", json!(true));
        store.release("b");
        assert!(store.contains("b"));
    }
}
