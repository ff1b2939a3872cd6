//! Definition registry: name → fragment, with a recursion guard.
//!
//! Protocol: `reserve` a name before descending into a body that may
//! reference it, `fulfil` on success, `abandon` on failure. Abandon is a
//! no-op unless the slot is still pending, so a failed attempt never
//! removes an unrelated earlier registration, and never leaves a dangling
//! half-built entry behind.

use indexmap::IndexMap;

use crate::fragment::Fragment;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Reserved while the body is being computed.
    Pending,
    Done(Fragment),
}

/// One compilation run's definition table. Insertion order is preserved and
/// becomes the `definitions` emission order.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    slots: IndexMap<String, Slot>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for both pending and fulfilled entries. A pending hit is what
    /// terminates recursive descent.
    pub fn has(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Insert a pending placeholder. Re-reserving an existing name keeps
    /// its current slot and position.
    pub fn reserve(&mut self, name: &str) {
        self.slots
            .entry(name.to_string())
            .or_insert(Slot::Pending);
    }

    /// Store the computed fragment, wrapped in its documentation when one
    /// is present, replacing any placeholder (position is kept).
    pub fn fulfil(&mut self, name: &str, fragment: Fragment, doc: Option<&str>) {
        let fragment = match doc {
            Some(text) if !text.is_empty() => fragment.with_descr(text),
            _ => fragment,
        };
        self.slots.insert(name.to_string(), Slot::Done(fragment));
    }

    /// Remove the entry only while it is still pending.
    pub fn abandon(&mut self, name: &str) {
        if matches!(self.slots.get(name), Some(Slot::Pending)) {
            self.slots.shift_remove(name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Fragment> {
        match self.slots.get(name) {
            Some(Slot::Done(fragment)) => Some(fragment),
            _ => None,
        }
    }

    /// Rewrap a fulfilled entry with documentation (the alias path). The
    /// only mutation a definition sees after fulfilment.
    pub fn wrap_doc(&mut self, name: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Slot::Done(fragment)) = self.slots.get_mut(name) {
            *fragment = fragment.clone().with_descr(text);
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.slots.values().any(|s| matches!(s, Slot::Done(_)))
    }

    /// Fulfilled entries in registration order.
    pub fn iter_done(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Done(fragment) => Some((name.as_str(), fragment)),
            Slot::Pending => None,
        })
    }
}

// --------------------------------- Tests ---------------------------------- //
