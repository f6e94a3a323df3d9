// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registration shared by nodes, actions, timelines and the stage.
//!
//! An [`EventTarget`] holds, per [`EventType`], an optional direct handler
//! slot and a list of listeners ordered most-recently-added first. Dispatch
//! snapshots both before invoking anything, so listeners may add or remove
//! listeners (including themselves) without affecting the delivery in flight.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::error::Result;
use crate::event::{Event, EventType};
use crate::node::SceneGraph;

/// A shared event callback.
///
/// Identity is pointer identity: registering a clone of the same `Rc` twice
/// for one type is a no-op, and removal matches the same allocation.
pub type Listener = Rc<dyn Fn(&mut SceneGraph, &mut Event) -> Result<()>>;

/// Wraps a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&mut SceneGraph, &mut Event) -> Result<()> + 'static,
{
    Rc::new(f)
}

/// Listener lists and direct handler slots keyed by event type.
#[derive(Clone, Default)]
pub struct EventTarget {
    listeners: HashMap<EventType, Vec<Listener>>,
    handlers: HashMap<EventType, Listener>,
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.listeners.values().map(Vec::len).sum();
        f.debug_struct("EventTarget")
            .field("listeners", &listeners)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl EventTarget {
    /// Creates a target with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `kind`, ahead of earlier listeners.
    ///
    /// Returns `false` if this exact listener was already registered.
    pub fn add_event_listener(&mut self, kind: EventType, listener: Listener) -> bool {
        let list = self.listeners.entry(kind).or_default();
        if list.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            return false;
        }
        list.insert(0, listener);
        true
    }

    /// Removes the first registration of `listener` for `kind`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_event_listener(&mut self, kind: &EventType, listener: &Listener) -> bool {
        let Some(list) = self.listeners.get_mut(kind) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| Rc::ptr_eq(l, listener)) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(kind);
        }
        true
    }

    /// Removes every listener for `kind`, or for all types when `None`.
    ///
    /// Direct handler slots are left alone.
    pub fn clear_event_listener(&mut self, kind: Option<&EventType>) {
        match kind {
            Some(kind) => {
                self.listeners.remove(kind);
            }
            None => self.listeners.clear(),
        }
    }

    /// Fills (or empties) the direct handler slot for `kind`.
    ///
    /// Returns the previous handler.
    pub fn set_handler(&mut self, kind: EventType, handler: Option<Listener>) -> Option<Listener> {
        match handler {
            Some(h) => self.handlers.insert(kind, h),
            None => self.handlers.remove(&kind),
        }
    }

    /// Returns the direct handler for `kind`.
    #[must_use]
    pub fn handler(&self, kind: &EventType) -> Option<&Listener> {
        self.handlers.get(kind)
    }

    /// Returns whether `listener` is registered for `kind`.
    #[must_use]
    pub fn has_listener(&self, kind: &EventType, listener: &Listener) -> bool {
        self.listeners
            .get(kind)
            .is_some_and(|list| list.iter().any(|l| Rc::ptr_eq(l, listener)))
    }

    /// Returns the number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: &EventType) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    /// Drops all listeners and handlers.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.handlers.clear();
    }

    /// Captures the callbacks a dispatch of `kind` would run, in order.
    pub(crate) fn snapshot(&self, kind: &EventType) -> Snapshot {
        let mut calls = Vec::new();
        if let Some(h) = self.handlers.get(kind) {
            calls.push(Rc::clone(h));
        }
        if let Some(list) = self.listeners.get(kind) {
            calls.extend(list.iter().cloned());
        }
        Snapshot { calls }
    }
}

/// Callbacks frozen at dispatch time.
pub(crate) struct Snapshot {
    calls: Vec<Listener>,
}

impl Snapshot {
    /// Runs every captured callback, stopping at the first error.
    pub(crate) fn run(self, graph: &mut SceneGraph, event: &mut Event) -> Result<()> {
        for call in self.calls {
            call(graph, event)?;
        }
        Ok(())
    }
}
