//! Scene notifications
//!
//! The scene reports every batch of graph changes to its observers so list
//! views and property panels can stay in sync without polling.
//! - One event per batch; payloads are lists
//! - Delivery is synchronous, after the batch is fully applied
//! - Observers run in registration order and are removed by token

use crate::primitive::ObjectId;
use crate::scene::ObjectKey;

/// Identifies an object in an event payload
///
/// Removal events carry handles to objects that no longer exist, so both the
/// table key and the persistent id are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    /// Key in the scene table (stale for removed objects)
    pub key: ObjectKey,
    /// Persistent id
    pub id: ObjectId,
}

/// A batch of scene changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// Objects were added
    ObjectsAdded(Vec<ObjectHandle>),
    /// Objects were removed, descendants included
    ObjectsRemoved(Vec<ObjectHandle>),
    /// Objects became selected
    ObjectsSelected(Vec<ObjectHandle>),
    /// Objects became deselected
    ObjectsDeselected(Vec<ObjectHandle>),
}

impl SceneEvent {
    /// Objects carried by the event
    pub fn objects(&self) -> &[ObjectHandle] {
        match self {
            SceneEvent::ObjectsAdded(objects)
            | SceneEvent::ObjectsRemoved(objects)
            | SceneEvent::ObjectsSelected(objects)
            | SceneEvent::ObjectsDeselected(objects) => objects,
        }
    }
}

/// Receives scene events
pub trait SceneObserver {
    /// Handle one event
    fn on_scene_event(&mut self, event: &SceneEvent);
}

impl<F: FnMut(&SceneEvent)> SceneObserver for F {
    fn on_scene_event(&mut self, event: &SceneEvent) {
        self(event);
    }
}

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// Ordered list of observers
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<(SubscriptionToken, Box<dyn SceneObserver>)>,
    next_token: u64,
}

impl ObserverList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn subscribe(&mut self, observer: Box<dyn SceneObserver>) -> SubscriptionToken {
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.observers.push((token, observer));
        token
    }

    /// Remove an observer; returns whether it was registered
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token);
        self.observers.len() != before
    }

    /// Deliver an event to every observer; empty batches are dropped
    pub fn notify(&mut self, event: &SceneEvent) {
        if event.objects().is_empty() {
            return;
        }
        log::trace!("Notifying {} observers of {:?}", self.observers.len(), event);
        for (_, observer) in &mut self.observers {
            observer.on_scene_event(event);
        }
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn handle() -> ObjectHandle {
        ObjectHandle { key: ObjectKey::from(KeyData::from_ffi(1)), id: ObjectId::new() }
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = ObserverList::new();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            list.subscribe(Box::new(move |_: &SceneEvent| log.borrow_mut().push(tag)));
        }
        list.notify(&SceneEvent::ObjectsAdded(vec![handle()]));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribed_observer_is_silent() {
        let count = Rc::new(RefCell::new(0));
        let mut list = ObserverList::new();
        let token = {
            let count = Rc::clone(&count);
            list.subscribe(Box::new(move |_: &SceneEvent| *count.borrow_mut() += 1))
        };
        assert!(list.unsubscribe(token));
        assert!(!list.unsubscribe(token));
        list.notify(&SceneEvent::ObjectsSelected(vec![handle()]));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_empty_batches_are_not_delivered() {
        let count = Rc::new(RefCell::new(0));
        let mut list = ObserverList::new();
        let counter = Rc::clone(&count);
        list.subscribe(Box::new(move |_: &SceneEvent| *counter.borrow_mut() += 1));
        list.notify(&SceneEvent::ObjectsDeselected(Vec::new()));
        assert_eq!(*count.borrow(), 0);
    }
}
