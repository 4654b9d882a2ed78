//! Ordered lifecycle listeners with explicit unregister handles.

/// Lifecycle event a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ListenerKind {
    Started,
    Finished,
    Disposed,
}

/// Token returned when a listener is registered.
///
/// Pass it to [`ActionExt::remove_listener`](crate::ActionExt::remove_listener)
/// to unregister the listener before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

struct Entry {
    id: u64,
    kind: ListenerKind,
    callback: Box<dyn FnMut()>,
}

/// Listener storage embedded in every action.
///
/// Listeners of one kind fire in registration order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Listeners {
    pub fn push(&mut self, kind: ListenerKind, callback: Box<dyn FnMut()>) -> ListenerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, kind, callback });
        ListenerHandle(id)
    }

    /// Removes the listener behind `handle`. Returns `false` if it was already gone.
    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != handle.0);
        self.entries.len() != before
    }

    pub fn notify(&mut self, kind: ListenerKind) {
        for entry in self.entries.iter_mut().filter(|entry| entry.kind == kind) {
            (entry.callback)();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every listener, releasing whatever the closures captured.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notifies_in_registration_order_by_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        for (kind, label) in [
            (ListenerKind::Finished, "a"),
            (ListenerKind::Started, "b"),
            (ListenerKind::Finished, "c"),
        ] {
            let log = Rc::clone(&log);
            listeners.push(kind, Box::new(move || log.borrow_mut().push(label)));
        }

        listeners.notify(ListenerKind::Finished);
        assert_eq!(*log.borrow(), vec!["a", "c"]);
    }

    #[test]
    fn removed_listener_does_not_fire() {
        let hits = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::default();

        let counter = Rc::clone(&hits);
        let handle = listeners.push(
            ListenerKind::Finished,
            Box::new(move || *counter.borrow_mut() += 1),
        );

        assert!(listeners.remove(handle));
        assert!(!listeners.remove(handle));
        listeners.notify(ListenerKind::Finished);
        assert_eq!(*hits.borrow(), 0);
    }
}
