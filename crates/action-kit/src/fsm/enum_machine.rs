//! Current/previous state tracker for enum-valued states.

use std::fmt::Debug;

use tracing::debug;

/// Notification sent to [`EnumStateMachine`] listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange<S> {
    pub previous: S,
    pub current: S,
}

/// Tracks a current and a previous state with optional change notifications.
///
/// Unlike [`StateMachine`](super::StateMachine) there is no transition table:
/// any state can be entered directly.
pub struct EnumStateMachine<S> {
    current: S,
    previous: S,
    trigger_events: bool,
    listeners: Vec<Box<dyn FnMut(StateChange<S>)>>,
}

impl<S: Copy + PartialEq + Debug> EnumStateMachine<S> {
    /// Creates a machine in `initial`, which is also its previous state.
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: initial,
            trigger_events: true,
            listeners: Vec::new(),
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    /// Whether listeners are notified. Enabled by default.
    pub fn set_trigger_events(&mut self, trigger: bool) {
        self.trigger_events = trigger;
    }

    pub fn on_state_changed(&mut self, listener: impl FnMut(StateChange<S>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Enters `state`, remembering the current one as previous.
    /// Returns `false` without notifying if already in `state`.
    pub fn change_state(&mut self, state: S) -> bool {
        if state == self.current {
            return false;
        }
        self.previous = self.current;
        self.current = state;
        self.notify();
        true
    }

    /// Returns to the previous state. The previous state is left unchanged.
    pub fn restore_previous_state(&mut self) {
        self.current = self.previous;
        self.notify();
    }

    fn notify(&mut self) {
        debug!(previous = ?self.previous, current = ?self.current, "state changed");
        if !self.trigger_events {
            return;
        }
        let change = StateChange {
            previous: self.previous,
            current: self.current,
        };
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Movement {
        Idle,
        Walking,
        Jumping,
    }

    #[test]
    fn change_state_records_the_previous_state() {
        let mut fsm = EnumStateMachine::new(Movement::Idle);
        assert!(fsm.change_state(Movement::Walking));
        assert!(fsm.change_state(Movement::Jumping));
        assert_eq!(fsm.previous(), Movement::Walking);

        fsm.restore_previous_state();
        assert_eq!(fsm.current(), Movement::Walking);
    }

    #[test]
    fn entering_the_current_state_is_a_no_op() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&changes);

        let mut fsm = EnumStateMachine::new(Movement::Idle);
        fsm.on_state_changed(move |change| log.borrow_mut().push(change));

        assert!(!fsm.change_state(Movement::Idle));
        assert!(fsm.change_state(Movement::Walking));
        assert_eq!(
            *changes.borrow(),
            vec![StateChange {
                previous: Movement::Idle,
                current: Movement::Walking
            }]
        );
    }

    #[test]
    fn muted_machine_still_changes_state() {
        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);

        let mut fsm = EnumStateMachine::new(Movement::Idle);
        fsm.on_state_changed(move |_| *counter.borrow_mut() += 1);
        fsm.set_trigger_events(false);

        fsm.change_state(Movement::Jumping);
        assert_eq!(fsm.current(), Movement::Jumping);
        assert_eq!(*fired.borrow(), 0);
    }
}
