//! Event-driven state machine with a (state, event) -> state table.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

type TransitionCallback = Box<dyn FnMut()>;
type StateChanged<S> = Box<dyn FnMut(&S, &S)>;

/// An edge of the transition table.
pub struct Transition<S> {
    pub from: S,
    pub to: S,
    callback: Option<TransitionCallback>,
}

impl<S: Debug> Debug for Transition<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// State machine keyed by state and event values.
///
/// `S` and `E` are typically enums; [`StringStateMachine`] is the variant
/// keyed by names. Events with no transition from the current state are
/// ignored.
///
/// # Example
///
/// ```rust,ignore
/// let mut door = StateMachine::new();
/// door.add_transition(Door::Closed, Input::Push, Door::Open);
/// door.add_transition(Door::Open, Input::Pull, Door::Closed);
/// door.start(Door::Closed);
///
/// assert!(door.handle_event(&Input::Push));
/// assert_eq!(door.state(), Some(&Door::Open));
/// ```
pub struct StateMachine<S, E> {
    current: Option<S>,
    states: HashMap<S, HashMap<E, Transition<S>>>,
    on_state_changed: Option<StateChanged<S>>,
}

/// State machine whose states and events are strings.
pub type StringStateMachine = StateMachine<String, String>;

impl<S, E> StateMachine<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            current: None,
            states: HashMap::new(),
            on_state_changed: None,
        }
    }

    /// Sets the listener called with `(from, to)` on every transition.
    #[must_use]
    pub fn with_state_changed(mut self, listener: impl FnMut(&S, &S) + 'static) -> Self {
        self.on_state_changed = Some(Box::new(listener));
        self
    }

    /// Registers `state` with no outgoing transitions. Existing
    /// transitions of `state` are kept.
    pub fn add_state(&mut self, state: S) -> &mut Self {
        self.states.entry(state).or_default();
        self
    }

    /// Adds or replaces the transition taken from `from` on `event`.
    /// Both states are registered if needed.
    pub fn add_transition(&mut self, from: S, event: E, to: S) -> &mut Self {
        self.insert(from, event, to, None)
    }

    /// Like [`add_transition`](Self::add_transition), with a callback run
    /// before the state changes.
    pub fn add_transition_with(
        &mut self,
        from: S,
        event: E,
        to: S,
        callback: impl FnMut() + 'static,
    ) -> &mut Self {
        self.insert(from, event, to, Some(Box::new(callback)))
    }

    /// Enters `state` without running callbacks.
    pub fn start(&mut self, state: S) {
        self.current = Some(state);
    }

    pub fn state(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn is_in<Q>(&self, state: &Q) -> bool
    where
        S: std::borrow::Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.current
            .as_ref()
            .is_some_and(|current| <S as std::borrow::Borrow<Q>>::borrow(current) == state)
    }

    /// Whether `event` has a transition out of the current state.
    pub fn can_handle<Q>(&self, event: &Q) -> bool
    where
        E: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.current
            .as_ref()
            .and_then(|current| self.states.get(current))
            .is_some_and(|edges| edges.contains_key(event))
    }

    /// Takes the transition for `event` out of the current state.
    ///
    /// Runs the transition callback, then the state-changed listener, then
    /// moves to the target state. Returns `false` if the machine has not
    /// started or the event has no transition from the current state.
    pub fn handle_event<Q>(&mut self, event: &Q) -> bool
    where
        E: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        let Some(transition) = self
            .states
            .get_mut(current)
            .and_then(|edges| edges.get_mut(event))
        else {
            return false;
        };

        if let Some(callback) = transition.callback.as_mut() {
            callback();
        }
        if let Some(listener) = self.on_state_changed.as_mut() {
            listener(&transition.from, &transition.to);
        }

        debug!(from = ?transition.from, to = ?transition.to, "state transition");
        self.current = Some(transition.to.clone());
        true
    }

    /// Drops every state, transition and callback. The current state is kept.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    fn insert(&mut self, from: S, event: E, to: S, callback: Option<TransitionCallback>) -> &mut Self {
        self.states.entry(to.clone()).or_default();
        let transition = Transition {
            from: from.clone(),
            to,
            callback,
        };
        self.states.entry(from).or_default().insert(event, transition);
        self
    }
}

impl<S, E> Default for StateMachine<S, E>
where
    S: Clone + Eq + Hash + Debug,
    E: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
