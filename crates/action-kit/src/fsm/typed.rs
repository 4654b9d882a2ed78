//! State machine whose states and events are Rust types.
//!
//! Each state is a value implementing [`FsmState`], registered once and
//! addressed by its type. Transitions are [`TransitionRule`]s keyed by a
//! marker type standing for the event, so firing an event is
//! `fsm.handle_event::<Jump>()`.

use std::any::{TypeId, type_name};
use std::collections::HashMap;

use tracing::debug;

use super::table::TableIndex;
use crate::error::FsmError;

/// A state of a [`TypedFsm`].
pub trait FsmState: 'static {
    fn on_enter(&mut self) {}

    fn on_update(&mut self) {}

    fn on_fixed_update(&mut self) {}

    fn on_exit(&mut self) {}
}

type TransitionCallback = Box<dyn FnMut(&'static str, &'static str)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct StateKey {
    id: TypeId,
    name: &'static str,
}

impl StateKey {
    fn of<S: 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
        }
    }
}

/// A transition fired by the event marker `M`, from any of its source states
/// to its destination.
///
/// # Example
///
/// ```rust,ignore
/// struct Jump;
///
/// fsm.add_transition(
///     TransitionRule::on::<Jump>()
///         .from::<Idle>()
///         .from::<Running>()
///         .to::<Airborne>(),
/// );
/// ```
pub struct TransitionRule {
    event: TypeId,
    from: Vec<TypeId>,
    to: Option<StateKey>,
    callback: Option<TransitionCallback>,
}

impl TransitionRule {
    /// Starts a rule fired by the event marker type `M`.
    pub fn on<M: 'static>() -> Self {
        Self {
            event: TypeId::of::<M>(),
            from: Vec::new(),
            to: None,
            callback: None,
        }
    }

    /// Adds `S` to the states this rule applies in.
    #[must_use]
    pub fn from<S: FsmState>(mut self) -> Self {
        let id = TypeId::of::<S>();
        if !self.from.contains(&id) {
            self.from.push(id);
        }
        self
    }

    #[must_use]
    pub fn to<S: FsmState>(mut self) -> Self {
        self.to = Some(StateKey::of::<S>());
        self
    }

    /// Sets a callback run with the source and destination state names
    /// between the source's `on_exit` and the destination's `on_enter`.
    #[must_use]
    pub fn on_transition(mut self, callback: impl FnMut(&'static str, &'static str) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionRule")
            .field("sources", &self.from.len())
            .field("to", &self.to.map(|key| key.name))
            .finish()
    }
}

struct Registered {
    name: &'static str,
    state: Box<dyn FsmState>,
}

/// State machine over [`FsmState`] types.
pub struct TypedFsm {
    states: HashMap<TypeId, Registered>,
    transitions: TableIndex<TypeId, TransitionRule>,
    current: Option<StateKey>,
    previous: Option<StateKey>,
}

impl TypedFsm {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            transitions: TableIndex::new(|rule: &TransitionRule| rule.event),
            current: None,
            previous: None,
        }
    }

    /// Registers `state`, replacing any earlier state of the same type.
    pub fn add_state<S: FsmState>(&mut self, state: S) -> &mut Self {
        self.states.insert(
            TypeId::of::<S>(),
            Registered {
                name: type_name::<S>(),
                state: Box::new(state),
            },
        );
        self
    }

    pub fn add_transition(&mut self, rule: TransitionRule) -> &mut Self {
        self.transitions.add(rule);
        self
    }

    /// Type name of the current state.
    pub fn current_state_name(&self) -> Option<&'static str> {
        self.current.map(|key| key.name)
    }

    pub fn previous_state_name(&self) -> Option<&'static str> {
        self.previous.map(|key| key.name)
    }

    pub fn is_in<S: FsmState>(&self) -> bool {
        self.current.is_some_and(|key| key.id == TypeId::of::<S>())
    }

    /// Enters `S` without exiting anything.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::UnknownState`] if `S` is not registered.
    pub fn start_state<S: FsmState>(&mut self) -> Result<(), FsmError> {
        let key = StateKey::of::<S>();
        self.state_mut(key)?.on_enter();
        self.current = Some(key);
        Ok(())
    }

    /// Fires the first rule for event `M` whose sources include the current
    /// state. Returns `Ok(false)` if no rule applies.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotStarted`] before a state has been entered, and
    /// [`FsmError::UnknownState`] if the matching rule targets an
    /// unregistered state or has no destination.
    pub fn handle_event<M: 'static>(&mut self) -> Result<bool, FsmError> {
        let current = self.current.ok_or(FsmError::NotStarted)?;

        let Some(rule) = self
            .transitions
            .get_mut(&TypeId::of::<M>())
            .iter_mut()
            .find(|rule| rule.from.contains(&current.id))
        else {
            return Ok(false);
        };

        let target = rule
            .to
            .ok_or_else(|| FsmError::UnknownState(format!("destination of {}", type_name::<M>())))?;
        if !self.states.contains_key(&target.id) {
            return Err(FsmError::UnknownState(target.name.to_owned()));
        }

        debug!(event = type_name::<M>(), from = current.name, to = target.name, "fsm transition");
        if let Some(registered) = self.states.get_mut(&current.id) {
            registered.state.on_exit();
        }
        if let Some(callback) = rule.callback.as_mut() {
            callback(current.name, target.name);
        }
        self.previous = Some(current);
        self.current = Some(target);
        if let Some(registered) = self.states.get_mut(&target.id) {
            registered.state.on_enter();
        }
        Ok(true)
    }

    /// Moves to `S`, remembering the current state for
    /// [`back_to_previous_state`](Self::back_to_previous_state). Does nothing
    /// if already in `S`.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotStarted`] before a state has been entered, and
    /// [`FsmError::UnknownState`] if `S` is not registered.
    pub fn change_state<S: FsmState>(&mut self) -> Result<(), FsmError> {
        self.change_to(StateKey::of::<S>())
    }

    /// Returns to the state active before the last change.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NoPreviousState`] if no change has happened yet.
    pub fn back_to_previous_state(&mut self) -> Result<(), FsmError> {
        let previous = self.previous.ok_or(FsmError::NoPreviousState)?;
        self.change_to(previous)
    }

    /// Runs the current state's `on_update`.
    pub fn update(&mut self) {
        if let Some(registered) = self.current_registered() {
            registered.state.on_update();
        }
    }

    /// Runs the current state's `on_fixed_update`.
    pub fn fixed_update(&mut self) {
        if let Some(registered) = self.current_registered() {
            registered.state.on_fixed_update();
        }
    }

    fn change_to(&mut self, key: StateKey) -> Result<(), FsmError> {
        let current = self.current.ok_or(FsmError::NotStarted)?;
        if current.id == key.id {
            return Ok(());
        }
        if !self.states.contains_key(&key.id) {
            return Err(FsmError::UnknownState(key.name.to_owned()));
        }

        debug!(from = current.name, to = key.name, "fsm state change");
        self.exit_current();
        self.previous = Some(current);
        self.enter(key);
        Ok(())
    }

    fn exit_current(&mut self) {
        if let Some(registered) = self.current_registered() {
            registered.state.on_exit();
        }
    }

    fn enter(&mut self, key: StateKey) {
        self.current = Some(key);
        if let Some(registered) = self.states.get_mut(&key.id) {
            registered.state.on_enter();
        }
    }

    fn current_registered(&mut self) -> Option<&mut Registered> {
        let key = self.current?;
        self.states.get_mut(&key.id)
    }

    fn state_mut(&mut self, key: StateKey) -> Result<&mut dyn FsmState, FsmError> {
        self.states
            .get_mut(&key.id)
            .map(|registered| registered.state.as_mut())
            .ok_or_else(|| FsmError::UnknownState(key.name.to_owned()))
    }
}

impl Default for TypedFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypedFsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.states.values().map(|registered| registered.name).collect();
        names.sort_unstable();
        f.debug_struct("TypedFsm")
            .field("states", &names)
            .field("current", &self.current_state_name())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    macro_rules! logging_state {
        ($name:ident) => {
            struct $name(Log);

            impl FsmState for $name {
                fn on_enter(&mut self) {
                    self.0.borrow_mut().push(format!("enter {}", stringify!($name)));
                }

                fn on_update(&mut self) {
                    self.0.borrow_mut().push(format!("update {}", stringify!($name)));
                }

                fn on_exit(&mut self) {
                    self.0.borrow_mut().push(format!("exit {}", stringify!($name)));
                }
            }
        };
    }

    logging_state!(Idle);
    logging_state!(Running);
    logging_state!(Airborne);

    struct Jump;
    struct Sprint;

    fn machine(log: &Log) -> TypedFsm {
        let mut fsm = TypedFsm::new();
        fsm.add_state(Idle(Rc::clone(log)))
            .add_state(Running(Rc::clone(log)))
            .add_state(Airborne(Rc::clone(log)))
            .add_transition(TransitionRule::on::<Sprint>().from::<Idle>().to::<Running>())
            .add_transition(
                TransitionRule::on::<Jump>()
                    .from::<Idle>()
                    .from::<Running>()
                    .to::<Airborne>(),
            );
        fsm
    }

    #[test]
    fn events_follow_matching_rules() {
        let log = Log::default();
        let mut fsm = machine(&log);
        fsm.start_state::<Idle>().unwrap();

        assert_eq!(fsm.handle_event::<Sprint>(), Ok(true));
        assert!(fsm.is_in::<Running>());
        assert_eq!(fsm.handle_event::<Sprint>(), Ok(false));
        assert_eq!(fsm.handle_event::<Jump>(), Ok(true));
        assert!(fsm.is_in::<Airborne>());

        assert_eq!(
            *log.borrow(),
            vec![
                "enter Idle",
                "exit Idle",
                "enter Running",
                "exit Running",
                "enter Airborne"
            ]
        );
    }

    #[test]
    fn transition_callback_runs_between_exit_and_enter() {
        let log = Log::default();
        let mut fsm = machine(&log);
        let seen = Rc::clone(&log);
        fsm.add_transition(
            TransitionRule::on::<Jump>()
                .from::<Airborne>()
                .to::<Idle>()
                .on_transition(move |_, to| {
                    let to = to.rsplit("::").next().unwrap_or(to);
                    seen.borrow_mut().push(format!("landing in {to}"));
                }),
        );

        fsm.start_state::<Airborne>().unwrap();
        log.borrow_mut().clear();
        fsm.handle_event::<Jump>().unwrap();

        assert_eq!(*log.borrow(), vec!["exit Airborne", "landing in Idle", "enter Idle"]);
    }

    #[test]
    fn change_state_and_back() {
        let log = Log::default();
        let mut fsm = machine(&log);
        assert_eq!(fsm.back_to_previous_state(), Err(FsmError::NoPreviousState));

        fsm.start_state::<Idle>().unwrap();
        fsm.change_state::<Running>().unwrap();
        fsm.change_state::<Running>().unwrap();
        assert!(fsm.previous_state_name().is_some_and(|name| name.ends_with("Idle")));

        fsm.back_to_previous_state().unwrap();
        assert!(fsm.is_in::<Idle>());
    }

    #[test]
    fn update_reaches_only_the_current_state() {
        let log = Log::default();
        let mut fsm = machine(&log);
        fsm.update();
        assert!(log.borrow().is_empty());

        fsm.start_state::<Running>().unwrap();
        fsm.update();
        fsm.fixed_update();
        assert_eq!(log.borrow().last().map(String::as_str), Some("update Running"));
    }

    #[test]
    fn errors_name_the_missing_state() {
        struct Unregistered;
        impl FsmState for Unregistered {}

        let log = Log::default();
        let mut fsm = machine(&log);
        assert_eq!(fsm.handle_event::<Jump>(), Err(FsmError::NotStarted));

        let err = fsm.start_state::<Unregistered>().unwrap_err();
        assert!(matches!(err, FsmError::UnknownState(name) if name.ends_with("Unregistered")));

        fsm.start_state::<Idle>().unwrap();
        assert!(fsm.change_state::<Unregistered>().is_err());
        assert!(fsm.is_in::<Idle>());
    }
}
