//! Fluent construction of composite actions.
//!
//! [`ActionKit::sequence`], [`ActionKit::parallel`] and [`ActionKit::repeat`]
//! return a [`Chain`] that appends pooled children to the composite and
//! hands the finished tree back with [`Chain::build`]. Instead of writing
//!
//! ```rust,ignore
//! let mut seq = kit.allocate::<Sequence>();
//! seq.append(kit.callback(f));
//! seq.append(kit.delay(1.0));
//! ```
//!
//! you can write `kit.sequence().callback(f).delay(1.0).build()`.

use std::future::Future;

use crate::context::ActionKit;
use crate::custom::CustomApi;
use crate::parallel::Parallel;
use crate::repeat::Repeat;
use crate::sequence::Sequence;
use crate::{Action, BoxedAction};

/// A composite that children can be appended to.
pub trait Container: Action + 'static {
    fn push_child(&mut self, child: BoxedAction);
}

impl Container for Sequence {
    fn push_child(&mut self, child: BoxedAction) {
        self.append(child);
    }
}

impl Container for Parallel {
    fn push_child(&mut self, child: BoxedAction) {
        self.add(child);
    }
}

impl Container for Repeat {
    fn push_child(&mut self, child: BoxedAction) {
        self.append(child);
    }
}

/// Builder that appends children to a composite of type `C`.
#[must_use = "call `build` to obtain the composite"]
pub struct Chain<C: Container> {
    kit: ActionKit,
    node: Box<C>,
}

impl<C: Container> Chain<C> {
    pub fn new(kit: ActionKit, node: Box<C>) -> Self {
        Self { kit, node }
    }

    /// Appends an already built action.
    pub fn append<A: Action + 'static>(self, action: Box<A>) -> Self {
        self.append_boxed(action)
    }

    pub fn append_boxed(mut self, action: BoxedAction) -> Self {
        self.node.push_child(action);
        self
    }

    pub fn delay(self, seconds: f32) -> Self {
        let action = self.kit.delay(seconds);
        self.append(action)
    }

    /// Alias of [`delay`](Self::delay).
    pub fn wait(self, seconds: f32) -> Self {
        self.delay(seconds)
    }

    pub fn delay_frame(self, count: u64) -> Self {
        let action = self.kit.delay_frame(count);
        self.append(action)
    }

    pub fn next_frame(self) -> Self {
        self.delay_frame(1)
    }

    pub fn callback(self, callback: impl FnMut() + 'static) -> Self {
        let action = self.kit.callback(callback);
        self.append(action)
    }

    pub fn condition(self, predicate: impl FnMut() -> bool + 'static) -> Self {
        let action = self.kit.condition(predicate);
        self.append(action)
    }

    /// Alias of [`condition`](Self::condition).
    pub fn until(self, predicate: impl FnMut() -> bool + 'static) -> Self {
        self.condition(predicate)
    }

    pub fn coroutine<F, Fut>(self, factory: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let action = self.kit.coroutine(factory);
        self.append(action)
    }

    pub fn only_begin(self, on_start: impl FnMut(&mut CustomApi<'_, ()>) + 'static) -> Self {
        let action = self.kit.only_begin(on_start);
        self.append(action)
    }

    /// Appends a nested sequence populated by `build`.
    pub fn sequence(self, build: impl FnOnce(Chain<Sequence>) -> Chain<Sequence>) -> Self {
        let nested = build(self.kit.sequence()).build();
        self.append(nested)
    }

    /// Appends a nested parallel populated by `build`.
    pub fn parallel(self, build: impl FnOnce(Chain<Parallel>) -> Chain<Parallel>) -> Self {
        let nested = build(self.kit.parallel()).build();
        self.append(nested)
    }

    pub fn kit(&self) -> &ActionKit {
        &self.kit
    }

    pub fn build(self) -> Box<C> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn nested_chains_compose() {
        let kit = ActionKit::default();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));

        let mut tree = kit
            .sequence()
            .callback(move || a.borrow_mut().push("start"))
            .parallel(|p| {
                p.delay(1.0)
                    .callback(move || b.borrow_mut().push("spawned"))
            })
            .callback(move || c.borrow_mut().push("end"))
            .build();

        assert!(!tree.execute(0.5));
        assert_eq!(*log.borrow(), vec!["start", "spawned"]);
        assert!(tree.execute(0.5));
        assert_eq!(*log.borrow(), vec!["start", "spawned", "end"]);
    }

    #[test]
    fn until_waits_for_the_predicate() {
        let kit = ActionKit::default();
        let open = Rc::new(RefCell::new(false));
        let gate = Rc::clone(&open);

        let mut tree = kit.sequence().next_frame().until(move || *gate.borrow()).build();

        assert!(!tree.execute(0.1));
        kit.frames().advance();
        assert!(!tree.execute(0.1));
        *open.borrow_mut() = true;
        assert!(tree.execute(0.1));
    }

    #[test]
    fn repeat_chain_appends_to_the_body() {
        let kit = ActionKit::default();
        let repeat = kit.repeat(2).wait(1.0).wait(1.0).build();
        assert_eq!(repeat.body().map(Sequence::len), Some(2));
    }
}
