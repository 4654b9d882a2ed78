//! Sample action trees.

use std::cell::RefCell;
use std::rc::Rc;

use action_kit::fsm::{EnumStateMachine, FsmState, TransitionRule, TypedFsm};
use action_kit::{ActionExt, ActionKit, ActionRunner, yield_frames};
use clap::ValueEnum;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Scenario {
    /// Scripted intro: dialogue, camera moves and a keyed timeline
    Cutscene,
    /// Guard looping between waypoints, tracked by an enum state machine
    Patrol,
    /// Door puzzle driven by a coroutine and a typed state machine
    Door,
}

/// Event log shared by the closures of a scenario.
#[derive(Clone, Default)]
pub struct Report {
    events: Rc<RefCell<Vec<String>>>,
}

impl Report {
    fn record(&self, event: impl Into<String>) {
        let event = event.into();
        info!(%event, "event");
        self.events.borrow_mut().push(event);
    }

    fn recorder(&self, event: &'static str) -> impl FnMut() + 'static {
        let report = self.clone();
        move || report.record(event)
    }

    pub fn summarize(&self) {
        let events = self.events.borrow();
        info!(count = events.len(), "recorded events");
        for (index, event) in events.iter().enumerate() {
            println!("{index:>3}  {event}");
        }
    }
}

impl Scenario {
    /// Builds the scenario's trees and hands them to `runner`.
    pub fn install(self, kit: &ActionKit, runner: &mut ActionRunner) -> Report {
        let report = Report::default();
        match self {
            Self::Cutscene => cutscene(kit, runner, &report),
            Self::Patrol => patrol(kit, runner, &report),
            Self::Door => door(kit, runner, &report),
        }
        report
    }
}

fn cutscene(kit: &ActionKit, runner: &mut ActionRunner, report: &Report) {
    let mut camera = kit.timeline();
    let sink = report.clone();
    camera
        .on_key_event(move |name| sink.record(format!("camera: {name}")))
        .append_key_event(kit, 0.0, "fade-in")
        .append(0.5, kit.callback(report.recorder("camera pans to hero")))
        .append_key_event(kit, 1.5, "zoom");

    let mut intro = kit
        .sequence()
        .callback(report.recorder("lights dim"))
        .callback(report.recorder("music starts"))
        .parallel(|p| {
            p.append(camera)
                .delay(1.0)
                .callback(report.recorder("hero walks in"))
        })
        .next_frame()
        .delay(0.5)
        .callback(report.recorder("dialogue: \"You're late.\""))
        .build();
    intro.on_finished(report.recorder("cutscene over"));

    runner.run(intro);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Guard {
    Idle,
    Walking,
    Looking,
}

fn patrol(kit: &ActionKit, runner: &mut ActionRunner, report: &Report) {
    let guard = Rc::new(RefCell::new(EnumStateMachine::new(Guard::Idle)));
    let sink = report.clone();
    guard.borrow_mut().on_state_changed(move |change| {
        sink.record(format!("guard: {:?} -> {:?}", change.previous, change.current));
    });

    let enter = |state: Guard| {
        let guard = Rc::clone(&guard);
        move || {
            guard.borrow_mut().change_state(state);
        }
    };

    let route = kit
        .repeat(3)
        .callback(enter(Guard::Walking))
        .delay(1.0)
        .callback(enter(Guard::Looking))
        .delay(0.5)
        .build();

    // The alarm sequence waits for the guard to finish its rounds.
    let watcher = Rc::clone(&guard);
    let mut rounds = 0;
    let mut last = Guard::Idle;
    let alarm = kit
        .sequence()
        .until(move || {
            let current = watcher.borrow().current();
            if current == Guard::Looking && last != Guard::Looking {
                rounds += 1;
            }
            last = current;
            rounds >= 3
        })
        .delay(0.5)
        .callback(enter(Guard::Idle))
        .callback(report.recorder("patrol complete"))
        .build();

    runner.run(route);
    runner.enqueue(alarm);
}

struct Locked;
struct Opening;
struct Open;

impl FsmState for Locked {}

impl FsmState for Opening {
    fn on_enter(&mut self) {
        info!("door mechanism engaged");
    }
}

impl FsmState for Open {}

struct KeyInserted;
struct Unlocked;

fn door(kit: &ActionKit, runner: &mut ActionRunner, report: &Report) {
    let fsm = Rc::new(RefCell::new(TypedFsm::new()));
    {
        let mut fsm = fsm.borrow_mut();
        let sink = report.clone();
        fsm.add_state(Locked)
            .add_state(Opening)
            .add_state(Open)
            .add_transition(
                TransitionRule::on::<KeyInserted>()
                    .from::<Locked>()
                    .to::<Opening>()
                    .on_transition(move |from, to| {
                        sink.record(format!("door: {} -> {}", short(from), short(to)));
                    }),
            )
            .add_transition(TransitionRule::on::<Unlocked>().from::<Opening>().to::<Open>());
        if let Err(error) = fsm.start_state::<Locked>() {
            warn!(%error, "door state machine failed to start");
        }
    }

    let fire = |event: fn(&mut TypedFsm) -> bool| {
        let fsm = Rc::clone(&fsm);
        move || event(&mut fsm.borrow_mut())
    };
    let insert_key = fire(|fsm| fsm.handle_event::<KeyInserted>().unwrap_or(false));
    let unlock = fire(|fsm| fsm.handle_event::<Unlocked>().unwrap_or(false));

    let sink = report.clone();
    let mechanism = kit.coroutine(move || {
        let sink = sink.clone();
        async move {
            for turn in 1..=3 {
                sink.record(format!("key turn {turn}"));
                yield_frames(5).await;
            }
        }
    });

    let watcher = Rc::clone(&fsm);
    let tree = kit
        .sequence()
        .only_begin(move |api| {
            if insert_key() {
                api.finish();
            } else {
                api.dispose();
            }
        })
        .append(mechanism)
        .callback(move || {
            unlock();
        })
        .until(move || watcher.borrow().is_in::<Open>())
        .callback(report.recorder("door open"))
        .build();

    runner.run(tree);
}

/// Strips the module path from a state's type name.
fn short(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}
