//! Shared test assets for the integration suites.

#![allow(dead_code, clippy::unwrap_used)]

use frameload_core::{Asset, AssetError, GatherJob};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

// =============================================================================
// GATE
// =============================================================================

/// Holds background gathers until the test opens it.
#[derive(Clone, Default)]
pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn wait(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }
}

// =============================================================================
// JOURNAL
// =============================================================================

/// Operations observed on test assets, in real-time order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Gathered(String),
    Processed { label: String, with_payload: bool },
    Discarded(String),
    Unloaded(String),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

// =============================================================================
// TEST ASSET
// =============================================================================

pub struct TestAsset {
    pub name: String,
    pub gathers: bool,
    pub gate: Option<Gate>,
    pub fail_gather: bool,
    pub journal: Journal,
    pub live: bool,
}

impl TestAsset {
    pub fn new(name: impl Into<String>, gathers: bool, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            gathers,
            gate: None,
            fail_gather: false,
            journal: journal.clone(),
            live: false,
        }
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_gather = true;
        self
    }
}

impl Asset for TestAsset {
    type Payload = String;

    fn label(&self) -> &str {
        &self.name
    }

    fn has_gather(&self) -> bool {
        self.gathers
    }

    fn gather_job(&self) -> GatherJob<String> {
        let name = self.name.clone();
        let gate = self.gate.clone();
        let fail = self.fail_gather;
        let journal = self.journal.clone();
        Box::new(move || {
            if let Some(gate) = gate {
                gate.wait();
            }
            journal.push(Event::Gathered(name.clone()));
            if fail {
                Err(AssetError::Missing(name))
            } else {
                Ok(format!("{name}-bytes"))
            }
        })
    }

    fn process(&mut self, payload: Option<&String>) -> Result<(), AssetError> {
        self.live = true;
        self.journal.push(Event::Processed {
            label: self.name.clone(),
            with_payload: payload.is_some(),
        });
        Ok(())
    }

    fn discard(&mut self, _payload: String) {
        self.journal.push(Event::Discarded(self.name.clone()));
    }

    fn unload(&mut self) {
        self.live = false;
        self.journal.push(Event::Unloaded(self.name.clone()));
    }
}

/// Poll until `done` holds, failing the test after a generous timeout.
pub fn eventually(mut done: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if done() {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(done(), "condition not reached in time");
}
