use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wavebuild::exec::{ActionFuture, BuildAction, BuildOutcome};
use wavebuild::plan::{BuildUnit, overlaps};
use wavebuild::types::PathCase;

/// A fake build action that:
/// - records which units were "built", in call order
/// - fails, panics or skips for scripted unit names
/// - optionally sleeps to keep units in flight together
/// - tracks peak concurrency and any overlapping roots seen in flight
#[derive(Clone, Default)]
pub struct RecordingAction {
    calls: Arc<Mutex<Vec<String>>>,
    failures: HashMap<String, String>,
    panics: HashSet<String>,
    skips: HashSet<String>,
    delay: Duration,
    in_flight: Arc<Mutex<Vec<BuildUnit>>>,
    peak: Arc<AtomicUsize>,
    overlap_violations: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` fail with `message`.
    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    /// Make `name` panic.
    pub fn panic_on(mut self, name: &str) -> Self {
        self.panics.insert(name.to_string());
        self
    }

    /// Make `name` report `BuildOutcome::Skipped`.
    pub fn skip(mut self, name: &str) -> Self {
        self.skips.insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn overlap_violations(&self) -> Vec<(String, String)> {
        self.overlap_violations.lock().unwrap().clone()
    }

    fn enter(&self, unit: &BuildUnit) {
        let mut in_flight = self.in_flight.lock().unwrap();
        for other in in_flight.iter() {
            if overlaps(&other.source_root, &unit.source_root, PathCase::Sensitive) {
                self.overlap_violations
                    .lock()
                    .unwrap()
                    .push((other.name.clone(), unit.name.clone()));
            }
        }
        in_flight.push(unit.clone());
        self.peak.fetch_max(in_flight.len(), Ordering::SeqCst);
    }

    fn leave(&self, unit: &BuildUnit) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(pos) = in_flight.iter().position(|u| u.name == unit.name) {
            in_flight.remove(pos);
        }
    }
}

impl BuildAction for RecordingAction {
    fn build<'a>(&'a self, unit: &'a BuildUnit) -> ActionFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(unit.name.clone());
            self.enter(unit);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.leave(unit);

            if self.panics.contains(&unit.name) {
                panic!("unit {} exploded", unit.name);
            }
            if let Some(message) = self.failures.get(&unit.name) {
                anyhow::bail!("{message}");
            }
            if self.skips.contains(&unit.name) {
                return Ok(BuildOutcome::Skipped);
            }
            Ok(BuildOutcome::Built)
        })
    }
}
