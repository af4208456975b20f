use crate::garrison::Garrison;
use crate::persistence::rows::Transaction;
use crate::persistence::store::RowStore;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    pub interval_seconds: u64,
}

impl AutosaveConfig {
    pub fn interval(self) -> Option<Duration> {
        if self.interval_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.interval_seconds.max(1)))
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveState {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl AutosaveState {
    pub fn new(config: AutosaveConfig, now: Instant) -> Self {
        let interval = config.interval();
        let next_due = interval.map(|interval| now + interval);
        Self { interval, next_due }
    }

    pub fn due(&self, now: Instant) -> bool {
        self.next_due.map_or(false, |next| now >= next)
    }

    pub fn mark_saved(&mut self, now: Instant) {
        if let Some(interval) = self.interval {
            self.next_due = Some(now + interval);
        }
    }
}

#[derive(Debug, Default)]
pub struct AutosaveReport {
    pub saved_garrisons: usize,
    pub garrison_errors: Vec<String>,
}

/// Saves each garrison in its own transaction so one failure does not hold back the rest.
pub fn autosave_garrisons<'a>(
    garrisons: impl IntoIterator<Item = &'a Garrison>,
    store: &mut dyn RowStore,
) -> AutosaveReport {
    let mut report = AutosaveReport::default();
    for garrison in garrisons {
        let mut tx = Transaction::new();
        garrison.save_to_db(&mut tx);
        match store.commit(tx) {
            Ok(()) => report.saved_garrisons += 1,
            Err(err) => report
                .garrison_errors
                .push(format!("owner {}: {}", garrison.owner(), err)),
        }
    }
    report
}
