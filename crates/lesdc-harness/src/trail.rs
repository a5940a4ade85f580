//! Bounded trailing log for the live feed.
//!
//! Keeps the newest `capacity` lines; pushing onto a full trail drops the
//! oldest one. Owned by the display layer, never by the stepper.

use std::collections::VecDeque;
use std::fmt::Write as _;

use serde::Serialize;

use lesdc_sim::StepSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailKind {
    /// Per-step sample line.
    Info,
    /// Lifecycle line: complete, paused, reset.
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailLine {
    /// Monotonic id across the trail's lifetime.
    pub id: u64,
    pub kind: TrailKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrailingLog {
    lines: VecDeque<TrailLine>,
    capacity: usize,
    next_id: u64,
}

impl TrailingLog {
    /// A zero capacity is treated as 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    pub fn push(&mut self, kind: TrailKind, text: impl Into<String>, details: Option<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.next_id += 1;
        self.lines.push_back(TrailLine {
            id: self.next_id,
            kind,
            text: text.into(),
            details,
        });
    }

    /// Record the sample line for one step.
    pub fn push_snapshot(&mut self, snap: &StepSnapshot) {
        self.push(TrailKind::Info, snap.description(), Some(snap.details()));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest line first, as the live feed shows them.
    pub fn newest_first(&self) -> impl Iterator<Item = &TrailLine> {
        self.lines.iter().rev()
    }

    /// One line per entry, newest first.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.newest_first() {
            write!(out, "[{:04}] {}", line.id, line.text).ok();
            if let Some(details) = &line.details {
                write!(out, "  ({details})").ok();
            }
            out.push('\n');
        }
        out
    }
}
