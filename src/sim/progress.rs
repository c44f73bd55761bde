//! Page count and the milestones it triggers

use serde::{Deserialize, Serialize};

/// Signals raised by the page count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    /// The very first page
    FirstPickup,
    /// Enough pages to escape
    WinThreshold,
}

/// Milestone for a page count, plus the count clamped to the threshold
pub fn evaluate(count: u32, threshold: u32) -> (u32, Option<Milestone>) {
    if count >= threshold {
        (threshold, Some(Milestone::WinThreshold))
    } else if count == 1 {
        (count, Some(Milestone::FirstPickup))
    } else {
        (count, None)
    }
}

/// Running page count, saturating at the win threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    collected: u32,
    threshold: u32,
}

impl Progress {
    pub fn new(threshold: u32) -> Self {
        Self {
            collected: 0,
            threshold,
        }
    }

    /// Count one page and report the milestone it reaches
    pub fn record_pickup(&mut self) -> Option<Milestone> {
        let (count, milestone) = evaluate(self.collected.saturating_add(1), self.threshold);
        self.collected = count;
        milestone
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.threshold
    }
}
