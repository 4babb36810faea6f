use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerStatus {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub status: SchedulerStatus,
    pub check_interval_ms: u64,
}

impl SchedulerState {
    pub fn new(check_interval_ms: u64) -> Self {
        Self {
            status: SchedulerStatus::Stopped,
            check_interval_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SchedulerStatus::Running
    }

    /// Returns false when already running.
    pub fn begin_running(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.status = SchedulerStatus::Running;
        true
    }

    /// Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = SchedulerStatus::Stopped;
        true
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            is_running: self.is_running(),
            check_interval_ms: self.check_interval_ms,
        }
    }
}

/// What `status()` reports to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSnapshot {
    pub is_running: bool,
    pub check_interval_ms: u64,
}
