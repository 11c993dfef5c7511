// src/progress.rs

//! Step reporting for orchestrated pipelines
//!
//! Installers and uninstallers run fixed step sequences. A `StepTracker`
//! receives each completed step with its detail lines and is asked before
//! the next step starts; the interactive CLI implementation turns that into
//! an operator confirmation loop, while library callers default to the
//! silent implementation.

use crate::error::Result;
use tracing::info;

/// Observer and gate for pipeline steps
pub trait StepTracker: Send + Sync {
    /// Report a completed step and its detail lines.
    fn step_completed(&self, step: &str, details: &[String]);

    /// Ask whether to proceed to the next step. Returning `false` aborts
    /// the operation; `description` explains what the step will do.
    fn confirm_next(&self, step: &str, description: &str) -> Result<bool>;
}

/// No reporting, always proceeds
#[derive(Debug, Default)]
pub struct SilentSteps;

impl SilentSteps {
    pub fn new() -> Self {
        Self
    }
}

impl StepTracker for SilentSteps {
    fn step_completed(&self, _step: &str, _details: &[String]) {}

    fn confirm_next(&self, _step: &str, _description: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Mirrors steps to the diagnostic stream, always proceeds
///
/// Used under verbose mode so every pipeline step is visible without
/// pausing the operation.
#[derive(Debug, Default)]
pub struct LogSteps;

impl LogSteps {
    pub fn new() -> Self {
        Self
    }
}

impl StepTracker for LogSteps {
    fn step_completed(&self, step: &str, details: &[String]) {
        info!("completed: {}", step);
        for detail in details {
            info!("  {}", detail);
        }
    }

    fn confirm_next(&self, _step: &str, _description: &str) -> Result<bool> {
        Ok(true)
    }
}
