// src/commands/prompt.rs
//! Interactive step confirmation
//!
//! Implements the suggest-and-confirm pattern over stdin: every completed
//! pipeline step is shown with its details, and the operator approves each
//! next step. EOF (piped input) counts as a decline.

use addonctl::{Result, StepTracker};
use std::io::{self, BufRead, Write};

/// StepTracker that pauses for operator confirmation between steps
#[derive(Debug, Default)]
pub struct InteractivePrompt;

impl InteractivePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl StepTracker for InteractivePrompt {
    fn step_completed(&self, step: &str, details: &[String]) {
        println!("\nCompleted: {}", step);
        for detail in details {
            println!("   - {}", detail);
        }
    }

    fn confirm_next(&self, step: &str, description: &str) -> Result<bool> {
        println!("\nNext step: {}", step);
        println!("   {}", description);
        print!("Proceed with this step? (y/N): ");
        io::stdout().flush()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => {
                // EOF on stdin: treat as a decline
                println!("n");
                Ok(false)
            }
            Ok(_) => {
                let response = line.trim().to_lowercase();
                Ok(response == "y" || response == "yes")
            }
            Err(e) => Err(e.into()),
        }
    }
}
