// In app/src/operator.rs

use engine::{EntryPrompt, OperatorGate};
use std::io::BufRead;

/// Asks the operator on the terminal.
///
/// Blocks the calling worker thread while waiting for a line, so it must run
/// on the multi-threaded runtime.
pub struct StdinGate;

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

impl OperatorGate for StdinGate {
    fn confirm(&mut self, prompt: &EntryPrompt<'_>) -> String {
        let snapshot = prompt.snapshot;
        println!(
            "For {}: price is {}, primary MA is {}, secondary MA is {}.",
            prompt.symbol,
            show(snapshot.price),
            show(snapshot.averages.primary),
            show(snapshot.averages.secondary),
        );
        println!(
            "Entry rule says {:?} with {} available.",
            prompt.signal, prompt.capital
        );
        println!("Would you like to buy {}?", prompt.symbol);
        println!("Type yes, no, or continue:");

        let mut line = String::new();
        let read = tokio::task::block_in_place(|| std::io::stdin().lock().read_line(&mut line));
        if let Err(e) = read {
            tracing::error!(id = %prompt.strategy_id, error = %e, "Could not read the confirmation.");
        }
        line
    }
}
