//! Scratchpad: the running Thought/Action/Observation transcript of a trial.
//!
//! Append-only within a trial and cleared between trials. Each turn starts
//! on a new line with its label, optionally numbered:
//!
//! ```text
//! Thought 1: I need to search Colorado orogeny.
//! Action 1: Search[Colorado orogeny]
//! Observation 1: The Colorado orogeny was an episode of mountain building...
//! ```

use serde::{Deserialize, Serialize};

use super::token::{estimate_lines_tokens, estimate_tokens};

/// Placeholder written in place of an observation dropped to save tokens.
const TRUNCATED_OBSERVATION: &str = "[truncated wikipedia excerpt]";

/// The kind of a scratchpad turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Turn {
    Thought,
    Action,
    Observation,
}

impl Turn {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Thought => "Thought",
            Self::Action => "Action",
            Self::Observation => "Observation",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratchpad {
    text: String,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new turn: `"\n{Label} {step}: "`, or `"\n{Label}: "` when unnumbered.
    pub fn begin(&mut self, turn: Turn, step: Option<usize>) {
        match step {
            Some(i) => self.text.push_str(&format!("\n{} {i}: ", turn.label())),
            None => self.text.push_str(&format!("\n{}: ", turn.label())),
        }
    }

    /// Append text to the open turn.
    pub fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Open a turn and fill it in one go.
    pub fn record(&mut self, turn: Turn, step: Option<usize>, text: &str) {
        self.begin(turn, step);
        self.push(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }
}

impl std::fmt::Display for Scratchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Shrink a scratchpad to roughly `max_tokens` by replacing the longest
/// observations with a placeholder, largest first.
///
/// Thoughts and actions are never dropped, so the result may still exceed
/// the budget when there are no observations left to cut.
pub fn truncate_scratchpad(scratchpad: &str, max_tokens: usize) -> String {
    let mut lines: Vec<String> = scratchpad.split('\n').map(String::from).collect();

    let mut observations: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with(Turn::Observation.label()))
        .map(|(i, _)| i)
        .collect();
    // Largest last so `pop` yields the next one to cut.
    observations.sort_by_key(|&i| estimate_tokens(&lines[i]));

    while estimate_lines_tokens(&lines) > max_tokens {
        let Some(idx) = observations.pop() else {
            break;
        };
        let label = lines[idx].split(':').next().unwrap_or_default().to_string();
        lines[idx] = format!("{label}: {TRUNCATED_OBSERVATION}");
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_turns() {
        let mut pad = Scratchpad::new();
        pad.record(Turn::Thought, Some(1), "I should search.");
        pad.record(Turn::Action, Some(1), "Search[Rust]");
        pad.begin(Turn::Observation, Some(1));
        pad.push("Rust is a language.");

        assert_eq!(
            pad.as_str(),
            "\nThought 1: I should search.\nAction 1: Search[Rust]\nObservation 1: Rust is a language."
        );
    }

    #[test]
    fn unnumbered_turns() {
        let mut pad = Scratchpad::new();
        pad.record(Turn::Thought, None, "Easy.");
        pad.record(Turn::Action, None, "Finish[4]");
        assert_eq!(pad.as_str(), "\nThought: Easy.\nAction: Finish[4]");
    }

    #[test]
    fn clear_resets() {
        let mut pad = Scratchpad::new();
        pad.record(Turn::Thought, Some(1), "x");
        assert!(!pad.is_empty());
        pad.clear();
        assert!(pad.is_empty());
        assert_eq!(pad.estimated_tokens(), 0);
    }

    #[test]
    fn truncation_cuts_longest_observation_first() {
        let long = "x".repeat(400);
        let short = "y".repeat(40);
        let pad = format!(
            "\nThought 1: a\nAction 1: Search[A]\nObservation 1: {short}\nThought 2: b\nAction 2: Search[B]\nObservation 2: {long}"
        );

        let out = truncate_scratchpad(&pad, 60);
        assert!(out.contains(&format!("Observation 1: {short}")));
        assert!(out.contains("Observation 2: [truncated wikipedia excerpt]"));
        assert!(out.contains("Thought 2: b"));
    }

    #[test]
    fn truncation_noop_within_budget() {
        let pad = "\nThought 1: a\nObservation 1: short";
        assert_eq!(truncate_scratchpad(pad, 1000), pad);
    }

    #[test]
    fn truncation_stops_when_no_observations_left() {
        let pad = format!("\nThought 1: {}", "z".repeat(400));
        assert_eq!(truncate_scratchpad(&pad, 10), pad);
    }
}
