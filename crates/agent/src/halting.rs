//! Halting and reflection policy.
//!
//! These are the pure decisions behind every loop: when a trial stops,
//! when an episode of trials stops, and when a failed trial earns a
//! reflection before the next one.

use crate::answer::normalize_answer;
use crate::reflect::ReflectStrategy;

/// Prompt size against its budget, both in estimated tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    pub prompt_tokens: usize,
    pub max_tokens: usize,
}

/// Whether a trial should stop before running step `step` (1-based).
///
/// True when the task signalled Finish, the step budget is spent, or the
/// next prompt would exceed the token budget.
pub fn halting_condition(
    finished: bool,
    step: usize,
    max_steps: usize,
    budget: Option<PromptBudget>,
) -> bool {
    finished
        || step > max_steps
        || budget.is_some_and(|b| b.prompt_tokens > b.max_tokens)
}

/// Whether to reflect on the previous trial before running trial `trial_idx` (0-based).
///
/// Only a halted, unsuccessful trial with a configured strategy earns a
/// reflection. Trial 0 has no previous trial.
pub fn reflect_condition(
    trial_idx: usize,
    strategy: Option<ReflectStrategy>,
    halted: bool,
    correct: bool,
) -> bool {
    trial_idx > 0 && strategy.is_some() && halted && !correct
}

/// Tracks an episode of trials to decide when to stop retrying.
///
/// An episode ends on a correct answer, after `max_trials` trials, or once
/// the same wrong answer (after normalisation) has come back `patience`
/// trials in a row.
#[derive(Debug, Clone)]
pub struct TrialTracker {
    max_trials: usize,
    patience: usize,
    trials: usize,
    correct: bool,
    last_answer: Option<String>,
    repeats: usize,
}

impl TrialTracker {
    pub fn new(max_trials: usize, patience: usize) -> Self {
        Self {
            max_trials,
            patience: patience.max(1),
            trials: 0,
            correct: false,
            last_answer: None,
            repeats: 0,
        }
    }

    /// Record the outcome of a finished trial.
    pub fn record(&mut self, answer: &str, correct: bool) {
        self.trials += 1;
        self.correct = correct;

        if correct {
            self.last_answer = None;
            self.repeats = 0;
            return;
        }

        let answer = normalize_answer(answer);
        if self.last_answer.as_deref() == Some(answer.as_str()) {
            self.repeats += 1;
        } else {
            self.last_answer = Some(answer);
            self.repeats = 1;
        }
    }

    /// Index of the next trial to run.
    pub fn trial_idx(&self) -> usize {
        self.trials
    }

    pub fn last_correct(&self) -> bool {
        self.correct
    }

    /// True when the last answer repeated a wrong answer `patience` times.
    pub fn out_of_patience(&self) -> bool {
        !self.correct && self.repeats >= self.patience
    }

    pub fn is_done(&self) -> bool {
        self.correct || self.trials >= self.max_trials || self.out_of_patience()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halts_past_step_budget_regardless_of_other_inputs() {
        for step in 7..20 {
            assert!(halting_condition(false, step, 6, None));
            assert!(halting_condition(
                false,
                step,
                6,
                Some(PromptBudget { prompt_tokens: 0, max_tokens: 5000 })
            ));
        }
    }

    #[test]
    fn runs_within_budget() {
        assert!(!halting_condition(false, 1, 6, None));
        assert!(!halting_condition(false, 6, 6, None));
        assert!(!halting_condition(
            false,
            3,
            6,
            Some(PromptBudget { prompt_tokens: 5000, max_tokens: 5000 })
        ));
    }

    #[test]
    fn halts_when_finished_or_over_token_budget() {
        assert!(halting_condition(true, 1, 6, None));
        assert!(halting_condition(
            false,
            2,
            6,
            Some(PromptBudget { prompt_tokens: 5001, max_tokens: 5000 })
        ));
    }

    #[test]
    fn never_reflects_on_success_or_without_strategy() {
        for idx in 0..5 {
            for halted in [true, false] {
                assert!(!reflect_condition(idx, Some(ReflectStrategy::Reflexion), halted, true));
                assert!(!reflect_condition(idx, None, halted, false));
            }
        }
    }

    #[test]
    fn reflects_after_failed_trial() {
        assert!(reflect_condition(1, Some(ReflectStrategy::LastAttempt), true, false));
        assert!(!reflect_condition(0, Some(ReflectStrategy::LastAttempt), true, false));
        assert!(!reflect_condition(1, Some(ReflectStrategy::LastAttempt), false, false));
    }

    #[test]
    fn tracker_stops_on_correct() {
        let mut t = TrialTracker::new(3, 3);
        assert!(!t.is_done());
        t.record("paris", true);
        assert!(t.is_done());
        assert!(t.last_correct());
    }

    #[test]
    fn tracker_stops_at_max_trials() {
        let mut t = TrialTracker::new(2, 2);
        t.record("a", false);
        assert!(!t.is_done());
        assert_eq!(t.trial_idx(), 1);
        t.record("b", false);
        assert!(t.is_done());
    }

    #[test]
    fn tracker_patience_counts_consecutive_repeats() {
        let mut t = TrialTracker::new(10, 2);
        t.record("a", false);
        t.record("b", false);
        assert!(!t.out_of_patience());
        t.record("b", false);
        assert!(t.out_of_patience());
        assert!(t.is_done());
    }

    #[test]
    fn tracker_patience_compares_normalised_answers() {
        let mut t = TrialTracker::new(10, 2);
        t.record("Paris.", false);
        t.record("the paris", false);
        assert!(t.out_of_patience());
    }
}
