//! Action parsing: turn raw model text into an action type and argument.
//!
//! Two grammars:
//!
//! - **Bracket** (QA): `Search[Colorado orogeny]`
//! - **Fenced** (Math/Code): a keyword followed by a python block
//!
//! ````text
//! Calculate
//! ```python
//! answer = 3 * 4
//! ```
//! ````
//!
//! Anything that does not match yields an empty action, which the loop
//! reports back to the model as an invalid action.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::benchmark::TaskFamily;

const PYTHON_FENCE: &str = "```python";

/// A parsed action. Both fields are empty when parsing failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: String,
    pub query: String,
}

impl Action {
    pub fn new(action_type: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            query: query.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action_type.is_empty()
    }
}

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\[(.+)\]$").expect("bracket action regex"))
}

fn fenced_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```python\n(.*?)```").expect("fenced code regex"))
}

fn search_query_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"> Search Query: (.*)").expect("search query regex"))
}

fn revised_answer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)most possible answer:\s*(.*)").expect("revised answer regex"))
}

/// Parse `Type[argument]` from the trimmed text.
pub fn parse_bracket_action(text: &str) -> Action {
    bracket_regex()
        .captures(text.trim())
        .map(|caps| Action::new(&caps[1], &caps[2]))
        .unwrap_or_default()
}

/// Parse a keyword plus fenced python block.
///
/// The keyword is looked for, case-insensitively, only in the text before
/// the first fence, and is normalised to its capitalised form. The argument
/// is the body of the first python block, trimmed.
pub fn parse_fenced_action(text: &str, keywords: &[&str]) -> Action {
    let head = text.split(PYTHON_FENCE).next().unwrap_or_default();

    let Some(action_type) = first_keyword(head, keywords) else {
        return Action::default();
    };
    let Some(code) = first_python_block(text) else {
        return Action::default();
    };

    Action::new(action_type, code)
}

/// Parse an action with the grammar of `family`.
pub fn parse_action(family: TaskFamily, text: &str) -> Action {
    if family.uses_code() {
        parse_fenced_action(text, family.actions())
    } else {
        parse_bracket_action(text)
    }
}

/// The earliest whole-word occurrence of any keyword, capitalised.
fn first_keyword(text: &str, keywords: &[&str]) -> Option<String> {
    let escaped: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    let re = Regex::new(&format!(r"(?i)\b({})\b", escaped.join("|"))).ok()?;
    re.find(text).map(|m| capitalize(m.as_str()))
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Body of the first fenced python block, trimmed.
pub fn first_python_block(text: &str) -> Option<String> {
    fenced_code_regex()
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Clean a thought completion: single line, cut at the first "Action".
pub fn clean_thought(output: &str) -> String {
    let flat = output.replace('\n', "");
    flat.split("Action").next().unwrap_or_default().trim().to_string()
}

/// Clean an action completion: cut at the first "Observation".
pub fn clean_action(output: &str) -> String {
    output
        .split("Observation")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// `> Search Query: <q>` in a critique.
pub fn parse_search_query(critique: &str) -> Option<String> {
    search_query_regex()
        .captures(critique)
        .map(|caps| caps[1].trim().trim_matches('"').to_string())
        .filter(|q| !q.is_empty())
}

/// `most possible answer: <a>` in a critique. The last occurrence wins.
pub fn parse_revised_answer(critique: &str) -> Option<String> {
    revised_answer_regex()
        .captures_iter(critique)
        .last()
        .map(|caps| caps[1].trim().trim_end_matches('.').to_string())
        .filter(|a| !a.is_empty())
}

/// A Math/Code critique that judges the current solution correct.
pub fn critique_accepts(critique: &str) -> bool {
    critique.to_lowercase().contains("it is correct")
}
