//! Prompt templates.
//!
//! The loops only depend on the turn labels
//! ("Thought", "Action", "Observation") and the action grammar. Few-shot
//! examples are supplied by the caller, usually from files named in the
//! `[prompts]` config section.

use crate::benchmark::TaskFamily;

fn action_list(family: TaskFamily) -> &'static str {
    match family {
        TaskFamily::Qa => {
            "(1) Search[entity], which searches the exact entity and returns the first paragraph if it exists. If not, it will return some similar entities to search.\n\
             (2) Lookup[keyword], which returns the next sentence containing keyword in the last passage successfully found by Search.\n\
             (3) Finish[answer], which returns the answer and finishes the task."
        }
        TaskFamily::Math => {
            "(1) Calculate, followed by a ```python block that computes and assigns `answer`. The code is executed and its status and output are returned.\n\
             (2) Finish, followed by a ```python block with the final solution code, which finishes the task."
        }
        TaskFamily::Code => {
            "(1) Implement, followed by a ```python block with an implementation. The code is executed and its status is returned.\n\
             (2) Test, followed by a ```python block of tests, which run against the latest implementation.\n\
             (3) Finish, followed by a ```python block with the final implementation, which finishes the task."
        }
    }
}

fn examples_block(examples: &str) -> String {
    if examples.trim().is_empty() {
        String::new()
    } else {
        format!("Here are some examples:\n{}\n(END OF EXAMPLES)\n", examples.trim_end())
    }
}

/// Prompt for one ReAct turn. `reflections` is empty outside Reflexion.
pub fn react_prompt(
    family: TaskFamily,
    question: &str,
    examples: &str,
    reflections: &str,
    scratchpad: &str,
) -> String {
    format!(
        "Solve a task with interleaving Thought, Action, Observation steps. \
         Thought can reason about the current situation, and Action can be {} types:\n{}\n\
         You may take as many steps as necessary.\n{}{}Question: {question}{scratchpad}",
        family.actions().len(),
        action_list(family),
        examples_block(examples),
        reflections_block(reflections),
    )
}

/// Prompt for a Reflexion-CoT trial: one thought, then Finish.
pub fn cot_prompt(
    family: TaskFamily,
    question: &str,
    examples: &str,
    reflections: &str,
    scratchpad: &str,
) -> String {
    let finish = if family.uses_code() {
        "Action must be Finish, followed by a ```python block with your solution."
    } else {
        "Action must be Finish[answer], which returns the answer and finishes the task."
    };
    format!(
        "Solve a task by having a Thought, then Finish with your answer. \
         Thought can reason about the current situation. {finish}\n{}{}Question: {question}{scratchpad}",
        examples_block(examples),
        reflections_block(reflections),
    )
}

/// Prompt asking for a self-reflection on a failed trial.
pub fn reflect_prompt(question: &str, examples: &str, scratchpad: &str) -> String {
    format!(
        "You are an advanced reasoning agent that can improve based on self reflection. \
         You will be given a previous reasoning trial in which you were given a question to answer. \
         You were unsuccessful in answering the question either because you guessed the wrong answer \
         or you used up your set number of reasoning steps. In a few sentences, diagnose a possible \
         reason for failure and devise a new, concise, high level plan that aims to mitigate the same \
         failure. Use complete sentences.\n{}Previous trial:\nQuestion: {question}{scratchpad}\n\nReflection:",
        examples_block(examples),
    )
}

/// Prompt for CRITIC's initial answer.
pub fn critic_init_prompt(family: TaskFamily, question: &str, examples: &str) -> String {
    let instruction = if family.uses_code() {
        "Answer with a ```python block."
    } else {
        "Answer with a short phrase."
    };
    format!("{}{instruction}\nQuestion: {question}\nAnswer:", examples_block(examples))
}

/// Prompt for one CRITIC critique round.
///
/// `context` is the critique so far, including any evidence or execution
/// results gathered by tools.
pub fn critic_prompt(
    family: TaskFamily,
    question: &str,
    answer: &str,
    examples: &str,
    context: &str,
) -> String {
    match family {
        TaskFamily::Qa => format!(
            "{}Question: {question}\nProposed Answer: {answer}\n\n\
             What's the problem with the above answer? Check its plausibility and truthfulness. \
             To verify a claim, write `> Search Query: <query>` and wait for the evidence. \
             Conclude with `most possible answer: <answer>`.\n{context}",
            examples_block(examples),
        ),
        TaskFamily::Math | TaskFamily::Code => format!(
            "{}Question: {question}\n```python\n{answer}\n```\n{context}\n\
             What's the problem with the above code? If it is correct, say \"it is correct\". \
             Otherwise explain the problem and give a better solution in a ```python block.\n",
            examples_block(examples),
        ),
    }
}

fn reflections_block(reflections: &str) -> String {
    if reflections.trim().is_empty() {
        String::new()
    } else {
        format!("{}\n", reflections.trim_end())
    }
}
