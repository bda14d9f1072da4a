//! Built-in step sequences and the generator category registry.
//!
//! A generator is an ordered sequence of step definitions for one
//! pipeline run. The registry maps category names to constructor
//! functions explicitly, populated once at startup. Callers can extend
//! it with their own categories, including interactive
//! [`StepSource`](crate::StepSource) builders.

use std::collections::HashMap;

use crate::runner::FixedSteps;
use crate::step::{Extraction, Step, StepInput};

/// Constructor for a category's step sequence.
pub type GeneratorFn = fn() -> FixedSteps;

/// Explicit mapping from category name to step-sequence constructor.
///
/// # Example
///
/// ```rust
/// use promptgen::{FixedSteps, GeneratorRegistry, Step, StepInput};
///
/// let mut registry = GeneratorRegistry::builtin();
/// registry.register("trivial", || {
///     FixedSteps::new(vec![Step::plain(
///         "Initial",
///         vec![StepInput::text("prompt")],
///         vec!["prompt_answer".to_string()],
///     )])
/// });
///
/// assert!(registry.create("basic").is_some());
/// assert!(registry.create("trivial").is_some());
/// assert!(registry.create("unknown").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    categories: HashMap<String, GeneratorFn>,
}

impl GeneratorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in categories, `basic` and `code`.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("basic", basic_steps);
        registry.register("code", code_steps);
        registry
    }

    /// Register a category, replacing any previous constructor.
    pub fn register(&mut self, category: impl Into<String>, f: GeneratorFn) {
        self.categories.insert(category.into(), f);
    }

    /// Build the step sequence for a category, if registered.
    pub fn create(&self, category: &str) -> Option<FixedSteps> {
        self.categories.get(category).map(|f| f())
    }

    /// Registered category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn out(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// One plain step answering the prompt directly.
pub fn basic_steps() -> FixedSteps {
    FixedSteps::new(vec![Step::plain(
        "Initial",
        vec![StepInput::text("prompt")],
        out(&["prompt_answer"]),
    )])
}

/// The code-study sequence: answer, derive a script, then fan out over
/// suggested improvements, outlines, and error hunts.
pub fn code_steps() -> FixedSteps {
    const INTO_SCRIPT: &str =
        "Turn the above item into a python script with a single class and distinct functions.";

    let mut steps = vec![
        Step::plain(
            "Initial",
            vec![StepInput::text("prompt")],
            out(&["prompt_answer"]),
        ),
        Step::new(
            "Code Generation",
            vec![StepInput::text("prompt_answer"), StepInput::text(INTO_SCRIPT)],
            out(&["code_answer"]),
            Extraction::CodeMerge,
        ),
        Step::plain(
            "Examples Generation",
            vec![
                StepInput::text("code_answer"),
                StepInput::text(
                    "Give a number of useful examples that include the resulting output \
                     from the code above.",
                ),
            ],
            out(&["example_answer"]),
        ),
        Step::new(
            "Math Generation",
            vec![
                StepInput::text("prompt"),
                StepInput::text("code_answer"),
                StepInput::text(
                    "List at least 5 mathematical improvements and additions on the code \
                     above without writing any code.",
                ),
            ],
            out(&["math_questions"]),
            Extraction::ListSplit,
        ),
        Step::new(
            "Improvement Suggestions",
            vec![
                StepInput::text("prompt"),
                StepInput::text("code_answer"),
                StepInput::text("List a number of improvements to the above code."),
            ],
            out(&["improvements"]),
            Extraction::ListSplit,
        ),
        Step::new(
            "Coding Outline",
            vec![
                StepInput::text("prompt"),
                StepInput::text("code_answer"),
                StepInput::choice([
                    "List a coding outline for testing the code above.",
                    "List a coding outline for adding a frontend interface with tkinter \
                     and python to the code above.",
                    "List a coding outline for adding a frontend framework with kivy and \
                     python.",
                    "List a coding outline for adding a backend API with flask and python \
                     to the code above.",
                    "List a coding outline for adding database management with python to \
                     the code above.",
                    "List a coding outline for adding authentication with google through \
                     python to the code above.",
                    "List a coding outline for adding artificial intelligence with python \
                     to the code above.",
                ]),
            ],
            out(&[
                "coding_outline_model",
                "coding_outline_tkinter",
                "coding_outline_kivy",
                "coding_outline_flask",
                "coding_outline_db",
                "coding_outline_authentication",
                "coding_outline_ai",
            ]),
            Extraction::ListSplit,
        ),
        Step::new(
            "Error Detection",
            vec![
                StepInput::text("prompt"),
                StepInput::text("code_answer"),
                StepInput::text(
                    "List a number of errors or potential errors for the above code.",
                ),
            ],
            out(&["errors"]),
            Extraction::ListSplit,
        ),
    ];

    // Each listed answer fans back out: one conversation per item.
    for list_var in ["math_questions", "improvements", "errors"] {
        steps.push(Step::plain(
            "General Answers from Prompt Generation",
            vec![
                StepInput::text("code_answer"),
                StepInput::text("Item:"),
                StepInput::text(list_var),
                StepInput::text(INTO_SCRIPT),
            ],
            vec![],
        ));
    }
    for outline_var in [
        "coding_outline_model",
        "coding_outline_tkinter",
        "coding_outline_kivy",
        "coding_outline_flask",
        "coding_outline_db",
        "coding_outline_authentication",
        "coding_outline_ai",
    ] {
        steps.push(Step::plain(
            "Coding Outline",
            vec![
                StepInput::text("code_answer"),
                StepInput::text("Item:"),
                StepInput::text(outline_var),
                StepInput::text(INTO_SCRIPT),
            ],
            vec![],
        ));
    }

    FixedSteps::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StepSource;

    #[test]
    fn builtin_registry_has_basic_and_code() {
        let registry = GeneratorRegistry::builtin();
        assert_eq!(registry.categories(), vec!["basic", "code"]);
    }

    #[test]
    fn unknown_category_is_none() {
        assert!(GeneratorRegistry::builtin().create("unknown").is_none());
    }

    #[test]
    fn registration_replaces_and_extends() {
        let mut registry = GeneratorRegistry::builtin();
        registry.register("basic", code_steps);
        assert_eq!(
            registry.create("basic").unwrap().remaining(),
            code_steps().remaining()
        );
    }

    #[test]
    fn basic_sequence_is_one_plain_step() {
        let mut source = basic_steps();
        let step = source.next_step().unwrap().unwrap();
        assert_eq!(step.title, "Initial");
        assert_eq!(step.outputs, vec!["prompt_answer".to_string()]);
        assert!(source.next_step().unwrap().is_none());
    }

    #[test]
    fn code_sequence_wires_outline_branches_to_outputs() {
        let mut source = code_steps();
        let mut outline = None;
        while let Some(step) = source.next_step().unwrap() {
            if step.outputs.len() > 1 {
                outline = Some(step);
            }
        }
        let outline = outline.expect("the outline step binds several outputs");
        let StepInput::Choice(branches) = outline.inputs.last().unwrap() else {
            panic!("outline step ends with a branch set");
        };
        assert_eq!(branches.len(), outline.outputs.len());
    }

    #[test]
    fn code_sequence_is_ordered_and_nontrivial() {
        let source = code_steps();
        assert!(source.remaining() > 10);
        let mut source = source;
        let first = source.next_step().unwrap().unwrap();
        assert_eq!(first.title, "Initial");
    }
}
