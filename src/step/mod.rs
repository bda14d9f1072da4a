//! Step definitions: the unit of work in a pipeline.
//!
//! A [`Step`] is an immutable template: named inputs (literals, variable
//! references, or branch sets), output variable names, a system-level
//! instruction for the model, and an [`Extraction`] policy for the raw
//! response. Steps carry no execution state; the
//! [`StepProcessor`](crate::StepProcessor) runs them.

use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vars::{Value, VariableStore};

pub mod expand;
pub mod extract;

pub use expand::{expand_inputs, InputNode, Message};
pub use extract::Extraction;

/// Default instruction for plain steps.
pub const PLAIN_TEMPLATE: &str = "Respond as an expert teacher would for the material at hand. \
    Mainly, assume your work will be integrated in a larger one, so do not use intros and \
    conclusions, use plenty of headers (`###`) to split each topic, and (most importantly) \
    make sure to follow the prompt's categorization if provided. If you see any code, show a \
    variety of examples regarding that code. If you see a lesson transcript/documentation, \
    reformat the text while correcting any transcribing errors for the purpose of studying.";

/// Default instruction for list-extracting steps.
pub const LIST_TEMPLATE: &str = "Respond as an expert Engineer would for the material at hand. \
    Mainly, assume your work will be integrated in a larger one, so do not use intros and \
    conclusions, use only one header (`###`), and (most importantly) make sure to use only \
    one list with either numbers or bullets for your entire response. Be as thorough as \
    possible.";

/// Default instruction for code-merging steps.
pub const CODE_TEMPLATE: &str = "Respond as an expert Software Engineer would for the material \
    at hand. Mainly, assume your work will be integrated in a larger one, so plan out your \
    work, do not use intros and conclusions, use a header (`###`), and (most importantly) \
    make sure your code is following the points in the prompt and only in one place. Be as \
    thorough as possible.";

/// One top-level entry in a step's `inputs`.
///
/// A plain string asserts a single choice (a literal or a variable
/// reference); a list is a branch set of alternatives, one Cartesian
/// product axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepInput {
    /// A literal or variable-reference string.
    Text(String),
    /// A branch set of alternative strings.
    Choice(Vec<String>),
}

impl StepInput {
    /// A single literal or variable reference.
    pub fn text(s: impl Into<String>) -> Self {
        StepInput::Text(s.into())
    }

    /// A branch set of alternatives.
    pub fn choice<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StepInput::Choice(items.into_iter().map(Into::into).collect())
    }

    /// Convert a loosely typed JSON value into a step input.
    ///
    /// Accepts a string or an array of strings; anything else (numbers,
    /// objects, arrays nested past one level) fails fast with
    /// [`Error::Expansion`] rather than being silently misread.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(StepInput::Text(s.clone())),
            serde_json::Value::Array(items) => {
                let mut choices = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(s) => choices.push(s.clone()),
                        other => {
                            return Err(Error::Expansion(format!(
                                "branch sets may only contain strings, found: {other}"
                            )))
                        }
                    }
                }
                Ok(StepInput::Choice(choices))
            }
            other => Err(Error::Expansion(format!(
                "step inputs must be strings or arrays of strings, found: {other}"
            ))),
        }
    }
}

impl From<&str> for StepInput {
    fn from(s: &str) -> Self {
        StepInput::Text(s.to_string())
    }
}

impl From<String> for StepInput {
    fn from(s: String) -> Self {
        StepInput::Text(s)
    }
}

impl From<Vec<&str>> for StepInput {
    fn from(items: Vec<&str>) -> Self {
        StepInput::choice(items)
    }
}

impl From<Vec<String>> for StepInput {
    fn from(items: Vec<String>) -> Self {
        StepInput::Choice(items)
    }
}

/// An immutable prompting-step template.
///
/// # Example
///
/// ```rust
/// use promptgen::{Extraction, Step, StepInput};
///
/// let step = Step::new(
///     "Improvement Suggestions",
///     vec![
///         StepInput::text("prompt"),
///         StepInput::text("List a number of improvements to the above code."),
///     ],
///     vec!["improvements".to_string()],
///     Extraction::ListSplit,
/// );
/// assert!(step.template.contains("one list"));
/// assert_eq!(
///     step.to_string().split('(').next().unwrap(),
///     "ListStep"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Human-readable step title; becomes the `##` heading of its fragment.
    pub title: String,
    /// Ordered input entries; each is one Cartesian product axis.
    pub inputs: Vec<StepInput>,
    /// Variable names the processed results bind to.
    pub outputs: Vec<String>,
    /// System-level instruction handed to the model with every message.
    pub template: String,
    /// Post-processing policy for raw responses.
    pub extraction: Extraction,
    /// When set, a resolved input naming an existing file is replaced by
    /// that file's contents.
    #[serde(default)]
    pub file_inputs: bool,
}

impl Step {
    /// Create a step with the default template for its extraction kind.
    pub fn new(
        title: impl Into<String>,
        inputs: Vec<StepInput>,
        outputs: Vec<String>,
        extraction: Extraction,
    ) -> Self {
        Self {
            title: title.into(),
            inputs,
            outputs,
            template: default_template(extraction).to_string(),
            extraction,
            file_inputs: false,
        }
    }

    /// A plain step binding one answer to one variable.
    pub fn plain(
        title: impl Into<String>,
        inputs: Vec<StepInput>,
        outputs: Vec<String>,
    ) -> Self {
        Self::new(title, inputs, outputs, Extraction::Plain)
    }

    /// Replace the default instruction template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Enable file-content substitution for resolved inputs.
    #[must_use]
    pub fn with_file_inputs(mut self, file_inputs: bool) -> Self {
        self.file_inputs = file_inputs;
        self
    }

    /// Resolve this step's inputs against the variable store.
    ///
    /// Each string is replaced by its binding when one exists, or used
    /// verbatim otherwise. A list binding substitutes as a nested list,
    /// which normalization later collapses into the owning choice set.
    pub fn resolve_inputs(&self, vars: &VariableStore) -> Result<Vec<InputNode>> {
        let mut resolved = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            match input {
                StepInput::Text(s) => resolved.push(self.resolve_one(s, vars)?),
                StepInput::Choice(items) => {
                    let mut children = Vec::with_capacity(items.len());
                    for item in items {
                        children.push(self.resolve_one(item, vars)?);
                    }
                    resolved.push(InputNode::List(children));
                }
            }
        }
        Ok(resolved)
    }

    fn resolve_one(&self, text: &str, vars: &VariableStore) -> Result<InputNode> {
        let node = match vars.resolve(text) {
            Value::Text(s) => InputNode::Leaf(self.maybe_read_file(s)?),
            Value::List(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    children.push(InputNode::Leaf(self.maybe_read_file(item)?));
                }
                InputNode::List(children)
            }
        };
        Ok(node)
    }

    fn maybe_read_file(&self, text: String) -> Result<String> {
        if self.file_inputs && fs::metadata(&text).map(|m| m.is_file()).unwrap_or(false) {
            return fs::read_to_string(&text).map_err(|e| {
                Error::Expansion(format!("unreadable input file '{text}': {e}"))
            });
        }
        Ok(text)
    }

    /// Bind processed results into the variable store per `outputs`.
    ///
    /// One output name keeps only the first result. Several output names
    /// zip positionally with the results; the shorter side truncates the
    /// binding without a diagnostic; cardinality is the step author's
    /// responsibility.
    pub fn bind_outputs(&self, results: &[Value], vars: &mut VariableStore) {
        if self.outputs.len() == 1 {
            if let Some(first) = results.first() {
                vars.bind(self.outputs[0].clone(), first.clone());
            }
        } else {
            for (name, result) in self.outputs.iter().zip(results.iter()) {
                vars.bind(name.clone(), result.clone());
            }
        }
    }

    /// The kind name used in the canonical textual form.
    pub fn kind(&self) -> &'static str {
        match self.extraction {
            Extraction::Plain => "Step",
            Extraction::ListSplit => "ListStep",
            Extraction::CodeMerge => "CodeStep",
            Extraction::SentenceSplit => "SentenceStep",
        }
    }
}

/// The default instruction template for an extraction kind.
pub fn default_template(extraction: Extraction) -> &'static str {
    match extraction {
        Extraction::Plain | Extraction::SentenceSplit => PLAIN_TEMPLATE,
        Extraction::ListSplit => LIST_TEMPLATE,
        Extraction::CodeMerge => CODE_TEMPLATE,
    }
}

fn write_quoted_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    write!(f, "[")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "'{item}'")?;
    }
    write!(f, "]")
}

impl fmt::Display for Step {
    /// Canonical transcript form: `Kind('title', inputs, outputs, 'template')`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}', [", self.kind(), self.title)?;
        for (idx, input) in self.inputs.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            match input {
                StepInput::Text(s) => write!(f, "'{s}'")?,
                StepInput::Choice(items) => write_quoted_list(f, items)?,
            }
        }
        write!(f, "], ")?;
        write_quoted_list(f, &self.outputs)?;
        write!(f, ", '{}')", self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_templates_follow_extraction_kind() {
        let plain = Step::plain("a", vec![], vec![]);
        let list = Step::new("b", vec![], vec![], Extraction::ListSplit);
        let code = Step::new("c", vec![], vec![], Extraction::CodeMerge);
        assert_eq!(plain.template, PLAIN_TEMPLATE);
        assert_eq!(list.template, LIST_TEMPLATE);
        assert_eq!(code.template, CODE_TEMPLATE);
    }

    #[test]
    fn display_uses_kind_and_field_order() {
        let step = Step::new(
            "Initial",
            vec![StepInput::text("prompt")],
            outputs(&["prompt_answer"]),
            Extraction::Plain,
        )
        .with_template("t");
        assert_eq!(
            step.to_string(),
            "Step('Initial', ['prompt'], ['prompt_answer'], 't')"
        );

        let step = Step::new(
            "Outline",
            vec![
                StepInput::text("prompt"),
                StepInput::choice(["a", "b"]),
            ],
            outputs(&["x", "y"]),
            Extraction::ListSplit,
        )
        .with_template("t");
        assert_eq!(
            step.to_string(),
            "ListStep('Outline', ['prompt', ['a', 'b']], ['x', 'y'], 't')"
        );
    }

    #[test]
    fn single_output_keeps_only_first_result() {
        let step = Step::plain("a", vec![], outputs(&["answer"]));
        let mut vars = VariableStore::new();
        step.bind_outputs(
            &[
                Value::from("kept"),
                Value::from("discarded"),
                Value::from("discarded too"),
            ],
            &mut vars,
        );
        assert_eq!(vars.resolve("answer"), Value::Text("kept".to_string()));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn multiple_outputs_zip_positionally() {
        let step = Step::plain("a", vec![], outputs(&["x", "y", "z"]));
        let mut vars = VariableStore::new();
        step.bind_outputs(&[Value::from("1"), Value::from("2"), Value::from("3")], &mut vars);
        assert_eq!(vars.resolve("x"), Value::Text("1".to_string()));
        assert_eq!(vars.resolve("y"), Value::Text("2".to_string()));
        assert_eq!(vars.resolve("z"), Value::Text("3".to_string()));
    }

    #[test]
    fn output_zip_truncates_on_shorter_results() {
        let step = Step::plain("a", vec![], outputs(&["x", "y"]));
        let mut vars = VariableStore::new();
        step.bind_outputs(&[Value::from("only")], &mut vars);
        assert_eq!(vars.resolve("x"), Value::Text("only".to_string()));
        assert!(vars.get("y").is_none());
    }

    #[test]
    fn empty_results_bind_nothing() {
        let step = Step::plain("a", vec![], outputs(&["x"]));
        let mut vars = VariableStore::new();
        step.bind_outputs(&[], &mut vars);
        assert!(vars.get("x").is_none());
    }

    #[test]
    fn resolution_substitutes_bindings_and_passes_literals() {
        let step = Step::plain(
            "a",
            vec![
                StepInput::text("prompt"),
                StepInput::text("Answer briefly."),
                StepInput::choice(["prompt", "alternative"]),
            ],
            vec![],
        );
        let vars = VariableStore::seeded("the question");
        let resolved = step.resolve_inputs(&vars).unwrap();
        assert_eq!(
            resolved,
            vec![
                InputNode::Leaf("the question".to_string()),
                InputNode::Leaf("Answer briefly.".to_string()),
                InputNode::List(vec![
                    InputNode::Leaf("the question".to_string()),
                    InputNode::Leaf("alternative".to_string()),
                ]),
            ]
        );
    }

    #[test]
    fn list_bindings_resolve_to_nested_lists() {
        let step = Step::plain(
            "a",
            vec![StepInput::text("items"), StepInput::choice(["x", "items"])],
            vec![],
        );
        let mut vars = VariableStore::new();
        vars.bind("items", Value::List(vec!["1".to_string(), "2".to_string()]));
        let resolved = step.resolve_inputs(&vars).unwrap();
        assert_eq!(
            resolved,
            vec![
                InputNode::List(vec![
                    InputNode::Leaf("1".to_string()),
                    InputNode::Leaf("2".to_string()),
                ]),
                InputNode::List(vec![
                    InputNode::Leaf("x".to_string()),
                    InputNode::List(vec![
                        InputNode::Leaf("1".to_string()),
                        InputNode::Leaf("2".to_string()),
                    ]),
                ]),
            ]
        );
    }

    #[test]
    fn file_inputs_substitute_file_contents() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "file body").unwrap();

        let step = Step::plain(
            "a",
            vec![StepInput::text(path.to_string_lossy().to_string())],
            vec![],
        )
        .with_file_inputs(true);
        let resolved = step.resolve_inputs(&VariableStore::new()).unwrap();
        assert_eq!(resolved, vec![InputNode::Leaf("file body".to_string())]);

        // Without the flag the path stays literal text.
        let step = step.with_file_inputs(false);
        let resolved = step.resolve_inputs(&VariableStore::new()).unwrap();
        assert_eq!(
            resolved,
            vec![InputNode::Leaf(path.to_string_lossy().to_string())]
        );
    }

    #[test]
    fn steps_never_share_input_storage() {
        // Two steps built from the same literals own distinct containers;
        // mutating one cannot alias into the other.
        let mut first = Step::plain("a", vec![StepInput::text("prompt")], vec![]);
        let second = Step::plain("a", vec![StepInput::text("prompt")], vec![]);
        first.inputs.push(StepInput::text("extra"));
        assert_eq!(second.inputs.len(), 1);
    }

    #[test]
    fn from_json_accepts_strings_and_string_arrays() {
        let text = StepInput::from_json(&serde_json::json!("prompt")).unwrap();
        assert_eq!(text, StepInput::text("prompt"));

        let choice = StepInput::from_json(&serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(choice, StepInput::choice(["a", "b"]));
    }

    #[test]
    fn from_json_rejects_unrecognized_shapes() {
        let err = StepInput::from_json(&serde_json::json!(42)).unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));

        let err = StepInput::from_json(&serde_json::json!([["nested"]])).unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));
    }

    #[test]
    fn step_serde_round_trip() {
        let step = Step::new(
            "Outline",
            vec![StepInput::text("prompt"), StepInput::choice(["a", "b"])],
            outputs(&["outline"]),
            Extraction::ListSplit,
        );
        let json = serde_json::to_string(&step).unwrap();
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
