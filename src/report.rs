//! The immutable record of a completed pipeline run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::step::Step;

/// The record of one pipeline run: what was asked, when, through which
/// steps, and the assembled transcript.
///
/// A report is created when the run starts, mutated only by its owning
/// [`PipelineRunner`](crate::PipelineRunner) as steps complete, and frozen
/// (end timestamp stamped) when the step sequence is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// The initial prompt this run answered.
    pub title: String,
    /// When the run started.
    pub start: DateTime<Utc>,
    /// When the run finished; equal to `start` until the run completes.
    pub end: DateTime<Utc>,
    /// The steps actually executed, in order.
    pub steps: Vec<Step>,
    /// Transcript fragments: the title line, then one fragment per step.
    pub text: Vec<String>,
    /// Name of the generator category that produced the step sequence.
    pub category: String,
}

impl Report {
    /// Start a report for a run, seeding the transcript with its title line.
    #[must_use]
    pub fn begin(title: impl Into<String>, category: impl Into<String>) -> Self {
        let title = title.into();
        let start = Utc::now();
        Self {
            text: vec![format!("# {title}")],
            title,
            start,
            end: start,
            steps: Vec::new(),
            category: category.into(),
        }
    }

    /// Record a completed step and its transcript fragment.
    pub fn record(&mut self, step: Step, fragment: String) {
        self.steps.push(step);
        self.text.push(fragment);
    }

    /// Stamp the end timestamp, freezing the report.
    pub fn finish(&mut self) {
        self.end = Utc::now();
    }

    /// Wall-clock duration of the run.
    pub fn elapsed(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl fmt::Display for Report {
    /// `Report(title, elapsed, category)` header, `yield`-joined step
    /// renderings, then the transcript blocks joined by blank lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed_secs = self.elapsed().num_milliseconds() as f64 / 1000.0;
        writeln!(
            f,
            "Report({}, {:.3}s, {})",
            self.title, elapsed_secs, self.category
        )?;
        writeln!(f)?;
        writeln!(f, "Prompts:")?;
        for step in &self.steps {
            writeln!(f, "yield {step}")?;
        }
        writeln!(f)?;
        writeln!(f, "Text:")?;
        write!(f, "{}", self.text.join("\n\n"))
    }
}
