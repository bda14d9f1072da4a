//! The pipeline runner: a linear replay of a step sequence.

use std::collections::VecDeque;

use tracing::debug;

use crate::context::RunContext;
use crate::error::Result;
use crate::metrics::RunMetrics;
use crate::model::ModelClient;
use crate::processor::StepProcessor;
use crate::report::Report;
use crate::step::Step;
use crate::vars::VariableStore;

/// A resumable source of step definitions: the generator protocol.
///
/// A source is either statically fixed (see [`FixedSteps`]) or produced
/// interactively by an external collaborator that builds each step from
/// operator input until a sentinel ends the sequence. The runner simply
/// consumes whatever it is given, one step at a time.
pub trait StepSource {
    /// The next step to run, or `None` when the sequence is exhausted.
    fn next_step(&mut self) -> Result<Option<Step>>;
}

/// A fixed, pre-built step sequence.
#[derive(Debug, Clone, Default)]
pub struct FixedSteps {
    steps: VecDeque<Step>,
}

impl FixedSteps {
    /// Create a source over the given steps, replayed in order.
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Steps remaining to be served.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl From<Vec<Step>> for FixedSteps {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl StepSource for FixedSteps {
    fn next_step(&mut self) -> Result<Option<Step>> {
        Ok(self.steps.pop_front())
    }
}

/// Runs an ordered step sequence to completion, producing a [`Report`].
///
/// Execution is strictly sequential: a step's bindings are committed to
/// the variable store before the next step is pulled from the source.
/// There is no branching or looping back: the runner is Running until
/// the source is exhausted, then Done, and a finished report is returned
/// to the caller, who owns it from then on. A failing step aborts the
/// run and the partial report is discarded.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use promptgen::{
///     FixedSteps, ModelClient, PipelineRunner, ResponseCache, Result, Step, StepInput,
///     StepProcessor,
/// };
///
/// struct EchoClient;
///
/// #[async_trait]
/// impl ModelClient for EchoClient {
///     async fn infer(&self, message: &str, _system: &str) -> Result<String> {
///         Ok(format!("echo: {message}"))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let processor = StepProcessor::new(EchoClient, ResponseCache::disabled());
/// let mut runner = PipelineRunner::new(processor);
/// let mut source = FixedSteps::new(vec![Step::plain(
///     "Initial",
///     vec![StepInput::text("prompt")],
///     vec!["prompt_answer".to_string()],
/// )]);
///
/// let (report, metrics) = runner
///     .run("How do I make coffee?", "basic", &mut source)
///     .await
///     .unwrap();
///
/// assert_eq!(report.text.len(), 2); // title line + one fragment
/// assert_eq!(metrics.steps_completed, 1);
/// # });
/// ```
pub struct PipelineRunner<C> {
    processor: StepProcessor<C>,
}

impl<C: ModelClient> PipelineRunner<C> {
    /// Create a runner over a step processor.
    pub fn new(processor: StepProcessor<C>) -> Self {
        Self { processor }
    }

    /// Access the underlying processor.
    pub fn processor(&self) -> &StepProcessor<C> {
        &self.processor
    }

    /// Run the step sequence with a fresh context, returning the report
    /// along with the collected metrics.
    pub async fn run(
        &mut self,
        prompt: &str,
        category: &str,
        source: &mut dyn StepSource,
    ) -> Result<(Report, RunMetrics)> {
        let ctx = RunContext::new();
        let report = self.run_with_ctx(&ctx, prompt, category, source).await?;
        Ok((report, ctx.snapshot()))
    }

    /// Run the step sequence with a caller-provided context.
    ///
    /// Useful when sharing one context across multiple runs to accumulate
    /// metrics and traces.
    pub async fn run_with_ctx(
        &mut self,
        ctx: &RunContext,
        prompt: &str,
        category: &str,
        source: &mut dyn StepSource,
    ) -> Result<Report> {
        let mut report = Report::begin(prompt, category);
        let mut vars = VariableStore::seeded(prompt);

        while let Some(step) = source.next_step()? {
            debug!(step = %step.title, "running step");
            let fragment = self.processor.process(ctx, &step, &mut vars).await?;
            report.record(step, fragment);
            ctx.record_step();
        }

        report.finish();
        Ok(report)
    }
}
