//! Step processing: expansion, cache consultation, inference, extraction,
//! and output binding for one step at a time.

use std::time::Instant;

use tracing::debug;

use crate::cache::ResponseCache;
use crate::context::RunContext;
use crate::error::Result;
use crate::events::RunEvent;
use crate::model::ModelClient;
use crate::step::{expand_inputs, Step};
use crate::vars::{Value, VariableStore};

/// Processes steps against a model backend and a response cache.
///
/// Expanded messages are sent strictly one at a time, in Cartesian-product
/// order; each message consults the cache before the model, so a repeated
/// identical step costs no further inference.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use promptgen::{
///     ModelClient, ResponseCache, Result, RunContext, Step, StepInput, StepProcessor,
///     VariableStore,
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
/// let mut processor = StepProcessor::new(EchoClient, ResponseCache::disabled());
/// let step = Step::plain(
///     "Initial",
///     vec![StepInput::text("prompt")],
///     vec!["prompt_answer".to_string()],
/// );
///
/// let ctx = RunContext::new();
/// let mut vars = VariableStore::seeded("How do I make coffee?");
/// let fragment = processor.process(&ctx, &step, &mut vars).await.unwrap();
///
/// assert!(fragment.starts_with("## Initial"));
/// assert_eq!(
///     vars.resolve("prompt_answer").as_text(),
///     Some("echo: How do I make coffee?")
/// );
/// # });
/// ```
pub struct StepProcessor<C> {
    client: C,
    cache: ResponseCache,
}

impl<C: ModelClient> StepProcessor<C> {
    /// Create a processor over a model backend and a response cache.
    pub fn new(client: C, cache: ResponseCache) -> Self {
        Self { client, cache }
    }

    /// Access the model backend.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Process one step: expand its inputs, answer every message, extract,
    /// bind outputs, and return the step's text fragment.
    pub async fn process(
        &mut self,
        ctx: &RunContext,
        step: &Step,
        vars: &mut VariableStore,
    ) -> Result<String> {
        let start = Instant::now();
        let result = self.process_inner(ctx, step, vars).await;

        match &result {
            Ok(_) => {
                ctx.emit(RunEvent::StepEnd {
                    step_title: step.title.clone(),
                    duration_ms: start.elapsed().as_millis(),
                });
            }
            Err(e) => {
                ctx.record_failure(e.to_string());
                ctx.emit(RunEvent::Error {
                    step_title: step.title.clone(),
                    message: e.to_string(),
                });
            }
        }

        result
    }

    async fn process_inner(
        &mut self,
        ctx: &RunContext,
        step: &Step,
        vars: &mut VariableStore,
    ) -> Result<String> {
        let resolved = step.resolve_inputs(vars)?;
        let messages = expand_inputs(&resolved);

        ctx.emit(RunEvent::StepStart {
            step_title: step.title.clone(),
            message_count: messages.len(),
        });
        debug!(step = %step.title, messages = messages.len(), "processing step");

        let mut responses = Vec::with_capacity(messages.len());
        for message in &messages {
            let rendered = message.render();
            let response = match self.cache.lookup(&rendered)? {
                Some(cached) => {
                    ctx.record_cache_hit();
                    ctx.emit(RunEvent::CacheHit {
                        step_title: step.title.clone(),
                    });
                    debug!(step = %step.title, "found cached response");
                    cached
                }
                None => {
                    ctx.record_cache_miss();
                    ctx.emit(RunEvent::CacheMiss {
                        step_title: step.title.clone(),
                    });
                    let answer = self.client.infer(&rendered, &step.template).await?;
                    ctx.record_model_call();
                    self.cache.store(&rendered, &answer)?;
                    answer
                }
            };
            responses.push(response);
        }

        let results: Vec<Value> = responses
            .iter()
            .map(|raw| step.extraction.apply(raw))
            .collect();
        step.bind_outputs(&results, vars);

        Ok(render_fragment(step, &results))
    }
}

/// Assemble a step's transcript fragment: the `##` title line followed by
/// each flattened result as its own blank-line-separated block.
fn render_fragment(step: &Step, results: &[Value]) -> String {
    let mut blocks = vec![format!("## {}", step.title)];
    let mut flattened = Vec::new();
    for result in results {
        result.flatten_into(&mut flattened);
    }
    blocks.extend(flattened);
    blocks.join("\n\n")
}
