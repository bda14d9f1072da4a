//! # promptgen
//!
//! Composable multi-step prompting pipelines for LLM backends in Rust.
//!
//! Each step of a pipeline substitutes named variables into its inputs,
//! optionally branches them into the Cartesian product of alternative
//! phrasings, sends every resulting message to a model backend through a
//! durable response cache, post-processes the raw answers into structured
//! output, and binds the results back into named variables for later
//! steps. A run produces an immutable [`Report`] transcript.
//!
//! ## Core Concepts
//!
//! - **Step**: an immutable prompting template of inputs, outputs,
//!   instruction, and extraction policy
//! - **VariableStore**: named bindings threaded through a run
//! - **Extraction**: per-step response post-processing (plain text,
//!   list splitting, code-block merging, sentence splitting)
//! - **ResponseCache**: at-most-one-inference-per-distinct-message,
//!   across runs and restarts
//! - **ModelClient**: the opaque inference seam backends implement
//! - **StepProcessor**: one step end to end
//! - **PipelineRunner**: linear replay of a step sequence into a Report
//! - **RunContext**: shared metrics and structured event traces
//! - **GeneratorRegistry**: category name → step-sequence constructor
//!
//! ## Example: running the basic sequence
//!
//! ```rust
//! use async_trait::async_trait;
//! use promptgen::{
//!     basic_steps, ModelClient, PipelineRunner, ResponseCache, Result, StepProcessor,
//! };
//!
//! struct EchoClient;
//!
//! #[async_trait]
//! impl ModelClient for EchoClient {
//!     async fn infer(&self, message: &str, _system: &str) -> Result<String> {
//!         Ok(format!("echo: {message}"))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let processor = StepProcessor::new(EchoClient, ResponseCache::disabled());
//! let mut runner = PipelineRunner::new(processor);
//! let mut steps = basic_steps();
//!
//! let (report, metrics) = runner
//!     .run("How do I make coffee?", "basic", &mut steps)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(metrics.steps_completed, 1);
//! assert!(report.text[1].starts_with("## Initial"));
//! # });
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod events;
pub mod generator;
pub mod metrics;
pub mod model;
pub mod processor;
pub mod report;
pub mod runner;
pub mod step;
pub mod store;
pub mod task;
pub mod vars;

pub use cache::{ResponseCache, RESPONSES_COLLECTION};
pub use context::RunContext;
pub use error::{Error, Result};
pub use events::{RunEvent, TraceEntry};
pub use generator::{basic_steps, code_steps, GeneratorFn, GeneratorRegistry};
pub use metrics::RunMetrics;
pub use model::ModelClient;
pub use processor::StepProcessor;
pub use report::Report;
pub use runner::{FixedSteps, PipelineRunner, StepSource};
pub use step::{
    default_template, expand_inputs, Extraction, InputNode, Message, Step, StepInput,
};
pub use store::{JsonFileStore, KvStore, MemoryStore};
pub use task::Task;
pub use vars::{Value, VariableStore};
