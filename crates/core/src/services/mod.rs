pub mod pipeline;

pub use pipeline::{load_frontend_input, GraphPipeline, PipelineError, RenderOutcome};
