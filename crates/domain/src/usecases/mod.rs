//! Application use cases / business logic

pub mod classify;
pub mod notify;
pub mod pipeline;
pub mod render;

pub use classify::KeywordClassifier;
pub use notify::{Notifier, NotifierConfig};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError};
pub use render::{MessageParts, RenderConfig, Renderer};
