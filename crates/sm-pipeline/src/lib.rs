//! Wires the sentimacro stages together from a TOML configuration.

pub mod config;
pub mod pipeline;

pub use config::{IndicatorSource, ModelSpec, PipelineConfig, SurveySource};
pub use pipeline::{CUTOFF_FLAG, DATE_COLUMN, Inspection, ModelOutput, Pipeline, PipelineOutput};
