//! # Kinema - Real-time Gesture Recognition Pipeline
//!
//! Streaming samples flow through an ordered chain of interchangeable
//! stages: pre-processing, feature extraction, prediction, and
//! post-processing. Every stage satisfies the same capability set (init,
//! process, reset, clone, save/load settings), so the pipeline drives them
//! identically regardless of concrete type, and a registry of
//! name-to-constructor entries rebuilds saved pipelines without the loader
//! naming concrete types.
//!
//! ## Architecture
//!
//! Kinema is an umbrella crate that coordinates:
//! - **kinema-core** - Kernel (stage traits, module registry, circular
//!   buffer, pipeline orchestration)
//! - **kinema-stages** - Built-in stages (moving-average filter,
//!   timeseries window, class-label change filter)
//! - **kinema-neural** - Neural modules (feed-forward neuron, LMS
//!   regression)
//!
//! ## Quick Start
//!
//! ```
//! use kinema::prelude::*;
//!
//! # fn main() -> kinema::Result<()> {
//! let mut pipeline = PipelineBuilder::new()
//!     .feature_extractor(Box::new(TimeseriesWindow::new(3, 1)?))
//!     .regressor(Box::new(LmsRegressor::new()))
//!     .build();
//!
//! // Train on windows of a slowly rising scalar stream
//! let data: Vec<(Sample, Vec<f64>)> = (0..20)
//!     .map(|i| (vec![i as f64 * 0.01], vec![i as f64 * 0.01]))
//!     .collect();
//! pipeline.train_regressor(&data)?;
//!
//! let output = pipeline.predict(&[0.05])?;
//! assert!(output.as_values().is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Built-in stages and neural modules
//! - `stages` - Built-in processing stages
//! - `neural` - Neuron unit and LMS regression

/// Re-export of kinema-core for direct access
pub use kinema_core as core;

pub use kinema_core::{
    check_dimensions,
    settings,
    // Buffering
    CircularBuffer,
    Classifier,
    // Error
    Error,
    FeatureExtractor,
    // Stage traits
    Module,
    // Registry
    ModuleRegistry,
    // Orchestration
    Pipeline,
    PostProcessor,
    Prediction,
    PreProcessor,
    Regressor,
    Result,
    Sample,
};

// Built-in stages
#[cfg(feature = "stages")]
pub use kinema_stages as stages;

#[cfg(feature = "stages")]
pub use kinema_stages::{
    register_builtin_stages, ClassLabelChangeFilter, MovingAverageFilter, TimeseriesWindow,
};

// Neural modules
#[cfg(feature = "neural")]
pub use kinema_neural as neural;

#[cfg(feature = "neural")]
pub use kinema_neural::{register_neural_modules, Activation, LmsRegressor, Neuron};

mod builder;
pub use builder::PipelineBuilder;

/// Creates a registry pre-populated with every module the enabled features
/// provide.
pub fn default_registry() -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    #[cfg(feature = "stages")]
    register_builtin_stages(&registry);
    #[cfg(feature = "neural")]
    register_neural_modules(&registry);
    registry
}

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{PipelineBuilder, default_registry};

    // Essential types
    pub use crate::core::{
        Classifier, Error, FeatureExtractor, Module, ModuleRegistry, Pipeline, PostProcessor,
        Prediction, PreProcessor, Regressor, Result, Sample,
    };

    // Built-in stages
    #[cfg(feature = "stages")]
    pub use crate::stages::{ClassLabelChangeFilter, MovingAverageFilter, TimeseriesWindow};

    // Neural modules
    #[cfg(feature = "neural")]
    pub use crate::neural::{Activation, LmsRegressor, Neuron};
}
