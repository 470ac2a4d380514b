//! Builder for assembling a `Pipeline` stage by stage.

use crate::{Classifier, FeatureExtractor, Pipeline, PostProcessor, PreProcessor, Regressor};

/// Fluent construction of a [`Pipeline`].
///
/// Stages are appended in call order within each chain position; the chain
/// positions themselves always execute in the fixed order pre-processing,
/// feature extraction, predictor, post-processing.
///
/// # Example
///
/// ```
/// use kinema::prelude::*;
///
/// # fn main() -> kinema::Result<()> {
/// let pipeline = PipelineBuilder::new()
///     .pre_processor(Box::new(MovingAverageFilter::new(5, 3)?))
///     .feature_extractor(Box::new(TimeseriesWindow::new(10, 3)?))
///     .regressor(Box::new(LmsRegressor::new()))
///     .build();
///
/// assert_eq!(pipeline.num_pre_processors(), 1);
/// assert!(pipeline.has_predictor());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre_processor(mut self, stage: Box<dyn PreProcessor>) -> Self {
        self.pipeline.add_pre_processor(stage);
        self
    }

    pub fn feature_extractor(mut self, stage: Box<dyn FeatureExtractor>) -> Self {
        self.pipeline.add_feature_extractor(stage);
        self
    }

    /// Installs the classifier; replaces any previously set predictor.
    pub fn classifier(mut self, stage: Box<dyn Classifier>) -> Self {
        self.pipeline.set_classifier(stage);
        self
    }

    /// Installs the regressor; replaces any previously set predictor.
    pub fn regressor(mut self, stage: Box<dyn Regressor>) -> Self {
        self.pipeline.set_regressor(stage);
        self
    }

    pub fn post_processor(mut self, stage: Box<dyn PostProcessor>) -> Self {
        self.pipeline.add_post_processor(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}
