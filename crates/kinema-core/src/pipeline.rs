//! Pipeline orchestration.
//!
//! A pipeline owns an ordered chain of heterogeneous stages and drives each
//! one identically through the family traits: pre-processing, feature
//! extraction, prediction, post-processing. Execution is single-threaded
//! and synchronous; one sample is in flight at a time.

use std::io::{BufRead, Write};

use crate::module::{Classifier, FeatureExtractor, PostProcessor, PreProcessor, Regressor};
use crate::registry::ModuleRegistry;
use crate::{settings, Error, Result, Sample};

/// Output of a prediction pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Class label from a classifier.
    Label(u64),
    /// Continuous output from a regressor.
    Values(Vec<f64>),
}

impl Prediction {
    pub fn as_label(&self) -> Option<u64> {
        match self {
            Self::Label(label) => Some(*label),
            Self::Values(_) => None,
        }
    }

    pub fn as_values(&self) -> Option<&[f64]> {
        match self {
            Self::Label(_) => None,
            Self::Values(values) => Some(values),
        }
    }

    /// Vector form handed to post-processing stages: a label becomes a
    /// 1-element vector.
    pub fn to_vector(&self) -> Vec<f64> {
        match self {
            Self::Label(label) => vec![*label as f64],
            Self::Values(values) => values.clone(),
        }
    }
}

#[derive(Clone)]
enum PredictorStage {
    Classifier(Box<dyn Classifier>),
    Regressor(Box<dyn Regressor>),
}

impl PredictorStage {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Classifier(stage) => stage.type_name(),
            Self::Regressor(stage) => stage.type_name(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Classifier(_) => "classifier",
            Self::Regressor(_) => "regressor",
        }
    }

    fn is_trained(&self) -> bool {
        match self {
            Self::Classifier(stage) => stage.is_trained(),
            Self::Regressor(stage) => stage.is_trained(),
        }
    }
}

/// Ordered chain of owned stages with trained/untrained state.
///
/// Stage order is fixed: pre-processing, feature extraction, predictor,
/// post-processing. The pipeline owns every stage exclusively; cloning
/// deep-copies each stage through its own clone contract.
#[derive(Clone, Default)]
pub struct Pipeline {
    pre_processors: Vec<Box<dyn PreProcessor>>,
    feature_extractors: Vec<Box<dyn FeatureExtractor>>,
    predictor: Option<PredictorStage>,
    post_processors: Vec<Box<dyn PostProcessor>>,
    trained: bool,
    last_prediction: Option<Prediction>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pre-processing stage, taking ownership.
    pub fn add_pre_processor(&mut self, stage: Box<dyn PreProcessor>) {
        self.pre_processors.push(stage);
    }

    /// Appends a feature-extraction stage, taking ownership.
    pub fn add_feature_extractor(&mut self, stage: Box<dyn FeatureExtractor>) {
        self.feature_extractors.push(stage);
    }

    /// Installs the classifier, dropping any previous predictor. The
    /// trained flag follows the incoming stage.
    pub fn set_classifier(&mut self, stage: Box<dyn Classifier>) {
        self.trained = stage.is_trained();
        self.predictor = Some(PredictorStage::Classifier(stage));
        self.last_prediction = None;
    }

    /// Installs the regressor, dropping any previous predictor.
    pub fn set_regressor(&mut self, stage: Box<dyn Regressor>) {
        self.trained = stage.is_trained();
        self.predictor = Some(PredictorStage::Regressor(stage));
        self.last_prediction = None;
    }

    /// Appends a post-processing stage, taking ownership.
    pub fn add_post_processor(&mut self, stage: Box<dyn PostProcessor>) {
        self.post_processors.push(stage);
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn num_pre_processors(&self) -> usize {
        self.pre_processors.len()
    }

    pub fn num_feature_extractors(&self) -> usize {
        self.feature_extractors.len()
    }

    pub fn num_post_processors(&self) -> usize {
        self.post_processors.len()
    }

    /// Most recent prediction, if any.
    pub fn last_prediction(&self) -> Option<&Prediction> {
        self.last_prediction.as_ref()
    }

    /// Threads one sample through the chain and returns the final output.
    ///
    /// Fails with [`Error::NotTrained`] before a successful train call, and
    /// surfaces the first failing stage's error without touching later
    /// stages. A `NotTrained` failure leaves every stage's history
    /// untouched.
    pub fn predict(&mut self, sample: &[f64]) -> Result<Prediction> {
        if self.predictor.is_none() {
            return Err(Error::InvalidConfiguration(
                "pipeline has no predictor stage".to_string(),
            ));
        }
        if !self.trained {
            return Err(Error::NotTrained);
        }

        let features = self.transform(sample)?;

        let predictor = match self.predictor.as_mut() {
            Some(predictor) => predictor,
            None => return Err(Error::NotTrained),
        };
        let prediction = match predictor {
            PredictorStage::Classifier(stage) => Prediction::Label(stage.predict(&features)?),
            PredictorStage::Regressor(stage) => Prediction::Values(stage.predict(&features)?),
        };

        let mut post = prediction.to_vector();
        for stage in &mut self.post_processors {
            post = stage.process(&post)?;
        }

        let output = match &prediction {
            Prediction::Label(_) => {
                let label = post.first().copied().ok_or(Error::DimensionMismatch {
                    expected: 1,
                    actual: 0,
                })?;
                Prediction::Label(label as u64)
            }
            Prediction::Values(_) => Prediction::Values(post),
        };

        self.last_prediction = Some(output.clone());
        Ok(output)
    }

    /// Trains the classifier stage on `data`, threading every input through
    /// the pre-processing and feature-extraction stages first.
    ///
    /// Transform stages are reset before and after training so streaming
    /// history from training does not leak into prediction.
    pub fn train_classifier(&mut self, data: &[(Sample, u64)]) -> Result<()> {
        if !matches!(self.predictor, Some(PredictorStage::Classifier(_))) {
            return Err(Error::InvalidConfiguration(
                "pipeline has no classifier stage".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(Error::InvalidConfiguration(
                "training set is empty".to_string(),
            ));
        }

        self.trained = false;
        self.reset_transform_stages()?;
        let mut transformed = Vec::with_capacity(data.len());
        for (input, label) in data {
            transformed.push((self.transform(input)?, *label));
        }

        if let Some(PredictorStage::Classifier(stage)) = self.predictor.as_mut() {
            stage.train(&transformed)?;
        }

        self.reset_transform_stages()?;
        self.trained = true;
        tracing::debug!(examples = data.len(), "classifier trained");
        Ok(())
    }

    /// Trains the regressor stage on `data`; see
    /// [`Pipeline::train_classifier`] for the transform-stage handling.
    pub fn train_regressor(&mut self, data: &[(Sample, Vec<f64>)]) -> Result<()> {
        if !matches!(self.predictor, Some(PredictorStage::Regressor(_))) {
            return Err(Error::InvalidConfiguration(
                "pipeline has no regressor stage".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(Error::InvalidConfiguration(
                "training set is empty".to_string(),
            ));
        }

        self.trained = false;
        self.reset_transform_stages()?;
        let mut transformed = Vec::with_capacity(data.len());
        for (input, target) in data {
            transformed.push((self.transform(input)?, target.clone()));
        }

        if let Some(PredictorStage::Regressor(stage)) = self.predictor.as_mut() {
            stage.train(&transformed)?;
        }

        self.reset_transform_stages()?;
        self.trained = true;
        tracing::debug!(examples = data.len(), "regressor trained");
        Ok(())
    }

    /// Resets every owned stage in chain order.
    ///
    /// Only transient history is cleared; the trained flag and learned
    /// parameters are untouched.
    pub fn reset(&mut self) -> Result<()> {
        for stage in &mut self.pre_processors {
            stage.reset()?;
        }
        for stage in &mut self.feature_extractors {
            stage.reset()?;
        }
        match self.predictor.as_mut() {
            Some(PredictorStage::Classifier(stage)) => stage.reset()?,
            Some(PredictorStage::Regressor(stage)) => stage.reset()?,
            None => {}
        }
        for stage in &mut self.post_processors {
            stage.reset()?;
        }
        self.last_prediction = None;
        Ok(())
    }

    /// Persists the chain layout and every stage's settings block in chain
    /// order. The trained flag and learned parameters are not persisted.
    pub fn save(&self, sink: &mut dyn Write) -> Result<()> {
        settings::write_pipeline_header(sink)?;
        settings::write_field(sink, "pre_processors", self.pre_processors.len())?;
        settings::write_field(sink, "feature_extractors", self.feature_extractors.len())?;
        settings::write_field(sink, "post_processors", self.post_processors.len())?;
        let predictor_line = match &self.predictor {
            None => "none".to_string(),
            Some(stage) => format!("{} {}", stage.kind(), stage.type_name()),
        };
        settings::write_field(sink, "predictor", predictor_line)?;

        for stage in &self.pre_processors {
            writeln!(sink, "stage pre {}", stage.type_name())?;
            stage.save_settings(sink)?;
        }
        for stage in &self.feature_extractors {
            writeln!(sink, "stage feature {}", stage.type_name())?;
            stage.save_settings(sink)?;
        }
        if let Some(predictor) = &self.predictor {
            writeln!(sink, "stage predictor {}", predictor.type_name())?;
            match predictor {
                PredictorStage::Classifier(stage) => stage.save_settings(sink)?,
                PredictorStage::Regressor(stage) => stage.save_settings(sink)?,
            }
        }
        for stage in &self.post_processors {
            writeln!(sink, "stage post {}", stage.type_name())?;
            stage.save_settings(sink)?;
        }
        Ok(())
    }

    /// Reconstructs a pipeline from a stream written by [`Pipeline::save`],
    /// building each stage through `registry` so the loader never names
    /// concrete types. All-or-nothing: any malformed block fails the load.
    ///
    /// The loaded pipeline is untrained; learned parameters are not part of
    /// the settings contract.
    pub fn load(source: &mut dyn BufRead, registry: &ModuleRegistry) -> Result<Self> {
        settings::read_pipeline_header(source)?;
        let num_pre: usize = settings::read_field(source, "pre_processors")?;
        let num_feature: usize = settings::read_field(source, "feature_extractors")?;
        let num_post: usize = settings::read_field(source, "post_processors")?;
        let predictor_line: String = settings::read_field(source, "predictor")?;

        let mut pipeline = Pipeline::new();

        for _ in 0..num_pre {
            let name = read_stage_marker(source, "pre")?;
            let mut stage = registry.create_pre_processor(&name).ok_or_else(|| {
                Error::Format(format!("unregistered pre-processing module `{}`", name))
            })?;
            stage.load_settings(source)?;
            pipeline.pre_processors.push(stage);
        }
        for _ in 0..num_feature {
            let name = read_stage_marker(source, "feature")?;
            let mut stage = registry.create_feature_extractor(&name).ok_or_else(|| {
                Error::Format(format!("unregistered feature-extraction module `{}`", name))
            })?;
            stage.load_settings(source)?;
            pipeline.feature_extractors.push(stage);
        }

        match predictor_line.split_once(' ') {
            None if predictor_line == "none" => {}
            Some(("classifier", name)) => {
                let marker = read_stage_marker(source, "predictor")?;
                if marker != name {
                    return Err(Error::Format(format!(
                        "predictor block `{}` does not match declared `{}`",
                        marker, name
                    )));
                }
                let mut stage = registry.create_classifier(name).ok_or_else(|| {
                    Error::Format(format!("unregistered classification module `{}`", name))
                })?;
                stage.load_settings(source)?;
                pipeline.predictor = Some(PredictorStage::Classifier(stage));
            }
            Some(("regressor", name)) => {
                let marker = read_stage_marker(source, "predictor")?;
                if marker != name {
                    return Err(Error::Format(format!(
                        "predictor block `{}` does not match declared `{}`",
                        marker, name
                    )));
                }
                let mut stage = registry.create_regressor(name).ok_or_else(|| {
                    Error::Format(format!("unregistered regression module `{}`", name))
                })?;
                stage.load_settings(source)?;
                pipeline.predictor = Some(PredictorStage::Regressor(stage));
            }
            _ => {
                return Err(Error::Format(format!(
                    "bad predictor declaration: {:?}",
                    predictor_line
                )));
            }
        }

        for _ in 0..num_post {
            let name = read_stage_marker(source, "post")?;
            let mut stage = registry.create_post_processor(&name).ok_or_else(|| {
                Error::Format(format!("unregistered post-processing module `{}`", name))
            })?;
            stage.load_settings(source)?;
            pipeline.post_processors.push(stage);
        }

        pipeline.trained = pipeline
            .predictor
            .as_ref()
            .map(PredictorStage::is_trained)
            .unwrap_or(false);
        Ok(pipeline)
    }

    /// Runs one vector through the pre-processing and feature-extraction
    /// stages in order.
    fn transform(&mut self, sample: &[f64]) -> Result<Vec<f64>> {
        let mut data = sample.to_vec();
        for stage in &mut self.pre_processors {
            data = stage.filter(&data)?;
        }
        for stage in &mut self.feature_extractors {
            data = stage.compute_features(&data)?;
        }
        Ok(data)
    }

    fn reset_transform_stages(&mut self) -> Result<()> {
        for stage in &mut self.pre_processors {
            stage.reset()?;
        }
        for stage in &mut self.feature_extractors {
            stage.reset()?;
        }
        Ok(())
    }
}

fn read_stage_marker(source: &mut dyn BufRead, expected_family: &str) -> Result<String> {
    let mut line = String::new();
    let bytes = source.read_line(&mut line)?;
    if bytes == 0 {
        return Err(Error::Format("unexpected end of stream".to_string()));
    }
    let line = line.trim_end();
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("stage"), Some(family), Some(name), None) if family == expected_family => {
            Ok(name.to_string())
        }
        _ => Err(Error::Format(format!(
            "expected `stage {}` marker, got {:?}",
            expected_family, line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use approx::assert_relative_eq;
    use std::io::{BufRead, BufReader, Write};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Minimal stages for driving the chain; the real ones live in the
    // stage crates.

    #[derive(Clone, Default)]
    struct Doubler {
        calls: Arc<AtomicUsize>,
    }

    impl Module for Doubler {
        fn type_name(&self) -> &'static str {
            "Doubler"
        }
        fn is_initialized(&self) -> bool {
            true
        }
        fn num_input_dimensions(&self) -> usize {
            1
        }
        fn num_output_dimensions(&self) -> usize {
            1
        }
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }
        fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
            settings::write_header(sink, self.type_name())
        }
        fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
            settings::read_header(source, self.type_name())
        }
    }

    impl PreProcessor for Doubler {
        fn filter(&mut self, input: &[f64]) -> Result<Vec<f64>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(input.iter().map(|x| x * 2.0).collect())
        }
    }

    #[derive(Clone, Default)]
    struct SignClassifier {
        trained: bool,
    }

    impl Module for SignClassifier {
        fn type_name(&self) -> &'static str {
            "SignClassifier"
        }
        fn is_initialized(&self) -> bool {
            self.trained
        }
        fn num_input_dimensions(&self) -> usize {
            1
        }
        fn num_output_dimensions(&self) -> usize {
            1
        }
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }
        fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
            settings::write_header(sink, self.type_name())
        }
        fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
            self.trained = false;
            settings::read_header(source, self.type_name())
        }
    }

    impl Classifier for SignClassifier {
        fn train(&mut self, _data: &[(Sample, u64)]) -> Result<()> {
            self.trained = true;
            Ok(())
        }
        fn predict(&mut self, input: &[f64]) -> Result<u64> {
            if !self.trained {
                return Err(Error::NotTrained);
            }
            Ok(if input[0] >= 0.0 { 1 } else { 2 })
        }
        fn is_trained(&self) -> bool {
            self.trained
        }
    }

    #[derive(Clone, Default)]
    struct MeanRegressor {
        mean: f64,
        trained: bool,
    }

    impl Module for MeanRegressor {
        fn type_name(&self) -> &'static str {
            "MeanRegressor"
        }
        fn is_initialized(&self) -> bool {
            self.trained
        }
        fn num_input_dimensions(&self) -> usize {
            1
        }
        fn num_output_dimensions(&self) -> usize {
            1
        }
        fn reset(&mut self) -> Result<()> {
            Ok(())
        }
        fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
            settings::write_header(sink, self.type_name())
        }
        fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
            self.trained = false;
            settings::read_header(source, self.type_name())
        }
    }

    impl Regressor for MeanRegressor {
        fn train(&mut self, data: &[(Sample, Vec<f64>)]) -> Result<()> {
            let sum: f64 = data.iter().map(|(_, target)| target[0]).sum();
            self.mean = sum / data.len() as f64;
            self.trained = true;
            Ok(())
        }
        fn predict(&mut self, _input: &[f64]) -> Result<Vec<f64>> {
            if !self.trained {
                return Err(Error::NotTrained);
            }
            Ok(vec![self.mean])
        }
        fn is_trained(&self) -> bool {
            self.trained
        }
    }

    fn trained_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.add_pre_processor(Box::new(Doubler::default()));
        pipeline.set_classifier(Box::new(SignClassifier::default()));
        pipeline.train_classifier(&[(vec![1.0], 1), (vec![-1.0], 2)]).unwrap();
        pipeline
    }

    #[test]
    fn test_predict_requires_predictor() {
        let mut pipeline = Pipeline::new();
        pipeline.add_pre_processor(Box::new(Doubler::default()));
        assert!(matches!(
            pipeline.predict(&[1.0]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_untrained_predict_fails_without_touching_stages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = Pipeline::new();
        pipeline.add_pre_processor(Box::new(Doubler {
            calls: Arc::clone(&calls),
        }));
        pipeline.set_classifier(Box::new(SignClassifier::default()));

        assert!(matches!(pipeline.predict(&[1.0]), Err(Error::NotTrained)));

        // The pre-processor must not have been driven
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_predict_threads_chain_in_order() {
        let mut pipeline = trained_pipeline();
        let prediction = pipeline.predict(&[0.5]).unwrap();
        assert_eq!(prediction, Prediction::Label(1));
        let prediction = pipeline.predict(&[-0.5]).unwrap();
        assert_eq!(prediction, Prediction::Label(2));
        assert_eq!(pipeline.last_prediction(), Some(&Prediction::Label(2)));
    }

    #[test]
    fn test_regression_path_produces_values() {
        let mut pipeline = Pipeline::new();
        pipeline.add_pre_processor(Box::new(Doubler::default()));
        pipeline.set_regressor(Box::new(MeanRegressor::default()));

        // Targets average to 2.0
        pipeline
            .train_regressor(&[(vec![1.0], vec![1.0]), (vec![2.0], vec![3.0])])
            .unwrap();

        let prediction = pipeline.predict(&[0.5]).unwrap();
        let values = prediction.as_values().unwrap();
        assert_relative_eq!(values[0], 2.0);

        // A classifier-style train call on a regressor pipeline fails
        assert!(matches!(
            pipeline.train_classifier(&[(vec![1.0], 1)]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_reset_keeps_trained_flag() {
        let mut pipeline = trained_pipeline();
        pipeline.predict(&[0.5]).unwrap();
        pipeline.reset().unwrap();
        assert!(pipeline.is_trained());
        assert!(pipeline.last_prediction().is_none());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut pipeline = trained_pipeline();
        let mut clone = pipeline.clone();
        assert!(clone.is_trained());

        // Driving the clone must not disturb the original
        clone.predict(&[0.5]).unwrap();
        assert!(pipeline.last_prediction().is_none());
        pipeline.predict(&[-0.5]).unwrap();
        assert_eq!(clone.last_prediction(), Some(&Prediction::Label(1)));
    }

    #[test]
    fn test_save_load_round_trip() {
        let registry = ModuleRegistry::new();
        registry.register_pre_processor("Doubler", || Box::new(Doubler::default()));
        registry.register_classifier("SignClassifier", || Box::new(SignClassifier::default()));

        let pipeline = trained_pipeline();
        let mut sink = Vec::new();
        pipeline.save(&mut sink).unwrap();

        let mut source = BufReader::new(sink.as_slice());
        let loaded = Pipeline::load(&mut source, &registry).unwrap();
        assert_eq!(loaded.num_pre_processors(), 1);
        assert!(loaded.has_predictor());
        // Learned parameters are not persisted
        assert!(!loaded.is_trained());
    }

    #[test]
    fn test_load_unregistered_type_fails() {
        let pipeline = trained_pipeline();
        let mut sink = Vec::new();
        pipeline.save(&mut sink).unwrap();

        let empty_registry = ModuleRegistry::new();
        let mut source = BufReader::new(sink.as_slice());
        assert!(matches!(
            Pipeline::load(&mut source, &empty_registry),
            Err(Error::Format(_))
        ));
    }
}
