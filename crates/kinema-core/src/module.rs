//! Stage trait family.
//!
//! Five sibling families share one capability shape: pre-processors,
//! feature extractors, classifiers, regressors, and post-processors. The
//! pipeline drives every stage identically through these traits, and the
//! registry constructs them from type-name strings when a saved pipeline is
//! reloaded.
//!
//! Deep copies go through `dyn-clone`, so cloning is statically
//! like-with-like per family; the only cross-type failure path left is
//! loading a settings stream written by a different concrete type, which
//! fails with [`Error::TypeMismatch`](crate::Error::TypeMismatch).

use std::io::{BufRead, Write};

use dyn_clone::DynClone;

use crate::{Result, Sample};

/// Capability set common to every stage family.
///
/// Lifecycle: constructed uninitialized, `init` (family-specific) sets the
/// dimensionality and allocates state, `process`-style calls mutate internal
/// state, `reset` returns to the post-init state with parameters retained
/// and history cleared.
pub trait Module: DynClone + Send {
    /// Stable type name, used for registry lookup and settings headers.
    fn type_name(&self) -> &'static str;

    fn is_initialized(&self) -> bool;

    /// Expected input dimensionality. Zero before initialization.
    fn num_input_dimensions(&self) -> usize;

    /// Dimensionality of the output this stage produces. Zero before
    /// initialization.
    fn num_output_dimensions(&self) -> usize;

    /// Clears transient history (buffers, filter state) while keeping
    /// configuration and learned parameters.
    fn reset(&mut self) -> Result<()>;

    /// Writes the stage configuration as a settings block (see
    /// [`settings`](crate::settings)). History is never written.
    fn save_settings(&self, sink: &mut dyn Write) -> Result<()>;

    /// Reads a settings block written by [`Module::save_settings`].
    ///
    /// All-or-nothing: on any failure the stage is left uninitialized, never
    /// partially configured.
    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()>;
}

/// Pre-processing stage: transforms raw samples before feature extraction.
pub trait PreProcessor: Module {
    /// Filters one sample, returning the transformed vector.
    fn filter(&mut self, input: &[f64]) -> Result<Vec<f64>>;
}

dyn_clone::clone_trait_object!(PreProcessor);

/// Feature-extraction stage, possibly stateful over a sliding window.
pub trait FeatureExtractor: Module {
    /// Consumes one input vector and returns the computed feature vector.
    fn compute_features(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    /// Most recently computed feature vector. Empty before the first update.
    fn features(&self) -> &[f64];
}

dyn_clone::clone_trait_object!(FeatureExtractor);

/// Classification predictor: maps a feature vector to a class label.
pub trait Classifier: Module {
    fn train(&mut self, data: &[(Sample, u64)]) -> Result<()>;

    fn predict(&mut self, input: &[f64]) -> Result<u64>;

    fn is_trained(&self) -> bool;
}

dyn_clone::clone_trait_object!(Classifier);

/// Regression predictor: maps a feature vector to a continuous output.
pub trait Regressor: Module {
    fn train(&mut self, data: &[(Sample, Vec<f64>)]) -> Result<()>;

    fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    fn is_trained(&self) -> bool;
}

dyn_clone::clone_trait_object!(Regressor);

/// Post-processing stage: transforms the predictor's output stream.
pub trait PostProcessor: Module {
    fn process(&mut self, input: &[f64]) -> Result<Vec<f64>>;
}

dyn_clone::clone_trait_object!(PostProcessor);
