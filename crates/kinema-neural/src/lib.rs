//! Neural modules: the feed-forward [`Neuron`] unit and the
//! [`LmsRegressor`] built on it.
//!
//! The neuron's numeric contract (activation clamping, derivative expressed
//! in terms of the output) is shared by any neural module layered on top;
//! higher-level network architectures bring their own training loops but
//! reuse [`Neuron::fire`] and [`Neuron::derivative`] verbatim.

use kinema_core::ModuleRegistry;

mod neuron;
pub use neuron::{Activation, Neuron};

mod lms;
pub use lms::LmsRegressor;

/// Registers the neural predictor modules with `registry`.
pub fn register_neural_modules(registry: &ModuleRegistry) {
    registry.register_regressor(LmsRegressor::TYPE_NAME, || Box::<LmsRegressor>::default());
    tracing::debug!("registered neural modules");
}
