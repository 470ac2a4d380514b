//! Least-mean-squares regression module.
//!
//! A single [`Neuron`] trained with the delta rule plus momentum. Small by
//! design, but it carries the full predictor contract: trainable,
//! resettable, cloneable, registrable, and persistable as configuration
//! (learned weights are not settings and are not written out).

use std::io::{BufRead, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;

use kinema_core::{check_dimensions, settings, Error, Module, Regressor, Result, Sample};

use crate::neuron::{Activation, Neuron};

/// Single-output regressor trained by gradient descent on squared error.
#[derive(Debug, Clone)]
pub struct LmsRegressor {
    learning_rate: f64,
    momentum: f64,
    max_epochs: usize,
    min_rms_delta: f64,
    activation: Activation,
    seed: Option<u64>,
    neuron: Neuron,
    num_input_dimensions: usize,
    rms_training_error: f64,
    trained: bool,
}

impl LmsRegressor {
    pub const TYPE_NAME: &'static str = "LmsRegressor";

    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            momentum: 0.5,
            max_epochs: 100,
            min_rms_delta: 1e-5,
            activation: Activation::Linear,
            seed: None,
            neuron: Neuron::new(),
            num_input_dimensions: 0,
            rms_training_error: 0.0,
            trained: false,
        }
    }

    /// Fixes the weight-initialization seed so training is reproducible.
    /// Without a seed, each train call draws fresh entropy.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        if learning_rate <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        if !(0.0..1.0).contains(&momentum) {
            return Err(Error::InvalidConfiguration(format!(
                "momentum must be in [0, 1), got {}",
                momentum
            )));
        }
        self.momentum = momentum;
        Ok(())
    }

    pub fn set_max_epochs(&mut self, max_epochs: usize) -> Result<()> {
        if max_epochs == 0 {
            return Err(Error::InvalidConfiguration(
                "max epochs must be positive".to_string(),
            ));
        }
        self.max_epochs = max_epochs;
        Ok(())
    }

    pub fn set_min_rms_delta(&mut self, min_rms_delta: f64) -> Result<()> {
        if min_rms_delta < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "minimum RMS delta must be non-negative, got {}",
                min_rms_delta
            )));
        }
        self.min_rms_delta = min_rms_delta;
        Ok(())
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// RMS error over the training set at the last epoch of the last
    /// successful train call.
    pub fn rms_training_error(&self) -> f64 {
        self.rms_training_error
    }

    /// Drops the learned model entirely.
    pub fn clear(&mut self) {
        self.neuron.clear();
        self.num_input_dimensions = 0;
        self.rms_training_error = 0.0;
        self.trained = false;
    }

    fn validate_training_set(&self, data: &[(Sample, Vec<f64>)]) -> Result<usize> {
        let (first_input, _) = data.first().ok_or_else(|| {
            Error::InvalidConfiguration("training set is empty".to_string())
        })?;
        let dims = first_input.len();
        if dims == 0 {
            return Err(Error::InvalidConfiguration(
                "training inputs must have at least one dimension".to_string(),
            ));
        }
        for (input, target) in data {
            check_dimensions(dims, input)?;
            check_dimensions(1, target)?;
        }
        Ok(dims)
    }
}

impl Default for LmsRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for LmsRegressor {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_initialized(&self) -> bool {
        self.trained
    }

    fn num_input_dimensions(&self) -> usize {
        self.num_input_dimensions
    }

    fn num_output_dimensions(&self) -> usize {
        if self.trained {
            1
        } else {
            0
        }
    }

    fn reset(&mut self) -> Result<()> {
        // No transient history; the learned model survives a reset
        Ok(())
    }

    fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
        settings::write_header(sink, Self::TYPE_NAME)?;
        settings::write_field(sink, "learning_rate", self.learning_rate)?;
        settings::write_field(sink, "momentum", self.momentum)?;
        settings::write_field(sink, "max_epochs", self.max_epochs)?;
        settings::write_field(sink, "min_rms_delta", self.min_rms_delta)?;
        settings::write_field(sink, "activation", self.activation.name())?;
        Ok(())
    }

    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
        self.clear();
        settings::read_header(source, Self::TYPE_NAME)?;
        let learning_rate: f64 = settings::read_field(source, "learning_rate")?;
        let momentum: f64 = settings::read_field(source, "momentum")?;
        let max_epochs: usize = settings::read_field(source, "max_epochs")?;
        let min_rms_delta: f64 = settings::read_field(source, "min_rms_delta")?;
        let activation_name: String = settings::read_field(source, "activation")?;

        self.set_learning_rate(learning_rate)?;
        self.set_momentum(momentum)?;
        self.set_max_epochs(max_epochs)?;
        self.set_min_rms_delta(min_rms_delta)?;
        self.activation = Activation::from_name(&activation_name).ok_or_else(|| {
            Error::Format(format!("unknown activation `{}`", activation_name))
        })?;
        Ok(())
    }
}

impl Regressor for LmsRegressor {
    fn train(&mut self, data: &[(Sample, Vec<f64>)]) -> Result<()> {
        let dims = self.validate_training_set(data)?;

        self.trained = false;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.neuron.init(dims, self.activation, &mut rng);

        let mut last_rms = f64::MAX;
        let mut epochs_run = 0;
        for epoch in 0..self.max_epochs {
            let mut squared_error_sum = 0.0;
            for (input, target) in data {
                let (output, derivative) = self.neuron.fire_with_derivative(input)?;
                let error = target[0] - output;
                self.neuron
                    .apply_delta(input, error * derivative, self.learning_rate, self.momentum)?;
                squared_error_sum += error * error;
            }
            let rms = (squared_error_sum / data.len() as f64).sqrt();
            epochs_run = epoch + 1;
            if (last_rms - rms).abs() < self.min_rms_delta {
                last_rms = rms;
                break;
            }
            last_rms = rms;
        }

        self.num_input_dimensions = dims;
        self.rms_training_error = last_rms;
        self.trained = true;
        tracing::debug!(
            epochs = epochs_run,
            rms = self.rms_training_error,
            "LMS training finished"
        );
        Ok(())
    }

    fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if !self.trained {
            return Err(Error::NotTrained);
        }
        Ok(vec![self.neuron.fire(input)?])
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
