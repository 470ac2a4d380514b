//! Feed-forward neuron unit.
//!
//! A single weighted-sum unit with a selectable nonlinearity. The
//! derivative is expressed in terms of the unit's own *output*: callers
//! must hand [`Neuron::derivative`] the activation produced by
//! [`Neuron::fire`], never the raw pre-activation. Use
//! [`Neuron::fire_with_derivative`] to get both values from one call and
//! sidestep the coupling entirely.

use rand::Rng;

use kinema_core::{check_dimensions, Result};

/// Pre-activation magnitude beyond which the sigmoids saturate exactly,
/// keeping `exp` away from floating-point overflow.
const SATURATION_BOUND: f64 = 45.0;

/// Nonlinearity applied to the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Linear,
    Sigmoid,
    BipolarSigmoid,
}

impl Activation {
    /// Stable name used in settings streams.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Sigmoid => "sigmoid",
            Self::BipolarSigmoid => "bipolar_sigmoid",
        }
    }

    /// Inverse of [`Activation::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "sigmoid" => Some(Self::Sigmoid),
            "bipolar_sigmoid" => Some(Self::BipolarSigmoid),
            _ => None,
        }
    }
}

/// A single neuron: weight vector, bias, activation selector, and the
/// per-weight momentum terms used by gradient updates.
///
/// The weight vector length always equals `num_inputs`; re-`init` resizes
/// and re-randomizes.
#[derive(Debug, Clone)]
pub struct Neuron {
    num_inputs: usize,
    weights: Vec<f64>,
    previous_update: Vec<f64>,
    bias: f64,
    previous_bias_update: f64,
    gamma: f64,
    activation: Activation,
}

impl Neuron {
    pub fn new() -> Self {
        Self {
            num_inputs: 0,
            weights: Vec::new(),
            previous_update: Vec::new(),
            bias: 0.0,
            previous_bias_update: 0.0,
            gamma: 2.0,
            activation: Activation::Linear,
        }
    }

    /// Resizes the unit and draws each weight and the bias independently
    /// and uniformly from [-0.1, 0.1] using `rng`.
    ///
    /// The randomness source is always supplied by the caller, so training
    /// is reproducible from a seed; small initial weights beat [-1, 1]
    /// draws here.
    pub fn init(&mut self, num_inputs: usize, activation: Activation, rng: &mut impl Rng) {
        self.num_inputs = num_inputs;
        self.activation = activation;
        self.weights = (0..num_inputs).map(|_| rng.gen_range(-0.1..=0.1)).collect();
        self.previous_update = vec![0.0; num_inputs];
        self.bias = rng.gen_range(-0.1..=0.1);
        self.previous_bias_update = 0.0;
    }

    /// Computes the activation for `inputs`.
    ///
    /// The weighted sum `bias + Σ inputs[i] * weights[i]` is passed through
    /// the selected nonlinearity; both sigmoids saturate exactly once the
    /// pre-activation magnitude reaches the clamp bound.
    pub fn fire(&self, inputs: &[f64]) -> Result<f64> {
        check_dimensions(self.num_inputs, inputs)?;

        let mut y = self.bias;
        for (input, weight) in inputs.iter().zip(&self.weights) {
            y += input * weight;
        }

        Ok(match self.activation {
            Activation::Linear => y,
            Activation::Sigmoid => {
                if y <= -SATURATION_BOUND {
                    0.0
                } else if y >= SATURATION_BOUND {
                    1.0
                } else {
                    1.0 / (1.0 + (-y).exp())
                }
            }
            Activation::BipolarSigmoid => {
                if y <= -SATURATION_BOUND {
                    -1.0
                } else if y >= SATURATION_BOUND {
                    1.0
                } else {
                    (2.0 / (1.0 + (-self.gamma * y).exp())) - 1.0
                }
            }
        })
    }

    /// Local derivative at a previously computed activation `y`.
    ///
    /// `y` must be the value returned by [`Neuron::fire`], not the raw
    /// input (except for LINEAR, where the derivative is constant).
    pub fn derivative(&self, y: f64) -> f64 {
        match self.activation {
            Activation::Linear => 1.0,
            Activation::Sigmoid => y * (1.0 - y),
            Activation::BipolarSigmoid => (self.gamma * (1.0 - y * y)) / 2.0,
        }
    }

    /// Computes the activation and its local derivative in one call.
    pub fn fire_with_derivative(&self, inputs: &[f64]) -> Result<(f64, f64)> {
        let activation = self.fire(inputs)?;
        Ok((activation, self.derivative(activation)))
    }

    /// Applies one gradient step with momentum.
    ///
    /// `delta` is the error term already multiplied by the local
    /// derivative; each weight moves by `learning_rate * delta * input`
    /// plus `momentum` times its previous update, and the bias by the same
    /// rule with a unit input.
    pub fn apply_delta(
        &mut self,
        inputs: &[f64],
        delta: f64,
        learning_rate: f64,
        momentum: f64,
    ) -> Result<()> {
        check_dimensions(self.num_inputs, inputs)?;

        for i in 0..self.num_inputs {
            let update = learning_rate * delta * inputs[i] + momentum * self.previous_update[i];
            self.weights[i] += update;
            self.previous_update[i] = update;
        }
        let bias_update = learning_rate * delta + momentum * self.previous_bias_update;
        self.bias += bias_update;
        self.previous_bias_update = bias_update;
        Ok(())
    }

    /// Decommissions the unit: zero inputs, empty weight and momentum
    /// storage. Distinct from re-randomizing via [`Neuron::init`].
    pub fn clear(&mut self) {
        self.num_inputs = 0;
        self.weights.clear();
        self.previous_update.clear();
        self.bias = 0.0;
        self.previous_bias_update = 0.0;
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Gain of the bipolar sigmoid.
    pub fn set_gamma(&mut self, gamma: f64) {
        self.gamma = gamma;
    }
}

impl Default for Neuron {
    fn default() -> Self {
        Self::new()
    }
}
