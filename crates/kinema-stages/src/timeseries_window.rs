//! Timeseries windowing stage.
//!
//! Buffers the most recent `buffer_size` samples in a circular buffer and
//! emits them as one flattened feature vector (oldest first), so downstream
//! predictors see a sliding window of the input stream instead of a single
//! sample.

use std::io::{BufRead, Write};

use kinema_core::{
    check_dimensions, settings, CircularBuffer, Error, FeatureExtractor, Module, Result, Sample,
};

/// Feature-extraction stage backed by a circular buffer of samples.
///
/// After `init(buffer_size, num_dimensions)` the flattened output always has
/// exactly `buffer_size * num_dimensions` elements; slots not yet written
/// hold zeros.
#[derive(Debug, Clone)]
pub struct TimeseriesWindow {
    buffer_size: usize,
    num_dimensions: usize,
    buffer: CircularBuffer<Sample>,
    features: Vec<f64>,
    initialized: bool,
}

impl TimeseriesWindow {
    pub const TYPE_NAME: &'static str = "TimeseriesWindow";

    /// Creates and initializes a window stage.
    pub fn new(buffer_size: usize, num_dimensions: usize) -> Result<Self> {
        let mut stage = Self::default();
        stage.init(buffer_size, num_dimensions)?;
        Ok(stage)
    }

    /// Allocates a zero-filled buffer of `buffer_size` samples of
    /// `num_dimensions` elements. Both values must be positive.
    pub fn init(&mut self, buffer_size: usize, num_dimensions: usize) -> Result<()> {
        if buffer_size == 0 {
            return Err(Error::InvalidConfiguration(
                "buffer size must be positive".to_string(),
            ));
        }
        if num_dimensions == 0 {
            return Err(Error::InvalidConfiguration(
                "number of dimensions must be positive".to_string(),
            ));
        }

        self.buffer_size = buffer_size;
        self.num_dimensions = num_dimensions;
        self.buffer = CircularBuffer::with_capacity(buffer_size);
        self.buffer.fill(vec![0.0; num_dimensions]);
        self.features = vec![0.0; buffer_size * num_dimensions];
        self.initialized = true;
        Ok(())
    }

    /// Pushes one sample into the window and returns the flattened window
    /// contents, oldest sample first.
    pub fn update(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        check_dimensions(self.num_dimensions, input)?;

        self.buffer.push(input.to_vec());

        let mut features = Vec::with_capacity(self.num_output_dimensions());
        for sample in self.buffer.iter() {
            features.extend_from_slice(sample);
        }
        self.features = features.clone();
        Ok(features)
    }

    /// Scalar overload of [`TimeseriesWindow::update`]; the stage must have
    /// been initialized with one dimension.
    pub fn update_scalar(&mut self, value: f64) -> Result<Vec<f64>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.update(&[value])
    }

    /// Re-initializes with a new window size, clearing history and keeping
    /// the dimensionality.
    pub fn set_buffer_size(&mut self, buffer_size: usize) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.init(buffer_size, self.num_dimensions)
    }

    /// Window size, or zero before initialization.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Copies the buffered samples out in arrival order.
    pub fn data_buffer(&self) -> Vec<Sample> {
        self.buffer.to_vec()
    }
}

impl Default for TimeseriesWindow {
    fn default() -> Self {
        Self {
            buffer_size: 0,
            num_dimensions: 0,
            buffer: CircularBuffer::with_capacity(1),
            features: Vec::new(),
            initialized: false,
        }
    }
}

impl Module for TimeseriesWindow {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn num_input_dimensions(&self) -> usize {
        self.num_dimensions
    }

    fn num_output_dimensions(&self) -> usize {
        self.buffer_size * self.num_dimensions
    }

    fn reset(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.buffer.fill(vec![0.0; self.num_dimensions]);
        self.features = vec![0.0; self.num_output_dimensions()];
        Ok(())
    }

    fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
        settings::write_header(sink, Self::TYPE_NAME)?;
        settings::write_field(sink, "buffer_size", self.buffer_size)?;
        settings::write_field(sink, "num_dimensions", self.num_dimensions)?;
        Ok(())
    }

    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
        self.initialized = false;
        settings::read_header(source, Self::TYPE_NAME)?;
        let buffer_size: usize = settings::read_field(source, "buffer_size")?;
        let num_dimensions: usize = settings::read_field(source, "num_dimensions")?;
        // Buffer contents are never persisted; this zero-fills like init
        self.init(buffer_size, num_dimensions)
    }
}

impl FeatureExtractor for TimeseriesWindow {
    fn compute_features(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.update(input)
    }

    fn features(&self) -> &[f64] {
        &self.features
    }
}
