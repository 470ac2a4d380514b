//! Moving-average pre-processing filter.

use std::io::{BufRead, Write};

use kinema_core::{
    check_dimensions, settings, CircularBuffer, Error, Module, PreProcessor, Result, Sample,
};

/// Per-dimension running mean over a sliding window.
///
/// The window starts zero-filled, so the first `filter_size - 1` outputs are
/// attenuated until the window has seen enough real samples.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter {
    filter_size: usize,
    num_dimensions: usize,
    buffer: CircularBuffer<Sample>,
    processed: Vec<f64>,
    initialized: bool,
}

impl MovingAverageFilter {
    pub const TYPE_NAME: &'static str = "MovingAverageFilter";

    /// Creates and initializes a filter.
    pub fn new(filter_size: usize, num_dimensions: usize) -> Result<Self> {
        let mut stage = Self::default();
        stage.init(filter_size, num_dimensions)?;
        Ok(stage)
    }

    /// Allocates a zero-filled window. Both values must be positive.
    pub fn init(&mut self, filter_size: usize, num_dimensions: usize) -> Result<()> {
        if filter_size == 0 {
            return Err(Error::InvalidConfiguration(
                "filter size must be positive".to_string(),
            ));
        }
        if num_dimensions == 0 {
            return Err(Error::InvalidConfiguration(
                "number of dimensions must be positive".to_string(),
            ));
        }

        self.filter_size = filter_size;
        self.num_dimensions = num_dimensions;
        self.buffer = CircularBuffer::with_capacity(filter_size);
        self.buffer.fill(vec![0.0; num_dimensions]);
        self.processed = vec![0.0; num_dimensions];
        self.initialized = true;
        Ok(())
    }

    /// Pushes one sample and returns the per-dimension mean of the window.
    pub fn filter_sample(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        check_dimensions(self.num_dimensions, input)?;

        self.buffer.push(input.to_vec());

        let mut mean = vec![0.0; self.num_dimensions];
        for sample in self.buffer.iter() {
            for (accumulator, value) in mean.iter_mut().zip(sample) {
                *accumulator += value;
            }
        }
        for accumulator in &mut mean {
            *accumulator /= self.filter_size as f64;
        }
        self.processed = mean.clone();
        Ok(mean)
    }

    /// Re-initializes with a new window size, keeping the dimensionality.
    pub fn set_filter_size(&mut self, filter_size: usize) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.init(filter_size, self.num_dimensions)
    }

    pub fn filter_size(&self) -> usize {
        self.filter_size
    }
}

impl Default for MovingAverageFilter {
    fn default() -> Self {
        Self {
            filter_size: 0,
            num_dimensions: 0,
            buffer: CircularBuffer::with_capacity(1),
            processed: Vec::new(),
            initialized: false,
        }
    }
}

impl Module for MovingAverageFilter {
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
        self.num_dimensions
    }

    fn reset(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        self.buffer.fill(vec![0.0; self.num_dimensions]);
        self.processed = vec![0.0; self.num_dimensions];
        Ok(())
    }

    fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
        settings::write_header(sink, Self::TYPE_NAME)?;
        settings::write_field(sink, "filter_size", self.filter_size)?;
        settings::write_field(sink, "num_dimensions", self.num_dimensions)?;
        Ok(())
    }

    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
        self.initialized = false;
        settings::read_header(source, Self::TYPE_NAME)?;
        let filter_size: usize = settings::read_field(source, "filter_size")?;
        let num_dimensions: usize = settings::read_field(source, "num_dimensions")?;
        self.init(filter_size, num_dimensions)
    }
}

impl PreProcessor for MovingAverageFilter {
    fn filter(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.filter_sample(input)
    }
}
