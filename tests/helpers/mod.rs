//! Shared test fixtures: a small deterministic classifier for driving the
//! classification path end to end.

use std::io::{BufRead, Write};

use kinema::settings;
use kinema::{Classifier, Error, Module, Result, Sample};

/// Nearest-centroid classifier: training stores the per-label mean feature
/// vector, prediction returns the label of the closest centroid.
#[derive(Debug, Clone, Default)]
pub struct NearestCentroidClassifier {
    centroids: Vec<(u64, Vec<f64>)>,
    num_input_dimensions: usize,
    trained: bool,
}

impl NearestCentroidClassifier {
    pub const TYPE_NAME: &'static str = "NearestCentroidClassifier";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for NearestCentroidClassifier {
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
        Ok(())
    }

    fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
        settings::write_header(sink, Self::TYPE_NAME)
    }

    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
        self.centroids.clear();
        self.num_input_dimensions = 0;
        self.trained = false;
        settings::read_header(source, Self::TYPE_NAME)
    }
}

impl Classifier for NearestCentroidClassifier {
    fn train(&mut self, data: &[(Sample, u64)]) -> Result<()> {
        let (first_input, _) = data.first().ok_or_else(|| {
            Error::InvalidConfiguration("training set is empty".to_string())
        })?;
        let dims = first_input.len();

        let mut sums: Vec<(u64, Vec<f64>, usize)> = Vec::new();
        for (input, label) in data {
            kinema::check_dimensions(dims, input)?;
            match sums.iter_mut().find(|(l, _, _)| l == label) {
                Some((_, sum, count)) => {
                    for (accumulator, value) in sum.iter_mut().zip(input) {
                        *accumulator += value;
                    }
                    *count += 1;
                }
                None => sums.push((*label, input.clone(), 1)),
            }
        }

        self.centroids = sums
            .into_iter()
            .map(|(label, sum, count)| {
                (label, sum.into_iter().map(|v| v / count as f64).collect())
            })
            .collect();
        self.num_input_dimensions = dims;
        self.trained = true;
        Ok(())
    }

    fn predict(&mut self, input: &[f64]) -> Result<u64> {
        if !self.trained {
            return Err(Error::NotTrained);
        }
        kinema::check_dimensions(self.num_input_dimensions, input)?;

        let mut best: Option<(u64, f64)> = None;
        for (label, centroid) in &self.centroids {
            let distance: f64 = centroid
                .iter()
                .zip(input)
                .map(|(c, x)| (c - x) * (c - x))
                .sum();
            if best.map(|(_, d)| distance < d).unwrap_or(true) {
                best = Some((*label, distance));
            }
        }
        best.map(|(label, _)| label).ok_or(Error::NotTrained)
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
