//! Class-label change filter.
//!
//! Signals when the predicted label of a classifier changes: the stream
//! {1,1,1,1,2,2,2,2,3,3} becomes {1,0,0,0,2,0,0,0,3,0}. Useful for
//! debouncing a gesture stream when only label transitions matter.

use std::io::{BufRead, Write};

use kinema_core::{settings, Error, Module, PostProcessor, Result};

/// Post-processing stage that emits a label only when it differs from the
/// previous one, and zero otherwise.
#[derive(Debug, Clone)]
pub struct ClassLabelChangeFilter {
    filtered_class_label: u64,
    label_changed: bool,
    initialized: bool,
}

impl ClassLabelChangeFilter {
    pub const TYPE_NAME: &'static str = "ClassLabelChangeFilter";

    /// Creates an initialized filter; there are no parameters.
    pub fn new() -> Self {
        let mut stage = Self {
            filtered_class_label: 0,
            label_changed: false,
            initialized: false,
        };
        stage.init();
        stage
    }

    pub fn init(&mut self) {
        self.filtered_class_label = 0;
        self.label_changed = false;
        self.initialized = true;
    }

    /// Filters one label: returns it when it differs from the stored label,
    /// zero otherwise.
    pub fn filter(&mut self, label: u64) -> u64 {
        if label != self.filtered_class_label {
            self.filtered_class_label = label;
            self.label_changed = true;
            return label;
        }
        self.label_changed = false;
        0
    }

    /// Most recently stored (non-zero-filtered) label.
    pub fn filtered_class_label(&self) -> u64 {
        self.filtered_class_label
    }

    /// Whether the last processed label was a change.
    pub fn change_detected(&self) -> bool {
        self.label_changed
    }
}

impl Default for ClassLabelChangeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ClassLabelChangeFilter {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn num_input_dimensions(&self) -> usize {
        1
    }

    fn num_output_dimensions(&self) -> usize {
        1
    }

    fn reset(&mut self) -> Result<()> {
        self.init();
        Ok(())
    }

    fn save_settings(&self, sink: &mut dyn Write) -> Result<()> {
        // Header only: this stage has no scalar configuration
        settings::write_header(sink, Self::TYPE_NAME)
    }

    fn load_settings(&mut self, source: &mut dyn BufRead) -> Result<()> {
        self.initialized = false;
        settings::read_header(source, Self::TYPE_NAME)?;
        self.init();
        Ok(())
    }
}

impl PostProcessor for ClassLabelChangeFilter {
    fn process(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if input.len() != 1 {
            return Err(Error::DimensionMismatch {
                expected: 1,
                actual: input.len(),
            });
        }
        let filtered = self.filter(input[0] as u64);
        Ok(vec![filtered as f64])
    }
}
