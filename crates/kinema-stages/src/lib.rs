//! Built-in pipeline stages: moving-average pre-processing, timeseries
//! windowing, and class-label post-processing.

use kinema_core::ModuleRegistry;

mod moving_average;
pub use moving_average::MovingAverageFilter;

mod timeseries_window;
pub use timeseries_window::TimeseriesWindow;

mod label_change;
pub use label_change::ClassLabelChangeFilter;

/// Registers every built-in stage with `registry`.
///
/// Call once at startup, before any pipeline is loaded from a settings
/// stream that names these types.
pub fn register_builtin_stages(registry: &ModuleRegistry) {
    registry.register_pre_processor(MovingAverageFilter::TYPE_NAME, || {
        Box::<MovingAverageFilter>::default()
    });
    registry.register_feature_extractor(TimeseriesWindow::TYPE_NAME, || {
        Box::<TimeseriesWindow>::default()
    });
    registry.register_post_processor(ClassLabelChangeFilter::TYPE_NAME, || {
        Box::<ClassLabelChangeFilter>::default()
    });
    tracing::debug!("registered built-in stages");
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::Module;

    #[test]
    fn test_register_builtin_stages() {
        let registry = ModuleRegistry::new();
        register_builtin_stages(&registry);

        assert!(registry.has_pre_processor(MovingAverageFilter::TYPE_NAME));
        assert!(registry.has_feature_extractor(TimeseriesWindow::TYPE_NAME));
        assert!(registry.has_post_processor(ClassLabelChangeFilter::TYPE_NAME));

        // Constructed instances are usable defaults
        let stage = registry
            .create_feature_extractor(TimeseriesWindow::TYPE_NAME)
            .unwrap();
        assert!(!stage.is_initialized());

        assert!(registry.create_feature_extractor("Unregistered").is_none());
    }
}
