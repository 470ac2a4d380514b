//! End-to-end pipeline tests: full chains of real stages driven sample by
//! sample, for both the classification and the regression path.

mod helpers;

use approx::assert_relative_eq;
use helpers::NearestCentroidClassifier;
use kinema::prelude::*;

/// Training pairs for a scalar stream classified by level: label 1 for a
/// low window, label 2 for a high one.
fn level_training_data(window: usize) -> Vec<(Sample, u64)> {
    let mut data = Vec::new();
    for _ in 0..window * 3 {
        data.push((vec![0.0], 1));
        data.push((vec![1.0], 2));
    }
    // Separate runs so windows are homogeneous per label
    data.sort_by_key(|(_, label)| *label);
    data
}

#[test]
fn classification_chain_with_window_and_change_filter() {
    let mut pipeline = PipelineBuilder::new()
        .feature_extractor(Box::new(TimeseriesWindow::new(3, 1).unwrap()))
        .classifier(Box::new(NearestCentroidClassifier::new()))
        .post_processor(Box::new(ClassLabelChangeFilter::new()))
        .build();

    pipeline.train_classifier(&level_training_data(3)).unwrap();
    assert!(pipeline.is_trained());

    // A steady low stream: the first prediction is a change, the rest are
    // debounced to zero by the change filter
    let first = pipeline.predict(&[0.0]).unwrap();
    assert_eq!(first, Prediction::Label(1));
    for _ in 0..4 {
        assert_eq!(pipeline.predict(&[0.0]).unwrap(), Prediction::Label(0));
    }

    // Jumping to the high level eventually flips the window's label; the
    // change filter reports the transition exactly once
    let mut changes = Vec::new();
    for _ in 0..6 {
        if let Prediction::Label(label) = pipeline.predict(&[1.0]).unwrap() {
            if label != 0 {
                changes.push(label);
            }
        }
    }
    assert_eq!(changes, vec![2]);
}

#[test]
fn untrained_pipeline_reports_not_trained() {
    let mut pipeline = PipelineBuilder::new()
        .feature_extractor(Box::new(TimeseriesWindow::new(3, 1).unwrap()))
        .classifier(Box::new(NearestCentroidClassifier::new()))
        .build();

    assert!(matches!(pipeline.predict(&[0.0]), Err(Error::NotTrained)));
}

#[test]
fn regression_chain_with_moving_average() {
    let mut pipeline = PipelineBuilder::new()
        .pre_processor(Box::new(MovingAverageFilter::new(2, 1).unwrap()))
        .regressor(Box::new({
            let mut regressor = LmsRegressor::new();
            regressor.set_seed(11);
            regressor.set_max_epochs(1000).unwrap();
            regressor
        }))
        .build();

    // Identity target on a slowly rising stream: the regressor sees the
    // moving-average output as its input and fits the raw value back out
    let data: Vec<(Sample, Vec<f64>)> = (0..40)
        .map(|i| {
            let x = i as f64 * 0.025;
            (vec![x], vec![x])
        })
        .collect();

    pipeline.train_regressor(&data).unwrap();
    assert!(pipeline.is_trained());

    // After training the transform stages are reset, so the window behind
    // the prediction is [0, 0.5] and the smoothed input is 0.25
    let output = pipeline.predict(&[0.5]).unwrap();
    let values = output.as_values().unwrap();
    assert_eq!(values.len(), 1);
    assert_relative_eq!(values[0], 0.2625, epsilon = 0.1);
}

#[test]
fn reset_clears_window_history_but_not_training() {
    let mut pipeline = PipelineBuilder::new()
        .feature_extractor(Box::new(TimeseriesWindow::new(3, 1).unwrap()))
        .classifier(Box::new(NearestCentroidClassifier::new()))
        .build();
    pipeline.train_classifier(&level_training_data(3)).unwrap();

    // Fill the window with high samples
    for _ in 0..3 {
        pipeline.predict(&[1.0]).unwrap();
    }
    assert_eq!(pipeline.predict(&[1.0]).unwrap(), Prediction::Label(2));

    pipeline.reset().unwrap();
    assert!(pipeline.is_trained());

    // After reset the window is zero-filled again: two zeros plus one low
    // sample classify low
    assert_eq!(pipeline.predict(&[0.0]).unwrap(), Prediction::Label(1));
}

#[test]
fn pipeline_clone_is_independent() {
    let mut pipeline = PipelineBuilder::new()
        .feature_extractor(Box::new(TimeseriesWindow::new(3, 1).unwrap()))
        .classifier(Box::new(NearestCentroidClassifier::new()))
        .build();
    pipeline.train_classifier(&level_training_data(3)).unwrap();

    let mut clone = pipeline.clone();
    assert!(clone.is_trained());

    // Drive only the clone's window high; the original must stay cold
    for _ in 0..4 {
        clone.predict(&[1.0]).unwrap();
    }
    assert_eq!(clone.last_prediction(), Some(&Prediction::Label(2)));
    assert!(pipeline.last_prediction().is_none());
    assert_eq!(pipeline.predict(&[0.0]).unwrap(), Prediction::Label(1));
}

#[test]
fn dimension_mismatch_surfaces_from_first_stage() {
    let mut pipeline = PipelineBuilder::new()
        .feature_extractor(Box::new(TimeseriesWindow::new(3, 2).unwrap()))
        .classifier(Box::new(NearestCentroidClassifier::new()))
        .build();
    let data: Vec<(Sample, u64)> = vec![
        (vec![0.0, 0.0], 1),
        (vec![1.0, 1.0], 2),
    ];
    pipeline.train_classifier(&data).unwrap();

    assert!(matches!(
        pipeline.predict(&[0.0]),
        Err(Error::DimensionMismatch {
            expected: 2,
            actual: 1
        })
    ));
}
