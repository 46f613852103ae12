//! Dataset compatibility and format validation tests
//!
//! Tests for ensuring libsvm format variations work across the pipeline

use smosvm::api::{evaluate, SVM};
use smosvm::core::{KernelType, SVMError};
use smosvm::LibSVMDataset;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(data: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    write!(temp_file, "{}", data).expect("Failed to write");
    temp_file.flush().expect("Failed to flush");
    temp_file
}

/// Test LibSVM format variations
#[test]
fn test_libsvm_format_variations() {
    let test_cases = vec![
        ("+1 1:0.5 3:1.2 7:0.8\n-1 2:0.3 5:2.1\n", "basic format"),
        (
            "# This is a comment\n+1 1:0.5 3:1.2\n\n# Another comment\n-1 2:0.3\n",
            "with comments",
        ),
        ("1 1:0.5 2:1.0\n-1 1:-0.5 2:-1.0\n", "unsigned positive label"),
        (
            "+1 1:1.0 10:2.0 100:3.0\n-1 5:1.5 50:2.5 500:3.5\n",
            "sparse indices",
        ),
        ("+1 1:2.0\n-1 1:-2.0\n+1 1:1.8\n-1 1:-1.8\n", "single feature"),
        (
            "+1 1:0.1 2:0.2 3:0.3 4:0.4 5:0.5\n-1 1:-0.1 2:-0.2 3:-0.3 4:-0.4 5:-0.5\n",
            "many features",
        ),
        ("+1 1:1e-3 2:2.5E2\n-1 1:-1e-3 2:-2.5E2\n", "exponent values"),
        ("+1\t1:1.0  2:0.5\r\n-1 1:-1.0\t2:-0.5\r\n", "mixed whitespace"),
    ];

    for (data, description) in test_cases {
        let temp_file = write_temp(data);
        let dataset = LibSVMDataset::from_file(temp_file.path())
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", description, e));

        assert!(dataset.len() >= 2, "too few rows: {}", description);
        assert!(dataset.max_index() > 0, "no features: {}", description);

        let model = SVM::new()
            .with_kernel(KernelType::Linear)
            .with_c(10.0)
            .train(dataset.problem())
            .unwrap_or_else(|e| panic!("Training failed for {}: {}", description, e));
        assert_eq!(model.labels().len(), 2, "{}", description);
        assert!(model.total_sv() > 0, "{}", description);
    }
}

#[test]
fn test_multiclass_labels_survive_loading() {
    let data = "\
3 1:0.0 2:3.0
1 1:0.0 2:0.0
2 1:3.0 2:0.0
3 1:0.2 2:3.1
1 1:0.1 2:0.2
2 1:3.2 2:0.1
";
    let temp_file = write_temp(data);
    let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();
    assert_eq!(dataset.labels(), &[3.0, 1.0, 2.0, 3.0, 1.0, 2.0]);

    let model = SVM::new().with_gamma(0.5).train(dataset.problem()).unwrap();

    // classes keep first-occurrence order
    assert_eq!(model.labels(), &[3, 1, 2]);
    assert_eq!(evaluate(&model, dataset.problem()).accuracy(), 1.0);
}

#[test]
fn test_minus_one_first_is_reordered() {
    let temp_file = write_temp("-1 1:-1.0\n+1 1:1.0\n-1 1:-2.0\n+1 1:2.0\n");
    let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();
    let model = SVM::new()
        .with_kernel(KernelType::Linear)
        .train(dataset.problem())
        .unwrap();

    assert_eq!(model.labels(), &[1, -1]);
    let (_, values) = model.predict_values(dataset.problem().row(1));
    assert!(values[0] > 0.0, "positive class should score positive");
}

#[test]
fn test_gamma_derived_from_max_index() {
    let temp_file = write_temp("+1 1:1.0 4:1.0\n-1 2:1.0 3:-1.0\n");
    let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();

    let model = SVM::new().train(dataset.problem()).unwrap();
    assert_eq!(model.param().gamma, 0.25);
}

#[test]
fn test_malformed_files() {
    let cases = [
        ("+1 1:0.5\n-1 1:\n", 2),
        ("+1 1:0.5\n\n# fine\nabc 1:1.0\n", 4),
        ("+1 2:0.5 1:0.3\n", 1),
        ("+1 1-0.5\n", 1),
    ];

    for (data, expected_line) in cases {
        let temp_file = write_temp(data);
        match LibSVMDataset::from_file(temp_file.path()) {
            Err(SVMError::ParseError { line, .. }) => assert_eq!(line, expected_line, "{:?}", data),
            other => panic!("expected parse error for {:?}, got {:?}", data, other),
        }
    }
}

#[test]
fn test_precomputed_file_round_trip() {
    // linear kernel values of the points 1, 2, -1, -2
    let xs = [1.0f64, 2.0, -1.0, -2.0];
    let mut data = String::new();
    for (i, x) in xs.iter().enumerate() {
        let label = if *x > 0.0 { "+1" } else { "-1" };
        data.push_str(&format!("{} 0:{}", label, i + 1));
        for (j, other) in xs.iter().enumerate() {
            data.push_str(&format!(" {}:{}", j + 1, x * other));
        }
        data.push('\n');
    }

    let temp_file = write_temp(&data);
    let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();
    let model = SVM::new()
        .with_kernel(KernelType::Precomputed)
        .train(dataset.problem())
        .unwrap();

    assert_eq!(evaluate(&model, dataset.problem()).accuracy(), 1.0);
    for k in 0..model.total_sv() {
        // support vectors keep only their serial number
        assert_eq!(model.support_vector(k)[0].index, 0);
        assert!(model.support_vector(k)[1].is_terminator());
    }
}
