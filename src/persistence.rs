//! Model serialization and persistence
//!
//! Models are stored as JSON in a small envelope that records the library
//! version and the time the file was written. The libsvm text format lives
//! in [`crate::model::text`]; this module is the serde alternative used when
//! a model path ends in `.json`.

use crate::core::{Result, SVMError};
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable wrapper around a trained model
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Model metadata
    pub metadata: ModelMetadata,
    /// The trained model itself
    pub model: Model,
}

/// Model metadata for tracking and validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Total number of support vectors
    pub n_support_vectors: usize,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl SerializableModel {
    /// Wrap a trained model, stamping the current version and time
    pub fn from_model(model: Model) -> Self {
        Self {
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_support_vectors: model.total_sv(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            model,
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;

        if model.metadata.n_support_vectors != model.model.total_sv() {
            return Err(SVMError::ModelFormat(format!(
                "metadata lists {} support vectors but the model holds {}",
                model.metadata.n_support_vectors,
                model.model.total_sv()
            )));
        }
        model.model.validate()?;
        Ok(model)
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Print model summary
    pub fn print_summary(&self) {
        print_model_summary(&self.model);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
    }
}

/// Print a human-readable summary of a model
pub fn print_model_summary(model: &Model) {
    let param = model.param();
    println!("=== SVM Model Summary ===");
    println!("SVM Type: {}", param.svm_type);
    println!("Kernel Type: {}", param.kernel_type);
    if param.kernel_type.uses_gamma() {
        println!("  gamma: {}", param.gamma);
    }
    if param.kernel_type.uses_coef0() {
        println!("  coef0: {}", param.coef0);
    }
    if param.kernel_type == crate::core::KernelType::Polynomial {
        println!("  degree: {}", param.degree);
    }
    println!("Classes: {}", model.nr_class());
    if !model.labels().is_empty() {
        println!("Labels: {:?}", model.labels());
        println!("Support Vectors per class: {:?}", model.n_sv());
    }
    println!("Support Vectors: {}", model.total_sv());
    println!("Rho: {:?}", model.rho());
    println!("Probability: {}", model.has_probability());
}

/// Save a model, choosing JSON for `.json` paths and the libsvm text format
/// otherwise
pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let path = path.as_ref();
    if is_json(path) {
        SerializableModel::from_model(model.clone()).save_to_file(path)
    } else {
        model.dump(path)
    }
}

/// Load a model written by [`save_model`]
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    if is_json(path) {
        SerializableModel::load_from_file(path).map(SerializableModel::into_model)
    } else {
        Model::read(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Parameter, Problem, SparseVector};
    use crate::train::train;
    use tempfile::TempDir;

    fn toy_model() -> Model {
        let mut problem = Problem::new();
        for (label, x) in [(1.0, 2.0), (-1.0, -2.0), (1.0, 1.5), (-1.0, -1.5)] {
            problem.push(label, &SparseVector::from_dense(&[x]));
        }
        train(&problem, &Parameter::default()).unwrap()
    }

    #[test]
    fn test_model_serialization() -> Result<()> {
        let model = toy_model();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("model.json");

        let serializable = SerializableModel::from_model(model.clone());
        serializable.save_to_file(&path)?;
        let loaded = SerializableModel::load_from_file(&path)?;

        assert_eq!(loaded.metadata.library_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(loaded.metadata.n_support_vectors, model.total_sv());
        assert_eq!(loaded.model.labels(), model.labels());
        assert_eq!(loaded.model.n_sv(), model.n_sv());
        assert_eq!(loaded.model.param(), model.param());
        Ok(())
    }

    #[test]
    fn test_save_model_picks_format_by_extension() -> Result<()> {
        let model = toy_model();
        let dir = TempDir::new().expect("Failed to create temp dir");

        let json = dir.path().join("model.json");
        let text = dir.path().join("model.txt");
        save_model(&model, &json)?;
        save_model(&model, &text)?;

        let head = std::fs::read_to_string(&text)?;
        assert!(head.starts_with("svm_type c_svc\n"));
        assert!(std::fs::read_to_string(&json)?.trim_start().starts_with('{'));

        let x = SparseVector::from_dense(&[0.7]);
        assert_eq!(load_model(&json)?.predict(x.nodes()), model.predict(x.nodes()));
        assert_eq!(load_model(&text)?.predict(x.nodes()), model.predict(x.nodes()));
        Ok(())
    }

    #[test]
    fn test_load_rejects_inconsistent_model() -> Result<()> {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("edited.json");

        let mut model = toy_model();
        model.n_sv.clear();
        SerializableModel::from_model(model).save_to_file(&path)?;
        let result = load_model(&path);
        assert!(matches!(result, Err(SVMError::ModelFormat(_))));

        let mut model = toy_model();
        model.rho.push(0.5);
        SerializableModel::from_model(model).save_to_file(&path)?;
        let result = load_model(&path);
        assert!(matches!(result, Err(SVMError::ModelFormat(_))));
        Ok(())
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = SerializableModel::load_from_file(&path);
        assert!(matches!(result, Err(SVMError::SerializationError(_))));
    }
}
