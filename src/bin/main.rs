//! smosvm Command Line Interface
//!
//! Train, apply and inspect SVM models stored in the libsvm model format
//! (or JSON when the model path ends in `.json`).

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use smosvm::api::{EvaluationMetrics, SVM};
use smosvm::core::{KernelType, Parameter, Result, SVMError, SvmType};
use smosvm::persistence::{load_model, print_model_summary, save_model};
use smosvm::LibSVMDataset;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "smosvm")]
#[command(about = "Support Vector Machine training and prediction with SMO")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// SVM type: 0 C-SVC, 1 nu-SVC, 2 one-class, 3 epsilon-SVR, 4 nu-SVR
    #[arg(short = 's', default_value_t = 0)]
    svm_type: i32,

    /// Kernel: 0 linear, 1 polynomial, 2 RBF, 3 sigmoid, 4 precomputed
    #[arg(short = 't', default_value_t = 2)]
    kernel_type: i32,

    /// Polynomial degree
    #[arg(short = 'd', default_value_t = 3)]
    degree: i32,

    /// Kernel gamma (0 derives 1/num_features)
    #[arg(short = 'g', default_value_t = 0.0)]
    gamma: f64,

    /// Kernel coef0
    #[arg(short = 'r', default_value_t = 0.0)]
    coef0: f64,

    /// Cost C for C-SVC, epsilon-SVR and nu-SVR
    #[arg(short = 'c', default_value_t = 1.0)]
    c: f64,

    /// nu for nu-SVC, one-class and nu-SVR
    #[arg(short = 'n', default_value_t = 0.5)]
    nu: f64,

    /// Epsilon-SVR tube width
    #[arg(short = 'p', default_value_t = 0.1)]
    p: f64,

    /// Stopping tolerance
    #[arg(short = 'e', default_value_t = 0.001)]
    eps: f64,

    /// Kernel cache size in MB
    #[arg(short = 'm', default_value_t = 100.0)]
    cache_size: f64,

    /// Fit probability estimates (0 or 1)
    #[arg(short = 'b', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    probability: u8,

    /// Class weight as LABEL=WEIGHT; repeatable
    #[arg(short = 'w', value_parser = parse_weight, allow_hyphen_values = true)]
    weights: Vec<(i32, f64)>,

    /// Worker threads for kernel columns (0 picks the machine default)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Training data file (LibSVM format)
    data: PathBuf,

    /// Output model file (defaults to <data>.model)
    model: Option<PathBuf>,
}

#[derive(Args)]
struct PredictArgs {
    /// Output probability estimates (0 or 1)
    #[arg(short = 'b', default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    probability: u8,

    /// Test data file (LibSVM format)
    data: PathBuf,

    /// Trained model file
    model: PathBuf,

    /// Output predictions file
    output: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn parse_weight(s: &str) -> std::result::Result<(i32, f64), String> {
    let (label, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=WEIGHT, got '{s}'"))?;
    let label = label
        .trim()
        .parse()
        .map_err(|_| format!("invalid label '{label}'"))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight '{weight}'"))?;
    Ok((label, weight))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn build_params(args: &TrainArgs) -> Result<Parameter> {
    let (weight_label, weight) = args.weights.iter().copied().unzip();
    Ok(Parameter {
        svm_type: SvmType::try_from(args.svm_type)?,
        kernel_type: KernelType::try_from(args.kernel_type)?,
        degree: args.degree,
        gamma: args.gamma,
        coef0: args.coef0,
        eps: args.eps,
        c: args.c,
        nu: args.nu,
        p: args.p,
        weight_label,
        weight,
        probability: args.probability == 1,
        cache_size: args.cache_size,
        num_threads: args.threads,
        max_iter: None,
    })
}

fn default_model_path(data: &Path) -> PathBuf {
    let mut name = data.file_name().unwrap_or_default().to_os_string();
    name.push(".model");
    data.with_file_name(name)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let param = build_params(&args)?;
    info!("Training SVM model...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: svm_type={}, kernel={}, C={}, nu={}, eps={}",
        param.svm_type, param.kernel_type, param.c, param.nu, param.eps
    );

    let dataset = LibSVMDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with max feature index {}",
        dataset.len(),
        dataset.max_index()
    );

    let model = SVM::with_params(param).train(dataset.problem())?;
    info!("Training completed successfully");
    info!("Support vectors: {}", model.total_sv());

    let output = args
        .model
        .clone()
        .unwrap_or_else(|| default_model_path(&args.data));
    save_model(&model, &output)?;
    info!("Model saved to: {:?}", output);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;

    let with_probability = args.probability == 1;
    if with_probability && !model.has_probability() {
        return Err(SVMError::InvalidParameter(
            "model does not support probability estimates".to_string(),
        ));
    }

    info!("Loading prediction data from: {:?}", args.data);
    let dataset = LibSVMDataset::from_file(&args.data)?;
    let problem = dataset.problem();

    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);
    let mut predicted = Vec::with_capacity(problem.len());

    if with_probability {
        let labels: Vec<String> = model.labels().iter().map(i32::to_string).collect();
        writeln!(writer, "labels {}", labels.join(" "))?;
    }

    for i in 0..problem.len() {
        if with_probability {
            let (label, estimates) = model.predict_probability(problem.row(i));
            let estimates: Vec<String> = estimates
                .unwrap_or_default()
                .iter()
                .map(|p| format!("{p}"))
                .collect();
            writeln!(writer, "{} {}", label, estimates.join(" "))?;
            predicted.push(label);
        } else {
            let label = model.predict(problem.row(i));
            writeln!(writer, "{label}")?;
            predicted.push(label);
        }
    }
    writer.flush()?;
    info!("Predictions saved to: {:?}", args.output);

    let metrics = EvaluationMetrics::from_predictions(&predicted, &problem.y);
    report(model.svm_type(), &metrics);

    Ok(())
}

fn report(svm_type: SvmType, metrics: &EvaluationMetrics) {
    match svm_type {
        SvmType::EpsilonSvr | SvmType::NuSvr => {
            println!(
                "Mean squared error = {} (regression)",
                metrics.mean_squared_error
            );
            println!(
                "Squared correlation coefficient = {} (regression)",
                metrics.squared_correlation
            );
        }
        _ => {
            println!(
                "Accuracy = {}% ({}/{}) (classification)",
                metrics.accuracy() * 100.0,
                metrics.correct,
                metrics.total
            );
        }
    }
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;

    print_model_summary(&model);

    if model.total_sv() > 0 {
        let first = model.support_vector(0);
        let shown: Vec<i32> = smosvm::row_entries(first).take(5).map(|n| n.index).collect();
        println!("\nFirst SV indices: {:?}", shown);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("1=2.5"), Ok((1, 2.5)));
        assert_eq!(parse_weight("-1=0.5"), Ok((-1, 0.5)));
        assert!(parse_weight("1:2").is_err());
        assert!(parse_weight("a=2").is_err());
    }

    #[test]
    fn test_default_model_path() {
        assert_eq!(
            default_model_path(Path::new("data/train.libsvm")),
            PathBuf::from("data/train.libsvm.model")
        );
    }

    #[test]
    fn test_cli_parses_libsvm_options() {
        let cli = Cli::try_parse_from([
            "smosvm", "train", "-s", "1", "-t", "0", "-n", "0.3", "-w", "1=2", "-w", "-1=0.5",
            "train.txt", "out.model",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else {
            panic!("expected train command");
        };
        let param = build_params(&args).unwrap();
        assert_eq!(param.svm_type, SvmType::NuSvc);
        assert_eq!(param.kernel_type, KernelType::Linear);
        assert_eq!(param.nu, 0.3);
        assert_eq!(param.weight_label, vec![1, -1]);
        assert_eq!(param.weight, vec![2.0, 0.5]);
    }
}
