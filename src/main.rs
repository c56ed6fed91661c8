//! Checks the parallel multi cross-entropy kernel against the sequential
//! reference on seeded random inputs.
//!
//! Usage:
//!   multi-ce-check
//!   multi-ce-check --batch-size 1024 --label-dim 11 --scaler 128 --seed 42
//!   multi-ce-check --config run.json --write-fixture golden.json
//!
//! Set `RUST_LOG=debug` to see per-call kernel logs.

use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ferrite_mce::{
    first_mismatch, reference_multi_cross_entropy, Buffer, Fixture, GradientScaler, LossConfig,
    MultiCrossEntropyLoss, Result, DEFAULT_TOLERANCE,
};

#[derive(Parser, Debug)]
#[command(name = "multi-ce-check", about = "Compare the fused loss kernel with its reference")]
struct Args {
    /// JSON `LossConfig`; overrides the shape/scaler/seed flags
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "1024")]
    batch_size: usize,

    #[arg(long, default_value = "11")]
    label_dim: usize,

    /// One of 1, 128, 256, 512, 1024
    #[arg(long, default_value = "1")]
    scaler: u32,

    #[arg(long, default_value = "0")]
    seed: u64,

    /// Worker threads; rayon's global pool when absent
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f32,

    /// Also write the inputs and reference outputs as a fixture
    #[arg(long)]
    write_fixture: Option<String>,
}

fn load_config(args: &Args) -> Result<LossConfig> {
    if let Some(path) = &args.config {
        return LossConfig::load_json(path);
    }
    let config = LossConfig {
        batch_size: args.batch_size,
        label_dim: args.label_dim,
        target_weight: None,
        scaler: GradientScaler::try_from(args.scaler)?,
        threads: args.threads,
        seed: args.seed,
    };
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<bool> {
    let config = load_config(args)?;
    let ctx = config.context()?;
    let weights = config.weights();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let logits = Buffer::random_uniform(config.batch_size, config.label_dim, &mut rng);
    let labels = Buffer::random_labels(config.batch_size, config.label_dim, &mut rng);

    let expected = reference_multi_cross_entropy(
        logits.as_slice(),
        labels.as_slice(),
        &weights,
        config.scaler,
    )?;

    let mut input = Buffer::zeros(config.batch_size, config.label_dim);
    input.copy_from_host(logits.as_slice())?;
    let mut loss = Buffer::zeros(1, 1);
    {
        let mut engine = MultiCrossEntropyLoss::new(
            &labels,
            &mut input,
            &mut loss,
            weights.clone(),
            config.scaler,
        )?;
        engine.compute(&ctx)?;
    }

    let mut gradients = vec![0.0; input.len()];
    input.copy_to_host(&mut gradients)?;
    let kernel_loss = loss.as_slice()[0];

    info!(
        batch_size = config.batch_size,
        label_dim = config.label_dim,
        scaler = %config.scaler,
        seed = config.seed,
        threads = ctx.threads(),
        kernel_loss,
        reference_loss = expected.loss,
        "kernel run finished"
    );

    let mut ok = true;
    if let Some(m) = first_mismatch(&expected.gradients, &gradients, args.tolerance) {
        error!(index = m.index, expected = m.expected, actual = m.actual, "gradient mismatch");
        ok = false;
    }
    if let Some(m) = first_mismatch(&[expected.loss], &[kernel_loss], args.tolerance) {
        error!(expected = m.expected, actual = m.actual, "loss mismatch");
        ok = false;
    }

    if let Some(path) = &args.write_fixture {
        let fixture = Fixture {
            batch_size: config.batch_size,
            label_dim: config.label_dim,
            scaler: config.scaler,
            seed: config.seed,
            target_weight: weights,
            logits: logits.into_vec(),
            labels: labels.into_vec(),
            loss: expected.loss,
            gradients: expected.gradients,
        };
        fixture.save_json(path)?;
        info!(path = %path, "fixture written");
    }

    Ok(ok)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => {
            println!("kernel matches reference");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("kernel does NOT match reference");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
