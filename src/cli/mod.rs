// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `finetune` — trains and stores the pretrained model
//   2. `unlearn`  — runs one resumable unlearning experiment
//   3. `report`   — prints a stored evaluation result
//
// The tensor backend is chosen here: Autodiff<Wgpu>.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};
use clap::Parser;
use commands::{Commands, FinetuneArgs, ReportArgs, UnlearnArgs};

type AppBackend = Autodiff<Wgpu>;

#[derive(Parser, Debug)]
#[command(
    name = "unlearn-eval",
    version = "0.1.0",
    about = "Fine-tune a text classifier, unlearn a forget set, and measure what remains."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Finetune(args) => run_finetune(args),
            Commands::Unlearn(args)  => run_unlearn(args),
            Commands::Report(args)   => run_report(args),
        }
    }
}

fn run_finetune(args: FinetuneArgs) -> Result<()> {
    use crate::application::finetune_use_case::FinetuneUseCase;

    tracing::info!("Fine-tuning on dataset '{}'", args.corpus.dataset);
    let device = WgpuDevice::default();
    FinetuneUseCase::new(args.into()).execute::<AppBackend>(&device)?;

    println!("Fine-tuning complete. Checkpoint saved.");
    Ok(())
}

fn run_unlearn(args: UnlearnArgs) -> Result<()> {
    use crate::application::unlearn_use_case::UnlearnUseCase;

    tracing::info!(
        "Unlearning with '{}' (forget_ratio={}) on '{}'",
        args.unlearn_method, args.forget_ratio, args.corpus.dataset,
    );
    let device = WgpuDevice::default();
    let result = UnlearnUseCase::new(args.into()).execute::<AppBackend>(&device)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<()> {
    use crate::application::report_use_case::ReportUseCase;

    let report = ReportUseCase::new(
        &args.checkpoint_dir,
        &args.model_id,
        &args.dataset,
        args.unlearn_method,
        args.forget_ratio,
    );
    println!("{}", serde_json::to_string_pretty(&report.execute()?)?);
    Ok(())
}
