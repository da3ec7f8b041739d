use crate::cli::RunArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use bfm::core::rng::RandomNumberEngine;
use bfm::engine::progress::ProgressReporter;
use bfm::workflows::simulate::{self, SweepSummary};
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;

    let mut system = final_config.build_system()?;
    let mut rng = match final_config.seed {
        Some(seed) => RandomNumberEngine::new(seed),
        None => RandomNumberEngine::from_entropy_seed(),
    };
    info!(seed = rng.seed(), "Random number engine seeded.");

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Running {} sweep(s) on {} monomer(s)...",
        final_config.sweep.sweeps,
        system.molecules().len()
    );
    let summary = simulate::run(&mut system, &mut rng, &final_config.sweep, &reporter)?;

    print!("{}", report(&summary, rng.seed()));
    print!("{}", system.metadata());
    Ok(())
}

fn report(summary: &SweepSummary, seed: u64) -> String {
    format!(
        "Seed: {seed}\nAccepted {} of {} move(s) ({:.2}%).\nFinal age: {}\n",
        summary.accepted,
        summary.attempted,
        summary.acceptance_rate() * 100.0,
        summary.final_age
    )
}
