use crate::core::rng::RandomNumberEngine;
use crate::engine::config::SweepConfig;
use crate::engine::error::EngineError;
use crate::engine::moves::{LocalMove, MonteCarloMove};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::system::LatticeSystem;
use tracing::{debug, info, instrument};

/// Totals of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub attempted: u64,
    pub accepted: u64,
    pub final_age: u64,
}

impl SweepSummary {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

/// Metropolis test on a checked move: certain acceptance at `p >= 1`,
/// otherwise one uniform draw.
#[inline]
fn metropolis(rng: &mut RandomNumberEngine, probability: f64) -> bool {
    probability >= 1.0 || rng.uniform_f64() < probability
}

/// Runs `config.sweeps` Monte-Carlo sweeps of local moves.
///
/// A sweep makes one attempt per monomer present at its start and advances
/// the age by one. Empty systems only age.
///
/// # Errors
///
/// Propagates engine errors from drawing or applying moves; rejections are
/// counted, not returned.
#[instrument(skip_all, name = "sweep_workflow", fields(sweeps = config.sweeps))]
pub fn run(
    system: &mut LatticeSystem,
    rng: &mut RandomNumberEngine,
    config: &SweepConfig,
    reporter: &ProgressReporter,
) -> Result<SweepSummary, EngineError> {
    info!(
        monomers = system.molecules().len(),
        move_set = ?config.move_set,
        seed = rng.seed(),
        "Starting sweep workflow."
    );
    reporter.report(Progress::PhaseStart { name: "Sweeps" });
    reporter.report(Progress::TaskStart {
        total_steps: config.sweeps,
    });

    let mut mv = LocalMove::new(config.move_set);
    let mut attempted = 0u64;
    let mut accepted = 0u64;

    for sweep in 0..config.sweeps {
        let attempts = system.molecules().len();
        for _ in 0..attempts {
            mv.init(system, rng)?;
            attempted += 1;
            if mv.check(system) && metropolis(rng, mv.probability()) {
                mv.apply(system)?;
                accepted += 1;
            }
        }
        system.advance_age(1);
        debug!(sweep, age = system.age(), accepted, "Sweep finished");

        reporter.report(Progress::TaskIncrement);
        if !reporter.is_silent() {
            reporter.report(Progress::Acceptance {
                accepted,
                attempted,
            });
        }
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let summary = SweepSummary {
        attempted,
        accepted,
        final_age: system.age(),
    };
    info!(
        attempted,
        accepted,
        rate = summary.acceptance_rate(),
        age = summary.final_age,
        "Sweep workflow complete."
    );
    Ok(summary)
}
