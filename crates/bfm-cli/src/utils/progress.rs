use bfm::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Terminal rendering of sweep progress: a spinner while a phase sets up, a
/// sweep counter with the running acceptance rate while sweeps run.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target)
            .with_style(phase_style())
            .with_message("Initializing...");
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = Arc::clone(&self.pb);
        Box::new(move |event: Progress| match pb.lock() {
            Ok(pb) => render(&pb, event),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn render(pb: &ProgressBar, event: Progress) {
    match event {
        Progress::PhaseStart { name } => {
            pb.reset();
            pb.set_length(0);
            pb.set_style(phase_style());
            pb.set_message(name);
            pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        }
        Progress::TaskStart { total_steps } => {
            pb.disable_steady_tick();
            pb.reset();
            pb.set_length(total_steps);
            pb.set_style(sweep_style());
            pb.set_message("acc     -");
        }
        Progress::TaskIncrement => pb.inc(1),
        event @ Progress::Acceptance { .. } => {
            if let Some(rate) = event.acceptance_rate() {
                pb.set_message(format!("acc {:>5.1}%", rate * 100.0));
            }
        }
        Progress::TaskFinish => {
            // A run stopped early still shows a full bar.
            if let Some(length) = pb.length() {
                pb.set_position(length);
            }
            pb.finish();
        }
        Progress::PhaseFinish => {
            pb.disable_steady_tick();
            pb.finish_with_message("✓ Done");
        }
        Progress::Message(msg) if pb.is_finished() => pb.set_message(msg),
        Progress::Message(msg) => pb.println(format!("  {msg}")),
    }
}

fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn sweep_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<10} [{bar:40.cyan/blue}] {pos}/{len} sweeps ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
}
