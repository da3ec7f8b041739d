/// Events emitted by long-running workflows.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// Running acceptance tally after a completed sweep.
    Acceptance { accepted: u64, attempted: u64 },

    Message(String),
}

impl Progress {
    /// Accepted fraction for `Acceptance` events.
    pub fn acceptance_rate(&self) -> Option<f64> {
        match *self {
            Progress::Acceptance {
                accepted,
                attempted,
            } if attempted > 0 => Some(accepted as f64 / attempted as f64),
            _ => None,
        }
    }
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// No callback attached; callers may skip building expensive events.
    pub fn is_silent(&self) -> bool {
        self.callback.is_none()
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
