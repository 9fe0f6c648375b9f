//! Progress events emitted by long-running workflows, consumed by an
//! optional caller-supplied callback (the CLI wires these to a progress
//! bar; library users can ignore them).

#[derive(Debug, Clone)]
pub enum Progress {
    /// An annealing stage begins at the given temperature.
    StageStart { temperature: f64, steps: u64 },
    /// One Monte Carlo step finished, accepted or not.
    StepComplete { accepted: bool },
    /// The stage finished with the given tallies.
    StageFinish { accepted: u64, attempted: u64 },

    Message(String),
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

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
