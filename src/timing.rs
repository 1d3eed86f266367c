use std::time::{Duration, Instant};

use tracing::info;

enum Label {
    Run(&'static str),
    Batch(usize),
}

/// Scoped wall-clock timer; reports elapsed time when dropped, so the
/// report runs on every exit path.
pub struct Timer {
    label: Label,
    start: Instant,
}

impl Timer {
    pub fn run(name: &'static str) -> Self {
        Self {
            label: Label::Run(name),
            start: Instant::now(),
        }
    }

    pub fn batch(sequence: usize) -> Self {
        Self {
            label: Label::Batch(sequence),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        match self.label {
            Label::Run(name) => info!("{}: execution time: {:?}", name, self.start.elapsed()),
            Label::Batch(sequence) => {
                info!("Batch #{} finished in: {:?}", sequence, self.start.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let timer = Timer::run("test");
        let a = timer.elapsed();
        let b = timer.elapsed();
        assert!(b >= a);
    }
}
