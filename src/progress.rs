use std::time::Instant;

use tracing::info;

/// Row-level progress for one table being filled.
pub struct FillProgress {
    label: String,
    total: usize,
    t0: Instant,
}

impl FillProgress {
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            t0: Instant::now(),
        }
    }

    pub fn entry(&self, current: usize, text: &str) {
        info!("{} {}: {}", self.prefix(), self.counter(current), text);
    }

    pub fn skipped(&self, current: usize) {
        info!(
            "{} {}: skipped, empty English text",
            self.prefix(),
            self.counter(current)
        );
    }

    pub fn elapsed(&self) -> String {
        fmt_elapsed(self.t0.elapsed().as_secs_f64())
    }

    fn prefix(&self) -> String {
        format!("[{}] {}", self.elapsed(), self.label)
    }

    fn counter(&self, current: usize) -> String {
        let total = self.total.max(1);
        let current = current.min(total);
        let pct = (current as f64 / total as f64) * 100.0;
        format!("{current}/{total} ({pct:5.1}%)")
    }
}

fn fmt_elapsed(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
