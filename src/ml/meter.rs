// ============================================================
// Layer 5 — Running Average Meter
// ============================================================
// Weighted running average over a stream of batch metrics.
//
//   update(value, weight): sum += value * weight, count += weight
//   average():             sum / count, or 0 when nothing was fed
//   latest():              the last value passed to update
//
// Single-threaded accumulation only.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meter {
    latest: f64,
    sum:    f64,
    count:  usize,
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64, weight: usize) {
        self.latest = value;
        self.sum   += value * weight as f64;
        self.count += weight;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    pub fn latest(&self) -> f64 {
        self.latest
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.count
    }
}
