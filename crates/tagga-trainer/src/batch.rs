//! Minibatch scheduling.

/// Batch sizes that grow geometrically from `start` towards `stop`.
///
/// Each yielded size is the current value clipped to `stop`; the value is
/// then multiplied by `factor`. The sequence is infinite.
#[derive(Debug, Clone)]
pub struct Compounding {
    start: f64,
    current: f64,
    stop: f64,
    factor: f64,
}

impl Compounding {
    pub fn new(start: f64, stop: f64, factor: f64) -> Self {
        Self {
            start,
            current: start,
            stop,
            factor,
        }
    }
}

impl Default for Compounding {
    /// 4 up to 32, growing by 0.1% per batch.
    fn default() -> Self {
        Self::new(4.0, 32.0, 1.001)
    }
}

impl Iterator for Compounding {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let (low, high) = if self.start <= self.stop {
            (self.start, self.stop)
        } else {
            (self.stop, self.start)
        };
        let value = self.current.clamp(low, high);
        self.current *= self.factor;
        Some(value)
    }
}

/// Splits `items` into consecutive batches whose lengths are drawn from `sizes`.
///
/// Sizes are truncated to integers with a floor of one item; the final batch
/// may be shorter.
pub fn minibatches<'a, T>(items: &'a [T], sizes: &mut impl Iterator<Item = f64>) -> Vec<&'a [T]> {
    let mut batches = Vec::new();
    let mut rest = items;
    while !rest.is_empty() {
        let size = sizes.next().map_or(1, |s| (s as usize).max(1));
        let (batch, tail) = rest.split_at(size.min(rest.len()));
        batches.push(batch);
        rest = tail;
    }
    batches
}
