/// Rounds half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Goals per 90 minutes, 0 when no minutes were played. Unrounded.
pub fn per_90(goals: i64, minutes: i64) -> f64 {
    if minutes > 0 {
        goals as f64 / minutes as f64 * 90.0
    } else {
        0.0
    }
}

pub fn mean(sum: f64, n: u32) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation from running sums, 0 for fewer than two samples
pub fn sample_std_dev(sum: f64, sum_of_squares: f64, n: u32) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    let variance = ((sum_of_squares - sum * sum / n) / (n - 1.0)).max(0.0);
    variance.sqrt()
}

/// Running sums for one series
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub n: u32,
    pub sum: f64,
    pub sum_of_squares: f64,
}

impl Accumulator {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.sum_of_squares += x * x;
    }

    pub fn mean(&self) -> f64 {
        mean(self.sum, self.n)
    }

    pub fn std_dev(&self) -> f64 {
        sample_std_dev(self.sum, self.sum_of_squares, self.n)
    }
}
