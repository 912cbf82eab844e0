use serde::{Deserialize, Serialize};

/// Column names of a [`DayRecord`] row, after `day`.
pub const COLUMNS: [&str; 6] = ["cum_infections", "n_infectious", "S", "E", "I", "R"];

/// Aggregate counters of one simulated day.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DayRecord {
    pub day: usize,
    pub cum_infections: usize,
    pub n_infectious: usize,
    #[serde(rename = "S")]
    pub n_s: usize,
    #[serde(rename = "E")]
    pub n_e: usize,
    #[serde(rename = "I")]
    pub n_i: usize,
    #[serde(rename = "R")]
    pub n_r: usize,
}

impl DayRecord {
    /// Day-0 record of a freshly seeded population.
    pub fn initial(population: usize, n_infectious: usize) -> Self {
        Self {
            day: 0,
            cum_infections: n_infectious,
            n_infectious,
            n_s: population - n_infectious,
            n_e: 0,
            n_i: n_infectious,
            n_r: 0,
        }
    }

    /// Counter values in [`COLUMNS`] order.
    pub fn values(&self) -> [usize; 6] {
        [
            self.cum_infections,
            self.n_infectious,
            self.n_s,
            self.n_e,
            self.n_i,
            self.n_r,
        ]
    }

    pub fn total(&self) -> usize {
        self.n_s + self.n_e + self.n_i + self.n_r
    }
}

/// Headline numbers of one run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub seed: u64,
    pub elapsed_secs: f64,
    pub peak_infectious: usize,
    pub peak_day: usize,
    pub total_infections: usize,
    /// Fraction of the population that left the susceptible compartment.
    pub attack_rate: f64,
}

impl Summary {
    pub fn new(record_vec: &[DayRecord], population: usize, seed: u64, elapsed_secs: f64) -> Self {
        // The first peak wins on ties.
        let peak = record_vec
            .iter()
            .rev()
            .max_by_key(|rec| rec.n_infectious)
            .copied()
            .unwrap_or_default();
        let last = record_vec.last().copied().unwrap_or_default();
        Self {
            seed,
            elapsed_secs,
            peak_infectious: peak.n_infectious,
            peak_day: peak.day,
            total_infections: last.cum_infections,
            attack_rate: (population - last.n_s) as f64 / population as f64,
        }
    }
}

/// Running mean and sample variance (Welford).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}
