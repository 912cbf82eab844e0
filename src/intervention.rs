use crate::config::InterventionConfig;

/// Interventions ordered by start day.
#[derive(Debug, Default, Clone)]
pub struct Schedule {
    itv_vec: Vec<InterventionConfig>,
}

impl Schedule {
    pub fn new(mut itv_vec: Vec<InterventionConfig>) -> Self {
        // Stable: among equal start days the later entry stays last and wins.
        itv_vec.sort_by_key(|itv| itv.start_day);
        Self { itv_vec }
    }

    /// Multiplier of the latest intervention started on or before `day`, or 1.0.
    pub fn multiplier(&self, day: usize) -> f64 {
        let n_started = self.itv_vec.partition_point(|itv| itv.start_day <= day);
        match n_started {
            0 => 1.0,
            n => self.itv_vec[n - 1].multiplier,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.itv_vec.is_empty()
    }
}
