// ── Scale display debounce ──

use crate::telemetry::WeightSample;

/// A displayed value only moves when the reading changed by at least
/// this much, unless the scale flags the reading as stable.
pub const DISPLAY_THRESHOLD_G: f64 = 3.0;

/// Readings this close to zero render as exactly 0 (tare drift).
pub const ZERO_CLAMP_G: f64 = 20.0;

/// Debounces raw scale readings into a steady display weight.
///
/// Load cells jitter by a gram or two between reports; repainting the
/// display for every flicker makes the number unreadable. The filter
/// holds the last displayed value until the reading moves by
/// [`DISPLAY_THRESHOLD_G`] or arrives flagged stable, which always
/// wins so a settled value is never stuck behind the threshold.
#[derive(Debug, Default)]
pub struct StabilityFilter {
    last_display: Option<f64>,
}

impl StabilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reading (or `None` to reset) and get the value to show.
    ///
    /// The returned weight has the zero clamp applied; the held value
    /// does not, so drift around the clamp boundary still debounces
    /// correctly.
    pub fn update(&mut self, sample: Option<&WeightSample>) -> Option<f64> {
        let Some(sample) = sample else {
            self.last_display = None;
            return None;
        };

        let accept = match self.last_display {
            None => true,
            Some(last) => sample.stable || (sample.grams - last).abs() >= DISPLAY_THRESHOLD_G,
        };
        if accept {
            self.last_display = Some(sample.grams);
        }

        self.last_display.map(clamp_zero)
    }

    /// The current display value, without feeding a new reading.
    pub fn current(&self) -> Option<f64> {
        self.last_display.map(clamp_zero)
    }

    pub fn reset(&mut self) {
        self.last_display = None;
    }
}

fn clamp_zero(grams: f64) -> f64 {
    if grams.abs() <= ZERO_CLAMP_G { 0.0 } else { grams }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(grams: f64, stable: bool) -> WeightSample {
        WeightSample {
            device_id: "sb-01".into(),
            grams,
            stable,
            raw_adc: None,
        }
    }

    #[test]
    fn first_reading_always_displays() {
        let mut filter = StabilityFilter::new();
        assert_eq!(filter.update(Some(&sample(498.0, false))), Some(498.0));
    }

    #[test]
    fn small_jitter_holds_previous_value() {
        let mut filter = StabilityFilter::new();
        filter.update(Some(&sample(498.0, false)));
        // 2.5g below the 3g threshold: display holds
        assert_eq!(filter.update(Some(&sample(500.5, false))), Some(498.0));
        assert_eq!(filter.current(), Some(498.0));
    }

    #[test]
    fn threshold_crossing_updates() {
        let mut filter = StabilityFilter::new();
        filter.update(Some(&sample(498.0, false)));
        assert_eq!(filter.update(Some(&sample(501.0, false))), Some(501.0));
    }

    #[test]
    fn stable_flag_overrides_threshold() {
        let mut filter = StabilityFilter::new();
        filter.update(Some(&sample(498.0, false)));
        // Only 1g moved, but the scale says it settled there
        assert_eq!(filter.update(Some(&sample(499.0, true))), Some(499.0));
    }

    #[test]
    fn near_zero_renders_as_zero() {
        let mut filter = StabilityFilter::new();
        assert_eq!(filter.update(Some(&sample(12.0, true))), Some(0.0));
        assert_eq!(filter.update(Some(&sample(-15.0, true))), Some(0.0));
        assert_eq!(filter.update(Some(&sample(20.0, true))), Some(0.0));
        assert_eq!(filter.update(Some(&sample(21.0, true))), Some(21.0));
    }

    #[test]
    fn clamp_does_not_poison_debounce_state() {
        let mut filter = StabilityFilter::new();
        filter.update(Some(&sample(12.0, true))); // shows 0
        // 13.5 is within 3g of the *held* 12.0, so it must hold
        assert_eq!(filter.update(Some(&sample(13.5, false))), Some(0.0));
        // 22.0 is >= 3g away from 12.0 and outside the clamp band
        assert_eq!(filter.update(Some(&sample(22.0, false))), Some(22.0));
    }

    #[test]
    fn none_resets_the_filter() {
        let mut filter = StabilityFilter::new();
        filter.update(Some(&sample(498.0, true)));
        assert_eq!(filter.update(None), None);
        assert_eq!(filter.current(), None);
        // Next reading displays unconditionally again
        assert_eq!(filter.update(Some(&sample(1.0, false))), Some(0.0));
    }
}
