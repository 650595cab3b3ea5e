/// A bounded value with an optional skewed mapping onto the slider's travel.
///
/// The proportion is the normalised position along the slider (0.0 to 1.0).
/// With a skew of 1.0 the mapping is linear; a skew below 1.0 gives more of
/// the travel to the low end of the range, which suits frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    min: f64,
    max: f64,
    skew: f64,
    value: f64,
}

impl Slider {
    /// Creates a linear slider over `[min, max]` holding `value` (clamped).
    ///
    /// # Panics
    ///
    /// Panics if `min` is not below `max`.
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        assert!(min < max, "empty slider range {min}..{max}");
        Slider {
            min,
            max,
            skew: 1.0,
            value: value.clamp(min, max),
        }
    }

    /// Skews the mapping so that `midpoint` sits in the middle of the travel.
    ///
    /// # Panics
    ///
    /// Panics if `midpoint` is not strictly inside the range.
    pub fn with_midpoint(mut self, midpoint: f64) -> Self {
        assert!(self.min < midpoint && midpoint < self.max);
        let position = (midpoint - self.min) / (self.max - self.min);
        self.skew = 0.5f64.ln() / position.ln();
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn skew(&self) -> f64 {
        self.skew
    }

    pub fn proportion(&self) -> f64 {
        self.value_to_proportion(self.value)
    }

    pub fn value_to_proportion(&self, value: f64) -> f64 {
        let linear = (value.clamp(self.min, self.max) - self.min) / (self.max - self.min);
        linear.powf(self.skew)
    }

    pub fn proportion_to_value(&self, proportion: f64) -> f64 {
        let proportion = proportion.clamp(0.0, 1.0);
        let linear = if self.skew == 1.0 {
            proportion
        } else if proportion > 0.0 {
            (proportion.ln() / self.skew).exp()
        } else {
            0.0
        };
        (self.min + (self.max - self.min) * linear).clamp(self.min, self.max)
    }

    /// Sets the value, clamped to the range. Returns whether it changed.
    pub fn set_value(&mut self, value: f64) -> bool {
        let value = value.clamp(self.min, self.max);
        let changed = value != self.value;
        self.value = value;
        changed
    }

    pub fn set_proportion(&mut self, proportion: f64) -> bool {
        self.set_value(self.proportion_to_value(proportion))
    }

    /// Moves the slider by `delta` of its travel. Returns whether it changed.
    pub fn nudge(&mut self, delta: f64) -> bool {
        self.set_proportion(self.proportion() + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_linear_slider() {
        let mut slider = Slider::new(0.0, 0.125, 0.125);
        assert_eq!(slider.skew(), 1.0);
        assert_eq!(slider.proportion(), 1.0);
        assert!(slider.set_proportion(0.5));
        assert_eq!(slider.value(), 0.0625);
        assert!(!slider.set_value(0.0625));
        assert!(slider.set_value(1.0));
        assert_eq!(slider.value(), 0.125);
        assert!(slider.set_value(-1.0));
        assert_eq!(slider.value(), 0.0);
    }

    #[test]
    fn test_midpoint_skew() {
        let slider = Slider::new(50.0, 5000.0, 500.0).with_midpoint(500.0);
        assert!(slider.skew() < 1.0);
        assert!(close(slider.proportion_to_value(0.0), 50.0));
        assert!(close(slider.proportion_to_value(0.5), 500.0));
        assert!(close(slider.proportion_to_value(1.0), 5000.0));
        assert!(close(slider.proportion(), 0.5));

        for step in 0..=20 {
            let proportion = step as f64 / 20.0;
            let value = slider.proportion_to_value(proportion);
            assert!((50.0..=5000.0).contains(&value));
            assert!(close(slider.value_to_proportion(value), proportion));
        }
    }

    #[test]
    fn test_nudge_stays_in_range() {
        let mut slider = Slider::new(50.0, 5000.0, 500.0).with_midpoint(500.0);
        let mut last = slider.value();
        while slider.nudge(0.02) {
            assert!(slider.value() > last);
            last = slider.value();
        }
        assert_eq!(slider.value(), 5000.0);
        assert!(!slider.nudge(0.5));

        while slider.nudge(-0.3) {}
        assert_eq!(slider.value(), 50.0);
    }

    #[test]
    #[should_panic]
    fn test_empty_range() {
        let _ = Slider::new(1.0, 1.0, 1.0);
    }
}
