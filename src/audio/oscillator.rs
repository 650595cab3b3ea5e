use color_eyre::{Result, eyre::ensure};
use std::f64::consts::TAU;

/// Whether a block is rendered at a fixed frequency or glides toward a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorMode {
    Steady,
    Ramping,
}

/// Sine oscillator with block-local frequency glides.
///
/// The angle is never wrapped; `sin` takes care of the periodicity. A change of
/// frequency between blocks is spread linearly over the next block instead of
/// being applied at once, which keeps the output free of clicks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineOscillator {
    current_angle: f64,
    angle_delta: f64,
    current_frequency: f64,
    sample_rate: f64,
}

impl SineOscillator {
    /// Creates an oscillator that will start at `frequency` once prepared.
    pub fn new(frequency: f64) -> Self {
        SineOscillator {
            current_angle: 0.0,
            angle_delta: 0.0,
            current_frequency: frequency,
            sample_rate: 0.0,
        }
    }

    /// Starts a playback session at the given sample rate.
    ///
    /// Resets the angle to zero and recomputes the per-sample increment for the
    /// frequency currently being rendered.
    ///
    /// # Errors
    ///
    /// Fails if `sample_rate` is not a finite, strictly positive number.
    pub fn prepare(&mut self, sample_rate: f64) -> Result<()> {
        ensure!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "invalid sample rate: {sample_rate}"
        );
        self.sample_rate = sample_rate;
        self.current_angle = 0.0;
        self.update_angle_delta();
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn current_frequency(&self) -> f64 {
        self.current_frequency
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn angle_delta(&self) -> f64 {
        self.angle_delta
    }

    /// The mode the next block would be rendered in for `target_frequency`.
    pub fn mode_for(&self, target_frequency: f64) -> OscillatorMode {
        if target_frequency == self.current_frequency {
            OscillatorMode::Steady
        } else {
            OscillatorMode::Ramping
        }
    }

    /// Renders one block into separate left and right channel buffers.
    ///
    /// The block length is the length of the buffers. Both channels receive the
    /// same signal. This function does not allocate, lock or block.
    ///
    /// # Arguments
    ///
    /// * `target_frequency` – The frequency the oscillator should reach by the end of the block.
    /// * `level` – Linear gain applied to every sample.
    /// * `left` – Left channel output.
    /// * `right` – Right channel output, same length as `left`.
    pub fn render_block(
        &mut self,
        target_frequency: f64,
        level: f64,
        left: &mut [f32],
        right: &mut [f32],
    ) {
        debug_assert_eq!(left.len(), right.len());
        let num_samples = left.len().min(right.len());
        self.render_with(target_frequency, level, num_samples, |index, sample| {
            left[index] = sample;
            right[index] = sample;
        });
    }

    /// Same as [`SineOscillator::render_block`] for interleaved stereo frames.
    pub fn render_frames(&mut self, target_frequency: f64, level: f64, frames: &mut [[f32; 2]]) {
        let num_samples = frames.len();
        self.render_with(target_frequency, level, num_samples, |index, sample| {
            frames[index] = [sample, sample];
        });
    }

    #[inline]
    fn render_with(
        &mut self,
        target_frequency: f64,
        level: f64,
        num_samples: usize,
        mut write: impl FnMut(usize, f32),
    ) {
        debug_assert!(self.is_prepared(), "render before prepare");
        if num_samples == 0 {
            return;
        }

        match self.mode_for(target_frequency) {
            OscillatorMode::Steady => {
                for index in 0..num_samples {
                    write(index, self.output(level));
                    self.current_angle += self.angle_delta;
                }
            }
            OscillatorMode::Ramping => {
                let frequency_increment =
                    (target_frequency - self.current_frequency) / num_samples as f64;
                for index in 0..num_samples {
                    write(index, self.output(level));
                    self.current_frequency += frequency_increment;
                    self.update_angle_delta();
                    self.current_angle += self.angle_delta;
                }
                // Drop the rounding error the increments accumulated.
                self.current_frequency = target_frequency;
                self.update_angle_delta();
            }
        }
    }

    #[inline]
    fn output(&self, level: f64) -> f32 {
        (self.current_angle.sin() * level) as f32
    }

    #[inline]
    fn update_angle_delta(&mut self) {
        let cycles_per_sample = self.current_frequency / self.sample_rate;
        self.angle_delta = cycles_per_sample * TAU;
    }
}

#[cfg(test)]
fn prepared(frequency: f64, sample_rate: f64) -> SineOscillator {
    let mut oscillator = SineOscillator::new(frequency);
    oscillator.prepare(sample_rate).unwrap();
    oscillator
}

#[test]
fn test_prepare() {
    let mut oscillator = SineOscillator::new(500.0);
    assert!(!oscillator.is_prepared());
    assert!(oscillator.prepare(0.0).is_err());
    assert!(oscillator.prepare(-44100.0).is_err());
    assert!(oscillator.prepare(f64::NAN).is_err());
    assert!(oscillator.prepare(f64::INFINITY).is_err());
    assert!(!oscillator.is_prepared());

    oscillator.prepare(44100.0).unwrap();
    assert!(oscillator.is_prepared());
    assert_eq!(oscillator.current_angle(), 0.0);
    assert!((oscillator.angle_delta() - TAU * 500.0 / 44100.0).abs() < 1e-15);

    let (mut left, mut right) = ([0.0; 100], [0.0; 100]);
    oscillator.render_block(500.0, 0.1, &mut left, &mut right);
    assert!(oscillator.current_angle() > 0.0);
    oscillator.prepare(48000.0).unwrap();
    assert_eq!(oscillator.current_angle(), 0.0);
    assert_eq!(oscillator.sample_rate(), 48000.0);
    assert!((oscillator.angle_delta() - TAU * 500.0 / 48000.0).abs() < 1e-15);
}

#[test]
fn test_steady_block_follows_phase_law() {
    let mut oscillator = prepared(440.0, 48000.0);
    let level = 0.1;
    let delta = TAU * 440.0 / 48000.0;
    let (mut left, mut right) = ([0.0; 256], [0.0; 256]);
    oscillator.render_block(440.0, level, &mut left, &mut right);

    for (i, sample) in left.iter().enumerate() {
        let expected = ((i as f64 * delta).sin() * level) as f32;
        assert!((sample - expected).abs() < 1e-6, "sample {i}: {sample} != {expected}");
    }
    assert_eq!(left, right);
    assert_eq!(oscillator.mode_for(440.0), OscillatorMode::Steady);
}

#[test]
fn test_steady_blocks_are_continuous() {
    let mut whole = prepared(1234.5, 44100.0);
    let mut split = whole;
    let (mut left, mut right) = ([0.0; 128], [0.0; 128]);
    whole.render_block(1234.5, 0.125, &mut left, &mut right);

    let (mut first, mut first_right) = ([0.0; 64], [0.0; 64]);
    let (mut second, mut second_right) = ([0.0; 64], [0.0; 64]);
    split.render_block(1234.5, 0.125, &mut first, &mut first_right);
    split.render_block(1234.5, 0.125, &mut second, &mut second_right);

    assert_eq!(left[..64], first);
    assert_eq!(left[64..], second);
    assert_eq!(whole, split);

    let delta = whole.angle_delta();
    let mut oscillator = prepared(1234.5, 44100.0);
    for block in 1..=10 {
        oscillator.render_block(1234.5, 0.125, &mut left, &mut right);
        let expected = (block * 128) as f64 * delta;
        assert!((oscillator.current_angle() - expected).abs() < 1e-9 * expected);
        assert_eq!(oscillator.angle_delta(), delta);
    }
}

#[test]
fn test_ramp_reaches_target() {
    let mut oscillator = prepared(500.0, 44100.0);
    let (mut left, mut right) = ([0.0; 333], [0.0; 333]);
    for target in [1000.0, 73.1, 4999.9, 500.0, 1.0 / 3.0] {
        assert_eq!(oscillator.mode_for(target), OscillatorMode::Ramping);
        oscillator.render_block(target, 0.125, &mut left, &mut right);
        assert_eq!(oscillator.current_frequency(), target);
        assert_eq!(oscillator.angle_delta(), target / 44100.0 * TAU);
        assert_eq!(oscillator.mode_for(target), OscillatorMode::Steady);
    }
}

#[test]
fn test_ramp_is_linear_in_frequency() {
    let (f0, f1, n, rate) = (500.0, 1000.0, 512usize, 44100.0);
    let mut oscillator = prepared(f0, rate);
    let (mut left, mut right) = (vec![0.0; n], vec![0.0; n]);
    oscillator.render_block(f1, 0.125, &mut left, &mut right);

    // The angle after the block is the sum of the per-sample increments of a
    // linear glide: TAU / rate * sum_{k=1..n} (f0 + k * (f1 - f0) / n).
    let increment = (f1 - f0) / n as f64;
    let n_f = n as f64;
    let expected = TAU / rate * (n_f * f0 + increment * n_f * (n_f + 1.0) / 2.0);
    assert!((oscillator.current_angle() - expected).abs() < 1e-9);
}

#[test]
fn test_ramp_scenario() {
    let mut oscillator = prepared(500.0, 44100.0);
    let (mut left, mut right) = ([0.0; 512], [0.0; 512]);
    oscillator.render_block(1000.0, 0.125, &mut left, &mut right);
    assert_eq!(oscillator.current_frequency(), 1000.0);

    let increment = 500.0 / 512.0;
    let mut frequency = 500.0;
    let mut angle: f64 = 0.0;
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let expected = (angle.sin() * 0.125) as f32;
        assert!((l - expected).abs() < 1e-6, "sample {i}: {l} != {expected}");
        assert_eq!(l, r);
        assert!(l.abs() <= 0.125);
        frequency += increment;
        angle += frequency / 44100.0 * TAU;
    }
}

#[test]
fn test_empty_block() {
    let mut oscillator = prepared(500.0, 44100.0);
    let (mut left, mut right) = ([0.0; 17], [0.0; 17]);
    oscillator.render_block(700.0, 0.125, &mut left, &mut right);
    let before = oscillator;

    oscillator.render_block(2000.0, 0.125, &mut [], &mut []);
    assert_eq!(oscillator, before);
    oscillator.render_frames(700.0, 0.125, &mut []);
    assert_eq!(oscillator, before);
}

#[test]
fn test_zero_level_is_silent() {
    let mut oscillator = prepared(500.0, 44100.0);
    let (mut left, mut right) = ([1.0; 64], [1.0; 64]);
    for target in [500.0, 3000.0, 50.0] {
        oscillator.render_block(target, 0.0, &mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }
}

#[test]
fn test_out_of_range_targets() {
    let mut oscillator = prepared(500.0, 44100.0);
    let mut frames = [[0.0; 2]; 256];
    for target in [10.0, 0.0, 20000.0, -300.0, 1.0e6, 5000.0] {
        oscillator.render_frames(target, 0.125, &mut frames);
        assert!(
            frames
                .iter()
                .all(|[l, r]| l.is_finite() && l == r && l.abs() <= 0.125)
        );
        assert_eq!(oscillator.current_frequency(), target);
    }
}

#[test]
fn test_frames_match_block() {
    let mut planar = prepared(500.0, 48000.0);
    let mut interleaved = planar;
    let (mut left, mut right) = ([0.0; 200], [0.0; 200]);
    let mut frames = [[0.0; 2]; 200];
    for target in [500.0, 880.0, 880.0, 220.0] {
        planar.render_block(target, 0.05, &mut left, &mut right);
        interleaved.render_frames(target, 0.05, &mut frames);
        for (frame, (l, r)) in frames.iter().zip(left.iter().zip(right.iter())) {
            assert_eq!(*frame, [*l, *r]);
        }
    }
    assert_eq!(planar, interleaved);
}
