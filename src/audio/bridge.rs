//! Lock-free hand-off of synth parameters from the UI to the process thread.
//!
//! Each parameter is a single `f64` stored as its bit pattern in an
//! [`AtomicU64`]. The UI is the only writer, the process callback the only
//! reader, and it reads once per block. Only the latest value matters, so
//! `Relaxed` ordering is enough and intermediate values are simply dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::config::{DEFAULT_FREQUENCY, DEFAULT_LEVEL};

/// Receives parameter changes from a control surface.
pub trait ParameterListener {
    /// Called with the new frequency in Hz, already clamped to the slider range.
    fn on_frequency_changed(&self, hz: f64);
    /// Called with the new linear gain, already clamped to the slider range.
    fn on_level_changed(&self, gain: f64);
}

#[derive(Debug)]
pub struct ParameterBridge {
    target_frequency: AtomicU64, // Main -> Audio
    level: AtomicU64,            // Main -> Audio
    prepared: AtomicBool,        // Audio -> Main
}

impl Default for ParameterBridge {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY, DEFAULT_LEVEL)
    }
}

impl ParameterBridge {
    pub fn new(frequency: f64, level: f64) -> Self {
        ParameterBridge {
            target_frequency: AtomicU64::new(frequency.to_bits()),
            level: AtomicU64::new(level.to_bits()),
            prepared: AtomicBool::new(false),
        }
    }

    /// Stores a new target frequency.
    ///
    /// Ignored until the audio side has a sample rate to work with.
    pub fn set_target_frequency(&self, hz: f64) {
        if !self.is_prepared() {
            return;
        }
        self.target_frequency.store(hz.to_bits(), Ordering::Relaxed);
    }

    pub fn set_level(&self, gain: f64) {
        self.level.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn target_frequency(&self) -> f64 {
        f64::from_bits(self.target_frequency.load(Ordering::Relaxed))
    }

    pub fn level(&self) -> f64 {
        f64::from_bits(self.level.load(Ordering::Relaxed))
    }

    /// Marks playback as started; called by the audio side after `prepare`.
    pub fn mark_prepared(&self) {
        self.prepared.store(true, Ordering::Relaxed);
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.load(Ordering::Relaxed)
    }
}

impl ParameterListener for ParameterBridge {
    fn on_frequency_changed(&self, hz: f64) {
        self.set_target_frequency(hz);
    }

    fn on_level_changed(&self, gain: f64) {
        self.set_level(gain);
    }
}

#[test]
fn test_bridge_defaults() {
    let bridge = ParameterBridge::default();
    assert_eq!(bridge.target_frequency(), 500.0);
    assert_eq!(bridge.level(), 0.125);
    assert!(!bridge.is_prepared());
}

#[test]
fn test_frequency_ignored_before_prepare() {
    let bridge = ParameterBridge::default();
    bridge.on_frequency_changed(1000.0);
    assert_eq!(bridge.target_frequency(), 500.0);

    // Level has no such gate.
    bridge.on_level_changed(0.05);
    assert_eq!(bridge.level(), 0.05);

    bridge.mark_prepared();
    bridge.on_frequency_changed(1000.0);
    assert_eq!(bridge.target_frequency(), 1000.0);
}

#[test]
fn test_last_write_wins() {
    let bridge = std::sync::Arc::new(ParameterBridge::default());
    bridge.mark_prepared();

    let writer = {
        let bridge = bridge.clone();
        std::thread::spawn(move || {
            for step in 0..=1000 {
                bridge.set_target_frequency(50.0 + step as f64 * 4.0);
                bridge.set_level(step as f64 / 8000.0);
            }
        })
    };
    // Reads never block and always see one of the written values.
    for _ in 0..1000 {
        let hz = bridge.target_frequency();
        assert!((50.0..=5000.0).contains(&hz));
        assert!((0.0..=0.125).contains(&bridge.level()));
    }
    writer.join().unwrap();

    assert_eq!(bridge.target_frequency(), 4050.0);
    assert_eq!(bridge.level(), 0.125);
}
