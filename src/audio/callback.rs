use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;

use super::bridge::ParameterBridge;
use super::oscillator::SineOscillator;

pub struct AudioCallbackSettings {
    pub out_left: jack::Port<jack::AudioOut>,
    pub out_right: jack::Port<jack::AudioOut>,
    pub oscillator: SineOscillator,
    pub bridge: Arc<ParameterBridge>,
    pub message_tx: mpsc::UnboundedSender<String>,
}

/// Per-block glue between the bridge and the oscillator, independent of JACK.
pub struct BlockRenderer {
    oscillator: SineOscillator,
    bridge: Arc<ParameterBridge>,
}

impl BlockRenderer {
    pub fn new(oscillator: SineOscillator, bridge: Arc<ParameterBridge>) -> Self {
        BlockRenderer { oscillator, bridge }
    }

    pub fn oscillator(&self) -> &SineOscillator {
        &self.oscillator
    }

    /// Renders one block at `sample_rate`.
    ///
    /// Re-prepares the oscillator when the rate differs from the one it was
    /// prepared with, then reads both parameters once and renders.
    pub fn process(
        &mut self,
        sample_rate: f64,
        left: &mut [f32],
        right: &mut [f32],
    ) -> Result<()> {
        if !self.oscillator.is_prepared() || sample_rate != self.oscillator.sample_rate() {
            self.oscillator.prepare(sample_rate)?;
            self.bridge.mark_prepared();
        }

        let target_frequency = self.bridge.target_frequency();
        let level = self.bridge.level();
        self.oscillator.render_block(target_frequency, level, left, right);
        Ok(())
    }
}

pub fn create_callback(settings: AudioCallbackSettings) -> impl jack::ProcessHandler {
    let AudioCallbackSettings {
        mut out_left,
        mut out_right,
        oscillator,
        bridge,
        message_tx,
    } = settings;
    let mut renderer = BlockRenderer::new(oscillator, bridge);

    let callback_closure = move |client: &jack::Client, ps: &jack::ProcessScope| {
        let sample_rate = client.sample_rate() as f64;
        let left = out_left.as_mut_slice(ps);
        let right = out_right.as_mut_slice(ps);

        match renderer.process(sample_rate, left, right) {
            Ok(()) => jack::Control::Continue,
            Err(err) => {
                left.fill(0.0);
                right.fill(0.0);
                let _ = message_tx.send(format!("audio: {err}, stopping playback"));
                jack::Control::Quit
            }
        }
    };

    jack::contrib::ClosureProcessHandler::new(callback_closure)
}

#[test]
fn test_renderer_prepares_on_first_block() {
    let bridge = Arc::new(ParameterBridge::default());
    let mut renderer = BlockRenderer::new(SineOscillator::new(500.0), bridge.clone());
    assert!(!bridge.is_prepared());

    let (mut left, mut right) = ([0.0; 64], [0.0; 64]);
    renderer.process(44100.0, &mut left, &mut right).unwrap();
    assert!(bridge.is_prepared());
    assert_eq!(renderer.oscillator().sample_rate(), 44100.0);
    assert_eq!(left[0], 0.0);
    assert!(left[1] > 0.0);
}

#[test]
fn test_renderer_follows_bridge() {
    let bridge = Arc::new(ParameterBridge::default());
    let mut renderer = BlockRenderer::new(SineOscillator::new(500.0), bridge.clone());
    let (mut left, mut right) = ([0.0; 128], [0.0; 128]);
    renderer.process(48000.0, &mut left, &mut right).unwrap();

    bridge.set_target_frequency(1000.0);
    bridge.set_level(0.0);
    renderer.process(48000.0, &mut left, &mut right).unwrap();
    assert_eq!(renderer.oscillator().current_frequency(), 1000.0);
    assert!(left.iter().all(|&s| s == 0.0));

    // A new sample rate restarts the session.
    renderer.process(96000.0, &mut left, &mut right).unwrap();
    assert_eq!(renderer.oscillator().sample_rate(), 96000.0);
    let expected = 128.0 * renderer.oscillator().angle_delta();
    assert!((renderer.oscillator().current_angle() - expected).abs() < 1e-9);
}

#[test]
fn test_renderer_rejects_bad_rate() {
    let bridge = Arc::new(ParameterBridge::default());
    let mut renderer = BlockRenderer::new(SineOscillator::new(500.0), bridge.clone());
    let (mut left, mut right) = ([0.0; 8], [0.0; 8]);
    assert!(renderer.process(0.0, &mut left, &mut right).is_err());
    assert!(!bridge.is_prepared());
}
