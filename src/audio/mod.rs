use color_eyre::Result;
use jack::PortFlags;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::SynthConfig;

mod bridge;
mod callback;
mod notifications;
mod oscillator;

pub use bridge::{ParameterBridge, ParameterListener};
pub use callback::BlockRenderer;
pub use oscillator::{OscillatorMode, SineOscillator};

#[derive(Debug)]
pub struct AudioState {
    pub bridge: Arc<ParameterBridge>,              // Main -> Audio
    pub messages: mpsc::UnboundedReceiver<String>, // Audio -> Main
    pub sample_rate: jack::Frames,
}

pub fn audio_setup(
    config: &SynthConfig,
) -> Result<(
    jack::AsyncClient<impl jack::NotificationHandler, impl jack::ProcessHandler>,
    AudioState,
)> {
    // Server messages reach the UI through the notification handler instead.
    jack::set_logger(jack::LoggerType::None);

    let (client, _status) =
        jack::Client::new(&config.client_name, jack::ClientOptions::default())?;

    let out_left = client.register_port(&config.left_port, jack::AudioOut::default())?;
    let out_right = client.register_port(&config.right_port, jack::AudioOut::default())?;
    let left_name = out_left.name()?;
    let right_name = out_right.name()?;

    let sample_rate = client.sample_rate();
    let bridge = Arc::new(ParameterBridge::new(
        config.default_frequency,
        config.default_level,
    ));
    let mut oscillator = SineOscillator::new(config.default_frequency);
    oscillator.prepare(sample_rate as f64)?;
    bridge.mark_prepared();

    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let _ = message_tx.send(format!(
        "audio: {} running at {sample_rate} Hz, {} frames per block",
        config.client_name,
        client.buffer_size()
    ));

    let notification_handler = notifications::Notifications {
        tx: message_tx.clone(),
    };
    let callback_handler = callback::create_callback(callback::AudioCallbackSettings {
        out_left,
        out_right,
        oscillator,
        bridge: bridge.clone(),
        message_tx,
    });

    let active_client = client.activate_async(notification_handler, callback_handler)?;

    {
        let dest_ports = active_client.as_client().ports(
            None,
            Some("32 bit float mono audio"),
            PortFlags::IS_INPUT.union(PortFlags::IS_PHYSICAL),
        );
        // Mono playback gets both channels, otherwise the first two ports are used.
        match dest_ports.as_slice() {
            [] => {}
            [only] => {
                for source in [&left_name, &right_name] {
                    active_client
                        .as_client()
                        .connect_ports_by_name(source, only)?;
                }
            }
            [first, second, ..] => {
                active_client
                    .as_client()
                    .connect_ports_by_name(&left_name, first)?;
                active_client
                    .as_client()
                    .connect_ports_by_name(&right_name, second)?;
            }
        }
    }

    let state = AudioState {
        bridge,
        messages: message_rx,
        sample_rate,
    };
    Ok((active_client, state))
}

#[test]
#[ignore = "needs a running JACK server"]
fn test_audio_setup() {
    let config = SynthConfig::default();
    let result = audio_setup(&config);
    assert!(result.is_ok());
    let (_client, state) = result.unwrap();
    assert!(state.bridge.is_prepared());
    assert!(state.sample_rate > 0);
}
