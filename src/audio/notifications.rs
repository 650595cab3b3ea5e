use tokio::sync::mpsc;

/// Forwards JACK server events to the UI as log lines.
pub struct Notifications {
    pub tx: mpsc::UnboundedSender<String>,
}

impl Notifications {
    fn post(&self, message: String) {
        // The receiver is gone once the UI has shut down; nothing left to tell.
        let _ = self.tx.send(message);
    }
}

fn port_name(client: &jack::Client, port_id: jack::PortId) -> String {
    client
        .port_by_id(port_id)
        .and_then(|port| port.name().ok())
        .unwrap_or_else(|| format!("#{port_id}"))
}

impl jack::NotificationHandler for Notifications {
    fn thread_init(&self, _: &jack::Client) {
        self.post("jack: process thread started".to_string());
    }

    /// Not much we can do here, see <https://man7.org/linux/man-pages/man7/signal-safety.7.html>.
    unsafe fn shutdown(&mut self, _: jack::ClientStatus, _: &str) {}

    fn sample_rate(&mut self, _: &jack::Client, srate: jack::Frames) -> jack::Control {
        self.post(format!("jack: sample rate is now {srate} Hz, restarting oscillator"));
        jack::Control::Continue
    }

    fn ports_connected(
        &mut self,
        client: &jack::Client,
        port_id_a: jack::PortId,
        port_id_b: jack::PortId,
        are_connected: bool,
    ) {
        self.post(format!(
            "jack: {} {} {}",
            port_name(client, port_id_a),
            if are_connected { "->" } else { "-/-" },
            port_name(client, port_id_b),
        ));
    }

    fn xrun(&mut self, _: &jack::Client) -> jack::Control {
        self.post("jack: xrun".to_string());
        jack::Control::Continue
    }
}
