pub const DEFAULT_FREQUENCY: f64 = 500.0;
pub const DEFAULT_LEVEL: f64 = 0.125;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// The name the JACK client registers under.
    pub client_name: String,
    /// The name of the left output port.
    pub left_port: String,
    /// The name of the right output port.
    pub right_port: String,
    /// The frequency the oscillator starts at, in Hz.
    pub default_frequency: f64,
    /// The lowest and highest selectable frequency, in Hz.
    pub frequency_range: (f64, f64),
    /// The frequency sitting in the middle of the frequency slider.
    pub frequency_midpoint: f64,
    /// The gain the oscillator starts at.
    pub default_level: f64,
    /// The lowest and highest selectable linear gain.
    pub level_range: (f64, f64),
    /// Slider movement per key press, as a fraction of the slider length.
    pub coarse_step: f64,
    /// Slider movement per key press in fine mode.
    pub fine_step: f64,
    /// How many server messages the log panel keeps.
    pub message_history: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            client_name: "sinesynth".to_string(),
            left_port: "out_left".to_string(),
            right_port: "out_right".to_string(),
            default_frequency: DEFAULT_FREQUENCY,
            frequency_range: (50.0, 5000.0),
            frequency_midpoint: 500.0,
            default_level: DEFAULT_LEVEL,
            level_range: (0.0, 0.125),
            coarse_step: 0.02,
            fine_step: 0.002,
            message_history: 8,
        }
    }
}
