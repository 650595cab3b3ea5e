use color_eyre::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Styled, Stylize},
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Gauge, Paragraph, Widget},
};
use std::collections::VecDeque;

use crate::audio::{AudioState, ParameterListener};
use crate::config::SynthConfig;

mod slider;
pub use slider::Slider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Frequency,
    Level,
}

#[derive(Debug)]
pub struct Controls {
    /// The frequency slider, in Hz.
    pub frequency: Slider,
    /// The level slider, as linear gain.
    pub level: Slider,
    /// The slider the arrow keys act on.
    pub selected: Control,
    /// Whether the arrow keys move in fine steps.
    pub fine: bool,
    /// Whether to exit the application.
    pub exit: bool,
    coarse_step: f64,
    fine_step: f64,
    default_frequency: f64,
    default_level: f64,
}

impl Controls {
    pub fn from_config(config: &SynthConfig) -> Self {
        let (min_hz, max_hz) = config.frequency_range;
        let (min_level, max_level) = config.level_range;
        Controls {
            frequency: Slider::new(min_hz, max_hz, config.default_frequency)
                .with_midpoint(config.frequency_midpoint),
            level: Slider::new(min_level, max_level, config.default_level),
            selected: Control::Frequency,
            fine: false,
            exit: false,
            coarse_step: config.coarse_step,
            fine_step: config.fine_step,
            default_frequency: config.default_frequency,
            default_level: config.default_level,
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent, listener: &impl ParameterListener) {
        if key_event.kind != KeyEventKind::Press {
            return;
        }
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.exit = true,
            KeyCode::Up | KeyCode::Down => self.select_other(),
            KeyCode::Left => self.nudge(-1.0, listener),
            KeyCode::Right => self.nudge(1.0, listener),
            KeyCode::Home => self.jump(0.0, listener),
            KeyCode::End => self.jump(1.0, listener),
            KeyCode::Char('r') => self.reset(listener),
            KeyCode::Tab => self.fine = !self.fine,
            _ => {}
        }
    }

    fn select_other(&mut self) {
        self.selected = match self.selected {
            Control::Frequency => Control::Level,
            Control::Level => Control::Frequency,
        };
    }

    fn slider_mut(&mut self) -> &mut Slider {
        match self.selected {
            Control::Frequency => &mut self.frequency,
            Control::Level => &mut self.level,
        }
    }

    fn nudge(&mut self, direction: f64, listener: &impl ParameterListener) {
        let step = if self.fine {
            self.fine_step
        } else {
            self.coarse_step
        };
        if self.slider_mut().nudge(direction * step) {
            self.notify(listener);
        }
    }

    fn jump(&mut self, proportion: f64, listener: &impl ParameterListener) {
        if self.slider_mut().set_proportion(proportion) {
            self.notify(listener);
        }
    }

    fn reset(&mut self, listener: &impl ParameterListener) {
        let value = match self.selected {
            Control::Frequency => self.default_frequency,
            Control::Level => self.default_level,
        };
        if self.slider_mut().set_value(value) {
            self.notify(listener);
        }
    }

    fn notify(&self, listener: &impl ParameterListener) {
        match self.selected {
            Control::Frequency => listener.on_frequency_changed(self.frequency.value()),
            Control::Level => listener.on_level_changed(self.level.value()),
        }
    }

    fn gauge(&self, control: Control) -> Gauge<'static> {
        let (name, slider, label, color) = match control {
            Control::Frequency => (
                "Frequency",
                &self.frequency,
                format!("{:.1} Hz", self.frequency.value()),
                Color::Rgb(26, 153, 136),
            ),
            Control::Level => (
                "Level",
                &self.level,
                format!(
                    "{:.4} ({:.1} dB)",
                    self.level.value(),
                    20.0 * self.level.value().log10()
                ),
                Color::Rgb(180, 95, 6),
            ),
        };
        let title = Line::from(vec![
            if self.selected == control {
                ">> ".green()
            } else {
                "".into()
            },
            name.bold(),
            if self.selected == control && self.fine {
                " (fine) ".italic()
            } else {
                " ".into()
            },
        ]);
        Gauge::default()
            .block(Block::bordered().title(title))
            .gauge_style(Style::new().fg(color))
            .ratio(slider.proportion().clamp(0.0, 1.0))
            .label(label)
    }
}

/// The most recent messages from the audio side, oldest first.
#[derive(Debug)]
pub struct MessageLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        MessageLog {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(message);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct SynthState {
    /// The sliders and key handling.
    pub controls: Controls,
    /// Messages received from the audio side.
    pub log: MessageLog,
    /// The event stream for receiving terminal events.
    pub event_stream: EventStream,
    /// The audio state.
    pub audio_state: AudioState,
}

impl SynthState {
    pub fn new(config: &SynthConfig, audio_state: AudioState) -> Self {
        SynthState {
            controls: Controls::from_config(config),
            log: MessageLog::new(config.message_history),
            event_stream: EventStream::new(),
            audio_state,
        }
    }

    pub async fn handle_events(&mut self) -> Result<()> {
        let event = self.event_stream.next().fuse();
        tokio::select! {
            maybe_event = event => {
                if let Some(event) = maybe_event {
                    if let Event::Key(key_event) = event? {
                        self.controls
                            .handle_key_event(key_event, &*self.audio_state.bridge);
                    }
                }
            }
            Some(message) = self.audio_state.messages.recv() => {
                self.log.push(message);
            }
        }
        Ok(())
    }

    pub fn exiting(&self) -> bool {
        self.controls.exit
    }

    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &SynthState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(vec![
            " S".bold(),
            "I".set_style(Color::Rgb(26, 153, 136)).bold().italic(),
            "N".set_style(Color::Rgb(17, 85, 204)).bold().italic(),
            "E".set_style(Color::Rgb(180, 95, 6)).bold().italic(),
            "SYNTH ".bold(),
        ]);
        let instructions = Line::from(vec![
            " Select ".into(),
            "<Up/Down>".blue().bold(),
            " Adjust ".into(),
            "<Left/Right>".blue().bold(),
            " Fine ".into(),
            "<Tab>".blue().bold(),
            " Reset ".into(),
            "<R>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let inner = block.inner(area);
        block.render(area, buf);

        let [frequency_area, level_area, log_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .areas(inner);

        self.controls
            .gauge(Control::Frequency)
            .render(frequency_area, buf);
        self.controls.gauge(Control::Level).render(level_area, buf);

        let lines: Vec<Line> = self.log.lines().map(Line::from).collect();
        Paragraph::new(Text::from(lines))
            .block(
                Block::bordered()
                    .title(format!(" jack @ {} Hz ", self.audio_state.sample_rate).italic()),
            )
            .render(log_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ParameterBridge;
    use crossterm::event::KeyModifiers;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        frequency: Cell<Option<f64>>,
        level: Cell<Option<f64>>,
    }

    impl ParameterListener for Recorder {
        fn on_frequency_changed(&self, hz: f64) {
            self.frequency.set(Some(hz));
        }

        fn on_level_changed(&self, gain: f64) {
            self.level.set(Some(gain));
        }
    }

    fn press(controls: &mut Controls, code: KeyCode, listener: &impl ParameterListener) {
        controls.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), listener);
    }

    #[test]
    fn test_defaults() {
        let controls = Controls::from_config(&SynthConfig::default());
        assert_eq!(controls.frequency.value(), 500.0);
        assert_eq!(controls.level.value(), 0.125);
        assert_eq!(controls.selected, Control::Frequency);
        assert!(!controls.exit);
    }

    #[test]
    fn test_frequency_keys() {
        let mut controls = Controls::from_config(&SynthConfig::default());
        let recorder = Recorder::default();

        press(&mut controls, KeyCode::Right, &recorder);
        let raised = recorder.frequency.get().unwrap();
        assert!(raised > 500.0 && raised <= 5000.0);
        assert_eq!(raised, controls.frequency.value());
        assert_eq!(recorder.level.get(), None);

        press(&mut controls, KeyCode::End, &recorder);
        assert_eq!(recorder.frequency.get(), Some(5000.0));

        // Already at the top: nothing to report.
        recorder.frequency.set(None);
        press(&mut controls, KeyCode::Right, &recorder);
        assert_eq!(recorder.frequency.get(), None);

        press(&mut controls, KeyCode::Home, &recorder);
        assert_eq!(recorder.frequency.get(), Some(50.0));

        press(&mut controls, KeyCode::Char('r'), &recorder);
        assert_eq!(recorder.frequency.get(), Some(500.0));
    }

    #[test]
    fn test_level_keys() {
        let mut controls = Controls::from_config(&SynthConfig::default());
        let recorder = Recorder::default();

        press(&mut controls, KeyCode::Down, &recorder);
        assert_eq!(controls.selected, Control::Level);
        for _ in 0..100 {
            press(&mut controls, KeyCode::Left, &recorder);
        }
        assert_eq!(recorder.level.get(), Some(0.0));
        assert_eq!(recorder.frequency.get(), None);

        press(&mut controls, KeyCode::Up, &recorder);
        assert_eq!(controls.selected, Control::Frequency);
    }

    #[test]
    fn test_fine_steps() {
        let mut coarse = Controls::from_config(&SynthConfig::default());
        let mut fine = Controls::from_config(&SynthConfig::default());
        let recorder = Recorder::default();

        press(&mut fine, KeyCode::Tab, &recorder);
        assert!(fine.fine);
        press(&mut coarse, KeyCode::Right, &recorder);
        press(&mut fine, KeyCode::Right, &recorder);
        assert!(fine.frequency.value() > 500.0);
        assert!(fine.frequency.value() < coarse.frequency.value());
    }

    #[test]
    fn test_quit() {
        let mut controls = Controls::from_config(&SynthConfig::default());
        press(&mut controls, KeyCode::Char('q'), &Recorder::default());
        assert!(controls.exit);
    }

    #[test]
    fn test_keys_reach_bridge() {
        let mut controls = Controls::from_config(&SynthConfig::default());
        let bridge = ParameterBridge::default();
        bridge.mark_prepared();

        press(&mut controls, KeyCode::End, &bridge);
        assert_eq!(bridge.target_frequency(), 5000.0);
        press(&mut controls, KeyCode::Down, &bridge);
        press(&mut controls, KeyCode::Home, &bridge);
        assert_eq!(bridge.level(), 0.0);
    }

    #[test]
    fn test_message_log() {
        let mut log = MessageLog::new(2);
        log.push("a".to_string());
        log.push("b".to_string());
        log.push("c".to_string());
        assert_eq!(log.lines().collect::<Vec<_>>(), ["b", "c"]);

        let mut log = MessageLog::new(0);
        log.push("a".to_string());
        assert_eq!(log.lines().count(), 0);
    }
}
