use color_eyre::Result;
use ratatui::DefaultTerminal;
use sinesynth::{audio, config::SynthConfig, ui::SynthState};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = SynthConfig::default();
    let (active_client, audio_state) = audio::audio_setup(&config)?;

    let terminal = ratatui::init();
    let result = run(terminal, SynthState::new(&config, audio_state)).await;
    ratatui::restore();

    active_client.deactivate()?;
    result
}

async fn run(mut terminal: DefaultTerminal, mut state: SynthState) -> Result<()> {
    while !state.exiting() {
        terminal.draw(|frame| state.draw(frame))?;
        state.handle_events().await?;
    }
    Ok(())
}
