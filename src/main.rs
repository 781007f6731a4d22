mod audio;
mod catalog;
mod config;
mod games;
mod geom;
mod hub;
mod score;

use anyhow::Context;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use simplelog::{LevelFilter, WriteLogger};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::games::GameKind;
use crate::hub::Hub;

const CONFIG_FILE: &str = "gamebox.json";

fn main() -> anyhow::Result<()> {
    let config = Config::load(Path::new(CONFIG_FILE))
        .with_context(|| format!("reading {CONFIG_FILE}"))?;

    // Set up logging before anything else
    WriteLogger::init(
        LevelFilter::Info,
        simplelog::Config::default(),
        File::create(&config.log_path)
            .with_context(|| format!("creating {}", config.log_path))?,
    )?;

    info!("starting gamebox");

    let catalog = Catalog::load(
        Path::new(&config.catalog_path),
        &GameKind::builtin_names(),
    )
    .with_context(|| format!("loading catalog from {}", config.catalog_path))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let hub = Hub::new(catalog, &config);
    let result = run(&mut terminal, hub, config.frame_interval());

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut hub: Hub,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| hub.render(f))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => hub.handle_key(key),
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    hub.handle_mouse(mouse, Rect::new(0, 0, size.width, size.height));
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            hub.tick(last_tick.elapsed());
            last_tick = Instant::now();
        }

        if hub.should_quit() {
            break;
        }
    }

    if let Err(e) = hub.catalog().save() {
        error!("failed to save catalog on exit: {e}");
    }
    info!("gamebox shut down");
    Ok(())
}
