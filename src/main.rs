use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{error::Error, io};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod dashboard;
mod icons;
mod owm;
mod units;
mod weather;

use crate::app::{run_app, App};
use crate::cli::Args;
use crate::dashboard::Dashboard;
use crate::owm::OpenWeatherMap;

/// The terminal belongs to the UI, so logs only go to a file when one is given.
fn init_logging(path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| e as Box<dyn Error>)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let source = OpenWeatherMap::new(
        &args.base_url,
        &args.api_key,
        Duration::from_secs(args.timeout),
    )?;
    info!(base_url = %args.base_url, units = ?args.units, "starting");

    let mut app = App::new(Dashboard::new(Arc::new(source)), args.units, !args.light);
    if let Some(ref city) = args.city {
        app.search(city);
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        assert!(init_logging(None).is_ok());

        let path = std::env::temp_dir().join(format!("owx-{}.log", std::process::id()));
        assert!(init_logging(Some(&path)).is_ok());
        info!("logging ready");
        // The global subscriber can only be installed once.
        assert!(init_logging(Some(&path)).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
