mod config;
mod editor;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{
    io,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;
use tui::{backend::CrosstermBackend, Terminal};

use editor::Editor;

/// texkey - a LaTeX-aware editor with prefix-key symbol input
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// File to open
    #[clap(name = "FILE")]
    file: Option<String>,
}

/// Log to a file in the config directory; stdout belongs to the TUI.
/// The returned guard must stay alive for the writer thread to flush.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config::get_config_dir().ok()?;
    let appender = tracing_appender::rolling::never(log_dir, "texkey.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut editor: Editor,
) -> Result<()> {
    loop {
        // Expire any overdue prefix mode before drawing
        editor.tick(Instant::now());

        terminal.draw(|f| {
            ui::render(f, &editor);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if !editor.handle_key(key, Instant::now())? {
                    return Ok(());
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging();

    // Load config
    let config = config::Config::load()?;

    // Create editor with config
    let mut editor = Editor::new_with_config(config)?;

    // Load file if provided
    if let Some(file_path) = &cli.file {
        editor.load_file(file_path)?;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, editor);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}
