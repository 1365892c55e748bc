use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use checkview::app::export_page;
use checkview::settings::LogSettings;
use checkview::{events, ui, App, FileSource, PageSnapshot, PageSource, Settings, StreamSource, Theme};

/// Upper bound on how long the loop waits for input.
const MAX_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "checkview")]
#[command(about = "Terminal host for lifecycle-bound chart and SQL editor components")]
struct Args {
    /// Path to the page snapshot file
    #[arg(short, long, default_value = "page.json", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP page server for live snapshots (host:port)
    #[arg(short, long, conflicts_with = "file")]
    connect: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh interval in seconds (only used with --file)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Build every chart of the page, write the specs as JSON and exit
    #[arg(short, long, conflicts_with = "connect")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;

    // Export is one-shot and leaves no log file behind
    if let Some(export_path) = args.export {
        return export_to_file(&args.file, &export_path, &settings);
    }

    init_logging(&settings.log)?;

    if let Some(ref addr) = args.connect {
        return run_with_tcp(addr, settings);
    }

    let refresh = args.refresh.map(Duration::from_secs).unwrap_or_else(|| settings.refresh_interval());
    let source = Box::new(FileSource::new(&args.file));
    run_tui(source, &settings, refresh)
}

/// Log to a file; the terminal belongs to the TUI.
fn init_logging(log: &LogSettings) -> Result<()> {
    let file = File::create(&log.file)
        .with_context(|| format!("failed to create log file {}", log.file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Run with a reconnecting TCP stream source
fn run_with_tcp(addr: &str, settings: Settings) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    info!(addr, "connecting to page server");
    let source = Box::new(StreamSource::connect(addr, settings.retry_delay()));

    // Snapshots are pushed, so poll continuously
    run_tui(source, &settings, Duration::from_millis(100))
}

/// Run the TUI with the given page source
fn run_tui(source: Box<dyn PageSource>, settings: &Settings, refresh_interval: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(source, settings.hook_options(), Theme::auto_detect());
    let _ = app.reload_data(Instant::now());

    let result = run_app(&mut terminal, &mut app, refresh_interval);

    app.quit();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        let size = terminal.size()?;
        app.layout(ui::content_area(Rect::new(0, 0, size.width, size.height)));
        app.tick(Instant::now());

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Wake up in time for the next debounced render
        let now = Instant::now();
        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now).min(MAX_POLL))
            .unwrap_or(MAX_POLL);

        if let Some(event) = events::poll_event(timeout)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                // Surfaces are laid out again on the next iteration
                Event::Resize(_, _) => {}
                _ => {}
            }
        }

        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data(Instant::now());
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Resolve every chart of a page file and write the specs as JSON
fn export_to_file(page_path: &Path, export_path: &Path, settings: &Settings) -> Result<()> {
    let content = std::fs::read_to_string(page_path)
        .with_context(|| format!("failed to read {}", page_path.display()))?;
    let page: PageSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", page_path.display()))?;

    let export = export_page(&page, &settings.palette);
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(export_path, json)?;

    println!("Exported {} charts to: {}", export["charts"].as_object().map_or(0, |c| c.len()), export_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_leaves_no_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("checkview.log");
        let config = dir.path().join("settings.toml");
        std::fs::write(&config, format!("[log]\nfile = {:?}\n", log.display().to_string())).unwrap();

        let page = dir.path().join("page.json");
        std::fs::write(
            &page,
            r#"{"mounts":[{"id":"latency","hook":"CheckChart","attrs":{"labels":"[\"a\"]","values":"[1]","success":"[1]","average":"null","alertThreshold":"null"}}]}"#,
        )
        .unwrap();
        let out = dir.path().join("charts.json");

        let args = Args::try_parse_from([
            "checkview",
            "--file",
            page.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--export",
            out.to_str().unwrap(),
        ])
        .unwrap();
        run(args).unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert!(written["charts"]["latency"]["series"].is_array());
        assert!(!log.exists());
    }
}
