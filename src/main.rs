//! keytone - A terminal virtual piano.
//!
//! Plays triangle tones from the computer keyboard or the mouse, shows a
//! live spectrum of the output and records takes to WAV.
//!
//! # Usage
//!
//! ```bash
//! cargo run                              # Default two-row keymap
//! cargo run -- --keymap my-keys.json     # Custom keymap
//! cargo run -- --output-dir takes/       # Save recordings elsewhere
//! ```
//!
//! Press `F1` for help with keyboard shortcuts.

use keytone::app::{App, Phase, Settings};
use keytone::piano::{KeyCode as NoteKey, NoteTable};
use keytone::ui;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton,
    MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Command-line options for the application.
struct CliOptions {
    /// JSON keymap replacing the built-in note table.
    keymap: Option<PathBuf>,
    /// Directory recordings are saved into.
    output_dir: Option<PathBuf>,
    /// Synthetic release timeout override.
    release_timeout: Option<Duration>,
    /// Log file; logs go to stderr otherwise.
    log_file: Option<PathBuf>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--keymap <path>` or `-k <path>`: Load the note table from JSON
    /// - `--output-dir <path>` or `-o <path>`: Where recordings are saved
    /// - `--release-timeout <ms>`: Synthetic release timeout
    /// - `--log <path>`: Write logs to a file
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            keymap: None,
            output_dir: None,
            release_timeout: None,
            log_file: None,
        };
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--keymap" | "-k" => {
                    i += 1;
                    options.keymap = Some(PathBuf::from(arg_value(&args, i, "--keymap")?));
                }
                "--output-dir" | "-o" => {
                    i += 1;
                    options.output_dir = Some(PathBuf::from(arg_value(&args, i, "--output-dir")?));
                }
                "--release-timeout" => {
                    i += 1;
                    let ms: u64 = arg_value(&args, i, "--release-timeout")?
                        .parse()
                        .context("--release-timeout expects milliseconds")?;
                    options.release_timeout = Some(Duration::from_millis(ms));
                }
                "--log" => {
                    i += 1;
                    options.log_file = Some(PathBuf::from(arg_value(&args, i, "--log")?));
                }
                "--help" | "-h" => {
                    eprintln!("keytone - Terminal virtual piano");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("keytone")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -k, --keymap PATH         Load the note table from a JSON keymap");
                    eprintln!("  -o, --output-dir PATH     Directory for saved recordings (default: .)");
                    eprintln!("      --release-timeout MS  Release held notes after MS without repeats");
                    eprintln!("      --log PATH            Write logs to PATH instead of stderr");
                    eprintln!("  -h, --help                Print this help message");
                    eprintln!();
                    eprintln!("Log verbosity follows RUST_LOG.");
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        Ok(options)
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(timeout) = self.release_timeout {
            settings.release_timeout = timeout;
        }
        settings
    }
}

/// Returns the argument following a flag.
fn arg_value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("{} requires an argument", flag))
}

/// Initializes logging to stderr, or to `log_file` if given.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;
    init_logging(cli.log_file.as_ref())?;

    let table = match &cli.keymap {
        Some(path) => NoteTable::from_json_file(path)
            .with_context(|| format!("Failed to load keymap {}", path.display()))?,
        None => NoteTable::default(),
    };
    tracing::info!("Loaded note table with {} playable keys", table.playable_count());

    let mut app = App::new(table, cli.settings());

    let (mut terminal, key_release_supported) =
        setup_terminal().context("Failed to setup terminal")?;
    app.key_release_supported = key_release_supported;
    if !key_release_supported {
        tracing::info!(
            "Terminal does not report key releases, using {}ms timed release",
            app.settings.release_timeout.as_millis()
        );
    }

    let result = run_app(&mut terminal, &mut app);

    app.shutdown();
    restore_terminal(&mut terminal, key_release_supported)?;

    if let Err(e) = result {
        eprintln!("Error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

/// Sets up the terminal for TUI rendering.
///
/// Returns the terminal and whether key release events were enabled.
fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("Failed to enter alternate screen")?;

    let key_release_supported = supports_keyboard_enhancement().unwrap_or(false);
    if key_release_supported {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("Failed to enable key release events")?;
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok((terminal, key_release_supported))
}

/// Restores the terminal to its original state.
fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    key_release_supported: bool,
) -> Result<()> {
    if key_release_supported {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("Failed to disable key release events")?;
    }
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main event loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout keeps the spectrum at roughly 60 frames per second
        if event::poll(Duration::from_millis(16))? {
            let quit = match event::read()? {
                Event::Key(key) => handle_key(app, key),
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse);
                    false
                }
                Event::FocusLost => {
                    app.handle_focus_lost();
                    false
                }
                _ => false,
            };
            if quit {
                return Ok(());
            }
        }
    }
}

/// Handles a key event. Returns true if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    let note_key = match key.code {
        KeyCode::Char(c) => NoteKey::from_char(c),
        _ => None,
    };

    if key.kind == KeyEventKind::Release {
        if let Some(note_key) = note_key {
            app.handle_note_release(note_key);
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    // Repeats only keep notes alive
    if key.kind == KeyEventKind::Repeat {
        if let Some(note_key) = note_key {
            app.handle_note_press(note_key, Instant::now());
        }
        return false;
    }

    if app.has_failed() {
        return true;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::F(1) | KeyCode::Esc) {
            app.show_help = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::F(1) => app.show_help = true,
        KeyCode::Enter | KeyCode::Char(' ') if matches!(app.phase, Phase::Welcome) => {
            app.start_session();
        }
        KeyCode::F(2) => app.start_recording(),
        KeyCode::F(3) => app.stop_recording(),
        KeyCode::F(4) => app.save_recording(),
        KeyCode::F(5) => app.toggle_playback(),
        _ => {
            if let Some(note_key) = note_key {
                app.handle_note_press(note_key, Instant::now());
            }
        }
    }
    false
}

/// Handles a mouse event.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.show_help {
                app.show_help = false;
                return;
            }
            app.handle_mouse_down(mouse.column, mouse.row, Instant::now());
        }
        MouseEventKind::Up(MouseButton::Left) => app.handle_mouse_up(),
        _ => {}
    }
}
