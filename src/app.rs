//! Application state and event handling.
//!
//! This module defines the application state that sits between the terminal
//! event loop and the piano session: the start screen, the capability notice,
//! status messages, mouse hit regions and synthetic key releases for
//! terminals that never report them.

use crate::error::PianoError;
use crate::piano::{KeyCode, NoteTable, Row};
use crate::session::Session;
use ratatui::layout::Rect;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time after the last press of a key before it is released, when
/// the terminal cannot report key releases.
pub const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_millis(650);

/// How long status messages stay visible.
const STATUS_DURATION: Duration = Duration::from_secs(3);

/// Runtime settings collected from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory recordings are saved into.
    pub output_dir: PathBuf,
    /// Synthetic release timeout for terminals without release events.
    pub release_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            release_timeout: DEFAULT_RELEASE_TIMEOUT,
        }
    }
}

/// Lifecycle of the application.
pub enum Phase {
    /// Waiting for the user to start audio.
    Welcome,
    /// Audio is running.
    Running(Box<Session>),
    /// The capability check failed; shown until acknowledged.
    Failed(String),
}

/// Which transport button a region belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    StartRecording,
    StopRecording,
    Save,
    Play,
}

/// Layout regions for mouse hit testing, updated every frame.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// Screen rectangle of every on-screen key.
    pub keys: Vec<(Rect, Row, usize)>,
    /// Screen rectangle of every clickable button.
    pub buttons: Vec<(Rect, Button)>,
}

impl LayoutRegions {
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// Returns the key slot under the given coordinates.
    pub fn key_at(&self, x: u16, y: u16) -> Option<(Row, usize)> {
        self.keys
            .iter()
            .find(|(rect, _, _)| Self::contains(*rect, x, y))
            .map(|&(_, row, index)| (row, index))
    }

    /// Returns the button under the given coordinates.
    pub fn button_at(&self, x: u16, y: u16) -> Option<Button> {
        self.buttons
            .iter()
            .find(|(rect, _)| Self::contains(*rect, x, y))
            .map(|&(_, button)| button)
    }
}

/// Main application state.
pub struct App {
    table: Arc<NoteTable>,
    pub settings: Settings,
    pub phase: Phase,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
    /// Layout regions for mouse hit testing.
    pub layout: LayoutRegions,
    /// Whether the terminal reports key release events.
    pub key_release_supported: bool,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    /// Last press time of each held key, for synthetic release.
    held_keys: HashMap<KeyCode, Instant>,
    /// Slot pressed with the mouse and its key, released on mouse up.
    pointer: Option<(Row, usize, KeyCode)>,
}

impl App {
    /// Creates the application in the welcome phase.
    pub fn new(table: NoteTable, settings: Settings) -> Self {
        Self {
            table: Arc::new(table),
            settings,
            phase: Phase::Welcome,
            status_message: None,
            layout: LayoutRegions::default(),
            key_release_supported: false,
            show_help: false,
            held_keys: HashMap::new(),
            pointer: None,
        }
    }

    /// The note table the session plays.
    pub fn table(&self) -> &NoteTable {
        &self.table
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::Running(session) => Some(&**session),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::Running(session) => Some(&mut **session),
            _ => None,
        }
    }

    /// Starts audio in response to a user action.
    ///
    /// Does nothing unless the app is on the welcome screen.
    pub fn start_session(&mut self) {
        if matches!(self.phase, Phase::Welcome) {
            let result = Session::start(Arc::clone(&self.table));
            self.begin(result);
        }
    }

    /// Moves to the running or failed phase depending on `result`.
    pub fn begin(&mut self, result: Result<Session, PianoError>) {
        self.phase = match result {
            Ok(session) => Phase::Running(Box::new(session)),
            Err(e) => Phase::Failed(e.to_string()),
        };
    }

    /// Returns true if the app is showing the capability notice.
    pub fn has_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed(_))
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_DURATION {
                self.status_message = None;
            }
        }
    }

    /// Handles a key press or key repeat.
    ///
    /// Returns true if the key is bound to a note.
    pub fn handle_note_press(&mut self, key: KeyCode, now: Instant) -> bool {
        let Some(session) = self.session_mut() else {
            return false;
        };
        let matched = session.dispatcher_mut().on_key_down(key);
        if matched {
            self.held_keys.insert(key, now);
        }
        matched
    }

    /// Handles a key release.
    pub fn handle_note_release(&mut self, key: KeyCode) {
        self.held_keys.remove(&key);
        if let Some(session) = self.session_mut() {
            session.dispatcher_mut().on_key_up(key);
        }
    }

    /// Releases keys that have not been pressed or repeated within the
    /// release timeout. Only used when the terminal reports no releases.
    pub fn release_stale_keys(&mut self, now: Instant) {
        if self.key_release_supported {
            return;
        }
        let timeout = self.settings.release_timeout;
        let pointer_key = self.pointer.map(|(_, _, key)| key);
        let stale: Vec<KeyCode> = self
            .held_keys
            .iter()
            .filter(|(key, pressed)| {
                Some(**key) != pointer_key && now.duration_since(**pressed) >= timeout
            })
            .map(|(key, _)| *key)
            .collect();

        for key in stale {
            self.handle_note_release(key);
        }
    }

    /// Handles the terminal losing focus.
    pub fn handle_focus_lost(&mut self) {
        self.held_keys.clear();
        self.pointer = None;
        if let Some(session) = self.session_mut() {
            session.on_visibility_change(true);
        }
    }

    /// Starts a recording.
    pub fn start_recording(&mut self) {
        let Some(session) = self.session_mut() else {
            return;
        };
        if session.start_recording().is_some() {
            self.set_status("Recording...");
        }
    }

    /// Stops the recording in progress.
    pub fn stop_recording(&mut self) {
        let Some(session) = self.session_mut() else {
            return;
        };
        let message = match session.stop_recording() {
            Ok(Some(recording)) => format!(
                "Recording {} ready ({:.1}s) - F4 to save, F5 to play",
                recording.number(),
                recording.duration().as_secs_f32()
            ),
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Recording failed: {}", e);
                format!("Recording failed: {}", e)
            }
        };
        self.set_status(message);
    }

    /// Saves the latest recording into the output directory.
    pub fn save_recording(&mut self) {
        let dir = self.settings.output_dir.clone();
        let Some(session) = self.session() else {
            return;
        };
        let message = match session.save_latest(&dir) {
            Ok(Some(path)) => format!("Saved {}", path.display()),
            Ok(None) => "Nothing recorded yet".to_string(),
            Err(e) => {
                tracing::error!("Save failed: {:?}", e);
                format!("Save failed: {}", e)
            }
        };
        self.set_status(message);
    }

    /// Plays the latest recording, or stops playback if one is playing.
    pub fn toggle_playback(&mut self) {
        let Some(session) = self.session_mut() else {
            return;
        };
        if session.is_playing_back() {
            session.stop_playback();
            self.set_status("Playback stopped");
            return;
        }
        let message = match session.play_latest() {
            Ok(true) => "Playing recording".to_string(),
            Ok(false) => "Nothing to play".to_string(),
            Err(e) => {
                tracing::error!("Playback failed: {:?}", e);
                format!("Playback failed: {}", e)
            }
        };
        self.set_status(message);
    }

    /// Handles a left mouse button press.
    pub fn handle_mouse_down(&mut self, x: u16, y: u16, now: Instant) {
        if let Some(button) = self.layout.button_at(x, y) {
            match button {
                Button::Start => self.start_session(),
                Button::StartRecording => self.start_recording(),
                Button::StopRecording => self.stop_recording(),
                Button::Save => self.save_recording(),
                Button::Play => self.toggle_playback(),
            }
            return;
        }

        let Some((row, index)) = self.layout.key_at(x, y) else {
            return;
        };
        let Some(session) = self.session_mut() else {
            return;
        };
        if let Some(key) = session.dispatcher_mut().on_pointer_down(row, index) {
            self.held_keys.insert(key, now);
            self.pointer = Some((row, index, key));
        }
    }

    /// Handles a left mouse button release.
    pub fn handle_mouse_up(&mut self) {
        let Some((row, index, key)) = self.pointer.take() else {
            return;
        };
        self.held_keys.remove(&key);
        if let Some(session) = self.session_mut() {
            session.dispatcher_mut().on_pointer_up(row, index);
        }
    }

    /// Per-frame housekeeping.
    pub fn tick(&mut self, now: Instant) {
        self.clear_expired_status();
        self.release_stale_keys(now);
        if let Some(session) = self.session_mut() {
            session.tick(now);
        }
    }

    /// Ends the session, if one is running.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session_mut() {
            session.shutdown();
        }
        self.phase = Phase::Welcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioContext, SAMPLE_RATE};

    fn running_app() -> App {
        let mut app = App::new(NoteTable::default(), Settings::default());
        let ctx = AudioContext::offline(SAMPLE_RATE);
        let session = Session::with_context(ctx, None, Arc::clone(&app.table));
        app.begin(session);
        app
    }

    fn sounding(app: &App) -> usize {
        app.session().unwrap().dispatcher().sounding_count()
    }

    #[test]
    fn test_capability_failure_creates_no_session() {
        let mut app = App::new(NoteTable::default(), Settings::default());
        app.begin(Err(PianoError::CapabilityMissing("no device".into())));

        assert!(app.has_failed());
        assert!(app.session().is_none());
        match &app.phase {
            Phase::Failed(message) => assert!(message.contains("no device")),
            _ => panic!("expected failed phase"),
        }

        // Key events are ignored without a session
        assert!(!app.handle_note_press(KeyCode::new(81), Instant::now()));
    }

    #[test]
    fn test_keys_before_start_are_ignored() {
        let mut app = App::new(NoteTable::default(), Settings::default());
        assert!(!app.handle_note_press(KeyCode::new(81), Instant::now()));
        app.handle_note_release(KeyCode::new(81));
        assert!(app.session().is_none());
    }

    #[test]
    fn test_synthetic_release() {
        let mut app = running_app();
        let start = Instant::now();
        let key = KeyCode::new(81);

        app.handle_note_press(key, start);
        app.release_stale_keys(start + Duration::from_millis(300));
        assert_eq!(sounding(&app), 1);

        // A repeat keeps the key held
        app.handle_note_press(key, start + Duration::from_millis(500));
        app.release_stale_keys(start + Duration::from_millis(900));
        assert_eq!(sounding(&app), 1);

        app.release_stale_keys(start + Duration::from_millis(1200));
        assert_eq!(sounding(&app), 0);
    }

    #[test]
    fn test_real_releases_disable_synthetic_release() {
        let mut app = running_app();
        app.key_release_supported = true;
        let start = Instant::now();

        app.handle_note_press(KeyCode::new(81), start);
        app.release_stale_keys(start + Duration::from_secs(10));
        assert_eq!(sounding(&app), 1);

        app.handle_note_release(KeyCode::new(81));
        assert_eq!(sounding(&app), 0);
    }

    #[test]
    fn test_focus_lost_stops_everything() {
        let mut app = running_app();
        app.key_release_supported = true;
        let now = Instant::now();
        app.handle_note_press(KeyCode::new(73), now);
        app.handle_note_press(KeyCode::new(65), now);
        assert_eq!(sounding(&app), 2);

        app.handle_focus_lost();
        assert_eq!(sounding(&app), 0);
    }

    #[test]
    fn test_mouse_on_key() {
        let mut app = running_app();
        app.layout.keys = vec![
            (Rect::new(0, 5, 4, 3), Row::Natural, 0),
            (Rect::new(2, 2, 3, 3), Row::Altered, 0),
        ];
        let now = Instant::now();

        app.handle_mouse_down(1, 6, now);
        assert!(app.session().unwrap().dispatcher().is_sounding(Row::Natural, 0));

        // Mouse-held keys are not released by the timeout
        app.release_stale_keys(now + Duration::from_secs(5));
        assert_eq!(sounding(&app), 1);

        app.handle_mouse_up();
        assert_eq!(sounding(&app), 0);

        app.handle_mouse_down(3, 3, now);
        assert!(app.session().unwrap().dispatcher().is_sounding(Row::Altered, 0));
        app.handle_mouse_up();
        assert_eq!(sounding(&app), 0);
    }

    #[test]
    fn test_record_buttons() {
        let mut app = running_app();
        app.layout.buttons = vec![
            (Rect::new(0, 0, 10, 1), Button::StartRecording),
            (Rect::new(10, 0, 10, 1), Button::StopRecording),
        ];
        let now = Instant::now();

        app.handle_mouse_down(2, 0, now);
        assert!(app.session().unwrap().is_recording());

        app.handle_mouse_down(12, 0, now);
        let session = app.session().unwrap();
        assert!(!session.is_recording());
        assert!(session.recorder().latest().is_some());
        assert!(app.status_message.as_ref().unwrap().0.contains("Recording 1"));
    }

    #[test]
    fn test_shutdown_returns_to_welcome() {
        let mut app = running_app();
        app.shutdown();
        assert!(matches!(app.phase, Phase::Welcome));
    }
}
