//! Recording the output bus to WAV.
//!
//! Each press of "start" opens a new recording session appended to the
//! recorder's list. While a session is active the bus output is captured in
//! chunks; "stop" encodes the chunks into a single immutable WAV blob held in
//! memory. Blobs can be saved to disk, played back, or revoked.

use crate::audio::context::AudioContext;
use crate::error::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(Uuid);

impl RecordingId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished recording.
#[derive(Debug, Clone)]
pub struct Recording {
    id: RecordingId,
    /// 1-based position in the session list.
    number: usize,
    frames: usize,
    sample_rate: u32,
    wav: Arc<[u8]>,
}

impl Recording {
    pub fn id(&self) -> RecordingId {
        self.id
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Number of captured frames.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
    }

    /// The encoded WAV file.
    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }

    /// File name used when saving.
    pub fn file_name(&self) -> String {
        format!("audio-{}.wav", self.number)
    }

    /// Writes the WAV file into `dir`, returning the written path.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        fs::write(&path, &self.wav)?;
        tracing::info!("Saved recording {} to {:?}", self.id, path);
        Ok(path)
    }

    /// A reader over the WAV bytes, for decoding.
    pub fn reader(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.wav.to_vec())
    }
}

/// Lifecycle of a recording session.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Capturing bus output.
    Active,
    /// Finalized into a recording.
    Finished(Recording),
    /// The recording was discarded.
    Revoked,
}

/// One start/stop cycle of the recorder.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: RecordingId,
    pub state: SessionState,
}

/// Manages recording sessions over a context's output bus.
pub struct Recorder {
    ctx: AudioContext,
    sessions: Vec<RecordingSession>,
}

impl Recorder {
    pub fn new(ctx: &AudioContext) -> Self {
        Self {
            ctx: ctx.clone(),
            sessions: Vec::new(),
        }
    }

    /// Returns true while a session is capturing.
    pub fn is_recording(&self) -> bool {
        self.sessions
            .iter()
            .any(|s| matches!(s.state, SessionState::Active))
    }

    /// Starts a new session.
    ///
    /// Returns `None` without side effects if a session is already active.
    pub fn start(&mut self) -> Option<RecordingId> {
        if self.is_recording() {
            return None;
        }

        let id = RecordingId::new();
        self.ctx.begin_capture();
        self.sessions.push(RecordingSession {
            id,
            state: SessionState::Active,
        });
        tracing::info!("Recording {} started", id);
        Some(id)
    }

    /// Stops the active session and finalizes it.
    ///
    /// Returns `Ok(None)` if nothing was recording.
    ///
    /// # Errors
    ///
    /// Returns error if the WAV encoding fails; the session is then revoked.
    pub fn stop(&mut self) -> Result<Option<&Recording>> {
        let Some(index) = self
            .sessions
            .iter()
            .position(|s| matches!(s.state, SessionState::Active))
        else {
            return Ok(None);
        };

        let chunks = self.ctx.end_capture();
        let id = self.sessions[index].id;

        let recording = match encode_wav(&chunks, self.ctx.sample_rate()) {
            Ok((wav, frames)) => Recording {
                id,
                number: index + 1,
                frames,
                sample_rate: self.ctx.sample_rate(),
                wav: wav.into(),
            },
            Err(e) => {
                self.sessions[index].state = SessionState::Revoked;
                return Err(e);
            }
        };

        tracing::info!(
            "Recording {} stopped ({} frames)",
            id,
            recording.frame_count()
        );

        let session = &mut self.sessions[index];
        session.state = SessionState::Finished(recording);
        match &session.state {
            SessionState::Finished(recording) => Ok(Some(recording)),
            _ => Ok(None),
        }
    }

    /// Discards a finished recording's data. Returns true if one was revoked.
    pub fn revoke(&mut self, id: RecordingId) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) if matches!(session.state, SessionState::Finished(_)) => {
                session.state = SessionState::Revoked;
                true
            }
            _ => false,
        }
    }

    /// The most recent recording that has not been revoked.
    pub fn latest(&self) -> Option<&Recording> {
        self.sessions.iter().rev().find_map(|s| match &s.state {
            SessionState::Finished(recording) => Some(recording),
            _ => None,
        })
    }

    /// All sessions in start order.
    pub fn sessions(&self) -> &[RecordingSession] {
        &self.sessions
    }
}

/// Encodes mono chunks as 16-bit stereo WAV, like the listener hears it.
fn encode_wav(chunks: &[Vec<f32>], sample_rate: u32) -> Result<(Vec<u8>, usize)> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut frames = 0usize;
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in chunks.iter().flatten() {
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(value)?;
            writer.write_sample(value)?;
            frames += 1;
        }
        writer.finalize()?;
    }

    Ok((cursor.into_inner(), frames))
}
