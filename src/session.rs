//! The running piano session.
//!
//! A session exists only after the capability check succeeded: it owns the
//! audio context and output stream, the dispatcher with all of its voices,
//! the spectrum visualizer and the recorder. Dropping the session cancels
//! the visualizer loop and silences everything.

use crate::audio::{AudioContext, AudioOutput, Recorder, Recording, RecordingId};
use crate::error::Result;
use crate::piano::{Dispatcher, KeyElements, NoteTable};
use crate::visualizer::{CancelToken, SpectrumVisualizer};
use anyhow::Context;
use rodio::{Decoder, Sink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A started piano session.
pub struct Session {
    ctx: AudioContext,
    /// Device stream; `None` for offline sessions.
    output: Option<AudioOutput>,
    dispatcher: Dispatcher,
    visualizer: SpectrumVisualizer,
    visualizer_token: CancelToken,
    recorder: Recorder,
    /// Playback of a finished recording, if any.
    player: Option<Sink>,
}

impl Session {
    /// Opens the default audio output and builds a session on it.
    ///
    /// # Errors
    ///
    /// Returns `PianoError::CapabilityMissing` if there is no usable audio
    /// output. Nothing is allocated in that case.
    pub fn start(table: Arc<NoteTable>) -> Result<Self> {
        let (ctx, output) = AudioContext::with_default_output().inspect_err(|e| {
            tracing::error!("Capability check failed: {}", e);
        })?;
        Self::with_context(ctx, Some(output), table)
    }

    /// Builds a session on an existing context.
    pub fn with_context(
        ctx: AudioContext,
        output: Option<AudioOutput>,
        table: Arc<NoteTable>,
    ) -> Result<Self> {
        let elements = KeyElements::for_table(&table);
        let dispatcher = Dispatcher::new(table, elements, &ctx)?;
        let visualizer = SpectrumVisualizer::new(&ctx);
        let visualizer_token = visualizer.cancel_token();
        let recorder = Recorder::new(&ctx);

        tracing::info!(
            "Session started with {} voices",
            dispatcher.table().playable_count()
        );

        Ok(Self {
            ctx,
            output,
            dispatcher,
            visualizer,
            visualizer_token,
            recorder,
            player: None,
        })
    }

    pub fn context(&self) -> &AudioContext {
        &self.ctx
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn visualizer(&self) -> &SpectrumVisualizer {
        &self.visualizer
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Handles the host being hidden or shown.
    ///
    /// Key releases are lost while hidden, so every note is silenced.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden {
            tracing::debug!("Focus lost, releasing all notes");
            self.dispatcher.stop_all();
        }
    }

    /// Advances the visualizer if a frame is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.visualizer.tick(now)
    }

    /// Starts a new recording. Returns `None` if one is already running.
    pub fn start_recording(&mut self) -> Option<RecordingId> {
        self.recorder.start()
    }

    /// Stops the running recording and returns the finished artifact.
    pub fn stop_recording(&mut self) -> Result<Option<&Recording>> {
        self.recorder.stop()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Writes the latest recording into `dir`.
    ///
    /// Returns `Ok(None)` if there is nothing to save.
    pub fn save_latest(&self, dir: &Path) -> anyhow::Result<Option<PathBuf>> {
        let Some(recording) = self.recorder.latest() else {
            return Ok(None);
        };
        let path = recording
            .save_to_dir(dir)
            .with_context(|| format!("Failed to save {}", recording.file_name()))?;
        Ok(Some(path))
    }

    /// Plays the latest recording through the output device.
    ///
    /// Any playback in progress is replaced. Returns `Ok(false)` if there is
    /// no recording or no output device.
    pub fn play_latest(&mut self) -> anyhow::Result<bool> {
        let (Some(recording), Some(output)) = (self.recorder.latest(), self.output.as_ref()) else {
            return Ok(false);
        };

        let decoder =
            Decoder::new(recording.reader()).context("Failed to decode recording for playback")?;
        let sink = Sink::try_new(output.handle()).context("Failed to open playback sink")?;
        sink.append(decoder);

        if let Some(previous) = self.player.replace(sink) {
            previous.stop();
        }
        Ok(true)
    }

    /// Stops playback of a recording.
    pub fn stop_playback(&mut self) {
        if let Some(player) = self.player.take() {
            player.stop();
        }
    }

    /// Returns true while a recording is being played back.
    pub fn is_playing_back(&self) -> bool {
        self.player.as_ref().is_some_and(|sink| !sink.empty())
    }

    /// Ends the session: cancels the frame loop and silences every voice.
    pub fn shutdown(&mut self) {
        self.visualizer_token.cancel();
        self.stop_playback();
        self.dispatcher.stop_all();
        if self.recorder.is_recording() {
            if let Err(e) = self.recorder.stop() {
                tracing::warn!("Discarded unfinished recording: {}", e);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
