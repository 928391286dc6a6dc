//! The session-scoped audio context.
//!
//! An [`AudioContext`] owns the mixing graph: every tone generator, the
//! output bus they connect to, the analysis tap input and the recording
//! capture. The context is cheap to clone and is passed explicitly to every
//! component that needs audio; there is no global audio state.
//!
//! The graph is rendered either by rodio's output thread (through
//! [`BusSource`]) or offline via [`AudioContext::render`].

use crate::audio::oscillator::TriangleOscillator;
use crate::error::{PianoError, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Sample rate for synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Frames rendered per block on the output thread.
const BUFFER_SIZE: usize = 256;

/// Number of samples kept for the analysis tap (one FFT frame).
pub const TAP_WINDOW: usize = 1024;

/// Per-generator gain on the bus, keeps a handful of voices below clipping.
pub const VOICE_GAIN: f32 = 0.2;

/// Identifies a generator inside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(usize);

/// Where a generator can be connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The output bus: listener and recording.
    Bus,
    /// The analysis tap feeding the spectrum view.
    Tap,
}

/// Connection state of one generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connections {
    pub bus: bool,
    pub tap: bool,
}

impl Connections {
    fn set(&mut self, destination: Destination, connected: bool) {
        match destination {
            Destination::Bus => self.bus = connected,
            Destination::Tap => self.tap = connected,
        }
    }

    /// Returns true if connected anywhere.
    pub fn any(&self) -> bool {
        self.bus || self.tap
    }
}

struct Generator {
    osc: TriangleOscillator,
    connections: Connections,
}

/// The mixing graph shared between the UI thread and the output thread.
struct AudioGraph {
    generators: Vec<Generator>,
    /// Most recent tap input, oldest first.
    tap: VecDeque<f32>,
    /// Chunks captured from the bus while a recording is active.
    capture: Option<Vec<Vec<f32>>>,
    sample_rate: u32,
}

impl AudioGraph {
    fn new(sample_rate: u32) -> Self {
        Self {
            generators: Vec::new(),
            tap: VecDeque::from(vec![0.0; TAP_WINDOW]),
            capture: None,
            sample_rate,
        }
    }

    /// Renders mono bus frames into `out`.
    ///
    /// Every generator advances, connected or not.
    fn render(&mut self, out: &mut [f32]) {
        for frame in out.iter_mut() {
            let mut bus = 0.0;
            let mut tap = 0.0;
            for generator in &mut self.generators {
                let sample = generator.osc.next_sample() * VOICE_GAIN;
                if generator.connections.bus {
                    bus += sample;
                }
                if generator.connections.tap {
                    tap += sample;
                }
            }
            *frame = bus.clamp(-1.0, 1.0);

            self.tap.pop_front();
            self.tap.push_back(tap);
        }

        if let Some(chunks) = self.capture.as_mut() {
            chunks.push(out.to_vec());
        }
    }
}

/// Handle to the session's audio graph.
#[derive(Clone)]
pub struct AudioContext {
    graph: Arc<Mutex<AudioGraph>>,
    sample_rate: u32,
}

/// Keeps the device stream alive; dropping it silences the session.
pub struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Handle for playing additional sources (recording playback).
    pub fn handle(&self) -> &OutputStreamHandle {
        &self.handle
    }
}

impl AudioContext {
    /// Creates a context with no device attached.
    ///
    /// Audio is only produced when [`render`](Self::render) is called.
    pub fn offline(sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(AudioGraph::new(sample_rate))),
            sample_rate,
        }
    }

    /// Creates a context playing through the default output device.
    ///
    /// # Errors
    ///
    /// Returns `PianoError::CapabilityMissing` if no output device can be
    /// opened or the stream refuses the bus source.
    pub fn with_default_output() -> Result<(Self, AudioOutput)> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PianoError::CapabilityMissing(e.to_string()))?;

        let ctx = Self::offline(SAMPLE_RATE);
        handle
            .play_raw(BusSource::new(ctx.clone()))
            .map_err(|e| PianoError::CapabilityMissing(e.to_string()))?;

        tracing::info!("Audio output opened at {} Hz", SAMPLE_RATE);

        Ok((
            ctx,
            AudioOutput {
                _stream: stream,
                handle,
            },
        ))
    }

    fn graph(&self) -> MutexGuard<'_, AudioGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The context sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Allocates a running triangle generator, initially disconnected.
    pub fn create_generator(&self, frequency: f32) -> GeneratorId {
        let mut graph = self.graph();
        let osc = TriangleOscillator::new(frequency, graph.sample_rate);
        graph.generators.push(Generator {
            osc,
            connections: Connections::default(),
        });
        GeneratorId(graph.generators.len() - 1)
    }

    /// Number of generators allocated in this context.
    pub fn generator_count(&self) -> usize {
        self.graph().generators.len()
    }

    /// Connects a generator to a destination. Connecting twice is a no-op.
    pub fn connect(&self, id: GeneratorId, destination: Destination) {
        if let Some(generator) = self.graph().generators.get_mut(id.0) {
            generator.connections.set(destination, true);
        }
    }

    /// Disconnects a generator from every destination.
    pub fn disconnect(&self, id: GeneratorId) {
        if let Some(generator) = self.graph().generators.get_mut(id.0) {
            generator.connections = Connections::default();
        }
    }

    /// Current connections of a generator.
    pub fn connections(&self, id: GeneratorId) -> Connections {
        self.graph()
            .generators
            .get(id.0)
            .map(|g| g.connections)
            .unwrap_or_default()
    }

    /// Number of generators connected to the output bus.
    pub fn bus_connection_count(&self) -> usize {
        self.graph()
            .generators
            .iter()
            .filter(|g| g.connections.bus)
            .count()
    }

    /// Renders mono frames from the bus into `out`.
    pub fn render(&self, out: &mut [f32]) {
        self.graph().render(out);
    }

    /// Copies the latest tap window (oldest sample first) into `out`.
    pub(crate) fn read_tap(&self, out: &mut [f32]) {
        let graph = self.graph();
        let skip = graph.tap.len().saturating_sub(out.len());
        for (dst, src) in out.iter_mut().zip(graph.tap.iter().skip(skip)) {
            *dst = *src;
        }
    }

    /// Starts capturing bus output. Any capture in progress is discarded.
    pub(crate) fn begin_capture(&self) {
        self.graph().capture = Some(Vec::new());
    }

    /// Stops capturing and returns the chunks captured since `begin_capture`.
    pub(crate) fn end_capture(&self) -> Vec<Vec<f32>> {
        self.graph().capture.take().unwrap_or_default()
    }

    /// Returns true while a capture is running.
    pub fn is_capturing(&self) -> bool {
        self.graph().capture.is_some()
    }
}

/// Audio source that pulls blocks from the graph.
/// Implements rodio's Source trait for playback.
struct BusSource {
    ctx: AudioContext,
    buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl BusSource {
    fn new(ctx: AudioContext) -> Self {
        Self {
            ctx,
            buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for BusSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            self.ctx.render(&mut self.buf);
            self.buf_pos = 0;
        }

        // The bus is mono; duplicate onto both channels
        let sample = self.buf[self.buf_pos];

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for BusSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.ctx.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
