//! A single note's sound source.

use crate::audio::context::{AudioContext, Destination, GeneratorId};

/// One oscillator bound to one note.
///
/// The generator is allocated once and keeps running for the life of the
/// context; `play` and `stop` only change its connections. While sounding,
/// the generator is connected to both the output bus and the analysis tap;
/// while idle it is connected to neither.
pub struct Voice {
    ctx: AudioContext,
    generator: GeneratorId,
    frequency: f32,
    sounding: bool,
}

impl Voice {
    /// Allocates and starts a generator at `frequency` Hz.
    pub fn new(ctx: &AudioContext, frequency: f32) -> Self {
        Self {
            ctx: ctx.clone(),
            generator: ctx.create_generator(frequency),
            frequency,
            sounding: false,
        }
    }

    /// Starts sounding. Does nothing if already sounding, so key-repeat
    /// events cannot double-connect the generator.
    pub fn play(&mut self) {
        if !self.sounding {
            self.ctx.connect(self.generator, Destination::Bus);
            self.ctx.connect(self.generator, Destination::Tap);
            self.sounding = true;
        }
    }

    /// Stops sounding. Always disconnects, even if already stopped.
    pub fn stop(&mut self) {
        self.ctx.disconnect(self.generator);
        self.sounding = false;
    }

    /// Whether the voice is currently audible.
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    /// The voice frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// The generator backing this voice.
    pub fn generator(&self) -> GeneratorId {
        self.generator
    }
}
