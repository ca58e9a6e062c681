//! Circular delay line with read-then-write feedback

/// Fixed-capacity circular buffer with a moving write cursor
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a zeroed line holding `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Reallocate to `capacity` samples and clear
    pub fn resize(&mut self, capacity: usize) {
        self.buffer.clear();
        self.buffer.resize(capacity.max(1), 0.0);
        self.write_pos = 0;
    }

    /// Full-length step: return the oldest sample, store
    /// `input + feedback * oldest` in its place, advance
    #[inline]
    pub fn process(&mut self, input: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input + output * feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }

    /// Tapped step: read `delay` samples behind the cursor, store
    /// `input + feedback * tapped` at the cursor, advance
    ///
    /// A delay of 0 or of the full capacity reads the cell about to be
    /// overwritten, which is the same as [`DelayLine::process`].
    #[inline]
    pub fn process_tap(&mut self, input: f32, delay: usize, feedback: f32) -> f32 {
        let len = self.buffer.len();
        let read_pos = (self.write_pos + len - delay % len) % len;

        let output = self.buffer[read_pos];
        self.buffer[self.write_pos] = input + output * feedback;
        self.write_pos = (self.write_pos + 1) % len;
        output
    }

    /// Zero the contents and rewind the cursor
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
