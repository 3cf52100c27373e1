//! Fixed-size capture window for the pitch tracker.

/// Accumulates scaled input samples into a window of fixed length.
///
/// When the window fills, [`push()`](Self::push) returns `true` and the
/// cursor wraps to the start. The filled contents stay readable through
/// [`window()`](Self::window) until the next push begins overwriting them,
/// so the caller must take whatever snapshots it needs straight away.
#[derive(Debug, Clone)]
pub struct CaptureWindow {
    buffer: Box<[f32]>,
    write_pos: usize,
    gain: f32,
}

impl CaptureWindow {
    /// # Panics
    ///
    /// Panics if `len == 0`.
    pub fn new(len: usize, gain: f32) -> Self {
        assert_ne!(len, 0);

        Self { buffer: vec![0.0; len].into_boxed_slice(), write_pos: 0, gain }
    }

    /// Appends one sample, scaled by the capture gain. Returns `true` if this
    /// sample completed the window.
    #[inline]
    pub fn push(&mut self, sample: f32) -> bool {
        self.buffer[self.write_pos] = sample * self.gain;
        self.write_pos += 1;

        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
            return true;
        }

        false
    }

    /// The window contents. Only meaningful as a whole directly after
    /// `push()` returned `true`.
    pub fn window(&self) -> &[f32] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub const fn gain(&self) -> f32 {
        self.gain
    }

    pub const fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
