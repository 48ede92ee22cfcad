//! Block adapter between the device callback and the engine's fixed tick size
//!
//! libpd renders in ticks of [`PD_BLOCK_SIZE`] frames, while devices ask for
//! whatever buffer length they negotiated. The adapter renders whole ticks
//! into a scratch block and hands frames out across callback boundaries.
//! It never allocates after construction.

/// Frames per engine tick
pub const PD_BLOCK_SIZE: usize = 64;

/// Renders fixed-size engine blocks into arbitrarily sized device buffers
pub struct BlockRenderer {
    /// Engine output channels (interleaved in `block`)
    out_channels: usize,
    /// Silent input block fed to the engine
    input: Vec<f32>,
    /// Last rendered engine block, interleaved
    block: Vec<f32>,
    /// Read position into `block` in samples; `block.len()` means drained
    pos: usize,
}

impl BlockRenderer {
    /// # Arguments
    /// * `in_channels` - Engine input channels (fed silence)
    /// * `out_channels` - Engine output channels
    /// * `ticks` - Engine ticks rendered per refill
    pub fn new(in_channels: usize, out_channels: usize, ticks: usize) -> Self {
        let frames = PD_BLOCK_SIZE * ticks.max(1);
        let block = vec![0.0; frames * out_channels];
        let pos = block.len();
        Self {
            out_channels,
            input: vec![0.0; frames * in_channels],
            block,
            pos,
        }
    }

    /// Engine ticks rendered per refill
    pub fn ticks(&self) -> usize {
        if self.out_channels == 0 {
            return 0;
        }
        self.block.len() / self.out_channels / PD_BLOCK_SIZE
    }

    /// Fill an interleaved device buffer
    ///
    /// `render(input, output)` is called whenever the scratch block runs dry.
    /// Device channels beyond the engine's output count are zeroed; engine
    /// channels beyond the device's count are dropped.
    pub fn fill<F>(&mut self, data: &mut [f32], device_channels: usize, mut render: F)
    where
        F: FnMut(&[f32], &mut [f32]),
    {
        if device_channels == 0 {
            return;
        }
        if self.out_channels == 0 {
            data.iter_mut().for_each(|s| *s = 0.0);
            return;
        }

        let copy = device_channels.min(self.out_channels);
        for frame in data.chunks_mut(device_channels) {
            if self.pos >= self.block.len() {
                render(&self.input, &mut self.block);
                self.pos = 0;
            }

            let n = copy.min(frame.len());
            let src = &self.block[self.pos..self.pos + self.out_channels];
            frame[..n].copy_from_slice(&src[..n]);
            for ch in frame.iter_mut().skip(copy) {
                *ch = 0.0;
            }

            self.pos += self.out_channels;
        }
    }
}
