use glam::Vec4;

/// Number of particle streams.
pub const STREAM_COUNT: usize = 23;

/// One particle attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Stream {
    PositionX = 0,
    PositionY = 1,
    PositionZ = 2,
    Rotation = 3,
    GeneratedScaleX = 4,
    GeneratedScaleY = 5,
    GeneratedScaleZ = 6,
    ScaleX = 7,
    ScaleY = 8,
    ScaleZ = 9,
    GeneratedVelocityX = 10,
    GeneratedVelocityY = 11,
    GeneratedVelocityZ = 12,
    VelocityX = 13,
    VelocityY = 14,
    VelocityZ = 15,
    ColorR = 16,
    ColorG = 17,
    ColorB = 18,
    ColorA = 19,
    Frame = 20,
    TotalLifetime = 21,
    CurrentLifetime = 22,
}

impl Stream {
    /// The mask bit of this stream.
    #[must_use]
    pub fn mask(self) -> StreamMask {
        StreamMask::from_bits_truncate(1 << (self as u32))
    }
}

bitflags::bitflags! {
    /// Set of particle streams, derived at load time from the generators and
    /// updaters a particle system declares.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StreamMask: u32 {
        const POSITION_X           = 1 << 0;
        const POSITION_Y           = 1 << 1;
        const POSITION_Z           = 1 << 2;
        const ROTATION             = 1 << 3;
        const GENERATED_SCALE_X    = 1 << 4;
        const GENERATED_SCALE_Y    = 1 << 5;
        const GENERATED_SCALE_Z    = 1 << 6;
        const SCALE_X              = 1 << 7;
        const SCALE_Y              = 1 << 8;
        const SCALE_Z              = 1 << 9;
        const GENERATED_VELOCITY_X = 1 << 10;
        const GENERATED_VELOCITY_Y = 1 << 11;
        const GENERATED_VELOCITY_Z = 1 << 12;
        const VELOCITY_X           = 1 << 13;
        const VELOCITY_Y           = 1 << 14;
        const VELOCITY_Z           = 1 << 15;
        const COLOR_R              = 1 << 16;
        const COLOR_G              = 1 << 17;
        const COLOR_B              = 1 << 18;
        const COLOR_A              = 1 << 19;
        const FRAME                = 1 << 20;
        const TOTAL_LIFETIME       = 1 << 21;
        const CURRENT_LIFETIME     = 1 << 22;
    }
}

/// One allocated stream: dense `f32` values stored as 4-wide lanes, which
/// makes the buffer 16-byte aligned with a length that is a multiple of
/// four by construction.
#[derive(Debug, Clone, Default)]
pub struct StreamBuffer {
    lanes: Vec<Vec4>,
}

impl StreamBuffer {
    /// Allocates a zeroed stream for `capacity` particles. `capacity` must
    /// already be a multiple of four.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        debug_assert_eq!(capacity % 4, 0, "stream capacity must be 4-aligned");
        Self {
            lanes: vec![Vec4::ZERO; capacity / 4],
        }
    }

    /// Capacity in particles.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lanes.len() * 4
    }

    /// Scalar view.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.lanes)
    }

    /// Mutable scalar view.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.lanes)
    }

    /// 4-wide lane view.
    #[must_use]
    pub fn lanes(&self) -> &[Vec4] {
        &self.lanes
    }

    /// Mutable 4-wide lane view.
    pub fn lanes_mut(&mut self) -> &mut [Vec4] {
        &mut self.lanes
    }
}

/// The 23 optional streams of one particle primitive.
#[derive(Debug, Default)]
pub struct ParticleStreams {
    buffers: [Option<StreamBuffer>; STREAM_COUNT],
}

impl ParticleStreams {
    /// Allocates every stream selected by `mask` with the given capacity and
    /// frees the rest. `capacity` must be a multiple of four.
    pub fn allocate(&mut self, mask: StreamMask, capacity: usize) {
        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            let selected = mask.bits() & (1 << index) != 0;
            *buffer = selected.then(|| StreamBuffer::new(capacity));
        }
    }

    /// Scalar view of a stream.
    #[must_use]
    pub fn get(&self, stream: Stream) -> Option<&[f32]> {
        self.buffers[stream as usize]
            .as_ref()
            .map(StreamBuffer::as_slice)
    }

    /// Mutable scalar view of a stream.
    pub fn get_mut(&mut self, stream: Stream) -> Option<&mut [f32]> {
        self.buffers[stream as usize]
            .as_mut()
            .map(StreamBuffer::as_mut_slice)
    }

    /// Lane view of a stream.
    #[must_use]
    pub fn lanes(&self, stream: Stream) -> Option<&[Vec4]> {
        self.buffers[stream as usize]
            .as_ref()
            .map(StreamBuffer::lanes)
    }

    /// Mutable lane views of several distinct streams at once.
    ///
    /// Panics if any requested stream is not allocated; updaters only ask
    /// for streams their mask declared, which the system allocated at load.
    pub fn disjoint_lanes_mut<const N: usize>(&mut self, streams: [Stream; N]) -> [&mut [Vec4]; N] {
        let indices = streams.map(|stream| stream as usize);
        self.buffers
            .get_disjoint_mut(indices)
            .expect("distinct streams")
            .map(|buffer| {
                buffer
                    .as_mut()
                    .expect("stream not allocated")
                    .lanes_mut()
            })
    }

    /// Mutable scalar views of several distinct streams at once.
    pub fn disjoint_mut<const N: usize>(&mut self, streams: [Stream; N]) -> [&mut [f32]; N] {
        let indices = streams.map(|stream| stream as usize);
        self.buffers
            .get_disjoint_mut(indices)
            .expect("distinct streams")
            .map(|buffer| {
                buffer
                    .as_mut()
                    .expect("stream not allocated")
                    .as_mut_slice()
            })
    }

    /// Iterates every allocated buffer mutably (kill compaction walks all of
    /// them).
    pub fn allocated_mut(&mut self) -> impl Iterator<Item = &mut StreamBuffer> {
        self.buffers.iter_mut().filter_map(Option::as_mut)
    }

    /// Whether a stream is allocated.
    #[must_use]
    pub fn has(&self, stream: Stream) -> bool {
        self.buffers[stream as usize].is_some()
    }
}
