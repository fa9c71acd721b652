use std::sync::Arc;

use parking_lot::Mutex;

/// Append-only chunk store for one track.
///
/// Fed from the capture backend's chunk callback; wrap in
/// `Arc<parking_lot::Mutex<..>>` so the callback and the controller can
/// share it. Unlike a rolling capture window, nothing is ever dropped:
/// stop-time muxing needs the complete take.
#[derive(Debug, Default)]
pub struct TrackBuffer {
    chunks: Vec<Vec<u8>>,
    byte_len: usize,
}

impl TrackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk in receipt order. Zero-length chunks are ignored.
    pub fn append(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.byte_len += chunk.len();
        self.chunks.push(chunk.to_vec());
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenate all chunks into the track's full payload.
    pub fn concat(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.byte_len);
        for chunk in &self.chunks {
            payload.extend_from_slice(chunk);
        }
        payload
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.byte_len = 0;
    }
}

/// Shared handle to one track's buffer.
pub type SharedTrackBuffer = Arc<Mutex<TrackBuffer>>;

/// One track's capture state: device binding, negotiated format, and the
/// chunk buffer the stream appends into.
#[derive(Clone)]
pub struct TrackCapture {
    /// 1-based track index.
    pub index: usize,
    /// Device identifier the stream was bound to; empty = default device.
    pub source_id: String,
    /// Device label for file naming; "UnknownDevice" when unresolvable.
    pub source_label: String,
    /// Sample rate the stream actually negotiated.
    pub sample_rate: u32,
    /// Channel count the stream actually negotiated.
    pub channel_count: u16,
    pub buffer: SharedTrackBuffer,
}

impl TrackCapture {
    pub fn new(index: usize, source_id: String, source_label: String) -> Self {
        Self {
            index,
            source_id,
            source_label,
            sample_rate: 0,
            channel_count: 0,
            buffer: Arc::new(Mutex::new(TrackBuffer::new())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// The track's full captured payload.
    pub fn payload(&self) -> Vec<u8> {
        self.buffer.lock().concat()
    }
}
