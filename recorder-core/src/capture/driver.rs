use std::sync::Arc;

use crate::capture::track_buffer::TrackCapture;
use crate::models::config::RecorderConfig;
use crate::models::device::{AudioDevice, UNKNOWN_DEVICE_LABEL};
use crate::models::error::RecorderError;
use crate::traits::capture_backend::{CaptureBackend, CaptureStream, ChunkSink, StreamRequest};
use crate::traits::devices::DeviceRegistry;

/// Owns the per-track stream lifecycle: one capture stream per configured
/// track, each appending its chunks into that track's buffer.
pub struct StreamCaptureDriver {
    backend: Arc<dyn CaptureBackend>,
}

impl StreamCaptureDriver {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CaptureBackend> {
        &self.backend
    }

    /// Open one stream per configured track.
    ///
    /// Each stream's sink is an O(1) append into the paired track buffer;
    /// chunks land in receipt order. Fails on the first device that cannot
    /// be bound, closing any streams already opened.
    pub fn open_tracks(
        &self,
        config: &RecorderConfig,
        registry: &dyn DeviceRegistry,
    ) -> Result<(Vec<TrackCapture>, Vec<Box<dyn CaptureStream>>), RecorderError> {
        let devices = registry.list_input_devices().unwrap_or_else(|e| {
            log::warn!("device listing failed, labels fall back to {}: {}", UNKNOWN_DEVICE_LABEL, e);
            Vec::new()
        });

        let mut tracks = Vec::with_capacity(config.track_count());
        let mut streams: Vec<Box<dyn CaptureStream>> = Vec::with_capacity(config.track_count());

        for index in 1..=config.track_count() {
            let source_id = config.source_for_track(index).to_string();
            let label = resolve_label(&devices, &source_id);
            let mut track = TrackCapture::new(index, source_id.clone(), label);

            let buffer = Arc::clone(&track.buffer);
            let sink: ChunkSink = Arc::new(move |chunk: &[u8]| {
                buffer.lock().append(chunk);
            });

            let request = StreamRequest {
                device_id: source_id,
                sample_rate: config.sample_rate,
                format: config.recording_format,
                bitrate: config.bitrate,
            };

            let stream = match self.backend.open(&request, sink) {
                Ok(stream) => stream,
                Err(e) => {
                    Self::stop_all(&mut streams).ok();
                    return Err(e);
                }
            };

            let format = stream.format();
            track.sample_rate = format.sample_rate;
            track.channel_count = format.channels;

            if config.debug {
                log::debug!(
                    "track {} bound to '{}' at {} Hz, {} ch",
                    track.index,
                    track.source_label,
                    track.sample_rate,
                    track.channel_count
                );
            }

            tracks.push(track);
            streams.push(stream);
        }

        Ok((tracks, streams))
    }

    pub fn start_all(streams: &mut [Box<dyn CaptureStream>]) -> Result<(), RecorderError> {
        for stream in streams.iter_mut() {
            stream.start()?;
        }
        Ok(())
    }

    pub fn pause_all(streams: &mut [Box<dyn CaptureStream>]) -> Result<(), RecorderError> {
        for stream in streams.iter_mut() {
            stream.pause()?;
        }
        Ok(())
    }

    pub fn resume_all(streams: &mut [Box<dyn CaptureStream>]) -> Result<(), RecorderError> {
        for stream in streams.iter_mut() {
            stream.resume()?;
        }
        Ok(())
    }

    /// Joined wait over every stream's stop.
    ///
    /// Each `stop` returns only after that stream's final chunk is flushed,
    /// so once this returns the track store is complete. Every stream is
    /// stopped even when some fail; the first error is returned afterwards
    /// so captured chunks from healthy tracks are never abandoned.
    pub fn stop_all(streams: &mut Vec<Box<dyn CaptureStream>>) -> Result<(), RecorderError> {
        let mut first_error = None;
        for stream in streams.iter_mut() {
            if let Err(e) = stream.stop() {
                log::error!("stream stop failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        streams.clear();
        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

fn resolve_label(devices: &[AudioDevice], source_id: &str) -> String {
    let found = if source_id.is_empty() {
        devices.iter().find(|d| d.is_default)
    } else {
        devices.iter().find(|d| d.id == source_id)
    };
    match found {
        Some(device) if !device.label.is_empty() => device.label.clone(),
        _ => UNKNOWN_DEVICE_LABEL.to_string(),
    }
}
