//! Microphone capture via cpal.
//!
//! Each stream runs on a dedicated thread that owns every cpal object
//! (`cpal::Stream` is not `Send`); control crosses the boundary through
//! atomics. `stop` joins the thread, so by the time it returns the cpal
//! stream has been dropped and no further chunks can arrive.
//!
//! Chunks are delivered as interleaved 16-bit little-endian PCM, the only
//! format this backend supports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use recorder_core::processing::wav::quantize_sample;
use recorder_core::{
    CaptureBackend, CaptureStream, ChunkSink, RecorderError, RecordingFormat, StreamFormat,
    StreamRequest,
};

pub struct CpalCaptureBackend;

impl CaptureBackend for CpalCaptureBackend {
    fn supports_format(&self, format: RecordingFormat) -> bool {
        matches!(format, RecordingFormat::PcmS16le)
    }

    fn open(
        &self,
        request: &StreamRequest,
        sink: ChunkSink,
    ) -> Result<Box<dyn CaptureStream>, RecorderError> {
        let stream = CpalCaptureStream::open(request, sink)?;
        Ok(Box::new(stream))
    }
}

/// One open cpal input stream bound to one device.
pub struct CpalCaptureStream {
    format: StreamFormat,
    running: Arc<AtomicBool>,
    delivering: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CpalCaptureStream {
    fn open(request: &StreamRequest, sink: ChunkSink) -> Result<Self, RecorderError> {
        let running = Arc::new(AtomicBool::new(true));
        let delivering = Arc::new(AtomicBool::new(false));
        let fault = Arc::new(Mutex::new(None));

        let (format_tx, format_rx) = mpsc::channel::<Result<StreamFormat, RecorderError>>();

        let device_id = request.device_id.clone();
        let thread_running = Arc::clone(&running);
        let thread_delivering = Arc::clone(&delivering);
        let thread_fault = Arc::clone(&fault);

        let handle = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || {
                capture_thread(
                    device_id,
                    sink,
                    thread_running,
                    thread_delivering,
                    thread_fault,
                    format_tx,
                );
            })
            .map_err(|e| RecorderError::CaptureError(format!("failed to spawn capture thread: {}", e)))?;

        // The thread reports the negotiated format once its stream is live.
        let format = match format_rx.recv() {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(RecorderError::CaptureError(
                    "capture thread exited before reporting a format".into(),
                ));
            }
        };

        Ok(Self {
            format,
            running,
            delivering,
            fault,
            handle: Some(handle),
        })
    }
}

impl CaptureStream for CpalCaptureStream {
    fn format(&self) -> StreamFormat {
        self.format
    }

    fn start(&mut self) -> Result<(), RecorderError> {
        self.delivering.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RecorderError> {
        self.delivering.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), RecorderError> {
        self.delivering.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        // Surface a stream fault recorded by the error callback.
        match self.fault.lock().take() {
            Some(message) => Err(RecorderError::CaptureError(message)),
            None => Ok(()),
        }
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Capture loop owning the cpal device and stream.
///
/// Sequence: resolve device → read its default input config → build an f32
/// input stream → play → report the format → park until stopped.
fn capture_thread(
    device_id: String,
    sink: ChunkSink,
    running: Arc<AtomicBool>,
    delivering: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    format_tx: mpsc::Sender<Result<StreamFormat, RecorderError>>,
) {
    let device = match resolve_device(&device_id) {
        Ok(device) => device,
        Err(e) => {
            let _ = format_tx.send(Err(e));
            return;
        }
    };

    let supported = match device.default_input_config() {
        Ok(supported) => supported,
        Err(e) => {
            let _ = format_tx.send(Err(RecorderError::DeviceUnavailable(format!(
                "no usable input config: {}",
                e
            ))));
            return;
        }
    };

    let format = StreamFormat {
        sample_rate: supported.sample_rate().0,
        channels: supported.channels(),
    };
    let config: cpal::StreamConfig = supported.into();

    let callback_delivering = Arc::clone(&delivering);
    let data_callback = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        if !callback_delivering.load(Ordering::Relaxed) {
            return;
        }
        let mut bytes = Vec::with_capacity(data.len() * 2);
        for &sample in data {
            bytes.extend_from_slice(&quantize_sample(sample).to_le_bytes());
        }
        sink(&bytes);
    };

    let error_fault = Arc::clone(&fault);
    let error_callback = move |err: cpal::StreamError| {
        log::error!("cpal stream error: {}", err);
        error_fault.lock().get_or_insert_with(|| err.to_string());
    };

    let stream = match device.build_input_stream(&config, data_callback, error_callback, None) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = format_tx.send(Err(RecorderError::CaptureError(format!(
                "failed to build input stream: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = format_tx.send(Err(RecorderError::CaptureError(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }

    let _ = format_tx.send(Ok(format));

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(25));
    }

    // Dropping the stream tears down the device callback; nothing can reach
    // the sink after this point.
    drop(stream);
}

fn resolve_device(device_id: &str) -> Result<cpal::Device, RecorderError> {
    let host = cpal::default_host();
    if device_id.is_empty() {
        return host
            .default_input_device()
            .ok_or_else(|| RecorderError::DeviceUnavailable("no default input device".into()));
    }

    let mut devices = host.input_devices().map_err(|e| {
        RecorderError::DeviceUnavailable(format!("device enumeration failed: {}", e))
    })?;
    devices
        .find(|d| d.name().map(|n| n == device_id).unwrap_or(false))
        .ok_or_else(|| RecorderError::DeviceUnavailable(format!("device '{}' not found", device_id)))
}
