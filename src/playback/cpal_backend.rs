//! Hardware output through CPAL.

use super::{
    hardware_queue::{HardwareQueue, Renderer},
    traits::{OutputBackend, OutputStream, StreamFormat},
};
use crate::error::{PlaybackError, PlaybackResult};
use crossbeam::channel::{self, Sender};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

use cpal::{
    BufferSize, Device, Stream, StreamConfig, SupportedBufferSize,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};

/// Opens 16-bit output streams on a CPAL device.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    preferred_device: Option<String>,
}

impl CpalBackend {
    /// Use the host's default output device.
    pub const fn new() -> Self {
        Self {
            preferred_device: None,
        }
    }

    /// Use the output device with the given name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            preferred_device: Some(name.into()),
        }
    }

    /// Names of the output devices on the default host.
    pub fn output_device_names() -> PlaybackResult<Vec<String>> {
        let host = cpal::default_host();
        let names = host
            .output_devices()?
            .filter_map(|device| device.name().ok())
            .collect();
        Ok(names)
    }

    fn select_device(preferred: Option<&str>) -> PlaybackResult<Device> {
        let host = cpal::default_host();
        match preferred {
            Some(name) => host
                .output_devices()?
                .find(|device| device.name().ok().as_deref() == Some(name))
                .ok_or_else(|| PlaybackError::device_not_found(name)),
            None => host
                .default_output_device()
                .ok_or(PlaybackError::NoDevicesAvailable),
        }
    }

    fn buffer_size_for(device: &Device, format: &StreamFormat) -> BufferSize {
        match device.default_output_config() {
            Ok(supported) => {
                let buffer_size = callback_buffer_size(format, supported.buffer_size());
                if buffer_size == BufferSize::Default {
                    warn!(
                        "Device does not accept {} frame buffers ({:?}), using its default",
                        format.frames_per_buffer(),
                        supported.buffer_size()
                    );
                }
                buffer_size
            }
            Err(err) => {
                warn!("Failed to query output config: {}", err);
                BufferSize::Default
            }
        }
    }

    fn build_stream(
        preferred: Option<&str>,
        format: &StreamFormat,
        mut queue: HardwareQueue,
        renderer: Renderer,
    ) -> PlaybackResult<Stream> {
        let device = Self::select_device(preferred)?;
        if let Ok(name) = device.name() {
            info!("Using audio device: {}", name);
        }

        let channels = cpal::ChannelCount::try_from(format.channels).map_err(|_| {
            PlaybackError::InvalidFormat(format!("{} channels is not supported", format.channels))
        })?;
        let config = StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(format.device_sample_rate()?),
            buffer_size: Self::buffer_size_for(&device, format),
        };
        debug!(
            "Audio config: sample_rate={}, channels={}, hardware_buffer={} bytes, buffer_size={:?}",
            config.sample_rate.0, config.channels, format.hardware_buffer_byte_size, config.buffer_size
        );

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                queue.pull(bytemuck::cast_slice_mut(data), &renderer);
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )?;
        stream.play()?;
        Ok(stream)
    }
}

/// Ask for callbacks of exactly one hardware buffer when the device supports
/// that size, otherwise leave the choice to the host.
fn callback_buffer_size(format: &StreamFormat, supported: &SupportedBufferSize) -> BufferSize {
    let Ok(frames) = u32::try_from(format.frames_per_buffer()) else {
        return BufferSize::Default;
    };
    match supported {
        SupportedBufferSize::Range { min, max } if frames > 0 && (*min..=*max).contains(&frames) => {
            BufferSize::Fixed(frames)
        }
        _ => BufferSize::Default,
    }
}

impl OutputBackend for CpalBackend {
    type Stream = CpalStream;

    fn open(
        &mut self,
        format: &StreamFormat,
        queue: HardwareQueue,
        renderer: Renderer,
    ) -> PlaybackResult<Self::Stream> {
        let (ready_tx, ready_rx) = channel::bounded::<PlaybackResult<()>>(1);
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let preferred = self.preferred_device.clone();
        let format = *format;

        // CPAL streams are not `Send` on every host, so the stream is built,
        // played and dropped on one thread.
        let thread = std::thread::Builder::new()
            .name("pcm-output".to_string())
            .spawn(move || {
                let stream = match Self::build_stream(preferred.as_deref(), &format, queue, renderer) {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let _ = stop_rx.recv();
                if let Err(err) = stream.pause() {
                    warn!("Failed to pause stream: {}", err);
                }
                drop(stream);
            })
            .map_err(|err| PlaybackError::backend("cpal", format!("Failed to spawn output thread: {}", err)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(CpalStream {
                stop_tx: Some(stop_tx),
                thread: Some(thread),
            }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(_) => {
                let _ = thread.join();
                Err(PlaybackError::backend("cpal", "Output thread exited during startup"))
            }
        }
    }
}

/// A running CPAL stream owned by its output thread.
pub struct CpalStream {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalStream {
    fn shutdown(&mut self) -> PlaybackResult<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| PlaybackError::backend("cpal", "Output thread panicked")),
            None => Ok(()),
        }
    }
}

impl OutputStream for CpalStream {
    fn close(mut self) -> PlaybackResult<()> {
        self.shutdown()
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("{}", err);
        }
    }
}
