//! Camera capture module
//!
//! Provides cross-platform camera capture using the nokhwa crate. Frames are
//! read synchronously on the calling thread, one per processing tick.

use image::RgbaImage;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use thiserror::Error;

/// Errors from the capture device
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera: {0}")]
    Open(String),
    #[error("failed to open camera stream: {0}")]
    Stream(String),
    #[error("failed to capture frame: {0}")]
    Read(String),
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// Camera frame data
#[derive(Clone)]
pub struct CameraFrame {
    /// RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame number
    pub frame_number: u64,
}

impl CameraFrame {
    /// Horizontally flipped copy, so the user sees a mirror image
    pub fn mirrored(&self) -> CameraFrame {
        let data = match RgbaImage::from_raw(self.width, self.height, self.data.clone()) {
            Some(mut image) => {
                image::imageops::flip_horizontal_in_place(&mut image);
                image.into_raw()
            }
            // Short buffer: pass it through rather than drop the frame
            None => self.data.clone(),
        };

        CameraFrame {
            data,
            width: self.width,
            height: self.height,
            frame_number: self.frame_number,
        }
    }
}

/// Anything that yields frames one at a time
pub trait FrameSource {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<CameraFrame, CameraError>;
}

/// Information about an available camera
#[derive(Clone, Debug)]
pub struct CameraInfo {
    /// Camera index
    pub index: u32,
    /// Camera name
    pub name: String,
}

/// Camera capture interface
pub struct CameraCapture {
    camera: Camera,
    /// Frames read so far
    frame_count: u64,
    name: String,
}

impl CameraCapture {
    /// List available cameras
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(ApiBackend::Auto) {
            Ok(camera_list) => camera_list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                log::warn!("Failed to enumerate cameras: {:?}", e);
                Vec::new()
            }
        }
    }

    /// Open a camera and start streaming
    ///
    /// # Arguments
    /// * `camera_index` - The camera index to use (0 for default)
    /// * `width` - Requested frame width
    /// * `height` - Requested frame height
    pub fn open(camera_index: u32, width: u32, height: u32) -> Result<Self, CameraError> {
        let index = CameraIndex::Index(camera_index);

        // Closest to the requested size first
        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(
            CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
        ));

        let mut camera = match Camera::new(index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera at {}x{}: {:?}", width, height, e);

                let requested2 = RequestedFormat::new::<RgbAFormat>(
                    RequestedFormatType::AbsoluteHighestResolution,
                );

                match Camera::new(index.clone(), requested2) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::warn!("Failed with AbsoluteHighestResolution: {:?}", e2);

                        // Last resort: whatever the driver offers
                        let requested3 = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                        Camera::new(index, requested3)
                            .map_err(|e3| CameraError::Open(format!("{:?}", e3)))?
                    }
                }
            }
        };

        camera
            .open_stream()
            .map_err(|e| CameraError::Stream(format!("{:?}", e)))?;

        let name = camera.info().human_name().to_string();
        log::info!(
            "Camera opened: {} ({}x{}, requested {}x{})",
            name,
            camera.resolution().width(),
            camera.resolution().height(),
            width,
            height
        );

        Ok(Self {
            camera,
            frame_count: 0,
            name,
        })
    }

    /// Block until the next frame arrives and decode it to RGBA
    pub fn read_frame(&mut self) -> Result<CameraFrame, CameraError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| CameraError::Read(format!("{:?}", e)))?;
        let image = frame
            .decode_image::<RgbAFormat>()
            .map_err(|e| CameraError::Decode(format!("{:?}", e)))?;

        let frame_number = self.frame_count;
        self.frame_count += 1;

        Ok(CameraFrame {
            width: frame.resolution().width(),
            height: frame.resolution().height(),
            data: image.into_raw(),
            frame_number,
        })
    }

    /// Human readable device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the negotiated camera resolution
    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }

}

impl FrameSource for CameraCapture {
    fn read_frame(&mut self) -> Result<CameraFrame, CameraError> {
        CameraCapture::read_frame(self)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {:?}", e);
        }
    }
}
