// Frame sources: the default camera, or a sequence of still images on disk.
// Visual expectation: the capture loop calls `next_frame()` once per iteration
// and stops cleanly when it returns `None`.

use std::path::PathBuf;

use crate::error::Error;
use crate::types::Frame;

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::RgbImage;
use tracing::{debug, info, warn};

/// Anything that yields frames one at a time.
pub trait FrameSource {
    /// Next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, Error>;

    /// Give the device back. Called once when the loop ends.
    fn release(&mut self) {}
}

// A small wrapper around nokhwa::Camera so the capture loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` at a target resolution (falls back if not exact).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // Ask for RGB frames, as close as possible to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        info!(
            index,
            width = actual.width(),
            height = actual.height(),
            "camera stream open"
        );

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
        })
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        // Blocks until a new frame is ready. A dead stream is the end of the feed.
        let raw = match self.cam.frame() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("camera stream ended: {e}");
                return Ok(None);
            }
        };

        let decoded = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;
        let (w, h) = decoded.dimensions();
        let Some(rgb) = RgbImage::from_raw(w, h, decoded.into_raw()) else {
            return Err(Error::CameraFrame(format!("short RGB buffer for {w}x{h}")));
        };

        let frame = Frame::Color(rgb);
        if frame.is_empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }

    fn release(&mut self) {
        match self.cam.stop_stream() {
            Ok(()) => debug!("camera stream stopped"),
            Err(e) => warn!("stopping camera stream: {e}"),
        }
    }
}

/// Plays still images from disk as if they were camera frames, in order.
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequence {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        info!(count = paths.len(), "reading frames from image files");
        Self {
            paths: paths.into_iter(),
        }
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let img = image::open(&path).map_err(|source| Error::ImageLoad {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded frame");
        let frame = Frame::from_image(img);
        Ok((!frame.is_empty()).then_some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_png(name: &str, img: &RgbImage) -> PathBuf {
        let path = std::env::temp_dir().join(format!("webcam-filters-{}-{name}", std::process::id()));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn image_sequence_plays_files_then_ends() {
        let a = temp_png("a.png", &RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3])));
        let b = temp_png("b.png", &RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9])));
        let mut source = ImageSequence::new(vec![a.clone(), b.clone()]);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.dimensions(), (4, 3));
        assert_eq!(&first.samples()[..3], &[1, 2, 3]);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.dimensions(), (2, 2));
        assert!(source.next_frame().unwrap().is_none());

        let _ = std::fs::remove_file(a);
        let _ = std::fs::remove_file(b);
    }

    #[test]
    fn missing_image_is_an_error() {
        let mut source = ImageSequence::new(vec![PathBuf::from("/definitely/not/here.png")]);
        assert!(matches!(source.next_frame(), Err(Error::ImageLoad { .. })));
    }
}
