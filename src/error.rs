// One error type for the whole app.
// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Creating a window failed
    #[error("Window init error: {0}")]
    WindowInit(String),
    /// Updating a window buffer failed
    #[error("Window update error: {0}")]
    WindowUpdate(String),
    /// Opening/starting the camera failed
    #[error("Camera init error: {0}")]
    CameraInit(String),
    /// Grabbing/decoding a frame failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String),
    /// Reading a still image for the frame sequence failed
    #[error("Image load error ({path}): {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Spawning the encoder failed
    #[error("Recorder start error: {0}")]
    RecorderStart(String),
    /// Feeding a frame to the encoder failed
    #[error("Recorder write error: {0}")]
    RecorderWrite(#[from] std::io::Error),
}
