use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera permission was denied")]
    PermissionDenied,
    #[error("no camera is available")]
    NoDevice,
    #[error("the camera is in use by another application")]
    DeviceBusy,
    #[error("camera access requires a secure (https) context")]
    InsecureContext,
    #[error("this platform has no camera API")]
    CameraUnavailable,
    /// A single profile could not be satisfied.  Never returned once every
    /// profile has been tried.
    #[error("camera cannot satisfy profile '{0}'")]
    Overconstrained(String),
    #[error("camera backend error: {0}")]
    Backend(String),
}

impl CaptureError {
    /// Higher is more informative to the user.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            CaptureError::InsecureContext | CaptureError::CameraUnavailable => 6,
            CaptureError::PermissionDenied => 5,
            CaptureError::DeviceBusy => 4,
            CaptureError::NoDevice => 3,
            CaptureError::Backend(_) => 2,
            CaptureError::Overconstrained(_) => 1,
        }
    }

    /// Retrying with looser constraints cannot change these.
    pub(crate) fn ends_fallback(&self) -> bool {
        self.rank() >= CaptureError::PermissionDenied.rank()
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => {
                "Camera access was denied. Allow camera access and try again."
            }
            CaptureError::NoDevice | CaptureError::Overconstrained(_) => {
                "No camera was found on this device."
            }
            CaptureError::DeviceBusy => "The camera is being used by another application.",
            CaptureError::InsecureContext => "The camera can only be used over a secure connection.",
            CaptureError::CameraUnavailable => "Camera access is not supported here.",
            CaptureError::Backend(_) => "The camera could not be started.",
        }
    }
}
