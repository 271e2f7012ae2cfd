use thiserror::Error;

/// Library error type for frame sequence operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A frame index outside the fixed sequence length.
    #[error("frame index {index} out of range for a sequence of {len} frames")]
    OutOfRange { index: usize, len: usize },

    /// A frame that already left `Pending` was resolved a second time.
    #[error("frame {id} already resolved as {state}")]
    AlreadyResolved { id: usize, state: &'static str },

    /// The frame naming pattern cannot produce distinct locators.
    #[error("frame pattern {0:?} must contain the {{index}} placeholder")]
    BadPattern(String),

    /// Image decode/encode error.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}
