#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("{tensor}: expected {expected} rows (one per prior), got {actual}")]
    LengthMismatch {
        tensor: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{tensor}: expected {expected} columns, got {actual}")]
    TensorWidth {
        tensor: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{tensor}: buffer of {len} floats is not a multiple of {width}")]
    RaggedBuffer {
        tensor: &'static str,
        len: usize,
        width: usize,
    },

    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("variance components must be positive and finite, got ({0}, {1})")]
    InvalidVariance(f32, f32),

    #[error("invalid pyramid configuration: {0}")]
    InvalidPyramid(String),

    #[error("invalid input resolution {height}x{width}")]
    InvalidResolution { height: usize, width: usize },

    #[error("resize policy needs non-zero sizes, got target {target_size} and max {max_size}")]
    InvalidResizePolicy { target_size: u32, max_size: u32 },

    #[error("resize ratio must be positive and finite, got {0}")]
    InvalidResize(f32),

    #[error("gender output enabled for model {0} but the network did not produce it")]
    MissingGender(String),

    #[error("image is empty")]
    EmptyImage,

    #[error("unknown backbone: {0}")]
    UnknownBackbone(String),

    #[error("network error: {0}")]
    NetworkError(String),
}
