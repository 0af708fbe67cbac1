use ndarray::ArrayView4;

use crate::{config::ModelConfig, error::Error, predictions::RawPredictions};

/// The face-detection network, treated as an opaque function from a
/// preprocessed `[1, 3, H, W]` tensor to per-anchor outputs.
///
/// Implementations wrap whatever runtime actually executes the model. The
/// returned tensors must follow the prior order of [`FaceNet::config`] for
/// the given input size.
pub trait FaceNet: Send + Sync {
    fn name(&self) -> &str;
    fn config(&self) -> &ModelConfig;

    fn forward(&self, input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error>;
}

impl<N: FaceNet + ?Sized> FaceNet for Box<N> {
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn config(&self) -> &ModelConfig {
        (**self).config()
    }

    #[inline]
    fn forward(&self, input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error> {
        (**self).forward(input)
    }
}

impl<N: FaceNet + ?Sized> FaceNet for std::sync::Arc<N> {
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    fn config(&self) -> &ModelConfig {
        (**self).config()
    }

    #[inline]
    fn forward(&self, input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error> {
        (**self).forward(input)
    }
}
