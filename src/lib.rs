//! RetinaFace post-processing: prior generation, offset decoding, score
//! filtering and greedy NMS over raw per-anchor network outputs.
//!
//! The network itself sits behind [`FaceNet`]; callers who run it on their
//! own can feed its tensors straight into [`PostProcessor`].

pub mod bbox;
pub mod config;
pub mod decode;
pub mod detection;
pub mod detector;
mod error;
pub mod filter;
pub mod net;
pub mod nms;
pub mod postprocess;
pub mod predictions;
pub mod preprocess;
pub mod prior;

pub use bbox::BoundingBox;
pub use config::{
    Backbone, ModelConfig, PostProcessConfig, PriorConfig, PyramidLevel, ScoreActivation,
    Thresholds, Variance,
};
pub use detection::{Detection, GenderScore, Landmarks};
pub use detector::Detector;
pub use error::Error;
pub use net::FaceNet;
pub use postprocess::{PostProcessor, post_process};
pub use predictions::RawPredictions;
pub use preprocess::{ResizePolicy, ScaleFactors, preprocess};
pub use prior::{Prior, PriorCache, Priors, prior_box};

pub use image;
pub use ndarray;
