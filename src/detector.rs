use image::{DynamicImage, RgbImage};

use crate::{
    config::{PostProcessConfig, ScoreActivation, Thresholds},
    detection::Detection,
    error::Error,
    net::FaceNet,
    postprocess::PostProcessor,
    preprocess::{ResizePolicy, preprocess},
};

/// Image in, detections out: preprocess, run the network, post-process.
///
/// `detect` takes `&self`, so one detector can serve several threads; the
/// only shared state is the per-resolution prior cache.
pub struct Detector<N> {
    net: N,
    resize: ResizePolicy,
    post: PostProcessor,
}

impl<N: FaceNet> Detector<N> {
    pub fn new(net: N, thresholds: Thresholds) -> Result<Self, Error> {
        let config = PostProcessConfig::new(net.config().clone(), thresholds);

        Self::with_config(net, config)
    }

    pub fn with_config(net: N, config: PostProcessConfig) -> Result<Self, Error> {
        log::info!(
            "[detector] {} ({}, gender: {})",
            net.name(),
            config.model.backbone,
            config.model.gender
        );

        Ok(Self {
            post: PostProcessor::new(config)?,
            resize: ResizePolicy::default(),
            net,
        })
    }

    pub fn with_resize_policy(mut self, resize: ResizePolicy) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_activation(self, activation: ScoreActivation) -> Result<Self, Error> {
        let config = self.post.config().clone();
        Ok(Self {
            post: PostProcessor::new(config.with_activation(activation))?,
            ..self
        })
    }

    #[inline]
    pub fn net(&self) -> &N {
        &self.net
    }

    #[inline]
    pub fn post_processor(&self) -> &PostProcessor {
        &self.post
    }

    pub fn detect(&self, img: &RgbImage) -> Result<Vec<Detection>, Error> {
        let (blob, scale) = preprocess(img, &self.resize)?;
        let raw = self.net.forward(blob.view())?;

        self.post.process(&raw, &scale)
    }

    pub fn detect_dynamic(&self, img: &DynamicImage) -> Result<Vec<Detection>, Error> {
        self.detect(&img.to_rgb8())
    }
}
