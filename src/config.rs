use std::borrow::Cow;

use crate::error::Error;

/// One level of the feature pyramid: its downsampling step and the anchor
/// sizes (in input pixels) emitted at every cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PyramidLevel {
    pub step: usize,
    pub min_sizes: Vec<usize>,
}

impl PyramidLevel {
    pub fn new(step: usize, min_sizes: impl Into<Vec<usize>>) -> Self {
        Self {
            step,
            min_sizes: min_sizes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriorConfig {
    pub levels: Vec<PyramidLevel>,
    /// Clamp every prior component to `[0, 1]` after generation.
    pub clip: bool,
}

impl PriorConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.levels.is_empty() {
            return Err(Error::InvalidPyramid("no pyramid levels".into()));
        }

        for (k, level) in self.levels.iter().enumerate() {
            if level.step == 0 {
                return Err(Error::InvalidPyramid(format!("level {k}: step is zero")));
            }

            if level.min_sizes.is_empty() {
                return Err(Error::InvalidPyramid(format!("level {k}: no anchor sizes")));
            }

            if level.min_sizes.contains(&0) {
                return Err(Error::InvalidPyramid(format!("level {k}: zero anchor size")));
            }
        }

        Ok(())
    }

    #[inline]
    pub fn anchors_per_cell(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.iter().map(|l| l.min_sizes.len())
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                PyramidLevel::new(8, [16, 32]),
                PyramidLevel::new(16, [64, 128]),
                PyramidLevel::new(32, [256, 512]),
            ],
            clip: false,
        }
    }
}

/// Center/size decoding sensitivities `(var0, var1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variance(f32, f32);

impl Variance {
    pub fn new(center: f32, size: f32) -> Result<Self, Error> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if !ok(center) || !ok(size) {
            return Err(Error::InvalidVariance(center, size));
        }

        Ok(Self(center, size))
    }

    #[inline]
    pub const fn center(&self) -> f32 {
        self.0
    }

    #[inline]
    pub const fn size(&self) -> f32 {
        self.1
    }
}

impl Default for Variance {
    fn default() -> Self {
        Self(0.1, 0.2)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backbone {
    MobileNetV2,
    #[default]
    Resnet50,
}

impl std::fmt::Display for Backbone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Backbone::MobileNetV2 => "mobilenetv2",
                Backbone::Resnet50 => "resnet50",
            }
        )
    }
}

impl std::str::FromStr for Backbone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mnetv2" | "mobilenetv2" | "mobilenet_v2" | "MobileNetV2" => Ok(Self::MobileNetV2),
            "re50" | "resnet50" | "Resnet50" | "ResNet50" => Ok(Self::Resnet50),
            b => Err(Error::UnknownBackbone(b.to_string())),
        }
    }
}

/// Everything about a trained model that post-processing depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: Cow<'static, str>,
    pub backbone: Backbone,
    pub priors: PriorConfig,
    pub variance: Variance,
    /// The network emits an extra `(female, male)` score pair per anchor.
    pub gender: bool,
}

impl ModelConfig {
    pub fn mobilenet_v2() -> Self {
        Self {
            name: Cow::Borrowed("MobileNet_v2"),
            backbone: Backbone::MobileNetV2,
            priors: PriorConfig::default(),
            variance: Variance::default(),
            gender: false,
        }
    }

    pub fn resnet50() -> Self {
        Self {
            name: Cow::Borrowed("Resnet50"),
            backbone: Backbone::Resnet50,
            priors: PriorConfig::default(),
            variance: Variance::default(),
            gender: false,
        }
    }

    pub fn resnet50_gender() -> Self {
        Self {
            gender: true,
            ..Self::resnet50()
        }
    }

    pub fn for_backbone(backbone: Backbone, gender: bool) -> Self {
        let base = match backbone {
            Backbone::MobileNetV2 => Self::mobilenet_v2(),
            Backbone::Resnet50 => Self::resnet50(),
        };

        Self { gender, ..base }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.priors.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    confidence: f32,
    nms_iou: f32,
    display: f32,
}

impl Thresholds {
    pub fn new(confidence: f32, nms_iou: f32, display: f32) -> Result<Self, Error> {
        let thresholds = Self {
            confidence,
            nms_iou,
            display,
        };
        thresholds.validate()?;

        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_unit("confidence_threshold", self.confidence)?;
        check_unit("nms_iou_threshold", self.nms_iou)?;
        check_unit("display_threshold", self.display)
    }

    #[inline]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    #[inline]
    pub const fn nms_iou(&self) -> f32 {
        self.nms_iou
    }

    #[inline]
    pub const fn display(&self) -> f32 {
        self.display
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence: 0.02,
            nms_iou: 0.4,
            display: 0.5,
        }
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

/// How the classification tensor turns into a face probability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreActivation {
    /// The network already emits probabilities.
    #[default]
    Identity,
    /// Softmax across the `(background, face)` pair, sigmoid for a single column.
    Logits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessConfig {
    pub model: ModelConfig,
    pub thresholds: Thresholds,
    pub activation: ScoreActivation,
    /// Keep at most this many candidates going into NMS.
    pub top_k: Option<usize>,
    /// Keep at most this many detections coming out of NMS.
    pub keep_top_k: Option<usize>,
}

impl PostProcessConfig {
    pub fn new(model: ModelConfig, thresholds: Thresholds) -> Self {
        Self {
            model,
            thresholds,
            activation: ScoreActivation::default(),
            top_k: None,
            keep_top_k: None,
        }
    }

    pub fn with_activation(mut self, activation: ScoreActivation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_keep_top_k(mut self, keep_top_k: usize) -> Self {
        self.keep_top_k = Some(keep_top_k);
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.model.validate()?;
        self.thresholds.validate()
    }
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self::new(ModelConfig::resnet50(), Thresholds::default())
    }
}
