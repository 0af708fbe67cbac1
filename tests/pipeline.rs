use std::sync::Arc;

use flowly_retinaface::{
    Detector, Error, FaceNet, ModelConfig, PostProcessConfig, PostProcessor, Prior, Priors,
    RawPredictions, ResizePolicy, ScaleFactors, ScoreActivation, Thresholds,
    image::RgbImage,
    ndarray::{Array2, ArrayView4},
    post_process, prior_box,
};

/// Stand-in network: sizes its outputs from the prior grid of the input
/// and lights up a fixed set of anchors.
struct FakeNet {
    config: ModelConfig,
    hits: Vec<(usize, f32)>,
}

impl FaceNet for FakeNet {
    fn name(&self) -> &str {
        "fake"
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn forward(&self, input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error> {
        let shape = input.shape();
        let n = prior_box(&self.config.priors, [shape[2], shape[3]])?.len();

        let mut conf = Array2::<f32>::zeros((n, 2));
        conf.column_mut(0).fill(1.0);
        for &(i, score) in &self.hits {
            conf[[i, 0]] = 1.0 - score;
            conf[[i, 1]] = score;
        }

        let gender = self.config.gender.then(|| {
            let mut g = Array2::<f32>::zeros((n, 2));
            g.column_mut(1).fill(0.75);
            g.column_mut(0).fill(0.25);
            g
        });

        RawPredictions::new(Array2::zeros((n, 4)), conf, Array2::zeros((n, 10)), gender)
    }
}

struct BrokenNet(ModelConfig);

impl FaceNet for BrokenNet {
    fn name(&self) -> &str {
        "broken"
    }

    fn config(&self) -> &ModelConfig {
        &self.0
    }

    fn forward(&self, _input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error> {
        RawPredictions::new(
            Array2::zeros((7, 4)),
            Array2::zeros((7, 2)),
            Array2::zeros((7, 10)),
            None,
        )
    }
}

/// Emits unnormalized `[background, face]` logits. The face anchor's raw
/// face logit (0.4) sits below a 0.5 threshold; its softmax (~0.968) does not.
struct LogitNet {
    config: ModelConfig,
    face: usize,
}

impl FaceNet for LogitNet {
    fn name(&self) -> &str {
        "logits"
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn forward(&self, input: ArrayView4<'_, f32>) -> Result<RawPredictions, Error> {
        let shape = input.shape();
        let n = prior_box(&self.config.priors, [shape[2], shape[3]])?.len();

        let conf = Array2::from_shape_fn((n, 2), |(i, j)| match (i == self.face, j) {
            (true, 0) => -3.0,
            (true, _) => 0.4,
            (false, 0) => 3.0,
            (false, _) => -3.0,
        });

        RawPredictions::new(Array2::zeros((n, 4)), conf, Array2::zeros((n, 10)), None)
    }
}

fn thresholds() -> Thresholds {
    Thresholds::new(0.5, 0.4, 0.5).unwrap()
}

#[test]
fn detector_end_to_end() {
    // anchor 0: 16px prior at the top-left cell; anchor 1: its 32px sibling
    // around the same center; the last anchor: 512px prior at the last cell
    let config = ModelConfig::resnet50_gender();
    let n = prior_box(&config.priors, [256, 256]).unwrap().len();
    let net = FakeNet {
        config,
        hits: vec![(0, 0.95), (1, 0.9), (n - 1, 0.8)],
    };

    // the 16px and 32px boxes share a center: IoU = 33^2 / 65^2 ~ 0.26
    let detector = Detector::new(net, Thresholds::new(0.5, 0.2, 0.5).unwrap())
        .unwrap()
        .with_resize_policy(ResizePolicy::new(256, 256).unwrap());

    // 512x512 image halved to the 256x256 network input
    let dets = detector.detect(&RgbImage::new(512, 512)).unwrap();
    let scores: Vec<f32> = dets.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![0.95, 0.8]);

    // prior 0: center (4, 4), size 16 at 256 px -> (8, 8), size 32 at 512 px
    let first = &dets[0];
    assert!((first.bbox.left() - (-8.0)).abs() < 1e-3);
    assert!((first.bbox.right() - 24.0).abs() < 1e-3);
    assert!((first.landmarks.left_eye().0 - 8.0).abs() < 1e-3);

    let gender = first.gender.unwrap();
    assert_eq!((gender.female, gender.male), (0.25, 0.75));

    // one cached prior set for the one input size
    assert_eq!(detector.post_processor().prior_cache().len(), 1);
    detector.detect(&RgbImage::new(512, 512)).unwrap();
    assert_eq!(detector.post_processor().prior_cache().len(), 1);
}

#[test]
fn detector_propagates_mismatch() {
    let detector = Detector::new(BrokenNet(ModelConfig::mobilenet_v2()), thresholds()).unwrap();
    let res = detector.detect(&RgbImage::new(64, 64));
    assert!(matches!(res, Err(Error::LengthMismatch { actual: 7, .. })));
}

#[test]
fn detector_shared_across_threads() {
    let net = FakeNet {
        config: ModelConfig::resnet50(),
        hits: vec![(3, 0.9)],
    };
    let detector = Detector::new(net, thresholds())
        .unwrap()
        .with_resize_policy(ResizePolicy::original());

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = [(64, 64), (96, 64), (64, 64), (128, 32)]
            .into_iter()
            .map(|(w, h)| {
                let detector = &detector;
                s.spawn(move || detector.detect(&RgbImage::new(w, h)).unwrap().len())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, vec![1, 1, 1, 1]);
    assert_eq!(detector.post_processor().prior_cache().len(), 3);
}

/// Ten hand-placed priors in a 100x100 input: three pass the confidence
/// threshold and two of those overlap with IoU 0.6.
#[test]
fn ten_anchor_scenario() {
    let size = 100.0;
    let p = |x1: f32, y1: f32, x2: f32, y2: f32| {
        // priors whose zero-offset decode is exactly [x1, y1, x2, y2] in
        // inclusive pixels: width (x2 - x1) spans x2 - x1 + 1 pixels
        Prior::new(
            (x1 + x2) / 2.0 / size,
            (y1 + y2) / 2.0 / size,
            (x2 - x1) / size,
            (y2 - y1) / size,
        )
    };

    // a: 40x40 px; b: shifted right by 10 px -> inter 30x40, union 50x40, IoU 0.6
    let mut priors = vec![
        p(0.0, 0.0, 39.0, 39.0),
        p(10.0, 0.0, 49.0, 39.0),
        p(60.0, 60.0, 89.0, 89.0),
    ];
    priors.extend((0..7).map(|i| p(i as f32 * 10.0, 50.0, i as f32 * 10.0 + 9.0, 59.0)));
    let priors = Priors::from_vec([100, 100], priors);

    let conf: Vec<f32> = [0.8, 0.9, 0.7, 0.1, 0.2, 0.3, 0.4, 0.45, 0.05, 0.5]
        .iter()
        .flat_map(|&s| [1.0 - s, s])
        .collect();
    let raw = RawPredictions::from_flat(vec![0.0; 40], conf, vec![0.0; 100], None).unwrap();

    let config = PostProcessConfig::new(ModelConfig::resnet50(), thresholds());
    let dets = post_process(&priors, &raw, &ScaleFactors::identity(100, 100), &config).unwrap();

    assert_eq!(dets.len(), 2);
    assert_eq!(dets[0].score, 0.9);
    assert_eq!(dets[1].score, 0.7);
    assert!((dets[0].bbox.left() - 10.0).abs() < 1e-3);
}

#[test]
fn display_threshold_is_independent() {
    let config = ModelConfig::resnet50();
    let n = prior_box(&config.priors, [64, 64]).unwrap().len();
    let mut conf = Array2::<f32>::zeros((n, 2));
    conf[[0, 1]] = 0.3;
    conf[[n - 1, 1]] = 0.9;
    let raw =
        RawPredictions::new(Array2::zeros((n, 4)), conf, Array2::zeros((n, 10)), None).unwrap();
    let scale = ScaleFactors::identity(64, 64);

    let low = PostProcessor::new(PostProcessConfig::new(
        config.clone(),
        Thresholds::new(0.2, 0.4, 0.2).unwrap(),
    ))
    .unwrap();
    assert_eq!(low.process(&raw, &scale).unwrap().len(), 2);

    let strict = PostProcessor::new(PostProcessConfig::new(
        config,
        Thresholds::new(0.2, 0.4, 0.5).unwrap(),
    ))
    .unwrap();
    assert_eq!(strict.process(&raw, &scale).unwrap().len(), 1);
}

#[test]
fn detector_with_logit_activation() {
    let net = Arc::new(LogitNet {
        config: ModelConfig::resnet50(),
        face: 5,
    });
    let img = RgbImage::new(64, 64);

    let plain = Detector::new(net.clone(), thresholds())
        .unwrap()
        .with_resize_policy(ResizePolicy::original());
    assert!(plain.detect(&img).unwrap().is_empty());

    let detector = Detector::new(net, thresholds())
        .unwrap()
        .with_resize_policy(ResizePolicy::original())
        .with_activation(ScoreActivation::Logits)
        .unwrap();
    assert_eq!(
        detector.post_processor().config().activation,
        ScoreActivation::Logits
    );

    let dets = detector.detect(&img).unwrap();
    assert_eq!(dets.len(), 1);
    let expected = 1.0 / (1.0 + (-3.4f32).exp());
    assert!((dets[0].score - expected).abs() < 1e-5);
}

#[test]
fn detector_rejects_zero_target_size() {
    let net = FakeNet {
        config: ModelConfig::mobilenet_v2(),
        hits: vec![(0, 0.9)],
    };
    let policy = ResizePolicy {
        target_size: 0,
        ..ResizePolicy::default()
    };
    let detector = Detector::new(net, thresholds())
        .unwrap()
        .with_resize_policy(policy);

    let res = detector.detect(&RgbImage::new(640, 480));
    assert!(matches!(res, Err(Error::InvalidResizePolicy { .. })));
}
