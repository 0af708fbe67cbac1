//! Decodes raw RetinaFace outputs dumped from another runtime.
//!
//! Tensors are read as little-endian `f32` files (numpy `tofile()`), one
//! file per output: `loc` (N x 4), `conf` (N x 2), `landm` (N x 10) and the
//! optional `gender` (N x 2).

use std::path::{Path, PathBuf};

use clap::Parser;
use flowly_retinaface::{
    Backbone, Detection, ModelConfig, PostProcessConfig, PostProcessor, RawPredictions,
    ResizePolicy, ScaleFactors, ScoreActivation, Thresholds,
};

#[derive(Debug, clap::Parser)]
struct Args {
    #[clap(short = 'b', default_value = "resnet50")]
    backbone: Backbone,

    #[clap(long)]
    gender: bool,

    /// Original image; the network input size is derived from it and the resize policy.
    #[clap(long)]
    image: Option<PathBuf>,

    /// Network input width, when no image is given.
    #[clap(long, default_value = "512")]
    width: usize,

    /// Network input height, when no image is given.
    #[clap(long, default_value = "512")]
    height: usize,

    #[clap(long, default_value = "512")]
    target_size: u32,

    #[clap(long, default_value = "512")]
    max_size: u32,

    #[clap(short = 'c', default_value = "0.02")]
    confidence: f32,

    #[clap(short = 'n', default_value = "0.4")]
    nms: f32,

    #[clap(short = 'v', default_value = "0.5")]
    display: f32,

    /// The conf tensor holds logits rather than probabilities.
    #[clap(long)]
    logits: bool,

    #[clap(long)]
    loc: PathBuf,

    #[clap(long)]
    conf: PathBuf,

    #[clap(long)]
    landm: PathBuf,

    #[clap(long = "gender-scores")]
    gender_scores: Option<PathBuf>,
}

fn read_f32(path: &Path) -> anyhow::Result<Vec<f32>> {
    let bytes = std::fs::read(path)?;
    anyhow::ensure!(
        bytes.len() % 4 == 0,
        "{}: {} bytes is not a whole number of f32",
        path.display(),
        bytes.len()
    );

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn scale_factors(args: &Args) -> anyhow::Result<ScaleFactors> {
    let Some(path) = &args.image else {
        return Ok(ScaleFactors::identity(args.width, args.height));
    };

    let (w, h) = image::image_dimensions(path)?;
    let policy = ResizePolicy::new(args.target_size, args.max_size)?;
    let resize = policy.ratio(w, h);

    Ok(ScaleFactors::new(
        (w as f32 * resize).round() as usize,
        (h as f32 * resize).round() as usize,
        resize,
    )?)
}

fn gender_label(det: &Detection) -> Option<String> {
    det.gender.map(|g| {
        if g.male > g.female {
            format!("male:{:.4}", g.male)
        } else {
            format!("female:{:.4}", g.female)
        }
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    log::info!("decode config:\n {:#?}", args);

    let model = ModelConfig::for_backbone(args.backbone, args.gender);
    let thresholds = Thresholds::new(args.confidence, args.nms, args.display)?;
    let activation = if args.logits {
        ScoreActivation::Logits
    } else {
        ScoreActivation::Identity
    };
    let processor =
        PostProcessor::new(PostProcessConfig::new(model, thresholds).with_activation(activation))?;

    let raw = RawPredictions::from_flat(
        read_f32(&args.loc)?,
        read_f32(&args.conf)?,
        read_f32(&args.landm)?,
        args.gender_scores.as_deref().map(read_f32).transpose()?,
    )?;

    let scale = scale_factors(&args)?;
    let detections = processor.process(&raw, &scale)?;

    for (i, det) in detections.iter().enumerate() {
        let [x1, y1, x2, y2] = det.bbox.corners();
        print!("face_{} score={:.4} box=[{x1:.1}, {y1:.1}, {x2:.1}, {y2:.1}]", i + 1, det.score);
        for (x, y) in det.landmarks.iter() {
            print!(" ({x:.1}, {y:.1})");
        }
        match gender_label(det) {
            Some(label) => println!(" {label}"),
            None => println!(),
        }
    }

    println!("{} faces", detections.len());

    Ok(())
}
