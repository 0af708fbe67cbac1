use crate::{
    bbox::BoundingBox,
    config::PostProcessConfig,
    decode::{decode_box, decode_landmarks, landm_row, loc_row},
    detection::{Candidate, Detection, assemble},
    error::Error,
    filter::score_filter,
    nms::nms_boxes,
    predictions::RawPredictions,
    preprocess::ScaleFactors,
    prior::{PriorCache, Priors},
};

/// Turns raw per-anchor outputs into final detections: decode, score
/// filter, NMS, display filter.
#[derive(Debug)]
pub struct PostProcessor {
    config: PostProcessConfig,
    priors: PriorCache,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            priors: PriorCache::new(config.model.priors.clone()),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    #[inline]
    pub fn prior_cache(&self) -> &PriorCache {
        &self.priors
    }

    /// Runs post-processing for a network input of the size recorded in
    /// `scale`. Priors for that size are generated once and reused.
    pub fn process(
        &self,
        raw: &RawPredictions,
        scale: &ScaleFactors,
    ) -> Result<Vec<Detection>, Error> {
        let priors = self.priors.get(scale.image_size())?;

        post_process(&priors, raw, scale, &self.config)
    }
}

/// Post-processing against a caller-supplied prior set.
pub fn post_process(
    priors: &Priors,
    raw: &RawPredictions,
    scale: &ScaleFactors,
    config: &PostProcessConfig,
) -> Result<Vec<Detection>, Error> {
    scale.validate()?;
    raw.check_against(priors)?;

    let model = &config.model;
    if model.gender && raw.gender().is_none() {
        return Err(Error::MissingGender(model.name.to_string()));
    }

    let thresholds = &config.thresholds;
    let scores = raw.face_scores(config.activation).to_vec();
    let order = score_filter(&scores, thresholds.confidence(), config.top_k);
    log::debug!(
        "{} of {} anchors above confidence {}",
        order.len(),
        raw.len(),
        thresholds.confidence()
    );

    let (sx, sy) = scale.pixel_scale();
    let (loc, landm) = (raw.loc(), raw.landm());

    let candidates: Vec<Candidate> = order
        .iter()
        .map(|&index| {
            let prior = &priors[index];

            Candidate {
                bbox: decode_box(loc_row(loc.row(index)), prior, model.variance).scaled(sx, sy),
                score: scores[index],
                landmarks: decode_landmarks(landm_row(landm.row(index)), prior, model.variance)
                    .scaled(sx, sy),
                gender: if model.gender {
                    raw.gender_at(index)
                } else {
                    None
                },
            }
        })
        .collect();

    let boxes: Vec<BoundingBox> = candidates.iter().map(|c| c.bbox).collect();
    let mut keep = nms_boxes(&boxes, thresholds.nms_iou());
    if let Some(k) = config.keep_top_k {
        keep.truncate(k);
    }
    log::debug!("{} candidates left after nms", keep.len());

    let detections = assemble(&candidates, &keep, thresholds.display());
    log::debug!(
        "{} detections at display threshold {}",
        detections.len(),
        thresholds.display()
    );

    Ok(detections)
}
