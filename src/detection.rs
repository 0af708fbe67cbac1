use crate::bbox::BoundingBox;

/// Five facial points: right eye, left eye, nose, right mouth corner,
/// left mouth corner.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Landmarks(pub [(f32, f32); 5]);

impl Landmarks {
    #[inline]
    pub fn right_eye(&self) -> (f32, f32) {
        self.0[0]
    }

    #[inline]
    pub fn left_eye(&self) -> (f32, f32) {
        self.0[1]
    }

    #[inline]
    pub fn nose(&self) -> (f32, f32) {
        self.0[2]
    }

    #[inline]
    pub fn mouth_right(&self) -> (f32, f32) {
        self.0[3]
    }

    #[inline]
    pub fn mouth_left(&self) -> (f32, f32) {
        self.0[4]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.0.iter().copied()
    }

    #[inline]
    pub fn scaled(&self, x_scale: f32, y_scale: f32) -> Self {
        Self(self.0.map(|(x, y)| (x * x_scale, y * y_scale)))
    }
}

/// Raw `(female, male)` outputs of the gender head. Turning these into a
/// label is left to the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GenderScore {
    pub female: f32,
    pub male: f32,
}

/// A final face detection in original-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
    pub landmarks: Landmarks,
    pub gender: Option<GenderScore>,
}

/// A decoded candidate that has not yet been through NMS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub bbox: BoundingBox,
    pub score: f32,
    pub landmarks: Landmarks,
    pub gender: Option<GenderScore>,
}

/// Merges NMS survivors into detections, dropping any scoring below
/// `display_threshold`. Order is preserved.
pub(crate) fn assemble(
    candidates: &[Candidate],
    keep: &[usize],
    display_threshold: f32,
) -> Vec<Detection> {
    keep.iter()
        .map(|&i| &candidates[i])
        .filter(|c| c.score >= display_threshold)
        .map(|c| Detection {
            bbox: c.bbox,
            score: c.score,
            landmarks: c.landmarks,
            gender: c.gender,
        })
        .collect()
}
