use ndarray::ArrayView1;

use crate::{bbox::BoundingBox, config::Variance, detection::Landmarks, prior::Prior};

/// Decodes a `(dx, dy, dw, dh)` regression against its prior into a
/// corner box, still normalized to the input resolution.
#[inline]
pub fn decode_box(loc: [f32; 4], prior: &Prior, variance: Variance) -> BoundingBox {
    let [dx, dy, dw, dh] = loc;

    let cx = prior.center_x + dx * variance.center() * prior.width;
    let cy = prior.center_y + dy * variance.center() * prior.height;
    let w = prior.width * (dw * variance.size()).exp();
    let h = prior.height * (dh * variance.size()).exp();

    BoundingBox::from_center(cx, cy, w, h)
}

/// Decodes five `(dx, dy)` landmark offsets against their prior. Only the
/// center term applies; landmarks have no extent.
#[inline]
pub fn decode_landmarks(landm: [f32; 10], prior: &Prior, variance: Variance) -> Landmarks {
    let mut points = [(0.0f32, 0.0f32); 5];

    for (point, offset) in points.iter_mut().zip(landm.chunks_exact(2)) {
        *point = (
            prior.center_x + offset[0] * variance.center() * prior.width,
            prior.center_y + offset[1] * variance.center() * prior.height,
        );
    }

    Landmarks(points)
}

#[inline]
pub(crate) fn loc_row(row: ArrayView1<'_, f32>) -> [f32; 4] {
    [row[0], row[1], row[2], row[3]]
}

#[inline]
pub(crate) fn landm_row(row: ArrayView1<'_, f32>) -> [f32; 10] {
    std::array::from_fn(|i| row[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn zero_offset_reproduces_prior() {
        let priors = [
            Prior::new(0.5, 0.5, 0.1, 0.2),
            Prior::new(0.0125, 0.9875, 0.025, 0.025),
            Prior::new(0.75, 0.25, 0.8, 0.8),
        ];

        for prior in &priors {
            let b = decode_box([0.0; 4], prior, Variance::default());
            assert!(approx(b.left(), prior.center_x - prior.width / 2.0));
            assert!(approx(b.top(), prior.center_y - prior.height / 2.0));
            assert!(approx(b.right(), prior.center_x + prior.width / 2.0));
            assert!(approx(b.bottom(), prior.center_y + prior.height / 2.0));
        }
    }

    #[test]
    fn center_and_size_terms() {
        let prior = Prior::new(0.5, 0.5, 0.2, 0.1);
        let variance = Variance::new(0.1, 0.2).unwrap();

        // dx = 1 moves the center by var0 * pw; dw = ln(2) / var1 doubles the width
        let dw = std::f32::consts::LN_2 / 0.2;
        let b = decode_box([1.0, -2.0, dw, 0.0], &prior, variance);

        let cx = 0.5 + 0.1 * 0.2;
        let cy = 0.5 - 2.0 * 0.1 * 0.1;
        assert!(approx(b.center_left(), cx));
        assert!(approx(b.center_top(), cy));
        assert!(approx(b.right() - b.left(), 0.4));
        assert!(approx(b.bottom() - b.top(), 0.1));
    }

    #[test]
    fn landmarks_use_center_term_only() {
        let prior = Prior::new(0.5, 0.4, 0.2, 0.1);
        let offsets = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, -1.0, -1.0, 5.0, 2.0];
        let lm = decode_landmarks(offsets, &prior, Variance::default());

        assert_eq!(lm.0[0], (0.5, 0.4));
        assert!(approx(lm.0[1].0, 0.52) && approx(lm.0[1].1, 0.4));
        assert!(approx(lm.0[2].0, 0.5) && approx(lm.0[2].1, 0.41));
        assert!(approx(lm.0[3].0, 0.48) && approx(lm.0[3].1, 0.39));
        assert!(approx(lm.0[4].0, 0.6) && approx(lm.0[4].1, 0.42));
    }
}
