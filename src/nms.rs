use ndarray::ArrayView2;
use num::{Num, ToPrimitive};

use crate::bbox::BoundingBox;

/// Greedy non-maximum suppression over boxes already sorted by descending
/// score.
///
/// Each row is `[x1, y1, x2, y2]`. Areas use the inclusive pixel
/// convention `(x2 - x1 + 1) * (y2 - y1 + 1)`. A candidate is dropped when
/// its IoU with a kept box exceeds `iou_threshold`. Returns the kept row
/// indices in input order.
pub fn nms<'a, N, BA>(boxes: BA, iou_threshold: f64) -> Vec<usize>
where
    N: Num + PartialOrd + ToPrimitive + Copy + 'a,
    BA: Into<ArrayView2<'a, N>>,
{
    let boxes = boxes.into();
    let count = boxes.nrows();

    let mut keep: Vec<usize> = Vec::new();
    let mut suppress = vec![false; count];

    for i in 0..count {
        if suppress[i] {
            continue;
        }
        keep.push(i);

        let box1 = boxes.row(i);
        let (b1x, b1y, b1xx, b1yy) = (box1[0], box1[1], box1[2], box1[3]);
        let area1 = area(b1x, b1y, b1xx, b1yy);

        for j in (i + 1)..count {
            if suppress[j] {
                continue;
            }

            let box2 = boxes.row(j);
            let (b2x, b2y, b2xx, b2yy) = (box2[0], box2[1], box2[2], box2[3]);

            let x = max(b1x, b2x);
            let y = max(b1y, b2y);
            let xx = min(b1xx, b2xx);
            let yy = min(b1yy, b2yy);

            let intersection = area(x, y, xx, yy);
            if intersection <= N::zero() {
                // disjoint
                continue;
            }

            let area2 = area(b2x, b2y, b2xx, b2yy);
            let union = area1 + area2 - intersection;
            let iou = match (intersection.to_f64(), union.to_f64()) {
                (Some(i), Some(u)) if u > 0.0 => i / u,
                _ => continue,
            };

            if iou > iou_threshold {
                suppress[j] = true;
            }
        }
    }

    keep
}

/// [`nms`] over a slice of boxes.
pub fn nms_boxes(boxes: &[BoundingBox], iou_threshold: f32) -> Vec<usize> {
    let rows = ndarray::Array2::from_shape_fn((boxes.len(), 4), |(i, j)| boxes[i].corners()[j]);

    nms(&rows, iou_threshold as f64)
}

/// Inclusive area, zero when the extents cross.
#[inline(always)]
fn area<N>(bx: N, by: N, bxx: N, byy: N) -> N
where
    N: Num + PartialOrd + Copy,
{
    let w = max(bxx - bx + N::one(), N::zero());
    let h = max(byy - by + N::one(), N::zero());
    w * h
}

#[inline(always)]
fn min<N>(a: N, b: N) -> N
where
    N: Num + PartialOrd,
{
    if a < b { a } else { b }
}

#[inline(always)]
fn max<N>(a: N, b: N) -> N
where
    N: Num + PartialOrd,
{
    if a > b { a } else { b }
}
