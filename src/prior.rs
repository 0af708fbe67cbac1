//! Reference anchors ("priors") over the feature pyramid.
//!
//! Priors are emitted level by level, then in row-major order over the
//! cells of each level, then over the anchor sizes of the level. Raw
//! network outputs are aligned with this order index for index.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use itertools::Itertools;
use ndarray::Array2;

use crate::{config::PriorConfig, error::Error};

/// Anchor in center-size form, normalized to the input resolution.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Prior {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Prior {
    pub const fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    #[inline]
    fn clipped(self) -> Self {
        Self {
            center_x: self.center_x.clamp(0.0, 1.0),
            center_y: self.center_y.clamp(0.0, 1.0),
            width: self.width.clamp(0.0, 1.0),
            height: self.height.clamp(0.0, 1.0),
        }
    }
}

/// Ordered prior set for one `(height, width)` input resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Priors {
    image_size: [usize; 2],
    priors: Vec<Prior>,
}

impl Priors {
    /// Wraps an externally produced prior list for an input of
    /// `image_size = [height, width]`.
    pub fn from_vec(image_size: [usize; 2], priors: Vec<Prior>) -> Self {
        Self { image_size, priors }
    }

    #[inline]
    pub fn image_size(&self) -> [usize; 2] {
        self.image_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Prior> {
        self.priors.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Prior> {
        self.priors.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Prior] {
        &self.priors
    }

    /// `N x 4` matrix of `[cx, cy, w, h]` rows.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.priors.len(), 4), |(i, j)| {
            let p = &self.priors[i];
            match j {
                0 => p.center_x,
                1 => p.center_y,
                2 => p.width,
                _ => p.height,
            }
        })
    }
}

impl std::ops::Index<usize> for Priors {
    type Output = Prior;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.priors[index]
    }
}

impl<'a> IntoIterator for &'a Priors {
    type Item = &'a Prior;
    type IntoIter = std::slice::Iter<'a, Prior>;

    fn into_iter(self) -> Self::IntoIter {
        self.priors.iter()
    }
}

/// Number of priors `config` yields for an input of `image_size = [height, width]`.
pub fn prior_count(config: &PriorConfig, image_size: [usize; 2]) -> usize {
    config
        .levels
        .iter()
        .map(|level| {
            let [rows, cols] = feature_map(image_size, level.step);
            rows * cols * level.min_sizes.len()
        })
        .sum()
}

#[inline]
fn feature_map(image_size: [usize; 2], step: usize) -> [usize; 2] {
    [image_size[0].div_ceil(step), image_size[1].div_ceil(step)]
}

/// Generates the prior set for an input of `image_size = [height, width]`.
pub fn prior_box(config: &PriorConfig, image_size: [usize; 2]) -> Result<Priors, Error> {
    config.validate()?;

    let [height, width] = image_size;
    if height == 0 || width == 0 {
        return Err(Error::InvalidResolution { height, width });
    }

    let (image_h, image_w) = (height as f32, width as f32);
    let mut priors = Vec::with_capacity(prior_count(config, image_size));

    for level in &config.levels {
        let [rows, cols] = feature_map(image_size, level.step);
        let step = level.step as f32;

        for (i, j) in Itertools::cartesian_product(0..rows, 0..cols) {
            for &min_size in &level.min_sizes {
                priors.push(Prior {
                    center_x: (j as f32 + 0.5) * step / image_w,
                    center_y: (i as f32 + 0.5) * step / image_h,
                    width: min_size as f32 / image_w,
                    height: min_size as f32 / image_h,
                });
            }
        }
    }

    if config.clip {
        priors.iter_mut().for_each(|p| *p = p.clipped());
    }

    Ok(Priors { image_size, priors })
}

/// Per-resolution memo of [`prior_box`] for one [`PriorConfig`].
#[derive(Debug)]
pub struct PriorCache {
    config: PriorConfig,
    entries: Mutex<HashMap<[usize; 2], Arc<Priors>>>,
}

impl PriorCache {
    pub fn new(config: PriorConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &PriorConfig {
        &self.config
    }

    pub fn get(&self, image_size: [usize; 2]) -> Result<Arc<Priors>, Error> {
        if let Some(priors) = self.lock().get(&image_size) {
            log::trace!("prior cache hit for {}x{}", image_size[0], image_size[1]);
            return Ok(priors.clone());
        }

        // generated outside the lock; a racing thread produces the same set
        let priors = Arc::new(prior_box(&self.config, image_size)?);
        log::info!(
            "generated {} priors for {}x{} input",
            priors.len(),
            image_size[0],
            image_size[1]
        );

        Ok(self
            .lock()
            .entry(image_size)
            .or_insert(priors)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[usize; 2], Arc<Priors>>> {
        // the map is never left half-updated, so a poisoned lock is still usable
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
