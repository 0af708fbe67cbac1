use image::{
    RgbImage,
    imageops::{self, FilterType},
};
use ndarray::Array4;

use crate::error::Error;

/// Per-channel mean and std in BGR order.
const MEAN: [f32; 3] = [104.0, 117.0, 123.0];
const STD: [f32; 3] = [57.0, 57.0, 58.0];

/// Picks the resize ratio applied before inference.
///
/// The shorter side is scaled to `target_size` unless that pushes the
/// longer side past `max_size`, in which case the longer side is scaled
/// to `max_size` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizePolicy {
    pub target_size: u32,
    pub max_size: u32,
    /// Feed the image at its original size.
    pub keep_original: bool,
}

impl ResizePolicy {
    pub fn new(target_size: u32, max_size: u32) -> Result<Self, Error> {
        let policy = Self {
            target_size,
            max_size,
            keep_original: false,
        };
        policy.validate()?;

        Ok(policy)
    }

    pub const fn original() -> Self {
        Self {
            target_size: 0,
            max_size: 0,
            keep_original: true,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.keep_original || (self.target_size > 0 && self.max_size > 0) {
            Ok(())
        } else {
            Err(Error::InvalidResizePolicy {
                target_size: self.target_size,
                max_size: self.max_size,
            })
        }
    }

    pub fn ratio(&self, width: u32, height: u32) -> f32 {
        if self.keep_original || width == 0 || height == 0 {
            return 1.0;
        }

        let size_min = width.min(height) as f32;
        let size_max = width.max(height) as f32;

        let resize = self.target_size as f32 / size_min;
        if (resize * size_max).round() > self.max_size as f32 {
            self.max_size as f32 / size_max
        } else {
            resize
        }
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            target_size: 512,
            max_size: 512,
            keep_original: false,
        }
    }
}

/// Maps normalized network-space coordinates back to original-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    /// Width of the tensor fed to the network.
    pub input_width: usize,
    /// Height of the tensor fed to the network.
    pub input_height: usize,
    /// Ratio applied to the original image to obtain the network input.
    pub resize: f32,
}

impl ScaleFactors {
    pub fn new(input_width: usize, input_height: usize, resize: f32) -> Result<Self, Error> {
        let scale = Self {
            input_width,
            input_height,
            resize,
        };
        scale.validate()?;

        Ok(scale)
    }

    /// The network input already is the original image.
    pub fn identity(width: usize, height: usize) -> Self {
        Self {
            input_width: width,
            input_height: height,
            resize: 1.0,
        }
    }

    /// `resize` must be positive and finite for `pixel_scale` to be defined.
    pub fn validate(&self) -> Result<(), Error> {
        if self.resize.is_finite() && self.resize > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidResize(self.resize))
        }
    }

    /// `[height, width]` of the network input, the key priors are built for.
    #[inline]
    pub fn image_size(&self) -> [usize; 2] {
        [self.input_height, self.input_width]
    }

    /// Multipliers from normalized `(x, y)` to original pixels.
    #[inline]
    pub fn pixel_scale(&self) -> (f32, f32) {
        (
            self.input_width as f32 / self.resize,
            self.input_height as f32 / self.resize,
        )
    }
}

/// Resizes `img` per `policy` and normalizes it into a `[1, 3, H, W]`
/// BGR tensor.
pub fn preprocess(
    img: &RgbImage,
    policy: &ResizePolicy,
) -> Result<(Array4<f32>, ScaleFactors), Error> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::EmptyImage);
    }

    policy.validate()?;
    let resize = policy.ratio(img.width(), img.height());

    let resized;
    let img = if resize != 1.0 {
        let w = ((img.width() as f32 * resize).round() as u32).max(1);
        let h = ((img.height() as f32 * resize).round() as u32).max(1);
        resized = imageops::resize(img, w, h, FilterType::Triangle);
        &resized
    } else {
        img
    };

    let (w, h) = (img.width() as usize, img.height() as usize);
    let blob = Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
        // RGB pixel, BGR channel layout
        let v = img.get_pixel(x as u32, y as u32).0[2 - c] as f32;
        (v - MEAN[c]) / STD[c]
    });

    Ok((blob, ScaleFactors::new(w, h, resize)?))
}
