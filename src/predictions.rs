use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{config::ScoreActivation, detection::GenderScore, error::Error, prior::Priors};

pub const LOC_WIDTH: usize = 4;
pub const CONF_WIDTH: usize = 2;
pub const LANDM_WIDTH: usize = 10;
pub const GENDER_WIDTH: usize = 2;

/// Per-anchor network outputs, one row per prior.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPredictions {
    loc: Array2<f32>,
    conf: Array2<f32>,
    landm: Array2<f32>,
    gender: Option<Array2<f32>>,
}

impl RawPredictions {
    /// Wraps the output tensors, checking their widths and that every
    /// tensor has the same number of rows.
    pub fn new(
        loc: Array2<f32>,
        conf: Array2<f32>,
        landm: Array2<f32>,
        gender: Option<Array2<f32>>,
    ) -> Result<Self, Error> {
        check_width("loc", loc.view(), &[LOC_WIDTH])?;
        check_width("conf", conf.view(), &[CONF_WIDTH, 1])?;
        check_width("landm", landm.view(), &[LANDM_WIDTH])?;
        if let Some(gender) = &gender {
            check_width("gender", gender.view(), &[GENDER_WIDTH])?;
        }

        let n = loc.nrows();
        check_rows("conf", conf.nrows(), n)?;
        check_rows("landm", landm.nrows(), n)?;
        if let Some(gender) = &gender {
            check_rows("gender", gender.nrows(), n)?;
        }

        Ok(Self {
            loc,
            conf,
            landm,
            gender,
        })
    }

    /// Builds from flat row-major buffers, as copied out of an inference
    /// runtime. `conf` may hold two columns or one.
    pub fn from_flat(
        loc: Vec<f32>,
        conf: Vec<f32>,
        landm: Vec<f32>,
        gender: Option<Vec<f32>>,
    ) -> Result<Self, Error> {
        let n = rows("loc", loc.len(), LOC_WIDTH)?;
        let conf_width = if conf.len() == n { 1 } else { CONF_WIDTH };

        Self::new(
            Array2::from_shape_vec((n, LOC_WIDTH), loc)?,
            Array2::from_shape_vec((rows("conf", conf.len(), conf_width)?, conf_width), conf)?,
            Array2::from_shape_vec((rows("landm", landm.len(), LANDM_WIDTH)?, LANDM_WIDTH), landm)?,
            gender
                .map(|g| {
                    let m = rows("gender", g.len(), GENDER_WIDTH)?;
                    Array2::from_shape_vec((m, GENDER_WIDTH), g).map_err(Error::from)
                })
                .transpose()?,
        )
    }

    /// Anchor count.
    #[inline]
    pub fn len(&self) -> usize {
        self.loc.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn loc(&self) -> ArrayView2<'_, f32> {
        self.loc.view()
    }

    #[inline]
    pub fn conf(&self) -> ArrayView2<'_, f32> {
        self.conf.view()
    }

    #[inline]
    pub fn landm(&self) -> ArrayView2<'_, f32> {
        self.landm.view()
    }

    #[inline]
    pub fn gender(&self) -> Option<ArrayView2<'_, f32>> {
        self.gender.as_ref().map(|g| g.view())
    }

    #[inline]
    pub fn gender_at(&self, index: usize) -> Option<GenderScore> {
        self.gender.as_ref().map(|g| GenderScore {
            female: g[[index, 0]],
            male: g[[index, 1]],
        })
    }

    /// Checks index-for-index correspondence with `priors`.
    pub fn check_against(&self, priors: &Priors) -> Result<(), Error> {
        let n = priors.len();
        check_rows("loc", self.loc.nrows(), n)?;
        check_rows("conf", self.conf.nrows(), n)?;
        check_rows("landm", self.landm.nrows(), n)?;
        if let Some(gender) = &self.gender {
            check_rows("gender", gender.nrows(), n)?;
        }

        Ok(())
    }

    /// Face probability per anchor.
    pub fn face_scores(&self, activation: ScoreActivation) -> Array1<f32> {
        match (self.conf.ncols(), activation) {
            (1, ScoreActivation::Identity) => self.conf.column(0).to_owned(),
            (1, ScoreActivation::Logits) => self.conf.column(0).mapv(|x| 1.0 / (1.0 + (-x).exp())),
            (_, ScoreActivation::Identity) => self.conf.column(1).to_owned(),
            (_, ScoreActivation::Logits) => self.conf.map_axis(Axis(1), |row| {
                // shifted by the row max to keep exp() finite
                let m = row[0].max(row[1]);
                let bg = (row[0] - m).exp();
                let face = (row[1] - m).exp();
                face / (bg + face)
            }),
        }
    }
}

fn check_width(
    tensor: &'static str,
    view: ArrayView2<'_, f32>,
    allowed: &[usize],
) -> Result<(), Error> {
    if allowed.contains(&view.ncols()) {
        Ok(())
    } else {
        Err(Error::TensorWidth {
            tensor,
            expected: allowed[0],
            actual: view.ncols(),
        })
    }
}

fn check_rows(tensor: &'static str, actual: usize, expected: usize) -> Result<(), Error> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            tensor,
            expected,
            actual,
        })
    }
}

fn rows(tensor: &'static str, len: usize, width: usize) -> Result<usize, Error> {
    if len % width == 0 {
        Ok(len / width)
    } else {
        Err(Error::RaggedBuffer { tensor, len, width })
    }
}
