//! Cubic polynomials of arc-length.

use serde::{Deserialize, Serialize};

/// A cubic function.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct CubicFn {
    coeffs: [f64; 4],
    offset: f64,
}

/// A sequence of cubic functions, each valid from its start position
/// until the start position of the next one.
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
pub struct PiecewiseCubic {
    pieces: Vec<(f64, CubicFn)>,
}

/// A polynomial record as found in a road description,
/// `a + b*ds + c*ds^2 + d*ds^3` starting at `s_offset`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CubicRecord {
    pub s_offset: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CubicRecord {
    /// Creates a constant record.
    pub const fn constant(s_offset: f64, a: f64) -> Self {
        Self {
            s_offset,
            a,
            b: 0.0,
            c: 0.0,
            d: 0.0,
        }
    }

    /// Converts the record into a function of absolute arc-length,
    /// given the arc-length its offset is relative to.
    pub fn to_fn(&self, base_s: f64) -> CubicFn {
        CubicFn::with_origin(base_s + self.s_offset, self.a, self.b, self.c, self.d)
    }
}

impl CubicFn {
    /// Creates the polynomial `a + b*ds + c*ds^2 + d*ds^3`, where `ds = x - x0`.
    pub const fn with_origin(x0: f64, a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            coeffs: [d, c, b, a],
            offset: -x0,
        }
    }

    /// The x value at which `ds` is zero.
    pub fn origin(&self) -> f64 {
        -self.offset
    }

    pub fn y(&self, x: f64) -> f64 {
        self.y_and_dy(x).0
    }

    pub fn y_and_dy(&self, x: f64) -> (f64, f64) {
        let c = &self.coeffs;
        let x = x + self.offset;

        let y = c[0] * x * x * x + c[1] * x * x + c[2] * x + c[3];
        let dy = c[0] * 3. * x * x + c[1] * 2. * x + c[2];

        (y, dy)
    }
}

impl PiecewiseCubic {
    /// Creates a piecewise function from pieces whose origin is their start position.
    pub fn new(pieces: impl IntoIterator<Item = CubicFn>) -> Self {
        let mut pieces = pieces
            .into_iter()
            .map(|f| (f.origin(), f))
            .collect::<Vec<_>>();
        pieces.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { pieces }
    }

    /// Returns true if the function has no pieces.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Gets the piece which applies at `x`, if any piece starts at or before it.
    pub fn piece_at(&self, x: f64) -> Option<&CubicFn> {
        self.pieces
            .iter()
            .rev()
            .find(|(start, _)| x >= *start)
            .map(|(_, f)| f)
    }

    /// Samples the function, or returns `None` if no piece applies at `x`.
    pub fn get(&self, x: f64) -> Option<f64> {
        self.piece_at(x).map(|f| f.y(x))
    }

    /// Samples the function, defaulting to zero where no piece applies.
    pub fn y(&self, x: f64) -> f64 {
        self.get(x).unwrap_or(0.0)
    }
}
