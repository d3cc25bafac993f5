//! Triangular Lattice Transform
//!
//! Maps a destination pixel to the source position it mirrors. The plane is
//! expressed in a 60-degree skewed basis (w, z) where every lattice cell is a
//! unit rhombus made of two equilateral triangles. Each cell is folded into the
//! canonical triangle (0,0), (1,0), (0,1) by one of three reflections, chosen
//! so that neighbouring triangles are always mirror images of each other.
//!
//! All per-pixel math is integer fixed point (see `fixed`).

use super::fixed::{self, FIX_ONE, FIX_SHIFT};
use anyhow::{ensure, Result};
use std::f64::consts::PI;

/// Convert the host's angle track (tenths of a degree) to radians.
/// The sign flip makes positive values rotate counter-clockwise on screen.
#[inline]
pub fn angle_from_tenths(tenths: i32) -> f64 {
    -f64::from(tenths) * PI / 1800.0
}

/// Lattice placement for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    origin_x: i32,
    origin_y: i32,
    unit: i32,
    angle: f64,
}

impl LatticeParameters {
    /// `unit` is the triangle edge length in pixels and must be positive.
    pub fn new(origin_x: i32, origin_y: i32, unit: i32, angle: f64) -> Result<Self> {
        ensure!(unit > 0, "lattice unit must be positive, got {}", unit);
        ensure!(angle.is_finite(), "lattice angle must be finite");
        Ok(Self {
            origin_x,
            origin_y,
            unit,
            angle,
        })
    }

    /// Build from host track values: center, size, angle in tenths of a degree
    pub fn from_tracks(x: i32, y: i32, size: i32, angle_tenths: i32) -> Result<Self> {
        Self::new(x, y, size, angle_from_tenths(angle_tenths))
    }

    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    #[inline]
    pub fn unit(&self) -> i32 {
        self.unit
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// Forward (x/y -> w/z) and inverse (w/z -> x/y) basis coefficients,
/// fixed point scaled by `FIX_ONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasisCoefficients {
    pub xw: i64,
    pub yw: i64,
    pub xz: i64,
    pub yz: i64,
    pub wx: i64,
    pub zx: i64,
    pub wy: i64,
    pub zy: i64,
}

impl BasisCoefficients {
    pub fn from_angle(angle: f64) -> Self {
        let (sin_th, cos_th) = angle.sin_cos();
        let root3 = 3.0_f64.sqrt();

        Self {
            xw: fixed::from_f64(cos_th + sin_th / root3),
            yw: fixed::from_f64(sin_th - cos_th / root3),
            xz: fixed::from_f64(-2.0 * sin_th / root3),
            yz: fixed::from_f64(2.0 * cos_th / root3),
            wx: fixed::from_f64(cos_th),
            zx: fixed::from_f64((cos_th - root3 * sin_th) / 2.0),
            wy: fixed::from_f64(sin_th),
            zy: fixed::from_f64((sin_th + root3 * cos_th) / 2.0),
        }
    }
}

/// The three 120-degree symmetric ways to fold a cell into the canonical triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    A,
    B,
    C,
}

/// Indexed by [cell_z mod 3][cell_w mod 3]. Each row is the previous one
/// rotated right, so mirror orientation alternates along both axes.
const FOLD_TABLE: [[Fold; 3]; 3] = [
    [Fold::A, Fold::B, Fold::C],
    [Fold::C, Fold::A, Fold::B],
    [Fold::B, Fold::C, Fold::A],
];

impl Fold {
    /// Fold rule for the lattice cell with the given integer indices
    #[inline]
    pub fn for_cell(cell_w: i64, cell_z: i64) -> Self {
        FOLD_TABLE[fixed::mod3(cell_z)][fixed::mod3(cell_w)]
    }

    /// Fold a position inside a cell (0 <= w, z <= 1, fixed point) into the
    /// canonical triangle.
    #[inline]
    pub fn apply(self, w: i32, z: i32) -> (i32, i32) {
        let lower = w + z <= FIX_ONE;
        match (self, lower) {
            (Fold::A, true) => (w, z),
            (Fold::A, false) => (FIX_ONE - z, FIX_ONE - w),
            (Fold::B, true) => (FIX_ONE - w - z, w),
            (Fold::B, false) => (w + z - FIX_ONE, FIX_ONE - z),
            (Fold::C, true) => (z, FIX_ONE - w - z),
            (Fold::C, false) => (FIX_ONE - w, z + w - FIX_ONE),
        }
    }
}

/// Fold an arbitrary triangular coordinate (fixed point) into the canonical
/// triangle.
#[inline]
pub fn fold(w: i64, z: i64) -> (i32, i32) {
    let (cell_w, frac_w) = fixed::floor_split(w);
    let (cell_z, frac_z) = fixed::floor_split(z);
    Fold::for_cell(cell_w, cell_z).apply(frac_w, frac_z)
}

/// Lattice with its derived coefficients. Rebuild it when the parameters
/// change; it is never updated in place.
#[derive(Debug, Clone)]
pub struct TriangularLattice {
    params: LatticeParameters,
    coeffs: BasisCoefficients,
}

impl TriangularLattice {
    pub fn new(params: LatticeParameters) -> Self {
        Self {
            params,
            coeffs: BasisCoefficients::from_angle(params.angle),
        }
    }

    #[inline]
    pub fn params(&self) -> &LatticeParameters {
        &self.params
    }

    #[inline]
    pub fn coefficients(&self) -> &BasisCoefficients {
        &self.coeffs
    }

    /// Pixel -> triangular basis, fixed point, one lattice unit = `FIX_ONE`
    #[inline]
    pub fn to_triangular(&self, x: i32, y: i32) -> (i64, i64) {
        let c = &self.coeffs;
        let unit = i64::from(self.params.unit);
        let dx = i64::from(x) - i64::from(self.params.origin_x);
        let dy = i64::from(y) - i64::from(self.params.origin_y);

        let w = fixed::div_round(c.xw * dx + c.yw * dy, unit);
        let z = fixed::div_round(c.xz * dx + c.yz * dy, unit);
        (w, z)
    }

    /// Canonical triangle position -> pixel plane, fixed point
    #[inline]
    pub fn from_triangular(&self, w: i32, z: i32) -> (i64, i64) {
        let c = &self.coeffs;
        let unit = i64::from(self.params.unit);
        // fixed-point pixels, can exceed 32 bits for large units
        let w = i64::from(w) * unit;
        let z = i64::from(z) * unit;

        let x = fixed::round_shift(c.wx * w + c.zx * z)
            + (i64::from(self.params.origin_x) << FIX_SHIFT);
        let y = fixed::round_shift(c.wy * w + c.zy * z)
            + (i64::from(self.params.origin_y) << FIX_SHIFT);
        (x, y)
    }

    /// Source position (fixed point pixels) sampled for destination pixel (x, y)
    #[inline]
    pub fn map(&self, x: i32, y: i32) -> (i64, i64) {
        let (w, z) = self.to_triangular(x, y);
        let (w, z) = fold(w, z);
        self.from_triangular(w, z)
    }
}
