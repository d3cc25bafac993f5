//! Kaleidoscope filter core
//!
//! Folds the image plane into one equilateral triangle and resamples the
//! source through that fold. Everything per-pixel is integer fixed point.

pub mod fixed;
mod frame;
mod lattice;
mod outline;
mod resample;

#[allow(unused_imports)]
pub use frame::{DoubleBuffer, YcFrame, YcPixel};
#[allow(unused_imports)]
pub use lattice::{angle_from_tenths, BasisCoefficients, Fold, LatticeParameters, TriangularLattice};
#[allow(unused_imports)]
pub use outline::{draw_line, draw_triangle_outline, triangle_vertices};
#[allow(unused_imports)]
pub use resample::{render_frame, sample_bilinear, SampleWeights};

use tracing::debug;

/// What a call to `Kaleidoscope::process` left in the edit buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutput {
    /// The mirrored frame (edit and temp were swapped)
    Mirrored,
    /// The source with the base triangle drawn over it
    Outlined,
}

/// Per-frame entry point. Keeps the lattice of the last frame and rebuilds it
/// whenever the parameters change.
#[derive(Debug, Default)]
pub struct Kaleidoscope {
    lattice: Option<TriangularLattice>,
}

impl Kaleidoscope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lattice for `params`, rebuilt from scratch if they differ from last frame
    pub fn lattice_for(&mut self, params: LatticeParameters) -> &TriangularLattice {
        let stale = self
            .lattice
            .as_ref()
            .map_or(true, |lattice| *lattice.params() != params);
        if stale {
            debug!(
                origin = ?params.origin(),
                unit = params.unit(),
                angle = params.angle(),
                "rebuilding lattice"
            );
            self.lattice = None;
        }
        self.lattice.get_or_insert_with(|| TriangularLattice::new(params))
    }

    /// Run the filter on one frame.
    ///
    /// With `show_triangle` the edit frame is annotated in place. Otherwise
    /// the mirrored image is rendered into the temp frame and the two swap
    /// roles, so the result is always read from `frames.edit()`.
    pub fn process(
        &mut self,
        frames: &mut DoubleBuffer,
        params: LatticeParameters,
        show_triangle: bool,
    ) -> FrameOutput {
        if show_triangle {
            draw_triangle_outline(frames.edit_mut(), &params);
            return FrameOutput::Outlined;
        }

        let lattice = self.lattice_for(params);
        let (edit, temp) = frames.split_mut();
        render_frame(edit, temp, lattice);
        frames.swap();
        FrameOutput::Mirrored
    }
}
