/* ************************************************************************ **
** This file is part of swfit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of swfit is provided under this permissive         **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! The smooth three-body cutoff, shared by every triplet that a neighbor takes part in.

use crate::structure::Atom;
use super::params::ParamView;

/// Cutoff value `f` and `df = (df/dr) / r` for a single neighbor relation.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CutoffTerm {
    pub f: f64,
    pub df: f64,
}

impl CutoffTerm {
    pub const ZERO: CutoffTerm = CutoffTerm { f: 0.0, df: 0.0 };

    /// `exp(gamma / (r - a2))`, which falls smoothly to zero at `r = a2`.
    ///
    /// Within `0.01 * gamma` of the cutoff the exponential underflows in a way that
    /// makes `df` blow up, so the term is taken to be exactly zero there.
    #[inline]
    pub fn compute(r: f64, gamma: f64, a2: f64) -> CutoffTerm {
        if r >= a2 {
            return CutoffTerm::ZERO;
        }
        let t = r - a2;
        if t < -0.01 * gamma {
            let f = f64::exp(gamma / t);
            let df = -f * gamma / (t * t * r);
            CutoffTerm { f, df }
        } else {
            CutoffTerm::ZERO
        }
    }
}

/// Compute the cutoff term of every neighbor of `atom`, in neighbor order.
///
/// `out` is cleared first; its allocation is reused across atoms and cycles.
pub(crate) fn fill_cutoffs(view: &ParamView<'_>, atom: &Atom, out: &mut Vec<CutoffTerm>) {
    out.clear();
    out.extend(atom.neighbors.iter().map(|neigh| {
        CutoffTerm::compute(neigh.r, view.gamma(neigh.col), view.a2(neigh.col))
    }));
}
