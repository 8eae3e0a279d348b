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

//! Two-body term.
//!
//! ```text
//! v2(r) = (A r^-p - B r^-q) exp(delta / (r - a1))        for r < a1
//! ```

use super::params::ParamView;
use crate::structure::{Neighbor, Stress};
use swfit_array_types::V3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PairOutput {
    pub value: f64,
    /// `dv2/dr`, present only if it was asked for.
    pub grad: Option<f64>,
}

/// Evaluate `v2` for a single pair distance.  `None` beyond the cutoff.
#[inline]
pub fn pair_term(
    view: &ParamView<'_>,
    col: usize,
    r: f64,
    inv_r: f64,
    want_grad: bool,
) -> Option<PairOutput> {
    let a1 = view.a1(col);
    if !(r < a1) {
        return None;
    }

    let (p, q) = (view.p(col), view.q(col));
    let delta = view.delta(col);
    let phi_r = view.A(col) * r.powf(-p);
    let phi_a = -view.B(col) * r.powf(-q);
    let inv_c = 1.0 / (r - a1);
    let f_cut = f64::exp(delta * inv_c);

    let value = (phi_r + phi_a) * f_cut;
    let grad = match want_grad {
        true => Some(-value * delta * inv_c * inv_c - f_cut * inv_r * (p * phi_r + q * phi_a)),
        false => None,
    };
    Some(PairOutput { value, grad })
}

/// Per-atom accumulators for the pair term.
pub(crate) struct PairSink<'a> {
    pub energy: &'a mut f64,
    /// Force on the source atom.  `None` if forces are not being computed.
    pub force: Option<&'a mut V3>,
    pub stress: Option<&'a mut Stress>,
}

/// Add the contribution of one directed neighbor relation.
///
/// With full neighbor lists, each pair is seen from both ends; only the source atom
/// is updated here.
#[inline]
pub(crate) fn accumulate_pair(
    view: &ParamView<'_>,
    source: usize,
    neigh: &Neighbor,
    sink: &mut PairSink<'_>,
) {
    let want_grad = sink.force.is_some();
    let PairOutput { mut value, mut grad } = match pair_term(view, neigh.col, neigh.r, neigh.inv_r, want_grad) {
        Some(out) => out,
        None => return,
    };

    // an atom in a small cell sees its own images from both directions
    if neigh.target == source {
        value *= 0.5;
        grad = grad.map(|g| 0.5 * g);
    }

    *sink.energy += 0.5 * value;

    if let (Some(force), Some(grad)) = (sink.force.as_mut(), grad) {
        let tmp_force = neigh.dist * grad;
        **force += tmp_force;

        if let Some(stress) = sink.stress.as_mut() {
            let (d, f) = (&neigh.rdist, &tmp_force);
            stress[0] -= 0.5 * d[0] * f[0];
            stress[1] -= 0.5 * d[1] * f[1];
            stress[2] -= 0.5 * d[2] * f[2];
            stress[3] -= 0.5 * d[0] * f[1];
            stress[4] -= 0.5 * d[1] * f[2];
            stress[5] -= 0.5 * d[2] * f[0];
        }
    }
}
