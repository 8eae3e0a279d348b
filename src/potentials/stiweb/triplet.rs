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

//! Three-body term.
//!
//! ```text
//! v3(j, i, k) = lambda_ijk f(r_ij) f(r_ik) (cos theta_jik + 1/3)^2
//! ```
//!
//! summed once over every unordered pair of neighbors `j < k` of each center atom `i`.

use super::cutoff::CutoffTerm;
use super::params::ParamView;
use crate::structure::{Atom, Neighbor, Stress};
use swfit_array_types::V3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TripletOutput {
    pub value: f64,
    /// Gradients of the energy with respect to the positions of `j` and `k`.
    /// (the gradient with respect to the center is minus their sum)
    pub grads: Option<(V3, V3)>,
}

/// Evaluate a single triplet, given the cutoff terms of both legs.
#[inline]
pub fn triplet_term(
    lambda: f64,
    cos: f64,
    (neigh_j, cut_j): (&Neighbor, CutoffTerm),
    (neigh_k, cut_k): (&Neighbor, CutoffTerm),
    want_grad: bool,
) -> TripletOutput {
    let tmp = cos + 1.0 / 3.0;
    let value = lambda * cut_j.f * cut_k.f * tmp * tmp;
    if !want_grad {
        return TripletOutput { value, grads: None };
    }

    let g1 = lambda * cut_j.f * cut_k.f * 2.0 * tmp;
    let g2 = lambda * tmp * tmp;
    let t2 = g1 * neigh_j.inv_r * neigh_k.inv_r;

    let t1_j = g2 * cut_j.df * cut_k.f - g1 * cos * neigh_j.inv_r * neigh_j.inv_r;
    let force_j = neigh_j.rdist * t1_j + neigh_k.rdist * t2;

    let t1_k = g2 * cut_k.df * cut_j.f - g1 * cos * neigh_k.inv_r * neigh_k.inv_r;
    let force_k = neigh_k.rdist * t1_k + neigh_j.rdist * t2;

    TripletOutput { value, grads: Some((force_j, force_k)) }
}

/// Per-configuration accumulators for the triplet term.
pub(crate) struct TripletSink<'a> {
    pub energy: &'a mut f64,
    /// Forces on every atom of the configuration.  `None` if forces are not being computed.
    pub forces: Option<&'a mut [V3]>,
    pub stress: Option<&'a mut Stress>,
}

/// Add every triplet centered on atom `i`.  `cutoffs` holds the cutoff terms of its neighbors.
pub(crate) fn accumulate_triplets(
    view: &ParamView<'_>,
    i: usize,
    atom: &Atom,
    cutoffs: &[CutoffTerm],
    sink: &mut TripletSink<'_>,
) {
    let want_grad = sink.forces.is_some();
    let neighbors = &atom.neighbors;
    debug_assert_eq!(neighbors.len(), cutoffs.len());

    for jj in 0..neighbors.len().saturating_sub(1) {
        let neigh_j = &neighbors[jj];
        if !(neigh_j.r < view.a2(neigh_j.col)) {
            continue;
        }

        for kk in jj + 1..neighbors.len() {
            let neigh_k = &neighbors[kk];
            if !(neigh_k.r < view.a2(neigh_k.col)) {
                continue;
            }

            let lambda = view.lambda(atom.ty, neigh_j.target_type, neigh_k.target_type);
            if lambda == 0.0 {
                continue;
            }

            let cos = atom.angular[atom.angular_index(jj, kk)].cos;
            let out = triplet_term(
                lambda, cos,
                (neigh_j, cutoffs[jj]),
                (neigh_k, cutoffs[kk]),
                want_grad,
            );
            *sink.energy += out.value;

            if let (Some(forces), Some((force_j, force_k))) = (sink.forces.as_mut(), out.grads) {
                forces[i] += force_j + force_k;
                forces[neigh_j.target] -= force_j;
                forces[neigh_k.target] -= force_k;

                if let Some(stress) = sink.stress.as_mut() {
                    add_triplet_stress(stress, (&neigh_j.rdist, &force_j), (&neigh_k.rdist, &force_k));
                }
            }
        }
    }
}

fn add_triplet_stress(stress: &mut Stress, (dj, fj): (&V3, &V3), (dk, fk): (&V3, &V3)) {
    let sym = |a: usize, b: usize| {
        0.5 * (fj[a] * dj[b] + fk[a] * dk[b] + fj[b] * dj[a] + fk[b] * dk[a])
    };
    // same virial sign as the pair term; fj and fk are energy gradients
    stress[0] -= fj[0] * dj[0] + fk[0] * dk[0];
    stress[1] -= fj[1] * dj[1] + fk[1] * dk[1];
    stress[2] -= fj[2] * dj[2] + fk[2] * dk[2];
    stress[3] -= sym(0, 1);
    stress[4] -= sym(1, 2);
    stress[5] -= sym(2, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stiweb::params::{ParamLayout, ParamSet, PairParams};
    use crate::util::random_v3;

    fn neighbors(center: V3, others: &[(usize, V3)]) -> Vec<Neighbor> {
        others.iter().map(|&(target, pos)| {
            Neighbor::from_displacement(target, 0, 0, pos - center)
        }).collect()
    }

    #[test]
    fn zero_beyond_three_body_cutoff() {
        let set = ParamSet::uniform(1, PairParams::silicon(), PairParams::SILICON_LAMBDA);
        let params = set.to_flat();
        let mut layout = ParamLayout::new(set.shape());
        let view = layout.sync(&params);
        let a2 = view.a2(0);

        let inside = V3([2.3, 0.0, 0.0]);
        let cases = [
            ("k on the cutoff", [inside, V3([0.0, a2, 0.0])]),
            ("j on the cutoff", [V3([0.0, a2, 0.0]), inside]),
            ("j beyond the cutoff", [V3([0.0, 1.1 * a2, 0.0]), inside]),
            ("k beyond the cutoff", [inside, V3([0.0, 0.0, 1.1 * a2])]),
        ];
        for &(case, [pos_j, pos_k]) in &cases {
            let atom = Atom::new(0, neighbors(V3::zero(), &[(1, pos_j), (2, pos_k)]), V3::zero());
            let cutoffs: Vec<_> = atom.neighbors.iter()
                .map(|n| CutoffTerm::compute(n.r, view.gamma(0), a2))
                .collect();

            let mut energy = 0.0;
            let mut forces = vec![V3::zero(); 3];
            let mut stress = [0.0; 6];
            accumulate_triplets(&view, 0, &atom, &cutoffs, &mut TripletSink {
                energy: &mut energy,
                forces: Some(&mut forces),
                stress: Some(&mut stress),
            });
            assert_eq!(energy, 0.0, "{}", case);
            assert_eq!(forces, vec![V3::zero(); 3], "{}", case);
            assert_eq!(stress, [0.0; 6], "{}", case);
        }
    }

    #[test]
    fn zero_lambda_is_skipped() {
        let set = ParamSet::uniform(2, PairParams::silicon(), 0.0);
        let params = set.to_flat();
        let mut layout = ParamLayout::new(set.shape());
        let view = layout.sync(&params);

        let atom = Atom::new(0, neighbors(V3::zero(), &[
            (1, V3([2.3, 0.0, 0.0])),
            (2, V3([0.3, 2.1, 0.0])),
            (3, V3([0.1, 0.4, -2.2])),
        ]), V3::zero());
        let cutoffs: Vec<_> = atom.neighbors.iter()
            .map(|n| CutoffTerm::compute(n.r, view.gamma(0), view.a2(0)))
            .collect();

        let mut energy = 0.0;
        let mut forces = vec![V3::zero(); 4];
        let mut stress = [0.0; 6];
        accumulate_triplets(&view, 0, &atom, &cutoffs, &mut TripletSink {
            energy: &mut energy,
            forces: Some(&mut forces),
            stress: Some(&mut stress),
        });
        assert_eq!(energy, 0.0);
        assert_eq!(forces, vec![V3::zero(); 4]);
        assert_eq!(stress, [0.0; 6]);
    }

    #[test]
    fn newtons_third_law() {
        let set = ParamSet::uniform(1, PairParams::silicon(), PairParams::SILICON_LAMBDA);
        let params = set.to_flat();
        let mut layout = ParamLayout::new(set.shape());
        let view = layout.sync(&params);

        for _ in 0..20 {
            let j = V3([2.2, 0.0, 0.0]) + random_v3(-0.3, 0.3);
            let k = V3([-1.0, 2.0, 0.0]) + random_v3(-0.3, 0.3);
            let atom = Atom::new(0, neighbors(V3::zero(), &[(1, j), (2, k)]), V3::zero());
            let cutoffs: Vec<_> = atom.neighbors.iter()
                .map(|n| CutoffTerm::compute(n.r, view.gamma(0), view.a2(0)))
                .collect();

            let mut energy = 0.0;
            let mut forces = vec![V3::zero(); 3];
            accumulate_triplets(&view, 0, &atom, &cutoffs, &mut TripletSink {
                energy: &mut energy,
                forces: Some(&mut forces),
                stress: None,
            });

            assert!(energy > 0.0);
            let total: V3 = forces.iter().cloned().sum();
            let scale = forces.iter().map(|f| f.norm()).fold(0.0, f64::max);
            assert_close!(abs=1e-12 * scale, total.0, [0.0; 3]);
        }
    }
}
