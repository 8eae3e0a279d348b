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

//! Turning the energy, forces and stress of a configuration into deviations from the
//! reference data, and those deviations into a weighted sum of squares.

use super::cutoff::{fill_cutoffs, CutoffTerm};
use super::pair::{accumulate_pair, PairSink};
use super::params::ParamView;
use super::triplet::{accumulate_triplets, TripletSink};
use crate::output::ConfigSlots;
use crate::structure::Configuration;
use swfit_array_types::V3;

/// Regularization of the relative force weighting, so that atoms with near-zero
/// reference forces do not dominate.
pub const FORCE_EPS: f64 = 0.1;

/// How force deviations are scaled before they are squared.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ForceWeighting {
    /// Use the raw deviation.
    Absolute,
    /// Divide the deviation on each atom by `eps + |F_ref|` for that atom.
    Relative { eps: f64 },
}

impl Default for ForceWeighting {
    fn default() -> Self { ForceWeighting::Absolute }
}

impl ForceWeighting {
    pub fn relative() -> Self { ForceWeighting::Relative { eps: FORCE_EPS } }
}

/// Global weights of the objective terms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Weights {
    /// Weight of the squared per-atom energy deviation.
    pub energy: f64,
    /// Weight of each squared stress component deviation.
    pub stress: f64,
    pub force: ForceWeighting,
}

impl Default for Weights {
    fn default() -> Self {
        Weights { energy: 100.0, stress: 10.0, force: ForceWeighting::Absolute }
    }
}

/// Evaluate one configuration, writing its deviations into `slots`.
///
/// Returns the configuration's contribution to the objective.  `scratch` is a
/// reusable buffer for the three-body cutoff terms.
pub fn evaluate_configuration(
    view: &ParamView<'_>,
    conf: &Configuration,
    slots: ConfigSlots<'_>,
    weights: &Weights,
    scratch: &mut Vec<CutoffTerm>,
) -> f64 {
    let ConfigSlots { forces, energy, mut stress } = slots;
    debug_assert_eq!(forces.len(), conf.num_atoms());

    let uf = conf.use_forces;
    let us = uf && conf.use_stress;

    *energy = 0.0;
    if let Some(stress) = stress.as_mut() {
        **stress = [0.0; 6];
    }
    for (force, atom) in forces.iter_mut().zip(&conf.atoms) {
        *force = match uf {
            true => -atom.reference_force,
            false => V3::zero(),
        };
    }

    for (i, atom) in conf.atoms.iter().enumerate() {
        fill_cutoffs(view, atom, scratch);

        let mut sink = PairSink {
            energy: &mut *energy,
            force: if uf { Some(&mut forces[i]) } else { None },
            stress: if us { stress.as_deref_mut() } else { None },
        };
        for neigh in &atom.neighbors {
            accumulate_pair(view, i, neigh, &mut sink);
        }

        let mut sink = TripletSink {
            energy: &mut *energy,
            forces: if uf { Some(&mut *forces) } else { None },
            stress: if us { stress.as_deref_mut() } else { None },
        };
        accumulate_triplets(view, i, atom, scratch, &mut sink);
    }

    let mut sum = 0.0;
    if uf {
        for (force, atom) in forces.iter_mut().zip(&conf.atoms) {
            if let ForceWeighting::Relative { eps } = weights.force {
                *force = *force / (eps + atom.abs_force);
            }
            if atom.contrib {
                sum += conf.weight * force.sqnorm();
            }
        }
    }

    *energy /= conf.num_atoms() as f64;
    *energy -= conf.reference_energy;
    sum += conf.weight * weights.energy * *energy * *energy;

    if us {
        if let Some(stress) = stress {
            for (s, &s_ref) in stress.iter_mut().zip(&conf.reference_stress) {
                *s /= conf.volume;
                *s -= s_ref;
                sum += conf.weight * weights.stress * *s * *s;
            }
        }
    }
    sum
}
