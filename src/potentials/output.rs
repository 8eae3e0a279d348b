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

//! Layout of the force vector that evaluation writes its deviations into.
//!
//! ```text
//! [dF_x dF_y dF_z] x natoms      force deviations            (offset 0)
//! [dE]             x nconf       energy deviations           (energy_p)
//! [dS_xx .. dS_zx] x nconf       stress deviations, if any   (stress_p)
//! [aux]            x n_aux       per-parameter penalties     (punish_p)
//! ```
//!
//! Reference values are laid out identically.

use crate::structure::{Configuration, Stress};
use swfit_array_types::{V3, Envee};
use slice_of_array::prelude::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ForceLayout {
    pub natoms: usize,
    pub nconf: usize,
    /// Whether there is a stress block.
    pub stress: bool,
    /// Number of auxiliary slots.  (one per parameter when penalties are reported)
    pub n_aux: usize,
}

impl ForceLayout {
    pub fn for_configurations(confs: &[Configuration], stress: bool, n_aux: usize) -> Self {
        ForceLayout {
            natoms: confs.iter().map(|c| c.num_atoms()).sum(),
            nconf: confs.len(),
            stress, n_aux,
        }
    }

    pub fn energy_p(&self) -> usize { 3 * self.natoms }

    pub fn stress_p(&self) -> usize { self.energy_p() + self.nconf }

    fn stress_len(&self) -> usize { if self.stress { 6 * self.nconf } else { 0 } }

    pub fn punish_p(&self) -> usize { self.stress_p() + self.stress_len() }

    pub fn len(&self) -> usize { self.punish_p() + self.n_aux }

    /// Build the vector of reference values for a set of configurations.
    ///
    /// Auxiliary slots are zero.
    pub fn reference_vector(&self, confs: &[Configuration]) -> Vec<f64> {
        assert_eq!(self.nconf, confs.len());

        let mut out = vec![0.0; self.len()];
        let mut atom = 0;
        for (h, conf) in confs.iter().enumerate() {
            for a in &conf.atoms {
                out[3 * atom..3 * atom + 3].copy_from_slice(&a.reference_force[..]);
                atom += 1;
            }
            out[self.energy_p() + h] = conf.reference_energy;
            if self.stress {
                let start = self.stress_p() + 6 * h;
                out[start..start + 6].copy_from_slice(&conf.reference_stress);
            }
        }
        assert_eq!(atom, self.natoms);
        out
    }

    /// Split the force vector into the slots belonging to a contiguous run of configurations.
    ///
    /// `first_conf` and `first_atom` locate the run within the full vector.  The returned
    /// slots are disjoint and can be handed out to separate threads.
    pub fn config_slots<'a>(
        &self,
        forces: &'a mut [f64],
        confs: &[Configuration],
        first_conf: usize,
        first_atom: usize,
    ) -> Vec<ConfigSlots<'a>> {
        assert_eq!(forces.len(), self.len(), "force vector has wrong length");
        let local_atoms: usize = confs.iter().map(|c| c.num_atoms()).sum();
        let (energy_p, stress_p, punish_p) = (self.energy_p(), self.stress_p(), self.punish_p());

        let (atom_part, rest) = forces.split_at_mut(energy_p);
        let (energy_part, rest) = rest.split_at_mut(stress_p - energy_p);
        let (stress_part, _) = rest.split_at_mut(punish_p - stress_p);

        let atom_part = &mut atom_part[3 * first_atom..3 * (first_atom + local_atoms)];
        let energy_part = &mut energy_part[first_conf..first_conf + confs.len()];
        let mut stress_iter = match self.stress {
            true => {
                let part = &mut stress_part[6 * first_conf..6 * (first_conf + confs.len())];
                Some(part.nest_mut::<[f64; 6]>().iter_mut())
            },
            false => None,
        };

        let mut atoms_rest: &'a mut [V3] = atom_part.nest_mut::<[f64; 3]>().envee_mut();
        let mut out = Vec::with_capacity(confs.len());
        for (conf, energy) in confs.iter().zip(energy_part) {
            let (these, next) = std::mem::take(&mut atoms_rest).split_at_mut(conf.num_atoms());
            atoms_rest = next;
            let stress = stress_iter.as_mut().and_then(|iter| iter.next());
            out.push(ConfigSlots { forces: these, energy, stress });
        }
        out
    }
}

/// The regions of the force vector owned by a single configuration.
#[derive(Debug)]
pub struct ConfigSlots<'a> {
    pub forces: &'a mut [V3],
    pub energy: &'a mut f64,
    pub stress: Option<&'a mut Stress>,
}
