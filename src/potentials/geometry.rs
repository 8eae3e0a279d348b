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

//! Brute-force construction of full neighbor lists.
//!
//! This checks every pair of atoms against every periodic image within range,
//! so it is only suitable for the small cells typically used as fitting data.

use crate::FailResult;
use crate::stiweb::params::pair_col;
use crate::structure::{Atom, Configuration, Neighbor};
use swfit_array_types::V3;

/// Atomic positions, with an optional periodic lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    /// Lattice vectors as rows.  `None` for an isolated cluster.
    pub lattice: Option<[V3; 3]>,
    /// Cartesian positions.
    pub positions: Vec<V3>,
    pub types: Vec<usize>,
    pub ntypes: usize,
}

fn cross(a: &V3, b: &V3) -> V3 {
    V3([
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ])
}

impl Structure {
    pub fn volume(&self) -> Option<f64> {
        self.lattice.as_ref().map(|[a, b, c]| V3::dot(a, &cross(b, c)).abs())
    }

    pub fn num_atoms(&self) -> usize { self.positions.len() }

    /// Ranges of image indices along each lattice vector that can contain
    /// anything within `cutoff` of a point in the cell.
    fn image_ranges(&self, cutoff: f64) -> FailResult<[i32; 3]> {
        let lattice = match &self.lattice {
            Some(lattice) => lattice,
            None => return Ok([0; 3]),
        };
        let volume = self.volume().unwrap_or(0.0);
        ensure!(volume > 0.0, "lattice is degenerate (volume {})", volume);

        let mut out = [0; 3];
        for axis in 0..3 {
            let (b, c) = (&lattice[(axis + 1) % 3], &lattice[(axis + 2) % 3]);
            // distance between neighboring lattice planes spanned by b and c
            let spacing = volume / cross(b, c).norm();
            out[axis] = (cutoff / spacing).ceil() as i32;
        }
        Ok(out)
    }
}

/// Build a configuration with full neighbor lists for `cutoff`.
///
/// The result has no reference data.  (zero reference energy, forces and stress, unit weight)
/// Stress is only marked as usable for periodic structures.
///
/// In cells smaller than twice the cutoff, an atom will find periodic images of itself.
pub fn build_configuration(structure: &Structure, cutoff: f64) -> FailResult<Configuration> {
    let Structure { ref positions, ref types, ntypes, .. } = *structure;
    ensure!(
        positions.len() == types.len(),
        "{} positions but {} types", positions.len(), types.len(),
    );
    ensure!(cutoff > 0.0 && cutoff.is_finite(), "invalid cutoff: {}", cutoff);
    if let Some(&bad) = types.iter().find(|&&ty| ty >= ntypes) {
        bail!("atom type {} out of range for {} types", bad, ntypes);
    }

    let [na, nb, nc] = structure.image_ranges(cutoff)?;
    let mut images = vec![];
    for ia in -na..=na {
        for ib in -nb..=nb {
            for ic in -nc..=nc {
                let shift = match &structure.lattice {
                    Some([a, b, c]) => *a * ia as f64 + *b * ib as f64 + *c * ic as f64,
                    None => V3::zero(),
                };
                images.push(((ia, ib, ic) == (0, 0, 0), shift));
            }
        }
    }

    let mut atoms = Vec::with_capacity(positions.len());
    for (i, (&pos_i, &type_i)) in positions.iter().zip(types).enumerate() {
        let mut neighbors = vec![];
        for (j, (&pos_j, &type_j)) in positions.iter().zip(types).enumerate() {
            for &(is_origin, shift) in &images {
                if i == j && is_origin {
                    continue;
                }
                let rdist = pos_j + shift - pos_i;
                if rdist.sqnorm() < cutoff * cutoff {
                    let col = pair_col(ntypes, type_i, type_j);
                    neighbors.push(Neighbor::from_displacement(j, type_j, col, rdist));
                }
            }
        }
        atoms.push(Atom::new(type_i, neighbors, V3::zero()));
    }

    let volume = structure.volume();
    let conf = Configuration {
        atoms,
        weight: 1.0,
        use_forces: true,
        use_stress: volume.is_some(),
        volume: volume.unwrap_or(1.0),
        reference_energy: 0.0,
        reference_stress: [0.0; 6],
    };
    trace!(
        "Built configuration with {} atoms, {} neighbor relations",
        conf.num_atoms(), conf.num_neighbors(),
    );
    Ok(conf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_are_symmetric() {
        let structure = Structure {
            lattice: None,
            positions: vec![V3([0.0; 3]), V3([2.0, 0.0, 0.0]), V3([0.0, 2.5, 0.0]), V3([9.0, 0.0, 0.0])],
            types: vec![0, 1, 0, 1],
            ntypes: 2,
        };
        let conf = build_configuration(&structure, 3.0).unwrap();
        let targets = |i: usize| conf.atoms[i].neighbors.iter().map(|n| n.target).collect::<Vec<_>>();
        assert_eq!(targets(0), vec![1, 2]);
        assert_eq!(targets(1), vec![0]);
        assert_eq!(targets(2), vec![0]);
        assert_eq!(targets(3), Vec::<usize>::new());
        assert_eq!(conf.atoms[0].neighbors[0].col, pair_col(2, 0, 1));
        assert_eq!(conf.atoms[0].neighbors[1].col, pair_col(2, 0, 0));
        assert!(!conf.use_stress);
    }

    #[test]
    fn small_cell_sees_itself() {
        let structure = Structure {
            lattice: Some([V3([2.0, 0.0, 0.0]), V3([0.0, 10.0, 0.0]), V3([0.0, 0.0, 10.0])]),
            positions: vec![V3([0.0; 3])],
            types: vec![0],
            ntypes: 1,
        };
        let conf = build_configuration(&structure, 3.0).unwrap();
        let neighbors = &conf.atoms[0].neighbors;
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.iter().all(|n| n.target == 0 && n.r == 2.0));
        assert_eq!(conf.volume, 200.0);
        assert!(conf.use_stress);
    }

    #[test]
    fn rejects_bad_input() {
        let mut structure = Structure {
            lattice: None,
            positions: vec![V3([0.0; 3])],
            types: vec![1],
            ntypes: 1,
        };
        assert!(build_configuration(&structure, 3.0).is_err());
        structure.types = vec![0];
        assert!(build_configuration(&structure, -1.0).is_err());
        structure.lattice = Some([V3([1.0, 0.0, 0.0]), V3([2.0, 0.0, 0.0]), V3([0.0, 0.0, 1.0])]);
        assert!(build_configuration(&structure, 3.0).is_err());
    }
}
