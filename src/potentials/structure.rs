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

//! Reference configurations, as handed to the evaluation engine by whatever built
//! the neighbor lists.
//!
//! Everything in here is read-only during evaluation.  Per-cycle scratch data
//! (e.g. the three-body cutoff values) lives elsewhere.

use crate::FailResult;
use swfit_array_types::V3;

/// A directed relation from an atom to one of the atoms within interaction range.
///
/// Neighbor lists are *full*: if `j` appears in the list of `i`, then `i` appears in the
/// list of `j`.  In small periodic cells, an atom may appear in its own list (as an image).
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Index of the target atom within its configuration.
    pub target: usize,
    pub target_type: usize,
    /// Pair-type column, selecting the pair parameters for `(source type, target type)`.
    pub col: usize,
    pub r: f64,
    pub inv_r: f64,
    /// Unit vector pointing from the source to the target.
    pub dist: V3,
    /// Displacement from the source to the target.
    pub rdist: V3,
    /// Index into the atom's angular table of the entry for `(this, next neighbor)`.
    pub ijk_start: usize,
}

impl Neighbor {
    /// Build a neighbor relation from its displacement vector.
    ///
    /// `ijk_start` is left at zero; it is filled in by `Atom::new`.
    pub fn from_displacement(target: usize, target_type: usize, col: usize, rdist: V3) -> Self {
        let r = rdist.norm();
        let inv_r = 1.0 / r;
        Neighbor {
            target, target_type, col, r, inv_r, rdist,
            dist: rdist * inv_r,
            ijk_start: 0,
        }
    }
}

/// Cosine of the angle at an atom between two of its neighbors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AngularPart {
    pub cos: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub ty: usize,
    pub neighbors: Vec<Neighbor>,
    /// One entry per unordered pair of neighbors `j < k`, in the order
    /// `(0,1), (0,2), ..., (0,n-1), (1,2), ...`.
    pub angular: Vec<AngularPart>,
    /// Reference force on this atom.
    pub reference_force: V3,
    /// Magnitude of `reference_force`.
    pub abs_force: f64,
    /// Whether this atom's force deviation contributes to the objective.
    pub contrib: bool,
}

impl Atom {
    /// Construct an atom, computing the angular table from the neighbor displacements.
    pub fn new(ty: usize, mut neighbors: Vec<Neighbor>, reference_force: V3) -> Self {
        let angular = assign_angular_table(&mut neighbors);
        Atom {
            ty, neighbors, angular, reference_force,
            abs_force: reference_force.norm(),
            contrib: true,
        }
    }

    /// Construct an atom from a precomputed angular table.
    ///
    /// `neighbors[j].ijk_start` must already index into `angular` as documented there.
    pub fn from_parts(
        ty: usize,
        neighbors: Vec<Neighbor>,
        angular: Vec<AngularPart>,
        reference_force: V3,
    ) -> FailResult<Self> {
        let n = neighbors.len();
        ensure!(
            angular.len() == n * n.saturating_sub(1) / 2,
            "angular table has {} entries for {} neighbors", angular.len(), n,
        );
        let mut expected_start = 0;
        for (j, neigh) in neighbors.iter().enumerate() {
            ensure!(
                neigh.ijk_start == expected_start,
                "neighbor {} has ijk_start {} (expected {})", j, neigh.ijk_start, expected_start,
            );
            expected_start += n - j - 1;
        }
        Ok(Atom {
            ty, neighbors, angular, reference_force,
            abs_force: reference_force.norm(),
            contrib: true,
        })
    }

    /// Index into `self.angular` for the neighbor pair `(j, k)`, where `j < k`.
    #[inline(always)]
    pub fn angular_index(&self, j: usize, k: usize) -> usize {
        debug_assert!(j < k);
        self.neighbors[j].ijk_start + (k - j - 1)
    }
}

/// Fill in `ijk_start` on each neighbor and compute the cosine table.
fn assign_angular_table(neighbors: &mut [Neighbor]) -> Vec<AngularPart> {
    let n = neighbors.len();
    let mut angular = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for j in 0..n {
        neighbors[j].ijk_start = angular.len();
        for k in j + 1..n {
            let cos = V3::dot(&neighbors[j].dist, &neighbors[k].dist);
            angular.push(AngularPart { cos });
        }
    }
    angular
}

/// Voigt-ordered stress components: `xx, yy, zz, xy, yz, zx`.
pub type Stress = [f64; 6];

/// A reference structure together with the data it is being fit against.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub atoms: Vec<Atom>,
    /// Weight of this configuration in the objective.
    pub weight: f64,
    /// Whether the reference forces are usable.
    pub use_forces: bool,
    /// Whether the reference stress is usable.  Only has an effect together with `use_forces`.
    pub use_stress: bool,
    /// Cell volume, used to normalize the stress.
    pub volume: f64,
    /// Reference cohesive energy per atom.
    pub reference_energy: f64,
    pub reference_stress: Stress,
}

impl Configuration {
    pub fn num_atoms(&self) -> usize { self.atoms.len() }

    /// Total number of neighbor relations, for logging.
    pub fn num_neighbors(&self) -> usize {
        self.atoms.iter().map(|a| a.neighbors.len()).sum()
    }

    /// Replace the reference forces, keeping `abs_force` consistent.
    pub fn set_reference_forces(&mut self, forces: &[V3]) {
        assert_eq!(forces.len(), self.atoms.len());
        for (atom, &force) in self.atoms.iter_mut().zip(forces) {
            atom.reference_force = force;
            atom.abs_force = force.norm();
        }
    }
}
