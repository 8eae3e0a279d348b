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

//! Static assignment of configurations to processes.

use std::ops::Range;

#[derive(Debug, Fail)]
#[fail(display = "cannot partition {} configurations over {} processes", nconf, nprocs)]
pub struct InvalidPartitionError {
    pub nconf: usize,
    pub nprocs: usize,
}

/// Contiguous blocks of configurations, one per rank.
///
/// Computed once at startup and never rebalanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    // rank r owns configurations conf_div[r]..conf_div[r + 1]
    conf_div: Vec<usize>,
    // configuration h owns atoms atom_div[h]..atom_div[h + 1]
    atom_div: Vec<usize>,
}

impl Partition {
    /// Give each rank `nconf / nprocs` consecutive configurations, with the first
    /// `nconf % nprocs` ranks getting one extra.
    ///
    /// `conf_atom_counts` holds the number of atoms in each configuration.
    pub fn contiguous(conf_atom_counts: &[usize], nprocs: usize) -> Result<Partition, InvalidPartitionError> {
        let nconf = conf_atom_counts.len();
        if nprocs == 0 {
            return Err(InvalidPartitionError { nconf, nprocs });
        }

        let (base, extra) = (nconf / nprocs, nconf % nprocs);
        let mut conf_div = vec![0];
        for rank in 0..nprocs {
            let len = base + if rank < extra { 1 } else { 0 };
            conf_div.push(conf_div[rank] + len);
        }

        let mut atom_div = vec![0];
        for (h, &count) in conf_atom_counts.iter().enumerate() {
            atom_div.push(atom_div[h] + count);
        }
        Ok(Partition { conf_div, atom_div })
    }

    pub fn nprocs(&self) -> usize { self.conf_div.len() - 1 }
    pub fn nconf(&self) -> usize { self.atom_div.len() - 1 }
    pub fn natoms(&self) -> usize { self.atom_div[self.nconf()] }

    pub fn conf_range(&self, rank: usize) -> Range<usize> {
        self.conf_div[rank]..self.conf_div[rank + 1]
    }

    pub fn atom_range(&self, rank: usize) -> Range<usize> {
        let confs = self.conf_range(rank);
        self.atom_div[confs.start]..self.atom_div[confs.end]
    }

    /// Per-rank counts and offsets of `per_atom` values for every atom.
    pub fn atom_counts(&self, per_atom: usize) -> (Vec<usize>, Vec<usize>) {
        self.counts(per_atom, |rank| self.atom_range(rank))
    }

    /// Per-rank counts and offsets of `per_conf` values for every configuration.
    pub fn conf_counts(&self, per_conf: usize) -> (Vec<usize>, Vec<usize>) {
        self.counts(per_conf, |rank| self.conf_range(rank))
    }

    fn counts(&self, scale: usize, range: impl Fn(usize) -> Range<usize>) -> (Vec<usize>, Vec<usize>) {
        (0..self.nprocs())
            .map(|rank| {
                let range = range(rank);
                (scale * range.len(), scale * range.start)
            })
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_first_ranks() {
        let part = Partition::contiguous(&[1, 2, 3, 4, 5], 3).unwrap();
        assert_eq!(part.nprocs(), 3);
        assert_eq!(part.nconf(), 5);
        assert_eq!(part.natoms(), 15);
        assert_eq!(part.conf_range(0), 0..2);
        assert_eq!(part.conf_range(1), 2..4);
        assert_eq!(part.conf_range(2), 4..5);
        assert_eq!(part.atom_range(1), 3..10);
        assert_eq!(part.atom_counts(3), (vec![9, 21, 15], vec![0, 9, 30]));
        assert_eq!(part.conf_counts(6), (vec![12, 12, 6], vec![0, 12, 24]));
    }

    #[test]
    fn more_ranks_than_configurations() {
        let part = Partition::contiguous(&[2, 2], 4).unwrap();
        assert_eq!(part.conf_range(1), 1..2);
        assert_eq!(part.conf_range(2), 2..2);
        assert_eq!(part.atom_range(3), 4..4);
        assert_eq!(part.conf_counts(1), (vec![1, 1, 0, 0], vec![0, 1, 2, 2]));
    }

    #[test]
    fn no_ranks() {
        let err = Partition::contiguous(&[1], 0).unwrap_err();
        assert_eq!(err.to_string(), "cannot partition 1 configurations over 0 processes");
    }
}
