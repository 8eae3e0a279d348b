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

//! The real thing: one MPI process per member, on the world communicator.
//!
//! MPI must already be initialized (e.g. by holding on to the `Universe` returned by
//! `mpi::initialize()` for the duration of `main`).

use ::mpi::collective::SystemOperation;
use ::mpi::datatype::PartitionMut;
use ::mpi::topology::{Process, SystemCommunicator};
use ::mpi::traits::*;
use ::mpi::Count;

use crate::comm::{Comm, ROOT};
use crate::protocol::Signal;

#[derive(Debug, Copy, Clone)]
pub struct MpiComm {
    world: SystemCommunicator,
}

impl MpiComm {
    pub fn world() -> Self { MpiComm { world: SystemCommunicator::world() } }

    fn root(&self) -> Process<'_, SystemCommunicator> {
        self.world.process_at_rank(ROOT as ::mpi::Rank)
    }
}

fn to_count(x: usize) -> Count {
    assert!(x <= Count::max_value() as usize, "message too large for MPI");
    x as Count
}

impl Comm for MpiComm {
    fn rank(&self) -> usize { self.world.rank() as usize }
    fn size(&self) -> usize { self.world.size() as usize }

    fn broadcast_signal(&self, signal: Option<Signal>) -> Signal {
        let mut flag = match (self.is_root(), signal) {
            (true, Some(signal)) => signal.to_flag(),
            (true, None) => panic!("root did not provide a signal to broadcast"),
            (false, _) => 0,
        };
        self.root().broadcast_into(&mut flag);
        Signal::from_flag(flag)
    }

    fn broadcast_params(&self, params: &mut Vec<f64>) {
        let root = self.root();
        let mut len = params.len() as u64;
        root.broadcast_into(&mut len);
        if !self.is_root() {
            params.resize(len as usize, 0.0);
        }
        root.broadcast_into(&mut params[..]);
    }

    fn reduce_sum(&self, value: f64) -> Option<f64> {
        let root = self.root();
        match self.is_root() {
            true => {
                let mut sum = 0.0;
                root.reduce_into_root(&value, &mut sum, SystemOperation::sum());
                Some(sum)
            },
            false => {
                root.reduce_into(&value, SystemOperation::sum());
                None
            },
        }
    }

    fn gather_varcount(&self, buf: &mut [f64], counts: &[usize], displs: &[usize]) {
        let rank = self.rank();
        let root = self.root();
        let range = displs[rank]..displs[rank] + counts[rank];

        // the send and receive buffers may not alias, so the root sends a copy of its part
        let mine = buf[range].to_vec();
        match self.is_root() {
            true => {
                let counts: Vec<Count> = counts.iter().map(|&c| to_count(c)).collect();
                let displs: Vec<Count> = displs.iter().map(|&d| to_count(d)).collect();
                let mut partition = PartitionMut::new(&mut buf[..], &counts[..], &displs[..]);
                root.gather_varcount_into_root(&mine[..], &mut partition);
            },
            false => root.gather_varcount_into(&mine[..]),
        }
    }
}
