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

//! The evaluation loop shared by all processes.
//!
//! The root process calls [`Worker::run`] once for each objective evaluation the
//! optimizer asks for.  Every other process calls it exactly once, and stays inside
//! until the root sends [`Signal::Exit`].

use swfit_potentials::{Configuration, Evaluator, ParamSupervisor};

use crate::FailResult;
use crate::comm::Comm;
use crate::partition::Partition;

/// Objective reported in place of NaN.
pub const NAN_SENTINEL: f64 = 10e30;

/// Returned by processes that leave the loop because of [`Signal::Exit`].
pub const EXIT_SENTINEL: f64 = -1.0;

/// What the root asks the group to do next.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Evaluate the objective for the broadcast parameters.
    Evaluate,
    /// Something about the parameters changed beyond their values; rebuild all
    /// derived state, then evaluate.
    ResyncFull,
    /// Leave the loop.
    Exit,
}

impl Signal {
    /// Decode an integer flag.  `1` is `Exit`, `2` is `ResyncFull`, anything else
    /// is `Evaluate`.
    pub fn from_flag(flag: i32) -> Signal {
        match flag {
            1 => Signal::Exit,
            2 => Signal::ResyncFull,
            _ => Signal::Evaluate,
        }
    }

    pub fn to_flag(self) -> i32 {
        match self {
            Signal::Evaluate => 0,
            Signal::Exit => 1,
            Signal::ResyncFull => 2,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    AwaitSignal,
    ResyncFull,
    Evaluate,
    Exit,
}

/// One process's share of the work, and the means to cooperate with the others.
pub struct Worker<C: Comm> {
    comm: C,
    evaluator: Evaluator,
    partition: Partition,
    // only the configurations in this rank's block
    confs: Vec<Configuration>,
    supervisor: Box<dyn ParamSupervisor>,
    fcalls: u64,
}

impl<C: Comm> Worker<C> {
    /// `confs` must be exactly the configurations that `partition` assigns to this rank.
    ///
    /// The supervisor is only consulted on the root.
    pub fn new(
        comm: C,
        evaluator: Evaluator,
        partition: Partition,
        confs: Vec<Configuration>,
        supervisor: Box<dyn ParamSupervisor>,
    ) -> FailResult<Self> {
        let rank = comm.rank();
        ensure!(
            partition.nprocs() == comm.size(),
            "partition is for {} processes, but there are {}", partition.nprocs(), comm.size(),
        );

        let layout = evaluator.force_layout();
        ensure!(
            (layout.nconf, layout.natoms) == (partition.nconf(), partition.natoms()),
            "force layout ({} configurations, {} atoms) does not match partition ({}, {})",
            layout.nconf, layout.natoms, partition.nconf(), partition.natoms(),
        );

        let conf_range = partition.conf_range(rank);
        ensure!(
            confs.len() == conf_range.len(),
            "rank {} was given {} configurations but owns {}", rank, confs.len(), conf_range.len(),
        );
        let natoms: usize = confs.iter().map(|c| c.num_atoms()).sum();
        ensure!(
            natoms == partition.atom_range(rank).len(),
            "rank {} was given {} atoms but owns {}", rank, natoms, partition.atom_range(rank).len(),
        );

        debug!(
            "rank {}: configurations {:?}, atoms {:?}",
            rank, conf_range, partition.atom_range(rank),
        );
        Ok(Worker { comm, evaluator, partition, confs, supervisor, fcalls: 0 })
    }

    pub fn comm(&self) -> &C { &self.comm }

    pub fn is_root(&self) -> bool { self.comm.is_root() }

    /// Number of completed evaluations.  Only counted on the root.
    pub fn fcalls(&self) -> u64 { self.fcalls }

    pub fn force_layout(&self) -> swfit_potentials::ForceLayout { self.evaluator.force_layout() }

    /// Run the protocol.
    ///
    /// On the root, `signal` is sent to the group and one cycle is performed.  The
    /// return value is the objective (or `NAN_SENTINEL`), and `forces` holds the
    /// deviations of every configuration.  After `Signal::Exit`, the return value is
    /// `EXIT_SENTINEL` and carries no meaning.
    ///
    /// Elsewhere, `signal` is ignored and this only returns (with `EXIT_SENTINEL`)
    /// once the root sends `Signal::Exit`.  `params` is overwritten with the root's
    /// parameters on every cycle.
    ///
    /// `forces` must have the full length of the force layout on every process.
    pub fn run(&mut self, signal: Signal, params: &mut Vec<f64>, forces: &mut [f64]) -> f64 {
        let mut state = State::AwaitSignal;
        loop {
            state = match state {
                State::AwaitSignal => {
                    let outgoing = if self.is_root() { Some(signal) } else { None };
                    let signal = self.comm.broadcast_signal(outgoing);
                    trace!("rank {}: received {:?}", self.comm.rank(), signal);
                    match signal {
                        Signal::Exit => State::Exit,
                        Signal::ResyncFull => State::ResyncFull,
                        Signal::Evaluate => State::Evaluate,
                    }
                },

                State::ResyncFull => {
                    self.evaluator.forget_params();
                    State::Evaluate
                },

                State::Evaluate => {
                    let value = self.evaluate_cycle(params, forces);
                    match value {
                        Some(value) => return value,
                        None => State::AwaitSignal,
                    }
                },

                State::Exit => {
                    trace!("rank {}: leaving the evaluation loop", self.comm.rank());
                    return EXIT_SENTINEL;
                },
            };
        }
    }

    // Returns the objective on the root.
    fn evaluate_cycle(&mut self, params: &mut Vec<f64>, forces: &mut [f64]) -> Option<f64> {
        let layout = self.evaluator.force_layout();
        assert_eq!(forces.len(), layout.len(), "force vector has wrong length");

        let rank = self.comm.rank();
        if self.is_root() {
            self.supervisor.check_params(params);
        }
        self.comm.broadcast_params(params);

        let (first_conf, first_atom) = (self.partition.conf_range(rank).start, self.partition.atom_range(rank).start);
        let mut partial = self.evaluator.evaluate(params, &self.confs, first_conf, first_atom, forces);

        if self.is_root() {
            let aux = &mut forces[layout.punish_p()..];
            let aux: &mut [f64] = if aux.len() == params.len() { aux } else { &mut [] };
            partial += self.supervisor.punish(params, aux);
        }

        let sum = self.comm.reduce_sum(partial);

        let (counts, displs) = self.partition.atom_counts(3);
        self.comm.gather_varcount(forces, &counts, &displs);
        let energy_p = layout.energy_p();
        let (counts, displs) = self.partition.conf_counts(1);
        let displs = displs.into_iter().map(|d| d + energy_p).collect::<Vec<_>>();
        self.comm.gather_varcount(forces, &counts, &displs);
        if layout.stress {
            let stress_p = layout.stress_p();
            let (counts, displs) = self.partition.conf_counts(6);
            let displs = displs.into_iter().map(|d| d + stress_p).collect::<Vec<_>>();
            self.comm.gather_varcount(forces, &counts, &displs);
        }

        sum.map(|sum| {
            self.fcalls += 1;
            if sum.is_nan() {
                warn!("Objective is NaN! (evaluation {}); reporting {:e} instead", self.fcalls, NAN_SENTINEL);
                NAN_SENTINEL
            } else {
                sum
            }
        })
    }
}
