/* ************************************************************************ **
**  This file is part of swfit.                                             **
**                                                                          **
**  swfit is free software: you can redistribute it and/or modify it under  **
**  the terms of the GNU General Public License as published by the Free    **
**  Software Foundation, either version 3 of the License, or (at your       **
**  option) any later version.                                              **
**                                                                          **
**      http://www.gnu.org/licenses/                                        **
**                                                                          **
** Do note that, while the whole of swfit is licensed under the GPL, many   **
** parts of it are licensed under more permissive terms.                    **
** ************************************************************************ */

//! The face that a fit shows to the optimizer.
//!
//! Every process calls [`start`] with the same settings and configurations.  The root
//! gets an [`Objective`] to hand to its optimizer; every other process gets a
//! [`Member`] which it should [`run`](Member::run) until the root is done.

use swfit_potentials::{Bounds, Configuration, Evaluator, ForceLayout, ParamSupervisor};
use swfit_potentials::stiweb::{self, ParamShape};
use swfit_tasks_config as config;
use swfit_tasks_config::ValidatedSettings;
use swfit_worker::{Comm, Partition, Signal, Worker};

use crate::FailResult;

/// What this process should do for the rest of the fit.
pub enum Role<C: Comm> {
    Root(Objective<C>),
    Member(Member<C>),
}

/// Set up this process's part of a fit.
///
/// `confs` holds every configuration of the fit, in the same order on every process.
pub fn start<C: Comm>(
    comm: C,
    settings: &ValidatedSettings,
    confs: Vec<Configuration>,
) -> FailResult<Role<C>> {
    let ValidatedSettings(ref raw) = *settings;
    let shape = raw.param_shape();
    for (h, conf) in confs.iter().enumerate() {
        check_types(conf, shape).map_err(|e| format_err!("configuration {}: {}", h, e))?;
    }

    let layout = ForceLayout::for_configurations(&confs, raw.stress, shape.len());
    let counts: Vec<_> = confs.iter().map(|c| c.num_atoms()).collect();
    let partition = Partition::contiguous(&counts, comm.size())?;
    if comm.is_root() {
        info!(
            "Fitting {} parameters to {} configurations ({} atoms) on {} processes.",
            shape.len(), layout.nconf, layout.natoms, comm.size(),
        );
        if layout.nconf < comm.size() {
            warn!("Some processes have no configurations to evaluate.");
        }
    }

    let evaluator = {
        Evaluator::new(shape, layout)
            .weights(engine_weights(&raw.weights))
            .threading(match raw.threading {
                config::Threading::Serial => stiweb::Threading::Serial,
                config::Threading::Rayon => stiweb::Threading::Rayon,
            })
    };

    let mine = {
        let range = partition.conf_range(comm.rank());
        let mut confs = confs;
        confs.truncate(range.end);
        confs.split_off(range.start)
    };

    let supervisor: Box<dyn ParamSupervisor> = Box::new(bounds(settings));
    let worker = Worker::new(comm, evaluator, partition, mine, supervisor)?;
    Ok(match worker.is_root() {
        true => Role::Root(Objective::new(worker)?),
        false => Role::Member(Member { worker }),
    })
}

fn engine_weights(weights: &config::Weights) -> stiweb::Weights {
    stiweb::Weights {
        energy: weights.energy,
        stress: weights.stress,
        force: match weights.force {
            config::ForceWeighting::Absolute => stiweb::ForceWeighting::Absolute,
            config::ForceWeighting::Relative { eps } => stiweb::ForceWeighting::Relative { eps },
        },
    }
}

/// The bounds collaborator described by the settings.
pub fn bounds(settings: &ValidatedSettings) -> Bounds {
    let ValidatedSettings(ref raw) = *settings;
    let mut bounds = Bounds::new(raw.param_shape(), raw.bounds.punishment);
    for (index, min, max) in settings.index_ranges() {
        bounds.set_range(index, min, max);
    }
    bounds
}

fn check_types(conf: &Configuration, shape: ParamShape) -> FailResult<()> {
    for atom in &conf.atoms {
        ensure!(atom.ty < shape.ntypes, "atom type {} is out of range for ntypes = {}", atom.ty, shape.ntypes);
        for neigh in &atom.neighbors {
            ensure!(neigh.col < shape.ncols, "pair column {} is out of range", neigh.col);
        }
    }
    Ok(())
}

//------------------------------------------------------------------------

/// Root-side handle to the fitting objective.
///
/// Dropping this releases the other processes from their loop.
pub struct Objective<C: Comm> {
    worker: Worker<C>,
    forces: Vec<f64>,
    finished: bool,
}

impl<C: Comm> Objective<C> {
    pub fn new(worker: Worker<C>) -> FailResult<Self> {
        ensure!(worker.is_root(), "an Objective can only be created on the root process");
        let forces = vec![0.0; worker.force_layout().len()];
        Ok(Objective { worker, forces, finished: false })
    }

    /// Sum of squared deviations for `params`.
    ///
    /// `params` may be modified to bring it back into the physically valid domain.
    pub fn value(&mut self, params: &mut Vec<f64>) -> f64 {
        self.send(Signal::Evaluate, params)
    }

    /// Like `value`, but for when something about `params` other than its values
    /// has changed (e.g. it was reallocated by the optimizer).
    pub fn resync(&mut self, params: &mut Vec<f64>) -> f64 {
        self.send(Signal::ResyncFull, params)
    }

    /// Deviations from the most recent evaluation, for every configuration.
    pub fn forces(&self) -> &[f64] { &self.forces }

    pub fn force_layout(&self) -> ForceLayout { self.worker.force_layout() }

    /// Number of evaluations so far.
    pub fn fcalls(&self) -> u64 { self.worker.fcalls() }

    /// Release the other processes.  Equivalent to dropping.
    pub fn finish(self) {}

    fn send(&mut self, signal: Signal, params: &mut Vec<f64>) -> f64 {
        assert!(!self.finished);
        self.worker.run(signal, params, &mut self.forces)
    }
}

impl<C: Comm> Drop for Objective<C> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            debug!("Releasing {} processes after {} evaluations.", self.worker.comm().size() - 1, self.fcalls());
            let _ = self.worker.run(Signal::Exit, &mut vec![], &mut self.forces);
        }
    }
}

/// A process that is not the root.
pub struct Member<C: Comm> {
    worker: Worker<C>,
}

impl<C: Comm> Member<C> {
    /// Follow the root's instructions until it is done.
    pub fn run(self) {
        let mut worker = self.worker;
        let mut params = vec![];
        let mut forces = vec![0.0; worker.force_layout().len()];
        worker.run(Signal::Evaluate, &mut params, &mut forces);
    }
}

/// Entry point for non-root processes that built their own [`Worker`].
pub fn run_worker_loop<C: Comm>(worker: Worker<C>) -> FailResult<()> {
    ensure!(!worker.is_root(), "the root process cannot run the worker loop");
    Member { worker }.run();
    Ok(())
}
