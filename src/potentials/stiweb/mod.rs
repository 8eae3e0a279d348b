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

//! The Stillinger-Weber potential, evaluated as a fitting objective.
//!
//! An [`Evaluator`] takes a flat parameter vector and a set of reference
//! configurations, writes the deviations of forces, energies and stresses from
//! their reference values into a flat force vector (see [`crate::output`]), and
//! returns the weighted sum of squared deviations.

use rayon_cond::CondIterator;

use crate::output::ForceLayout;
use crate::structure::Configuration;

pub mod params;
pub mod cutoff;
pub mod pair;
pub mod triplet;
pub mod aggregate;

pub use self::params::{ParamShape, ParamLayout, ParamView, ParamSet, PairParams};
pub use self::aggregate::{Weights, ForceWeighting, FORCE_EPS, evaluate_configuration};

/// Whether independent configurations are evaluated in parallel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Threading {
    Serial,
    Rayon,
}

impl Default for Threading {
    fn default() -> Self { Threading::Serial }
}

/// Per-process evaluation state.
///
/// This owns the parameter layout (and therefore must not be shared between
/// concurrent evaluations), but borrows everything else for the duration of a call.
#[derive(Debug, Clone)]
pub struct Evaluator {
    layout: ParamLayout,
    force_layout: ForceLayout,
    weights: Weights,
    threading: Threading,
}

impl Evaluator {
    pub fn new(shape: ParamShape, force_layout: ForceLayout) -> Self {
        Evaluator {
            layout: ParamLayout::new(shape),
            force_layout,
            weights: Default::default(),
            threading: Default::default(),
        }
    }

    pub fn weights(mut self, weights: Weights) -> Self { self.weights = weights; self }

    pub fn threading(mut self, threading: Threading) -> Self { self.threading = threading; self }

    pub fn shape(&self) -> ParamShape { self.layout.shape() }

    pub fn force_layout(&self) -> ForceLayout { self.force_layout }

    /// How many times the parameter offsets have been derived.
    pub fn num_layout_rebuilds(&self) -> usize { self.layout.num_rebuilds() }

    /// Make the next evaluation re-derive its view of the parameter vector.
    pub fn forget_params(&mut self) { self.layout.forget() }

    /// Evaluate a contiguous run of configurations.
    ///
    /// `confs` are the configurations numbered `first_conf..` in the full set, whose
    /// first atom is atom number `first_atom` overall.  Only their regions of `forces`
    /// are written.
    ///
    /// Returns the sum of their contributions to the objective.  Penalties for the
    /// parameters are not included.
    pub fn evaluate(
        &mut self,
        params: &[f64],
        confs: &[Configuration],
        first_conf: usize,
        first_atom: usize,
        forces: &mut [f64],
    ) -> f64 {
        let view = self.layout.sync(params);
        let weights = &self.weights;
        let slots = self.force_layout.config_slots(forces, confs, first_conf, first_atom);
        let jobs = slots.into_iter().zip(confs).collect::<Vec<_>>();

        let partials: Vec<f64> = {
            CondIterator::new(jobs, self.threading == Threading::Rayon)
                .map(|(slots, conf)| {
                    let mut scratch = Vec::new();
                    evaluate_configuration(&view, conf, slots, weights, &mut scratch)
                })
                .collect()
        };
        // summed in configuration order regardless of threading
        partials.into_iter().sum()
    }

    /// Evaluate every configuration of the run.
    pub fn evaluate_all(&mut self, params: &[f64], confs: &[Configuration], forces: &mut [f64]) -> f64 {
        debug_assert_eq!(confs.len(), self.force_layout.nconf);
        self.evaluate(params, confs, 0, 0, forces)
    }
}
