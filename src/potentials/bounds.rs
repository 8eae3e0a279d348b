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

//! Keeping the optimizer inside the physically meaningful part of parameter space.

use crate::stiweb::params::{CutoffParam, PairParam, ParamShape, Slot};

/// Smallest value that a cutoff radius is clamped to.
pub const MIN_CUTOFF: f64 = 1e-6;

/// Hook through which the coordinator constrains the parameters it evaluates.
///
/// Only ever called on the coordinating process.
pub trait ParamSupervisor: Send {
    /// Clamp parameters into their physically valid domain, in place.
    fn check_params(&self, params: &mut [f64]);

    /// Penalty to add to the objective for the current parameters.
    ///
    /// `aux` holds one slot per parameter, for reporting the individual penalties.
    /// It may be empty, in which case nothing is reported.
    fn punish(&self, params: &[f64], aux: &mut [f64]) -> f64;
}

/// A supervisor that accepts everything.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoPenalty;

impl ParamSupervisor for NoPenalty {
    fn check_params(&self, _: &mut [f64]) {}
    fn punish(&self, _: &[f64], _: &mut [f64]) -> f64 { 0.0 }
}

/// Box constraints on individual parameters, enforced softly through a penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    shape: ParamShape,
    ranges: Vec<Option<(f64, f64)>>,
    punishment: f64,
}

impl Bounds {
    /// No bounds on anything.  Physicality clamping still applies.
    pub fn new(shape: ParamShape, punishment: f64) -> Self {
        Bounds { shape, ranges: vec![None; shape.len()], punishment }
    }

    /// Constrain the parameter at `index` to `[min, max]`.
    pub fn with_range(mut self, index: usize, min: f64, max: f64) -> Self {
        self.set_range(index, min, max);
        self
    }

    pub fn set_range(&mut self, index: usize, min: f64, max: f64) {
        assert!(min <= max, "empty range [{}, {}] for parameter {}", min, max, index);
        self.ranges[index] = Some((min, max));
    }

    pub fn range(&self, index: usize) -> Option<(f64, f64)> { self.ranges[index] }

    /// Distance of `value` outside of the bounds for `index`.  Zero inside.
    pub fn excursion(&self, index: usize, value: f64) -> f64 {
        match self.ranges[index] {
            Some((min, _)) if value < min => min - value,
            Some((_, max)) if value > max => value - max,
            _ => 0.0,
        }
    }
}

impl ParamSupervisor for Bounds {
    fn check_params(&self, params: &mut [f64]) {
        debug_assert_eq!(params.len(), self.shape.len());
        for (index, x) in params.iter_mut().enumerate() {
            match self.shape.slot(index) {
                Slot::Pair { param: PairParam::A1, .. } |
                Slot::Cutoff { param: CutoffParam::A2, .. } => {
                    if !(*x > 0.0) {
                        trace!("clamping cutoff at index {} ({} -> {})", index, *x, MIN_CUTOFF);
                        *x = MIN_CUTOFF;
                    }
                },
                Slot::Pair { param: PairParam::P, .. } |
                Slot::Pair { param: PairParam::Q, .. } |
                Slot::Pair { param: PairParam::Delta, .. } |
                Slot::Cutoff { param: CutoffParam::Gamma, .. } => {
                    if *x < 0.0 {
                        trace!("clamping parameter at index {} ({} -> 0)", index, *x);
                        *x = 0.0;
                    }
                },
                Slot::Pair { param: PairParam::A, .. } |
                Slot::Pair { param: PairParam::B, .. } |
                Slot::Lambda { .. } |
                Slot::Reserved => {},
            }
        }
    }

    fn punish(&self, params: &[f64], aux: &mut [f64]) -> f64 {
        debug_assert_eq!(params.len(), self.shape.len());
        let report = aux.len() == params.len();
        let mut total = 0.0;
        for (index, &x) in params.iter().enumerate() {
            let excursion = self.excursion(index, x);
            let penalty = match excursion {
                e if e > 0.0 => self.punishment * (1.0 + e * e),
                _ => 0.0,
            };
            if report {
                aux[index] = penalty;
            }
            total += penalty;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_physical_domain() {
        let shape = ParamShape::new(1);
        let bounds = Bounds::new(shape, 0.0);

        let mut params = vec![-1.0; shape.len()];
        bounds.check_params(&mut params);

        let a1 = shape.pair_index(0, PairParam::A1);
        let a2 = shape.cutoff_index(0, CutoffParam::A2);
        let gamma = shape.cutoff_index(0, CutoffParam::Gamma);
        assert_eq!(params[a1], MIN_CUTOFF);
        assert_eq!(params[a2], MIN_CUTOFF);
        assert_eq!(params[gamma], 0.0);
        assert_eq!(params[shape.pair_index(0, PairParam::P)], 0.0);
        // energy scales and lambda may have either sign
        assert_eq!(params[shape.pair_index(0, PairParam::A)], -1.0);
        assert_eq!(params[shape.lambda_index(0, 0, 0)], -1.0);
    }

    #[test]
    fn penalty() {
        let shape = ParamShape::new(1);
        let bounds = Bounds::new(shape, 10.0)
            .with_range(0, 1.0, 2.0)
            .with_range(1, 1.0, 2.0)
            .with_range(2, 1.0, 2.0);

        let mut params = vec![0.0; shape.len()];
        params[0] = 1.5;  // inside
        params[1] = 0.5;  // below
        params[2] = 5.0;  // above
        let mut aux = vec![0.0; shape.len()];

        let total = bounds.punish(&params, &mut aux);
        assert_eq!(aux[0], 0.0);
        assert_eq!(aux[1], 10.0 * (1.0 + 0.25));
        assert_eq!(aux[2], 10.0 * (1.0 + 9.0));
        assert_eq!(total, aux[1] + aux[2]);

        // still works without anywhere to report
        assert_eq!(bounds.punish(&params, &mut []), total);
    }

    #[test]
    fn no_penalty() {
        let mut params = vec![-1.0, 2.0];
        NoPenalty.check_params(&mut params);
        assert_eq!(params, vec![-1.0, 2.0]);
        assert_eq!(NoPenalty.punish(&params, &mut []), 0.0);
    }
}
