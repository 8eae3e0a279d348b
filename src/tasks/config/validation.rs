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

//! All of the post-processing that occurs after deserialization is written here.

use crate::FailResult;
use crate::config::*;
use swfit_potentials::stiweb::params::{pair_col, CutoffParam, PairParam, ParamShape, Slot};

impl Settings {
    pub fn validate(self) -> FailResult<ValidatedSettings> {
        ensure!(self.ntypes > 0, "ntypes must be at least 1");

        check_weights(&self.weights)?;

        let Bounds { punishment, ref ranges } = self.bounds;
        ensure!(
            punishment >= 0.0 && punishment.is_finite(),
            "bounds.punishment must be finite and non-negative (got {})", punishment,
        );

        let shape = self.param_shape();
        for range in ranges {
            let index = range.param.resolve(shape)?;
            ensure!(
                range.min <= range.max,
                "bounds for parameter {} ({:?}) are empty: [{}, {}]", index, range.param, range.min, range.max,
            );
        }

        Ok(ValidatedSettings(self))
    }

    pub fn param_shape(&self) -> ParamShape { ParamShape::new(self.ntypes) }
}

impl ValidatedSettings {
    /// Bounds with every parameter reference replaced by its index.
    pub fn index_ranges(&self) -> Vec<(usize, f64, f64)> {
        let shape = self.0.param_shape();
        self.0.bounds.ranges.iter()
            .map(|range| {
                let index = range.param.resolve(shape).expect("BUG! unchecked parameter reference");
                (index, range.min, range.max)
            })
            .collect()
    }
}

impl ParamRef {
    /// Position in the parameter vector.
    pub fn resolve(&self, shape: ParamShape) -> FailResult<usize> {
        let ntypes = shape.ntypes;
        let check_type = |ty: usize| -> FailResult<()> {
            ensure!(ty < ntypes, "atom type {} is out of range for ntypes = {}", ty, ntypes);
            Ok(())
        };

        match *self {
            ParamRef::Index(index) => {
                ensure!(index < shape.len(), "parameter index {} is out of range (len {})", index, shape.len());
                if let Slot::Reserved = shape.slot(index) {
                    bail!("parameter index {} is a reserved slot", index);
                }
                Ok(index)
            },
            ParamRef::Pair { types: [a, b], name } => {
                check_type(a)?;
                check_type(b)?;
                let col = pair_col(ntypes, a, b);
                Ok(match name {
                    PairParamName::A => shape.pair_index(col, PairParam::A),
                    PairParamName::B => shape.pair_index(col, PairParam::B),
                    PairParamName::P => shape.pair_index(col, PairParam::P),
                    PairParamName::Q => shape.pair_index(col, PairParam::Q),
                    PairParamName::Delta => shape.pair_index(col, PairParam::Delta),
                    PairParamName::A1 => shape.pair_index(col, PairParam::A1),
                    PairParamName::Gamma => shape.cutoff_index(col, CutoffParam::Gamma),
                    PairParamName::A2 => shape.cutoff_index(col, CutoffParam::A2),
                })
            },
            ParamRef::Lambda([i, j, k]) => {
                for &ty in &[i, j, k] {
                    check_type(ty)?;
                }
                Ok(shape.lambda_index(i, j, k))
            },
        }
    }
}

fn check_weights(weights: &Weights) -> FailResult<()> {
    let Weights { energy, stress, ref force } = *weights;
    for &(name, value) in &[("energy", energy), ("stress", stress)] {
        ensure!(
            value >= 0.0 && value.is_finite(),
            "weights.{} must be finite and non-negative (got {})", name, value,
        );
    }
    if let ForceWeighting::Relative { eps } = *force {
        // a zero eps divides by zero for atoms with no reference force
        ensure!(eps > 0.0, "weights.force.relative.eps must be positive (got {})", eps);
    }
    Ok(())
}
