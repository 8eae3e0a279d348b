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

//! Finite differences, for checking analytic forces against energies.
//!
//! Exported so that programs which build their own parameter sets can debug them
//! the same way the tests in this crate do.

/// Which finite difference formula to use.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeKind {
    /// n-point central stencil.  Only `n = 3` and `n = 5` are implemented.
    Stencil(u32),
}

impl Default for DerivativeKind {
    fn default() -> DerivativeKind { DerivativeKind::Stencil(5) }
}

/// Numerical derivative of a 1D function at `point`.
pub fn slope(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: impl FnMut(f64) -> f64,
) -> f64 {
    let mut at = |offset: f64| value_fn(point + offset * step);
    match kind.unwrap_or_default() {
        DerivativeKind::Stencil(3) => (at(1.0) - at(-1.0)) / (2.0 * step),
        DerivativeKind::Stencil(5) => {
            let numer = at(-2.0) - 8.0 * at(-1.0) + 8.0 * at(1.0) - at(2.0);
            numer / (12.0 * step)
        },
        DerivativeKind::Stencil(n) => panic!("{}-point stencil is not implemented", n),
    }
}

/// Numerical gradient of a function of many variables.
pub fn gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    let mut work = point.to_vec();
    (0..point.len()).map(|i| {
        let d = slope(step, kind, point[i], |x| {
            work[i] = x;
            value_fn(&work)
        });
        work[i] = point[i];
        d
    }).collect()
}
