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

use crate::numerical;
use swfit_array_types::V3;

#[cfg(test)]
pub(crate) fn uniform(a: f64, b: f64) -> f64 { ::rand::random::<f64>() * (b - a) + a }

#[cfg(test)]
pub(crate) fn random_v3(a: f64, b: f64) -> V3 { V3::from_fn(|_| uniform(a, b)) }

#[allow(dead_code)] // used by tests, and handy when debugging new terms
pub(crate) fn num_grad_v3(
    interval: f64,
    point: V3,
    mut value_fn: impl FnMut(V3) -> f64,
) -> V3 {
    let grad = numerical::gradient(interval, None, &point.0, |v| value_fn(V3([v[0], v[1], v[2]])));
    V3([grad[0], grad[1], grad[2]])
}
