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

//! The collective operations that the protocol needs from a group of processes.

use crate::protocol::Signal;

/// Rank of the coordinating process.
pub const ROOT: usize = 0;

/// A group of cooperating processes, seen from one member.
///
/// Every method is collective: all members must call it, in the same order, or the
/// group deadlocks.  Only the root's inputs matter for broadcasts, and only the root
/// receives the results of reductions and gathers.
pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn is_root(&self) -> bool { self.rank() == ROOT }

    /// Distribute the root's signal.
    ///
    /// Must be `Some` on the root.  Ignored elsewhere.
    fn broadcast_signal(&self, signal: Option<Signal>) -> Signal;

    /// Overwrite `params` on every process with the root's, resizing if necessary.
    fn broadcast_params(&self, params: &mut Vec<f64>);

    /// Sum a value over all processes.  `Some` only on the root.
    ///
    /// Values are summed in rank order.
    fn reduce_sum(&self, value: f64) -> Option<f64>;

    /// Collect `buf[displs[r]..displs[r] + counts[r]]` from each rank `r` into the
    /// root's `buf`.
    ///
    /// Non-root buffers are left as they were.
    fn gather_varcount(&self, buf: &mut [f64], counts: &[usize], displs: &[usize]);
}

/// The trivial group of one.
#[derive(Debug, Copy, Clone, Default)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize { ROOT }
    fn size(&self) -> usize { 1 }

    fn broadcast_signal(&self, signal: Option<Signal>) -> Signal {
        match signal {
            Some(signal) => signal,
            None => panic!("root did not provide a signal to broadcast"),
        }
    }

    fn broadcast_params(&self, _: &mut Vec<f64>) {}

    fn reduce_sum(&self, value: f64) -> Option<f64> { Some(value) }

    fn gather_varcount(&self, _: &mut [f64], counts: &[usize], _: &[usize]) {
        debug_assert_eq!(counts.len(), 1);
    }
}
