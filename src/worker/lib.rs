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

//! Cooperative evaluation of the fitting objective by a fixed group of processes.
//!
//! Configurations are split into contiguous blocks, one per process.  Each cycle,
//! the root broadcasts a signal and the parameters, every process evaluates its own
//! block, and the results are reduced and gathered back onto the root.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate swfit_assert_close;

pub mod comm;
pub mod thread_group;
pub mod partition;
pub mod protocol;
#[cfg(feature = "mpi-support")]
pub mod mpi;

pub type FailResult<T> = Result<T, failure::Error>;

pub use crate::comm::{Comm, SerialComm, ROOT};
pub use crate::thread_group::ThreadComm;
pub use crate::partition::{Partition, InvalidPartitionError};
pub use crate::protocol::{Worker, Signal, NAN_SENTINEL, EXIT_SENTINEL};
#[cfg(feature = "mpi-support")]
pub use crate::mpi::MpiComm;
