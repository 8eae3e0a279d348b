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

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate swfit_assert_close;

pub mod stiweb;
pub mod structure;
pub mod output;
pub mod bounds;
pub mod geometry;
pub mod numerical;
pub(crate) mod util;

pub type FailResult<T> = Result<T, failure::Error>;

pub use crate::stiweb::{Evaluator, Threading, Weights, ForceWeighting};
pub use crate::structure::{Configuration, Atom, Neighbor};
pub use crate::output::ForceLayout;
pub use crate::bounds::{ParamSupervisor, Bounds, NoPenalty};
