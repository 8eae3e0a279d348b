//! Glue between the swfit crates and the program that drives a fit.

#[macro_use] extern crate failure;
#[macro_use] extern crate log;
#[cfg(test)] #[macro_use] extern crate swfit_assert_close;

pub mod env;
mod logging;
mod objective;

pub type FailResult<T> = Result<T, failure::Error>;

pub use crate::logging::{GlobalLogger, ColorizedLevel};
pub use crate::objective::{start, bounds, run_worker_loop, Role, Objective, Member};

pub use swfit_tasks_config::{Settings, ValidatedSettings, YamlRead};
