//! Fitting Stillinger-Weber potentials to reference data.
//!
//! This crate only re-exports the workspace members.  See `swfit_tasks` for the
//! entry points, and `swfit_potentials` for the evaluation engine.

pub use swfit_tasks::{
    start, bounds, run_worker_loop,
    Role, Objective, Member,
    GlobalLogger, Settings, ValidatedSettings, YamlRead,
    FailResult,
};

pub use swfit_potentials as potentials;
pub use swfit_worker as worker;
pub use swfit_array_types as array_types;
pub use swfit_tasks_config as config;
