use crate::FailResult;

use std::fmt;
use std::path::{Path, PathBuf};
use log::{Level, LevelFilter};

/// Builder-style setup for logging
#[derive(Debug, Clone, Default)]
pub struct GlobalLogger {
    path: Option<PathBuf>,
    verbosity: Verbosity,
}

impl GlobalLogger {
    /// NOTE: Relative paths will not be resolved until apply() is called.
    pub fn path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self
    { self.path = Some(path.as_ref().to_owned()); self }

    /// Any integer will be accepted; the level will be truncated
    /// to the most extreme value supported.
    pub fn verbosity(&mut self, level: i32) -> &mut Self
    {
        self.verbosity = match level > 0 {
            true => Verbosity::Loud,
            false => Verbosity::Default,
        };
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity { Default, Loud }

impl Default for Verbosity {
    fn default() -> Self { Verbosity::Default }
}

impl GlobalLogger {
    /// NOTE: This can only succeed once per process.
    pub fn apply(&mut self) -> FailResult<()>
    {Ok({
        use std::time::Instant;

        let show_target = crate::env::log_mod()?;
        let engine_level = match self.verbosity {
            Verbosity::Default => LevelFilter::Debug,
            Verbosity::Loud => LevelFilter::Trace,
        };

        let start = Instant::now();
        let mut dispatch = fern::Dispatch::new();
        dispatch = dispatch.format(move |out, message, record| {
                let t = start.elapsed();
                let target = match show_target {
                    true => format!("[{}]", record.target()),
                    false => String::new(),
                };
                out.finish(format_args!("[{:>4}.{:03}s]{}[{}] {}",
                    t.as_secs(),
                    t.subsec_millis(),
                    target,
                    ColorizedLevel(record.level()),
                    message))
            })
            .level(LevelFilter::Info)
            .level_for("swfit_tasks", LevelFilter::Trace)
            .level_for("swfit_potentials", engine_level)
            .level_for("swfit_worker", engine_level)
            .chain(std::io::stdout());

        if let Some(path) = self.path.as_ref() {
            dispatch = dispatch.chain(fern::log_file(path)?);
        }

        dispatch.apply().map_err(|e| format_err!("{}", e))?;
    })}
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(format!("{:<5}", self.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_text_survives_coloring() {
        let text = ColorizedLevel(Level::Warn).to_string();
        assert!(text.contains("WARN "));
    }

    #[test]
    fn verbosity_saturates() {
        let mut logger = GlobalLogger::default();
        assert_eq!(logger.verbosity(7).verbosity, Verbosity::Loud);
        assert_eq!(logger.verbosity(-2).verbosity, Verbosity::Default);
    }
}
