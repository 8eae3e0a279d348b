/* ************************************************************************ **
**  This file is part of swfit.                                             **
**                                                                          **
**  swfit is free software: you can redistribute it and/or modify it under  **
**  the terms of the GNU General Public License as published by the Free    **
**  Software Foundation, either version 3 of the License, or (at your       **
**  option) any later version.                                              **
**                                                                          **
**      http://www.gnu.org/licenses/                                        **
**                                                                          **
** Do note that, while the whole of swfit is licensed under the GPL, many   **
** parts of it are licensed under more permissive terms.                    **
** ************************************************************************ */

//! Environment variables that influence swfit.

use crate::FailResult;
use std::env;

fn var(key: &str) -> FailResult<Option<String>>
{ match env::var(key) {
    Ok(s) => Ok(Some(s)),
    Err(env::VarError::NotPresent) => Ok(None),
    Err(env::VarError::NotUnicode(s)) => bail!("env var not unicode: {}={:?}", key, s),
}}

fn nonempty_var(key: &str) -> FailResult<Option<String>>
{ match var(key) {
    Ok(Some(ref s)) if s == "" => Ok(None),
    r => r,
}}

/// Show module names in log output.
pub fn log_mod() -> FailResult<bool>
{Ok({
    nonempty_var("SWFIT_LOG_MOD")?
        .map(|s| parse_flag("SWFIT_LOG_MOD", &s))
        .transpose()?
        .unwrap_or(false)
})}

fn parse_flag(key: &str, s: &str) -> FailResult<bool>
{ match s {
    "1" => Ok(true),
    "0" => Ok(false),
    _ => bail!("Invalid setting for {}: {:?}", key, s),
}}
