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

//! Types describing the settings of a fitting run.
//!
//! Everything here is plain data.  Post-processing and checks live in `validation.rs`.

use serde::de;

/// Settings after validation.
///
/// Deserializing this type runs `Settings::validate`, so that a typo'd or inconsistent
/// config is caught at the point where it is read.
#[derive(Serialize)]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings(pub Settings);

/// Raw settings, as written by the user.
///
/// You shouldn't deserialize this type directly; deserialize `ValidatedSettings` instead.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Number of atom types.  Determines the length of the parameter vector.
    pub ntypes: usize,

    #[serde(default)]
    pub weights: Weights,

    #[serde(default)]
    pub bounds: Bounds,

    #[serde(default)]
    pub threading: Threading,

    /// Fit stress for periodic configurations.  When `false`, no stress slots are
    /// reserved in the force vector at all.
    #[serde(default = "_settings__stress")]
    pub stress: bool,
}
fn _settings__stress() -> bool { true }
derive_yaml_read!{Settings}
derive_yaml_read!{ValidatedSettings}

impl<'de> de::Deserialize<'de> for ValidatedSettings {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cereal: Settings = de::Deserialize::deserialize(deserializer)?;

        cereal.validate().map_err(de::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Weights {
    /// Weight of the squared deviation of the energy per atom.
    #[serde(default = "_weights__energy")]
    pub energy: f64,

    /// Weight of the squared deviation of each stress component.
    #[serde(default = "_weights__stress")]
    pub stress: f64,

    #[serde(default)]
    pub force: ForceWeighting,
}
fn _weights__energy() -> f64 { 100.0 }
fn _weights__stress() -> f64 { 10.0 }

/// ```yaml
/// force: absolute
/// # or
/// force:
///   relative:
///     eps: 0.1     # optional
/// ```
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ForceWeighting {
    Absolute,
    /// Scale force deviations on each atom by `1 / (eps + |F_ref|)`.
    Relative {
        #[serde(default = "_force_weighting__relative__eps")]
        eps: f64,
    },
}
fn _force_weighting__relative__eps() -> f64 { swfit_potentials::stiweb::FORCE_EPS }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Bounds {
    /// Penalty for leaving a range, which grows quadratically with the distance.
    #[serde(default = "_bounds__punishment")]
    pub punishment: f64,

    #[serde(default)]
    pub ranges: Vec<ParamRange>,
}
fn _bounds__punishment() -> f64 { 1e6 }

/// ```yaml
/// - param: { pair: { types: [0, 1], name: a1 } }
///   min: 3.0
///   max: 4.5
/// ```
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ParamRange {
    pub param: ParamRef,
    pub min: f64,
    pub max: f64,
}

/// A single entry of the parameter vector.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ParamRef {
    /// Raw position in the parameter vector.
    Index(usize),
    /// A two-body or cutoff parameter for an unordered pair of types.
    Pair { types: [usize; 2], name: PairParamName },
    /// The three-body strength for a central atom of type `i` with neighbors
    /// of types `j` and `k`.
    Lambda([usize; 3]),
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PairParamName { A, B, P, Q, Delta, A1, Gamma, A2 }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Threading {
    Serial,
    /// Evaluate a process's configurations in parallel.
    Rayon,
}

// --------------------------------------------------------

impl Default for Threading {
    fn default() -> Self { Threading::Serial }
}

impl Default for ForceWeighting {
    fn default() -> Self { ForceWeighting::Absolute }
}

impl Default for Weights {
    fn default() -> Self { from_empty_mapping().unwrap() }
}

impl Default for Bounds {
    fn default() -> Self { from_empty_mapping().unwrap() }
}

fn from_empty_mapping<T: for<'de> serde::Deserialize<'de>>() -> serde_yaml::Result<T> {
    use serde_yaml::{from_value, Value, Mapping};
    from_value(Value::Mapping(Mapping::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::YamlRead;

    #[test]
    fn test_defaults() {
        // NOTE: This simply checks that `from_empty_mapping` can succeed
        //       for each type that uses it.
        let weights = Weights::default();
        assert_eq!(weights.energy, 100.0);
        assert_eq!(weights.force, ForceWeighting::Absolute);
        assert_eq!(Bounds::default().ranges, vec![]);
    }

    #[test]
    fn minimal() {
        let settings = Settings::from_reader("ntypes: 2".as_bytes()).unwrap();
        assert_eq!(settings.ntypes, 2);
        assert_eq!(settings.threading, Threading::Serial);
        assert_eq!(settings.weights, Weights::default());
        assert!(settings.stress);
    }

    #[test]
    fn everything() {
        let yaml = "
ntypes: 2
stress: false
threading: rayon
weights:
  energy: 50
  force:
    relative: {}
bounds:
  punishment: 1000
  ranges:
    - param: { index: 3 }
      min: 0
      max: 10
    - param: { pair: { types: [1, 0], name: a1 } }
      min: 2.5
      max: 4
    - param: { lambda: [0, 1, 1] }
      min: 0
      max: 50
";
        let settings = Settings::from_reader(yaml.as_bytes()).unwrap();
        assert!(!settings.stress);
        assert_eq!(settings.threading, Threading::Rayon);
        assert_eq!(settings.weights.energy, 50.0);
        assert_eq!(settings.weights.stress, 10.0);
        assert_eq!(settings.weights.force, ForceWeighting::Relative { eps: 0.1 });
        assert_eq!(settings.bounds.punishment, 1000.0);
        assert_eq!(settings.bounds.ranges[0].param, ParamRef::Index(3));
        assert_eq!(
            settings.bounds.ranges[1].param,
            ParamRef::Pair { types: [1, 0], name: PairParamName::A1 },
        );
        assert_eq!(settings.bounds.ranges[2].param, ParamRef::Lambda([0, 1, 1]));
    }

    #[test]
    fn unknown_keys_are_not_fatal() {
        // these only produce a warning
        let settings = Settings::from_reader("ntypes: 1\nwieghts: {}".as_bytes()).unwrap();
        assert_eq!(settings.weights, Weights::default());
    }

    #[test]
    fn missing_ntypes() {
        assert!(Settings::from_reader("stress: true".as_bytes()).is_err());
    }
}
