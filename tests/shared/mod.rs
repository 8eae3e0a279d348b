//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::thread;

use swfit::array_types::V3;
use swfit::potentials::geometry::{build_configuration, Structure};
use swfit::potentials::stiweb::{PairParams, ParamSet};
use swfit::potentials::Configuration;
use swfit::worker::ThreadComm;
use swfit::{start, Role, ValidatedSettings};

/// Large enough for every parameter set produced by `random_params`.
pub const MAX_CUTOFF: f64 = 3.8;

pub fn uniform(a: f64, b: f64) -> f64 { rand::random::<f64>() * (b - a) + a }

fn random_v3(a: f64, b: f64) -> V3 { V3::from_fn(|_| uniform(a, b)) }

/// An isolated cluster built on a jittered cubic grid, so that no two atoms get
/// unreasonably close, with random reference data.
pub fn random_cluster(natoms: usize, ntypes: usize) -> Configuration {
    let structure = Structure {
        lattice: None,
        positions: (0..natoms).map(|i| {
            let site = V3([(i % 2) as f64, (i / 2 % 2) as f64, (i / 4) as f64]);
            site * 2.2 + random_v3(-0.2, 0.2)
        }).collect(),
        types: (0..natoms).map(|_| rand::random::<usize>() % ntypes).collect(),
        ntypes,
    };

    let mut conf = build_configuration(&structure, MAX_CUTOFF).unwrap();
    conf.reference_energy = uniform(-4.0, -2.0);
    conf.set_reference_forces(&(0..natoms).map(|_| random_v3(-1.0, 1.0)).collect::<Vec<_>>());
    conf.weight = uniform(0.5, 2.0);
    conf
}

/// Perturbed silicon parameters for every column and triple.
pub fn random_params(ntypes: usize) -> Vec<f64> {
    let mut set = ParamSet::uniform(ntypes, PairParams::silicon(), PairParams::SILICON_LAMBDA);
    for pair in &mut set.pairs {
        pair.A *= uniform(0.9, 1.1);
        pair.B *= uniform(0.9, 1.1);
        pair.delta *= uniform(0.9, 1.1);
        pair.a1 = uniform(3.0, MAX_CUTOFF - 0.1);
        pair.gamma *= uniform(0.9, 1.1);
        pair.a2 = uniform(3.0, MAX_CUTOFF - 0.1);
    }
    for lambda in &mut set.lambda {
        *lambda *= uniform(0.5, 1.5);
    }
    set.to_flat()
}

pub struct Outcome {
    pub values: Vec<f64>,
    pub forces: Vec<Vec<f64>>,
}

/// Evaluate each parameter vector in turn on a group of `nprocs` threads.
pub fn run_group(
    nprocs: usize,
    settings: &ValidatedSettings,
    confs: Vec<Configuration>,
    param_sets: Vec<Vec<f64>>,
) -> Outcome {
    let handles: Vec<_> = ThreadComm::group(nprocs).into_iter().map(|comm| {
        let (settings, confs, param_sets) = (settings.clone(), confs.clone(), param_sets.clone());
        thread::spawn(move || match start(comm, &settings, confs).unwrap() {
            Role::Root(mut objective) => {
                let mut outcome = Outcome { values: vec![], forces: vec![] };
                for mut params in param_sets {
                    outcome.values.push(objective.value(&mut params));
                    outcome.forces.push(objective.forces().to_vec());
                }
                Some(outcome)
            },
            Role::Member(member) => {
                member.run();
                None
            },
        })
    }).collect();

    let mut outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    outcomes.swap_remove(0).expect("rank 0 is the root")
}
