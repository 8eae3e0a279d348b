#[macro_use] extern crate swfit_assert_close;

use std::thread;

use swfit::array_types::V3;
use swfit::potentials::geometry::{build_configuration, Structure};
use swfit::potentials::stiweb::params::{CutoffParam, PairParam, ParamShape};
use swfit::potentials::Configuration;
use swfit::worker::{SerialComm, ThreadComm, NAN_SENTINEL};
use swfit::{start, Objective, Role, ValidatedSettings, YamlRead};

mod shared;
use self::shared::{random_cluster, run_group};

fn settings(yaml: &str) -> ValidatedSettings {
    ValidatedSettings::from_reader(yaml.as_bytes()).unwrap()
}

fn serial_objective(settings: &ValidatedSettings, confs: Vec<Configuration>) -> Objective<SerialComm> {
    match start(SerialComm, settings, confs).unwrap() {
        Role::Root(objective) => objective,
        Role::Member(_) => unreachable!(),
    }
}

// Two atoms of one type, 2 apart, with:
//
//   phi_r = A r^-p = 0.25,   phi_a = -B r^-q = 0.25,   no envelope (delta = 0)
//
// so v2 = 0.5, dv2/dr = -0.5, and no three-body term.
fn dimer() -> (Configuration, Vec<f64>) {
    let structure = Structure {
        lattice: None,
        positions: vec![V3([0.0, 0.0, 0.0]), V3([2.0, 0.0, 0.0])],
        types: vec![0, 0],
        ntypes: 1,
    };
    let mut conf = build_configuration(&structure, 3.0).unwrap();
    conf.reference_energy = 0.1;

    let shape = ParamShape::new(1);
    let mut params = vec![0.0; shape.len()];
    for &(param, value) in &[
        (PairParam::A, 1.0), (PairParam::B, -1.0),
        (PairParam::P, 2.0), (PairParam::Q, 2.0),
        (PairParam::Delta, 0.0), (PairParam::A1, 3.0),
    ] {
        params[shape.pair_index(0, param)] = value;
    }
    params[shape.cutoff_index(0, CutoffParam::Gamma)] = 1.0;
    params[shape.cutoff_index(0, CutoffParam::A2)] = 3.0;
    params[shape.lambda_index(0, 0, 0)] = 0.0;
    (conf, params)
}

#[test]
fn dimer_scenario() {
    let (conf, mut params) = dimer();
    let natoms = conf.num_atoms() as f64;
    let mut objective = serial_objective(&settings("ntypes: 1"), vec![conf]);

    let value = objective.value(&mut params);
    let layout = objective.force_layout();
    let forces = objective.forces();

    // repulsive, along the bond
    assert_close!(abs=1e-12, &forces[0..3], &[-0.5, 0.0, 0.0][..]);
    assert_close!(abs=1e-12, &forces[3..6], &[0.5, 0.0, 0.0][..]);

    // the energy slot holds the per-atom deviation
    let energy = forces[layout.energy_p()];
    assert_close!(abs=1e-12, natoms * (energy + 0.1), 0.25 + 0.25);

    // clusters have no stress
    assert_eq!(&forces[layout.stress_p()..layout.punish_p()], &[0.0; 6][..]);

    let expected = 0.25 + 0.25 + 100.0 * (0.25 - 0.1) * (0.25 - 0.1);
    assert_close!(rel=1e-12, value, expected);
    assert_eq!(objective.fcalls(), 1);
}

#[test]
fn dimer_scenario_with_idle_process() {
    let (conf, params) = dimer();
    let settings = settings("ntypes: 1");
    let expected = serial_objective(&settings, vec![conf.clone()]).value(&mut params.clone());

    // the second process owns no configurations at all
    let outcome = run_group(2, &settings, vec![conf], vec![params]);
    assert_close!(rel=1e-12, outcome.values[0], expected);
}

#[test]
fn nan_is_reported_as_sentinel() {
    let (conf, mut params) = dimer();
    params[ParamShape::new(1).pair_index(0, PairParam::P)] = std::f64::NAN;

    let mut objective = serial_objective(&settings("ntypes: 1"), vec![conf]);
    assert_eq!(objective.value(&mut params), NAN_SENTINEL);
    assert_eq!(objective.fcalls(), 1);
}

#[test]
fn partition_invariance() {
    let settings = settings("
ntypes: 2
weights:
  force:
    relative: {}
bounds:
  ranges:
    - { param: { pair: { types: [0, 1], name: a } }, min: 100, max: 200 }
");
    let confs: Vec<_> = (0..6).map(|h| random_cluster(3 + h % 4, 2)).collect();
    let param_sets: Vec<_> = (0..3).map(|_| shared::random_params(2)).collect();

    let serial = run_group(1, &settings, confs.clone(), param_sets.clone());
    for &nprocs in &[2, 4] {
        let split = run_group(nprocs, &settings, confs.clone(), param_sets.clone());
        for (a, b) in split.values.iter().zip(&serial.values) {
            assert_close!(rel=1e-11, *a, *b, "{} processes", nprocs);
        }
        for (a, b) in split.forces.iter().zip(&serial.forces) {
            assert_close!(rel=1e-11, abs=1e-11, &a[..], &b[..], "{} processes", nprocs);
        }
    }
}

#[test]
fn members_leave_when_root_is_done() {
    let settings = settings("ntypes: 1");
    let confs: Vec<_> = (0..3).map(|_| random_cluster(4, 1)).collect();

    let handles: Vec<_> = ThreadComm::group(3).into_iter().map(|comm| {
        let (settings, confs) = (settings.clone(), confs.clone());
        thread::spawn(move || match start(comm, &settings, confs).unwrap() {
            // no evaluations at all
            Role::Root(objective) => objective.finish(),
            Role::Member(member) => member.run(),
        })
    }).collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
