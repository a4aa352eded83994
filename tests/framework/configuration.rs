use mobo::Error;
use mobo::framework::{Algorithm, Mobo, OutcomeSource};
use mobo::problem::Problem;
use mobo::problems::ReplayTable;
use mobo::reference::ReferencePoint;
use mobo::surrogate::FitPolicy;

use crate::stubs::{call_log, stubbed};
use crate::{initial, recorded_table, zdt1};

#[test]
fn zero_batch_size_is_rejected() {
    let err = Mobo::builder(zdt1()).batch_size(0).build().err().unwrap();
    assert!(matches!(err, Error::InvalidBatchSize));
}

#[test]
fn fit_policy_without_fallback_is_rejected() {
    for primary_attempts in [0, 5] {
        let log = call_log();
        let result = stubbed(zdt1(), &log)
            .fit_policy(FitPolicy {
                primary_attempts,
                fallback_attempts: 0,
            })
            .build();
        assert!(matches!(result, Err(Error::InvalidFitPolicy(_))));
        assert_eq!(log.lock().fit_attempts, 0);
    }

    let fallback_only = FitPolicy {
        primary_attempts: 0,
        fallback_attempts: 1,
    };
    assert!(Mobo::builder(zdt1()).fit_policy(fallback_only).build().is_ok());
}

#[test]
fn fixed_reference_point_must_match_objectives() {
    let err = Mobo::builder(zdt1())
        .reference_point(ReferencePoint::Fixed(vec![1.0, 1.0, 1.0]))
        .build()
        .err()
        .unwrap();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            got: 3,
            ..
        }
    ));
}

#[test]
fn replay_table_must_match_the_problem() {
    let table = ReplayTable::new(vec![vec![0.1, 0.2, 0.3]], vec![vec![1.0, 2.0]], None).unwrap();
    let err = Mobo::builder(zdt1()).replay(table).build().err().unwrap();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            what: "replay X",
            ..
        }
    ));
}

#[test]
fn seeding_validates_initial_data() {
    let log = call_log();
    let mobo = stubbed(zdt1(), &log).build().unwrap();
    assert!(matches!(
        mobo.solve(Vec::new(), Vec::new(), None),
        Err(Error::EmptyDataset)
    ));

    let mobo = stubbed(zdt1(), &log).build().unwrap();
    assert!(matches!(
        mobo.solve(vec![vec![0.5, 0.5]], vec![vec![1.0]], None),
        Err(Error::DimensionMismatch { what: "Y", .. })
    ));

    let mobo = stubbed(zdt1(), &log).build().unwrap();
    assert!(matches!(
        mobo.solve(vec![vec![0.5]], vec![vec![1.0, 1.0]], None),
        Err(Error::DimensionMismatch { what: "X", .. })
    ));

    let mobo = stubbed(zdt1(), &log).build().unwrap();
    assert!(matches!(
        mobo.solve(
            vec![vec![0.5, 0.5], vec![0.1, 0.1]],
            vec![vec![1.0, 1.0]],
            None
        ),
        Err(Error::RowCountMismatch { .. })
    ));
    assert_eq!(log.lock().fit_attempts, 0);
}

#[test]
fn recorded_seeding_needs_a_table() {
    let log = call_log();
    let mobo = stubbed(zdt1(), &log).build().unwrap();
    assert!(matches!(mobo.solve_recorded(12), Err(Error::NoReplayTable)));
}

#[test]
fn unknown_algorithm_names_are_rejected() {
    assert_eq!("HV_LCB".parse::<Algorithm>().unwrap(), Algorithm::HvLcb);
    assert!(matches!(
        "ehvi".parse::<Algorithm>(),
        Err(Error::UnknownAlgorithm(name)) if name == "ehvi"
    ));
}

#[test]
fn presets_pick_default_collaborators() {
    let expected = [
        (Algorithm::HvLcb, "lcb", "hvi"),
        (Algorithm::HvMean, "identity", "hvi"),
        (Algorithm::RandomMean, "identity", "random"),
    ];
    for (algorithm, acquisition, selection) in expected {
        let mobo = Mobo::builder(zdt1()).algorithm(algorithm).build().unwrap();
        let config = mobo.config();
        assert_eq!(config.algorithm, algorithm);
        assert_eq!(config.surrogate, "gp");
        assert_eq!(config.acquisition, acquisition);
        assert_eq!(config.solver, "nsga2");
        assert_eq!(config.selection, selection);
    }
}

#[test]
fn config_snapshot_reflects_the_builder() {
    let table = recorded_table(&zdt1(), 20, None);
    let mobo = Mobo::builder(zdt1())
        .n_iter(7)
        .batch_size(4)
        .outcome(OutcomeSource::Predict)
        .replay(table)
        .seed(99)
        .build()
        .unwrap();
    let config = mobo.config();
    assert_eq!(config.problem, "zdt1");
    assert_eq!(config.n_iter, 7);
    assert_eq!(config.batch_size, 4);
    assert_eq!(config.outcome, OutcomeSource::Predict);
    assert_eq!(config.replay_rows, Some(20));
    assert_eq!(config.seed, Some(99));
    assert!(mobo.to_string().contains("replay:      20 rows"));
}

#[test]
fn problem_is_kept_by_the_framework() {
    let problem = zdt1();
    let init = initial(&problem, 4);
    let mobo = Mobo::builder(problem).build().unwrap();
    assert_eq!(mobo.problem().n_var(), 2);
    assert_eq!(mobo.problem().evaluate(&init.x).unwrap().f, init.y);
}
