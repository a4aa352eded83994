use mobo::framework::RunState;
use mobo::reference::ReferencePoint;

use crate::stubs::{call_log, stubbed};
use crate::{initial, zdt1};

#[test]
fn nothing_runs_before_next() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mobo = stubbed(problem, &log).n_iter(2).batch_size(3).build().unwrap();

    let mut run = mobo.solve(init.x, init.y, None).unwrap();
    assert_eq!(run.state(), RunState::Ready);
    {
        let calls = log.lock();
        assert_eq!(calls.fit_attempts, 0);
        assert_eq!(calls.acquisition_fits, 0);
        assert_eq!(calls.solves, 0);
        assert_eq!(calls.selects, 0);
    }

    run.next().unwrap().unwrap();
    let calls = log.lock();
    assert_eq!(calls.fit_attempts, 1);
    assert_eq!(calls.acquisition_fits, 1);
    assert_eq!(calls.solves, 1);
    assert_eq!(calls.selection_fits, 1);
    assert_eq!(calls.selects, 1);
}

#[test]
fn states_follow_the_budget() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(2)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    assert_eq!(run.size_hint(), (0, Some(2)));
    run.next().unwrap().unwrap();
    assert_eq!(run.state(), RunState::Iterating(1));
    assert_eq!(run.iteration(), 1);
    assert_eq!(run.size_hint(), (0, Some(1)));

    run.next().unwrap().unwrap();
    assert_eq!(run.state(), RunState::Done);
    assert_eq!(run.size_hint(), (0, Some(0)));

    // Fused: a finished run stays finished.
    for _ in 0..3 {
        assert!(run.next().is_none());
    }
    assert_eq!(run.iteration(), 2);
    assert_eq!(log.lock().solves, 2);
}

#[test]
fn zero_budget_finishes_immediately() {
    let problem = zdt1();
    let init = initial(&problem, 6);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(0)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    assert!(run.next().is_none());
    assert_eq!(run.state(), RunState::Done);
    assert_eq!(run.hypervolume_history().len(), 1);
    assert_eq!(log.lock().fit_attempts, 0);
}

#[test]
fn reference_point_reaches_solver_and_selection() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let run = stubbed(problem, &log)
        .reference_point(ReferencePoint::Fixed(vec![11.0, 12.0]))
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    assert_eq!(run.reference_point(), &[11.0, 12.0]);
    assert_eq!(log.lock().ref_points, vec![vec![11.0, 12.0]; 2]);
}

#[test]
fn inferred_reference_point_is_worse_than_every_row() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let run = stubbed(problem, &log)
        .build()
        .unwrap()
        .solve(init.x, init.y.clone(), None)
        .unwrap();

    let reference = run.reference_point();
    for row in &init.y {
        assert!(
            row.iter().zip(reference).all(|(v, r)| v < r),
            "{row:?} does not dominate {reference:?}"
        );
    }
    assert!(run.status().hypervolume > 0.0);
}

#[test]
fn reference_point_stays_fixed_across_iterations() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(2)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let before = run.reference_point().to_vec();
    while let Some(batch) = run.next() {
        batch.unwrap();
        assert_eq!(run.reference_point(), before.as_slice());
    }
}

#[test]
fn description_names_every_component() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mobo = stubbed(problem, &log).n_iter(4).batch_size(3).build().unwrap();

    let text = mobo.to_string();
    for needle in ["zdt1", "linear", "mean", "fixed", "take-first", "4 x 3"] {
        assert!(text.contains(needle), "missing {needle} in\n{text}");
    }

    let mut run = mobo.solve(init.x, init.y, None).unwrap();
    run.next().unwrap().unwrap();
    assert!(run.to_string().contains("1/4 iterations, 15 samples"));
}

#[test]
fn stateless_solver_saves_nothing() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let run = stubbed(problem, &log)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let path = std::env::temp_dir().join(format!("mobo-stub-{}.json", std::process::id()));
    run.save_model(&path).unwrap();
    assert!(!path.exists());
}
