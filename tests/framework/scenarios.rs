use mobo::framework::{BatchSource, OutcomeSource, RunState};
use mobo::problem::{Bounds, FnProblem};
use mobo::surrogate::FitOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::stubs::{LinearSurrogate, call_log, fixed_candidates, stubbed};
use crate::{assert_rows_close, initial, zdt1};

#[test]
fn fixed_batches_grow_the_dataset() {
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
    assert_eq!(run.sample_num(), 12);

    let first = run.next().unwrap().unwrap();
    assert_eq!(first.iteration, 0);
    assert_eq!(first.source, BatchSource::Solver);
    assert_eq!(first.sample_num, 15);
    assert_eq!(run.sample_num(), 15);
    assert_rows_close(&first.x_next, &fixed_candidates());

    let second = run.next().unwrap().unwrap();
    assert_eq!(second.sample_num, 18);
    assert_eq!(run.dataset().x().len(), 18);
    assert_eq!(run.dataset().y().len(), 18);

    assert!(run.next().is_none());
    let history = run.hypervolume_history();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[1] >= w[0]), "{history:?}");
    assert_eq!(history[2], run.status().hypervolume);
}

#[test]
fn proposed_rows_are_evaluated_by_the_problem() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(1)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let batch = run.next().unwrap().unwrap();
    // ZDT1 with g = 1 along the x0 axis.
    let expected: Vec<Vec<f64>> = [0.0_f64, 0.5, 1.0]
        .iter()
        .map(|&f1| vec![f1, 1.0 - f1.sqrt()])
        .collect();
    assert_rows_close(&batch.y_next, &expected);
    assert!(batch.rho_next.is_none());
    assert!(batch.constraints.is_none());
    assert_eq!(batch.y_pred_mean.len(), 3);
    assert_eq!(batch.acquisition.len(), 3);
    assert!(batch.y_pred_std.is_some());
    assert_eq!(
        batch.selection.map(|s| s.indices),
        Some(vec![0, 1, 2])
    );
    assert!(matches!(batch.fit, FitOutcome::Fitted { attempts: 1, .. }));
}

#[test]
fn batch_is_capped_by_candidate_count() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(1)
        .batch_size(6)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let batch = run.next().unwrap().unwrap();
    assert_eq!(batch.x_next.len(), 3);
    assert_eq!(run.sample_num(), 15);
}

#[test]
fn stale_model_keeps_the_loop_going() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .surrogate(LinearSurrogate::failing_after(&log, 1))
        .n_iter(2)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    assert!(run.next().unwrap().unwrap().fit.is_fitted());
    let second = run.next().unwrap().unwrap();
    assert!(matches!(second.fit, FitOutcome::Stale { attempts: 6, .. }));
    assert_eq!(second.sample_num, 18);
    assert_eq!(log.lock().fit_attempts, 7);
}

#[test]
fn failed_first_fit_ends_the_run() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .surrogate(LinearSurrogate::failing_after(&log, 0))
        .fit_policy(mobo::surrogate::FitPolicy {
            primary_attempts: 2,
            fallback_attempts: 1,
        })
        .n_iter(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let err = run.next().unwrap().unwrap_err();
    assert!(matches!(err, mobo::Error::NoUsableModel(_)));
    assert_eq!(run.state(), RunState::Done);
    assert!(run.next().is_none());
    assert_eq!(log.lock().fit_attempts, 3);
    assert_eq!(log.lock().solves, 0);
    assert_eq!(run.sample_num(), 12);
}

#[test]
fn predicted_outcomes_skip_the_problem() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluations);
    let problem = FnProblem::new("counted", Bounds::unit(2), 2, move |x: &[f64]| {
        counter.fetch_add(1, Ordering::Relaxed);
        vec![x[0], 1.0 - x[0] + x[1]]
    });
    let init = initial(&problem, 12);
    let before = evaluations.load(Ordering::Relaxed);

    let log = call_log();
    let mut run = stubbed(problem, &log)
        .surrogate(LinearSurrogate::new(&log).with_noise(0.2))
        .outcome(OutcomeSource::Predict)
        .n_iter(1)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let batch = run.next().unwrap().unwrap();
    assert_eq!(evaluations.load(Ordering::Relaxed), before);
    assert_eq!(batch.y_next, batch.y_pred_mean);
    let rho = batch.rho_next.unwrap();
    assert_eq!(rho.len(), 3);
    assert!(rho.iter().flatten().all(|&v| v > 0.0));
}

#[test]
fn predicted_noise_fills_missing_uncertainty() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let rho_init = vec![vec![0.05, 0.05]; 12];
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .surrogate(LinearSurrogate::new(&log).with_noise(0.1))
        .n_iter(1)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, Some(rho_init))
        .unwrap();

    let batch = run.next().unwrap().unwrap();
    assert_eq!(batch.rho_next.map(|r| r.len()), Some(3));
    assert_eq!(run.dataset().rho().map(<[_]>::len), Some(15));
}

#[test]
fn missing_uncertainty_fails_when_rho_is_tracked() {
    let problem = zdt1();
    let init = initial(&problem, 12);
    let rho_init = vec![vec![0.05, 0.05]; 12];
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .n_iter(2)
        .batch_size(3)
        .build()
        .unwrap()
        .solve(init.x, init.y, Some(rho_init))
        .unwrap();

    assert!(matches!(
        run.next(),
        Some(Err(mobo::Error::MissingRho))
    ));
    assert_eq!(run.sample_num(), 12);
    assert!(run.next().is_none());
}
