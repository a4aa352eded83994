use mobo::framework::BatchSource;

use crate::stubs::{LinearSurrogate, call_log, stubbed};
use crate::{recorded_table, zdt1};

#[test]
fn replayed_rows_come_first() {
    let problem = zdt1();
    let table = recorded_table(&problem, 18, None);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .replay(table.clone())
        .n_iter(2)
        .batch_size(6)
        .build()
        .unwrap()
        .solve_recorded(12)
        .unwrap();
    assert_eq!(run.dataset().x(), &table.x()[..12]);

    let first = run.next().unwrap().unwrap();
    assert_eq!(first.source, BatchSource::Replay);
    assert_eq!(first.x_next, table.x()[12..18].to_vec());
    assert_eq!(first.y_next, table.y()[12..18].to_vec());
    assert!(first.selection.is_none());
    assert_eq!(first.sample_num, 18);
    // The surrogate still ran for the replayed batch.
    assert_eq!(first.y_pred_mean.len(), 6);
    assert_eq!(first.acquisition.len(), 6);
    {
        let calls = log.lock();
        assert_eq!(calls.fit_attempts, 1);
        assert_eq!(calls.acquisition_fits, 1);
        assert_eq!(calls.solves, 0);
        assert_eq!(calls.selects, 0);
    }

    let second = run.next().unwrap().unwrap();
    assert_eq!(second.source, BatchSource::Solver);
    assert_eq!(log.lock().solves, 1);
    assert_eq!(second.sample_num, 21);
    assert!(run.next().is_none());
}

#[test]
fn short_tail_is_replayed_as_a_partial_batch() {
    let problem = zdt1();
    let table = recorded_table(&problem, 14, None);
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .replay(table.clone())
        .n_iter(1)
        .batch_size(6)
        .build()
        .unwrap()
        .solve_recorded(10)
        .unwrap();

    let batch = run.next().unwrap().unwrap();
    assert_eq!(batch.source, BatchSource::Replay);
    assert_eq!(batch.x_next, table.x()[10..14].to_vec());
}

#[test]
fn recorded_uncertainty_is_replayed() {
    let problem = zdt1();
    let table = recorded_table(&problem, 15, Some(0.25));
    let log = call_log();
    let mut run = stubbed(problem, &log)
        .surrogate(LinearSurrogate::new(&log).with_noise(0.1))
        .replay(table)
        .n_iter(2)
        .batch_size(3)
        .build()
        .unwrap()
        .solve_recorded(12)
        .unwrap();

    let replayed = run.next().unwrap().unwrap();
    assert_eq!(replayed.rho_next, Some(vec![vec![0.25, 0.25]; 3]));

    // ZDT1 reports no uncertainty; the prediction takes its place.
    let proposed = run.next().unwrap().unwrap();
    assert_eq!(proposed.source, BatchSource::Solver);
    assert_eq!(proposed.rho_next.map(|r| r.len()), Some(3));
    assert_eq!(run.dataset().rho().map(<[_]>::len), Some(18));
}

#[test]
fn table_larger_than_budget_never_reaches_the_solver() {
    let problem = zdt1();
    let table = recorded_table(&problem, 30, None);
    let log = call_log();
    let run = stubbed(problem, &log)
        .replay(table)
        .n_iter(2)
        .batch_size(6)
        .build()
        .unwrap()
        .solve_recorded(12)
        .unwrap();

    let sources: Vec<BatchSource> = run.map(|b| b.unwrap().source).collect();
    assert_eq!(sources, vec![BatchSource::Replay; 2]);
    assert_eq!(log.lock().solves, 0);
}
