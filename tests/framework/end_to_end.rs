use mobo::framework::{Algorithm, BatchSource, Mobo, RunState};
use mobo::pareto::{dominates, find_pareto_front};
use mobo::problem::Problem;
use mobo::problems::{Vlmop2, Zdt, ZdtKind, generate_initial_samples};
use mobo::solver::Nsga2Solver;

fn small_solver(seed: u64) -> Nsga2Solver {
    Nsga2Solver::builder()
        .population_size(24)
        .n_generations(4)
        .seed(seed)
        .build()
}

#[test]
fn gp_and_nsga2_improve_zdt1() {
    let problem = Zdt::new(ZdtKind::Zdt1, 3).unwrap();
    let init = generate_initial_samples(&problem, 10, Some(21)).unwrap();
    let mut run = Mobo::builder(problem.clone())
        .n_iter(3)
        .batch_size(2)
        .solver(small_solver(21))
        .seed(21)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();

    let mut seen = 10;
    for batch in run.by_ref() {
        let batch = batch.unwrap();
        assert_eq!(batch.source, BatchSource::Solver);
        assert!(batch.fit.is_fitted());
        assert!(!batch.x_next.is_empty() && batch.x_next.len() <= 2);
        assert!(batch.x_next.iter().all(|x| problem.bounds().contains(x)));
        assert_eq!(batch.y_next, problem.evaluate(&batch.x_next).unwrap().f);
        assert!(batch.y_pred_std.is_some());
        let info = batch.selection.unwrap();
        assert_eq!(info.indices.len(), batch.x_next.len());
        assert_eq!(info.improvements.len(), batch.x_next.len());
        seen += batch.x_next.len();
        assert_eq!(batch.sample_num, seen);
    }

    assert_eq!(run.state(), RunState::Done);
    let history = run.hypervolume_history();
    assert_eq!(history.len(), 4);
    assert!(history.windows(2).all(|w| w[1] >= w[0]));

    let status = run.status();
    for a in &status.pareto_front {
        assert!(!status.pareto_front.iter().any(|b| dominates(b, a)));
    }
    let (front, indices) = find_pareto_front(run.dataset().y());
    assert_eq!(front, status.pareto_front);
    assert_eq!(indices, status.pareto_indices);
}

#[test]
fn every_preset_completes_a_run() {
    for (i, algorithm) in Algorithm::ALL.into_iter().enumerate() {
        let seed = 40 + i as u64;
        let problem = Vlmop2::new(2).unwrap();
        let init = generate_initial_samples(&problem, 8, Some(seed)).unwrap();
        let run = Mobo::builder(problem)
            .algorithm(algorithm)
            .n_iter(2)
            .batch_size(2)
            .solver(small_solver(seed))
            .seed(seed)
            .build()
            .unwrap()
            .solve(init.x, init.y, None)
            .unwrap();

        let batches: Vec<_> = run.collect::<mobo::Result<_>>().unwrap();
        assert_eq!(batches.len(), 2, "{algorithm}");
        assert!(batches.iter().all(|b| b.hypervolume.is_finite()));
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let proposals = |seed: u64| {
        let problem = Zdt::new(ZdtKind::Zdt2, 2).unwrap();
        let init = generate_initial_samples(&problem, 8, Some(seed)).unwrap();
        Mobo::builder(problem)
            .n_iter(2)
            .batch_size(2)
            .solver(small_solver(seed))
            .seed(seed)
            .build()
            .unwrap()
            .solve(init.x, init.y, None)
            .unwrap()
            .map(|b| b.unwrap().x_next)
            .collect::<Vec<_>>()
    };
    assert_eq!(proposals(5), proposals(5));
}
