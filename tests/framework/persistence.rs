use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use mobo::framework::Mobo;
use mobo::problems::generate_initial_samples;
use mobo::solver::Nsga2Solver;

use crate::zdt1;

fn tempdir() -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("mobo-test-{}-{n}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn one_iteration() -> mobo::MoboRun {
    let problem = zdt1();
    let init = generate_initial_samples(&problem, 8, Some(2)).unwrap();
    let mut run = Mobo::builder(problem)
        .n_iter(1)
        .batch_size(2)
        .solver(
            Nsga2Solver::builder()
                .population_size(16)
                .n_generations(2)
                .seed(2)
                .build(),
        )
        .seed(2)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();
    run.next().unwrap().unwrap();
    run
}

#[cfg(feature = "serde")]
#[test]
fn nsga2_state_is_written_as_json() {
    let run = one_iteration();
    let dir = tempdir();
    let path = dir.join("model.json");
    run.save_model(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["solver"], "nsga2");
    assert_eq!(saved["version"], 1);
    let reference = saved["reference_point"].as_array().unwrap();
    assert_eq!(reference.len(), 2);
    assert!(!saved["candidates"]["x"].as_array().unwrap().is_empty());

    // No temp file is left behind.
    let leftovers = std::fs::read_dir(&dir).unwrap().count();
    assert_eq!(leftovers, 1);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[cfg(feature = "serde")]
#[test]
fn batches_serialize() {
    let problem = zdt1();
    let init = generate_initial_samples(&problem, 8, Some(4)).unwrap();
    let mut run = Mobo::builder(problem)
        .n_iter(1)
        .batch_size(2)
        .solver(Nsga2Solver::builder().population_size(16).n_generations(2).seed(4).build())
        .seed(4)
        .build()
        .unwrap()
        .solve(init.x, init.y, None)
        .unwrap();
    let batch = run.next().unwrap().unwrap();

    let json = serde_json::to_string(&batch).unwrap();
    let back: mobo::framework::Batch = serde_json::from_str(&json).unwrap();
    assert_eq!(back.x_next, batch.x_next);
    assert_eq!(back.source, batch.source);

    let config = serde_json::to_value(run.config()).unwrap();
    assert_eq!(config["algorithm"], "HvMean");
    assert_eq!(config["batch_size"], 2);
}

#[cfg(not(feature = "serde"))]
#[test]
fn saving_needs_the_serde_feature() {
    let run = one_iteration();
    let path = tempdir().join("model.json");
    assert!(matches!(
        run.save_model(&path),
        Err(mobo::Error::Storage(_))
    ));
    assert!(!path.exists());
}
