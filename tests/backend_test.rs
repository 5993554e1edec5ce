use std::collections::HashSet;
use std::ops::Range;
use std::sync::Mutex;
use std::thread;

use par_conv::backend::{Backend, BackendKind, RayonPool, ScopedThreads, WorkerOutcome, WorkerTask};
use par_conv::convolution::{convolve_parallel_with, convolve_serial};
use par_conv::error::{ConvolutionError, WorkerFault};
use par_conv::signal::generate_seeded_vector;

#[cfg(test)]
mod backend_tests {
    use super::*;

    /// Runs each task on its own thread and records which worker got which range
    /// and which OS thread ran it.
    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<(usize, Range<usize>, thread::ThreadId)>>,
    }

    impl Backend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome> {
            thread::scope(|s| {
                let handles: Vec<_> = tasks
                    .into_iter()
                    .map(|task| {
                        s.spawn(move || {
                            let (worker, range) = (task.worker, task.range.clone());
                            task.run();
                            self.seen.lock().unwrap().push((worker, range, thread::current().id()));
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().map_err(|_| WorkerFault::Join("panic".into()))).collect()
            })
        }
    }

    /// Pretends the OS refused to start one worker.
    struct RefusesWorker(usize);

    impl Backend for RefusesWorker {
        fn name(&self) -> &'static str {
            "refuses"
        }

        fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome> {
            tasks
                .into_iter()
                .map(|task| {
                    if task.worker == self.0 {
                        Err(WorkerFault::Launch("resource exhausted".to_string()))
                    } else {
                        task.run();
                        Ok(())
                    }
                })
                .collect()
        }
    }

    /// Drops every outcome, as a broken backend might.
    struct ForgetsOutcomes;

    impl Backend for ForgetsOutcomes {
        fn name(&self) -> &'static str {
            "forgets"
        }

        fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome> {
            for task in tasks {
                task.run();
            }
            Vec::new()
        }
    }

    #[test]
    fn test_partition_coverage_recorded() {
        for &(n, m) in &[(1, 1), (10, 3), (100, 10), (1000, 10)] {
            for &threads in &[1, 2, 3, 4, 8, 16, 5000] {
                let backend = RecordingBackend::default();
                let x = generate_seeded_vector(n, 11);
                let h = generate_seeded_vector(m, 12);

                let result = convolve_parallel_with(&backend, &x, &h, threads).unwrap();
                assert_eq!(result, convolve_serial(&x, &h).unwrap());

                let seen = backend.seen.into_inner().unwrap();
                let out_len = n + m - 1;
                assert_eq!(seen.len(), threads.min(out_len));

                let mut touched = vec![None; out_len];
                for (worker, range, _) in &seen {
                    for i in range.clone() {
                        assert!(touched[i].is_none(), "index {} owned by two workers", i);
                        touched[i] = Some(*worker);
                    }
                }
                assert!(touched.iter().all(|t| t.is_some()), "gap in coverage n={} t={}", n, threads);

                let threads_used: HashSet<_> = seen.iter().map(|(_, _, id)| *id).collect();
                assert_eq!(threads_used.len(), seen.len());
            }
        }
    }

    #[test]
    fn test_last_worker_takes_remainder() {
        let backend = RecordingBackend::default();
        // 8 + 3 - 1 = 10 outputs over 3 workers
        convolve_parallel_with(&backend, &[1.0; 8], &[1.0; 3], 3).unwrap();

        let mut seen = backend.seen.into_inner().unwrap();
        seen.sort_by_key(|(worker, _, _)| *worker);
        let ranges: Vec<_> = seen.into_iter().map(|(_, r, _)| r).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_launch_failure_is_reported_not_zero_filled() {
        let x = generate_seeded_vector(100, 1);
        let h = generate_seeded_vector(10, 2);

        // 109 outputs, 4 workers of 27 with the last taking 28
        let err = convolve_parallel_with(&RefusesWorker(1), &x, &h, 4).unwrap_err();
        match &err {
            ConvolutionError::Incomplete { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].worker, 1);
                assert_eq!(failures[0].range, 27..54);
                assert_eq!(failures[0].fault, WorkerFault::Launch("resource exhausted".to_string()));
            }
            other => panic!("expected Incomplete, got {:?}", other),
        }
        assert_eq!(err.missing(), vec![27..54]);
        assert!(err.to_string().contains("27..54"));
    }

    #[test]
    fn test_missing_outcomes_count_as_failures() {
        let err = convolve_parallel_with(&ForgetsOutcomes, &[1.0; 4], &[1.0; 2], 2).unwrap_err();
        assert_eq!(err.missing(), vec![0..2, 2..5]);
    }

    #[test]
    fn test_scoped_threads_report_panics_as_join_faults() {
        let tasks = vec![
            WorkerTask::new(0, 0..1, || {}),
            WorkerTask::new(1, 1..2, || panic!("worker blew up")),
            WorkerTask::new(2, 2..3, || {}),
        ];
        let outcomes = ScopedThreads.fork_join(tasks);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1], Err(WorkerFault::Join("worker blew up".to_string())));
        assert!(outcomes[2].is_ok());
    }

    #[test]
    fn test_rayon_pool_reports_panics_as_join_faults() {
        let tasks = vec![
            WorkerTask::new(0, 0..1, || panic!("{} failed", "rayon worker")),
            WorkerTask::new(1, 1..2, || {}),
        ];
        let outcomes = RayonPool.fork_join(tasks);

        assert_eq!(outcomes[0], Err(WorkerFault::Join("rayon worker failed".to_string())));
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn test_fork_join_waits_for_every_task() {
        for backend in [BackendKind::Threads.backend(), BackendKind::Rayon.backend()] {
            let mut slots = vec![0usize; 6];
            let tasks: Vec<_> = slots
                .iter_mut()
                .enumerate()
                .map(|(i, slot)| {
                    WorkerTask::new(i, i..i + 1, move || {
                        thread::sleep(std::time::Duration::from_millis(5));
                        *slot = i + 1;
                    })
                })
                .collect();

            let outcomes = backend.fork_join(tasks);
            assert!(outcomes.iter().all(|o| o.is_ok()));
            assert_eq!(slots, vec![1, 2, 3, 4, 5, 6], "{} backend", backend.name());
        }
    }

    #[test]
    fn test_empty_task_list() {
        assert!(ScopedThreads.fork_join(Vec::new()).is_empty());
        assert!(RayonPool.fork_join(Vec::new()).is_empty());
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("threads".parse::<BackendKind>().unwrap(), BackendKind::Threads);
        assert_eq!("Rayon".parse::<BackendKind>().unwrap(), BackendKind::Rayon);
        assert!("openmp".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Rayon.to_string(), "rayon");
        assert_eq!(BackendKind::default(), BackendKind::Threads);
    }
}
