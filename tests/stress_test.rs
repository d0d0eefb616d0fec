//! Stress tests for the taskwell pool.

use parking_lot::Mutex;
use std::sync::Arc;
use taskwell::{Error, Pool};

#[test]
#[ignore] // Run with --ignored flag
fn stress_many_small_tasks() {
    let pool = Pool::new_with(8, 0).unwrap();

    let handles: Vec<_> = (0..50_000u64)
        .map(|i| pool.submit(move || i * 2).unwrap())
        .collect();

    let mut sum = 0u64;
    for handle in &handles {
        sum += handle.get().unwrap();
    }

    assert_eq!(sum, (0..50_000u64).map(|i| i * 2).sum::<u64>());
    assert_eq!(pool.completed_count(), 50_000);
}

#[test]
#[ignore]
fn stress_bounded_queue_contention() {
    let pool = Arc::new(Pool::new_with(4, 16).unwrap());
    let results = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..8)
        .map(|p| {
            let pool = pool.clone();
            let results = results.clone();
            std::thread::spawn(move || {
                for i in 0..1_000 {
                    let handle = pool.submit(move || p * 1_000 + i).unwrap();
                    results.lock().push(handle);
                }
            })
        })
        .collect();
    for t in producers {
        t.join().unwrap();
    }

    for handle in results.lock().iter() {
        handle.get().unwrap();
    }
    assert_eq!(pool.completed_count(), 8_000);
}

#[test]
#[ignore]
fn stress_panicking_tasks_do_not_wedge_pool() {
    let pool = Pool::new_with(4, 0).unwrap();

    let handles: Vec<_> = (0..10_000u32)
        .map(|i| {
            pool.submit(move || {
                if i % 7 == 0 {
                    panic!("scripted failure");
                }
                i
            })
            .unwrap()
        })
        .collect();

    let mut failed = 0;
    for handle in &handles {
        match handle.get() {
            Ok(_) => {}
            Err(Error::TaskPanicked(_)) => failed += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(failed, (0..10_000u32).filter(|i| i % 7 == 0).count());
    assert_eq!(pool.failed_count(), failed as u64);
}

#[test]
#[ignore]
fn stress_pool_churn() {
    for _ in 0..100 {
        let pool = Pool::new_with(2, 8).unwrap();
        let handles: Vec<_> = (0..32).map(|i| pool.submit(move || i).unwrap()).collect();
        pool.shutdown();
        pool.await_termination(None).unwrap();
        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(handle.get(), Ok(i));
        }
    }
}
