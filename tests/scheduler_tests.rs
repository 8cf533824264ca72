//! Task scheduler, semaphore, arena and profiler tests
//!
//! Tests for:
//! - Dependency-ordered execution and sync-point fan-in
//! - Dynamically spawned worker tasks joining the frame fence
//! - The fatal path poisoning the fence
//! - Semaphore acquire contract
//! - Frame arena reset points and the memory profiler

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keel::memory::{AllocationSubsystem, FrameArena, MemoryProfiler};
use keel::tasks::{Semaphore, Task, TaskScheduler};

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn tasks_run_after_their_inputs() {
    let scheduler = TaskScheduler::new(4);
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let fence = scheduler.begin_frame();

    let first_order = Arc::clone(&order);
    let first = Task::new("first", move || {
        first_order.lock().push(1);
        Ok(())
    });

    let second_order = Arc::clone(&order);
    let second = Task::new("second", move || {
        second_order.lock().push(2);
        Ok(())
    });

    let third_order = Arc::clone(&order);
    let third = Task::new("third", move || {
        third_order.lock().push(3);
        Ok(())
    });

    second.add_input_dependency(&first);
    third.add_input_dependency(&second);

    // Enqueue in reverse to prove dependencies, not submission order, rule.
    scheduler.enqueue_all(&[&third, &second, &first]);
    assert!(fence.wait());

    assert_eq!(*order.lock(), vec![1, 2, 3]);
}

#[test]
fn noop_tasks_act_as_sync_points() {
    let scheduler = TaskScheduler::new(4);
    let counter = Arc::new(AtomicUsize::new(0));

    let fence = scheduler.begin_frame();

    let end = Task::noop("end");
    for _ in 0..8 {
        let worker_counter = Arc::clone(&counter);
        let worker = Task::new("worker", move || {
            worker_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        worker.add_output_dependencies(&[&end]);
        scheduler.enqueue(&worker);
    }

    let after_counter = Arc::clone(&counter);
    let after = Task::new("after", move || {
        // All eight workers completed before the sync point released us.
        assert_eq!(after_counter.load(Ordering::SeqCst), 8);
        Ok(())
    });
    after.add_input_dependency(&end);

    scheduler.enqueue_all(&[&end, &after]);
    assert!(fence.wait());
    assert_eq!(counter.load(Ordering::SeqCst), 8);
}

#[test]
fn begin_task_spawns_workers_that_finish_before_end() {
    // The resource-manager shape: begin enqueues workers feeding the end
    // sync point, all within one frame fence.
    let scheduler = TaskScheduler::new(4);
    let counter = Arc::new(AtomicUsize::new(0));

    let fence = scheduler.begin_frame();

    let end = Task::noop("end");
    let begin_scheduler = Arc::clone(&scheduler);
    let begin_end = end.clone();
    let begin_counter = Arc::clone(&counter);
    let begin = Task::new("begin", move || {
        for _ in 0..16 {
            let worker_counter = Arc::clone(&begin_counter);
            let worker = Task::new("worker", move || {
                worker_counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            worker.add_output_dependencies(&[&begin_end]);
            begin_scheduler.enqueue(&worker);
        }
        Ok(())
    });
    begin.add_output_dependency(&end);

    scheduler.enqueue_all(&[&begin, &end]);
    assert!(fence.wait());
    assert_eq!(counter.load(Ordering::SeqCst), 16);
}

#[test]
fn failed_task_poisons_the_fence() {
    let scheduler = TaskScheduler::new(2);

    let fence = scheduler.begin_frame();
    let failing = Task::new("failing", || {
        Err(keel::KeelError::Invariant("intentional".to_owned()))
    });
    scheduler.enqueue(&failing);

    assert!(!fence.wait());
}

#[test]
fn dependency_on_completed_task_adds_no_edge() {
    let scheduler = TaskScheduler::new(2);

    let fence = scheduler.begin_frame();
    let first = Task::new("first", || Ok(()));
    scheduler.enqueue(&first);
    assert!(fence.wait());

    // `first` already completed; the new frame's task must still run.
    let fence = scheduler.begin_frame();
    let second = Task::new("second", || Ok(()));
    second.add_input_dependency(&first);
    scheduler.enqueue(&second);
    assert!(fence.wait());
}

// ============================================================================
// Semaphore
// ============================================================================

#[test]
fn try_acquire_returns_true_iff_acquired() {
    let semaphore = Semaphore::new(1);

    assert!(semaphore.try_acquire());
    assert!(!semaphore.try_acquire());

    semaphore.release();
    assert!(semaphore.try_acquire());
}

#[test]
fn semaphore_blocks_until_released() {
    let semaphore = Arc::new(Semaphore::new(0));
    let released = Arc::new(AtomicUsize::new(0));

    let thread_semaphore = Arc::clone(&semaphore);
    let thread_released = Arc::clone(&released);
    let handle = std::thread::spawn(move || {
        thread_semaphore.acquire();
        thread_released.load(Ordering::SeqCst)
    });

    std::thread::sleep(std::time::Duration::from_millis(20));
    released.store(1, Ordering::SeqCst);
    semaphore.release();

    assert_eq!(handle.join().unwrap(), 1);
}

// ============================================================================
// Frame arena
// ============================================================================

#[test]
fn arena_reset_point_reclaims_allocations() {
    let mut arena = FrameArena::with_capacity(4096);

    {
        let frame = arena.reset();
        let values = frame.alloc_slice_copy(&[1u32, 2, 3, 4]);
        assert_eq!(values, &[1, 2, 3, 4]);
        assert!(frame.allocated_bytes() >= 16);
    }

    // Everything allocated inside the reset point is gone.
    assert_eq!(arena.allocated_bytes(), 0);

    let frame = arena.reset();
    let text = frame.alloc_str("transient");
    assert_eq!(text, "transient");
}

#[test]
#[should_panic(expected = "Frame arena overflow")]
fn arena_overflow_is_fatal() {
    let mut arena = FrameArena::with_capacity(64);
    let frame = arena.reset();
    let _ = frame.alloc_slice_copy(&[0u8; 256]);
}

// ============================================================================
// Memory profiler
// ============================================================================

#[test]
fn profiler_tracks_named_allocations_when_enabled() {
    let profiler = MemoryProfiler::instance();
    profiler.set_enabled(true);

    profiler.allocate(0x1000, 256, AllocationSubsystem::Render, Some("streams"));
    profiler.allocate(0x2000, 64, AllocationSubsystem::Other, None);

    let dump = profiler.dump();
    assert!(dump.total_for(AllocationSubsystem::Render) >= 256);

    profiler.deallocate(0x1000);
    profiler.deallocate(0x2000);
    profiler.set_enabled(false);
}
