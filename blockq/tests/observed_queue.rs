//! Queues with observers attached.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use blockq::QueueConfig;
use blockq::sync::{Capacity, CountingObserver, Queue, QueueObserver, TracingObserver};

/// Records every event in order.
#[derive(Default)]
struct AuditLog {
    events: Mutex<Vec<String>>,
}

impl AuditLog {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl QueueObserver<u32> for AuditLog {
    fn on_push(&self, item: &u32) {
        self.record(format!("push {item}"));
    }

    fn on_pop(&self, item: &u32) {
        self.record(format!("pop {item}"));
    }

    fn on_close(&self) {
        self.record("close".to_string());
    }
}

#[test]
fn audit_observer_sees_events_in_order() {
    let log = Arc::new(AuditLog::default());
    let queue = Queue::<u32, _>::with_observer(Capacity::bounded(2).unwrap(), Arc::clone(&log));

    assert!(queue.push(1));
    assert!(queue.push(2));
    assert!(!queue.try_push(3, Duration::ZERO));
    assert_eq!(queue.pop(), Some(1));
    queue.close();
    assert!(!queue.push(4));
    assert_eq!(queue.pop(), Some(2));
    assert_eq!(queue.pop(), None);

    assert_eq!(
        log.events(),
        ["push 1", "push 2", "pop 1", "close", "pop 2"]
    );

    drop(queue);
    assert_eq!(log.events().len(), 5, "drop of a closed queue fires no hook");
}

#[test]
fn counting_observer_matches_concurrent_traffic() {
    const PRODUCERS: u64 = 4;
    const ITEMS_PER_PRODUCER: u64 = 250;

    let stats = Arc::new(CountingObserver::new());
    let queue = Arc::new(Queue::<u64, _>::with_observer(
        Capacity::bounded(8).unwrap(),
        Arc::clone(&stats),
    ));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    assert!(queue.push(p * ITEMS_PER_PRODUCER + i));
                }
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut popped = 0;
            while queue.pop().is_some() {
                popped += 1;
            }
            popped
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    queue.close();

    assert_eq!(consumer.join().unwrap(), PRODUCERS * ITEMS_PER_PRODUCER);

    let seen = stats.stats();
    assert_eq!(seen.pushed, PRODUCERS * ITEMS_PER_PRODUCER);
    assert_eq!(seen.popped, PRODUCERS * ITEMS_PER_PRODUCER);
    assert_eq!(seen.closed, 1);
    assert_eq!(seen.in_flight(), 0);
}

#[test]
fn hooks_run_while_queue_is_locked() {
    /// Flags whether a push hook ever saw another push hook in flight.
    #[derive(Default)]
    struct Exclusive {
        inside: AtomicBool,
        overlapped: AtomicBool,
    }

    impl QueueObserver<usize> for Exclusive {
        fn on_push(&self, _item: &usize) {
            if self.inside.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            thread::yield_now();
            self.inside.store(false, Ordering::SeqCst);
        }
    }

    let queue = Arc::new(Queue::<usize, _>::with_observer(
        Capacity::Unbounded,
        Exclusive::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..200 {
                    assert!(queue.push(t * 200 + i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(queue.len(), 800);
    assert!(!queue.observer().overlapped.load(Ordering::SeqCst));
}

#[test]
fn panicking_hook_does_not_wedge_queue() {
    struct PanicOnFirstPush(AtomicBool);

    impl QueueObserver<u8> for PanicOnFirstPush {
        fn on_push(&self, _item: &u8) {
            if !self.0.swap(true, Ordering::SeqCst) {
                panic!("observer failure");
            }
        }
    }

    let queue = Queue::<u8, _>::with_observer(
        Capacity::Unbounded,
        PanicOnFirstPush(AtomicBool::new(false)),
    );

    let result = panic::catch_unwind(AssertUnwindSafe(|| queue.push(1)));
    assert!(result.is_err());

    // The item was enqueued before the hook ran.
    assert_eq!(queue.len(), 1);
    assert!(queue.push(2));
    assert_eq!(queue.pop(), Some(1));
    assert_eq!(queue.pop(), Some(2));
}

/// Panics on the first call of one chosen hook, then behaves.
struct PanicOnce {
    push: AtomicBool,
    pop: AtomicBool,
    close: AtomicBool,
}

impl PanicOnce {
    /// Each flag records whether that hook has already fired; only the
    /// hook whose flag starts cleared will panic.
    fn arm(push: bool, pop: bool, close: bool) -> Self {
        Self {
            push: AtomicBool::new(!push),
            pop: AtomicBool::new(!pop),
            close: AtomicBool::new(!close),
        }
    }
}

impl QueueObserver<u8> for PanicOnce {
    fn on_push(&self, _item: &u8) {
        if !self.push.swap(true, Ordering::SeqCst) {
            panic!("push observer failure");
        }
    }

    fn on_pop(&self, _item: &u8) {
        if !self.pop.swap(true, Ordering::SeqCst) {
            panic!("pop observer failure");
        }
    }

    fn on_close(&self) {
        if !self.close.swap(true, Ordering::SeqCst) {
            panic!("close observer failure");
        }
    }
}

/// Long enough that a blocked thread has certainly reached its wait.
const SETTLE: Duration = Duration::from_millis(50);

#[test]
fn blocked_consumer_receives_item_when_push_hook_panics() {
    let queue = Arc::new(Queue::<u8, _>::with_observer(
        Capacity::Unbounded,
        PanicOnce::arm(true, false, false),
    ));

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.pop())
    };
    thread::sleep(SETTLE);

    let result = panic::catch_unwind(AssertUnwindSafe(|| queue.push(7)));
    assert!(result.is_err());

    assert_eq!(consumer.join().unwrap(), Some(7));
}

#[test]
fn blocked_producer_wakes_when_pop_hook_panics() {
    let queue = Arc::new(Queue::<u8, _>::with_observer(
        Capacity::bounded(1).unwrap(),
        PanicOnce::arm(false, true, false),
    ));
    assert!(queue.push(1));

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(2))
    };
    thread::sleep(SETTLE);

    let result = panic::catch_unwind(AssertUnwindSafe(|| queue.pop()));
    assert!(result.is_err());

    assert!(producer.join().unwrap());
    assert_eq!(queue.pop(), Some(2));
}

#[test]
fn blocked_waiters_wake_when_close_hook_panics() {
    let queue = Arc::new(Queue::<u8, _>::with_observer(
        Capacity::Unbounded,
        PanicOnce::arm(false, false, true),
    ));

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.pop())
    };
    thread::sleep(SETTLE);

    let result = panic::catch_unwind(AssertUnwindSafe(|| queue.close()));
    assert!(result.is_err());

    assert!(queue.is_closed());
    assert_eq!(consumer.join().unwrap(), None);
}

#[test]
fn tracing_observer_from_config() {
    blockq::init_tracing();

    let config = QueueConfig {
        capacity: Capacity::bounded(4).unwrap(),
        label: "audit",
    };
    let queue = Queue::from_config(&config, TracingObserver::from_config(&config));

    assert_eq!(queue.label(), "audit");
    assert_eq!(queue.observer().label(), "audit");
    assert!(queue.push("event"));
    assert_eq!(queue.pop(), Some("event"));
    queue.close();
    assert!(queue.is_closed());
}
