//! Blocking queue throughput and round-trip benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)
//!     RUST_LOG        Log filter when built with `--features tracing`

use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use blockq::sync::{CountingObserver, NoopObserver, Queue};
use blockq::{Capacity, QueueConfig};

const QUEUE_SIZE: usize = 1 << 10;
const ITERATIONS: usize = 1 << 20;

type Payload = u64;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_config(label: &'static str) -> QueueConfig {
    QueueConfig {
        capacity: Capacity::bounded(QUEUE_SIZE).expect("QUEUE_SIZE is non-zero"),
        label,
    }
}

fn bench_throughput(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let stats = Arc::new(CountingObserver::new());
    let queue = Arc::new(Queue::<Payload, _>::from_config(
        &bench_config("throughput"),
        Arc::clone(&stats),
    ));

    let ready = Arc::new(AtomicBool::new(false));

    let consumer_thread = {
        let queue = Arc::clone(&queue);
        let ready = Arc::clone(&ready);
        thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            ready.store(true, Ordering::Release);

            let mut expected: Payload = 0;
            while let Some(value) = queue.pop() {
                assert_eq!(value, expected, "data corruption");
                expected += 1;
            }
            expected
        })
    };

    while !ready.load(Ordering::Acquire) {
        thread::yield_now();
    }

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        assert!(queue.push(i), "queue closed during benchmark");
    }
    queue.close();

    let received = consumer_thread.join().expect("consumer panicked");
    let elapsed = start.elapsed();

    assert_eq!(received, ITERATIONS as Payload);
    assert_eq!(stats.stats().in_flight(), 0);

    let ops_per_ms = ITERATIONS as u128 * 1_000_000 / elapsed.as_nanos().max(1);
    println!("{ops_per_ms} ops/ms");
}

fn bench_rtt(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let requests = Arc::new(Queue::<Payload, _>::from_config(
        &bench_config("rtt-request"),
        NoopObserver,
    ));
    let replies = Arc::new(Queue::<Payload, _>::from_config(
        &bench_config("rtt-reply"),
        NoopObserver,
    ));

    let responder = {
        let requests = Arc::clone(&requests);
        let replies = Arc::clone(&replies);
        thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            while let Some(value) = requests.pop() {
                if !replies.push(value) {
                    break;
                }
            }
        })
    };

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        assert!(requests.push(i));
        assert_eq!(replies.pop(), Some(i));
    }

    let elapsed = start.elapsed();
    requests.close();
    responder.join().expect("responder panicked");

    let rtt_ns = elapsed.as_nanos() / ITERATIONS as u128;
    println!("{rtt_ns} ns RTT");
}

fn main() {
    blockq::init_tracing();

    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!("blockq Queue (capacity={QUEUE_SIZE}, iters={ITERATIONS}):");
    bench_throughput(producer_cpu, consumer_cpu);
    bench_rtt(producer_cpu, consumer_cpu);
}
