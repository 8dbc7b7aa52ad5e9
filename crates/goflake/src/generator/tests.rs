use crate::{
    BitLayout, DEFAULT_EPOCH, Error, Generator, GeneratorConfig, MonotonicClock, OverflowPolicy,
    SequenceReset, TimeSource,
};
use core::time::Duration;
use std::collections::HashSet;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::thread::scope;

const EPOCH: u64 = 1_659_034_655_453;
const LONG_TICK: Duration = Duration::from_secs(3600);

/// A clock that only moves when told to. Clones share the same reading.
#[derive(Clone, Debug)]
struct MockTime {
    millis: Arc<AtomicU64>,
}

impl MockTime {
    fn at(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct FixedTime;
impl TimeSource for FixedTime {
    fn current_millis(&self) -> u64 {
        EPOCH + 42
    }
}

fn config(reset: SequenceReset) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_datacenter_id(3)
        .with_machine_id(7)
        .with_epoch(EPOCH)
        .with_tick_interval(LONG_TICK)
        .with_reset(reset)
}

trait ResultExt {
    fn unwrap_id(self) -> u64;
}

impl ResultExt for crate::Result<u64> {
    fn unwrap_id(self) -> u64 {
        match self {
            Ok(id) => id,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}

fn run_first_ids_of_a_tick<T: TimeSource>(generator: &Generator<T>) {
    let first = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!(first.relative_timestamp, 1000);
    assert_eq!(first.datacenter_id, 3);
    assert_eq!(first.machine_id, 7);
    assert_eq!(first.sequence, 0);
    assert!(!first.top_bit);

    let second = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!(second.relative_timestamp, 1000);
    assert_eq!(second.sequence, 1);
}

fn run_sequence_increases_in_call_order<T: TimeSource>(generator: &Generator<T>) {
    let ids: Vec<u64> = (0..100).map(|_| generator.next_id().unwrap_id()).collect();
    for (i, id) in ids.iter().enumerate() {
        let parts = generator.decompose(*id);
        assert_eq!(parts.sequence, i as u64);
        assert_eq!(parts.relative_timestamp, 42);
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

fn run_rejects_when_sequence_exhausted<T: TimeSource>(generator: &Generator<T>) {
    let max = generator.layout().max_sequence();
    for i in 0..=max {
        let id = generator.next_id().unwrap_id();
        assert_eq!(generator.decompose(id).sequence, i);
    }
    for _ in 0..3 {
        match generator.next_id() {
            Err(Error::SequenceExhausted { max: reported }) => assert_eq!(reported, max),
            other => panic!("expected SequenceExhausted, got {other:?}"),
        }
    }
}

fn run_threaded_unique<T: TimeSource + Sync>(generator: &Generator<T>) {
    const TOTAL_IDS: usize = 10_000;
    let threads = num_cpus::get().clamp(2, 16);
    let per_thread = TOTAL_IDS / threads;
    let total = per_thread * threads;

    let batches: Vec<Vec<u64>> = scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    (0..per_thread)
                        .map(|_| generator.next_id().unwrap_id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let seen: HashSet<u64> = batches.iter().flatten().copied().collect();
    assert_eq!(seen.len(), total, "expected {total} unique ids");
    for id in seen {
        let parts = generator.decompose(id);
        assert_eq!(parts.datacenter_id, 3);
        assert_eq!(parts.machine_id, 7);
        assert!(!parts.top_bit);
    }
}

#[test]
fn interval_first_ids_of_a_tick() {
    let generator =
        Generator::new(config(SequenceReset::Interval), MockTime::at(EPOCH + 1000)).unwrap();
    run_first_ids_of_a_tick(&generator);
}

#[test]
fn timestamp_first_ids_of_a_tick() {
    let generator =
        Generator::new(config(SequenceReset::Timestamp), MockTime::at(EPOCH + 1000)).unwrap();
    run_first_ids_of_a_tick(&generator);
}

#[test]
fn interval_sequence_increases_in_call_order() {
    let generator = Generator::new(config(SequenceReset::Interval), FixedTime).unwrap();
    run_sequence_increases_in_call_order(&generator);
}

#[test]
fn timestamp_sequence_increases_in_call_order() {
    let generator = Generator::new(config(SequenceReset::Timestamp), FixedTime).unwrap();
    run_sequence_increases_in_call_order(&generator);
}

#[test]
fn interval_rejects_when_sequence_exhausted() {
    let layout = BitLayout::new(5, 5, 51, 2).unwrap();
    let generator =
        Generator::new(config(SequenceReset::Interval).with_layout(layout), FixedTime).unwrap();
    run_rejects_when_sequence_exhausted(&generator);
}

#[test]
fn timestamp_rejects_when_sequence_exhausted() {
    let layout = BitLayout::new(5, 5, 51, 2).unwrap();
    let generator =
        Generator::new(config(SequenceReset::Timestamp).with_layout(layout), FixedTime).unwrap();
    run_rejects_when_sequence_exhausted(&generator);
}

#[test]
fn interval_threaded_ids_are_unique_within_a_tick() {
    // 14 sequence bits leave room for all ids inside one (very long) tick.
    let layout = BitLayout::new(5, 5, 39, 14).unwrap();
    let generator =
        Generator::new(config(SequenceReset::Interval).with_layout(layout), FixedTime).unwrap();
    run_threaded_unique(&generator);
}

#[test]
fn timestamp_threaded_ids_are_unique_across_ticks() {
    let generator = Generator::new(
        config(SequenceReset::Timestamp).with_overflow(OverflowPolicy::Block),
        MonotonicClock::new(),
    )
    .unwrap();
    run_threaded_unique(&generator);
}

#[test]
fn interval_counter_is_zero_after_an_idle_tick() {
    let generator = Generator::new(
        config(SequenceReset::Interval).with_tick_interval(Duration::from_millis(10)),
        MockTime::at(EPOCH + 1000),
    )
    .unwrap();

    for _ in 0..5 {
        generator.next_id().unwrap_id();
    }
    std::thread::sleep(Duration::from_millis(200));

    let parts = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!(parts.sequence, 0);
}

#[test]
fn interval_block_waits_for_the_next_tick() {
    let layout = BitLayout::new(5, 5, 52, 1).unwrap();
    let generator = Generator::new(
        config(SequenceReset::Interval)
            .with_layout(layout)
            .with_tick_interval(Duration::from_millis(5))
            .with_overflow(OverflowPolicy::Block),
        FixedTime,
    )
    .unwrap();

    // Two sequence values per tick: the remaining calls have to wait for
    // resets rather than fail.
    for _ in 0..10 {
        let parts = generator.decompose(generator.next_id().unwrap_id());
        assert!(parts.sequence <= 1);
    }
}

#[test]
fn timestamp_restarts_sequence_when_clock_advances() {
    let clock = MockTime::at(EPOCH + 10);
    let generator = Generator::new(config(SequenceReset::Timestamp), clock.clone()).unwrap();

    for expected in 0..3 {
        let parts = generator.decompose(generator.next_id().unwrap_id());
        assert_eq!((parts.relative_timestamp, parts.sequence), (10, expected));
    }

    clock.set(EPOCH + 11);
    let parts = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!((parts.relative_timestamp, parts.sequence), (11, 0));
}

#[test]
fn timestamp_block_waits_for_the_clock() {
    let clock = MockTime::at(EPOCH + 10);
    let layout = BitLayout::new(5, 5, 53, 0).unwrap();
    let generator = Generator::new(
        config(SequenceReset::Timestamp)
            .with_layout(layout)
            .with_overflow(OverflowPolicy::Block),
        clock.clone(),
    )
    .unwrap();

    let first = generator.next_id().unwrap_id();
    let second = scope(|s| {
        let waiter = s.spawn(|| generator.next_id().unwrap_id());
        std::thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        clock.set(EPOCH + 11);
        waiter.join().unwrap()
    });

    assert_eq!(generator.decompose(first).relative_timestamp, 10);
    assert_eq!(generator.decompose(second).relative_timestamp, 11);
}

#[test]
fn timestamp_rejects_clock_regression() {
    let clock = MockTime::at(EPOCH + 100);
    let generator = Generator::new(config(SequenceReset::Timestamp), clock.clone()).unwrap();
    generator.next_id().unwrap_id();

    clock.set(EPOCH + 99);
    match generator.next_id() {
        Err(e @ Error::ClockRegressed { now, last }) => {
            assert_eq!((now, last), (99, 100));
            assert!(e.is_retryable());
        }
        other => panic!("expected ClockRegressed, got {other:?}"),
    }

    clock.set(EPOCH + 100);
    let parts = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!((parts.relative_timestamp, parts.sequence), (100, 1));
}

#[test]
fn clock_before_epoch_is_skew() {
    for reset in [SequenceReset::Interval, SequenceReset::Timestamp] {
        let generator = Generator::new(config(reset), MockTime::at(EPOCH - 1)).unwrap();
        match generator.next_id() {
            Err(e @ Error::ClockSkew { now, epoch }) => {
                assert_eq!((now, epoch), (EPOCH - 1, EPOCH));
                assert!(!e.is_retryable());
            }
            other => panic!("expected ClockSkew, got {other:?}"),
        }
    }
}

#[test]
fn time_field_overflow_is_an_error() {
    let layout = BitLayout::new(5, 5, 10, 43).unwrap();
    for reset in [SequenceReset::Interval, SequenceReset::Timestamp] {
        let clock = MockTime::at(EPOCH + 1023);
        let generator = Generator::new(config(reset).with_layout(layout), clock.clone()).unwrap();
        let first = generator.decompose(generator.next_id().unwrap_id());
        assert_eq!(first.relative_timestamp, 1023);

        clock.set(EPOCH + 1024);
        match generator.next_id() {
            Err(Error::TimestampOverflow { relative, max }) => {
                assert_eq!((relative, max), (1024, 1023));
            }
            other => panic!("expected TimestampOverflow, got {other:?}"),
        }
    }
}

#[test]
fn construction_rejects_invalid_identity() {
    let err = Generator::new(
        config(SequenceReset::Interval).with_datacenter_id(32),
        FixedTime,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentity { value: 32, max: 31, .. }));
    assert!(err.is_config());

    let err =
        Generator::new(config(SequenceReset::Interval).with_machine_id(99), FixedTime).unwrap_err();
    assert!(matches!(err, Error::InvalidIdentity { value: 99, .. }));
}

#[test]
fn construction_rejects_zero_tick() {
    let err = Generator::new(
        config(SequenceReset::Interval).with_tick_interval(Duration::ZERO),
        FixedTime,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidTickInterval));
}

#[test]
fn construction_rejects_unschedulable_tick() {
    let err = Generator::new(
        config(SequenceReset::Interval).with_tick_interval(Duration::MAX),
        FixedTime,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidTickInterval));
    assert!(err.is_config());

    // The timestamp strategy never schedules a tick.
    let generator = Generator::new(
        config(SequenceReset::Timestamp).with_tick_interval(Duration::MAX),
        FixedTime,
    )
    .unwrap();
    generator.next_id().unwrap_id();
}

fn assert_identity_survives<T: TimeSource>(generator: &Generator<T>) {
    let parts = generator.decompose(generator.next_id().unwrap_id());
    assert_eq!(
        (parts.datacenter_id, parts.machine_id),
        (generator.datacenter_id(), generator.machine_id())
    );
    assert_eq!((parts.relative_timestamp, parts.sequence), (42, 0));
    assert!(!parts.top_bit);
}

#[test]
fn every_identity_pair_survives_generation() {
    let layout = BitLayout::DEFAULT;
    for datacenter_id in 0..=layout.max_datacenter_id() {
        for machine_id in 0..=layout.max_machine_id() {
            let config = config(SequenceReset::Timestamp)
                .with_datacenter_id(datacenter_id)
                .with_machine_id(machine_id);
            assert_identity_survives(&Generator::new(config, FixedTime).unwrap());
        }
    }
}

#[test]
fn boundary_identities_survive_generation() {
    // Lopsided widths catch a swapped shift or mask.
    let layouts = [
        BitLayout::DEFAULT,
        BitLayout::new(8, 2, 41, 12).unwrap(),
        BitLayout::new(0, 10, 41, 12).unwrap(),
    ];
    for layout in layouts {
        let datacenter_ids = [0, 1, layout.max_datacenter_id()];
        let machine_ids = [0, 1, layout.max_machine_id()];
        for reset in [SequenceReset::Interval, SequenceReset::Timestamp] {
            for datacenter_id in datacenter_ids {
                for machine_id in machine_ids {
                    if datacenter_id > layout.max_datacenter_id() {
                        continue;
                    }
                    let config = config(reset)
                        .with_layout(layout)
                        .with_datacenter_id(datacenter_id)
                        .with_machine_id(machine_id);
                    assert_identity_survives(&Generator::new(config, FixedTime).unwrap());
                }
            }
        }
    }
}

#[test]
fn shutdown_stops_generation() {
    for reset in [SequenceReset::Interval, SequenceReset::Timestamp] {
        let generator = Generator::new(config(reset), FixedTime).unwrap();
        assert!(generator.is_running());
        generator.next_id().unwrap_id();

        generator.shutdown();
        generator.shutdown();
        assert!(!generator.is_running());
        assert!(matches!(generator.next_id(), Err(Error::Stopped)));
    }
}

#[test]
fn shutdown_releases_blocked_callers() {
    let layout = BitLayout::new(5, 5, 53, 0).unwrap();
    let generator = Generator::new(
        config(SequenceReset::Timestamp)
            .with_layout(layout)
            .with_overflow(OverflowPolicy::Block),
        FixedTime,
    )
    .unwrap();
    generator.next_id().unwrap_id();

    let result = scope(|s| {
        let waiter = s.spawn(|| generator.next_id());
        std::thread::sleep(Duration::from_millis(20));
        generator.shutdown();
        waiter.join().unwrap()
    });
    assert!(matches!(result, Err(Error::Stopped)));
}

#[test]
fn accessors_reflect_configuration() {
    let generator =
        Generator::new(GeneratorConfig::default().with_machine_id(9), FixedTime).unwrap();
    assert_eq!(generator.datacenter_id(), 0);
    assert_eq!(generator.machine_id(), 9);
    assert_eq!(generator.epoch(), DEFAULT_EPOCH);
    assert_eq!(generator.tick_interval(), Duration::from_millis(1));
    assert_eq!(*generator.layout(), BitLayout::DEFAULT);
    assert_eq!(generator.overflow_policy(), OverflowPolicy::Reject);
    assert_eq!(generator.sequence_reset(), SequenceReset::Interval);
    assert_eq!(generator.clock().current_millis(), EPOCH + 42);
}
