use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rkpatch::DebouncedWriter;

const QUIET: Duration = Duration::from_millis(60);
const SETTLE: Duration = Duration::from_millis(300);

fn counting_writer() -> (DebouncedWriter, Arc<AtomicUsize>) {
    let flushes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&flushes);
    let writer = DebouncedWriter::spawn(QUIET, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    (writer, flushes)
}

#[test]
fn test_burst_flushes_once() {
    let _ = env_logger::try_init();
    let (writer, flushes) = counting_writer();

    for _ in 0..10 {
        writer.schedule();
        thread::sleep(Duration::from_millis(5));
    }
    assert!(writer.is_pending());
    thread::sleep(SETTLE);

    assert_eq!(flushes.load(Ordering::SeqCst), 1);
    assert!(!writer.is_pending());
}

#[test]
fn test_separate_bursts_flush_separately() {
    let _ = env_logger::try_init();
    let (writer, flushes) = counting_writer();

    writer.schedule();
    thread::sleep(SETTLE);
    writer.schedule();
    thread::sleep(SETTLE);

    assert_eq!(flushes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cancel_drops_pending_write() {
    let _ = env_logger::try_init();
    let (writer, flushes) = counting_writer();

    writer.schedule();
    writer.cancel();
    assert!(!writer.is_pending());
    thread::sleep(SETTLE);

    assert_eq!(flushes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_suppress_and_resume() {
    let _ = env_logger::try_init();
    let (writer, flushes) = counting_writer();

    writer.suppress();
    writer.schedule();
    assert!(writer.is_suppressed());
    assert!(!writer.is_pending());
    thread::sleep(SETTLE);
    assert_eq!(flushes.load(Ordering::SeqCst), 0);

    writer.resume(false);
    thread::sleep(SETTLE);
    assert_eq!(flushes.load(Ordering::SeqCst), 0);

    writer.suppress();
    writer.resume(true);
    assert!(!writer.is_suppressed());
    thread::sleep(SETTLE);
    assert_eq!(flushes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_quiet_period_can_change() {
    let _ = env_logger::try_init();
    let (writer, flushes) = counting_writer();

    writer.set_quiet_period(Duration::from_millis(400));
    assert_eq!(writer.quiet_period(), Duration::from_millis(400));

    writer.schedule();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(flushes.load(Ordering::SeqCst), 0);
    thread::sleep(Duration::from_millis(500));
    assert_eq!(flushes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_shutdown_drops_pending_write() {
    let _ = env_logger::try_init();
    let (mut writer, flushes) = counting_writer();

    writer.schedule();
    writer.shutdown();
    thread::sleep(SETTLE);
    assert_eq!(flushes.load(Ordering::SeqCst), 0);

    // Calls after shutdown are harmless.
    writer.schedule();
    writer.shutdown();
}
