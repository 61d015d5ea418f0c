//! Callback dispatcher
//!
//! Each episode owns one worker thread fed by a bounded `crossbeam_channel`
//! queue. Sensor measurements and tick snapshots are delivered from that
//! thread, outside every engine lock; this is the native thread on which
//! bridged callbacks run.
//!
//! # Critical Invariants
//!
//! 1. No event is dropped: a full queue blocks the producer until the
//!    frame's deadline, then the frame fails with `Timeout`
//! 2. A panicking callback never takes the worker down
//! 3. Frame markers are delivered in order, after every event of their frame

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};

use crate::bridge::Invocable;

use super::error::EngineError;
use super::sensor_data::SensorData;
use super::snapshot::WorldSnapshot;

pub(crate) type SensorCallback = Arc<dyn Invocable<SensorData>>;
pub(crate) type TickCallback = Arc<dyn Invocable<WorldSnapshot>>;

enum Job {
    Sensor(SensorCallback, SensorData),
    Tick(TickCallback, WorldSnapshot),
    /// Every event of the frame has been delivered
    FrameDone(u64),
}

/// Last frame whose events were all delivered
#[derive(Default)]
struct Progress {
    delivered: Mutex<u64>,
    changed: Condvar,
}

pub(crate) struct Dispatcher {
    sender: Sender<Job>,
    progress: Arc<Progress>,
    worker: ThreadId,
}

impl Dispatcher {
    /// Start the worker thread
    pub fn spawn(name: String, capacity: usize) -> Result<Self, EngineError> {
        let (sender, receiver) = bounded(capacity.max(1));
        let progress = Arc::new(Progress::default());
        let worker_progress = Arc::clone(&progress);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(receiver, worker_progress))
            .map_err(|err| EngineError::SpawnFailed(format!("dispatcher thread: {}", err)))?;
        log::debug!("dispatcher {} started", name);
        Ok(Dispatcher {
            sender,
            progress,
            worker: handle.thread().id(),
        })
    }

    /// Start delivering the events of `frame`
    ///
    /// Every event queued through the returned batch and the frame marker
    /// share one deadline, `timeout` from now.
    pub fn begin_frame(&self, frame: u64, timeout: Duration) -> FrameBatch<'_> {
        FrameBatch {
            dispatcher: self,
            frame,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.worker
    }
}

/// The events of one frame on their way to the worker
///
/// A full queue blocks the producer until the worker catches up or the
/// frame's deadline passes; no event is dropped.
pub(crate) struct FrameBatch<'d> {
    dispatcher: &'d Dispatcher,
    frame: u64,
    timeout: Duration,
    deadline: Instant,
}

impl FrameBatch<'_> {
    pub fn sensor(&self, callback: SensorCallback, data: SensorData) -> Result<(), EngineError> {
        self.enqueue(Job::Sensor(callback, data))
    }

    pub fn tick(&self, callback: TickCallback, snapshot: WorldSnapshot) -> Result<(), EngineError> {
        self.enqueue(Job::Tick(callback, snapshot))
    }

    fn enqueue(&self, job: Job) -> Result<(), EngineError> {
        let sender = &self.dispatcher.sender;
        // The worker cannot drain its own queue while it waits for room.
        if self.dispatcher.on_worker() {
            return match sender.try_send(job) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "dispatcher queue full while ticking from a callback, frame {}",
                        self.frame
                    );
                    Err(EngineError::Timeout(self.timeout))
                }
                Err(TrySendError::Disconnected(_)) => Err(self.stopped()),
            };
        }
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match sender.send_timeout(job, remaining) {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(EngineError::Timeout(self.timeout)),
            Err(SendTimeoutError::Disconnected(_)) => Err(self.stopped()),
        }
    }

    fn stopped(&self) -> EngineError {
        log::warn!("dispatcher stopped before frame {} was delivered", self.frame);
        EngineError::Timeout(self.timeout)
    }

    /// Mark the end of the frame and wait until its events were delivered
    ///
    /// # Errors
    ///
    /// `Timeout` if the worker has not caught up by the deadline, e.g.
    /// because a callback is blocked.
    pub fn finish(self) -> Result<(), EngineError> {
        self.enqueue(Job::FrameDone(self.frame))?;

        // A callback ticking the world cannot wait for its own delivery.
        if self.dispatcher.on_worker() {
            return Ok(());
        }

        let progress = &self.dispatcher.progress;
        let mut delivered = progress.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        while *delivered < self.frame {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Timeout(self.timeout));
            }
            delivered = progress
                .changed
                .wait_timeout(delivered, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Ok(())
    }
}

fn run(receiver: Receiver<Job>, progress: Arc<Progress>) {
    for job in receiver {
        let frame = match job {
            Job::Sensor(callback, data) => {
                contain(|| callback.invoke(data));
                continue;
            }
            Job::Tick(callback, snapshot) => {
                contain(|| callback.invoke(snapshot));
                continue;
            }
            Job::FrameDone(frame) => frame,
        };
        let mut delivered = progress.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        *delivered = (*delivered).max(frame);
        progress.changed.notify_all();
    }
    log::debug!("dispatcher stopped");
}

fn contain(f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::error!("callback panicked on the dispatcher thread");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::engine::{GnssMeasurement, SensorPayload, Transform};

    fn data(frame: u64) -> SensorData {
        SensorData {
            frame,
            timestamp: 0.0,
            transform: Transform::default(),
            payload: SensorPayload::Gnss(GnssMeasurement {
                latitude: 0.0,
                longitude: 0.0,
                altitude: 0.0,
            }),
        }
    }

    #[test]
    fn test_events_delivered_before_frame_completes() {
        let dispatcher = Dispatcher::spawn("test-dispatcher".to_string(), 8).unwrap();
        let last = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&last);
        let callback: SensorCallback = Arc::new(move |data: SensorData| {
            seen.store(data.frame, Ordering::SeqCst);
        });

        let batch = dispatcher.begin_frame(1, Duration::from_secs(5));
        batch.sensor(callback, data(1)).unwrap();
        batch.finish().unwrap();
        assert_eq!(last.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_more_events_than_capacity_all_delivered() {
        let dispatcher = Dispatcher::spawn("test-dispatcher".to_string(), 2).unwrap();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let callback: SensorCallback = Arc::new(move |_: SensorData| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let batch = dispatcher.begin_frame(1, Duration::from_secs(5));
        for _ in 0..50 {
            batch.sensor(Arc::clone(&callback), data(1)).unwrap();
        }
        batch.finish().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_panicking_callback_does_not_stop_worker() {
        let dispatcher = Dispatcher::spawn("test-dispatcher".to_string(), 8).unwrap();
        let boom: SensorCallback = Arc::new(|_: SensorData| panic!("boom"));
        let batch = dispatcher.begin_frame(1, Duration::from_secs(5));
        batch.sensor(boom, data(1)).unwrap();
        batch.finish().unwrap();

        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let ok: SensorCallback = Arc::new(move |_: SensorData| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let batch = dispatcher.begin_frame(2, Duration::from_secs(5));
        batch.sensor(ok, data(2)).unwrap();
        batch.finish().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocked_worker_times_out() {
        let dispatcher = Dispatcher::spawn("test-dispatcher".to_string(), 8).unwrap();
        let gate = Arc::new(Mutex::new(()));
        let blocked = gate.lock().unwrap();
        let waiting = Arc::clone(&gate);
        let callback: SensorCallback = Arc::new(move |_: SensorData| {
            let _unblocked = waiting.lock();
        });

        let batch = dispatcher.begin_frame(1, Duration::from_millis(50));
        batch.sensor(callback, data(1)).unwrap();
        let err = batch.finish().unwrap_err();
        assert_eq!(err, EngineError::Timeout(Duration::from_millis(50)));
        drop(blocked);
    }

    #[test]
    fn test_full_queue_behind_blocked_worker_times_out() {
        let dispatcher = Dispatcher::spawn("test-dispatcher".to_string(), 1).unwrap();
        let gate = Arc::new(Mutex::new(()));
        let blocked = gate.lock().unwrap();
        let waiting = Arc::clone(&gate);
        let callback: SensorCallback = Arc::new(move |_: SensorData| {
            let _unblocked = waiting.lock();
        });

        let batch = dispatcher.begin_frame(1, Duration::from_millis(50));
        let outcome = (0..4).try_for_each(|_| batch.sensor(Arc::clone(&callback), data(1)));
        assert_eq!(outcome, Err(EngineError::Timeout(Duration::from_millis(50))));
        drop(blocked);
    }
}
