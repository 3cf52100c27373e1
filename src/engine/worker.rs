//! The background analysis worker and the audio thread's handle to it.
//!
//! A single named thread consumes [`AnalysisJob`]s from a bounded queue. Window
//! snapshots travel in preallocated buffers which the worker hands back once
//! a job is done, so the audio thread never allocates or frees. The audio
//! side holding a buffer is what allows a new pass of that kind to start;
//! while the buffer is away, that pass is in flight and window fills are
//! ignored.

use super::shared::SharedState;
use crate::dsp::{
    DesignRequest, GroupId, HarmonicFilterDesigner, PitchDecision,
    PitchTracker, VolumeEstimator,
};
use crate::settings::{ANALYSIS_QUEUE_SIZE, ANALYSIS_THREAD_NAME};
use crate::util::AtomicOps;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::{io, sync::Arc, thread::JoinHandle};

/// Work for the analysis thread.
#[derive(Debug)]
pub enum AnalysisJob {
    /// Estimate the average volume of a window snapshot.
    Volume(Box<[f32]>),
    /// Run the pitch search over a window snapshot.
    Pitch(Box<[f32]>),
    /// Design coefficients for a claimed filter group.
    Design { target: GroupId, request: DesignRequest },
}

/// One preallocated snapshot buffer and the channel it comes home on.
#[derive(Debug)]
struct SnapshotSlot {
    spare: Option<Box<[f32]>>,
    returned: Receiver<Box<[f32]>>,
}

impl SnapshotSlot {
    fn new(len: usize) -> (Self, Sender<Box<[f32]>>) {
        let (tx, rx) = bounded(1);
        let slot = Self {
            spare: Some(vec![0.0; len].into_boxed_slice()),
            returned: rx,
        };

        (slot, tx)
    }

    /// Takes the buffer if it is home.
    fn take(&mut self) -> Option<Box<[f32]>> {
        if self.spare.is_none() {
            self.spare = self.returned.try_recv().ok();
        }

        self.spare.take()
    }

    fn is_in_flight(&self) -> bool {
        self.spare.is_none() && self.returned.is_empty()
    }
}

/// The audio thread's end of the job queue.
#[derive(Debug)]
pub struct AnalysisDispatcher {
    jobs: Sender<AnalysisJob>,
    volume: SnapshotSlot,
    pitch: SnapshotSlot,
}

/// The worker's end of the job queue.
#[derive(Debug)]
pub struct JobQueue {
    jobs: Receiver<AnalysisJob>,
    volume_return: Sender<Box<[f32]>>,
    pitch_return: Sender<Box<[f32]>>,
}

/// Creates both ends of the job queue, with snapshot buffers of
/// `window_len` samples.
pub fn analysis_channels(window_len: usize) -> (AnalysisDispatcher, JobQueue) {
    let (jobs_tx, jobs_rx) = bounded(ANALYSIS_QUEUE_SIZE);
    let (volume, volume_return) = SnapshotSlot::new(window_len);
    let (pitch, pitch_return) = SnapshotSlot::new(window_len);

    (
        AnalysisDispatcher { jobs: jobs_tx, volume, pitch },
        JobQueue { jobs: jobs_rx, volume_return, pitch_return },
    )
}

impl AnalysisDispatcher {
    /// Called by the audio thread when the capture window fills. Snapshots
    /// the window for a volume pass and a pitch pass, skipping either if one
    /// of that kind is still in flight. The volume job is queued first so
    /// the pitch pass sees the fresh volume.
    pub fn on_window_filled(&mut self, window: &[f32]) {
        if let Some(mut buf) = self.volume.take() {
            buf.copy_from_slice(window);
            self.send_snapshot(AnalysisJob::Volume(buf));
        }

        if let Some(mut buf) = self.pitch.take() {
            buf.copy_from_slice(window);
            self.send_snapshot(AnalysisJob::Pitch(buf));
        }
    }

    /// Queues a coefficient design. Returns `false` if the queue is full or
    /// the worker has gone.
    pub fn request_design(&self, target: GroupId, request: DesignRequest) -> bool {
        self.jobs
            .try_send(AnalysisJob::Design { target, request })
            .is_ok()
    }

    pub fn is_volume_in_flight(&self) -> bool {
        self.volume.is_in_flight()
    }

    pub fn is_pitch_in_flight(&self) -> bool {
        self.pitch.is_in_flight()
    }

    fn send_snapshot(&mut self, job: AnalysisJob) {
        let job = match self.jobs.try_send(job) {
            Ok(()) => return,
            Err(TrySendError::Full(job) | TrySendError::Disconnected(job)) => {
                job
            }
        };

        // keep the buffer rather than dropping it on this thread
        match job {
            AnalysisJob::Volume(buf) => self.volume.spare = Some(buf),
            AnalysisJob::Pitch(buf) => self.pitch.spare = Some(buf),
            AnalysisJob::Design { .. } => {}
        }
    }
}

/// The analysis state owned by the worker thread.
#[derive(Debug)]
pub struct AnalysisContext {
    shared: Arc<SharedState>,
    tracker: PitchTracker,
    volume: VolumeEstimator,
    designer: HarmonicFilterDesigner,
    sample_rate: f64,
}

impl AnalysisContext {
    pub fn new(
        shared: Arc<SharedState>,
        tracker: PitchTracker,
        volume: VolumeEstimator,
        designer: HarmonicFilterDesigner,
    ) -> Self {
        let sample_rate = designer.sample_rate();
        Self { shared, tracker, volume, designer, sample_rate }
    }

    /// Runs one job, returning its snapshot buffer (if any) through `queue`.
    pub fn run(&mut self, job: AnalysisJob, queue: &JobQueue) {
        match job {
            AnalysisJob::Volume(buf) => {
                let volume = self.volume.estimate(&buf);
                self.shared.average_volume.sr_rel(volume);

                // only fails if the audio side is gone
                _ = queue.volume_return.send(buf);
            }
            AnalysisJob::Pitch(buf) => {
                self.track_pitch(&buf);
                _ = queue.pitch_return.send(buf);
            }
            AnalysisJob::Design { target, request } => {
                self.design(target, &request);
            }
        }
    }

    fn track_pitch(&mut self, window: &[f32]) {
        let current = self.shared.pitch.la();
        let volume = self.shared.average_volume.la();

        match self.tracker.analyse(window, current, volume, self.sample_rate) {
            PitchDecision::Accepted(pitch) => {
                self.shared.pitch.sr_rel(pitch);
                log::debug!(
                    "pitch: {:.2} Hz ({} samples)",
                    pitch.freq_hz,
                    pitch.cycle_samples
                );
            }
            PitchDecision::Rejected(reason) => {
                log::trace!(
                    "pitch candidate rejected ({reason:?}), last seen {:.2} Hz",
                    self.tracker.last_seen_hz()
                );
            }
        }
    }

    fn design(&self, target: GroupId, request: &DesignRequest) {
        let set = self.designer.design(request);
        let bank = &self.shared.filter_bank;

        if bank.publish(target, request, &set) {
            log::debug!("designed group {target:?} for {request:?}");
        }
        else {
            bank.slot(target).release_claim();
            log::trace!("design for group {target:?} discarded");
        }
    }
}

/// Handle to the analysis thread. Dropping it joins the thread, which exits
/// once every [`AnalysisDispatcher`] sender is gone; drop the dispatcher
/// first.
#[derive(Debug)]
pub struct AnalysisWorker {
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Spawns the analysis thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread could not be spawned.
    pub fn spawn(queue: JobQueue, mut context: AnalysisContext) -> io::Result<Self> {
        let handle = std::thread::Builder::new()
            .name(ANALYSIS_THREAD_NAME.to_owned())
            .spawn(move || {
                log::info!("analysis worker started");

                for job in queue.jobs.iter() {
                    context.run(job, &queue);
                }

                log::info!("analysis worker stopped");
            })?;

        Ok(Self { handle: Some(handle) })
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("analysis worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{PitchTrackerConfig, TrackedPitch};
    use approx::assert_relative_eq;
    use std::time::{Duration, Instant};

    const SR: f64 = 48000.0;

    fn context(shared: &Arc<SharedState>) -> AnalysisContext {
        AnalysisContext::new(
            Arc::clone(shared),
            PitchTracker::new(PitchTrackerConfig::default()),
            VolumeEstimator::new(8.0),
            HarmonicFilterDesigner::with_default_q(SR),
        )
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let start = Instant::now();

        while start.elapsed() < Duration::from_secs(5) {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        false
    }

    #[test]
    fn test_one_pass_of_each_kind_in_flight() {
        // no worker: jobs pile up in the queue
        let (mut dispatcher, queue) = analysis_channels(16);
        let window = [1.0; 16];

        dispatcher.on_window_filled(&window);
        assert!(dispatcher.is_volume_in_flight());
        assert!(dispatcher.is_pitch_in_flight());

        // further fills are skipped while the buffers are away
        dispatcher.on_window_filled(&window);
        dispatcher.on_window_filled(&window);
        assert_eq!(queue.jobs.len(), 2);
    }

    #[test]
    fn test_full_queue_keeps_buffers() {
        let (mut dispatcher, queue) = analysis_channels(16);

        // fill the queue with designs
        for _ in 0..ANALYSIS_QUEUE_SIZE {
            assert!(dispatcher.request_design(GroupId::B, DesignRequest::default()));
        }
        assert!(!dispatcher.request_design(GroupId::B, DesignRequest::default()));

        dispatcher.on_window_filled(&[0.5; 16]);
        assert!(!dispatcher.is_volume_in_flight());
        assert!(!dispatcher.is_pitch_in_flight());
        assert_eq!(queue.jobs.len(), ANALYSIS_QUEUE_SIZE);
    }

    #[test]
    fn test_buffers_come_home() {
        let shared = Arc::new(SharedState::new(TrackedPitch::from_freq(100.0, SR)));
        let (mut dispatcher, queue) = analysis_channels(3000);
        let mut ctx = context(&shared);

        dispatcher.on_window_filled(&[0.8; 3000]);
        while let Ok(job) = queue.jobs.try_recv() {
            ctx.run(job, &queue);
        }

        assert!(!dispatcher.is_volume_in_flight());
        assert!(!dispatcher.is_pitch_in_flight());
        assert_relative_eq!(shared.average_volume(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_worker_tracks_pitch() {
        let shared = Arc::new(SharedState::new(TrackedPitch::from_freq(100.0, SR)));
        let (mut dispatcher, queue) = analysis_channels(3000);
        let worker = AnalysisWorker::spawn(queue, context(&shared)).unwrap();

        // a 110 Hz sine, already scaled by the capture gain
        let window: Vec<f32> = (0..3000)
            .map(|i| (std::f32::consts::TAU * 110.0 * i as f32 / 48000.0).sin() * 4.0)
            .collect();

        let converged = wait_until(|| {
            dispatcher.on_window_filled(&window);
            shared.tracked_pitch().cycle_samples == 436
        });

        drop(dispatcher);
        drop(worker);

        assert!(converged);
        assert!((shared.tracked_pitch().freq_hz - 110.09).abs() < 0.01);
    }

    #[test]
    fn test_worker_designs_claimed_group_only() {
        let shared = Arc::new(SharedState::new(TrackedPitch::from_freq(100.0, SR)));
        let (dispatcher, queue) = analysis_channels(16);
        let worker = AnalysisWorker::spawn(queue, context(&shared)).unwrap();
        let request = DesignRequest {
            freq_hz: 110.0,
            fundamental_db: 6.0,
            odd_db: 0.0,
            even_db: 0.0,
        };

        // the active group is never written
        assert!(dispatcher.request_design(GroupId::A, request));
        // B is claimed first, as the audio thread would
        assert!(shared.filter_bank.slot(GroupId::B).try_claim());
        assert!(dispatcher.request_design(GroupId::B, request));

        let bank = &shared.filter_bank;
        let ready = wait_until(|| {
            bank.slot(GroupId::B).state() == crate::dsp::GroupState::Ready
        });

        drop(dispatcher);
        drop(worker);

        assert!(ready);
        assert_eq!(
            bank.slot(GroupId::A).state(),
            crate::dsp::GroupState::Active
        );
    }
}
