//! The host-facing engine.
//!
//! A [`HarmonicEngine`] owns everything needed to run the tracker and EQ on
//! an audio thread: the [`EngineCore`](process::EngineCore) which processes
//! each buffer, and the background [`AnalysisWorker`](worker::AnalysisWorker)
//! which tracks pitch and designs filter coefficients. The two only talk
//! through the lock-free [`SharedState`](shared::SharedState) and a bounded
//! job queue, so [`process_block()`](HarmonicEngine::process_block) never
//! blocks or allocates.
//!
//! ```ignore
//! let params = Arc::new(HarmonicParams::new());
//! let mut engine = HarmonicEngine::new(Arc::clone(&params));
//! engine.prepare(48000.0, 512)?;
//!
//! // on the audio thread
//! engine.process_block(&mut channels, 2);
//!
//! // anywhere
//! params.set(ParamId::Fundamental, 6.0)?;
//! ```

pub mod config;
pub mod display;
pub mod process;
pub mod shared;
pub mod worker;

use crate::dsp::*;
use crate::error::{EngineError, EngineResult};
use crate::params::HarmonicParams;
use crate::settings::{DISPLAY_REFRESH_RATE_HZ, MIN_SAMPLE_RATE};
use process::EngineCore;
use shared::SharedState;
use std::sync::Arc;
use worker::{analysis_channels, AnalysisContext, AnalysisWorker};

pub use config::EngineConfig;
pub use display::{DisplayFeed, DisplaySnapshot};

/// The harmonic pitch tracker and EQ.
pub struct HarmonicEngine {
    config: EngineConfig,
    params: Arc<HarmonicParams>,
    shared: Arc<SharedState>,

    // the core holds the job sender, so it must go before the worker is
    // joined
    core: Option<EngineCore>,
    worker: Option<AnalysisWorker>,
    display: Option<DisplayFeed>,

    sample_rate: f64,
}

impl HarmonicEngine {
    /// Creates an unprepared engine with the default configuration. Until
    /// [`prepare()`](Self::prepare) succeeds, audio passes through untouched.
    pub fn new(params: Arc<HarmonicParams>) -> Self {
        let config = EngineConfig::default();
        let shared = SharedState::new(TrackedPitch::default());

        Self {
            config,
            params,
            shared: Arc::new(shared),

            core: None,
            worker: None,
            display: None,

            sample_rate: 0.0,
        }
    }

    /// Creates an unprepared engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_config(
        params: Arc<HarmonicParams>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let mut engine = Self::new(params);
        engine.config = config;

        Ok(engine)
    }

    /// Allocates every buffer, resets all state, and starts the analysis
    /// worker. May be called again to change the sample rate or block size;
    /// the previous worker is stopped first.
    ///
    /// # Errors
    ///
    /// Returns an error if `sample_rate` is below [`MIN_SAMPLE_RATE`] or not
    /// finite, if `max_block_size` is zero, or if the worker thread could not
    /// be spawned. The engine is left unprepared in that case.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
    ) -> EngineResult<()> {
        if !(sample_rate.is_finite() && sample_rate >= MIN_SAMPLE_RATE) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(EngineError::InvalidBlockSize(max_block_size));
        }

        self.shutdown();

        let config = &self.config;
        let initial =
            TrackedPitch::from_freq(config.initial_freq_hz, sample_rate);
        self.shared.reset(initial);

        let (dispatcher, queue) = analysis_channels(config.capture_window_size);
        let context = AnalysisContext::new(
            Arc::clone(&self.shared),
            PitchTracker::new(config.tracker_config()),
            VolumeEstimator::new(config.capture_gain),
            HarmonicFilterDesigner::new(sample_rate, config.filter_q),
        );

        self.worker = Some(AnalysisWorker::spawn(queue, context)?);
        self.core = Some(EngineCore::new(
            config,
            sample_rate,
            max_block_size,
            Arc::clone(&self.params),
            Arc::clone(&self.shared),
            dispatcher,
        ));
        self.sample_rate = sample_rate;

        log::info!(
            "engine prepared: {sample_rate} Hz, blocks of up to \
             {max_block_size} samples"
        );

        Ok(())
    }

    /// Processes one host buffer in place. See [`process::process()`].
    ///
    /// Before the engine is prepared, input channels pass through and any
    /// further channels are cleared.
    pub fn process_block(
        &mut self,
        buffer: &mut [&mut [f32]],
        num_inputs: usize,
    ) {
        if let Some(core) = &mut self.core {
            process::process(core, buffer, num_inputs);
            return;
        }

        for ch in buffer.iter_mut().skip(num_inputs) {
            ch.fill(0.0);
        }
    }

    /// Starts (or restarts) publishing [`DisplaySnapshot`]s at the default
    /// refresh rate, returning the reading end.
    ///
    /// # Errors
    ///
    /// Returns an error if the display thread could not be spawned.
    pub fn start_display(
        &mut self,
    ) -> EngineResult<triple_buffer::Output<DisplaySnapshot>> {
        self.start_display_at(DISPLAY_REFRESH_RATE_HZ)
    }

    /// Starts (or restarts) publishing [`DisplaySnapshot`]s at `rate_hz`.
    ///
    /// # Errors
    ///
    /// Returns an error if the display thread could not be spawned.
    ///
    /// # Panics
    ///
    /// Panics if `rate_hz` is not positive.
    pub fn start_display_at(
        &mut self,
        rate_hz: f64,
    ) -> EngineResult<triple_buffer::Output<DisplaySnapshot>> {
        self.display = None;

        let (feed, output) = DisplayFeed::start(
            Arc::clone(&self.shared),
            Arc::clone(&self.params),
            rate_hz,
        )?;
        self.display = Some(feed);

        Ok(output)
    }

    pub fn stop_display(&mut self) {
        self.display = None;
    }

    pub fn tracked_pitch(&self) -> TrackedPitch {
        self.shared.tracked_pitch()
    }

    pub fn average_volume(&self) -> f32 {
        self.shared.average_volume()
    }

    pub fn active_group(&self) -> GroupId {
        self.shared.filter_bank.active_group()
    }

    pub fn group_state(&self, group: GroupId) -> GroupState {
        self.shared.filter_bank.slot(group).state()
    }

    /// The design baked into the active filter group, or `None` if it still
    /// holds the initial pass-through coefficients (or the engine is not
    /// prepared).
    pub fn active_design(&self) -> Option<DesignRequest> {
        self.core.as_ref().and_then(|core| core.filter_bank.baked_request())
    }

    pub const fn is_prepared(&self) -> bool {
        self.core.is_some()
    }

    /// The prepared sample rate, or `None` if the engine is not prepared.
    pub fn sample_rate(&self) -> Option<f64> {
        self.is_prepared().then_some(self.sample_rate)
    }

    pub const fn params(&self) -> &Arc<HarmonicParams> {
        &self.params
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn shutdown(&mut self) {
        // dropping the core disconnects the job queue, letting the worker
        // finish
        self.core = None;
        self.worker = None;
    }
}

impl Drop for HarmonicEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;
    use crate::settings::INITIAL_FREQ_HZ;
    use std::f32::consts::TAU;
    use std::time::Duration;

    const SR: f64 = 48000.0;
    const BLOCK: usize = 512;

    /// A continuous test signal: `signal(n)` is sample `n`.
    struct Source<F: Fn(usize) -> f32> {
        signal: F,
        pos: usize,
    }

    impl<F: Fn(usize) -> f32> Source<F> {
        fn new(signal: F) -> Self {
            Self { signal, pos: 0 }
        }

        fn next_block(&mut self) -> Vec<f32> {
            let block = (self.pos..self.pos + BLOCK).map(&self.signal).collect();
            self.pos += BLOCK;
            block
        }
    }

    fn sine(freq: f32, amp: f32) -> impl Fn(usize) -> f32 {
        move |n| (TAU * freq * n as f32 / SR as f32).sin() * amp
    }

    fn square(freq: f32, amp: f32) -> impl Fn(usize) -> f32 {
        let s = sine(freq, 1.0);
        move |n| if s(n) >= 0.0 { amp } else { -amp }
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|s| s * s).sum::<f32>() / x.len() as f32).sqrt()
    }

    /// Processes stereo blocks of `source` until `done` holds, sleeping
    /// between blocks so the worker can keep up. Returns whether `done` was
    /// reached, and checks every block with `check(input, output)`.
    fn run_until<F: Fn(usize) -> f32>(
        engine: &mut HarmonicEngine,
        source: &mut Source<F>,
        max_blocks: usize,
        mut done: impl FnMut(&HarmonicEngine) -> bool,
        mut check: impl FnMut(&[f32], &[f32]),
    ) -> bool {
        for _ in 0..max_blocks {
            let input = source.next_block();
            let mut l = input.clone();
            let mut r = input.clone();

            engine.process_block(&mut [&mut l[..], &mut r[..]], 2);
            check(&input, &l);
            check(&input, &r);

            if done(engine) {
                return true;
            }

            std::thread::sleep(Duration::from_millis(1));
        }

        false
    }

    fn prepared_engine() -> HarmonicEngine {
        let mut engine = HarmonicEngine::new(Arc::new(HarmonicParams::new()));
        engine.prepare(SR, BLOCK).unwrap();
        engine
    }

    #[test]
    fn test_tracks_square_and_passes_input_through() {
        let mut engine = prepared_engine();
        let mut source = Source::new(square(110.0, 0.5));

        let converged = run_until(
            &mut engine,
            &mut source,
            2000,
            |e| (108.0..=112.0).contains(&e.tracked_pitch().freq_hz),
            |input, output| assert_eq!(input, output),
        );

        assert!(converged, "pitch: {:?}", engine.tracked_pitch());
        assert!((engine.average_volume() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_low_squares_only_publish_their_period() {
        for freq in [41.2, 46.25, 65.4] {
            let period = SR as f32 / freq;
            let mut engine = prepared_engine();
            let mut source = Source::new(square(freq, 0.5));
            let mut published = vec![engine.tracked_pitch().cycle_samples];

            let converged = run_until(
                &mut engine,
                &mut source,
                2000,
                |e| {
                    let cycle = e.tracked_pitch().cycle_samples;
                    if published.last() != Some(&cycle) {
                        published.push(cycle);
                    }
                    (cycle as f32 - period).abs() <= 2.0
                },
                |_, _| {},
            );

            assert!(converged, "{freq} Hz: published {published:?}");
            for &cycle in &published[1..] {
                assert!(
                    (cycle as f32 - period).abs() <= 2.0,
                    "{freq} Hz: published {published:?}, expected {period}"
                );
            }
        }
    }

    #[test]
    fn test_fundamental_boost_follows_pitch() {
        let params = Arc::new(HarmonicParams::new());
        params.set(ParamId::Fundamental, 15.0).unwrap();

        let mut engine = HarmonicEngine::new(Arc::clone(&params));
        engine.prepare(SR, BLOCK).unwrap();

        let mut source = Source::new(sine(110.0, 0.5));
        let designed = run_until(
            &mut engine,
            &mut source,
            2000,
            |e| {
                let pitch = e.tracked_pitch().freq_hz;
                (108.0..=112.0).contains(&pitch)
                    && e.active_design()
                        == Some(params.snapshot().design_request(pitch))
            },
            |_, _| {},
        );
        assert!(designed, "design: {:?}", engine.active_design());

        // let the swap settle, then measure
        let mut gains = Vec::new();
        run_until(&mut engine, &mut source, 40, |_| false, |input, output| {
            gains.push(rms(output) / rms(input));
        });
        let boost = gains[gains.len() - 8..].iter().sum::<f32>() / 8.0;
        assert!(boost > 3.0, "boost at the fundamental: {boost}");

        // far from every band, the input is left alone
        let mut source = Source::new(sine(1000.0, 0.5));
        let mut gains = Vec::new();
        run_until(&mut engine, &mut source, 40, |_| false, |input, output| {
            gains.push(rms(output) / rms(input));
        });
        let gain = gains[gains.len() - 8..].iter().sum::<f32>() / 8.0;
        assert!((0.85..1.15).contains(&gain), "gain at 1 kHz: {gain}");
    }

    #[test]
    fn test_quiet_input_is_ignored() {
        let params = Arc::new(HarmonicParams::new());
        params.set(ParamId::OddSynth, 0.0).unwrap();
        params.set(ParamId::EvenSynth, 0.0).unwrap();

        let mut engine = HarmonicEngine::new(params);
        engine.prepare(SR, BLOCK).unwrap();

        // mean level ~0.003, below the gate
        let mut source = Source::new(sine(110.0, 0.005));
        run_until(&mut engine, &mut source, 60, |_| false, |input, output| {
            assert_eq!(input, output);
        });

        assert!(engine.average_volume() > 0.0);
        assert_eq!(engine.tracked_pitch().freq_hz, INITIAL_FREQ_HZ);
        assert_eq!(engine.tracked_pitch().cycle_samples, 480);
    }

    #[test]
    fn test_with_config_tracks_channel_zero() {
        let config = EngineConfig { tracking_channel: 0, ..Default::default() };
        let mut engine =
            HarmonicEngine::with_config(Arc::new(HarmonicParams::new()), config)
                .unwrap();
        engine.prepare(SR, BLOCK).unwrap();

        // only the left channel carries the tone
        let mut source = Source::new(square(110.0, 0.5));
        let mut converged = false;
        for _ in 0..2000 {
            let mut l = source.next_block();
            let mut r = vec![0.0; BLOCK];
            engine.process_block(&mut [&mut l[..], &mut r[..]], 2);

            if (108.0..=112.0).contains(&engine.tracked_pitch().freq_hz) {
                converged = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert!(converged);
    }

    #[test]
    fn test_unprepared_engine_passes_through() {
        let mut engine = HarmonicEngine::new(Arc::new(HarmonicParams::new()));
        let input = vec![0.3; 64];
        let mut l = input.clone();
        let mut extra = vec![1.0; 64];

        engine.process_block(&mut [&mut l[..], &mut extra[..]], 1);

        assert!(!engine.is_prepared());
        assert_eq!(engine.sample_rate(), None);
        assert_eq!(l, input);
        assert!(extra.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_invalid_prepare_arguments() {
        let mut engine = HarmonicEngine::new(Arc::new(HarmonicParams::new()));

        assert!(matches!(
            engine.prepare(0.0, BLOCK),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(f64::NAN, BLOCK),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(1.0, BLOCK),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(MIN_SAMPLE_RATE - 1.0, BLOCK),
            Err(EngineError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            engine.prepare(SR, 0),
            Err(EngineError::InvalidBlockSize(0))
        ));
        assert!(!engine.is_prepared());
    }

    #[test]
    fn test_prepare_resets_state() {
        let mut engine = prepared_engine();
        let mut source = Source::new(square(110.0, 0.5));
        run_until(
            &mut engine,
            &mut source,
            2000,
            |e| e.tracked_pitch().cycle_samples != 480,
            |_, _| {},
        );

        engine.prepare(44100.0, 256).unwrap();

        assert_eq!(engine.sample_rate(), Some(44100.0));
        assert_eq!(engine.tracked_pitch().freq_hz, INITIAL_FREQ_HZ);
        assert_eq!(engine.tracked_pitch().cycle_samples, 441);
        assert_eq!(engine.average_volume(), 0.0);
        assert_eq!(engine.active_group(), GroupId::A);
        assert_eq!(engine.group_state(GroupId::B), GroupState::Idle);
        assert_eq!(engine.active_design(), None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig { max_freq_hz: 10.0, ..Default::default() };
        let params = Arc::new(HarmonicParams::new());

        assert!(matches!(
            HarmonicEngine::with_config(params, config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_display_survives_prepare() {
        let mut engine = prepared_engine();
        let mut output = engine.start_display_at(100.0).unwrap();

        engine.prepare(44100.0, BLOCK).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(output.read().cycle_samples, 441);
        engine.stop_display();
    }
}
