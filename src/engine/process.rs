//! Audio processing callback.

use super::{
    config::EngineConfig, shared::SharedState, worker::AnalysisDispatcher,
};
use crate::dsp::*;
use crate::params::HarmonicParams;
use crate::settings::MAX_BLOCK_SIZE;
use crate::util::AtomicOps;
use std::sync::Arc;

/// Everything the audio thread owns once the engine is prepared.
#[derive(Debug)]
pub struct EngineCore {
    pub(super) params: Arc<HarmonicParams>,
    pub(super) shared: Arc<SharedState>,
    pub(super) dispatcher: AnalysisDispatcher,

    pub(super) capture: CaptureWindow,
    pub(super) filter_bank: DoubleBufferedFilterBank,
    pub(super) oscillators: HarmonicOscillators,

    pub(super) block_size: usize,
    pub(super) volume_gate: f32,
    pub(super) tracking_channel: usize,
}

impl EngineCore {
    pub fn new(
        config: &EngineConfig,
        sample_rate: f64,
        max_block_size: usize,
        params: Arc<HarmonicParams>,
        shared: Arc<SharedState>,
        dispatcher: AnalysisDispatcher,
    ) -> Self {
        let block_size = max_block_size.min(MAX_BLOCK_SIZE);
        let initial = shared.tracked_pitch();

        Self {
            params,
            shared,
            dispatcher,

            capture: CaptureWindow::new(
                config.capture_window_size,
                config.capture_gain,
            ),
            filter_bank: DoubleBufferedFilterBank::new(sample_rate),
            oscillators: HarmonicOscillators::new(
                sample_rate,
                block_size,
                initial.cycle_samples,
            ),

            block_size,
            volume_gate: config.volume_gate,
            tracking_channel: config.tracking_channel,
        }
    }
}

/// Processes one host buffer in place.
///
/// `buffer` holds one slice per channel, all of the same length. The first
/// `num_inputs` channels carry input; any further channels are cleared.
/// Parameters, the tracked pitch and the average volume are read once at the
/// start of the call and held for the whole buffer.
pub fn process(
    core: &mut EngineCore,
    buffer: &mut [&mut [f32]],
    num_inputs: usize,
) {
    let num_inputs = num_inputs.min(buffer.len());
    let buffer_len = buffer.iter().map(|ch| ch.len()).min().unwrap_or(0);

    for ch in buffer.iter_mut().skip(num_inputs) {
        ch.fill(0.0);
    }

    if num_inputs == 0 || buffer_len == 0 {
        return;
    }

    let params = core.params.snapshot();
    let pitch = core.shared.tracked_pitch();
    let volume = core.shared.average_volume.la();

    // move the filter swap protocol along before any audio is touched
    let wanted = params.design_request(pitch.freq_hz);
    let dispatcher = &core.dispatcher;
    _ = core.filter_bank.update(
        &core.shared.filter_bank,
        &wanted,
        |target, request| dispatcher.request_design(target, request),
    );

    let synth = SynthBlockSettings {
        period_samples: pitch.cycle_samples,
        level: volume,
        gate: core.volume_gate,
        even_gain_db: params.even_synth_db,
        even_cutoff_hz: params.even_cutoff_hz,
        odd_gain_db: params.odd_synth_db,
        odd_cutoff_hz: params.odd_cutoff_hz,
    };

    let tracking_channel = core.tracking_channel.min(num_inputs - 1);

    let mut block_start: usize = 0;

    while block_start < buffer_len {
        let block_len = core.block_size.min(buffer_len - block_start);
        core.oscillators.render(block_len, &synth);

        for i in 0..block_len {
            let idx = block_start + i;
            let synth_sample = core.oscillators.sample_at(i);

            for (ch_idx, ch) in buffer.iter_mut().take(num_inputs).enumerate() {
                let input = ch[idx];

                if ch_idx == tracking_channel && core.capture.push(input) {
                    core.dispatcher.on_window_filled(core.capture.window());
                }

                let out = core
                    .filter_bank
                    .process(f64::from(input + synth_sample), ch_idx);
                ch[idx] = out as f32;
            }
        }

        block_start += block_len;
    }
}
