//! Double-buffered harmonic filter bank.
//!
//! Two complete stereo filter groups exist. The audio thread only ever runs
//! the active group; the analysis thread designs coefficients into a
//! [`CoefficientSlot`] belonging to the other group, and the audio thread
//! installs them and flips the active group between blocks.
//!
//! Each slot moves through `Idle -> Designing -> Ready -> Active -> Idle`.
//! The audio thread claims a slot (`Idle -> Designing`) before asking for a
//! design, the designer publishes it (`Designing -> Ready`), and the audio
//! thread swaps it in (`Ready -> Active`, previous `Active -> Idle`).

use super::designer::{CoefficientSet, DesignRequest};
use crate::dsp::{
    BiquadCoefs, BiquadFilter, BiquadState, Effect, Filter, StereoWrapper,
};
use crate::settings::{NUM_BIQUAD_COEFS, NUM_HARMONIC_BANDS};
use crate::util::AtomicOps;
use atomic::Atomic;
use atomic_float::{AtomicF32, AtomicF64};
use bytemuck::NoUninit;
use std::sync::atomic::Ordering::{AcqRel, Acquire};

/// Identifies one of the two filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GroupId {
    #[default]
    A,
    B,
}

unsafe impl NoUninit for GroupId {}

impl GroupId {
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The lifecycle state of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GroupState {
    /// Unused, and free to be claimed for a new design.
    #[default]
    Idle,
    /// Claimed; the designer is (or will be) writing its coefficients.
    Designing,
    /// Holds freshly designed coefficients waiting to be swapped in.
    Ready,
    /// Processing audio.
    Active,
}

unsafe impl NoUninit for GroupState {}

/// Coefficients for one group, shared between the designer and the audio
/// thread.
///
/// The coefficients and request are written with relaxed stores, then
/// published by a release store of [`GroupState::Ready`]; the audio thread
/// reads them only after an acquire load observes `Ready`.
#[derive(Debug)]
pub struct CoefficientSlot {
    state: Atomic<GroupState>,

    freq_hz: AtomicF32,
    fundamental_db: AtomicF32,
    odd_db: AtomicF32,
    even_db: AtomicF32,

    coefs: [[AtomicF64; NUM_BIQUAD_COEFS]; NUM_HARMONIC_BANDS],
}

impl CoefficientSlot {
    fn new(state: GroupState) -> Self {
        let identity = BiquadCoefs::identity().to_array();

        Self {
            state: Atomic::new(state),

            freq_hz: AtomicF32::new(0.0),
            fundamental_db: AtomicF32::new(0.0),
            odd_db: AtomicF32::new(0.0),
            even_db: AtomicF32::new(0.0),

            coefs: std::array::from_fn(|_| identity.map(AtomicF64::new)),
        }
    }

    pub fn state(&self) -> GroupState {
        self.state.la()
    }

    /// Claims an idle slot for a new design. Returns `false` if the slot is
    /// not idle.
    pub fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(
                GroupState::Idle,
                GroupState::Designing,
                AcqRel,
                Acquire,
            )
            .is_ok()
    }

    /// Returns a claimed slot to idle, e.g. when the design job could not be
    /// queued.
    pub fn release_claim(&self) {
        _ = self.state.compare_exchange(
            GroupState::Designing,
            GroupState::Idle,
            AcqRel,
            Acquire,
        );
    }

    /// Stores a design and marks the slot ready. Does nothing and returns
    /// `false` unless the slot is currently claimed for design.
    pub fn publish(
        &self,
        request: &DesignRequest,
        set: &CoefficientSet,
    ) -> bool {
        if self.state.la() != GroupState::Designing {
            return false;
        }

        self.freq_hz.sr(request.freq_hz);
        self.fundamental_db.sr(request.fundamental_db);
        self.odd_db.sr(request.odd_db);
        self.even_db.sr(request.even_db);

        for (cells, coefs) in self.coefs.iter().zip(set) {
            for (cell, value) in cells.iter().zip(coefs.to_array()) {
                cell.sr(value);
            }
        }

        self.state.sr_rel(GroupState::Ready);
        true
    }

    /// Reads the published design. Only meaningful once [`state()`] has
    /// returned `Ready`.
    ///
    /// [`state()`]: Self::state
    fn read(&self) -> (DesignRequest, CoefficientSet) {
        let request = DesignRequest {
            freq_hz: self.freq_hz.lr(),
            fundamental_db: self.fundamental_db.lr(),
            odd_db: self.odd_db.lr(),
            even_db: self.even_db.lr(),
        };

        let set = std::array::from_fn(|band| {
            let cells = &self.coefs[band];
            BiquadCoefs::from_array(cells.each_ref().map(|c| c.lr()))
        });

        (request, set)
    }
}

/// The state shared between the audio thread and the designer.
#[derive(Debug)]
pub struct FilterBankShared {
    slots: [CoefficientSlot; 2],
    active: Atomic<GroupId>,
}

impl FilterBankShared {
    /// Group A starts active (with identity coefficients) and B idle.
    pub fn new() -> Self {
        Self {
            slots: [
                CoefficientSlot::new(GroupState::Active),
                CoefficientSlot::new(GroupState::Idle),
            ],
            active: Atomic::new(GroupId::A),
        }
    }

    pub fn slot(&self, group: GroupId) -> &CoefficientSlot {
        &self.slots[group.index()]
    }

    pub fn active_group(&self) -> GroupId {
        self.active.la()
    }

    /// Publishes a finished design into `target`. This is a no-op returning
    /// `false` if `target` is the active group or was not claimed.
    pub fn publish(
        &self,
        target: GroupId,
        request: &DesignRequest,
        set: &CoefficientSet,
    ) -> bool {
        if self.active_group() == target {
            return false;
        }

        self.slot(target).publish(request, set)
    }

    /// Restores the initial state. Must not be called while audio is being
    /// processed or a design is in flight.
    pub fn reset(&self) {
        self.slots[0].state.sr_rel(GroupState::Active);
        self.slots[1].state.sr_rel(GroupState::Idle);
        self.active.sr_rel(GroupId::A);
    }
}

impl Default for FilterBankShared {
    fn default() -> Self {
        Self::new()
    }
}

/// The seven harmonic peaking filters for one channel, run in series.
#[derive(Debug, Clone)]
pub struct HarmonicFilterChain {
    filters: [BiquadFilter; NUM_HARMONIC_BANDS],
    sample_rate: f64,
}

impl HarmonicFilterChain {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            filters: std::array::from_fn(|_| BiquadFilter::new(sample_rate)),
            sample_rate,
        }
    }

    pub fn set_coefs(&mut self, set: &CoefficientSet) {
        for (filter, &coefs) in self.filters.iter_mut().zip(set) {
            filter.set_coefs(coefs);
        }
    }

    pub fn coefs(&self) -> CoefficientSet {
        self.filters.each_ref().map(BiquadFilter::coefs)
    }

    pub fn states(&self) -> [BiquadState; NUM_HARMONIC_BANDS] {
        self.filters.each_ref().map(BiquadFilter::state)
    }

    pub fn set_states(&mut self, states: &[BiquadState; NUM_HARMONIC_BANDS]) {
        for (filter, &state) in self.filters.iter_mut().zip(states) {
            filter.set_state(state);
        }
    }
}

impl Effect for HarmonicFilterChain {
    fn process_mono(&mut self, mut input: f64, _: usize) -> f64 {
        for filter in &mut self.filters {
            input = filter.process(input);
        }

        input
    }

    fn reset(&mut self) {
        self.filters.iter_mut().for_each(Filter::reset);
    }

    fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

/// What happened when the audio thread checked for a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The active group already matches the wanted design.
    Current,
    /// The other group was swapped in.
    Swapped,
    /// A design for the other group was requested.
    Requested,
    /// The other group is still being designed (or no request could be
    /// queued); the active group keeps processing with stale coefficients.
    Waiting,
}

/// The audio thread's side of the filter bank: two stereo filter groups and
/// the knowledge of what each was designed for.
#[derive(Debug, Clone)]
pub struct DoubleBufferedFilterBank {
    groups: [StereoWrapper<HarmonicFilterChain>; 2],
    active: GroupId,
    /// The design baked into the active group, or `None` for the initial
    /// identity coefficients.
    baked: Option<DesignRequest>,
}

impl DoubleBufferedFilterBank {
    pub fn new(sample_rate: f64) -> Self {
        let group = StereoWrapper::from_single(HarmonicFilterChain::new(
            sample_rate,
        ));

        Self {
            groups: [group.clone(), group],
            active: GroupId::A,
            baked: None,
        }
    }

    pub const fn active_group(&self) -> GroupId {
        self.active
    }

    pub const fn baked_request(&self) -> Option<DesignRequest> {
        self.baked
    }

    /// The coefficients of the active group's left channel.
    pub fn active_coefs(&self) -> CoefficientSet {
        self.groups[self.active.index()].l.coefs()
    }

    /// Checks, once per block, whether the active group is out of date with
    /// `wanted` and moves the swap protocol along.
    ///
    /// `dispatch` is asked to queue a design of `wanted` for the given group
    /// and returns whether it succeeded. It is never called for the active
    /// group.
    pub fn update(
        &mut self,
        shared: &FilterBankShared,
        wanted: &DesignRequest,
        mut dispatch: impl FnMut(GroupId, DesignRequest) -> bool,
    ) -> SwapOutcome {
        if self.baked.as_ref() == Some(wanted) {
            return SwapOutcome::Current;
        }

        let other = self.active.other();
        let slot = shared.slot(other);

        match slot.state() {
            GroupState::Ready => {
                self.swap_in(shared, other);

                // the swapped-in design may already be out of date
                if self.baked.as_ref() != Some(wanted) {
                    let target = self.active.other();
                    Self::request(shared, target, wanted, &mut dispatch);
                }

                SwapOutcome::Swapped
            }
            GroupState::Idle => {
                if Self::request(shared, other, wanted, &mut dispatch) {
                    SwapOutcome::Requested
                }
                else {
                    SwapOutcome::Waiting
                }
            }
            GroupState::Designing | GroupState::Active => SwapOutcome::Waiting,
        }
    }

    /// Processes one sample of channel `ch_idx` through the active group.
    /// Channels other than the first two pass through.
    #[inline]
    pub fn process(&mut self, sample: f64, ch_idx: usize) -> f64 {
        self.groups[self.active.index()].process_mono(sample, ch_idx)
    }

    /// Restores the initial state: group A active with identity coefficients
    /// and cleared filter state.
    pub fn reset(&mut self, shared: &FilterBankShared) {
        let identity = [BiquadCoefs::identity(); NUM_HARMONIC_BANDS];

        for group in &mut self.groups {
            group.for_each_mut(|chain| chain.set_coefs(&identity));
            group.reset();
        }

        self.active = GroupId::A;
        self.baked = None;
        shared.reset();
    }

    fn swap_in(&mut self, shared: &FilterBankShared, incoming: GroupId) {
        let outgoing = self.active;
        let (request, set) = shared.slot(incoming).read();

        let [a, b] = &mut self.groups;
        let (from, to) = match incoming {
            GroupId::A => (b, a),
            GroupId::B => (a, b),
        };

        // carry the signal history over so the swap doesn't restart the
        // filters from silence
        to.l.set_states(&from.l.states());
        to.r.set_states(&from.r.states());
        to.for_each_mut(|chain| chain.set_coefs(&set));

        shared.slot(outgoing).state.sr_rel(GroupState::Idle);
        shared.slot(incoming).state.sr_rel(GroupState::Active);
        shared.active.sr_rel(incoming);

        self.active = incoming;
        self.baked = Some(request);
    }

    fn request(
        shared: &FilterBankShared,
        target: GroupId,
        wanted: &DesignRequest,
        dispatch: &mut impl FnMut(GroupId, DesignRequest) -> bool,
    ) -> bool {
        let slot = shared.slot(target);

        if !slot.try_claim() {
            return false;
        }

        if dispatch(target, *wanted) {
            return true;
        }

        slot.release_claim();
        false
    }
}
