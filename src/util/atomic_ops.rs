//! Shorthand atomic load and store operations for the atomic types shared
//! between the audio thread and the analysis thread.
use atomic::Atomic;
use atomic_float::{AtomicF32, AtomicF64};
use bytemuck::NoUninit;
use std::sync::atomic::{
    AtomicBool, AtomicU32, AtomicUsize,
    Ordering::{Acquire, Relaxed, Release},
};

/// Trait for shorthand load and store operations.
///
/// `lr`/`sr` are relaxed and suit values with no dependent data. `la`/`sr_rel`
/// form an acquire/release pair and must be used when the stored value
/// publishes other writes (e.g. a "ready" flag guarding coefficients).
pub trait AtomicOps {
    type NonAtomic;

    /// Shorthand method for `self.load(Relaxed)`.
    fn lr(&self) -> Self::NonAtomic;
    /// Shorthand method for `self.store(value, Relaxed)`.
    fn sr(&self, value: Self::NonAtomic);
    /// Shorthand method for `self.load(Acquire)`.
    fn la(&self) -> Self::NonAtomic;
    /// Shorthand method for `self.store(value, Release)`.
    fn sr_rel(&self, value: Self::NonAtomic);
}

macro_rules! impl_atomic_ops {
    ($($atomic:ty => $plain:ty),* $(,)?) => {
        $(
            impl AtomicOps for $atomic {
                type NonAtomic = $plain;

                fn lr(&self) -> Self::NonAtomic {
                    self.load(Relaxed)
                }

                fn sr(&self, value: Self::NonAtomic) {
                    self.store(value, Relaxed);
                }

                fn la(&self) -> Self::NonAtomic {
                    self.load(Acquire)
                }

                fn sr_rel(&self, value: Self::NonAtomic) {
                    self.store(value, Release);
                }
            }
        )*
    };
}

impl_atomic_ops! {
    AtomicBool => bool,
    AtomicU32 => u32,
    AtomicUsize => usize,
    AtomicF32 => f32,
    AtomicF64 => f64,
}

impl<T: Copy + NoUninit> AtomicOps for Atomic<T> {
    type NonAtomic = T;

    fn lr(&self) -> Self::NonAtomic {
        self.load(Relaxed)
    }

    fn sr(&self, value: Self::NonAtomic) {
        self.store(value, Relaxed);
    }

    fn la(&self) -> Self::NonAtomic {
        self.load(Acquire)
    }

    fn sr_rel(&self, value: Self::NonAtomic) {
        self.store(value, Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_round_trip() {
        let flag = AtomicBool::new(false);
        flag.sr_rel(true);
        assert!(flag.la());

        let value = AtomicF32::new(0.0);
        value.sr(0.25);
        assert!((value.lr() - 0.25).abs() < f32::EPSILON);

        let count = AtomicUsize::new(3);
        count.sr(count.lr() + 1);
        assert_eq!(count.la(), 4);
    }
}
