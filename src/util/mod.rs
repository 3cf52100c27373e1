//! Global utility functions, publicly re-exported in `prelude.rs`.

pub mod atomic_ops;
pub mod general;
pub mod timer;

pub use atomic_ops::AtomicOps;
pub use general::*;
pub use timer::TimerThread;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_amplitude_conversion() {
        let level = 0.5;
        let db = level_to_db(level);
        assert_relative_eq!(db, -6.020_599_913_279_624);
        assert_relative_eq!(db_to_level(db), level);
    }

    #[test]
    fn test_f32_db_conversion() {
        assert_relative_eq!(db_to_level_f32(0.0), 1.0);
        assert_relative_eq!(db_to_level_f32(-100.0), 1e-5, epsilon = 1e-9);
    }

    #[test]
    fn test_epsilon_eq() {
        assert!(epsilon_eq(0.1 + 0.2, 0.3));
        assert!(!epsilon_eq(0.0, 1e-9));
    }

    #[test]
    fn test_mean_abs() {
        assert_eq!(mean_abs(&[]), 0.0);
        assert_relative_eq!(mean_abs(&[0.5, -0.5, 0.25, -0.25]), 0.375);
    }

    #[test]
    fn test_mean_abs_of_long_buffer() {
        // an f32 running sum drifts well past this over 3000 samples
        assert_relative_eq!(mean_abs(&[0.8; 3000]), 0.8, epsilon = 1e-7);
        assert_relative_eq!(mean_abs(&[-0.1; 100_000]), 0.1, epsilon = 1e-8);
    }
}
