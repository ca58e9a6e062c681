//! Output gain staging and soft limiting

/// Overall output attenuation before polyphony compensation
pub const MASTER_GAIN: f32 = 0.4;

/// Level above which the limiter starts bending the signal
pub const LIMIT_THRESHOLD: f32 = 0.95;

/// Width of the saturation region above the threshold
const LIMIT_KNEE: f32 = 0.05;

/// Block gain for `active_voices` simultaneous notes
///
/// Equal-power compensation: `MASTER_GAIN / sqrt(n)`. Zero voices yield 0.
#[inline]
pub fn total_gain(active_voices: usize) -> f32 {
    if active_voices == 0 {
        return 0.0;
    }
    MASTER_GAIN / (active_voices as f32).sqrt()
}

/// Soft limiter
///
/// Identity within +/-0.95; above that, a tanh curve approaches (but never
/// reaches) +/-1.0. Continuous at the threshold. NaN becomes silence.
#[inline]
pub fn soft_limit(sample: f32) -> f32 {
    if sample.is_nan() {
        return 0.0;
    }
    let magnitude = sample.abs();
    if magnitude > LIMIT_THRESHOLD {
        let bent = LIMIT_THRESHOLD + LIMIT_KNEE * ((magnitude - LIMIT_THRESHOLD) / LIMIT_KNEE).tanh();
        bent.copysign(sample)
    } else {
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_below_threshold() {
        for i in -95..=95 {
            let x = i as f32 / 100.0;
            assert_eq!(soft_limit(x), x);
        }
    }

    #[test]
    fn test_full_scale_maps_inside_ceiling() {
        let y = soft_limit(1.0);
        assert!(y > 0.95 && y < 1.0, "got {}", y);
        assert_eq!(soft_limit(-1.0), -y);
    }

    #[test]
    fn test_continuous_at_threshold() {
        let just_above = soft_limit(LIMIT_THRESHOLD + 1e-4);
        assert!((just_above - LIMIT_THRESHOLD).abs() < 2e-4);
        let just_below = soft_limit(-LIMIT_THRESHOLD - 1e-4);
        assert!((just_below + LIMIT_THRESHOLD).abs() < 2e-4);
    }

    #[test]
    fn test_large_inputs_bounded() {
        for x in [2.0, 10.0, 1e6] {
            let y = soft_limit(x);
            assert!(y <= 1.0 && y > 0.95);
            assert!(soft_limit(-x) >= -1.0);
        }
    }

    #[test]
    fn test_non_finite_inputs_stay_in_range() {
        assert_eq!(soft_limit(f32::NAN), 0.0);
        assert!((0.95..=1.0).contains(&soft_limit(f32::INFINITY)));
        assert!((-1.0..=-0.95).contains(&soft_limit(f32::NEG_INFINITY)));
    }

    #[test]
    fn test_total_gain_equal_power() {
        assert_eq!(total_gain(0), 0.0);
        assert!((total_gain(1) - 0.4).abs() < 1e-6);
        for k in 1..=16usize {
            let expected = 0.4 / (k as f32).sqrt();
            assert!((total_gain(k) - expected).abs() < 1e-6);
            // k unison voices at full scale keep the same power as one
            let summed_power = (k as f32 * total_gain(k)).powi(2) / k as f32;
            assert!((summed_power - 0.16).abs() < 1e-4);
        }
    }
}
