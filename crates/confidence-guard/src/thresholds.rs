use std::sync::atomic::{AtomicU32, Ordering};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
pub const DEFAULT_SAFETY_THRESHOLD: f32 = 0.85;

/// Operator-tunable confidence thresholds.
///
/// The general threshold is a single atomically replaced value; readers
/// never block. The safety bar for critical actions is fixed at
/// construction and never reads lower than the general threshold.
#[derive(Debug)]
pub struct ConfidenceThresholds {
    general: AtomicU32,
    safety: f32,
}

impl ConfidenceThresholds {
    pub fn new(confidence_threshold: f32, safety_threshold: f32) -> Self {
        Self {
            general: AtomicU32::new(
                clamp_or(confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD).to_bits(),
            ),
            safety: clamp_or(safety_threshold, DEFAULT_SAFETY_THRESHOLD),
        }
    }

    pub fn confidence_threshold(&self) -> f32 {
        f32::from_bits(self.general.load(Ordering::Relaxed))
    }

    /// Replace the general threshold, clamped to [0, 1]. NaN is ignored.
    /// Returns the value in effect afterwards.
    pub fn set_confidence_threshold(&self, value: f32) -> f32 {
        if value.is_nan() {
            tracing::warn!("ignoring NaN confidence threshold");
            return self.confidence_threshold();
        }
        let clamped = value.clamp(0.0, 1.0);
        if clamped != value {
            tracing::warn!(requested = value, applied = clamped, "confidence threshold clamped");
        }
        self.general.store(clamped.to_bits(), Ordering::Relaxed);
        tracing::info!(threshold = clamped, "confidence threshold updated");
        clamped
    }

    /// Bar applied to critical actions
    pub fn safety_threshold(&self) -> f32 {
        self.safety.max(self.confidence_threshold())
    }
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_SAFETY_THRESHOLD)
    }
}

fn clamp_or(value: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}
