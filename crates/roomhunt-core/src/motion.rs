//! Device motion: reference-attitude latch and camera/gravity derivation.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Device orientation in radians.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

/// One reading of the device-motion stream.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MotionSample {
    pub attitude: Attitude,
    /// Gravity in the device frame, in units of g.
    #[serde(default)]
    pub gravity: [f64; 3],
}

impl MotionSample {
    pub fn new(attitude: Attitude, gravity: [f64; 3]) -> Self {
        Self { attitude, gravity }
    }

    fn is_finite(&self) -> bool {
        self.attitude.is_finite() && self.gravity.iter().all(|g| g.is_finite())
    }
}

/// How the vertical gravity component is derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GravityMode {
    /// Horizontal axes follow the sensor, vertical is always straight down.
    #[default]
    PinnedVertical,
    /// All three axes follow the sensor.
    Sensor,
}

/// Camera and world changes derived from one accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionUpdate {
    /// Rotation about the camera's local X axis, applied on top of its base orientation.
    pub pitch_offset: f32,
    /// Rotation about the world vertical axis.
    pub yaw_offset: f32,
    pub gravity: Vec3,
}

/// Converts raw samples into [`MotionUpdate`]s relative to the first sample seen.
#[derive(Debug, Clone)]
pub struct MotionTracker {
    reference: Option<Attitude>,
    gravity_magnitude: f32,
    mode: GravityMode,
    accepted: u64,
    skipped: u64,
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new(9.8, GravityMode::default())
    }
}

impl MotionTracker {
    pub fn new(gravity_magnitude: f32, mode: GravityMode) -> Self {
        Self {
            reference: None,
            gravity_magnitude,
            mode,
            accepted: 0,
            skipped: 0,
        }
    }

    /// Attitude latched from the first usable sample.
    pub fn reference(&self) -> Option<Attitude> {
        self.reference
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Processes one tick of the motion stream.
    ///
    /// Absent and non-finite samples are skipped and yield `None`. The first
    /// usable sample becomes the reference; it is never replaced afterwards.
    pub fn on_sample(&mut self, sample: Option<&MotionSample>) -> Option<MotionUpdate> {
        let Some(sample) = sample.filter(|s| s.is_finite()) else {
            self.skipped += 1;
            tracing::trace!("[motion] skipped sample");
            return None;
        };

        let reference = *self.reference.get_or_insert_with(|| {
            tracing::debug!(
                "[motion] reference attitude latched: pitch={:.3} yaw={:.3}",
                sample.attitude.pitch,
                sample.attitude.yaw
            );
            sample.attitude
        });
        self.accepted += 1;

        // The camera turns opposite to the device delta, so the offsets are
        // the negated (reference - sample) differences.
        let pitch_offset = -(reference.pitch - sample.attitude.pitch) as f32;
        let yaw_offset = -(reference.yaw - sample.attitude.yaw) as f32;

        Some(MotionUpdate {
            pitch_offset,
            yaw_offset,
            gravity: self.gravity(sample),
        })
    }

    fn gravity(&self, sample: &MotionSample) -> Vec3 {
        let [gx, gy, gz] = sample.gravity.map(|g| g as f32);
        let g = self.gravity_magnitude;
        let vertical = match self.mode {
            GravityMode::PinnedVertical => -g,
            GravityMode::Sensor => gz * g,
        };
        Vec3::new(gx * g, gy * g, vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pitch: f64, yaw: f64) -> MotionSample {
        MotionSample::new(Attitude::new(0.3, pitch, yaw), [0.1, -0.2, -0.97])
    }

    #[test]
    fn test_absent_sample_is_skipped() {
        let mut tracker = MotionTracker::default();
        assert!(tracker.on_sample(None).is_none());
        assert!(tracker.reference().is_none());
        assert_eq!(tracker.skipped(), 1);
    }

    #[test]
    fn test_first_sample_latches_reference() {
        let mut tracker = MotionTracker::default();

        let update = tracker.on_sample(Some(&sample(0.5, 1.0))).unwrap();

        assert_eq!(tracker.reference().unwrap().pitch, 0.5);
        assert_eq!(update.pitch_offset, 0.0);
        assert_eq!(update.yaw_offset, 0.0);
    }

    #[test]
    fn test_reference_never_overwritten() {
        let mut tracker = MotionTracker::default();
        tracker.on_sample(Some(&sample(0.5, 1.0)));
        let latched = tracker.reference();

        for i in 0..10 {
            tracker.on_sample(Some(&sample(f64::from(i) * 0.1, -f64::from(i))));
            tracker.on_sample(None);
            assert_eq!(tracker.reference(), latched);
        }
        assert_eq!(tracker.accepted(), 11);
    }

    #[test]
    fn test_absent_before_first_does_not_latch() {
        let mut tracker = MotionTracker::default();
        tracker.on_sample(None);
        tracker.on_sample(Some(&sample(0.2, 0.0)));
        assert_eq!(tracker.reference().unwrap().pitch, 0.2);
    }

    #[test]
    fn test_offsets_follow_device_delta() {
        let mut tracker = MotionTracker::default();
        tracker.on_sample(Some(&sample(0.5, 1.0)));

        let update = tracker.on_sample(Some(&sample(0.7, 0.75))).unwrap();

        assert!((update.pitch_offset - 0.2).abs() < 1e-6);
        assert!((update.yaw_offset + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_sample_is_skipped() {
        let mut tracker = MotionTracker::default();
        let bad = MotionSample::new(Attitude::new(0.0, f64::NAN, 0.0), [0.0, 0.0, -1.0]);

        assert!(tracker.on_sample(Some(&bad)).is_none());
        assert!(tracker.reference().is_none());
    }

    #[test]
    fn test_pinned_vertical_gravity() {
        let mut tracker = MotionTracker::new(9.8, GravityMode::PinnedVertical);
        let update = tracker.on_sample(Some(&sample(0.0, 0.0))).unwrap();

        assert!((update.gravity.x - 0.98).abs() < 1e-5);
        assert!((update.gravity.y + 1.96).abs() < 1e-5);
        assert_eq!(update.gravity.z, -9.8);
    }

    #[test]
    fn test_sensor_gravity_follows_vertical() {
        let mut tracker = MotionTracker::new(9.8, GravityMode::Sensor);
        let update = tracker.on_sample(Some(&sample(0.0, 0.0))).unwrap();

        assert!((update.gravity.z + 0.97 * 9.8).abs() < 1e-4);
    }
}
