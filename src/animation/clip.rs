//! Keyframe tracks and their sampling.

use cgmath::{InnerSpace, Quaternion, Vector3, VectorSpace};

use crate::data_structures::instance::Instance;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Hermite spline. Values are stored as (in-tangent, value, out-tangent)
    /// triplets, one per key.
    CubicSpline,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<Vector3<f32>>),
    Rotation(Vec<Quaternion<f32>>),
    Scale(Vec<Vector3<f32>>),
}

/// One animated property of one node, targeted by node name.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub target: String,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
}

impl Track {
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Overwrite the animated property of `target` with its value at `time`.
    /// Tracks without keys leave the target untouched.
    pub fn apply(&self, time: f32, target: &mut Instance) {
        match &self.keyframes {
            Keyframes::Translation(values) => {
                if let Some(v) = sample(&self.times, values, self.interpolation, time) {
                    target.position = v;
                }
            }
            Keyframes::Rotation(values) => {
                if let Some(q) = sample(&self.times, values, self.interpolation, time) {
                    target.rotation = q.normalize();
                }
            }
            Keyframes::Scale(values) => {
                if let Some(v) = sample(&self.times, values, self.interpolation, time) {
                    target.scale = v;
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    /// Largest key time over all tracks.
    pub fn duration(&self) -> f32 {
        self.tracks.iter().map(Track::duration).fold(0.0, f32::max)
    }
}

/// A value that can be interpolated between keys.
pub trait Keyframe: Copy {
    fn lerp_to(self, other: Self, f: f32) -> Self;
    fn scaled(self, s: f32) -> Self;
    fn plus(self, other: Self) -> Self;
}

impl Keyframe for Vector3<f32> {
    fn lerp_to(self, other: Self, f: f32) -> Self {
        self.lerp(other, f)
    }

    fn scaled(self, s: f32) -> Self {
        self * s
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

impl Keyframe for Quaternion<f32> {
    /// Shortest-path slerp.
    fn lerp_to(self, other: Self, f: f32) -> Self {
        let other = if self.dot(other) < 0.0 { -other } else { other };
        self.slerp(other, f)
    }

    fn scaled(self, s: f32) -> Self {
        self * s
    }

    fn plus(self, other: Self) -> Self {
        self + other
    }
}

/// Value of a keyframe channel at `time`, clamped to the key range.
pub fn sample<V: Keyframe>(
    times: &[f32],
    values: &[V],
    interpolation: Interpolation,
    time: f32,
) -> Option<V> {
    let stride = match interpolation {
        Interpolation::CubicSpline => 3,
        _ => 1,
    };
    let keys = times.len().min(values.len() / stride);
    if keys == 0 {
        return None;
    }
    let value = |k: usize| match interpolation {
        Interpolation::CubicSpline => values[k * 3 + 1],
        _ => values[k],
    };

    if time <= times[0] {
        return Some(value(0));
    }
    if time >= times[keys - 1] {
        return Some(value(keys - 1));
    }
    // first key strictly after `time`
    let next = times[..keys].partition_point(|t| *t <= time);
    let prev = next - 1;
    let dt = times[next] - times[prev];
    if dt <= 0.0 {
        return Some(value(next));
    }
    let f = (time - times[prev]) / dt;

    Some(match interpolation {
        Interpolation::Step => value(prev),
        Interpolation::Linear => value(prev).lerp_to(value(next), f),
        Interpolation::CubicSpline => {
            let p0 = value(prev);
            let m0 = values[prev * 3 + 2].scaled(dt);
            let p1 = value(next);
            let m1 = values[next * 3].scaled(dt);
            let f2 = f * f;
            let f3 = f2 * f;
            p0.scaled(2.0 * f3 - 3.0 * f2 + 1.0)
                .plus(m0.scaled(f3 - 2.0 * f2 + f))
                .plus(p1.scaled(-2.0 * f3 + 3.0 * f2))
                .plus(m1.scaled(f3 - f2))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3};

    fn v(x: f32) -> Vector3<f32> {
        Vector3::new(x, 0.0, 0.0)
    }

    #[test]
    fn linear_interpolates_between_keys() {
        let times = [0.0, 1.0, 3.0];
        let values = [v(0.0), v(10.0), v(30.0)];
        let at = |t| sample(&times, &values, Interpolation::Linear, t).unwrap().x;
        assert_eq!(at(0.5), 5.0);
        assert_eq!(at(2.0), 20.0);
        assert_eq!(at(1.0), 10.0);
    }

    #[test]
    fn clamps_outside_the_key_range() {
        let times = [0.5, 1.0];
        let values = [v(1.0), v(2.0)];
        assert_eq!(sample(&times, &values, Interpolation::Linear, 0.0), Some(v(1.0)));
        assert_eq!(sample(&times, &values, Interpolation::Linear, 9.0), Some(v(2.0)));
    }

    #[test]
    fn step_holds_the_previous_key() {
        let times = [0.0, 1.0];
        let values = [v(1.0), v(2.0)];
        assert_eq!(sample(&times, &values, Interpolation::Step, 0.99), Some(v(1.0)));
    }

    #[test]
    fn cubic_spline_hits_keys_and_uses_tangents() {
        let times = [0.0, 1.0];
        // (in, value, out) per key; zero tangents give a smoothstep
        let values = [v(0.0), v(0.0), v(0.0), v(0.0), v(1.0), v(0.0)];
        let at = |t| sample(&times, &values, Interpolation::CubicSpline, t).unwrap().x;
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(1.0), 1.0);
        assert!((at(0.5) - 0.5).abs() < 1e-6);
        assert!((at(0.25) - 0.15625).abs() < 1e-6);
    }

    #[test]
    fn rotations_take_the_short_way() {
        let a = Quaternion::from_angle_y(Deg(10.0));
        let b = -Quaternion::from_angle_y(Deg(30.0));
        let mid = sample(&[0.0, 1.0], &[a, b], Interpolation::Linear, 0.5).unwrap();
        let expected = Quaternion::from_angle_y(Deg(20.0));
        assert!(mid.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn empty_tracks_leave_the_target_alone() {
        let track = Track {
            target: "hips".to_string(),
            interpolation: Interpolation::Linear,
            times: Vec::new(),
            keyframes: Keyframes::Translation(Vec::new()),
        };
        let mut instance = Instance::from(v(3.0));
        track.apply(0.5, &mut instance);
        assert_eq!(instance.position, v(3.0));
        assert_eq!(track.duration(), 0.0);
    }

    #[test]
    fn clip_duration_is_the_last_key() {
        let track = |end: f32| Track {
            target: "n".to_string(),
            interpolation: Interpolation::Linear,
            times: vec![0.0, end],
            keyframes: Keyframes::Scale(vec![v(1.0), v(2.0)]),
        };
        let clip = AnimationClip::new("idle", vec![track(1.5), track(2.25)]);
        assert_eq!(clip.duration(), 2.25);
    }
}
