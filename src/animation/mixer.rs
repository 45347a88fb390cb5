//! Plays one clip at a time on a skeleton.

use std::collections::HashMap;

use instant::Duration;

use crate::{
    animation::clip::AnimationClip,
    data_structures::{instance::Instance, skeleton::Skeleton},
    error::ViewerError,
};

#[derive(Clone, Debug)]
struct ActiveClip {
    clip: usize,
    /// (track index, node index) for every track whose target exists.
    bindings: Vec<(usize, usize)>,
    duration: f32,
    time: f32,
}

#[derive(Clone, Debug)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    nodes: HashMap<String, usize>,
    rest: Vec<Instance>,
    pose: Vec<Instance>,
    active: Option<ActiveClip>,
}

impl AnimationMixer {
    pub fn new(skeleton: &Skeleton, clips: Vec<AnimationClip>) -> Self {
        let nodes = skeleton
            .nodes()
            .iter()
            .enumerate()
            .rev()
            .map(|(idx, node)| (node.name.clone(), idx))
            .collect();
        let rest = skeleton.rest_pose();
        Self {
            clips,
            nodes,
            pose: rest.clone(),
            rest,
            active: None,
        }
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|clip| clip.name.as_str())
    }

    /// Start `name` from time zero, binding its tracks to nodes by name.
    pub fn play(&mut self, name: &str) -> Result<(), ViewerError> {
        let clip_idx = self
            .clips
            .iter()
            .position(|clip| clip.name == name)
            .ok_or_else(|| ViewerError::MissingClip(name.to_string()))?;
        let clip = &self.clips[clip_idx];

        let mut bindings = Vec::with_capacity(clip.tracks.len());
        for (track_idx, track) in clip.tracks.iter().enumerate() {
            match self.nodes.get(&track.target) {
                Some(&node) => bindings.push((track_idx, node)),
                None => log::warn!(
                    "Clip {} animates node {} which the model does not have",
                    name,
                    track.target
                ),
            }
        }
        log::info!(
            "Playing clip {} ({:.2}s, {} tracks)",
            name,
            clip.duration(),
            bindings.len()
        );
        self.active = Some(ActiveClip {
            clip: clip_idx,
            bindings,
            duration: clip.duration(),
            time: 0.0,
        });
        self.evaluate();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.active = None;
        self.pose.clone_from(&self.rest);
    }

    pub fn playing(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|active| self.clips[active.clip].name.as_str())
    }

    /// Current time within the playing clip.
    pub fn time(&self) -> f32 {
        self.active.as_ref().map_or(0.0, |active| active.time)
    }

    /// Advance the playing clip, wrapping at its duration.
    pub fn update(&mut self, dt: Duration) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.time = if active.duration > 0.0 {
            (active.time + dt.as_secs_f32()) % active.duration
        } else {
            0.0
        };
        self.evaluate();
    }

    /// Local transform of every node.
    pub fn pose(&self) -> &[Instance] {
        &self.pose
    }

    fn evaluate(&mut self) {
        self.pose.clone_from(&self.rest);
        let Some(active) = &self.active else {
            return;
        };
        let clip = &self.clips[active.clip];
        for &(track, node) in &active.bindings {
            clip.tracks[track].apply(active.time, &mut self.pose[node]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::clip::{Interpolation, Keyframes, Track},
        data_structures::skeleton::Node,
    };
    use cgmath::Vector3;

    fn skeleton() -> Skeleton {
        Skeleton::new(
            vec![Node {
                name: "hips".to_string(),
                parent: None,
                rest: Instance::new(),
            }],
            Vec::new(),
        )
        .unwrap()
    }

    fn bob(target: &str) -> AnimationClip {
        AnimationClip::new(
            "idle",
            vec![Track {
                target: target.to_string(),
                interpolation: Interpolation::Linear,
                times: vec![0.0, 2.0],
                keyframes: Keyframes::Translation(vec![
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(0.0, 4.0, 0.0),
                ]),
            }],
        )
    }

    #[test]
    fn unknown_clip_is_an_error() {
        let mut mixer = AnimationMixer::new(&skeleton(), vec![bob("hips")]);
        assert_eq!(
            mixer.play("run"),
            Err(ViewerError::MissingClip("run".to_string()))
        );
        assert_eq!(mixer.playing(), None);
    }

    #[test]
    fn update_advances_the_pose() {
        let mut mixer = AnimationMixer::new(&skeleton(), vec![bob("hips")]);
        mixer.play("idle").unwrap();
        mixer.update(Duration::from_millis(500));
        assert_eq!(mixer.pose()[0].position.y, 1.0);
    }

    #[test]
    fn time_loops_modulo_duration() {
        let mut mixer = AnimationMixer::new(&skeleton(), vec![bob("hips")]);
        mixer.play("idle").unwrap();
        mixer.update(Duration::from_millis(2500));
        assert!((mixer.time() - 0.5).abs() < 1e-5);
        assert!((mixer.pose()[0].position.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn unbound_tracks_are_skipped() {
        let mut mixer = AnimationMixer::new(&skeleton(), vec![bob("tail")]);
        mixer.play("idle").unwrap();
        mixer.update(Duration::from_secs(1));
        assert_eq!(mixer.pose()[0], Instance::new());
    }

    #[test]
    fn stop_restores_the_rest_pose() {
        let mut mixer = AnimationMixer::new(&skeleton(), vec![bob("hips")]);
        mixer.play("idle").unwrap();
        mixer.update(Duration::from_secs(1));
        mixer.stop();
        assert_eq!(mixer.pose()[0], Instance::new());
        assert_eq!(mixer.time(), 0.0);
    }
}
