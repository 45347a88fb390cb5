//! Keyboard driven parameter panel.
//!
//! Parameters are grouped in folders and carry bounds and a step, the way a
//! debug GUI slider would. The panel has no widgets of its own: its state is
//! printed to the window title and the log, and every edit comes back as a
//! [`ParamChange`] for the scene to apply.
//!
//! | key | effect |
//! |---|---|
//! | Up / Down | select the previous / next parameter |
//! | 1 / 2 / 3 | select the x / y / z component of a vector |
//! | Left / Right | decrease / increase by one step (x10 with Shift) |
//! | Backspace | reset the selection to its default |

use std::fmt;

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::config::ViewerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    LightPosition,
    LightIntensity,
    CharacterScale,
    CharacterRotation,
    CharacterPosition,
    /// Position of the n-th ramp stop, in configured order.
    RampStop(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Vec3([f32; 3]),
}

impl ParamValue {
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            ParamValue::Scalar(v) => Some(v),
            ParamValue::Vec3(_) => None,
        }
    }

    pub fn as_vec3(self) -> Option<[f32; 3]> {
        match self {
            ParamValue::Vec3(v) => Some(v),
            ParamValue::Scalar(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v:.2}"),
            ParamValue::Vec3([x, y, z]) => write!(f, "[{x:.2}, {y:.2}, {z:.2}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub id: ParamId,
    pub folder: &'static str,
    pub label: String,
    pub value: ParamValue,
    pub default: ParamValue,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Param {
    fn new(id: ParamId, folder: &'static str, label: &str, value: ParamValue, bounds: [f32; 3]) -> Self {
        let [min, max, step] = bounds;
        Self {
            id,
            folder,
            label: label.to_string(),
            value,
            default: value,
            min,
            max,
            step,
        }
    }

    /// Clamp into bounds and snap onto the step grid.
    fn quantize(&self, v: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            (v / self.step).round() * self.step
        } else {
            v
        };
        snapped.clamp(self.min, self.max)
    }

    fn nudge(&mut self, component: usize, amount: f32) {
        self.value = match self.value {
            ParamValue::Scalar(v) => ParamValue::Scalar(self.quantize(v + amount)),
            ParamValue::Vec3(mut v) => {
                let c = component.min(2);
                v[c] = self.quantize(v[c] + amount);
                ParamValue::Vec3(v)
            }
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelCommand {
    Next,
    Previous,
    Component(usize),
    /// Move by `direction` steps, ten times as far when `coarse`.
    Step { direction: f32, coarse: bool },
    Reset,
}

pub fn command_for(key: KeyCode, shift: bool) -> Option<PanelCommand> {
    let command = match key {
        KeyCode::ArrowDown => PanelCommand::Next,
        KeyCode::ArrowUp => PanelCommand::Previous,
        KeyCode::Digit1 => PanelCommand::Component(0),
        KeyCode::Digit2 => PanelCommand::Component(1),
        KeyCode::Digit3 => PanelCommand::Component(2),
        KeyCode::ArrowLeft => PanelCommand::Step {
            direction: -1.0,
            coarse: shift,
        },
        KeyCode::ArrowRight => PanelCommand::Step {
            direction: 1.0,
            coarse: shift,
        },
        KeyCode::Backspace => PanelCommand::Reset,
        _ => return None,
    };
    Some(command)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamChange {
    pub id: ParamId,
    pub value: ParamValue,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelEvent {
    /// The selection moved; nothing in the scene changes.
    Selected,
    Changed(ParamChange),
}

#[derive(Clone, Debug)]
pub struct ControlPanel {
    params: Vec<Param>,
    selected: usize,
    component: usize,
    shift: bool,
}

impl ControlPanel {
    pub fn new(config: &ViewerConfig) -> Self {
        let mut params = vec![
            Param::new(
                ParamId::LightPosition,
                "light",
                "position",
                ParamValue::Vec3(config.light.position),
                [-10.0, 10.0, 0.01],
            ),
            Param::new(
                ParamId::LightIntensity,
                "light",
                "intensity",
                ParamValue::Scalar(config.light.intensity),
                [0.0, 10.0, 0.1],
            ),
            Param::new(
                ParamId::CharacterScale,
                "character",
                "scale",
                ParamValue::Scalar(config.character.scale),
                [1.0, 30.0, 0.1],
            ),
            Param::new(
                ParamId::CharacterRotation,
                "character",
                "rotation",
                ParamValue::Vec3(config.character.rotation),
                [-10.0, 10.0, 0.01],
            ),
            Param::new(
                ParamId::CharacterPosition,
                "character",
                "position",
                ParamValue::Vec3(config.character.position),
                [-10.0, 10.0, 0.1],
            ),
        ];
        params.extend(config.ramp.iter().enumerate().map(|(idx, stop)| {
            Param::new(
                ParamId::RampStop(idx),
                "ramp",
                &format!("stop {idx} position"),
                ParamValue::Scalar(stop.pos),
                [0.0, 1.0, 0.01],
            )
        }));
        Self {
            params,
            selected: 0,
            component: 0,
            shift: false,
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn selected(&self) -> &Param {
        &self.params[self.selected]
    }

    pub fn value(&self, id: ParamId) -> Option<ParamValue> {
        self.params.iter().find(|p| p.id == id).map(|p| p.value)
    }

    pub fn apply(&mut self, command: PanelCommand) -> Option<PanelEvent> {
        let count = self.params.len();
        if count == 0 {
            return None;
        }
        match command {
            PanelCommand::Next => {
                self.selected = (self.selected + 1) % count;
                self.component = 0;
                Some(PanelEvent::Selected)
            }
            PanelCommand::Previous => {
                self.selected = (self.selected + count - 1) % count;
                self.component = 0;
                Some(PanelEvent::Selected)
            }
            PanelCommand::Component(c) => match self.params[self.selected].value {
                ParamValue::Vec3(_) if c < 3 => {
                    self.component = c;
                    Some(PanelEvent::Selected)
                }
                _ => None,
            },
            PanelCommand::Step { direction, coarse } => {
                let param = &mut self.params[self.selected];
                let scale = if coarse { 10.0 } else { 1.0 };
                let before = param.value;
                param.nudge(self.component, direction * param.step * scale);
                (param.value != before).then(|| self.changed())
            }
            PanelCommand::Reset => {
                let param = &mut self.params[self.selected];
                let before = param.value;
                param.value = param.default;
                (param.value != before).then(|| self.changed())
            }
        }
    }

    fn changed(&self) -> PanelEvent {
        let param = &self.params[self.selected];
        PanelEvent::Changed(ParamChange {
            id: param.id,
            value: param.value,
        })
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> Option<PanelEvent> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
                None
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => command_for(*code, self.shift).and_then(|command| self.apply(command)),
            _ => None,
        }
    }

    /// One line describing the selection, e.g. `light/position[x] = [-0.16, -0.05, 1.44]`.
    pub fn summary(&self) -> String {
        let param = self.selected();
        let component = match param.value {
            ParamValue::Vec3(_) => ["[x]", "[y]", "[z]"][self.component.min(2)],
            ParamValue::Scalar(_) => "",
        };
        format!("{}/{}{} = {}", param.folder, param.label, component, param.value)
    }
}
