//! The viewer scene: the character in front of its backdrop, lit by one
//! directional light and tuned live from the [`ControlPanel`].

pub mod background;

use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    character::{Character, appearance::TextureSet},
    context::{Context, InitContext},
    controls::{ControlPanel, PanelEvent, ParamChange, ParamId, ParamValue},
    data_structures::instance::Instance,
    flow::{FlowConstructor, GraphicsFlow, Out},
    materials::RampStop,
    render::Render,
    resources::{load_character, load_clips},
};
use background::Background;

pub struct ViewerFlow {
    ctx: InitContext,
    character: Character,
    background: Option<Background>,
    panel: ControlPanel,
    stops: Vec<RampStop>,
}

impl ViewerFlow {
    pub async fn new(ctx: InitContext) -> anyhow::Result<Self> {
        let settings = &ctx.settings;
        let (asset, clips, textures) = futures::try_join!(
            load_character(&settings.character_model),
            load_clips(&settings.animations),
            TextureSet::load(&ctx),
        )?;

        let stops = settings.ramp.clone();
        let mut character = Character::new(&ctx, asset, clips, &textures, &stops)?;
        if let Err(e) = character.play(&settings.idle_clip) {
            log::warn!("{e}, keeping the rest pose");
        }

        let background = if settings.background.enabled {
            Some(Background::new(&ctx, &settings.background)?)
        } else {
            None
        };
        let panel = ControlPanel::new(settings);

        Ok(Self {
            ctx,
            character,
            background,
            panel,
            stops,
        })
    }

    pub fn constructor() -> FlowConstructor {
        Box::new(|ctx| {
            Box::pin(async move {
                let flow = ViewerFlow::new(ctx).await?;
                Ok(Box::new(flow) as Box<dyn GraphicsFlow>)
            })
        })
    }

    fn title(&self) -> String {
        format!("{} | {}", self.ctx.settings.title, self.panel.summary())
    }

    fn apply(&mut self, ctx: &Context, change: ParamChange) -> Out {
        match (change.id, change.value) {
            (ParamId::LightPosition, ParamValue::Vec3(position)) => {
                Out::Configure(Box::new(move |ctx: &mut Context| ctx.light.set_position(position)))
            }
            (ParamId::LightIntensity, ParamValue::Scalar(intensity)) => {
                Out::Configure(Box::new(move |ctx: &mut Context| ctx.light.set_intensity(intensity)))
            }
            (ParamId::CharacterScale | ParamId::CharacterRotation | ParamId::CharacterPosition, _) => {
                if let Some(root) = root_instance(&self.panel) {
                    self.character.set_root(&ctx.queue, root);
                }
                Out::Empty
            }
            (ParamId::RampStop(_), _) => {
                if apply_ramp_change(&mut self.stops, &change) {
                    if let Err(e) = self.character.set_ramp_stops(&self.ctx, &self.stops) {
                        log::warn!("Ramp not updated: {e}");
                    }
                }
                Out::Empty
            }
            (id, value) => {
                log::warn!("Unexpected value {value:?} for {id:?}");
                Out::Empty
            }
        }
    }
}

/// Move the ramp stop `change` refers to. Returns whether a stop moved.
pub fn apply_ramp_change(stops: &mut [RampStop], change: &ParamChange) -> bool {
    let (ParamId::RampStop(idx), ParamValue::Scalar(pos)) = (change.id, change.value) else {
        return false;
    };
    match stops.get_mut(idx) {
        Some(stop) if stop.pos != pos => {
            stop.pos = pos;
            true
        }
        _ => false,
    }
}

/// Character root transform from the panel's character folder.
pub fn root_instance(panel: &ControlPanel) -> Option<Instance> {
    let scale = panel.value(ParamId::CharacterScale)?.as_scalar()?;
    let rotation = panel.value(ParamId::CharacterRotation)?.as_vec3()?;
    let position = panel.value(ParamId::CharacterPosition)?.as_vec3()?;
    Some(Instance::from_euler_xyz(position, rotation, scale))
}

impl GraphicsFlow for ViewerFlow {
    fn on_init(&mut self, ctx: &mut Context) -> Out {
        ctx.set_title(&self.title());
        Out::Empty
    }

    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out {
        self.character.update(&ctx.queue, dt);
        Out::Empty
    }

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) -> Out {
        let Some(panel_event) = self.panel.handle_window_events(event) else {
            return Out::Empty;
        };
        let title = self.title();
        log::info!("{}", self.panel.summary());
        ctx.set_title(&title);
        match panel_event {
            PanelEvent::Selected => Out::Empty,
            PanelEvent::Changed(change) => self.apply(ctx, change),
        }
    }

    fn on_render(&self) -> Render<'_> {
        let background = self
            .background
            .as_ref()
            .map_or(Render::None, Background::render);
        Render::Composed(vec![background, self.character.render()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ViewerConfig, default_ramp},
        controls::PanelCommand,
    };

    #[test]
    fn root_follows_the_panel() {
        let mut panel = ControlPanel::new(&ViewerConfig::default());
        let root = root_instance(&panel).unwrap();
        assert_eq!(root, Instance::from_euler_xyz([0.2, -4.5, 0.0], [-0.04, 0.32, -0.06], 11.2));

        while panel.selected().id != ParamId::CharacterScale {
            panel.apply(PanelCommand::Next);
        }
        panel.apply(PanelCommand::Reset);
        panel.apply(PanelCommand::Step {
            direction: 1.0,
            coarse: true,
        });
        let root = root_instance(&panel).unwrap();
        assert!((root.scale.x - 12.2).abs() < 1e-4);
    }

    #[test]
    fn ramp_stop_changes_move_the_stop() {
        let config = ViewerConfig::default();
        let mut panel = ControlPanel::new(&config);
        let mut stops = default_ramp();
        while panel.selected().id != ParamId::RampStop(1) {
            panel.apply(PanelCommand::Next);
        }
        let Some(PanelEvent::Changed(change)) = panel.apply(PanelCommand::Step {
            direction: 1.0,
            coarse: false,
        }) else {
            panic!("stepping a ramp stop should change it");
        };

        assert!(apply_ramp_change(&mut stops, &change));
        assert!((stops[1].pos - 0.46).abs() < 1e-5);
        assert_eq!(stops[0], default_ramp()[0]);
        assert_eq!(stops[2], default_ramp()[2]);
        // already applied
        assert!(!apply_ramp_change(&mut stops, &change));
    }

    #[test]
    fn other_changes_leave_the_ramp_alone() {
        let mut stops = default_ramp();
        let change = ParamChange {
            id: ParamId::CharacterScale,
            value: ParamValue::Scalar(0.5),
        };
        assert!(!apply_ramp_change(&mut stops, &change));
        let out_of_range = ParamChange {
            id: ParamId::RampStop(7),
            value: ParamValue::Scalar(0.5),
        };
        assert!(!apply_ramp_change(&mut stops, &out_of_range));
        assert_eq!(stops, default_ramp());
    }
}
