//! Clock viewer state.
//!
//! Owns everything the window backend draws: the scene graph with its
//! lights, the camera and its orbit controls, the viewport and the values
//! bound to the settings panel. Nothing in here touches the GPU, so the
//! whole frame logic can be driven from tests.

use glam::Vec3;

use crate::core::camera::PerspectiveCamera;
use crate::core::clock::{ClockTime, Hand, HandAngles};
use crate::core::config::ViewerConfig;
use crate::core::error::DisplayResult;
use crate::core::orbit::OrbitControls;
use crate::core::scene::{Light, LightKind, LightShadow, NodeId, Scene, ShadowFlags};
use crate::core::settings::{SettingChange, SettingsParams};
use crate::core::types::{Color, Transform};
use crate::core::viewport::Viewport;

/// Name of the group node holding the loaded model.
const MODEL_GROUP: &str = "clock";

#[derive(Debug)]
pub struct ClockViewer {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
    settings: SettingsParams,
    model: Option<NodeId>,
    /// Hand nodes with their rest Euler angles.
    hands: Vec<(Hand, NodeId, Vec3)>,
    last_time: Option<ClockTime>,
}

impl ClockViewer {
    pub fn new(config: ViewerConfig) -> Self {
        let viewport = Viewport::new(800.0, 600.0, 1.0, config.pixel_ratio_cap);

        let mut camera = PerspectiveCamera::new(
            config.camera.fov,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.set_position(config.camera.position);
        camera.look_at(Vec3::ZERO);

        let controls = OrbitControls::new(
            config.camera.position,
            Vec3::ZERO,
            &config.controls,
            config.max_distance(),
        );

        let settings = SettingsParams::from_config(&config.panel);

        let mut scene = Scene::new();
        scene.background = Color::from_hex(&settings.background).unwrap_or_else(|e| {
            log::warn!("ClockViewer: {}, using black background", e);
            Color::BLACK
        });

        let lighting = &config.lighting;
        scene.add_light(
            Light::ambient(lighting.ambient_color, lighting.ambient_intensity),
            Transform::IDENTITY,
            None,
        );
        scene.add_light(
            Light::directional("fill", lighting.fill_color, lighting.fill_intensity),
            Transform::from_translation(lighting.fill_position),
            None,
        );

        Self {
            config,
            scene,
            camera,
            controls,
            viewport,
            settings,
            model: None,
            hands: Vec::new(),
            last_time: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn settings(&self) -> &SettingsParams {
        &self.settings
    }

    /// Group node of the loaded model.
    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    /// Insert a freshly loaded clock model, replacing nothing: the
    /// viewer only ever holds one model.
    pub fn attach_model(&mut self, model: Scene) {
        if self.model.is_some() {
            log::warn!("ClockViewer: model already attached, ignoring new one");
            return;
        }

        let group = self.scene.import(model, MODEL_GROUP, None);
        {
            let transform = &mut self.scene.node_mut(group).transform;
            transform.scale = Vec3::splat(self.config.model.scale);
            transform.set_euler_x(self.config.model.tilt);
        }

        let center = self.scene.bounding_box(group).center();
        self.scene.node_mut(group).transform.translation -= center;

        let shadows = &self.config.shadows;
        let lighting = &self.config.lighting;
        let mut sun_count = 0;
        for id in self.scene.descendants(group) {
            if self.scene.nodes[id].mesh.is_some() {
                self.scene.nodes[id].shadow = ShadowFlags::CAST | ShadowFlags::RECEIVE;
            }

            let Some(light_id) = self.scene.nodes[id].light else {
                continue;
            };
            let is_sun = self.scene.nodes[id].name == lighting.sun_name;
            let light = &mut self.scene.lights[light_id];
            if light.kind == LightKind::Directional && is_sun {
                light.intensity = lighting.sun_intensity;
                light.shadow = shadows.enabled.then_some(LightShadow {
                    map_size: shadows.map_size,
                    near: shadows.near,
                    far: shadows.far,
                    bias: shadows.bias,
                    half_extent: shadows.frustum_half_extent,
                });
                self.scene.nodes[id].transform.scale = Vec3::splat(lighting.sun_scale);
                sun_count += 1;
            }
        }

        let names = &self.config.model;
        self.hands.clear();
        for (hand, name) in [
            (Hand::Hour, &names.hour_hand),
            (Hand::Minute, &names.minute_hand),
            (Hand::Second, &names.second_hand),
        ] {
            let found = self.scene.find_by_name(group, name);
            if found.is_empty() {
                log::warn!("ClockViewer: no node named {:?} for the {:?} hand", name, hand);
            }
            for id in found {
                let rest = self.scene.nodes[id].transform.euler();
                self.hands.push((hand, id, rest));
            }
        }

        log::info!(
            "ClockViewer: model attached ({} nodes, {} hands, {} sun lights, centered by {:?})",
            self.scene.descendants(group).len(),
            self.hands.len(),
            sun_count,
            center
        );

        self.model = Some(group);

        // Edits made before the model arrived still apply.
        let case_color = self.settings.case_color.clone();
        if let Err(e) = self.set_case_color(&case_color) {
            log::warn!("ClockViewer: {}", e);
        }
        self.set_wireframe(self.settings.wireframe);
        if let Some(time) = self.last_time {
            self.pose_hands(time);
        }
    }

    /// Advance one frame at wall-clock time `now`.
    pub fn frame(&mut self, now: ClockTime) {
        self.controls.update();
        self.camera.set_position(self.controls.position());
        self.camera.look_at(self.controls.target());

        self.pose_hands(now);
        self.settings.time = now.display();
        self.last_time = Some(now);
    }

    fn pose_hands(&mut self, now: ClockTime) {
        let angles = HandAngles::from_time(now);
        for &(hand, id, rest) in &self.hands {
            // Hands turn clockwise when looking at the dial.
            let euler = Vec3::new(rest.x, -angles.get(hand), rest.z);
            self.scene.nodes[id].transform.set_euler(euler);
        }
    }

    /// Handle a window resize given in logical pixels. Returns the new
    /// output surface size in physical pixels.
    pub fn on_resize(&mut self, width: f32, height: f32, scale_factor: f32) -> (u32, u32) {
        self.viewport.resize(width, height, scale_factor);
        self.camera.set_aspect(self.viewport.aspect());
        self.viewport.surface_size()
    }

    /// Handle a cursor move given in logical pixels.
    pub fn on_cursor_moved(&mut self, x: f32, y: f32) {
        self.viewport.set_cursor(x, y);
    }

    /// Apply one settings panel edit to the scene.
    pub fn apply(&mut self, change: SettingChange) -> DisplayResult<()> {
        match change {
            SettingChange::CaseColor(hex) => {
                self.set_case_color(&hex)?;
                self.settings.case_color = hex;
            }
            SettingChange::Background(hex) => {
                self.scene.background = Color::from_hex(&hex)?;
                self.settings.background = hex;
            }
            SettingChange::Wireframe(enabled) => {
                self.set_wireframe(enabled);
                self.settings.wireframe = enabled;
            }
        }
        Ok(())
    }

    fn set_case_color(&mut self, hex: &str) -> DisplayResult<()> {
        let color = Color::from_hex(hex)?.to_linear();
        let Some(group) = self.model else {
            return Ok(());
        };

        let names = &self.config.model;
        let mut touched = 0;
        for id in self.scene.find_by_name(group, &names.case_node) {
            let Some(mesh) = self.scene.nodes[id].mesh else {
                continue;
            };
            for prim in &self.scene.meshes[mesh].primitives {
                let material = &mut self.scene.materials[prim.material];
                if material.name == names.case_material {
                    material.base_color = color;
                    touched += 1;
                }
            }
        }
        log::debug!("ClockViewer: case color {} applied to {} primitives", hex, touched);
        Ok(())
    }

    fn set_wireframe(&mut self, enabled: bool) {
        let Some(group) = self.model else {
            return;
        };
        for material in self.scene.materials_under(group) {
            self.scene.materials[material].wireframe = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Material, Mesh, Node, Primitive};
    use glam::Quat;
    use std::f32::consts::PI;

    /// A dial with a case, three hands and a sun, laid out like the real asset.
    fn clock_model() -> Scene {
        let mut scene = Scene::new();
        let case = scene.add_material(Material::new("block texture", Color::WHITE));
        let glass = scene.add_material(Material::new("glass", Color::WHITE));
        let steel = scene.add_material(Material::new("steel", Color::BLACK));

        let quad = |material| Primitive {
            positions: vec![
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(3.0, 0.0, 1.0),
                Vec3::new(3.0, 0.0, 3.0),
                Vec3::new(1.0, 0.0, 3.0),
            ],
            normals: vec![Vec3::Y; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            material,
        };
        let case_mesh = scene.add_mesh(Mesh {
            name: "Circle".to_string(),
            primitives: vec![quad(case), quad(glass)],
        });
        let hand_mesh = scene.add_mesh(Mesh {
            name: "hand".to_string(),
            primitives: vec![quad(steel)],
        });

        let mut circle = Node::new("Circle");
        circle.mesh = Some(case_mesh);
        let circle = scene.add_node(circle, None);
        for name in ["heure", "minute", "seconde"] {
            let mut hand = Node::new(name);
            hand.mesh = Some(hand_mesh);
            scene.add_node(hand, Some(circle));
        }
        // Same material name on a node that is not the case.
        let mut decoy = Node::new("Base");
        decoy.mesh = Some(case_mesh);
        scene.add_node(decoy, None);

        scene.add_light(
            Light::directional("Sun", Color::WHITE, 1.0),
            Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)),
            None,
        );
        scene
    }

    fn viewer_with_model() -> ClockViewer {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        viewer.attach_model(clock_model());
        viewer
    }

    fn node_named(viewer: &ClockViewer, name: &str) -> NodeId {
        viewer.scene().find_by_name(viewer.model().unwrap(), name)[0]
    }

    #[test]
    fn test_frame_poses_hands() {
        let mut viewer = viewer_with_model();
        viewer.frame(ClockTime::new(3, 0, 0));

        let hour = node_named(&viewer, "heure");
        let minute = node_named(&viewer, "minute");
        let second = node_named(&viewer, "seconde");
        let scene = viewer.scene();
        assert!(scene
            .node(hour)
            .transform
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(-PI / 2.0), 1e-5));
        assert!(scene.node(minute).transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert!(scene.node(second).transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
        assert_eq!(viewer.settings().time, "03:00:00");
    }

    #[test]
    fn test_time_string_tracks_latest_sample() {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        viewer.frame(ClockTime::new(23, 4, 5));
        viewer.frame(ClockTime::new(23, 4, 6));
        assert_eq!(viewer.settings().time, "11:04:06");
    }

    #[test]
    fn test_background_change_sets_scene_background() {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        viewer
            .apply(SettingChange::Background("#ff8000".to_string()))
            .unwrap();
        let expected = Color::from_hex("#ff8000").unwrap();
        assert!(viewer.scene().background.approx_eq(&expected));
        assert_eq!(viewer.settings().background, "#ff8000");
    }

    #[test]
    fn test_invalid_color_leaves_scene_untouched() {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        let before = viewer.scene().background;
        assert!(viewer
            .apply(SettingChange::Background("not a color".to_string()))
            .is_err());
        assert_eq!(viewer.scene().background, before);
        assert_eq!(viewer.settings().background, "#11141e");
    }

    #[test]
    fn test_resize_updates_aspect_and_surface() {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        let surface = viewer.on_resize(1280.0, 720.0, 1.0);
        assert!((viewer.camera().aspect() - 1280.0 / 720.0).abs() < 1e-6);
        assert_eq!(surface, (1280, 720));

        let hidpi = viewer.on_resize(1000.0, 500.0, 1.5);
        assert!((viewer.camera().aspect() - 2.0).abs() < 1e-6);
        assert_eq!(hidpi, (1500, 750));
    }

    #[test]
    fn test_wireframe_toggle_reaches_every_mesh() {
        let mut viewer = viewer_with_model();
        let group = viewer.model().unwrap();

        viewer.apply(SettingChange::Wireframe(true)).unwrap();
        let materials = viewer.scene().materials_under(group);
        assert_eq!(materials.len(), 3);
        assert!(materials.iter().all(|&m| viewer.scene().materials[m].wireframe));

        viewer.apply(SettingChange::Wireframe(false)).unwrap();
        assert!(materials.iter().all(|&m| !viewer.scene().materials[m].wireframe));
    }

    #[test]
    fn test_case_color_targets_case_material_only() {
        let mut viewer = viewer_with_model();
        viewer
            .apply(SettingChange::CaseColor("#ff0000".to_string()))
            .unwrap();

        let scene = viewer.scene();
        let red = Color::from_hex("#ff0000").unwrap().to_linear();
        let by_name = |name: &str| {
            scene
                .materials
                .iter()
                .find(|m| m.name == name)
                .map(|m| m.base_color)
                .unwrap()
        };
        assert!(by_name("block texture").approx_eq(&red));
        assert!(by_name("glass").approx_eq(&Color::WHITE));
        assert!(by_name("steel").approx_eq(&Color::BLACK));
    }

    #[test]
    fn test_settings_before_model_are_applied_on_attach() {
        let mut viewer = ClockViewer::new(ViewerConfig::new());
        viewer.apply(SettingChange::Wireframe(true)).unwrap();
        viewer.frame(ClockTime::new(6, 0, 0));
        viewer.attach_model(clock_model());

        let group = viewer.model().unwrap();
        let scene = viewer.scene();
        assert!(scene
            .materials_under(group)
            .iter()
            .all(|&m| scene.materials[m].wireframe));

        let hour = node_named(&viewer, "heure");
        assert!(viewer
            .scene()
            .node(hour)
            .transform
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(-PI), 1e-5));
    }

    #[test]
    fn test_attach_centers_and_configures_model() {
        let viewer = viewer_with_model();
        let group = viewer.model().unwrap();
        let scene = viewer.scene();

        let center = scene.bounding_box(group).center();
        assert!(center.length() < 1e-4);
        assert!((scene.node(group).transform.scale - Vec3::splat(2.0)).length() < 1e-6);

        let circle = node_named(&viewer, "Circle");
        assert!(scene.node(circle).shadow.contains(ShadowFlags::CAST | ShadowFlags::RECEIVE));

        let sun = node_named(&viewer, "Sun");
        let light = &scene.lights[scene.node(sun).light.unwrap()];
        assert_eq!(light.intensity, 10.0);
        let shadow = light.shadow.unwrap();
        assert_eq!(shadow.map_size, 4096);
        assert_eq!(shadow.bias, -0.001);
        assert!((scene.node(sun).transform.scale - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_sun_matched_by_node_name() {
        let mut model = clock_model();
        let sun = model.add_light(
            Light::directional("Sun.001", Color::WHITE, 1.0),
            Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)),
            None,
        );
        model.node_mut(sun).name = "Sun".to_string();
        let decoy = model.add_light(
            Light::directional("Sun", Color::WHITE, 1.0),
            Transform::IDENTITY,
            None,
        );
        model.node_mut(decoy).name = "Lamp".to_string();

        let mut viewer = ClockViewer::new(ViewerConfig::new());
        viewer.attach_model(model);

        let scene = viewer.scene();
        let group = viewer.model().unwrap();
        let casters: Vec<&str> = scene
            .descendants(group)
            .into_iter()
            .filter_map(|id| scene.node(id).light.map(|l| (id, l)))
            .filter(|&(_, l)| scene.lights[l].shadow.is_some())
            .map(|(id, _)| scene.node(id).name.as_str())
            .collect();
        assert_eq!(casters, vec!["Sun", "Sun"]);

        let lamp = node_named(&viewer, "Lamp");
        assert!(scene.lights[scene.node(lamp).light.unwrap()].shadow.is_none());
    }

    #[test]
    fn test_default_lights_present() {
        let viewer = ClockViewer::new(ViewerConfig::new());
        let kinds: Vec<LightKind> = viewer.scene().lights.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LightKind::Ambient, LightKind::Directional]);
        assert!((viewer.camera().position() - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-6);
    }
}
