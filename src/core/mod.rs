//! Platform independent viewer core: scene graph, camera, clock logic
//! and configuration.

pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod orbit;
pub mod scene;
pub mod settings;
pub mod types;
pub mod viewer;
pub mod viewport;

pub use camera::PerspectiveCamera;
pub use clock::{ClockTime, HandAngles};
pub use config::ViewerConfig;
pub use error::{DisplayError, DisplayResult};
pub use scene::Scene;
pub use settings::{SettingChange, SettingsParams};
pub use types::Color;
pub use viewer::ClockViewer;
