pub mod hud;

pub use hud::{Hud, HudActions, HudModel, HudStats, ScreenLabel};
