use bevy::prelude::*;

use crate::config::DebugViewConfig;

/// Debug overlay font. Holds Bevy's default font handle unless
/// `font_path` is set in the config.
#[derive(Resource, Default)]
pub struct DebugFont(pub Handle<Font>);

/// Load the configured overlay font from assets at startup.
///
/// Must run after [`crate::config::load_debug_view_config`] and before the
/// debug view is built. Does nothing when there is no asset server (headless runs).
pub fn load_debug_font(
    mut font: ResMut<DebugFont>,
    config: Res<DebugViewConfig>,
    asset_server: Option<Res<AssetServer>>,
) {
    let (Some(path), Some(asset_server)) = (config.font_path.as_ref(), asset_server) else {
        return;
    };
    font.0 = asset_server.load(path.clone());
    info!("Debug font loaded from {path}");
}

/// Setup camera for 2D rendering
pub fn setup_camera(mut commands: Commands) {
    // World units are display units, so the default scale shows 1 px per unit.
    commands.spawn(Camera2d);
    info!("Camera spawned");
}
