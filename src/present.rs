//! Per-frame draw calls
//!
//! Turns session state into renderer calls: a single full-screen quad for
//! the overlay screens, or the forest scene plus HUD during gameplay.

use glam::{Mat4, Quat, Vec3};

use crate::consts::LANTERN_DROP;
use crate::engine::{FillMode, Light, Model, Overlay, Renderer, Texture};
use crate::heading_yaw;
use crate::settings::Settings;
use crate::sim::Session;

/// Ambient level inside the forest
pub const DIM_AMBIENT: f32 = 0.1;
/// Ambient level for unlit things (sky, fire, overlays)
pub const FULL_AMBIENT: f32 = 1.0;

const SKY_SCALE: Vec3 = Vec3::new(200.0, 100.0, 200.0);
const STALKER_SCALE: f32 = 6.0;
const OVERLAY_SCALE: f32 = 0.085;
const OVERLAY_DEPTH: f32 = 0.5;
const HUD_SCALE: f32 = 0.025;
const HUD_LEFT: f32 = -0.55;
const HUD_SPACING: f32 = 0.033;
const HUD_TOP: f32 = 0.38;
const CAMPFIRE: Vec3 = Vec3::ZERO;
const FIRE_OFFSET: Vec3 = Vec3::new(0.0, -0.5, 0.0);

/// Draw one frame. Returns the screenshot outcome if one was requested.
///
/// `screenshot` is only honoured during gameplay.
pub fn present<R: Renderer + ?Sized>(
    renderer: &mut R,
    session: &Session,
    settings: &Settings,
    screenshot: Option<&str>,
) -> Option<bool> {
    if !renderer.begin_frame() {
        return None;
    }

    let mut shot = None;
    match session.mode.overlay() {
        Some(overlay) => draw_overlay(renderer, overlay),
        None => {
            draw_scene(renderer, session, settings);
            if let Some(path) = screenshot {
                let ok = renderer.save_screenshot(path);
                if !ok {
                    log::warn!("Could not write screenshot {}", path);
                }
                shot = Some(ok);
            }
            draw_hud(renderer, session.collected());
        }
    }

    renderer.end_frame();
    shot
}

/// A full-screen image in front of the fixed screen camera
pub fn draw_overlay<R: Renderer + ?Sized>(renderer: &mut R, overlay: Overlay) {
    renderer.disable_fog();
    renderer.set_fill_mode(FillMode::Shaded);
    renderer.set_ambient_light(FULL_AMBIENT);
    renderer.begin_screen_space();
    renderer.draw_entity(Model::Screen, overlay_transform(), Texture::Overlay(overlay));
    renderer.end_screen_space();
}

pub fn overlay_transform() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, OVERLAY_DEPTH)) * Mat4::from_scale(Vec3::splat(OVERLAY_SCALE))
}

/// The forest: ground, sky, trees, pages, the stalker and the campfire
pub fn draw_scene<R: Renderer + ?Sized>(renderer: &mut R, session: &Session, settings: &Settings) {
    let heading = session.player.heading;
    let wireframe = session.controls.wireframe();

    renderer.set_fill_mode(if wireframe {
        FillMode::Wireframe
    } else {
        FillMode::Shaded
    });
    renderer.set_ambient_light(DIM_AMBIENT);
    renderer.enable_fog(settings.fog_start, settings.fog_end);

    renderer.set_light(Light::Moon, session.lights.moon, None);
    renderer.set_light(
        Light::Lantern,
        session.lights.lantern,
        Some(session.player.position - Vec3::new(0.0, LANTERN_DROP, 0.0)),
    );

    renderer.draw_entity(Model::Ground, Mat4::IDENTITY, Texture::Ground);

    renderer.set_ambient_light(FULL_AMBIENT);
    renderer.draw_entity(Model::SkyDome, Mat4::from_scale(SKY_SCALE), Texture::Night);

    renderer.enable_alpha_blending();
    renderer.set_light(Light::Campfire, true, Some(CAMPFIRE));
    renderer.set_ambient_light(DIM_AMBIENT);

    for tree in &session.obstacles {
        let p = tree.position;
        renderer.draw_entity(
            Model::Tree,
            Mat4::from_translation(Vec3::new(p.x, 0.0, p.z)),
            Texture::Tree,
        );
    }

    for page in session.items.iter().filter(|p| p.is_available()) {
        renderer.draw_entity(Model::Page, billboard(page.position, heading, 1.0), Texture::Page);
    }

    renderer.draw_entity(
        Model::Stalker,
        billboard(session.antagonist.position, heading, STALKER_SCALE),
        Texture::Stalker,
    );

    renderer.disable_fog();
    renderer.disable_alpha_blending();

    // Campfire
    renderer.set_ambient_light(FULL_AMBIENT);
    renderer.enable_alpha_blending();
    renderer.update_particles(session.elapsed_ms);
    renderer.draw_particles(Mat4::from_translation(CAMPFIRE + FIRE_OFFSET), heading, wireframe);
    renderer.set_light(Light::Campfire, false, None);
    renderer.disable_alpha_blending();
}

/// One paper icon per collected page along the top of the view
pub fn draw_hud<R: Renderer + ?Sized>(renderer: &mut R, collected: u32) {
    if collected == 0 {
        return;
    }
    renderer.begin_screen_space();
    renderer.enable_alpha_blending();
    for i in 0..collected {
        renderer.draw_entity(Model::Page, hud_icon_transform(i), Texture::Page);
    }
    renderer.disable_alpha_blending();
    renderer.end_screen_space();
}

pub fn hud_icon_transform(index: u32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(HUD_SCALE),
        Quat::from_rotation_y(std::f32::consts::PI),
        Vec3::new(HUD_LEFT + HUD_SPACING * index as f32, HUD_TOP, 0.0),
    )
}

/// Scale, turn about Y to face back along `heading`, then place at `position`
pub fn billboard(position: Vec3, heading: Vec3, scale: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_rotation_y(heading_yaw(-heading)),
        position,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Spatial;
    use crate::engine::headless::HeadlessRenderer;
    use crate::sim::{ModelBounds, ScreenMode, update_visibility};
    use crate::tuning::Tuning;

    fn session() -> Session {
        Session::new(11, Tuning::default(), ModelBounds::default())
    }

    #[test]
    fn test_overlay_frame_is_one_quad() {
        let mut r = HeadlessRenderer::default();
        let s = session();
        present(&mut r, &s, &Settings::default(), None);
        assert_eq!(r.draws.len(), 1);
        let draw = r.draws[0];
        assert_eq!(draw.model, Model::Screen);
        assert_eq!(draw.texture, Texture::Overlay(Overlay::Title));
        assert!(draw.screen_space);
        assert_eq!(draw.transform, overlay_transform());
    }

    #[test]
    fn test_overlay_ignores_screenshot() {
        let mut r = HeadlessRenderer::default();
        let s = session();
        assert_eq!(present(&mut r, &s, &Settings::default(), Some("x.bmp")), None);
        assert!(r.screenshots.is_empty());
    }

    #[test]
    fn test_scene_draws_everything_visible() {
        let mut r = HeadlessRenderer::default();
        let mut s = session();
        s.mode = ScreenMode::Gameplay;
        r.set_camera(s.player.position, s.player.heading);
        let visible = update_visibility(&mut s.items, &r);

        present(&mut r, &s, &Settings::default(), None);
        assert_eq!(r.draws_of(Model::Ground).count(), 1);
        assert_eq!(r.draws_of(Model::SkyDome).count(), 1);
        assert_eq!(r.draws_of(Model::Tree).count(), 100);
        assert_eq!(r.draws_of(Model::Page).count(), visible);
        assert_eq!(r.draws_of(Model::Stalker).count(), 1);
        assert_eq!(r.particle_draws, 1);
        assert_eq!(r.fog, None);
        assert!(!r.light(Light::Campfire));
        assert_eq!(r.fill_mode, FillMode::Shaded);
    }

    #[test]
    fn test_hud_icons_match_collected() {
        let mut r = HeadlessRenderer::default();
        let mut s = session();
        s.mode = ScreenMode::Gameplay;
        s.progress.record_pickup();
        s.progress.record_pickup();
        present(&mut r, &s, &Settings::default(), None);
        let icons: Vec<_> = r
            .draws_of(Model::Page)
            .filter(|d| d.screen_space)
            .collect();
        assert_eq!(icons.len(), 2);
        assert_eq!(icons[1].transform, hud_icon_transform(1));
        let x = icons[1].transform.w_axis.x;
        assert!((x - (HUD_LEFT + HUD_SPACING)).abs() < 1e-6);
    }

    #[test]
    fn test_lights_follow_session() {
        let mut r = HeadlessRenderer::default();
        let mut s = session();
        s.mode = ScreenMode::Gameplay;
        s.lights.lantern = true;
        present(&mut r, &s, &Settings::default(), None);
        assert!(r.light(Light::Lantern));
        assert!(!r.light(Light::Moon));
        let lantern = r.lights[&Light::Lantern].1.unwrap_or_default();
        assert!((lantern.y - (s.player.position.y - LANTERN_DROP)).abs() < 1e-6);
    }

    #[test]
    fn test_wireframe_and_screenshot() {
        let mut r = HeadlessRenderer::default();
        let mut s = session();
        s.mode = ScreenMode::Gameplay;
        s.controls
            .apply(&crate::engine::InputEvent::KeyPress(crate::engine::Key::F));
        let shot = present(&mut r, &s, &Settings::default(), Some("screen0.bmp"));
        assert_eq!(shot, Some(true));
        assert_eq!(r.fill_mode, FillMode::Wireframe);
        assert_eq!(r.screenshots, vec!["screen0.bmp".to_string()]);
    }

    #[test]
    fn test_billboard_faces_viewer() {
        let m = billboard(Vec3::new(3.0, 1.0, 4.0), Vec3::Z, 2.0);
        let normal = m.transform_vector3(Vec3::Z).normalize();
        assert!((normal - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(3.0, 1.0, 4.0));
    }
}
