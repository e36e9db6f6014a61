//! Rendering systems.
//!
//! [`render_system`] draws one frame: a 2D camera pass with every entity
//! that has a [`MapPosition`] (path followers tinted by state, with a dot
//! on their facing side) and, in debug mode, the waypoint gizmos of each
//! follower; then a text overlay with the clock, the music phase and the
//! follower segments.

use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::animator::{Animator, DIRECTION_PARAM};
use crate::components::bgmsequencer::BgmSequencer;
use crate::components::mapposition::MapPosition;
use crate::components::pathfollower::{Facing, PathFollower};
use crate::resources::debugmode::DebugMode;
use crate::resources::gameconfig::GameConfig;
use crate::resources::worldtime::WorldTime;

const GIZMO_COLOR: Color = Color {
    r: 255,
    g: 178,
    b: 25,
    a: 229,
};
const GIZMO_SPHERE_RADIUS: f32 = 0.08;
const GIZMO_LINE_THICKNESS: f32 = 0.03;
const BODY_SIZE: f32 = 0.5;

/// World space is y-up; raylib's screen space is y-down.
fn to_screen(p: Vector3) -> Vector2 {
    Vector2 { x: p.x, y: -p.y }
}

fn facing_offset(facing: Facing) -> Vector2 {
    let d = BODY_SIZE * 0.5;
    match facing {
        Facing::Up => Vector2 { x: 0.0, y: -d },
        Facing::Right => Vector2 { x: d, y: 0.0 },
        Facing::Down => Vector2 { x: 0.0, y: d },
        Facing::Left => Vector2 { x: -d, y: 0.0 },
    }
}

/// Draw the world inside a 2D camera centred on the origin.
pub fn render_pass(world: &mut World, d2: &mut RaylibMode2D<RaylibDrawHandle>) {
    if world.contains_resource::<DebugMode>() {
        let mut followers = world.query::<&PathFollower>();
        for follower in followers.iter(world) {
            if !follower.draw_gizmos || !follower.can_move() {
                continue;
            }
            for p in follower.gizmo_points() {
                d2.draw_circle_v(to_screen(p), GIZMO_SPHERE_RADIUS, GIZMO_COLOR);
            }
            for (a, b) in follower.gizmo_edges() {
                d2.draw_line_ex(to_screen(a), to_screen(b), GIZMO_LINE_THICKNESS, GIZMO_COLOR);
            }
        }
    }

    let mut bodies = world.query::<(&MapPosition, Option<&Animator>, Option<&PathFollower>)>();
    for (position, animator, follower) in bodies.iter(world) {
        let center = to_screen(position.pos);
        let color = match follower {
            Some(f) if f.is_advancing() => Color::DARKBLUE,
            Some(_) => Color::GRAY,
            None => Color::DARKGREEN,
        };
        d2.draw_rectangle_rec(
            Rectangle {
                x: center.x - BODY_SIZE * 0.5,
                y: center.y - BODY_SIZE * 0.5,
                width: BODY_SIZE,
                height: BODY_SIZE,
            },
            color,
        );
        let facing = animator
            .and_then(|a| a.get_integer(DIRECTION_PARAM))
            .and_then(Facing::from_param);
        if let Some(facing) = facing {
            let offset = facing_offset(facing);
            d2.draw_circle_v(
                Vector2 {
                    x: center.x + offset.x,
                    y: center.y + offset.y,
                },
                BODY_SIZE * 0.15,
                Color::ORANGE,
            );
        }
    }
}

pub fn render_debug_ui(world: &mut World, d: &mut RaylibDrawHandle) {
    if !world.contains_resource::<DebugMode>() {
        return;
    }
    let fps = d.get_fps();
    let time = *world.resource::<WorldTime>();
    let text = format!(
        "DEBUG MODE (press F11 to toggle) | FPS: {} | t={:.2}s frame={}",
        fps, time.elapsed, time.frame_count
    );
    d.draw_text(&text, 10, 10, 10, Color::BLACK);

    let mut y = 30;
    let mut sequencers = world.query::<&BgmSequencer>();
    for seq in sequencers.iter(world) {
        d.draw_text(&format!("bgm: {:?}", seq.phase), 10, y, 10, Color::BLACK);
        y += 20;
    }
    let mut followers = world.query::<(Entity, &PathFollower)>();
    for (entity, follower) in followers.iter(world) {
        let state = match follower.segment() {
            Some(seg) => format!("{} -> {}", seg.from_index, seg.to_index),
            None => format!("{:?}", follower.state),
        };
        let text = format!(
            "{:?}: {} enabled={} (space toggles)",
            entity, state, follower.enabled
        );
        d.draw_text(&text, 10, y, 10, Color::BLACK);
        y += 20;
    }
}

/// Draw one frame.
///
/// Takes the raylib handle and thread out of the world for the duration of
/// the frame so the passes can query the world freely.
pub fn render_system(world: &mut World) {
    let Some(mut rl) = world.remove_non_send_resource::<RaylibHandle>() else {
        return;
    };
    let Some(thread) = world.remove_non_send_resource::<RaylibThread>() else {
        world.insert_non_send_resource(rl);
        return;
    };

    let zoom = world
        .get_resource::<GameConfig>()
        .map(|c| c.pixels_per_unit)
        .unwrap_or(64.0);
    let camera = Camera2D {
        offset: Vector2 {
            x: rl.get_screen_width() as f32 * 0.5,
            y: rl.get_screen_height() as f32 * 0.5,
        },
        target: Vector2 { x: 0.0, y: 0.0 },
        rotation: 0.0,
        zoom,
    };

    {
        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::RAYWHITE);
        {
            let mut d2 = d.begin_mode2D(camera);
            render_pass(world, &mut d2);
        }
        render_debug_ui(world, &mut d);
    }

    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);
}
