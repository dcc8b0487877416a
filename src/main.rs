//! Windowed front end: loads a level, spawns the world, and runs the
//! input / physics / render loop.
//!
//! ```bash
//! cargo run --release -- levels/out.lvl
//! ```
//!
//! Controls: W/A/S/D move, N/M turn, mouse looks, Esc quits.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use glam::{Vec2, vec2};
use minifb::{Key, MouseMode, Window, WindowOptions};

use portalcaster::lvl::{LevelAssets, load_level};
use portalcaster::renderer::{Renderer, Software, SpriteFrame};
use portalcaster::sim::{self, Keys, World, do_physics};
use portalcaster::world::texture::TextureBank;

/// Simulation advances in fixed steps of this many milliseconds.
const PHYSICS_TICK_MS: u64 = 10;
/// FPS is reported once per this interval.
const FPS_REPORT_MS: u64 = 1000;

#[derive(Parser)]
#[command(about = "Portal-graph software raycaster")]
struct Cli {
    /// Level file to load.
    #[arg(default_value = "levels/out.lvl")]
    level: PathBuf,

    /// Directory texture paths resolve against.
    #[arg(long, default_value = "textures")]
    textures: PathBuf,

    #[arg(long, default_value_t = 1024)]
    width: usize,

    #[arg(long, default_value_t = 768)]
    height: usize,
}

fn held_keys(window: &Window) -> Keys {
    let mut keys = Keys::empty();
    for (key, bit) in [
        (Key::W, Keys::FORWARD),
        (Key::A, Keys::LEFT),
        (Key::S, Keys::BACK),
        (Key::D, Keys::RIGHT),
        (Key::N, Keys::TURN_LEFT),
        (Key::M, Keys::TURN_RIGHT),
    ] {
        if window.is_key_down(key) {
            keys |= bit;
        }
    }
    keys
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut bank = TextureBank::default_with_checker();
    let level = load_level(&cli.level, &cli.textures, &mut bank)
        .with_context(|| format!("loading level {}", cli.level.display()))?;

    let mut world = World::new();
    {
        let mut assets = LevelAssets::new(&mut bank, &cli.textures);
        world.add_entity(&level, &mut assets, r"type=spawn\coords=384 384\angle=0")?;
        world.add_entity(&level, &mut assets, r"type=monster\coords=300 300\angle=90")?;
    }
    world.spawn_player(&level)?;

    let mut sprites = SpriteFrame::for_level(&level);
    let mut renderer = Software::new();

    let mut window = Window::new(
        "portalcaster",
        cli.width,
        cli.height,
        WindowOptions::default(),
    )
    .context("opening window")?;

    let start = Instant::now();
    let mut last_physics = 0u64;
    let mut last_cursor: Option<Vec2> = None;
    let mut last_mouse_poll = 0u64;
    let mut last_fps_report = 0u64;
    let mut frames = 0u32;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = start.elapsed().as_millis() as u64;
        world.time_ms = now;

        if let Some(i) = world.player {
            world.entities[i].keys = held_keys(&window);
        }

        if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Pass) {
            let cursor = vec2(mx, my);
            if now > last_mouse_poll {
                if let Some(last) = last_cursor {
                    world.mouse_speed = (cursor - last) * 1000.0 / (now - last_mouse_poll) as f32;
                }
                last_cursor = Some(cursor);
                last_mouse_poll = now;
            }
        }

        if now - last_physics > PHYSICS_TICK_MS {
            do_physics(&mut world, &level, PHYSICS_TICK_MS);
            last_physics = now;
        }

        sprites.clear();
        match sim::setup_frame(&mut world, &level, &bank, &mut sprites) {
            Some(view) => {
                renderer.begin_frame(cli.width, cli.height);
                renderer.render(&level, &bank, &sprites, &view);
                let mut submitted = Ok(());
                renderer.end_frame(|buf, w, h| submitted = window.update_with_buffer(buf, w, h));
                submitted.context("presenting frame")?;
            }
            None => window.update(),
        }

        frames += 1;
        if now > last_fps_report + FPS_REPORT_MS {
            let elapsed = now - last_fps_report;
            log::info!(
                "FPS: {:.1} ({:.2} ms per frame)",
                frames as f32 * 1000.0 / elapsed as f32,
                elapsed as f32 / frames as f32,
            );
            frames = 0;
            last_fps_report = now;
        }
    }
    Ok(())
}
