//! Portal-walking software rasterizer.
//!
//! Each screen column is rendered independently: one cached ray walk
//! outward from the viewer (the trace), then two replays of the cached
//! crossings that actually paint, one for floor-side spans and one for
//! ceiling-side spans, and finally the sprites picked up during the
//! trace composited back to front.

use bitflags::bitflags;
use glam::Vec2;

use crate::geom::{EdgeCache, Intersection, ray_walk_cached, segment_ray_intersect};
use crate::renderer::software::sprites::{SpriteFrame, SpriteId};
use crate::renderer::{Renderer, Rgba};
use crate::world::geometry::{Level, PlatformId};
use crate::world::texture::TextureBank;
use crate::world::view::View;

/// Tangent of half the horizontal field of view.
const TAN_FOV: f32 = 1.0;
/// Distance from the eye to the projection plane, in ray-length units.
const SCREEN_DISTANCE: f32 = 1.0;

bitflags! {
    /// Marks the crossing whose span closes a surface for the column.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct FinalFlags: u8 {
        const FLOOR = 1;
        const CEILING = 2;
    }
}

/// One cached crossing: the spans between `platform` and the far side
/// of `hit.edge` are drawn from it during the replay passes.
#[derive(Clone, Copy)]
struct TraceStep {
    hit: Intersection,
    platform: PlatformId,
    flags: FinalFlags,
}

/// A sprite visible in the current column, with the occlusion window
/// that was open when the trace reached it.
#[derive(Clone, Copy)]
pub(super) struct VisSprite {
    pub sprite: SpriteId,
    pub dist: f32,
    pub tex_offset: f32,
    /// Floor-side visibility bound (a gradient).
    pub min_grad: f32,
    /// Ceiling-side visibility bound.
    pub max_grad: f32,
    /// Sprite sits in the viewer's own platform; no clipping needed.
    pub unbounded: bool,
}

/// C-style clamp; tolerates an infinite `v` and never panics on a
/// degenerate window.
#[inline]
fn window_clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

pub struct Software {
    pub(super) width: usize,
    pub(super) height: usize,
    pub(super) frame: Vec<Rgba>,

    pub(super) half_h: i32,
    pub(super) grad_to_pixel_coeff: f32,
    /// Screen-space gradient of each pixel row.
    pub(super) pixel_to_grad: Vec<f32>,
    /// `(1 << PRECISION_BITS) / pixel_to_grad[y]`, for flat spans.
    pub(super) inv_pixel_to_grad_fp: Vec<i32>,

    // Per-column scratch, reused to avoid per-frame allocation.
    steps: Vec<TraceStep>,
    vis: Vec<VisSprite>,
    visited: EdgeCache,
}

impl Software {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            frame: Vec::new(),
            half_h: 0,
            grad_to_pixel_coeff: 0.0,
            pixel_to_grad: Vec::new(),
            inv_pixel_to_grad_fp: Vec::new(),
            steps: Vec::new(),
            vis: Vec::new(),
            visited: EdgeCache::new(),
        }
    }

    fn rebuild_projection(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        self.half_h = (self.height / 2) as i32;
        self.grad_to_pixel_coeff = -(w * self.half_h as f32) / (h * TAN_FOV);
        let pixel_to_grad_coeff = -(TAN_FOV * h / w) / self.half_h as f32;

        self.pixel_to_grad.clear();
        self.inv_pixel_to_grad_fp.clear();
        for y in 0..self.height {
            let g = (y as i32 - self.half_h) as f32 * pixel_to_grad_coeff;
            self.pixel_to_grad.push(g);
            self.inv_pixel_to_grad_fp
                .push(((1 << crate::world::texture::PRECISION_BITS) as f32 / g) as i32);
        }
    }

    /// Unnormalized view ray for screen column `x`; crossing distances
    /// are measured in multiples of its length, consistently for walls
    /// and sprites within the column.
    fn column_ray(&self, view_dir: Vec2, x: usize) -> Vec2 {
        let lateral = TAN_FOV * SCREEN_DISTANCE * (2.0 * x as f32 / self.width as f32 - 1.0);
        view_dir * SCREEN_DISTANCE + view_dir.perp() * lateral
    }

    fn register_sprite(&mut self, v: VisSprite) {
        if let Some(prev) = self.vis.iter_mut().find(|p| p.sprite == v.sprite) {
            *prev = v;
        } else {
            self.vis.push(v);
        }
    }

    /// Phase one: walk the ray outward, caching crossings and running
    /// the occlusion-window arithmetic without painting.  Sprites are
    /// picked up with the window that was open when their platform was
    /// entered.  Returns with `self.steps` empty when the walk fails
    /// immediately (the column is then left undrawn).
    fn trace_column(&mut self, level: &Level, sprites: &SpriteFrame, view: &View, dir: Vec2) {
        self.steps.clear();
        self.vis.clear();
        self.visited.clear();

        let mut max_floor = self.pixel_to_grad[self.height - 1];
        let mut min_ceil = self.pixel_to_grad[0];
        let mut prev_floor = f32::NEG_INFINITY;
        let mut prev_ceil = f32::INFINITY;

        let mut platform = view.platform;
        let mut prev_dist = 0.0f32;
        let mut final_floor: Option<usize> = None;
        let mut final_ceil: Option<usize> = None;

        let Some(mut hit) =
            ray_walk_cached(level, platform, dir, view.pos, 0.0, &mut self.visited)
        else {
            return;
        };

        loop {
            let idx = self.steps.len();

            for &sid in sprites.on_platform(platform) {
                let s = sprites.sprite(sid);
                if let Some(sh) = segment_ray_intersect(
                    view.pos,
                    dir,
                    s.verts[0],
                    s.verts[1],
                    s.normal,
                    s.dir,
                    s.plane_dist,
                ) && sh.dist > prev_dist
                    && sh.dist < hit.distance
                {
                    self.register_sprite(VisSprite {
                        sprite: sid,
                        dist: sh.dist,
                        tex_offset: sh.offset,
                        min_grad: max_floor,
                        max_grad: min_ceil,
                        unbounded: idx == 0,
                    });
                }
            }

            let near = level.platform(platform);
            let far = level.platform(hit.platform);
            let dist = hit.distance;

            // Near floor span.
            let fg = (near.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                max_floor = g1;
                final_floor = Some(idx);
            }
            prev_floor = fg;

            // Near ceiling span.
            let cg = (near.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                min_ceil = g2;
                final_ceil = Some(idx);
            }
            prev_ceil = cg;

            // Wall up to the far floor.
            let fg = (far.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                max_floor = g1;
                final_floor = Some(idx);
            }
            prev_floor = fg;

            // Wall down to the far ceiling.
            let cg = (far.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                min_ceil = g2;
                final_ceil = Some(idx);
            }
            prev_ceil = cg;

            self.steps.push(TraceStep {
                hit,
                platform,
                flags: FinalFlags::empty(),
            });

            if max_floor >= min_ceil {
                // The visible strip has closed; the best floor and
                // ceiling owners terminate the replay passes.
                if let Some(i) = final_floor {
                    self.steps[i].flags |= FinalFlags::FLOOR;
                }
                if let Some(i) = final_ceil {
                    self.steps[i].flags |= FinalFlags::CEILING;
                }
                return;
            }
            if level.is_outside(hit.platform) {
                // An enclosed level closes the window before the walk
                // escapes; getting here means a gap in the map.
                log::debug!("column trace reached the outside platform");
                return;
            }

            platform = hit.platform;
            prev_dist = hit.distance;
            match ray_walk_cached(level, platform, dir, hit.pos, prev_dist, &mut self.visited) {
                Some(h) => hit = h,
                None => return,
            }
        }
    }

    /// Phase two, floor side: replay the cached crossings, painting
    /// floor spans and the walls rising to each far floor.
    fn floor_pass(&mut self, level: &Level, bank: &TextureBank, view: &View, dir: Vec2, x: usize) {
        let mut max_floor = self.pixel_to_grad[self.height - 1];
        let mut min_ceil = self.pixel_to_grad[0];
        let mut prev_floor = f32::NEG_INFINITY;
        let mut prev_ceil = f32::INFINITY;

        for i in 0..self.steps.len() {
            let step = self.steps[i];
            let near = level.platform(step.platform);
            let far = level.platform(step.hit.platform);
            let dist = step.hit.distance;

            let fg = (near.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                let tex = bank.get(near.texture);
                self.draw_flat_span(tex, near.floor_h - view.eye_level, dir, view.pos, g1, g2, x);
                max_floor = g1;
            }
            prev_floor = fg;

            let cg = (near.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                min_ceil = g2;
            }
            prev_ceil = cg;

            let fg = (far.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                let tex = bank.get(level.edge(step.hit.edge).texture);
                self.draw_wall_span(tex, step.hit.tex_offset, dist, view.eye_level, g1, g2, x);
                max_floor = g1;
            }
            prev_floor = fg;

            let cg = (far.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                min_ceil = g2;
            }
            prev_ceil = cg;

            if step.flags.contains(FinalFlags::FLOOR) || max_floor >= min_ceil {
                return;
            }
        }
    }

    /// Phase two, ceiling side: the mirror image of [`Self::floor_pass`].
    fn ceiling_pass(
        &mut self,
        level: &Level,
        bank: &TextureBank,
        view: &View,
        dir: Vec2,
        x: usize,
    ) {
        let mut max_floor = self.pixel_to_grad[self.height - 1];
        let mut min_ceil = self.pixel_to_grad[0];
        let mut prev_floor = f32::NEG_INFINITY;
        let mut prev_ceil = f32::INFINITY;

        for i in 0..self.steps.len() {
            let step = self.steps[i];
            let near = level.platform(step.platform);
            let far = level.platform(step.hit.platform);
            let dist = step.hit.distance;

            let fg = (near.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                max_floor = g1;
            }
            prev_floor = fg;

            let cg = (near.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                let tex = bank.get(near.texture);
                self.draw_flat_span(tex, near.ceil_h - view.eye_level, dir, view.pos, g1, g2, x);
                min_ceil = g2;
            }
            prev_ceil = cg;

            let fg = (far.floor_h - view.eye_level) / dist;
            let g2 = window_clamp(prev_floor, max_floor, min_ceil);
            let g1 = window_clamp(fg, max_floor, min_ceil);
            if g2 < g1 {
                max_floor = g1;
            }
            prev_floor = fg;

            let cg = (far.ceil_h - view.eye_level) / dist;
            let g1 = window_clamp(prev_ceil, max_floor, min_ceil);
            let g2 = window_clamp(cg, max_floor, min_ceil);
            if g2 < g1 {
                let tex = bank.get(level.edge(step.hit.edge).texture);
                self.draw_wall_span(tex, step.hit.tex_offset, dist, view.eye_level, g1, g2, x);
                min_ceil = g2;
            }
            prev_ceil = cg;

            if step.flags.contains(FinalFlags::CEILING) || max_floor >= min_ceil {
                return;
            }
        }
    }

    /// Composite the column's sprites back to front.
    fn sprite_pass(&mut self, sprites: &SpriteFrame, bank: &TextureBank, view: &View, x: usize) {
        for i in (0..self.vis.len()).rev() {
            let v = self.vis[i];
            let s = *sprites.sprite(v.sprite);
            let tex = bank.get(s.texture);
            self.draw_sprite_span(&s, tex, v, view.eye_level, x);
        }
    }
}

impl Default for Software {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for Software {
    fn begin_frame(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.frame = vec![0; width * height];
        self.rebuild_projection();
    }

    fn render(&mut self, level: &Level, bank: &TextureBank, sprites: &SpriteFrame, view: &View) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        for x in 0..self.width {
            let dir = self.column_ray(view.dir, x);
            self.trace_column(level, sprites, view, dir);
            if self.steps.is_empty() {
                continue;
            }
            self.floor_pass(level, bank, view, dir, x);
            self.ceiling_pass(level, bank, view, dir, x);
            self.sprite_pass(sprites, bank, view, x);
        }
    }

    fn end_frame(&mut self, submit: impl FnOnce(&[Rgba], usize, usize)) {
        submit(&self.frame, self.width, self.height);
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::software::sprites::AttachSurface;
    use crate::world::fixtures::{one_room_level, two_room_level};
    use crate::world::texture::Texture;
    use glam::vec2;

    const LIGHT: Rgba = 0x0060_6060;
    const DARK: Rgba = 0x0030_3030;

    fn checker_bank() -> TextureBank {
        TextureBank::default_with_checker()
    }

    #[test]
    fn closed_room_paints_every_row_but_the_last() {
        let level = one_room_level(0.0, 128.0);
        let bank = checker_bank();
        let sprites = SpriteFrame::for_level(&level);
        let view = View::new(vec2(64.0, 64.0), vec2(1.0, 0.0), 64.0, 1);

        let mut sw = Software::new();
        sw.begin_frame(64, 48);
        sw.render(&level, &bank, &sprites, &view);
        sw.end_frame(|px, w, h| {
            assert_eq!(px.len(), w * h);
            for y in 0..h - 1 {
                for x in 0..w {
                    let p = px[y * w + x];
                    assert!(p == LIGHT || p == DARK, "unpainted pixel at ({x},{y}): {p:#x}");
                }
            }
        });
    }

    #[test]
    fn portal_walk_sees_into_neighbour_room() {
        // Room B's floor is raised, so the centre column must cache
        // two crossings: the portal and B's far wall.
        let level = two_room_level(0.0, 128.0, 32.0, 128.0);
        let sprites = SpriteFrame::for_level(&level);
        let view = View::new(vec2(64.0, 64.0), vec2(1.0, 0.0), 64.0, 1);

        let mut sw = Software::new();
        sw.begin_frame(64, 48);
        let dir = sw.column_ray(view.dir, 32);
        sw.trace_column(&level, &sprites, &view, dir);
        assert!(sw.steps.len() >= 2);
        assert_eq!(sw.steps[0].platform, 1);
        assert_eq!(sw.steps[0].hit.platform, 2);
        assert_eq!(sw.steps[1].platform, 2);
    }

    #[test]
    fn trace_marks_final_crossings_when_window_closes() {
        // Viewed from far enough back, both the floor and the ceiling
        // of the room project inside the screen, so the single wall
        // crossing closes both surfaces.
        let level = one_room_level(0.0, 128.0);
        let sprites = SpriteFrame::for_level(&level);
        let view = View::new(vec2(16.0, 64.0), vec2(1.0, 0.0), 64.0, 1);

        let mut sw = Software::new();
        sw.begin_frame(64, 48);
        let dir = sw.column_ray(view.dir, 32);
        sw.trace_column(&level, &sprites, &view, dir);
        assert_eq!(sw.steps.len(), 1);
        assert!(sw.steps[0].flags.contains(FinalFlags::FLOOR));
        assert!(sw.steps[0].flags.contains(FinalFlags::CEILING));
    }

    #[test]
    fn extreme_gradients_saturate_instead_of_overflowing() {
        let mut sw = Software::new();
        sw.begin_frame(1024, 768);
        assert_eq!(sw.grad_to_pixel(f32::INFINITY), i32::MIN);
        assert_eq!(sw.grad_to_pixel(f32::NEG_INFINITY), i32::MAX);
        assert_eq!(sw.grad_to_pixel(0.0), 384);
    }

    #[test]
    fn sprite_against_the_eye_clips_to_the_screen() {
        // The viewer stands a hair off the billboard's segment; its
        // projected extent is astronomically tall and must clip rather
        // than wrap the row arithmetic.
        let level = one_room_level(0.0, 128.0);
        let mut bank = checker_bank();
        let red = bank
            .insert(Texture::from_rows("red.tga", 8, 8, &[0x00FF_0000; 64]).unwrap())
            .unwrap();
        let mut sprites = SpriteFrame::for_level(&level);
        sprites.add_sprite(
            &level,
            [vec2(64.00001, 32.0), vec2(64.00001, 96.0)],
            64.0,
            0.0,
            AttachSurface::Floor,
            red,
        );
        let view = View::new(vec2(64.0, 64.0), vec2(1.0, 0.0), 64.0, 1);

        let mut sw = Software::new();
        sw.begin_frame(1024, 768);
        sw.render(&level, &bank, &sprites, &view);
        sw.end_frame(|px, w, h| {
            // Below the horizon the sprite shows; the rows above it
            // still hold the room's ceiling.
            assert_eq!(px[(h / 2 + 100) * w + w / 2], 0x00FF_0000);
            assert_ne!(px[100 * w + w / 2], 0x00FF_0000);
        });
    }

    #[test]
    fn resize_rebuilds_projection_tables() {
        let mut sw = Software::new();
        sw.begin_frame(64, 48);
        assert_eq!(sw.pixel_to_grad.len(), 48);
        let top = sw.pixel_to_grad[0];
        assert!(top > 0.0);
        assert_eq!(sw.grad_to_pixel(top), 0);
        assert_eq!(sw.grad_to_pixel(0.0), 24);

        sw.begin_frame(128, 96);
        assert_eq!(sw.pixel_to_grad.len(), 96);
        assert_eq!(sw.grad_to_pixel(0.0), 48);
    }
}
