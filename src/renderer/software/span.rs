//! Fixed-point span samplers.  One call paints one contiguous run of
//! pixels in a single column: a textured wall strip, a perspective
//! floor/ceiling strip, or a sprite strip with colour-key holes.

use glam::Vec2;

use super::renderer::{Software, VisSprite};
use crate::renderer::TRANSPARENT;
use crate::renderer::software::sprites::Sprite;
use crate::world::texture::{DOUBLE_PRECISION_BITS, PRECISION_BITS, Texture};

/// 1.0 in the small fixed-point format.
const FP_ONE: f32 = (1 << PRECISION_BITS) as f32;

impl Software {
    /// Screen row for a gradient; larger gradients are higher up.
    /// Computed in i64 and saturated: a sprite against the eye yields
    /// gradients far past the i32 range.
    #[inline]
    pub(super) fn grad_to_pixel(&self, grad: f32) -> i32 {
        let row = ((grad * self.grad_to_pixel_coeff) as i64).saturating_add(self.half_h as i64);
        row.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Wall strip between gradients `g1` (upper) and `g2` (lower) at
    /// crossing distance `dist`.  The vertical texture coordinate is
    /// world height in texels, advanced incrementally and recomputed
    /// exactly every 16 rows to cap rounding drift.
    pub(super) fn draw_wall_span(
        &mut self,
        tex: &Texture,
        tex_offset: f32,
        dist: f32,
        eye: f32,
        g1: f32,
        g2: f32,
        x: usize,
    ) {
        let mut p1 = self.grad_to_pixel(g1);
        let mut p2 = self.grad_to_pixel(g2);
        if p1 == p2 {
            return;
        }
        p1 = p1.max(0);
        p2 = p2.min(self.height as i32 - 1);
        if p2 <= p1 {
            return;
        }

        let h1 = (FP_ONE * (eye + self.pixel_to_grad[p1 as usize] * dist)) as i32;
        let h2 = (FP_ONE * (eye + self.pixel_to_grad[p2 as usize] * dist)) as i32;

        let tx = (tex_offset as i32) & tex.mask_w;
        let col = tex.column(tx);
        let inc = ((h2 - h1) / (p2 - p1)) & tex.mask_h_fp;
        let mut ty = h1 & tex.mask_h_fp;

        let mut idx = p1 as usize * self.width + x;
        for y in p1..p2 {
            self.frame[idx] = tex.pixels[col + (ty >> PRECISION_BITS) as usize];
            ty = if y & 0xF == 0 {
                let exact = (h2 as i64 * (y - p1) as i64 + h1 as i64 * (p2 - y) as i64)
                    / (p2 - p1) as i64;
                (exact as i32) & tex.mask_h_fp
            } else {
                (ty + inc) & tex.mask_h_fp
            };
            idx += self.width;
        }
    }

    /// Horizontal floor/ceiling strip of the surface `h` units above
    /// (or below, negative) the eye.  Texture coordinates come from
    /// intersecting each row's view ray with the surface plane, via
    /// the per-row inverse-gradient table.
    pub(super) fn draw_flat_span(
        &mut self,
        tex: &Texture,
        h: f32,
        dir: Vec2,
        view_pos: Vec2,
        g1: f32,
        g2: f32,
        x: usize,
    ) {
        let mut p1 = self.grad_to_pixel(g1);
        let mut p2 = self.grad_to_pixel(g2);
        p1 = p1.max(0);
        p2 = p2.min(self.height as i32 - 1);
        if p2 <= p1 {
            return;
        }

        let hdx = (dir.x * h * FP_ONE) as i32;
        let hdy = (dir.y * h * FP_ONE) as i32;
        let ox = (view_pos.x as i32) << DOUBLE_PRECISION_BITS;
        let oy = (view_pos.y as i32) << DOUBLE_PRECISION_BITS;

        let mut idx = p1 as usize * self.width + x;
        for y in p1..p2 {
            let ipg = self.inv_pixel_to_grad_fp[y as usize];
            let tx = hdx.wrapping_mul(ipg).wrapping_add(ox) & tex.mask_w_fp2;
            let ty = hdy.wrapping_mul(ipg).wrapping_add(oy) & tex.mask_h_fp2;
            self.frame[idx] = tex.pixels
                [((ty >> DOUBLE_PRECISION_BITS) + ((tx >> DOUBLE_PRECISION_BITS) << tex.log2h))
                    as usize];
            idx += self.width;
        }
    }

    /// Sprite strip, clipped to the visibility gradients recorded when
    /// the sprite entered the column's draw list.  Colour-keyed pixels
    /// are left untouched.
    pub(super) fn draw_sprite_span(
        &mut self,
        s: &Sprite,
        tex: &Texture,
        v: VisSprite,
        eye: f32,
        x: usize,
    ) {
        let spr_min = (s.h_lo - eye) / v.dist;
        let spr_max = (s.h_hi - eye) / v.dist;
        let p1b = self.grad_to_pixel(spr_max);
        let p2b = self.grad_to_pixel(spr_min);
        if p1b == p2b {
            return;
        }

        let mut p1 = if v.unbounded || spr_max < v.max_grad {
            p1b
        } else {
            self.grad_to_pixel(v.max_grad)
        };
        let mut p2 = if v.unbounded || spr_min > v.min_grad {
            p2b
        } else {
            self.grad_to_pixel(v.min_grad)
        };
        p1 = p1.max(0);
        p2 = p2.min(self.height as i32 - 1);
        if p2 <= p1 {
            return;
        }

        let h1 = s.h_lo as i32;
        let h2 = s.h_hi as i32;
        let tx = (v.tex_offset as i32) & tex.mask_w;
        let col = tex.column(tx);
        // The projected endpoints can sit at the saturated row limits,
        // so the interpolation runs in i64.
        let span = p2b as i64 - p1b as i64;
        let inc = ((((h2 - h1) as i64) << PRECISION_BITS) / span) as i32 & tex.mask_h_fp;
        let mut ty = ((((p1 as i64 - p1b as i64) * (h2 - h1) as i64) << PRECISION_BITS) / span)
            as i32
            & tex.mask_h_fp;

        let mut idx = p1 as usize * self.width + x;
        for _ in p1..p2 {
            let c = tex.pixels[col + (ty >> PRECISION_BITS) as usize];
            if c != TRANSPARENT {
                self.frame[idx] = c;
            }
            ty = (ty + inc) & tex.mask_h_fp;
            idx += self.width;
        }
    }
}
