// Decoded texture storage.  The renderer and world logic interact
// through `TextureId` only; decoding file formats is the loader's job.

use std::collections::HashMap;

/// Runtime handle for a texture in the bank.  Stable for the lifetime
/// of the bank.
pub type TextureId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// Fractional bits of the per-scanline fixed-point texture stepper.
pub const PRECISION_BITS: u32 = 8;
/// Fractional bits of the flat-span (inverse distance) sampler.
pub const DOUBLE_PRECISION_BITS: u32 = 2 * PRECISION_BITS;

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Both dimensions must be powers of two so masking can stand in
    /// for modulo in the samplers.
    #[error("texture `{path}` has non power-of-two size {w}x{h}")]
    NonPowerOfTwo { path: String, w: usize, h: usize },

    /// Attempted to insert a second texture with an existing path.
    #[error("texture path `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),
}

/// CPU-side storage: 32-bit 0x00RRGGBB, **column-major** (`y + x*h`) so
/// a wall column is one contiguous run.  The mask family is cached at
/// construction for the fixed-point samplers.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub path: String,
    pub w: usize,
    pub h: usize,
    pub log2h: u32,
    pub mask_w: i32,
    /// `(w << DOUBLE_PRECISION_BITS) - 1` / `(h << ..) - 1`
    pub mask_w_fp2: i32,
    pub mask_h_fp2: i32,
    /// `(h << PRECISION_BITS) - 1`
    pub mask_h_fp: i32,
    pub pixels: Vec<u32>,
}

impl Texture {
    /// Build a texture from row-major pixels, validating the
    /// power-of-two constraint and transposing into column-major order.
    pub fn from_rows(
        path: impl Into<String>,
        w: usize,
        h: usize,
        rows: &[u32],
    ) -> Result<Self, TextureError> {
        let path = path.into();
        if w == 0 || h == 0 || !w.is_power_of_two() || !h.is_power_of_two() {
            return Err(TextureError::NonPowerOfTwo { path, w, h });
        }
        let mut pixels = vec![0u32; w * h];
        for x in 0..w {
            for y in 0..h {
                pixels[y + x * h] = rows[y * w + x];
            }
        }
        Ok(Self {
            path,
            w,
            h,
            log2h: h.trailing_zeros(),
            mask_w: w as i32 - 1,
            mask_w_fp2: ((w as i32) << DOUBLE_PRECISION_BITS) - 1,
            mask_h_fp2: ((h as i32) << DOUBLE_PRECISION_BITS) - 1,
            mask_h_fp: ((h as i32) << PRECISION_BITS) - 1,
            pixels,
        })
    }

    /// Texel lookup; `x`/`y` must already be masked into range.
    #[inline(always)]
    pub fn texel(&self, x: i32, y: i32) -> u32 {
        self.pixels[(y + (x << self.log2h)) as usize]
    }

    /// Start index of texture column `x` in `pixels`.
    #[inline(always)]
    pub fn column(&self, x: i32) -> usize {
        (x << self.log2h) as usize
    }
}

/// Convenience checkerboard 8x8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT: u32 = 0x00_60_60_60;
        const DARK: u32 = 0x00_30_30_30;
        let mut rows = vec![0u32; 8 * 8];
        for y in 0..8 {
            for x in 0..8 {
                rows[y * 8 + x] = if (x ^ y) & 1 == 0 { LIGHT } else { DARK };
            }
        }
        Texture::from_rows("CHECKER", 8, 8, &rows).expect("8x8 is a power of two")
    }
}

/// Resolves a texture path to a bank id, loading on demand.  The
/// level loader implements this over the bank and the on-disk texture
/// directory; tests substitute a stub.
pub trait TextureSource {
    /// Never fails: unloadable textures degrade to the fallback id.
    fn texture_from_path(&mut self, path: &str) -> TextureId;
}

/// Load-once, reuse-by-path texture cache for one level.
///
/// * Does **not** know about TGA or the level file - that's the
///   loader's job.
/// * Stores exactly one copy per path; id **0** is always the
///   checkerboard fallback.
pub struct TextureBank {
    by_path: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    /// Create a bank whose id 0 is the supplied fallback texture.
    pub fn new(missing: Texture) -> Self {
        let mut by_path = HashMap::new();
        by_path.insert(missing.path.clone(), NO_TEXTURE);
        Self {
            by_path,
            data: vec![missing],
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    /// Number of textures stored (including the fallback).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    }

    /// Obtain the id for an already-loaded texture by path.
    pub fn id(&self, path: &str) -> Option<TextureId> {
        self.by_path.get(path).copied()
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Borrow a texture by id, substituting the fallback for a bad id.
    /// For render paths that must always paint something.
    pub fn get(&self, id: TextureId) -> &Texture {
        self.data.get(id as usize).unwrap_or(&self.data[0])
    }

    /// Insert a texture under its own path key.
    pub fn insert(&mut self, tex: Texture) -> Result<TextureId, TextureError> {
        if self.by_path.contains_key(&tex.path) {
            return Err(TextureError::Duplicate(tex.path.clone()));
        }
        let id = self.data.len() as TextureId;
        self.by_path.insert(tex.path.clone(), id);
        self.data.push(tex);
        Ok(id)
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
