//! Minimal TGA decoder: uncompressed (type 2) and run-length encoded
//! (type 10) true-colour images at 24 or 32 bits per pixel, which is
//! everything the asset pipeline produces.  Colour-mapped files are
//! rejected.  Output is row-major top-down `0x00RRGGBB`.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TgaError {
    #[error("file truncated at byte {0}")]
    Truncated(usize),

    #[error("colour-mapped TGA files are not supported")]
    ColorMapped,

    #[error("unsupported TGA image type {0}")]
    UnsupportedType(u8),

    #[error("unsupported TGA depth {0} bpp")]
    UnsupportedDepth(u8),
}

#[derive(Debug)]
pub struct TgaImage {
    pub w: usize,
    pub h: usize,
    /// Top-down row-major pixels.
    pub rows: Vec<u32>,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Result<u8, TgaError> {
        let b = *self
            .bytes
            .get(self.at)
            .ok_or(TgaError::Truncated(self.at))?;
        self.at += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, TgaError> {
        Ok(u16::from_le_bytes([self.u8()?, self.u8()?]))
    }

    fn skip(&mut self, n: usize) {
        self.at += n;
    }

    /// One pixel at `depth` bytes; file order is BGR(A).
    fn pixel(&mut self, depth: usize) -> Result<u32, TgaError> {
        let b = self.u8()? as u32;
        let g = self.u8()? as u32;
        let r = self.u8()? as u32;
        if depth == 4 {
            self.u8()?; // alpha, unused
        }
        Ok(r << 16 | g << 8 | b)
    }
}

pub fn decode(bytes: &[u8]) -> Result<TgaImage, TgaError> {
    let mut c = Cursor { bytes, at: 0 };

    let id_len = c.u8()? as usize;
    if c.u8()? != 0 {
        return Err(TgaError::ColorMapped);
    }
    let kind = c.u8()?;
    if kind != 2 && kind != 10 {
        return Err(TgaError::UnsupportedType(kind));
    }
    c.skip(5); // colour map fields, all zero for unmapped files
    c.u16()?; // x origin
    c.u16()?; // y origin
    let w = c.u16()? as usize;
    let h = c.u16()? as usize;
    let bpp = c.u8()?;
    if bpp != 24 && bpp != 32 {
        return Err(TgaError::UnsupportedDepth(bpp));
    }
    let depth = bpp as usize / 8;
    let descriptor = c.u8()?;
    c.skip(id_len);

    let mut rows = Vec::with_capacity(w * h);
    if kind == 2 {
        for _ in 0..w * h {
            rows.push(c.pixel(depth)?);
        }
    } else {
        while rows.len() < w * h {
            let header = c.u8()?;
            let count = (header & 127) as usize + 1;
            if header & 128 != 0 {
                let px = c.pixel(depth)?;
                rows.extend(std::iter::repeat_n(px, count));
            } else {
                for _ in 0..count {
                    rows.push(c.pixel(depth)?);
                }
            }
        }
        rows.truncate(w * h);
    }

    // Bit 5 of the descriptor means rows are already top-down;
    // otherwise the file stores them bottom-up.
    if descriptor & 32 == 0 && h > 1 {
        let mut flipped = Vec::with_capacity(w * h);
        for y in (0..h).rev() {
            flipped.extend_from_slice(&rows[y * w..(y + 1) * w]);
        }
        rows = flipped;
    }

    Ok(TgaImage { w, h, rows })
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
