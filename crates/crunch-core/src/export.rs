//! Sidecar serialization: the `crch` binary layout plus the XML and JSON
//! texture maps. All multi-byte integers are little-endian.
//!
//! Page writers emit one texture block each; the driver owns the outer
//! wrapper so that split-mode aggregation can concatenate page bodies from
//! separately built sub-atlases verbatim.

use std::io::{self, Read, Write};

use crate::config::StringFormat;
use crate::error::{CrunchError, Result};
use crate::packer::Packer;

pub const BIN_MAGIC: [u8; 4] = *b"crch";
pub const BIN_VERSION: i16 = 0;

pub fn write_byte<W: Write>(w: &mut W, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

pub fn write_short<W: Write>(w: &mut W, v: i16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn write_string<W: Write>(w: &mut W, s: &str, format: StringFormat) -> io::Result<()> {
    match format {
        StringFormat::NullTerminated => {
            w.write_all(s.as_bytes())?;
            write_byte(w, 0)
        }
        StringFormat::Prefix16 => {
            write_short(w, s.len() as i16)?;
            w.write_all(s.as_bytes())
        }
        StringFormat::Prefix7 => {
            let mut n = s.len();
            loop {
                let mut b = (n & 0x7f) as u8;
                n >>= 7;
                if n != 0 {
                    b |= 0x80;
                }
                write_byte(w, b)?;
                if n == 0 {
                    break;
                }
            }
            w.write_all(s.as_bytes())
        }
    }
}

/// Top-level binary header: magic, version, trim/rotate flags, string
/// format. The texture count follows separately because split-mode
/// sub-atlas files start at the count.
pub fn write_bin_header<W: Write>(
    w: &mut W,
    trim: bool,
    rotate: bool,
    format: StringFormat,
) -> io::Result<()> {
    w.write_all(&BIN_MAGIC)?;
    write_short(w, BIN_VERSION)?;
    write_byte(w, trim as u8)?;
    write_byte(w, rotate as u8)?;
    write_byte(w, format.code())
}

/// One texture block: name, image count, then per-image records.
pub fn write_bin_page<W: Write>(
    w: &mut W,
    name: &str,
    packer: &Packer,
    trim: bool,
    rotate: bool,
    format: StringFormat,
) -> io::Result<()> {
    write_string(w, name, format)?;
    write_short(w, packer.bitmaps.len() as i16)?;
    for (bitmap, point) in packer.bitmaps.iter().zip(&packer.points) {
        write_string(w, &bitmap.name, format)?;
        write_short(w, point.x as i16)?;
        write_short(w, point.y as i16)?;
        write_short(w, bitmap.width as i16)?;
        write_short(w, bitmap.height as i16)?;
        if trim {
            write_short(w, bitmap.frame_x as i16)?;
            write_short(w, bitmap.frame_y as i16)?;
            write_short(w, bitmap.frame_w as i16)?;
            write_short(w, bitmap.frame_h as i16)?;
        }
        if rotate {
            write_byte(w, point.rot as u8)?;
        }
    }
    Ok(())
}

pub fn write_xml_page<W: Write>(
    w: &mut W,
    name: &str,
    packer: &Packer,
    trim: bool,
    rotate: bool,
) -> io::Result<()> {
    writeln!(w, "\t<tex n=\"{}\">", name)?;
    for (bitmap, point) in packer.bitmaps.iter().zip(&packer.points) {
        write!(
            w,
            "\t\t<img n=\"{}\" x=\"{}\" y=\"{}\" w=\"{}\" h=\"{}\" ",
            bitmap.name, point.x, point.y, bitmap.width, bitmap.height
        )?;
        if trim {
            write!(
                w,
                "fx=\"{}\" fy=\"{}\" fw=\"{}\" fh=\"{}\" ",
                bitmap.frame_x, bitmap.frame_y, bitmap.frame_w, bitmap.frame_h
            )?;
        }
        if rotate {
            write!(w, "r=\"{}\" ", point.rot as u8)?;
        }
        writeln!(w, "/>")?;
    }
    writeln!(w, "\t</tex>")
}

pub fn write_json_page<W: Write>(
    w: &mut W,
    name: &str,
    packer: &Packer,
    trim: bool,
    rotate: bool,
) -> io::Result<()> {
    writeln!(w, "\t\t\"{}\": {{", name)?;
    let count = packer.bitmaps.len();
    for (i, (bitmap, point)) in packer.bitmaps.iter().zip(&packer.points).enumerate() {
        write!(
            w,
            "\t\t\t\"{}\": {{ \"x\": {}, \"y\": {}, \"w\": {}, \"h\": {}",
            bitmap.name, point.x, point.y, bitmap.width, bitmap.height
        )?;
        if trim {
            write!(
                w,
                ", \"fx\": {}, \"fy\": {}, \"fw\": {}, \"fh\": {}",
                bitmap.frame_x, bitmap.frame_y, bitmap.frame_w, bitmap.frame_h
            )?;
        }
        if rotate {
            write!(w, ", \"r\": {}", point.rot)?;
        }
        write!(w, " }}")?;
        if i != count - 1 {
            write!(w, ",")?;
        }
        writeln!(w)?;
    }
    write!(w, "\t\t}}")
}

// ---------------- binary reading ----------------

/// Parsed contents of a binary sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasDoc {
    pub version: i16,
    pub trim: bool,
    pub rotate: bool,
    pub format: StringFormat,
    pub textures: Vec<TextureEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub name: String,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub name: String,
    pub x: i16,
    pub y: i16,
    pub width: i16,
    pub height: i16,
    /// `(frame_x, frame_y, frame_w, frame_h)`, present iff trim was on.
    pub frame: Option<(i16, i16, i16, i16)>,
    /// Present iff rotation was on.
    pub rotated: Option<bool>,
}

pub fn read_byte<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_short<R: Read>(r: &mut R) -> io::Result<i16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

pub fn read_string<R: Read>(r: &mut R, format: StringFormat) -> Result<String> {
    let bytes = match format {
        StringFormat::NullTerminated => {
            let mut bytes = Vec::new();
            loop {
                let b = read_byte(r)?;
                if b == 0 {
                    break;
                }
                bytes.push(b);
            }
            bytes
        }
        StringFormat::Prefix16 => {
            let len = read_short(r)?;
            if len < 0 {
                return Err(CrunchError::Malformed(format!("negative string length {len}")));
            }
            let mut bytes = vec![0u8; len as usize];
            r.read_exact(&mut bytes)?;
            bytes
        }
        StringFormat::Prefix7 => {
            let mut len = 0usize;
            let mut shift = 0u32;
            loop {
                let b = read_byte(r)?;
                len |= ((b & 0x7f) as usize) << shift;
                if b & 0x80 == 0 {
                    break;
                }
                shift += 7;
                if shift > 28 {
                    return Err(CrunchError::Malformed("string length varint too long".into()));
                }
            }
            let mut bytes = vec![0u8; len];
            r.read_exact(&mut bytes)?;
            bytes
        }
    };
    String::from_utf8(bytes).map_err(|e| CrunchError::Malformed(format!("invalid utf-8: {e}")))
}

/// Parses a complete binary sidecar (header plus texture blocks).
pub fn read_bin<R: Read>(r: &mut R) -> Result<AtlasDoc> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != BIN_MAGIC {
        return Err(CrunchError::Malformed(format!("bad magic {magic:?}")));
    }
    let version = read_short(r)?;
    let trim = read_byte(r)? != 0;
    let rotate = read_byte(r)? != 0;
    let code = read_byte(r)?;
    let format = StringFormat::from_code(code)
        .ok_or_else(|| CrunchError::Malformed(format!("unknown string format {code}")))?;

    let num_textures = read_short(r)?;
    if num_textures < 0 {
        return Err(CrunchError::Malformed(format!(
            "negative texture count {num_textures}"
        )));
    }
    let mut textures = Vec::with_capacity(num_textures as usize);
    for _ in 0..num_textures {
        textures.push(read_texture(r, trim, rotate, format)?);
    }
    Ok(AtlasDoc {
        version,
        trim,
        rotate,
        format,
        textures,
    })
}

fn read_texture<R: Read>(
    r: &mut R,
    trim: bool,
    rotate: bool,
    format: StringFormat,
) -> Result<TextureEntry> {
    let name = read_string(r, format)?;
    let num_images = read_short(r)?;
    if num_images < 0 {
        return Err(CrunchError::Malformed(format!(
            "negative image count {num_images}"
        )));
    }
    let mut images = Vec::with_capacity(num_images as usize);
    for _ in 0..num_images {
        let name = read_string(r, format)?;
        let x = read_short(r)?;
        let y = read_short(r)?;
        let width = read_short(r)?;
        let height = read_short(r)?;
        let frame = if trim {
            Some((
                read_short(r)?,
                read_short(r)?,
                read_short(r)?,
                read_short(r)?,
            ))
        } else {
            None
        };
        let rotated = if rotate { Some(read_byte(r)? != 0) } else { None };
        images.push(ImageEntry {
            name,
            x,
            y,
            width,
            height,
            frame,
            rotated,
        });
    }
    Ok(TextureEntry { name, images })
}
