use bitfield::bitfield;
use bitflags::bitflags;
use core::ops::Deref;
use crate::rdp::RdpError;

pub mod op {
    pub const TEXTURE_RECTANGLE: u8 = 0x24;
    pub const SYNC_LOAD: u8 = 0x26;
    pub const SYNC_PIPE: u8 = 0x27;
    pub const SYNC_TILE: u8 = 0x28;
    pub const SYNC_FULL: u8 = 0x29;
    pub const SET_SCISSOR: u8 = 0x2D;
    pub const SET_OTHER_MODES: u8 = 0x2F;
    pub const LOAD_TLUT: u8 = 0x30;
    pub const LOAD_TILE: u8 = 0x34;
    pub const SET_TILE: u8 = 0x35;
    pub const SET_TEXTURE_IMAGE: u8 = 0x3D;
    pub const SET_COLOR_IMAGE: u8 = 0x3F;
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct CommandWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
}

bitfield! {
    /// SetColorImage / SetTextureImage.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ImageWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
    pub u8, format, set_format: 55, 53;
    pub u8, size, set_size: 52, 51;
    pub u16, width_minus_one, set_width_minus_one: 41, 32;
    pub u32, addr, set_addr: 25, 0;
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct TileWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
    pub u8, format, set_format: 55, 53;
    pub u8, size, set_size: 52, 51;
    pub u16, line, set_line: 49, 41;
    pub u16, tmem, set_tmem: 40, 32;
    pub u8, tile, set_tile: 26, 24;
    pub u8, palette, set_palette: 23, 20;
}

bitfield! {
    /// LoadTile / LoadTlut. Coordinates are 10.2.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct LoadWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
    pub u16, sl, set_sl: 55, 44;
    pub u16, tl, set_tl: 43, 32;
    pub u8, tile, set_tile: 26, 24;
    pub u16, sh, set_sh: 23, 12;
    pub u16, th, set_th: 11, 0;
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ScissorWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
    pub u16, xh, set_xh: 55, 44;
    pub u16, yh, set_yh: 43, 32;
    pub u16, xl, set_xl: 23, 12;
    pub u16, yl, set_yl: 11, 0;
}

bitfield! {
    /// First word of TextureRectangle: lower-right corner first.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct RectWord(u64);
    impl Debug;
    pub u8, opcode, set_opcode: 61, 56;
    pub u16, xl, set_xl: 55, 44;
    pub u16, yl, set_yl: 43, 32;
    pub u8, tile, set_tile: 26, 24;
    pub u16, xh, set_xh: 23, 12;
    pub u16, yh, set_yh: 11, 0;
}

bitfield! {
    /// Second word of TextureRectangle.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct TexCoordWord(u64);
    impl Debug;
    pub u16, s, set_s: 63, 48;
    pub u16, t, set_t: 47, 32;
    pub u16, dsdx, set_dsdx: 31, 16;
    pub u16, dtdy, set_dtdy: 15, 0;
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct OtherModes: u64 {
        const CYCLE_COPY = 2 << 52;
        const CYCLE_FILL = 3 << 52;
        const ENABLE_TLUT = 1 << 47;
        const TLUT_IA = 1 << 46;
        const SAMPLE_BILERP = 1 << 45;
        const ALPHA_COMPARE = 1 << 0;
    }
}

const OTHER_MODES_MASK: u64 = (1 << 56) - 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CycleType {
    OneCycle,
    TwoCycle,
    Copy,
    Fill,
}

impl OtherModes {
    pub fn cycle_type(&self) -> CycleType {
        match (self.bits() >> 52) & 0b11 {
            0 => CycleType::OneCycle,
            1 => CycleType::TwoCycle,
            2 => CycleType::Copy,
            _ => CycleType::Fill,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TexelFormat {
    Rgba = 0,
    Yuv = 1,
    ColorIndex = 2,
    Ia = 3,
    I = 4,
}

impl TexelFormat {
    fn from_bits(v: u8) -> Result<Self, RdpError> {
        Ok(match v {
            0 => Self::Rgba,
            1 => Self::Yuv,
            2 => Self::ColorIndex,
            3 => Self::Ia,
            4 => Self::I,
            _ => return Err(RdpError::Unsupported("texel format")),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelSize {
    Bits4 = 0,
    Bits8 = 1,
    Bits16 = 2,
    Bits32 = 3,
}

impl PixelSize {
    fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::Bits4,
            1 => Self::Bits8,
            2 => Self::Bits16,
            _ => Self::Bits32,
        }
    }

    /// Bytes per texel; 4-bit texels round up to one.
    pub fn bytes(&self) -> u32 {
        match self {
            Self::Bits4 | Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Bits32 => 4,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    pub format: TexelFormat,
    pub size: PixelSize,
    pub width: u16,
    pub addr: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileDesc {
    pub format: TexelFormat,
    pub size: PixelSize,
    /// Row stride in 64-bit TMEM words.
    pub line: u16,
    /// Base in 64-bit TMEM words.
    pub tmem: u16,
    pub tile: u8,
    pub palette: u8,
}

impl Default for TileDesc {
    fn default() -> Self {
        Self { format: TexelFormat::Rgba, size: PixelSize::Bits16, line: 0, tmem: 0, tile: 0, palette: 0 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadArea {
    pub tile: u8,
    pub sl: u16,
    pub tl: u16,
    pub sh: u16,
    pub th: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scissor {
    pub xh: u16,
    pub yh: u16,
    pub xl: u16,
    pub yl: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TexRect {
    pub tile: u8,
    pub xh: u16,
    pub yh: u16,
    pub xl: u16,
    pub yl: u16,
    pub s: i16,
    pub t: i16,
    pub dsdx: i16,
    pub dtdy: i16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SyncPipe,
    SyncTile,
    SyncLoad,
    SyncFull,
    SetOtherModes(OtherModes),
    SetScissor(Scissor),
    SetColorImage(ImageDesc),
    SetTextureImage(ImageDesc),
    SetTile(TileDesc),
    LoadTile(LoadArea),
    LoadTlut(LoadArea),
    TextureRectangle(TexRect),
}

/// One or two encoded command words.
#[derive(Copy, Clone, Debug)]
pub struct Encoded {
    words: [u64; 2],
    len: usize,
}

impl Deref for Encoded {
    type Target = [u64];

    fn deref(&self) -> &[u64] {
        &self.words[..self.len]
    }
}

impl Encoded {
    fn one(w: u64) -> Self {
        Self { words: [w, 0], len: 1 }
    }
}

fn opcode_word(opcode: u8) -> CommandWord {
    let mut w = CommandWord(0);
    w.set_opcode(opcode);
    w
}

fn image_word(opcode: u8, image: &ImageDesc) -> u64 {
    let mut w = ImageWord(0);
    w.set_opcode(opcode);
    w.set_format(image.format as u8);
    w.set_size(image.size as u8);
    w.set_width_minus_one(image.width.saturating_sub(1));
    w.set_addr(image.addr);
    w.0
}

fn load_word(opcode: u8, area: &LoadArea) -> u64 {
    let mut w = LoadWord(0);
    w.set_opcode(opcode);
    w.set_sl(area.sl);
    w.set_tl(area.tl);
    w.set_tile(area.tile);
    w.set_sh(area.sh);
    w.set_th(area.th);
    w.0
}

fn decode_image(w: u64) -> Result<ImageDesc, RdpError> {
    let w = ImageWord(w);
    Ok(ImageDesc {
        format: TexelFormat::from_bits(w.format())?,
        size: PixelSize::from_bits(w.size()),
        width: w.width_minus_one() + 1,
        addr: w.addr(),
    })
}

fn decode_load(w: u64) -> LoadArea {
    let w = LoadWord(w);
    LoadArea { tile: w.tile(), sl: w.sl(), tl: w.tl(), sh: w.sh(), th: w.th() }
}

impl Command {
    pub fn encode(&self) -> Encoded {
        match self {
            Command::SyncPipe => Encoded::one(opcode_word(op::SYNC_PIPE).0),
            Command::SyncTile => Encoded::one(opcode_word(op::SYNC_TILE).0),
            Command::SyncLoad => Encoded::one(opcode_word(op::SYNC_LOAD).0),
            Command::SyncFull => Encoded::one(opcode_word(op::SYNC_FULL).0),
            Command::SetOtherModes(modes) => {
                Encoded::one(opcode_word(op::SET_OTHER_MODES).0 | (modes.bits() & OTHER_MODES_MASK))
            }
            Command::SetScissor(sc) => {
                let mut w = ScissorWord(0);
                w.set_opcode(op::SET_SCISSOR);
                w.set_xh(sc.xh);
                w.set_yh(sc.yh);
                w.set_xl(sc.xl);
                w.set_yl(sc.yl);
                Encoded::one(w.0)
            }
            Command::SetColorImage(image) => Encoded::one(image_word(op::SET_COLOR_IMAGE, image)),
            Command::SetTextureImage(image) => Encoded::one(image_word(op::SET_TEXTURE_IMAGE, image)),
            Command::SetTile(tile) => {
                let mut w = TileWord(0);
                w.set_opcode(op::SET_TILE);
                w.set_format(tile.format as u8);
                w.set_size(tile.size as u8);
                w.set_line(tile.line);
                w.set_tmem(tile.tmem);
                w.set_tile(tile.tile);
                w.set_palette(tile.palette);
                Encoded::one(w.0)
            }
            Command::LoadTile(area) => Encoded::one(load_word(op::LOAD_TILE, area)),
            Command::LoadTlut(area) => Encoded::one(load_word(op::LOAD_TLUT, area)),
            Command::TextureRectangle(rect) => {
                let mut hi = RectWord(0);
                hi.set_opcode(op::TEXTURE_RECTANGLE);
                hi.set_xl(rect.xl);
                hi.set_yl(rect.yl);
                hi.set_tile(rect.tile);
                hi.set_xh(rect.xh);
                hi.set_yh(rect.yh);

                let mut lo = TexCoordWord(0);
                lo.set_s(rect.s as u16);
                lo.set_t(rect.t as u16);
                lo.set_dsdx(rect.dsdx as u16);
                lo.set_dtdy(rect.dtdy as u16);

                Encoded { words: [hi.0, lo.0], len: 2 }
            }
        }
    }

    /// Decodes the command at the head of `words`, returning it with the
    /// number of words it occupied.
    pub fn decode(words: &[u64]) -> Result<(Command, usize), RdpError> {
        let Some(&w) = words.first() else {
            return Err(RdpError::Truncated { opcode: 0 })
        };

        let opcode = CommandWord(w).opcode();
        let cmd = match opcode {
            op::SYNC_PIPE => Command::SyncPipe,
            op::SYNC_TILE => Command::SyncTile,
            op::SYNC_LOAD => Command::SyncLoad,
            op::SYNC_FULL => Command::SyncFull,
            op::SET_OTHER_MODES => Command::SetOtherModes(OtherModes::from_bits_retain(w & OTHER_MODES_MASK)),
            op::SET_SCISSOR => {
                let w = ScissorWord(w);
                Command::SetScissor(Scissor { xh: w.xh(), yh: w.yh(), xl: w.xl(), yl: w.yl() })
            }
            op::SET_COLOR_IMAGE => Command::SetColorImage(decode_image(w)?),
            op::SET_TEXTURE_IMAGE => Command::SetTextureImage(decode_image(w)?),
            op::SET_TILE => {
                let w = TileWord(w);
                Command::SetTile(TileDesc {
                    format: TexelFormat::from_bits(w.format())?,
                    size: PixelSize::from_bits(w.size()),
                    line: w.line(),
                    tmem: w.tmem(),
                    tile: w.tile(),
                    palette: w.palette(),
                })
            }
            op::LOAD_TILE => Command::LoadTile(decode_load(w)),
            op::LOAD_TLUT => Command::LoadTlut(decode_load(w)),
            op::TEXTURE_RECTANGLE => {
                let Some(&w1) = words.get(1) else {
                    return Err(RdpError::Truncated { opcode })
                };
                let hi = RectWord(w);
                let lo = TexCoordWord(w1);
                let rect = TexRect {
                    tile: hi.tile(),
                    xh: hi.xh(),
                    yh: hi.yh(),
                    xl: hi.xl(),
                    yl: hi.yl(),
                    s: lo.s() as i16,
                    t: lo.t() as i16,
                    dsdx: lo.dsdx() as i16,
                    dtdy: lo.dtdy() as i16,
                };
                return Ok((Command::TextureRectangle(rect), 2))
            }
            _ => return Err(RdpError::UnknownOpcode(opcode)),
        };

        Ok((cmd, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_rectangle_layout() {
        let rect = TexRect { tile: 1, xh: 0, yh: 4, xl: 1276, yl: 8, s: 0, t: -32, dsdx: 4096, dtdy: 1024 };
        let enc = Command::TextureRectangle(rect).encode();
        assert_eq!(enc.len(), 2);
        assert_eq!(enc[0] >> 56, 0x24);
        assert_eq!((enc[0] >> 44) & 0xFFF, 1276);
        assert_eq!((enc[0] >> 24) & 0x7, 1);
        assert_eq!(enc[1] & 0xFFFF, 1024);
        assert_eq!((enc[1] >> 32) & 0xFFFF, 0xFFE0);

        let (decoded, used) = Command::decode(&enc).unwrap();
        assert_eq!(used, 2);
        assert_eq!(decoded, Command::TextureRectangle(rect));
    }

    #[test]
    fn tile_and_image_fields() {
        let tile = TileDesc { format: TexelFormat::ColorIndex, size: PixelSize::Bits8, line: 40, tmem: 0, tile: 1, palette: 1 };
        let enc = Command::SetTile(tile).encode();
        assert_eq!(enc[0] >> 56, 0x35);
        assert_eq!((enc[0] >> 53) & 0x7, 2);
        assert_eq!((enc[0] >> 41) & 0x1FF, 40);
        assert_eq!((enc[0] >> 20) & 0xF, 1);
        assert_eq!(Command::decode(&enc).unwrap().0, Command::SetTile(tile));

        let image = ImageDesc { format: TexelFormat::Rgba, size: PixelSize::Bits16, width: 320, addr: 0x10_0000 };
        let enc = Command::SetColorImage(image).encode();
        assert_eq!((enc[0] >> 32) & 0x3FF, 319);
        assert_eq!(enc[0] & 0x3FF_FFFF, 0x10_0000);
        assert_eq!(Command::decode(&enc).unwrap().0, Command::SetColorImage(image));
    }

    #[test]
    fn other_modes_cycle_type() {
        let modes = OtherModes::CYCLE_COPY | OtherModes::ENABLE_TLUT;
        assert_eq!(modes.cycle_type(), CycleType::Copy);
        assert_eq!(OtherModes::ENABLE_TLUT.cycle_type(), CycleType::OneCycle);
        assert_eq!(OtherModes::CYCLE_FILL.cycle_type(), CycleType::Fill);

        let enc = Command::SetOtherModes(modes).encode();
        assert_eq!(enc[0] >> 56, 0x2F);
        assert_eq!(Command::decode(&enc).unwrap().0, Command::SetOtherModes(modes));
    }

    #[test]
    fn decode_errors() {
        assert_eq!(Command::decode(&[0x01 << 56]), Err(RdpError::UnknownOpcode(0x01)));
        let enc = Command::TextureRectangle(TexRect { tile: 0, xh: 0, yh: 0, xl: 4, yl: 4, s: 0, t: 0, dsdx: 1024, dtdy: 1024 }).encode();
        assert_eq!(Command::decode(&enc[..1]), Err(RdpError::Truncated { opcode: 0x24 }));

        let mut bad = TileWord(0);
        bad.set_opcode(op::SET_TILE);
        bad.set_format(7);
        assert_eq!(Command::decode(&[bad.0]), Err(RdpError::Unsupported("texel format")));
    }
}
