// core-draw/src/wire/opcodes.rs

//! Command opcode bytes.
//!
//! Each command is a single ASCII byte followed by a fixed or
//! self-delimiting parameter layout; there is no length framing between
//! commands.

/// `b` - allocate an image.
pub const ALLOC_IMAGE: u8 = 0x62;
/// `A` - allocate a screen.
pub const ALLOC_SCREEN: u8 = 0x41;
/// `F` - free a screen.
pub const FREE_SCREEN: u8 = 0x46;
/// `f` - free an image.
pub const FREE_IMAGE: u8 = 0x66;
/// `d` - blit with optional mask.
pub const DRAW: u8 = 0x64;
/// `L` - stroke a line.
pub const LINE: u8 = 0x4C;
/// `e` - ellipse outline.
pub const ELLIPSE: u8 = 0x65;
/// `E` - filled ellipse.
pub const FILL_ELLIPSE: u8 = 0x45;
/// `a` - arc.
pub const ARC: u8 = 0x61;
/// `p` - polygon outline.
pub const POLY: u8 = 0x70;
/// `P` - filled polygon.
pub const FILL_POLY: u8 = 0x50;
/// `s` - draw a string from cached glyphs. Responds with the end pen.
pub const STRING: u8 = 0x73;
/// `x` - string over a background fill. Responds with the end pen.
pub const STRING_BG: u8 = 0x78;
/// `y` - load pixels. Responds with the byte count consumed.
pub const LOAD: u8 = 0x79;
/// `Y` - load run-length-compressed pixels. Responds with the count.
pub const LOAD_COMPRESSED: u8 = 0x59;
/// `r` - unload pixels. Responds with the packed rows.
pub const UNLOAD: u8 = 0x72;
/// `o` - set image origin.
pub const ORIGIN: u8 = 0x6F;
/// `c` - set clip rectangle and replication.
pub const SET_CLIP: u8 = 0x63;
/// `O` - set the compositing operator for the next drawing command.
pub const SET_OP: u8 = 0x4F;
/// `t` - move windows toward the top. Advisory.
pub const TOP: u8 = 0x74;
/// `B` - move windows toward the bottom. Advisory.
pub const BOTTOM: u8 = 0x42;
/// `N` - register or drop a global name for an image.
pub const NAME_GLOBAL: u8 = 0x4E;
/// `n` - bind a local id to a named image.
pub const NAME_LOCAL: u8 = 0x6E;
/// `i` - initialise a font's glyph table.
pub const INIT_FONT: u8 = 0x69;
/// `l` - load one glyph into a font.
pub const LOAD_CHAR: u8 = 0x6C;
/// `I` - report the display identity. Responds with id, channel,
/// label and the display rectangle.
pub const INIT: u8 = 0x49;
/// `v` - flush the accumulated refresh rectangle.
pub const FLUSH: u8 = 0x76;
