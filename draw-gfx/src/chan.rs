// draw-gfx/src/chan.rs

//! Plan 9 channel descriptors.
//!
//! A descriptor packs up to four channels into a 32-bit tag, most
//! significant channel first, one byte per channel: `type << 4 | nbits`.
//! Channel types are red 0, green 1, blue 2, grey 3, alpha 4, colour-map
//! 5 and ignore 6. The textual form concatenates a type letter and a bit
//! count per channel (`x8r8g8b8`, `k8`, ...); it appears in ctl records.

use log::warn;

// Channel type nibbles, as packed into descriptor bytes.
const TYPE_RED: u32 = 0;
const TYPE_GREEN: u32 = 1;
const TYPE_BLUE: u32 = 2;
const TYPE_GREY: u32 = 3;
const TYPE_ALPHA: u32 = 4;
const TYPE_MAP: u32 = 5;
const TYPE_IGNORE: u32 = 6;

const fn ch(ty: u32, nbits: u32) -> u32 {
    (ty << 4) | nbits
}

const fn chan1(a: u32) -> u32 {
    a
}

const fn chan3(a: u32, b: u32, c: u32) -> u32 {
    (a << 16) | (b << 8) | c
}

const fn chan4(a: u32, b: u32, c: u32, d: u32) -> u32 {
    (a << 24) | (b << 16) | (c << 8) | d
}

/// A pixel format from the descriptor set the compositor understands.
///
/// Tags not in this set fall back to `Xrgb32` semantics; the wire decoder
/// logs the unknown tag and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Grey1,
    Grey2,
    Grey4,
    Grey8,
    Cmap8,
    Rgb15,
    Rgb16,
    Rgb24,
    Bgr24,
    Rgba32,
    Argb32,
    Xrgb32,
    Abgr32,
    Xbgr32,
}

impl Channel {
    pub const ALL: [Channel; 14] = [
        Channel::Grey1,
        Channel::Grey2,
        Channel::Grey4,
        Channel::Grey8,
        Channel::Cmap8,
        Channel::Rgb15,
        Channel::Rgb16,
        Channel::Rgb24,
        Channel::Bgr24,
        Channel::Rgba32,
        Channel::Argb32,
        Channel::Xrgb32,
        Channel::Abgr32,
        Channel::Xbgr32,
    ];

    /// The packed 32-bit descriptor tag for this format.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Channel::Grey1 => chan1(ch(TYPE_GREY, 1)),
            Channel::Grey2 => chan1(ch(TYPE_GREY, 2)),
            Channel::Grey4 => chan1(ch(TYPE_GREY, 4)),
            Channel::Grey8 => chan1(ch(TYPE_GREY, 8)),
            Channel::Cmap8 => chan1(ch(TYPE_MAP, 8)),
            Channel::Rgb15 => chan4(
                ch(TYPE_IGNORE, 1),
                ch(TYPE_RED, 5),
                ch(TYPE_GREEN, 5),
                ch(TYPE_BLUE, 5),
            ),
            Channel::Rgb16 => chan3(ch(TYPE_RED, 5), ch(TYPE_GREEN, 6), ch(TYPE_BLUE, 5)),
            Channel::Rgb24 => chan3(ch(TYPE_RED, 8), ch(TYPE_GREEN, 8), ch(TYPE_BLUE, 8)),
            Channel::Bgr24 => chan3(ch(TYPE_BLUE, 8), ch(TYPE_GREEN, 8), ch(TYPE_RED, 8)),
            Channel::Rgba32 => chan4(
                ch(TYPE_RED, 8),
                ch(TYPE_GREEN, 8),
                ch(TYPE_BLUE, 8),
                ch(TYPE_ALPHA, 8),
            ),
            Channel::Argb32 => chan4(
                ch(TYPE_ALPHA, 8),
                ch(TYPE_RED, 8),
                ch(TYPE_GREEN, 8),
                ch(TYPE_BLUE, 8),
            ),
            Channel::Xrgb32 => chan4(
                ch(TYPE_IGNORE, 8),
                ch(TYPE_RED, 8),
                ch(TYPE_GREEN, 8),
                ch(TYPE_BLUE, 8),
            ),
            Channel::Abgr32 => chan4(
                ch(TYPE_ALPHA, 8),
                ch(TYPE_BLUE, 8),
                ch(TYPE_GREEN, 8),
                ch(TYPE_RED, 8),
            ),
            Channel::Xbgr32 => chan4(
                ch(TYPE_IGNORE, 8),
                ch(TYPE_BLUE, 8),
                ch(TYPE_GREEN, 8),
                ch(TYPE_RED, 8),
            ),
        }
    }

    /// Bits per pixel.
    #[must_use]
    pub const fn depth(self) -> u32 {
        match self {
            Channel::Grey1 => 1,
            Channel::Grey2 => 2,
            Channel::Grey4 => 4,
            Channel::Grey8 | Channel::Cmap8 => 8,
            Channel::Rgb15 | Channel::Rgb16 => 16,
            Channel::Rgb24 | Channel::Bgr24 => 24,
            Channel::Rgba32
            | Channel::Argb32
            | Channel::Xrgb32
            | Channel::Abgr32
            | Channel::Xbgr32 => 32,
        }
    }

    /// True when the format carries an alpha channel. Masks in formats
    /// without alpha contribute coverage through their grey/red value
    /// instead.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Channel::Rgba32 | Channel::Argb32 | Channel::Abgr32
        )
    }

    /// The ctl-record token for this format.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Channel::Grey1 => "k1",
            Channel::Grey2 => "k2",
            Channel::Grey4 => "k4",
            Channel::Grey8 => "k8",
            Channel::Cmap8 => "m8",
            Channel::Rgb15 => "x1r5g5b5",
            Channel::Rgb16 => "r5g6b5",
            Channel::Rgb24 => "r8g8b8",
            Channel::Bgr24 => "b8g8r8",
            Channel::Rgba32 => "r8g8b8a8",
            Channel::Argb32 => "a8r8g8b8",
            Channel::Xrgb32 => "x8r8g8b8",
            Channel::Abgr32 => "a8b8g8r8",
            Channel::Xbgr32 => "x8b8g8r8",
        }
    }

    /// Decodes a wire tag. Unknown tags become `Xrgb32`.
    #[must_use]
    pub fn from_tag(tag: u32) -> Channel {
        for c in Channel::ALL {
            if c.tag() == tag {
                return c;
            }
        }
        warn!("unknown channel descriptor {tag:#010x}, treating as x8r8g8b8");
        Channel::Xrgb32
    }

    /// Parses a ctl-style token (`"x8r8g8b8"`, `"k8"`, ...).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.token() == token)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
