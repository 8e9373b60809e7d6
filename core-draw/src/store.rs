// core-draw/src/store.rs

//! The retained image and screen tables.
//!
//! The store owns every surface. Commands refer to images by signed
//! 32-bit id; id 0 is the visible display, created at construction and
//! never destroyed. Screens group images for the client's benefit; the
//! compositor tracks them and their advisory stacking order but imposes
//! no layering of its own.

use crate::config::Config;
use crate::error::{DrawError, Result};
use draw_gfx::pixel;
use draw_gfx::{Channel, Point, Rect, Surface};
use log::{debug, trace, warn};
use std::collections::HashMap;

/// The reserved id of the visible display image.
pub const DISPLAY_ID: i32 = 0;

/// Refuse surfaces above this many bytes rather than letting a hostile
/// rectangle exhaust memory.
const MAX_SURFACE_BYTES: u64 = 1 << 28;

/// Refresh method requested at allocation. Only `None` changes
/// behaviour; the rest are recorded for protocol completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMethod {
    Backup,
    None,
    Message,
    Other(u8),
}

impl RefreshMethod {
    #[must_use]
    pub fn from_byte(b: u8) -> RefreshMethod {
        match b {
            0 => RefreshMethod::Backup,
            1 => RefreshMethod::None,
            2 => RefreshMethod::Message,
            other => RefreshMethod::Other(other),
        }
    }
}

/// One image: geometry, clip, format and the backing pixels.
#[derive(Debug, Clone)]
pub struct Image {
    pub id: i32,
    pub r: Rect,
    pub clipr: Rect,
    pub repl: bool,
    pub chan: Channel,
    pub screen_id: i32,
    pub refresh: RefreshMethod,
    pub surface: Surface,
}

impl Image {
    /// The destination pixels a drawing command may touch: clip within
    /// extent.
    #[inline]
    #[must_use]
    pub fn draw_bounds(&self) -> Rect {
        self.clipr.intersect(&self.r)
    }

    /// Translates a global point into surface-local coordinates.
    #[inline]
    #[must_use]
    pub fn to_local(&self, p: Point) -> Point {
        p - self.r.min
    }
}

/// A screen record. Layering metadata is advisory.
#[derive(Debug, Clone)]
pub struct ScreenEntry {
    pub id: i32,
    pub image_id: i32,
    pub fill_id: i32,
    pub public: bool,
}

/// Owner of all images, screens, names and the display surface.
#[derive(Debug)]
pub struct ImageStore {
    images: HashMap<i32, Image>,
    screens: HashMap<i32, ScreenEntry>,
    /// Advisory stacking order of screen ids, bottom first.
    zorder: Vec<i32>,
    /// Global names registered with `N`.
    names: HashMap<String, i32>,
    /// Ids bound by `n` to another image (usually the display).
    aliases: HashMap<i32, i32>,
}

impl ImageStore {
    /// Builds the store with the display image in place.
    pub fn new(config: &Config) -> Result<Self> {
        let mut store = ImageStore {
            images: HashMap::new(),
            screens: HashMap::new(),
            zorder: Vec::new(),
            names: HashMap::new(),
            aliases: HashMap::new(),
        };
        let r = Rect::with_extent(config.width as i32, config.height as i32);
        if r.is_empty() {
            return Err(DrawError::DisplayInvariant(format!(
                "display extent {}x{} is not positive",
                config.width, config.height
            )));
        }
        store.images.insert(
            DISPLAY_ID,
            Image {
                id: DISPLAY_ID,
                r,
                clipr: r,
                repl: false,
                chan: Channel::Xrgb32,
                screen_id: 0,
                refresh: RefreshMethod::None,
                surface: Surface::new(config.width, config.height),
            },
        );
        Ok(store)
    }

    /// Follows a name-bound alias to the image that actually backs an
    /// id. Plain ids resolve to themselves.
    #[must_use]
    pub fn resolve(&self, id: i32) -> i32 {
        if self.images.contains_key(&id) {
            return id;
        }
        match self.aliases.get(&id) {
            Some(&target) => target,
            None => id,
        }
    }

    pub fn lookup(&self, id: i32) -> Result<&Image> {
        let rid = self.resolve(id);
        self.images.get(&rid).ok_or(DrawError::UnknownImage(id))
    }

    pub fn lookup_mut(&mut self, id: i32) -> Result<&mut Image> {
        let rid = self.resolve(id);
        self.images.get_mut(&rid).ok_or(DrawError::UnknownImage(id))
    }

    /// True when drawing to `id` lands on the display surface.
    #[must_use]
    pub fn targets_display(&self, id: i32) -> bool {
        self.resolve(id) == DISPLAY_ID
    }

    /// Creates (or replaces) image `id`. The new surface is filled with
    /// `color`, quantised through the image's own channel format first
    /// so that an unload reads back what the format can hold.
    #[allow(clippy::too_many_arguments)]
    pub fn alloc(
        &mut self,
        id: i32,
        screen_id: i32,
        refresh: u8,
        chan: Channel,
        repl: bool,
        r: Rect,
        clipr: Rect,
        color: u32,
    ) -> Result<()> {
        if self.resolve(id) == DISPLAY_ID {
            return Err(DrawError::DisplayInvariant(format!(
                "cannot allocate over the display (id {id})"
            )));
        }
        if r.max.x < r.min.x || r.max.y < r.min.y {
            return Err(DrawError::AllocationFailure(format!(
                "inverted rectangle {r:?}"
            )));
        }
        let (w, h) = (r.width() as u64, r.height() as u64);
        if w * h * 4 > MAX_SURFACE_BYTES {
            return Err(DrawError::AllocationFailure(format!(
                "surface {w}x{h} exceeds the allocation cap"
            )));
        }

        let refresh = RefreshMethod::from_byte(refresh);
        if refresh != RefreshMethod::None {
            debug!("image {id}: refresh method {refresh:?} recorded, not acted on");
        }

        let mut surface = Surface::new(w as u32, h as u32);
        let fill = quantise_color(chan, pixel::decode_color(color));
        surface.fill_rect(surface.bounds(), fill, draw_gfx::DrawOp::S);

        let clipr = clipr.intersect(&r);
        trace!("alloc image {id}: chan {chan}, r {r:?}, clipr {clipr:?}, repl {repl}");
        self.aliases.remove(&id);
        self.images.insert(
            id,
            Image {
                id,
                r,
                clipr,
                repl,
                chan,
                screen_id,
                refresh,
                surface,
            },
        );
        Ok(())
    }

    /// Destroys image `id`. The display is immune; name bindings to the
    /// freed id are dropped with it.
    pub fn free(&mut self, id: i32) -> Result<()> {
        if id == DISPLAY_ID {
            trace!("free of display id ignored");
            return Ok(());
        }
        if self.aliases.remove(&id).is_some() {
            return Ok(());
        }
        if self.images.remove(&id).is_none() {
            return Err(DrawError::UnknownImage(id));
        }
        self.names.retain(|_, v| *v != id);
        Ok(())
    }

    /// Updates clip and replication together.
    pub fn set_clip(&mut self, id: i32, repl: bool, clipr: Rect) -> Result<()> {
        let image = self.lookup_mut(id)?;
        image.repl = repl;
        image.clipr = clipr.intersect(&image.r);
        Ok(())
    }

    /// Grows or shrinks the display to `(w, h)` with origin (0, 0),
    /// preserving the overlapping pixels.
    pub fn resize_display(&mut self, w: u32, h: u32) -> Result<Rect> {
        if w == 0 || h == 0 {
            return Err(DrawError::DisplayInvariant(format!(
                "cannot resize display to {w}x{h}"
            )));
        }
        let display = self
            .images
            .get_mut(&DISPLAY_ID)
            .ok_or(DrawError::UnknownImage(DISPLAY_ID))?;
        display.surface = display.surface.resized(w, h);
        display.r = Rect::with_extent(w as i32, h as i32);
        display.clipr = display.r;
        debug!("display resized to {w}x{h}");
        Ok(display.r)
    }

    pub fn alloc_screen(&mut self, id: i32, image_id: i32, fill_id: i32, public: bool) -> Result<()> {
        self.lookup(image_id)?;
        self.lookup(fill_id)?;
        self.screens.insert(
            id,
            ScreenEntry {
                id,
                image_id,
                fill_id,
                public,
            },
        );
        if !self.zorder.contains(&id) {
            self.zorder.push(id);
        }
        Ok(())
    }

    pub fn free_screen(&mut self, id: i32) {
        if self.screens.remove(&id).is_none() {
            warn!("free of unknown screen {id} ignored");
        }
        self.zorder.retain(|&s| s != id);
    }

    #[must_use]
    pub fn screen(&self, id: i32) -> Option<&ScreenEntry> {
        self.screens.get(&id)
    }

    /// Advisory restack: move the given images' screens toward the top
    /// (`top = true`) or bottom of the order.
    pub fn restack(&mut self, ids: &[i32], top: bool) {
        for &id in ids {
            self.zorder.retain(|&s| s != id);
            if top {
                self.zorder.push(id);
            } else {
                self.zorder.insert(0, id);
            }
        }
        trace!("advisory z-order now {:?}", self.zorder);
    }

    /// Registers (`register = true`) or drops a global name for `id`.
    pub fn set_name(&mut self, id: i32, name: &str, register: bool) -> Result<()> {
        if register {
            self.lookup(id)?;
            self.names.insert(name.to_string(), self.resolve(id));
        } else {
            self.names.retain(|n, v| !(n.as_str() == name && *v == id));
        }
        Ok(())
    }

    /// Binds a fresh id to a named image. An unknown name materialises
    /// the id as an alias of the display.
    pub fn bind_name(&mut self, id: i32, name: &str) {
        let target = match self.names.get(name) {
            Some(&t) => t,
            None => {
                debug!("name {name:?} unknown, binding id {id} to the display");
                DISPLAY_ID
            }
        };
        self.images.remove(&id);
        self.aliases.insert(id, target);
    }
}

/// Runs a colour through a channel format's pack/unpack cycle, so a
/// GREY8 image filled with red holds the grey that red becomes.
fn quantise_color(chan: Channel, rgba: [u8; 4]) -> [u8; 4] {
    let mut wire = [0u8; 4];
    let mut out = [0u8; 4];
    let n = pixel::bytes_per_row(chan, 1);
    if pixel::pack_row(chan, &rgba, &mut wire[..n]).is_err()
        || pixel::unpack_row(chan, &wire[..n], &mut out).is_err()
    {
        return rgba;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn store() -> ImageStore {
        ImageStore::new(&Config {
            width: 8,
            height: 8,
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn display_exists_at_startup() {
        let s = store();
        let d = s.lookup(DISPLAY_ID).unwrap();
        assert_eq!(d.r, Rect::new(0, 0, 8, 8));
        assert_eq!(d.chan, Channel::Xrgb32);
    }

    #[test]
    fn alloc_fills_with_the_quantised_color() {
        let mut s = store();
        s.alloc(
            1,
            0,
            1,
            Channel::Xrgb32,
            false,
            Rect::new(0, 0, 2, 2),
            Rect::new(0, 0, 2, 2),
            0xFFFF0000,
        )
        .unwrap();
        let img = s.lookup(1).unwrap();
        assert_eq!(img.surface.get(0, 0), [0xFF, 0, 0, 0xFF]);
    }

    #[test]
    fn alloc_clamps_clip_into_extent() {
        let mut s = store();
        s.alloc(
            2,
            0,
            1,
            Channel::Grey8,
            false,
            Rect::new(2, 2, 6, 6),
            Rect::new(0, 0, 100, 100),
            0,
        )
        .unwrap();
        let img = s.lookup(2).unwrap();
        assert!(img.r.contains_rect(&img.clipr));
        assert_eq!(img.clipr, Rect::new(2, 2, 6, 6));
    }

    #[test]
    fn alloc_over_display_is_refused() {
        let mut s = store();
        let err = s
            .alloc(
                DISPLAY_ID,
                0,
                1,
                Channel::Xrgb32,
                false,
                Rect::new(0, 0, 1, 1),
                Rect::new(0, 0, 1, 1),
                0,
            )
            .unwrap_err();
        assert!(matches!(err, DrawError::DisplayInvariant(_)));
    }

    #[test]
    fn free_display_is_a_noop_and_unknown_free_errors() {
        let mut s = store();
        s.free(DISPLAY_ID).unwrap();
        assert!(s.lookup(DISPLAY_ID).is_ok());
        assert_eq!(s.free(42), Err(DrawError::UnknownImage(42)));
    }

    #[test]
    fn resize_display_preserves_origin_and_rejects_zero() {
        let mut s = store();
        let r = s.resize_display(16, 4).unwrap();
        assert_eq!(r, Rect::new(0, 0, 16, 4));
        let d = s.lookup(DISPLAY_ID).unwrap();
        assert_eq!(d.clipr, r);
        assert!(matches!(
            s.resize_display(0, 4),
            Err(DrawError::DisplayInvariant(_))
        ));
    }

    #[test]
    fn binding_an_unknown_name_aliases_the_display() {
        let mut s = store();
        s.bind_name(7, "noborder");
        assert!(s.targets_display(7));
        let img = s.lookup(7).unwrap();
        assert_eq!(img.id, DISPLAY_ID);
    }

    #[test]
    fn registered_names_bind_to_their_image() {
        let mut s = store();
        s.alloc(
            3,
            0,
            1,
            Channel::Grey8,
            false,
            Rect::new(0, 0, 1, 1),
            Rect::new(0, 0, 1, 1),
            0,
        )
        .unwrap();
        s.set_name(3, "pattern", true).unwrap();
        s.bind_name(9, "pattern");
        assert_eq!(s.resolve(9), 3);
        assert!(!s.targets_display(9));
    }

    #[test]
    fn screens_require_live_images() {
        let mut s = store();
        assert!(s.alloc_screen(1, 99, 0, false).is_err());
        s.alloc(
            4,
            0,
            1,
            Channel::Xrgb32,
            false,
            Rect::new(0, 0, 1, 1),
            Rect::new(0, 0, 1, 1),
            0,
        )
        .unwrap();
        s.alloc_screen(1, 4, DISPLAY_ID, true).unwrap();
        assert!(s.screen(1).is_some());
        s.free_screen(1);
        assert!(s.screen(1).is_none());
    }
}
