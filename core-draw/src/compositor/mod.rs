// core-draw/src/compositor/mod.rs

//! The command executor.
//!
//! `Compositor::process` consumes one whole command buffer: it reads an
//! opcode byte, dispatches, appends any response bytes and loops until
//! the buffer is exhausted. A truncated command, unknown opcode or
//! missing id aborts the buffer; everything already executed keeps its
//! effect and the refresh accumulator survives for the next flush.
//!
//! The only cross-command state is the image/font tables, the sticky
//! compositing operator (reset to `SoverD` by every drawing command)
//! and the refresh accumulator.

use crate::config::{Config, LABEL_LEN};
use crate::error::{DrawError, Result};
use crate::font::{FontStore, HeadlessTextDriver, TextDriver};
use crate::store::{ImageStore, DISPLAY_ID};
use crate::wire::{ctl, opcodes, WireReader, WireWriter};
use draw_gfx::{pixel, rle, Channel, DrawOp, Point, Rect, Surface};
use log::{debug, trace, warn};
use std::collections::VecDeque;

mod ops;
mod text;


/// A snapshot of a source or mask image taken before the destination is
/// borrowed mutably. Cloning the surface keeps aliased blits (source ==
/// destination) well-defined.
pub(super) struct SrcView {
    pub surface: Surface,
    pub r: Rect,
    pub repl: bool,
    pub has_alpha: bool,
}

/// The draw-device executor.
pub struct Compositor {
    pub(super) store: ImageStore,
    pub(super) fonts: FontStore,
    pub(super) current_op: DrawOp,
    /// Merged bounding box of display mutations since the last flush.
    pub(super) refresh: Rect,
    /// Flushed refresh rectangles awaiting the host.
    pending: VecDeque<Rect>,
    pub(super) driver: Box<dyn TextDriver>,
    config: Config,
}

impl Compositor {
    /// Builds a compositor with the headless fallback text driver.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_driver(config, Box::new(HeadlessTextDriver))
    }

    /// Builds a compositor around a host-supplied text driver.
    pub fn with_driver(config: Config, driver: Box<dyn TextDriver>) -> Result<Self> {
        Ok(Compositor {
            store: ImageStore::new(&config)?,
            fonts: FontStore::new(),
            current_op: DrawOp::SoverD,
            refresh: Rect::ZERO,
            pending: VecDeque::new(),
            driver,
            config,
        })
    }

    /// Executes one command buffer, returning its response bytes.
    pub fn process(&mut self, buf: &[u8]) -> Result<Vec<u8>> {
        let mut reader = WireReader::new(buf);
        let mut response = WireWriter::new();
        while !reader.is_empty() {
            let opcode = reader.byte()?;
            trace!("dispatch {:?} ({opcode:#04x})", opcode as char);
            match opcode {
                opcodes::ALLOC_IMAGE => self.cmd_alloc(&mut reader)?,
                opcodes::ALLOC_SCREEN => self.cmd_alloc_screen(&mut reader)?,
                opcodes::FREE_SCREEN => {
                    let id = reader.long()?;
                    self.store.free_screen(id);
                }
                opcodes::FREE_IMAGE => self.cmd_free_image(&mut reader)?,
                opcodes::DRAW => self.cmd_draw(&mut reader)?,
                opcodes::LINE => self.cmd_line(&mut reader)?,
                opcodes::ELLIPSE => self.cmd_ellipse(&mut reader, false)?,
                opcodes::FILL_ELLIPSE => self.cmd_ellipse(&mut reader, true)?,
                opcodes::ARC => self.cmd_arc(&mut reader)?,
                opcodes::POLY => self.cmd_poly(&mut reader)?,
                opcodes::FILL_POLY => self.cmd_fill_poly(&mut reader)?,
                opcodes::STRING => self.cmd_string(&mut reader, false, &mut response)?,
                opcodes::STRING_BG => self.cmd_string(&mut reader, true, &mut response)?,
                opcodes::LOAD => self.cmd_load(&mut reader, false, &mut response)?,
                opcodes::LOAD_COMPRESSED => self.cmd_load(&mut reader, true, &mut response)?,
                opcodes::UNLOAD => self.cmd_unload(&mut reader, &mut response)?,
                opcodes::ORIGIN => self.cmd_origin(&mut reader)?,
                opcodes::SET_CLIP => self.cmd_set_clip(&mut reader)?,
                opcodes::SET_OP => {
                    self.current_op = DrawOp::from_byte(reader.byte()?);
                }
                opcodes::TOP => self.cmd_restack(&mut reader, true)?,
                opcodes::BOTTOM => self.cmd_restack(&mut reader, false)?,
                opcodes::NAME_GLOBAL => self.cmd_name_global(&mut reader)?,
                opcodes::NAME_LOCAL => self.cmd_name_local(&mut reader)?,
                opcodes::INIT_FONT => self.cmd_init_font(&mut reader)?,
                opcodes::LOAD_CHAR => self.cmd_load_char(&mut reader)?,
                opcodes::INIT => self.cmd_init(&mut response)?,
                opcodes::FLUSH => self.flush(),
                other => {
                    return Err(DrawError::MalformedStream(format!(
                        "unknown opcode {other:#04x}"
                    )));
                }
            }
        }
        Ok(response.into_inner())
    }

    // --- Host-facing surface ------------------------------------------------

    /// The visible display pixels, for presentation by the host. Must
    /// not be read while a buffer is mid-`process`.
    pub fn display_surface(&self) -> Result<&Surface> {
        Ok(&self.store.lookup(DISPLAY_ID)?.surface)
    }

    /// Next flushed refresh rectangle, if any.
    pub fn poll_refresh(&mut self) -> Option<Rect> {
        self.pending.pop_front()
    }

    /// Resizes the display; the whole new extent becomes dirty.
    pub fn resize_display(&mut self, w: u32, h: u32) -> Result<()> {
        let r = self.store.resize_display(w, h)?;
        self.refresh = self.refresh.union(&r);
        Ok(())
    }

    /// The ctl record for one image.
    pub fn ctl_record(&self, client_id: i32, image_id: i32) -> Result<Vec<u8>> {
        let img = self.store.lookup(image_id)?;
        Ok(ctl::ctl_record(
            client_id, image_id, img.chan, img.repl, img.r, img.clipr,
        ))
    }

    /// Encoded form of a refresh rectangle, for the host's wire.
    #[must_use]
    pub fn encode_refresh(r: Rect) -> [u8; ctl::REFRESH_RECORD_LEN] {
        ctl::refresh_record(r)
    }

    // --- Shared helpers -----------------------------------------------------

    /// Takes the sticky operator; drawing commands consume it.
    pub(super) fn take_op(&mut self) -> DrawOp {
        std::mem::replace(&mut self.current_op, DrawOp::SoverD)
    }

    /// Records a display mutation for the next flush.
    pub(super) fn add_refresh(&mut self, dst_id: i32, r: Rect) {
        if r.is_empty() || !self.store.targets_display(dst_id) {
            return;
        }
        let display_r = match self.store.lookup(DISPLAY_ID) {
            Ok(d) => d.r,
            Err(_) => return,
        };
        self.refresh = self.refresh.union(&r.intersect(&display_r));
    }

    /// Clones an image's pixels and sampling metadata for use as a
    /// source or mask.
    pub(super) fn snapshot(&self, id: i32) -> Result<SrcView> {
        let img = self.store.lookup(id)?;
        Ok(SrcView {
            surface: img.surface.clone(),
            r: img.r,
            repl: img.repl,
            has_alpha: img.chan.has_alpha(),
        })
    }

    /// The flat colour of a source image at a global point.
    pub(super) fn sample_color(&self, id: i32, p: Point) -> Result<[u8; 4]> {
        let img = self.store.lookup(id)?;
        let local = img.to_local(p);
        Ok(img.surface.sample(local.x as i64, local.y as i64, img.repl))
    }

    fn flush(&mut self) {
        let r = std::mem::replace(&mut self.refresh, Rect::ZERO);
        trace!("flush: refresh {r:?}");
        self.pending.push_back(r);
    }

    // --- Resource commands --------------------------------------------------

    fn cmd_alloc(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        let screen_id = reader.long()?;
        let refresh = reader.byte()?;
        let chan = Channel::from_tag(reader.ulong()?);
        let repl = reader.byte()? != 0;
        let r = reader.rect()?;
        let clipr = reader.rect()?;
        let color = reader.ulong()?;
        self.store
            .alloc(id, screen_id, refresh, chan, repl, r, clipr, color)
    }

    fn cmd_free_image(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        if id == DISPLAY_ID {
            return Err(DrawError::DisplayInvariant(
                "the display image cannot be freed".to_string(),
            ));
        }
        self.store.free(id)?;
        self.fonts.drop_for_image(id);
        Ok(())
    }

    fn cmd_alloc_screen(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        let image_id = reader.long()?;
        let fill_id = reader.long()?;
        let public = reader.byte()? != 0;
        self.store.alloc_screen(id, image_id, fill_id, public)
    }

    fn cmd_set_clip(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        let repl = reader.byte()? != 0;
        let clipr = reader.rect()?;
        self.store.set_clip(id, repl, clipr)
    }

    fn cmd_origin(&mut self, reader: &mut WireReader) -> Result<()> {
        // The split between logical and screen origin is a transport
        // concern this core does not interpret; parse and move on.
        let id = reader.long()?;
        let log_min = reader.point()?;
        let scr_min = reader.point()?;
        debug!("origin for image {id} ({log_min:?}, {scr_min:?}) recorded, not applied");
        Ok(())
    }

    fn cmd_restack(&mut self, reader: &mut WireReader, top: bool) -> Result<()> {
        let n = reader.short()? as usize;
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            ids.push(reader.long()?);
        }
        self.store.restack(&ids, top);
        Ok(())
    }

    fn cmd_name_global(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        let register = reader.byte()? != 0;
        let name = reader.string()?;
        self.store.set_name(id, name, register)
    }

    fn cmd_name_local(&mut self, reader: &mut WireReader) -> Result<()> {
        let id = reader.long()?;
        let name = reader.string()?;
        self.store.bind_name(id, name);
        Ok(())
    }

    fn cmd_init_font(&mut self, reader: &mut WireReader) -> Result<()> {
        let font_id = reader.long()?;
        let n = reader.ulong()?;
        let ascent = reader.byte()? as i32;
        // The glyph table hangs off a live image.
        self.store
            .lookup(font_id)
            .map_err(|_| DrawError::UnknownFont(font_id))?;
        self.fonts.init_font(font_id, n, ascent)
    }

    fn cmd_load_char(&mut self, reader: &mut WireReader) -> Result<()> {
        let font_id = reader.long()?;
        let src_id = reader.long()?;
        let index = reader.short()? as usize;
        let r = reader.rect()?;
        let p = reader.point()?;
        let left = reader.byte()? as i8;
        let width = reader.byte()?;

        if self.fonts.get(font_id).is_none() {
            return Err(DrawError::UnknownFont(font_id));
        }
        let src = self.snapshot(src_id)?;

        // Copy the raster into the font's backing image.
        let font_img = self.store.lookup_mut(font_id)?;
        if !font_img.r.contains_rect(&r) {
            return Err(DrawError::OutOfRange(format!(
                "glyph rectangle {r:?} outside font image {:?}",
                font_img.r
            )));
        }
        let dst_local = r.translate(Point::ZERO - font_img.r.min);
        let src_off = p - src.r.min;
        font_img
            .surface
            .composite(dst_local, &src.surface, src_off, src.repl, None, DrawOp::S);

        let font = self
            .fonts
            .get_mut(font_id)
            .ok_or(DrawError::UnknownFont(font_id))?;
        font.load_char(index, r, left, width)
    }

    fn cmd_init(&mut self, response: &mut WireWriter) -> Result<()> {
        let display = self.store.lookup(DISPLAY_ID)?;
        response.long(DISPLAY_ID);
        response.ulong(display.chan.tag());
        let mut label = [0u8; LABEL_LEN];
        let text = self.config.label.as_bytes();
        let n = text.len().min(LABEL_LEN);
        label[..n].copy_from_slice(&text[..n]);
        response.raw(&label);
        response.rect(display.r);
        Ok(())
    }

    // --- Pixel transfer -----------------------------------------------------

    fn cmd_load(
        &mut self,
        reader: &mut WireReader,
        compressed: bool,
        response: &mut WireWriter,
    ) -> Result<()> {
        let id = reader.long()?;
        let r = reader.rect()?;
        let rest = reader.take_rest();

        let img = self.store.lookup_mut(id)?;
        if !img.r.contains_rect(&r) {
            return Err(DrawError::OutOfRange(format!(
                "load rectangle {r:?} outside image {:?}",
                img.r
            )));
        }
        if r.is_empty() {
            response.long(0);
            return Ok(());
        }
        let width = r.width() as u32;
        let rows = r.height() as usize;
        let bpr = pixel::bytes_per_row(img.chan, width);
        let needed = rows * bpr;

        let (data, consumed): (std::borrow::Cow<'_, [u8]>, usize) = if compressed {
            let (bytes, used) = rle::decompress(rest, needed)
                .map_err(|e| DrawError::MalformedStream(e.to_string()))?;
            (bytes.into(), used)
        } else {
            if rest.len() < needed {
                return Err(DrawError::MalformedStream(format!(
                    "load needs {needed} pixel bytes, buffer holds {}",
                    rest.len()
                )));
            }
            (rest[..needed].into(), needed)
        };
        if rest.len() > consumed {
            warn!("load: {} trailing bytes ignored", rest.len() - consumed);
        }

        let x0 = (r.min.x - img.r.min.x) as usize;
        let mut rgba = vec![0u8; width as usize * 4];
        for (i, row) in data.chunks(bpr).take(rows).enumerate() {
            pixel::unpack_row(img.chan, row, &mut rgba)
                .map_err(|e| DrawError::MalformedStream(e.to_string()))?;
            let y = (r.min.y - img.r.min.y) as usize + i;
            let dst = img.surface.row_mut(y as u32);
            dst[x0 * 4..(x0 + width as usize) * 4].copy_from_slice(&rgba);
        }

        self.add_refresh(id, r);
        response.long(consumed as i32);
        Ok(())
    }

    fn cmd_unload(&mut self, reader: &mut WireReader, response: &mut WireWriter) -> Result<()> {
        let id = reader.long()?;
        let r = reader.rect()?;
        let img = self.store.lookup(id)?;
        if !img.r.contains_rect(&r) {
            return Err(DrawError::OutOfRange(format!(
                "unload rectangle {r:?} outside image {:?}",
                img.r
            )));
        }
        let width = r.width() as usize;
        let bpr = pixel::bytes_per_row(img.chan, width as u32);
        let x0 = (r.min.x - img.r.min.x) as usize;
        let mut packed = vec![0u8; bpr];
        for y in r.min.y..r.max.y {
            let local_y = (y - img.r.min.y) as u32;
            let row = &img.surface.row(local_y)[x0 * 4..(x0 + width) * 4];
            pixel::pack_row(img.chan, row, &mut packed)
                .map_err(|e| DrawError::MalformedStream(e.to_string()))?;
            response.raw(&packed);
        }
        Ok(())
    }
}
