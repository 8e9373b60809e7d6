// draw-gfx/src/lib.rs

//! Graphics support crate for the draw compositor.
//!
//! This crate knows nothing about the wire protocol. It provides the
//! integer geometry types, the Plan 9 channel-descriptor model with
//! conversion to and from the internal straight-RGBA surface format,
//! the Plan 9 image run-length codec, Porter-Duff composition over
//! straight-alpha pixels, and the concrete `Surface` pixel buffer that
//! every image in the compositor is backed by.

pub mod chan;
pub mod compose;
pub mod geom;
pub mod pixel;
pub mod rle;
pub mod surface;

pub use chan::Channel;
pub use compose::DrawOp;
pub use geom::{Point, Rect};
pub use surface::Surface;
