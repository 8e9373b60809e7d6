// core-draw/src/wire/mod.rs

//! Draw protocol wire primitives.
//!
//! Everything on the wire is little-endian. `WireReader` is a stateful
//! cursor over one command buffer; it hands back scalars, points,
//! rectangles and delta-compressed coordinate runs, and fails with
//! `MalformedStream` rather than read past the end. `WireWriter` is the
//! encoding half, used for responses and by tests that build command
//! buffers. `ctl` holds the two fixed-size record formats a host reads
//! out of band.

pub mod ctl;
pub mod opcodes;
mod reader;
mod writer;

pub use reader::WireReader;
pub use writer::WireWriter;

#[cfg(test)]
mod tests;
