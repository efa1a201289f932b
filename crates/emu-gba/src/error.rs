//! Errors returned to the host.
//!
//! Stepping and bus access never fail; only construction and frame
//! transfer check their inputs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GbaError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GbaError {
    #[error("frame buffer too small: need {needed} pixels, got {actual}")]
    FrameBufferTooSmall { needed: usize, actual: usize },
    #[error("cartridge image is {0} bytes, larger than the 32 MiB ROM window")]
    RomTooLarge(usize),
    #[error("BIOS image is {0} bytes, larger than 16 KiB")]
    BiosTooLarge(usize),
}
