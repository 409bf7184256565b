// libretro module - Plugin ABI definitions
//
// This module provides the C-compatible types, constants and callback
// signatures shared between the host and a dynamically loaded core.

pub mod ffi;

pub use ffi::*;
