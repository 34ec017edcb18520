// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

//! Shared types, buffers, and the codec plug-in boundary for the `mox` media library.
//!
//! `mox-core` has no knowledge of the MXF container itself (that lives in `mox-mxf`); it defines
//! the vocabulary container and codec crates build on: pixel and sample types, the
//! [`frame::FrameBuffer`]/[`audio::AudioBuffer`] in-memory media buffers, the [`header::Header`]
//! metadata dictionary, the SMPTE 377M [`descriptor`] hierarchy, and the [`codec`] trait objects
//! a compression plug-in implements.

pub mod audio;
pub mod channels;
pub mod codec;
pub mod data;
pub mod descriptor;
pub mod errors;
pub mod frame;
pub mod header;
pub mod pixel;
pub mod sample;
pub mod threads;
pub mod units;

pub use data::DataChunk;
pub use errors::{Error, Result};
