// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! `mox` is a pure Rust library for reading and writing MXF (SMPTE 377M) files: the
//! professional container format that multiplexes frame-aligned compressed video and audio
//! essence alongside descriptive metadata and a random-access index table.
//!
//! ## Using `mox` to read a file
//!
//! 1. Get a [`mox_core::codec::CodecRegistry`] with the codecs a deployment needs. [`default_registry`]
//!    builds one populated with every codec this crate ships; register additional or
//!    replacement codecs at [`mox_core::codec::Tier::Preferred`] before opening a file.
//! 2. Wrap the source in a [`mox_mxf::IoStream`] implementation. [`mox_mxf::MemoryStream`] works
//!    for an in-memory buffer; a real deployment typically wraps a [`std::fs::File`].
//! 3. Open an [`mox_mxf::InputFile`] from the stream and the registry.
//! 4. Inspect [`mox_mxf::InputFile::header`] for geometry, frame rate, and channel layout, then
//!    call [`mox_mxf::InputFile::get_frame`] or [`mox_mxf::InputFile::read_audio`] per edit unit.
//!
//! ```
//! use mox::default_registry;
//! use mox_core::channels::{Channel, ChannelList};
//! use mox_core::frame::{FrameBuffer, Slice};
//! use mox_core::header::{Header, VideoCompression};
//! use mox_core::pixel::PixelType;
//! use mox_mxf::{InputFile, MemoryStream, OutputFile};
//!
//! let registry = default_registry();
//!
//! let mut channels = ChannelList::new();
//! channels.insert("Y", Channel::new(PixelType::U8));
//! let header = Header::new(4, 2)
//!     .unwrap()
//!     .with_channels(channels)
//!     .unwrap()
//!     .with_video_compression(VideoCompression::Uncompressed)
//!     .unwrap();
//!
//! let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();
//! let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
//! frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
//! out.push_frame(&frame).unwrap();
//! out.finalize().unwrap();
//!
//! let mut input = InputFile::open(Box::new(MemoryStream::from(out.into_stream_bytes())), &registry).unwrap();
//! assert_eq!(input.frame_count(), 1);
//! ```
//!
//! ## Crate layout
//!
//! [`mox-core`](mox_core) defines the data model shared by every codec and by the container
//! itself: headers, channel lists, frame buffers, descriptors, and the [`mox_core::codec`]
//! traits a codec implements to plug into a [`mox_core::codec::CodecRegistry`].
//! [`mox-mxf`](mox_mxf) implements the container: KLV framing, partitions, the index table, and
//! the [`mox_mxf::InputFile`]/[`mox_mxf::OutputFile`] demuxer/muxer pair.
//! [`mox-codecs-uncompressed`](mox_codecs_uncompressed) implements uncompressed CDCI/RGBA video
//! and PCM audio. [`mox-codecs-ext`](mox_codecs_ext) negotiates descriptors for compression
//! schemes this crate does not implement an algorithm for.

pub use mox_core as core;
pub use mox_codecs_ext as codecs_ext;
pub use mox_codecs_uncompressed as codecs_uncompressed;
pub use mox_mxf as mxf;

pub use mox_core::codec::{CodecRegistry, Tier};
pub use mox_core::errors::{Error, Result};
pub use mox_mxf::{InputFile, IoStream, MemoryStream, OutputFile};

/// The muxer-side container writer. An alias for [`mox_mxf::OutputFile`], named the way a
/// caller who only imports `mox` thinks of it: the write half of the container.
pub use mox_mxf::OutputFile as Writer;

/// The demuxer-side container reader. An alias for [`mox_mxf::InputFile`]; see [`Writer`].
pub use mox_mxf::InputFile as Reader;

/// Builds a [`CodecRegistry`] populated with every codec this crate ships, each registered at
/// [`Tier::Standard`]: uncompressed CDCI/RGBA video and PCM audio from
/// [`mox_codecs_uncompressed`], plus descriptor-only negotiation for every other compression
/// scheme [`mox_core::header::VideoCompression`] names, from [`mox_codecs_ext`].
///
/// A deployment that links a real implementation of one of the external schemes should register
/// it at [`Tier::Preferred`] afterwards; a [`CodecRegistry`] lookup always prefers a preferred
/// registration over a standard one.
pub fn default_registry() -> CodecRegistry {
    let mut registry = CodecRegistry::new();
    mox_codecs_uncompressed::register(&mut registry);
    mox_codecs_ext::register(&mut registry);
    registry
}
