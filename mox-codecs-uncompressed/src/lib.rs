// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

//! Uncompressed, row/channel-interleaved codecs: lossless RGBA video and PCM audio, each storing
//! every sample at its native bit width with no transformation beyond byte packing.
//!
//! These are the only two codecs `mox` ships as a complete round trip; every other compression
//! scheme (`mox-codecs-ext`) only negotiates a descriptor shape.

mod audio;
mod video;

pub use audio::{UncompressedPcmCodecInfo, UncompressedPcmCodec};
pub use video::{UncompressedVideoCodecInfo, UncompressedVideoCodec};

use mox_core::codec::CodecRegistry;
use mox_core::header::{AudioCompression, VideoCompression};

/// Registers both codecs in this crate at [`mox_core::codec::Tier::Standard`].
pub fn register(registry: &mut CodecRegistry) {
    registry.register_video_codec(VideoCompression::Uncompressed, Box::new(UncompressedVideoCodecInfo));
    registry.register_audio_codec(AudioCompression::Pcm, Box::new(UncompressedPcmCodecInfo));
}
