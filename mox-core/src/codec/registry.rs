// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`CodecRegistry`]: a tiered lookup from a compression scheme to the plug-in that implements
//! it, allowing more than one implementation of the same scheme to coexist (a hand-tuned
//! production encoder registered `Preferred` over a reference one at `Standard`).

use std::collections::HashMap;

use crate::codec::{AudioCodecInfo, VideoCodecInfo};
use crate::errors::{no_impl_error, Result};
use crate::header::{AudioCompression, VideoCompression};

/// Where a registered codec ranks against others that implement the same compression scheme.
/// Lookup always prefers a higher tier; a scheme with nothing registered at `Preferred` falls
/// through to `Standard`, then `Fallback`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Preferred,
    Standard,
    Fallback,
}

struct TieredMap<K, V> {
    preferred: HashMap<K, V>,
    standard: HashMap<K, V>,
    fallback: HashMap<K, V>,
}

impl<K, V> Default for TieredMap<K, V> {
    fn default() -> Self {
        TieredMap { preferred: HashMap::new(), standard: HashMap::new(), fallback: HashMap::new() }
    }
}

impl<K: std::hash::Hash + Eq, V> TieredMap<K, V> {
    fn map_for(&mut self, tier: Tier) -> &mut HashMap<K, V> {
        match tier {
            Tier::Preferred => &mut self.preferred,
            Tier::Standard => &mut self.standard,
            Tier::Fallback => &mut self.fallback,
        }
    }

    fn insert(&mut self, tier: Tier, key: K, value: V) {
        self.map_for(tier).insert(key, value);
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.preferred.get(key).or_else(|| self.standard.get(key)).or_else(|| self.fallback.get(key))
    }
}

/// A lookup from compression scheme to the registered plug-in(s) that implement it.
///
/// `mox::default_registry()` builds one of these populated with the first-party codecs at
/// [`Tier::Standard`]; a caller wanting to prefer a third-party codec for some scheme registers it
/// at [`Tier::Preferred`] first.
#[derive(Default)]
pub struct CodecRegistry {
    video: TieredMap<VideoCompressionKey, Box<dyn VideoCodecInfo>>,
    audio: TieredMap<AudioCompressionKey, Box<dyn AudioCodecInfo>>,
}

// `VideoCompression`/`AudioCompression` aren't `Hash`, so the registry keys on a small,
// hashable mirror rather than requiring every header attribute enum to carry that derive.
type VideoCompressionKey = u8;
type AudioCompressionKey = u8;

fn video_key(c: VideoCompression) -> VideoCompressionKey {
    match c {
        VideoCompression::Uncompressed => 0,
        VideoCompression::Png => 1,
        VideoCompression::Jpeg => 2,
        VideoCompression::Jpeg2000 => 3,
        VideoCompression::JpegLs => 4,
        VideoCompression::Dpx => 5,
        VideoCompression::OpenExr => 6,
        VideoCompression::Dirac => 7,
        VideoCompression::Mpeg => 8,
    }
}

fn audio_key(c: AudioCompression) -> AudioCompressionKey {
    match c {
        AudioCompression::Pcm => 0,
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        CodecRegistry::default()
    }

    pub fn register_video_codec(&mut self, compression: VideoCompression, info: Box<dyn VideoCodecInfo>) {
        self.register_video_codec_at_tier(compression, info, Tier::Standard);
    }

    pub fn register_video_codec_at_tier(
        &mut self,
        compression: VideoCompression,
        info: Box<dyn VideoCodecInfo>,
        tier: Tier,
    ) {
        self.video.insert(tier, video_key(compression), info);
    }

    pub fn register_audio_codec(&mut self, compression: AudioCompression, info: Box<dyn AudioCodecInfo>) {
        self.register_audio_codec_at_tier(compression, info, Tier::Standard);
    }

    pub fn register_audio_codec_at_tier(
        &mut self,
        compression: AudioCompression,
        info: Box<dyn AudioCodecInfo>,
        tier: Tier,
    ) {
        self.audio.insert(tier, audio_key(compression), info);
    }

    pub fn video_codec_info(&self, compression: VideoCompression) -> Result<&dyn VideoCodecInfo> {
        match self.video.get(&video_key(compression)) {
            Some(info) => Ok(info.as_ref()),
            None => no_impl_error("no video codec registered for this compression scheme"),
        }
    }

    pub fn audio_codec_info(&self, compression: AudioCompression) -> Result<&dyn AudioCodecInfo> {
        match self.audio.get(&audio_key(compression)) {
            Some(info) => Ok(info.as_ref()),
            None => no_impl_error("no audio codec registered for this compression scheme"),
        }
    }
}
