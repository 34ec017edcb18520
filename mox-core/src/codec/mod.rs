// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The codec plug-in boundary: [`VideoCodec`]/[`AudioCodec`] trait objects that compress and
//! decompress one stream, [`VideoCodecInfo`]/[`AudioCodecInfo`] capability negotiation, and a
//! [`CodecRegistry`] that picks among competing implementations of the same compression scheme.

mod registry;

pub use registry::{CodecRegistry, Tier};

use std::collections::VecDeque;

use crate::audio::AudioBuffer;
use crate::data::DataChunk;
use crate::descriptor::{AudioDescriptor, Descriptor, VideoDescriptor};
use crate::frame::FrameBuffer;
use crate::header::Header;
use crate::channels::{AudioChannelList, ChannelList};
use crate::errors::Result;
use crate::pixel::PixelType;
use crate::sample::SampleType;
use crate::units::Box2i;

/// Which families of channel names a video codec is prepared to compress, as a bitmask so a
/// codec can declare support for several shapes at once.
pub type ChannelCapabilities = u32;

pub const CHANNELS_NONE: ChannelCapabilities = 0;
pub const CHANNELS_RGB: ChannelCapabilities = 1 << 0;
pub const CHANNELS_RGBA: ChannelCapabilities = 1 << 1;
pub const CHANNELS_Y: ChannelCapabilities = 1 << 2;
pub const CHANNELS_YA: ChannelCapabilities = 1 << 3;
pub const CHANNELS_A: ChannelCapabilities = 1 << 4;
/// A channel with an arbitrary, codec-specific name (not one of the basic RGBA/Y names).
pub const CHANNELS_ANY: ChannelCapabilities = 1 << 5;
pub const CHANNELS_ALL: ChannelCapabilities =
    CHANNELS_RGB | CHANNELS_RGBA | CHANNELS_Y | CHANNELS_YA | CHANNELS_A | CHANNELS_ANY;

pub type AudioChannelCapabilities = u32;

pub const AUDIO_CHANNELS_NONE: AudioChannelCapabilities = 0;
pub const AUDIO_CHANNELS_MONO: AudioChannelCapabilities = 1 << 0;
pub const AUDIO_CHANNELS_STEREO: AudioChannelCapabilities = 1 << 1;
pub const AUDIO_CHANNELS_5_1: AudioChannelCapabilities = 1 << 2;
pub const AUDIO_CHANNELS_ANY: AudioChannelCapabilities = 1 << 3;
pub const AUDIO_CHANNELS_ALL: AudioChannelCapabilities =
    AUDIO_CHANNELS_MONO | AUDIO_CHANNELS_STEREO | AUDIO_CHANNELS_5_1 | AUDIO_CHANNELS_ANY;

/// A queue of encoded packets or decoded frames a codec has produced but the caller hasn't yet
/// drained, shared by every [`VideoCodec`] implementation through composition rather than
/// inheritance.
#[derive(Default)]
pub struct VideoCodecQueues {
    data: VecDeque<DataChunk>,
    frames: VecDeque<FrameBuffer>,
}

impl VideoCodecQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_data(&mut self, data: DataChunk) {
        self.data.push_back(data);
    }

    pub fn store_frame(&mut self, frame: FrameBuffer) {
        self.frames.push_back(frame);
    }

    pub fn next_data(&mut self) -> Option<DataChunk> {
        self.data.pop_front()
    }

    pub fn next_frame(&mut self) -> Option<FrameBuffer> {
        self.frames.pop_front()
    }
}

/// One stream's compressor/decompressor. A codec is constructed either for compression (from a
/// [`Header`] and the channels the caller will pass to `compress`) or for decompression (from a
/// descriptor read off disk); which constructor ran determines whether `compress` or
/// `decompress` is ever called on a given instance.
pub trait VideoCodec: Send {
    fn descriptor(&self) -> &VideoDescriptor;

    /// The concrete file descriptor (CDCI, RGBA, MPEG, ...) this codec produces, for a muxer to
    /// serialize into a container's metadata. Distinct from [`VideoCodec::descriptor`], which
    /// only exposes the generic video fields every kind shares.
    fn container_descriptor(&self) -> Descriptor;

    fn data_window(&self) -> Box2i {
        self.descriptor().stored
    }

    fn display_window(&self) -> Box2i {
        self.descriptor().display
    }

    fn sampled_window(&self) -> Box2i {
        self.descriptor().sampled
    }

    /// Encodes one frame. Implementations append to an internal queue; the compressed packets
    /// become available through [`VideoCodec::next_data`], possibly after some delay (consider a
    /// codec with B-frames).
    fn compress(&mut self, frame: &FrameBuffer) -> Result<()>;

    /// Pops the next compressed packet this codec has produced, if any.
    fn next_data(&mut self) -> Option<DataChunk>;

    /// Feeds one compressed packet in. Implementations append to an internal queue; the decoded
    /// frame becomes available through [`VideoCodec::next_frame`].
    fn decompress(&mut self, data: &DataChunk) -> Result<()>;

    /// Pops the next decoded frame this codec has produced, if any.
    fn next_frame(&mut self) -> Option<FrameBuffer>;

    /// Flushes any frame the codec is holding back (a long-GOP encoder reordering for B-frames,
    /// a decoder waiting on a following frame to resolve a delta). After this call returns,
    /// [`VideoCodec::next_data`]/[`VideoCodec::next_frame`] must drain whatever the codec was
    /// withholding. Intra-only codecs that never buffer can leave the default no-op.
    fn end_of_stream(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A video codec's static capabilities, used to pick a compressed pixel type and validate a
/// caller's channel layout before a [`VideoCodec`] is constructed.
pub trait VideoCodecInfo: Send + Sync {
    fn can_compress_type(&self, pixel_type: PixelType) -> bool;

    /// The pixel type the codec will actually store `pixel_type` as, which may differ from the
    /// input (many codecs only store 8 or 10-bit data regardless of what they're handed). Fails
    /// if the codec has no representation it can substitute for `pixel_type` at all.
    fn compressed_type(&self, pixel_type: PixelType) -> Result<PixelType> {
        Ok(pixel_type)
    }

    fn channel_capabilities(&self) -> ChannelCapabilities;

    fn create_compressor(&self, header: &Header, channels: &ChannelList) -> Result<Box<dyn VideoCodec>>;

    /// Builds a decompressor from a track's on-disk descriptor. `descriptor` carries the
    /// concrete kind (CDCI, RGBA, MPEG, ...) a container read off disk; an implementation that
    /// only handles one kind matches it out of the enum and fails (mirroring a C++
    /// `dynamic_cast` to the wrong derived descriptor type) rather than assuming its shape.
    fn create_decompressor(
        &self,
        descriptor: &Descriptor,
        header: &mut Header,
        channels: &mut ChannelList,
    ) -> Result<Box<dyn VideoCodec>>;
}

/// A queue of encoded packets or decoded buffers an [`AudioCodec`] has produced.
#[derive(Default)]
pub struct AudioCodecQueues {
    data: VecDeque<DataChunk>,
    buffers: VecDeque<AudioBuffer>,
}

impl AudioCodecQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_data(&mut self, data: DataChunk) {
        self.data.push_back(data);
    }

    pub fn store_buffer(&mut self, buffer: AudioBuffer) {
        self.buffers.push_back(buffer);
    }

    pub fn next_data(&mut self) -> Option<DataChunk> {
        self.data.pop_front()
    }

    pub fn next_buffer(&mut self) -> Option<AudioBuffer> {
        self.buffers.pop_front()
    }
}

pub trait AudioCodec: Send {
    fn descriptor(&self) -> &AudioDescriptor;

    /// The concrete file descriptor (Wave, AES3, ...) this codec produces. See
    /// [`VideoCodec::container_descriptor`].
    fn container_descriptor(&self) -> Descriptor;

    fn compress(&mut self, audio: &AudioBuffer) -> Result<()>;

    fn next_data(&mut self) -> Option<DataChunk>;

    /// How many samples a `frame_size`-byte packet decodes to, needed by a demuxer to size the
    /// [`AudioBuffer`] it hands to [`AudioCodec::decompress`]'s caller before decoding occurs.
    fn samples_in_frame(&self, frame_size: usize) -> u64;

    fn decompress(&mut self, data: &DataChunk) -> Result<()>;

    fn next_buffer(&mut self) -> Option<AudioBuffer>;

    /// Flushes any buffered samples. See [`VideoCodec::end_of_stream`].
    fn end_of_stream(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait AudioCodecInfo: Send + Sync {
    fn can_compress_type(&self, sample_type: SampleType) -> bool;

    /// The sample type the codec will actually store `sample_type` as. Fails if the codec has no
    /// representation it can substitute for `sample_type` at all.
    fn compressed_type(&self, sample_type: SampleType) -> Result<SampleType> {
        Ok(sample_type)
    }

    fn channel_capabilities(&self) -> AudioChannelCapabilities;

    fn create_compressor(
        &self,
        header: &Header,
        channels: &AudioChannelList,
    ) -> Result<Box<dyn AudioCodec>>;

    /// Builds a decompressor from a track's on-disk descriptor. See
    /// [`VideoCodecInfo::create_decompressor`] for why this takes the whole [`Descriptor`]
    /// enum rather than just the generic audio fields.
    fn create_decompressor(
        &self,
        descriptor: &Descriptor,
        header: &mut Header,
        channels: &mut AudioChannelList,
    ) -> Result<Box<dyn AudioCodec>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CdciDescriptor;
    use crate::units::Rational;

    struct StubDescriptorHolder {
        descriptor: VideoDescriptor,
    }

    struct StubCodec(StubDescriptorHolder);

    impl VideoCodec for StubCodec {
        fn descriptor(&self) -> &VideoDescriptor {
            &self.0.descriptor
        }

        fn container_descriptor(&self) -> Descriptor {
            let d = &self.0.descriptor;
            Descriptor::Cdci(CdciDescriptor::new(d.generic.sample_rate, d.width(), d.height(), 2, 2))
        }

        fn compress(&mut self, _frame: &FrameBuffer) -> Result<()> {
            Ok(())
        }

        fn next_data(&mut self) -> Option<DataChunk> {
            None
        }

        fn decompress(&mut self, _data: &DataChunk) -> Result<()> {
            Ok(())
        }

        fn next_frame(&mut self) -> Option<FrameBuffer> {
            None
        }
    }

    #[test]
    fn windows_default_to_the_descriptor_geometry() {
        let descriptor = VideoDescriptor::new(Rational::new(24, 1).unwrap(), 64, 32);
        let codec = StubCodec(StubDescriptorHolder { descriptor: descriptor.clone() });

        assert_eq!(codec.data_window(), descriptor.stored);
        assert_eq!(codec.display_window(), descriptor.display);
    }
}
