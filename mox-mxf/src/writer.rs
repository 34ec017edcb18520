// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`OutputFile`]: the OP1a-shaped muxer.
//!
//! Construction negotiates one codec per declared channel group against a [`CodecRegistry`],
//! allocating each a generic-container track number. `push_frame`/`push_audio` feed media in;
//! `finalize` flushes every codec, writes the footer partition with the complete metadata and
//! index, and is safe to call more than once.

use std::collections::HashSet;

use indexmap::IndexMap;

use mox_core::audio::{AudioBuffer, AudioSlice};
use mox_core::channels::{AudioChannelList, ChannelList};
use mox_core::codec::{
    AudioChannelCapabilities, AudioCodec, AudioCodecInfo, ChannelCapabilities, CodecRegistry,
    VideoCodec, VideoCodecInfo, AUDIO_CHANNELS_5_1, AUDIO_CHANNELS_ANY, AUDIO_CHANNELS_MONO,
    AUDIO_CHANNELS_STEREO, CHANNELS_A, CHANNELS_ANY, CHANNELS_RGB, CHANNELS_RGBA, CHANNELS_Y,
    CHANNELS_YA,
};
use mox_core::descriptor::Descriptor;
use mox_core::errors::{argument_error, no_impl_error, Result};
use mox_core::frame::{FrameBuffer, Slice};
use mox_core::header::Header;
use mox_core::units::Rational;

use crate::index::IndexTable;
use crate::io::{self, IoStream, MemoryStream, SeekFrom};
use crate::klv;
use crate::metadata::{FileMetadata, TrackKind, TrackMetadata};
use crate::partition::{PartitionKind, PartitionPack};
use crate::track::{TrackNumber, ITEM_TYPE_PICTURE, ITEM_TYPE_SOUND};

const BODY_SID: u32 = 1;
const INDEX_SID: u32 = 2;
const DEFAULT_KAG: u32 = 512;

struct VideoTrack {
    codec: Box<dyn VideoCodec>,
    channels: ChannelList,
    track_number: TrackNumber,
    frames_written: u64,
}

struct AudioTrack {
    codec: Box<dyn AudioCodec>,
    channels: AudioChannelList,
    track_number: TrackNumber,
    /// `audio_sampling_rate / frame_rate`, used to compute each edit unit's cumulative sample
    /// target for the cumulative "samples so far" cadence.
    ratio: Rational,
    samples_flushed: u64,
    /// Samples accumulated from `push_audio` calls but not yet handed to the codec, keyed by
    /// channel name.
    pending: IndexMap<String, Vec<f64>>,
}

/// The muxer half of the container: accepts video frames and audio blocks and writes one
/// self-contained file.
pub struct OutputFile {
    stream: Box<dyn IoStream>,
    header: Header,
    video_tracks: Vec<VideoTrack>,
    audio_tracks: Vec<AudioTrack>,
    frame_rate: Rational,
    kag: u32,
    opened: bool,
    finalized: bool,
    header_partition_offset: u64,
    body_partition_offsets: Vec<u64>,
    video_frame_count: u64,
    index: IndexTable,
}

impl OutputFile {
    /// Negotiates codecs for every channel group declared in `header` against `registry`, and
    /// returns a muxer ready to accept frames/audio. Fails if the header declares neither video
    /// nor audio channels, or if no registered codec accepts a declared channel layout.
    pub fn new(stream: Box<dyn IoStream>, header: Header, registry: &CodecRegistry) -> Result<Self> {
        header.sanity_check()?;

        let frame_rate = header.frame_rate()?;

        let mut video_tracks = Vec::new();
        let channels = header.channels()?;
        if !channels.is_empty() {
            let info = registry.video_codec_info(header.video_compression()?)?;
            let negotiated = negotiate_video_channels(channels, info)?;
            let groups = partition_video_channels(&negotiated, info.channel_capabilities())?;
            let item_count = groups.len() as u8;

            for (i, group) in groups.into_iter().enumerate() {
                let codec = info.create_compressor(&header, &group)?;
                let element_type = codec.container_descriptor().gc_element_type();
                let track_number =
                    TrackNumber::new(ITEM_TYPE_PICTURE, item_count, element_type, (i + 1) as u8);
                video_tracks.push(VideoTrack { codec, channels: group, track_number, frames_written: 0 });
            }
        }

        let mut audio_tracks = Vec::new();
        let audio_channels = header.audio_channels()?;
        if !audio_channels.is_empty() {
            let info = registry.audio_codec_info(header.audio_compression()?)?;
            let negotiated = negotiate_audio_channels(audio_channels, info)?;
            let groups = partition_audio_channels(&negotiated, info.channel_capabilities())?;
            let item_count = groups.len() as u8;
            let ratio = audio_cadence_ratio(header.sample_rate()?, frame_rate)?;

            for (i, group) in groups.into_iter().enumerate() {
                let codec = info.create_compressor(&header, &group)?;
                let element_type = codec.container_descriptor().gc_element_type();
                let track_number =
                    TrackNumber::new(ITEM_TYPE_SOUND, item_count, element_type, (i + 1) as u8);
                audio_tracks.push(AudioTrack {
                    codec,
                    channels: group,
                    track_number,
                    ratio,
                    samples_flushed: 0,
                    pending: IndexMap::new(),
                });
            }
        }

        if video_tracks.is_empty() && audio_tracks.is_empty() {
            return argument_error("header declares no video or audio channels to write");
        }

        let index = IndexTable::new(BODY_SID, INDEX_SID, frame_rate);

        Ok(OutputFile {
            stream,
            header,
            video_tracks,
            audio_tracks,
            frame_rate,
            kag: DEFAULT_KAG,
            opened: false,
            finalized: false,
            header_partition_offset: 0,
            body_partition_offsets: Vec::new(),
            video_frame_count: 0,
            index,
        })
    }

    /// Compresses one frame on every video track and writes the resulting essence packets,
    /// converting into each track's accepted channel layout first if `frame`'s layout differs.
    pub fn push_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        if self.finalized {
            return argument_error("cannot push a frame after finalize");
        }
        if self.video_tracks.is_empty() {
            return argument_error("this file declares no video tracks");
        }

        self.ensure_open()?;

        let offset = self.stream.tell()?;
        self.index.push_entry(offset);

        for track in &mut self.video_tracks {
            let temp = materialize_for_track(frame, &track.channels)?;
            track.codec.compress(&temp)?;

            while let Some(chunk) = track.codec.next_data() {
                klv::write_klv(&mut *self.stream, track.track_number.essence_key(), &chunk.to_vec())?;
                track.frames_written += 1;
            }
        }

        self.video_frame_count += 1;
        self.drain_audio()?;

        Ok(())
    }

    /// Accumulates `audio`'s remaining samples into every audio track's pending buffer and
    /// consumes its playhead accordingly, flushing any track whose accumulator now covers a
    /// complete edit unit's worth of samples.
    pub fn push_audio(&mut self, audio: &mut AudioBuffer) -> Result<()> {
        if self.finalized {
            return argument_error("cannot push audio after finalize");
        }
        if self.audio_tracks.is_empty() {
            return argument_error("this file declares no audio tracks");
        }

        self.ensure_open()?;

        let count = audio.remaining();
        if count == 0 {
            return Ok(());
        }

        for track in &mut self.audio_tracks {
            for (name, _) in track.channels.iter() {
                let queue = track.pending.entry(name.to_string()).or_default();

                match audio.playhead_slice(name) {
                    Ok(slice) => {
                        for i in 0..count {
                            queue.push(slice.get(i)?);
                        }
                    }
                    Err(_) => queue.extend(std::iter::repeat(0.0).take(count as usize)),
                }
            }
        }

        audio.fast_forward(count)?;
        self.drain_audio()
    }

    /// Flushes every codec (delivering any withheld frame/buffer), writes the footer partition
    /// with the final metadata and index, and back-patches every partition's footer offset.
    /// Calling this more than once is a no-op after the first call.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }

        self.ensure_open()?;

        for track in &mut self.video_tracks {
            track.codec.end_of_stream()?;
            while let Some(chunk) = track.codec.next_data() {
                klv::write_klv(&mut *self.stream, track.track_number.essence_key(), &chunk.to_vec())?;
                track.frames_written += 1;
            }
        }

        let targets: Vec<u64> = self
            .audio_tracks
            .iter()
            .map(|t| t.ratio.round_multiply(self.video_frame_count as i64).max(0) as u64)
            .collect();

        for (track, target) in self.audio_tracks.iter_mut().zip(targets) {
            let needed = target.saturating_sub(track.samples_flushed);
            if needed > 0 {
                let buffer = drain_pending_into_buffer(&track.channels, &mut track.pending, needed)?;
                track.codec.compress(&buffer)?;
                track.samples_flushed += needed;
            }

            track.codec.end_of_stream()?;
            while let Some(chunk) = track.codec.next_data() {
                klv::write_klv(&mut *self.stream, track.track_number.essence_key(), &chunk.to_vec())?;
            }
        }

        let metadata = self.build_metadata();
        let mut metadata_scratch = MemoryStream::new();
        metadata.write(&mut metadata_scratch)?;
        let metadata_bytes = metadata_scratch.into_vec();

        let mut index_scratch = MemoryStream::new();
        self.index.write(&mut index_scratch)?;
        let index_bytes = index_scratch.into_vec();

        let mut footer = PartitionPack::new(PartitionKind::Footer);
        footer.this_partition = self.stream.tell()?;
        footer.previous_partition =
            *self.body_partition_offsets.last().unwrap_or(&self.header_partition_offset);
        footer.footer_partition = footer.this_partition;
        footer.header_byte_count = metadata_bytes.len() as u64;
        footer.index_byte_count = index_bytes.len() as u64;
        footer.index_sid = INDEX_SID;
        footer.kag_size = self.kag;
        footer.write(&mut *self.stream)?;

        self.stream.write_all(&metadata_bytes)?;
        self.stream.write_all(&index_bytes)?;
        klv::pad_to_kag(&mut *self.stream, self.kag as u64)?;

        self.patch_footer_offsets(footer.this_partition)?;

        self.finalized = true;
        self.stream.flush()?;
        Ok(())
    }

    /// Writes the (still-open, placeholder-duration) header partition and opens the single body
    /// partition, the first time either `push_frame` or `push_audio` is called.
    fn ensure_open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }

        let metadata = self.build_metadata();
        let mut scratch = MemoryStream::new();
        metadata.write(&mut scratch)?;
        let metadata_bytes = scratch.into_vec();

        let mut header_pack = PartitionPack::new(PartitionKind::Header);
        header_pack.this_partition = self.stream.tell()?;
        header_pack.header_byte_count = metadata_bytes.len() as u64;
        header_pack.kag_size = self.kag;
        header_pack.write(&mut *self.stream)?;
        self.header_partition_offset = header_pack.this_partition;

        self.stream.write_all(&metadata_bytes)?;
        klv::pad_to_kag(&mut *self.stream, self.kag as u64)?;

        let mut body_pack = PartitionPack::new(PartitionKind::Body);
        body_pack.this_partition = self.stream.tell()?;
        body_pack.previous_partition = header_pack.this_partition;
        body_pack.body_sid = BODY_SID;
        body_pack.index_sid = INDEX_SID;
        body_pack.kag_size = self.kag;
        body_pack.write(&mut *self.stream)?;
        self.body_partition_offsets.push(body_pack.this_partition);

        self.opened = true;
        Ok(())
    }

    /// Reads the whole underlying stream back out from the start, for tests and embedders that
    /// want the finalized bytes without a real file on disk. Consumes the muxer since reading
    /// from the start would otherwise leave `stream`'s position inconsistent with `self`'s
    /// bookkeeping.
    pub fn into_stream_bytes(mut self) -> Vec<u8> {
        let size = self.stream.size().expect("stream size") as usize;
        self.stream.seek(SeekFrom::Start(0)).expect("seek to start");
        let mut bytes = vec![0u8; size];
        self.stream.read_exact(&mut bytes).expect("read whole stream");
        bytes
    }

    fn build_metadata(&self) -> FileMetadata {
        let mut metadata = FileMetadata::new();

        for track in &self.video_tracks {
            let descriptor =
                descriptor_with_duration(track.codec.container_descriptor(), track.frames_written);
            metadata.tracks.push(TrackMetadata {
                track_number: track.track_number,
                kind: TrackKind::Picture,
                edit_rate: self.frame_rate,
                origin: 0,
                duration: track.frames_written,
                descriptor: Some(descriptor),
            });
        }

        for track in &self.audio_tracks {
            let descriptor =
                descriptor_with_duration(track.codec.container_descriptor(), track.samples_flushed);
            metadata.tracks.push(TrackMetadata {
                track_number: track.track_number,
                kind: TrackKind::Sound,
                edit_rate: self.header.sample_rate().unwrap_or(self.frame_rate),
                origin: 0,
                duration: track.samples_flushed,
                descriptor: Some(descriptor),
            });
        }

        metadata
    }

    fn drain_audio(&mut self) -> Result<()> {
        for track in &mut self.audio_tracks {
            loop {
                let target = track.ratio.round_multiply(self.video_frame_count as i64).max(0) as u64;
                let needed = target.saturating_sub(track.samples_flushed);
                if needed == 0 {
                    break;
                }

                let available =
                    track.pending.values().map(|queue| queue.len() as u64).min().unwrap_or(0);
                if available < needed {
                    break;
                }

                let buffer = drain_pending_into_buffer(&track.channels, &mut track.pending, needed)?;
                track.codec.compress(&buffer)?;
                track.samples_flushed += needed;

                while let Some(chunk) = track.codec.next_data() {
                    klv::write_klv(&mut *self.stream, track.track_number.essence_key(), &chunk.to_vec())?;
                }
            }
        }

        Ok(())
    }

    /// Back-patches the `footerPartition` field of every previously-written partition pack, now
    /// that the footer's offset is known.
    fn patch_footer_offsets(&mut self, footer_offset: u64) -> Result<()> {
        let mut offsets = vec![self.header_partition_offset];
        offsets.extend(self.body_partition_offsets.iter().copied());

        for this_partition in offsets {
            let field_offset = this_partition + 16 + klv::BER_LENGTH_SIZE + 16;
            self.stream.seek(SeekFrom::Start(field_offset))?;
            io::write_u64(&mut *self.stream, footer_offset)?;
        }

        self.stream.seek(SeekFrom::End(0))?;
        Ok(())
    }
}

/// Builds a fixed-length [`AudioBuffer`] of `needed` samples per channel by popping that many
/// samples off the front of each channel's pending queue (silence-padding a queue that runs
/// short, which only happens at `finalize`).
fn drain_pending_into_buffer(
    channels: &AudioChannelList,
    pending: &mut IndexMap<String, Vec<f64>>,
    needed: u64,
) -> Result<AudioBuffer> {
    let mut buffer = AudioBuffer::new(needed);

    for (name, channel) in channels.iter() {
        let slice = AudioSlice::allocate(channel.sample_type, needed)?;
        let queue = pending.entry(name.to_string()).or_default();

        for i in 0..needed {
            let value = queue.get(i as usize).copied().unwrap_or(0.0);
            slice.set(i, value)?;
        }

        let drained = (needed as usize).min(queue.len());
        queue.drain(0..drained);

        buffer.insert(name, slice);
    }

    Ok(buffer)
}

/// Replaces the `containerDuration` field of whichever `GenericDescriptor` a concrete descriptor
/// embeds.
fn descriptor_with_duration(descriptor: Descriptor, duration: u64) -> Descriptor {
    match descriptor {
        Descriptor::Cdci(mut d) => {
            d.video.generic.container_duration = duration;
            Descriptor::Cdci(d)
        }
        Descriptor::Rgba(mut d) => {
            d.video.generic.container_duration = duration;
            Descriptor::Rgba(d)
        }
        Descriptor::Mpeg(mut d) => {
            d.cdci.video.generic.container_duration = duration;
            Descriptor::Mpeg(d)
        }
        Descriptor::Wave(mut d) => {
            d.audio.generic.container_duration = duration;
            Descriptor::Wave(d)
        }
        Descriptor::Aes3(mut d) => {
            d.wave.audio.generic.container_duration = duration;
            Descriptor::Aes3(d)
        }
    }
}

/// Builds the temporary, per-track [`FrameBuffer`] a codec actually compresses: one slice per
/// channel the codec accepts, at that channel's declared sampling and (possibly, after
/// negotiation) a different pixel type than `frame` carries, then copies `frame` into it.
fn materialize_for_track(frame: &FrameBuffer, channels: &ChannelList) -> Result<FrameBuffer> {
    let mut temp = FrameBuffer::new(*frame.data_window())?;

    for (name, channel) in channels.iter() {
        let slice = allocate_subsampled_slice(
            channel.pixel_type,
            frame.width(),
            frame.height(),
            channel.x_sampling,
            channel.y_sampling,
        )?;
        temp.insert(name, slice);
    }

    temp.copy_from_frame(frame, true)?;
    Ok(temp)
}

fn allocate_subsampled_slice(
    pixel_type: mox_core::pixel::PixelType,
    width: i32,
    height: i32,
    x_sampling: i32,
    y_sampling: i32,
) -> Result<Slice> {
    let sampled_width = (width + x_sampling - 1) / x_sampling;
    let sampled_height = (height + y_sampling - 1) / y_sampling;

    Ok(Slice::allocate(pixel_type, sampled_width.max(1), sampled_height.max(1))?
        .with_sampling(x_sampling, y_sampling))
}

/// Replaces a pixel type the codec can't store natively with [`VideoCodecInfo::compressed_type`].
/// Fails if the codec has no type to substitute, rather than handing a corrupted layout on to
/// `create_compressor`.
fn negotiate_video_channels(channels: &ChannelList, info: &dyn VideoCodecInfo) -> Result<ChannelList> {
    let mut out = ChannelList::new();

    for (name, channel) in channels.iter() {
        let mut negotiated = *channel;
        if !info.can_compress_type(negotiated.pixel_type) {
            negotiated.pixel_type = info.compressed_type(negotiated.pixel_type)?;
        }
        out.insert(name, negotiated);
    }

    Ok(out)
}

fn negotiate_audio_channels(channels: &AudioChannelList, info: &dyn AudioCodecInfo) -> Result<AudioChannelList> {
    let mut out = AudioChannelList::new();

    for (name, channel) in channels.iter() {
        let mut negotiated = *channel;
        if !info.can_compress_type(negotiated.sample_type) {
            negotiated.sample_type = info.compressed_type(negotiated.sample_type)?;
        }
        out.insert(name, negotiated);
    }

    Ok(out)
}

enum ChannelShape {
    Rgb { alpha: bool },
    Luma { alpha: bool },
    AloneAlpha,
}

/// Splits `channels` into per-layer groups (RGB+A, Y+A, ...), one codec instantiated per layer,
/// skipping the step entirely when `caps`
/// declares the codec handles arbitrary channel names in one call.
fn partition_video_channels(channels: &ChannelList, caps: ChannelCapabilities) -> Result<Vec<ChannelList>> {
    if caps & CHANNELS_ANY != 0 {
        return Ok(vec![channels.clone()]);
    }

    let mut groups = Vec::new();

    for (layer, members) in layer_groups(channels) {
        let shape = classify_shape(&members, &layer)?;

        let required = match shape {
            ChannelShape::Rgb { alpha: false } => CHANNELS_RGB,
            ChannelShape::Rgb { alpha: true } => CHANNELS_RGBA,
            ChannelShape::Luma { alpha: false } => CHANNELS_Y,
            ChannelShape::Luma { alpha: true } => CHANNELS_YA,
            ChannelShape::AloneAlpha => CHANNELS_A,
        };

        if caps & required == 0 {
            return no_impl_error("no registered video codec accepts this channel layout");
        }

        groups.push(members);
    }

    Ok(groups)
}

/// Splits `channels` into the root (unlayered) group and one group per named layer
/// ([`ChannelList::layers`]), each carrying its members' full (possibly layer-prefixed) names.
fn layer_groups(channels: &ChannelList) -> Vec<(String, ChannelList)> {
    let layer_names = channels.layers();

    let mut root = ChannelList::new();
    for (name, channel) in channels.iter() {
        let in_a_layer = layer_names.iter().any(|layer| name.starts_with(&format!("{layer}.")));
        if !in_a_layer {
            root.insert(name, *channel);
        }
    }

    let mut groups = Vec::new();
    if !root.is_empty() {
        groups.push((String::new(), root));
    }

    for layer in layer_names {
        let mut members = ChannelList::new();
        for (name, channel) in channels.channels_in_layer(&layer) {
            members.insert(name, *channel);
        }
        groups.push((layer, members));
    }

    groups
}

fn classify_shape(members: &ChannelList, layer: &str) -> Result<ChannelShape> {
    let prefix = if layer.is_empty() { String::new() } else { format!("{layer}.") };
    let bare: HashSet<String> =
        members.iter().map(|(name, _)| name.strip_prefix(prefix.as_str()).unwrap_or(name).to_string()).collect();

    let has = |c: &str| bare.contains(c);
    let has_alpha = has("A");

    if has("R") && has("G") && has("B") {
        let expected = if has_alpha { 4 } else { 3 };
        if bare.len() == expected {
            return Ok(ChannelShape::Rgb { alpha: has_alpha });
        }
    }
    else if has("Y") {
        let expected = if has_alpha { 2 } else { 1 };
        if bare.len() == expected {
            return Ok(ChannelShape::Luma { alpha: has_alpha });
        }
    }
    else if has_alpha && bare.len() == 1 {
        return Ok(ChannelShape::AloneAlpha);
    }

    no_impl_error("channel layer is not an RGB, RGBA, Y, YA, or lone-alpha shape")
}

fn partition_audio_channels(
    channels: &AudioChannelList,
    caps: AudioChannelCapabilities,
) -> Result<Vec<AudioChannelList>> {
    if caps & AUDIO_CHANNELS_ANY != 0 {
        return Ok(vec![channels.clone()]);
    }

    let required = match channels.len() {
        1 => AUDIO_CHANNELS_MONO,
        2 => AUDIO_CHANNELS_STEREO,
        6 => AUDIO_CHANNELS_5_1,
        _ => return no_impl_error("no registered audio codec accepts this channel count"),
    };

    if caps & required == 0 {
        return no_impl_error("no registered audio codec accepts this channel count");
    }

    Ok(vec![channels.clone()])
}

/// `audio_sampling_rate / frame_rate`, the ratio [`Rational::round_multiply`] turns into a
/// cumulative sample count for a given number of edit units.
fn audio_cadence_ratio(sample_rate: Rational, frame_rate: Rational) -> Result<Rational> {
    let num = i64::from(sample_rate.numerator()) * i64::from(frame_rate.denominator());
    let den = i64::from(sample_rate.denominator()) * i64::from(frame_rate.numerator());
    Rational::new(num as i32, den as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mox_core::channels::Channel;
    use mox_core::codec::{AudioChannelCapabilities, ChannelCapabilities, CHANNELS_ALL};
    use mox_core::data::DataChunk;
    use mox_core::descriptor::{CdciDescriptor, WaveAudioDescriptor};
    use mox_core::header::{AudioCompression, VideoCompression};
    use mox_core::pixel::PixelType;
    use mox_core::sample::SampleType;

    struct PassthroughVideoCodec {
        descriptor: mox_core::descriptor::VideoDescriptor,
        queue: std::collections::VecDeque<DataChunk>,
    }

    impl VideoCodec for PassthroughVideoCodec {
        fn descriptor(&self) -> &mox_core::descriptor::VideoDescriptor {
            &self.descriptor
        }
        fn container_descriptor(&self) -> Descriptor {
            Descriptor::Cdci(CdciDescriptor::new(
                self.descriptor.generic.sample_rate,
                self.descriptor.width(),
                self.descriptor.height(),
                1,
                1,
            ))
        }
        fn compress(&mut self, frame: &FrameBuffer) -> Result<()> {
            let (_, slice) = frame.iter().next().expect("at least one channel");
            let bytes = (0..(frame.width() as u64 * frame.height() as u64))
                .map(|i| slice.get((i as i32 % frame.width()) as i32, (i as i32 / frame.width()) as i32))
                .collect::<Result<Vec<f64>>>()?
                .iter()
                .map(|v| *v as u8)
                .collect::<Vec<u8>>();
            self.queue.push_back(DataChunk::from_vec(bytes));
            Ok(())
        }
        fn next_data(&mut self) -> Option<DataChunk> {
            self.queue.pop_front()
        }
        fn decompress(&mut self, _data: &DataChunk) -> Result<()> {
            Ok(())
        }
        fn next_frame(&mut self) -> Option<FrameBuffer> {
            None
        }
    }

    struct PassthroughVideoInfo;

    impl VideoCodecInfo for PassthroughVideoInfo {
        fn can_compress_type(&self, pixel_type: PixelType) -> bool {
            pixel_type == PixelType::U8
        }
        fn channel_capabilities(&self) -> ChannelCapabilities {
            CHANNELS_ALL
        }
        fn create_compressor(
            &self,
            header: &Header,
            _channels: &ChannelList,
        ) -> Result<Box<dyn VideoCodec>> {
            Ok(Box::new(PassthroughVideoCodec {
                descriptor: mox_core::descriptor::VideoDescriptor::new(
                    header.frame_rate()?,
                    header.width()? as u32,
                    header.height()? as u32,
                ),
                queue: std::collections::VecDeque::new(),
            }))
        }
        fn create_decompressor(
            &self,
            descriptor: &Descriptor,
            _header: &mut Header,
            _channels: &mut ChannelList,
        ) -> Result<Box<dyn VideoCodec>> {
            let descriptor = match descriptor {
                Descriptor::Cdci(c) => c.video.clone(),
                Descriptor::Rgba(r) => r.video.clone(),
                Descriptor::Mpeg(m) => m.cdci.video.clone(),
                _ => return mox_core::errors::input_error("expected a video descriptor"),
            };
            Ok(Box::new(PassthroughVideoCodec { descriptor, queue: std::collections::VecDeque::new() }))
        }
    }

    struct PassthroughAudioCodec {
        descriptor: mox_core::descriptor::AudioDescriptor,
        queue: std::collections::VecDeque<DataChunk>,
    }

    impl AudioCodec for PassthroughAudioCodec {
        fn descriptor(&self) -> &mox_core::descriptor::AudioDescriptor {
            &self.descriptor
        }
        fn container_descriptor(&self) -> Descriptor {
            Descriptor::Wave(WaveAudioDescriptor::new(
                self.descriptor.generic.sample_rate,
                self.descriptor.audio_sampling_rate,
                self.descriptor.channel_count,
                self.descriptor.quantization_bits,
            ))
        }
        fn compress(&mut self, audio: &AudioBuffer) -> Result<()> {
            self.queue.push_back(DataChunk::zeroed(audio.length() as usize));
            Ok(())
        }
        fn next_data(&mut self) -> Option<DataChunk> {
            self.queue.pop_front()
        }
        fn samples_in_frame(&self, frame_size: usize) -> u64 {
            frame_size as u64
        }
        fn decompress(&mut self, _data: &DataChunk) -> Result<()> {
            Ok(())
        }
        fn next_buffer(&mut self) -> Option<AudioBuffer> {
            None
        }
    }

    struct PassthroughAudioInfo;

    impl AudioCodecInfo for PassthroughAudioInfo {
        fn can_compress_type(&self, sample_type: SampleType) -> bool {
            sample_type == SampleType::S16
        }
        fn channel_capabilities(&self) -> AudioChannelCapabilities {
            AUDIO_CHANNELS_ANY
        }
        fn create_compressor(
            &self,
            header: &Header,
            channels: &AudioChannelList,
        ) -> Result<Box<dyn AudioCodec>> {
            Ok(Box::new(PassthroughAudioCodec {
                descriptor: mox_core::descriptor::AudioDescriptor::new(
                    header.frame_rate()?,
                    header.sample_rate()?,
                    channels.len() as u32,
                    16,
                ),
                queue: std::collections::VecDeque::new(),
            }))
        }
        fn create_decompressor(
            &self,
            descriptor: &Descriptor,
            _header: &mut Header,
            _channels: &mut AudioChannelList,
        ) -> Result<Box<dyn AudioCodec>> {
            let descriptor = match descriptor {
                Descriptor::Wave(w) => w.audio.clone(),
                Descriptor::Aes3(a) => a.wave.audio.clone(),
                _ => return mox_core::errors::input_error("expected an audio descriptor"),
            };
            Ok(Box::new(PassthroughAudioCodec { descriptor, queue: std::collections::VecDeque::new() }))
        }
    }

    fn video_only_header() -> Header {
        let mut channels = ChannelList::new();
        channels.insert("Y", Channel::new(PixelType::U8));

        Header::new(4, 2).unwrap().with_channels(channels).unwrap()
    }

    fn registry_with_stubs() -> CodecRegistry {
        let mut registry = CodecRegistry::new();
        registry.register_video_codec(VideoCompression::Uncompressed, Box::new(PassthroughVideoInfo));
        registry.register_audio_codec(AudioCompression::Pcm, Box::new(PassthroughAudioInfo));
        registry
    }

    #[test]
    fn push_frame_records_an_index_entry_and_pads_to_the_kag() {
        let header = video_only_header().with_video_compression(VideoCompression::Uncompressed).unwrap();
        let registry = registry_with_stubs();

        let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        out.push_frame(&frame).unwrap();

        assert_eq!(out.index.len(), 1);
        assert!(out.index.get(0).is_ok());
        assert_eq!(out.stream.size().unwrap() % out.kag as u64, 0);
    }

    #[test]
    fn finalize_is_idempotent() {
        let header = video_only_header().with_video_compression(VideoCompression::Uncompressed).unwrap();
        let registry = registry_with_stubs();
        let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        out.push_frame(&frame).unwrap();

        out.finalize().unwrap();
        let size_after_first = out.stream.size().unwrap();

        out.finalize().unwrap();
        assert_eq!(out.stream.size().unwrap(), size_after_first);
    }

    #[test]
    fn audio_cadence_ratio_matches_sample_over_frame_rate() {
        let ratio = audio_cadence_ratio(Rational::new(48000, 1).unwrap(), Rational::new(24, 1).unwrap()).unwrap();
        assert_eq!(ratio.round_multiply(1), 2000);
    }

    #[test]
    fn partition_video_channels_groups_rgb_and_lone_alpha() {
        let mut channels = ChannelList::new();
        for name in ["R", "G", "B"] {
            channels.insert(name, Channel::new(PixelType::U8));
        }
        channels.insert("matte.A", Channel::new(PixelType::U8));

        let caps = CHANNELS_RGB | CHANNELS_A;
        let groups = partition_video_channels(&channels, caps).unwrap();

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().any(|g| g.len() == 3));
        assert!(groups.iter().any(|g| g.len() == 1));
    }

    #[test]
    fn partition_video_channels_rejects_an_unsupported_shape() {
        let mut channels = ChannelList::new();
        channels.insert("Z", Channel::new(PixelType::U8));

        assert!(partition_video_channels(&channels, CHANNELS_RGB).is_err());
    }

    #[test]
    fn partition_video_channels_skips_grouping_when_any_is_declared() {
        let mut channels = ChannelList::new();
        channels.insert("whatever", Channel::new(PixelType::U8));

        let groups = partition_video_channels(&channels, CHANNELS_ANY).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 1);
    }

    #[test]
    fn partition_audio_channels_accepts_stereo_when_declared() {
        let mut channels = AudioChannelList::new();
        channels.insert("L", mox_core::channels::AudioChannel::new(SampleType::S16));
        channels.insert("R", mox_core::channels::AudioChannel::new(SampleType::S16));

        let groups = partition_audio_channels(&channels, AUDIO_CHANNELS_STEREO).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn push_audio_accumulates_until_a_full_edit_unit_is_available() {
        let mut channels = ChannelList::new();
        channels.insert("Y", Channel::new(PixelType::U8));
        let mut audio_channels = AudioChannelList::new();
        audio_channels.insert("L", mox_core::channels::AudioChannel::new(SampleType::S16));

        let header = Header::new(4, 2)
            .unwrap()
            .with_channels(channels)
            .unwrap()
            .with_video_compression(VideoCompression::Uncompressed)
            .unwrap()
            .with_audio_channels(audio_channels)
            .unwrap()
            .with_audio_compression(AudioCompression::Pcm)
            .unwrap()
            .with_frame_rate(Rational::new(24, 1).unwrap())
            .unwrap()
            .with_sample_rate(Rational::new(48000, 1).unwrap())
            .unwrap();

        let registry = registry_with_stubs();
        let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        out.push_frame(&frame).unwrap();

        let mut audio = AudioBuffer::new(1000);
        audio.insert("L", AudioSlice::allocate(SampleType::S16, 1000).unwrap());
        out.push_audio(&mut audio).unwrap();

        assert_eq!(out.audio_tracks[0].samples_flushed, 0);

        let mut more = AudioBuffer::new(1000);
        more.insert("L", AudioSlice::allocate(SampleType::S16, 1000).unwrap());
        out.push_audio(&mut more).unwrap();

        assert_eq!(out.audio_tracks[0].samples_flushed, 2000);
    }
}
