// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`InputFile`]: the OP1a-shaped demuxer.
//!
//! Construction jumps straight from the header partition to the footer (whose
//! `footerPartition` back-pointer the header partition carries once a file has been
//! finalized), reads the closed, authoritative metadata and index recorded there, then walks
//! the body exactly once to record every essence packet's offset against the track it belongs
//! to. `get_frame`/`read_audio` use those offsets for direct, non-sequential access.

use std::collections::VecDeque;

use log::warn;

use mox_core::audio::AudioBuffer;
use mox_core::channels::{AudioChannelList, ChannelList};
use mox_core::codec::{AudioCodec, CodecRegistry, VideoCodec};
use mox_core::data::DataChunk;
use mox_core::descriptor::{
    AudioDescriptor, Descriptor, Ul, VideoDescriptor, AES3_CONTAINER, BWF_CONTAINER, DIRAC_CONTAINER,
    DPX_CONTAINER, JPEG2000_CONTAINER, JPEG_CONTAINER, JPEG_LS_CONTAINER, MPEG2_CONTAINER,
    OPENEXR_CONTAINER, PNG_CONTAINER, UNCOMPRESSED_CDCI_CONTAINER, UNCOMPRESSED_RGBA_CONTAINER,
};
use mox_core::errors::{argument_error, input_error, Error, Result};
use mox_core::frame::FrameBuffer;
use mox_core::header::{AudioCompression, Header, VideoCompression};
use mox_core::units::Rational;

use crate::io::{IoStream, SeekFrom};
use crate::klv;
use crate::metadata::{FileMetadata, TrackKind};
use crate::partition::{PartitionKind, PartitionPack};
use crate::track::TrackNumber;
use crate::IndexTable;

struct InputVideoTrack {
    codec: Box<dyn VideoCodec>,
    track_number: TrackNumber,
    /// `offsets[n]` is the absolute byte offset of this track's edit unit `n`.
    offsets: Vec<u64>,
}

struct InputAudioTrack {
    codec: Box<dyn AudioCodec>,
    track_number: TrackNumber,
    channels: Vec<String>,
    /// Absolute byte offset of every essence packet belonging to this track, in file order.
    offsets: Vec<u64>,
    /// How many of `offsets` have already been handed to the codec.
    next_offset: usize,
    /// Decoded buffers the codec has produced but [`InputFile::read_audio`] hasn't fully drained.
    pending: VecDeque<AudioBuffer>,
    end_of_stream_sent: bool,
}

/// The demuxer half of the container: opens a finalized file, exposes its combined [`Header`],
/// and serves frames/audio by edit unit or sample count.
pub struct InputFile {
    stream: Box<dyn IoStream>,
    header: Header,
    video_tracks: Vec<InputVideoTrack>,
    audio_tracks: Vec<InputAudioTrack>,
    frame_rate: Rational,
    frame_count: u64,
    audio_sample_count: u64,
}

impl InputFile {
    /// Parses the master partition, discovers every track, instantiates a decompressor for each
    /// from `registry`, and scans the body for random-access offsets. Fails if the stream isn't
    /// a finalized `mox-mxf` file, or if `registry` has no codec registered for a track's
    /// compression scheme.
    pub fn open(mut stream: Box<dyn IoStream>, registry: &CodecRegistry) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let header_pack = PartitionPack::read(&mut *stream)?;
        if header_pack.kind != PartitionKind::Header {
            return input_error("file does not begin with a header partition");
        }
        if header_pack.footer_partition == 0 {
            return input_error("file has no footer partition; it was never finalized");
        }

        stream.seek(SeekFrom::Start(header_pack.footer_partition))?;
        let footer_pack = PartitionPack::read(&mut *stream)?;
        if footer_pack.kind != PartitionKind::Footer {
            return input_error("footerPartition does not point at a footer partition pack");
        }
        skip_filler(&mut *stream)?;

        let metadata = FileMetadata::read(&mut *stream)?;
        let index = IndexTable::read(&mut *stream)?;

        let body_partition_offset = footer_pack.previous_partition;
        stream.seek(SeekFrom::Start(body_partition_offset))?;
        let body_pack = PartitionPack::read(&mut *stream)?;
        if body_pack.kind != PartitionKind::Body {
            return input_error("previousPartition does not point at a body partition pack");
        }
        skip_filler(&mut *stream)?;

        let mut header = build_header(&metadata)?;

        let mut video_tracks = Vec::new();
        let mut audio_tracks = Vec::new();
        let mut combined_channels = ChannelList::new();
        let mut combined_audio_channels = AudioChannelList::new();

        for track in &metadata.tracks {
            match track.kind {
                TrackKind::Timecode => continue,
                TrackKind::Picture => {
                    let descriptor = track
                        .descriptor
                        .as_ref()
                        .ok_or_else(|| Error::Input("picture track has no descriptor".into()))?;
                    let video_descriptor = video_descriptor_of(descriptor)?;
                    let compression = video_compression_for_container(video_descriptor.generic.essence_container)?;
                    let info = registry.video_codec_info(compression)?;

                    let mut channels = ChannelList::new();
                    let codec = info.create_decompressor(descriptor, &mut header, &mut channels)?;
                    for (name, channel) in channels.iter() {
                        combined_channels.insert(name, *channel);
                    }

                    video_tracks.push(InputVideoTrack {
                        codec,
                        track_number: track.track_number,
                        offsets: Vec::new(),
                    });
                }
                TrackKind::Sound => {
                    let descriptor = track
                        .descriptor
                        .as_ref()
                        .ok_or_else(|| Error::Input("sound track has no descriptor".into()))?;
                    let audio_descriptor = audio_descriptor_of(descriptor)?;
                    let compression = audio_compression_for_container(audio_descriptor.generic.essence_container)?;
                    let info = registry.audio_codec_info(compression)?;

                    let mut channels = AudioChannelList::new();
                    let codec = info.create_decompressor(descriptor, &mut header, &mut channels)?;
                    let names: Vec<String> = channels.iter().map(|(name, _)| name.to_string()).collect();
                    for (name, channel) in channels.iter() {
                        combined_audio_channels.insert(name, *channel);
                    }

                    audio_tracks.push(InputAudioTrack {
                        codec,
                        track_number: track.track_number,
                        channels: names,
                        offsets: Vec::new(),
                        next_offset: 0,
                        pending: VecDeque::new(),
                        end_of_stream_sent: false,
                    });
                }
            }
        }

        header.set_channels(combined_channels)?;
        header.set_audio_channels(combined_audio_channels)?;

        let frame_rate = metadata
            .tracks
            .iter()
            .find(|t| t.kind == TrackKind::Picture)
            .map(|t| t.edit_rate)
            .unwrap_or(header.frame_rate()?);

        validate_edit_rates(&metadata, frame_rate)?;

        let frame_count = metadata.tracks.iter().find(|t| t.kind == TrackKind::Picture).map(|t| t.duration).unwrap_or(0);
        let audio_sample_count =
            metadata.tracks.iter().find(|t| t.kind == TrackKind::Sound).map(|t| t.duration).unwrap_or(0);

        header.set_duration(frame_count.min(i32::MAX as u64) as i32)?;
        header.set_audio_duration(audio_sample_count.min(i64::MAX as u64) as i64)?;

        let mut file = InputFile {
            stream,
            header,
            video_tracks,
            audio_tracks,
            frame_rate,
            frame_count,
            audio_sample_count,
        };

        file.scan_body(footer_pack.this_partition)?;
        file.apply_index_hint(&index)?;

        Ok(file)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn audio_sample_count(&self) -> u64 {
        self.audio_sample_count
    }

    pub fn frame_rate(&self) -> Rational {
        self.frame_rate
    }

    /// Decodes edit unit `edit_unit` on every video track and merges the results into `frame`,
    /// without disturbing channels a track doesn't carry (`fill_missing = false` on every merge,
    /// so one track's disjoint channel subset never zeroes out another's).
    pub fn get_frame(&mut self, edit_unit: u64, frame: &mut FrameBuffer) -> Result<()> {
        if self.video_tracks.is_empty() {
            return argument_error("this file declares no video tracks");
        }

        for track in &mut self.video_tracks {
            let offset = *track.offsets.get(edit_unit as usize).ok_or_else(|| {
                Error::Input(format!(
                    "edit unit {edit_unit} is out of range for track {:?} ({} recorded)",
                    track.track_number,
                    track.offsets.len()
                ))
            })?;

            self.stream.seek(SeekFrom::Start(offset))?;
            let (_, value) = klv::read_klv(&mut *self.stream)?;
            track.codec.decompress(&DataChunk::from_vec(value))?;

            while let Some(decoded) = track.codec.next_frame() {
                frame.copy_from_frame(&decoded, false)?;
            }
        }

        Ok(())
    }

    /// Reads up to `samples` (or, if `0`, as many as `audio`'s own remaining room allows) per
    /// audio track, merging each track's channels into `audio` and returning the number of
    /// samples actually delivered — the minimum delivered across tracks, so every channel in
    /// `audio` advances by the same amount.
    pub fn read_audio(&mut self, samples: u64, audio: &mut AudioBuffer) -> Result<u64> {
        if self.audio_tracks.is_empty() {
            return argument_error("this file declares no audio tracks");
        }

        let want = if samples == 0 { audio.remaining() } else { samples };
        if want == 0 {
            return Ok(0);
        }

        let mut delivered = u64::MAX;

        for track in &mut self.audio_tracks {
            feed_track_until(&mut *self.stream, track, want)?;
            let got = drain_track_into(track, audio, want)?;
            delivered = delivered.min(got);
        }

        Ok(if delivered == u64::MAX { 0 } else { delivered })
    }

    /// Walks every essence packet in the body exactly once, recording its absolute offset
    /// against whichever track's key it carries.
    fn scan_body(&mut self, body_end: u64) -> Result<()> {
        loop {
            let offset = self.stream.tell()?;
            if offset >= body_end {
                break;
            }

            let key = klv::read_key(&mut *self.stream)?;
            let length = klv::read_ber_length(&mut *self.stream)?;

            if key == klv::FILLER_KEY {
                self.stream.seek(SeekFrom::Current(length as i64))?;
                continue;
            }

            let track_number = match TrackNumber::from_essence_key(key) {
                Ok(n) => n,
                Err(_) => {
                    warn!("skipping unrecognized essence key at offset {offset}");
                    self.stream.seek(SeekFrom::Current(length as i64))?;
                    continue;
                }
            };

            if let Some(track) = self.video_tracks.iter_mut().find(|t| t.track_number == track_number) {
                track.offsets.push(offset);
            }
            else if let Some(track) = self.audio_tracks.iter_mut().find(|t| t.track_number == track_number) {
                track.offsets.push(offset);
            }
            else {
                warn!("essence packet for an undeclared track {track_number:?} at offset {offset}");
            }

            self.stream.seek(SeekFrom::Current(length as i64))?;
        }

        Ok(())
    }

    /// Sanity-checks the recorded index table against the body scan: the index's first entry
    /// should agree with the first video track's first recorded offset. A mismatch doesn't fail
    /// construction — `get_frame` never consults the index directly, only the per-track offsets
    /// from [`InputFile::scan_body`] — but is worth a warning since it means the file was
    /// produced by something other than [`crate::writer::OutputFile`].
    fn apply_index_hint(&self, index: &IndexTable) -> Result<()> {
        if index.is_empty() {
            return Ok(());
        }

        if let Some(track) = self.video_tracks.first() {
            if let (Some(&first_offset), Ok(indexed)) = (track.offsets.first(), index.get(0)) {
                if first_offset != indexed {
                    warn!(
                        "index table's first entry ({indexed}) disagrees with the body scan ({first_offset})"
                    );
                }
            }
        }

        Ok(())
    }
}

fn skip_filler(stream: &mut dyn IoStream) -> Result<()> {
    let pos = stream.tell()?;
    let key = klv::read_key(stream)?;

    if key == klv::FILLER_KEY {
        let length = klv::read_ber_length(stream)?;
        stream.seek(SeekFrom::Current(length as i64))?;
    }
    else {
        stream.seek(SeekFrom::Start(pos))?;
    }

    Ok(())
}

fn video_descriptor_of(descriptor: &Descriptor) -> Result<VideoDescriptor> {
    match descriptor {
        Descriptor::Cdci(c) => Ok(c.video.clone()),
        Descriptor::Rgba(r) => Ok(r.video.clone()),
        Descriptor::Mpeg(m) => Ok(m.cdci.video.clone()),
        Descriptor::Wave(_) | Descriptor::Aes3(_) => input_error("expected a video descriptor, found an audio one"),
    }
}

fn audio_descriptor_of(descriptor: &Descriptor) -> Result<AudioDescriptor> {
    match descriptor {
        Descriptor::Wave(w) => Ok(w.audio.clone()),
        Descriptor::Aes3(a) => Ok(a.wave.audio.clone()),
        Descriptor::Cdci(_) | Descriptor::Rgba(_) | Descriptor::Mpeg(_) => {
            input_error("expected an audio descriptor, found a video one")
        }
    }
}

/// Recovers the compression scheme a video track was written with from its descriptor's
/// essence-container label, needed because [`CodecRegistry`] is keyed by [`VideoCompression`]
/// rather than by [`Ul`], and a track's on-disk descriptor only carries the label.
fn video_compression_for_container(container: Ul) -> Result<VideoCompression> {
    match container {
        UNCOMPRESSED_CDCI_CONTAINER | UNCOMPRESSED_RGBA_CONTAINER => Ok(VideoCompression::Uncompressed),
        PNG_CONTAINER => Ok(VideoCompression::Png),
        JPEG_CONTAINER => Ok(VideoCompression::Jpeg),
        JPEG2000_CONTAINER => Ok(VideoCompression::Jpeg2000),
        JPEG_LS_CONTAINER => Ok(VideoCompression::JpegLs),
        DPX_CONTAINER => Ok(VideoCompression::Dpx),
        OPENEXR_CONTAINER => Ok(VideoCompression::OpenExr),
        DIRAC_CONTAINER => Ok(VideoCompression::Dirac),
        MPEG2_CONTAINER => Ok(VideoCompression::Mpeg),
        other => input_error(format!("unrecognized video essence container label {:02x?}", other.bytes())),
    }
}

fn audio_compression_for_container(container: Ul) -> Result<AudioCompression> {
    match container {
        BWF_CONTAINER | AES3_CONTAINER => Ok(AudioCompression::Pcm),
        other => input_error(format!("unrecognized audio essence container label {:02x?}", other.bytes())),
    }
}

/// Seeds a [`Header`] from the first video track's stored geometry (or a 1x1 placeholder for an
/// audio-only file), leaving channel lists and compression attributes for the caller to fill in
/// once every track's codec has been instantiated.
fn build_header(metadata: &FileMetadata) -> Result<Header> {
    let video = metadata.tracks.iter().find(|t| t.kind == TrackKind::Picture);

    let (width, height, stored, display, sampled) = match video.and_then(|t| t.descriptor.as_ref()) {
        Some(descriptor) => {
            let v = video_descriptor_of(descriptor)?;
            (v.width().max(1) as i32, v.height().max(1) as i32, v.stored, v.display, v.sampled)
        }
        None => {
            let window = mox_core::units::Box2i::from_dimensions(1, 1);
            (1, 1, window, window, window)
        }
    };

    let mut header = Header::new(width, height)?;
    header.insert("dataWindow", mox_core::header::Attribute::Box2i(stored))?;
    header.insert("displayWindow", mox_core::header::Attribute::Box2i(display))?;
    header.insert("sampledWindow", mox_core::header::Attribute::Box2i(sampled))?;

    if let Some(track) = video {
        header = header.with_frame_rate(track.edit_rate)?;
    }
    if let Some(track) = metadata.tracks.iter().find(|t| t.kind == TrackKind::Sound) {
        header = header.with_sample_rate(track.edit_rate)?;
    }

    Ok(header)
}

/// Every picture track must share one edit rate, and every sound track another; a file with
/// tracks disagreeing on either was not produced as a coherent single-frame-rate program.
fn validate_edit_rates(metadata: &FileMetadata, frame_rate: Rational) -> Result<()> {
    for track in &metadata.tracks {
        if track.kind == TrackKind::Picture && track.edit_rate != frame_rate {
            return input_error("picture tracks disagree on edit rate");
        }
    }

    let sample_rate = metadata.tracks.iter().find(|t| t.kind == TrackKind::Sound).map(|t| t.edit_rate);
    if let Some(sample_rate) = sample_rate {
        for track in &metadata.tracks {
            if track.kind == TrackKind::Sound && track.edit_rate != sample_rate {
                return input_error("sound tracks disagree on edit rate");
            }
        }
    }

    Ok(())
}

/// Decodes packets from `track`'s recorded offsets until its pending buffers hold at least
/// `want` samples, or its offsets are exhausted (in which case its codec is flushed once).
fn feed_track_until(stream: &mut dyn IoStream, track: &mut InputAudioTrack, want: u64) -> Result<()> {
    let mut pending_total: u64 = track.pending.iter().map(|b| b.remaining()).sum();

    while pending_total < want && track.next_offset < track.offsets.len() {
        let offset = track.offsets[track.next_offset];
        track.next_offset += 1;

        stream.seek(SeekFrom::Start(offset))?;
        let (_, value) = klv::read_klv(stream)?;
        track.codec.decompress(&DataChunk::from_vec(value))?;

        while let Some(buffer) = track.codec.next_buffer() {
            pending_total += buffer.remaining();
            track.pending.push_back(buffer);
        }
    }

    if pending_total < want && track.next_offset >= track.offsets.len() && !track.end_of_stream_sent {
        track.end_of_stream_sent = true;
        track.codec.end_of_stream()?;
        while let Some(buffer) = track.codec.next_buffer() {
            track.pending.push_back(buffer);
        }
    }

    Ok(())
}

/// Drains up to `want` samples of `track`'s pending decoded buffers into `dest`, advancing only
/// the channels `track` actually carries (one [`AudioBuffer::fast_forward_named`] call per
/// channel) rather than [`AudioBuffer::copy_from_buffer`], which would advance every channel in
/// `dest` — including ones other tracks haven't written to yet this call.
fn drain_track_into(track: &mut InputAudioTrack, dest: &mut AudioBuffer, want: u64) -> Result<u64> {
    let mut delivered = 0u64;

    while delivered < want {
        let Some(front) = track.pending.front_mut() else { break };
        let available = front.remaining();
        if available == 0 {
            track.pending.pop_front();
            continue;
        }

        let take = available.min(want - delivered);

        for name in &track.channels {
            let (Ok(src), Ok(dst)) = (front.playhead_slice(name), dest.playhead_slice(name)) else {
                continue;
            };

            for i in 0..take {
                dst.set(i, src.get(i)?)?;
            }
            dest.fast_forward_named(name, take)?;
        }

        front.fast_forward(take)?;
        delivered += take;
    }

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque as Deque;

    use mox_core::audio::AudioSlice;
    use mox_core::channels::{AudioChannel, Channel};
    use mox_core::codec::{
        AudioChannelCapabilities, AudioCodecInfo, ChannelCapabilities, VideoCodecInfo, AUDIO_CHANNELS_ALL,
        CHANNELS_ALL,
    };
    use mox_core::descriptor::{CdciDescriptor, WaveAudioDescriptor};
    use mox_core::frame::Slice;
    use mox_core::pixel::PixelType;
    use mox_core::sample::SampleType;

    use crate::io::MemoryStream;
    use crate::writer::OutputFile;

    struct PassthroughVideoCodec {
        descriptor: VideoDescriptor,
        width: i32,
        height: i32,
        pending: Deque<Vec<u8>>,
        decoded: Deque<FrameBuffer>,
    }

    impl VideoCodec for PassthroughVideoCodec {
        fn descriptor(&self) -> &VideoDescriptor {
            &self.descriptor
        }
        fn container_descriptor(&self) -> Descriptor {
            Descriptor::Cdci(CdciDescriptor::new(self.descriptor.generic.sample_rate, self.width as u32, self.height as u32, 1, 1))
        }
        fn compress(&mut self, frame: &FrameBuffer) -> Result<()> {
            let (_, slice) = frame.iter().next().expect("at least one channel");
            let mut bytes = Vec::with_capacity((self.width * self.height) as usize);
            for y in 0..self.height {
                for x in 0..self.width {
                    bytes.push(slice.get(x, y)? as u8);
                }
            }
            self.pending.push_back(bytes);
            Ok(())
        }
        fn next_data(&mut self) -> Option<DataChunk> {
            self.pending.pop_front().map(DataChunk::from_vec)
        }
        fn decompress(&mut self, data: &DataChunk) -> Result<()> {
            let bytes = data.to_vec();
            let mut frame = FrameBuffer::with_dimensions(self.width, self.height)?;
            let slice = Slice::allocate(PixelType::U8, self.width, self.height)?;
            for y in 0..self.height {
                for x in 0..self.width {
                    let value = bytes[(y * self.width + x) as usize] as f64;
                    slice.set(x, y, value)?;
                }
            }
            frame.insert("Y", slice);
            self.decoded.push_back(frame);
            Ok(())
        }
        fn next_frame(&mut self) -> Option<FrameBuffer> {
            self.decoded.pop_front()
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
        fn create_compressor(&self, header: &Header, _channels: &ChannelList) -> Result<Box<dyn VideoCodec>> {
            Ok(Box::new(PassthroughVideoCodec {
                descriptor: VideoDescriptor::new(header.frame_rate()?, header.width()? as u32, header.height()? as u32),
                width: header.width()?,
                height: header.height()?,
                pending: Deque::new(),
                decoded: Deque::new(),
            }))
        }
        fn create_decompressor(
            &self,
            descriptor: &Descriptor,
            _header: &mut Header,
            channels: &mut ChannelList,
        ) -> Result<Box<dyn VideoCodec>> {
            let descriptor = match descriptor {
                Descriptor::Cdci(c) => c.video.clone(),
                _ => return mox_core::errors::input_error("expected a CDCI descriptor"),
            };
            channels.insert("Y", Channel::new(PixelType::U8));
            Ok(Box::new(PassthroughVideoCodec {
                width: descriptor.width() as i32,
                height: descriptor.height() as i32,
                descriptor,
                pending: Deque::new(),
                decoded: Deque::new(),
            }))
        }
    }

    struct PassthroughAudioCodec {
        descriptor: AudioDescriptor,
        channels: usize,
        pending: Deque<Vec<u8>>,
        decoded: Deque<AudioBuffer>,
    }

    impl AudioCodec for PassthroughAudioCodec {
        fn descriptor(&self) -> &AudioDescriptor {
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
            let count = audio.length() as usize;
            let mut bytes = Vec::with_capacity(count * self.channels);
            for (_, slice) in audio.iter() {
                for i in 0..count as u64 {
                    let v = slice.get(i)?;
                    bytes.push(((v.clamp(-1.0, 1.0) * 127.0) + 128.0) as u8);
                }
            }
            self.pending.push_back(bytes);
            Ok(())
        }
        fn next_data(&mut self) -> Option<DataChunk> {
            self.pending.pop_front().map(DataChunk::from_vec)
        }
        fn samples_in_frame(&self, frame_size: usize) -> u64 {
            (frame_size / self.channels.max(1)) as u64
        }
        fn decompress(&mut self, data: &DataChunk) -> Result<()> {
            let bytes = data.to_vec();
            let count = (bytes.len() / self.channels.max(1)) as u64;
            let mut buffer = AudioBuffer::new(count);
            for c in 0..self.channels {
                let slice = AudioSlice::allocate(SampleType::S16, count)?;
                for i in 0..count {
                    let raw = bytes[(c as u64 * count + i) as usize];
                    slice.set(i, (raw as f64 - 128.0) / 127.0)?;
                }
                buffer.insert(format!("ch{c}"), slice);
            }
            self.decoded.push_back(buffer);
            Ok(())
        }
        fn next_buffer(&mut self) -> Option<AudioBuffer> {
            self.decoded.pop_front()
        }
    }

    struct PassthroughAudioInfo;

    impl AudioCodecInfo for PassthroughAudioInfo {
        fn can_compress_type(&self, sample_type: SampleType) -> bool {
            sample_type == SampleType::S16
        }
        fn channel_capabilities(&self) -> AudioChannelCapabilities {
            AUDIO_CHANNELS_ALL
        }
        fn create_compressor(&self, header: &Header, channels: &AudioChannelList) -> Result<Box<dyn AudioCodec>> {
            Ok(Box::new(PassthroughAudioCodec {
                descriptor: AudioDescriptor::new(header.frame_rate()?, header.sample_rate()?, channels.len() as u32, 16),
                channels: channels.len(),
                pending: Deque::new(),
                decoded: Deque::new(),
            }))
        }
        fn create_decompressor(
            &self,
            descriptor: &Descriptor,
            _header: &mut Header,
            channels: &mut AudioChannelList,
        ) -> Result<Box<dyn AudioCodec>> {
            let descriptor = match descriptor {
                Descriptor::Wave(w) => w.audio.clone(),
                _ => return mox_core::errors::input_error("expected a wave audio descriptor"),
            };
            for c in 0..descriptor.channel_count {
                channels.insert(format!("ch{c}"), AudioChannel::new(SampleType::S16));
            }
            Ok(Box::new(PassthroughAudioCodec {
                channels: descriptor.channel_count as usize,
                descriptor,
                pending: Deque::new(),
                decoded: Deque::new(),
            }))
        }
    }

    fn registry_with_stubs() -> CodecRegistry {
        let mut registry = CodecRegistry::new();
        registry.register_video_codec(VideoCompression::Uncompressed, Box::new(PassthroughVideoInfo));
        registry.register_audio_codec(AudioCompression::Pcm, Box::new(PassthroughAudioInfo));
        registry
    }

    fn video_header() -> Header {
        let mut channels = ChannelList::new();
        channels.insert("Y", Channel::new(PixelType::U8));

        Header::new(4, 2)
            .unwrap()
            .with_channels(channels)
            .unwrap()
            .with_video_compression(VideoCompression::Uncompressed)
            .unwrap()
    }

    #[test]
    fn opens_a_video_only_file_and_reads_every_frame() {
        let registry = registry_with_stubs();
        let header = video_header();

        let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();
        for fill in [10u8, 20u8, 30u8] {
            let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
            let slice = Slice::allocate(PixelType::U8, 4, 2).unwrap();
            for y in 0..2 {
                for x in 0..4 {
                    slice.set(x, y, fill as f64).unwrap();
                }
            }
            frame.insert("Y", slice);
            out.push_frame(&frame).unwrap();
        }
        out.finalize().unwrap();
        let bytes = out_into_bytes(out);

        let mut input = InputFile::open(Box::new(MemoryStream::from(bytes)), &registry).unwrap();
        assert_eq!(input.frame_count(), 3);
        assert_eq!(input.header().width().unwrap(), 4);

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());

        input.get_frame(1, &mut frame).unwrap();
        assert_eq!(frame.find_slice("Y").unwrap().get(0, 0).unwrap(), 20.0);

        input.get_frame(0, &mut frame).unwrap();
        assert_eq!(frame.find_slice("Y").unwrap().get(0, 0).unwrap(), 10.0);
    }

    #[test]
    fn out_of_range_edit_unit_is_an_input_error() {
        let registry = registry_with_stubs();
        let header = video_header();
        let mut out = OutputFile::new(Box::new(MemoryStream::new()), header, &registry).unwrap();

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        out.push_frame(&frame).unwrap();
        out.finalize().unwrap();
        let bytes = out_into_bytes(out);

        let mut input = InputFile::open(Box::new(MemoryStream::from(bytes)), &registry).unwrap();
        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("Y", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        assert!(input.get_frame(5, &mut frame).is_err());
    }

    #[test]
    fn reads_audio_back_in_smaller_chunks_than_it_was_written() {
        let mut channels = ChannelList::new();
        channels.insert("Y", Channel::new(PixelType::U8));
        let mut audio_channels = AudioChannelList::new();
        audio_channels.insert("ch0", AudioChannel::new(SampleType::S16));

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

        let mut audio = AudioBuffer::new(2000);
        let slice = AudioSlice::allocate(SampleType::S16, 2000).unwrap();
        for i in 0..2000u64 {
            slice.set(i, ((i % 200) as f64 / 100.0) - 1.0).unwrap();
        }
        audio.insert("ch0", slice);
        out.push_audio(&mut audio).unwrap();

        out.finalize().unwrap();
        let bytes = out_into_bytes(out);

        let mut input = InputFile::open(Box::new(MemoryStream::from(bytes)), &registry).unwrap();
        assert_eq!(input.audio_sample_count(), 2000);

        let mut total = 0u64;
        loop {
            let mut chunk = AudioBuffer::new(700);
            chunk.insert("ch0", AudioSlice::allocate(SampleType::S16, 700).unwrap());
            let got = input.read_audio(700, &mut chunk).unwrap();
            total += got;
            if got < 700 {
                break;
            }
        }
        assert_eq!(total, 2000);
    }

    fn out_into_bytes(mut out: OutputFile) -> Vec<u8> {
        out.finalize().unwrap();
        out.into_stream_bytes()
    }

    #[test]
    fn video_compression_mapping_covers_every_known_container() {
        assert_eq!(video_compression_for_container(UNCOMPRESSED_CDCI_CONTAINER).unwrap(), VideoCompression::Uncompressed);
        assert_eq!(video_compression_for_container(PNG_CONTAINER).unwrap(), VideoCompression::Png);
        assert_eq!(video_compression_for_container(MPEG2_CONTAINER).unwrap(), VideoCompression::Mpeg);
        assert!(video_compression_for_container(Ul::new([0xff; 16])).is_err());
    }

    #[test]
    fn audio_compression_mapping_covers_every_known_container() {
        assert_eq!(audio_compression_for_container(BWF_CONTAINER).unwrap(), AudioCompression::Pcm);
        assert_eq!(audio_compression_for_container(AES3_CONTAINER).unwrap(), AudioCompression::Pcm);
        assert!(audio_compression_for_container(Ul::new([0xff; 16])).is_err());
    }
}
