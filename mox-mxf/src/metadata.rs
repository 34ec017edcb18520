// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The file's structural metadata: its tracks, each track's descriptor, edit rate, origin and
//! duration.
//!
//! SMPTE 377M expresses this as a closure of interconnected metadata sets (packages, track
//! objects, file descriptors) each its own local-set-keyed KLV object. `mox-mxf` instead encodes
//! one flat, self-describing record per track directly: faithful to the *data* SMPTE 377M
//! carries, not to the metadata-set object graph it carries it in (see DESIGN.md).

use mox_core::descriptor::{
    Aes3Descriptor, CdciDescriptor, ChannelStatusMode, CodedContentType, ColorSiting, Descriptor,
    FrameLayout, GenericDescriptor, MpegDescriptor, RgbaDescriptor, RgbaLayoutItem, Ul,
    VideoDescriptor, WaveAudioDescriptor,
};
use mox_core::descriptor::AudioDescriptor;
use mox_core::errors::{input_error, Result};
use mox_core::units::{Box2i, Rational, V2i};

use crate::io::{self, IoStream, MemoryStream};
use crate::klv;
use crate::track::TrackNumber;

const METADATA_KEY: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x20, 0x00, 0x00,
]);

/// Which of the three roles a track plays, mirroring the data model's `kind` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackKind {
    Timecode,
    Picture,
    Sound,
}

/// One track's structural metadata, as recorded in the file's master partition.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackMetadata {
    pub track_number: TrackNumber,
    pub kind: TrackKind,
    pub edit_rate: Rational,
    pub origin: i64,
    pub duration: u64,
    /// `None` only for the timecode track, which carries no essence descriptor.
    pub descriptor: Option<Descriptor>,
}

/// The full set of tracks declared by the file, as found in (or written to) its master
/// partition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileMetadata {
    pub tracks: Vec<TrackMetadata>,
}

impl FileMetadata {
    pub fn new() -> Self {
        FileMetadata::default()
    }

    pub fn write(&self, stream: &mut dyn IoStream) -> Result<u64> {
        let mut body = Vec::new();
        push_u32(&mut body, self.tracks.len() as u32);

        for track in &self.tracks {
            push_u32(&mut body, track.track_number.to_u32());
            push_u8(&mut body, track_kind_tag(track.kind));
            push_rational(&mut body, track.edit_rate);
            push_i64(&mut body, track.origin);
            push_u64(&mut body, track.duration);

            match &track.descriptor {
                None => push_u8(&mut body, 0),
                Some(descriptor) => {
                    push_u8(&mut body, 1);
                    push_descriptor(&mut body, descriptor);
                }
            }
        }

        klv::write_klv(stream, METADATA_KEY, &body)
    }

    pub fn read(stream: &mut dyn IoStream) -> Result<Self> {
        let (key, value) = klv::read_klv(stream)?;
        if key != METADATA_KEY {
            return input_error("not a metadata record key");
        }

        let mut cursor = MemoryStream::from(value);
        let count = io::read_u32(&mut cursor)?;

        let mut tracks = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let track_number = TrackNumber::from_u32(io::read_u32(&mut cursor)?);
            let kind = track_kind_from_tag(io::read_u8(&mut cursor)?)?;
            let edit_rate = read_rational(&mut cursor)?;
            let origin = read_i64(&mut cursor)?;
            let duration = io::read_u64(&mut cursor)?;

            let descriptor = match io::read_u8(&mut cursor)? {
                0 => None,
                1 => Some(read_descriptor(&mut cursor)?),
                other => return input_error(format!("unrecognized descriptor presence tag {other}")),
            };

            tracks.push(TrackMetadata { track_number, kind, edit_rate, origin, duration, descriptor });
        }

        Ok(FileMetadata { tracks })
    }
}

fn track_kind_tag(kind: TrackKind) -> u8 {
    match kind {
        TrackKind::Timecode => 0,
        TrackKind::Picture => 1,
        TrackKind::Sound => 2,
    }
}

fn track_kind_from_tag(tag: u8) -> Result<TrackKind> {
    match tag {
        0 => Ok(TrackKind::Timecode),
        1 => Ok(TrackKind::Picture),
        2 => Ok(TrackKind::Sound),
        other => input_error(format!("unrecognized track kind tag {other}")),
    }
}

// --- Primitive encode helpers (append to a plain byte buffer). ---

fn push_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_bool(buf: &mut Vec<u8>, v: bool) {
    push_u8(buf, v as u8);
}

fn push_rational(buf: &mut Vec<u8>, r: Rational) {
    push_i32(buf, r.numerator());
    push_i32(buf, r.denominator());
}

fn push_box2i(buf: &mut Vec<u8>, b: Box2i) {
    push_i32(buf, b.min.x);
    push_i32(buf, b.min.y);
    push_i32(buf, b.max.x);
    push_i32(buf, b.max.y);
}

fn push_ul(buf: &mut Vec<u8>, ul: Ul) {
    buf.extend_from_slice(ul.bytes());
}

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    push_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

// --- Primitive decode helpers (read from a cursor implementing `IoStream`). ---

fn read_i32(stream: &mut dyn IoStream) -> Result<i32> {
    Ok(io::read_u32(stream)? as i32)
}

fn read_i64(stream: &mut dyn IoStream) -> Result<i64> {
    Ok(io::read_u64(stream)? as i64)
}

fn read_bool(stream: &mut dyn IoStream) -> Result<bool> {
    Ok(io::read_u8(stream)? != 0)
}

fn read_rational(stream: &mut dyn IoStream) -> Result<Rational> {
    let numerator = read_i32(stream)?;
    let denominator = read_i32(stream)?;
    Rational::new(numerator, denominator)
}

fn read_box2i(stream: &mut dyn IoStream) -> Result<Box2i> {
    let min = V2i::new(read_i32(stream)?, read_i32(stream)?);
    let max = V2i::new(read_i32(stream)?, read_i32(stream)?);
    Ok(Box2i::new(min, max))
}

fn read_ul(stream: &mut dyn IoStream) -> Result<Ul> {
    let mut bytes = [0u8; 16];
    stream.read_exact(&mut bytes)?;
    Ok(Ul::new(bytes))
}

fn read_bytes(stream: &mut dyn IoStream) -> Result<Vec<u8>> {
    let len = io::read_u32(stream)? as usize;
    let mut bytes = vec![0u8; len];
    stream.read_exact(&mut bytes)?;
    Ok(bytes)
}

// --- Descriptor encode/decode. ---

fn descriptor_tag(d: &Descriptor) -> u8 {
    match d {
        Descriptor::Cdci(_) => 0,
        Descriptor::Rgba(_) => 1,
        Descriptor::Mpeg(_) => 2,
        Descriptor::Wave(_) => 3,
        Descriptor::Aes3(_) => 4,
    }
}

fn push_generic(buf: &mut Vec<u8>, g: &GenericDescriptor) {
    push_rational(buf, g.sample_rate);
    push_u64(buf, g.container_duration);
    push_ul(buf, g.essence_container);
    push_ul(buf, g.codec);
}

fn read_generic(stream: &mut dyn IoStream) -> Result<GenericDescriptor> {
    let sample_rate = read_rational(stream)?;
    let container_duration = io::read_u64(stream)?;
    let essence_container = read_ul(stream)?;
    let codec = read_ul(stream)?;
    Ok(GenericDescriptor { sample_rate, container_duration, essence_container, codec })
}

fn frame_layout_tag(f: FrameLayout) -> u8 {
    match f {
        FrameLayout::FullFrame => 0,
        FrameLayout::SeparateFields => 1,
        FrameLayout::OneField => 2,
        FrameLayout::MixedFields => 3,
        FrameLayout::SegmentedFrame => 4,
        FrameLayout::Unknown => 5,
    }
}

fn frame_layout_from_tag(tag: u8) -> FrameLayout {
    match tag {
        0 => FrameLayout::FullFrame,
        1 => FrameLayout::SeparateFields,
        2 => FrameLayout::OneField,
        3 => FrameLayout::MixedFields,
        4 => FrameLayout::SegmentedFrame,
        _ => FrameLayout::Unknown,
    }
}

fn push_video(buf: &mut Vec<u8>, v: &VideoDescriptor) {
    push_generic(buf, &v.generic);
    push_u8(buf, frame_layout_tag(v.frame_layout));
    push_box2i(buf, v.stored);
    push_box2i(buf, v.sampled);
    push_box2i(buf, v.display);
    push_rational(buf, v.aspect_ratio);
    push_ul(buf, v.picture_essence_coding);

    match v.capture_gamma {
        None => push_u8(buf, 0),
        Some(ul) => {
            push_u8(buf, 1);
            push_ul(buf, ul);
        }
    }

    push_bool(buf, v.alpha_transparency);
    push_u32(buf, v.image_alignment_offset);
    push_u32(buf, v.image_start_offset);
    push_u32(buf, v.image_end_offset);
}

fn read_video(stream: &mut dyn IoStream) -> Result<VideoDescriptor> {
    let generic = read_generic(stream)?;
    let frame_layout = frame_layout_from_tag(io::read_u8(stream)?);
    let stored = read_box2i(stream)?;
    let sampled = read_box2i(stream)?;
    let display = read_box2i(stream)?;
    let aspect_ratio = read_rational(stream)?;
    let picture_essence_coding = read_ul(stream)?;

    let capture_gamma = match io::read_u8(stream)? {
        0 => None,
        _ => Some(read_ul(stream)?),
    };

    let alpha_transparency = read_bool(stream)?;
    let image_alignment_offset = io::read_u32(stream)?;
    let image_start_offset = io::read_u32(stream)?;
    let image_end_offset = io::read_u32(stream)?;

    Ok(VideoDescriptor {
        generic,
        frame_layout,
        stored,
        sampled,
        display,
        aspect_ratio,
        picture_essence_coding,
        capture_gamma,
        alpha_transparency,
        image_alignment_offset,
        image_start_offset,
        image_end_offset,
    })
}

fn color_siting_tag(c: ColorSiting) -> u8 {
    match c {
        ColorSiting::CoSiting => 0,
        ColorSiting::MidPoint => 1,
        ColorSiting::ThreeTap => 2,
        ColorSiting::Quincunx => 3,
        ColorSiting::Rec601 => 4,
        ColorSiting::Unknown => 5,
    }
}

fn color_siting_from_tag(tag: u8) -> ColorSiting {
    match tag {
        0 => ColorSiting::CoSiting,
        1 => ColorSiting::MidPoint,
        2 => ColorSiting::ThreeTap,
        3 => ColorSiting::Quincunx,
        4 => ColorSiting::Rec601,
        _ => ColorSiting::Unknown,
    }
}

fn push_cdci(buf: &mut Vec<u8>, c: &CdciDescriptor) {
    push_video(buf, &c.video);
    push_u32(buf, c.component_depth);
    push_u32(buf, c.horizontal_subsampling);
    push_u32(buf, c.vertical_subsampling);
    push_u8(buf, color_siting_tag(c.color_siting));
    push_bool(buf, c.reversed_byte_order);
    push_u32(buf, c.black_ref_level);
    push_u32(buf, c.white_ref_level);
    push_u32(buf, c.color_range);
}

fn read_cdci(stream: &mut dyn IoStream) -> Result<CdciDescriptor> {
    let video = read_video(stream)?;
    let component_depth = io::read_u32(stream)?;
    let horizontal_subsampling = io::read_u32(stream)?;
    let vertical_subsampling = io::read_u32(stream)?;
    let color_siting = color_siting_from_tag(io::read_u8(stream)?);
    let reversed_byte_order = read_bool(stream)?;
    let black_ref_level = io::read_u32(stream)?;
    let white_ref_level = io::read_u32(stream)?;
    let color_range = io::read_u32(stream)?;

    Ok(CdciDescriptor {
        video,
        component_depth,
        horizontal_subsampling,
        vertical_subsampling,
        color_siting,
        reversed_byte_order,
        black_ref_level,
        white_ref_level,
        color_range,
    })
}

fn push_rgba(buf: &mut Vec<u8>, r: &RgbaDescriptor) {
    push_video(buf, &r.video);
    push_u32(buf, r.component_max_ref);
    push_u32(buf, r.component_min_ref);
    push_u32(buf, r.alpha_max_ref);
    push_u32(buf, r.alpha_min_ref);

    push_u32(buf, r.pixel_layout.len() as u32);
    for item in &r.pixel_layout {
        push_u8(buf, item.code);
        push_u8(buf, item.depth);
    }
}

fn read_rgba(stream: &mut dyn IoStream) -> Result<RgbaDescriptor> {
    let video = read_video(stream)?;
    let component_max_ref = io::read_u32(stream)?;
    let component_min_ref = io::read_u32(stream)?;
    let alpha_max_ref = io::read_u32(stream)?;
    let alpha_min_ref = io::read_u32(stream)?;

    let count = io::read_u32(stream)?;
    let mut pixel_layout = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let code = io::read_u8(stream)?;
        let depth = io::read_u8(stream)?;
        pixel_layout.push(RgbaLayoutItem::new(code, depth));
    }

    Ok(RgbaDescriptor { video, component_max_ref, component_min_ref, alpha_max_ref, alpha_min_ref, pixel_layout })
}

fn coded_content_type_tag(c: CodedContentType) -> u8 {
    match c {
        CodedContentType::Unknown => 0,
        CodedContentType::Progressive => 1,
        CodedContentType::Interlaced => 2,
        CodedContentType::Mixed => 3,
    }
}

fn coded_content_type_from_tag(tag: u8) -> CodedContentType {
    match tag {
        1 => CodedContentType::Progressive,
        2 => CodedContentType::Interlaced,
        3 => CodedContentType::Mixed,
        _ => CodedContentType::Unknown,
    }
}

fn push_mpeg(buf: &mut Vec<u8>, m: &MpegDescriptor) {
    push_cdci(buf, &m.cdci);
    push_bool(buf, m.single_sequence);
    push_bool(buf, m.constant_b_picture);
    push_u8(buf, coded_content_type_tag(m.coded_content_type));
    push_bool(buf, m.low_delay);
    push_bool(buf, m.closed_gop);
    push_bool(buf, m.identical_gop);
    push_u16(buf, m.max_gop_size);
    push_u16(buf, m.max_b_picture_count);
    push_u32(buf, m.bit_rate);
    push_u8(buf, m.profile_and_level);
}

fn read_mpeg(stream: &mut dyn IoStream) -> Result<MpegDescriptor> {
    let cdci = read_cdci(stream)?;
    let single_sequence = read_bool(stream)?;
    let constant_b_picture = read_bool(stream)?;
    let coded_content_type = coded_content_type_from_tag(io::read_u8(stream)?);
    let low_delay = read_bool(stream)?;
    let closed_gop = read_bool(stream)?;
    let identical_gop = read_bool(stream)?;
    let max_gop_size = io::read_u16(stream)?;
    let max_b_picture_count = io::read_u16(stream)?;
    let bit_rate = io::read_u32(stream)?;
    let profile_and_level = io::read_u8(stream)?;

    Ok(MpegDescriptor {
        cdci,
        single_sequence,
        constant_b_picture,
        coded_content_type,
        low_delay,
        closed_gop,
        identical_gop,
        max_gop_size,
        max_b_picture_count,
        bit_rate,
        profile_and_level,
    })
}

fn push_audio(buf: &mut Vec<u8>, a: &AudioDescriptor) {
    push_generic(buf, &a.generic);
    push_rational(buf, a.audio_sampling_rate);
    push_bool(buf, a.locked_to_video);
    push_u32(buf, a.channel_count);
    push_u32(buf, a.quantization_bits);
    push_ul(buf, a.sound_compression);
}

fn read_audio(stream: &mut dyn IoStream) -> Result<AudioDescriptor> {
    let generic = read_generic(stream)?;
    let audio_sampling_rate = read_rational(stream)?;
    let locked_to_video = read_bool(stream)?;
    let channel_count = io::read_u32(stream)?;
    let quantization_bits = io::read_u32(stream)?;
    let sound_compression = read_ul(stream)?;

    Ok(AudioDescriptor { generic, audio_sampling_rate, locked_to_video, channel_count, quantization_bits, sound_compression })
}

fn push_wave(buf: &mut Vec<u8>, w: &WaveAudioDescriptor) {
    push_audio(buf, &w.audio);
    push_u16(buf, w.block_align);
    push_u32(buf, w.avg_bytes_per_sec);
}

fn read_wave(stream: &mut dyn IoStream) -> Result<WaveAudioDescriptor> {
    let audio = read_audio(stream)?;
    let block_align = io::read_u16(stream)?;
    let avg_bytes_per_sec = io::read_u32(stream)?;
    Ok(WaveAudioDescriptor { audio, block_align, avg_bytes_per_sec })
}

fn channel_status_tag(c: ChannelStatusMode) -> u8 {
    match c {
        ChannelStatusMode::None => 0,
        ChannelStatusMode::Minimum => 1,
        ChannelStatusMode::Standard => 2,
        ChannelStatusMode::Fixed => 3,
        ChannelStatusMode::Stream => 4,
        ChannelStatusMode::Essence => 5,
    }
}

fn channel_status_from_tag(tag: u8) -> ChannelStatusMode {
    match tag {
        1 => ChannelStatusMode::Minimum,
        2 => ChannelStatusMode::Standard,
        3 => ChannelStatusMode::Fixed,
        4 => ChannelStatusMode::Stream,
        5 => ChannelStatusMode::Essence,
        _ => ChannelStatusMode::None,
    }
}

fn push_aes3(buf: &mut Vec<u8>, a: &Aes3Descriptor) {
    push_wave(buf, &a.wave);

    push_u32(buf, a.channel_status_mode.len() as u32);
    for mode in &a.channel_status_mode {
        push_u8(buf, channel_status_tag(*mode));
    }

    push_u32(buf, a.fixed_channel_status_data.len() as u32);
    for data in &a.fixed_channel_status_data {
        push_bytes(buf, data);
    }
}

fn read_aes3(stream: &mut dyn IoStream) -> Result<Aes3Descriptor> {
    let wave = read_wave(stream)?;

    let mode_count = io::read_u32(stream)?;
    let mut channel_status_mode = Vec::with_capacity(mode_count as usize);
    for _ in 0..mode_count {
        channel_status_mode.push(channel_status_from_tag(io::read_u8(stream)?));
    }

    let data_count = io::read_u32(stream)?;
    let mut fixed_channel_status_data = Vec::with_capacity(data_count as usize);
    for _ in 0..data_count {
        fixed_channel_status_data.push(read_bytes(stream)?);
    }

    Ok(Aes3Descriptor { wave, channel_status_mode, fixed_channel_status_data })
}

fn push_descriptor(buf: &mut Vec<u8>, d: &Descriptor) {
    push_u8(buf, descriptor_tag(d));

    match d {
        Descriptor::Cdci(c) => push_cdci(buf, c),
        Descriptor::Rgba(r) => push_rgba(buf, r),
        Descriptor::Mpeg(m) => push_mpeg(buf, m),
        Descriptor::Wave(w) => push_wave(buf, w),
        Descriptor::Aes3(a) => push_aes3(buf, a),
    }
}

fn read_descriptor(stream: &mut dyn IoStream) -> Result<Descriptor> {
    match io::read_u8(stream)? {
        0 => Ok(Descriptor::Cdci(read_cdci(stream)?)),
        1 => Ok(Descriptor::Rgba(read_rgba(stream)?)),
        2 => Ok(Descriptor::Mpeg(read_mpeg(stream)?)),
        3 => Ok(Descriptor::Wave(read_wave(stream)?)),
        4 => Ok(Descriptor::Aes3(read_aes3(stream)?)),
        other => input_error(format!("unrecognized descriptor tag {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStream;
    use crate::track::{TrackNumber, ITEM_TYPE_PICTURE};

    #[test]
    fn file_metadata_round_trips_through_a_klv_packet() {
        let descriptor = Descriptor::Rgba(RgbaDescriptor::new(Rational::new(24, 1).unwrap(), 64, 64));

        let mut metadata = FileMetadata::new();
        metadata.tracks.push(TrackMetadata {
            track_number: TrackNumber::new(ITEM_TYPE_PICTURE, 1, 0x02, 1),
            kind: TrackKind::Picture,
            edit_rate: Rational::new(24, 1).unwrap(),
            origin: 0,
            duration: 10,
            descriptor: Some(descriptor.clone()),
        });

        let mut stream = MemoryStream::new();
        metadata.write(&mut stream).unwrap();
        stream.seek(crate::io::SeekFrom::Start(0)).unwrap();

        let read_back = FileMetadata::read(&mut stream).unwrap();
        assert_eq!(read_back.tracks.len(), 1);
        assert_eq!(read_back.tracks[0].duration, 10);
        assert_eq!(read_back.tracks[0].descriptor, Some(descriptor));
    }

    #[test]
    fn timecode_track_carries_no_descriptor() {
        let mut metadata = FileMetadata::new();
        metadata.tracks.push(TrackMetadata {
            track_number: TrackNumber::new(0x01, 1, 0x01, 1),
            kind: TrackKind::Timecode,
            edit_rate: Rational::new(24, 1).unwrap(),
            origin: 0,
            duration: 10,
            descriptor: None,
        });

        let mut stream = MemoryStream::new();
        metadata.write(&mut stream).unwrap();
        stream.seek(crate::io::SeekFrom::Start(0)).unwrap();

        let read_back = FileMetadata::read(&mut stream).unwrap();
        assert_eq!(read_back.tracks[0].descriptor, None);
        assert_eq!(read_back.tracks[0].kind, TrackKind::Timecode);
    }
}
