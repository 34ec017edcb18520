// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The SMPTE 377M file descriptor hierarchy: structured metadata describing one essence stream,
//! serializable to and reconstructible from a file's metadata objects.
//!
//! Rust has no implementation inheritance, so where the original library subclassed
//! (`CDCIDescriptor : VideoDescriptor : Descriptor`) this module composes: each level embeds the
//! level below it as a named field (`video: VideoDescriptor`, in `CdciDescriptor`) and exposes
//! its fields through that field rather than through virtual dispatch. `MpegDescriptor`, which
//! the original refines from `CDCIDescriptor` rather than `VideoDescriptor` directly, embeds a
//! full `CdciDescriptor` the same way.

mod ul;

pub use ul::{
    Ul, AES3_CONTAINER, BWF_CONTAINER, DIRAC_CONTAINER, DPX_CONTAINER, JPEG2000_CONTAINER,
    JPEG_CONTAINER, JPEG_LS_CONTAINER, MPEG2_CONTAINER, OPENEXR_CONTAINER, PNG_CONTAINER,
    UNCOMPRESSED_CDCI_CONTAINER, UNCOMPRESSED_PICTURE_CODING, UNCOMPRESSED_RGBA_CONTAINER,
    UNCOMPRESSED_SOUND_CODING,
};

use crate::units::{Box2i, Rational};

/// Which of the two families a descriptor belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    Video,
    Audio,
}

/// SMPTE 377M D.1: fields every file descriptor carries, regardless of essence kind.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericDescriptor {
    /// Edit rate: one descriptor-relative frame per tick, not the audio sampling rate.
    pub sample_rate: Rational,
    /// Number of edit units of essence in the container; back-patched at `finalize`.
    pub container_duration: u64,
    pub essence_container: Ul,
    /// Codec label: picture-essence-coding for video, sound-compression for audio.
    pub codec: Ul,
}

impl GenericDescriptor {
    pub fn new(sample_rate: Rational) -> Self {
        GenericDescriptor {
            sample_rate,
            container_duration: 0,
            essence_container: Ul::new([0; 16]),
            codec: Ul::new([0; 16]),
        }
    }
}

/// How fields are laid out across a field-interlaced frame. Mirrors SMPTE 377M's frame-layout
/// enumeration; `mox` only ever writes `FullFrame` (interlaced rewrapping is a non-goal) but
/// preserves whatever it reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameLayout {
    FullFrame,
    SeparateFields,
    OneField,
    MixedFields,
    SegmentedFrame,
    Unknown,
}

/// SMPTE 377M D.2.1: fields common to every picture essence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoDescriptor {
    pub generic: GenericDescriptor,
    pub frame_layout: FrameLayout,
    pub stored: Box2i,
    pub sampled: Box2i,
    pub display: Box2i,
    pub aspect_ratio: Rational,
    /// SMPTE RP224 label for the coding method (uncompressed, MPEG2, ...).
    pub picture_essence_coding: Ul,
    /// Transfer characteristic label; `None` if the source declared no gamma.
    pub capture_gamma: Option<Ul>,
    pub alpha_transparency: bool,
    pub image_alignment_offset: u32,
    pub image_start_offset: u32,
    pub image_end_offset: u32,
}

impl VideoDescriptor {
    pub fn new(sample_rate: Rational, width: u32, height: u32) -> Self {
        let window = Box2i::from_dimensions(width as i32, height as i32);

        VideoDescriptor {
            generic: GenericDescriptor::new(sample_rate),
            frame_layout: FrameLayout::FullFrame,
            stored: window,
            sampled: window,
            display: window,
            aspect_ratio: Rational::new(1, 1).expect("1/1 is always valid"),
            picture_essence_coding: UNCOMPRESSED_PICTURE_CODING,
            capture_gamma: None,
            alpha_transparency: false,
            image_alignment_offset: 0,
            image_start_offset: 0,
            image_end_offset: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.stored.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.stored.height() as u32
    }
}

/// SMPTE 377M E.2.11: how chroma is positioned relative to luma samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorSiting {
    CoSiting,
    MidPoint,
    ThreeTap,
    Quincunx,
    Rec601,
    Unknown,
}

/// SMPTE 377M D.2.2: Color-Difference Component Image picture essence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct CdciDescriptor {
    pub video: VideoDescriptor,
    pub component_depth: u32,
    pub horizontal_subsampling: u32,
    pub vertical_subsampling: u32,
    pub color_siting: ColorSiting,
    pub reversed_byte_order: bool,
    pub black_ref_level: u32,
    pub white_ref_level: u32,
    pub color_range: u32,
}

impl CdciDescriptor {
    pub fn new(
        sample_rate: Rational,
        width: u32,
        height: u32,
        horizontal_subsampling: u32,
        vertical_subsampling: u32,
    ) -> Self {
        let mut video = VideoDescriptor::new(sample_rate, width, height);
        video.generic.essence_container = UNCOMPRESSED_CDCI_CONTAINER;

        CdciDescriptor {
            video,
            component_depth: 8,
            horizontal_subsampling,
            vertical_subsampling,
            color_siting: ColorSiting::Rec601,
            reversed_byte_order: false,
            black_ref_level: 16,
            white_ref_level: 235,
            color_range: 225,
        }
    }

    /// SMPTE 384M-2005 7.1: generic container item/element type for frame-wrapped picture.
    pub fn gc_item_type(&self) -> u8 {
        0x15
    }

    pub fn gc_element_type(&self) -> u8 {
        0x02
    }
}

/// SMPTE 377M E.2.46: one entry of an RGBA descriptor's pixel layout, pairing a component code
/// (which channel) with its bit depth on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RgbaLayoutItem {
    pub code: u8,
    pub depth: u8,
}

impl RgbaLayoutItem {
    pub const RED: u8 = b'R';
    pub const GREEN: u8 = b'G';
    pub const BLUE: u8 = b'B';
    pub const ALPHA: u8 = b'A';
    /// A fill/unused component, used to pad the layout to the fixed 8-item wire size.
    pub const FILL: u8 = b'F';

    pub fn new(code: u8, depth: u8) -> Self {
        RgbaLayoutItem { code, depth }
    }
}

/// SMPTE 377M D.2.3: RGBA picture essence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaDescriptor {
    pub video: VideoDescriptor,
    pub component_max_ref: u32,
    pub component_min_ref: u32,
    pub alpha_max_ref: u32,
    pub alpha_min_ref: u32,
    /// Ordered component layout, at most 8 entries; unused trailing slots are padded with
    /// `RgbaLayoutItem::FILL` on write, as the wire format requires a fixed 8-item array.
    pub pixel_layout: Vec<RgbaLayoutItem>,
}

impl RgbaDescriptor {
    pub fn new(sample_rate: Rational, width: u32, height: u32) -> Self {
        let mut video = VideoDescriptor::new(sample_rate, width, height);
        video.generic.essence_container = UNCOMPRESSED_RGBA_CONTAINER;

        RgbaDescriptor {
            video,
            component_max_ref: 255,
            component_min_ref: 0,
            alpha_max_ref: 255,
            alpha_min_ref: 0,
            pixel_layout: Vec::new(),
        }
    }

    pub fn gc_item_type(&self) -> u8 {
        0x15
    }

    pub fn gc_element_type(&self) -> u8 {
        0x02
    }

    /// Pads or truncates [`RgbaDescriptor::pixel_layout`] to the wire format's fixed 8-entry
    /// array, filling unused slots with `(FILL, 0)`.
    pub fn padded_pixel_layout(&self) -> [RgbaLayoutItem; 8] {
        let mut padded = [RgbaLayoutItem::new(RgbaLayoutItem::FILL, 0); 8];

        for (slot, item) in padded.iter_mut().zip(self.pixel_layout.iter()) {
            *slot = *item;
        }

        padded
    }
}

/// How GOP structure is declared for an MPEG picture essence descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CodedContentType {
    Unknown,
    Progressive,
    Interlaced,
    Mixed,
}

/// SMPTE ST 381-2:2011 10.2: MPEG video descriptor, which refines [`CdciDescriptor`] rather than
/// [`VideoDescriptor`] directly.
#[derive(Clone, Debug, PartialEq)]
pub struct MpegDescriptor {
    pub cdci: CdciDescriptor,
    pub single_sequence: bool,
    pub constant_b_picture: bool,
    pub coded_content_type: CodedContentType,
    pub low_delay: bool,
    pub closed_gop: bool,
    pub identical_gop: bool,
    pub max_gop_size: u16,
    pub max_b_picture_count: u16,
    pub bit_rate: u32,
    pub profile_and_level: u8,
}

impl MpegDescriptor {
    pub fn new(
        sample_rate: Rational,
        width: u32,
        height: u32,
        horizontal_subsampling: u32,
        vertical_subsampling: u32,
    ) -> Self {
        let mut cdci =
            CdciDescriptor::new(sample_rate, width, height, horizontal_subsampling, vertical_subsampling);
        cdci.video.generic.essence_container = MPEG2_CONTAINER;

        MpegDescriptor {
            cdci,
            single_sequence: false,
            constant_b_picture: false,
            coded_content_type: CodedContentType::Unknown,
            low_delay: false,
            closed_gop: true,
            identical_gop: false,
            max_gop_size: 1,
            max_b_picture_count: 0,
            bit_rate: 0,
            profile_and_level: 0,
        }
    }

    /// SMPTE ST 381-2:2011 8.1.1: frame-wrapped MPEG picture item/element type.
    pub fn gc_item_type(&self) -> u8 {
        0x15
    }

    pub fn gc_element_type(&self) -> u8 {
        0x05
    }
}

/// SMPTE 377M D.3: fields common to every sound essence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioDescriptor {
    pub generic: GenericDescriptor,
    /// The actual audio sampling rate, distinct from `generic.sample_rate` (the edit rate).
    pub audio_sampling_rate: Rational,
    pub locked_to_video: bool,
    pub channel_count: u32,
    pub quantization_bits: u32,
    /// SMPTE RP224 label for the sound-compression method.
    pub sound_compression: Ul,
}

impl AudioDescriptor {
    pub fn new(
        sample_rate: Rational,
        audio_sampling_rate: Rational,
        channel_count: u32,
        quantization_bits: u32,
    ) -> Self {
        AudioDescriptor {
            generic: GenericDescriptor::new(sample_rate),
            audio_sampling_rate,
            locked_to_video: true,
            channel_count,
            quantization_bits,
            sound_compression: UNCOMPRESSED_SOUND_CODING,
        }
    }
}

/// SMPTE 382M-2007 A.1: Wave Audio (PCM) essence descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveAudioDescriptor {
    pub audio: AudioDescriptor,
    pub block_align: u16,
    pub avg_bytes_per_sec: u32,
}

impl WaveAudioDescriptor {
    pub fn new(
        sample_rate: Rational,
        audio_sampling_rate: Rational,
        channel_count: u32,
        quantization_bits: u32,
    ) -> Self {
        let mut audio = AudioDescriptor::new(sample_rate, audio_sampling_rate, channel_count, quantization_bits);
        audio.generic.essence_container = BWF_CONTAINER;

        let bytes_per_sample = quantization_bits.div_ceil(8);
        let block_align = (channel_count * bytes_per_sample) as u16;
        let avg_bytes_per_sec =
            (block_align as u64 * audio_sampling_rate.as_f64().round() as u64) as u32;

        WaveAudioDescriptor { audio, block_align, avg_bytes_per_sec }
    }

    /// SMPTE 382M-2007 6.5: frame-wrapped BWF sound item/element type.
    pub fn gc_item_type(&self) -> u8 {
        0x16
    }

    pub fn gc_element_type(&self) -> u8 {
        0x01
    }
}

/// How channel-status bytes are conveyed for an AES3 track.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelStatusMode {
    None,
    Minimum,
    Standard,
    Fixed,
    Stream,
    Essence,
}

/// SMPTE 382M-2007 A.3: AES3 sound essence descriptor, refining [`WaveAudioDescriptor`].
#[derive(Clone, Debug, PartialEq)]
pub struct Aes3Descriptor {
    pub wave: WaveAudioDescriptor,
    pub channel_status_mode: Vec<ChannelStatusMode>,
    pub fixed_channel_status_data: Vec<Vec<u8>>,
}

impl Aes3Descriptor {
    pub fn new(
        sample_rate: Rational,
        audio_sampling_rate: Rational,
        channel_count: u32,
        quantization_bits: u32,
    ) -> Self {
        let mut wave =
            WaveAudioDescriptor::new(sample_rate, audio_sampling_rate, channel_count, quantization_bits);
        wave.audio.generic.essence_container = AES3_CONTAINER;

        Aes3Descriptor {
            wave,
            channel_status_mode: vec![ChannelStatusMode::None; channel_count as usize],
            fixed_channel_status_data: Vec::new(),
        }
    }

    /// AES3 frame wrapping uses a distinct element type from plain BWF.
    pub fn gc_element_type(&self) -> u8 {
        0x03
    }
}

/// Every concrete descriptor kind `mox` can read or write, for use where a track's descriptor
/// isn't known until a file is parsed.
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptor {
    Cdci(CdciDescriptor),
    Rgba(RgbaDescriptor),
    Mpeg(MpegDescriptor),
    Wave(WaveAudioDescriptor),
    Aes3(Aes3Descriptor),
}

impl Descriptor {
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Cdci(_) | Descriptor::Rgba(_) | Descriptor::Mpeg(_) => DescriptorKind::Video,
            Descriptor::Wave(_) | Descriptor::Aes3(_) => DescriptorKind::Audio,
        }
    }

    pub fn essence_container(&self) -> Ul {
        match self {
            Descriptor::Cdci(d) => d.video.generic.essence_container,
            Descriptor::Rgba(d) => d.video.generic.essence_container,
            Descriptor::Mpeg(d) => d.cdci.video.generic.essence_container,
            Descriptor::Wave(d) => d.audio.generic.essence_container,
            Descriptor::Aes3(d) => d.wave.audio.generic.essence_container,
        }
    }

    pub fn gc_item_type(&self) -> u8 {
        match self {
            Descriptor::Cdci(d) => d.gc_item_type(),
            Descriptor::Rgba(d) => d.gc_item_type(),
            Descriptor::Mpeg(d) => d.gc_item_type(),
            Descriptor::Wave(d) => d.gc_item_type(),
            Descriptor::Aes3(d) => d.wave.gc_item_type(),
        }
    }

    pub fn gc_element_type(&self) -> u8 {
        match self {
            Descriptor::Cdci(d) => d.gc_element_type(),
            Descriptor::Rgba(d) => d.gc_element_type(),
            Descriptor::Mpeg(d) => d.gc_element_type(),
            Descriptor::Wave(d) => d.gc_element_type(),
            Descriptor::Aes3(d) => d.gc_element_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdci_descriptor_carries_its_own_essence_container_label() {
        let d = CdciDescriptor::new(Rational::new(24, 1).unwrap(), 1920, 1080, 2, 2);
        assert_eq!(d.video.generic.essence_container, UNCOMPRESSED_CDCI_CONTAINER);
        assert_eq!(d.gc_item_type(), 0x15);
    }

    #[test]
    fn rgba_pixel_layout_pads_to_eight_entries() {
        let mut d = RgbaDescriptor::new(Rational::new(24, 1).unwrap(), 64, 64);
        d.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::RED, 8));
        d.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::GREEN, 8));

        let padded = d.padded_pixel_layout();
        assert_eq!(padded[0].code, RgbaLayoutItem::RED);
        assert_eq!(padded[2].code, RgbaLayoutItem::FILL);
    }

    #[test]
    fn mpeg_descriptor_refines_cdci_not_video_directly() {
        let d = MpegDescriptor::new(Rational::new(24, 1).unwrap(), 1920, 1080, 2, 2);
        assert_eq!(d.cdci.video.width(), 1920);
        assert_eq!(d.gc_element_type(), 0x05);
    }

    #[test]
    fn aes3_descriptor_refines_wave_audio() {
        let d = Aes3Descriptor::new(Rational::new(24, 1).unwrap(), Rational::new(48000, 1).unwrap(), 2, 24);
        assert_eq!(d.wave.block_align, 6);
        assert_eq!(d.gc_element_type(), 0x03);
    }

    #[test]
    fn descriptor_enum_dispatches_to_the_right_kind() {
        let d = Descriptor::Wave(WaveAudioDescriptor::new(
            Rational::new(24, 1).unwrap(),
            Rational::new(48000, 1).unwrap(),
            2,
            16,
        ));
        assert_eq!(d.kind(), DescriptorKind::Audio);
    }
}
