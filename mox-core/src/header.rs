// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Header`]: the dynamic metadata dictionary attached to every video/audio stream, plus the
//! well-known attributes every header carries.

use indexmap::IndexMap;

use crate::channels::{AudioChannelList, ChannelList};
use crate::errors::{argument_error, type_error, Result};
use crate::units::{Box2i, Rational};

/// A tag for the compression scheme used to encode the video stream, stored as a header
/// attribute and consulted by the muxer to pick a [`crate::codec::VideoCodec`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VideoCompression {
    Uncompressed,
    Png,
    Jpeg,
    Jpeg2000,
    JpegLs,
    Dpx,
    OpenExr,
    Dirac,
    Mpeg,
}

/// A tag for the compression scheme used to encode the audio stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AudioCompression {
    Pcm,
}

/// A header attribute value.
///
/// Unlike the original library's `Attribute` base class, which every plug-in could subclass to
/// add a new dynamically-registered attribute type, `mox-core` closes the set: every value a
/// header can carry is one of these variants. Nothing in `mox` needs a caller-defined attribute
/// type, so the open extension point would only add an unused indirection.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Box2i(Box2i),
    Rational(Rational),
    Int(i32),
    Int64(i64),
    String(String),
    VideoCompression(VideoCompression),
    AudioCompression(AudioCompression),
    Channels(ChannelList),
    AudioChannels(AudioChannelList),
}

impl Attribute {
    pub fn as_box2i(&self) -> Result<&Box2i> {
        match self {
            Attribute::Box2i(v) => Ok(v),
            _ => type_error("attribute is not a Box2i"),
        }
    }

    pub fn as_rational(&self) -> Result<&Rational> {
        match self {
            Attribute::Rational(v) => Ok(v),
            _ => type_error("attribute is not a Rational"),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Attribute::Int(v) => Ok(*v),
            _ => type_error("attribute is not an Int"),
        }
    }

    pub fn as_int64(&self) -> Result<i64> {
        match self {
            Attribute::Int64(v) => Ok(*v),
            _ => type_error("attribute is not an Int64"),
        }
    }

    pub fn as_video_compression(&self) -> Result<VideoCompression> {
        match self {
            Attribute::VideoCompression(v) => Ok(*v),
            _ => type_error("attribute is not a VideoCompression"),
        }
    }

    pub fn as_audio_compression(&self) -> Result<AudioCompression> {
        match self {
            Attribute::AudioCompression(v) => Ok(*v),
            _ => type_error("attribute is not an AudioCompression"),
        }
    }

    pub fn as_channels(&self) -> Result<&ChannelList> {
        match self {
            Attribute::Channels(v) => Ok(v),
            _ => type_error("attribute is not a ChannelList"),
        }
    }

    pub fn as_audio_channels(&self) -> Result<&AudioChannelList> {
        match self {
            Attribute::AudioChannels(v) => Ok(v),
            _ => type_error("attribute is not an AudioChannelList"),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Attribute::Box2i(_) => "Box2i",
            Attribute::Rational(_) => "Rational",
            Attribute::Int(_) => "Int",
            Attribute::Int64(_) => "Int64",
            Attribute::String(_) => "String",
            Attribute::VideoCompression(_) => "VideoCompression",
            Attribute::AudioCompression(_) => "AudioCompression",
            Attribute::Channels(_) => "Channels",
            Attribute::AudioChannels(_) => "AudioChannels",
        }
    }
}

const DATA_WINDOW: &str = "dataWindow";
const DISPLAY_WINDOW: &str = "displayWindow";
const PIXEL_ASPECT_RATIO: &str = "pixelAspectRatio";
const FRAME_RATE: &str = "frameRate";
const SAMPLE_RATE: &str = "sampleRate";
const VIDEO_COMPRESSION: &str = "videoCompression";
const AUDIO_COMPRESSION: &str = "audioCompression";
const CHANNELS: &str = "channels";
const AUDIO_CHANNELS: &str = "audiochannels";
const DURATION: &str = "duration";
const AUDIO_DURATION: &str = "audioDuration";
const SAMPLED_WINDOW: &str = "sampledWindow";
const VIDEO_QUALITY: &str = "videoQuality";

/// The metadata dictionary describing one video/audio stream: its geometry, rates, channel
/// layout, and compression scheme, plus any caller-supplied attributes.
#[derive(Clone, Debug, Default)]
pub struct Header {
    attributes: IndexMap<String, Attribute>,
}

impl Header {
    /// Builds a header for a `width` x `height` video stream at 24fps, PNG-compressed, with no
    /// audio — matching the original library's all-defaults constructor.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width < 1 || height < 1 {
            return argument_error("invalid dimensions for Header");
        }

        let window = Box2i::from_dimensions(width, height);
        let mut header = Header::default();

        header.insert(DATA_WINDOW, Attribute::Box2i(window));
        header.insert(DISPLAY_WINDOW, Attribute::Box2i(window));
        header.insert(SAMPLED_WINDOW, Attribute::Box2i(window));
        header.insert(PIXEL_ASPECT_RATIO, Attribute::Rational(Rational::new(1, 1)?));
        header.insert(FRAME_RATE, Attribute::Rational(Rational::new(24, 1)?));
        header.insert(SAMPLE_RATE, Attribute::Rational(Rational::new(0, 1)?));
        header.insert(VIDEO_COMPRESSION, Attribute::VideoCompression(VideoCompression::Png));
        header.insert(AUDIO_COMPRESSION, Attribute::AudioCompression(AudioCompression::Pcm));
        header.insert(CHANNELS, Attribute::Channels(ChannelList::new()));
        header.insert(AUDIO_CHANNELS, Attribute::AudioChannels(AudioChannelList::new()));
        header.insert(DURATION, Attribute::Int(0));
        header.insert(AUDIO_DURATION, Attribute::Int64(0));

        Ok(header)
    }

    /// Inserts or overwrites an attribute. Fails if an attribute with this name already exists
    /// with a *different* variant, matching the original library's `TypeExc` on a type-changing
    /// re-insert.
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) -> Result<()> {
        let name = name.into();

        if let Some(existing) = self.attributes.get(&name) {
            if existing.variant_name() != attribute.variant_name() {
                return type_error(format!(
                    "attribute {name} already exists with type {}, cannot change to {}",
                    existing.variant_name(),
                    attribute.variant_name()
                ));
            }
        }

        self.attributes.insert(name, attribute);
        Ok(())
    }

    pub fn erase(&mut self, name: &str) {
        self.attributes.shift_remove(name);
    }

    pub fn find(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn get(&self, name: &str) -> Result<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| crate::errors::Error::Null(format!("missing required attribute {name}")))
    }

    pub fn data_window(&self) -> Result<Box2i> {
        Ok(*self.get(DATA_WINDOW)?.as_box2i()?)
    }

    pub fn display_window(&self) -> Result<Box2i> {
        Ok(*self.get(DISPLAY_WINDOW)?.as_box2i()?)
    }

    /// The window actually carrying sampled (as opposed to padding/fill) pixel data. Defaults to
    /// the data window; the container layer may record a narrower value than what the codec layer
    /// sees (see DESIGN.md, "sampled window vs. data window").
    pub fn sampled_window(&self) -> Result<Box2i> {
        Ok(*self.get(SAMPLED_WINDOW)?.as_box2i()?)
    }

    pub fn width(&self) -> Result<i32> {
        Ok(self.data_window()?.width())
    }

    pub fn height(&self) -> Result<i32> {
        Ok(self.data_window()?.height())
    }

    pub fn pixel_aspect_ratio(&self) -> Result<Rational> {
        Ok(*self.get(PIXEL_ASPECT_RATIO)?.as_rational()?)
    }

    pub fn frame_rate(&self) -> Result<Rational> {
        Ok(*self.get(FRAME_RATE)?.as_rational()?)
    }

    pub fn sample_rate(&self) -> Result<Rational> {
        Ok(*self.get(SAMPLE_RATE)?.as_rational()?)
    }

    pub fn video_compression(&self) -> Result<VideoCompression> {
        self.get(VIDEO_COMPRESSION)?.as_video_compression()
    }

    pub fn audio_compression(&self) -> Result<AudioCompression> {
        self.get(AUDIO_COMPRESSION)?.as_audio_compression()
    }

    pub fn channels(&self) -> Result<&ChannelList> {
        self.get(CHANNELS)?.as_channels()
    }

    pub fn audio_channels(&self) -> Result<&AudioChannelList> {
        self.get(AUDIO_CHANNELS)?.as_audio_channels()
    }

    pub fn duration(&self) -> Result<i32> {
        self.get(DURATION)?.as_int()
    }

    pub fn audio_duration(&self) -> Result<i64> {
        self.get(AUDIO_DURATION)?.as_int64()
    }

    /// The lossy quality setting (0..100), or `None` if the stream is lossless. Absence of the
    /// attribute *is* the lossless signal; there is no separate "lossless" flag.
    pub fn video_quality(&self) -> Result<Option<i32>> {
        match self.find(VIDEO_QUALITY) {
            Some(attr) => Ok(Some(attr.as_int()?)),
            None => Ok(None),
        }
    }

    /// Sets the lossy quality setting. `Some(q)` with `q` outside `0..=100` is rejected;
    /// `None` erases the attribute, explicitly requesting lossless encoding.
    pub fn set_video_quality(&mut self, quality: Option<i32>) -> Result<()> {
        match quality {
            Some(q) if !(0..=100).contains(&q) => {
                argument_error(format!("videoQuality must be in 0..=100, got {q}"))
            }
            Some(q) => self.insert(VIDEO_QUALITY, Attribute::Int(q)),
            None => {
                self.erase(VIDEO_QUALITY);
                Ok(())
            }
        }
    }

    pub fn set_sampled_window(&mut self, window: Box2i) -> Result<()> {
        self.insert(SAMPLED_WINDOW, Attribute::Box2i(window))
    }

    pub fn set_channels(&mut self, channels: ChannelList) -> Result<()> {
        self.insert(CHANNELS, Attribute::Channels(channels))
    }

    pub fn set_audio_channels(&mut self, channels: AudioChannelList) -> Result<()> {
        self.insert(AUDIO_CHANNELS, Attribute::AudioChannels(channels))
    }

    pub fn set_duration(&mut self, duration: i32) -> Result<()> {
        self.insert(DURATION, Attribute::Int(duration))
    }

    pub fn set_audio_duration(&mut self, duration: i64) -> Result<()> {
        self.insert(AUDIO_DURATION, Attribute::Int64(duration))
    }

    /// Builder-style frame rate setter, for call sites that construct a `Header` fluently.
    pub fn with_frame_rate(mut self, rate: Rational) -> Result<Self> {
        self.insert(FRAME_RATE, Attribute::Rational(rate))?;
        Ok(self)
    }

    pub fn with_sample_rate(mut self, rate: Rational) -> Result<Self> {
        self.insert(SAMPLE_RATE, Attribute::Rational(rate))?;
        Ok(self)
    }

    pub fn with_video_compression(mut self, compression: VideoCompression) -> Result<Self> {
        self.insert(VIDEO_COMPRESSION, Attribute::VideoCompression(compression))?;
        Ok(self)
    }

    pub fn with_audio_compression(mut self, compression: AudioCompression) -> Result<Self> {
        self.insert(AUDIO_COMPRESSION, Attribute::AudioCompression(compression))?;
        Ok(self)
    }

    pub fn with_channels(mut self, channels: ChannelList) -> Result<Self> {
        self.set_channels(channels)?;
        Ok(self)
    }

    pub fn with_audio_channels(mut self, channels: AudioChannelList) -> Result<Self> {
        self.set_audio_channels(channels)?;
        Ok(self)
    }

    pub fn with_video_quality(mut self, quality: Option<i32>) -> Result<Self> {
        self.set_video_quality(quality)?;
        Ok(self)
    }

    /// Rejects a header with an empty display window, a non-positive pixel aspect ratio, or a
    /// display window not contained by the data window.
    pub fn sanity_check(&self) -> Result<()> {
        let data_window = self.data_window()?;
        let display_window = self.display_window()?;

        if display_window.is_empty() {
            return argument_error("header has an empty display window");
        }

        let par = self.pixel_aspect_ratio()?;
        if par.numerator() <= 0 {
            return argument_error("header has a non-positive pixel aspect ratio");
        }

        // A display window wider than the data window is permitted (it simply means some of the
        // display area has no backing pixel data); only a display window that starts before the
        // data window is nonsensical.
        if display_window.min.x < data_window.min.x || display_window.min.y < data_window.min.y {
            return argument_error("display window starts outside the data window");
        }

        Ok(())
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_header_has_sane_defaults() {
        let header = Header::new(64, 64).unwrap();
        assert_eq!(header.width().unwrap(), 64);
        assert_eq!(header.frame_rate().unwrap(), Rational::new(24, 1).unwrap());
        assert_eq!(header.video_compression().unwrap(), VideoCompression::Png);
    }

    #[test]
    fn reinserting_with_a_different_type_is_an_error() {
        let mut header = Header::new(64, 64).unwrap();
        assert!(header.insert(DURATION, Attribute::String("oops".into())).is_err());
    }

    #[test]
    fn sanity_check_rejects_empty_display_window() {
        let mut header = Header::new(64, 64).unwrap();
        header.insert(DISPLAY_WINDOW, Attribute::Box2i(Box2i::from_dimensions(0, 0))).unwrap();
        assert!(header.sanity_check().is_err());
    }

    #[test]
    fn video_quality_absence_means_lossless() {
        let mut header = Header::new(64, 64).unwrap();
        assert_eq!(header.video_quality().unwrap(), None);

        header.set_video_quality(Some(50)).unwrap();
        assert_eq!(header.video_quality().unwrap(), Some(50));

        header.set_video_quality(None).unwrap();
        assert_eq!(header.video_quality().unwrap(), None);
    }

    #[test]
    fn video_quality_rejects_out_of_range() {
        let mut header = Header::new(64, 64).unwrap();
        assert!(header.set_video_quality(Some(101)).is_err());
    }

    #[test]
    fn sampled_window_defaults_to_data_window() {
        let header = Header::new(64, 64).unwrap();
        assert_eq!(header.sampled_window().unwrap(), header.data_window().unwrap());
    }

    #[test]
    fn builder_methods_chain() {
        let header = Header::new(64, 64)
            .unwrap()
            .with_frame_rate(Rational::new(30000, 1001).unwrap())
            .unwrap()
            .with_video_quality(Some(80))
            .unwrap();

        assert_eq!(header.frame_rate().unwrap(), Rational::new(30000, 1001).unwrap());
        assert_eq!(header.video_quality().unwrap(), Some(80));
    }
}
