// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel metadata and the ordered lists that describe a frame buffer's or audio buffer's
//! layout.

use indexmap::IndexMap;

use crate::pixel::PixelType;
use crate::sample::SampleType;

/// Metadata for one video channel: its storage type, subsampling, and a compression hint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub pixel_type: PixelType,
    /// A pixel `(x, y)` is present in this channel only if `x % x_sampling == 0 && y %
    /// y_sampling == 0`. Both fields must be positive.
    pub x_sampling: i32,
    pub y_sampling: i32,
    /// Hint to lossy codecs that perception of this channel's quantity is closer to linear than
    /// logarithmic (chroma channels, typically) or vice versa (luminance, typically).
    pub p_linear: bool,
}

impl Channel {
    pub fn new(pixel_type: PixelType) -> Self {
        Channel { pixel_type, x_sampling: 1, y_sampling: 1, p_linear: false }
    }

    pub fn with_sampling(mut self, x_sampling: i32, y_sampling: i32) -> Self {
        self.x_sampling = x_sampling;
        self.y_sampling = y_sampling;
        self
    }

    pub fn with_linear_hint(mut self, p_linear: bool) -> Self {
        self.p_linear = p_linear;
        self
    }
}

/// Metadata for one audio channel: its sample storage type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AudioChannel {
    pub sample_type: SampleType,
}

impl AudioChannel {
    pub fn new(sample_type: SampleType) -> Self {
        AudioChannel { sample_type }
    }
}

/// An insertion-ordered, name-keyed list of channels.
///
/// Ordering is preserved rather than alphabetized: two lists built by inserting the same
/// channels in a different order are distinct values, which is how `mox` round-trips the channel
/// order a caller or a decoded bitstream produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelList {
    channels: IndexMap<String, Channel>,
}

impl ChannelList {
    pub fn new() -> Self {
        ChannelList { channels: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Inserts or overwrites a channel. Insertion order is preserved for new keys; re-inserting
    /// an existing key updates the value in place without moving it.
    pub fn insert(&mut self, name: impl Into<String>, channel: Channel) {
        self.channels.insert(name.into(), channel);
    }

    pub fn erase(&mut self, name: &str) {
        self.channels.shift_remove(name);
    }

    pub fn find_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn find_channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    /// Iterates channels in insertion order, as `(name, channel)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Channel)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The set of distinct layer names present, sorted alphabetically.
    ///
    /// A channel `"light1.R"` belongs to layer `"light1"`; a name with no `.`, or with one only
    /// at the very start or end, belongs to no layer.
    pub fn layers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .keys()
            .filter_map(|name| layer_of(name).map(str::to_owned))
            .collect();

        names.sort();
        names.dedup();
        names
    }

    /// Channels whose name begins with `prefix`, in list order.
    pub fn channels_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Channel)> {
        self.channels
            .iter()
            .filter(move |(name, _)| name.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Channels belonging to `layer_name`, i.e. with prefix `"{layer_name}."`.
    pub fn channels_in_layer<'a>(
        &'a self,
        layer_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Channel)> {
        let prefix = format!("{}.", layer_name);
        self.channels
            .iter()
            .filter(move |(name, _)| name.starts_with(&prefix))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// The well-known channel names for a count of {1, 2, 6}; `Channel1`..`ChannelN` otherwise.
pub fn standard_audio_channel_names(count: u32) -> Vec<String> {
    match count {
        1 => vec!["Mono".to_string()],
        2 => vec!["Left".to_string(), "Right".to_string()],
        6 => ["Left", "Right", "Center", "RearLeft", "RearRight", "LFE"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        n => (1..=n).map(|i| format!("Channel{i}")).collect(),
    }
}

fn layer_of(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;

    if dot == 0 || dot == name.len() - 1 {
        None
    }
    else {
        Some(&name[..dot])
    }
}

/// An insertion-ordered, name-keyed list of audio channels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioChannelList {
    channels: IndexMap<String, AudioChannel>,
}

impl AudioChannelList {
    pub fn new() -> Self {
        AudioChannelList { channels: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, channel: AudioChannel) {
        self.channels.insert(name.into(), channel);
    }

    pub fn erase(&mut self, name: &str) {
        self.channels.shift_remove(name);
    }

    pub fn find_channel(&self, name: &str) -> Option<&AudioChannel> {
        self.channels.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioChannel)> {
        self.channels.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_not_alphabetical() {
        let mut list = ChannelList::new();
        list.insert("B", Channel::new(PixelType::U16));
        list.insert("G", Channel::new(PixelType::U16));
        list.insert("R", Channel::new(PixelType::U16));

        let names: Vec<&str> = list.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "G", "R"]);
    }

    #[test]
    fn layer_prefix_rules() {
        let mut list = ChannelList::new();
        list.insert("light1.R", Channel::new(PixelType::U16));
        list.insert("light1.G", Channel::new(PixelType::U16));
        list.insert("light2.R", Channel::new(PixelType::U16));
        list.insert("R", Channel::new(PixelType::U16));
        list.insert(".leadingdot", Channel::new(PixelType::U16));
        list.insert("trailingdot.", Channel::new(PixelType::U16));

        assert_eq!(list.layers(), vec!["light1".to_string(), "light2".to_string()]);

        let in_light1: Vec<&str> = list.channels_in_layer("light1").map(|(n, _)| n).collect();
        assert_eq!(in_light1, vec!["light1.R", "light1.G"]);
    }

    #[test]
    fn standard_audio_channel_names_cover_the_well_known_counts() {
        assert_eq!(standard_audio_channel_names(1), vec!["Mono"]);
        assert_eq!(standard_audio_channel_names(2), vec!["Left", "Right"]);
        assert_eq!(
            standard_audio_channel_names(6),
            vec!["Left", "Right", "Center", "RearLeft", "RearRight", "LFE"]
        );
        assert_eq!(standard_audio_channel_names(3), vec!["Channel1", "Channel2", "Channel3"]);
    }

    #[test]
    fn reinserting_existing_key_does_not_move_it() {
        let mut list = ChannelList::new();
        list.insert("A", Channel::new(PixelType::U8));
        list.insert("B", Channel::new(PixelType::U8));
        list.insert("A", Channel::new(PixelType::Float));

        let names: Vec<&str> = list.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(list.find_channel("A").unwrap().pixel_type, PixelType::Float);
    }
}
