// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`AudioBuffer`]: a fixed-length, named collection of [`AudioSlice`]s, each with its own
//! playhead.

use indexmap::IndexMap;

use crate::audio::slice::AudioSlice;
use crate::data::DataChunk;
use crate::errors::{argument_error, Result};
use crate::threads::task_group;

/// A fixed-length set of named audio channels.
///
/// Each channel carries its own playhead — the position [`AudioBuffer::fast_forward`] advances
/// and [`AudioBuffer::read_from_buffer`] consumes from — so channels can be drained at different
/// rates, matching how a demuxer might decode one channel ahead of another.
pub struct AudioBuffer {
    length: u64,
    slices: IndexMap<String, AudioSlice>,
    playheads: IndexMap<String, u64>,
    attached: Vec<DataChunk>,
}

impl AudioBuffer {
    pub fn new(length: u64) -> Self {
        AudioBuffer {
            length,
            slices: IndexMap::new(),
            playheads: IndexMap::new(),
            attached: Vec::new(),
        }
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn attach_data(&mut self, chunk: DataChunk) {
        self.attached.push(chunk);
    }

    pub fn insert(&mut self, name: impl Into<String>, slice: AudioSlice) {
        let name = name.into();
        self.playheads.insert(name.clone(), 0);
        self.slices.insert(name, slice);
    }

    pub fn find_slice(&self, name: &str) -> Option<&AudioSlice> {
        self.slices.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AudioSlice)> {
        self.slices.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The channel's slice as seen from its current playhead: reading sample 0 of the returned
    /// slice reads the buffer's playhead position.
    pub fn playhead_slice(&self, name: &str) -> Result<AudioSlice> {
        let slice = self
            .slices
            .get(name)
            .ok_or_else(|| ())
            .map_err(|_| crate::errors::Error::Null(format!("no audio channel named {name}")))?;

        let playhead = self.playheads[name];

        Ok(slice.offset_by(playhead as i64))
    }

    /// Samples left to read on every channel, before any has reached `length`. Used to bound how
    /// much a caller can safely consume with `read_from_buffer` without per-channel bookkeeping.
    pub fn remaining(&self) -> u64 {
        self.playheads.values().map(|&p| self.length.saturating_sub(p)).min().unwrap_or(0)
    }

    pub fn remaining_named(&self, name: &str) -> Result<u64> {
        let playhead = *self
            .playheads
            .get(name)
            .ok_or_else(|| crate::errors::Error::Null(format!("no audio channel named {name}")))?;

        Ok(self.length.saturating_sub(playhead))
    }

    /// Advances every channel's playhead by `samples`.
    pub fn fast_forward(&mut self, samples: u64) -> Result<()> {
        for name in self.playheads.keys().cloned().collect::<Vec<_>>() {
            self.fast_forward_named(&name, samples)?;
        }
        Ok(())
    }

    pub fn fast_forward_named(&mut self, name: &str, samples: u64) -> Result<()> {
        let playhead = self
            .playheads
            .get_mut(name)
            .ok_or_else(|| crate::errors::Error::Null(format!("no audio channel named {name}")))?;

        let advanced = *playhead + samples;

        if advanced > self.length {
            return argument_error(format!("fast_forward past the end of channel {name}"));
        }

        *playhead = advanced;
        Ok(())
    }

    pub fn rewind(&mut self) {
        for playhead in self.playheads.values_mut() {
            *playhead = 0;
        }
    }

    /// Copies up to `samples` from each channel of `other` (starting at `other`'s own playhead)
    /// into the matching channel of `self`, starting at `self`'s playhead, and advances *both*
    /// buffers' playheads by the number of samples actually copied.
    ///
    /// If `samples` is `0`, copies as many as `self.remaining()` allows. Channels present in
    /// `self` but absent from `other` are left untouched unless `fill_missing` is set, in which
    /// case they read as silence.
    pub fn read_from_buffer(
        &mut self,
        other: &mut AudioBuffer,
        samples: u64,
        fill_missing: bool,
    ) -> Result<u64> {
        let count = if samples == 0 { self.remaining().min(other.remaining()) } else { samples };

        self.copy_from_buffer_impl(other, count, fill_missing)?;

        self.fast_forward(count)?;
        other.fast_forward(count)?;

        Ok(count)
    }

    /// Like [`AudioBuffer::read_from_buffer`], but does not advance `other`'s playheads.
    pub fn copy_from_buffer(&mut self, other: &AudioBuffer, samples: u64, fill_missing: bool) -> Result<u64> {
        let count = if samples == 0 { self.remaining().min(other.remaining()) } else { samples };

        self.copy_from_buffer_impl(other, count, fill_missing)?;
        self.fast_forward(count)?;

        Ok(count)
    }

    fn copy_from_buffer_impl(&self, other: &AudioBuffer, count: u64, fill_missing: bool) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        task_group(|scope| {
            for (name, _) in self.slices.iter() {
                if let Ok(dest) = self.playhead_slice(name) {
                    if let Ok(src) = other.playhead_slice(name) {
                        scope.spawn(move |_| {
                            for i in 0..count {
                                if let Ok(v) = src.get(i) {
                                    let _ = dest.set(i, v);
                                }
                            }
                        });
                    }
                    else if fill_missing {
                        scope.spawn(move |_| {
                            for i in 0..count {
                                let _ = dest.set(i, 0.0);
                            }
                        });
                    }
                }
            }
        });

        Ok(())
    }

    /// Fills every channel's unread remainder with silence and advances every playhead to the
    /// end.
    pub fn fill_remaining(&mut self) -> Result<()> {
        for name in self.playheads.keys().cloned().collect::<Vec<_>>() {
            self.fill_remaining_named(&name)?;
        }
        Ok(())
    }

    pub fn fill_remaining_named(&mut self, name: &str) -> Result<()> {
        let remaining = self.remaining_named(name)?;
        let slice = self.playhead_slice(name)?;

        for i in 0..remaining {
            slice.set(i, 0.0)?;
        }

        self.fast_forward_named(name, remaining)
    }
}
