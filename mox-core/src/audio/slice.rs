// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A single channel's worth of interleaved or planar audio samples.

use crate::data::DataChunk;
use crate::errors::{argument_error, Result};
use crate::sample::SampleType;

/// Describes the memory layout of one audio channel.
///
/// Sample `n`'s address is `base + n * stride`, counted in samples of `sample_type` — the same
/// stride-in-samples convention [`crate::frame::Slice`] uses, which lets an interleaved buffer
/// (`stride == channel_count`) and a planar one (`stride == 1`) share the same type.
#[derive(Clone, Debug)]
pub struct AudioSlice {
    pub sample_type: SampleType,
    data: DataChunk,
    base: isize,
    stride: isize,
}

impl AudioSlice {
    pub fn new(sample_type: SampleType, data: DataChunk, base: isize, stride: isize) -> Self {
        AudioSlice { sample_type, data, base, stride }
    }

    /// Allocates a fresh, contiguous (`stride == 1`) slice of `length` samples.
    pub fn allocate(sample_type: SampleType, length: u64) -> Result<Self> {
        if length == 0 {
            return argument_error("audio slice length must be positive");
        }

        let data = DataChunk::zeroed(length as usize * sample_type.size());
        Ok(AudioSlice::new(sample_type, data, 0, 1))
    }

    /// Returns a view of this slice starting `samples` further along, for playhead advancement.
    pub fn offset_by(&self, samples: i64) -> AudioSlice {
        AudioSlice {
            sample_type: self.sample_type,
            data: self.data.clone(),
            base: self.base + samples as isize * self.stride,
            stride: self.stride,
        }
    }

    fn byte_range(&self, n: u64) -> Result<std::ops::Range<usize>> {
        let sample_offset = self.base + n as isize * self.stride;

        if sample_offset < 0 {
            return argument_error("audio sample address resolves before the start of the slice");
        }

        let start = sample_offset as usize * self.sample_type.size();
        let end = start + self.sample_type.size();

        if end > self.data.len() {
            return argument_error("audio sample address resolves past the end of the slice");
        }

        Ok(start..end)
    }

    /// Reads sample `n` as `f64`, with integer types normalized to `[-1.0, 1.0]`.
    pub fn get(&self, n: u64) -> Result<f64> {
        let range = self.byte_range(n)?;
        let bytes = self.data.lock();
        let raw = &bytes[range];

        Ok(match self.sample_type {
            SampleType::U8 => (raw[0] as f64 - 128.0) / i8::MAX as f64,
            SampleType::S16 => i16::from_le_bytes([raw[0], raw[1]]) as f64 / i16::MAX as f64,
            SampleType::S24 => {
                let v = i32::from_le_bytes([raw[0], raw[1], raw[2], 0]);
                let signed = (v << 8) >> 8; // sign-extend from 24 bits
                signed as f64 / 0x7F_FFFF as f64
            }
            SampleType::S32 => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64 / i32::MAX as f64,
            SampleType::Float => f64::from(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        })
    }

    /// Writes `value` (nominal range `[-1.0, 1.0]`) into sample `n`.
    pub fn set(&self, n: u64, value: f64) -> Result<()> {
        let range = self.byte_range(n)?;
        let mut bytes = self.data.lock();
        let dest = &mut bytes[range];
        let clipped = value.max(-1.0).min(1.0);

        match self.sample_type {
            SampleType::U8 => dest[0] = (clipped * i8::MAX as f64 + 128.0).round() as u8,
            SampleType::S16 => {
                dest.copy_from_slice(&((clipped * i16::MAX as f64).round() as i16).to_le_bytes())
            }
            SampleType::S24 => {
                let v = (clipped * 0x7F_FFFF as f64).round() as i32;
                dest.copy_from_slice(&v.to_le_bytes()[..3]);
            }
            SampleType::S32 => {
                dest.copy_from_slice(&((clipped * i32::MAX as f64).round() as i32).to_le_bytes())
            }
            SampleType::Float => dest.copy_from_slice(&(value as f32).to_le_bytes()),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_each_sample_type() {
        for &st in SampleType::ALL.iter() {
            let slice = AudioSlice::allocate(st, 8).unwrap();
            slice.set(3, 0.5).unwrap();
            assert!((slice.get(3).unwrap() - 0.5).abs() < 0.01, "{:?}", st);
        }
    }

    #[test]
    fn offset_by_shares_storage() {
        let slice = AudioSlice::allocate(SampleType::S16, 8).unwrap();
        slice.set(4, 0.25).unwrap();

        let shifted = slice.offset_by(4);
        assert!((shifted.get(0).unwrap() - 0.25).abs() < 0.01);
    }

    #[test]
    fn clips_out_of_range_values() {
        let slice = AudioSlice::allocate(SampleType::Float, 1).unwrap();
        slice.set(0, 5.0).unwrap();
        assert_eq!(slice.get(0).unwrap(), 5.0); // float storage is not clipped
    }
}
