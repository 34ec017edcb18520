// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A [`Slice`] addresses one channel's worth of pixels inside a shared [`DataChunk`].

use crate::data::DataChunk;
use crate::errors::{argument_error, Result};
use crate::pixel::PixelType;

/// Describes the memory layout of one channel ("slice", in frame-buffer terms) of image data.
///
/// The address of pixel `(x, y)` within [`Slice::data`] is
///
/// ```text
/// base + (x / x_sampling) * x_stride + (y / y_sampling) * y_stride
/// ```
///
/// where `x_stride`/`y_stride` are counted in samples of `pixel_type`, not bytes — this mirrors
/// the original pointer-stride convention while staying representable as a safe integer offset
/// into `data`.
#[derive(Clone, Debug)]
pub struct Slice {
    pub pixel_type: PixelType,
    data: DataChunk,
    /// Offset of pixel `(0, 0)`, in samples.
    base: isize,
    x_stride: isize,
    y_stride: isize,
    pub x_sampling: i32,
    pub y_sampling: i32,
    /// Value used to fill this slice when the source frame has no matching channel.
    pub fill_value: f64,
}

impl Slice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pixel_type: PixelType,
        data: DataChunk,
        base: isize,
        x_stride: isize,
        y_stride: isize,
    ) -> Self {
        Slice {
            pixel_type,
            data,
            base,
            x_stride,
            y_stride,
            x_sampling: 1,
            y_sampling: 1,
            fill_value: 0.0,
        }
    }

    pub fn with_sampling(mut self, x_sampling: i32, y_sampling: i32) -> Self {
        self.x_sampling = x_sampling;
        self.y_sampling = y_sampling;
        self
    }

    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Allocates a fresh, contiguous slice covering `width` x `height` pixels of `pixel_type`,
    /// with row-major `y_stride = width` and `x_stride = 1` (both in samples).
    pub fn allocate(pixel_type: PixelType, width: i32, height: i32) -> Result<Self> {
        if width < 1 || height < 1 {
            return argument_error("slice dimensions must be positive");
        }

        let samples = (width as usize) * (height as usize);
        let data = DataChunk::zeroed(samples * pixel_type.size());

        Ok(Slice::new(pixel_type, data, 0, 1, width as isize))
    }

    fn offset(&self, x: i32, y: i32) -> isize {
        let xp = (x / self.x_sampling) as isize;
        let yp = (y / self.y_sampling) as isize;

        self.base + xp * self.x_stride + yp * self.y_stride
    }

    fn byte_range(&self, x: i32, y: i32) -> Result<std::ops::Range<usize>> {
        let sample_offset = self.offset(x, y);

        if sample_offset < 0 {
            return argument_error("pixel address resolves before the start of the slice");
        }

        let start = sample_offset as usize * self.pixel_type.size();
        let end = start + self.pixel_type.size();

        if end > self.data.len() {
            return argument_error("pixel address resolves past the end of the slice");
        }

        Ok(start..end)
    }

    /// Reads the sample at `(x, y)` as `f64`, regardless of storage type.
    pub fn get(&self, x: i32, y: i32) -> Result<f64> {
        let range = self.byte_range(x, y)?;
        let bytes = self.data.lock();
        let raw = &bytes[range];

        Ok(match self.pixel_type {
            PixelType::U8 => raw[0] as f64,
            PixelType::U10 | PixelType::U12 | PixelType::U16 | PixelType::U16Adobe => {
                u16::from_le_bytes([raw[0], raw[1]]) as f64
            }
            PixelType::U32 => u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            PixelType::Half => {
                f64::from(half::f16::from_le_bytes([raw[0], raw[1]]))
            }
            PixelType::Float => f64::from(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        })
    }

    /// Writes `value` into the sample at `(x, y)`, clipping to the type's representable range
    /// (floating point types are stored as-is, without clipping).
    pub fn set(&self, x: i32, y: i32, value: f64) -> Result<()> {
        let range = self.byte_range(x, y)?;
        let mut bytes = self.data.lock();
        let dest = &mut bytes[range];

        match self.pixel_type {
            PixelType::U8 => dest[0] = clip(value, 0.0, 255.0) as u8,
            PixelType::U10 => {
                dest.copy_from_slice(&(clip(value, 0.0, 1023.0) as u16).to_le_bytes())
            }
            PixelType::U12 => {
                dest.copy_from_slice(&(clip(value, 0.0, 4095.0) as u16).to_le_bytes())
            }
            PixelType::U16 => {
                dest.copy_from_slice(&(clip(value, 0.0, 65535.0) as u16).to_le_bytes())
            }
            PixelType::U16Adobe => {
                dest.copy_from_slice(&(clip(value, 0.0, 32768.0) as u16).to_le_bytes())
            }
            PixelType::U32 => {
                dest.copy_from_slice(&(clip(value, 0.0, u32::MAX as f64) as u32).to_le_bytes())
            }
            PixelType::Half => {
                dest.copy_from_slice(&half::f16::from_f64(value).to_le_bytes())
            }
            PixelType::Float => dest.copy_from_slice(&(value as f32).to_le_bytes()),
        }

        Ok(())
    }
}

fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}
