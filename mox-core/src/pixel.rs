// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pixel sample formats for video channels.

/// The storage format of one video channel sample.
///
/// Variants are ordered the way the original plug-in ABI numbered them; callers that persist the
/// discriminant (descriptor UL construction, MXF essence coding) must not renumber this enum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PixelType {
    /// 8-bit unsigned integer, full range 0-255.
    U8,
    /// 10-bit unsigned integer, full range 0-1023, stored in 16 bits.
    U10,
    /// 12-bit unsigned integer, full range 0-4095, stored in 16 bits.
    U12,
    /// 16-bit unsigned integer, full range 0-65535.
    U16,
    /// 16-bit unsigned integer, Adobe's half-range convention (0-32768, i.e. white = 32768 not
    /// 65535). Kept distinct from `U16` because the two are not bit-compatible.
    U16Adobe,
    /// 32-bit unsigned integer. Used for ID/index channels, never color.
    U32,
    /// 16-bit IEEE 754 binary16 float.
    Half,
    /// 32-bit IEEE 754 binary32 float.
    Float,
}

impl PixelType {
    /// All pixel types, in their canonical numbering order.
    pub const ALL: [PixelType; 8] = [
        PixelType::U8,
        PixelType::U10,
        PixelType::U12,
        PixelType::U16,
        PixelType::U16Adobe,
        PixelType::U32,
        PixelType::Half,
        PixelType::Float,
    ];

    /// Size of one sample of this type, in bytes.
    pub fn size(&self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::U10 | PixelType::U12 | PixelType::U16 | PixelType::U16Adobe => 2,
            PixelType::U32 => 4,
            PixelType::Half => 2,
            PixelType::Float => 4,
        }
    }

    /// The number of significant bits of precision the type carries, independent of its storage
    /// size (e.g. `U10` is stored in 2 bytes but carries 10 bits).
    pub fn bit_depth(&self) -> u32 {
        match self {
            PixelType::U8 => 8,
            PixelType::U10 => 10,
            PixelType::U12 => 12,
            PixelType::U16 | PixelType::U16Adobe => 16,
            PixelType::U32 => 32,
            PixelType::Half => 16,
            PixelType::Float => 32,
        }
    }

    /// `true` for the floating point representations.
    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::Half | PixelType::Float)
    }

    /// The maximum integer code value representing white, or `None` for floating point types
    /// (whose white point is always `1.0`).
    pub fn white_point(&self) -> Option<u32> {
        match self {
            PixelType::U8 => Some(0xFF),
            PixelType::U10 => Some(0x3FF),
            PixelType::U12 => Some(0xFFF),
            PixelType::U16 => Some(0xFFFF),
            PixelType::U16Adobe => Some(0x8000),
            PixelType::U32 => Some(u32::MAX),
            PixelType::Half | PixelType::Float => None,
        }
    }
}

/// Converts a code value from one pixel type's native range into another's, following the
/// integer/float promotion rules.
///
/// `value` is a *code value* in `from`'s own range (e.g. `0.0..=255.0` for [`PixelType::U8`]),
/// not a normalized `0.0..=1.0` quantity — this is the same convention [`crate::frame::Slice::get`]
/// and [`crate::frame::Slice::set`] use, so callers can round-trip a sample straight from one
/// slice's `get` into another's `set` through this function.
pub fn convert_value(value: f64, from: PixelType, to: PixelType) -> f64 {
    if from == to {
        return value;
    }

    match (from.is_float(), to.is_float()) {
        // Integer -> float: normalize by the source's white point.
        (false, true) => {
            let src_white = from.white_point().unwrap_or(1) as f64;
            value / src_white
        }
        // Float -> integer: clamp to [0, 1], scale by the destination's white point, round
        // half-up. `set` below clips again, but rounding here keeps the half-up rule exact.
        (true, false) => {
            let dst_white = to.white_point().unwrap_or(1) as f64;
            (value.max(0.0).min(1.0) * dst_white + 0.5).floor()
        }
        // Float -> float: both families are already normalized to the same 0..1 range.
        (true, true) => value,
        // Integer -> integer: same depth and range convention is a direct copy (handled by the
        // `from == to` shortcut above); U16Adobe's half range is a dedicated promote/demote
        // step; otherwise shift by the bit-depth difference.
        (false, false) => convert_integer(value, from, to),
    }
}

fn convert_integer(value: f64, from: PixelType, to: PixelType) -> f64 {
    use PixelType::*;

    match (from, to) {
        // Adobe's half-range 16-bit integer promotes/demotes at 16-bit depth by a conditional
        // shift, not a flat factor of two: values above the half-range threshold lose their low
        // bit to the rounding on the way up (and gain it back rounded on the way down), matching
        // the bit-for-bit behaviour of the plug-in ABI this type mirrors.
        (U16Adobe, U16) => {
            let val = value.round() as i64;
            let promoted = if val > 16384 { ((val - 1) << 1) + 1 } else { val << 1 };
            promoted as f64
        }
        (U16, U16Adobe) => {
            let val = value.round() as i64;
            let demoted = if val > 32768 { ((val - 1) >> 1) + 1 } else { val >> 1 };
            demoted as f64
        }

        _ => {
            let from_depth = from.bit_depth();
            let to_depth = to.bit_depth();
            let v = value.round() as i64;

            if to_depth > from_depth {
                let diff = to_depth - from_depth;
                let shifted = v << diff;
                let filled = if diff <= from_depth { v >> (from_depth - diff) } else { 0 };
                (shifted | filled) as f64
            }
            else {
                let diff = from_depth - to_depth;
                (v >> diff) as f64
            }
        }
    }
}
