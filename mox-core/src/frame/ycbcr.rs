// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB <-> YCbCr matrix coefficients for the four [`crate::frame::Coefficients`] standards.
//!
//! The forward (RGB to YCbCr) matrices are transcribed directly from the ITU-R BT.601-7 and
//! BT.709-6 recommendations at full precision; the inverse matrices are the analytic 3x3
//! inverse of the forward matrix, snapped to exactly `0.0` or `1.0` wherever within `1e-7` of
//! either, since that's where the recommendations' own rounding would otherwise leave a visible
//! speck of noise in a round trip.

/// Forward RGB -> YCbCr coefficients, plus the 8-bit-scale additive offsets for luma (`y_add`)
/// and chroma (`c_add`).
#[derive(Copy, Clone, Debug)]
pub struct RgbToYCbCr {
    pub yr: f64,
    pub yg: f64,
    pub yb: f64,
    pub cbr: f64,
    pub cbg: f64,
    pub cbb: f64,
    pub crr: f64,
    pub crg: f64,
    pub crb: f64,
    pub y_add: f64,
    pub c_add: f64,
}

/// Inverse YCbCr -> RGB coefficients, plus the 8-bit-scale subtractive offsets.
#[derive(Copy, Clone, Debug)]
pub struct YCbCrToRgb {
    pub ry: f64,
    pub rcb: f64,
    pub rcr: f64,
    pub gy: f64,
    pub gcb: f64,
    pub gcr: f64,
    pub by: f64,
    pub bcb: f64,
    pub bcr: f64,
    pub y_sub: f64,
    pub c_sub: f64,
}

fn invert(fwd: &RgbToYCbCr) -> YCbCrToRgb {
    let (a, b, c) = (fwd.yr, fwd.yg, fwd.yb);
    let (d, e, f) = (fwd.cbr, fwd.cbg, fwd.cbb);
    let (g, h, i) = (fwd.crr, fwd.crg, fwd.crb);

    let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);

    let mut inv = [
        [(e * i - f * h) / det, (c * h - b * i) / det, (b * f - c * e) / det],
        [(f * g - d * i) / det, (a * i - c * g) / det, (c * d - a * f) / det],
        [(d * h - e * g) / det, (b * g - a * h) / det, (a * e - b * d) / det],
    ];

    for row in inv.iter_mut() {
        for val in row.iter_mut() {
            if (*val - 1.0).abs() < 0.0000001 {
                *val = 1.0;
            }
            else if val.abs() < 0.0000001 {
                *val = 0.0;
            }
        }
    }

    YCbCrToRgb {
        ry: inv[0][0],
        rcb: inv[0][1],
        rcr: inv[0][2],
        gy: inv[1][0],
        gcb: inv[1][1],
        gcr: inv[1][2],
        by: inv[2][0],
        bcb: inv[2][1],
        bcr: inv[2][2],
        y_sub: fwd.y_add,
        c_sub: fwd.c_add,
    }
}

/// BT.601 full-range forward coefficients (the "studio" BT.601 matrix is this one scaled to the
/// 16-235/16-240 footroom/headroom convention, see [`rec601`]).
pub fn rec601_full_range() -> RgbToYCbCr {
    RgbToYCbCr {
        yr: 0.299,
        yg: 0.587,
        yb: 0.114,
        cbr: -0.299 / 1.772,
        cbg: -0.587 / 1.772,
        cbb: (1.0 - 0.114) / 1.772,
        crr: (1.0 - 0.299) / 1.402,
        crg: -0.587 / 1.402,
        crb: -0.114 / 1.402,
        y_add: 0.0,
        c_add: 128.0,
    }
}

/// BT.601 studio-range ("broadcast safe", 16-235/16-240) forward coefficients.
pub fn rec601() -> RgbToYCbCr {
    scale_to_studio_range(&rec601_full_range())
}

/// BT.709 full-range forward coefficients.
pub fn rec709_full_range() -> RgbToYCbCr {
    RgbToYCbCr {
        yr: 0.2126,
        yg: 0.7152,
        yb: 0.0722,
        cbr: -0.2126 / 1.8556,
        cbg: -0.7152 / 1.8556,
        cbb: (1.0 - 0.0722) / 1.8556,
        crr: (1.0 - 0.2126) / 1.5748,
        crg: -0.7152 / 1.5748,
        crb: -0.0722 / 1.5748,
        y_add: 0.0,
        c_add: 128.0,
    }
}

/// BT.709 studio-range forward coefficients.
pub fn rec709() -> RgbToYCbCr {
    scale_to_studio_range(&rec709_full_range())
}

fn scale_to_studio_range(full: &RgbToYCbCr) -> RgbToYCbCr {
    const SY: f64 = 219.0 / 255.0;
    const SC: f64 = 224.0 / 255.0;

    RgbToYCbCr {
        yr: full.yr * SY,
        yg: full.yg * SY,
        yb: full.yb * SY,
        cbr: full.cbr * SC,
        cbg: full.cbg * SC,
        cbb: full.cbb * SC,
        crr: full.crr * SC,
        crg: full.crg * SC,
        crb: full.crb * SC,
        y_add: 16.0,
        c_add: 128.0,
    }
}

/// The inverse of `fwd`, with offsets snapped per [`invert`].
pub fn invert_coefficients(fwd: &RgbToYCbCr) -> YCbCrToRgb {
    invert(fwd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(fwd: &RgbToYCbCr, r: f64, g: f64, b: f64) -> (f64, f64, f64) {
        let inv = invert(fwd);

        let y = fwd.y_add + fwd.yr * r + fwd.yg * g + fwd.yb * b;
        let cb = fwd.c_add + fwd.cbr * r + fwd.cbg * g + fwd.cbb * b;
        let cr = fwd.c_add + fwd.crr * r + fwd.crg * g + fwd.crb * b;

        let r2 = inv.ry * (y - inv.y_sub) + inv.rcb * (cb - inv.c_sub) + inv.rcr * (cr - inv.c_sub);
        let g2 = inv.gy * (y - inv.y_sub) + inv.gcb * (cb - inv.c_sub) + inv.gcr * (cr - inv.c_sub);
        let b2 = inv.by * (y - inv.y_sub) + inv.bcb * (cb - inv.c_sub) + inv.bcr * (cr - inv.c_sub);

        (r2, g2, b2)
    }

    #[test]
    fn rec709_studio_round_trips_within_float_precision() {
        let (r, g, b) = round_trip(&rec709(), 180.0, 90.0, 40.0);
        assert!((r - 180.0).abs() < 1e-6);
        assert!((g - 90.0).abs() < 1e-6);
        assert!((b - 40.0).abs() < 1e-6);
    }

    #[test]
    fn rec601_full_range_round_trips() {
        let (r, g, b) = round_trip(&rec601_full_range(), 255.0, 128.0, 0.0);
        assert!((r - 255.0).abs() < 1e-6);
        assert!((g - 128.0).abs() < 1e-6);
        assert!((b - 0.0).abs() < 1e-6);
    }

    #[test]
    fn inverse_coefficients_snap_near_integers() {
        let inv = invert(&rec601_full_range());
        // R depends only on Cr in BT.601: Rcb should land on exactly 0.0.
        assert_eq!(inv.rcb, 0.0);
    }
}
