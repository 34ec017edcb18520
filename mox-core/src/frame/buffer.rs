// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`FrameBuffer`]: a named collection of [`Slice`]s covering a shared data window, plus format
//! conversion between frame buffers.

use indexmap::IndexMap;

use crate::data::DataChunk;
use crate::errors::{argument_error, logic_error, Result};
use crate::frame::slice::Slice;
use crate::frame::ycbcr;
use crate::threads::task_group;
use crate::units::Box2i;

/// Which RGB <-> YCbCr matrix a frame buffer's `Y`/`Cb`/`Cr` slices were (or should be) encoded
/// with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Coefficients {
    Rec601,
    Rec601FullRange,
    #[default]
    Rec709,
    Rec709FullRange,
}

/// A set of named [`Slice`]s that together describe one frame's worth of pixels over a
/// rectangular data window.
///
/// Slices are stored in insertion order, matching [`crate::channels::ChannelList`]. A buffer
/// also holds onto any [`DataChunk`]s attached to it via [`FrameBuffer::attach_data`], purely to
/// keep their storage alive for as long as the buffer itself is alive.
pub struct FrameBuffer {
    data_window: Box2i,
    slices: IndexMap<String, Slice>,
    coefficients: Coefficients,
    attached: Vec<DataChunk>,
}

impl FrameBuffer {
    /// Creates an empty frame buffer over `data_window`. Fails if the window is empty.
    pub fn new(data_window: Box2i) -> Result<Self> {
        if data_window.is_empty() {
            return argument_error("invalid dimensions for FrameBuffer");
        }

        Ok(FrameBuffer {
            data_window,
            slices: IndexMap::new(),
            coefficients: Coefficients::default(),
            attached: Vec::new(),
        })
    }

    pub fn with_dimensions(width: i32, height: i32) -> Result<Self> {
        if width < 1 || height < 1 {
            return argument_error("invalid dimensions for FrameBuffer");
        }

        FrameBuffer::new(Box2i::from_dimensions(width, height))
    }

    pub fn data_window(&self) -> &Box2i {
        &self.data_window
    }

    pub fn width(&self) -> i32 {
        self.data_window.width()
    }

    pub fn height(&self) -> i32 {
        self.data_window.height()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    /// Keeps `chunk` alive for as long as this buffer is alive. Used when a slice's `DataChunk`
    /// was allocated by the caller rather than by [`Slice::allocate`].
    pub fn attach_data(&mut self, chunk: DataChunk) {
        self.attached.push(chunk);
    }

    pub fn insert(&mut self, name: impl Into<String>, slice: Slice) {
        self.slices.insert(name.into(), slice);
    }

    pub fn find_slice(&self, name: &str) -> Option<&Slice> {
        self.slices.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slice)> {
        self.slices.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn is_ycbcr(&self) -> bool {
        self.slices.contains_key("Y") && self.slices.contains_key("Cb") && self.slices.contains_key("Cr")
    }

    /// Fills `self` from `other`, converting between RGB and YCbCr representations when the two
    /// buffers disagree about which one they hold, and otherwise copying same-named slices
    /// sample for sample.
    ///
    /// Pixels inside `self`'s data window but outside `other`'s are left untouched unless
    /// `fill_missing` is set, in which case they're set to each destination slice's
    /// [`Slice::fill_value`] (the original library's "fill before copying" rule).
    pub fn copy_from_frame(&mut self, other: &FrameBuffer, fill_missing: bool) -> Result<()> {
        let dw = self.data_window;

        let needs_fill_pass = dw.min.x < other.data_window.min.x
            || dw.min.y < other.data_window.min.y
            || dw.max.x > other.data_window.max.x
            || dw.max.y > other.data_window.max.y;

        if needs_fill_pass {
            task_group(|scope| {
                for (name, slice) in self.slices.iter() {
                    if fill_missing || other.find_slice(name).is_some() {
                        scope.spawn(move |_| {
                            let _ = fill_slice(slice, &dw);
                        });
                    }
                }
            });
        }

        let copy_box = dw.intersect(&other.data_window);

        if copy_box.is_empty() {
            return Ok(());
        }

        if self.is_ycbcr() == other.is_ycbcr() {
            if self.is_ycbcr() && self.coefficients != other.coefficients {
                return logic_error("copying between differing YCbCr coefficient standards is not supported");
            }

            self.copy_matching_slices(other, &copy_box, fill_missing, &[])?;
        }
        else if self.is_ycbcr() && !other.is_ycbcr() {
            let fwd = forward_matrix(self.coefficients);
            self.convert_rgb_to_ycbcr(other, &copy_box, &fwd)?;
            self.copy_matching_slices(other, &copy_box, fill_missing, &["Y", "Cb", "Cr"])?;
        }
        else {
            let inv = ycbcr::invert_coefficients(&forward_matrix(other.coefficients));
            self.convert_ycbcr_to_rgb(other, &copy_box, &inv)?;
            self.copy_matching_slices(other, &copy_box, fill_missing, &["R", "G", "B"])?;
        }

        Ok(())
    }

    fn copy_matching_slices(
        &self,
        other: &FrameBuffer,
        copy_box: &Box2i,
        fill_missing: bool,
        skip: &[&str],
    ) -> Result<()> {
        task_group(|scope| {
            for (name, slice) in self.slices.iter() {
                if skip.contains(&name) {
                    continue;
                }

                if let Some(other_slice) = other.find_slice(name) {
                    scope.spawn(move |_| {
                        let _ = copy_slice(slice, other_slice, copy_box);
                    });
                }
                else if fill_missing {
                    scope.spawn(move |_| {
                        let _ = fill_slice(slice, copy_box);
                    });
                }
            }
        });

        Ok(())
    }

    fn convert_rgb_to_ycbcr(
        &self,
        other: &FrameBuffer,
        copy_box: &Box2i,
        fwd: &ycbcr::RgbToYCbCr,
    ) -> Result<()> {
        let (y_s, cb_s, cr_s) = (
            self.find_slice("Y"),
            self.find_slice("Cb"),
            self.find_slice("Cr"),
        );
        let (r_s, g_s, b_s) = (
            other.find_slice("R"),
            other.find_slice("G"),
            other.find_slice("B"),
        );

        match (y_s, cb_s, cr_s, r_s, g_s, b_s) {
            (Some(y), Some(cb), Some(cr), Some(r), Some(g), Some(b)) => {
                task_group(|scope| {
                    for row in copy_box.min.y..=copy_box.max.y {
                        scope.spawn(move |_| {
                            let _ = convert_row_rgb_to_ycbcr(y, cb, cr, r, g, b, copy_box, fwd, row);
                        });
                    }
                });
                Ok(())
            }
            _ => logic_error("RGB to YCbCr conversion requires R, G, B, Y, Cb, and Cr slices"),
        }
    }

    fn convert_ycbcr_to_rgb(
        &self,
        other: &FrameBuffer,
        copy_box: &Box2i,
        inv: &ycbcr::YCbCrToRgb,
    ) -> Result<()> {
        let (r_s, g_s, b_s) = (
            self.find_slice("R"),
            self.find_slice("G"),
            self.find_slice("B"),
        );
        let (y_s, cb_s, cr_s) = (
            other.find_slice("Y"),
            other.find_slice("Cb"),
            other.find_slice("Cr"),
        );

        match (r_s, g_s, b_s, y_s, cb_s, cr_s) {
            (Some(r), Some(g), Some(b), Some(y), Some(cb), Some(cr)) => {
                task_group(|scope| {
                    for row in copy_box.min.y..=copy_box.max.y {
                        scope.spawn(move |_| {
                            let _ = convert_row_ycbcr_to_rgb(r, g, b, y, cb, cr, copy_box, inv, row);
                        });
                    }
                });
                Ok(())
            }
            _ => logic_error("YCbCr to RGB conversion requires Y, Cb, Cr, R, G, and B slices"),
        }
    }
}

fn forward_matrix(coefficients: Coefficients) -> ycbcr::RgbToYCbCr {
    match coefficients {
        Coefficients::Rec601 => ycbcr::rec601(),
        Coefficients::Rec601FullRange => ycbcr::rec601_full_range(),
        Coefficients::Rec709 => ycbcr::rec709(),
        Coefficients::Rec709FullRange => ycbcr::rec709_full_range(),
    }
}

fn fill_slice(slice: &Slice, dw: &Box2i) -> Result<()> {
    debug_assert!(slice.x_sampling == 1 && slice.y_sampling == 1);

    for y in dw.min.y..=dw.max.y {
        for x in dw.min.x..=dw.max.x {
            slice.set(x, y, slice.fill_value)?;
        }
    }

    Ok(())
}

fn copy_slice(dest: &Slice, src: &Slice, copy_box: &Box2i) -> Result<()> {
    for y in copy_box.min.y..=copy_box.max.y {
        for x in copy_box.min.x..=copy_box.max.x {
            let value = src.get(x, y)?;
            dest.set(x, y, crate::pixel::convert_value(value, src.pixel_type, dest.pixel_type))?;
        }
    }

    Ok(())
}

/// `co`'s `y_add`/`c_add` are calibrated on an 8-bit (0-255) code value scale; rescale them to
/// whatever white point `pixel_type` actually uses before adding them to its samples.
fn working_range_offset(offset: f64, pixel_type: crate::pixel::PixelType) -> f64 {
    let max = pixel_type.white_point().unwrap_or(1) as f64;
    offset * max / 255.0
}

#[allow(clippy::too_many_arguments)]
fn convert_row_rgb_to_ycbcr(
    y_slice: &Slice,
    cb_slice: &Slice,
    cr_slice: &Slice,
    r_slice: &Slice,
    g_slice: &Slice,
    b_slice: &Slice,
    dw: &Box2i,
    co: &ycbcr::RgbToYCbCr,
    row: i32,
) -> Result<()> {
    let round = if y_slice.pixel_type.is_float() { 0.0 } else { 0.5 };

    let y_add = working_range_offset(co.y_add, y_slice.pixel_type);
    let cb_add = working_range_offset(co.c_add, cb_slice.pixel_type);
    let cr_add = working_range_offset(co.c_add, cr_slice.pixel_type);

    for x in dw.min.x..=dw.max.x {
        let (r, g, b) = (r_slice.get(x, row)?, g_slice.get(x, row)?, b_slice.get(x, row)?);

        y_slice.set(x, row, y_add + co.yr * r + co.yg * g + co.yb * b + round)?;
        cb_slice.set(x, row, cb_add + co.cbr * r + co.cbg * g + co.cbb * b + round)?;
        cr_slice.set(x, row, cr_add + co.crr * r + co.crg * g + co.crb * b + round)?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn convert_row_ycbcr_to_rgb(
    r_slice: &Slice,
    g_slice: &Slice,
    b_slice: &Slice,
    y_slice: &Slice,
    cb_slice: &Slice,
    cr_slice: &Slice,
    dw: &Box2i,
    co: &ycbcr::YCbCrToRgb,
    row: i32,
) -> Result<()> {
    let round = if r_slice.pixel_type.is_float() { 0.0 } else { 0.5 };

    let y_sub = working_range_offset(co.y_sub, y_slice.pixel_type);
    let cb_sub = working_range_offset(co.c_sub, cb_slice.pixel_type);
    let cr_sub = working_range_offset(co.c_sub, cr_slice.pixel_type);

    for x in dw.min.x..=dw.max.x {
        let (y, cb, cr) = (y_slice.get(x, row)?, cb_slice.get(x, row)?, cr_slice.get(x, row)?);

        let yv = y - y_sub;
        let cbv = cb - cb_sub;
        let crv = cr - cr_sub;

        r_slice.set(x, row, co.ry * yv + co.rcb * cbv + co.rcr * crv + round)?;
        g_slice.set(x, row, co.gy * yv + co.gcb * cbv + co.gcr * crv + round)?;
        b_slice.set(x, row, co.by * yv + co.bcb * cbv + co.bcr * crv + round)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelType;

    fn rgb_buffer(width: i32, height: i32, r: f64, g: f64, b: f64) -> FrameBuffer {
        let mut fb = FrameBuffer::with_dimensions(width, height).unwrap();

        for (name, value) in [("R", r), ("G", g), ("B", b)] {
            let slice = Slice::allocate(PixelType::U8, width, height).unwrap();
            for y in 0..height {
                for x in 0..width {
                    slice.set(x, y, value).unwrap();
                }
            }
            fb.insert(name, slice);
        }

        fb
    }

    #[test]
    fn rgb_to_ycbcr_to_rgb_round_trips_within_one_code_value() {
        let rgb = rgb_buffer(4, 4, 180.0, 90.0, 40.0);

        let mut ycbcr = FrameBuffer::with_dimensions(4, 4).unwrap();
        ycbcr.set_coefficients(Coefficients::Rec709);
        for name in ["Y", "Cb", "Cr"] {
            ycbcr.insert(name, Slice::allocate(PixelType::U8, 4, 4).unwrap());
        }
        ycbcr.copy_from_frame(&rgb, true).unwrap();

        let mut back = rgb_buffer(4, 4, 0.0, 0.0, 0.0);
        back.copy_from_frame(&ycbcr, true).unwrap();

        for name in ["R", "G", "B"] {
            let expected = back.find_slice(name).unwrap().get(1, 1).unwrap();
            let original = rgb.find_slice(name).unwrap().get(1, 1).unwrap();
            assert!((expected - original).abs() <= 1.0, "{name}: {expected} vs {original}");
        }
    }

    #[test]
    fn rgb_to_ycbcr_to_rgb_round_trips_at_sixteen_bit() {
        let mut rgb = FrameBuffer::with_dimensions(2, 2).unwrap();
        for (name, value) in [("R", 46080.0), ("G", 23040.0), ("B", 10240.0)] {
            let slice = Slice::allocate(PixelType::U16, 2, 2).unwrap();
            for y in 0..2 {
                for x in 0..2 {
                    slice.set(x, y, value).unwrap();
                }
            }
            rgb.insert(name, slice);
        }

        let mut ycbcr = FrameBuffer::with_dimensions(2, 2).unwrap();
        ycbcr.set_coefficients(Coefficients::Rec709);
        for name in ["Y", "Cb", "Cr"] {
            ycbcr.insert(name, Slice::allocate(PixelType::U16, 2, 2).unwrap());
        }
        ycbcr.copy_from_frame(&rgb, true).unwrap();

        let mut back = FrameBuffer::with_dimensions(2, 2).unwrap();
        for name in ["R", "G", "B"] {
            back.insert(name, Slice::allocate(PixelType::U16, 2, 2).unwrap());
        }
        back.copy_from_frame(&ycbcr, true).unwrap();

        for name in ["R", "G", "B"] {
            let expected = back.find_slice(name).unwrap().get(0, 0).unwrap();
            let original = rgb.find_slice(name).unwrap().get(0, 0).unwrap();
            assert!((expected - original).abs() <= 256.0, "{name}: {expected} vs {original}");
        }
    }

    #[test]
    fn same_color_space_copy_is_exact() {
        let a = rgb_buffer(2, 2, 10.0, 20.0, 30.0);
        let mut b = FrameBuffer::with_dimensions(2, 2).unwrap();
        for name in ["R", "G", "B"] {
            b.insert(name, Slice::allocate(PixelType::U8, 2, 2).unwrap());
        }
        b.copy_from_frame(&a, true).unwrap();

        assert_eq!(b.find_slice("R").unwrap().get(0, 0).unwrap(), 10.0);
        assert_eq!(b.find_slice("G").unwrap().get(0, 0).unwrap(), 20.0);
        assert_eq!(b.find_slice("B").unwrap().get(0, 0).unwrap(), 30.0);
    }

    #[test]
    fn copy_outside_source_window_fills_with_fill_value() {
        let small = rgb_buffer(2, 2, 100.0, 100.0, 100.0);
        let mut big = FrameBuffer::with_dimensions(4, 4).unwrap();
        for name in ["R", "G", "B"] {
            let slice = Slice::allocate(PixelType::U8, 4, 4).unwrap().with_fill_value(0.0);
            big.insert(name, slice);
        }
        big.copy_from_frame(&small, true).unwrap();

        assert_eq!(big.find_slice("R").unwrap().get(3, 3).unwrap(), 0.0);
        assert_eq!(big.find_slice("R").unwrap().get(0, 0).unwrap(), 100.0);
    }
}
