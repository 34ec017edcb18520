// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uncompressed RGBA video: every sample stored at its native width, channels packed
//! interleaved-per-pixel in a fixed R, G, B, A order, big-endian.

use mox_core::channels::ChannelList;
use mox_core::codec::{
    VideoCodec, VideoCodecInfo, VideoCodecQueues, CHANNELS_A, CHANNELS_RGB, CHANNELS_RGBA,
};
use mox_core::data::DataChunk;
use mox_core::descriptor::{Descriptor, RgbaDescriptor, RgbaLayoutItem, VideoDescriptor};
use mox_core::errors::{argument_error, input_error, logic_error, Error, Result};
use mox_core::frame::{FrameBuffer, Slice};
use mox_core::header::Header;
use mox_core::pixel::PixelType;
use mox_core::threads::task_group;

/// SMPTE 377M E.2.46's sentinel depth values for the two component kinds that don't carry their
/// bit count directly in the depth field.
const DEPTH_FLOAT: u8 = 254;
const DEPTH_HALF: u8 = 253;

/// The wire depth byte for one pixel type, or `None` for a type this codec cannot store.
fn layout_depth(pixel_type: PixelType) -> Option<u8> {
    match pixel_type {
        PixelType::U8 => Some(8),
        PixelType::U16 => Some(16),
        PixelType::Float => Some(DEPTH_FLOAT),
        PixelType::U10 | PixelType::U12 | PixelType::U16Adobe | PixelType::U32 | PixelType::Half => None,
    }
}

/// The number of storage bits a wire depth byte implies, inverting the `254`/`253` sentinels.
fn layout_bits(depth: u8) -> u32 {
    match depth {
        DEPTH_FLOAT => 32,
        DEPTH_HALF => 16,
        other => other as u32,
    }
}

fn pixel_type_from_depth(depth: u8) -> Result<PixelType> {
    match depth {
        8 => Ok(PixelType::U8),
        16 => Ok(PixelType::U16),
        DEPTH_FLOAT => Ok(PixelType::Float),
        other => input_error(format!("uncompressed RGBA codec cannot store a component of depth {other}")),
    }
}

/// One component this codec packs into the wire format: which channel it reads from/writes to
/// (its full, possibly layer-prefixed name) and at what pixel type.
#[derive(Clone, Debug)]
struct ChannelBits {
    name: String,
    code: u8,
    pixel_type: PixelType,
}

/// Fixed scan order the original encoder used when looking for components in a caller's channel
/// list: red first, then green, then blue, then alpha.
const COMPONENT_ORDER: [(u8, &str); 4] = [
    (RgbaLayoutItem::RED, "R"),
    (RgbaLayoutItem::GREEN, "G"),
    (RgbaLayoutItem::BLUE, "B"),
    (RgbaLayoutItem::ALPHA, "A"),
];

/// `"light1.R"` belongs to layer `"light1"` and matches component suffix `"R"`; a bare `"R"`
/// matches too. Channel detection is by suffix because [`crate::mox_mxf`]'s layer grouping keeps
/// each shape group's members under their full, possibly-prefixed name.
fn bare_suffix(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => name,
    }
}

/// Negotiates which pixel types this codec accepts. Only 8-bit, 16-bit, and IEEE float components
/// have a wire representation; `compressed_type` rounds everything else to the nearest of those.
pub struct UncompressedVideoCodecInfo;

impl VideoCodecInfo for UncompressedVideoCodecInfo {
    fn can_compress_type(&self, pixel_type: PixelType) -> bool {
        matches!(pixel_type, PixelType::U8 | PixelType::U16 | PixelType::Float)
    }

    fn compressed_type(&self, pixel_type: PixelType) -> Result<PixelType> {
        match pixel_type {
            PixelType::U8 => Ok(PixelType::U8),
            PixelType::U10 | PixelType::U12 | PixelType::U16 | PixelType::U16Adobe => Ok(PixelType::U16),
            PixelType::Half | PixelType::Float => Ok(PixelType::Float),
            // An identifier channel must round-trip as itself or not be stored at all; rounding
            // it up to a float would silently corrupt index/ID values.
            PixelType::U32 => logic_error("uncompressed RGBA codec cannot store a U32 channel"),
        }
    }

    fn channel_capabilities(&self) -> mox_core::codec::ChannelCapabilities {
        CHANNELS_RGB | CHANNELS_RGBA | CHANNELS_A
    }

    fn create_compressor(&self, header: &Header, channels: &ChannelList) -> Result<Box<dyn VideoCodec>> {
        let mut channel_vec = Vec::new();

        for (code, suffix) in COMPONENT_ORDER {
            let found = channels.iter().find(|(name, _)| bare_suffix(name) == suffix);

            if let Some((name, channel)) = found {
                if !self.can_compress_type(channel.pixel_type) {
                    return logic_error(format!(
                        "uncompressed RGBA codec cannot store channel {name}'s pixel type"
                    ));
                }

                channel_vec.push(ChannelBits { name: name.to_string(), code, pixel_type: channel.pixel_type });
            }
        }

        if channel_vec.is_empty() {
            return logic_error("uncompressed RGBA codec found no R, G, B, or A channel to compress");
        }

        if channel_vec.len() != channels.len() {
            return logic_error("uncompressed RGBA codec only handles R, G, B, and A channels");
        }

        let data_window = header.data_window()?;
        let display_window = header.display_window()?;
        let sampled_window = header.sampled_window()?;

        let mut descriptor =
            RgbaDescriptor::new(header.frame_rate()?, data_window.width() as u32, data_window.height() as u32);
        descriptor.video.stored = data_window;
        descriptor.video.display = display_window;
        descriptor.video.sampled = sampled_window;
        descriptor.video.alpha_transparency = channel_vec.iter().any(|c| c.code == RgbaLayoutItem::ALPHA);

        let mut bits_per_pixel = 0u32;
        for chanbit in &channel_vec {
            let depth = layout_depth(chanbit.pixel_type)
                .expect("pixel type already validated by can_compress_type");
            descriptor.pixel_layout.push(RgbaLayoutItem::new(chanbit.code, depth));
            bits_per_pixel += layout_bits(depth);
        }

        if bits_per_pixel % 8 != 0 {
            return logic_error("uncompressed RGBA codec requires a byte-aligned pixel layout");
        }

        Ok(Box::new(UncompressedVideoCodec {
            descriptor,
            channel_vec,
            queues: VideoCodecQueues::new(),
        }))
    }

    fn create_decompressor(
        &self,
        descriptor: &Descriptor,
        _header: &mut Header,
        channels: &mut ChannelList,
    ) -> Result<Box<dyn VideoCodec>> {
        let descriptor = match descriptor {
            Descriptor::Rgba(r) => r.clone(),
            _ => return input_error("uncompressed video codec expects an RGBA descriptor"),
        };

        let mut channel_vec = Vec::new();

        for item in &descriptor.pixel_layout {
            if item.code == RgbaLayoutItem::FILL {
                continue;
            }

            let pixel_type = pixel_type_from_depth(item.depth)?;
            // The descriptor only ever carries bare component codes; any layer grouping is the
            // container's concern, not the codec's, so the channel this codec exports is always
            // named by its bare single-character code.
            let name = (item.code as char).to_string();

            channels.insert(name.clone(), mox_core::channels::Channel::new(pixel_type));
            channel_vec.push(ChannelBits { name, code: item.code, pixel_type });
        }

        if channel_vec.is_empty() {
            return input_error("uncompressed RGBA descriptor has no R, G, B, or A component");
        }

        Ok(Box::new(UncompressedVideoCodec {
            descriptor,
            channel_vec,
            queues: VideoCodecQueues::new(),
        }))
    }
}

/// Encodes/decodes one stream of uncompressed RGBA video. Each instance is either a compressor
/// (built by [`UncompressedVideoCodecInfo::create_compressor`]) or a decompressor (built by
/// [`UncompressedVideoCodecInfo::create_decompressor`]); never both.
pub struct UncompressedVideoCodec {
    descriptor: RgbaDescriptor,
    channel_vec: Vec<ChannelBits>,
    queues: VideoCodecQueues,
}

impl UncompressedVideoCodec {
    fn pixel_size(&self) -> usize {
        self.channel_vec.iter().map(|c| c.pixel_type.size()).sum()
    }
}

impl VideoCodec for UncompressedVideoCodec {
    fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor.video
    }

    fn container_descriptor(&self) -> Descriptor {
        Descriptor::Rgba(self.descriptor.clone())
    }

    fn compress(&mut self, frame: &FrameBuffer) -> Result<()> {
        if *frame.data_window() != self.descriptor.video.stored {
            return argument_error("frame does not match this codec's stored window");
        }

        for chanbit in &self.channel_vec {
            let channel = frame
                .find_slice(&chanbit.name)
                .ok_or_else(|| Error::Logic(format!("frame is missing channel {}", chanbit.name)))?;

            if channel.pixel_type != chanbit.pixel_type {
                return logic_error(format!(
                    "channel {} changed pixel type after negotiation",
                    chanbit.name
                ));
            }
        }

        let width = frame.width();
        let height = frame.height();
        let pixel_size = self.pixel_size();
        let rowbytes = width as usize * pixel_size;
        let data = DataChunk::zeroed(rowbytes * height as usize);

        let channel_vec = &self.channel_vec;
        task_group(|scope| {
            for y in 0..height {
                let data = data.clone();
                scope.spawn(move |_| {
                    let _ = compress_row(channel_vec, pixel_size, frame, y, rowbytes, &data);
                });
            }
        });

        self.queues.store_data(data);
        Ok(())
    }

    fn next_data(&mut self) -> Option<DataChunk> {
        self.queues.next_data()
    }

    fn decompress(&mut self, data: &DataChunk) -> Result<()> {
        let width = self.descriptor.video.width() as i32;
        let height = self.descriptor.video.height() as i32;
        let pixel_size = self.pixel_size();
        let rowbytes = width as usize * pixel_size;

        if data.len() != rowbytes * height as usize {
            return input_error("uncompressed RGBA packet size does not match the frame geometry");
        }

        let mut frame = FrameBuffer::new(self.descriptor.video.stored)?;
        for chanbit in &self.channel_vec {
            frame.insert(chanbit.name.clone(), Slice::allocate(chanbit.pixel_type, width, height)?);
        }

        let channel_vec = &self.channel_vec;
        task_group(|scope| {
            for y in 0..height {
                scope.spawn(move |_| {
                    let _ = decompress_row(channel_vec, pixel_size, &frame, y, width, rowbytes, data);
                });
            }
        });

        self.queues.store_frame(frame);
        Ok(())
    }

    fn next_frame(&mut self) -> Option<FrameBuffer> {
        self.queues.next_frame()
    }
}

/// Packs one scanline's worth of channels into `data`, channels interleaved per-pixel in
/// `channel_vec`'s order, each component big-endian at its native width.
fn compress_row(
    channel_vec: &[ChannelBits],
    pixel_size: usize,
    frame: &FrameBuffer,
    y: i32,
    rowbytes: usize,
    data: &DataChunk,
) -> Result<()> {
    let width = frame.width();
    let mut bytes = data.lock();
    let mut offset = 0usize;

    for chanbit in channel_vec {
        let slice = frame
            .find_slice(&chanbit.name)
            .ok_or_else(|| Error::Logic(format!("frame is missing channel {}", chanbit.name)))?;
        let comp_size = chanbit.pixel_type.size();

        for x in 0..width {
            let value = slice.get(x, y)?;
            let pos = y as usize * rowbytes + x as usize * pixel_size + offset;
            write_component(&mut bytes[pos..pos + comp_size], chanbit.pixel_type, value);
        }

        offset += comp_size;
    }

    Ok(())
}

/// Unpacks one scanline's worth of channels out of `data` into a fresh, contiguous per-channel
/// slice in `frame`. Mirror image of [`compress_row`].
fn decompress_row(
    channel_vec: &[ChannelBits],
    pixel_size: usize,
    frame: &FrameBuffer,
    y: i32,
    width: i32,
    rowbytes: usize,
    data: &DataChunk,
) -> Result<()> {
    let bytes = data.lock();
    let mut offset = 0usize;

    for chanbit in channel_vec {
        let slice = frame
            .find_slice(&chanbit.name)
            .ok_or_else(|| Error::Logic(format!("decoded frame is missing channel {}", chanbit.name)))?;
        let comp_size = chanbit.pixel_type.size();

        for x in 0..width {
            let pos = y as usize * rowbytes + x as usize * pixel_size + offset;
            let value = read_component(&bytes[pos..pos + comp_size], chanbit.pixel_type);
            slice.set(x, y, value)?;
        }

        offset += comp_size;
    }

    Ok(())
}

fn write_component(dest: &mut [u8], pixel_type: PixelType, value: f64) {
    match pixel_type {
        PixelType::U8 => dest[0] = clip(value, 0.0, 255.0) as u8,
        PixelType::U16 => {
            let v = clip(value, 0.0, 65535.0) as u16;
            dest[0] = (v >> 8) as u8;
            dest[1] = v as u8;
        }
        PixelType::Float => {
            let bits = (value as f32).to_bits();
            dest[0] = (bits >> 24) as u8;
            dest[1] = (bits >> 16) as u8;
            dest[2] = (bits >> 8) as u8;
            dest[3] = bits as u8;
        }
        _ => unreachable!("uncompressed RGBA only ever stores U8, U16, or Float components"),
    }
}

fn read_component(src: &[u8], pixel_type: PixelType) -> f64 {
    match pixel_type {
        PixelType::U8 => src[0] as f64,
        PixelType::U16 => (((src[0] as u16) << 8) | src[1] as u16) as f64,
        PixelType::Float => {
            let bits = ((src[0] as u32) << 24) | ((src[1] as u32) << 16) | ((src[2] as u32) << 8) | src[3] as u32;
            f32::from_bits(bits) as f64
        }
        _ => unreachable!("uncompressed RGBA only ever stores U8, U16, or Float components"),
    }
}

fn clip(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mox_core::channels::Channel;
    use mox_core::units::Rational;

    fn test_header(width: i32, height: i32) -> Header {
        Header::new(width, height).unwrap()
    }

    #[test]
    fn compresses_and_decompresses_an_rgb_frame() {
        let info = UncompressedVideoCodecInfo;
        let header = test_header(4, 2);

        let mut channels = ChannelList::new();
        channels.insert("R", Channel::new(PixelType::U8));
        channels.insert("G", Channel::new(PixelType::U8));
        channels.insert("B", Channel::new(PixelType::U8));

        let mut compressor = info.create_compressor(&header, &channels).unwrap();

        let mut frame = FrameBuffer::with_dimensions(4, 2).unwrap();
        frame.insert("R", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        frame.insert("G", Slice::allocate(PixelType::U8, 4, 2).unwrap());
        frame.insert("B", Slice::allocate(PixelType::U8, 4, 2).unwrap());

        for y in 0..2 {
            for x in 0..4 {
                frame.find_slice("R").unwrap().set(x, y, 10.0).unwrap();
                frame.find_slice("G").unwrap().set(x, y, 20.0).unwrap();
                frame.find_slice("B").unwrap().set(x, y, 30.0).unwrap();
            }
        }

        compressor.compress(&frame).unwrap();
        let packet = compressor.next_data().unwrap();
        assert_eq!(packet.len(), 4 * 2 * 3);

        let descriptor = compressor.container_descriptor();
        let mut decompress_header = test_header(4, 2);
        let mut decoded_channels = ChannelList::new();
        let mut decompressor =
            info.create_decompressor(&descriptor, &mut decompress_header, &mut decoded_channels).unwrap();

        assert!(decoded_channels.find_channel("R").is_some());

        decompressor.decompress(&packet).unwrap();
        let decoded = decompressor.next_frame().unwrap();

        assert_eq!(decoded.find_slice("R").unwrap().get(2, 1).unwrap(), 10.0);
        assert_eq!(decoded.find_slice("G").unwrap().get(2, 1).unwrap(), 20.0);
        assert_eq!(decoded.find_slice("B").unwrap().get(2, 1).unwrap(), 30.0);
    }

    #[test]
    fn layered_channel_names_are_matched_by_bare_suffix() {
        let info = UncompressedVideoCodecInfo;
        let header = test_header(2, 2);

        let mut channels = ChannelList::new();
        channels.insert("light1.R", Channel::new(PixelType::U16));
        channels.insert("light1.G", Channel::new(PixelType::U16));
        channels.insert("light1.B", Channel::new(PixelType::U16));

        let compressor = info.create_compressor(&header, &channels).unwrap();
        assert_eq!(compressor.descriptor().width(), 2);
    }

    #[test]
    fn rejects_a_channel_list_with_no_rgba_members() {
        let info = UncompressedVideoCodecInfo;
        let header = test_header(2, 2);

        let mut channels = ChannelList::new();
        channels.insert("depth", Channel::new(PixelType::Float));

        assert!(info.create_compressor(&header, &channels).is_err());
    }

    #[test]
    fn decompressor_exports_bare_channel_names_even_for_rgba() {
        let info = UncompressedVideoCodecInfo;
        let mut descriptor = RgbaDescriptor::new(Rational::new(24, 1).unwrap(), 2, 2);
        descriptor.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::RED, 8));
        descriptor.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::GREEN, 8));
        descriptor.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::BLUE, 8));
        descriptor.pixel_layout.push(RgbaLayoutItem::new(RgbaLayoutItem::ALPHA, 8));

        let mut header = test_header(2, 2);
        let mut channels = ChannelList::new();
        let _ = info
            .create_decompressor(&Descriptor::Rgba(descriptor), &mut header, &mut channels)
            .unwrap();

        assert!(channels.find_channel("R").is_some());
        assert!(channels.find_channel("A").is_some());
        assert!(channels.find_channel("light1.R").is_none());
    }
}
