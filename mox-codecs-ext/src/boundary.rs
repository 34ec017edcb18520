// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A [`VideoCodecInfo`]/[`VideoCodec`] pair that negotiates the right file descriptor for a
//! compression scheme without implementing its algorithm.
//!
//! Every codec in this crate is a real third-party format (PNG, the JPEG family, DPX, OpenEXR,
//! Dirac, MPEG-2) that a production deployment links a real encoder/decoder for and registers at
//! [`mox_core::codec::Tier::Preferred`], shadowing the stub registered here. What `mox` owns is
//! the boundary: which descriptor a scheme serializes to, which channel layouts it accepts, and
//! the container label a muxer writes. `compress`/`decompress` exist only to satisfy the
//! [`VideoCodec`] trait and always fail.

use mox_core::channels::ChannelList;
use mox_core::codec::{ChannelCapabilities, VideoCodec, VideoCodecInfo};
use mox_core::data::DataChunk;
use mox_core::descriptor::{CdciDescriptor, Descriptor, MpegDescriptor, RgbaDescriptor, Ul};
use mox_core::errors::{input_error, no_impl_error, Result};
use mox_core::frame::FrameBuffer;
use mox_core::header::Header;
use mox_core::pixel::PixelType;
use mox_core::units::Rational;

/// Which concrete descriptor family a boundary codec's container uses.
#[derive(Copy, Clone, Debug)]
pub enum ContainerShape {
    Cdci { horizontal_subsampling: u32, vertical_subsampling: u32 },
    Rgba,
    Mpeg { horizontal_subsampling: u32, vertical_subsampling: u32 },
}

/// Capability negotiation for one externally-implemented compression scheme.
pub struct BoundaryVideoCodecInfo {
    name: &'static str,
    essence_container: Ul,
    capabilities: ChannelCapabilities,
    shape: ContainerShape,
}

impl BoundaryVideoCodecInfo {
    pub const fn new(
        name: &'static str,
        essence_container: Ul,
        capabilities: ChannelCapabilities,
        shape: ContainerShape,
    ) -> Self {
        BoundaryVideoCodecInfo { name, essence_container, capabilities, shape }
    }

    fn build_container(&self, rate: Rational, width: u32, height: u32) -> Descriptor {
        match self.shape {
            ContainerShape::Cdci { horizontal_subsampling, vertical_subsampling } => {
                let mut d = CdciDescriptor::new(rate, width, height, horizontal_subsampling, vertical_subsampling);
                d.video.generic.essence_container = self.essence_container;
                Descriptor::Cdci(d)
            }
            ContainerShape::Rgba => {
                let mut d = RgbaDescriptor::new(rate, width, height);
                d.video.generic.essence_container = self.essence_container;
                Descriptor::Rgba(d)
            }
            ContainerShape::Mpeg { horizontal_subsampling, vertical_subsampling } => {
                let mut d = MpegDescriptor::new(rate, width, height, horizontal_subsampling, vertical_subsampling);
                d.cdci.video.generic.essence_container = self.essence_container;
                Descriptor::Mpeg(d)
            }
        }
    }
}

impl VideoCodecInfo for BoundaryVideoCodecInfo {
    fn can_compress_type(&self, _pixel_type: PixelType) -> bool {
        true
    }

    fn channel_capabilities(&self) -> ChannelCapabilities {
        self.capabilities
    }

    fn create_compressor(&self, header: &Header, channels: &ChannelList) -> Result<Box<dyn VideoCodec>> {
        if channels.is_empty() {
            return input_error(format!("{} codec requires at least one channel", self.name));
        }

        let container = self.build_container(header.frame_rate()?, header.width()? as u32, header.height()? as u32);
        Ok(Box::new(BoundaryVideoCodec { name: self.name, container }))
    }

    fn create_decompressor(
        &self,
        descriptor: &Descriptor,
        _header: &mut Header,
        _channels: &mut ChannelList,
    ) -> Result<Box<dyn VideoCodec>> {
        match descriptor {
            Descriptor::Cdci(_) | Descriptor::Rgba(_) | Descriptor::Mpeg(_) => {
                Ok(Box::new(BoundaryVideoCodec { name: self.name, container: descriptor.clone() }))
            }
            _ => input_error(format!("{} codec expects a video descriptor", self.name)),
        }
    }
}

/// A constructed, never-functional compressor/decompressor for one boundary scheme. Holds just
/// enough to answer [`VideoCodec::descriptor`]/[`VideoCodec::container_descriptor`]; a muxer or
/// demuxer can still negotiate tracks and inspect geometry for a scheme nothing implements yet.
struct BoundaryVideoCodec {
    name: &'static str,
    container: Descriptor,
}

impl BoundaryVideoCodec {
    fn video(&self) -> &mox_core::descriptor::VideoDescriptor {
        match &self.container {
            Descriptor::Cdci(d) => &d.video,
            Descriptor::Rgba(d) => &d.video,
            Descriptor::Mpeg(d) => &d.cdci.video,
            _ => unreachable!("BoundaryVideoCodec is only ever constructed with a video descriptor"),
        }
    }

    fn not_implemented(&self) -> Result<()> {
        no_impl_error(format!(
            "{} has no compression algorithm built into mox; register a third-party VideoCodec for it",
            self.name
        ))
    }
}

impl VideoCodec for BoundaryVideoCodec {
    fn descriptor(&self) -> &mox_core::descriptor::VideoDescriptor {
        self.video()
    }

    fn container_descriptor(&self) -> Descriptor {
        self.container.clone()
    }

    fn compress(&mut self, _frame: &FrameBuffer) -> Result<()> {
        self.not_implemented()
    }

    fn next_data(&mut self) -> Option<DataChunk> {
        None
    }

    fn decompress(&mut self, _data: &DataChunk) -> Result<()> {
        self.not_implemented()
    }

    fn next_frame(&mut self) -> Option<FrameBuffer> {
        None
    }
}
