// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

//! Descriptor-only negotiation for the video compression schemes `mox` treats as external
//! collaborators: PNG, the JPEG family, DPX, OpenEXR, Dirac, and MPEG-2.
//!
//! None of these codecs compress or decompress a single pixel — see [`boundary`] for why. A
//! deployment that actually needs one of these schemes links a real implementation and registers
//! it at [`mox_core::codec::Tier::Preferred`], which a [`CodecRegistry`] lookup prefers over the
//! stub [`register`] installs here.

mod boundary;

pub use boundary::{BoundaryVideoCodecInfo, ContainerShape};

use mox_core::codec::{CodecRegistry, CHANNELS_A, CHANNELS_ANY, CHANNELS_RGB, CHANNELS_RGBA, CHANNELS_YA};
use mox_core::descriptor::{
    DIRAC_CONTAINER, DPX_CONTAINER, JPEG2000_CONTAINER, JPEG_CONTAINER, JPEG_LS_CONTAINER,
    MPEG2_CONTAINER, OPENEXR_CONTAINER, PNG_CONTAINER,
};
use mox_core::header::VideoCompression;

/// PNG: lossless, RGB/RGBA/gray/gray+alpha, stored as an RGBA-family descriptor.
pub fn png_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "PNG",
        PNG_CONTAINER,
        CHANNELS_RGB | CHANNELS_RGBA | CHANNELS_YA | CHANNELS_A,
        ContainerShape::Rgba,
    )
}

/// Baseline/progressive JPEG: lossy, conventionally 4:2:2-subsampled CDCI.
pub fn jpeg_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "JPEG",
        JPEG_CONTAINER,
        CHANNELS_ANY,
        ContainerShape::Cdci { horizontal_subsampling: 2, vertical_subsampling: 1 },
    )
}

/// JPEG 2000: wavelet-based, conventionally 4:2:2-subsampled CDCI in a production chain.
pub fn jpeg2000_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "JPEG 2000",
        JPEG2000_CONTAINER,
        CHANNELS_ANY,
        ContainerShape::Cdci { horizontal_subsampling: 2, vertical_subsampling: 1 },
    )
}

/// JPEG-LS: lossless/near-lossless predictive coding, conventionally 4:4:4 CDCI.
pub fn jpeg_ls_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "JPEG-LS",
        JPEG_LS_CONTAINER,
        CHANNELS_ANY,
        ContainerShape::Cdci { horizontal_subsampling: 1, vertical_subsampling: 1 },
    )
}

/// DPX: digital picture exchange, conventionally carried as RGB.
pub fn dpx_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new("DPX", DPX_CONTAINER, CHANNELS_RGB | CHANNELS_RGBA, ContainerShape::Rgba)
}

/// OpenEXR: arbitrary-channel floating point, the one scheme besides uncompressed RGBA that
/// routinely carries layered/non-RGBA channel names.
pub fn openexr_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "OpenEXR",
        OPENEXR_CONTAINER,
        CHANNELS_RGB | CHANNELS_RGBA | CHANNELS_ANY,
        ContainerShape::Rgba,
    )
}

/// Dirac: wavelet-based, conventionally 4:2:2-subsampled CDCI.
pub fn dirac_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "Dirac",
        DIRAC_CONTAINER,
        CHANNELS_ANY,
        ContainerShape::Cdci { horizontal_subsampling: 2, vertical_subsampling: 1 },
    )
}

/// MPEG-2: long-GOP, conventionally 4:2:0-subsampled, refining CDCI through [`MpegDescriptor`].
///
/// [`MpegDescriptor`]: mox_core::descriptor::MpegDescriptor
pub fn mpeg_codec_info() -> BoundaryVideoCodecInfo {
    BoundaryVideoCodecInfo::new(
        "MPEG-2",
        MPEG2_CONTAINER,
        CHANNELS_ANY,
        ContainerShape::Mpeg { horizontal_subsampling: 2, vertical_subsampling: 2 },
    )
}

/// Registers every scheme in this crate at [`mox_core::codec::Tier::Standard`], so a caller that
/// wants only first-party codecs still gets `Descriptor`-accurate negotiation for every
/// compression scheme `mox-core` names, and so a caller registering a real implementation at
/// [`mox_core::codec::Tier::Preferred`] shadows exactly the scheme it cares about.
pub fn register(registry: &mut CodecRegistry) {
    registry.register_video_codec(VideoCompression::Png, Box::new(png_codec_info()));
    registry.register_video_codec(VideoCompression::Jpeg, Box::new(jpeg_codec_info()));
    registry.register_video_codec(VideoCompression::Jpeg2000, Box::new(jpeg2000_codec_info()));
    registry.register_video_codec(VideoCompression::JpegLs, Box::new(jpeg_ls_codec_info()));
    registry.register_video_codec(VideoCompression::Dpx, Box::new(dpx_codec_info()));
    registry.register_video_codec(VideoCompression::OpenExr, Box::new(openexr_codec_info()));
    registry.register_video_codec(VideoCompression::Dirac, Box::new(dirac_codec_info()));
    registry.register_video_codec(VideoCompression::Mpeg, Box::new(mpeg_codec_info()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_installs_every_scheme_mox_core_names() {
        let mut registry = CodecRegistry::new();
        register(&mut registry);

        for compression in [
            VideoCompression::Png,
            VideoCompression::Jpeg,
            VideoCompression::Jpeg2000,
            VideoCompression::JpegLs,
            VideoCompression::Dpx,
            VideoCompression::OpenExr,
            VideoCompression::Dirac,
            VideoCompression::Mpeg,
        ] {
            assert!(registry.video_codec_info(compression).is_ok());
        }
    }
}
