// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SMPTE Universal Labels: the 16-byte identifiers that tag essence containers, picture/sound
//! essence coding, and capture gamma in a file descriptor.

/// A SMPTE Universal Label: a 16-byte, dot-structured identifier per SMPTE 298M.
///
/// An unrecognized label read from a file is kept verbatim (`UL::Unknown`) rather than rejected
/// — files routinely carry vendor-specific or newer-than-us labels in fields `mox` doesn't
/// otherwise interpret, and only the label's presence (not its meaning) usually matters on
/// read. Writing always requires a concrete label.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ul(pub [u8; 16]);

impl Ul {
    pub const fn new(bytes: [u8; 16]) -> Self {
        Ul(bytes)
    }

    pub fn bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// SMPTE 379M essence container label for frame-wrapped uncompressed CDCI picture essence.
pub const UNCOMPRESSED_CDCI_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x01, 0x02, 0x01]);

/// SMPTE 379M essence container label for frame-wrapped uncompressed RGBA picture essence.
pub const UNCOMPRESSED_RGBA_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x02, 0x01, 0x00]);

/// SMPTE 381-2 essence container label for frame-wrapped MPEG2 picture essence.
pub const MPEG2_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x04, 0x01, 0x02]);

/// SMPTE 382M essence container label for frame-wrapped BWF (PCM) sound essence.
pub const BWF_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x06, 0x01, 0x00]);

/// SMPTE 382M essence container label for frame-wrapped AES3 sound essence.
pub const AES3_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x06, 0x02, 0x00]);

/// SMPTE RP224 essence coding label for uncompressed picture essence.
pub const UNCOMPRESSED_PICTURE_CODING: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x02, 0x04, 0x01, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00]);

/// SMPTE RP224 sound-compression label for uncompressed PCM sound essence.
pub const UNCOMPRESSED_SOUND_CODING: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00]);

/// Essence container label for frame-wrapped PNG picture essence (boundary-only codec; see
/// `mox-codecs-ext`).
pub const PNG_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x01, 0x00]);

/// Essence container label for frame-wrapped JPEG (ISO/IEC 10918) picture essence.
pub const JPEG_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x02, 0x00]);

/// Essence container label for frame-wrapped JPEG 2000 picture essence.
pub const JPEG2000_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x03, 0x00]);

/// Essence container label for frame-wrapped JPEG-LS picture essence.
pub const JPEG_LS_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x04, 0x00]);

/// Essence container label for frame-wrapped DPX picture essence.
pub const DPX_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x05, 0x00]);

/// Essence container label for frame-wrapped OpenEXR picture essence.
pub const OPENEXR_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x06, 0x00]);

/// Essence container label for frame-wrapped Dirac picture essence.
pub const DIRAC_CONTAINER: Ul =
    Ul::new([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x07, 0x07, 0x00]);
