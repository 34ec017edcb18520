// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 32-bit SMPTE generic-container track number: `item_type ∥ total_of_that_item
//! ∥ element_type ∥ ordinal`, one byte each.

use mox_core::descriptor::Ul;
use mox_core::errors::{input_error, Result};

/// Generic container item type: picture essence.
pub const ITEM_TYPE_PICTURE: u8 = 0x15;
/// Generic container item type: sound essence.
pub const ITEM_TYPE_SOUND: u8 = 0x16;
/// Generic container item type: data essence (reserved; `mox` never writes this, kept for
/// completeness of the item-type table and to recognize it on read).
pub const ITEM_TYPE_DATA: u8 = 0x17;

/// A parsed SMPTE track number: which kind of essence a KLV essence packet's key identifies, and
/// which of possibly several same-kind tracks it is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackNumber {
    pub item_type: u8,
    /// How many tracks of `item_type` this file declares in total.
    pub item_count: u8,
    /// Distinguishes frame-wrapped flavors within one item type (uncompressed vs. MPEG vs. BWF
    /// vs. AES3, ...).
    pub element_type: u8,
    /// This track's 1-based position among tracks sharing `item_type`.
    pub ordinal: u8,
}

impl TrackNumber {
    pub fn new(item_type: u8, item_count: u8, element_type: u8, ordinal: u8) -> Self {
        TrackNumber { item_type, item_count, element_type, ordinal }
    }

    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.item_type, self.item_count, self.element_type, self.ordinal])
    }

    pub fn from_u32(value: u32) -> Self {
        let bytes = value.to_be_bytes();
        TrackNumber { item_type: bytes[0], item_count: bytes[1], element_type: bytes[2], ordinal: bytes[3] }
    }

    pub fn is_picture(&self) -> bool {
        self.item_type == ITEM_TYPE_PICTURE
    }

    pub fn is_sound(&self) -> bool {
        self.item_type == ITEM_TYPE_SOUND
    }

    /// The key an essence KLV packet for this track is written under: a fixed, locally-scoped
    /// 12-byte prefix followed by this track number's 4 bytes (see DESIGN.md; not a
    /// SMPTE-registered generic container element key).
    pub fn essence_key(self) -> Ul {
        let mut bytes = [0u8; 16];
        bytes[..12].copy_from_slice(&ESSENCE_KEY_PREFIX);
        bytes[12..].copy_from_slice(&self.to_u32().to_be_bytes());
        Ul::new(bytes)
    }

    /// Recovers the track number a [`TrackNumber::essence_key`] was built from, failing if
    /// `key` doesn't carry the expected prefix.
    pub fn from_essence_key(key: Ul) -> Result<Self> {
        let bytes = *key.bytes();
        if bytes[..12] != ESSENCE_KEY_PREFIX {
            return input_error("not an essence element key");
        }

        Ok(TrackNumber::from_u32(u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]])))
    }
}

const ESSENCE_KEY_PREFIX: [u8; 12] =
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u32() {
        let tn = TrackNumber::new(ITEM_TYPE_PICTURE, 1, 0x02, 1);
        assert_eq!(TrackNumber::from_u32(tn.to_u32()), tn);
    }

    #[test]
    fn byte_shape_matches_the_spec_layout() {
        let tn = TrackNumber::new(0x16, 2, 0x01, 2);
        assert_eq!(tn.to_u32(), 0x16_02_01_02);
        assert!(tn.is_sound());
        assert!(!tn.is_picture());
    }

    #[test]
    fn essence_key_round_trips() {
        let tn = TrackNumber::new(ITEM_TYPE_PICTURE, 2, 0x02, 1);
        assert_eq!(TrackNumber::from_essence_key(tn.essence_key()).unwrap(), tn);
    }

    #[test]
    fn rejects_a_key_with_an_unrelated_prefix() {
        assert!(TrackNumber::from_essence_key(Ul::new([0; 16])).is_err());
    }
}
