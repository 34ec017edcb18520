// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The random-access index table: a map from edit unit number to the absolute byte offset of
//! that edit unit's first essence packet.
//!
//! A real SMPTE 377M index table segment stores a run of delta entries relative to the edit
//! unit's position within its partition; `mox-mxf` instead stores the absolute file offset
//! directly; it is simpler, and round-trips exactly since nothing outside `mox-mxf` reads this
//! table (see DESIGN.md).

use mox_core::descriptor::Ul;
use mox_core::errors::{input_error, Result};
use mox_core::units::Rational;

use crate::io::{self, IoStream};
use crate::klv;

const INDEX_TABLE_KEY: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x10, 0x00, 0x00,
]);

/// One edit unit's recorded position, sufficient to seek straight to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexTable {
    pub body_sid: u32,
    pub index_sid: u32,
    pub edit_rate: Option<Rational>,
    /// `entries[n]` is the absolute byte offset of edit unit `n`'s first essence packet.
    entries: Vec<u64>,
}

impl IndexTable {
    pub fn new(body_sid: u32, index_sid: u32, edit_rate: Rational) -> Self {
        IndexTable { body_sid, index_sid, edit_rate: Some(edit_rate), entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records the offset of the next edit unit in sequence. Edit units must be appended in
    /// order; the index never supports random insertion.
    pub fn push_entry(&mut self, offset: u64) {
        self.entries.push(offset);
    }

    /// Looks up the byte offset of `edit_unit`, failing with an input error if it is out of
    /// range.
    pub fn get(&self, edit_unit: u64) -> Result<u64> {
        self.entries.get(edit_unit as usize).copied().ok_or_else(|| {
            mox_core::errors::Error::Input(format!(
                "edit unit {edit_unit} is out of range (index has {} entries)",
                self.entries.len()
            ))
        })
    }

    pub fn write(&self, stream: &mut dyn IoStream) -> Result<u64> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.body_sid.to_be_bytes());
        body.extend_from_slice(&self.index_sid.to_be_bytes());

        let rate = self.edit_rate.unwrap_or(Rational::new(1, 1).expect("1/1 is always valid"));
        body.extend_from_slice(&rate.numerator().to_be_bytes());
        body.extend_from_slice(&rate.denominator().to_be_bytes());

        body.extend_from_slice(&(self.entries.len() as u64).to_be_bytes());
        for entry in &self.entries {
            body.extend_from_slice(&entry.to_be_bytes());
        }

        klv::write_klv(stream, INDEX_TABLE_KEY, &body)
    }

    pub fn read(stream: &mut dyn IoStream) -> Result<Self> {
        let (key, value) = klv::read_klv(stream)?;
        if key != INDEX_TABLE_KEY {
            return input_error("not an index table segment key");
        }

        let mut cursor = io::MemoryStream::from(value);

        let body_sid = io::read_u32(&mut cursor)?;
        let index_sid = io::read_u32(&mut cursor)?;
        let numerator = io::read_u32(&mut cursor)? as i32;
        let denominator = io::read_u32(&mut cursor)? as i32;
        let edit_rate = Rational::new(numerator, denominator).ok();

        let count = io::read_u64(&mut cursor)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(io::read_u64(&mut cursor)?);
        }

        Ok(IndexTable { body_sid, index_sid, edit_rate, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStream;

    #[test]
    fn lookup_finds_recorded_offsets() {
        let mut index = IndexTable::new(1, 2, Rational::new(24, 1).unwrap());
        index.push_entry(1024);
        index.push_entry(2048);

        assert_eq!(index.get(0).unwrap(), 1024);
        assert_eq!(index.get(1).unwrap(), 2048);
    }

    #[test]
    fn lookup_past_the_end_is_an_input_error() {
        let index = IndexTable::new(1, 2, Rational::new(24, 1).unwrap());
        assert!(index.get(0).is_err());
    }

    #[test]
    fn index_table_round_trips() {
        let mut index = IndexTable::new(1, 2, Rational::new(30000, 1001).unwrap());
        for offset in [512, 1600, 2700] {
            index.push_entry(offset);
        }

        let mut stream = MemoryStream::new();
        index.write(&mut stream).unwrap();
        stream.seek(crate::io::SeekFrom::Start(0)).unwrap();

        let read_back = IndexTable::read(&mut stream).unwrap();
        assert_eq!(read_back.len(), 3);
        assert_eq!(read_back.get(2).unwrap(), 2700);
        assert_eq!(read_back.edit_rate, Some(Rational::new(30000, 1001).unwrap()));
    }
}
