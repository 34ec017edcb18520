// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partition packs: the self-describing header that opens every partition.
//!
//! A real SMPTE 377M partition pack key encodes open/closed and complete/incomplete as two of
//! its sixteen bytes; `mox-mxf` keeps that same convention (distinct trailing bytes per
//! [`PartitionKind`]) without claiming the resulting keys are byte-exact SMPTE-registered values
//! (see DESIGN.md).

use mox_core::descriptor::Ul;
use mox_core::errors::{input_error, Result};

use crate::io::{self, IoStream};
use crate::klv;

/// Which partition this pack opens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionKind {
    Header,
    Body,
    Footer,
}

fn key_for(kind: PartitionKind) -> Ul {
    let mut bytes = PARTITION_KEY_PREFIX;
    bytes[13] = match kind {
        PartitionKind::Header => 0x02,
        PartitionKind::Body => 0x03,
        PartitionKind::Footer => 0x04,
    };
    Ul::new(bytes)
}

fn kind_for(key: Ul) -> Result<PartitionKind> {
    let bytes = *key.bytes();
    let mut prefix = bytes;
    prefix[13] = 0;

    if prefix != PARTITION_KEY_PREFIX {
        return input_error("not a partition pack key");
    }

    match bytes[13] {
        0x02 => Ok(PartitionKind::Header),
        0x03 => Ok(PartitionKind::Body),
        0x04 => Ok(PartitionKind::Footer),
        other => input_error(format!("unrecognized partition kind byte {other:#04x}")),
    }
}

const PARTITION_KEY_PREFIX: [u8; 16] =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00];

/// One partition's metadata: where it sits in the file, how much header/index metadata it
/// carries inline, and which body/index streams it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionPack {
    pub kind: PartitionKind,
    /// Absolute byte offset of this partition pack's key.
    pub this_partition: u64,
    /// Absolute byte offset of the previous partition pack, or `0` for the first partition.
    pub previous_partition: u64,
    /// Absolute byte offset of the footer partition, filled in (back-patched) once it is known.
    pub footer_partition: u64,
    /// Bytes of header metadata following this pack, before the body or index begins.
    pub header_byte_count: u64,
    /// Bytes of index table segments following the header metadata.
    pub index_byte_count: u64,
    pub index_sid: u32,
    /// Byte offset of the first essence item in this partition's body, relative to the start of
    /// the body stream (not the file).
    pub body_offset: u64,
    pub body_sid: u32,
    pub kag_size: u32,
}

impl PartitionPack {
    pub fn new(kind: PartitionKind) -> Self {
        PartitionPack {
            kind,
            this_partition: 0,
            previous_partition: 0,
            footer_partition: 0,
            header_byte_count: 0,
            index_byte_count: 0,
            index_sid: 0,
            body_offset: 0,
            body_sid: 0,
            kag_size: 512,
        }
    }

    pub fn write(&self, stream: &mut dyn IoStream) -> Result<u64> {
        let start = stream.tell()?;

        let mut body = Vec::new();
        body.extend_from_slice(&self.this_partition.to_be_bytes());
        body.extend_from_slice(&self.previous_partition.to_be_bytes());
        body.extend_from_slice(&self.footer_partition.to_be_bytes());
        body.extend_from_slice(&self.header_byte_count.to_be_bytes());
        body.extend_from_slice(&self.index_byte_count.to_be_bytes());
        body.extend_from_slice(&self.index_sid.to_be_bytes());
        body.extend_from_slice(&self.body_offset.to_be_bytes());
        body.extend_from_slice(&self.body_sid.to_be_bytes());
        body.extend_from_slice(&self.kag_size.to_be_bytes());

        klv::write_klv(stream, key_for(self.kind), &body)?;
        klv::pad_to_kag(stream, self.kag_size as u64)?;

        Ok(stream.tell()? - start)
    }

    pub fn read(stream: &mut dyn IoStream) -> Result<Self> {
        let this_partition = stream.tell()?;
        let (key, value) = klv::read_klv(stream)?;
        let kind = kind_for(key)?;

        if value.len() != 6 * 8 + 3 * 4 {
            return input_error("partition pack has the wrong field count for its size");
        }
        let mut cursor = io::MemoryStream::from(value);

        // The serialized copy of `this_partition` is redundant with the offset captured above;
        // read and discard it so the remaining fields land at the right byte.
        let _ = io::read_u64(&mut cursor)?;
        let previous_partition = io::read_u64(&mut cursor)?;
        let footer_partition = io::read_u64(&mut cursor)?;
        let header_byte_count = io::read_u64(&mut cursor)?;
        let index_byte_count = io::read_u64(&mut cursor)?;
        let index_sid = io::read_u32(&mut cursor)?;
        let body_offset = io::read_u64(&mut cursor)?;
        let body_sid = io::read_u32(&mut cursor)?;
        let kag_size = io::read_u32(&mut cursor)?;

        Ok(PartitionPack {
            kind,
            this_partition,
            previous_partition,
            footer_partition,
            header_byte_count,
            index_byte_count,
            index_sid,
            body_offset,
            body_sid,
            kag_size,
        })
    }
}
