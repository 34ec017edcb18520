// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key-Length-Value packet framing: a 16-byte SMPTE universal label key, a BER
//! length, and a value of that many bytes.
//!
//! `mox-mxf` always writes lengths in BER long form with a fixed 3-byte count (a leading
//! `0x83` tag byte plus 3 big-endian length bytes, 4 bytes total), the "4-byte BER" shape the
//! container format expects on write. Reading accepts both that shape and
//! the short form (a single byte under 0x80) so a hand-built stream using either convention
//! still parses.

use mox_core::descriptor::Ul;
use mox_core::errors::{input_error, Result};

use crate::io::IoStream;

/// The long-form BER tag byte `mox-mxf` always writes: 0x80 | 3, meaning "3 length bytes follow".
const BER_LONG_FORM_3: u8 = 0x83;

pub fn read_key(stream: &mut dyn IoStream) -> Result<Ul> {
    let mut bytes = [0u8; 16];
    stream.read_exact(&mut bytes)?;
    Ok(Ul::new(bytes))
}

pub fn write_key(stream: &mut dyn IoStream, key: Ul) -> Result<()> {
    stream.write_all(key.bytes())
}

/// Reads a BER length, accepting short form (`0x00..=0x7f`, the length itself) and long form
/// (`0x80 | n` followed by `n` big-endian bytes).
pub fn read_ber_length(stream: &mut dyn IoStream) -> Result<u64> {
    let mut first = [0u8; 1];
    stream.read_exact(&mut first)?;

    if first[0] & 0x80 == 0 {
        return Ok(first[0] as u64);
    }

    let count = (first[0] & 0x7f) as usize;
    if count == 0 || count > 8 {
        return input_error(format!("unsupported BER length encoding with {count} length bytes"));
    }

    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf[8 - count..])?;
    Ok(u64::from_be_bytes(buf))
}

/// Writes `length` as a fixed 4-byte BER long form (`0x83` plus 3 big-endian bytes). Fails if
/// `length` does not fit in 24 bits, which no real `mox` packet ever approaches.
pub fn write_ber_length(stream: &mut dyn IoStream, length: u64) -> Result<()> {
    if length > 0x00ff_ffff {
        return input_error("packet too large for a 4-byte BER length");
    }

    let bytes = length.to_be_bytes();
    stream.write_all(&[BER_LONG_FORM_3, bytes[5], bytes[6], bytes[7]])
}

/// The on-disk size of a BER length written by [`write_ber_length`].
pub const BER_LENGTH_SIZE: u64 = 4;

/// Reads one full KLV packet: its key and its value bytes.
pub fn read_klv(stream: &mut dyn IoStream) -> Result<(Ul, Vec<u8>)> {
    let key = read_key(stream)?;
    let length = read_ber_length(stream)?;

    let mut value = vec![0u8; length as usize];
    stream.read_exact(&mut value)?;

    Ok((key, value))
}

/// Writes one full KLV packet and returns its total on-disk size (key + length + value).
pub fn write_klv(stream: &mut dyn IoStream, key: Ul, value: &[u8]) -> Result<u64> {
    write_key(stream, key)?;
    write_ber_length(stream, value.len() as u64)?;
    stream.write_all(value)?;
    Ok(16 + BER_LENGTH_SIZE + value.len() as u64)
}

/// Pads the stream with zero-fill KLV filler up to the next multiple of `kag`, if it isn't
/// already aligned. A KAG of 1 (or the current position already aligned) is a no-op.
pub fn pad_to_kag(stream: &mut dyn IoStream, kag: u64) -> Result<()> {
    if kag <= 1 {
        return Ok(());
    }

    let pos = stream.tell()?;
    let remainder = pos % kag;
    if remainder == 0 {
        return Ok(());
    }

    let pad = kag - remainder;
    // A filler KLV needs at least a key + length of its own; round up to the next KAG boundary
    // instead if the gap is too small to hold one.
    let min_klv = 16 + BER_LENGTH_SIZE;
    let pad = if pad < min_klv { pad + kag } else { pad };

    write_key(stream, FILLER_KEY)?;
    write_ber_length(stream, pad - min_klv)?;
    stream.write_all(&vec![0u8; (pad - min_klv) as usize])?;

    Ok(())
}

/// A locally-scoped label marking KLV filler packets. Not a registered SMPTE filler UL; `mox-mxf`
/// never claims byte-exact interoperability with third-party MXF tooling (see DESIGN.md).
pub const FILLER_KEY: Ul = Ul::new([
    0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x01, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00,
]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStream;

    #[test]
    fn klv_round_trips() {
        let mut stream = MemoryStream::new();
        let key = Ul::new([1; 16]);
        write_klv(&mut stream, key, b"hello").unwrap();

        stream.seek(crate::io::SeekFrom::Start(0)).unwrap();
        let (read_key_value, value) = read_klv(&mut stream).unwrap();
        assert_eq!(read_key_value, key);
        assert_eq!(value, b"hello");
    }

    #[test]
    fn short_form_length_reads_back() {
        let mut stream = MemoryStream::new();
        write_key(&mut stream, Ul::new([2; 16])).unwrap();
        stream.write_all(&[5]).unwrap();
        stream.write_all(b"abcde").unwrap();

        stream.seek(crate::io::SeekFrom::Start(0)).unwrap();
        let (_, value) = read_klv(&mut stream).unwrap();
        assert_eq!(value, b"abcde");
    }

    #[test]
    fn pad_to_kag_aligns_the_stream() {
        let mut stream = MemoryStream::new();
        write_klv(&mut stream, Ul::new([3; 16]), b"x").unwrap();
        pad_to_kag(&mut stream, 512).unwrap();

        assert_eq!(stream.tell().unwrap() % 512, 0);
    }

    #[test]
    fn pad_to_kag_is_a_no_op_when_already_aligned() {
        let mut stream = MemoryStream::new();
        stream.truncate(512).unwrap();
        stream.seek(crate::io::SeekFrom::Start(512)).unwrap();
        pad_to_kag(&mut stream, 512).unwrap();
        assert_eq!(stream.tell().unwrap(), 512);
    }
}
