// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`IoStream`]: the abstract byte stream a container reads from or writes to, plus the
//! big-endian primitive reads/writes every partition, KLV, and index routine is built on.

use mox_core::errors::Result;

/// Where a seek is relative to, mirroring `std::io::SeekFrom` but independent of it so `mox-mxf`
/// does not require `std` I/O traits from an embedder's byte stream. All offsets are
/// unsigned 64-bit; end-of-file on read returns `0` without error, exactly like `std::io::Read`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    End(i64),
}

/// The abstract byte stream contract a container consumes.
///
/// An embedder implements this over a file, an in-memory buffer, or a network-backed object
/// store; `mox-mxf` never assumes more than these seven operations. All offsets are absolute and
/// unsigned 64-bit; no signed or relative offset ever leaks into the container format itself.
pub trait IoStream: Send {
    /// Reads up to `buf.len()` bytes, returning the number actually read. Returns `0` (not an
    /// error) at end of file, matching `std::io::Read`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf`, returning the number of bytes written (always `buf.len()` on
    /// success).
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    fn tell(&mut self) -> Result<u64> {
        self.seek(SeekFrom::Current(0))
    }

    fn flush(&mut self) -> Result<()>;

    fn truncate(&mut self, size: u64) -> Result<()>;

    fn size(&mut self) -> Result<u64>;

    /// Reads exactly `buf.len()` bytes, failing with `Error::Io` (unexpected EOF) if the stream
    /// runs out first.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf)? {
                0 => {
                    return Err(mox_core::errors::Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "unexpected end of stream",
                    )))
                }
                n => buf = &mut buf[n..],
            }
        }
        Ok(())
    }

    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            buf = &buf[n..];
        }
        Ok(())
    }
}

/// Reads a big-endian `u32`, the width the KLV BER-length and track-number fields use.
pub fn read_u32(stream: &mut dyn IoStream) -> Result<u32> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u32(stream: &mut dyn IoStream, value: u32) -> Result<()> {
    stream.write_all(&value.to_be_bytes())
}

pub fn read_u64(stream: &mut dyn IoStream) -> Result<u64> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

pub fn write_u64(stream: &mut dyn IoStream, value: u64) -> Result<()> {
    stream.write_all(&value.to_be_bytes())
}

pub fn read_u16(stream: &mut dyn IoStream) -> Result<u16> {
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

pub fn write_u16(stream: &mut dyn IoStream, value: u16) -> Result<()> {
    stream.write_all(&value.to_be_bytes())
}

pub fn read_u8(stream: &mut dyn IoStream) -> Result<u8> {
    let mut buf = [0u8; 1];
    stream.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_u8(stream: &mut dyn IoStream, value: u8) -> Result<()> {
    stream.write_all(&[value])
}

/// An in-memory [`IoStream`], backing both unit tests and any caller happy to hold a whole file
/// in memory rather than on disk.
#[derive(Default)]
pub struct MemoryStream {
    data: Vec<u8>,
    pos: u64,
}

impl MemoryStream {
    pub fn new() -> Self {
        MemoryStream::default()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        MemoryStream { data, pos: 0 }
    }
}

impl IoStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let start = self.pos as usize;
        if start >= self.data.len() {
            return Ok(0);
        }

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let start = self.pos as usize;
        let end = start + buf.len();

        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[start..end].copy_from_slice(buf);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
            SeekFrom::End(delta) => self.data.len() as i64 + delta,
        };

        if new_pos < 0 {
            return mox_core::errors::argument_error("seek before the start of the stream");
        }

        self.pos = new_pos as u64;
        Ok(self.pos)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        self.data.resize(size as usize, 0);
        if self.pos > size {
            self.pos = size;
        }
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let mut stream = MemoryStream::new();
        stream.write_all(b"hello mox").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();

        let mut buf = [0u8; 9];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello mox");
    }

    #[test]
    fn read_past_end_returns_zero_not_an_error() {
        let mut stream = MemoryStream::from(vec![1, 2, 3]);
        stream.seek(SeekFrom::Start(3)).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn big_endian_integers_round_trip() {
        let mut stream = MemoryStream::new();
        write_u32(&mut stream, 0xdead_beef).unwrap();
        write_u64(&mut stream, 0x0123_4567_89ab_cdef).unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();

        assert_eq!(read_u32(&mut stream).unwrap(), 0xdead_beef);
        assert_eq!(read_u64(&mut stream).unwrap(), 0x0123_4567_89ab_cdef);
    }
}
