// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`DataChunk`], the reference-counted byte buffer that backs frame and audio slices, and the
//! compressed essence produced by codecs.

use std::sync::{Arc, Mutex, MutexGuard};

/// A growable, reference-counted byte buffer.
///
/// Cloning a `DataChunk` is cheap and shares the same backing storage; this is how a
/// [`crate::frame::FrameBuffer`] keeps memory alive for as long as a slice addresses it without
/// copying pixel data on every frame handed to a codec. Mutation goes through a lock rather than
/// a raw pointer, which is the price of keeping the crate free of `unsafe`.
#[derive(Clone, Debug, Default)]
pub struct DataChunk {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl DataChunk {
    pub fn new() -> Self {
        DataChunk::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DataChunk { bytes: Arc::new(Mutex::new(Vec::with_capacity(capacity))) }
    }

    /// Creates a chunk of `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        DataChunk { bytes: Arc::new(Mutex::new(vec![0u8; len])) }
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        DataChunk { bytes: Arc::new(Mutex::new(bytes)) }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn extend_from_slice(&self, data: &[u8]) {
        self.lock().extend_from_slice(data);
    }

    /// `true` if `other` shares this chunk's backing storage.
    pub fn ptr_eq(&self, other: &DataChunk) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let a = DataChunk::zeroed(4);
        let b = a.clone();
        b.lock()[0] = 0xAA;
        assert_eq!(a.to_vec()[0], 0xAA);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn independent_chunks_do_not_share_storage() {
        let a = DataChunk::zeroed(4);
        let b = DataChunk::zeroed(4);
        assert!(!a.ptr_eq(&b));
    }
}
