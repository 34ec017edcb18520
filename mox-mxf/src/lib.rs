// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The MXF container layer: an OP1a-shaped muxer and demuxer built on a
//! KLV/partition/index wire format of our own, carrying the media types `mox-core` defines.
//!
//! `mox-mxf` never claims byte-exact interoperability with third-party SMPTE 377M tooling — see
//! DESIGN.md for exactly where this format departs from the registered standard (the partition
//! pack and filler keys, the index table's absolute-offset entries, the flat per-track metadata
//! record in place of a metadata-set object graph).

pub mod index;
pub mod io;
pub mod klv;
pub mod metadata;
pub mod partition;
pub mod reader;
pub mod track;
pub mod writer;

pub use index::IndexTable;
pub use io::{IoStream, MemoryStream, SeekFrom};
pub use metadata::{FileMetadata, TrackKind, TrackMetadata};
pub use partition::{PartitionKind, PartitionPack};
pub use reader::InputFile;
pub use track::TrackNumber;
pub use writer::OutputFile;
