// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The audio buffer: [`AudioSlice`] and [`AudioBuffer`].

mod buffer;
mod slice;

pub use buffer::AudioBuffer;
pub use slice::AudioSlice;
