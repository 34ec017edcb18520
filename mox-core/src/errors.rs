// MOX
// Copyright (c) 2025 The MOX Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the single error type shared by every `mox` crate.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

/// `Error` enumerates every way a `mox` operation can fail. Each variant corresponds to one of
/// the error kinds a caller needs to tell apart: a bad argument, a violated internal invariant,
/// malformed input, a failed I/O operation, a missing feature, an absent value, or a dynamic
/// type mismatch.
#[derive(Debug)]
pub enum Error {
    /// A caller-supplied value was out of contract: an empty name, an empty window, a zero or
    /// negative size.
    Argument(String),
    /// An internal invariant was violated: a playhead advanced past the end of its buffer, a
    /// codec registered twice for the same tag. Indicates a bug in the caller or in `mox` itself.
    Logic(String),
    /// A file being read contradicts the container or codec specification: an unknown descriptor
    /// UL where one is required, a width that disagrees with the index, a track with no
    /// descriptor.
    Input(String),
    /// The underlying byte stream failed.
    Io(io::Error),
    /// The requested feature is not implemented by this build, or by the codec plug-in being
    /// used (for example, an external codec backend has not been linked).
    NoImpl(&'static str),
    /// An expected value was absent (a null descriptor pointer, a missing attribute).
    Null(String),
    /// A dynamic cast to an attribute or descriptor variant failed.
    Type(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Argument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Logic(msg) => write!(f, "internal invariant violated: {}", msg),
            Error::Input(msg) => write!(f, "malformed input: {}", msg),
            Error::Io(err) => write!(f, "i/o error: {}", err),
            Error::NoImpl(feature) => write!(f, "not implemented: {}", feature),
            Error::Null(msg) => write!(f, "unexpected null: {}", msg),
            Error::Type(msg) => write!(f, "type mismatch: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Crate-wide result alias: every fallible `mox` operation returns this.
pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an argument error.
pub fn argument_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Argument(msg.into()))
}

/// Convenience function to create a logic error.
pub fn logic_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Logic(msg.into()))
}

/// Convenience function to create an input error.
pub fn input_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Input(msg.into()))
}

/// Convenience function to create a no-impl error.
pub fn no_impl_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::NoImpl(feature))
}

/// Convenience function to create a null error.
pub fn null_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Null(msg.into()))
}

/// Convenience function to create a type error.
pub fn type_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::Type(msg.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_kind() {
        assert!(format!("{}", Error::Argument("x".into())).contains("invalid argument"));
        assert!(format!("{}", Error::NoImpl("jpeg2000")).contains("not implemented"));
    }

    #[test]
    fn io_error_converts_and_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: Error = io_err.into();
        assert!(err.source().is_some());
    }
}
