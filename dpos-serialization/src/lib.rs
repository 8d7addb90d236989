// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Binary serialization primitives shared by every wire format of the node.
//!
//! All integers of the DPoS wire formats are fixed-width. Most of them are
//! little-endian, the previous block id inside a block header is big-endian.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

use displaydoc::Display;
use nom::error::{context, ContextError, ErrorKind, ParseError};
use nom::IResult;
use std::fmt::{Debug, Display as FmtDisplay};
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
/// Serialization error
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String too big: {0}
    StringTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Trait that define the deserialize method that must be implemented for all types that are
/// deserializable from the wire.
pub trait Deserializer<T> {
    /// Deserialize `T` from the head of `buffer`, returning the unparsed rest.
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Trait that define the serialize method that must be implemented for all types that are
/// serializable to the wire.
pub trait Serializer<T> {
    /// Append the binary form of `value` to `buffer`.
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Error type collecting nom contexts, used as the default `E` of the deserializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], DeserializeErrorKind)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DeserializeErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, DeserializeErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DeserializeErrorKind::Context(ctx)));
        other
    }
}

impl<'a> FmtDisplay for DeserializeError<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (input, kind) in self.errors.iter().rev() {
            if !first {
                write!(f, " / ")?;
            }
            first = false;
            match kind {
                DeserializeErrorKind::Context(ctx) => write!(f, "{}", ctx)?,
                DeserializeErrorKind::Nom(kind) => {
                    write!(f, "{:?} at {} remaining bytes", kind, input.len())?
                }
            }
        }
        Ok(())
    }
}

fn check_range<'a, T, E>(input: &'a [u8], value: T, range: &(Bound<T>, Bound<T>)) -> IResult<&'a [u8], T, E>
where
    T: PartialOrd,
    E: ParseError<&'a [u8]>,
{
    if range.contains(&value) {
        Ok((input, value))
    } else {
        Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::TooLarge)))
    }
}

macro_rules! gen_fixed_int {
    ($($type:ident, $size:expr, $ser:ident, $de:ident, $to:ident, $from:ident, $doc:expr);*) => {
        $(
            #[doc = concat!("Serializer for a ", $doc, " `", stringify!($type), "`")]
            #[derive(Clone, Copy, Default)]
            pub struct $ser;

            impl $ser {
                #[doc = concat!("Creates a new `", stringify!($ser), "`")]
                pub const fn new() -> Self {
                    Self
                }
            }

            impl Serializer<$type> for $ser {
                fn serialize(&self, value: &$type, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
                    buffer.extend_from_slice(&value.$to());
                    Ok(())
                }
            }

            #[doc = concat!("Deserializer for a ", $doc, " `", stringify!($type), "`, with range checking")]
            #[derive(Clone, Copy)]
            pub struct $de {
                range: (Bound<$type>, Bound<$type>),
            }

            impl $de {
                #[doc = concat!("Creates a new `", stringify!($de), "` accepting values in the given bounds")]
                pub const fn new(min: Bound<$type>, max: Bound<$type>) -> Self {
                    Self { range: (min, max) }
                }
            }

            impl Default for $de {
                fn default() -> Self {
                    Self::new(Bound::Unbounded, Bound::Unbounded)
                }
            }

            impl Deserializer<$type> for $de {
                fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
                    &self,
                    buffer: &'a [u8],
                ) -> IResult<&'a [u8], $type, E> {
                    context(concat!("Failed ", stringify!($type), " deserialization"), |input: &'a [u8]| {
                        if input.len() < $size {
                            return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof)));
                        }
                        let (bytes, rest) = input.split_at($size);
                        let mut raw = [0u8; $size];
                        raw.copy_from_slice(bytes);
                        check_range(rest, $type::$from(raw), &self.range)
                    })(buffer)
                }
            }
        )*
    };
}

gen_fixed_int! {
    u8, 1, U8Serializer, U8Deserializer, to_le_bytes, from_le_bytes, "single-byte";
    u32, 4, U32LeSerializer, U32LeDeserializer, to_le_bytes, from_le_bytes, "little-endian";
    u64, 8, U64LeSerializer, U64LeDeserializer, to_le_bytes, from_le_bytes, "little-endian";
    u64, 8, U64BeSerializer, U64BeDeserializer, to_be_bytes, from_be_bytes, "big-endian"
}

/// Read exactly `N` bytes into an array.
pub fn fixed_bytes<'a, const N: usize, E: ParseError<&'a [u8]>>(
    input: &'a [u8],
) -> IResult<&'a [u8], [u8; N], E> {
    if input.len() < N {
        return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Eof)));
    }
    let (bytes, rest) = input.split_at(N);
    let mut res = [0u8; N];
    res.copy_from_slice(bytes);
    Ok((rest, res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Bound::Included;

    #[test]
    fn test_u32_le_layout() {
        let mut buffer = Vec::new();
        U32LeSerializer::new().serialize(&0x01020304, &mut buffer).unwrap();
        assert_eq!(buffer, vec![4, 3, 2, 1]);
        let (rest, value) = U32LeDeserializer::default()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, 0x01020304);
    }

    #[test]
    fn test_u64_be_layout() {
        let mut buffer = Vec::new();
        U64BeSerializer::new().serialize(&1, &mut buffer).unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_range_checked() {
        let mut buffer = Vec::new();
        U64LeSerializer::new().serialize(&50, &mut buffer).unwrap();
        let deserializer = U64LeDeserializer::new(Included(0), Included(10));
        assert!(deserializer.deserialize::<DeserializeError>(&buffer).is_err());
    }

    #[test]
    fn test_truncated_input() {
        let err = U64LeDeserializer::default()
            .deserialize::<DeserializeError>(&[1, 2, 3])
            .unwrap_err();
        assert!(format!("{}", err).contains("Failed u64 deserialization"));
    }
}
