// Copyright (C) 2024-present The NetGauze Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    align, Attribute, AttributePolicy, AttributeSchema, AttributeValue, DecodedAttributeSet,
    ReadablePduWithOneInput, Span, ATTRIBUTE_HEADER_LEN, TYPE_MASK,
};
use nom::{
    error::ErrorKind,
    number::complete::{le_u16, le_u32, u8 as le_u8},
    IResult, Offset,
};
use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum AttributeParsingError {
    #[serde(with = "crate::ErrorKindSerdeDeref")]
    NomError(ErrorKind),
    /// Fewer octets left than an attribute header
    TruncatedHeader(usize),
    /// Declared length is smaller than the header itself
    InvalidAttributeLength(u16),
    TruncatedAttribute {
        tag: u16,
        length: u16,
        available: usize,
    },
    UnexpectedLength {
        tag: u16,
        expected: usize,
        actual: usize,
    },
    ExceedsMaxLength {
        tag: u16,
        max_len: usize,
        actual: usize,
    },
    MissingNulTerminator(u16),
    InvalidString(u16),
}

/// [`AttributeParsingError`] and the input where it was raised
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct LocatedAttributeParsingError<'a> {
    span: Span<'a>,
    error: AttributeParsingError,
}

impl<'a> LocatedAttributeParsingError<'a> {
    pub const fn new(span: Span<'a>, error: AttributeParsingError) -> Self {
        Self { span, error }
    }

    pub const fn span(&self) -> Span<'a> {
        self.span
    }

    pub const fn error(&self) -> &AttributeParsingError {
        &self.error
    }

    pub fn into_error(self) -> AttributeParsingError {
        self.error
    }

    /// Offset of the failing octet relative to `input`, which must be the
    /// buffer the parser was started on.
    pub fn offset_in(&self, input: Span<'a>) -> usize {
        input.offset(self.span)
    }
}

impl<'a> From<LocatedAttributeParsingError<'a>> for (Span<'a>, AttributeParsingError) {
    fn from(value: LocatedAttributeParsingError<'a>) -> Self {
        (value.span, value.error)
    }
}

impl<'a> nom::error::ParseError<Span<'a>> for LocatedAttributeParsingError<'a> {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        Self::new(input, AttributeParsingError::NomError(kind))
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

#[inline]
fn fail<'a, T>(
    span: Span<'a>,
    error: AttributeParsingError,
) -> Result<T, nom::Err<LocatedAttributeParsingError<'a>>> {
    Err(nom::Err::Error(LocatedAttributeParsingError::new(
        span, error,
    )))
}

/// Parse one attribute, resolving its policy through `resolve`. Returns `None`
/// for tags the resolver doesn't know, after consuming them.
fn parse_attribute<'a, F>(
    buf: Span<'a>,
    resolve: F,
) -> IResult<Span<'a>, Option<Attribute>, LocatedAttributeParsingError<'a>>
where
    F: Fn(u16) -> Option<AttributePolicy>,
{
    let input = buf;
    if buf.len() < ATTRIBUTE_HEADER_LEN {
        return fail(input, AttributeParsingError::TruncatedHeader(buf.len()));
    }
    let (buf, length) = le_u16(buf)?;
    let (buf, raw_tag) = le_u16(buf)?;
    let tag = raw_tag & TYPE_MASK;
    if (length as usize) < ATTRIBUTE_HEADER_LEN {
        return fail(input, AttributeParsingError::InvalidAttributeLength(length));
    }
    let payload_len = length as usize - ATTRIBUTE_HEADER_LEN;
    if buf.len() < payload_len {
        return fail(
            input,
            AttributeParsingError::TruncatedAttribute {
                tag,
                length,
                available: buf.len(),
            },
        );
    }
    let (buf, payload) = nom::bytes::complete::take(payload_len)(buf)?;
    // The last attribute of a buffer may come without its padding
    let padding = (align(length as usize) - length as usize).min(buf.len());
    let (buf, _) = nom::bytes::complete::take(padding)(buf)?;
    let policy = match resolve(tag) {
        Some(policy) => policy,
        None => {
            log::trace!("skipping unknown attribute {tag} of length {length}");
            return Ok((buf, None));
        }
    };
    let value = parse_value(tag, policy, payload)?;
    Ok((buf, Some(Attribute::new(tag, value))))
}

fn parse_value<'a>(
    tag: u16,
    policy: AttributePolicy,
    payload: Span<'a>,
) -> Result<AttributeValue, nom::Err<LocatedAttributeParsingError<'a>>> {
    let actual = payload.len();
    let expect = |expected: usize| {
        if actual == expected {
            Ok(())
        } else {
            fail(
                payload,
                AttributeParsingError::UnexpectedLength {
                    tag,
                    expected,
                    actual,
                },
            )
        }
    };
    match policy {
        AttributePolicy::U8 => {
            expect(1)?;
            let (_, value) = le_u8(payload)?;
            Ok(AttributeValue::U8(value))
        }
        AttributePolicy::U16 => {
            expect(2)?;
            let (_, value) = le_u16(payload)?;
            Ok(AttributeValue::U16(value))
        }
        AttributePolicy::U32 => {
            expect(4)?;
            let (_, value) = le_u32(payload)?;
            Ok(AttributeValue::U32(value))
        }
        AttributePolicy::Flag => {
            expect(0)?;
            Ok(AttributeValue::Flag)
        }
        AttributePolicy::Exact(len) => {
            expect(len)?;
            Ok(AttributeValue::Bytes(payload.to_vec()))
        }
        AttributePolicy::Binary { max_len } => {
            if actual > max_len {
                return fail(
                    payload,
                    AttributeParsingError::ExceedsMaxLength {
                        tag,
                        max_len,
                        actual,
                    },
                );
            }
            Ok(AttributeValue::Bytes(payload.to_vec()))
        }
        AttributePolicy::NulString { max_len } => {
            let nul = match payload.iter().position(|octet| *octet == 0) {
                Some(nul) => nul,
                None => return fail(payload, AttributeParsingError::MissingNulTerminator(tag)),
            };
            if nul > max_len {
                return fail(
                    payload,
                    AttributeParsingError::ExceedsMaxLength {
                        tag,
                        max_len,
                        actual: nul,
                    },
                );
            }
            match std::str::from_utf8(&payload[..nul]) {
                Ok(value) => Ok(AttributeValue::String(value.to_string())),
                Err(_) => fail(payload, AttributeParsingError::InvalidString(tag)),
            }
        }
        AttributePolicy::Nested(schema) => {
            let (_, children) = parse_children(payload, |tag| schema.policy(tag))?;
            Ok(AttributeValue::Nested(children))
        }
        AttributePolicy::NestedArray(element) => {
            let (_, elements) =
                parse_children(payload, |_| Some(AttributePolicy::Nested(element)))?;
            Ok(AttributeValue::Nested(elements))
        }
    }
}

/// Children of a nest keep their wire order, repeated tags included
fn parse_children<'a, F>(
    buf: Span<'a>,
    resolve: F,
) -> IResult<Span<'a>, Vec<Attribute>, LocatedAttributeParsingError<'a>>
where
    F: Fn(u16) -> Option<AttributePolicy> + Copy,
{
    let mut buf = buf;
    let mut children = Vec::new();
    while !buf.is_empty() {
        let (tmp, child) = parse_attribute(buf, resolve)?;
        if let Some(child) = child {
            children.push(child);
        }
        buf = tmp;
    }
    Ok((buf, children))
}

impl<'a> ReadablePduWithOneInput<'a, &AttributeSchema, LocatedAttributeParsingError<'a>>
    for DecodedAttributeSet
{
    fn from_wire(
        buf: Span<'a>,
        schema: &AttributeSchema,
    ) -> IResult<Span<'a>, Self, LocatedAttributeParsingError<'a>> {
        let mut buf = buf;
        let mut set = DecodedAttributeSet::default();
        while !buf.is_empty() {
            let (tmp, attribute) = parse_attribute(buf, |tag| schema.policy(tag))?;
            if let Some(attribute) = attribute {
                set.insert(attribute);
            }
            buf = tmp;
        }
        Ok((buf, set))
    }
}

/// Decode a complete buffer against `schema`
pub fn decode<'a>(
    schema: &AttributeSchema,
    buf: Span<'a>,
) -> Result<DecodedAttributeSet, LocatedAttributeParsingError<'a>> {
    match DecodedAttributeSet::from_wire(buf, schema) {
        Ok((_, set)) => Ok(set),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(err),
        Err(nom::Err::Incomplete(_)) => Err(LocatedAttributeParsingError::new(
            buf,
            AttributeParsingError::NomError(ErrorKind::Complete),
        )),
    }
}
