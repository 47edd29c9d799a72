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

//! Ser/Deser of tagged attribute buffers.
//!
//! Every attribute on the wire is laid out as
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Length (LE)            |N|O|       Type (LE)           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Value (Length - 4 octets)                    |
//! ~                     padded to 4 octets                        ~
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `N` marks a nested attribute and `O` network byte order; both bits are
//! masked off before the type is looked up in an [`AttributeSchema`].

#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod wire;

use nom::IResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input of all the parsers in this crate. Nested parsers work on sub-slices
/// of the top level buffer, so error locations stay comparable to it.
pub type Span<'a> = &'a [u8];

/// Length and type, two octets each
pub const ATTRIBUTE_HEADER_LEN: usize = 4;
pub const ATTRIBUTE_ALIGNTO: usize = 4;
pub const NESTED_FLAG: u16 = 0x8000;
pub const NET_BYTEORDER_FLAG: u16 = 0x4000;
pub const TYPE_MASK: u16 = !(NESTED_FLAG | NET_BYTEORDER_FLAG);

/// Round `len` up to the attribute alignment
#[inline]
pub const fn align(len: usize) -> usize {
    (len + ATTRIBUTE_ALIGNTO - 1) & !(ATTRIBUTE_ALIGNTO - 1)
}

/// Number of octets an attribute with `payload_len` octets of value occupies
/// in a buffer, including header and padding
#[inline]
pub const fn attribute_size(payload_len: usize) -> usize {
    align(ATTRIBUTE_HEADER_LEN + payload_len)
}

/// Generic trait for Readable Protocol Data Unit that needs a single external
/// input, e.g. the schema to validate against
pub trait ReadablePduWithOneInput<'a, T, ErrorType> {
    fn from_wire(buf: Span<'a>, input: T) -> IResult<Span<'a>, Self, ErrorType>
    where
        Self: Sized;
}

/// Generic trait for Writable Protocol Data Unit that doesn't need any external
/// input while writing the packet.
#[allow(clippy::len_without_is_empty)]
pub trait WritablePdu<ErrorType> {
    const BASE_LENGTH: usize;

    /// The exact number of octets [`Self::write`] produces
    fn len(&self) -> usize;

    fn write<T: std::io::Write>(&self, _writer: &mut T) -> Result<(), ErrorType>
    where
        Self: Sized;
}

/// Wire type and length constraint of a single attribute tag
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributePolicy {
    U8,
    U16,
    U32,
    /// Zero length attribute, presence is the value
    Flag,
    /// Opaque value of exactly the given length, e.g. MAC or IPv6 addresses
    Exact(usize),
    /// Opaque value of at most `max_len` octets
    Binary { max_len: usize },
    /// NUL terminated string of at most `max_len` characters, terminator
    /// excluded
    NulString { max_len: usize },
    /// Attribute set validated against another schema
    Nested(&'static AttributeSchema),
    /// Array whose elements are tagged by their index and each validated
    /// against the element schema
    NestedArray(&'static AttributeSchema),
}

/// Immutable table of the attributes known to one command family.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeSchema {
    name: &'static str,
    policies: &'static [(u16, AttributePolicy)],
}

impl AttributeSchema {
    pub const fn new(name: &'static str, policies: &'static [(u16, AttributePolicy)]) -> Self {
        Self { name, policies }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn policies(&self) -> &'static [(u16, AttributePolicy)] {
        self.policies
    }

    pub fn policy(&self, tag: u16) -> Option<AttributePolicy> {
        self.policies
            .iter()
            .find(|(known, _)| *known == tag)
            .map(|(_, policy)| *policy)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    U8(u8),
    U16(u16),
    U32(u32),
    Flag,
    Bytes(Vec<u8>),
    /// Without the NUL terminator, which is added back on the wire
    String(String),
    Nested(Vec<Attribute>),
}

impl AttributeValue {
    /// Length of the value on the wire, without header and padding
    pub fn payload_len(&self) -> usize {
        match self {
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
            Self::Flag => 0,
            Self::Bytes(value) => value.len(),
            Self::String(value) => value.len() + 1,
            Self::Nested(children) => children.iter().map(|child| child.len()).sum(),
        }
    }
}

/// A single tagged value, used both as the decoder output for nested sets and
/// as the unit of an outbound field plan.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    tag: u16,
    value: AttributeValue,
}

impl Attribute {
    pub const fn new(tag: u16, value: AttributeValue) -> Self {
        Self { tag, value }
    }

    pub const fn u8(tag: u16, value: u8) -> Self {
        Self::new(tag, AttributeValue::U8(value))
    }

    pub const fn u16(tag: u16, value: u16) -> Self {
        Self::new(tag, AttributeValue::U16(value))
    }

    pub const fn u32(tag: u16, value: u32) -> Self {
        Self::new(tag, AttributeValue::U32(value))
    }

    pub const fn flag(tag: u16) -> Self {
        Self::new(tag, AttributeValue::Flag)
    }

    pub fn bytes(tag: u16, value: &[u8]) -> Self {
        Self::new(tag, AttributeValue::Bytes(value.to_vec()))
    }

    pub fn string(tag: u16, value: &str) -> Self {
        Self::new(tag, AttributeValue::String(value.to_string()))
    }

    pub const fn nested(tag: u16, children: Vec<Attribute>) -> Self {
        Self::new(tag, AttributeValue::Nested(children))
    }

    pub const fn tag(&self) -> u16 {
        self.tag
    }

    pub const fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn into_value(self) -> AttributeValue {
        self.value
    }
}

/// Exact number of octets a field plan occupies once written
pub fn plan_len(plan: &[Attribute]) -> usize {
    plan.iter().map(|attribute| attribute.len()).sum()
}

/// Attributes decoded from a buffer, keyed by tag. When a tag is repeated the
/// last occurrence wins.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DecodedAttributeSet {
    values: BTreeMap<u16, AttributeValue>,
}

impl DecodedAttributeSet {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.values.contains_key(&tag)
    }

    pub fn get(&self, tag: u16) -> Option<&AttributeValue> {
        self.values.get(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u16, &AttributeValue)> {
        self.values.iter()
    }

    pub fn u8(&self, tag: u16) -> Option<u8> {
        match self.get(tag) {
            Some(AttributeValue::U8(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn u16(&self, tag: u16) -> Option<u16> {
        match self.get(tag) {
            Some(AttributeValue::U16(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn u32(&self, tag: u16) -> Option<u32> {
        match self.get(tag) {
            Some(AttributeValue::U32(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, tag: u16) -> bool {
        matches!(self.get(tag), Some(AttributeValue::Flag))
    }

    pub fn bytes(&self, tag: u16) -> Option<&[u8]> {
        match self.get(tag) {
            Some(AttributeValue::Bytes(value)) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn string(&self, tag: u16) -> Option<&str> {
        match self.get(tag) {
            Some(AttributeValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn nested(&self, tag: u16) -> Option<&[Attribute]> {
        match self.get(tag) {
            Some(AttributeValue::Nested(children)) => Some(children.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn insert(&mut self, attribute: Attribute) {
        self.values.insert(attribute.tag, attribute.value);
    }
}

impl FromIterator<Attribute> for DecodedAttributeSet {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut set = Self::default();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(remote = "nom::error::ErrorKind")]
pub enum ErrorKindSerdeDeref {
    Tag,
    MapRes,
    MapOpt,
    Alt,
    IsNot,
    IsA,
    SeparatedList,
    SeparatedNonEmptyList,
    Many0,
    Many1,
    ManyTill,
    Count,
    TakeUntil,
    LengthValue,
    TagClosure,
    Alpha,
    Digit,
    HexDigit,
    OctDigit,
    AlphaNumeric,
    Space,
    MultiSpace,
    LengthValueFn,
    Eof,
    Switch,
    TagBits,
    OneOf,
    NoneOf,
    Char,
    CrLf,
    RegexpMatch,
    RegexpMatches,
    RegexpFind,
    RegexpCapture,
    RegexpCaptures,
    TakeWhile1,
    Complete,
    Fix,
    Escaped,
    EscapedTransform,
    NonEmpty,
    ManyMN,
    Not,
    Permutation,
    Verify,
    TakeTill1,
    TakeWhileMN,
    TooLarge,
    Many0Count,
    Many1Count,
    Float,
    Satisfy,
    Fail,
}
