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
    wire::{
        deserializer::{decode, AttributeParsingError},
        serializer::AttributeWriter,
    },
    Attribute, AttributeSchema, DecodedAttributeSet, WritablePdu,
};
use std::{fmt::Debug, io::Cursor};

/// Helper method to combine multiple vectors into one
pub fn combine(v: Vec<&[u8]>) -> Vec<u8> {
    v.iter()
        .flat_map(|x| x.iter())
        .cloned()
        .collect::<Vec<u8>>()
}

/// Decode `input` against `schema` and assert the whole buffer yields
/// `expected`
pub fn test_parsed_completely(
    schema: &AttributeSchema,
    input: &[u8],
    expected: &DecodedAttributeSet,
) -> DecodedAttributeSet {
    let parsed = decode(schema, input);
    assert!(parsed.is_ok(), "Message failed parsing, while expecting it to pass.\n\tExpected : {expected:?}\n\tParsed msg: {parsed:?}");
    let parsed = parsed.unwrap();
    assert_eq!(&parsed, expected);
    parsed
}

/// Decode `input` against `schema` and assert it fails at `offset` with
/// `expected`
pub fn test_parse_error(
    schema: &AttributeSchema,
    input: &[u8],
    offset: usize,
    expected: &AttributeParsingError,
) {
    let parsed = decode(schema, input);
    assert!(parsed.is_err(), "Message was parsed, while expecting it to fail.\n\tExpected : {expected:?}\n\tParsed msg: {parsed:?}");
    let err = parsed.unwrap_err();
    assert_eq!(err.error(), expected);
    assert_eq!(err.offset_in(input), offset);
}

/// Write `input` through [`WritablePdu`] and assert both the produced octets
/// and that [`WritablePdu::len`] announced exactly that many
pub fn test_write<E: Debug, T: WritablePdu<E>>(input: &T, expected: &[u8]) -> Result<(), E> {
    let mut cursor = Cursor::new(Vec::new());
    input.write(&mut cursor)?;
    assert_eq!(cursor.get_ref().as_slice(), expected);
    assert_eq!(input.len(), expected.len());
    Ok(())
}

/// Write a field plan into a writer sized with exactly the computed length,
/// assert it fills it to the last octet, and return the octets
pub fn test_write_plan(plan: &[Attribute]) -> Vec<u8> {
    let len = crate::plan_len(plan);
    let mut writer = AttributeWriter::with_capacity(len);
    let written = writer.put_all(plan);
    assert_eq!(written, Ok(()));
    assert_eq!(writer.remaining(), 0);
    writer.into_bytes()
}
