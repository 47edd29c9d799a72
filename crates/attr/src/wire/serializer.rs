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
    align, attribute_size, Attribute, AttributeValue, WritablePdu, ATTRIBUTE_HEADER_LEN,
    NESTED_FLAG,
};
use byteorder::{LittleEndian, WriteBytesExt};
use nanpath_serde_macros::WritingError;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(WritingError, Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum AttributeWritingError {
    StdIOError(#[from_std_io_error] String),
    /// The attribute doesn't fit in what is left of a fixed capacity buffer
    BufferFull {
        tag: u16,
        required: usize,
        remaining: usize,
    },
    /// Header plus value doesn't fit the two octets length field
    AttributeTooLong { tag: u16, length: usize },
    /// `nest_end` called with a token that isn't the innermost open nest
    UnbalancedNest { tag: u16 },
}

const PADDING: [u8; 3] = [0; 3];

fn write_header<T: Write>(
    writer: &mut T,
    tag: u16,
    payload_len: usize,
) -> Result<(), AttributeWritingError> {
    let length = ATTRIBUTE_HEADER_LEN + payload_len;
    if length > u16::MAX as usize {
        return Err(AttributeWritingError::AttributeTooLong { tag, length });
    }
    writer.write_u16::<LittleEndian>(length as u16)?;
    writer.write_u16::<LittleEndian>(tag)?;
    Ok(())
}

fn write_padding<T: Write>(writer: &mut T, payload_len: usize) -> Result<(), AttributeWritingError> {
    let length = ATTRIBUTE_HEADER_LEN + payload_len;
    writer.write_all(&PADDING[..align(length) - length])?;
    Ok(())
}

fn write_scalar<T: Write>(writer: &mut T, value: &AttributeValue) -> Result<(), AttributeWritingError> {
    match value {
        AttributeValue::U8(value) => writer.write_u8(*value)?,
        AttributeValue::U16(value) => writer.write_u16::<LittleEndian>(*value)?,
        AttributeValue::U32(value) => writer.write_u32::<LittleEndian>(*value)?,
        AttributeValue::Flag => {}
        AttributeValue::Bytes(value) => writer.write_all(value)?,
        AttributeValue::String(value) => {
            writer.write_all(value.as_bytes())?;
            writer.write_u8(0)?;
        }
        AttributeValue::Nested(children) => {
            for child in children {
                child.write(writer)?;
            }
        }
    }
    Ok(())
}

impl WritablePdu<AttributeWritingError> for Attribute {
    const BASE_LENGTH: usize = ATTRIBUTE_HEADER_LEN;

    fn len(&self) -> usize {
        attribute_size(self.value().payload_len())
    }

    fn write<T: Write>(&self, writer: &mut T) -> Result<(), AttributeWritingError> {
        let payload_len = self.value().payload_len();
        let tag = match self.value() {
            AttributeValue::Nested(_) => self.tag() | NESTED_FLAG,
            _ => self.tag(),
        };
        write_header(writer, tag, payload_len)?;
        write_scalar(writer, self.value())?;
        write_padding(writer, payload_len)
    }
}

/// Marks an open nest in an [`AttributeWriter`], consumed by
/// [`AttributeWriter::nest_end`]
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct NestToken {
    tag: u16,
    start: usize,
    depth: usize,
}

/// Append only attribute buffer whose capacity is fixed when it is created.
///
/// Every `put_*` checks the remaining room before writing a single octet, so
/// a failed call leaves the buffer as it was.
#[derive(Debug, Clone)]
pub struct AttributeWriter {
    buf: Vec<u8>,
    capacity: usize,
    open_nests: usize,
}

impl AttributeWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            open_nests: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn reserve(&self, tag: u16, required: usize) -> Result<(), AttributeWritingError> {
        let remaining = self.remaining();
        if required > remaining {
            return Err(AttributeWritingError::BufferFull {
                tag,
                required,
                remaining,
            });
        }
        Ok(())
    }

    fn put_value(&mut self, tag: u16, value: &AttributeValue) -> Result<(), AttributeWritingError> {
        let payload_len = value.payload_len();
        self.reserve(tag, attribute_size(payload_len))?;
        write_header(&mut self.buf, tag, payload_len)?;
        write_scalar(&mut self.buf, value)?;
        write_padding(&mut self.buf, payload_len)
    }

    pub fn put_u8(&mut self, tag: u16, value: u8) -> Result<(), AttributeWritingError> {
        self.put_value(tag, &AttributeValue::U8(value))
    }

    pub fn put_u16(&mut self, tag: u16, value: u16) -> Result<(), AttributeWritingError> {
        self.put_value(tag, &AttributeValue::U16(value))
    }

    pub fn put_u32(&mut self, tag: u16, value: u32) -> Result<(), AttributeWritingError> {
        self.put_value(tag, &AttributeValue::U32(value))
    }

    pub fn put_flag(&mut self, tag: u16) -> Result<(), AttributeWritingError> {
        self.put_value(tag, &AttributeValue::Flag)
    }

    pub fn put_bytes(&mut self, tag: u16, value: &[u8]) -> Result<(), AttributeWritingError> {
        self.reserve(tag, attribute_size(value.len()))?;
        write_header(&mut self.buf, tag, value.len())?;
        self.buf.write_all(value)?;
        write_padding(&mut self.buf, value.len())
    }

    /// Written with a NUL terminator
    pub fn put_string(&mut self, tag: u16, value: &str) -> Result<(), AttributeWritingError> {
        let payload_len = value.len() + 1;
        self.reserve(tag, attribute_size(payload_len))?;
        write_header(&mut self.buf, tag, payload_len)?;
        self.buf.write_all(value.as_bytes())?;
        self.buf.write_u8(0)?;
        write_padding(&mut self.buf, payload_len)
    }

    /// Open a nest, the length is patched by [`Self::nest_end`]
    pub fn nest_start(&mut self, tag: u16) -> Result<NestToken, AttributeWritingError> {
        self.reserve(tag, ATTRIBUTE_HEADER_LEN)?;
        let start = self.buf.len();
        write_header(&mut self.buf, tag | NESTED_FLAG, 0)?;
        self.open_nests += 1;
        Ok(NestToken {
            tag,
            start,
            depth: self.open_nests,
        })
    }

    pub fn nest_end(&mut self, token: NestToken) -> Result<(), AttributeWritingError> {
        if token.depth != self.open_nests {
            return Err(AttributeWritingError::UnbalancedNest { tag: token.tag });
        }
        let length = self.buf.len() - token.start;
        if length > u16::MAX as usize {
            return Err(AttributeWritingError::AttributeTooLong {
                tag: token.tag,
                length,
            });
        }
        self.buf[token.start..token.start + 2].copy_from_slice(&(length as u16).to_le_bytes());
        self.open_nests -= 1;
        Ok(())
    }

    /// Append an attribute from a field plan, nests go through the
    /// start/end bracketing
    pub fn put_attribute(&mut self, attribute: &Attribute) -> Result<(), AttributeWritingError> {
        match attribute.value() {
            AttributeValue::Nested(children) => {
                let token = self.nest_start(attribute.tag())?;
                for child in children {
                    self.put_attribute(child)?;
                }
                self.nest_end(token)
            }
            value => self.put_value(attribute.tag(), value),
        }
    }

    pub fn put_all(&mut self, plan: &[Attribute]) -> Result<(), AttributeWritingError> {
        for attribute in plan {
            self.put_attribute(attribute)?;
        }
        Ok(())
    }
}
