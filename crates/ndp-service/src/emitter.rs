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

//! Sends events to the upper layer.
//!
//! The buffer is allocated with the length computed from the field plan and
//! the same plan is then written into it. A buffer that fails any write is
//! dropped and never delivered.

use crate::{
    collaborators::{EventSink, VendorFamily},
    error::NdpError,
};
use nanpath_attr::{plan_len, Attribute};
use nanpath_ndp_pkt::{NanEventMessage, NdpEventMessage};

pub(crate) fn emit_plan(
    sink: &dyn EventSink,
    family: VendorFamily,
    plan: &[Attribute],
) -> Result<usize, NdpError> {
    let len = plan_len(plan);
    let mut writer = sink
        .alloc(family, len)
        .ok_or(NdpError::AllocationFailure(len))?;
    writer.put_all(plan).map_err(NdpError::EncodeOverflow)?;
    let buffer = writer.into_bytes();
    let written = buffer.len();
    sink.deliver(family, buffer);
    Ok(written)
}

pub(crate) fn emit_ndp(sink: &dyn EventSink, message: &NdpEventMessage) -> Result<(), NdpError> {
    let written = emit_plan(sink, VendorFamily::Ndp, &message.fields())?;
    log::debug!(
        "[{}] sent {} event of {written} octets",
        VendorFamily::Ndp,
        message.subcommand()
    );
    Ok(())
}

pub(crate) fn emit_nan(sink: &dyn EventSink, message: &NanEventMessage) -> Result<(), NdpError> {
    let written = emit_plan(sink, VendorFamily::Nan, &message.fields())?;
    log::debug!(
        "[{}] sent {} event of {written} octets",
        VendorFamily::Nan,
        message.subcommand
    );
    Ok(())
}
