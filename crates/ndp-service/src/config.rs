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

use nanpath_ndp_pkt::schema::NDP_NUM_INSTANCE_ID;

pub(crate) const fn default_rtt_capability() -> u32 {
    0
}

pub(crate) const fn default_disable_6g_nan() -> bool {
    false
}

pub(crate) const fn default_max_ndp_instances() -> usize {
    NDP_NUM_INSTANCE_ID
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NanDataPathConfig {
    /// Fine timing measurement capability advertised in NAN enable requests
    #[serde(default = "default_rtt_capability")]
    pub rtt_capability: u32,

    #[serde(default = "default_disable_6g_nan")]
    pub disable_6g_nan: bool,

    /// Overrides the concurrency policy's answer on whether NDI creation
    /// requires NAN discovery to be running
    #[serde(default, skip_serializing_if = "::std::option::Option::is_none")]
    pub nan_concurrency_control: Option<bool>,

    /// Most instance ids accepted in a single end request
    #[serde(default = "default_max_ndp_instances")]
    pub max_ndp_instances: usize,
}

impl Default for NanDataPathConfig {
    fn default() -> Self {
        Self {
            rtt_capability: default_rtt_capability(),
            disable_6g_nan: default_disable_6g_nan(),
            nan_concurrency_control: None,
            max_ndp_instances: default_max_ndp_instances(),
        }
    }
}

impl NanDataPathConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}
