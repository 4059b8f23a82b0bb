// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Shared utilities
pub mod common;

// Tool lookup
pub mod platform_detection;

// Data model
pub mod property;
pub mod types;

// Providers and their selection
pub mod provider_factory;
pub mod providers;

pub use property::Property;
pub use provider_factory::{create_provider, resolve_kind, ProviderKind};
pub use providers::{
    CombinedProvider, OptimusProvider, Provider, SampleCache, SettingsProvider, SmiProvider,
};
pub use types::{DataSource, MetricKind, PropertyValue, Reading, Unit};
