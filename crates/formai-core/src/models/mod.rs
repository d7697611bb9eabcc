// ABOUTME: Core data models shared by the analyze service and its clients
// ABOUTME: Re-exports the AnalysisResult wire contract and its nested types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod analysis;

pub use analysis::{AnalysisResult, MachineInfo, MuscleGroups};
