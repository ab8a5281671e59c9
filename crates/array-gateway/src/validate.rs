// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Check array operands against per-operation precondition rules.
// Author: Lukas Bower

//! Operation validator.
//!
//! Each operation has one [`OperationRule`]: the element kinds it accepts, the
//! residency it requires, and whether an empty array short-circuits locally.
//! Rules live in an [`OperationTable`] that is built once and never mutated;
//! adding a supported kind is an edit to [`STANDARD_RULES`].

use std::collections::{BTreeMap, BTreeSet};

use array_proto::ElementKind::{BigInt, Bool, Float64, Int64, UInt64};
use array_proto::{ArrayHandle, Command, ElementKind, Operand};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Violation};

/// Logical operations the gateway dispatches against an existing array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Elementwise doubling.
    Transform,
    /// Exclusive prefix sum.
    Scan,
    /// Stable ascending sort.
    Sort,
    /// Copy fixed-width values to the client.
    Download,
    /// Copy bigint values to the client.
    DownloadBigint,
    /// Stage into accelerator memory.
    ToDevice,
    /// Stage back into host memory.
    ToHost,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 7] = [
        Operation::Transform,
        Operation::Scan,
        Operation::Sort,
        Operation::Download,
        Operation::DownloadBigint,
        Operation::ToDevice,
        Operation::ToHost,
    ];

    /// Name used in error messages and configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Scan => "scan",
            Self::Sort => "sort",
            Self::Download => "download",
            Self::DownloadBigint => "download_bigint",
            Self::ToDevice => "to_device",
            Self::ToHost => "to_host",
        }
    }

    /// Server command the operation is encoded as.
    #[must_use]
    pub fn command(self) -> Command {
        match self {
            Self::Transform => Command::Times2,
            Self::Scan => Command::GpuScan,
            Self::Sort => Command::GpuSort,
            Self::Download => Command::ToNdarray,
            Self::DownloadBigint => Command::BigintToLimbs,
            Self::ToDevice => Command::GpuStage,
            Self::ToHost => Command::GpuUnstage,
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Residency an operation requires of its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Residency {
    /// Host or device.
    Any,
    /// Accelerator memory only.
    Device,
    /// Host memory only.
    Host,
}

impl Residency {
    fn admits(self, on_device: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Device => on_device,
            Self::Host => !on_device,
        }
    }
}

impl core::fmt::Display for Residency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::Device => "on-device",
            Self::Host => "host",
        })
    }
}

/// What to do with a size-0 operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPolicy {
    /// Send the request anyway.
    Forward,
    /// Answer locally without contacting the server.
    ShortCircuit,
}

/// Preconditions of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationRule {
    /// Element kinds accepted.
    pub kinds: BTreeSet<ElementKind>,
    /// Residency required.
    pub residency: Residency,
    /// Behaviour on size-0 operands.
    pub on_empty: EmptyPolicy,
}

impl OperationRule {
    /// Build a rule from a kind list.
    #[must_use]
    pub fn new(kinds: &[ElementKind], residency: Residency, on_empty: EmptyPolicy) -> Self {
        Self {
            kinds: kinds.iter().copied().collect(),
            residency,
            on_empty,
        }
    }
}

/// Rules the gateway ships with.
pub const STANDARD_RULES: &[(Operation, &[ElementKind], Residency, EmptyPolicy)] = &[
    (Operation::Transform, &[UInt64], Residency::Any, EmptyPolicy::Forward),
    (
        Operation::Scan,
        &[Int64, UInt64, Float64],
        Residency::Device,
        EmptyPolicy::ShortCircuit,
    ),
    (Operation::Sort, &[UInt64], Residency::Any, EmptyPolicy::ShortCircuit),
    (
        Operation::Download,
        &[Int64, UInt64, Float64, Bool],
        Residency::Any,
        EmptyPolicy::ShortCircuit,
    ),
    (
        Operation::DownloadBigint,
        &[BigInt],
        Residency::Any,
        EmptyPolicy::ShortCircuit,
    ),
    (
        Operation::ToDevice,
        &[Int64, UInt64, Float64],
        Residency::Any,
        EmptyPolicy::Forward,
    ),
    (
        Operation::ToHost,
        &[Int64, UInt64, Float64],
        Residency::Any,
        EmptyPolicy::Forward,
    ),
];

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Encode and send the request for this handle.
    Send(ArrayHandle),
    /// The handle is empty and the operation answers locally.
    Empty(ArrayHandle),
}

/// Immutable map from operation to rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationTable {
    rules: BTreeMap<Operation, OperationRule>,
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl OperationTable {
    /// Table built from [`STANDARD_RULES`].
    #[must_use]
    pub fn standard() -> Self {
        let rules = STANDARD_RULES
            .iter()
            .map(|(op, kinds, residency, on_empty)| {
                (*op, OperationRule::new(kinds, *residency, *on_empty))
            })
            .collect();
        Self { rules }
    }

    /// Replace one rule, producing a new table.
    #[must_use]
    pub fn with_rule(mut self, operation: Operation, rule: OperationRule) -> Self {
        self.rules.insert(operation, rule);
        self
    }

    /// Overlay every rule of `overrides` onto this table.
    #[must_use]
    pub fn merged(mut self, overrides: &OperationTable) -> Self {
        for (op, rule) in &overrides.rules {
            self.rules.insert(*op, rule.clone());
        }
        self
    }

    /// Rule for `operation`, if it is enabled.
    #[must_use]
    pub fn rule(&self, operation: Operation) -> Option<&OperationRule> {
        self.rules.get(&operation)
    }

    /// Check `operand` against the rule for `operation`.
    ///
    /// Checks run in order: operand shape, rule presence, residency, element
    /// kind, then emptiness.
    pub fn validate(&self, operation: Operation, operand: Operand) -> Result<Dispatch, GatewayError> {
        let handle = match operand {
            Operand::Array(handle) => handle,
            other @ Operand::Scalar(_) => {
                return Err(GatewayError::Usage {
                    operation,
                    found: other.describe(),
                })
            }
        };
        let rule = self
            .rule(operation)
            .ok_or_else(|| GatewayError::constraint(operation, Violation::Disabled))?;
        if !rule.residency.admits(handle.on_device()) {
            return Err(GatewayError::constraint(
                operation,
                Violation::Residency {
                    required: rule.residency,
                    on_device: handle.on_device(),
                },
            ));
        }
        if !rule.kinds.contains(&handle.kind()) {
            return Err(GatewayError::constraint(
                operation,
                Violation::Kind(handle.kind()),
            ));
        }
        if handle.is_empty() && rule.on_empty == EmptyPolicy::ShortCircuit {
            return Ok(Dispatch::Empty(handle));
        }
        Ok(Dispatch::Send(handle))
    }
}
