// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Client gateway for operations on server-resident arrays.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Client-side gateway for remote arrays.
//!
//! Callers hold [`ArrayHandle`]s that describe arrays living on a compute
//! server. The [`Gateway`] checks each operation against its
//! [`OperationTable`], encodes it as a single command, and decodes the reply
//! into a new handle, host values, or bigint values.

pub mod command;
pub mod config;
pub mod correctness;
pub mod gateway;
pub mod transport;
pub mod validate;

mod error;

pub use array_proto::{ArrayHandle, ElementKind, HostArray, Operand, ScalarValue, ServerRef};
pub use bigint_codec::{merge_max_bits, BigInteger, MaxBits};
pub use config::{ConfigError, GatewayConfig, ServerConfig};
pub use correctness::{check_bigint_transfer, time_bigint_transfer, TimingReport, TransferReport};
pub use error::{GatewayError, TransportError, Violation};
pub use gateway::Gateway;
pub use transport::{TcpTransport, Transport};
pub use validate::{Dispatch, EmptyPolicy, Operation, OperationRule, OperationTable, Residency};
