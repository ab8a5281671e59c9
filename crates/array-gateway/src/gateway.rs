// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Dispatch validated array operations to the server through a transport.
// Author: Lukas Bower

//! The array gateway.
//!
//! Every operation follows the same path: validate the operand against the
//! [`OperationTable`], answer empty operands locally where the table says so,
//! otherwise encode one request, block on the transport for its reply, and
//! decode the reply for that operation. Nothing is retried.

use array_proto::{
    encode_request, ArrayHandle, BigintPayload, Command, ElementKind, HostArray, Operand, Request,
};
use bigint_codec::{encode, BigInteger, MaxBits};
use log::debug;

use crate::command::{decode_bigint, decode_handle, decode_values, encode_array_command};
use crate::error::Violation;
use crate::validate::{Dispatch, Operation, OperationTable};
use crate::{GatewayError, Transport, TransportError};

/// Client entry point for operations on server-resident arrays.
pub struct Gateway<T> {
    transport: T,
    table: OperationTable,
}

impl<T: Transport> Gateway<T> {
    /// Gateway using the standard operation table.
    pub fn new(transport: T) -> Self {
        Self::with_table(transport, OperationTable::standard())
    }

    /// Gateway using a caller-supplied operation table.
    pub fn with_table(transport: T, table: OperationTable) -> Self {
        Self { transport, table }
    }

    /// Active operation table.
    pub fn table(&self) -> &OperationTable {
        &self.table
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Synthesise an empty host-resident array of `kind` without a server call.
    pub fn empty(kind: ElementKind) -> ArrayHandle {
        ArrayHandle::empty(kind)
    }

    /// Elementwise doubling; fixed-width results wrap.
    pub fn transform(&mut self, operand: impl Into<Operand>) -> Result<ArrayHandle, GatewayError> {
        self.dispatch_for_handle(Operation::Transform, operand.into())
    }

    /// Exclusive prefix sum of an on-device array.
    pub fn scan(&mut self, operand: impl Into<Operand>) -> Result<ArrayHandle, GatewayError> {
        self.dispatch_for_handle(Operation::Scan, operand.into())
    }

    /// Stable ascending sort.
    pub fn sort(&mut self, operand: impl Into<Operand>) -> Result<ArrayHandle, GatewayError> {
        self.dispatch_for_handle(Operation::Sort, operand.into())
    }

    /// Stage an array into accelerator memory, returning a new handle.
    pub fn to_device(&mut self, operand: impl Into<Operand>) -> Result<ArrayHandle, GatewayError> {
        self.dispatch_for_handle(Operation::ToDevice, operand.into())
    }

    /// Stage an array back into host memory, returning a new handle.
    pub fn to_host(&mut self, operand: impl Into<Operand>) -> Result<ArrayHandle, GatewayError> {
        self.dispatch_for_handle(Operation::ToHost, operand.into())
    }

    /// Copy a fixed-width array to the client.
    pub fn download(&mut self, operand: impl Into<Operand>) -> Result<HostArray, GatewayError> {
        let op = Operation::Download;
        match self.table.validate(op, operand.into())? {
            Dispatch::Empty(handle) => HostArray::empty(handle.kind())
                .ok_or_else(|| GatewayError::constraint(op, Violation::Kind(handle.kind()))),
            Dispatch::Send(handle) => {
                let request = encode_array_command(op.command(), &handle);
                let raw = self.round_trip(&request)?;
                decode_values(op.command(), &raw, handle.size())
            }
        }
    }

    /// Copy a bigint array to the client, verifying the payload in full.
    pub fn download_bigint(
        &mut self,
        operand: impl Into<Operand>,
    ) -> Result<Vec<BigInteger>, GatewayError> {
        let op = Operation::DownloadBigint;
        match self.table.validate(op, operand.into())? {
            Dispatch::Empty(_) => Ok(Vec::new()),
            Dispatch::Send(handle) => {
                let request = encode_array_command(op.command(), &handle);
                let raw = self.round_trip(&request)?;
                decode_bigint(op.command(), &raw, handle.size())
            }
        }
    }

    /// Allocate a server array holding `values`.
    pub fn upload(&mut self, values: &HostArray) -> Result<ArrayHandle, GatewayError> {
        let request = Request::new(Command::CreateArray).arg(
            "values",
            serde_json::to_value(values)
                .map_err(|err| TransportError::Encode(err.into()))?,
        );
        let raw = self.round_trip(&request)?;
        decode_handle(Command::CreateArray, &raw)
    }

    /// Allocate a server bigint array holding `values` wrapped to `max_bits`.
    pub fn upload_bigint(
        &mut self,
        values: &[BigInteger],
        max_bits: MaxBits,
    ) -> Result<ArrayHandle, GatewayError> {
        let payload = BigintPayload::seal(&encode(values, max_bits))
            .map_err(TransportError::Encode)?;
        debug!(
            "uploading {} bigint values (max_bits={max_bits}, {} base64 bytes)",
            values.len(),
            payload.limbs_b64.len()
        );
        let request = Request::new(Command::CreateBigint)
            .arg("size", values.len() as u64)
            .arg("max_bits", max_bits.to_wire())
            .arg(
                "payload",
                serde_json::to_value(&payload)
                    .map_err(|err| TransportError::Encode(err.into()))?,
            );
        let raw = self.round_trip(&request)?;
        decode_handle(Command::CreateBigint, &raw)
    }

    fn dispatch_for_handle(
        &mut self,
        op: Operation,
        operand: Operand,
    ) -> Result<ArrayHandle, GatewayError> {
        match self.table.validate(op, operand)? {
            Dispatch::Empty(handle) => {
                debug!("{op} short-circuits on empty {}", handle.kind());
                Ok(handle.empty_like())
            }
            Dispatch::Send(handle) => {
                debug!("{op} dispatching {handle}");
                let request = encode_array_command(op.command(), &handle);
                let raw = self.round_trip(&request)?;
                let result = decode_handle(op.command(), &raw)?;
                check_result_shape(op, &handle, &result)?;
                Ok(result)
            }
        }
    }

    fn round_trip(&mut self, request: &Request) -> Result<Vec<u8>, GatewayError> {
        let bytes = encode_request(request).map_err(TransportError::Encode)?;
        Ok(self.transport.send(&bytes)?)
    }
}

/// The server must answer with an array of the input's kind and size; staging
/// must also land on the requested side.
fn check_result_shape(
    op: Operation,
    input: &ArrayHandle,
    result: &ArrayHandle,
) -> Result<(), GatewayError> {
    let residency_ok = match op {
        Operation::ToDevice => result.on_device(),
        Operation::ToHost => !result.on_device(),
        _ => true,
    };
    if result.kind() == input.kind() && result.size() == input.size() && residency_ok {
        Ok(())
    } else {
        Err(GatewayError::Remote(format!(
            "{} returned {result} for {input}",
            op.command()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use array_proto::{encode_reply, Reply, ServerRef};

    /// Replies with a canned message and counts sends.
    struct Canned {
        reply: Vec<u8>,
        sent: Vec<Vec<u8>>,
    }

    impl Transport for Canned {
        fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
            self.sent.push(request.to_vec());
            Ok(self.reply.clone())
        }
    }

    fn canned(reply: &Reply) -> Canned {
        Canned {
            reply: encode_reply(reply).unwrap(),
            sent: Vec::new(),
        }
    }

    #[test]
    fn empty_sort_and_scan_never_touch_the_transport() {
        let mut gateway = Gateway::new(canned(&Reply::error("unreachable")));
        let empty = ArrayHandle::new(ServerRef::new("id_0"), ElementKind::UInt64, 0, true);
        let sorted = gateway.sort(&empty).unwrap();
        let scanned = gateway.scan(&empty).unwrap();
        for result in [&sorted, &scanned] {
            assert!(result.is_empty());
            assert_eq!(result.kind(), ElementKind::UInt64);
        }
        assert!(gateway.transport().sent.is_empty());
    }

    #[test]
    fn empty_transform_is_forwarded() {
        let mut gateway = Gateway::new(canned(&Reply::error("times2 on empty")));
        let err = gateway
            .transform(Gateway::<Canned>::empty(ElementKind::UInt64))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Remote(_)));
        assert_eq!(gateway.transport().sent.len(), 1);
    }

    #[test]
    fn constraint_errors_happen_before_any_send() {
        let mut gateway = Gateway::new(canned(&Reply::error("unreachable")));
        let host = ArrayHandle::new(ServerRef::new("id_1"), ElementKind::Float64, 8, false);
        assert!(matches!(gateway.scan(&host), Err(GatewayError::Constraint { .. })));
        assert!(matches!(gateway.sort(&host), Err(GatewayError::Constraint { .. })));
        assert!(gateway.transport().sent.is_empty());
    }

    #[test]
    fn request_names_the_operand_by_reference() {
        let result = ArrayHandle::new(ServerRef::new("id_3"), ElementKind::UInt64, 4, true);
        let mut gateway = Gateway::new(canned(&Reply::array(&result)));
        let input = ArrayHandle::new(ServerRef::new("id_2"), ElementKind::UInt64, 4, true);
        assert_eq!(gateway.sort(&input).unwrap(), result);
        let sent: serde_json::Value =
            serde_json::from_slice(&gateway.transport().sent[0]).unwrap();
        assert_eq!(sent["command"], "gpuSort");
        assert_eq!(sent["args"]["array"], "id_2");
    }

    #[test]
    fn result_must_match_the_input_shape() {
        let input = ArrayHandle::new(ServerRef::new("id_2"), ElementKind::UInt64, 4, true);
        let short = ArrayHandle::new(ServerRef::new("id_3"), ElementKind::UInt64, 3, true);
        let mut gateway = Gateway::new(canned(&Reply::array(&short)));
        let err = gateway.sort(&input).unwrap_err();
        assert!(matches!(err, GatewayError::Remote(ref msg) if msg.contains("gpuSort")), "{err}");

        let retyped = ArrayHandle::new(ServerRef::new("id_4"), ElementKind::Int64, 4, true);
        let mut gateway = Gateway::new(canned(&Reply::array(&retyped)));
        assert!(matches!(gateway.scan(&input), Err(GatewayError::Remote(_))));
    }

    #[test]
    fn staging_must_land_on_the_requested_side() {
        let host = ArrayHandle::new(ServerRef::new("id_5"), ElementKind::Int64, 2, false);
        let still_host = ArrayHandle::new(ServerRef::new("id_6"), ElementKind::Int64, 2, false);
        let mut gateway = Gateway::new(canned(&Reply::array(&still_host)));
        assert!(matches!(gateway.to_device(&host), Err(GatewayError::Remote(_))));
        assert_eq!(gateway.to_host(&host).unwrap(), still_host);
    }

    #[test]
    fn empty_downloads_are_local() {
        let mut gateway = Gateway::new(canned(&Reply::error("unreachable")));
        let values = gateway
            .download(Gateway::<Canned>::empty(ElementKind::Float64))
            .unwrap();
        assert_eq!(values, HostArray::Float64(Vec::new()));
        let big = ArrayHandle::bigint(ServerRef::new("id_8"), 0, false, MaxBits::bounded(64));
        assert!(gateway.download_bigint(&big).unwrap().is_empty());
        assert!(gateway.transport().sent.is_empty());
    }
}
