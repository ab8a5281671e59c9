// Author: Lukas Bower
// Purpose: Shared in-process transport for gateway integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use array_gateway::{ArrayHandle, Gateway, HostArray, Transport, TransportError};
use array_server_mock::MockArrayServer;

/// Routes requests straight into a mock server and counts them.
pub struct InProcess {
    pub server: Arc<MockArrayServer>,
    pub calls: usize,
}

impl Transport for InProcess {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.calls += 1;
        Ok(self.server.handle_bytes(request))
    }
}

pub fn gateway() -> Gateway<InProcess> {
    Gateway::new(InProcess {
        server: Arc::new(MockArrayServer::new()),
        calls: 0,
    })
}

pub fn calls(gateway: &Gateway<InProcess>) -> usize {
    gateway.transport().calls
}

/// Upload and stage `values` on the device.
pub fn on_device(gateway: &mut Gateway<InProcess>, values: HostArray) -> ArrayHandle {
    let host = gateway.upload(&values).unwrap();
    gateway.to_device(&host).unwrap()
}
