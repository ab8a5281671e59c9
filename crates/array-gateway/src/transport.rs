// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Move encoded requests to the array server and return raw replies.
// Author: Lukas Bower

//! Request/reply transports.

use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use array_proto::frame::{read_frame, write_frame};
use log::{debug, trace, warn};

use crate::TransportError;

/// Delivers one encoded request and blocks until its reply arrives.
pub trait Transport {
    /// Send `request` and return the raw reply bytes.
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).send(request)
    }
}

/// Framed request/reply over a TCP stream.
///
/// Any failed exchange leaves the stream out of step with the server, so the
/// transport shuts it down and answers every later `send` with
/// [`TransportError::Closed`].
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    broken: bool,
}

impl TcpTransport {
    /// Connect to `host:port`, applying `io_timeout` to reads and writes.
    pub fn connect(host: &str, port: u16, io_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect((host, port)).map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?;
        stream.set_read_timeout(io_timeout)?;
        stream.set_write_timeout(io_timeout)?;
        stream.set_nodelay(true)?;
        debug!("connected to array server at {addr}");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            broken: false,
        }
    }

    /// True once an exchange has failed and the stream was shut down.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn exchange(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        write_frame(&mut self.stream, request)?;
        read_frame(&mut self.stream)?.ok_or(TransportError::Closed)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if self.broken {
            return Err(TransportError::Closed);
        }
        trace!("sending {} byte request", request.len());
        let result = self.exchange(request);
        if let Err(err) = &result {
            warn!("array server exchange failed, closing connection: {err}");
            self.broken = true;
            let _ = self.stream.shutdown(Shutdown::Both);
        }
        result
    }
}
