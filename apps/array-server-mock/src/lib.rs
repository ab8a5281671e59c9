// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: In-memory array server answering the gateway command set.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Mock array server.
//!
//! Holds arrays in memory and executes every command the gateway issues on
//! the host, so the protocol can be exercised without accelerator hardware.
//! Requests are handled in-process through [`MockArrayServer::handle_bytes`]
//! or over TCP through [`serve`].

pub mod kernels;
mod store;

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use array_proto::frame::{read_frame, write_frame};
use array_proto::{
    decode_request, encode_reply, BigintPayload, Command, ElementKind, HandleDescriptor,
    HostArray, ProtoError, Reply, ReplyPayload, Request,
};
use bigint_codec::MaxBits;
use log::{debug, info, warn};

pub use store::{Column, StoredArray};
use store::Store;

/// Failures reported back to the client as `{"error": ..}` replies.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Request bytes did not parse.
    #[error("malformed request: {0}")]
    Malformed(String),
    /// A required argument was absent or of the wrong type.
    #[error("{command}: missing or invalid argument '{key}'")]
    Argument {
        /// Command being executed.
        command: Command,
        /// Argument name.
        key: &'static str,
    },
    /// No array is stored under the given name.
    #[error("{command}: unknown array '{name}'")]
    UnknownArray {
        /// Command being executed.
        command: Command,
        /// Name looked up.
        name: String,
    },
    /// The command does not handle arrays of this kind.
    #[error("{command} does not support {kind}")]
    Unsupported {
        /// Command being executed.
        command: Command,
        /// Offending kind.
        kind: ElementKind,
    },
    /// The command requires a device-resident array.
    #[error("{command} only works on device-resident arrays")]
    NotOnDevice {
        /// Command being executed.
        command: Command,
    },
    /// A bigint payload failed verification.
    #[error("{command}: {source}")]
    Payload {
        /// Command being executed.
        command: Command,
        /// Verification failure.
        #[source]
        source: ProtoError,
    },
}

/// In-memory array server.
#[derive(Debug, Default)]
pub struct MockArrayServer {
    store: Mutex<Store>,
    requests: AtomicU64,
}

impl MockArrayServer {
    /// Server with no stored arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests handled so far, including failed ones.
    pub fn requests_served(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Number of arrays currently stored.
    pub fn array_count(&self) -> usize {
        self.lock().len()
    }

    /// Copy of a stored array, for inspection in tests and tooling.
    pub fn snapshot(&self, name: &str) -> Option<StoredArray> {
        self.lock().get(name).cloned()
    }

    /// Handle one encoded request and return the encoded reply.
    pub fn handle_bytes(&self, request: &[u8]) -> Vec<u8> {
        let reply = match decode_request(request) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                self.requests.fetch_add(1, Ordering::Relaxed);
                Reply::error(ServerError::Malformed(err.to_string()).to_string())
            }
        };
        encode_reply(&reply).unwrap_or_else(|err| {
            serde_json::json!({ "error": format!("reply encoding failed: {err}") })
                .to_string()
                .into_bytes()
        })
    }

    /// Handle one decoded request.
    pub fn handle(&self, request: &Request) -> Reply {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match self.execute(request) {
            Ok(payload) => Reply::Result(payload),
            Err(err) => {
                debug!("{} failed: {err}", request.command);
                Reply::error(err.to_string())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, request: &Request) -> Result<ReplyPayload, ServerError> {
        let command = request.command;
        match command {
            Command::CreateArray => self.create_array(request),
            Command::CreateBigint => self.create_bigint(request),
            Command::Times2 => self.derive(request, |array| {
                match &array.column {
                    Column::Fixed(HostArray::UInt64(values)) => Ok(StoredArray {
                        column: Column::Fixed(HostArray::UInt64(
                            values.iter().map(|v| v.wrapping_mul(2)).collect(),
                        )),
                        on_device: array.on_device,
                    }),
                    column => Err(ServerError::Unsupported {
                        command,
                        kind: column.kind(),
                    }),
                }
            }),
            Command::GpuScan => self.derive(request, |array| {
                if !array.on_device {
                    return Err(ServerError::NotOnDevice { command });
                }
                let scanned = match &array.column {
                    Column::Fixed(HostArray::Int64(values)) => {
                        HostArray::Int64(kernels::exclusive_scan(values, 0, i64::wrapping_add))
                    }
                    Column::Fixed(HostArray::UInt64(values)) => {
                        HostArray::UInt64(kernels::exclusive_scan(values, 0, u64::wrapping_add))
                    }
                    Column::Fixed(HostArray::Float64(values)) => {
                        HostArray::Float64(kernels::exclusive_scan(values, 0.0, |a, b| a + b))
                    }
                    column => {
                        return Err(ServerError::Unsupported {
                            command,
                            kind: column.kind(),
                        })
                    }
                };
                Ok(StoredArray {
                    column: Column::Fixed(scanned),
                    on_device: true,
                })
            }),
            Command::GpuSort => self.derive(request, |array| match &array.column {
                Column::Fixed(HostArray::UInt64(values)) => Ok(StoredArray {
                    column: Column::Fixed(HostArray::UInt64(kernels::radix_sort(values))),
                    on_device: array.on_device,
                }),
                column => Err(ServerError::Unsupported {
                    command,
                    kind: column.kind(),
                }),
            }),
            Command::GpuStage | Command::GpuUnstage => {
                let on_device = command == Command::GpuStage;
                self.derive(request, |array| match &array.column {
                    Column::Fixed(_) => Ok(StoredArray {
                        column: array.column.clone(),
                        on_device,
                    }),
                    column => Err(ServerError::Unsupported {
                        command,
                        kind: column.kind(),
                    }),
                })
            }
            Command::ToNdarray => {
                let store = self.lock();
                let array = lookup(&store, request)?;
                match &array.column {
                    Column::Fixed(values) => Ok(ReplyPayload::Values(values.clone())),
                    column => Err(ServerError::Unsupported {
                        command,
                        kind: column.kind(),
                    }),
                }
            }
            Command::BigintToLimbs => {
                let store = self.lock();
                let array = lookup(&store, request)?;
                match &array.column {
                    Column::BigInt { values, max_bits } => {
                        BigintPayload::from_values(values, *max_bits)
                            .map(ReplyPayload::Bigint)
                            .map_err(|source| ServerError::Payload { command, source })
                    }
                    column => Err(ServerError::Unsupported {
                        command,
                        kind: column.kind(),
                    }),
                }
            }
        }
    }

    /// Build a new array from the one named in `request` and reply with its handle.
    fn derive<F>(&self, request: &Request, build: F) -> Result<ReplyPayload, ServerError>
    where
        F: FnOnce(&StoredArray) -> Result<StoredArray, ServerError>,
    {
        let mut store = self.lock();
        let result = build(lookup(&store, request)?)?;
        let handle = store.insert(result);
        debug!("{} -> {handle}", request.command);
        Ok(ReplyPayload::Array(HandleDescriptor::from_handle(&handle)))
    }

    fn create_array(&self, request: &Request) -> Result<ReplyPayload, ServerError> {
        let command = request.command;
        let values: HostArray = request
            .args
            .get("values")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or(ServerError::Argument {
                command,
                key: "values",
            })?;
        let handle = self.lock().insert(StoredArray {
            column: Column::Fixed(values),
            on_device: false,
        });
        Ok(ReplyPayload::Array(HandleDescriptor::from_handle(&handle)))
    }

    fn create_bigint(&self, request: &Request) -> Result<ReplyPayload, ServerError> {
        let command = request.command;
        let payload: BigintPayload = request
            .args
            .get("payload")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or(ServerError::Argument {
                command,
                key: "payload",
            })?;
        let max_bits = request
            .i64_arg("max_bits")
            .and_then(|raw| MaxBits::from_wire(raw).ok())
            .ok_or(ServerError::Argument {
                command,
                key: "max_bits",
            })?;
        let size = request
            .i64_arg("size")
            .and_then(|raw| usize::try_from(raw).ok())
            .ok_or(ServerError::Argument {
                command,
                key: "size",
            })?;

        let chunks = payload
            .open()
            .map_err(|source| ServerError::Payload { command, source })?;
        if chunks.len() != size {
            return Err(ServerError::Payload {
                command,
                source: ProtoError::ElementCountMismatch {
                    expected: size,
                    actual: chunks.len(),
                },
            });
        }
        if chunks.max_bits() != max_bits {
            return Err(ServerError::Argument {
                command,
                key: "max_bits",
            });
        }
        let values = chunks.decode().map_err(|err| ServerError::Payload {
            command,
            source: err.into(),
        })?;
        let handle = self.lock().insert(StoredArray {
            column: Column::BigInt { values, max_bits },
            on_device: false,
        });
        Ok(ReplyPayload::Array(HandleDescriptor::from_handle(&handle)))
    }
}

fn lookup<'a>(store: &'a Store, request: &Request) -> Result<&'a StoredArray, ServerError> {
    let command = request.command;
    let name = request.str_arg("array").ok_or(ServerError::Argument {
        command,
        key: "array",
    })?;
    store.get(name).ok_or_else(|| ServerError::UnknownArray {
        command,
        name: name.to_owned(),
    })
}

/// Answer framed requests on one connection until the peer closes it.
pub fn serve_connection(server: &MockArrayServer, mut stream: TcpStream) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    debug!("client connected from {peer}");
    while let Some(request) = read_frame(&mut stream)? {
        let reply = server.handle_bytes(&request);
        write_frame(&mut stream, &reply)?;
    }
    debug!("client {peer} disconnected");
    Ok(())
}

/// Accept connections forever, one thread per client.
pub fn serve(listener: TcpListener, server: Arc<MockArrayServer>) -> io::Result<()> {
    info!("array server listening on {}", listener.local_addr()?);
    for stream in listener.incoming() {
        let stream = stream?;
        let server = Arc::clone(&server);
        thread::spawn(move || {
            if let Err(err) = serve_connection(&server, stream) {
                warn!("connection ended with error: {err}");
            }
        });
    }
    Ok(())
}

/// Bind `addr` and serve on a background thread, returning the bound address.
pub fn spawn<A: ToSocketAddrs>(
    addr: A,
    server: Arc<MockArrayServer>,
) -> io::Result<(SocketAddr, JoinHandle<io::Result<()>>)> {
    let listener = TcpListener::bind(addr)?;
    let local = listener.local_addr()?;
    let handle = thread::spawn(move || serve(listener, server));
    Ok((local, handle))
}
