// Author: Lukas Bower
// Purpose: In-memory array storage for the mock server.

use std::collections::HashMap;

use array_proto::{ArrayHandle, ElementKind, HostArray, ServerRef};
use bigint_codec::{BigInteger, MaxBits};

/// Element storage of one array.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Fixed-width values.
    Fixed(HostArray),
    /// Bigint values, already wrapped to `max_bits`.
    BigInt {
        /// Stored values.
        values: Vec<BigInteger>,
        /// Bound of the array.
        max_bits: MaxBits,
    },
}

impl Column {
    /// Element kind of the column.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Fixed(values) => values.kind(),
            Self::BigInt { .. } => ElementKind::BigInt,
        }
    }

    /// Element count.
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed(values) => values.len(),
            Self::BigInt { values, .. } => values.len(),
        }
    }
}

/// Stored array plus its residency.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArray {
    /// Elements.
    pub column: Column,
    /// Whether the array is staged on the device.
    pub on_device: bool,
}

/// Named arrays held by the server.
#[derive(Debug, Default)]
pub struct Store {
    arrays: HashMap<String, StoredArray>,
    next_id: u64,
}

impl Store {
    /// Store `array` under a fresh name and describe it.
    pub fn insert(&mut self, array: StoredArray) -> ArrayHandle {
        let name = format!("id_{}", self.next_id);
        self.next_id += 1;
        let handle = describe(&name, &array);
        self.arrays.insert(name, array);
        handle
    }

    /// Look up an array by name.
    pub fn get(&self, name: &str) -> Option<&StoredArray> {
        self.arrays.get(name)
    }

    /// Number of stored arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }
}

fn describe(name: &str, array: &StoredArray) -> ArrayHandle {
    let server_ref = ServerRef::new(name);
    match &array.column {
        Column::BigInt { values, max_bits } => {
            ArrayHandle::bigint(server_ref, values.len(), array.on_device, *max_bits)
        }
        column => ArrayHandle::new(server_ref, column.kind(), column.len(), array.on_device),
    }
}
