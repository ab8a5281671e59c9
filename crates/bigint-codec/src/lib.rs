// Author: Lukas Bower
// Purpose: Provide arbitrary-precision limb types and the bigint transfer codec.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Arbitrary-precision integer transfer codec.
//!
//! Values travel as columns of 64-bit limbs (limb 0 least significant) plus a
//! per-value sign lane. A transfer-level `max_bits` bound, when present, is
//! applied by [`wrap_values`] before [`decompose`] packs limbs, so the two steps
//! can be checked in isolation.

mod chunk;
mod error;
mod frame;
mod integer;
mod wrap;

pub use chunk::{decode, decompose, encode, ChunkSet};
pub use error::{CodecError, ParseBigIntegerError};
pub use frame::{decode_frame, encode_frame, FRAME_HEADER_LEN, FRAME_VERSION};
pub use integer::{BigInteger, Limbs, LIMB_BITS};
pub use wrap::{merge_max_bits, wrap_value, wrap_values, MaxBits};
