//! Packed GF(2) bit vector, bit matrix and block bit matrix primitives.
//!
//! This crate is the `mrhs` workspace's equivalent of `faer-core`: plain
//! data types and the bitwise primitives that operate on them, with no
//! solving logic. [`mrhs_math`](https://docs.rs/mrhs-math) builds the MRHS
//! system, preprocessing, solver tables and search engine on top of these.

pub mod bitmatrix;
pub mod bitvec;
pub mod block;
pub mod blockmatrix;
pub mod error;

pub use bitmatrix::BitMatrix;
pub use bitvec::BitVector;
pub use block::{Block, WORD_BITS};
pub use blockmatrix::BlockBitMatrix;
pub use error::ShapeError;
