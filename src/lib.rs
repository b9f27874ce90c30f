//! Open-addressing hash tables with a fixed probing stride and
//! backward-shift deletion.
//!
//! [`KeyedTable`] maps borrowed string keys to `Copy` values and
//! [`MemberSet`] tracks membership of pointer-sized values. Both share one
//! slot array implementation: capacity is a power of two, the hash is reduced
//! with a mask, collisions step by [`STRIDE`], and removals shift later
//! entries back instead of leaving tombstones.

pub mod error;
pub mod hash;
pub mod map;
pub mod set;
mod table;

pub use error::TableError;
pub use hash::{Djb2, Fibonacci, FnHasher, KeyHasher, Murmur3Mix};
pub use map::{KeyedTable, Outcome};
pub use set::MemberSet;
pub use table::{max_load, DEFAULT_CAPACITY, STRIDE};
