//! # flatgen
//!
//! Lazy generator engine with O(1) delegation to nested producers.
//!
//! A [`Gen`] is a lazily produced, single-pass sequence. Its elements come
//! from a [`Routine`]: an explicit state machine that is resumed by the
//! consumer, produces one element per resume, and suspends by returning.
//! A routine may also *delegate* production to another generator or to any
//! finite sequence ([`ElementsOf`]), and the engine flattens the delegated
//! elements into the outer sequence with a constant number of steps per
//! element, no matter how deeply delegations nest.
//!
//! Creating a generator allocates its frame but runs none of the routine's
//! body; the first advance does. Faults ([`Fault`]) raised inside a
//! delegated chain surface at the delegation point of the delegating
//! routine, and faults from the root frame propagate out of the consumer's
//! advance call.
//!
//! ```
//! use flatgen::{ElementsOf, Fault, Gen, Op, Routine, Wake};
//!
//! struct Outer {
//!     pc: u8,
//! }
//!
//! impl Routine<'static, i32> for Outer {
//!     fn resume(&mut self, _wake: Wake) -> Result<Op<'static, i32>, Fault> {
//!         self.pc += 1;
//!         match self.pc {
//!             1 => Ok(Op::Yield(1)),
//!             2 => Ok(Op::Delegate(ElementsOf::seq(vec![2, 3]))),
//!             3 => Ok(Op::Yield(4)),
//!             _ => Ok(Op::Complete),
//!         }
//!     }
//! }
//!
//! let g: Gen<i32> = Gen::new(Outer { pc: 0 });
//! assert_eq!(g.collect::<Vec<_>>(), [1, 2, 3, 4]);
//! ```

#![deny(missing_docs)]

mod elements;
mod fault;
mod frame_alloc;
mod gen_impl;
mod routine;
mod rt;
mod slot;

pub use crate::elements::ElementsOf;
pub use crate::fault::Fault;
pub use crate::frame_alloc::{FrameAlloc, Heap};
pub use crate::gen_impl::{Cursor, Gen, Sentinel, Sequence, View};
pub use crate::routine::{Op, Routine, Wake};
