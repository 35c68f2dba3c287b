//! # elements
//!
//! delegation requests: flattening another sequence into the current one
//!

use std::marker::PhantomData;

use crate::fault::Fault;
use crate::frame_alloc::{FrameAlloc, Heap};
use crate::gen_impl::Gen;
use crate::routine::{Op, Routine, Wake};
use crate::rt::RawGen;

/// A request to flatten another sequence into the current one, passed to the
/// engine via [`Op::Delegate`].
///
/// Wraps either a nested generator or any finite sequence; a plain sequence
/// is wrapped in a synthesized generator that walks it and re-yields each
/// element. The request is consumed when it reaches the engine: from then on
/// the delegating frame owns the target, and the target is torn down before
/// the delegating frame resumes.
///
/// The target must not itself be suspended mid-delegation when the request
/// is made.
pub struct ElementsOf<'a, Y> {
    raw: Option<RawGen<Y>>,
    _life: PhantomData<&'a ()>,
}

impl<'a, Y: 'a> ElementsOf<'a, Y> {
    /// Delegate to a nested generator.
    ///
    /// Only the yielded type has to line up; the target's declared value
    /// type and frame storage strategy may differ from the delegating
    /// sequence's.
    pub fn nested<V, A>(target: Gen<'a, Y, V, A>) -> Self {
        ElementsOf {
            raw: target.into_raw(),
            _life: PhantomData,
        }
    }

    /// Delegate to a finite sequence, re-yielding each of its elements.
    pub fn seq<S>(seq: S) -> Self
    where
        S: IntoIterator,
        S::IntoIter: 'a,
        S::Item: Into<Y>,
    {
        Self::seq_in(seq, Heap)
    }

    /// Like [`ElementsOf::seq`], with the synthesized walking frame obtained
    /// from `alloc` instead of the default heap strategy.
    pub fn seq_in<S, A>(seq: S, alloc: A) -> Self
    where
        S: IntoIterator,
        S::IntoIter: 'a,
        S::Item: Into<Y>,
        A: FrameAlloc + 'a,
    {
        let walk: Gen<'a, Y, S::Item, A> = Gen::new_in(
            SeqWalk {
                iter: seq.into_iter(),
            },
            alloc,
        );
        Self::nested(walk)
    }

    /// Strip the wrapper for the engine.
    pub(crate) fn into_raw(self) -> Option<RawGen<Y>> {
        self.raw
    }
}

/// Synthesized routine that walks a plain sequence and re-yields each
/// element, converted to the delegating sequence's yielded type.
struct SeqWalk<I> {
    iter: I,
}

impl<'a, Y, I> Routine<'a, Y> for SeqWalk<I>
where
    I: Iterator,
    I::Item: Into<Y>,
{
    fn resume(&mut self, _wake: Wake) -> Result<Op<'a, Y>, Fault> {
        match self.iter.next() {
            Some(item) => Ok(Op::Yield(item.into())),
            None => Ok(Op::Complete),
        }
    }
}
