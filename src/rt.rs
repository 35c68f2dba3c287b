//! # run time support
//!
//! frame bookkeeping and the delegation protocol
//!
//! Every live generator owns a chain of one or more frames. The first frame
//! (the root) carries the single value slot consumers read from and a link to
//! whichever frame is currently suspended at a production point. Delegation
//! re-links these pointers so that stepping the sequence resumes the
//! innermost active frame in one hop, no matter how deep the chain is, and
//! completing a delegate hands control back to its parent in one hop as well.

use std::alloc::Layout;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use log::error;

use crate::fault::Fault;
use crate::frame_alloc::FrameAlloc;
use crate::routine::{Op, Routine, Wake};
use crate::slot::ValueSlot;

/// Per-frame bookkeeping. Lives at the head of every frame allocation.
pub(crate) struct ProducerState<Y> {
    /// Top-most frame of the chain this frame currently feeds.
    /// Self-referential while the frame is not a delegate.
    root: NonNull<ProducerState<Y>>,
    /// On the root: the innermost frame suspended at a production point.
    /// On a delegate: the frame that delegated into this one.
    parent_or_leaf: NonNull<ProducerState<Y>>,
    /// The delegate this frame is currently running, if any. Holding it here
    /// pins teardown order: a frame's delegate is destroyed before the
    /// frame's own routine state.
    delegate: Option<RawGen<Y>>,
    /// Element storage. Only the root's slot is ever used.
    value: ValueSlot<Y>,
    /// Set once the routine has completed or faulted.
    done: bool,
    /// Type-erased entry points for the frame's concrete routine type.
    resume_fn: unsafe fn(NonNull<ProducerState<Y>>, Wake) -> RawStep<Y>,
    destroy_fn: unsafe fn(NonNull<ProducerState<Y>>),
}

/// What a single resume of a frame came back with, the delegation request
/// already stripped of its public wrapper.
pub(crate) enum RawStep<Y> {
    Yielded(Y),
    Delegating(Option<RawGen<Y>>),
    Finished(Result<(), Fault>),
}

/// A frame allocation: bookkeeping header first, then the routine state.
/// When the storage strategy is stateful, its instance sits after this cell
/// at the strategy's aligned offset.
#[repr(C)]
struct FrameCell<Y, R> {
    state: ProducerState<Y>,
    routine: R,
}

/// Layout of a whole frame allocation, and the offset of the embedded
/// storage strategy within it.
fn frame_layout<Y, R, A>() -> (Layout, usize) {
    let cell = Layout::new::<FrameCell<Y, R>>();
    let (full, offset) = cell
        .extend(Layout::new::<A>())
        .expect("frame layout overflow");
    (full.pad_to_align(), offset)
}

/// Allocate and initialize a frame for `routine`, suspended before any of
/// its body has run. The storage strategy instance is moved into the tail of
/// the allocation so the matching release can rebuild it from there.
pub(crate) fn new_frame<'a, Y, R, A>(routine: R, alloc: A) -> RawGen<Y>
where
    Y: 'a,
    R: Routine<'a, Y> + 'a,
    A: FrameAlloc + 'a,
{
    let (layout, alloc_offset) = frame_layout::<Y, R, A>();
    let raw = alloc.allocate(layout);
    let cell = raw.cast::<FrameCell<Y, R>>();
    // SAFETY: `raw` is a fresh allocation of `layout`, which covers the cell
    // and the strategy slot at `alloc_offset`
    unsafe {
        ptr::write(raw.as_ptr().add(alloc_offset) as *mut A, alloc);
        ptr::write(
            cell.as_ptr(),
            FrameCell {
                state: ProducerState {
                    root: cell.cast(),
                    parent_or_leaf: cell.cast(),
                    delegate: None,
                    value: ValueSlot::empty(),
                    done: false,
                    resume_fn: resume_frame::<Y, R>,
                    destroy_fn: destroy_frame::<Y, R, A>,
                },
                routine,
            },
        );
    }
    RawGen { state: cell.cast() }
}

/// Run the frame's routine to its next suspension point. Panics raised by
/// the routine are captured here, at the frame boundary, instead of
/// unwinding across independently allocated frames.
unsafe fn resume_frame<'a, Y: 'a, R>(state: NonNull<ProducerState<Y>>, wake: Wake) -> RawStep<Y>
where
    R: Routine<'a, Y>,
{
    let cell = state.as_ptr() as *mut FrameCell<Y, R>;
    let routine = unsafe { &mut (*cell).routine };
    match panic::catch_unwind(AssertUnwindSafe(|| routine.resume(wake))) {
        Ok(Ok(Op::Yield(v))) => RawStep::Yielded(v),
        Ok(Ok(Op::Delegate(request))) => RawStep::Delegating(request.into_raw()),
        Ok(Ok(Op::Complete)) => RawStep::Finished(Ok(())),
        Ok(Err(fault)) => RawStep::Finished(Err(fault)),
        Err(payload) => {
            error!("routine panicked inside a generator frame");
            RawStep::Finished(Err(Fault::from_panic(payload)))
        }
    }
}

/// Tear the frame down and release its storage. Dropping the cell drops the
/// frame's delegate chain before its own routine state, which gives the
/// innermost-first scope-exit order across a delegation chain; the storage
/// strategy is rebuilt from its tail slot to free the block, then dropped.
unsafe fn destroy_frame<Y, R, A>(state: NonNull<ProducerState<Y>>)
where
    A: FrameAlloc,
{
    let (layout, alloc_offset) = frame_layout::<Y, R, A>();
    let cell = state.as_ptr() as *mut FrameCell<Y, R>;
    unsafe {
        ptr::drop_in_place(cell);
        let alloc = ptr::read((cell as *mut u8).add(alloc_offset) as *mut A);
        alloc.deallocate(NonNull::new_unchecked(cell as *mut u8), layout);
    }
}

/// Owning, type-erased handle to one frame. The public [`Gen`] wrapper
/// carries the routine lifetime this type erases.
///
/// [`Gen`]: crate::Gen
pub(crate) struct RawGen<Y> {
    state: NonNull<ProducerState<Y>>,
}

impl<Y> RawGen<Y> {
    #[inline]
    fn st(&self) -> *mut ProducerState<Y> {
        self.state.as_ptr()
    }

    /// True once the chain rooted here has fully completed.
    #[inline]
    pub(crate) fn is_done(&self) -> bool {
        unsafe { (*self.st()).done }
    }

    /// Read the current element in the root slot.
    pub(crate) fn value_ref(&self) -> &Y {
        unsafe { (*self.st()).value.get() }
    }

    /// Drop the current element, if any.
    pub(crate) fn clear_value(&mut self) {
        unsafe { (*self.st()).value.clear() }
    }

    /// Move the current element out, if any.
    pub(crate) fn take_value(&mut self) -> Option<Y> {
        unsafe { (*self.st()).value.take() }
    }

    /// Drive the chain rooted at this frame until it produces an element or
    /// completes. This is the only place control transfers happen.
    ///
    /// Each turn of the loop resumes whichever frame the root currently
    /// records as active: one indirection from the root, regardless of how
    /// deep the chain is.
    pub(crate) fn advance(&mut self) {
        let root = self.state;
        let mut wake = Wake::Next;
        loop {
            let leaf = unsafe { (*root.as_ptr()).parent_or_leaf };
            let step = unsafe { ((*leaf.as_ptr()).resume_fn)(leaf, wake) };
            match step {
                RawStep::Yielded(v) => {
                    // whichever frame produced it, the element lands in the
                    // root's slot so the consumer reads one fixed location
                    unsafe { (*root.as_ptr()).value.fill(v) };
                    return;
                }
                RawStep::Delegating(target) => match target {
                    Some(child) if !child.is_done() => {
                        // splice the target into the chain and transfer
                        // straight into it, no trampoline frame
                        unsafe {
                            let c = child.st();
                            debug_assert!(
                                (*c).delegate.is_none(),
                                "delegated into a sequence that is itself mid-delegation"
                            );
                            (*c).root = root;
                            (*c).parent_or_leaf = leaf;
                            (*root.as_ptr()).parent_or_leaf = child.state;
                            (*leaf.as_ptr()).delegate = Some(child);
                        }
                        wake = Wake::Next;
                    }
                    other => {
                        // absent or exhausted target: the delegation
                        // completes on the spot, without resuming it
                        drop(other);
                        wake = Wake::Delegated(Ok(()));
                    }
                },
                RawStep::Finished(result) => {
                    unsafe { (*leaf.as_ptr()).done = true };
                    if leaf == root {
                        if let Err(fault) = result {
                            // a root fault propagates out of the advance
                            // call the consumer made
                            fault.raise();
                        }
                        return;
                    }
                    // hand control back to the delegating frame in one hop,
                    // without unwinding through intermediate levels. The
                    // finished delegate is torn down before its parent
                    // resumes.
                    let parent = unsafe { (*leaf.as_ptr()).parent_or_leaf };
                    unsafe {
                        (*root.as_ptr()).parent_or_leaf = parent;
                        (*parent.as_ptr()).delegate = None;
                    }
                    wake = Wake::Delegated(result);
                }
            }
        }
    }
}

impl<Y> Drop for RawGen<Y> {
    fn drop(&mut self) {
        let destroy = unsafe { (*self.st()).destroy_fn };
        unsafe { destroy(self.state) }
    }
}
