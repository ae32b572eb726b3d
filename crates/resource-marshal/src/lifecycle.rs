//! # Resource Lifecycle
//!
//! Every resource type goes through the same lifecycle:
//!
//! ```text
//! alloc ──► init ──► (scanned / mutated any number of times) ──► cleanup ──► free
//! ```
//!
//! - [`Resource::alloc`] reserves storage, then runs [`Resource::init`].
//! - [`Resource::init`] zeroes scalars and eagerly constructs mandatory sub-resources.
//!   Optional sub-resources start as `None` and lists start empty.
//! - [`Resource::cleanup`] releases everything the instance owns but keeps the instance
//!   itself, so a stack-resident value can be reused across operations.
//! - [`Resource::free`] is cleanup plus release of the storage; `None` is a no-op.
//!
//! ## Rollback
//!
//! Construction is all or nothing. Sub-resources are built with `?`, so when one of
//! them fails every sub-resource already built in that call is dropped, in reverse
//! construction order, before the error reaches the caller.
//!
//! ## Allocators
//!
//! Storage is reserved through the [`Allocator`] trait. [`Heap`] is the production
//! allocator. [`Ledger`] counts live reservations and can be told to fail at a chosen
//! step, which is how the tests prove that a failed construction leaks nothing.

use crate::error::MarshalError;
use crate::list::{ListElement, OwnedList};
use crate::scan::{self, ScanReport};
use crate::schema::{Inject, Schema};
use crate::span::RawSpan;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Source of storage reservations.
pub trait Allocator: Send + Sync {
    /// Reserves storage for one instance of `type_name`.
    ///
    /// The returned [`Lease`] is held by the owning [`Owned`] and given back when it
    /// drops.
    fn reserve(&self, type_name: &'static str) -> Result<Lease, MarshalError>;
}

/// The production allocator. Reservations always succeed and are not tracked.
#[derive(Clone, Copy, Debug, Default)]
pub struct Heap;

impl Allocator for Heap {
    fn reserve(&self, _type_name: &'static str) -> Result<Lease, MarshalError> {
        Ok(Lease { ledger: None })
    }
}

/// Proof of one reservation. Dropping it returns the reservation.
pub struct Lease {
    ledger: Option<Arc<LedgerState>>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(ledger) = &self.ledger {
            ledger.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("tracked", &self.ledger.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    live: AtomicUsize,
    attempts: AtomicUsize,
    fail_at: Option<usize>,
}

/// An accounting allocator for tests.
///
/// Counts reservations that are still alive and, optionally, fails the reservation
/// with the given zero-based attempt number.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    state: Arc<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose `step`-th reservation (counting from zero) fails.
    pub fn failing_at(step: usize) -> Self {
        Self {
            state: Arc::new(LedgerState {
                fail_at: Some(step),
                ..LedgerState::default()
            }),
        }
    }

    /// Reservations handed out and not yet returned.
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Reservation attempts so far, including a failed one.
    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }
}

impl Allocator for Ledger {
    fn reserve(&self, type_name: &'static str) -> Result<Lease, MarshalError> {
        let step = self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_at == Some(step) {
            trace!(type_name, step, "Injected allocation failure");
            return Err(MarshalError::Alloc { type_name });
        }
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Lease {
            ledger: Some(self.state.clone()),
        })
    }
}

/// An exclusively owned, heap-resident value together with its reservation.
///
/// Dereferences to the value. Dropping it releases the value first, then the lease.
pub struct Owned<T> {
    value: Box<T>,
    _lease: Lease,
}

impl<T> Owned<T> {
    pub fn new(value: T, lease: Lease) -> Self {
        Self {
            value: Box::new(value),
            _lease: lease,
        }
    }

    /// Reserves storage through `alloc` and moves `value` into it.
    pub fn reserve(
        alloc: &dyn Allocator,
        type_name: &'static str,
        value: T,
    ) -> Result<Self, MarshalError> {
        let lease = alloc.reserve(type_name)?;
        Ok(Self::new(value, lease))
    }
}

impl<T> Deref for Owned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Owned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Construction and teardown for one resource type.
pub trait Resource: Sized {
    /// Type name used in diagnostics and allocation errors.
    const NAME: &'static str;

    /// Builds a zeroed instance with its mandatory sub-resources in place.
    fn init(alloc: &dyn Allocator) -> Result<Self, MarshalError>;

    /// Releases owned sub-resources and lists and zeroes scalars, keeping the instance.
    fn cleanup(&mut self);

    fn alloc(alloc: &dyn Allocator) -> Result<Owned<Self>, MarshalError> {
        let lease = alloc.reserve(Self::NAME)?;
        let value = Self::init(alloc)?;
        trace!(resource = Self::NAME, "Allocated");
        Ok(Owned::new(value, lease))
    }

    fn free(instance: Option<Owned<Self>>) {
        if let Some(mut instance) = instance {
            instance.cleanup();
            trace!(resource = Self::NAME, "Freed");
        }
    }
}

/// A resource that can be loaded from and written to wire JSON.
pub trait JsonResource: Resource + Schema {
    /// Decodes the nested fields captured during a scan.
    ///
    /// Implementations take their tokens out of `report`, run the nested type's own
    /// load on each span and fold the outcome back with
    /// [`ScanReport::settle`] / [`ScanReport::absorb`]. Only allocation failures are
    /// returned as errors. The default suits resources without nested fields.
    fn load_tokens<'a>(
        &mut self,
        _report: &mut ScanReport<'a>,
        _alloc: &dyn Allocator,
    ) -> Result<(), MarshalError> {
        Ok(())
    }

    /// Scans `span` into `self`, then loads nested fields.
    fn load<'a>(
        &mut self,
        span: RawSpan<'a>,
        alloc: &dyn Allocator,
    ) -> Result<ScanReport<'a>, MarshalError> {
        let mut report = scan::scan(span, self)?;
        self.load_tokens(&mut report, alloc)?;
        Ok(report)
    }

    fn from_json<'a>(
        &mut self,
        json: &'a str,
        alloc: &dyn Allocator,
    ) -> Result<ScanReport<'a>, MarshalError> {
        self.load(RawSpan::whole(json), alloc)
    }

    fn list_from_json(json: &str, alloc: &dyn Allocator) -> Result<OwnedList<Self>, MarshalError>
    where
        Self: ListElement,
    {
        OwnedList::from_json(RawSpan::whole(json), alloc)
    }

    fn list_to_json(list: &OwnedList<Self>) -> Result<String, MarshalError>
    where
        Self: ListElement,
    {
        list.to_json()
    }

    fn list_free(list: Option<OwnedList<Self>>)
    where
        Self: ListElement,
    {
        OwnedList::free(list)
    }
}

/// Loads the token captured for field `index` of `P` into a mandatory sub-resource.
///
/// Without a token the sub-resource is left as it was.
pub fn load_sub<'a, P: Schema, R: JsonResource>(
    report: &mut ScanReport<'a>,
    index: usize,
    sub: &mut R,
    alloc: &dyn Allocator,
) -> Result<(), MarshalError> {
    let Some(span) = report.take_token(index) else {
        return Ok(());
    };
    let field = &P::FIELDS[index];
    if let Some(nested) = report.settle(field, sub.load(span, alloc))? {
        report.absorb(field, nested);
    }
    Ok(())
}

/// Like [`load_sub`] for a zero-or-one sub-resource.
///
/// `null` frees the current value. Anything else is merged into the current value, or
/// into a freshly allocated one when there is none. When the load aborts, an existing
/// value stays in place and a fresh one is released.
pub fn load_optional_sub<'a, P: Schema, R: JsonResource>(
    report: &mut ScanReport<'a>,
    index: usize,
    sub: &mut Option<Owned<R>>,
    alloc: &dyn Allocator,
) -> Result<(), MarshalError> {
    let Some(span) = report.take_token(index) else {
        return Ok(());
    };
    if span.is_null() {
        R::free(sub.take());
        return Ok(());
    }
    let field = &P::FIELDS[index];
    let nested = match sub {
        Some(value) => report.settle(field, value.load(span, alloc))?,
        None => {
            let mut value = R::alloc(alloc)?;
            let nested = report.settle(field, value.load(span, alloc))?;
            *sub = Some(value);
            nested
        }
    };
    if let Some(nested) = nested {
        report.absorb(field, nested);
    }
    Ok(())
}

/// Replaces `list` with the array captured for field `index` of `P`.
///
/// A list that fails to build leaves the previous one in place and is reported as a
/// failure of the field.
pub fn load_list<'a, P: Schema, T: ListElement>(
    report: &mut ScanReport<'a>,
    index: usize,
    list: &mut OwnedList<T>,
    alloc: &dyn Allocator,
) -> Result<(), MarshalError> {
    let Some(span) = report.take_token(index) else {
        return Ok(());
    };
    if let Some(loaded) = report.settle(&P::FIELDS[index], OwnedList::from_json(span, alloc))? {
        *list = loaded;
    }
    Ok(())
}

/// Lets a [`JsonResource`] be an element of an [`OwnedList`].
///
/// Each element is built with [`Resource::init`], loaded from its array entry and
/// rendered with its own injector. Field failures inside an element are fatal for the
/// list, which is all or nothing.
#[macro_export]
macro_rules! impl_list_element {
    ($resource:ty) => {
        impl $crate::list::ListElement for $resource {
            const NAME: &'static str = <$resource as $crate::lifecycle::Resource>::NAME;

            fn init_one(
                alloc: &dyn $crate::lifecycle::Allocator,
            ) -> Result<Self, $crate::error::MarshalError> {
                <$resource as $crate::lifecycle::Resource>::init(alloc)
            }

            fn decode_one(
                &mut self,
                span: $crate::span::RawSpan<'_>,
                alloc: &dyn $crate::lifecycle::Allocator,
            ) -> Result<(), $crate::error::MarshalError> {
                let report = $crate::lifecycle::JsonResource::load(self, span, alloc)?;
                match report.failures().first() {
                    None => Ok(()),
                    Some(failure) => Err($crate::error::MarshalError::Decode {
                        path: failure.path.to_string(),
                        reason: failure.reason.clone(),
                    }),
                }
            }

            fn encode_one(&self) -> $crate::JsonValue {
                $crate::schema::Inject::to_value(self)
            }
        }
    };
}
