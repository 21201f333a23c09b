//! # Failure classification: is another attempt permitted?
//!
//! [`ErrorFilter`] answers one question for the attempt loop: given a failed
//! attempt's error, may the engine try again? Two knobs feed the decision:
//!
//! - a **predicate** over the borrowed error (`retry_if`), consulted first —
//!   a `false` here forbids retrying regardless of the kind set;
//! - an explicit **set of retryable kinds** (`retry_on`), consulted second —
//!   a non-empty set forbids any error whose kind is not a member.
//!
//! With neither configured, every error is retryable. The filter is never
//! consulted on the final attempt; exhaustion handling wins there.
//!
//! Kinds are identity tags, not inheritance probes: an error names its own
//! [`ErrorKind`] through [`Classify`], and membership is an equality check.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Identity tag for an error kind.
///
/// Two tags match only if they were created the same way: from the same type
/// via [`ErrorKind::of`], or from the same name via [`ErrorKind::named`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ErrorKind(Tag);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Tag {
    Type(TypeId),
    Named(&'static str),
}

impl ErrorKind {
    /// Tag derived from a type's identity.
    pub fn of<T: 'static>() -> Self {
        ErrorKind(Tag::Type(TypeId::of::<T>()))
    }

    /// Tag derived from a static name.
    ///
    /// Useful for enum errors where each variant is its own kind.
    pub fn named(name: &'static str) -> Self {
        ErrorKind(Tag::Named(name))
    }
}

/// Maps an error value to its [`ErrorKind`] tag.
///
/// The default implementation tags every value of the type identically, which
/// is right for one-kind error types:
///
/// ```
/// use insist::Classify;
///
/// #[derive(Debug)]
/// struct DnsError(String);
///
/// impl Classify for DnsError {}
/// ```
///
/// Enum errors override [`kind`](Classify::kind) to report per-variant tags:
///
/// ```
/// use insist::{Classify, ErrorKind};
///
/// #[derive(Debug)]
/// enum FetchError {
///     Timeout,
///     Denied,
/// }
///
/// impl Classify for FetchError {
///     fn kind(&self) -> ErrorKind {
///         match self {
///             FetchError::Timeout => ErrorKind::named("timeout"),
///             FetchError::Denied => ErrorKind::named("denied"),
///         }
///     }
/// }
///
/// assert_eq!(FetchError::Timeout.kind(), ErrorKind::named("timeout"));
/// assert_ne!(FetchError::Timeout.kind(), FetchError::Denied.kind());
/// ```
pub trait Classify: Sized + 'static {
    /// Returns the identity tag used by explicit retryable-kind filters.
    fn kind(&self) -> ErrorKind {
        ErrorKind::of::<Self>()
    }
}

impl Classify for String {}
impl Classify for std::io::Error {}

/// Caller-supplied retry predicate.
pub(crate) type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Decides whether a failed attempt's error permits another attempt.
pub struct ErrorFilter<E> {
    pub(crate) retry_on: Option<HashSet<ErrorKind>>,
    pub(crate) predicate: Option<RetryPredicate<E>>,
}

impl<E> ErrorFilter<E> {
    /// Returns `true` if another attempt is permitted for this error.
    ///
    /// Order matters: a configured predicate returning `false` forbids
    /// retrying before the kind set is even looked at. An empty kind set is
    /// treated as absent.
    pub fn can_retry(&self, error: &E) -> bool
    where
        E: Classify,
    {
        if let Some(predicate) = &self.predicate {
            if !predicate(error) {
                return false;
            }
        }
        if let Some(kinds) = &self.retry_on {
            if !kinds.is_empty() && !kinds.contains(&error.kind()) {
                return false;
            }
        }
        true
    }
}

impl<E> Clone for ErrorFilter<E> {
    fn clone(&self) -> Self {
        Self {
            retry_on: self.retry_on.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<E> fmt::Debug for ErrorFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorFilter")
            .field("retry_on", &self.retry_on)
            .field("predicate", &self.predicate.as_ref().map(|_| ".."))
            .finish()
    }
}
