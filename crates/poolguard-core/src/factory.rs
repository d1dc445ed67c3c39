//! Resource construction.
//!
//! A factory builds the guarded resource. Slots call it at most once per
//! successful lifetime and never publish anything from a failed call, so
//! implementations only need to be side-effect free on failure.

use async_trait::async_trait;

/// Builds the resource guarded by a [`SingletonSlot`](crate::SingletonSlot).
///
/// # Examples
///
/// ```rust
/// use poolguard_core::{ResourceFactory, SingletonSlot};
///
/// struct Handle {
///     url: String,
/// }
///
/// struct HandleFactory {
///     url: String,
/// }
///
/// impl ResourceFactory for HandleFactory {
///     type Resource = Handle;
///     type Error = std::io::Error;
///
///     fn create(&self) -> Result<Handle, std::io::Error> {
///         Ok(Handle { url: self.url.clone() })
///     }
/// }
///
/// let slot = SingletonSlot::new(HandleFactory { url: "postgres://localhost".into() });
/// assert_eq!(slot.get().unwrap().url, "postgres://localhost");
/// ```
pub trait ResourceFactory: Send + Sync {
    /// The resource produced.
    type Resource: Send + Sync;

    /// Error type for construction failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the resource.
    ///
    /// May be slow; callers racing on the same slot block until it returns.
    fn create(&self) -> Result<Self::Resource, Self::Error>;
}

/// Async counterpart of [`ResourceFactory`], used by
/// [`AsyncSingletonSlot`](crate::AsyncSingletonSlot).
///
/// Construction may be cancelled at any await point (the slot bounds it with a
/// timeout), so implementations must not leave shared state half-updated
/// across awaits.
#[async_trait]
pub trait AsyncResourceFactory: Send + Sync {
    /// The resource produced.
    type Resource: Send + Sync;

    /// Error type for construction failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the resource.
    async fn create(&self) -> Result<Self::Resource, Self::Error>;
}

/// Factory backed by a closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnFactory<F> {
    f: F,
}

/// Use any `Fn() -> Result<R, E>` as a [`ResourceFactory`].
///
/// ```rust
/// use poolguard_core::{SingletonSlot, from_fn};
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(vec![1, 2, 3])));
/// assert_eq!(slot.get().unwrap().len(), 3);
/// ```
pub fn from_fn<F, R, E>(f: F) -> FnFactory<F>
where
    F: Fn() -> Result<R, E> + Send + Sync,
{
    FnFactory { f }
}

impl<F, R, E> ResourceFactory for FnFactory<F>
where
    F: Fn() -> Result<R, E> + Send + Sync,
    R: Send + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    type Resource = R;
    type Error = E;

    fn create(&self) -> Result<R, E> {
        (self.f)()
    }
}
