/// Macro to define error boundaries with automatic `From` implementation.
///
/// Crates built on top of the slot declare how [`SlotError`](crate::SlotError)
/// (or their own factory errors) cross into their public error type, so the
/// `?` operator works at the boundary without `map_err()` chains.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use poolguard_core::{SingletonSlot, SlotError, error_boundary, from_fn};
///
/// #[derive(Debug, thiserror::Error)]
/// enum AppError {
///     #[error("duplicate singleton")]
///     Duplicate,
///     #[error("slot: {0}")]
///     Slot(SlotError),
/// }
///
/// error_boundary!(SlotError => AppError, |e| match e {
///     SlotError::Construction { .. } => AppError::Duplicate,
///     other => AppError::Slot(other),
/// });
///
/// fn first_value(slot: &SingletonSlot<impl poolguard_core::ResourceFactory<Resource = u32>>)
///     -> Result<u32, AppError>
/// {
///     let instance = slot.get()?; // SlotError converts automatically
///     Ok(*instance.resource())
/// }
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(7u32)));
/// assert_eq!(first_value(&slot).unwrap(), 7);
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        // The From impl is what enables `?` operator
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}
