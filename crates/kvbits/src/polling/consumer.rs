use crate::error::BoxError;

/// Processes one work item.
///
/// Errors are isolated per item: the drain reports them and moves on.
/// Implemented for any `Fn(T) -> Result<(), BoxError>`.
pub trait Consumer<T> {
    /// # Errors
    ///
    /// Any failure processing `item`.
    fn accept(&self, item: T) -> Result<(), BoxError>;
}

impl<T, F> Consumer<T> for F
where
    F: Fn(T) -> Result<(), BoxError>,
{
    fn accept(&self, item: T) -> Result<(), BoxError> {
        self(item)
    }
}
