//! Waiting on several resolutions at once.

use core::future::Future;

use crate::error::ResolveError;

/// Awaits every future in order and collects their values in input order.
///
/// Fails fast: the first failure rejects with [`ResolveError::Aggregate`]
/// carrying the failed input's index and error, and later inputs are not
/// awaited. The combinator never cancels inputs itself; pass `&mut`
/// [`Resolution`](crate::Resolution)s to keep them alive after a failure.
///
/// # Example
///
/// ```
/// use canopy_resolve::{Resolution, ResolveError, bulk};
///
/// # tokio_test::block_on(async {
/// let mut first = Resolution::resolved(1);
/// let mut second = Resolution::resolved(2);
/// assert_eq!(bulk([&mut first, &mut second]).await, Ok(vec![1, 2]));
///
/// let failing = [Resolution::resolved(1), Resolution::rejected(ResolveError::Cancelled)];
/// let err = bulk(failing).await.unwrap_err();
/// assert!(matches!(err, ResolveError::Aggregate { index: 1, .. }));
/// # });
/// ```
pub async fn bulk<I, F, T>(futures: I) -> Result<Vec<T>, ResolveError>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, ResolveError>>,
{
    let futures = futures.into_iter();
    let mut values = Vec::with_capacity(futures.size_hint().0);

    for (index, future) in futures.enumerate() {
        match future.await {
            Ok(value) => values.push(value),
            Err(source) => {
                tracing::debug!(index, error = %source, "bulk input failed");
                return Err(ResolveError::Aggregate {
                    index,
                    source: Box::new(source),
                });
            }
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resolution;
    use futures::FutureExt;

    #[test]
    fn empty_input_resolves_empty() {
        let result = bulk(Vec::<Resolution<u8>>::new()).now_or_never();
        assert_eq!(result, Some(Ok(Vec::new())));
    }

    #[test]
    fn preserves_input_order() {
        let (late, late_done) = Resolution::pending("late", None);
        let early = Resolution::resolved("early");
        late_done.resolve("late");

        let result = bulk([late, early]).now_or_never();
        assert_eq!(result, Some(Ok(vec!["late", "early"])));
    }

    #[test]
    fn borrowed_inputs_survive_failure() {
        let mut ok = Resolution::resolved(1);
        let mut failed = Resolution::<i32>::rejected(ResolveError::Cancelled);
        let (mut pending, completer) = Resolution::<i32>::pending("third", None);

        let result = bulk([&mut ok, &mut failed, &mut pending]).now_or_never();
        assert!(matches!(
            result,
            Some(Err(ResolveError::Aggregate { index: 1, .. }))
        ));
        assert!(completer.is_pending());
        assert!(!pending.scope().is_disposed());
    }
}
