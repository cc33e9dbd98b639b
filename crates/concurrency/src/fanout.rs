use futures_util::future::join_all;

/// Drive `f` over `indices` either concurrently (all at once, no ordering
/// guarantee between them) or serially in the order given, aborting at the
/// first error.
///
/// Callers choose the iteration order before calling this: pass ascending
/// indices to confirm in provisioning order, descending indices to cancel
/// in reverse of provisioning order. Concurrent mode ignores the order and
/// always runs every index; serial mode stops as soon as one `f(i)`
/// returns `Err`, leaving the remaining indices untouched.
pub async fn fan_out<T, E, F, Fut>(indices: Vec<usize>, concurrent: bool, mut f: F) -> Vec<(usize, Result<T, E>)>
where
    F: FnMut(usize) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    if concurrent {
        let futures = indices.into_iter().map(|i| {
            let fut = f(i);
            async move { (i, fut.await) }
        });
        join_all(futures).await
    } else {
        let mut out = Vec::with_capacity(indices.len());
        for i in indices {
            let result = f(i).await;
            let failed = result.is_err();
            out.push((i, result));
            if failed {
                break;
            }
        }
        out
    }
}
