//! Collects worker outcomes with fail-fast semantics.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::{DownloadError, FetchOutcome, FetchedResponse};

/// Read outcomes until `expected` successes arrive, the first error shows up,
/// or `cancel` fires.
///
/// On an error outcome the token is cancelled before returning, so the
/// dispatcher and the workers wind down. Responses come back in arrival order.
/// The receiver is dropped on return; later writers see a closed channel.
pub(crate) async fn collect(
    cancel: &CancellationToken,
    expected: usize,
    mut results: mpsc::Receiver<FetchOutcome>,
) -> Result<Vec<FetchedResponse>, DownloadError> {
    let mut responses = Vec::with_capacity(expected);

    while responses.len() < expected {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            outcome = results.recv() => match outcome {
                Some(FetchOutcome { url, result: Ok(value) }) => {
                    responses.push(FetchedResponse { url, value });
                }
                Some(FetchOutcome { url, result: Err(source) }) => {
                    cancel.cancel();
                    if source.is_cancelled() {
                        return Err(DownloadError::Cancelled);
                    }
                    return Err(DownloadError::Fetch { url, source });
                }
                None => {
                    return Err(DownloadError::Incomplete {
                        expected,
                        received: responses.len(),
                    });
                }
            },
        }
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready, task};

    fn ok(url: &str) -> FetchOutcome {
        FetchOutcome {
            url: url.to_string(),
            result: Ok(json!({ "url": url })),
        }
    }

    fn failed(url: &str) -> FetchOutcome {
        FetchOutcome {
            url: url.to_string(),
            result: Err(FetchError::network(url, "connection reset")),
        }
    }

    #[tokio::test]
    async fn test_collects_in_arrival_order() {
        let (tx, rx) = mpsc::channel(3);
        tx.send(ok("c")).await.unwrap();
        tx.send(ok("a")).await.unwrap();
        tx.send(ok("b")).await.unwrap();

        let cancel = CancellationToken::new();
        let responses = collect(&cancel, 3, rx).await.unwrap();

        let urls: Vec<_> = responses.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "a", "b"]);
        assert_eq!(responses[0].value, json!({"url": "c"}));
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_first_error_cancels_and_returns() {
        let (tx, rx) = mpsc::channel(3);
        tx.send(ok("a")).await.unwrap();
        tx.send(failed("bad")).await.unwrap();

        let cancel = CancellationToken::new();
        // Third outcome never arrives: the error alone must end collection.
        let err = collect(&cancel, 3, rx).await.unwrap_err();

        match err {
            DownloadError::Fetch { url, source } => {
                assert_eq!(url, "bad");
                assert!(matches!(source, FetchError::Network { .. }));
            }
            other => panic!("Expected Fetch error, got {:?}", other),
        }
        assert!(cancel.is_cancelled());

        // The receiver is gone, late writers must be refused.
        assert!(tx.try_send(ok("late")).is_err());
    }

    #[tokio::test]
    async fn test_pending_until_every_outcome_arrives() {
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let mut collecting = task::spawn(collect(&cancel, 2, rx));

        assert_pending!(collecting.poll());

        tx.try_send(ok("a")).unwrap();
        assert!(collecting.is_woken());
        assert_pending!(collecting.poll());

        tx.try_send(ok("b")).unwrap();
        let responses = assert_ready!(collecting.poll()).unwrap();
        assert_eq!(responses.len(), 2);
    }

    #[tokio::test]
    async fn test_external_cancellation() {
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let mut collecting = task::spawn(collect(&cancel, 2, rx));

        tx.try_send(ok("a")).unwrap();
        assert_pending!(collecting.poll());

        cancel.cancel();
        let err = assert_ready!(collecting.poll()).unwrap_err();
        assert!(matches!(err, DownloadError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_outcome_maps_to_cancelled() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(FetchOutcome {
            url: "a".to_string(),
            result: Err(FetchError::cancelled("a")),
        })
        .await
        .unwrap();

        let err = collect(&CancellationToken::new(), 1, rx).await.unwrap_err();
        assert!(matches!(err, DownloadError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_channel_is_incomplete() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(ok("a")).await.unwrap();
        drop(tx);

        let err = collect(&CancellationToken::new(), 2, rx).await.unwrap_err();
        match err {
            DownloadError::Incomplete { expected, received } => {
                assert_eq!(expected, 2);
                assert_eq!(received, 1);
            }
            other => panic!("Expected Incomplete error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_expected_returns_immediately() {
        let (_tx, rx) = mpsc::channel(1);
        let responses = collect(&CancellationToken::new(), 0, rx).await.unwrap();
        assert!(responses.is_empty());
    }
}
