use futures_util::Stream;
use tokio::sync::watch;

/// Live result of a query.
///
/// Holds the latest value and is notified whenever the producer publishes a
/// new one. Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// closes the channel, which stops the producer.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    #[must_use]
    pub fn new(receiver: watch::Receiver<T>) -> Self {
        Self { receiver }
    }

    /// The most recently published value.
    #[must_use]
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next value. Returns `None` once the producer has stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Whether the producer is still publishing values.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.receiver.has_changed().is_ok()
    }

    pub fn unsubscribe(self) {}

    /// Yield the current value followed by every subsequent update.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures_util::stream::unfold((self, true), |(mut subscription, first)| async move {
            if first {
                let value = subscription.receiver.borrow_and_update().clone();
                Some((value, (subscription, false)))
            } else {
                let value = subscription.changed().await?;
                Some((value, (subscription, false)))
            }
        })
    }
}
