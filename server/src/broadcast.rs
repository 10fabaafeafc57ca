use std::collections::HashMap;

use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use schema::Snapshot;
use ulid::Ulid;

/// A new subscriber and the channel its snapshots should be sent on
pub type Subscription = (Ulid, mpsc::UnboundedSender<Snapshot>);

#[derive(Default)]
struct Subscribers {
    senders: HashMap<Ulid, mpsc::UnboundedSender<Snapshot>>,
    latest: Option<Snapshot>,
}

impl Subscribers {
    fn publish(&mut self, snapshot: Snapshot) {
        // Remove any disconnected subscribers
        self.senders.retain(|id, tx| match tx.unbounded_send(snapshot.clone()) {
            Err(e) if e.is_disconnected() => {
                log::info!("subscriber {} disconnected", id);
                false
            }
            _ => true,
        });
        self.latest = Some(snapshot);
    }

    fn subscribe(&mut self, id: Ulid, tx: mpsc::UnboundedSender<Snapshot>) {
        // Bring the subscriber up to date straight away instead of waiting for the next change
        if let Some(latest) = self.latest.as_ref() {
            if tx.unbounded_send(latest.clone()).is_err() {
                return;
            }
        }
        self.senders.insert(id, tx);
    }
}

/// Send every snapshot to all subscribers until both streams are exhausted.
/// Returns the number of subscribers still connected at the end.
pub async fn broadcast<S>(updates: S, subscriptions: mpsc::UnboundedReceiver<Subscription>) -> usize
where
    S: Stream<Item = Snapshot> + Send + 'static,
{
    #[derive(Debug)]
    enum Event {
        Update(Snapshot),
        NewSubscription(Ulid, mpsc::UnboundedSender<Snapshot>),
    }

    let updates = updates.map(Event::Update).boxed();
    let new_subscriptions = subscriptions
        .map(|(ulid, tx)| Event::NewSubscription(ulid, tx))
        .boxed();

    let subscribers = futures::stream::select_all(vec![updates, new_subscriptions])
        .fold(Subscribers::default(), |mut subscribers, event| {
            match event {
                Event::Update(snapshot) => {
                    log::info!("broadcasting snapshot {}", snapshot.sequence);
                    subscribers.publish(snapshot);
                }
                Event::NewSubscription(id, tx) => {
                    log::info!("new subscriber {}", id);
                    subscribers.subscribe(id, tx);
                }
            }

            futures::future::ready(subscribers)
        })
        .await;

    subscribers.senders.len()
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(sequence: u64) -> Snapshot {
        Snapshot {
            sequence,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fan_out() {
        let (updates_tx, updates_rx) = mpsc::unbounded::<Snapshot>();
        let (subscriptions_tx, subscriptions_rx) = mpsc::unbounded();

        let driver = async move {
            let (a_tx, mut a) = mpsc::unbounded::<Snapshot>();
            updates_tx.unbounded_send(snapshot(0)).expect("send");
            subscriptions_tx
                .unbounded_send((Ulid::new(), a_tx))
                .expect("subscribe");
            assert_eq!(a.next().await.map(|s| s.sequence), Some(0));

            updates_tx.unbounded_send(snapshot(1)).expect("send");
            assert_eq!(a.next().await.map(|s| s.sequence), Some(1));

            // Late subscribers start from the latest snapshot
            let (b_tx, mut b) = mpsc::unbounded::<Snapshot>();
            subscriptions_tx
                .unbounded_send((Ulid::new(), b_tx))
                .expect("subscribe");
            assert_eq!(b.next().await.map(|s| s.sequence), Some(1));

            drop(a);
            updates_tx.unbounded_send(snapshot(2)).expect("send");
            assert_eq!(b.next().await.map(|s| s.sequence), Some(2));

            b
        };

        let (remaining, _b) = futures::join!(broadcast(updates_rx, subscriptions_rx), driver);

        assert_eq!(remaining, 1);
    }
}
