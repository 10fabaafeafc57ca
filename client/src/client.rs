use std::time::Duration;

use iced::futures::channel::mpsc;
use iced::futures::sink::SinkExt;
use iced::futures::stream::{BoxStream, StreamExt};
use iced::futures::{self, FutureExt};
use iced::subscription::{self, Subscription};
use tonic::transport::Channel;
use tonic::Status;

use schema::proto::dispatch::dispatch_client::DispatchClient;
use schema::proto::dispatch::{self as proto, AssignRequest, ReassignRequest, UpdateStatusRequest};
use schema::{Order, OrderId, OrderStatus, RiderId, Snapshot, ToFromProto};

type BoardClient = DispatchClient<Channel>;
type SnapshotStream = BoxStream<'static, Snapshot>;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Keeps a connection to the server open, reporting connection changes & snapshots as `Event`s
pub fn connect(server_uri: String) -> Subscription<Event> {
    struct Connect;

    subscription::channel(
        std::any::TypeId::of::<Connect>(),
        100,
        |events| async move {
            let (streams_tx, streams_rx) = mpsc::channel(100);
            let link = Link {
                server_uri,
                events,
                streams_tx,
                streams_rx,
            };

            futures::stream::unfold((link, Phase::Connecting), |(mut link, phase)| async move {
                let next = match phase {
                    Phase::Connecting => link.connect().await,
                    Phase::Streaming => link.stream().await,
                };

                Some(((), (link, next)))
            })
            .collect::<()>()
            .await;

            unreachable!()
        },
    )
}

enum Phase {
    Connecting,
    /// Connected, forwarding whichever snapshot stream a monitor request hands over
    Streaming,
}

struct Link {
    server_uri: String,
    events: mpsc::Sender<Event>,
    /// Monitor requests made through `Client` deliver their streams here
    streams_tx: mpsc::Sender<SnapshotStream>,
    streams_rx: mpsc::Receiver<SnapshotStream>,
}

impl Link {
    async fn connect(&mut self) -> Phase {
        match DispatchClient::connect(self.server_uri.clone()).await {
            Ok(client) => {
                let _ = self
                    .events
                    .send(Event::Connected(Client::Connected {
                        client,
                        streams: self.streams_tx.clone(),
                    }))
                    .await;

                Phase::Streaming
            }
            Err(e) => {
                log::warn!("connection failed: {:?}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
                let _ = self.events.send(Event::Disconnected).await;

                Phase::Connecting
            }
        }
    }

    async fn stream(&mut self) -> Phase {
        if let Some(snapshots) = self.streams_rx.next().await {
            log::info!("subscribed");
            let events = self.events.clone();
            snapshots
                .map(|snapshot| {
                    log::info!("received snapshot {}", snapshot.sequence);
                    let mut events = events.clone();

                    async move {
                        let _ = events.send(Event::Snapshot(snapshot)).await;
                    }
                })
                .buffered(1)
                .collect::<()>()
                .await;
        }

        log::info!("disconnected");
        Phase::Connecting
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Connected(Client),
    Disconnected,
    Snapshot(Snapshot),
}

#[derive(Debug, Clone)]
pub enum Client {
    Pending,
    Connected {
        client: BoardClient,
        streams: mpsc::Sender<SnapshotStream>,
    },
}

impl Client {
    /// Ask the server for a snapshot stream and hand it to the connection subscription
    pub fn monitor(&self) -> impl futures::Future<Output = Result<(), Status>> {
        log::info!("attempt subscription");
        let Client::Connected { client, streams } = self else {
            log::warn!("no connection");
            return futures::future::ready(Err(Status::unavailable("no connection"))).boxed();
        };
        let mut client = client.clone();
        let mut streams = streams.clone();

        async move {
            let stream = client.monitor(()).await?.into_inner();
            let snapshots = stream
                .filter_map(|message| async move {
                    message.ok().and_then(Snapshot::try_from_proto)
                })
                .boxed();

            streams.send(snapshots).await.map_err(|e| {
                log::warn!("failed to process snapshot stream: {:?}", e);
                Status::unavailable("failed to process snapshot stream")
            })
        }
        .boxed()
    }

    /// Send an operator request to the server, resolving to the order as it was left
    pub fn perform(
        &self,
        operation: Operation,
    ) -> impl futures::Future<Output = Result<Order, Status>> {
        log::info!("performing {:?}", operation);
        let Client::Connected { client, .. } = self else {
            log::warn!("no connection");
            return futures::future::ready(Err(Status::unavailable("no connection"))).boxed();
        };
        let mut client = client.clone();

        async move {
            let response = match operation {
                Operation::Assign { order, rider } => {
                    client
                        .assign(AssignRequest {
                            order_id: order.to_string(),
                            rider_id: rider.to_string(),
                        })
                        .await
                }
                Operation::Reassign { order, rider } => {
                    client
                        .reassign(ReassignRequest {
                            order_id: order.to_string(),
                            rider_id: rider.to_string(),
                        })
                        .await
                }
                Operation::UpdateStatus { order, status } => {
                    client
                        .update_status(UpdateStatusRequest {
                            order_id: order.to_string(),
                            status: proto::OrderStatus::from(status).into(),
                        })
                        .await
                }
            }?;

            Order::try_from_proto(response.into_inner())
                .ok_or_else(|| Status::internal("malformed order in response"))
        }
        .boxed()
    }
}

/// Changes an operator can ask the server to make
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Assign { order: OrderId, rider: RiderId },
    Reassign { order: OrderId, rider: RiderId },
    UpdateStatus { order: OrderId, status: OrderStatus },
}
