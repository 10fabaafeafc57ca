use std::pin::Pin;

use futures::channel::mpsc;
use futures::{Stream, StreamExt};
use schema::proto::dispatch::dispatch_server::Dispatch;
use schema::proto::dispatch as proto;
use schema::{OrderId, OrderStatus, RiderId, Snapshot, ToFromProto};
use tonic::{Request, Response, Status};
use ulid::Ulid;

use crate::{DispatchHandle, Subscription};

/// gRPC front for a running `SeedRunner`
pub struct DispatchService {
    subscriptions_sender: mpsc::UnboundedSender<Subscription>,
    handle: DispatchHandle,
}

impl DispatchService {
    pub fn new(
        subscriptions_sender: mpsc::UnboundedSender<Subscription>,
        handle: DispatchHandle,
    ) -> Self {
        Self {
            subscriptions_sender,
            handle,
        }
    }
}

fn order_id(id: &str) -> Result<OrderId, Status> {
    match id.trim() {
        "" => Err(Status::invalid_argument("missing order id")),
        id => Ok(OrderId::new(id)),
    }
}

fn rider_id(id: &str) -> Result<RiderId, Status> {
    match id.trim() {
        "" => Err(Status::invalid_argument("missing rider id")),
        id => Ok(RiderId::new(id)),
    }
}

#[tonic::async_trait]
impl Dispatch for DispatchService {
    type MonitorStream = Pin<Box<dyn Stream<Item = Result<proto::Snapshot, Status>> + Send>>;

    async fn monitor(&self, _request: Request<()>) -> Result<Response<Self::MonitorStream>, Status> {
        let subscription_id = Ulid::new();
        log::info!("received monitor request: {}", subscription_id);
        let (tx, rx) = mpsc::unbounded();
        self.subscriptions_sender
            .unbounded_send((subscription_id, tx))
            .map_err(|_| Status::internal("send subscription"))?;

        let resp = rx
            .map(|snapshot: Snapshot| Ok::<proto::Snapshot, Status>(snapshot.into_proto()))
            .boxed();

        Ok(Response::new(resp))
    }

    async fn assign(
        &self,
        request: Request<proto::AssignRequest>,
    ) -> Result<Response<proto::Order>, Status> {
        let request = request.into_inner();
        log::info!(
            "received assign request: order {} to rider {}",
            request.order_id,
            request.rider_id
        );
        let order = self
            .handle
            .assign(order_id(&request.order_id)?, rider_id(&request.rider_id)?)
            .await?;

        Ok(Response::new(order.into_proto()))
    }

    async fn reassign(
        &self,
        request: Request<proto::ReassignRequest>,
    ) -> Result<Response<proto::Order>, Status> {
        let request = request.into_inner();
        log::info!(
            "received reassign request: order {} to rider {}",
            request.order_id,
            request.rider_id
        );
        let order = self
            .handle
            .reassign(order_id(&request.order_id)?, rider_id(&request.rider_id)?)
            .await?;

        Ok(Response::new(order.into_proto()))
    }

    async fn update_status(
        &self,
        request: Request<proto::UpdateStatusRequest>,
    ) -> Result<Response<proto::Order>, Status> {
        let request = request.into_inner();
        let status: OrderStatus = proto::OrderStatus::try_from(request.status)
            .map_err(|_| Status::invalid_argument("unknown order status"))?
            .into();
        log::info!(
            "received status request: order {} to {}",
            request.order_id,
            status
        );
        let order = self
            .handle
            .update_status(order_id(&request.order_id)?, status)
            .await?;

        Ok(Response::new(order.into_proto()))
    }
}

#[cfg(test)]
mod test {
    use tonic::Code;

    use super::*;
    use crate::SeedRunner;

    const RIDERS_PATH: &'static str = "../test_data/riders.csv";
    const ORDERS_PATH: &'static str = "../test_data/orders.csv";

    #[tokio::test(start_paused = true)]
    async fn test_requests() -> Result<(), Box<dyn std::error::Error>> {
        let mut runner = SeedRunner::from_csv_paths(RIDERS_PATH, ORDERS_PATH)?;
        let (subscriptions_sender, _subscriptions) = mpsc::unbounded();
        let service = DispatchService::new(subscriptions_sender, runner.handle().expect("handle"));

        let client = async move {
            let order = service
                .assign(Request::new(proto::AssignRequest {
                    order_id: "4".to_string(),
                    rider_id: "2".to_string(),
                }))
                .await
                .expect("assign")
                .into_inner();
            assert_eq!(order.status(), proto::OrderStatus::Assigned);
            assert_eq!(order.assigned_rider.as_deref(), Some("2"));

            let missing = service
                .reassign(Request::new(proto::ReassignRequest {
                    order_id: "4".to_string(),
                    rider_id: "42".to_string(),
                }))
                .await
                .unwrap_err();
            assert_eq!(missing.code(), Code::NotFound);

            let blank = service
                .assign(Request::new(proto::AssignRequest {
                    order_id: " ".to_string(),
                    rider_id: "1".to_string(),
                }))
                .await
                .unwrap_err();
            assert_eq!(blank.code(), Code::InvalidArgument);

            let bad_status = service
                .update_status(Request::new(proto::UpdateStatusRequest {
                    order_id: "4".to_string(),
                    status: 17,
                }))
                .await
                .unwrap_err();
            assert_eq!(bad_status.code(), Code::InvalidArgument);

            let skipped = service
                .update_status(Request::new(proto::UpdateStatusRequest {
                    order_id: "1".to_string(),
                    status: proto::OrderStatus::Delivered.into(),
                }))
                .await
                .unwrap_err();
            assert_eq!(skipped.code(), Code::FailedPrecondition);
        };

        let (board, ()) = futures::join!(runner.run_with_defaults(), client);
        assert!(board.is_ok());

        Ok(())
    }
}
