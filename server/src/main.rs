use futures::channel::mpsc;
use schema::proto::dispatch::dispatch_server::DispatchServer;
use schema::Runner;
use tonic::transport::Server as TonicServer;

use server::{Config, DispatchService, SeedRunner};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("starting with {:?}", config);

    let mut runner = SeedRunner::from_csv_paths(&config.riders_csv, &config.orders_csv)?
        .with_speed(config.speed)
        .with_drift_step(config.drift_step_deg);
    let board = runner.seed_board()?;
    let updates = runner.stream_updates().ok_or("update stream")?;
    let handle = runner.handle().ok_or("dispatch handle")?;
    let (subscriptions_sender, subscriptions_receiver) = mpsc::unbounded();
    let service = DispatchServer::new(DispatchService::new(subscriptions_sender, handle));

    log::info!("running server on {}", config.socket);

    let (served, _, ran) = futures::join!(
        TonicServer::builder()
            .add_service(service)
            .serve(config.socket),
        server::broadcast(updates, subscriptions_receiver),
        runner.run(board)
    );
    served?;
    ran?;

    Ok(())
}
