use std::{future::Future, pin::Pin, time::Duration, time::SystemTime};

use futures::channel::{mpsc, oneshot};
use futures::{Stream, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use schema::{
    DispatchError, Dispatcher, NotificationFeed, Order, OrderId, OrderStatus, Rider, RiderId,
    Runner, Snapshot, Speed, Transition,
};
use tokio_stream::wrappers::IntervalStream;

use crate::{Board, CommandError};

type Success = <SeedRunner as Runner<Board>>::Success;
type Error = <SeedRunner as Runner<Board>>::Error;
type Response = Pin<Box<dyn Future<Output = Result<Success, Error>>>>;
type Reply = oneshot::Sender<Result<Order, CommandError>>;

/// How often riders move in real time
const DRIFT_INTERVAL: Duration = Duration::from_secs(5);

/// Max distance in degrees a rider moves per drift, along each axis
pub const DEFAULT_DRIFT_STEP_DEG: f64 = 0.001;

/// An operator request to change the board
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Assign { order: OrderId, rider: RiderId },
    Reassign { order: OrderId, rider: RiderId },
    UpdateStatus { order: OrderId, status: OrderStatus },
}

impl Command {
    fn apply(&self, board: &mut Board) -> Result<Transition, CommandError> {
        let transition = match self {
            Self::Assign { order, rider } => board.assign(order, rider),
            Self::Reassign { order, rider } => board.reassign(order, rider),
            Self::UpdateStatus { order, status } => board.update_status(order, *status),
        }?;

        Ok(transition)
    }
}

/// Sends commands to a running `SeedRunner`. The runner stops once every handle is dropped.
#[derive(Clone)]
pub struct DispatchHandle {
    sender: mpsc::UnboundedSender<(Command, Reply)>,
}

impl DispatchHandle {
    pub async fn execute(&self, command: Command) -> Result<Order, CommandError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .unbounded_send((command, tx))
            .map_err(|_| CommandError::RunnerStopped)?;

        rx.await.map_err(|_| CommandError::RunnerStopped)?
    }

    pub async fn assign(&self, order: OrderId, rider: RiderId) -> Result<Order, CommandError> {
        self.execute(Command::Assign { order, rider }).await
    }

    pub async fn reassign(&self, order: OrderId, rider: RiderId) -> Result<Order, CommandError> {
        self.execute(Command::Reassign { order, rider }).await
    }

    pub async fn update_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommandError> {
        self.execute(Command::UpdateStatus { order, status }).await
    }
}

/// Runs a `Board` seeded from CSV, applying operator commands and moving riders around
pub struct SeedRunner {
    speed: Speed,
    drift_step_deg: f64,
    seed: Option<u64>,
    riders: Vec<Rider>,
    orders: Vec<Order>,
    commands_sender: Option<mpsc::UnboundedSender<(Command, Reply)>>,
    commands_receiver: Option<mpsc::UnboundedReceiver<(Command, Reply)>>,
    snapshots_sender: mpsc::UnboundedSender<Snapshot>,
    snapshots_receiver: Option<mpsc::UnboundedReceiver<Snapshot>>,
}

impl SeedRunner {
    pub fn from_csv_paths(
        riders_csv_path: &str,
        orders_csv_path: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(
            Rider::from_csv(riders_csv_path)?,
            Order::from_csv(orders_csv_path)?,
        ))
    }

    pub fn new(riders: Vec<Rider>, orders: Vec<Order>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded();
        let (snapshots_tx, snapshots_rx) = mpsc::unbounded();

        Self {
            speed: Default::default(),
            drift_step_deg: DEFAULT_DRIFT_STEP_DEG,
            seed: None,
            riders,
            orders,
            commands_sender: Some(commands_tx),
            commands_receiver: Some(commands_rx),
            snapshots_sender: snapshots_tx,
            snapshots_receiver: Some(snapshots_rx),
        }
    }

    /// Run with the provided `Speed`
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Max distance in degrees that riders move on each drift
    pub fn with_drift_step(mut self, drift_step_deg: f64) -> Self {
        self.drift_step_deg = drift_step_deg;
        self
    }

    /// Seed the random rider movement so that runs are repeatable
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a stream of snapshots, emitted whenever the board changes
    pub fn stream_updates(&mut self) -> Option<impl Stream<Item = Snapshot>> {
        self.snapshots_receiver.take()
    }

    /// Returns a handle for sending commands. Only available before `run` is called.
    pub fn handle(&self) -> Option<DispatchHandle> {
        self.commands_sender.as_ref().map(|sender| DispatchHandle {
            sender: sender.clone(),
        })
    }

    /// Builds a board from the seed data
    pub fn seed_board(&self) -> Result<Board, DispatchError> {
        Board::new(self.riders.clone(), self.orders.clone())
    }

    /// Run a board built from the seed data
    pub fn run_with_defaults(&mut self) -> Response {
        match self.seed_board() {
            Ok(board) => self.run(board),
            Err(e) => Box::pin(futures::future::ready(Err(format!("invalid seed data: {}", e)))),
        }
    }

    async fn run_inner(
        speed: Speed,
        drift_step_deg: f64,
        mut rng: StdRng,
        updates: mpsc::UnboundedSender<Snapshot>,
        commands: mpsc::UnboundedReceiver<(Command, Reply)>,
        mut board: Board,
    ) -> Result<Success, Error> {
        enum Event {
            Drift,
            Command(Command, Reply),
            Shutdown,
        }

        let mut feed = NotificationFeed::default();
        let mut sequence = 0;
        let mut publish = |board: &Board, feed: &NotificationFeed| {
            let snapshot = Snapshot {
                sequence,
                riders: board.riders().cloned().collect(),
                orders: board.orders().cloned().collect(),
                notifications: feed.iter().cloned().collect(),
            };
            sequence += 1;
            log::info!("sending snapshot {} to channel", snapshot.sequence);
            let _ = updates.unbounded_send(snapshot);
        };

        // The first tick of an interval completes immediately, which would drift at start-up
        let mut interval = tokio::time::interval(speed.adjust_duration(DRIFT_INTERVAL));
        interval.reset();
        let drifts = IntervalStream::new(interval).map(|_| Event::Drift).boxed();
        let commands = commands
            .map(|(command, reply)| Event::Command(command, reply))
            .chain(futures::stream::once(async { Event::Shutdown }))
            .boxed();
        let mut events = futures::stream::select(drifts, commands);

        publish(&board, &feed);

        while let Some(event) = events.next().await {
            match event {
                Event::Drift => {
                    board.drift_riders(&mut rng, drift_step_deg);
                    publish(&board, &feed);
                }

                Event::Command(command, reply) => {
                    let result = command.apply(&mut board);
                    match result.as_ref() {
                        Ok(transition) if transition.is_change() => {
                            feed.record(SystemTime::now(), transition);
                            publish(&board, &feed);
                        }
                        Ok(_) => {}
                        Err(e) => log::warn!("rejected {:?}: {}", command, e),
                    }

                    // The caller may have given up waiting
                    let _ = reply.send(result.map(Transition::into_order));
                }

                Event::Shutdown => {
                    log::info!("all handles dropped, stopping");
                    break;
                }
            }
        }

        Ok(board)
    }
}

impl Runner<Board> for SeedRunner {
    type Response = Response;
    /// The board as it was left when the runner stopped
    type Success = Board;
    /// Description of what went wrong
    type Error = String;

    fn run(&mut self, board: Board) -> Self::Response {
        let Some(commands) = self.commands_receiver.take() else {
            return Box::pin(futures::future::ready(Err("runner already started".to_string())));
        };
        // Only handles given out so far keep the runner alive
        self.commands_sender = None;

        let speed = self.speed;
        let drift_step_deg = self.drift_step_deg;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let updates = self.snapshots_sender.clone();
        Box::pin(async move {
            Self::run_inner(speed, drift_step_deg, rng, updates, commands, board).await
        })
    }
}
