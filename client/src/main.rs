use std::env;
use std::time::Duration;

use iced::executor;
use iced::widget::{column, container, row, scrollable, text};
use iced::{theme, Application, Color, Command, Element, Length, Settings, Theme};
use schema::{Order, OrderId, OrderSource, OrderStatus, RiderId, Snapshot};

mod client;
mod map;
mod panels;
use client::{Client, Operation};
use panels::ReassignForm;

const DEFAULT_SERVER_URI: &str = "http://localhost:50051";
const MONITOR_RETRY_DELAY: Duration = Duration::from_secs(5);

pub fn main() -> iced::Result {
    dotenv::dotenv().ok();
    env_logger::init();

    Dashboard::run(Settings {
        flags: server_uri(|key| env::var(key).ok()),
        ..Default::default()
    })
}

/// Address of the dispatch server, from `SERVER_URI` if set
fn server_uri(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("SERVER_URI").unwrap_or_else(|| DEFAULT_SERVER_URI.to_string())
}

struct Dashboard {
    server_uri: String,
    client: Client,
    latest_snapshot: Option<Snapshot>,
    is_monitoring: bool,
    active_source: OrderSource,
    reassign_form: ReassignForm,
    last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Snapshot(Snapshot),
    MonitorRequestSuccess,
    MonitorRequestFailed,
    Connected(Client),
    Disconnected,
    SelectSource(OrderSource),
    SelectRider(RiderId),
    ReassignOrderInput(String),
    SubmitReassign,
    Assign(OrderId, RiderId),
    UpdateStatus(OrderId, OrderStatus),
    OperationSucceeded(Order),
    OperationFailed(String),
}

impl Dashboard {
    fn perform(&self, operation: Operation) -> Command<Message> {
        Command::perform(self.client.perform(operation), |res| match res {
            Ok(order) => Message::OperationSucceeded(order),
            Err(status) => Message::OperationFailed(status.message().to_string()),
        })
    }

    fn monitor(&self, delay: Option<Duration>) -> Command<Message> {
        let monitor_fut = self.client.monitor();
        Command::perform(
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                monitor_fut.await
            },
            |res| match res {
                Ok(_) => Message::MonitorRequestSuccess,
                Err(_) => Message::MonitorRequestFailed,
            },
        )
    }
}

impl Application for Dashboard {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = String;

    fn new(server_uri: String) -> (Dashboard, Command<Message>) {
        (
            Dashboard {
                server_uri,
                client: Client::Pending,
                latest_snapshot: None,
                is_monitoring: false,
                active_source: OrderSource::default(),
                reassign_form: ReassignForm::default(),
                last_error: None,
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        String::from("Delivery Management Dashboard")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Snapshot(snapshot) => {
                self.latest_snapshot = Some(snapshot);

                Command::none()
            }

            Message::MonitorRequestSuccess => {
                self.is_monitoring = true;

                Command::none()
            }

            Message::MonitorRequestFailed => {
                self.is_monitoring = false;
                if matches!(&self.client, Client::Connected { .. }) {
                    self.monitor(Some(MONITOR_RETRY_DELAY))
                } else {
                    Command::none()
                }
            }

            Message::Connected(client) => {
                log::info!("client connected");
                self.client = client;

                self.monitor(None)
            }

            Message::Disconnected => {
                log::info!("client disconnected");
                self.client = Client::Pending;
                self.is_monitoring = false;

                Command::none()
            }

            Message::SelectSource(source) => {
                self.active_source = source;

                Command::none()
            }

            Message::SelectRider(rider) => {
                self.reassign_form.selected_rider = Some(rider);

                Command::none()
            }

            Message::ReassignOrderInput(input) => {
                self.reassign_form.order_input = input;

                Command::none()
            }

            Message::SubmitReassign => match self.reassign_form.submit() {
                Some((order, rider)) => self.perform(Operation::Reassign { order, rider }),
                None => Command::none(),
            },

            Message::Assign(order, rider) => self.perform(Operation::Assign { order, rider }),

            Message::UpdateStatus(order, status) => {
                self.perform(Operation::UpdateStatus { order, status })
            }

            Message::OperationSucceeded(order) => {
                log::info!("order {} is now {}", order.id, order.status);
                self.last_error = None;

                Command::none()
            }

            Message::OperationFailed(error) => {
                log::warn!("operation failed: {}", error);
                self.last_error = Some(error);

                Command::none()
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let content: Element<Message> = match &self.latest_snapshot {
            Some(snapshot) => {
                let side_panel = column![
                    panels::rider_list(snapshot, &self.reassign_form),
                    panels::order_summary(snapshot, self.active_source),
                    panels::order_assignment(snapshot),
                    panels::notifications(snapshot),
                ]
                .spacing(16);

                row![
                    container(map::view(snapshot))
                        .width(Length::FillPortion(2))
                        .height(Length::Fill)
                        .style(theme::Container::Box),
                    scrollable(side_panel).width(Length::FillPortion(1)),
                ]
                .spacing(16)
                .into()
            }
            None if self.is_monitoring => text("Waiting for snapshot…").into(),
            None => text("Requesting updates…").into(),
        };
        let with_connection_status: Element<Message> = match &self.client {
            Client::Pending => text("Client disconnected, attempting to connect…").into(),
            Client::Connected { .. } => {
                let mut page = column![text("Delivery Management Dashboard").size(28)].spacing(12);
                if let Some(error) = self.last_error.as_ref() {
                    page = page.push(
                        text(format!("Error: {}", error))
                            .style(theme::Text::Color(Color::from_rgb8(200, 30, 30))),
                    );
                }

                page.push(content).into()
            }
        };

        container(with_connection_status)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(16)
            .into()
    }

    fn subscription(&self) -> iced::Subscription<Self::Message> {
        client::connect(self.server_uri.to_string()).map(Into::into)
    }
}

impl From<client::Event> for Message {
    fn from(event: client::Event) -> Self {
        match event {
            client::Event::Connected(client) => Self::Connected(client),
            client::Event::Disconnected => Self::Disconnected,
            client::Event::Snapshot(snapshot) => Self::Snapshot(snapshot),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_server_uri_falls_back_to_default() {
        assert_eq!(server_uri(|_| None), "http://localhost:50051");
        assert_eq!(
            server_uri(|key| (key == "SERVER_URI").then(|| "http://dispatch:9000".to_string())),
            "http://dispatch:9000"
        );
    }
}
