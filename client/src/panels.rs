use std::fmt;

use iced::widget::{button, column, container, horizontal_rule, pick_list, row, text, text_input};
use iced::widget::{Column, Row, Space};
use iced::{theme, Alignment, Element, Length};
use schema::{OrderId, OrderSource, OrderStatus, RiderId, Snapshot};

use super::Message;

const HEADING_SIZE: u16 = 20;
const DETAIL_SIZE: u16 = 14;

/// A rider as offered in the assignment pick list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiderChoice {
    pub id: RiderId,
    pub name: String,
}

impl fmt::Display for RiderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// State of the "reassign order" form under the rider list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReassignForm {
    pub selected_rider: Option<RiderId>,
    pub order_input: String,
}

impl ReassignForm {
    /// Takes the order & rider to reassign, clearing the form.
    /// Leaves the form untouched unless both are present.
    pub fn submit(&mut self) -> Option<(OrderId, RiderId)> {
        let order = self.order_input.trim();
        if order.is_empty() {
            return None;
        }
        let rider = self.selected_rider.take()?;
        let order = OrderId::new(order);
        self.order_input.clear();

        Some((order, rider))
    }
}

fn card<'a>(title: &str, body: Element<'a, Message>) -> Element<'a, Message> {
    container(column![text(title).size(HEADING_SIZE), horizontal_rule(1), body].spacing(10))
        .padding(12)
        .width(Length::Fill)
        .style(theme::Container::Box)
        .into()
}

pub fn rider_list<'a>(snapshot: &Snapshot, form: &ReassignForm) -> Element<'a, Message> {
    let riders = snapshot.riders.iter().map(|rider| {
        let details = column![
            text(&rider.name),
            text(format!(
                "Capacity: {}/{}",
                rider.current_orders, rider.capacity
            ))
            .size(DETAIL_SIZE),
            text(format!("Performance: {:.1}", rider.performance)).size(DETAIL_SIZE),
        ];
        let style = if form.selected_rider.as_ref() == Some(&rider.id) {
            theme::Button::Primary
        } else {
            theme::Button::Secondary
        };

        row![
            details,
            Space::with_width(Length::Fill),
            button(text("Select"))
                .style(style)
                .on_press(Message::SelectRider(rider.id.clone())),
        ]
        .align_items(Alignment::Center)
        .into()
    });

    let mut body = Column::with_children(riders.collect()).spacing(12);
    if form.selected_rider.is_some() {
        body = body.push(
            column![
                text_input("Enter order ID to reassign", &form.order_input)
                    .on_input(Message::ReassignOrderInput),
                button(text("Reassign Order"))
                    .width(Length::Fill)
                    .on_press(Message::SubmitReassign),
            ]
            .spacing(8),
        );
    }

    card("Riders", body.into())
}

pub fn order_summary<'a>(snapshot: &Snapshot, active: OrderSource) -> Element<'a, Message> {
    let tabs = OrderSource::ALL.into_iter().map(|source| {
        let style = if source == active {
            theme::Button::Primary
        } else {
            theme::Button::Secondary
        };

        button(text(source.as_str()))
            .style(style)
            .width(Length::Fill)
            .on_press(Message::SelectSource(source))
            .into()
    });

    let orders = snapshot.orders_from(active).map(|order| {
        let mut details = column![
            text(format!("Order {}", order.id)),
            text(format!("Type: {}", order.kind)).size(DETAIL_SIZE),
            text(format!("Status: {}", order.status)).size(DETAIL_SIZE),
        ];
        if let Some(name) = snapshot.rider_name(order) {
            details = details.push(text(format!("Assigned to: {}", name)).size(DETAIL_SIZE));
        }

        let id = order.id.clone();
        details
            .push(
                pick_list(OrderStatus::ALL.to_vec(), Some(order.status), move |status| {
                    Message::UpdateStatus(id.clone(), status)
                })
                .placeholder("Update status"),
            )
            .spacing(4)
            .into()
    });

    let counts = snapshot.order_counts();
    let totals = OrderStatus::ALL
        .iter()
        .map(|status| format!("{}: {}", status, counts.get(status).unwrap_or(&0)))
        .collect::<Vec<_>>()
        .join("  ");

    let body = column![
        text(totals).size(DETAIL_SIZE),
        Row::with_children(tabs.collect()).spacing(4),
        Column::with_children(orders.collect()).spacing(12),
    ]
    .spacing(10);

    card("Order Summary", body.into())
}

pub fn order_assignment<'a>(snapshot: &Snapshot) -> Element<'a, Message> {
    let choices = snapshot
        .available_riders()
        .map(|rider| RiderChoice {
            id: rider.id.clone(),
            name: rider.name.clone(),
        })
        .collect::<Vec<_>>();

    let orders = snapshot.pending_orders().map(|order| {
        let id = order.id.clone();
        column![
            text(format!("Order {}", order.id)),
            text(format!("Type: {}", order.kind)).size(DETAIL_SIZE),
            pick_list(choices.clone(), None, move |choice: RiderChoice| {
                Message::Assign(id.clone(), choice.id)
            })
            .placeholder("Select a rider")
            .width(Length::Fill),
        ]
        .spacing(4)
        .into()
    });

    let body: Element<'a, Message> = match snapshot.pending_orders().next() {
        Some(_) => Column::with_children(orders.collect()).spacing(12).into(),
        None => text("No pending orders").size(DETAIL_SIZE).into(),
    };

    card("Order Assignment", body)
}

pub fn notifications<'a>(snapshot: &Snapshot) -> Element<'a, Message> {
    let lines = snapshot
        .notifications
        .iter()
        .map(|notification| text(&notification.message).size(DETAIL_SIZE).into());

    card(
        "Notifications",
        Column::with_children(lines.collect()).spacing(6).into(),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_submit_needs_rider_and_order() {
        let mut form = ReassignForm {
            selected_rider: None,
            order_input: "2".to_string(),
        };
        assert_eq!(form.submit(), None);
        assert_eq!(form.order_input, "2");

        form.selected_rider = Some(RiderId::new("1"));
        form.order_input = "   ".to_string();
        assert_eq!(form.submit(), None);
        assert_eq!(form.selected_rider, Some(RiderId::new("1")));
    }

    #[test]
    fn test_submit_clears_form() {
        let mut form = ReassignForm {
            selected_rider: Some(RiderId::new("2")),
            order_input: " 5 ".to_string(),
        };

        assert_eq!(
            form.submit(),
            Some((OrderId::new("5"), RiderId::new("2")))
        );
        assert_eq!(form, ReassignForm::default());
    }
}
