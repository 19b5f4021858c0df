//! Monthly financial report.
//!
//! Revenue of a stay spanning several months is split by nights: a stay of
//! 4 nights with 1 night in April books a quarter of its amount in April.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::calendar::{clip_to_month, occupied_span, Month};
use crate::channel::Channel;
use crate::models::{Reservation, ReservationStatus, Room};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTotals {
    pub reservations: u32,
    pub nights: u32,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceReport {
    pub month: Month,
    pub rooms: u32,
    pub revenue: f64,
    /// Nights occupied by guests or owner blocks
    pub booked_nights: u32,
    pub available_nights: u32,
    /// `booked_nights / available_nights`, 0 with no rooms
    pub occupancy_rate: f64,
    /// Revenue per paid night
    pub average_daily_rate: f64,
    pub by_channel: BTreeMap<Channel, ChannelTotals>,
}

impl FinanceReport {
    pub fn build(month: Month, rooms: &[Room], reservations: &[Reservation]) -> Self {
        let mut revenue = 0.0;
        let mut booked_nights = 0u32;
        let mut paid_nights = 0u32;
        let mut by_channel: BTreeMap<Channel, ChannelTotals> = BTreeMap::new();

        let counted = reservations
            .iter()
            .filter(|r| r.status.occupies())
            .filter(|r| rooms.is_empty() || rooms.iter().any(|room| room.matches(&r.room)));

        for reservation in counted {
            let Some(span) = occupied_span(reservation) else {
                continue;
            };
            let Some((start, end)) = clip_to_month(span, &month) else {
                continue;
            };

            let in_month = (end - start).num_days() as u32 + 1;
            booked_nights += in_month;

            if reservation.status == ReservationStatus::Black {
                continue;
            }

            let share = reservation.amount * f64::from(in_month) / reservation.nights() as f64;
            revenue += share;
            paid_nights += in_month;

            let totals = by_channel.entry(reservation.channel()).or_default();
            totals.reservations += 1;
            totals.nights += in_month;
            totals.revenue += share;
        }

        let room_count = rooms.len() as u32;
        let available_nights = room_count * month.num_days();

        Self {
            month,
            rooms: room_count,
            revenue: round_cents(revenue),
            booked_nights,
            available_nights,
            occupancy_rate: ratio(f64::from(booked_nights), f64::from(available_nights)),
            average_daily_rate: round_cents(ratio(revenue, f64::from(paid_nights))),
            by_channel: by_channel
                .into_iter()
                .map(|(channel, mut totals)| {
                    totals.revenue = round_cents(totals.revenue);
                    (channel, totals)
                })
                .collect(),
        }
    }

    /// Spreadsheet rows: a header, one row per channel, then a total row.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let month = self.month.to_string();
        let mut rows = vec![vec![
            "Month".to_string(),
            "Channel".to_string(),
            "Reservations".to_string(),
            "Nights".to_string(),
            "Revenue".to_string(),
            "Occupancy".to_string(),
            "ADR".to_string(),
            "Available nights".to_string(),
        ]];

        for (channel, totals) in &self.by_channel {
            rows.push(vec![
                month.clone(),
                channel.style().label.to_string(),
                totals.reservations.to_string(),
                totals.nights.to_string(),
                format!("{:.2}", totals.revenue),
                String::new(),
                String::new(),
                String::new(),
            ]);
        }

        let reservations: u32 = self.by_channel.values().map(|t| t.reservations).sum();
        rows.push(vec![
            month,
            "Total".to_string(),
            reservations.to_string(),
            self.booked_nights.to_string(),
            format!("{:.2}", self.revenue),
            format!("{:.1}%", self.occupancy_rate * 100.0),
            format!("{:.2}", self.average_daily_rate),
            self.available_nights.to_string(),
        ]);
        rows
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn room(code: &str) -> Room {
        Room {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            external_code: code.to_string(),
            name: format!("Room {}", code),
            created_at: Utc::now(),
        }
    }

    fn stay(id: &str, check_in: &str, check_out: &str, amount: f64, channel: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            guest_name: "Guest".to_string(),
            room: "101".to_string(),
            check_in: check_in.parse().unwrap(),
            check_out: check_out.parse().unwrap(),
            status: ReservationStatus::Confirmed,
            amount,
            channel_code: Some(channel.to_string()),
        }
    }

    #[test]
    fn test_revenue_is_prorated_across_months() {
        let april: Month = "2025-04".parse().unwrap();
        // 4 nights, 1 of them in April.
        let reservations = vec![stay("r", "2025-03-28", "2025-04-01", 400.0, "airbnb")];
        let report = FinanceReport::build(april, &[room("101")], &reservations);
        assert_eq!(report.revenue, 0.0);

        let reservations = vec![stay("r", "2025-03-30", "2025-04-03", 400.0, "airbnb")];
        let report = FinanceReport::build(april, &[room("101")], &reservations);
        assert_eq!(report.booked_nights, 2);
        assert_eq!(report.revenue, 200.0);
        assert_eq!(report.average_daily_rate, 100.0);
    }

    #[test]
    fn test_occupancy_and_channels() {
        let april: Month = "2025-04".parse().unwrap();
        let mut block = stay("owner", "2025-04-20", "2025-04-25", 0.0, "");
        block.status = ReservationStatus::Black;
        let mut cancelled = stay("c", "2025-04-12", "2025-04-15", 999.0, "airbnb");
        cancelled.status = ReservationStatus::Cancelled;

        let reservations = vec![
            stay("a", "2025-04-01", "2025-04-04", 300.0, "airbnb"),
            stay("b", "2025-04-05", "2025-04-07", 250.0, "booking.com"),
            block,
            cancelled,
        ];
        let report = FinanceReport::build(april, &[room("101")], &reservations);

        assert_eq!(report.available_nights, 30);
        assert_eq!(report.booked_nights, 3 + 2 + 5);
        assert!((report.occupancy_rate - 10.0 / 30.0).abs() < 1e-9);
        assert_eq!(report.revenue, 550.0);
        assert_eq!(report.average_daily_rate, 110.0);
        assert_eq!(report.by_channel.len(), 2);
        assert_eq!(report.by_channel[&Channel::Booking].revenue, 250.0);
    }

    #[test]
    fn test_rows_have_header_and_total() {
        let april: Month = "2025-04".parse().unwrap();
        let reservations = vec![stay("a", "2025-04-01", "2025-04-04", 300.0, "airbnb")];
        let rows = FinanceReport::build(april, &[room("101")], &reservations).to_rows();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "Month");
        assert_eq!(rows[1][1], "Airbnb");
        assert_eq!(rows[2][1], "Total");
        assert_eq!(rows[2][4], "300.00");
        assert_eq!(rows[2][5], "10.0%");
    }

    #[test]
    fn test_no_rooms_means_zero_rates() {
        let april: Month = "2025-04".parse().unwrap();
        let report = FinanceReport::build(april, &[], &[]);
        assert_eq!(report.occupancy_rate, 0.0);
        assert_eq!(report.average_daily_rate, 0.0);
    }
}
