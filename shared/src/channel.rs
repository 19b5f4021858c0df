//! Booking channels and how each one is displayed.

use serde::{Deserialize, Serialize};

/// The platform a reservation came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Airbnb,
    Booking,
    Abritel,
    Direct,
    HelloKeys,
    Unknown,
}

/// Display attributes for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStyle {
    pub label: &'static str,
    pub short_label: &'static str,
    /// CSS hex colour
    pub color: &'static str,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Airbnb,
        Channel::Booking,
        Channel::Abritel,
        Channel::Direct,
        Channel::HelloKeys,
        Channel::Unknown,
    ];

    /// Parse a channel code as sent by the channel manager.
    ///
    /// A missing or blank code means the booking was entered by hand.
    pub fn from_code(code: Option<&str>) -> Self {
        let normalized = match code.map(str::trim) {
            None | Some("") => return Channel::Direct,
            Some(code) => code.to_ascii_lowercase(),
        };

        match normalized.as_str() {
            "airbnb" => Channel::Airbnb,
            "booking" | "booking.com" | "bookingcom" => Channel::Booking,
            "abritel" | "homeaway" | "vrbo" => Channel::Abritel,
            "direct" | "manual" | "website" => Channel::Direct,
            "hellokeys" | "hello keys" | "hello_keys" => Channel::HelloKeys,
            _ => Channel::Unknown,
        }
    }

    pub fn style(self) -> ChannelStyle {
        match self {
            Channel::Airbnb => ChannelStyle {
                label: "Airbnb",
                short_label: "AB",
                color: "#ff5a5f",
            },
            Channel::Booking => ChannelStyle {
                label: "Booking.com",
                short_label: "BK",
                color: "#003580",
            },
            Channel::Abritel => ChannelStyle {
                label: "Abritel",
                short_label: "AT",
                color: "#0e3b7d",
            },
            Channel::Direct => ChannelStyle {
                label: "Direct",
                short_label: "DI",
                color: "#2e7d32",
            },
            Channel::HelloKeys => ChannelStyle {
                label: "HelloKeys",
                short_label: "HK",
                color: "#f9a825",
            },
            Channel::Unknown => ChannelStyle {
                label: "Other",
                short_label: "??",
                color: "#757575",
            },
        }
    }
}
