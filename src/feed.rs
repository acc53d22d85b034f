// Supplier catalog feed parsing. Room availability arrives as XML documents,
// transfer and ticket offerings as JSON; both normalize into catalog slices
// ready for the engine's CatalogLoaded events.

use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{
    AirportTransferOffering, CatalogSlice, CircuitTransferOffering, LoungePassOffering, RoomType,
    TicketType,
};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("XML parse error: {0}")]
    XmlParseError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("invalid number in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date in {field}: '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

// Structures for the supplier availability XML
#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
#[serde(rename = "CatalogRS")]
struct XmlCatalogResponse {
    hotels: XmlHotels,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlHotels {
    #[serde(rename = "Hotel")]
    hotels: Vec<XmlHotel>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlHotel {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@name")]
    name: String,
    room_types: XmlRoomTypes,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlRoomTypes {
    #[serde(rename = "RoomType")]
    room_types: Vec<XmlRoomType>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlRoomType {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@maxPeople")]
    max_people: String,
    #[serde(rename = "@quantityAvailable")]
    quantity_available: String,
    #[serde(rename = "@provisional")]
    provisional: String,
    price: XmlPrice,
    stay: Option<XmlStay>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlPrice {
    #[serde(rename = "@currency")]
    currency: String,
    #[serde(rename = "@amount")]
    amount: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
struct XmlStay {
    #[serde(rename = "@checkIn")]
    check_in: String,
    #[serde(rename = "@checkOut")]
    check_out: String,
}

// Structures for the supplier transfer JSON
#[derive(Debug, Deserialize, Serialize)]
struct SupplierTransferFeed {
    #[serde(default)]
    circuit_transfers: Vec<SupplierCircuitTransfer>,
    #[serde(default)]
    airport_transfers: Vec<SupplierAirportTransfer>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SupplierCircuitTransfer {
    id: String,
    hotel_id: String,
    transport_type: String,
    coach_capacity: Option<u32>,
    #[serde(default)]
    provisional: bool,
    price_per_seat: f64,
}

#[derive(Debug, Deserialize, Serialize)]
struct SupplierAirportTransfer {
    id: String,
    hotel_id: String,
    transfer_type: String,
    max_capacity: Option<u32>,
    #[serde(default)]
    provisional: bool,
    price_per_vehicle: f64,
}

// Structures for the supplier ticket JSON
#[derive(Debug, Deserialize, Serialize)]
struct SupplierTicketFeed {
    #[serde(default)]
    tickets: Vec<SupplierTicket>,
    #[serde(default)]
    lounge_passes: Vec<SupplierLoungePass>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SupplierTicket {
    id: String,
    name: String,
    quantity_available: Option<u32>,
    #[serde(default)]
    provisional: bool,
    price: f64,
}

#[derive(Debug, Deserialize, Serialize)]
struct SupplierLoungePass {
    id: String,
    name: String,
    quantity_available: Option<u32>,
    price: f64,
}

pub struct CatalogFeedParser;

impl CatalogFeedParser {
    pub fn new() -> Self {
        Self
    }

    // Parse a supplier availability document into a room-type slice
    pub fn parse_room_types(&self, xml: &str) -> Result<CatalogSlice, FeedError> {
        let response: XmlCatalogResponse =
            from_str(xml).map_err(|e| FeedError::XmlParseError(e.to_string()))?;

        let mut room_types = Vec::new();
        for hotel in response.hotels.hotels {
            for room in hotel.room_types.room_types {
                room_types.push(RoomType {
                    id: room.code.clone(),
                    hotel_id: hotel.code.clone(),
                    name: room.name.clone(),
                    max_people: parse_opt_u32("maxPeople", &room.max_people)?,
                    quantity_available: parse_opt_u32(
                        "quantityAvailable",
                        &room.quantity_available,
                    )?,
                    provisional: room.provisional.eq_ignore_ascii_case("true"),
                    price: parse_f64("Price amount", &room.price.amount)?,
                    check_in: match &room.stay {
                        Some(stay) => parse_opt_date("checkIn", &stay.check_in)?,
                        None => None,
                    },
                    check_out: match &room.stay {
                        Some(stay) => parse_opt_date("checkOut", &stay.check_out)?,
                        None => None,
                    },
                });
            }
        }
        Ok(CatalogSlice::RoomTypes(room_types))
    }

    // Parse a supplier transfer payload into circuit and airport slices
    pub fn parse_transfer_offerings(
        &self,
        json: &str,
    ) -> Result<(CatalogSlice, CatalogSlice), FeedError> {
        let feed: SupplierTransferFeed =
            serde_json::from_str(json).map_err(|e| FeedError::JsonParseError(e.to_string()))?;

        let circuit = feed
            .circuit_transfers
            .into_iter()
            .map(|t| CircuitTransferOffering {
                id: t.id,
                hotel_id: t.hotel_id,
                transport_type: t.transport_type,
                coach_capacity: t.coach_capacity,
                provisional: t.provisional,
                price: t.price_per_seat,
            })
            .collect();
        let airport = feed
            .airport_transfers
            .into_iter()
            .map(|t| AirportTransferOffering {
                id: t.id,
                hotel_id: t.hotel_id,
                transfer_type: t.transfer_type,
                max_capacity: t.max_capacity,
                provisional: t.provisional,
                price: t.price_per_vehicle,
            })
            .collect();

        Ok((
            CatalogSlice::CircuitTransfers(circuit),
            CatalogSlice::AirportTransfers(airport),
        ))
    }

    // Parse a supplier ticket payload into ticket and lounge-pass slices
    pub fn parse_ticket_feed(&self, json: &str) -> Result<(CatalogSlice, CatalogSlice), FeedError> {
        let feed: SupplierTicketFeed =
            serde_json::from_str(json).map_err(|e| FeedError::JsonParseError(e.to_string()))?;

        let tickets = feed
            .tickets
            .into_iter()
            .map(|t| TicketType {
                id: t.id,
                name: t.name,
                quantity_available: t.quantity_available,
                provisional: t.provisional,
                price: t.price,
            })
            .collect();
        let passes = feed
            .lounge_passes
            .into_iter()
            .map(|p| LoungePassOffering {
                id: p.id,
                name: p.name,
                quantity_available: p.quantity_available,
                price: p.price,
            })
            .collect();

        Ok((
            CatalogSlice::Tickets(tickets),
            CatalogSlice::LoungePasses(passes),
        ))
    }
}

impl Default for CatalogFeedParser {
    fn default() -> Self {
        Self::new()
    }
}

// Empty attribute means the supplier has no figure; anything else must parse
fn parse_opt_u32(field: &'static str, value: &str) -> Result<Option<u32>, FeedError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| FeedError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, FeedError> {
    value.parse::<f64>().map_err(|_| FeedError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_opt_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, FeedError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FeedError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

// A small sample for inline testing
pub const SMALL_SAMPLE_CATALOG_XML: &str = r#"
<CatalogRS>
  <Hotels>
    <Hotel code="h-bay" name="Harbour Bay Hotel">
      <RoomTypes>
        <RoomType code="r-dbl" name="Double Room" maxPeople="2" quantityAvailable="5" provisional="false">
          <Price currency="GBP" amount="180.0"/>
          <Stay checkIn="2025-06-05" checkOut="2025-06-09"/>
        </RoomType>
        <RoomType code="r-sgl" name="Single Room" maxPeople="1" quantityAvailable="" provisional="true">
          <Price currency="GBP" amount="120.5"/>
        </RoomType>
      </RoomTypes>
    </Hotel>
  </Hotels>
</CatalogRS>
"#;

pub const SAMPLE_TRANSFER_JSON: &str = r#"{
    "circuit_transfers": [
        {
            "id": "ct-coach",
            "hotel_id": "h-bay",
            "transport_type": "shared_coach",
            "coach_capacity": 50,
            "price_per_seat": 60.0
        }
    ],
    "airport_transfers": [
        {
            "id": "at-car",
            "hotel_id": "h-bay",
            "transfer_type": "private_car",
            "max_capacity": 4,
            "provisional": true,
            "price_per_vehicle": 55.0
        }
    ]
}"#;
