//! Reservation data models following the schema.org travel vocabulary.
//!
//! Serialized as JSON-LD-like objects: every node carries an `@type` and
//! property names are camelCase (`reservationFor`, `departureTime`, ...).

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of trip or booking a profile produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    Flight,
    Train,
    Bus,
    Boat,
    Lodging,
    Event,
}

impl ReservationKind {
    /// JSON-LD type name of the reservation.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Flight => "FlightReservation",
            Self::Train => "TrainReservation",
            Self::Bus => "BusReservation",
            Self::Boat => "BoatReservation",
            Self::Lodging => "LodgingReservation",
            Self::Event => "EventReservation",
        }
    }
}

impl std::fmt::Display for ReservationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Flight => "flight",
            Self::Train => "train",
            Self::Bus => "bus",
            Self::Boat => "boat",
            Self::Lodging => "lodging",
            Self::Event => "event",
        };
        f.write_str(name)
    }
}

/// A single extracted reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Reservation {
    FlightReservation(FlightReservation),
    TrainReservation(TrainReservation),
    BusReservation(BusReservation),
    BoatReservation(BoatReservation),
    LodgingReservation(LodgingReservation),
    EventReservation(EventReservation),
}

/// Fields every reservation type shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationInfo {
    /// Booking reference / confirmation code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_number: Option<String>,

    /// Traveller or guest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub under_name: Option<Person>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Decimal>,

    /// ISO 4217 code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub struct Person {
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Seat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,

    /// Coach or cabin section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_section: Option<String>,

    /// Class of service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seating_type: Option<String>,
}

impl Seat {
    pub fn is_empty(&self) -> bool {
        self.seat_number.is_none() && self.seat_section.is_none() && self.seating_type.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Ticket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticketed_seat: Option<Seat>,

    /// Barcode payload or ticket number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_token: Option<String>,
}

impl Ticket {
    pub fn is_empty(&self) -> bool {
        self.ticketed_seat.is_none() && self.ticket_token.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_country: Option<String>,
}

impl PostalAddress {
    pub fn is_empty(&self) -> bool {
        self.street_address.is_none()
            && self.address_locality.is_none()
            && self.postal_code.is_none()
            && self.address_country.is_none()
    }
}

/// Operating company of a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Organization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// IATA airline designator or UIC company code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Airport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct TrainStation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Station code such as a UIC or IBNR number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct BusStation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct BoatTerminal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// A venue: hotel, concert hall, stadium.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Place {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

// ---------------------------------------------------------------------------
// Flights

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Flight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_airport: Option<Airport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_terminal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_airport: Option<Airport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_terminal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: Flight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airplane_seat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ticket: Option<Ticket>,
}

impl FlightReservation {
    pub fn new(flight: Flight) -> Self {
        Self {
            reservation_for: flight,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Trains

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct TrainTrip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_station: Option<TrainStation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_station: Option<TrainStation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: TrainTrip,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ticket: Option<Ticket>,
}

impl TrainReservation {
    pub fn new(trip: TrainTrip) -> Self {
        Self {
            reservation_for: trip,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Buses

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct BusTrip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_bus_stop: Option<BusStation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_bus_stop: Option<BusStation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: BusTrip,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ticket: Option<Ticket>,
}

impl BusReservation {
    pub fn new(trip: BusTrip) -> Self {
        Self {
            reservation_for: trip,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Boats

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct BoatTrip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_boat_terminal: Option<BoatTerminal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_boat_terminal: Option<BoatTerminal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: BoatTrip,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ticket: Option<Ticket>,
}

impl BoatReservation {
    pub fn new(trip: BoatTrip) -> Self {
        Self {
            reservation_for: trip,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Lodging

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct LodgingBusiness {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodgingReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: LodgingBusiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_time: Option<NaiveDateTime>,
}

impl LodgingReservation {
    pub fn new(business: LodgingBusiness) -> Self {
        Self {
            reservation_for: business,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Events

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Place>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReservation {
    #[serde(flatten)]
    pub info: ReservationInfo,
    pub reservation_for: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_ticket: Option<Ticket>,
}

impl EventReservation {
    pub fn new(event: Event) -> Self {
        Self {
            reservation_for: event,
            ..Default::default()
        }
    }
}

impl Reservation {
    pub fn kind(&self) -> ReservationKind {
        match self {
            Self::FlightReservation(_) => ReservationKind::Flight,
            Self::TrainReservation(_) => ReservationKind::Train,
            Self::BusReservation(_) => ReservationKind::Bus,
            Self::BoatReservation(_) => ReservationKind::Boat,
            Self::LodgingReservation(_) => ReservationKind::Lodging,
            Self::EventReservation(_) => ReservationKind::Event,
        }
    }

    pub fn info(&self) -> &ReservationInfo {
        match self {
            Self::FlightReservation(r) => &r.info,
            Self::TrainReservation(r) => &r.info,
            Self::BusReservation(r) => &r.info,
            Self::BoatReservation(r) => &r.info,
            Self::LodgingReservation(r) => &r.info,
            Self::EventReservation(r) => &r.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut ReservationInfo {
        match self {
            Self::FlightReservation(r) => &mut r.info,
            Self::TrainReservation(r) => &mut r.info,
            Self::BusReservation(r) => &mut r.info,
            Self::BoatReservation(r) => &mut r.info,
            Self::LodgingReservation(r) => &mut r.info,
            Self::EventReservation(r) => &mut r.info,
        }
    }

    pub fn reservation_number(&self) -> Option<&str> {
        self.info().reservation_number.as_deref()
    }

    pub fn passenger(&self) -> Option<&str> {
        self.info().under_name.as_ref().map(|p| p.name.as_str())
    }

    pub fn set_passenger(&mut self, name: impl Into<String>) {
        self.info_mut().under_name = Some(Person::new(name));
    }

    pub fn set_price(&mut self, amount: Decimal, currency: impl Into<String>) {
        let info = self.info_mut();
        info.total_price = Some(amount);
        info.price_currency = Some(currency.into());
    }

    /// Departure, check-in or event start.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::FlightReservation(r) => r.reservation_for.departure_time,
            Self::TrainReservation(r) => r.reservation_for.departure_time,
            Self::BusReservation(r) => r.reservation_for.departure_time,
            Self::BoatReservation(r) => r.reservation_for.departure_time,
            Self::LodgingReservation(r) => r.checkin_time,
            Self::EventReservation(r) => r.reservation_for.start_date,
        }
    }

    /// Arrival, check-out or event end.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::FlightReservation(r) => r.reservation_for.arrival_time,
            Self::TrainReservation(r) => r.reservation_for.arrival_time,
            Self::BusReservation(r) => r.reservation_for.arrival_time,
            Self::BoatReservation(r) => r.reservation_for.arrival_time,
            Self::LodgingReservation(r) => r.checkout_time,
            Self::EventReservation(r) => r.reservation_for.end_date,
        }
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        let route = match self {
            Self::FlightReservation(r) => {
                let f = &r.reservation_for;
                let code = |a: &Option<Airport>| {
                    a.as_ref()
                        .and_then(|a| a.iata_code.clone().or_else(|| a.name.clone()))
                        .unwrap_or_else(|| "?".to_string())
                };
                format!(
                    "{} {} -> {}",
                    f.flight_number.as_deref().unwrap_or(""),
                    code(&f.departure_airport),
                    code(&f.arrival_airport)
                )
            }
            Self::TrainReservation(r) => {
                let t = &r.reservation_for;
                let name = |s: &Option<TrainStation>| s.as_ref().and_then(|s| s.name.clone()).unwrap_or_else(|| "?".to_string());
                format!(
                    "{} {} -> {}",
                    t.train_number.as_deref().unwrap_or(""),
                    name(&t.departure_station),
                    name(&t.arrival_station)
                )
            }
            Self::BusReservation(r) => {
                let t = &r.reservation_for;
                let name = |s: &Option<BusStation>| s.as_ref().and_then(|s| s.name.clone()).unwrap_or_else(|| "?".to_string());
                format!(
                    "{} {} -> {}",
                    t.bus_number.as_deref().unwrap_or(""),
                    name(&t.departure_bus_stop),
                    name(&t.arrival_bus_stop)
                )
            }
            Self::BoatReservation(r) => {
                let t = &r.reservation_for;
                let name = |s: &Option<BoatTerminal>| s.as_ref().and_then(|s| s.name.clone()).unwrap_or_else(|| "?".to_string());
                format!("{} -> {}", name(&t.departure_boat_terminal), name(&t.arrival_boat_terminal))
            }
            Self::LodgingReservation(r) => r.reservation_for.name.clone().unwrap_or_default(),
            Self::EventReservation(r) => r.reservation_for.name.clone().unwrap_or_default(),
        };

        match self.start_time() {
            Some(t) => format!("{} {} ({})", self.kind(), route.trim(), t.format("%Y-%m-%d %H:%M")),
            None => format!("{} {}", self.kind(), route.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_train() -> Reservation {
        let trip = TrainTrip {
            train_number: Some("ICE 1601".to_string()),
            departure_station: Some(TrainStation {
                name: Some("Berlin Hbf".to_string()),
                identifier: None,
            }),
            departure_time: NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(10, 5, 0),
            arrival_station: Some(TrainStation {
                name: Some("München Hbf".to_string()),
                identifier: None,
            }),
            ..Default::default()
        };
        Reservation::TrainReservation(TrainReservation::new(trip))
    }

    #[test]
    fn test_json_ld_shape() {
        let mut res = sample_train();
        res.set_passenger("Jane Doe");

        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(
            value,
            json!({
                "@type": "TrainReservation",
                "underName": { "@type": "Person", "name": "Jane Doe" },
                "reservationFor": {
                    "@type": "TrainTrip",
                    "trainNumber": "ICE 1601",
                    "departureStation": { "@type": "TrainStation", "name": "Berlin Hbf" },
                    "departureTime": "2024-03-15T10:05:00",
                    "arrivalStation": { "@type": "TrainStation", "name": "München Hbf" }
                }
            })
        );
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut res = sample_train();
        res.set_price(Decimal::new(4990, 2), "EUR");

        let json = serde_json::to_string(&res).unwrap();
        let back: Reservation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, res);
        assert_eq!(back.info().price_currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_summary() {
        let res = sample_train();
        assert_eq!(res.summary(), "train ICE 1601 Berlin Hbf -> München Hbf (2024-03-15 10:05)");
        assert_eq!(res.kind().type_name(), "TrainReservation");
    }
}
