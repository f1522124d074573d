//! Projection of assembled records onto typed reservations.

pub mod dates;

use chrono::{Datelike, NaiveDateTime};

pub use dates::{Locale, infer_year, parse_date, parse_datetime};

use crate::error::FieldError;
use crate::models::profile::{PlaceSlot, Projection, TimeSlot, VenueSlot, YearSource};
use crate::models::reservation::{
    Airport, BoatReservation, BoatTerminal, BoatTrip, BusReservation, BusStation, BusTrip, Event,
    EventReservation, Flight, FlightReservation, LodgingBusiness, LodgingReservation, Organization,
    Person, Place, PostalAddress, Reservation, ReservationInfo, ReservationKind, Seat, Ticket,
    TrainReservation, TrainStation, TrainTrip,
};
use crate::scan::Record;

/// Trim and collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps records onto reservations using one profile's projection.
///
/// Projection is a pure function of the record: the same record always
/// yields the same reservation.
#[derive(Debug, Clone, Copy)]
pub struct FieldProjector<'p> {
    projection: &'p Projection,
    locale: &'static Locale,
}

/// Place values read from a record.
#[derive(Debug, Default)]
struct PlaceValues {
    name: Option<String>,
    code: Option<String>,
    platform: Option<String>,
    identifier: Option<String>,
}

impl PlaceValues {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none() && self.identifier.is_none()
    }
}

impl<'p> FieldProjector<'p> {
    pub fn new(projection: &'p Projection, locale: &'static Locale) -> Self {
        Self { projection, locale }
    }

    pub fn kind(&self) -> ReservationKind {
        self.projection.kind
    }

    /// Project one record. Absent keys leave slots empty; only values
    /// that are present but cannot be parsed are errors.
    pub fn project(&self, record: &Record) -> Result<Reservation, FieldError> {
        let p = self.projection;

        let info = ReservationInfo {
            reservation_number: text(record, &p.reservation_number),
            under_name: text(record, &p.passenger).map(Person::new),
            ..Default::default()
        };
        let start = self.time(record, &p.start_time)?;
        let end = self.time(record, &p.end_time)?;
        let origin = place(record, &p.origin);
        let destination = place(record, &p.destination);
        let number = text(record, &p.vehicle_number);
        let provider = self.carrier(record);
        let seat = self.seat(record);
        let token = text(record, &p.ticket_token);
        let ticket = Some(Ticket {
            ticketed_seat: seat.clone(),
            ticket_token: token.clone(),
        })
        .filter(|t| !t.is_empty());

        let reservation = match p.kind {
            ReservationKind::Flight => {
                let flight = Flight {
                    flight_number: number,
                    airline: provider,
                    departure_terminal: origin.platform.clone(),
                    departure_airport: airport(origin),
                    departure_time: start,
                    arrival_terminal: destination.platform.clone(),
                    arrival_airport: airport(destination),
                    arrival_time: end,
                };
                Reservation::FlightReservation(FlightReservation {
                    info,
                    airplane_seat: seat.and_then(|s| s.seat_number),
                    reserved_ticket: token.map(|t| Ticket {
                        ticketed_seat: None,
                        ticket_token: Some(t),
                    }),
                    ..FlightReservation::new(flight)
                })
            }
            ReservationKind::Train => {
                let trip = TrainTrip {
                    train_number: number,
                    provider,
                    departure_platform: origin.platform.clone(),
                    departure_station: station(origin, |name, identifier| TrainStation { name, identifier }),
                    departure_time: start,
                    arrival_platform: destination.platform.clone(),
                    arrival_station: station(destination, |name, identifier| TrainStation { name, identifier }),
                    arrival_time: end,
                };
                Reservation::TrainReservation(TrainReservation {
                    info,
                    reserved_ticket: ticket,
                    ..TrainReservation::new(trip)
                })
            }
            ReservationKind::Bus => {
                let trip = BusTrip {
                    bus_number: number,
                    provider,
                    departure_platform: origin.platform.clone(),
                    departure_bus_stop: station(origin, |name, identifier| BusStation { name, identifier }),
                    departure_time: start,
                    arrival_platform: destination.platform.clone(),
                    arrival_bus_stop: station(destination, |name, identifier| BusStation { name, identifier }),
                    arrival_time: end,
                };
                Reservation::BusReservation(BusReservation {
                    info,
                    reserved_ticket: ticket,
                    ..BusReservation::new(trip)
                })
            }
            ReservationKind::Boat => {
                let trip = BoatTrip {
                    name: number,
                    provider,
                    departure_boat_terminal: station(origin, |name, identifier| BoatTerminal { name, identifier }),
                    departure_time: start,
                    arrival_boat_terminal: station(destination, |name, identifier| BoatTerminal { name, identifier }),
                    arrival_time: end,
                };
                Reservation::BoatReservation(BoatReservation {
                    info,
                    reserved_ticket: ticket,
                    ..BoatReservation::new(trip)
                })
            }
            ReservationKind::Lodging => {
                let venue = self.venue(record);
                let business = LodgingBusiness {
                    name: venue.name,
                    address: venue.address,
                    telephone: venue.telephone,
                };
                Reservation::LodgingReservation(LodgingReservation {
                    info,
                    checkin_time: start,
                    checkout_time: end,
                    ..LodgingReservation::new(business)
                })
            }
            ReservationKind::Event => {
                let venue = self.venue(record);
                let event = Event {
                    name: number,
                    start_date: start,
                    end_date: end,
                    location: (venue != Place::default()).then_some(venue),
                };
                Reservation::EventReservation(EventReservation {
                    info,
                    reserved_ticket: ticket,
                    ..EventReservation::new(event)
                })
            }
        };

        Ok(reservation)
    }

    fn carrier(&self, record: &Record) -> Option<Organization> {
        let org = Organization {
            name: text(record, &self.projection.carrier_name),
            iata_code: text(record, &self.projection.carrier_code),
        };
        (org.name.is_some() || org.iata_code.is_some()).then_some(org)
    }

    fn seat(&self, record: &Record) -> Option<Seat> {
        let slot = self.projection.seat.as_ref()?;
        let seat = Seat {
            seat_number: text(record, &slot.number),
            seat_section: text(record, &slot.section),
            seating_type: text(record, &slot.seating_type),
        };
        (!seat.is_empty()).then_some(seat)
    }

    fn venue(&self, record: &Record) -> Place {
        let Some(VenueSlot {
            name,
            street,
            locality,
            postal_code,
            country,
            telephone,
        }) = &self.projection.venue
        else {
            return Place::default();
        };

        let address = PostalAddress {
            street_address: text(record, street),
            address_locality: text(record, locality),
            postal_code: text(record, postal_code),
            address_country: text(record, country),
        };
        Place {
            name: text(record, name),
            address: (!address.is_empty()).then_some(address),
            telephone: text(record, telephone),
        }
    }

    /// Combine the slot's keys into one timestamp.
    fn time(&self, record: &Record, slot: &Option<TimeSlot>) -> Result<Option<NaiveDateTime>, FieldError> {
        let Some(slot) = slot else {
            return Ok(None);
        };

        let mut parts = Vec::with_capacity(slot.fields.len());
        for key in &slot.fields {
            match text(record, &Some(key.clone())) {
                Some(value) => parts.push(value),
                None => return Ok(None),
            }
        }
        let joined = parts.join(" ");
        let field_name = slot.fields.join("+");

        let Some(source) = &slot.year else {
            return parse_datetime(&joined, &slot.format, self.locale)
                .map(Some)
                .map_err(|e| FieldError::malformed(&field_name, &joined, e.to_string()));
        };

        // Parse against a leap year so 29 February survives until the real
        // year is known.
        let dt = parse_datetime(&format!("{joined} 2000"), &format!("{} %Y", slot.format), self.locale)
            .map_err(|e| FieldError::malformed(&field_name, &joined, e.to_string()))?;

        let year = match source {
            YearSource::Fixed { year } => *year,
            YearSource::Field { field } => {
                let Some(value) = text(record, &Some(field.clone())) else {
                    return Ok(None);
                };
                dates::parse_year(&value)
                    .ok_or_else(|| FieldError::malformed(field, &value, "not a year"))?
            }
            YearSource::Following { field, format } => {
                let Some(value) = text(record, &Some(field.clone())) else {
                    return Ok(None);
                };
                let reference = parse_date(&value, format, self.locale)
                    .map_err(|e| FieldError::malformed(field, &value, e.to_string()))?;
                infer_year(dt.day(), dt.month(), reference)
            }
        };

        dt.with_year(year)
            .map(Some)
            .ok_or_else(|| FieldError::malformed(&field_name, &joined, format!("no such date in {year}")))
    }
}

fn text(record: &Record, key: &Option<String>) -> Option<String> {
    let value = record.text(key.as_deref()?)?;
    let value = normalize_whitespace(&value);
    (!value.is_empty()).then_some(value)
}

fn place(record: &Record, slot: &Option<PlaceSlot>) -> PlaceValues {
    let Some(slot) = slot else {
        return PlaceValues::default();
    };
    PlaceValues {
        name: text(record, &slot.name),
        code: text(record, &slot.code).map(|c| c.to_uppercase()),
        platform: text(record, &slot.platform),
        identifier: text(record, &slot.identifier),
    }
}

fn airport(place: PlaceValues) -> Option<Airport> {
    if place.is_empty() {
        return None;
    }
    Some(Airport {
        name: place.name,
        iata_code: place.code.or(place.identifier),
    })
}

fn station<T>(place: PlaceValues, build: impl FnOnce(Option<String>, Option<String>) -> T) -> Option<T> {
    if place.is_empty() {
        return None;
    }
    Some(build(place.name, place.identifier.or(place.code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::SeatSlot;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn train_projection() -> Projection {
        let mut p = Projection::new(ReservationKind::Train);
        p.reservation_number = Some("booking".to_string());
        p.vehicle_number = Some("train".to_string());
        p.origin = Some(PlaceSlot {
            name: Some("from".to_string()),
            platform: Some("platform".to_string()),
            ..Default::default()
        });
        p.destination = Some(PlaceSlot {
            name: Some("to".to_string()),
            ..Default::default()
        });
        p.seat = Some(SeatSlot {
            number: Some("seat".to_string()),
            section: Some("coach".to_string()),
            seating_type: None,
        });
        p.start_time = Some(TimeSlot::new(&["date", "dep"], "%d. %B %Y %H:%M"));
        p.end_time = Some(TimeSlot::new(&["date", "arr"], "%d. %B %Y %H:%M"));
        p
    }

    fn train_record() -> Record {
        Record::default()
            .with("booking", "ABC123")
            .with("train", "ICE  1601")
            .with("from", "  Berlin\n Hbf ")
            .with("to", "München Hbf")
            .with("platform", "7")
            .with("date", "15. März 2024")
            .with("dep", "10:05")
            .with("arr", "14:12")
            .with("seat", "45")
            .with("coach", "9")
    }

    #[test]
    fn test_project_train() {
        let projection = train_projection();
        let projector = FieldProjector::new(&projection, Locale::get("de").unwrap());

        let Reservation::TrainReservation(res) = projector.project(&train_record()).unwrap() else {
            panic!("expected a train reservation");
        };

        assert_eq!(res.info.reservation_number.as_deref(), Some("ABC123"));
        let trip = &res.reservation_for;
        assert_eq!(trip.train_number.as_deref(), Some("ICE 1601"));
        assert_eq!(trip.departure_station.as_ref().unwrap().name.as_deref(), Some("Berlin Hbf"));
        assert_eq!(trip.departure_platform.as_deref(), Some("7"));
        assert_eq!(trip.departure_time, Some(dt(2024, 3, 15, 10, 5)));
        assert_eq!(trip.arrival_time, Some(dt(2024, 3, 15, 14, 12)));

        let seat = res.reserved_ticket.unwrap().ticketed_seat.unwrap();
        assert_eq!(seat.seat_number.as_deref(), Some("45"));
        assert_eq!(seat.seat_section.as_deref(), Some("9"));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let projection = train_projection();
        let projector = FieldProjector::new(&projection, Locale::get("de").unwrap());
        let record = train_record();

        assert_eq!(projector.project(&record).unwrap(), projector.project(&record).unwrap());
    }

    #[test]
    fn test_absent_keys_are_absent_values() {
        let projection = train_projection();
        let projector = FieldProjector::new(&projection, Locale::get("de").unwrap());
        let record = Record::default().with("train", "RE 5");

        let res = projector.project(&record).unwrap();
        assert_eq!(res.start_time(), None);
        assert_eq!(res.reservation_number(), None);
        let Reservation::TrainReservation(res) = res else {
            panic!("expected a train reservation");
        };
        assert_eq!(res.reservation_for.departure_station, None);
        assert_eq!(res.reserved_ticket, None);
    }

    #[test]
    fn test_malformed_time_names_fields() {
        let projection = train_projection();
        let projector = FieldProjector::new(&projection, Locale::get("de").unwrap());
        let record = train_record().with("dep", "25:99");

        let err = projector.project(&record).unwrap_err();
        let FieldError::Malformed { field, value, .. } = err;
        assert_eq!(field, "date+dep");
        assert_eq!(value, "15. März 2024 25:99");
    }

    #[test]
    fn test_year_following_purchase_date() {
        let mut projection = Projection::new(ReservationKind::Train);
        projection.start_time = Some(TimeSlot {
            fields: vec!["day".to_string(), "dep".to_string()],
            format: "%d.%m. %H:%M".to_string(),
            year: Some(YearSource::Following {
                field: "bought".to_string(),
                format: "%d.%m.%Y".to_string(),
            }),
        });
        let projector = FieldProjector::new(&projection, Locale::english());

        let december = Record::default()
            .with("day", "28.12.")
            .with("dep", "06:10")
            .with("bought", "20.12.2023");
        assert_eq!(projector.project(&december).unwrap().start_time(), Some(dt(2023, 12, 28, 6, 10)));

        let january = december.clone().with("day", "02.01.");
        assert_eq!(projector.project(&january).unwrap().start_time(), Some(dt(2024, 1, 2, 6, 10)));
    }

    #[test]
    fn test_leap_day_needs_leap_year() {
        let mut projection = Projection::new(ReservationKind::Event);
        projection.start_time = Some(TimeSlot {
            fields: vec!["day".to_string()],
            format: "%d.%m.".to_string(),
            year: Some(YearSource::Fixed { year: 2023 }),
        });
        let projector = FieldProjector::new(&projection, Locale::english());

        let record = Record::default().with("day", "29.02.");
        assert!(projector.project(&record).is_err());
    }

    #[test]
    fn test_project_flight() {
        let mut projection = Projection::new(ReservationKind::Flight);
        projection.vehicle_number = Some("flight".to_string());
        projection.carrier_code = Some("airline".to_string());
        projection.origin = Some(PlaceSlot {
            code: Some("from".to_string()),
            platform: Some("terminal".to_string()),
            ..Default::default()
        });
        projection.destination = Some(PlaceSlot {
            code: Some("to".to_string()),
            ..Default::default()
        });
        projection.seat = Some(SeatSlot {
            number: Some("seat".to_string()),
            ..Default::default()
        });
        let projector = FieldProjector::new(&projection, Locale::english());

        let record = Record::default()
            .with("flight", "LH 123")
            .with("airline", "LH")
            .with("from", "txl")
            .with("terminal", "C")
            .with("to", "MUC")
            .with("seat", "12A");

        let Reservation::FlightReservation(res) = projector.project(&record).unwrap() else {
            panic!("expected a flight reservation");
        };
        assert_eq!(res.airplane_seat.as_deref(), Some("12A"));
        let flight = res.reservation_for;
        assert_eq!(flight.airline.unwrap().iata_code.as_deref(), Some("LH"));
        assert_eq!(flight.departure_airport.unwrap().iata_code.as_deref(), Some("TXL"));
        assert_eq!(flight.departure_terminal.as_deref(), Some("C"));
        assert_eq!(flight.arrival_airport.unwrap().iata_code.as_deref(), Some("MUC"));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Berlin \t Hbf\n"), "Berlin Hbf");
        assert_eq!(normalize_whitespace(" \n "), "");
    }
}
