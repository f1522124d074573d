//! Validation and de-duplication of projected reservations.
//!
//! A profile can match loosely and still produce reservations that carry
//! too little to be useful (a train with no stations, a hotel with no
//! dates). Those are dropped before a result is considered non-empty, so a
//! weak match never hides a better profile further down the registry.

use tracing::debug;

use crate::models::reservation::{
    Airport, BoatTerminal, BusStation, Reservation, ReservationInfo, TrainStation,
};

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn airport_known(airport: &Option<Airport>) -> bool {
    airport
        .as_ref()
        .is_some_and(|a| has_text(&a.iata_code) || has_text(&a.name))
}

fn train_station_named(station: &Option<TrainStation>) -> bool {
    station.as_ref().is_some_and(|s| has_text(&s.name))
}

fn bus_stop_named(stop: &Option<BusStation>) -> bool {
    stop.as_ref().is_some_and(|s| has_text(&s.name))
}

fn terminal_named(terminal: &Option<BoatTerminal>) -> bool {
    terminal.as_ref().is_some_and(|t| has_text(&t.name))
}

/// Whether `reservation` carries the minimum a calendar entry needs.
///
/// | kind    | requires                                              |
/// |---------|-------------------------------------------------------|
/// | flight  | both airports (code or name), departure time          |
/// | train   | both station names, departure time                    |
/// | bus     | both stop names, departure and arrival time           |
/// | boat    | both terminal names, departure time                   |
/// | lodging | hotel name, check-in no later than check-out          |
/// | event   | event name, start time                                |
pub fn is_valid(reservation: &Reservation) -> bool {
    match reservation {
        Reservation::FlightReservation(r) => {
            let f = &r.reservation_for;
            airport_known(&f.departure_airport)
                && airport_known(&f.arrival_airport)
                && f.departure_time.is_some()
        }
        Reservation::TrainReservation(r) => {
            let t = &r.reservation_for;
            train_station_named(&t.departure_station)
                && train_station_named(&t.arrival_station)
                && t.departure_time.is_some()
        }
        Reservation::BusReservation(r) => {
            let t = &r.reservation_for;
            bus_stop_named(&t.departure_bus_stop)
                && bus_stop_named(&t.arrival_bus_stop)
                && t.departure_time.is_some()
                && t.arrival_time.is_some()
        }
        Reservation::BoatReservation(r) => {
            let t = &r.reservation_for;
            terminal_named(&t.departure_boat_terminal)
                && terminal_named(&t.arrival_boat_terminal)
                && t.departure_time.is_some()
        }
        Reservation::LodgingReservation(r) => {
            has_text(&r.reservation_for.name)
                && matches!((r.checkin_time, r.checkout_time), (Some(checkin), Some(checkout)) if checkin <= checkout)
        }
        Reservation::EventReservation(r) => has_text(&r.reservation_for.name) && r.reservation_for.start_date.is_some(),
    }
}

/// Whether two reservations describe the same booking.
///
/// Same kind, trip, departure and booking reference. Travellers must agree
/// when both are named.
pub fn is_same(a: &Reservation, b: &Reservation) -> bool {
    if a.kind() != b.kind() || a.reservation_number() != b.reservation_number() {
        return false;
    }
    if let (Some(x), Some(y)) = (a.passenger(), b.passenger()) {
        if x != y {
            return false;
        }
    }
    a.start_time() == b.start_time() && a.summary() == b.summary()
}

/// Fill what `target` lacks from `other`.
fn merge_info(target: &mut ReservationInfo, other: &ReservationInfo) {
    if target.under_name.is_none() {
        target.under_name = other.under_name.clone();
    }
    if target.total_price.is_none() && other.total_price.is_some() {
        target.total_price = other.total_price;
        target.price_currency = other.price_currency.clone();
    }
}

/// Drop invalid reservations and fold duplicates into their first
/// occurrence. Returns the kept reservations and the number discarded.
pub fn postprocess(reservations: Vec<Reservation>) -> (Vec<Reservation>, usize) {
    let total = reservations.len();
    let mut kept: Vec<Reservation> = Vec::with_capacity(total);
    let mut discarded = 0;

    for reservation in reservations {
        if !is_valid(&reservation) {
            debug!("Discarding incomplete reservation: {}", reservation.summary());
            discarded += 1;
            continue;
        }
        match kept.iter_mut().find(|k| is_same(k, &reservation)) {
            Some(existing) => {
                debug!("Merging duplicate reservation: {}", reservation.summary());
                merge_info(existing.info_mut(), reservation.info());
            }
            None => kept.push(reservation),
        }
    }

    (kept, discarded)
}
