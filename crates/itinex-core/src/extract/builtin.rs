//! Vendor profiles compiled into the binary.

use crate::error::Result;
use crate::models::profile::VendorProfile;

const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("eticket-flight", include_str!("../../profiles/eticket-flight.json")),
    ("bahn-ticket", include_str!("../../profiles/bahn-ticket.json")),
    ("cd-ticket", include_str!("../../profiles/cd-ticket.json")),
    ("hotel-confirmation", include_str!("../../profiles/hotel-confirmation.json")),
];

/// Parse every built-in profile.
pub fn builtin_profiles() -> Result<Vec<VendorProfile>> {
    BUILTIN_PROFILES
        .iter()
        .map(|(_, json)| VendorProfile::from_json(json))
        .collect()
}

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_PROFILES.iter().map(|(name, _)| *name).collect()
}

/// The JSON source of a built-in profile.
pub fn builtin_source(name: &str) -> Option<&'static str> {
    BUILTIN_PROFILES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, json)| *json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;
    use crate::models::reservation::{Reservation, ReservationKind};
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|date| date.and_hms_opt(h, min, 0))
    }

    fn extractor(name: &str) -> Extractor {
        let json = builtin_source(name).unwrap();
        Extractor::compile(VendorProfile::from_json(json).unwrap()).unwrap()
    }

    #[test]
    fn test_builtin_profiles_compile() {
        let profiles = builtin_profiles().unwrap();
        assert_eq!(profiles.len(), BUILTIN_PROFILES.len());
        for (profile, (name, _)) in profiles.into_iter().zip(BUILTIN_PROFILES) {
            assert_eq!(profile.name, *name);
            Extractor::compile(profile).unwrap();
        }
    }

    #[test]
    fn test_builtin_names_unique() {
        let mut names = builtin_names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_PROFILES.len());
        assert!(builtin_source("no-such-profile").is_none());
    }

    const FLIGHT: &str = "\
ELECTRONIC TICKET RECEIPT
Booking reference: K7XQ2P
Date of issue: 02 Feb 2024

Passenger: SMITH/JOHN MR
Passenger: SMITH/ANNA MRS

Flight LH 1234  15 MAR  Seat 14C
From: Frankfurt (FRA) Terminal 1  Dep 10:15
To:   Berlin Brandenburg (BER)  Arr 11:20

Flight LH 1235  22 MAR
From: Berlin Brandenburg (BER)  Dep 18:40
To:   Frankfurt (FRA) Terminal 1  Arr 19:50

Total fare: EUR 312.40
";

    #[test]
    fn test_eticket_flight() {
        let result = extractor("eticket-flight").extract(FLIGHT);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.reservations.len(), 4);

        let Reservation::FlightReservation(first) = &result.reservations[0] else {
            panic!("expected a flight");
        };
        assert_eq!(first.info.reservation_number.as_deref(), Some("K7XQ2P"));
        assert_eq!(first.airplane_seat.as_deref(), Some("14C"));
        assert_eq!(first.reservation_for.flight_number.as_deref(), Some("1234"));
        assert_eq!(first.reservation_for.departure_terminal.as_deref(), Some("1"));
        assert_eq!(first.reservation_for.departure_time, dt(2024, 3, 15, 10, 15));
        assert_eq!(
            first.reservation_for.arrival_airport.as_ref().and_then(|a| a.iata_code.as_deref()),
            Some("BER")
        );
        assert_eq!(first.info.total_price, Some(Decimal::new(31240, 2)));

        assert_eq!(result.reservations[1].passenger(), Some("SMITH/ANNA MRS"));
        assert_eq!(result.reservations[2].start_time(), dt(2024, 3, 22, 18, 40));
        let Reservation::FlightReservation(return_leg) = &result.reservations[2] else {
            panic!("expected a flight");
        };
        assert_eq!(return_leg.airplane_seat, None);
    }

    const BAHN: &str = "\
Online-Ticket
Auftragsnummer: 482913756201
Reisende: Erika Mustermann

Hinfahrt am 15. März 2024
Halt            Datum  Zeit   Gleis  Produkte   Reservierung
Berlin Hbf      15.03. ab 10:05  7   ICE 1601   Wg. 8, Pl. 61
München Hbf     15.03. an 14:02 18
München Hbf     15.03. ab 14:30  3   RE 4012
Garmisch-Partenkirchen 15.03. an 15:52  2

Rückfahrt am 22. März 2024
Halt            Datum  Zeit   Gleis  Produkte   Reservierung
Garmisch-Partenkirchen 22.03. ab 16:05  1   RE 4023
München Hbf     22.03. an 17:28 25

Summe 89,90 €

Wichtige Nutzungshinweise:
Berlin Hbf      01.01. ab 00:00  1   ICE 1
";

    #[test]
    fn test_bahn_ticket_sections() {
        let result = extractor("bahn-ticket").extract(BAHN);
        assert!(result.errors.is_empty());
        assert_eq!(result.reservations.len(), 3);

        let summaries: Vec<String> = result.reservations.iter().map(Reservation::summary).collect();
        assert_eq!(
            summaries,
            vec![
                "train ICE 1601 Berlin Hbf -> München Hbf (2024-03-15 10:05)",
                "train RE 4012 München Hbf -> Garmisch-Partenkirchen (2024-03-15 14:30)",
                "train RE 4023 Garmisch-Partenkirchen -> München Hbf (2024-03-22 16:05)",
            ]
        );

        let Reservation::TrainReservation(first) = &result.reservations[0] else {
            panic!("expected a train");
        };
        assert_eq!(first.reservation_for.departure_platform.as_deref(), Some("7"));
        assert_eq!(first.reservation_for.arrival_platform.as_deref(), Some("18"));
        let seat = first.reserved_ticket.as_ref().and_then(|t| t.ticketed_seat.as_ref()).unwrap();
        assert_eq!(seat.seat_number.as_deref(), Some("61"));
        assert_eq!(seat.seat_section.as_deref(), Some("8"));

        assert_eq!(result.records[2].text("direction").as_deref(), Some("Rückfahrt"));
        assert!(result.reservations.iter().all(|r| r.passenger() == Some("Erika Mustermann")));
        assert!(result.reservations.iter().all(|r| r.info().price_currency.as_deref() == Some("EUR")));
    }

    const CD: &str = "\
Jízdní doklad
Kód dokladu: 7XK2P9QM
Datum nákupu: 28. prosince 2023

Odjezd 3. ledna 08:12 Praha hl.n.
Příjezd 3. ledna 10:45 Brno hl.n.
Vlak EC 171 vůz 5 místo 42

Odjezd 3. ledna 11:00 Brno hl.n.
Příjezd 3. ledna 12:30 Břeclav
Vlak R 891

Cena celkem: 489 Kč
Obchodní podmínky
Odjezd 1. ledna 00:00 Vzor
Příjezd 1. ledna 00:01 Vzor
Vlak Os 1
";

    #[test]
    fn test_cd_ticket_infers_next_year() {
        let result = extractor("cd-ticket").extract(CD);
        // The sample leg after the terms is not a record.
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.reservations.len(), 2);

        let first = &result.reservations[0];
        assert_eq!(first.kind(), ReservationKind::Train);
        assert_eq!(first.reservation_number(), Some("7XK2P9QM"));
        assert_eq!(first.start_time(), dt(2024, 1, 3, 8, 12));
        assert_eq!(first.end_time(), dt(2024, 1, 3, 10, 45));
        assert_eq!(result.reservations[1].summary(), "train R 891 Brno hl.n. -> Břeclav (2024-01-03 11:00)");
        assert_eq!(first.info().total_price, Some(Decimal::new(489, 0)));
    }

    const HOTEL: &str = "\
Booking confirmation
Confirmation number: 4815162342
Guest name: Jane Doe

Hotel Astoria
Main Street 12
1010 Vienna, Austria
Phone: +43 1 234567

Check-in: Friday, 15 March 2024 (from 14:00)
Check-out: Sunday, 17 March 2024

Total price: € 245.00
";

    #[test]
    fn test_hotel_confirmation() {
        let result = extractor("hotel-confirmation").extract(HOTEL);
        assert_eq!(result.reservations.len(), 1);

        let Reservation::LodgingReservation(stay) = &result.reservations[0] else {
            panic!("expected a lodging reservation");
        };
        assert_eq!(stay.info.reservation_number.as_deref(), Some("4815162342"));
        assert_eq!(stay.reservation_for.name.as_deref(), Some("Hotel Astoria"));
        assert_eq!(stay.reservation_for.telephone.as_deref(), Some("+43 1 234567"));
        let address = stay.reservation_for.address.as_ref().unwrap();
        assert_eq!(address.address_locality.as_deref(), Some("Vienna"));
        assert_eq!(address.postal_code.as_deref(), Some("1010"));
        assert_eq!(stay.checkin_time, dt(2024, 3, 15, 14, 0));
        // No time printed, so the default applies.
        assert_eq!(stay.checkout_time, dt(2024, 3, 17, 11, 0));
        assert_eq!(stay.info.total_price, Some(Decimal::new(24500, 2)));
        assert_eq!(stay.info.price_currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_profiles_ignore_other_documents() {
        let registry = crate::extract::Registry::with_builtin().unwrap();
        let config = crate::models::config::ExtractionConfig::default();
        for text in [FLIGHT, BAHN, CD, HOTEL] {
            let all = registry.extract_all(text, &config);
            assert_eq!(all.len(), 1, "{:?}", text.lines().next());
        }
    }
}
