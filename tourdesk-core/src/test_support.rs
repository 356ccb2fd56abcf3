//! Fixture roster and clock shared by unit, behaviour and CLI tests.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Driver, Guide, ResourceKind, Roster, Tour, TourId, Vehicle};

/// Calendar date helper; out-of-range input falls back to the epoch.
pub fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).unwrap_or_default()
}

/// Fixed event timestamp, 2024-06-01T00:00:00Z.
pub fn at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_200_000, 0).unwrap_or_default()
}

/// A small agency on two days of June 2024.
///
/// - Tour 5 (06-01, 8 passengers, English) is unstaffed.
/// - Tour 6 (06-01) is fully staffed by `g2`, `d2` and `v4`.
/// - Tour 7 (06-02, 12 passengers) needs a `wine` guide.
/// - `g9` and `v3` are inactive; `v2` needs a category `D` licence, which
///   only `d1` holds.
pub fn sample_roster() -> Roster {
    Roster::new()
        .with_guide(
            Guide::new("g1", "Ana Ruiz")
                .with_language("en")
                .with_language("es")
                .with_competence("museum")
                .with_competence("wine"),
        )
        .with_guide(
            Guide::new("g2", "Ben Okafor")
                .with_language("en")
                .with_competence("history"),
        )
        .with_guide(Guide::new("g9", "Cleo Marsh").with_language("en").inactive())
        .with_driver(Driver::new("d1", "Luis Prado").with_licence("D").with_licence("D1"))
        .with_driver(Driver::new("d2", "Marta Lind").with_licence("D1"))
        .with_driver(Driver::new("d3", "Nils Berg").with_licence("B"))
        .with_vehicle(Vehicle::new("v1", "SMALL-10", 10).with_model("Sprinter"))
        .with_vehicle(
            Vehicle::new("v2", "COACH-20", 20)
                .with_model("Tourismo")
                .with_required_licence("D"),
        )
        .with_vehicle(Vehicle::new("v3", "BUS-50", 50).inactive())
        .with_vehicle(Vehicle::new("v4", "VAN-9", 9))
        .with_tour(
            Tour::new(TourId::new(5), "Old town walk", day(2024, 6, 1))
                .with_code("OTW-0601")
                .with_group_size(8)
                .with_category("city")
                .with_language("en"),
        )
        .with_tour(
            Tour::new(TourId::new(6), "Harbour cruise", day(2024, 6, 1))
                .with_code("HBR-0601")
                .with_group_size(8)
                .with_category("city")
                .with_binding(ResourceKind::Guide, "g2")
                .with_binding(ResourceKind::Driver, "d2")
                .with_binding(ResourceKind::Vehicle, "v4"),
        )
        .with_tour(
            Tour::new(TourId::new(7), "Cellar visit", day(2024, 6, 2))
                .with_code("CEL-0602")
                .with_group_size(12)
                .with_category("wine")
                .with_required_competence("wine"),
        )
}
