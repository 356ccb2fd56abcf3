//! Per-resource booking calendar derived from tour bindings.
//!
//! There is no calendar entity on file: a resource is busy on a day when some
//! tour on that day binds it. The index turns that implicit calendar into a
//! sorted map so availability lookups do not rescan every tour for every
//! candidate.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::{ResourceId, ResourceKind, Tour, TourId};

type Calendar = BTreeMap<NaiveDate, BTreeSet<TourId>>;

/// Booked days per resource, keyed by role.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tourdesk_core::{BookingIndex, ResourceId, ResourceKind, Tour, TourId};
///
/// let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let tour = Tour::new(TourId::new(1), "Walk", day).with_binding(ResourceKind::Guide, "g1");
/// let index = BookingIndex::from_tours([&tour]);
///
/// let g1 = ResourceId::new("g1");
/// assert!(index.is_booked(ResourceKind::Guide, &g1, day, None));
/// assert!(!index.is_booked(ResourceKind::Guide, &g1, day, Some(TourId::new(1))));
/// assert!(!index.is_booked(ResourceKind::Guide, &g1, day.succ_opt().unwrap(), None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingIndex {
    entries: BTreeMap<ResourceKind, BTreeMap<ResourceId, Calendar>>,
}

impl BookingIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every binding of the given tours.
    pub fn from_tours<'a, I>(tours: I) -> Self
    where
        I: IntoIterator<Item = &'a Tour>,
    {
        let mut index = Self::new();
        for tour in tours {
            for kind in ResourceKind::ALL {
                if let Some(id) = tour.binding(kind) {
                    index.record(kind, id.clone(), tour.date, tour.id);
                }
            }
        }
        index
    }

    /// Mark `id` as booked on `date` by `tour`.
    pub fn record(&mut self, kind: ResourceKind, id: ResourceId, date: NaiveDate, tour: TourId) {
        self.entries
            .entry(kind)
            .or_default()
            .entry(id)
            .or_default()
            .entry(date)
            .or_default()
            .insert(tour);
    }

    /// Tours binding `id` on `date`, skipping `exclude`.
    ///
    /// The excluded tour is the one being staffed: its own binding never
    /// counts as a conflict.
    pub fn tours_on<'a>(
        &'a self,
        kind: ResourceKind,
        id: &ResourceId,
        date: NaiveDate,
        exclude: Option<TourId>,
    ) -> impl Iterator<Item = TourId> + 'a {
        self.entries
            .get(&kind)
            .and_then(|calendars| calendars.get(id))
            .and_then(|calendar| calendar.get(&date))
            .into_iter()
            .flatten()
            .copied()
            .filter(move |tour| Some(*tour) != exclude)
    }

    /// First tour (lowest id) that already holds `id` on `date`.
    pub fn conflicting_tour(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        date: NaiveDate,
        exclude: Option<TourId>,
    ) -> Option<TourId> {
        self.tours_on(kind, id, date, exclude).next()
    }

    /// Whether `id` is bound to another tour on `date`.
    pub fn is_booked(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        date: NaiveDate,
        exclude: Option<TourId>,
    ) -> bool {
        self.conflicting_tour(kind, id, date, exclude).is_some()
    }

    /// Every booking of `id`, ordered by date then tour.
    pub fn bookings_of<'a>(
        &'a self,
        kind: ResourceKind,
        id: &ResourceId,
    ) -> impl Iterator<Item = (NaiveDate, TourId)> + 'a {
        self.entries
            .get(&kind)
            .and_then(|calendars| calendars.get(id))
            .into_iter()
            .flat_map(|calendar| {
                calendar
                    .iter()
                    .flat_map(|(date, tours)| tours.iter().map(move |tour| (*date, *tour)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).expect("valid date")
    }

    #[fixture]
    fn index() -> BookingIndex {
        let tours = [
            Tour::new(TourId::new(1), "A", day(1)).with_binding(ResourceKind::Driver, "d1"),
            Tour::new(TourId::new(2), "B", day(1)).with_binding(ResourceKind::Driver, "d1"),
            Tour::new(TourId::new(3), "C", day(3)).with_binding(ResourceKind::Driver, "d1"),
        ];
        BookingIndex::from_tours(&tours)
    }

    #[rstest]
    fn reports_lowest_conflicting_tour(index: BookingIndex) {
        let d1 = ResourceId::new("d1");
        assert_eq!(
            index.conflicting_tour(ResourceKind::Driver, &d1, day(1), None),
            Some(TourId::new(1))
        );
        assert_eq!(
            index.conflicting_tour(ResourceKind::Driver, &d1, day(1), Some(TourId::new(1))),
            Some(TourId::new(2))
        );
    }

    #[rstest]
    fn roles_are_indexed_separately(index: BookingIndex) {
        let d1 = ResourceId::new("d1");
        assert!(!index.is_booked(ResourceKind::Guide, &d1, day(1), None));
    }

    #[rstest]
    fn lists_bookings_in_date_order(index: BookingIndex) {
        let d1 = ResourceId::new("d1");
        let bookings: Vec<_> = index.bookings_of(ResourceKind::Driver, &d1).collect();
        assert_eq!(
            bookings,
            vec![
                (day(1), TourId::new(1)),
                (day(1), TourId::new(2)),
                (day(3), TourId::new(3)),
            ]
        );
    }
}
