//! Hour strips - 24 aligned hour columns per zone
//!
//! Column 0 of every strip is the same instant: the most recent local
//! midnight of the reference zone, shifted by the same elapsed offset in
//! each zone. A vertical read across strips therefore always shows one
//! moment, even for zones with fractional offsets.

use chrono::{DateTime, Duration, NaiveDate, Timelike};
use chrono_tz::Tz;
use shared::{is_dst, local_midnight, Zone};

/// Number of hour columns in a strip
pub const HOURS_PER_STRIP: usize = 24;

/// Where the displayed instant sits relative to column 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Elapsed time from column 0 to the displayed instant
    pub offset: Duration,
    /// Column holding the displayed instant
    pub cursor_column: usize,
}

impl Alignment {
    /// Align on the reference zone's local midnight before `instant`.
    ///
    /// On a 25-hour day the last hour folds into column 23, so column 0 moves
    /// forward by the overflow.
    pub fn new(reference: &Zone, instant: &DateTime<Tz>) -> Self {
        let local = reference.local_time(instant);
        let elapsed = (local - local_midnight(&local)).max(Duration::zero());
        let whole_hours = elapsed.num_hours();
        let cursor = whole_hours.min(HOURS_PER_STRIP as i64 - 1);
        Self {
            offset: elapsed - Duration::hours(whole_hours - cursor),
            cursor_column: cursor as usize,
        }
    }
}

/// Annotation shown under a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// The local calendar date changes at this column
    DateChange(NaiveDate),
    /// Daylight saving time starts at this column
    DstStart,
    /// Daylight saving time ends at this column
    DstEnd,
}

/// One column of a strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourCell {
    /// Wall-clock reading at the column
    pub local: DateTime<Tz>,
    pub marker: Option<Marker>,
}

/// 24 consecutive hours of one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneStrip {
    pub cells: Vec<HourCell>,
}

impl ZoneStrip {
    /// Build the strip for `zone` showing `instant`
    pub fn new(zone: &Zone, instant: &DateTime<Tz>, alignment: &Alignment) -> Self {
        let column_zero = zone.local_time(instant) - alignment.offset;

        let before = column_zero - Duration::hours(1);
        let mut previous_hour = before.hour();
        let mut previous_dst = is_dst(&before);

        let cells = (0..HOURS_PER_STRIP as i64)
            .map(|column| {
                let local = column_zero + Duration::hours(column);
                let hour = local.hour();
                let dst = is_dst(&local);
                // A DST change wins over a date change in the same column
                let marker = if dst != previous_dst {
                    Some(if dst { Marker::DstStart } else { Marker::DstEnd })
                } else if hour < previous_hour {
                    Some(Marker::DateChange(local.date_naive()))
                } else {
                    None
                };
                previous_hour = hour;
                previous_dst = dst;
                HourCell { local, marker }
            })
            .collect();

        Self { cells }
    }

    /// Columns carrying a marker, in order
    pub fn markers(&self) -> Vec<(usize, Marker)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(column, cell)| cell.marker.map(|marker| (column, marker)))
            .collect()
    }
}

/// Strips for every zone, all aligned on the first (reference) zone
pub fn zone_strips(zones: &[Zone], instant: &DateTime<Tz>) -> (Alignment, Vec<ZoneStrip>) {
    let alignment = match zones.first() {
        Some(reference) => Alignment::new(reference, instant),
        None => Alignment::new(&Zone::from_tz(instant.timezone(), ""), instant),
    };
    let strips = zones
        .iter()
        .map(|zone| ZoneStrip::new(zone, instant, &alignment))
        .collect();
    (alignment, strips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn zone(id: &str) -> Zone {
        Zone::new(id, None).unwrap()
    }

    fn hours(strip: &ZoneStrip) -> Vec<u32> {
        strip.cells.iter().map(|cell| cell.local.hour()).collect()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_alignment_on_plain_day() {
        let alignment = Alignment::new(&zone("UTC"), &utc(2017, 11, 5, 0, 29, 2));
        assert_eq!(alignment.cursor_column, 0);
        assert_eq!(alignment.offset, Duration::minutes(29) + Duration::seconds(2));

        let alignment = Alignment::new(&zone("UTC"), &utc(2017, 11, 5, 23, 59, 59));
        assert_eq!(alignment.cursor_column, 23);
    }

    #[test]
    fn test_alignment_folds_25th_hour() {
        // Paris falls back on 2024-10-27; 23:30 local is 24.5 hours after midnight
        let paris = zone("Europe/Paris");
        let instant = utc(2024, 10, 27, 22, 30, 0);
        let alignment = Alignment::new(&paris, &instant);
        assert_eq!(alignment.cursor_column, 23);
        assert_eq!(alignment.offset, Duration::minutes(23 * 60 + 30));

        let strip = ZoneStrip::new(&paris, &instant, &alignment);
        assert_eq!(strip.cells[0].local.hour(), 1);
        assert_eq!(strip.cells[23].local.hour(), 23);
    }

    #[test]
    fn test_reference_zone_spring_forward() {
        let paris = zone("Europe/Paris");
        let instant = utc(2024, 3, 31, 10, 0, 0);
        let (alignment, strips) = zone_strips(&[paris, zone("UTC")], &instant);
        assert_eq!(alignment.cursor_column, 11);

        let mut expected = vec![0, 1];
        expected.extend(3..=23);
        expected.push(0);
        assert_eq!(hours(&strips[0]), expected);
        assert_eq!(
            strips[0].markers(),
            vec![
                (0, Marker::DateChange(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())),
                (2, Marker::DstStart),
                (23, Marker::DateChange(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())),
            ]
        );
        assert_eq!(strips[0].cells[11].local.hour(), 12);

        let mut expected = vec![23];
        expected.extend(0..=22);
        assert_eq!(hours(&strips[1]), expected);
        assert_eq!(
            strips[1].markers(),
            vec![(1, Marker::DateChange(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()))]
        );
        assert_eq!(strips[1].cells[11].local.hour(), 10);
    }

    #[test]
    fn test_skipped_midnight_has_no_zero_hour() {
        // Havana springs forward from 00:00 to 01:00 on 2024-03-10
        let instant = utc(2024, 3, 10, 12, 0, 0);
        let (alignment, strips) = zone_strips(&[zone("UTC"), zone("America/Havana")], &instant);
        assert_eq!(alignment.cursor_column, 12);

        let havana = &strips[1];
        let mut expected = vec![19, 20, 21, 22, 23];
        expected.extend(1..=19);
        assert_eq!(hours(&havana), expected);
        assert!(!hours(&havana).contains(&0));
        assert_eq!(havana.markers(), vec![(5, Marker::DstStart)]);
        assert!(is_dst(&havana.cells[5].local));
        assert_eq!(havana.cells[12].local.hour(), 8);
    }

    #[test]
    fn test_dst_end_marker() {
        let instant = utc(2024, 10, 27, 12, 0, 0);
        let (_, strips) = zone_strips(&[zone("UTC"), zone("Europe/Paris")], &instant);
        // 01:00Z is when Paris returns from 03:00 CEST to 02:00 CET
        assert_eq!(strips[1].cells[1].marker, Some(Marker::DstEnd));
        assert_eq!(strips[1].cells[0].local.hour(), 2);
        assert_eq!(strips[1].cells[1].local.hour(), 2);
        assert!(is_dst(&strips[1].cells[0].local));
        assert!(!is_dst(&strips[1].cells[1].local));
    }

    #[test]
    fn test_fractional_offsets_share_columns() {
        let instant = utc(2017, 11, 5, 0, 29, 2);
        let zones = [zone("UTC"), zone("Asia/Kolkata"), zone("Australia/Eucla")];
        let (alignment, strips) = zone_strips(&zones, &instant);
        assert_eq!(alignment.cursor_column, 0);

        let kolkata = &strips[1];
        assert_eq!(kolkata.cells[0].local.format("%H:%M").to_string(), "05:30");
        assert_eq!(hours(&kolkata)[..3], [5, 6, 7]);
        assert_eq!(kolkata.markers().len(), 1);
        assert_eq!(kolkata.markers()[0].0, 19);

        let eucla = &strips[2];
        assert_eq!(eucla.cells[0].local.format("%H:%M").to_string(), "08:45");
        assert_eq!(eucla.markers()[0].0, 16);

        for column in 0..HOURS_PER_STRIP {
            let utc_instant = strips[0].cells[column].local;
            assert_eq!(kolkata.cells[column].local, utc_instant);
            assert_eq!(eucla.cells[column].local, utc_instant);
        }
    }

    #[test]
    fn test_date_change_at_midnight_column() {
        let instant = utc(2017, 11, 5, 0, 29, 2);
        let (_, strips) = zone_strips(&[zone("UTC"), zone("Europe/Paris")], &instant);
        assert_eq!(
            strips[0].markers(),
            vec![(0, Marker::DateChange(NaiveDate::from_ymd_opt(2017, 11, 5).unwrap()))]
        );
        let mut expected: Vec<u32> = (1..=23).collect();
        expected.push(0);
        assert_eq!(hours(&strips[1]), expected);
        assert_eq!(strips[1].markers()[0].0, 23);
    }

    const ZONES: [&str; 8] = [
        "UTC",
        "Europe/Paris",
        "Asia/Kolkata",
        "Australia/Eucla",
        "America/Havana",
        "Australia/Lord_Howe",
        "America/St_Johns",
        "Pacific/Chatham",
    ];

    proptest! {
        #[test]
        fn test_cursor_cell_holds_instant(
            seconds in 0i64..2_000_000_000i64,
            reference in prop::sample::select(ZONES.to_vec()),
            other in prop::sample::select(ZONES.to_vec()),
        ) {
            let instant = DateTime::from_timestamp(seconds, 0).unwrap().with_timezone(&Tz::UTC);
            let zones = [zone(reference), zone(other)];
            let (alignment, strips) = zone_strips(&zones, &instant);
            prop_assert!(alignment.cursor_column < HOURS_PER_STRIP);
            for strip in &strips {
                prop_assert_eq!(strip.cells.len(), HOURS_PER_STRIP);
                let cursor = strip.cells[alignment.cursor_column].local;
                prop_assert!(cursor <= instant);
                prop_assert!(instant - cursor < Duration::hours(1));
            }
        }
    }
}
