use std::collections::HashMap;

use chrono::{DateTime, Local};
use oqee_client::types::{Channel, EpgBucket};
use serde::Serialize;

use crate::services::catalog::{channel_order, CatalogIndex};
use crate::services::timespec::format_local;

const BUCKET_SECONDS: i64 = 3600;

/// Epoch second of the hourly upstream bucket covering `instant`.
pub fn bucket_start(instant: DateTime<Local>) -> i64 {
    let seconds = instant.timestamp();
    seconds - seconds.rem_euclid(BUCKET_SECONDS)
}

/// One guide row per catalog channel. Rows always carry all eight fields;
/// absent program data serializes as null rather than dropping the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideRow {
    pub lcn: Option<u32>,
    pub channel: String,
    pub current_program: Option<String>,
    pub current_start: Option<String>,
    pub current_end: Option<String>,
    pub next_program: Option<String>,
    pub next_start: Option<String>,
    pub next_end: Option<String>,
}

/// Merges the channel map, the number index, and one guide bucket into
/// now/next rows for `instant`.
///
/// Programs that ended before `instant` are dropped; the first survivor is
/// the current program and the second the next one. Every channel in
/// `raw_channels` yields exactly one row, sorted by logical number with
/// numberless channels last.
pub fn aggregate(
    instant: DateTime<Local>,
    index: &CatalogIndex,
    raw_channels: &HashMap<String, Channel>,
    bucket: &EpgBucket,
) -> Vec<GuideRow> {
    let cutoff = instant.timestamp();

    let mut entries: Vec<(&String, &Channel)> = raw_channels.iter().collect();
    entries.sort_by_cached_key(|(id, _)| channel_order(id));

    let mut rows = Vec::with_capacity(entries.len());
    for (id, raw) in entries {
        let mut upcoming = bucket
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.live.as_ref())
            .filter(|live| live.end >= cutoff);
        let current = upcoming.next();
        let next = upcoming.next();

        rows.push(GuideRow {
            lcn: index.number_of(id),
            channel: index.name_of(id).unwrap_or(raw.name.as_str()).to_string(),
            current_program: current.map(|live| live.title.clone()),
            current_start: current.and_then(|live| format_local(live.start, "%H:%M")),
            current_end: current.and_then(|live| format_local(live.end, "%H:%M")),
            next_program: next.map(|live| live.title.clone()),
            next_start: next.and_then(|live| format_local(live.start, "%H:%M")),
            next_end: next.and_then(|live| format_local(live.end, "%H:%M")),
        });
    }

    rows.sort_by_key(|row| (row.lcn.is_none(), row.lcn));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use oqee_client::types::{ChannelListEntry, EpgEntry, LiveProgram};

    const CUTOFF: i64 = 1_700_000_000;

    fn instant() -> DateTime<Local> {
        Local
            .timestamp_opt(CUTOFF, 0)
            .single()
            .expect("epoch maps to a local instant")
    }

    fn channel(id: &str, name: &str) -> (String, Channel) {
        (
            id.to_string(),
            Channel {
                id: id.to_string(),
                name: name.to_string(),
            },
        )
    }

    fn program(title: &str, start: i64, end: i64) -> EpgEntry {
        EpgEntry {
            live: Some(LiveProgram {
                title: title.to_string(),
                start,
                end,
            }),
        }
    }

    fn catalog(entries: &[(&str, Option<u32>)]) -> (HashMap<String, Channel>, CatalogIndex) {
        let channels: HashMap<String, Channel> = entries
            .iter()
            .map(|(id, _)| channel(id, &format!("Channel {id}")))
            .collect();
        let list: Vec<ChannelListEntry> = entries
            .iter()
            .map(|(id, number)| ChannelListEntry {
                channel_id: (*id).to_string(),
                number: *number,
            })
            .collect();
        let index = CatalogIndex::build(&channels, &list);
        (channels, index)
    }

    #[test]
    fn bucket_start_floors_to_the_hourly_grid() {
        let start = bucket_start(instant());
        assert_eq!(start % 3600, 0);
        let offset = CUTOFF - start;
        assert!((0..3600).contains(&offset), "offset was {offset}");

        let aligned = Local
            .timestamp_opt(start, 0)
            .single()
            .expect("bucket boundary maps to a local instant");
        assert_eq!(bucket_start(aligned), start);
    }

    #[test]
    fn every_channel_yields_exactly_one_row() {
        let (channels, index) = catalog(&[("1", Some(1)), ("2", Some(2)), ("3", Some(3))]);
        let mut bucket = EpgBucket::new();
        bucket.insert(
            "1".to_string(),
            vec![program("JT", CUTOFF - 600, CUTOFF + 600)],
        );

        let rows = aggregate(instant(), &index, &channels, &bucket);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].current_program.as_deref(), Some("JT"));
        for row in &rows[1..] {
            assert_eq!(row.current_program, None);
            assert_eq!(row.next_program, None);
        }
    }

    #[test]
    fn finished_programs_are_skipped_in_order() {
        let (channels, index) = catalog(&[("1", Some(1)), ("2", Some(2))]);
        let mut bucket = EpgBucket::new();
        bucket.insert(
            "1".to_string(),
            vec![
                program("Finished", CUTOFF - 3600, CUTOFF - 60),
                program("Running", CUTOFF - 600, CUTOFF + 600),
                program("Upcoming", CUTOFF + 600, CUTOFF + 1200),
                program("Later", CUTOFF + 1200, CUTOFF + 1800),
            ],
        );
        // A program ending exactly at the instant still counts as current.
        bucket.insert(
            "2".to_string(),
            vec![program("Boundary", CUTOFF - 1800, CUTOFF)],
        );

        let rows = aggregate(instant(), &index, &channels, &bucket);

        assert_eq!(rows[0].current_program.as_deref(), Some("Running"));
        assert_eq!(rows[0].next_program.as_deref(), Some("Upcoming"));
        assert_eq!(rows[1].current_program.as_deref(), Some("Boundary"));
        assert_eq!(rows[1].next_program, None);
    }

    #[test]
    fn entries_without_live_data_are_ignored() {
        let (channels, index) = catalog(&[("1", Some(1))]);
        let mut bucket = EpgBucket::new();
        bucket.insert(
            "1".to_string(),
            vec![
                EpgEntry { live: None },
                program("Running", CUTOFF - 600, CUTOFF + 600),
            ],
        );

        let rows = aggregate(instant(), &index, &channels, &bucket);
        assert_eq!(rows[0].current_program.as_deref(), Some("Running"));
    }

    #[test]
    fn rows_without_numbers_sort_last() {
        let (channels, index) = catalog(&[("9", None), ("1", Some(12)), ("2", Some(3))]);
        let rows = aggregate(instant(), &index, &channels, &EpgBucket::new());

        let lcns: Vec<Option<u32>> = rows.iter().map(|row| row.lcn).collect();
        assert_eq!(lcns, vec![Some(3), Some(12), None]);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let (channels, index) = catalog(&[("1", Some(1)), ("2", None), ("3", Some(2))]);
        let mut bucket = EpgBucket::new();
        bucket.insert(
            "3".to_string(),
            vec![program("Film", CUTOFF - 60, CUTOFF + 5400)],
        );

        let first = aggregate(instant(), &index, &channels, &bucket);
        let second = aggregate(instant(), &index, &channels, &bucket);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_channels_keep_their_raw_name() {
        let (_, index) = catalog(&[("1", Some(1))]);
        let raw: HashMap<String, Channel> =
            [channel("1", "ignored"), channel("77", "Ciné Pop")].into_iter().collect();

        let rows = aggregate(instant(), &index, &raw, &EpgBucket::new());

        assert_eq!(rows[0].channel, "Channel 1");
        assert_eq!(rows[1].channel, "Ciné Pop");
        assert_eq!(rows[1].lcn, None);
    }

    #[test]
    fn rows_serialize_all_eight_fields() {
        let (channels, index) = catalog(&[("1", None)]);
        let rows = aggregate(instant(), &index, &channels, &EpgBucket::new());

        let value = serde_json::to_value(&rows[0]).expect("row serializes");
        let object = value.as_object().expect("row is an object");
        assert_eq!(object.len(), 8);
        assert!(object["current_program"].is_null());
        assert!(object["lcn"].is_null());
        assert_eq!(object["channel"], "Channel 1");
    }

    #[test]
    fn times_render_as_hour_minute() {
        let (channels, index) = catalog(&[("1", Some(1))]);
        let mut bucket = EpgBucket::new();
        bucket.insert(
            "1".to_string(),
            vec![program("JT", CUTOFF - 60, CUTOFF + 60)],
        );

        let rows = aggregate(instant(), &index, &channels, &bucket);
        let start = rows[0].current_start.as_deref().expect("start rendered");
        assert_eq!(start.len(), 5);
        assert_eq!(start.as_bytes()[2], b':');
    }
}
