use crate::{
    clist::model::{IsoMillis, UpstreamContest},
    platform::{classify, Platform},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Offset between UTC and Indian Standard Time.
pub const IST_OFFSET_MINUTES: i64 = 5 * 60 + 30;

/// Contest record served by the aggregator.
///
/// `start` is the upstream instant moved forward by the IST offset and still
/// labelled as UTC, so it reads as IST wall-clock time.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub id: i64,
    pub event: String,
    #[serde_as(as = "IsoMillis")]
    pub start: DateTime<Utc>,
    pub href: String,
    pub platform: Platform,
}

pub fn shift_to_ist(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp + Duration::minutes(IST_OFFSET_MINUTES)
}

/// Filter, order and shift upstream contests.
///
/// Entries classified as `Other` are dropped. The remaining entries are ordered by
/// their raw start time (ties keep upstream order) and shifted exactly once.
pub fn aggregate(upstream: Vec<UpstreamContest>) -> Vec<Contest> {
    let mut classified: Vec<(Platform, UpstreamContest)> = upstream
        .into_iter()
        .map(|contest| (classify(contest.resource_name(), &contest.event), contest))
        .filter(|(platform, _)| platform.is_recognized())
        .collect();

    classified.sort_by_key(|(_, contest)| contest.start);

    classified
        .into_iter()
        .map(|(platform, contest)| Contest {
            id: contest.id,
            event: contest.event,
            start: shift_to_ist(contest.start),
            href: contest.href,
            platform,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clist::model::Resource;
    use chrono::TimeZone;

    fn upstream(id: i64, resource: Option<&str>, event: &str, start: &str) -> UpstreamContest {
        UpstreamContest {
            id,
            event: event.to_string(),
            start: DateTime::parse_from_rfc3339(start)
                .unwrap()
                .with_timezone(&Utc),
            href: format!("https://example.com/{}", id),
            resource: resource.map(|name| Resource::Name(name.to_string())),
        }
    }

    fn sample() -> Vec<UpstreamContest> {
        vec![
            upstream(1, Some("leetcode.com"), "Weekly Contest 410", "2024-08-04T02:30:00Z"),
            upstream(2, Some("HackerRank"), "Anything", "2024-08-01T00:00:00Z"),
            upstream(3, Some("atcoder.jp"), "AtCoder Beginner Contest 365", "2024-08-03T12:00:00Z"),
            upstream(4, None, "Starters 147", "2024-08-02T14:30:00Z"),
            upstream(5, Some("codechef.com"), "Starters 147", "2024-08-07T14:30:00Z"),
            upstream(6, Some("codeforces.com"), "Codeforces Round 962 (Div. 3)", "2024-08-03T12:00:00Z"),
        ]
    }

    #[test]
    fn drop_unrecognized_platforms() {
        let contests = aggregate(sample());

        assert_eq!(contests.len(), 4);
        assert!(contests.iter().all(|c| c.platform.is_recognized()));
        assert!(contests.iter().all(|c| c.id != 2 && c.id != 4));
    }

    #[test]
    fn order_by_start() {
        let contests = aggregate(sample());

        assert!(contests.windows(2).all(|pair| pair[0].start <= pair[1].start));
        // equal start times keep upstream order
        let ids: Vec<i64> = contests.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 6, 1, 5]);
    }

    #[test]
    fn shift_applied_once() {
        let contests = aggregate(sample());
        let leetcode = contests.iter().find(|c| c.id == 1).unwrap();

        assert_eq!(
            leetcode.start,
            Utc.with_ymd_and_hms(2024, 8, 4, 8, 0, 0).unwrap()
        );
        assert_eq!(leetcode.platform, Platform::LeetCode);
    }

    #[test]
    fn shift_crosses_midnight() {
        let start = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        assert_eq!(
            shift_to_ist(start),
            Utc.with_ymd_and_hms(2025, 1, 1, 1, 30, 0).unwrap()
        );
    }

    #[test]
    fn serialize_wire_format() {
        let contest = Contest {
            id: 42,
            event: String::from("Weekly Contest 410"),
            start: shift_to_ist(Utc.with_ymd_and_hms(2024, 8, 4, 2, 30, 0).unwrap()),
            href: String::from("https://leetcode.com/contest/weekly-contest-410"),
            platform: Platform::LeetCode,
        };

        let expected = String::from(
            r#"{"id":42,"event":"Weekly Contest 410","start":"2024-08-04T08:00:00.000Z","href":"https://leetcode.com/contest/weekly-contest-410","platform":"LeetCode"}"#,
        );
        assert_eq!(expected, serde_json::to_string(&contest).unwrap());
    }

    #[test]
    fn formatted_start_parses_back_to_shifted_instant() {
        let original = Utc.with_ymd_and_hms(2024, 1, 15, 14, 35, 0).unwrap();
        let contest = Contest {
            id: 1,
            event: String::from("Codeforces Round 920 (Div. 3)"),
            start: shift_to_ist(original),
            href: String::from("https://codeforces.com/contests/1921"),
            platform: Platform::Codeforces,
        };

        let json = serde_json::to_string(&contest).unwrap();
        let parsed: Contest = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, contest);
        assert_eq!(parsed.start - original, Duration::minutes(330));
    }
}
