use crate::modules::tracker::{
    state::{AppState, Theme},
    storage::{LocalStorage, RegistrationFlag},
};
use chrono::{DateTime, Duration, Utc};
use contest_tracker_libs::{Platform, PlatformFilter};
use itertools::Itertools;
use std::fmt::{self, Write};

const NOTIFY_WITHIN_SECONDS: i64 = 3600;

pub const NO_CONTESTS: &str = "No upcoming contests.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Registered,
    NotRegistered,
    Upcoming,
}

impl Status {
    fn from_flag(flag: Option<RegistrationFlag>) -> Self {
        match flag {
            Some(RegistrationFlag::Yes) => Status::Registered,
            Some(RegistrationFlag::No) => Status::NotRegistered,
            None => Status::Upcoming,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Registered => "Registered",
            Status::NotRegistered => "Not Registered",
            Status::Upcoming => "Upcoming",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Status::Registered => "status-registered",
            Status::NotRegistered => "status-not-registered",
            Status::Upcoming => "status-upcoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub contest_id: i64,
    pub platform: Platform,
    pub status: Status,
    pub event: String,
    pub start: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Error(String),
    Empty,
    Cards(Vec<Card>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub theme: Theme,
    pub filter: PlatformFilter,
    pub body: Body,
    /// Contests starting within the hour. Produced on every render.
    pub notifications: Vec<Notification>,
}

pub fn format_start(start: &DateTime<Utc>) -> String {
    start.format("%-d/%-m/%Y, %-I:%M:%S %p").to_string()
}

/// Build the view of `state`.
///
/// `now` must be on the same clock as the contest start times, i.e. shifted to IST.
pub fn render(state: &AppState, storage: &LocalStorage, now: DateTime<Utc>) -> View {
    if let Some(error) = &state.error {
        return View {
            theme: state.theme,
            filter: state.filter,
            body: Body::Error(error.clone()),
            notifications: vec![],
        };
    }

    let visible = state
        .contests
        .iter()
        .filter(|contest| state.filter.matches(contest.platform))
        .sorted_by_key(|contest| contest.start)
        .collect_vec();

    let notifications = visible
        .iter()
        .filter(|contest| {
            let remaining = contest.start - now;
            remaining > Duration::zero() && remaining <= Duration::seconds(NOTIFY_WITHIN_SECONDS)
        })
        .map(|contest| Notification {
            title: format!("Contest starting soon: {}", contest.event),
            body: format!(
                "Platform: {} | Starts at: {}",
                contest.platform,
                format_start(&contest.start)
            ),
        })
        .collect_vec();

    let body = if visible.is_empty() {
        Body::Empty
    } else {
        Body::Cards(
            visible
                .iter()
                .map(|contest| Card {
                    contest_id: contest.id,
                    platform: contest.platform,
                    status: Status::from_flag(storage.flag(contest.id)),
                    event: contest.event.clone(),
                    start: format_start(&contest.start),
                    href: contest.href.clone(),
                })
                .collect(),
        )
    };

    View {
        theme: state.theme,
        filter: state.filter,
        body,
        notifications,
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "== Upcoming contests [{}] ({} theme) ==", self.filter, self.theme)?;
        match &self.body {
            Body::Error(message) => writeln!(f, "{}", message),
            Body::Empty => writeln!(f, "{}", NO_CONTESTS),
            Body::Cards(cards) => {
                for card in cards {
                    writeln!(
                        f,
                        "#{:<8} {:<10} {:<14} {}",
                        card.contest_id,
                        card.platform.to_string(),
                        card.status.label(),
                        card.event
                    )?;
                    writeln!(f, "          {}  {}", card.start, card.href)?;
                }
                Ok(())
            }
        }
    }
}

const STYLE: &str = r#"
body { font-family: sans-serif; background: #121212; color: #eee; }
body.light { background: #fafafa; color: #222; }
.contest-card { border: 1px solid #444; border-radius: 8px; margin: 8px; padding: 12px; }
.contest-header { display: flex; justify-content: space-between; }
.status-registered { color: #2e7d32; }
.status-not-registered { color: #c62828; }
.status-upcoming { color: #f9a825; }
"#;

impl View {
    /// Full HTML document for the current view.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let body_class = match self.theme {
            Theme::Light => " class=\"light\"",
            Theme::Dark => "",
        };

        // writing into a String never fails
        let _ = write!(
            html,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Contest Tracker</title><style>{}</style></head><body{}>",
            STYLE, body_class
        );
        let _ = write!(
            html,
            "<h1>Upcoming contests</h1><p class=\"filter\">Filter: {}</p><div id=\"contests\">",
            self.filter
        );

        match &self.body {
            Body::Error(message) => {
                let _ = write!(html, "<p class=\"error\">{}</p>", escape_html(message));
            }
            Body::Empty => {
                let _ = write!(html, "<p class=\"no-contests\">{}</p>", NO_CONTESTS);
            }
            Body::Cards(cards) => {
                for card in cards {
                    let _ = write!(
                        html,
                        concat!(
                            "<div class=\"contest-card\" data-id=\"{id}\">",
                            "<div class=\"contest-header\">",
                            "<span class=\"contest-platform\">{platform}</span>",
                            "<span class=\"contest-status {class}\">{label}</span>",
                            "</div>",
                            "<div class=\"contest-name\">{event}</div>",
                            "<div class=\"contest-details\">",
                            "<div class=\"detail-row\">{start}</div>",
                            "<div class=\"detail-row\"><a href=\"{href}\" target=\"_blank\" class=\"register-link\">Register</a></div>",
                            "</div></div>"
                        ),
                        id = card.contest_id,
                        platform = card.platform,
                        class = card.status.class(),
                        label = card.status.label(),
                        event = escape_html(&card.event),
                        start = card.start,
                        href = escape_html(&card.href),
                    );
                }
            }
        }

        html.push_str("</div></body></html>");
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::modules::tracker::state::Event;
    use chrono::TimeZone;
    use contest_tracker_libs::Contest;
    use scraper::{Html, Selector};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 3, 12, 0, 0).unwrap()
    }

    fn contest(id: i64, platform: Platform, start: DateTime<Utc>) -> Contest {
        Contest {
            id,
            event: format!("Contest {}", id),
            start,
            href: format!("https://example.com/{}", id),
            platform,
        }
    }

    fn state_with(contests: Vec<Contest>) -> AppState {
        let mut state = AppState::default();
        state.reduce(Event::Loaded(contests));
        state
    }

    fn cards(view: &View) -> &Vec<Card> {
        match &view.body {
            Body::Cards(cards) => cards,
            other => panic!("expected cards, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn status_from_stored_flag() {
        let state = state_with(vec![
            contest(42, Platform::AtCoder, now() + Duration::days(1)),
            contest(43, Platform::AtCoder, now() + Duration::days(2)),
            contest(44, Platform::AtCoder, now() + Duration::days(3)),
        ]);
        let mut storage = LocalStorage::in_memory();
        storage.set_item("contest_42", "yes").await.unwrap();
        storage.set_item("contest_43", "no").await.unwrap();

        let view = render(&state, &storage, now());
        let statuses: Vec<&str> = cards(&view).iter().map(|c| c.status.label()).collect();

        assert_eq!(statuses, vec!["Registered", "Not Registered", "Upcoming"]);
    }

    #[test]
    fn filter_and_sort() {
        let state = {
            let mut state = state_with(vec![
                contest(1, Platform::LeetCode, now() + Duration::days(3)),
                contest(2, Platform::AtCoder, now() + Duration::days(2)),
                contest(3, Platform::LeetCode, now() + Duration::days(1)),
            ]);
            state.reduce(Event::FilterSelected(PlatformFilter::Only(Platform::LeetCode)));
            state
        };

        let view = render(&state, &LocalStorage::in_memory(), now());
        let ids: Vec<i64> = cards(&view).iter().map(|c| c.contest_id).collect();

        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn empty_selection() {
        let mut state = state_with(vec![contest(1, Platform::LeetCode, now())]);
        state.reduce(Event::FilterSelected(PlatformFilter::Only(Platform::CodeChef)));

        let view = render(&state, &LocalStorage::in_memory(), now());

        assert_eq!(view.body, Body::Empty);
        assert!(view.to_string().contains(NO_CONTESTS));
    }

    #[test]
    fn error_replaces_list() {
        let mut state = state_with(vec![contest(1, Platform::LeetCode, now() + Duration::minutes(10))]);
        state.reduce(Event::LoadFailed(String::from("timeout")));

        let view = render(&state, &LocalStorage::in_memory(), now());

        assert_eq!(view.body, Body::Error(String::from("Backend error")));
        assert!(view.notifications.is_empty());
    }

    #[test]
    fn notify_only_within_the_hour() {
        let state = state_with(vec![
            contest(1, Platform::Codeforces, now() + Duration::minutes(30)),
            contest(2, Platform::Codeforces, now() + Duration::minutes(90)),
            contest(3, Platform::Codeforces, now() - Duration::minutes(1)),
            contest(4, Platform::Codeforces, now() + Duration::minutes(60)),
            contest(5, Platform::Codeforces, now()),
        ]);

        let view = render(&state, &LocalStorage::in_memory(), now());
        let titles: Vec<&str> = view.notifications.iter().map(|n| n.title.as_str()).collect();

        assert_eq!(
            titles,
            vec!["Contest starting soon: Contest 1", "Contest starting soon: Contest 4"]
        );
        assert_eq!(
            view.notifications[0].body,
            "Platform: Codeforces | Starts at: 3/8/2024, 12:30:00 PM"
        );
    }

    #[test]
    fn notify_on_every_render() {
        let state = state_with(vec![contest(1, Platform::CodeChef, now() + Duration::minutes(5))]);
        let storage = LocalStorage::in_memory();

        assert_eq!(render(&state, &storage, now()).notifications.len(), 1);
        assert_eq!(render(&state, &storage, now()).notifications.len(), 1);
    }

    #[test]
    fn notify_respects_filter() {
        let mut state = state_with(vec![contest(1, Platform::CodeChef, now() + Duration::minutes(5))]);
        state.reduce(Event::FilterSelected(PlatformFilter::Only(Platform::AtCoder)));

        let view = render(&state, &LocalStorage::in_memory(), now());

        assert!(view.notifications.is_empty());
    }

    #[test]
    fn localized_start() {
        let start = Utc.with_ymd_and_hms(2024, 8, 4, 8, 0, 0).unwrap();
        assert_eq!(format_start(&start), "4/8/2024, 8:00:00 AM");

        let start = Utc.with_ymd_and_hms(2024, 12, 25, 20, 5, 9).unwrap();
        assert_eq!(format_start(&start), "25/12/2024, 8:05:09 PM");
    }

    #[tokio::test]
    async fn html_cards() {
        let mut state = state_with(vec![
            contest(42, Platform::AtCoder, now() + Duration::days(1)),
            Contest {
                event: String::from("Round <script>"),
                ..contest(43, Platform::LeetCode, now() + Duration::days(2))
            },
        ]);
        state.reduce(Event::ThemeToggled);
        let mut storage = LocalStorage::in_memory();
        storage.set_item("contest_42", "yes").await.unwrap();

        let html = Html::parse_document(&render(&state, &storage, now()).to_html());

        let body = html.select(&Selector::parse("body").unwrap()).next().unwrap();
        assert_eq!(body.value().attr("class"), Some("light"));

        let status = Selector::parse(".contest-card .contest-status").unwrap();
        let statuses: Vec<(String, bool)> = html
            .select(&status)
            .map(|e| {
                (
                    e.text().collect::<String>(),
                    e.value().classes().any(|c| c == "status-registered"),
                )
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                (String::from("Registered"), true),
                (String::from("Upcoming"), false)
            ]
        );

        let names = Selector::parse(".contest-name").unwrap();
        let names: Vec<String> = html.select(&names).map(|e| e.text().collect()).collect();
        assert_eq!(names[1], "Round <script>");

        let link = Selector::parse("a.register-link").unwrap();
        let link = html.select(&link).next().unwrap();
        assert_eq!(link.value().attr("href"), Some("https://example.com/42"));
        assert_eq!(link.value().attr("target"), Some("_blank"));
    }

    #[test]
    fn html_empty_and_error() {
        let state = state_with(vec![]);
        let html = render(&state, &LocalStorage::in_memory(), now()).to_html();
        assert!(html.contains("<p class=\"no-contests\">No upcoming contests.</p>"));

        let mut state = state_with(vec![]);
        state.reduce(Event::LoadFailed(String::from("refused")));
        let html = render(&state, &LocalStorage::in_memory(), now()).to_html();
        assert!(html.contains("<p class=\"error\">Backend error</p>"));
    }
}
