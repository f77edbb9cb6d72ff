use crate::modules::tracker::storage::RegistrationFlag;
use contest_tracker_libs::{Contest, PlatformFilter};
use std::fmt;

pub const BACKEND_ERROR: &str = "Backend error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A poll succeeded. The list replaces the previous one.
    Loaded(Vec<Contest>),
    LoadFailed(String),
    FilterSelected(PlatformFilter),
    ThemeToggled,
    RegisterClicked(i64),
    /// The user came back to the tracker.
    WindowFocused,
    RegistrationAnswered { contest_id: i64, registered: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Render,
    OpenLink(String),
    ConfirmRegistration(i64),
    StoreFlag {
        contest_id: i64,
        flag: RegistrationFlag,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub contests: Vec<Contest>,
    pub filter: PlatformFilter,
    pub theme: Theme,
    /// Contest whose registration page was opened last and not yet confirmed.
    pub pending_registration: Option<i64>,
    pub error: Option<String>,
}

impl AppState {
    pub fn contest(&self, contest_id: i64) -> Option<&Contest> {
        self.contests.iter().find(|contest| contest.id == contest_id)
    }

    pub fn reduce(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Loaded(contests) => {
                self.contests = contests;
                self.error = None;
                vec![Effect::Render]
            }
            Event::LoadFailed(reason) => {
                tracing::error!("failed to load contests: {}", reason);
                self.error = Some(String::from(BACKEND_ERROR));
                vec![Effect::Render]
            }
            Event::FilterSelected(filter) => {
                self.filter = filter;
                vec![Effect::Render]
            }
            Event::ThemeToggled => {
                self.theme = self.theme.toggled();
                vec![Effect::Render]
            }
            Event::RegisterClicked(contest_id) => match self.contest(contest_id) {
                Some(contest) => {
                    let href = contest.href.clone();
                    self.pending_registration = Some(contest_id);
                    vec![Effect::OpenLink(href)]
                }
                None => {
                    tracing::warn!("contest {} is not in the current list", contest_id);
                    vec![]
                }
            },
            Event::WindowFocused => match self.pending_registration.take() {
                Some(contest_id) => vec![Effect::ConfirmRegistration(contest_id)],
                None => vec![],
            },
            Event::RegistrationAnswered {
                contest_id,
                registered,
            } => {
                let flag = if registered {
                    RegistrationFlag::Yes
                } else {
                    RegistrationFlag::No
                };
                vec![Effect::StoreFlag { contest_id, flag }, Effect::Render]
            }
        }
    }
}
