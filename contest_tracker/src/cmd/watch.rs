use crate::modules::tracker::{
    command::{parse_answer, Command, HELP},
    notification::{notify_all, NotificationPermission, PermissionMode, TerminalNotifier},
    render::{render, View},
    state::{AppState, Effect, Event},
    storage::LocalStorage,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use contest_tracker_libs::{shift_to_ist, Contest};
use minify_html::{minify, Cfg};
use reqwest::{Client, Url};
use std::{env, path::PathBuf};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
    sync::mpsc::{self, Receiver, Sender},
    time::{self, Duration},
};

const DEFAULT_AGGREGATOR_URL: &str = "http://localhost:5000/api/contests";
const DEFAULT_REGISTRATION_STORE: &str = "registrations.json";

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Aggregator endpoint [default: $AGGREGATOR_URL or http://localhost:5000/api/contests]
    #[arg(long)]
    url: Option<String>,
    /// Registration flag file [default: $REGISTRATION_STORE or registrations.json]
    #[arg(long)]
    storage: Option<PathBuf>,
    /// Seconds between two polls
    #[arg(long, default_value_t = 300)]
    interval: u64,
    /// Also write the rendered page to this HTML file
    #[arg(long)]
    html: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = PermissionMode::Ask)]
    notifications: PermissionMode,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let url = args
        .url
        .or_else(|| env::var("AGGREGATOR_URL").ok())
        .unwrap_or_else(|| String::from(DEFAULT_AGGREGATOR_URL));
    let url = Url::parse(&url).with_context(|| {
        let message = format!("invalid aggregator url `{}`", url);
        tracing::error!(message);
        message
    })?;

    let storage_path = args
        .storage
        .or_else(|| env::var("REGISTRATION_STORE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRATION_STORE));
    let storage = LocalStorage::open(&storage_path).await.with_context(|| {
        let message = format!("couldn't open registration store {}", storage_path.display());
        tracing::error!(message);
        message
    })?;

    let client = Client::builder()
        .gzip(true)
        .timeout(Duration::from_secs(10))
        .build()?;

    let (event_tx, event_rx) = mpsc::channel::<Event>(8);
    let (refresh_tx, refresh_rx) = mpsc::channel::<()>(1);
    let period = Duration::from_secs(args.interval.max(1));
    tracing::info!("Polling {} every {} seconds", url, period.as_secs());
    let poller = tokio::spawn(poll(client, url, period, event_tx, refresh_rx));

    let shell = Shell::new(
        storage,
        args.notifications,
        Box::new(BrowserOpener),
        args.html,
    );
    println!("{}", HELP);
    shell.prompt_permission();

    let lines = BufReader::new(tokio::io::stdin()).lines();
    drive(shell, lines, event_rx, refresh_tx).await;

    poller.abort();
    tracing::info!("Stop watching contests.");

    Ok(())
}

/// Run until `quit`, Ctrl+C, or until both stdin and the poller are gone.
///
/// A closed stdin only stops reading commands. Polling and rendering go on.
async fn drive<R>(
    mut shell: Shell,
    mut lines: Lines<R>,
    mut events: Receiver<Event>,
    refresh: Sender<()>,
) -> Shell
where
    R: AsyncBufRead + Unpin,
{
    let mut input_open = true;
    let mut events_open = true;

    while input_open || events_open {
        tokio::select! {
            event = events.recv(), if events_open => match event {
                Some(event) => shell.dispatch(event).await,
                None => events_open = false,
            },
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => match shell.handle_line(&line).await {
                    LineOutcome::Continue => {}
                    LineOutcome::Refresh => {
                        // a poll is already queued when the slot is taken
                        let _ = refresh.try_send(());
                    }
                    LineOutcome::Quit => break,
                },
                Ok(None) => {
                    tracing::info!("stdin closed, polling continues until interrupted");
                    shell.close_input();
                    input_open = false;
                }
                Err(e) => {
                    tracing::error!("failed to read stdin: {:?}", e);
                    shell.close_input();
                    input_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    shell
}

/// Fetch immediately, then on every tick or refresh request. Failures never stop the loop.
async fn poll(
    client: Client,
    url: Url,
    period: Duration,
    events: Sender<Event>,
    mut refresh: Receiver<()>,
) {
    let mut interval = time::interval(period);
    loop {
        tokio::select! {
            _ = interval.tick() => {},
            Some(()) = refresh.recv() => {},
        }

        let event = match fetch_contests(&client, &url).await {
            Ok(contests) => {
                tracing::info!("{} contests fetched.", contests.len());
                Event::Loaded(contests)
            }
            Err(e) => Event::LoadFailed(format!("{:#}", e)),
        };

        if events.send(event).await.is_err() {
            break;
        }
    }
}

async fn fetch_contests(client: &Client, url: &Url) -> Result<Vec<Contest>> {
    let contests = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<Contest>>()
        .await?;

    Ok(contests)
}

/// Current time on the clock the aggregator uses for `start`.
fn ist_now() -> DateTime<Utc> {
    shift_to_ist(Utc::now())
}

pub trait LinkOpener {
    fn open(&self, href: &str);
}

pub struct BrowserOpener;

impl LinkOpener for BrowserOpener {
    fn open(&self, href: &str) {
        if let Err(e) = open::that_detached(href) {
            tracing::warn!("couldn't open browser for {}: {:?}", href, e);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Refresh,
    Quit,
}

struct Shell {
    state: AppState,
    storage: LocalStorage,
    notifier: TerminalNotifier,
    opener: Box<dyn LinkOpener>,
    html: Option<PathBuf>,
    /// The notification prompt is on screen.
    awaiting_permission: bool,
    /// Contest whose yes/no prompt is on screen.
    confirming: Option<i64>,
}

impl Shell {
    /// With `PermissionMode::Ask` the permission stays `Default` until the prompt is answered.
    fn new(
        storage: LocalStorage,
        mode: PermissionMode,
        opener: Box<dyn LinkOpener>,
        html: Option<PathBuf>,
    ) -> Self {
        let permission = match mode {
            PermissionMode::Granted => NotificationPermission::Granted,
            PermissionMode::Denied => NotificationPermission::Denied,
            PermissionMode::Ask => NotificationPermission::Default,
        };

        Self {
            state: AppState::default(),
            storage,
            notifier: TerminalNotifier::new(permission),
            opener,
            html,
            awaiting_permission: mode == PermissionMode::Ask,
            confirming: None,
        }
    }

    fn prompt_permission(&self) {
        if self.awaiting_permission {
            println!("Allow notifications for contests starting within an hour? [y/N]");
        }
    }

    /// Unanswered prompts are dropped. The permission keeps its current value.
    fn close_input(&mut self) {
        self.awaiting_permission = false;
        self.confirming = None;
    }

    async fn handle_line(&mut self, line: &str) -> LineOutcome {
        if self.awaiting_permission {
            self.awaiting_permission = false;
            let permission = if parse_answer(line) {
                NotificationPermission::Granted
            } else {
                NotificationPermission::Denied
            };
            tracing::info!("notification permission: {:?}", permission);
            self.notifier = TerminalNotifier::new(permission);
            return LineOutcome::Continue;
        }

        if let Some(contest_id) = self.confirming.take() {
            let registered = parse_answer(line);
            self.dispatch(Event::RegistrationAnswered {
                contest_id,
                registered,
            })
            .await;
            return LineOutcome::Continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => LineOutcome::Quit,
            Ok(Command::Help) => {
                println!("{}", HELP);
                LineOutcome::Continue
            }
            Ok(Command::Refresh) => LineOutcome::Refresh,
            Ok(command) => {
                if let Some(event) = command.into_event() {
                    self.dispatch(event).await;
                }
                LineOutcome::Continue
            }
            Err(e) => {
                eprintln!("{}", e);
                LineOutcome::Continue
            }
        }
    }

    async fn dispatch(&mut self, event: Event) {
        for effect in self.state.reduce(event) {
            match effect {
                Effect::Render => self.render().await,
                Effect::OpenLink(href) => {
                    println!("Opening {}", href);
                    self.opener.open(&href);
                    println!("Press Enter when you are back.");
                }
                Effect::ConfirmRegistration(contest_id) => {
                    let name = self
                        .state
                        .contest(contest_id)
                        .map(|contest| contest.event.clone())
                        .unwrap_or_else(|| format!("contest #{}", contest_id));
                    println!("Did you register for {}? [y/N]", name);
                    self.confirming = Some(contest_id);
                }
                Effect::StoreFlag { contest_id, flag } => {
                    if let Err(e) = self.storage.set_flag(contest_id, flag).await {
                        tracing::error!("failed to save registration of {}: {:?}", contest_id, e);
                    }
                }
            }
        }
    }

    async fn render(&self) {
        let view = render(&self.state, &self.storage, ist_now());
        notify_all(&self.notifier, &view.notifications);
        println!("{}", view);

        if let Some(path) = &self.html {
            if let Err(e) = tokio::fs::write(path, minify_page(&view)).await {
                tracing::error!("failed to write {}: {:?}", path.display(), e);
            }
        }
    }
}

fn minify_page(view: &View) -> Vec<u8> {
    let config = Cfg {
        do_not_minify_doctype: true,
        ensure_spec_compliant_unquoted_attribute_values: true,
        keep_closing_tags: true,
        keep_html_and_head_opening_tags: true,
        keep_spaces_between_attributes: false,
        keep_comments: false,
        minify_css: true,
        minify_js: false,
        remove_bangs: false,
        remove_processing_instructions: false,
        minify_css_level_1: true,
        minify_css_level_2: false,
        minify_css_level_3: false,
    };

    minify(view.to_html().as_bytes(), &config)
}
