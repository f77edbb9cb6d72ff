use crate::modules::tracker::render::Notification;
use clap::ValueEnum;

/// Mirrors the browser permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Never answered. Notifications are not shown.
    Default,
    Granted,
    Denied,
}

/// How the permission is obtained at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionMode {
    Ask,
    Granted,
    Denied,
}

pub trait Notifier {
    fn permission(&self) -> NotificationPermission;
    fn show(&self, notification: &Notification);
}

/// Show every notification if permission was granted. Returns how many were shown.
pub fn notify_all(notifier: &impl Notifier, notifications: &[Notification]) -> usize {
    if notifier.permission() != NotificationPermission::Granted {
        return 0;
    }

    for notification in notifications {
        notifier.show(notification);
    }
    notifications.len()
}

pub struct TerminalNotifier {
    permission: NotificationPermission,
}

impl TerminalNotifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn show(&self, notification: &Notification) {
        tracing::info!(target: "notification", "{}", notification.title);
        // BEL so the terminal raises an alert
        eprintln!("\x07>> {}\n   {}", notification.title, notification.body);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    struct RecordingNotifier {
        permission: NotificationPermission,
        shown: RefCell<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new(permission: NotificationPermission) -> Self {
            Self {
                permission,
                shown: RefCell::new(vec![]),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> NotificationPermission {
            self.permission
        }

        fn show(&self, notification: &Notification) {
            self.shown.borrow_mut().push(notification.title.clone());
        }
    }

    fn notifications() -> Vec<Notification> {
        vec![Notification {
            title: String::from("Contest starting soon: Weekly Contest 410"),
            body: String::from("Platform: LeetCode | Starts at: 4/8/2024, 8:00:00 AM"),
        }]
    }

    #[test]
    fn show_when_granted() {
        let notifier = RecordingNotifier::new(NotificationPermission::Granted);

        assert_eq!(notify_all(&notifier, &notifications()), 1);
        assert_eq!(
            notifier.shown.borrow().as_slice(),
            ["Contest starting soon: Weekly Contest 410"]
        );
    }

    #[test]
    fn skip_silently_otherwise() {
        for permission in [NotificationPermission::Denied, NotificationPermission::Default] {
            let notifier = RecordingNotifier::new(permission);

            assert_eq!(notify_all(&notifier, &notifications()), 0);
            assert!(notifier.shown.borrow().is_empty());
        }
    }
}
