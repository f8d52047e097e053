//! Line-driven front end: turns typed commands into intents and prints what
//! the session publishes.

use std::path::PathBuf;
use std::str::FromStr;

use classroom_core::model::{StudentId, View};
use classroom_core::report::MonthKey;
use services::{
    AppServices, CaptureOutcome, FilePhotoSource, FinishedAttendance, Intent, SessionController,
    SessionError, SessionEvent,
};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::render;

const HELP: &str = "\
commands:
  login | logout
  start                 start taking attendance
  capture [path]        load the class photo (image file)
  skip                  continue to marking without a photo
  toggle <id>           flip a student between present and absent
  all | clear           mark everyone present / reset all marks
  complete              submit attendance
  retry                 save a submission that failed to store
  nav <view>            dashboard, capturing, marking, reports
  dashboard             show today's figures
  report [YYYY-MM]      monthly table
  months                months with recorded attendance
  status | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Start,
    Capture(Option<PathBuf>),
    Skip,
    Toggle(StudentId),
    All,
    Clear,
    Complete,
    Retry,
    Nav(View),
    Dashboard,
    Report(Option<MonthKey>),
    Months,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid argument for `{command}`: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },
}

fn invalid(command: &'static str, err: impl std::fmt::Display) -> ParseCommandError {
    ParseCommandError::InvalidArgument {
        command,
        reason: err.to_string(),
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();
        let command = match name.as_str() {
            "login" => Command::Login,
            "logout" => Command::Logout,
            "start" => Command::Start,
            "capture" => Command::Capture(arg.map(PathBuf::from)),
            "skip" => Command::Skip,
            "toggle" | "t" => {
                let raw = arg.ok_or(ParseCommandError::MissingArgument("toggle"))?;
                Command::Toggle(raw.parse::<StudentId>().map_err(|e| invalid("toggle", e))?)
            }
            "all" => Command::All,
            "clear" => Command::Clear,
            "complete" | "submit" => Command::Complete,
            "retry" => Command::Retry,
            "nav" | "go" => {
                let raw = arg.ok_or(ParseCommandError::MissingArgument("nav"))?;
                Command::Nav(raw.parse::<View>().map_err(|e| invalid("nav", e))?)
            }
            "dashboard" => Command::Dashboard,
            "report" => Command::Report(
                arg.map(str::parse::<MonthKey>)
                    .transpose()
                    .map_err(|e| invalid("report", e))?,
            ),
            "months" => Command::Months,
            "status" | "" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// One interactive session over the app services.
pub struct Console {
    services: AppServices,
    controller: SessionController,
    events: broadcast::Receiver<SessionEvent>,
    default_photo: Option<PathBuf>,
    unsaved: Option<FinishedAttendance>,
}

impl Console {
    /// # Errors
    ///
    /// Returns an error if the roster cannot be loaded.
    pub async fn open(services: AppServices, default_photo: Option<PathBuf>) -> anyhow::Result<Self> {
        let controller = services.workflow().open_session().await?;
        let events = controller.subscribe();
        Ok(Self {
            services,
            controller,
            events,
            default_photo,
            unsaved: None,
        })
    }

    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// A submitted pass that storage rejected, kept for `retry`.
    #[must_use]
    pub fn unsaved(&self) -> Option<&FinishedAttendance> {
        self.unsaved.as_ref()
    }

    #[must_use]
    pub fn greeting(&self) -> String {
        format!(
            "{} attendance ({} students)\n{}",
            self.services.settings().class_name(),
            self.controller.roster().len(),
            render::snapshot(&self.controller.snapshot())
        )
    }

    /// Apply one command and return the text to show.
    ///
    /// # Errors
    ///
    /// Returns an error for capture, storage and report failures. The session
    /// stays usable afterwards.
    pub async fn handle(&mut self, command: Command) -> anyhow::Result<String> {
        let workflow = self.services.workflow();
        let mut notes = String::new();
        let mut warning = String::new();
        match command {
            Command::Login => {
                self.controller.dispatch(Intent::Login);
            }
            Command::Logout => {
                self.controller.dispatch(Intent::Logout);
            }
            Command::Start => {
                workflow.start_attendance(&mut self.controller).await?;
            }
            Command::Capture(path) => {
                let source = path
                    .or_else(|| self.default_photo.clone())
                    .map_or_else(FilePhotoSource::none, FilePhotoSource::new);
                match workflow.capture(&mut self.controller, &source).await? {
                    CaptureOutcome::NoPhoto => notes.push_str("No photo chosen.\n"),
                    CaptureOutcome::Ignored => notes.push_str("Not capturing right now.\n"),
                    CaptureOutcome::Captured(_) => {}
                }
            }
            Command::Skip => {
                self.controller.dispatch(Intent::PhotoCaptured(None));
            }
            Command::Toggle(id) => {
                self.controller.dispatch(Intent::Toggle(id));
            }
            Command::All => {
                self.controller.dispatch(Intent::MarkAllPresent);
            }
            Command::Clear => {
                self.controller.dispatch(Intent::ClearAll);
            }
            Command::Complete => match workflow.complete(&mut self.controller).await {
                Ok(Some(receipt)) => {
                    tracing::debug!(id = receipt.id, "completion stored");
                }
                Ok(None) => {}
                Err(SessionError::Unsaved { finished, source }) => {
                    warning = format!(
                        "Attendance not saved ({source}). Type `retry` to save it again.\n"
                    );
                    self.unsaved = Some(*finished);
                }
                Err(err) => return Err(err.into()),
            },
            Command::Retry => {
                let Some(finished) = self.unsaved.take() else {
                    return Ok("Nothing to retry.\n".to_string());
                };
                return match workflow.record_completion(finished).await {
                    Ok(receipt) => Ok(format!(
                        "Attendance for {} saved: {}\n{}",
                        receipt.date,
                        receipt.summary,
                        self.dashboard().await?
                    )),
                    Err(SessionError::Unsaved { finished, source }) => {
                        self.unsaved = Some(*finished);
                        Ok(format!("Still not saved ({source}). Try `retry` again later.\n"))
                    }
                    Err(err) => Err(err.into()),
                };
            }
            Command::Nav(view) => {
                self.controller.dispatch(Intent::Navigate(view));
            }
            Command::Dashboard => return self.dashboard().await,
            Command::Report(month) => return self.report(month).await,
            Command::Months => {
                let months = self.services.reports().available_months().await?;
                let list: Vec<String> = months.iter().map(ToString::to_string).collect();
                return Ok(if list.is_empty() {
                    "No attendance recorded yet.\n".to_string()
                } else {
                    format!("{}\n", list.join(", "))
                });
            }
            Command::Status => return Ok(render::snapshot(&self.controller.snapshot())),
            Command::Help => return Ok(format!("{HELP}\n")),
            Command::Quit => return Ok(String::new()),
        }
        notes.push_str(&self.drain_events().await?);
        notes.push_str(&warning);
        Ok(notes)
    }

    async fn drain_events(&mut self) -> anyhow::Result<String> {
        let mut latest = None;
        let mut toasts = String::new();
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::StateChanged(snapshot)) => latest = Some(snapshot),
                Ok(SessionEvent::AttendanceCompleted(summary)) => {
                    toasts.push_str(&render::completion(&summary));
                    toasts.push('\n');
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "console fell behind session events");
                }
                Err(_) => break,
            }
        }

        let Some(snapshot) = latest else {
            return Ok(toasts);
        };
        let mut out = render::snapshot(&snapshot);
        match snapshot.view {
            View::Dashboard => out.push_str(&self.dashboard().await?),
            View::Reports => out.push_str(&self.report(None).await?),
            _ => {}
        }
        out.push_str(&toasts);
        Ok(out)
    }

    async fn dashboard(&self) -> anyhow::Result<String> {
        let overview = self.services.reports().dashboard().await?;
        Ok(render::dashboard(
            self.services.settings().teacher_name(),
            &overview,
        ))
    }

    async fn report(&self, month: Option<MonthKey>) -> anyhow::Result<String> {
        let reports = self.services.reports();
        let month = match month {
            Some(month) => month,
            None => reports.default_month().await?,
        };
        let report = reports.monthly_report(month).await?;
        Ok(render::monthly_report(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use classroom_core::model::{
        ClassroomSettings, CompletionSummary, HistoricalSession, StudentHistory,
    };
    use classroom_core::time::fixed_clock;
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use storage::repository::{
        CompletedSession, HistoricalSessionRow, HistoryRepository, InMemoryRepository,
        SessionRecordId, Storage, StorageError,
    };

    /// Rejects the first `failures` appends, then stores normally.
    struct FailingHistory {
        inner: InMemoryRepository,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl HistoryRepository for FailingHistory {
        async fn append_session(
            &self,
            completed: &CompletedSession,
        ) -> Result<SessionRecordId, StorageError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.append_session(completed).await
        }

        async fn get_session(&self, id: SessionRecordId) -> Result<HistoricalSession, StorageError> {
            self.inner.get_session(id).await
        }

        async fn list_sessions(&self) -> Result<Vec<HistoricalSessionRow>, StorageError> {
            self.inner.list_sessions().await
        }

        async fn student_histories(&self) -> Result<Vec<StudentHistory>, StorageError> {
            self.inner.student_histories().await
        }
    }

    async fn console_failing(failures: usize) -> (Console, InMemoryRepository) {
        let repo = InMemoryRepository::with_sample_data().unwrap();
        let storage = Storage {
            roster: Arc::new(repo.clone()),
            history: Arc::new(FailingHistory {
                inner: repo.clone(),
                failures: AtomicUsize::new(failures),
            }),
        };
        let settings = ClassroomSettings::default().with_capture_delay(Duration::ZERO);
        let services = AppServices::new(&storage, settings, fixed_clock());
        (Console::open(services, None).await.unwrap(), repo)
    }

    async fn console() -> Console {
        let settings = ClassroomSettings::default().with_capture_delay(Duration::ZERO);
        let services = AppServices::in_memory(settings, fixed_clock(), None).unwrap();
        Console::open(services, None).await.unwrap()
    }

    async fn run(console: &mut Console, line: &str) -> String {
        console.handle(line.parse().unwrap()).await.unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("login".parse::<Command>(), Ok(Command::Login));
        assert_eq!("toggle 7".parse::<Command>(), Ok(Command::Toggle(StudentId::new(7))));
        assert_eq!("nav camera".parse::<Command>(), Ok(Command::Nav(View::Capturing)));
        assert_eq!(
            "report 2024-01".parse::<Command>(),
            Ok(Command::Report(Some(MonthKey::new(2024, 1).unwrap())))
        );
        assert_eq!("capture".parse::<Command>(), Ok(Command::Capture(None)));
        assert_eq!("retry".parse::<Command>(), Ok(Command::Retry));
        assert_eq!("".parse::<Command>(), Ok(Command::Status));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!(
            "toggle".parse::<Command>(),
            Err(ParseCommandError::MissingArgument("toggle"))
        );
        assert!(matches!(
            "toggle seven".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument { command: "toggle", .. })
        ));
        assert!(matches!(
            "report 2024-13".parse::<Command>(),
            Err(ParseCommandError::InvalidArgument { command: "report", .. })
        ));
        assert!(matches!("dance".parse::<Command>(), Err(ParseCommandError::Unknown(_))));
    }

    #[tokio::test]
    async fn full_pass_prints_completion_toast() {
        let mut console = console().await;
        let out = run(&mut console, "login").await;
        assert!(out.contains("== dashboard =="));
        assert!(out.contains("Recent sessions"));

        run(&mut console, "start").await;
        let out = run(&mut console, "skip").await;
        assert!(out.contains("== marking =="));
        assert!(out.contains("Photo: none"));

        for id in 1..=10 {
            run(&mut console, &format!("toggle {id}")).await;
        }
        let out = run(&mut console, "complete").await;
        assert!(out.contains("Attendance submitted: 10/12 students marked present."));
        assert!(out.contains("Today: 10 present, 2 absent, rate 83%"));
        assert_eq!(console.controller().view(), View::Dashboard);
    }

    #[tokio::test]
    async fn capture_with_photo_file() {
        let mut photo = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        photo.write_all(b"\x89PNG").unwrap();

        let mut console = console().await;
        run(&mut console, "login").await;
        run(&mut console, "start").await;

        let out = run(&mut console, "capture").await;
        assert!(out.contains("No photo chosen."));
        assert_eq!(console.controller().view(), View::Capturing);

        let out = run(&mut console, &format!("capture {}", photo.path().display())).await;
        assert!(out.contains("== marking =="));
        assert!(out.contains(&photo.path().display().to_string()));
    }

    #[tokio::test]
    async fn ignored_intents_print_nothing() {
        let mut console = console().await;
        assert_eq!(run(&mut console, "toggle 1").await, "");
        assert_eq!(run(&mut console, "complete").await, "");
        run(&mut console, "login").await;
        assert_eq!(run(&mut console, "login").await, "");
    }

    #[tokio::test]
    async fn failed_submission_can_be_retried() {
        let (mut console, repo) = console_failing(1).await;
        run(&mut console, "login").await;
        run(&mut console, "start").await;
        run(&mut console, "skip").await;
        run(&mut console, "all").await;

        let out = run(&mut console, "complete").await;
        assert!(out.contains("Attendance not saved (connection error: disk full)."));
        assert!(out.contains("Type `retry`"));
        assert_eq!(console.controller().view(), View::Dashboard);
        assert!(console.unsaved().is_some());
        assert_eq!(repo.list_sessions().await.unwrap().len(), 4);

        let out = run(&mut console, "retry").await;
        assert!(out.contains("Attendance for 2024-01-16 saved: 12/12 students marked present."));
        assert!(out.contains("Today: 12 present, 0 absent, rate 100%"));
        assert!(console.unsaved().is_none());
        assert_eq!(repo.list_sessions().await.unwrap().len(), 5);

        assert_eq!(run(&mut console, "retry").await, "Nothing to retry.\n");
    }

    #[tokio::test]
    async fn retry_keeps_pass_while_storage_still_fails() {
        let (mut console, repo) = console_failing(2).await;
        run(&mut console, "login").await;
        run(&mut console, "start").await;
        run(&mut console, "skip").await;
        run(&mut console, "toggle 3").await;
        run(&mut console, "complete").await;

        let out = run(&mut console, "retry").await;
        assert!(out.contains("Still not saved"));
        assert_eq!(console.unsaved().map(|f| f.summary), Some(CompletionSummary::new(1, 12)));
        assert_eq!(repo.list_sessions().await.unwrap().len(), 4);

        run(&mut console, "retry").await;
        assert!(console.unsaved().is_none());
        assert_eq!(repo.list_sessions().await.unwrap().len(), 5);
    }
}
