use classroom_core::model::{
    CompletionSummary, PhotoRef, Presence, Roster, Student, StudentId, View,
};
use classroom_core::report::{average_attendance, percentage};
use services::{Intent, SessionController, Transition};

fn roster(n: u64) -> Roster {
    let students = (1..=n)
        .map(|id| Student::new(StudentId::new(id), format!("Student {id}")).unwrap())
        .collect();
    Roster::new(students).unwrap()
}

fn marking(n: u64) -> SessionController {
    let mut controller = SessionController::new(roster(n));
    for intent in [
        Intent::Login,
        Intent::StartAttendance,
        Intent::PhotoCaptured(Some(PhotoRef::new("class.jpg"))),
    ] {
        assert_eq!(controller.dispatch(intent), Transition::Applied);
    }
    controller
}

fn status(controller: &SessionController, id: u64) -> Presence {
    controller
        .state()
        .attendance()
        .map(|record| record.status(StudentId::new(id)))
        .unwrap_or(Presence::Unmarked)
}

#[test]
fn toggle_alternates_from_present() {
    let mut controller = marking(3);
    for round in 0..7 {
        controller.dispatch(Intent::Toggle(StudentId::new(2)));
        let expected = if round % 2 == 0 { Presence::Present } else { Presence::Absent };
        assert_eq!(status(&controller, 2), expected);
    }
}

#[test]
fn mark_all_and_clear_all_counts() {
    let mut controller = marking(8);
    controller.dispatch(Intent::MarkAllPresent);
    let record = controller.state().attendance().unwrap();
    assert_eq!(record.present_count(), 8);

    controller.dispatch(Intent::ClearAll);
    let record = controller.state().attendance().unwrap();
    assert_eq!(record.present_count(), 0);
    assert_eq!(record.absent_count(), 8);
}

#[test]
fn completion_only_from_marking_and_resets() {
    let mut controller = SessionController::new(roster(2));
    for intent in [Intent::Login, Intent::StartAttendance] {
        controller.dispatch(intent);
        assert_eq!(controller.dispatch(Intent::CompleteAttendance), Transition::Ignored);
    }
    controller.dispatch(Intent::PhotoCaptured(None));
    assert!(matches!(
        controller.dispatch(Intent::CompleteAttendance),
        Transition::Completed(_)
    ));
    assert_eq!(controller.view(), View::Dashboard);
    assert!(controller.state().captured_photo().is_none());
    assert!(controller.state().attendance().is_none());
}

#[test]
fn photo_captured_always_yields_empty_marking() {
    for photo in [None, Some(PhotoRef::new("a.png"))] {
        let mut controller = SessionController::new(roster(4));
        controller.dispatch(Intent::Login);
        controller.dispatch(Intent::StartAttendance);
        controller.dispatch(Intent::PhotoCaptured(photo));
        assert_eq!(controller.view(), View::Marking);
        assert_eq!(controller.state().attendance().unwrap().marked_count(), 0);
    }
}

#[test]
fn single_session_percentage_matches_toggled_share() {
    for (k, n) in [(0_u64, 5_u64), (3, 7), (10, 12), (9, 9)] {
        let mut controller = marking(n);
        for id in 1..=k {
            controller.dispatch(Intent::Toggle(StudentId::new(id)));
        }
        let Transition::Completed(finished) = controller.dispatch(Intent::CompleteAttendance)
        else {
            panic!("expected completion");
        };
        let expected = ((k as f64 / n as f64) * 100.0).round() as u32;
        assert_eq!(finished.summary.rate(), Some(expected));
        assert_eq!(
            percentage(finished.summary.present, finished.summary.total),
            Some(expected)
        );
    }
}

#[test]
fn twelve_students_ten_present() {
    let mut controller = marking(12);
    for id in 1..=10 {
        controller.dispatch(Intent::Toggle(StudentId::new(id)));
    }
    let record = controller.state().attendance().unwrap();
    assert_eq!(record.present_count(), 10);
    assert_eq!(record.absent_count(), 2);
    assert_eq!(status(&controller, 11), Presence::Unmarked);

    let Transition::Completed(finished) = controller.dispatch(Intent::CompleteAttendance) else {
        panic!("expected completion");
    };
    assert_eq!(finished.summary, CompletionSummary::new(10, 12));
    assert_eq!(finished.summary.to_string(), "10/12 students marked present.");
}

#[test]
fn empty_roster_average_is_undefined() {
    let mut controller = marking(0);
    controller.dispatch(Intent::MarkAllPresent);
    let Transition::Completed(finished) = controller.dispatch(Intent::CompleteAttendance) else {
        panic!("expected completion");
    };
    assert_eq!(finished.summary.rate(), None);
    assert_eq!(average_attendance(std::iter::empty()), None);
}

#[test]
fn login_while_on_dashboard_is_ignored() {
    let mut controller = SessionController::new(roster(2));
    controller.dispatch(Intent::Login);
    let mut events = controller.subscribe();
    let before = controller.snapshot();

    assert_eq!(controller.dispatch(Intent::Login), Transition::Ignored);
    assert_eq!(controller.snapshot(), before);
    assert!(events.try_recv().is_err());
}
