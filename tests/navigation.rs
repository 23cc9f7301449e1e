//! Voice command routing integration tests

use std::sync::Arc;

use carevoice::host::Severity;
use carevoice::speech::RecognitionFailure;
use carevoice::{
    AssistantKind, AssistantState, Collaborators, Config, MemoryRouter, MemoryStore, Router,
    RouteEntry, RouteOutcome, RouteTable, Runtime, SpeechInput, VoiceAssistant,
};

mod common;

use common::{
    FakeRecognizer, FakeSynth, Gate, RecordingLocaleSink, RecordingNotifier, session_in, wait_until,
};

fn build_assistant(
    kind: AssistantKind,
    backend: Arc<FakeRecognizer>,
    router: Arc<MemoryRouter>,
    notifier: Arc<RecordingNotifier>,
) -> VoiceAssistant {
    VoiceAssistant::new(
        kind,
        SpeechInput::for_assistant(backend),
        router,
        notifier.clone(),
        session_in("en", notifier),
    )
}

#[test]
fn test_lab_tests_phrase_matches() {
    let table = RouteTable::new(vec![RouteEntry::new("/lab-tests", ["lab tests", "lab", "labs"])]);
    assert_eq!(
        table.route("please take me to the lab tests"),
        RouteOutcome::Matched("/lab-tests".to_string())
    );

    for table in [RouteTable::floating_assistant(), RouteTable::navigation_assistant()] {
        assert_eq!(
            table.route("Please take me to the LAB TESTS"),
            RouteOutcome::Matched("/lab-tests".to_string())
        );
    }
}

#[test]
fn test_unrelated_transcript_is_unmatched() {
    for table in [RouteTable::floating_assistant(), RouteTable::navigation_assistant()] {
        assert!(!table.is_empty());
        assert_eq!(table.route("what's for dinner"), RouteOutcome::Unmatched);
    }
}

#[test]
fn test_earlier_entry_wins() {
    let table = RouteTable::new(vec![
        RouteEntry::new("/reminders", ["medicine reminder"]),
        RouteEntry::new("/prescriptions", ["medicine"]),
    ]);
    assert_eq!(
        table.route("set a medicine reminder"),
        RouteOutcome::Matched("/reminders".to_string())
    );

    let reversed = RouteTable::new(vec![
        RouteEntry::new("/prescriptions", ["medicine"]),
        RouteEntry::new("/reminders", ["medicine reminder"]),
    ]);
    assert_eq!(
        reversed.route("set a medicine reminder"),
        RouteOutcome::Matched("/prescriptions".to_string())
    );
}

#[test]
fn test_both_assistants_share_matching() {
    let floating = RouteTable::floating_assistant();
    let navigation = RouteTable::navigation_assistant();

    for (transcript, path) in [
        ("show my prescriptions", "/prescriptions"),
        ("open the dashboard", "/dashboard"),
        ("go to my profile", "/profile"),
        ("I want to do some exercise", "/exercises"),
    ] {
        let expected = RouteOutcome::Matched(path.to_string());
        assert_eq!(floating.route(transcript), expected, "floating: {transcript}");
        assert_eq!(navigation.route(transcript), expected, "navigation: {transcript}");
    }
}

#[tokio::test]
async fn test_matched_command_navigates() {
    let backend = Arc::new(FakeRecognizer::new().hears("Take me to my reminders"));
    let router = Arc::new(MemoryRouter::new("/dashboard"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = build_assistant(
        AssistantKind::Floating,
        backend.clone(),
        router.clone(),
        notifier.clone(),
    );
    let mut events = assistant.subscribe();

    let state = assistant.activate().await;

    assert_eq!(state, AssistantState::Matched("/reminders".to_string()));
    assert_eq!(router.current_path(), "/reminders");
    assert_eq!(assistant.state(), AssistantState::Idle);
    assert!(notifier.messages().is_empty());
    assert_eq!(backend.languages(), ["en-US"]);

    assert_eq!(events.recv().await.unwrap(), AssistantState::Listening);
    assert_eq!(events.recv().await.unwrap(), state);
    assert_eq!(events.recv().await.unwrap(), AssistantState::Idle);
}

/// Router that counts navigation calls
struct CountingRouter {
    inner: MemoryRouter,
    calls: std::sync::Mutex<usize>,
}

impl Router for CountingRouter {
    fn navigate(&self, path: &str) {
        *self.calls.lock().unwrap() += 1;
        self.inner.navigate(path);
    }

    fn current_path(&self) -> String {
        self.inner.current_path()
    }
}

#[test]
fn test_same_route_is_not_renavigated() {
    let router = Arc::new(CountingRouter {
        inner: MemoryRouter::new("/lab-tests"),
        calls: std::sync::Mutex::new(0),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = VoiceAssistant::new(
        AssistantKind::Navigation,
        SpeechInput::for_assistant(Arc::new(FakeRecognizer::new())),
        router.clone(),
        notifier.clone(),
        session_in("en", notifier),
    );

    let state = assistant.dispatch("book a lab test");
    assert_eq!(state, AssistantState::Matched("/lab-tests".to_string()));
    assert_eq!(*router.calls.lock().unwrap(), 0);

    assistant.dispatch("open settings");
    assert_eq!(*router.calls.lock().unwrap(), 1);
    assert_eq!(router.current_path(), "/profile");
}

#[tokio::test]
async fn test_unmatched_command_lists_examples() {
    let backend = Arc::new(FakeRecognizer::new().hears("what's for dinner"));
    let router = Arc::new(MemoryRouter::new("/"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant =
        build_assistant(AssistantKind::Navigation, backend, router.clone(), notifier.clone());

    let state = assistant.activate().await;

    assert_eq!(state, AssistantState::Unmatched("what's for dinner".to_string()));
    assert_eq!(router.current_path(), "/");

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let (message, severity) = &messages[0];
    assert_eq!(*severity, Severity::Info);
    assert!(message.starts_with("Sorry, I didn't understand."));
    assert!(message.contains("\"go to dashboard\""));
    assert!(message.contains("\"go to prescriptions\""));
}

#[tokio::test]
async fn test_recognition_errors_are_surfaced() {
    let backend = Arc::new(
        FakeRecognizer::new()
            .fails(RecognitionFailure::NoSpeech)
            .fails(RecognitionFailure::Network),
    );
    let router = Arc::new(MemoryRouter::new("/"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant =
        build_assistant(AssistantKind::Floating, backend, router.clone(), notifier.clone());

    let first = assistant.activate().await;
    assert!(matches!(first, AssistantState::Errored(_)));
    let second = assistant.activate().await;
    assert_eq!(second, AssistantState::Errored("recognition error: network".to_string()));

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0],
        ("No speech detected. Please try again.".to_string(), Severity::Warning)
    );
    assert_eq!(messages[1].1, Severity::Error);
    assert!(messages[1].0.starts_with("Voice recognition error"));
    assert_eq!(router.current_path(), "/");
    assert_eq!(assistant.state(), AssistantState::Idle);
}

#[tokio::test]
async fn test_unsupported_assistant_reports_once() {
    let router = Arc::new(MemoryRouter::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = build_assistant(
        AssistantKind::Floating,
        Arc::new(FakeRecognizer::unavailable()),
        router,
        notifier.clone(),
    );

    assert!(!assistant.is_supported());
    let mut events = assistant.subscribe();
    let state = assistant.activate().await;
    assert!(matches!(state, AssistantState::Errored(_)));
    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(notifier.messages()[0].1, Severity::Error);

    // no session started, so subscribers never see Listening
    assert_eq!(events.recv().await.unwrap(), state);
    assert_eq!(events.recv().await.unwrap(), AssistantState::Idle);
    assert_eq!(assistant.state(), AssistantState::Idle);
}

#[tokio::test]
async fn test_activation_while_listening_is_ignored() {
    let gate = Gate::closed();
    let backend = Arc::new(FakeRecognizer::new().gated(gate.clone()).hears("labs"));
    let router = Arc::new(MemoryRouter::new("/"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = Arc::new(build_assistant(
        AssistantKind::Floating,
        backend.clone(),
        router.clone(),
        notifier,
    ));

    let first = tokio::spawn({
        let assistant = Arc::clone(&assistant);
        async move { assistant.activate().await }
    });
    wait_until(|| {
        assistant.state() == AssistantState::Listening && backend.languages().len() == 1
    })
    .await;

    assert_eq!(assistant.activate().await, AssistantState::Listening);

    gate.release();
    assert_eq!(first.await.unwrap(), AssistantState::Matched("/lab-tests".to_string()));
    assert_eq!(backend.languages().len(), 1);
    assert_eq!(router.current_path(), "/lab-tests");
}

#[tokio::test]
async fn test_cancel_returns_to_idle() {
    let backend = Arc::new(FakeRecognizer::new().gated(Gate::closed()).hears("profile"));
    let router = Arc::new(MemoryRouter::new("/"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = Arc::new(build_assistant(
        AssistantKind::Floating,
        backend.clone(),
        router.clone(),
        notifier.clone(),
    ));

    let pending = tokio::spawn({
        let assistant = Arc::clone(&assistant);
        async move { assistant.activate().await }
    });
    wait_until(|| backend.languages().len() == 1).await;

    assistant.cancel();
    assert_eq!(pending.await.unwrap(), AssistantState::Idle);
    assert_eq!(router.current_path(), "/");
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_aborted_activation_returns_to_idle() {
    let gate = Gate::closed();
    let backend = Arc::new(FakeRecognizer::new().gated(gate.clone()).hears("labs"));
    let router = Arc::new(MemoryRouter::new("/"));
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = Arc::new(build_assistant(
        AssistantKind::Floating,
        backend.clone(),
        router.clone(),
        notifier,
    ));

    let pending = tokio::spawn({
        let assistant = Arc::clone(&assistant);
        async move { assistant.activate().await }
    });
    wait_until(|| backend.languages().len() == 1).await;
    assert_eq!(assistant.state(), AssistantState::Listening);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());

    assert_eq!(assistant.state(), AssistantState::Idle);
    assert_eq!(backend.abort_count(), 1);
    assistant.cancel();
    assert_eq!(assistant.state(), AssistantState::Idle);

    // a fresh activation is not mistaken for the abandoned one
    gate.release();
    assert_eq!(
        assistant.activate().await,
        AssistantState::Matched("/lab-tests".to_string())
    );
    assert_eq!(router.current_path(), "/lab-tests");
}

#[tokio::test]
async fn test_runtime_wires_configured_tables() {
    let mut config = Config::default();
    config.language.locale = Some("en_US.UTF-8".to_string());
    config.assistants.floating = Some(RouteTable::new(vec![RouteEntry::new(
        "/reminders",
        ["pill"],
    )]));

    let router = Arc::new(MemoryRouter::default());
    let recognizer = Arc::new(FakeRecognizer::new().hears("pill time").hears("pill time"));
    let sink = Arc::new(RecordingLocaleSink::default());
    let runtime = Runtime::new(
        config,
        Collaborators {
            store: Arc::new(MemoryStore::new()),
            synthesis: Arc::new(FakeSynth::new(Vec::new())),
            recognition: recognizer,
            router: router.clone(),
            notifier: Arc::new(RecordingNotifier::default()),
            locale_sink: sink.clone(),
        },
    );

    assert!(runtime.session().is_speech_supported());
    assert_eq!(sink.codes(), ["en"]);

    let floating = runtime.assistant(AssistantKind::Floating);
    assert_eq!(floating.activate().await, AssistantState::Matched("/reminders".to_string()));
    assert_eq!(router.current_path(), "/reminders");

    let navigation = runtime.assistant(AssistantKind::Navigation);
    assert_eq!(navigation.table(), &RouteTable::navigation_assistant());
    assert!(matches!(navigation.activate().await, AssistantState::Unmatched(_)));
}
