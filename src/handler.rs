use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::{App, InputMode};
use crate::state::ResultState;
use crate::tui::AppEvent;

const SCROLL_STEP: u16 = 5;

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Response { seq, result } => app.apply_response(seq, result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key, tx),
        InputMode::Editing => handle_editing_mode(app, key, tx),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Field focus
        KeyCode::Tab | KeyCode::Char('j') | KeyCode::Down => app.focus_next(),
        KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Up => app.focus_prev(),

        KeyCode::Char('i') | KeyCode::Enter => {
            app.cursor_end();
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('s') => submit(app, tx),

        KeyCode::PageDown => app.scroll_results_down(SCROLL_STEP),
        KeyCode::PageUp => app.scroll_results_up(SCROLL_STEP),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => submit(app, tx),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageDown => app.scroll_results_down(SCROLL_STEP),
        KeyCode::PageUp => app.scroll_results_up(SCROLL_STEP),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char(c);
        }
        _ => {}
    }
}

/// Start a request in the background. Earlier requests keep running; their
/// responses are dropped by sequence number when they arrive.
fn submit(app: &mut App, tx: &UnboundedSender<AppEvent>) {
    let Some((seq, request)) = app.prepare_submit() else {
        return;
    };

    let client = app.client.clone();
    let tx = tx.clone();
    tracing::info!(seq, endpoint = client.base_url(), "requesting recommendations");

    let handle = tokio::spawn(async move {
        let result = ResultState::from_outcome(client.recommend(&request).await);
        // The receiver is gone once the UI has exited
        let _ = tx.send(AppEvent::Response { seq, result });
    });
    app.track_task(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Field;
    use crate::recommend::{Recommendation, RecommendClient, FETCH_FAILED};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, tx: &UnboundedSender<AppEvent>, s: &str) {
        for c in s.chars() {
            handle_event(app, key(KeyCode::Char(c)), tx);
        }
    }

    fn fill_required(app: &mut App, tx: &UnboundedSender<AppEvent>, skills: &str) {
        // Starts on Name in editing mode
        handle_event(app, key(KeyCode::Tab), tx);
        type_str(app, tx, skills);
        handle_event(app, key(KeyCode::Tab), tx);
        type_str(app, tx, "Meet founders");
        handle_event(app, key(KeyCode::Tab), tx);
        type_str(app, tx, "Engineer");
    }

    async fn next_response(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> AppEvent {
        loop {
            match rx.recv().await {
                Some(event @ AppEvent::Response { .. }) => return event,
                Some(_) => continue,
                None => panic!("channel closed"),
            }
        }
    }

    #[test]
    fn test_typing_fills_focused_field() {
        let client = RecommendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut app = App::new(client);
        let (tx, _rx) = mpsc::unbounded_channel();

        type_str(&mut app, &tx, "Ada");
        fill_required(&mut app, &tx, "Python, Go");

        assert_eq!(app.form.name, "Ada");
        assert_eq!(app.form.skills, "Python, Go");
        assert_eq!(app.form.work_experience, "Engineer");
        assert_eq!(app.focus, Field::WorkExperience);
    }

    #[test]
    fn test_normal_mode_keys() {
        let client = RecommendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut app = App::new(client);
        let (tx, _rx) = mpsc::unbounded_channel();

        handle_event(&mut app, key(KeyCode::Esc), &tx);
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_event(&mut app, key(KeyCode::Char('j')), &tx);
        assert_eq!(app.focus, Field::Skills);
        handle_event(&mut app, key(KeyCode::Char('k')), &tx);
        assert_eq!(app.focus, Field::Name);

        // Submitting an empty form is blocked
        handle_event(&mut app, key(KeyCode::Char('s')), &tx);
        assert!(app.validation.is_some());
        assert_eq!(app.focus, Field::Skills);
        assert!(!app.submission.is_loading());

        handle_event(&mut app, key(KeyCode::Char('q')), &tx);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_editing() {
        let client = RecommendClient::new("http://127.0.0.1:9", None).unwrap();
        let mut app = App::new(client);
        let (tx, _rx) = mpsc::unbounded_channel();

        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c, &tx);
        assert!(app.should_quit);
        assert_eq!(app.form.name, "");
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "Ada",
                    "why": "shared interest in compilers",
                    "conversation_starters": ["Ask about her latest project"]
                }
            ])))
            .mount(&server)
            .await;

        let mut app = App::new(RecommendClient::new(&server.uri(), None).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();

        fill_required(&mut app, &tx, "Python");
        handle_event(&mut app, key(KeyCode::Enter), &tx);
        assert!(app.submission.is_loading());

        let response = next_response(&mut rx).await;
        handle_event(&mut app, response, &tx);

        assert_eq!(
            app.submission.result(),
            Some(&ResultState::Recommendations(vec![Recommendation {
                name: "Ada".to_string(),
                why: "shared interest in compilers".to_string(),
                conversation_starters: vec!["Ask about her latest project".to_string()],
            }]))
        );
        // Form stays filled for resubmission
        assert_eq!(app.form.skills, "Python");
    }

    #[tokio::test]
    async fn test_transport_failure_sets_fixed_error() {
        // Reserve a free port, then release it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut app = App::new(RecommendClient::new(&uri, None).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();

        fill_required(&mut app, &tx, "Python");
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        let response = next_response(&mut rx).await;
        handle_event(&mut app, response, &tx);

        assert_eq!(
            app.submission.result(),
            Some(&ResultState::Error(FETCH_FAILED.to_string()))
        );
    }

    #[tokio::test]
    async fn test_only_latest_submission_lands() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommend"))
            .and(body_partial_json(json!({"skills": ["First"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "stale"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/recommend"))
            .and(body_partial_json(json!({"skills": ["Second"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut app = App::new(RecommendClient::new(&server.uri(), None).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();

        fill_required(&mut app, &tx, "First");
        handle_event(&mut app, key(KeyCode::Enter), &tx);

        app.form.set(Field::Skills, "Second");
        handle_event(&mut app, key(KeyCode::Enter), &tx);
        assert!(app.submission.result().is_none());

        // Apply both responses in whatever order they arrive
        for _ in 0..2 {
            let response = next_response(&mut rx).await;
            handle_event(&mut app, response, &tx);
        }

        assert_eq!(
            app.submission.result(),
            Some(&ResultState::Recommendations(vec![]))
        );
        assert!(!app.submission.is_loading());
    }
}
