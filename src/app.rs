use tokio::task::JoinHandle;

use crate::form::{Field, FormState};
use crate::recommend::{RecommendClient, RecommendationRequest};
use crate::state::{ResultState, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Form state
    pub form: FormState,
    pub focus: Field,
    pub cursor: usize,
    /// Shown when submit is blocked by an empty required field
    pub validation: Option<String>,

    // Submission and results
    pub submission: Submission,
    pub results_scroll: u16,
    pub animation_frame: u8,

    pub client: RecommendClient,
    in_flight: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(client: RecommendClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            form: FormState::default(),
            focus: Field::Name,
            cursor: 0,
            validation: None,

            submission: Submission::new(),
            results_scroll: 0,
            animation_frame: 0,

            client,
            in_flight: Vec::new(),
        }
    }

    pub fn focused_value(&self) -> &str {
        self.form.get(self.focus)
    }

    pub fn focus_field(&mut self, field: Field) {
        self.focus = field;
        self.cursor = self.form.get(field).chars().count();
    }

    pub fn focus_next(&mut self) {
        self.focus_field(self.focus.next());
    }

    pub fn focus_prev(&mut self) {
        self.focus_field(self.focus.prev());
    }

    pub fn insert_char(&mut self, c: char) {
        let value = self.form.get_mut(self.focus);
        let byte_pos = char_to_byte_index(value, self.cursor);
        value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let value = self.form.get_mut(self.focus);
            let byte_pos = char_to_byte_index(value, self.cursor);
            value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.cursor;
        let value = self.form.get_mut(self.focus);
        if cursor < value.chars().count() {
            let byte_pos = char_to_byte_index(value, cursor);
            value.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.focused_value().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.focused_value().chars().count();
    }

    /// Validate the form and start a submission.
    ///
    /// Returns the sequence number and payload to send, or `None` when a
    /// required field is empty (in which case nothing else changes).
    pub fn prepare_submit(&mut self) -> Option<(u64, RecommendationRequest)> {
        let missing = self.form.missing_required();
        if let Some(first) = missing.first() {
            let names: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            self.validation = Some(format!("Please fill in: {}", names.join(", ")));
            self.focus_field(*first);
            return None;
        }

        self.validation = None;
        self.results_scroll = 0;
        self.animation_frame = 0;
        let seq = self.submission.begin();
        Some((seq, self.form.to_request()))
    }

    pub fn apply_response(&mut self, seq: u64, result: ResultState) {
        if self.submission.settle(seq, result) {
            tracing::info!(seq, "recommendations updated");
        }
    }

    pub fn track_task(&mut self, handle: JoinHandle<()>) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }

    /// Abort any request still running, so nothing outlives the UI.
    pub fn shutdown(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }

    pub fn button_label(&self) -> String {
        if self.submission.is_loading() {
            format!("Finding{}", ".".repeat(self.animation_frame as usize + 1))
        } else {
            "Find Who to Meet".to_string()
        }
    }

    pub fn scroll_results_down(&mut self, amount: u16) {
        self.results_scroll = self.results_scroll.saturating_add(amount);
    }

    pub fn scroll_results_up(&mut self, amount: u16) {
        self.results_scroll = self.results_scroll.saturating_sub(amount);
    }

    pub fn tick_animation(&mut self) {
        if self.submission.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::{Recommendation, FETCH_FAILED};
    use crate::state::Phase;
    use pretty_assertions::assert_eq;

    fn test_app() -> App {
        let client = RecommendClient::new("http://127.0.0.1:9", None).unwrap();
        App::new(client)
    }

    fn filled_app() -> App {
        let mut app = test_app();
        app.form.set(Field::Skills, "Python, , Go ,Go");
        app.form.set(Field::Goals, "Meet founders");
        app.form.set(Field::WorkExperience, "Engineer at Acme");
        app
    }

    #[test]
    fn test_utf8_editing() {
        let mut app = test_app();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        assert_eq!(app.form.name, "héllo");

        app.cursor_left();
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.form.name, "hllo");

        app.cursor_home();
        app.delete();
        assert_eq!(app.form.name, "llo");

        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.form.name, "llo!");
    }

    #[test]
    fn test_focus_moves_cursor_to_end() {
        let mut app = test_app();
        app.form.set(Field::Skills, "Rust");
        app.focus_next();
        assert_eq!(app.focus, Field::Skills);
        assert_eq!(app.cursor, 4);
    }

    #[test]
    fn test_submit_blocked_by_required_fields() {
        let mut app = test_app();
        app.form.set(Field::Skills, "Rust");

        assert!(app.prepare_submit().is_none());
        assert_eq!(app.submission.phase(), Phase::Idle);
        assert_eq!(app.focus, Field::Goals);
        assert_eq!(
            app.validation.as_deref(),
            Some("Please fill in: Goals, Work Experience")
        );
    }

    #[test]
    fn test_submit_builds_payload() {
        let mut app = filled_app();
        let (seq, request) = app.prepare_submit().unwrap();

        assert_eq!(seq, 1);
        assert_eq!(request.skills, vec!["Python", "Go", "Go"]);
        assert_eq!(request.name, "");
        assert!(request.posts.is_empty());
        assert!(app.submission.is_loading());
        assert_eq!(app.button_label(), "Finding.");
    }

    #[test]
    fn test_resubmit_clears_result_before_response() {
        let mut app = filled_app();
        let (seq, _) = app.prepare_submit().unwrap();
        app.apply_response(
            seq,
            ResultState::Recommendations(vec![Recommendation {
                name: "Ada".to_string(),
                why: "compilers".to_string(),
                conversation_starters: vec![],
            }]),
        );
        assert!(app.submission.result().is_some());

        app.prepare_submit().unwrap();
        assert!(app.submission.result().is_none());
        assert!(app.submission.is_loading());
    }

    #[test]
    fn test_stale_response_does_not_overwrite() {
        let mut app = filled_app();
        let (first, _) = app.prepare_submit().unwrap();
        let (second, _) = app.prepare_submit().unwrap();

        app.apply_response(second, ResultState::Recommendations(vec![]));
        app.apply_response(first, ResultState::Error(FETCH_FAILED.to_string()));

        assert_eq!(
            app.submission.result(),
            Some(&ResultState::Recommendations(vec![]))
        );
        assert_eq!(app.button_label(), "Find Who to Meet");
    }

    #[test]
    fn test_tick_animation_only_while_loading() {
        let mut app = filled_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.prepare_submit().unwrap();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.button_label(), "Finding...");
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_pending_requests() {
        let mut app = test_app();

        // The task holds the receiver; aborting it drops the receiver
        let (mut tx, rx) = tokio::sync::oneshot::channel::<()>();
        app.track_task(tokio::spawn(async move {
            let _ = rx.await;
        }));

        app.shutdown();

        let closed =
            tokio::time::timeout(std::time::Duration::from_secs(1), tx.closed()).await;
        assert!(closed.is_ok(), "request task still running after shutdown");
    }
}
