#![forbid(unsafe_code)]

//! Structured log events emitted while compiling a classifier.

use std::sync::{Arc, Mutex};

use readout_classify::LineClassifier;
use readout_core::{CategoryPatterns, OutputKind, PatternConfig};
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().unwrap().clone();
    events
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn invalid_pattern_is_logged_with_context() {
    let mut config = PatternConfig::empty();
    config.output = vec![CategoryPatterns::new(OutputKind::Warning, &["ok", "[unclosed"])];

    let events = capture(|| {
        let classifier = LineClassifier::new(&config);
        assert_eq!(classifier.skipped_patterns(), 1);
    });

    let warnings: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1, "{events:?}");
    let warn = warnings[0];
    assert!(warn.message.contains("skipping invalid output pattern"));
    assert_eq!(warn.field("scope"), Some("global"));
    assert_eq!(warn.field("pattern"), Some("[unclosed"));
}

#[test]
fn builtin_dictionary_logs_no_warnings() {
    let events = capture(|| {
        let _ = LineClassifier::default();
    });
    assert!(events.iter().all(|e| e.level != tracing::Level::WARN), "{events:?}");
    assert!(
        events
            .iter()
            .any(|e| e.message.contains("compiled pattern set")),
        "{events:?}"
    );
}
