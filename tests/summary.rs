use std::cell::RefCell;
use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use vaep_scout::model::PlayerProfile;
use vaep_scout::persist::SummaryCache;
use vaep_scout::summary::{
    CachedGenerator, ChatMessage, GenerationOptions, Language, TextGenerator, build_messages,
    cache_key, error_message, load_examples, parse_completion, player_evaluation, request_body,
};

/// Records every transcript and answers with a fixed text.
struct FakeGenerator {
    calls: RefCell<Vec<(Vec<ChatMessage>, GenerationOptions)>>,
}

impl FakeGenerator {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl TextGenerator for FakeGenerator {
    fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        self.calls.borrow_mut().push((messages.to_vec(), options.clone()));
        Ok("A tireless forward.".to_string())
    }
}

impl TextGenerator for &FakeGenerator {
    fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        (**self).generate(messages, options)
    }
}

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn striker() -> PlayerProfile {
    PlayerProfile {
        player_name: "Jonas Albers".to_string(),
        team_name: "Nordhafen SV".to_string(),
        position: "Forward".to_string(),
        minutes_played: 2100,
        z_scores: [("finishing_z", 1.2), ("pressing_z", -1.3)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
    }
}

#[test]
fn english_prompt_layout() {
    let attributes = ["finishing_z", "pressing_z"];
    let messages = build_messages(&striker(), &attributes, Language::English, &[])
        .expect("attributes present");
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, "system");
    assert!(messages[0].content.contains("players in the Forward position"));
    assert_eq!(messages[1].role, "user");
    assert_eq!(messages[2].role, "assistant");

    let last = &messages[3];
    assert_eq!(last.role, "user");
    assert!(last.content.contains("When it comes to Finishing, Jonas Albers is excellent."));
    assert!(last.content.contains("When it comes to Pressing, Jonas Albers is poor."));
    assert!(last.content.contains("using at most four sentences"));
    assert!(last.content.ends_with("Finishing, Pressing"));
}

#[test]
fn german_prompt_uses_german_levels_and_fixed_sampling() {
    let messages = build_messages(&striker(), &["finishing_z"], Language::German, &[])
        .expect("attribute present");
    let last = &messages[messages.len() - 1];
    assert!(last.content.contains("dann ist Jonas Albers ausgezeichnet."));
    assert!(last.content.contains("nicht mehr als drei Sätze"));

    let options = Language::German.generation_options("gpt-4o");
    assert_eq!(options.seed, Some(42));
    assert_eq!(options.temperature, Some(0.5));
    let english = Language::English.generation_options("gpt-4o");
    assert_eq!(english.seed, None);
    assert_eq!(english.temperature, None);
}

#[test]
fn few_shot_examples_are_replayed_before_the_player() {
    let examples = load_examples(&fixture("summary_examples.json")).expect("fixture parses");
    assert_eq!(examples.len(), 1);
    let messages = build_messages(&striker(), &["finishing_z"], Language::English, &examples)
        .expect("attribute present");
    assert_eq!(messages.len(), 6);
    assert!(messages[3].content.contains("Example Player is outstanding"));
    assert_eq!(messages[4].content, examples[0].assistant);
    assert!(messages[5].content.contains("Jonas Albers"));
}

#[test]
fn missing_examples_file_means_no_examples() {
    let examples = load_examples(&fixture("does_not_exist.json")).expect("missing is fine");
    assert!(examples.is_empty());
}

#[test]
fn evaluation_falls_back_to_text_for_lookup_failures() {
    let fake = FakeGenerator::new();
    let profiles = vec![striker()];

    let unknown = player_evaluation(
        &fake,
        &profiles,
        "Nobody",
        &["finishing_z"],
        Language::English,
        &[],
        "gpt-4o",
    )
    .expect("fallback text");
    assert_eq!(unknown, "No data found for player Nobody");

    let missing = player_evaluation(
        &fake,
        &profiles,
        "Jonas Albers",
        &["finishing_z", "poaching_z"],
        Language::English,
        &[],
        "gpt-4o",
    )
    .expect("fallback text");
    assert_eq!(missing, "Attribute poaching_z not found for player Jonas Albers");
    assert_eq!(fake.call_count(), 0);

    let text = player_evaluation(
        &fake,
        &profiles,
        "Jonas Albers",
        &["finishing_z"],
        Language::German,
        &[],
        "gpt-4o",
    )
    .expect("generated");
    assert_eq!(text, "A tireless forward.");
    let calls = fake.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1.seed, Some(42));
}

#[test]
fn cached_generator_asks_once_per_request() {
    let fake = FakeGenerator::new();
    let cached = CachedGenerator::new(&fake, SummaryCache::in_memory());
    let messages = vec![ChatMessage::user("hello")];
    let options = Language::English.generation_options("gpt-4o");

    let a = cached.generate(&messages, &options).expect("first");
    let b = cached.generate(&messages, &options).expect("second");
    assert_eq!(a, b);
    assert_eq!(fake.call_count(), 1);
    assert_eq!(cached.cached_len(), 1);

    let other = Language::German.generation_options("gpt-4o");
    cached.generate(&messages, &other).expect("different options");
    assert_eq!(fake.call_count(), 2);
}

#[test]
fn cache_key_depends_on_model_and_messages() {
    let messages = vec![ChatMessage::user("hello")];
    let a = cache_key(&messages, &Language::English.generation_options("gpt-4o"));
    let b = cache_key(&messages, &Language::English.generation_options("gpt-4o-mini"));
    let c = cache_key(&[ChatMessage::user("hi")], &Language::English.generation_options("gpt-4o"));
    assert_eq!(a.len(), 64);
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, cache_key(&messages, &Language::English.generation_options("gpt-4o")));
}

#[test]
fn request_body_only_sets_sampling_when_given() {
    let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
    let english = request_body(&messages, &Language::English.generation_options("gpt-4o"));
    assert_eq!(english["model"], "gpt-4o");
    assert_eq!(english["messages"][1]["role"], "user");
    assert!(english.get("seed").is_none());
    assert!(english.get("temperature").is_none());

    let german = request_body(&messages, &Language::German.generation_options("gpt-4o"));
    assert_eq!(german["seed"], 42);
    assert_eq!(german["temperature"], 0.5);
}

#[test]
fn completion_content_is_extracted() {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Solid.  "}}]
    });
    assert_eq!(parse_completion(&body).expect("content"), "Solid.");
    assert!(parse_completion(&json!({"choices": []})).is_err());
}

#[test]
fn language_parsing() {
    assert_eq!(Language::parse("DE"), Some(Language::German));
    assert_eq!(Language::parse("english"), Some(Language::English));
    assert_eq!(Language::parse("fr"), None);
}

#[test]
fn error_bodies_keep_their_message() {
    let json = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
    assert_eq!(error_message(json), "Rate limit reached");
    let html = "<html><body>502 Bad Gateway</body></html>";
    assert_eq!(error_message(html), html);
    assert_eq!(error_message("  "), "empty response body");
    assert_eq!(error_message(&"x".repeat(500)).len(), 200);
}
