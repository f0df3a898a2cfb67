use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::LlmConfig;
use crate::error::ScoutError;
use crate::model::PlayerProfile;
use crate::persist::SummaryCache;
use crate::profile::Level;

const REQUEST_TIMEOUT_SECS: u64 = 60;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    German,
}

impl Language {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "de" | "german" | "deutsch" => Some(Language::German),
            _ => None,
        }
    }

    fn level(self, z: f64) -> &'static str {
        let level = Level::from_z(z);
        match self {
            Language::English => level.label(),
            Language::German => level.label_de(),
        }
    }

    /// German requests are pinned to a seed and a lower temperature.
    pub fn generation_options(self, model: &str) -> GenerationOptions {
        match self {
            Language::English => GenerationOptions {
                model: model.to_string(),
                temperature: None,
                seed: None,
            },
            Language::German => GenerationOptions {
                model: model.to_string(),
                temperature: Some(0.5),
                seed: Some(42),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: Option<f64>,
    pub seed: Option<u64>,
}

/// Anything that turns a chat transcript into one reply.
pub trait TextGenerator {
    fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String>;
}

/// A previous description and the answer it got, replayed ahead of the
/// current player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub user: String,
    pub assistant: String,
}

/// Missing file means no examples; a malformed one is an error.
pub fn load_examples(path: &Path) -> Result<Vec<FewShotExample>> {
    if !path.exists() {
        info!(path = %path.display(), "no few-shot examples file");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn attribute_name(attribute: &str) -> &str {
    catalog::stat_label(attribute).unwrap_or(attribute)
}

fn describe_player(
    profile: &PlayerProfile,
    attributes: &[&str],
    language: Language,
) -> Result<String, ScoutError> {
    let mut out = String::new();
    for attribute in attributes {
        let z = profile.z(attribute).ok_or_else(|| ScoutError::MissingAttribute {
            player: profile.player_name.clone(),
            attribute: attribute.to_string(),
        })?;
        let level = language.level(z);
        let name = attribute_name(attribute);
        let line = match language {
            Language::English => {
                format!("When it comes to {name}, {} is {level}.\n", profile.player_name)
            }
            Language::German => format!(
                "Wenn es um die Fähigkeit {name} geht, dann ist {} {level}.\n",
                profile.player_name
            ),
        };
        out.push_str(&line);
    }
    Ok(out)
}

fn preamble(language: Language, position: &str) -> Vec<ChatMessage> {
    match language {
        Language::English => vec![
            ChatMessage::system(format!(
                "You are a German-based football scout. You provide succinct and to the point \
                 summaries of football players based on data. You talk in footballing terms about \
                 data. You use the information given to you from the data and answers to earlier \
                 user/assistant pairs to give summaries of players. Your current job is to assess \
                 players in the {position} position."
            )),
            ChatMessage::user(
                "Do you refer to the game you are an expert in as soccer or football?",
            ),
            ChatMessage::assistant(
                "I refer to the game as football. When I say football, I don't mean American \
                 football, I mean what Americans call soccer. But I always talk about football, as \
                 people do in the United Kingdom and all the other parts of Europe.",
            ),
        ],
        Language::German => vec![
            ChatMessage::system(format!(
                "Du bist ein Fußballscout aus Deutschland. Du lieferst prägnante und auf den \
                 Punkt gebrachte Zusammenfassungen von Fußballspielern basierend auf Daten. Du \
                 sprichst und benutzt für den Fußball typische Sprache. Du nutzt die \
                 Informationen aus den dir gegebenen Daten und Antworten aus früheren \
                 'user/assistant' Paaren, um Zusammenfassungen über die Spieler zu erstellen. \
                 Deine aktuelle Aufgabe besteht darin einen bestimmten Spieler auf der Position \
                 {position} zu beschreiben."
            )),
            ChatMessage::user("Was meinst du genau mit Fußball?"),
            ChatMessage::assistant(
                "Ich meine die Sportart Fußball, welche in Europa und in Deutschland die \
                 beliebteste und bekannteste Sportart ist.",
            ),
        ],
    }
}

fn wrap_description(language: Language, description: &str, attributes: &[&str]) -> String {
    let names: Vec<&str> = attributes.iter().map(|a| attribute_name(a)).collect();
    let names = names.join(", ");
    match language {
        Language::English => format!(
            "Below is a description of some of the player's skills:\n\n{description}\n\
             Use the data provided and summarise the player (using at most four sentences) and \
             speculate on the role the player might take in a team based on these \
             attributes: {names}"
        ),
        Language::German => format!(
            "Hier findest du eine Beschreibung einiger Fähigkeiten des Spielers:\n\n{description}\n\
             Nutze die zur Verfügung stehenden Daten und mache eine Zusammenfassung über den \
             Spieler (nicht mehr als drei Sätze) und spekuliere über die Rolle, welche dieser \
             Spieler in einem Team haben könnte aufgrund dieser Fähigkeiten: {names}"
        ),
    }
}

/// Full transcript for one player: preamble, replayed examples, then the
/// player's own description.
pub fn build_messages(
    profile: &PlayerProfile,
    attributes: &[&str],
    language: Language,
    examples: &[FewShotExample],
) -> Result<Vec<ChatMessage>, ScoutError> {
    let description = describe_player(profile, attributes, language)?;
    let mut messages = preamble(language, &profile.position);
    for example in examples {
        messages.push(ChatMessage::user(wrap_description(language, &example.user, attributes)));
        messages.push(ChatMessage::assistant(example.assistant.clone()));
    }
    messages.push(ChatMessage::user(wrap_description(language, &description, attributes)));
    Ok(messages)
}

/// Summary text for a player. Lookup failures come back as readable text
/// rather than errors; generator failures propagate.
pub fn player_evaluation(
    generator: &dyn TextGenerator,
    profiles: &[PlayerProfile],
    player_name: &str,
    attributes: &[&str],
    language: Language,
    examples: &[FewShotExample],
    model: &str,
) -> Result<String> {
    let Some(profile) = profiles.iter().find(|p| p.player_name == player_name) else {
        return Ok(ScoutError::PlayerNotFound(player_name.to_string()).to_string());
    };
    let messages = match build_messages(profile, attributes, language, examples) {
        Ok(messages) => messages,
        Err(err @ ScoutError::MissingAttribute { .. }) => return Ok(err.to_string()),
        Err(err) => return Err(err.into()),
    };
    debug!(player = player_name, messages = messages.len(), "requesting summary");
    generator.generate(&messages, &language.generation_options(model))
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    api_key: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;
        Ok(Self::new(api_key, config.base_url.clone()))
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

pub fn request_body(messages: &[ChatMessage], options: &GenerationOptions) -> Value {
    let mut body = json!({
        "model": options.model,
        "messages": messages,
    });
    if let Some(t) = options.temperature {
        body["temperature"] = json!(t);
    }
    if let Some(s) = options.seed {
        body["seed"] = json!(s);
    }
    body
}

/// First choice's message content of a chat completion response.
pub fn parse_completion(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("completion response has no message content"))
}

/// `error.message` of a JSON error body, else the raw body cut to 200 chars.
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json.pointer("/error/message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(200).collect()
}

impl TextGenerator for OpenAiChat {
    fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let client = http_client()?;
        let resp = client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body(messages, options))
            .send()
            .context("chat completion request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!(
                "chat completion http {status}: {}",
                error_message(&text)
            ));
        }
        let body: Value = resp.json().context("invalid chat completion json")?;
        parse_completion(&body)
    }
}

/// Stable key for a request: model, sampling options and every message.
pub fn cache_key(messages: &[ChatMessage], options: &GenerationOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request_body(messages, options).to_string().as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Serves repeated requests from a `SummaryCache`, asking the inner
/// generator only on a miss.
pub struct CachedGenerator<G> {
    inner: G,
    cache: Mutex<SummaryCache>,
}

impl<G: TextGenerator> CachedGenerator<G> {
    pub fn new(inner: G, cache: SummaryCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl<G: TextGenerator> TextGenerator for CachedGenerator<G> {
    fn generate(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let key = cache_key(messages, options);
        {
            let cache = self.cache.lock().map_err(|_| anyhow!("summary cache poisoned"))?;
            if let Some(hit) = cache.get(&key) {
                debug!(key = %&key[..12], "summary cache hit");
                return Ok(hit.text.clone());
            }
        }
        let text = self.inner.generate(messages, options)?;
        let mut cache = self.cache.lock().map_err(|_| anyhow!("summary cache poisoned"))?;
        if let Err(err) = cache.insert(key, text.clone(), options.model.clone()) {
            warn!(error = %err, "failed to persist summary cache");
        }
        Ok(text)
    }
}
