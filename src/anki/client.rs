use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::store::{CardStore, StoreError};
use crate::config::AnkiConfig;
use crate::flashcards::{Card, CardId};

/// AnkiConnect API version spoken by this client
pub const API_VERSION: u32 = 6;

/// Blocking client for the AnkiConnect add-on
pub struct AnkiConnectClient {
    client: Client,
    url: String,
    model: String,
    front_field: String,
    back_field: String,
}

#[derive(Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl AnkiConnectClient {
    /// Create a new AnkiConnect client
    pub fn new(config: &AnkiConfig) -> Result<Self, StoreError> {
        // Normalize URL - ensure no trailing slash
        let url = config.url.trim().trim_end_matches('/').to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StoreError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()?;

        Ok(Self {
            client,
            url,
            model: config.model.clone(),
            front_field: config.front_field.clone(),
            back_field: config.back_field.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one action and decode its `result`
    fn invoke<T: DeserializeOwned>(&self, action: &str, params: Option<Value>) -> Result<T, StoreError> {
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };

        log::debug!("AnkiConnect request: {}", action);
        let response = self.client.post(&self.url).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Server {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let body = response.text()?;
        parse_response(action, &body)
    }
}

impl CardStore for AnkiConnectClient {
    fn version(&self) -> Result<u32, StoreError> {
        self.invoke("version", None)
    }

    fn create_deck(&self, deck: &str) -> Result<(), StoreError> {
        let _: Value = self.invoke("createDeck", Some(json!({ "deck": deck })))?;
        Ok(())
    }

    fn add_note(&self, deck: &str, card: &Card) -> Result<CardId, StoreError> {
        let mut fields = serde_json::Map::new();
        fields.insert(self.front_field.clone(), Value::String(card.front.clone()));
        fields.insert(self.back_field.clone(), Value::String(card.back.clone()));

        let params = json!({
            "note": {
                "deckName": deck,
                "modelName": self.model,
                "fields": fields,
                "tags": card.tag_list(),
                "options": {
                    "allowDuplicate": false,
                    "duplicateScope": "deck"
                }
            }
        });

        let id: Option<i64> = self.invoke("addNote", Some(params))?;
        id.map(CardId)
            .ok_or_else(|| StoreError::MalformedResponse("addNote returned no note id".to_string()))
    }

    fn find_notes(&self, deck: &str, front: &str) -> Result<Vec<CardId>, StoreError> {
        let query = search_query(deck, &self.front_field, front);
        let ids: Vec<i64> = self.invoke("findNotes", Some(json!({ "query": query })))?;
        Ok(ids.into_iter().map(CardId).collect())
    }
}

/// Decode an AnkiConnect envelope: `{"result": ..., "error": null | "message"}`
fn parse_response<T: DeserializeOwned>(action: &str, body: &str) -> Result<T, StoreError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| StoreError::MalformedResponse(format!("{}: {}", action, e)))?;

    let object = value.as_object().ok_or_else(|| {
        StoreError::MalformedResponse(format!("{}: response is not an object", action))
    })?;

    if !object.contains_key("result") || !object.contains_key("error") {
        return Err(StoreError::MalformedResponse(format!(
            "{}: response lacks result/error fields",
            action
        )));
    }

    match object.get("error") {
        Some(Value::Null) | None => {}
        Some(Value::String(message)) => return Err(classify_error(message)),
        Some(other) => return Err(classify_error(&other.to_string())),
    }

    let result = object.get("result").cloned().unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| StoreError::MalformedResponse(format!("{}: {}", action, e)))
}

fn classify_error(message: &str) -> StoreError {
    if message.to_lowercase().contains("duplicate") {
        StoreError::Duplicate(message.to_string())
    } else {
        StoreError::Api(message.to_string())
    }
}

/// Anki search matching one front value inside one deck
fn search_query(deck: &str, front_field: &str, front: &str) -> String {
    format!(
        "\"deck:{}\" \"{}:{}\"",
        escape_search(deck),
        escape_search(front_field),
        escape_search(front)
    )
}

/// Escape Anki search syntax inside a quoted term
fn escape_search(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
