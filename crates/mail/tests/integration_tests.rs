//! Integration tests for the mail crate
//!
//! These tests drive the complete flow from a Gmail message source through
//! decoding, the mailbox and the voice controller.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mail::gmail::api::{
    GmailMessage, Header, ListMessagesResponse, MessageBody, MessagePart, MessagePayload,
    MessageRef,
};
use mail::gmail::decode::{base64url_decode, decode_header_value, extract_body, get_header};
use mail::{
    Category, EmailId, FetchError, FetchOptions, InMemorySessionStore, LanguageModel, Mailbox,
    MessageSource, SessionStore, Speaker, UnauthorizedError, VoiceCommand, VoiceController,
    fetch_emails,
};

/// In-memory stand-in for the Gmail API
struct FakeGmail {
    messages: HashMap<String, fn() -> GmailMessage>,
    unauthorized: bool,
}

impl FakeGmail {
    fn new() -> Self {
        let mut messages: HashMap<String, fn() -> GmailMessage> = HashMap::new();
        messages.insert("m1".to_string(), project_update);
        messages.insert("m2".to_string(), cafe_invite);
        messages.insert("m3".to_string(), corrupt_body);
        messages.insert("m4".to_string(), html_only);
        Self {
            messages,
            unauthorized: false,
        }
    }
}

impl MessageSource for FakeGmail {
    fn list_messages(&self, _token: &str, _query: &str, max: usize) -> Result<ListMessagesResponse> {
        if self.unauthorized {
            return Err(UnauthorizedError.into());
        }
        let mut ids: Vec<&String> = self.messages.keys().collect();
        ids.sort();
        Ok(ListMessagesResponse {
            messages: Some(
                ids.into_iter()
                    .take(max)
                    .map(|id| MessageRef {
                        id: Some(id.clone()),
                        thread_id: Some(format!("t-{}", id)),
                    })
                    .collect(),
            ),
            ..Default::default()
        })
    }

    fn get_message(&self, _token: &str, id: &str) -> Result<GmailMessage> {
        let build = self
            .messages
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("HTTP 404 for message {}", id))?;
        Ok(build())
    }
}

fn message(id: &str, date: i64, headers: Vec<Header>, payload: MessagePayload) -> GmailMessage {
    GmailMessage {
        id: Some(id.to_string()),
        internal_date: Some(date.to_string()),
        payload: Some(MessagePayload {
            headers: Some(headers),
            ..payload
        }),
        ..Default::default()
    }
}

fn part(mime_type: &str, data: &str) -> MessagePart {
    MessagePart {
        mime_type: Some(mime_type.to_string()),
        body: Some(MessageBody::with_data(data)),
        ..Default::default()
    }
}

/// Unread multipart message with an encoded sender name
fn project_update() -> GmailMessage {
    let mut msg = message(
        "m1",
        1_700_000_300_000,
        vec![
            Header::new("From", "=?UTF-8?B?Q2Fmw6k=?= <cafe@example.com>"),
            Header::new("To", "me@example.com"),
            Header::new("Subject", "Project Update"),
        ],
        MessagePayload {
            mime_type: Some("multipart/alternative".to_string()),
            parts: Some(vec![
                part("text/html", "PHA-aHRtbCBvbmx5PC9wPg"),
                part("text/plain", "SGkgdGVhbSwKVGhlIGRlc2lnbiBwaGFzZSBpcyBjb21wbGV0ZS4"),
            ]),
            ..Default::default()
        },
    );
    msg.label_ids = Some(vec!["INBOX".to_string(), "UNREAD".to_string()]);
    msg
}

/// Single-part message with a Q-encoded subject
fn cafe_invite() -> GmailMessage {
    message(
        "m2",
        1_700_000_200_000,
        vec![
            Header::new("From", "Bob Williams <bob@example.com>"),
            Header::new("Subject", "=?ISO-8859-1?Q?Caf=E9_at_noon?="),
        ],
        MessagePayload {
            mime_type: Some("text/plain".to_string()),
            body: Some(MessageBody::with_data("Q2Fmw6kgYXQgbm9vbg")),
            ..Default::default()
        },
    )
}

fn corrupt_body() -> GmailMessage {
    message(
        "m3",
        1_700_000_400_000,
        vec![Header::new("Subject", "Broken")],
        MessagePayload {
            body: Some(MessageBody::with_data("not*base64!")),
            ..Default::default()
        },
    )
}

/// Multipart message without a plain-text part
fn html_only() -> GmailMessage {
    message(
        "m4",
        1_700_000_100_000,
        vec![Header::new("Subject", "Newsletter")],
        MessagePayload {
            parts: Some(vec![part("text/html", "PHA-aHRtbCBvbmx5PC9wPg")]),
            ..Default::default()
        },
    )
}

fn signed_in() -> InMemorySessionStore {
    let store = InMemorySessionStore::new();
    store.create_session("access-token").unwrap();
    store
}

#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.spoken.lock().unwrap())
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Answers summaries and questions with fixed JSON
struct CannedAssistant;

impl LanguageModel for CannedAssistant {
    fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("Summarize the following email") {
            Ok("```json\n{\"summary\": \"The design phase is done.\"}\n```".to_string())
        } else {
            Ok(r#"{"response": "Bob invited you for coffee.", "updatedContext": "User asked about Bob."}"#.to_string())
        }
    }
}

#[test]
fn test_fetch_decodes_and_orders_messages() {
    let outcome = fetch_emails(&FakeGmail::new(), &signed_in(), &FetchOptions::default()).unwrap();

    let ids: Vec<&str> = outcome.emails.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m4"]);
    assert_eq!(outcome.stats.messages_listed, 4);
    assert_eq!(outcome.stats.messages_decoded, 3);
    assert_eq!(outcome.stats.messages_dropped, 1);

    let update = &outcome.emails[0];
    assert_eq!(update.from, "Café <cafe@example.com>");
    assert_eq!(update.sender().short_name(), "Café");
    assert_eq!(update.body, "Hi team,\nThe design phase is complete.");
    assert!(!update.read);

    let invite = &outcome.emails[1];
    assert_eq!(invite.subject, "Café at noon");
    assert_eq!(invite.body, "Café at noon");
    assert_eq!(invite.to, "");
    assert!(invite.read);

    assert_eq!(outcome.emails[2].body, "");
    assert!(outcome.emails.iter().all(|e| e.category == Category::Inbox));
}

#[test]
fn test_fetch_respects_max_results() {
    let options = FetchOptions {
        max_results: 2,
        ..FetchOptions::default()
    };
    let outcome = fetch_emails(&FakeGmail::new(), &signed_in(), &options).unwrap();
    let ids: Vec<&str> = outcome.emails.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2"]);
}

#[test]
fn test_expired_access_signs_out() {
    let sessions = signed_in();
    let mut gmail = FakeGmail::new();
    gmail.unauthorized = true;

    let result = fetch_emails(&gmail, &sessions, &FetchOptions::default());
    assert!(matches!(result, Err(FetchError::Unauthorized)));
    assert!(sessions.get_session().unwrap().is_none());

    let again = fetch_emails(&FakeGmail::new(), &sessions, &FetchOptions::default());
    assert!(matches!(again, Err(FetchError::Unauthorized)));
}

#[test]
fn test_voice_session() {
    let outcome = fetch_emails(&FakeGmail::new(), &signed_in(), &FetchOptions::default()).unwrap();
    let mut mailbox = Mailbox::new();
    mailbox.set_emails(outcome.emails);
    assert_eq!(mailbox.unread_counts().inbox, 1);

    let speaker = Arc::new(RecordingSpeaker::default());
    let mut controller = VoiceController::new(mailbox, Arc::new(CannedAssistant), speaker.clone());

    controller.handle_transcript("read this email");
    assert_eq!(
        speaker.take(),
        vec![
            "Reading email from Café <cafe@example.com>. Subject: Project Update. \
             Body: Hi team,\nThe design phase is complete."
        ]
    );

    controller.handle_transcript("summarize");
    assert_eq!(
        speaker.take(),
        vec![
            "Summarizing the email for you.",
            "Here is the summary: The design phase is done."
        ]
    );
    assert_eq!(
        controller.mailbox().summary(&EmailId::new("m1")),
        Some("The design phase is done.")
    );

    assert!(controller.mailbox_mut().select(&EmailId::new("m2")));
    let command = controller.handle_transcript("Any plans with Bob?");
    assert_eq!(command, Some(VoiceCommand::Query("Any plans with Bob?".to_string())));
    assert_eq!(speaker.take(), vec!["Bob invited you for coffee."]);
    assert_eq!(controller.conversation(), "User asked about Bob.");

    controller.handle_transcript("go to drafts");
    assert_eq!(controller.mailbox().category(), Category::Draft);
    assert!(controller.mailbox().filtered().is_empty());
    assert_eq!(speaker.take(), vec!["Showing drafts."]);
}

#[test]
fn test_header_decoding_properties() {
    // Plain text passes through untouched
    for plain in ["", "Hello", "Meeting at 10", "a ?= b", "=?broken"] {
        assert_eq!(decode_header_value(plain), plain);
    }

    // A character split across adjacent encoded-words is rejoined
    assert_eq!(decode_header_value("=?UTF-8?B?Q2Fm?==?UTF-8?B?w6k=?="), "Café");

    // Unknown charsets keep the raw encoded-word
    assert_eq!(
        decode_header_value("=?KOI8-R?B?8tXT08vJyg==?="),
        "=?KOI8-R?B?8tXT08vJyg==?="
    );

    let headers = vec![
        Header::new("Subject", "=?utf-8?q?Hello_World?="),
        Header::new("X-Empty", ""),
    ];
    assert_eq!(get_header(&headers, "Subject"), "Hello World");
    assert_eq!(get_header(&headers, "subject"), "");
    assert_eq!(get_header(&headers, "X-Empty"), "");
    assert_eq!(get_header(&headers, "Date"), "");
}

#[test]
fn test_body_decoding_properties() {
    assert_eq!(base64url_decode("").unwrap(), "");
    assert_eq!(
        base64url_decode("THVuY2ggb24gV2VkbmVzZGF5PyDwn42d").unwrap(),
        "Lunch on Wednesday? 🍝"
    );
    assert!(base64url_decode("bad data!").is_err());

    let payload = MessagePayload {
        parts: Some(vec![MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            parts: Some(vec![part("text/plain", "SGVsbG8")]),
            ..Default::default()
        }]),
        ..Default::default()
    };
    // Nested parts are not searched
    assert_eq!(extract_body(&payload).unwrap(), "");
}
