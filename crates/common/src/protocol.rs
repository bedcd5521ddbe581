//! Request and response types for the Slack outgoing-webhook integration.
//!
//! Slack delivers outgoing-webhook notifications as
//! `application/x-www-form-urlencoded` bodies. [`SlackRequest`] is the typed
//! form of one notification; [`HelloResponse`] is the JSON body sent back to
//! the triggering channel.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Inbound notification
// ---------------------------------------------------------------------------

/// One outgoing-webhook notification, fully populated.
///
/// Every field is mandatory; the only way to obtain a value is through
/// [`SlackRequest::from_fields`], so no partially-built request is ever
/// observable. One instance lives per HTTP call and is discarded once the
/// response has been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackRequest {
    /// Webhook verification token issued by Slack.
    pub token: String,
    /// Instant the triggering message was posted.
    pub timestamp: DateTime<Utc>,
    /// Team (workspace) identifier.
    pub team_id: String,
    /// Team domain name.
    pub team_domain: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Human-readable channel name.
    pub channel_name: String,
    /// User that triggered the webhook.
    pub user_id: String,
    /// Human-readable user name.
    pub user_name: String,
    /// Configured trigger word that fired the webhook.
    pub trigger_word: String,
    /// Full text of the triggering message.
    pub text: String,
}

impl SlackRequest {
    /// Build a request from decoded form fields.
    ///
    /// Fields are looked up by exact key in a fixed order; parsing stops at
    /// the first missing field.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingField`] if any of the ten mandatory fields is
    /// absent, [`ParseError::BadTimestamp`] if the `timestamp` value cannot
    /// be decoded.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, ParseError> {
        Ok(Self {
            token: field(fields, "token")?.to_owned(),
            timestamp: parse_timestamp(field(fields, "timestamp")?)?,
            team_id: field(fields, "team_id")?.to_owned(),
            team_domain: field(fields, "team_domain")?.to_owned(),
            channel_id: field(fields, "channel_id")?.to_owned(),
            channel_name: field(fields, "channel_name")?.to_owned(),
            user_id: field(fields, "user_id")?.to_owned(),
            user_name: field(fields, "user_name")?.to_owned(),
            trigger_word: field(fields, "trigger_word")?.to_owned(),
            text: field(fields, "text")?.to_owned(),
        })
    }
}

/// Look up a mandatory form field.
fn field<'a>(
    fields: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ParseError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or(ParseError::MissingField(name))
}

/// Decode a Slack timestamp of the form `seconds[.fraction]`.
///
/// The integer part is whole seconds since the Unix epoch; the optional
/// fraction carries 0 to 9 digits after a literal `.` and is right-padded to
/// nanosecond precision. A non-digit in either part, a fraction longer than
/// 9 digits, and any trailing characters are all rejected.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let bad = || ParseError::BadTimestamp(raw.to_owned());

    let (secs_part, frac_part) = match raw.split_once('.') {
        Some((secs, frac)) => (secs, Some(frac)),
        None => (raw, None),
    };

    if secs_part.is_empty() || !secs_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let secs: i64 = secs_part.parse().map_err(|_| bad())?;

    let nanos: u32 = match frac_part {
        None | Some("") => 0,
        Some(frac) => {
            if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let digits: u32 = frac.parse().map_err(|_| bad())?;
            digits * 10u32.pow(9 - frac.len() as u32)
        }
    };

    Utc.timestamp_opt(secs, nanos).single().ok_or_else(bad)
}

// ---------------------------------------------------------------------------
// Outbound greeting
// ---------------------------------------------------------------------------

/// Successful response body for `POST /hello`.
#[derive(Debug, Clone, Serialize)]
pub struct HelloResponse {
    /// Message text posted back to the triggering channel.
    pub text: String,
}

impl HelloResponse {
    /// Build the greeting for `request`, mentioning the triggering user.
    ///
    /// `greeting` is the deployment-specific prefix (e.g. `"Hey"`). The
    /// mention uses Slack's literal `<@USER_ID|USER_NAME>` syntax, user id
    /// first, followed by the `:sunglasses:` shortcode. No escaping is
    /// applied beyond standard JSON string escaping at serialisation time.
    pub fn greet(greeting: &str, request: &SlackRequest) -> Self {
        Self {
            text: format!(
                "{}, <@{}|{}> :sunglasses:",
                greeting, request.user_id, request.user_name
            ),
        }
    }
}
