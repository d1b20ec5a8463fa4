use crate::types::{PushMessage, RecipientSelector};
use serde_json::{json, Value};

use super::config::{NOTIFY_ALL, NOTIFY_GROUPS, NOTIFY_USERS};

/// Builds the `POST /api/v2/news` body for one message.
///
/// Recipients are addressed by external keys; the `instructions` block tells
/// Divera which field each list maps onto.
pub fn news_v2_payload(message: &PushMessage) -> Value {
    let none: &[String] = &[];
    let (notification_type, users, groups, rics) = match &message.recipients {
        RecipientSelector::Users(ids) => (NOTIFY_USERS, ids.as_slice(), none, none),
        RecipientSelector::Groups(ids) => (NOTIFY_GROUPS, none, ids.as_slice(), none),
        RecipientSelector::Pagers(ids) => (NOTIFY_ALL, none, none, ids.as_slice()),
    };
    let to_pagers = matches!(message.recipients, RecipientSelector::Pagers(_));

    let (archive, ts_archive) = match message.archive_at {
        Some(at) => (true, json!(at.timestamp())),
        None => (false, json!("")),
    };
    let (lat, lng) = message
        .location
        .map(|loc| (loc.lat, loc.lng))
        .unwrap_or((0.0, 0.0));

    json!({
        "News": {
            "title": message.title,
            "text": message.body,
            "address": "",
            "lat": lat,
            "lng": lng,
            "survey": false,
            "private_mode": true,
            "notification_type": notification_type,
            "send_push": !to_pagers,
            "send_sms": false,
            "send_call": false,
            "send_mail": false,
            "send_pager": to_pagers,
            "archive": archive,
            "ts_archive": ts_archive,
            "cluster": [],
            "group": groups,
            "user_cluster_relation": users,
            "ric": rics,
        },
        "instructions": {
            "group": { "mapping": "title" },
            "user_cluster_relation": { "mapping": "foreign_id" },
            "ric": { "mapping": "name" },
        }
    })
}

/// Builds the URL-encoded query for `GET /api/news`, without `accesskey`.
pub fn legacy_news_query(message: &PushMessage) -> String {
    let recipient_param = match &message.recipients {
        RecipientSelector::Users(_) => "person",
        RecipientSelector::Groups(_) => "group",
        RecipientSelector::Pagers(_) => "ric",
    };

    let mut query = format!(
        "title={}&text={}&{}={}",
        urlencoding::encode(&message.title),
        urlencoding::encode(&message.body),
        recipient_param,
        urlencoding::encode(&message.recipients.ids().join(","))
    );
    if let Some(at) = message.archive_at {
        query.push_str(&format!("&ts_archive={}", at.timestamp()));
    }
    query
}
