//! Item builders shared by the unit tests.

use chrono::{TimeZone, Utc};
use topicflow_shared::{ContentType, ProcessingItem};

/// A plain-text item without extracted text.
pub(crate) fn item(id: i64, url: &str, title: &str) -> ProcessingItem {
    ProcessingItem {
        id,
        source_id: 1,
        source_name: "test-feed".into(),
        url: url.into(),
        title: title.into(),
        text: None,
        author: None,
        language: None,
        published_at: None,
        media: None,
        metadata: None,
        raw_item_id: id * 10,
        raw_content: String::new(),
        content_type: ContentType::Text,
        fetched_at: Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap(),
    }
}

/// An HTML item whose raw content is `html`.
pub(crate) fn html_item(id: i64, url: &str, html: &str) -> ProcessingItem {
    ProcessingItem {
        raw_content: html.into(),
        content_type: ContentType::Html,
        ..item(id, url, "")
    }
}

/// An item with text already set.
pub(crate) fn text_item(id: i64, title: &str, text: &str) -> ProcessingItem {
    item(id, &format!("https://news.example/{id}"), title).with_text(text)
}

/// Six short news items: three about one model launch, three unrelated.
pub(crate) fn news_items() -> Vec<ProcessingItem> {
    [
        (
            1,
            "OpenAI launches new GPT model",
            "OpenAI launched its new GPT model with stronger reasoning for developers",
        ),
        (
            2,
            "Football championship final tonight",
            "Fans travel across Europe for the championship final in Madrid stadium",
        ),
        (
            3,
            "GPT model launch by OpenAI",
            "The new GPT model from OpenAI launches today with reasoning upgrades for developers",
        ),
        (
            4,
            "Heavy rain floods northern villages",
            "Emergency crews evacuate residents after rivers burst banks overnight",
        ),
        (
            5,
            "OpenAI GPT model launch reaction",
            "Developers react to the OpenAI GPT model launch and its reasoning abilities",
        ),
        (
            6,
            "Central bank keeps interest rates",
            "Inflation slowed so the central bank held borrowing costs steady this quarter",
        ),
    ]
    .into_iter()
    .map(|(id, title, text)| text_item(id, title, text))
    .collect()
}
