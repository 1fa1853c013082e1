//! Summary message composition.

use crate::models::RankedItem;
use crate::nostr::{Event, KIND_TEXT_NOTE, UnsignedEvent, tag};
use std::fmt::Write;

/// Builds the post body: a hashtag header, a blank line, one line per
/// item, and optionally the image URL after another blank line.
#[must_use]
pub fn compose_content(topic: &str, items: &[RankedItem], image_url: Option<&str>) -> String {
    let mut content = format!("#{topic}\n\n");
    for (rank, item) in items.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(content, "{}位: #{} ({})", rank + 1, item.phrase, item.count);
    }
    if let Some(url) = image_url {
        content.push('\n');
        content.push_str(url);
    }
    content
}

/// Builds the unsigned summary event.
///
/// A reply reuses the target's kind, is stamped one second after it, and
/// references the target, its author, and the target's own `e` tags. A
/// top-level post is a text note stamped `now`. Both carry one `t` tag per
/// phrase followed by the topic tag.
#[must_use]
pub fn build_event(
    topic: &str,
    items: &[RankedItem],
    content: String,
    reply_to: Option<&Event>,
    now: i64,
) -> UnsignedEvent {
    let mut event = match reply_to {
        Some(target) => UnsignedEvent::new(target.kind, target.created_at + 1, content),
        None => UnsignedEvent::new(KIND_TEXT_NOTE, now, content),
    };

    for item in items {
        event.add_tag(tag(["t", &item.phrase]));
    }
    if let Some(target) = reply_to {
        event.add_tag(tag(["e", &target.id, "", "reply"]));
        event.add_tag(tag(["p", &target.pubkey]));
        for reference in target.event_references() {
            event.add_tag(reference.clone());
        }
    }
    event.add_tag(tag(["t", topic]));

    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nostr::KIND_CHANNEL_MESSAGE;

    const TOPIC: &str = "バズワードランキング";

    fn items() -> Vec<RankedItem> {
        vec![RankedItem::new("猫", 5), RankedItem::new("犬", 4)]
    }

    #[test]
    fn test_content_layout() {
        assert_eq!(
            compose_content(TOPIC, &items(), None),
            "#バズワードランキング\n\n1位: #猫 (5)\n2位: #犬 (4)\n"
        );
        assert_eq!(
            compose_content(TOPIC, &items(), Some("https://img.example/a.png")),
            "#バズワードランキング\n\n1位: #猫 (5)\n2位: #犬 (4)\n\nhttps://img.example/a.png"
        );
    }

    #[test]
    fn test_top_level_event() {
        let event = build_event(TOPIC, &items(), "body".to_string(), None, 1_700_000_000);
        assert_eq!(event.kind, KIND_TEXT_NOTE);
        assert_eq!(event.created_at, 1_700_000_000);
        assert_eq!(
            event.tags,
            vec![tag(["t", "猫"]), tag(["t", "犬"]), tag(["t", TOPIC])]
        );
    }

    #[test]
    fn test_reply_event_links_target_and_chain() {
        let target = Event {
            id: "target".to_string(),
            pubkey: "author".to_string(),
            created_at: 1_700_000_000,
            kind: KIND_CHANNEL_MESSAGE,
            tags: vec![tag(["e", "channel", "", "root"]), tag(["p", "someone"])],
            ..serde_json::from_str("{}").expect("empty event")
        };

        let event = build_event(TOPIC, &items(), "body".to_string(), Some(&target), 0);
        assert_eq!(event.kind, KIND_CHANNEL_MESSAGE);
        assert_eq!(event.created_at, 1_700_000_001);
        assert_eq!(
            event.tags,
            vec![
                tag(["t", "猫"]),
                tag(["t", "犬"]),
                tag(["e", "target", "", "reply"]),
                tag(["p", "author"]),
                tag(["e", "channel", "", "root"]),
                tag(["t", TOPIC]),
            ]
        );
    }

    #[test]
    fn test_phrase_equal_to_topic_is_tagged_once() {
        let items = vec![RankedItem::new(TOPIC, 3)];
        let event = build_event(TOPIC, &items, String::new(), None, 0);
        assert_eq!(event.tags, vec![tag(["t", TOPIC])]);
    }
}
