//! Textual feed parsing.
//!
//! Deliberately not a full RSS/Atom parser: the engine only needs
//! title/link/pubDate triples, so this scans for `item` elements by tag
//! name and ignores everything else. Input that cannot be tokenized
//! produces an empty sequence, never an error; callers treat zero items
//! from a brand-new feed as a rejection signal.

use chrono::{DateTime, Utc};

use crate::domain::FeedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
}

/// Extract the items of a feed from raw bytes.
///
/// Text content accumulates between the start and end tags of `title`,
/// `link` and `pubDate` elements nested in an `item`; everything outside
/// an item, and every unknown element, is skipped. Fields are trimmed of
/// surrounding whitespace on emit. Items without a link are dropped, since
/// the link is the identity key.
pub fn parse(bytes: &[u8]) -> Vec<FeedItem> {
    let text = String::from_utf8_lossy(bytes);
    let mut items = Vec::new();

    let mut in_item = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut pub_date = String::new();
    let mut buf = String::new();

    let mut rest: &str = &text;
    while let Some(lt) = rest.find('<') {
        if field.is_some() {
            buf.push_str(&rest[..lt]);
        }
        rest = &rest[lt + 1..];

        // CDATA sections pass through as text
        if let Some(section) = rest.strip_prefix("![CDATA[") {
            let Some(end) = section.find("]]>") else {
                break;
            };
            if field.is_some() {
                buf.push_str(&section[..end]);
            }
            rest = &section[end + 3..];
            continue;
        }

        let Some(gt) = rest.find('>') else {
            break;
        };
        let tag = &rest[..gt];
        rest = &rest[gt + 1..];

        // comments, doctypes, processing instructions
        if tag.starts_with('!') || tag.starts_with('?') {
            continue;
        }

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if closing {
            match name.as_str() {
                "item" if in_item => {
                    let trimmed = link.trim();
                    if !trimmed.is_empty() {
                        let mut item =
                            FeedItem::new(title.trim().to_string(), trimmed.to_string());
                        item.pub_date = parse_date(pub_date.trim());
                        items.push(item);
                    }
                    in_item = false;
                    field = None;
                }
                "title" if field == Some(Field::Title) => {
                    title = buf.clone();
                    field = None;
                }
                "link" if field == Some(Field::Link) => {
                    link = buf.clone();
                    field = None;
                }
                "pubdate" if field == Some(Field::PubDate) => {
                    pub_date = buf.clone();
                    field = None;
                }
                _ => {}
            }
        } else if name == "item" {
            in_item = true;
            field = None;
            title.clear();
            link.clear();
            pub_date.clear();
        } else if in_item && !self_closing {
            let opened = match name.as_str() {
                "title" => Some(Field::Title),
                "link" => Some(Field::Link),
                "pubdate" => Some(Field::PubDate),
                _ => None,
            };
            if let Some(opened) = opened {
                field = Some(opened);
                buf.clear();
            }
        }
    }

    items
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
        <rss version="2.0">
          <channel>
            <title>Channel title is not an item title</title>
            <item>
              <title>  First post  </title>
              <link>http://example.com/1</link>
              <pubDate>Wed, 01 May 2024 10:00:00 GMT</pubDate>
            </item>
            <item>
              <title>Second post</title>
              <link>http://example.com/2</link>
            </item>
          </channel>
        </rss>"#;

    #[test]
    fn test_parses_items_in_order() {
        let items = parse(SAMPLE.as_bytes());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First post");
        assert_eq!(items[0].link, "http://example.com/1");
        assert_eq!(items[1].link, "http://example.com/2");
    }

    #[test]
    fn test_trims_whitespace() {
        let items = parse(SAMPLE.as_bytes());
        assert_eq!(items[0].title, "First post");
    }

    #[test]
    fn test_parses_rfc2822_pub_date() {
        let items = parse(SAMPLE.as_bytes());
        let date = items[0].pub_date.expect("pubDate should parse");
        assert_eq!(date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(items[1].pub_date, None);
    }

    #[test]
    fn test_channel_title_is_ignored() {
        let items = parse(SAMPLE.as_bytes());
        assert_ne!(items[0].title, "Channel title is not an item title");
    }

    #[test]
    fn test_malformed_input_yields_empty() {
        assert!(parse(b"not xml at all").is_empty());
        assert!(parse(b"").is_empty());
        assert!(parse(b"<item><title>truncated").is_empty());
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let xml = r#"<item>
            <guid>ignored</guid>
            <title>Post</title>
            <enclosure url="http://x/audio.mp3"/>
            <link>http://example.com/1</link>
            <description>also ignored</description>
        </item>"#;
        let items = parse(xml.as_bytes());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Post");
        assert_eq!(items[0].link, "http://example.com/1");
    }

    #[test]
    fn test_cdata_content_is_text() {
        let xml = r#"<item>
            <title><![CDATA[Ampersands & <brackets>]]></title>
            <link>http://example.com/1</link>
        </item>"#;
        let items = parse(xml.as_bytes());
        assert_eq!(items[0].title, "Ampersands & <brackets>");
    }

    #[test]
    fn test_item_without_link_is_dropped() {
        let xml = "<item><title>No link</title></item>";
        assert!(parse(xml.as_bytes()).is_empty());
    }

    #[test]
    fn test_tag_names_match_case_insensitively() {
        let xml = r#"<ITEM><TITLE>Post</TITLE><LINK>http://example.com/1</LINK></ITEM>"#;
        let items = parse(xml.as_bytes());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_atom_entries_do_not_match() {
        // only item-tagged elements count; this is not a format-aware parser
        let xml = r#"<feed><entry><title>Atom</title><link href="http://x/1"/></entry></feed>"#;
        assert!(parse(xml.as_bytes()).is_empty());
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let xml = r#"<item>
            <title>Post</title>
            <link>http://example.com/1</link>
            <pubDate>sometime last week</pubDate>
        </item>"#;
        let items = parse(xml.as_bytes());
        assert_eq!(items[0].pub_date, None);
    }
}
