//! Parser for hub push notifications (Atom feeds with `yt:` extensions).

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::NotificationError;

/// One `<entry>` of a notification feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    VideoId,
    ChannelId,
    Title,
    Other,
}

/// Parse a notification body into its entries, in document order.
///
/// A feed with a single entry and a feed with many both produce a list.
/// Deleted-entry notices (`<at:deleted-entry>`) carry no `<entry>` and
/// yield an empty list.
///
/// # Errors
///
/// Returns [`NotificationError`] when the body is not well-formed XML or its
/// root element is not `feed`.
pub fn parse_notification(body: &[u8]) -> Result<Vec<FeedEntry>, NotificationError> {
    let xml = std::str::from_utf8(body).map_err(|_| NotificationError::Encoding)?;
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_root = false;
    let mut current: Option<FeedEntry> = None;
    let mut field = Field::Other;
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let name = name.as_ref();
                if !saw_root {
                    if local_name(name) != b"feed" {
                        return Err(NotificationError::NotAFeed);
                    }
                    saw_root = true;
                    continue;
                }
                field = match name {
                    b"entry" => {
                        current = Some(FeedEntry::default());
                        Field::Other
                    }
                    b"yt:videoId" => Field::VideoId,
                    b"yt:channelId" => Field::ChannelId,
                    b"title" => Field::Title,
                    _ => Field::Other,
                };
            }
            Event::Empty(e) => {
                if !saw_root {
                    return if local_name(e.name().as_ref()) == b"feed" {
                        Ok(entries)
                    } else {
                        Err(NotificationError::NotAFeed)
                    };
                }
            }
            Event::Text(t) => {
                let Some(entry) = current.as_mut() else {
                    continue;
                };
                let text = t.unescape()?.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match field {
                    Field::VideoId => entry.video_id = Some(text),
                    Field::ChannelId => entry.channel_id = Some(text),
                    Field::Title => entry.title = Some(text),
                    Field::Other => {}
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                field = Field::Other;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if saw_root {
        Ok(entries)
    } else {
        Err(NotificationError::NotAFeed)
    }
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|b| *b == b':')
        .map_or(name, |i| &name[i + 1..])
}
