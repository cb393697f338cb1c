//! Discord webhook notifications

use super::{EventKind, LifecycleEvent, NotificationSink};
use crate::config::DiscordConfig;
use crate::core::Note;
use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Discord rejects embed field values longer than this many characters
const FIELD_LIMIT: usize = 1024;
const ELLIPSIS: &str = "…";

#[derive(Debug, Serialize)]
struct Payload {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    fields: Vec<Field>,
    timestamp: String,
    footer: Footer,
}

#[derive(Debug, Serialize)]
struct Field {
    name: &'static str,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct Footer {
    text: String,
}

/// Embed colors per event kind, parsed from `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    opened: u32,
    elevated: u32,
    completed: u32,
    closed: u32,
}

impl Palette {
    fn from_config(config: &DiscordConfig) -> anyhow::Result<Self> {
        Ok(Self {
            opened: parse_color(&config.opened_embed_color)?,
            elevated: parse_color(&config.elevated_embed_color)?,
            completed: parse_color(&config.completed_embed_color)?,
            closed: parse_color(&config.closed_embed_color)?,
        })
    }

    const fn color(&self, kind: EventKind) -> u32 {
        match kind {
            EventKind::Created => self.opened,
            EventKind::Elevated => self.elevated,
            EventKind::Completed => self.completed,
            EventKind::Closed => self.closed,
        }
    }
}

fn parse_color(value: &str) -> anyhow::Result<u32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        bail!("embed color {value:?} is not of the form #RRGGBB");
    }
    u32::from_str_radix(hex, 16).with_context(|| format!("invalid embed color {value:?}"))
}

const fn title_prefix(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Created => "New ModReq Created",
        EventKind::Elevated => "ModReq Elevated",
        EventKind::Completed => "ModReq Completed",
        EventKind::Closed => "ModReq Closed",
    }
}

const fn staff_label(kind: EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Created => None,
        EventKind::Elevated => Some("Elevated by"),
        EventKind::Completed => Some("Completed by"),
        EventKind::Closed => Some("Closed by"),
    }
}

/// One line per note, oldest first. Past [`FIELD_LIMIT`] the oldest lines
/// are dropped behind a leading ellipsis.
fn notes_value(notes: &[Note]) -> String {
    let lines: Vec<String> = notes
        .iter()
        .map(|note| format!("**{}**: {}", note.author.name, note.content))
        .collect();
    let full = lines.join("\n");
    if full.chars().count() <= FIELD_LIMIT {
        return full;
    }

    let budget = FIELD_LIMIT - ELLIPSIS.chars().count() - 1;
    let mut kept = Vec::new();
    let mut used = 0;
    for line in lines.iter().rev() {
        let len = line.chars().count() + usize::from(!kept.is_empty());
        if used + len > budget {
            break;
        }
        used += len;
        kept.push(line.as_str());
    }

    if kept.is_empty() {
        // The newest note alone is too long; keep its end
        let skip = full.chars().count() - budget;
        return format!("{ELLIPSIS}\n{}", full.chars().skip(skip).collect::<String>());
    }
    kept.reverse();
    format!("{ELLIPSIS}\n{}", kept.join("\n"))
}

/// Posts a Discord embed for every lifecycle event
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    palette: Palette,
}

impl WebhookSink {
    /// Build a sink from the `discord` configuration section
    pub fn new(config: &DiscordConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: config.webhook_url.trim().to_string(),
            palette: Palette::from_config(config)?,
        })
    }

    fn payload(&self, event: &LifecycleEvent) -> Payload {
        let ticket = &event.ticket;
        let mut fields = vec![
            Field {
                name: "Player",
                value: ticket.reporter.name.clone(),
                inline: true,
            },
            Field {
                name: "Status",
                value: ticket.status.as_str().to_string(),
                inline: true,
            },
        ];

        if let Some(location) = &ticket.location {
            fields.push(Field {
                name: "Location",
                value: location.to_string(),
                inline: false,
            });
        }

        if let (Some(label), Some(actor)) = (staff_label(event.kind), &event.actor) {
            fields.push(Field {
                name: label,
                value: actor.clone(),
                inline: true,
            });
        }

        if !ticket.notes.is_empty() {
            fields.push(Field {
                name: "Notes",
                value: notes_value(&ticket.notes),
                inline: false,
            });
        }

        Payload {
            embeds: vec![Embed {
                title: format!("{} - {}", title_prefix(event.kind), ticket.id),
                description: ticket.description.clone(),
                color: self.palette.color(event.kind),
                fields,
                timestamp: event.at.to_rfc3339(),
                footer: Footer {
                    text: format!("ModReq {}", ticket.id),
                },
            }],
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "discord"
    }

    async fn deliver(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(event))
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("webhook returned {status}: {body}");
        }

        debug!(kind = %event.kind, ticket = %event.ticket.id, "Delivered webhook notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Actor, Location, NoteBuilder, Status, TicketBuilder, TicketId};
    use mockito::Matcher;
    use serde_json::json;

    fn config(url: String) -> DiscordConfig {
        DiscordConfig {
            enabled: true,
            webhook_url: url,
            ..DiscordConfig::default()
        }
    }

    fn completed_event() -> LifecycleEvent {
        let ticket = TicketBuilder::new()
            .id(TicketId::new(12))
            .reporter(Actor::from_name("alice"))
            .description("stuck in wall")
            .status(Status::Completed)
            .location(Some(Location::new("overworld", 10.0, 64.0, -3.0)))
            .note(
                NoteBuilder::new()
                    .author(Actor::from_name("bob"))
                    .content("freed")
                    .build(),
            )
            .build();
        LifecycleEvent::new(EventKind::Completed, ticket, Some("bob".to_string()))
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#00FF00").unwrap(), 0x00FF00);
        assert_eq!(parse_color("303030").unwrap(), 0x303030);
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_invalid_color_rejected_at_construction() {
        let mut config = config("http://localhost/hook".to_string());
        config.closed_embed_color = "grey".to_string();
        assert!(WebhookSink::new(&config).is_err());
    }

    #[test]
    fn test_payload_fields() {
        let sink = WebhookSink::new(&config("http://localhost/hook".to_string())).unwrap();
        let payload = serde_json::to_value(sink.payload(&completed_event())).unwrap();
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "ModReq Completed - #12");
        assert_eq!(embed["color"], 0xFF0000);
        assert_eq!(embed["footer"]["text"], "ModReq #12");
        assert_eq!(embed["fields"][0], json!({"name": "Player", "value": "alice", "inline": true}));
        assert_eq!(embed["fields"][1]["value"], "COMPLETED");
        assert_eq!(embed["fields"][2]["value"], "overworld (10, 64, -3)");
        assert_eq!(embed["fields"][3]["name"], "Completed by");
        assert_eq!(embed["fields"][4]["value"], "**bob**: freed");
    }

    #[test]
    fn test_long_notes_keep_newest_within_limit() {
        let mut event = completed_event();
        event.ticket.notes = (0..4)
            .map(|n| {
                NoteBuilder::new()
                    .author(Actor::from_name("bob"))
                    .content(format!("{n}{}", "x".repeat(499)))
                    .build()
            })
            .collect();

        let sink = WebhookSink::new(&config("http://localhost/hook".to_string())).unwrap();
        let payload = serde_json::to_value(sink.payload(&event)).unwrap();
        let notes = payload["embeds"][0]["fields"][4]["value"].as_str().unwrap();

        assert!(notes.chars().count() <= FIELD_LIMIT);
        assert!(notes.starts_with(ELLIPSIS));
        assert!(notes.ends_with(&format!("**bob**: 3{}", "x".repeat(499))));
        assert!(!notes.contains("**bob**: 0"));
    }

    #[test]
    fn test_short_notes_are_not_truncated() {
        let notes = completed_event().ticket.notes;
        assert_eq!(notes_value(&notes), "**bob**: freed");
    }

    #[tokio::test]
    async fn test_deliver_posts_embed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Regex(
                r#""title":"ModReq Completed - #12""#.to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;

        let sink = WebhookSink::new(&config(format!("{}/hook", server.url()))).unwrap();
        sink.deliver(&completed_event()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_reports_http_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let sink = WebhookSink::new(&config(format!("{}/hook", server.url()))).unwrap();
        let error = sink.deliver(&completed_event()).await.unwrap_err();
        assert!(error.to_string().contains("500"));
    }
}
