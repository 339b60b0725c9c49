//! studio-cli — command-line client for the Creator Studio Co-Pilot API
//!
//! Talks to a running `studio-server` over HTTP.
//!
//! # Subcommands
//! - `script <topic> [--tone] [--duration] [--keywords]` — generate and save a video script
//! - `image <prompt> [--style] [--size]`                   — enhance an image prompt
//! - `hashtags <topic> [--platform]`                       — brainstorm hashtags
//! - `analyze <prompt>`                                    — content analysis + suggested tools
//! - `video <prompt>`                                      — editing suggestions
//! - `gallery list|get|delete`                             — browse saved content
//! - `status`                                              — server health

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
const PREVIEW_CHARS: usize = 80;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "studio-cli",
    version,
    about = "Creator Studio Co-Pilot — scripts, image prompts, hashtags and a content gallery"
)]
struct Cli {
    /// Server URL (overrides STUDIO_HTTP_URL env var)
    #[arg(long, env = "STUDIO_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print the raw JSON response
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a video script (saved to the gallery)
    Script {
        topic: String,
        #[arg(long, default_value = "professional")]
        tone: String,
        /// Target length in minutes
        #[arg(long, default_value = "5")]
        duration: String,
        /// Key points to include
        #[arg(long)]
        keywords: Option<String>,
    },

    /// Enhance an image generation prompt (saved to the gallery)
    Image {
        prompt: String,
        #[arg(long, default_value = "realistic")]
        style: String,
        #[arg(long, default_value_t = 1024)]
        size: u32,
    },

    /// Brainstorm hashtags for a topic
    Hashtags {
        topic: String,
        #[arg(long, default_value = "general")]
        platform: String,
    },

    /// Analyze a content idea and suggest tools
    Analyze { prompt: String },

    /// Get video editing suggestions
    Video { prompt: String },

    /// Browse saved content
    Gallery {
        #[command(subcommand)]
        command: GalleryCommands,
    },

    /// Show server status
    Status,
}

#[derive(Debug, Subcommand)]
enum GalleryCommands {
    /// List saved items, optionally of one type
    List {
        #[arg(long = "type")]
        content_type: Option<String>,
    },
    /// Show one item
    Get { id: String },
    /// Delete one item
    Delete { id: String },
}

// ============================================================================
// API Response Types
// ============================================================================

/// A gallery record as returned by `/api/gallery`
#[derive(Debug, Deserialize)]
pub struct GalleryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct GalleryResponse {
    pub items: Vec<GalleryItem>,
    pub count: usize,
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// One-line summary: `<id>  [type]  title  (created_at)`
pub fn format_item_line(item: &GalleryItem) -> String {
    format!(
        "{}  [{}]  {}  ({})",
        item.id, item.content_type, item.title, item.created_at
    )
}

/// First line of `text`, capped at `max` characters with an ellipsis.
pub fn preview(text: &str, max: usize) -> String {
    let first = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if first.chars().count() > max {
        let cut: String = first.chars().take(max).collect();
        format!("{}…", cut)
    } else {
        first.to_string()
    }
}

/// Human-readable message for a failed response body.
pub fn error_message(status: u16, body: &Value) -> String {
    match body["detail"].as_str() {
        Some(detail) => format!("server returned {}: {}", status, detail),
        None => format!("server returned {}", status),
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

struct Api {
    client: Client,
    server: String,
}

impl Api {
    fn new(server: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(self.client.post(self.url(path)).json(&body))
    }

    fn get(&self, path: &str) -> Result<Value> {
        self.send(self.client.get(self.url(path)))
    }

    fn gallery_list_request(&self, content_type: Option<&str>) -> RequestBuilder {
        let request = self.client.get(self.url("/api/gallery"));
        match content_type {
            Some(t) => request.query(&[("content_type", t)]),
            None => request,
        }
    }

    fn delete(&self, path: &str) -> Result<Value> {
        self.send(self.client.delete(self.url(path)))
    }

    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let resp = request
            .send()
            .map_err(|e| anyhow!("connection failed to {}: {}", self.server, e))?;
        let status = resp.status();
        let body: Value = resp.json().unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(anyhow!(error_message(status.as_u16(), &body)));
        }
        Ok(body)
    }
}

fn print_json(body: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let api = Api::new(&cli.server)?;

    match cli.command {
        Commands::Script {
            topic,
            tone,
            duration,
            keywords,
        } => {
            let body = api.post(
                "/api/scripts/generate",
                json!({ "topic": topic, "tone": tone, "duration": duration, "keywords": keywords }),
            )?;
            if cli.json {
                return print_json(&body);
            }
            println!("{}", body["script"].as_str().unwrap_or(""));
            eprintln!("\nSaved as {}", body["content_id"].as_str().unwrap_or("?"));
        }
        Commands::Image {
            prompt,
            style,
            size,
        } => {
            let body = api.post(
                "/api/images/generate",
                json!({ "prompt": prompt, "style": style, "size": size }),
            )?;
            if cli.json {
                return print_json(&body);
            }
            println!("{}", body["enhanced_prompt"].as_str().unwrap_or(""));
            eprintln!("\nSaved as {}", body["content_id"].as_str().unwrap_or("?"));
        }
        Commands::Hashtags { topic, platform } => {
            let body = api.post(
                "/api/hashtags/generate",
                json!({ "topic": topic, "platform": platform }),
            )?;
            if cli.json {
                return print_json(&body);
            }
            let tags: Vec<&str> = body["hashtags"]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            println!("{}", tags.join(" "));
        }
        Commands::Analyze { prompt } => {
            let body = api.post("/api/prompt/process", json!({ "prompt": prompt }))?;
            if cli.json {
                return print_json(&body);
            }
            let suggestions = &body["suggestions"];
            println!("{}", suggestions["analysis"].as_str().unwrap_or(""));
            let tools: Vec<&str> = suggestions["suggested_tools"]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            println!("\nSuggested tools: {}", tools.join(", "));
        }
        Commands::Video { prompt } => {
            let body = api.post("/api/video/suggestions", json!({ "prompt": prompt }))?;
            if cli.json {
                return print_json(&body);
            }
            let suggestions = &body["suggestions"];
            println!(
                "Editing style: {}\n",
                suggestions["editing_style"].as_str().unwrap_or("?")
            );
            println!("{}", suggestions["suggestions"].as_str().unwrap_or(""));
        }
        Commands::Gallery { command } => match command {
            GalleryCommands::List { content_type } => {
                let body = api.send(api.gallery_list_request(content_type.as_deref()))?;
                if cli.json {
                    return print_json(&body);
                }
                let gallery: GalleryResponse = serde_json::from_value(body)?;
                if gallery.items.is_empty() {
                    eprintln!("Gallery is empty");
                    return Ok(());
                }
                for item in &gallery.items {
                    println!("{}", format_item_line(item));
                    let p = preview(&item.content, PREVIEW_CHARS);
                    if !p.is_empty() {
                        println!("    {}", p);
                    }
                }
                eprintln!("\n{} item(s)", gallery.count);
            }
            GalleryCommands::Get { id } => {
                let body = api.get(&format!("/api/gallery/{}", id))?;
                if cli.json {
                    return print_json(&body);
                }
                let item: GalleryItem = serde_json::from_value(body["item"].clone())?;
                println!("{}\n", format_item_line(&item));
                println!("{}", item.content);
            }
            GalleryCommands::Delete { id } => {
                let body = api.delete(&format!("/api/gallery/{}", id))?;
                if cli.json {
                    return print_json(&body);
                }
                println!("{}", body["message"].as_str().unwrap_or("Deleted"));
            }
        },
        Commands::Status => {
            let body = api.get("/health")?;
            if cli.json {
                return print_json(&body);
            }
            println!("Creator Studio: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Timestamp:      {}", body["timestamp"].as_str().unwrap_or("?"));
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("studio-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str) -> GalleryItem {
        GalleryItem {
            id: "7b5c24ab-1234-5678-9abc-def012345678".to_string(),
            content_type: "script".to_string(),
            title: "Octopus facts".to_string(),
            content: content.to_string(),
            created_at: "2026-10-16T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_item_line_contains_id_type_and_title() {
        let line = format_item_line(&item("body"));
        assert_eq!(
            line,
            "7b5c24ab-1234-5678-9abc-def012345678  [script]  Octopus facts  (2026-10-16T10:00:00Z)"
        );
    }

    #[test]
    fn test_preview_uses_first_nonempty_line() {
        assert_eq!(preview("\n\n  Hook line  \nsecond", 80), "Hook line");
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        let long = "é".repeat(100);
        let p = preview(&long, 10);
        assert_eq!(p.chars().count(), 11);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_preview_of_empty_content() {
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let body = json!({ "detail": "Content not found" });
        assert_eq!(error_message(404, &body), "server returned 404: Content not found");
        assert_eq!(error_message(502, &Value::Null), "server returned 502");
    }

    #[test]
    fn test_gallery_response_parses_server_shape() {
        let body = json!({
            "success": true,
            "count": 1,
            "items": [{
                "id": "abc",
                "type": "image",
                "title": "a red fox",
                "content": "",
                "created_at": "2026-10-16T10:00:00Z",
                "metadata": { "style": "realistic", "size": 1024 }
            }]
        });
        let parsed: GalleryResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.items[0].content_type, "image");
    }

    #[test]
    fn test_cli_parses_gallery_list_with_type() {
        let cli = Cli::try_parse_from(["studio-cli", "gallery", "list", "--type", "script"]).unwrap();
        match cli.command {
            Commands::Gallery {
                command: GalleryCommands::List { content_type },
            } => assert_eq!(content_type.as_deref(), Some("script")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_gallery_list_request_encodes_type_filter() {
        let api = Api::new("http://127.0.0.1:8000/").unwrap();

        let filtered = api
            .gallery_list_request(Some("a&b c"))
            .build()
            .unwrap();
        assert_eq!(
            filtered.url().as_str(),
            "http://127.0.0.1:8000/api/gallery?content_type=a%26b+c"
        );

        let all = api.gallery_list_request(None).build().unwrap();
        assert_eq!(all.url().as_str(), "http://127.0.0.1:8000/api/gallery");
    }
}
