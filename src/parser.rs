//! Header and body extraction for one message segment

use crate::types::{HeaderField, MessageSegment};
use mailparse::body::Body;
use mailparse::{DispositionType, ParsedMail};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Marker telling the store to fill in the ingestion time
pub const AUTO_TIMESTAMP: &str = "AUTO";

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\x21-\x39\x3b-\x7e]+):(.*)$").unwrap());

static ORIGINAL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"original_url:([^\n]*)").unwrap());

static WROTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)wrote:").unwrap());

static ON_DATE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"On.*[+,-]\d{2,4}?[,(\s)]").unwrap());

/// Where a segment came from, used for the synthetic fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub list_id: String,
    pub filename: String,
    pub flagged_abuse: bool,
}

impl SourceContext {
    pub fn new(list_id: impl Into<String>, object_name: &str, abuse_marker: &str) -> Self {
        let filename = object_name.rsplit('/').next().unwrap_or(object_name);
        Self {
            list_id: list_id.into(),
            filename: filename.to_string(),
            flagged_abuse: !abuse_marker.is_empty() && object_name.contains(abuse_marker),
        }
    }
}

/// Decoded body parts of one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BodyParts {
    text: String,
    html: String,
    image: String,
}

/// Header block split from the body by the permissive reader
#[derive(Debug, Clone, Default)]
struct HeaderBlock<'a> {
    fields: Vec<(String, String)>,
    /// Raw header lines, envelope line excluded
    head: &'a str,
    body: &'a str,
}

/// Parse one segment into its ordered field stream
///
/// Headers come first, exactly as encountered, followed by the synthetic
/// source fields, the body parts and the reply target recovered from the
/// body text.
#[must_use]
pub fn parse_message(segment: &MessageSegment, context: &SourceContext) -> Vec<HeaderField> {
    let text = segment.text();
    let block = read_headers(strip_envelope(&text));

    let mut fields: Vec<HeaderField> = block
        .fields
        .iter()
        .map(|(name, value)| HeaderField::new(name.as_str(), decode_value(name, value)))
        .collect();

    fields.push(HeaderField::new("mailing_list", context.list_id.as_str()));
    fields.push(HeaderField::new("filename", context.filename.as_str()));
    if context.flagged_abuse {
        fields.push(HeaderField::new("flagged_abuse", true));
    }
    fields.push(HeaderField::new("time_stamp", AUTO_TIMESTAMP));
    if let Some(url) = original_url(&text) {
        fields.push(HeaderField::new("original_url", url));
    }

    let body = extract_body(&block);
    let reply_target = reply_target(&body.text);
    for (name, value) in [
        ("body_text", body.text),
        ("body_html", body.html),
        ("body_image", body.image),
    ] {
        if !value.is_empty() {
            fields.push(HeaderField::new(name, value));
        }
    }
    if let Some(target) = reply_target {
        fields.push(HeaderField::new("body_to", target));
    }

    debug!(
        headers = block.fields.len(),
        fields = fields.len(),
        filename = %context.filename,
        "Parsed message segment"
    );
    fields
}

/// Skip a leading mbox `From ` sender line
fn strip_envelope(text: &str) -> &str {
    if text.starts_with("From ") {
        text.split_once('\n').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

/// Read `Name: value` lines until a blank line or the first non-header line
fn read_headers(text: &str) -> HeaderBlock<'_> {
    let mut block = HeaderBlock::default();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if content.is_empty() {
            block.head = &text[..offset];
            block.body = &text[offset + line.len()..];
            return block;
        }
        if content.starts_with([' ', '\t']) {
            if let Some((_, value)) = block.fields.last_mut() {
                value.push('\n');
                value.push_str(content);
                offset += line.len();
                continue;
            }
        }
        let Some(caps) = HEADER_LINE.captures(content) else {
            break;
        };
        block
            .fields
            .push((caps[1].to_string(), caps[2].trim().to_string()));
        offset += line.len();
    }

    block.head = &text[..offset];
    block.body = &text[offset..];
    block
}

/// Decode RFC 2047 encoded words, keeping the raw value if that fails
fn decode_value(name: &str, value: &str) -> String {
    if !value.contains("=?") {
        return value.to_string();
    }
    let line = format!("{name}: {value}");
    match mailparse::parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(e) => {
            debug!(field = name, "Keeping undecoded header value: {e}");
            value.to_string()
        }
    }
}

fn original_url(text: &str) -> Option<String> {
    ORIGINAL_URL
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Split the body into text, html and image payloads
///
/// Multipart messages contribute every non-attachment `text/plain` part,
/// every `text/html` part and every `image/jpeg` part, each kept in its
/// transfer encoding. A single-part body is the text body as is.
fn extract_body(block: &HeaderBlock<'_>) -> BodyParts {
    let single_part = BodyParts {
        text: block.body.to_string(),
        ..BodyParts::default()
    };
    if block.fields.is_empty() {
        return single_part;
    }

    let mut rebuilt = String::with_capacity(block.head.len() + block.body.len() + 2);
    rebuilt.push_str(block.head);
    if !rebuilt.ends_with('\n') {
        rebuilt.push('\n');
    }
    rebuilt.push('\n');
    rebuilt.push_str(block.body);

    match mailparse::parse_mail(rebuilt.as_bytes()) {
        Ok(mail) if !mail.subparts.is_empty() => {
            let mut parts = BodyParts::default();
            collect_parts(&mail, &mut parts);
            parts
        }
        Ok(_) => single_part,
        Err(e) => {
            debug!("MIME structure unreadable, using raw body: {e}");
            single_part
        }
    }
}

fn collect_parts(mail: &ParsedMail<'_>, parts: &mut BodyParts) {
    for part in &mail.subparts {
        if !part.subparts.is_empty() {
            collect_parts(part, parts);
            continue;
        }
        match part.ctype.mimetype.to_lowercase().as_str() {
            "text/plain" if !is_attachment(part) => parts.text.push_str(&raw_payload(part)),
            "text/html" => parts.html.push_str(&raw_payload(part)),
            "image/jpeg" => parts.image.push_str(&raw_payload(part)),
            _ => {}
        }
    }
}

fn is_attachment(part: &ParsedMail<'_>) -> bool {
    part.get_content_disposition().disposition == DispositionType::Attachment
}

/// Part payload as stored, without undoing its transfer encoding
fn raw_payload(part: &ParsedMail<'_>) -> String {
    let raw = match part.get_body_encoded() {
        Body::Base64(body) | Body::QuotedPrintable(body) => body.get_raw(),
        Body::SevenBit(body) | Body::EightBit(body) => body.get_raw(),
        Body::Binary(body) => body.get_raw(),
    };
    String::from_utf8_lossy(raw).into_owned()
}

/// Recover the `<someone> wrote:` reply target from the start of a body
#[must_use]
pub fn reply_target(body_text: &str) -> Option<String> {
    let caps = WROTE.captures(body_text)?;
    let mut target = caps.get(1)?.as_str();

    let mut pieces = ON_DATE_CLAUSE.split(target);
    pieces.next();
    if let Some(after_date) = pieces.next() {
        target = after_date;
    }

    let target = target.trim();
    (!target.is_empty()).then(|| target.to_string())
}
