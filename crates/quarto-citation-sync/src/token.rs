/*
 * token.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Citation tokens and the region tag schema that carries them.
 */

//! Citation tokens and their tag encoding.
//!
//! A token is the durable per-citation state attached to one citation region:
//! identity (`citation_uuid`, `source_id`, `doc_id`), the style it was rendered
//! with, and a cache of the last render. Tokens travel inside the region's tag,
//! a free-text string the host lets anyone edit, so decoding never fails hard:
//! [`decode_tag`] classifies what it finds and callers skip anything that is not
//! [`RegionTag::Citation`].
//!
//! Wire form (schema 1):
//!
//! ```text
//! {"schema":1,"citation_uuid":"…","source_id":"…","locator":"…","doc_id":"…",
//!  "style_id":"…","render_mode":"auto","cached_text":"…",
//!  "cached_style_version":"…","cached_render_hash":"…"}
//! ```
//!
//! Tags written before the `schema` key existed decode as schema 1.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::service::RenderedCitation;

/// Schema version written by [`serialize_token`].
pub const TOKEN_SCHEMA_VERSION: u32 = 1;

/// Render mode used when none is given.
pub const DEFAULT_RENDER_MODE: &str = "auto";

/// Per-citation state stored in a citation region's tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationToken {
    /// Assigned by the remote service at creation; never changes.
    pub citation_uuid: String,

    /// Cited source. Citing another source means creating a new citation.
    pub source_id: String,

    /// Page/section qualifier, empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub locator: String,

    /// Remote document id of the owning document.
    pub doc_id: String,

    /// Style active when the citation was last rendered.
    #[serde(default, deserialize_with = "null_as_default")]
    pub style_id: String,

    #[serde(default = "default_render_mode", deserialize_with = "null_as_render_mode")]
    pub render_mode: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cached_text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cached_style_version: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cached_render_hash: String,
}

/// Inputs for [`build_token`].
///
/// The four identity fields are required; everything else falls back to its
/// documented default.
#[derive(Debug, Clone, Default)]
pub struct TokenFields {
    pub citation_uuid: String,
    pub source_id: String,
    pub doc_id: String,
    pub style_id: String,
    pub locator: Option<String>,
    pub render_mode: Option<String>,
    pub cached_text: Option<String>,
    pub cached_style_version: Option<String>,
    pub cached_render_hash: Option<String>,
}

/// Build a token, applying defaults for the optional fields.
pub fn build_token(fields: TokenFields) -> CitationToken {
    CitationToken {
        citation_uuid: fields.citation_uuid,
        source_id: fields.source_id,
        locator: fields.locator.unwrap_or_default(),
        doc_id: fields.doc_id,
        style_id: fields.style_id,
        render_mode: fields
            .render_mode
            .filter(|mode| !mode.is_empty())
            .unwrap_or_else(default_render_mode),
        cached_text: fields.cached_text.unwrap_or_default(),
        cached_style_version: fields.cached_style_version.unwrap_or_default(),
        cached_render_hash: fields.cached_render_hash.unwrap_or_default(),
    }
}

impl CitationToken {
    /// Refresh the cache fields from a render response.
    ///
    /// This is the only place cache state changes. `cached_text` always follows
    /// the render (empty when the render has no plain text). The style version
    /// and render hash are only replaced when the response actually carries
    /// one, so an absent value never clears what was cached before.
    pub fn update_with_render(
        &mut self,
        render: &RenderedCitation,
        style_version: Option<&str>,
    ) -> &mut Self {
        self.cached_text = render.plain_text.clone().unwrap_or_default();

        if let Some(version) = style_version.filter(|v| !v.is_empty()) {
            self.cached_style_version = version.to_string();
        }

        if let Some(hash) = render.render_hash().filter(|h| !h.is_empty()) {
            self.cached_render_hash = hash.to_string();
        }

        self
    }

    /// Whether the cached render predates `style_version`.
    ///
    /// A token that was never stamped with a version is always stale.
    pub fn is_stale_for(&self, style_version: &str) -> bool {
        self.cached_style_version.is_empty() || self.cached_style_version != style_version
    }
}

/// Result of decoding a region tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionTag {
    Citation(CitationToken),
    /// No tag, or an empty/whitespace tag.
    Empty,
    /// Not JSON, not an object, or missing required identity fields.
    Corrupt { reason: String },
    /// Written by a newer client than this one.
    UnsupportedSchema(u32),
}

impl RegionTag {
    /// The token, if this tag carries a usable one.
    pub fn into_token(self) -> Option<CitationToken> {
        match self {
            RegionTag::Citation(token) => Some(token),
            _ => None,
        }
    }
}

/// Decode a raw region tag.
pub fn decode_tag(tag: Option<&str>) -> RegionTag {
    let Some(raw) = tag.map(str::trim).filter(|t| !t.is_empty()) else {
        return RegionTag::Empty;
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            return RegionTag::Corrupt {
                reason: format!("invalid JSON: {}", e),
            };
        }
    };

    let Some(object) = value.as_object() else {
        return RegionTag::Corrupt {
            reason: "tag is not a JSON object".to_string(),
        };
    };

    let schema = match object.get("schema") {
        None | Some(Value::Null) => TOKEN_SCHEMA_VERSION,
        Some(v) => match v.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => n,
            None => {
                return RegionTag::Corrupt {
                    reason: format!("invalid schema value: {}", v),
                };
            }
        },
    };
    if schema > TOKEN_SCHEMA_VERSION {
        return RegionTag::UnsupportedSchema(schema);
    }

    match serde_json::from_value::<CitationToken>(value) {
        Ok(token) if token.citation_uuid.is_empty() => RegionTag::Corrupt {
            reason: "empty citation_uuid".to_string(),
        },
        Ok(token) => RegionTag::Citation(token),
        Err(e) => RegionTag::Corrupt {
            reason: e.to_string(),
        },
    }
}

/// Decode a tag into a token, or `None` for anything that is not a citation.
pub fn parse_token(tag: Option<&str>) -> Option<CitationToken> {
    decode_tag(tag).into_token()
}

#[derive(Serialize)]
struct TagEnvelope<'a> {
    schema: u32,
    #[serde(flatten)]
    token: &'a CitationToken,
}

/// Encode a token as a region tag at the current schema.
pub fn serialize_token(token: &CitationToken) -> String {
    let envelope = TagEnvelope {
        schema: TOKEN_SCHEMA_VERSION,
        token,
    };
    // Plain strings and an integer: serialization cannot fail.
    serde_json::to_string(&envelope).unwrap_or_default()
}

fn default_render_mode() -> String {
    DEFAULT_RENDER_MODE.to_string()
}

fn null_as_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_render_mode<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|mode| !mode.is_empty())
        .unwrap_or_else(default_render_mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RenderMetadata;
    use proptest::prelude::*;

    fn sample_token() -> CitationToken {
        build_token(TokenFields {
            citation_uuid: "c-1".to_string(),
            source_id: "S1".to_string(),
            doc_id: "d-1".to_string(),
            style_id: "chicago".to_string(),
            locator: Some("p.12".to_string()),
            ..Default::default()
        })
    }

    fn render(plain_text: Option<&str>, hash: Option<&str>) -> RenderedCitation {
        RenderedCitation {
            plain_text: plain_text.map(str::to_string),
            runs: Vec::new(),
            metadata: RenderMetadata {
                render_hash: hash.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[test]
    fn build_applies_defaults() {
        let token = build_token(TokenFields {
            citation_uuid: "c-1".to_string(),
            source_id: "S1".to_string(),
            doc_id: "d-1".to_string(),
            style_id: "chicago".to_string(),
            ..Default::default()
        });
        assert_eq!(token.locator, "");
        assert_eq!(token.render_mode, "auto");
        assert_eq!(token.cached_text, "");
        assert_eq!(token.cached_style_version, "");
        assert_eq!(token.cached_render_hash, "");
    }

    #[test]
    fn wire_form_carries_schema() {
        insta::assert_snapshot!(
            serialize_token(&sample_token()),
            @r#"{"schema":1,"citation_uuid":"c-1","source_id":"S1","locator":"p.12","doc_id":"d-1","style_id":"chicago","render_mode":"auto","cached_text":"","cached_style_version":"","cached_render_hash":""}"#
        );
    }

    #[test]
    fn parse_rejects_empty_and_malformed_tags() {
        assert_eq!(parse_token(None), None);
        assert_eq!(parse_token(Some("")), None);
        assert_eq!(parse_token(Some("   ")), None);
        assert_eq!(parse_token(Some("not json")), None);
        assert_eq!(parse_token(Some("[1,2,3]")), None);
        assert_eq!(parse_token(Some("{\"source_id\":\"S1\"}")), None);
        assert_eq!(parse_token(Some("{\"citation_uuid\":\"\",\"source_id\":\"S1\",\"doc_id\":\"d\"}")), None);
    }

    #[test]
    fn decode_classifies_failures() {
        assert_eq!(decode_tag(None), RegionTag::Empty);
        assert!(matches!(decode_tag(Some("{oops")), RegionTag::Corrupt { .. }));
        assert!(matches!(
            decode_tag(Some("{\"schema\":\"one\",\"citation_uuid\":\"c\"}")),
            RegionTag::Corrupt { .. }
        ));
        assert_eq!(
            decode_tag(Some("{\"schema\":7,\"citation_uuid\":\"c\"}")),
            RegionTag::UnsupportedSchema(7)
        );
    }

    #[test]
    fn legacy_tag_without_schema_decodes() {
        let legacy = r#"{"citation_uuid":"c-9","source_id":"S2","locator":"","doc_id":"d-1","style_id":null,"render_mode":"auto","cached_text":"Smith, 2020","cached_style_version":"3","cached_render_hash":"abc"}"#;
        let token = parse_token(Some(legacy)).expect("legacy tag should decode");
        assert_eq!(token.citation_uuid, "c-9");
        assert_eq!(token.style_id, "");
        assert_eq!(token.cached_text, "Smith, 2020");
        assert_eq!(token.cached_style_version, "3");
    }

    #[test]
    fn absent_optional_fields_normalize_to_defaults() {
        let minimal = r#"{"citation_uuid":"c-1","source_id":"S1","doc_id":"d-1","style_id":"chicago"}"#;
        let token = parse_token(Some(minimal)).unwrap();
        assert_eq!(
            token,
            build_token(TokenFields {
                citation_uuid: "c-1".to_string(),
                source_id: "S1".to_string(),
                doc_id: "d-1".to_string(),
                style_id: "chicago".to_string(),
                ..Default::default()
            })
        );
    }

    #[test]
    fn update_keeps_version_and_hash_when_absent() {
        let mut token = sample_token();
        token.update_with_render(&render(Some("Smith, 2020, p.12"), Some("h1")), Some("4"));
        assert_eq!(token.cached_text, "Smith, 2020, p.12");
        assert_eq!(token.cached_style_version, "4");
        assert_eq!(token.cached_render_hash, "h1");

        token.update_with_render(&render(None, None), None);
        assert_eq!(token.cached_text, "");
        assert_eq!(token.cached_style_version, "4");
        assert_eq!(token.cached_render_hash, "h1");

        token.update_with_render(&render(Some("x"), Some("")), Some(""));
        assert_eq!(token.cached_style_version, "4");
        assert_eq!(token.cached_render_hash, "h1");
    }

    #[test]
    fn staleness_follows_cached_version() {
        let mut token = sample_token();
        assert!(token.is_stale_for("4"));
        token.update_with_render(&render(Some("x"), None), Some("4"));
        assert!(!token.is_stale_for("4"));
        assert!(token.is_stale_for("5"));
    }

    fn field() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,:\"\\\\{}-]{0,16}"
    }

    proptest! {
        #[test]
        fn serialized_tokens_parse_back(
            citation_uuid in "[a-f0-9-]{1,36}",
            source_id in field(),
            locator in field(),
            doc_id in field(),
            style_id in field(),
            cached_text in field(),
            cached_style_version in field(),
            cached_render_hash in field(),
        ) {
            let token = build_token(TokenFields {
                citation_uuid,
                source_id,
                doc_id,
                style_id,
                locator: Some(locator),
                render_mode: None,
                cached_text: Some(cached_text),
                cached_style_version: Some(cached_style_version),
                cached_render_hash: Some(cached_render_hash),
            });
            let tag = serialize_token(&token);
            prop_assert_eq!(parse_token(Some(&tag)), Some(token));
        }
    }
}
