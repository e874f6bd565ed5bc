//! Capability negotiation: collapses the client's defensively-nested
//! advertised capabilities into the flat, read-only snapshot the rest of the
//! server consults, chooses an [`OffsetEncoding`], and applies the
//! known-client quirk table.

use lsp_types::{ClientInfo, InitializeParams, MarkupKind, PositionEncodingKind};

/// The unit in which character positions are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetEncoding {
    Utf8,
    Utf16,
    Utf32,
}

impl OffsetEncoding {
    pub fn as_lsp(self) -> PositionEncodingKind {
        match self {
            OffsetEncoding::Utf8 => PositionEncodingKind::UTF8,
            OffsetEncoding::Utf16 => PositionEncodingKind::UTF16,
            OffsetEncoding::Utf32 => PositionEncodingKind::UTF32,
        }
    }

    /// Prefer utf-8, else utf-32, else default to utf-16.
    fn negotiate(offered: &[PositionEncodingKind]) -> OffsetEncoding {
        if offered.iter().any(|e| *e == PositionEncodingKind::UTF8) {
            OffsetEncoding::Utf8
        } else if offered.iter().any(|e| *e == PositionEncodingKind::UTF32) {
            OffsetEncoding::Utf32
        } else {
            OffsetEncoding::Utf16
        }
    }
}

/// Flat, session-frozen snapshot of what the client supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCapabilities {
    pub snippets: bool,
    pub apply_edits: bool,
    pub will_save: bool,
    pub will_save_wait_until: bool,
    pub publish_diagnostics: bool,
    pub code_action_fixall: bool,
    pub hover_markdown: bool,
    pub completion_doc_markdown: bool,
    pub label_details: bool,
    pub configuration_pull: bool,
    pub did_change_configuration_dynamic_registration: bool,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        ClientCapabilities {
            snippets: false,
            apply_edits: false,
            will_save: false,
            will_save_wait_until: false,
            publish_diagnostics: false,
            code_action_fixall: false,
            hover_markdown: false,
            completion_doc_markdown: false,
            label_details: false,
            configuration_pull: false,
            did_change_configuration_dynamic_registration: false,
        }
    }
}

/// Tuning knobs a client quirk may adjust alongside plain capability bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    pub max_detail_length: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning { max_detail_length: 1024 }
    }
}

/// Result of negotiating one `initialize` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    pub capabilities: ClientCapabilities,
    pub offset_encoding: OffsetEncoding,
    pub tuning: Tuning,
    /// Whether message tracing should be enabled because the client's
    /// initial `trace` setting was anything other than `"off"`.
    pub trace_enabled: bool,
}

/// One entry in the known-client quirk registry: a name predicate, an
/// optional semver predicate, and an override applied to the otherwise
/// negotiated snapshot.
struct ClientQuirk {
    name: &'static str,
    /// `None` matches any version of this client.
    version_at_most: Option<&'static str>,
    apply: fn(&mut Negotiated),
}

/// Known editors with quirks that override what they advertise. Kept as a
/// flat table rather than inline branches so adding a quirk never touches
/// the negotiation algorithm itself.
static CLIENT_QUIRKS: &[ClientQuirk] = &[
    ClientQuirk {
        // coc.nvim never advertises code-action-literal support but handles
        // fixAll correctly; force it on rather than lose the feature.
        name: "coc.nvim",
        version_at_most: None,
        apply: |n| n.capabilities.code_action_fixall = true,
    },
    ClientQuirk {
        name: "Sublime Text LSP",
        version_at_most: None,
        apply: |n| n.capabilities.code_action_fixall = false,
    },
    ClientQuirk {
        name: "Visual Studio Code",
        version_at_most: Some("0.0.0"),
        apply: |n| n.tuning.max_detail_length = 256,
    },
];

/// Negotiates capabilities from a decoded `initialize` request.
///
/// Reads every nested capability group defensively (`Option`s all the way
/// down): a client advertising nothing at all yields a snapshot of all
/// `false`s and the default `utf-16` offset encoding.
pub fn negotiate(params: &InitializeParams) -> Negotiated {
    let caps = &params.capabilities;

    let snippets = caps
        .text_document
        .as_ref()
        .and_then(|td| td.completion.as_ref())
        .and_then(|c| c.completion_item.as_ref())
        .and_then(|ci| ci.snippet_support)
        .unwrap_or(false);

    let apply_edits = caps.workspace.as_ref().and_then(|w| w.apply_edit).unwrap_or(false);

    let (will_save, will_save_wait_until) = caps
        .text_document
        .as_ref()
        .and_then(|td| td.synchronization.as_ref())
        .map(|s| (s.will_save.unwrap_or(false), s.will_save_wait_until.unwrap_or(false)))
        .unwrap_or((false, false));

    let publish_diagnostics =
        caps.text_document.as_ref().and_then(|td| td.publish_diagnostics.as_ref()).is_some();

    let code_action_fixall = caps
        .text_document
        .as_ref()
        .and_then(|td| td.code_action.as_ref())
        .and_then(|ca| ca.code_action_literal_support.as_ref())
        .is_some();

    let hover_markdown = prefers_markdown(
        caps.text_document.as_ref().and_then(|td| td.hover.as_ref()).and_then(|h| h.content_format.as_ref()),
    );

    let completion_doc_markdown = prefers_markdown(
        caps.text_document
            .as_ref()
            .and_then(|td| td.completion.as_ref())
            .and_then(|c| c.completion_item.as_ref())
            .and_then(|ci| ci.documentation_format.as_ref()),
    );

    let label_details = caps
        .text_document
        .as_ref()
        .and_then(|td| td.completion.as_ref())
        .and_then(|c| c.completion_item.as_ref())
        .and_then(|ci| ci.label_details_support)
        .unwrap_or(false);

    let configuration_pull = caps.workspace.as_ref().and_then(|w| w.configuration).unwrap_or(false);

    let did_change_configuration_dynamic_registration = caps
        .workspace
        .as_ref()
        .and_then(|w| w.did_change_configuration.as_ref())
        .and_then(|d| d.dynamic_registration)
        .unwrap_or(false);

    let offered_encodings = caps
        .general
        .as_ref()
        .and_then(|g| g.position_encodings.as_ref())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);
    let offset_encoding = OffsetEncoding::negotiate(offered_encodings);

    let trace_enabled = params
        .trace
        .as_ref()
        .map(|t| !matches!(t, lsp_types::TraceValue::Off))
        .unwrap_or(false);

    let mut negotiated = Negotiated {
        capabilities: ClientCapabilities {
            snippets,
            apply_edits,
            will_save,
            will_save_wait_until,
            publish_diagnostics,
            code_action_fixall,
            hover_markdown,
            completion_doc_markdown,
            label_details,
            configuration_pull,
            did_change_configuration_dynamic_registration,
        },
        offset_encoding,
        tuning: Tuning::default(),
        trace_enabled,
    };

    apply_quirks(&mut negotiated, params.client_info.as_ref());

    negotiated
}

/// True iff `markdown` appears before `plaintext` in the client's ordered
/// preference list. An empty or absent list means no preference, so
/// the answer is `false`.
fn prefers_markdown(formats: Option<&Vec<MarkupKind>>) -> bool {
    match formats {
        None => false,
        Some(list) => {
            for format in list {
                match format {
                    MarkupKind::Markdown => return true,
                    MarkupKind::PlainText => return false,
                }
            }
            false
        }
    }
}

fn apply_quirks(negotiated: &mut Negotiated, client_info: Option<&ClientInfo>) {
    let Some(info) = client_info else { return };
    for quirk in CLIENT_QUIRKS {
        if quirk.name != info.name {
            continue;
        }
        let matches_version = match (quirk.version_at_most, info.version.as_deref()) {
            (None, _) => true,
            (Some(bound), Some(actual)) => version_at_most(actual, bound),
            (Some(_), None) => false,
        };
        if matches_version {
            (quirk.apply)(negotiated);
        }
    }
}

/// Minimal dotted-numeric semver comparison: `actual <= bound`.
/// Non-numeric or short components compare as `0`.
fn version_at_most(actual: &str, bound: &str) -> bool {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    let a = parse(actual);
    let b = parse(bound);
    for i in 0..a.len().max(b.len()) {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        if av != bv {
            return av < bv;
        }
    }
    true
}
