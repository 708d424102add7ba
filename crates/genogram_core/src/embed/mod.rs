//! Host page messaging protocol.
//!
//! # Responsibility
//! - Decode inbound host messages and dispatch them to one editor session.
//! - Encode outbound engine messages (ready, save, export, error).
//! - Enforce the origin allow-list before any payload is inspected.
//!
//! # Invariants
//! - The origin policy denies everything unless an origin is listed.
//! - Messages from unlisted origins and malformed payloads are dropped
//!   without a reply; both are logged without their content.
//! - `LOAD_GENOGRAM` is the only inbound message that replaces graph data.
//!
//! # See also
//! - crate::file for the document format carried by `data` fields.

mod origin;

pub use origin::{OriginPolicy, ALLOWED_ORIGINS_ENV};

use crate::export::ExportError;
use crate::file::FileError;
use crate::model::ids::PersonId;
use crate::service::Editor;
use crate::settings::{EditorSettings, SettingsError, SettingsPatch, Theme};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Message posted by the embedding host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    LoadGenogram {
        data: Value,
    },
    RequestSave,
    RequestExportSvg {
        #[serde(default, rename = "transparentBackground")]
        transparent_background: bool,
    },
    RequestExportPng {
        #[serde(default, rename = "transparentBackground")]
        transparent_background: bool,
    },
    FocusPerson {
        #[serde(rename = "personId")]
        person_id: String,
    },
    SetTheme {
        theme: Theme,
    },
    UpdateSettings {
        settings: SettingsPatch,
    },
}

/// Message posted back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineMessage {
    GenogramReady {
        version: String,
    },
    GenogramSave {
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        svg: Option<String>,
    },
    GenogramExportSvg {
        svg: String,
        width: f64,
        height: f64,
    },
    GenogramExportPng {
        svg: String,
        width: u32,
        height: u32,
        scale: f64,
    },
    GenogramError {
        reason: String,
    },
}

impl EngineMessage {
    pub fn to_json(&self) -> Result<String, EmbedError> {
        serde_json::to_string(self).map_err(EmbedError::Encode)
    }

    fn error(err: impl Display) -> Self {
        Self::GenogramError {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum EmbedError {
    /// Sender is not on the allow-list.
    OriginRejected(String),
    /// Payload is not a recognised host message.
    Malformed(serde_json::Error),
    Encode(serde_json::Error),
}

impl Display for EmbedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OriginRejected(origin) => write!(f, "origin not allowed: {origin}"),
            Self::Malformed(err) => write!(f, "malformed host message: {err}"),
            Self::Encode(err) => write!(f, "failed to encode engine message: {err}"),
        }
    }
}

impl Error for EmbedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) | Self::Encode(err) => Some(err),
            Self::OriginRejected(_) => None,
        }
    }
}

#[derive(Debug)]
enum HandleError {
    File(FileError),
    Export(ExportError),
    Settings(SettingsError),
    UnknownPerson(PersonId),
    Encode(serde_json::Error),
}

impl Display for HandleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::UnknownPerson(id) => write!(f, "person not found: {id}"),
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
        }
    }
}

impl From<FileError> for HandleError {
    fn from(value: FileError) -> Self {
        Self::File(value)
    }
}

impl From<ExportError> for HandleError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<SettingsError> for HandleError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

/// One embedded editor bound to an origin allow-list.
#[derive(Debug, Clone)]
pub struct EmbedSession {
    policy: OriginPolicy,
    editor: Editor,
}

impl EmbedSession {
    pub fn new(policy: OriginPolicy, settings: EditorSettings) -> Self {
        Self {
            policy,
            editor: Editor::new(settings),
        }
    }

    pub fn policy(&self) -> &OriginPolicy {
        &self.policy
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Announcement posted once the session is ready for messages.
    pub fn ready_message(&self) -> EngineMessage {
        EngineMessage::GenogramReady {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Handles one raw message; `None` means nothing is posted back.
    pub fn handle(&mut self, origin: &str, raw: &str) -> Option<EngineMessage> {
        match self.dispatch(origin, raw) {
            Ok(reply) => reply,
            Err(EmbedError::OriginRejected(_)) => {
                warn!("event=embed_message module=embed status=rejected reason=origin");
                None
            }
            Err(err) => {
                warn!("event=embed_message module=embed status=dropped error={err}");
                None
            }
        }
    }

    /// Like `handle`, but surfaces why a message was dropped.
    pub fn dispatch(&mut self, origin: &str, raw: &str) -> Result<Option<EngineMessage>, EmbedError> {
        if !self.policy.allows(origin) {
            return Err(EmbedError::OriginRejected(origin.to_string()));
        }
        let message: HostMessage = serde_json::from_str(raw).map_err(EmbedError::Malformed)?;
        Ok(self.apply(message))
    }

    /// Applies a decoded message from an already trusted sender.
    pub fn apply(&mut self, message: HostMessage) -> Option<EngineMessage> {
        let kind = message_kind(&message);
        let reply = match self.apply_inner(message) {
            Ok(reply) => reply,
            Err(err) => {
                warn!("event=embed_message module=embed status=error kind={kind}");
                Some(EngineMessage::error(err))
            }
        };
        debug!(
            "event=embed_message module=embed status=ok kind={kind} replied={}",
            reply.is_some()
        );
        reply
    }

    fn apply_inner(&mut self, message: HostMessage) -> Result<Option<EngineMessage>, HandleError> {
        match message {
            HostMessage::LoadGenogram { data } => {
                let report = self.editor.load_value(&data)?;
                info!(
                    "event=genogram_load module=embed status=ok people={} coerced={} repaired={}",
                    self.editor.store().people().len(),
                    report.coerced.len(),
                    report.repaired.len()
                );
                Ok(Some(self.ready_message()))
            }
            HostMessage::RequestSave => {
                let data = serde_json::to_value(self.editor.document()).map_err(HandleError::Encode)?;
                let svg = self.editor.export_svg(false).ok().map(|export| export.svg);
                Ok(Some(EngineMessage::GenogramSave { data, svg }))
            }
            HostMessage::RequestExportSvg {
                transparent_background,
            } => {
                let export = self.editor.export_svg(transparent_background)?;
                Ok(Some(EngineMessage::GenogramExportSvg {
                    svg: export.svg,
                    width: export.width,
                    height: export.height,
                }))
            }
            HostMessage::RequestExportPng {
                transparent_background,
            } => {
                let export = self.editor.export_png(transparent_background)?;
                Ok(Some(EngineMessage::GenogramExportPng {
                    svg: export.svg,
                    width: export.width,
                    height: export.height,
                    scale: export.scale,
                }))
            }
            HostMessage::FocusPerson { person_id } => {
                let id = PersonId::new(person_id);
                if self.editor.focus_person(&id) {
                    Ok(None)
                } else {
                    Err(HandleError::UnknownPerson(id))
                }
            }
            HostMessage::SetTheme { theme } => {
                self.editor.set_theme(theme);
                Ok(None)
            }
            HostMessage::UpdateSettings { settings } => {
                self.editor.apply_settings(settings)?;
                Ok(None)
            }
        }
    }
}

fn message_kind(message: &HostMessage) -> &'static str {
    match message {
        HostMessage::LoadGenogram { .. } => "load_genogram",
        HostMessage::RequestSave => "request_save",
        HostMessage::RequestExportSvg { .. } => "request_export_svg",
        HostMessage::RequestExportPng { .. } => "request_export_png",
        HostMessage::FocusPerson { .. } => "focus_person",
        HostMessage::SetTheme { .. } => "set_theme",
        HostMessage::UpdateSettings { .. } => "update_settings",
    }
}

#[cfg(test)]
mod tests {
    use super::{EmbedError, EmbedSession, EngineMessage, HostMessage, OriginPolicy};
    use crate::settings::{EditorSettings, Theme};
    use serde_json::json;

    const ORIGIN: &str = "https://case.example.org";

    fn session() -> EmbedSession {
        EmbedSession::new(OriginPolicy::new([ORIGIN]), EditorSettings::default())
    }

    #[test]
    fn host_messages_decode_from_wire_names() {
        let message: HostMessage =
            serde_json::from_str(r#"{"type":"FOCUS_PERSON","personId":"p1"}"#).unwrap();
        assert_eq!(
            message,
            HostMessage::FocusPerson {
                person_id: "p1".to_string()
            }
        );
        let message: HostMessage =
            serde_json::from_str(r#"{"type":"SET_THEME","theme":"dark"}"#).unwrap();
        assert_eq!(message, HostMessage::SetTheme { theme: Theme::Dark });
    }

    #[test]
    fn engine_messages_encode_with_type_tag() {
        let json = EngineMessage::GenogramError {
            reason: "nope".to_string(),
        }
        .to_json()
        .unwrap();
        assert_eq!(json, r#"{"type":"GENOGRAM_ERROR","reason":"nope"}"#);
    }

    #[test]
    fn unlisted_origin_is_dropped() {
        let mut session = session();
        let raw = r#"{"type":"REQUEST_SAVE"}"#;
        assert!(session.handle("https://evil.example", raw).is_none());
        assert!(matches!(
            session.dispatch("https://evil.example", raw),
            Err(EmbedError::OriginRejected(_))
        ));
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let mut session = session();
        assert!(session.handle(ORIGIN, "{not json").is_none());
        assert!(session.handle(ORIGIN, r#"{"type":"DELETE_ALL"}"#).is_none());
    }

    #[test]
    fn load_then_save_replies_with_document() {
        let mut session = session();
        let load = json!({
            "type": "LOAD_GENOGRAM",
            "data": {"people": [{"id": "p1", "name": "Ada", "x": 10, "y": 10}]}
        });
        let reply = session.handle(ORIGIN, &load.to_string());
        assert!(matches!(reply, Some(EngineMessage::GenogramReady { .. })));

        let reply = session.handle(ORIGIN, r#"{"type":"REQUEST_SAVE"}"#);
        let Some(EngineMessage::GenogramSave { data, svg }) = reply else {
            panic!("expected a save reply");
        };
        assert_eq!(data["people"][0]["id"], "p1");
        assert!(svg.is_some());
    }

    #[test]
    fn export_of_empty_diagram_replies_with_error() {
        let mut session = session();
        let reply = session.handle(ORIGIN, r#"{"type":"REQUEST_EXPORT_SVG"}"#);
        assert!(matches!(reply, Some(EngineMessage::GenogramError { .. })));
    }

    #[test]
    fn invalid_settings_reply_with_error_and_keep_settings() {
        let mut session = session();
        let reply = session.handle(
            ORIGIN,
            r#"{"type":"UPDATE_SETTINGS","settings":{"gridSize":-5}}"#,
        );
        assert!(matches!(reply, Some(EngineMessage::GenogramError { .. })));
        assert_eq!(session.editor().settings().grid_size, 20.0);
    }
}
