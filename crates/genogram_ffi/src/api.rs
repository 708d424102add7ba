//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the embedding protocol and logging bootstrap to Dart via FRB.
//! - Hold the single embedded editor session of this process.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Host messages and replies cross the boundary as JSON strings.
//! - Calls into the session are serialized by one mutex.

use genogram_core::embed::ALLOWED_ORIGINS_ENV;
use genogram_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EditorSettings, EmbedSession, OriginPolicy,
};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static SESSION: OnceLock<Mutex<Option<EmbedSession>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Response envelope for embedding calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedResponse {
    /// Whether the call reached an open session.
    pub ok: bool,
    /// Engine message JSON to post back to the host, if any.
    pub reply: Option<String>,
    /// Human-readable diagnostics.
    pub message: String,
}

impl EmbedResponse {
    fn replied(reply: Option<String>) -> Self {
        let message = if reply.is_some() { "replied" } else { "no reply" };
        Self {
            ok: true,
            reply,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            reply: None,
            message: message.into(),
        }
    }
}

/// Opens (or replaces) the embedded editor session.
///
/// Input semantics:
/// - `allowed_origins`: exact host origins; when empty the
///   `GENOGRAM_ALLOWED_ORIGINS` environment variable is used instead.
/// - `settings_json`: optional camelCase `EditorSettings` object.
///
/// # FFI contract
/// - Never panics.
/// - On success `reply` carries the `GENOGRAM_READY` message.
#[flutter_rust_bridge::frb(sync)]
pub fn embed_open(allowed_origins: Vec<String>, settings_json: Option<String>) -> EmbedResponse {
    let settings = match parse_settings(settings_json.as_deref()) {
        Ok(settings) => settings,
        Err(err) => return EmbedResponse::failure(err),
    };
    let policy = if allowed_origins.is_empty() {
        OriginPolicy::from_env()
    } else {
        OriginPolicy::new(&allowed_origins)
    };
    if policy.is_deny_all() {
        warn!("event=embed_open module=ffi status=deny_all env={ALLOWED_ORIGINS_ENV}");
    }

    let session = EmbedSession::new(policy, settings);
    let ready = session.ready_message().to_json();
    *lock_session() = Some(session);
    info!("event=embed_open module=ffi status=ok");

    match ready {
        Ok(json) => EmbedResponse::replied(Some(json)),
        Err(err) => EmbedResponse::failure(err.to_string()),
    }
}

/// Delivers one host message to the open session.
///
/// # FFI contract
/// - Never panics.
/// - Dropped messages (unlisted origin, malformed payload) yield `ok = true`
///   with no reply, exactly like a message that needs no answer.
#[flutter_rust_bridge::frb(sync)]
pub fn embed_handle(origin: String, message: String) -> EmbedResponse {
    let mut guard = lock_session();
    let Some(session) = guard.as_mut() else {
        return EmbedResponse::failure("embed session is not open");
    };
    let Some(reply) = session.handle(&origin, &message) else {
        return EmbedResponse::replied(None);
    };
    match reply.to_json() {
        Ok(json) => EmbedResponse::replied(Some(json)),
        Err(err) => EmbedResponse::failure(err.to_string()),
    }
}

/// Closes the session; returns whether one was open.
#[flutter_rust_bridge::frb(sync)]
pub fn embed_close() -> bool {
    lock_session().take().is_some()
}

fn lock_session() -> MutexGuard<'static, Option<EmbedSession>> {
    SESSION
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn parse_settings(raw: Option<&str>) -> Result<EditorSettings, String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(EditorSettings::default());
    };
    let settings: EditorSettings =
        serde_json::from_str(raw).map_err(|err| format!("invalid settings: {err}"))?;
    settings
        .validate()
        .map_err(|err| format!("invalid settings: {err}"))?;
    Ok(settings)
}
