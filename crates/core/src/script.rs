//! Sandboxed execution of user-supplied telemetry parsing scripts.
//!
//! Scripts are short JavaScript bodies that receive the raw telemetry line
//! as `raw` and must return a plain `name -> number|string` mapping. The
//! body is run in a `node` child process behind a harness that strips the
//! ambient environment (`require`, `process`, `module`, `globalThis` are
//! all shadowed), pipes the raw input over stdin, and prints the result as
//! JSON. Wall-clock enforcement uses `kill_on_drop` plus a tokio timeout,
//! so a runaway script is killed rather than hanging the caller.
//!
//! The returned shape is validated here, after execution: the result must
//! be a non-null, non-array object with at least one entry, and every
//! value must be a finite number or a string.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::telemetry::FieldValue;

/// Default time budget for a parsing script.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_millis(500);

/// Maximum stdout or stderr size captured per stream (1 MiB).
///
/// Parsing scripts emit a single small JSON object; anything beyond this
/// is runaway output and gets truncated.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Exit code the harness uses when the user script threw.
const EXIT_SCRIPT_THREW: i32 = 3;

/// Env var carrying the script body into the child process. Passing the
/// body out-of-band avoids any escaping of user text into the harness.
const SCRIPT_ENV_VAR: &str = "SITEWATCH_PARSER_SCRIPT";

/// The harness evaluated by `node -e`.
///
/// The user body becomes the body of a `Function` whose only meaningful
/// parameter is `raw`; the trailing parameters shadow every ambient
/// capability the body could otherwise reach. Values that are neither
/// finite numbers nor strings are normalized to `null` so the offending
/// key survives JSON serialization and can be named in the error.
const HARNESS: &str = r#"
const body = process.env.SITEWATCH_PARSER_SCRIPT || '';
const raw = require('fs').readFileSync(0, 'utf8');
let result;
try {
    const fn = new Function('raw', 'require', 'process', 'module', 'exports', 'globalThis', body);
    result = fn(raw);
} catch (e) {
    console.error(String((e && e.message) || e));
    process.exit(3);
}
if (result && typeof result === 'object' && !Array.isArray(result)) {
    for (const key of Object.keys(result)) {
        const v = result[key];
        if (typeof v !== 'string' && !(typeof v === 'number' && isFinite(v))) {
            result[key] = null;
        }
    }
}
process.stdout.write(JSON.stringify(result === undefined ? null : result));
"#;

/// Errors surfaced by [`run_parser_script`]. Always returned, never
/// propagated as a panic of the caller.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The script exceeded its time budget and was killed.
    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The script body threw.
    #[error("Script threw: {message}")]
    Threw { message: String },

    /// The child process exited abnormally for a reason other than a
    /// script throw.
    #[error("Script runtime failed with exit code {exit_code}: {stderr}")]
    RuntimeFailed { exit_code: i32, stderr: String },

    /// The harness printed something that is not JSON.
    #[error("Script produced malformed output: {0}")]
    MalformedOutput(String),

    /// The script evaluated to something other than a plain object.
    #[error("Script result is not an object (got {0})")]
    NotAnObject(&'static str),

    /// The script returned an object with no entries.
    #[error("Script result is empty")]
    EmptyResult,

    /// A value in the result was not a finite number or a string.
    #[error("Script result value for key '{key}' is not a finite number or string")]
    InvalidValue { key: String },

    /// Spawning or talking to the child process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a parsing script against a raw telemetry line.
///
/// Returns the validated `name -> value` mapping on success. Every failure
/// mode (spawn error, throw, timeout, malformed shape) maps to a
/// [`ScriptError`] variant.
pub async fn run_parser_script(
    script: &str,
    raw_input: &str,
    timeout: Duration,
) -> Result<BTreeMap<String, FieldValue>, ScriptError> {
    let mut cmd = parser_command(script);

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    // Write the raw line to stdin, then close it. Best-effort: a script
    // that never reads stdin may close the pipe early.
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(raw_input.as_bytes()).await;
        drop(stdin);
    }

    // Read stdout/stderr in spawned tasks so `child.wait()` can run.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(result) => result?,
        Err(_elapsed) => {
            // `child` is dropped here; `kill_on_drop` reaps the process.
            return Err(ScriptError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

    match status.code() {
        Some(0) => {}
        Some(EXIT_SCRIPT_THREW) => {
            return Err(ScriptError::Threw {
                message: stderr.trim().to_string(),
            });
        }
        code => {
            return Err(ScriptError::RuntimeFailed {
                exit_code: code.unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
    }

    let value: serde_json::Value = serde_json::from_str(stdout.trim())
        .map_err(|e| ScriptError::MalformedOutput(e.to_string()))?;
    validate_shape(value)
}

/// Build the `node` invocation for one script run.
///
/// The child environment is cleared so the script cannot read ambient
/// secrets, then gets exactly two variables back: the script body and the
/// parent's `PATH`. Without the latter, program lookup falls back to the
/// system default path and misses `node` installs under e.g. `/usr/local`
/// or a version manager.
fn parser_command(script: &str) -> Command {
    let mut cmd = Command::new("node");
    cmd.arg("-e")
        .arg(HARNESS)
        .env_clear()
        .env(SCRIPT_ENV_VAR, script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    cmd
}

/// Validate the JSON shape returned by the harness.
///
/// Exposed for direct testing; [`run_parser_script`] applies it to every
/// successful execution.
pub fn validate_shape(
    value: serde_json::Value,
) -> Result<BTreeMap<String, FieldValue>, ScriptError> {
    let map = match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Array(_) => return Err(ScriptError::NotAnObject("array")),
        serde_json::Value::Null => return Err(ScriptError::NotAnObject("null")),
        serde_json::Value::Number(_) => return Err(ScriptError::NotAnObject("number")),
        serde_json::Value::String(_) => return Err(ScriptError::NotAnObject("string")),
        serde_json::Value::Bool(_) => return Err(ScriptError::NotAnObject("boolean")),
    };

    if map.is_empty() {
        return Err(ScriptError::EmptyResult);
    }

    let mut result = BTreeMap::new();
    for (key, value) in map {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => {
                    result.insert(key, FieldValue::Number(f));
                }
                _ => return Err(ScriptError::InvalidValue { key }),
            },
            serde_json::Value::String(s) => {
                result.insert(key, FieldValue::Text(s));
            }
            _ => return Err(ScriptError::InvalidValue { key }),
        }
    }
    Ok(result)
}

/// Read an entire output stream into a byte buffer, capped at
/// [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    // -- shape validation (no subprocess) --

    #[test]
    fn validate_rejects_arrays() {
        assert_matches!(
            validate_shape(json!([1, 2, 3])),
            Err(ScriptError::NotAnObject("array"))
        );
    }

    #[test]
    fn validate_rejects_null_and_scalars() {
        assert_matches!(validate_shape(json!(null)), Err(ScriptError::NotAnObject("null")));
        assert_matches!(validate_shape(json!(42)), Err(ScriptError::NotAnObject("number")));
        assert_matches!(
            validate_shape(json!("ok")),
            Err(ScriptError::NotAnObject("string"))
        );
    }

    #[test]
    fn validate_rejects_empty_object() {
        assert_matches!(validate_shape(json!({})), Err(ScriptError::EmptyResult));
    }

    #[test]
    fn validate_names_the_offending_key() {
        let err = validate_shape(json!({ "temp": 12.5, "state": null })).unwrap_err();
        assert_matches!(err, ScriptError::InvalidValue { key } if key == "state");
    }

    #[test]
    fn validate_rejects_nested_objects() {
        let err = validate_shape(json!({ "temp": { "v": 1 } })).unwrap_err();
        assert_matches!(err, ScriptError::InvalidValue { key } if key == "temp");
    }

    #[test]
    fn validate_accepts_numbers_and_strings() {
        let map = validate_shape(json!({ "temp": 12.5, "state": "OK" })).unwrap();
        assert_eq!(map.get("temp"), Some(&FieldValue::Number(12.5)));
        assert_eq!(map.get("state"), Some(&FieldValue::Text("OK".into())));
    }

    #[test]
    fn child_env_keeps_only_script_and_search_path() {
        let cmd = parser_command("return {}");
        let envs: Vec<_> = cmd.as_std().get_envs().collect();

        assert!(envs
            .iter()
            .any(|(k, v)| k.to_str() == Some(SCRIPT_ENV_VAR) && v.is_some()));
        // PATH survives the env_clear so node can be found outside the
        // system default path.
        if std::env::var_os("PATH").is_some() {
            assert!(envs
                .iter()
                .any(|(k, v)| k.to_str() == Some("PATH") && v.is_some()));
        }
        assert!(envs.len() <= 2, "unexpected extra child env vars: {envs:?}");
    }

    // -- subprocess execution --
    //
    // These spawn a real `node` process; they skip (pass vacuously) when
    // node is not installed in the test environment.

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn parses_first_field_from_raw_input() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let result = run_parser_script(
            "return {temp: parseFloat(raw.split(',')[0])}",
            "12.5,33",
            Duration::from_secs(5),
        )
        .await
        .expect("script should succeed");
        assert_eq!(result.get("temp"), Some(&FieldValue::Number(12.5)));
    }

    #[tokio::test]
    async fn infinite_loop_times_out() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let start = Instant::now();
        let result =
            run_parser_script("while(true){}", "x", Duration::from_millis(500)).await;
        assert_matches!(result, Err(ScriptError::Timeout { .. }));
        // Bounded wall-clock: well under the runaway case.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn array_result_is_rejected() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let result = run_parser_script("return [1,2,3]", "x", Duration::from_secs(5)).await;
        assert_matches!(result, Err(ScriptError::NotAnObject("array")));
    }

    #[tokio::test]
    async fn thrown_error_surfaces_as_failure() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let result =
            run_parser_script("throw new Error('bad frame')", "x", Duration::from_secs(5)).await;
        assert_matches!(result, Err(ScriptError::Threw { message }) if message.contains("bad frame"));
    }

    #[tokio::test]
    async fn ambient_capabilities_are_shadowed() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        // `require` is a shadowed (undefined) parameter inside the body.
        let result = run_parser_script(
            "return {t: typeof require}",
            "x",
            Duration::from_secs(5),
        )
        .await
        .expect("script should succeed");
        assert_eq!(result.get("t"), Some(&FieldValue::Text("undefined".into())));
    }

    #[tokio::test]
    async fn non_finite_number_names_the_key() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let result = run_parser_script("return {rate: 1/0}", "x", Duration::from_secs(5)).await;
        assert_matches!(result, Err(ScriptError::InvalidValue { key }) if key == "rate");
    }
}
