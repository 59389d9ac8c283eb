//! Terminal and file output for completion responses

use crate::completion::FragmentStream;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Warning written when a stream produced no text
pub const NO_CONTENT_WARNING: &str = "(No streamed content received)";

/// What a consumed stream contained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    /// Number of fragments received
    pub fragments: usize,
    /// Whether any fragment carried non-empty text
    pub had_content: bool,
}

/// Copy fragments to `out` as they arrive, flushing after each one.
///
/// A stream without any text, whether it had no fragments or only empty
/// ones, gets a single warning on `err`. A fragment error stops the copy and
/// is returned.
pub async fn stream_to<W, E>(
    mut fragments: FragmentStream,
    out: &mut W,
    err: &mut E,
) -> Result<StreamSummary>
where
    W: Write,
    E: Write,
{
    let mut summary = StreamSummary::default();

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        summary.fragments += 1;
        if fragment.is_empty() {
            continue;
        }
        summary.had_content = true;
        out.write_all(fragment.as_bytes())?;
        out.flush()?;
    }

    if !summary.had_content {
        writeln!(err, "\n{}", NO_CONTENT_WARNING)?;
    }

    tracing::debug!(fragments = summary.fragments, "stream consumed");
    Ok(summary)
}

/// File name for a brief written at `now`: `briefs-<RFC 3339 UTC>.json` with
/// `:` and `.` replaced by `-`
pub fn brief_file_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("briefs-{}.json", stamp)
}

/// Parse `text` as JSON and write it pretty-printed into `dir`.
///
/// Nothing is written when `text` is not valid JSON. `dir` is created if
/// needed. Returns the path of the new file.
pub fn persist_brief(text: &str, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(Error::MalformedResponse)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(brief_file_name(now));

    let mut pretty = serde_json::to_string_pretty(&value)?;
    pretty.push('\n');
    std::fs::write(&path, pretty)?;

    tracing::debug!(path = %path.display(), "brief written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fragments(items: Vec<Result<String>>) -> FragmentStream {
        Box::pin(futures::stream::iter(items))
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap() + chrono::Duration::milliseconds(42)
    }

    #[tokio::test]
    async fn test_fragments_written_without_separators() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let summary = stream_to(
            fragments(vec![Ok("Hel".to_string()), Ok("lo".to_string())]),
            &mut out,
            &mut err,
        )
        .await
        .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Hello");
        assert!(err.is_empty());
        assert_eq!(summary, StreamSummary { fragments: 2, had_content: true });
    }

    #[tokio::test]
    async fn test_empty_stream_warns_once() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let summary = stream_to(fragments(vec![]), &mut out, &mut err).await.unwrap();

        assert!(out.is_empty());
        let err = String::from_utf8(err).unwrap();
        assert_eq!(err.matches(NO_CONTENT_WARNING).count(), 1);
        assert!(!summary.had_content);
    }

    #[tokio::test]
    async fn test_only_empty_fragments_warns_like_no_fragments() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let summary = stream_to(
            fragments(vec![Ok(String::new()), Ok(String::new())]),
            &mut out,
            &mut err,
        )
        .await
        .unwrap();

        assert_eq!(summary.fragments, 2);
        assert_eq!(String::from_utf8(err).unwrap().matches(NO_CONTENT_WARNING).count(), 1);
    }

    #[tokio::test]
    async fn test_fragment_error_stops_stream() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result = stream_to(
            fragments(vec![
                Ok("partial".to_string()),
                Err(Error::Api { status: 500, message: "boom".to_string() }),
                Ok("never".to_string()),
            ]),
            &mut out,
            &mut err,
        )
        .await;

        assert!(matches!(result, Err(Error::Api { status: 500, .. })));
        assert_eq!(String::from_utf8(out).unwrap(), "partial");
    }

    #[test]
    fn test_file_name_is_filesystem_safe() {
        assert_eq!(brief_file_name(fixed_time()), "briefs-2024-03-05T14-07-09-042Z.json");
    }

    #[test]
    fn test_persist_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("output");

        let path = persist_brief(r#"{"a":1}"#, &out_dir, fixed_time()).unwrap();

        assert_eq!(path, out_dir.join("briefs-2024-03-05T14-07-09-042Z.json"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"a\": 1\n}\n");
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_persist_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_brief(r#"{"zeta":1,"alpha":2}"#, dir.path(), fixed_time()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.find("zeta").unwrap() < content.find("alpha").unwrap());
    }

    #[test]
    fn test_malformed_json_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("output");

        let err = persist_brief("not json", &out_dir, fixed_time()).unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(err.to_string().contains("expected"));
        assert!(!out_dir.exists());
    }
}
