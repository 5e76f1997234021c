use super::*;

/// Trait for rendering engine events as console lines.
///
/// A `LogFormatter` decides how hits, probe failures and dictionary
/// banners are turned into output. The engine prints whatever it returns
/// through the progress tracker.
pub trait LogFormatter: Send + Sync + 'static {
    type Output: Display + Send;

    fn hit(&self, target: &TargetUrl, result: &ProbeResult) -> Self::Output;

    fn probe_error(&self, error: &ProbeError) -> Self::Output;

    fn wordlist_error(&self, error: &WordlistError) -> Self::Output;

    fn banner(&self, dictionary: &Dictionary) -> Self::Output;

    fn interrupted(&self) -> Self::Output;
}

/// Human-readable lines: `[200] admin (512 B) Admin`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormatter;

/// One JSON object per line, hits only carry data fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl LogFormatter for PlainFormatter {
    type Output = String;

    fn hit(&self, _target: &TargetUrl, r: &ProbeResult) -> Self::Output {
        format!("[{}] {} ({} B) {}", r.status, r.candidate, r.bytes, r.title)
    }

    fn probe_error(&self, error: &ProbeError) -> Self::Output {
        format!("[!] {error}")
    }

    fn wordlist_error(&self, error: &WordlistError) -> Self::Output {
        format!("[!] {error}")
    }

    fn banner(&self, dictionary: &Dictionary) -> Self::Output {
        format!("[*] Using {}", dictionary.name)
    }

    fn interrupted(&self) -> Self::Output {
        "Interrupted".to_string()
    }
}

impl LogFormatter for JsonFormatter {
    type Output = String;

    fn hit(&self, target: &TargetUrl, r: &ProbeResult) -> Self::Output {
        serde_json::json!({
            "event": "hit",
            "status": r.status,
            "path": r.candidate,
            "bytes": r.bytes,
            "title": r.title,
            "url": target.candidate_url(&r.candidate),
        })
        .to_string()
    }

    fn probe_error(&self, error: &ProbeError) -> Self::Output {
        serde_json::json!({
            "event": "error",
            "path": error.candidate(),
            "kind": error.kind(),
            "message": error.to_string(),
        })
        .to_string()
    }

    fn wordlist_error(&self, error: &WordlistError) -> Self::Output {
        serde_json::json!({
            "event": "error",
            "message": error.to_string(),
        })
        .to_string()
    }

    fn banner(&self, dictionary: &Dictionary) -> Self::Output {
        serde_json::json!({
            "event": "dictionary",
            "name": dictionary.name,
            "path": dictionary.path.display().to_string(),
        })
        .to_string()
    }

    fn interrupted(&self) -> Self::Output {
        serde_json::json!({ "event": "interrupted" }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::NetworkErrorKind;

    fn target() -> TargetUrl {
        TargetUrl::new("http://127.0.0.1:8000/").unwrap()
    }

    #[test]
    fn test_plain_hit_line() {
        let line = PlainFormatter.hit(&target(), &ProbeResult::hit("admin", 200, 512, "Admin"));
        assert_eq!(line, "[200] admin (512 B) Admin");
    }

    #[test]
    fn test_plain_hit_without_title_keeps_trailing_space() {
        let line = PlainFormatter.hit(&target(), &ProbeResult::hit("robots.txt", 500, 3, ""));
        assert_eq!(line, "[500] robots.txt (3 B) ");
    }

    #[test]
    fn test_plain_banner_and_interrupt() {
        let dict = Dictionary {
            name: "common".to_string(),
            path: "dicts/common.txt".into(),
        };
        assert_eq!(PlainFormatter.banner(&dict), "[*] Using common");
        assert_eq!(PlainFormatter.interrupted(), "Interrupted");
    }

    #[test]
    fn test_json_hit_line() {
        let line = JsonFormatter.hit(&target(), &ProbeResult::hit("admin", 200, 512, "Admin"));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["event"], "hit");
        assert_eq!(value["status"], 200);
        assert_eq!(value["path"], "admin");
        assert_eq!(value["bytes"], 512);
        assert_eq!(value["title"], "Admin");
        assert_eq!(value["url"], "http://127.0.0.1:8000/admin");
    }

    #[test]
    fn test_json_probe_error_line() {
        let err = ProbeError::network("slow", NetworkErrorKind::Timeout, "deadline");
        let value: serde_json::Value = serde_json::from_str(&JsonFormatter.probe_error(&err)).unwrap();

        assert_eq!(value["event"], "error");
        assert_eq!(value["path"], "slow");
        assert_eq!(value["kind"], "Timeout");
    }
}
