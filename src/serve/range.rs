//! Byte-range resolution
//!
//! Decides what to stream for a `Range` header against a known file size.
//! The policy is strict: a range that reaches past the last byte is
//! unsatisfiable, not clamped, and a malformed header never falls back to
//! serving the whole file once a Range header was present.

/// What to serve for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// Whole file, status 200.
    Full,
    /// Inclusive byte window, status 206.
    Partial { start: u64, end: u64 },
    /// Status 416 with `Content-Range: bytes */<size>`.
    Unsatisfiable,
}

/// Resolve an optional `Range` header against a file of `size` bytes.
pub fn resolve(header: Option<&str>, size: u64) -> RangePlan {
    let Some(header) = header else {
        return RangePlan::Full;
    };

    match parse(header, size) {
        Some((start, end)) => RangePlan::Partial { start, end },
        // A present-but-unusable Range header is never downgraded to a whole
        // file response; range-aware clients would resume inconsistently.
        None => RangePlan::Unsatisfiable,
    }
}

/// Parse `bytes=<start>-<end?>` and bounds-check it.
fn parse(header: &str, size: u64) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    let (start_s, end_s) = spec.split_once('-')?;

    let start: u64 = start_s.trim().parse().ok()?;
    let end: u64 = match end_s.trim() {
        "" => size.checked_sub(1)?,
        s => s.parse().ok()?,
    };

    if start > end || end >= size {
        return None;
    }

    Some((start, end))
}

/// Whether this file type gets range handling at all.
///
/// Only audio and video are served in ranges; everything else is always
/// delivered whole.
pub fn media_supports_ranges(file_name: &str) -> bool {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let top = mime.type_();
    top == mime_guess::mime::AUDIO || top == mime_guess::mime::VIDEO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header_serves_full() {
        assert_eq!(resolve(None, 1000), RangePlan::Full);
    }

    #[test]
    fn test_simple_window() {
        assert_eq!(
            resolve(Some("bytes=0-99"), 1000),
            RangePlan::Partial { start: 0, end: 99 }
        );
    }

    #[test]
    fn test_open_ended_defaults_to_last_byte() {
        assert_eq!(
            resolve(Some("bytes=100-"), 1000),
            RangePlan::Partial {
                start: 100,
                end: 999
            }
        );
    }

    #[test]
    fn test_end_past_size_is_unsatisfiable() {
        assert_eq!(resolve(Some("bytes=900-1099"), 1000), RangePlan::Unsatisfiable);
    }

    #[test]
    fn test_start_past_size_is_unsatisfiable() {
        assert_eq!(resolve(Some("bytes=1000-"), 1000), RangePlan::Unsatisfiable);
    }

    #[test]
    fn test_inverted_window_is_unsatisfiable() {
        assert_eq!(resolve(Some("bytes=500-100"), 1000), RangePlan::Unsatisfiable);
    }

    #[test]
    fn test_malformed_headers_are_unsatisfiable() {
        for header in ["bytes=", "bytes=-500", "bytes=abc-def", "items=0-99", "0-99"] {
            assert_eq!(resolve(Some(header), 1000), RangePlan::Unsatisfiable, "{header}");
        }
    }

    #[test]
    fn test_empty_file_any_range_is_unsatisfiable() {
        assert_eq!(resolve(Some("bytes=0-"), 0), RangePlan::Unsatisfiable);
        assert_eq!(resolve(Some("bytes=0-0"), 0), RangePlan::Unsatisfiable);
        assert_eq!(resolve(None, 0), RangePlan::Full);
    }

    #[test]
    fn test_single_byte_windows() {
        assert_eq!(
            resolve(Some("bytes=0-0"), 1),
            RangePlan::Partial { start: 0, end: 0 }
        );
        assert_eq!(
            resolve(Some("bytes=999-999"), 1000),
            RangePlan::Partial {
                start: 999,
                end: 999
            }
        );
    }

    #[test]
    fn test_media_type_gate() {
        assert!(media_supports_ranges("song.mp3"));
        assert!(media_supports_ranges("clip.mp4"));
        assert!(media_supports_ranges("talk.ogg"));
        assert!(!media_supports_ranges("notes.txt"));
        assert!(!media_supports_ranges("photo.jpg"));
        assert!(!media_supports_ranges("archive"));
    }
}
