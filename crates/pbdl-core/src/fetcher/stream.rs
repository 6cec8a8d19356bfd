//! Per-download state driven by the session's chunk callback.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FetchConfig;
use crate::session::ResponseHead;
use crate::storage::{temp_path, PartFile};

use super::progress::{Progress, ProgressSink};
use super::sniff::find_marker;
use super::{DownloadOutcome, FetchFailure, SavedFile};

/// Accepts chunks for one destination.
///
/// The first `sniff_bytes` of the body are held back in `window` however the
/// server splits them; the temp file is only opened once the whole window
/// passed the marker check (or the body ended short of it).
pub(crate) struct MediaStream<'a> {
    dest: &'a Path,
    fetch: &'a FetchConfig,
    progress: &'a dyn ProgressSink,
    window: Vec<u8>,
    part: Option<PartFile>,
    downloaded: u64,
    failure: Option<FetchFailure>,
}

impl<'a> MediaStream<'a> {
    pub(crate) fn new(dest: &'a Path, fetch: &'a FetchConfig, progress: &'a dyn ProgressSink) -> Self {
        Self {
            dest,
            fetch,
            progress,
            window: Vec::new(),
            part: None,
            downloaded: 0,
            failure: None,
        }
    }

    /// Handle one chunk. Returns false to abort the transfer.
    pub(crate) fn accept(&mut self, head: &ResponseHead, data: &[u8]) -> bool {
        if !head.is_success() {
            self.failure = Some(FetchFailure::Http(head.status));
            return false;
        }

        let mut rest = data;
        if self.part.is_none() {
            let room = self.fetch.sniff_bytes.saturating_sub(self.window.len());
            let (sniffed, tail) = data.split_at(room.min(data.len()));
            self.window.extend_from_slice(sniffed);
            rest = tail;

            if !self.window_passes() {
                return false;
            }
            if self.window.len() >= self.fetch.sniff_bytes {
                match self.open_part() {
                    Ok(part) => self.part = Some(part),
                    Err(e) => {
                        self.failure = Some(FetchFailure::Storage(e));
                        return false;
                    }
                }
            }
        }

        if let Some(part) = self.part.as_mut() {
            if let Err(e) = part.write(rest) {
                self.failure = Some(FetchFailure::Storage(e));
                return false;
            }
        }

        self.downloaded += data.len() as u64;
        self.progress
            .report(Progress::new(self.downloaded, head.content_length));
        true
    }

    /// Marker check over everything sniffed so far; records the failure.
    fn window_passes(&mut self) -> bool {
        match find_marker(&self.window, &self.fetch.unsupported_markers) {
            Some(marker) => {
                self.failure = Some(FetchFailure::Unsupported {
                    marker: marker.to_string(),
                });
                false
            }
            None => true,
        }
    }

    /// Create the temp file and flush the sniffed bytes into it.
    fn open_part(&mut self) -> std::io::Result<PartFile> {
        let mut part = PartFile::create(self.dest)?;
        let window = std::mem::take(&mut self.window);
        if let Err(e) = part.write(&window) {
            part.discard();
            return Err(e);
        }
        Ok(part)
    }

    /// Settle the outcome once the transfer has ended.
    ///
    /// A failure recorded by `accept` wins over the curl error it provoked.
    pub(crate) fn finish(mut self, result: Result<ResponseHead, curl::Error>) -> DownloadOutcome {
        let failure = match (self.failure.take(), result) {
            (Some(f), _) => Some(f),
            (None, Err(e)) if e.is_operation_timedout() => Some(FetchFailure::Timeout(e)),
            (None, Err(e)) => Some(FetchFailure::Transport(e)),
            (None, Ok(head)) if !head.is_success() => Some(FetchFailure::Http(head.status)),
            (None, Ok(_)) => None,
        };

        // A body shorter than the window never left it; check what arrived.
        let failure = match failure {
            None if self.part.is_none() && !self.window_passes() => self.failure.take(),
            other => other,
        };

        if let Some(failure) = failure {
            if let Some(part) = self.part.take() {
                part.discard();
            }
            return Err(failure);
        }

        // Short and empty bodies are still only in the window.
        let part = match self.part.take() {
            Some(part) => part,
            None => self.open_part().map_err(FetchFailure::Storage)?,
        };
        if let Err(e) = part.finalize(self.dest) {
            let _ = fs::remove_file(temp_path(self.dest));
            return Err(FetchFailure::Storage(e));
        }

        let bytes = fs::metadata(self.dest)
            .map(|m| m.len())
            .unwrap_or(self.downloaded);
        let suspiciously_small = bytes < self.fetch.small_file_threshold;
        if suspiciously_small {
            tracing::warn!(
                path = %self.dest.display(),
                bytes,
                "downloaded file is very small and may not be valid media"
            );
        }
        Ok(SavedFile {
            path: PathBuf::from(self.dest),
            bytes,
            suspiciously_small,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::progress::NoProgress;
    use std::sync::mpsc;

    fn ok_head(len: Option<u64>) -> ResponseHead {
        ResponseHead {
            status: 200,
            content_type: Some("video/webm".into()),
            content_length: len,
            location: None,
        }
    }

    #[test]
    fn reports_percent_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let (tx, rx) = mpsc::channel::<Progress>();
        let head = ok_head(Some(1000));

        let mut stream = MediaStream::new(&dest, &cfg, &tx);
        let chunk = [0x1au8; 250];
        for _ in 0..4 {
            assert!(stream.accept(&head, &chunk));
        }
        let saved = stream.finish(Ok(head)).unwrap();

        let percents: Vec<f64> = rx.try_iter().filter_map(|p| p.percent()).collect();
        assert_eq!(percents, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(saved.bytes, 1000);
        assert!(!saved.suspiciously_small);
        assert_eq!(std::fs::read(&dest).unwrap().len(), 1000);
        assert!(!temp_path(&dest).exists());
    }

    #[test]
    fn marker_in_first_chunk_aborts_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let (tx, rx) = mpsc::channel::<Progress>();
        let head = ok_head(None);

        let mut stream = MediaStream::new(&dest, &cfg, &tx);
        assert!(!stream.accept(&head, b"<response><returncode>FAILED</returncode></response>"));
        let outcome = stream.finish(Ok(head));

        match outcome {
            Err(FetchFailure::Unsupported { marker }) => assert_eq!(marker, "FAILED"),
            other => panic!("expected unsupported, got {:?}", other),
        }
        assert!(!dest.exists());
        assert!(!temp_path(&dest).exists());
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn marker_split_across_chunks_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let head = ok_head(Some(91));

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, b"<response><returncode>FAI"));
        assert!(!temp_path(&dest).exists());
        assert!(!stream.accept(&head, b"LED</returncode></response>"));

        match stream.finish(Ok(head)) {
            Err(FetchFailure::Unsupported { marker }) => assert_eq!(marker, "FAILED"),
            other => panic!("expected unsupported, got {:?}", other),
        }
        assert!(!dest.exists());
        assert!(!temp_path(&dest).exists());
    }

    #[test]
    fn marker_in_later_chunk_inside_window_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("audio.ogg");
        let cfg = FetchConfig::default();
        let head = ok_head(None);

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, &[0u8; 200]));
        assert!(!stream.accept(&head, b"unsupportedRequest"));
        assert!(matches!(
            stream.finish(Ok(head)),
            Err(FetchFailure::Unsupported { .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn marker_past_window_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("audio.ogg");
        let cfg = FetchConfig::default();
        let head = ok_head(None);

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, &vec![0u8; cfg.sniff_bytes]));
        assert!(temp_path(&dest).exists());
        assert!(stream.accept(&head, b"FAILED"));
        let saved = stream.finish(Ok(head)).unwrap();
        assert_eq!(saved.bytes, cfg.sniff_bytes as u64 + 6);
    }

    #[test]
    fn window_cut_inside_one_large_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig {
            sniff_bytes: 16,
            ..FetchConfig::default()
        };
        let head = ok_head(None);

        let mut body = vec![b'x'; 16];
        body.extend_from_slice(b"<returncode>FAILED</returncode>");
        body.extend_from_slice(&[0u8; 100]);

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, &body));
        let saved = stream.finish(Ok(head)).unwrap();
        assert_eq!(saved.bytes, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[test]
    fn short_body_stays_buffered_until_finish() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let head = ok_head(Some(20));

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, b"0123456789"));
        assert!(stream.accept(&head, b"abcdefghij"));
        assert!(!temp_path(&dest).exists());

        let saved = stream.finish(Ok(head)).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"0123456789abcdefghij");
        assert!(saved.suspiciously_small);
    }

    #[test]
    fn small_body_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let head = ok_head(Some(50));

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, &[7u8; 50]));
        let saved = stream.finish(Ok(head)).unwrap();
        assert_eq!(saved.bytes, 50);
        assert!(saved.suspiciously_small);
    }

    #[test]
    fn unknown_length_reports_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let (tx, rx) = mpsc::channel::<Progress>();
        let head = ok_head(None);

        let mut stream = MediaStream::new(&dest, &cfg, &tx);
        assert!(stream.accept(&head, &[1u8; 300]));
        assert!(stream.accept(&head, &[1u8; 300]));
        stream.finish(Ok(head)).unwrap();

        let events: Vec<Progress> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                Progress::Bytes { downloaded: 300 },
                Progress::Bytes { downloaded: 600 }
            ]
        );
    }

    #[test]
    fn empty_body_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();

        let stream = MediaStream::new(&dest, &cfg, &NoProgress);
        let saved = stream.finish(Ok(ok_head(Some(0)))).unwrap();
        assert_eq!(saved.bytes, 0);
        assert!(saved.suspiciously_small);
        assert!(dest.exists());
    }

    #[test]
    fn error_status_keeps_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let head = ResponseHead {
            status: 404,
            ..ResponseHead::default()
        };

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(!stream.accept(&head, b"not found"));
        assert!(matches!(stream.finish(Ok(head)), Err(FetchFailure::Http(404))));
        assert!(!dest.exists());
    }

    #[test]
    fn error_status_without_body() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.webm");
        let cfg = FetchConfig::default();
        let head = ResponseHead {
            status: 500,
            ..ResponseHead::default()
        };
        let stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(matches!(stream.finish(Ok(head)), Err(FetchFailure::Http(500))));
        assert!(!dest.exists());
    }

    #[test]
    fn unwritable_destination_is_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing-dir").join("video.webm");
        let cfg = FetchConfig::default();
        let head = ok_head(None);

        // Still inside the window: nothing touches disk until finish.
        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(stream.accept(&head, &[0u8; 10]));
        assert!(matches!(stream.finish(Ok(head.clone())), Err(FetchFailure::Storage(_))));

        let mut stream = MediaStream::new(&dest, &cfg, &NoProgress);
        assert!(!stream.accept(&head, &vec![0u8; cfg.sniff_bytes + 10]));
        assert!(matches!(stream.finish(Ok(head)), Err(FetchFailure::Storage(_))));
    }
}
