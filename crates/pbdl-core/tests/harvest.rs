//! Integration tests: full runs of discovery plus download.

mod common;

use common::media_server::{self, Reply};
use pbdl_core::config::PbdlConfig;
use pbdl_core::discover::{default_chain, MediaClass, MediaUrls};
use pbdl_core::fetcher::{FetchFailure, Progress, ProgressSink};
use pbdl_core::harvest::{harvest, FileReport, HarvestObserver, HarvestSummary};
use pbdl_core::session::Session;
use std::cell::RefCell;
use std::path::Path;
use tempfile::tempdir;

const PAGE: &str = "/playback/presentation/2.3/rec-1";

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<String>>,
}

impl ProgressSink for Recorder {
    fn report(&self, _progress: Progress) {}
}

impl HarvestObserver for Recorder {
    fn discovered(&self, urls: &MediaUrls) {
        self.events
            .borrow_mut()
            .push(format!("discovered {}", urls.len()));
    }

    fn file_started(&self, class: MediaClass, _url: &str, destination: &Path) {
        let name = destination.file_name().unwrap().to_string_lossy();
        self.events
            .borrow_mut()
            .push(format!("start {} {}", class, name));
    }

    fn file_finished(&self, report: &FileReport) {
        let ok = if report.outcome.is_ok() { "ok" } else { "failed" };
        self.events.borrow_mut().push(format!("finish {}", ok));
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn nothing_found_writes_only_page_dump() {
    let server = media_server::start_routes(vec![(PAGE, Reply::ok("text/html", "<html></html>"))]);
    let out = tempdir().unwrap();
    let output_dir = out.path().join("downloads");
    let cfg = PbdlConfig::default();
    let mut session = Session::new(&server.url(PAGE), &cfg.http).unwrap();
    let mut chain = default_chain(&cfg.discovery, &cfg.http, &output_dir);
    let recorder = Recorder::default();

    let summary = harvest(&mut session, &mut chain, &output_dir, &cfg.fetch, &recorder).unwrap();

    match summary {
        HarvestSummary::NothingFound { hint } => {
            assert_eq!(hint, server.url("/presentation/"));
        }
        other => panic!("expected NothingFound, got {:?}", other),
    }
    assert_eq!(file_names(&output_dir), vec!["page_source.html".to_string()]);
    assert_eq!(*recorder.events.borrow(), vec!["discovered 0".to_string()]);
}

#[test]
fn downloads_videos_then_audio_with_independent_outcomes() {
    let page = r#"<script>
        var media = {
          "deskshare":"/presentation/rec-1/deskshare/deskshare.webm",
          "video":"/presentation/rec-1/video/webcams.webm",
          "audio":"/presentation/rec-1/audio/audio.ogg"
        };
    </script>"#;
    let server = media_server::start_routes(vec![
        (PAGE, Reply::ok("text/html", page)),
        (
            "/presentation/rec-1/deskshare/deskshare.webm",
            Reply::ok("video/webm", vec![0x1au8; 8192]),
        ),
        (
            "/presentation/rec-1/video/webcams.webm",
            Reply::ok(
                "text/xml",
                "<response><messageKey>unsupportedRequest</messageKey></response>",
            ),
        ),
        (
            "/presentation/rec-1/audio/audio.ogg",
            Reply::ok("audio/ogg", vec![0x4fu8; 4096]),
        ),
    ]);
    let out = tempdir().unwrap();
    let output_dir = out.path().join("downloads");
    let cfg = PbdlConfig::default();
    let mut session = Session::new(&server.url(PAGE), &cfg.http).unwrap();
    let mut chain = default_chain(&cfg.discovery, &cfg.http, &output_dir);
    let recorder = Recorder::default();

    let summary = harvest(&mut session, &mut chain, &output_dir, &cfg.fetch, &recorder).unwrap();

    let reports = summary.reports();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].class, MediaClass::Video);
    assert_eq!(reports[1].class, MediaClass::Video);
    assert_eq!(reports[2].class, MediaClass::Audio);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);

    let webcams = reports
        .iter()
        .find(|r| r.url.ends_with("webcams.webm"))
        .unwrap();
    assert!(matches!(webcams.outcome, Err(FetchFailure::Unsupported { .. })));

    assert_eq!(
        file_names(&output_dir),
        vec![
            "audio.ogg".to_string(),
            "deskshare.webm".to_string(),
            "page_source.html".to_string(),
        ]
    );
    assert_eq!(std::fs::read(output_dir.join("deskshare.webm")).unwrap().len(), 8192);

    let events = recorder.events.borrow();
    assert_eq!(events[0], "discovered 3");
    assert_eq!(events.len(), 1 + 2 * 3);
    assert_eq!(events.last().unwrap(), "finish ok");
}

#[test]
fn uncreatable_output_directory_is_fatal() {
    let server = media_server::start_routes(vec![]);
    let out = tempdir().unwrap();
    let blocker = out.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();
    let output_dir = blocker.join("downloads");

    let cfg = PbdlConfig::default();
    let mut session = Session::new(&server.url(PAGE), &cfg.http).unwrap();
    let mut chain = default_chain(&cfg.discovery, &cfg.http, &output_dir);

    let result = harvest(
        &mut session,
        &mut chain,
        &output_dir,
        &cfg.fetch,
        &pbdl_core::fetcher::NoProgress,
    );
    assert!(result.is_err());
    assert!(server.requests().is_empty());
}
