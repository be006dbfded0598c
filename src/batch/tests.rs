use super::*;
use async_trait::async_trait;
use mockall::mock;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

mock! {
    Api {}

    #[async_trait]
    impl BatchApi for Api {
        async fn get_upload_links(
            &self,
            job_id: &str,
            files: &[String],
        ) -> Result<UploadLinks, BatchError>;

        async fn get_download_links(
            &self,
            job_id: &str,
            files: &[String],
        ) -> Result<DownloadLinks, BatchError>;

        async fn get_status(&self, job_id: &str) -> Result<JobStatus, BatchError>;

        async fn start(&self, job_id: &str) -> Result<JobStatus, BatchError>;
    }
}

mock! {
    Store {}

    #[async_trait]
    impl BlobStore for Store {
        async fn put(
            &self,
            url: &str,
            body: Vec<u8>,
            content_type: &str,
            timeout: Duration,
        ) -> Result<u16, BatchError>;

        async fn get(&self, url: &str) -> Result<(u16, Vec<u8>), BatchError>;
    }
}

fn status(state: &str, details: Vec<JobDetail>) -> JobStatus {
    JobStatus {
        job_id: "job-1".to_string(),
        job_state: state.to_string(),
        job_details: details,
    }
}

fn detail(input: Option<&str>, output: Option<&str>) -> JobDetail {
    JobDetail {
        inputs: input
            .into_iter()
            .map(|f| FileRecord {
                file_name: f.to_string(),
            })
            .collect(),
        outputs: output
            .into_iter()
            .map(|f| FileRecord {
                file_name: f.to_string(),
            })
            .collect(),
    }
}

fn links(urls: &[(&str, &str)]) -> UploadLinks {
    UploadLinks {
        upload_urls: urls
            .iter()
            .map(|(name, url)| {
                (
                    name.to_string(),
                    FileUrl {
                        file_url: url.to_string(),
                    },
                )
            })
            .collect(),
    }
}

fn job_with(api: MockApi, store: MockStore) -> Job {
    Job::new("job-1", Arc::new(api), Arc::new(store))
}

#[tokio::test]
async fn test_output_mappings_exclude_partial_details() {
    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Ok(status(
            "Processing",
            vec![
                detail(Some("a.wav"), Some("a-out.json")),
                detail(Some("b.wav"), None),
                detail(Some("c.wav"), Some("c-out.json")),
            ],
        ))
    });

    let job = job_with(api, MockStore::new());
    let mappings = job.get_output_mappings().await.unwrap();
    assert_eq!(mappings.len(), 2);
    assert_eq!(
        mappings[0],
        OutputMapping {
            input_file: "a.wav".to_string(),
            output_file: "a-out.json".to_string(),
        }
    );
    assert_eq!(mappings[1].input_file, "c.wav");
}

#[tokio::test]
async fn test_wait_until_complete_stops_on_terminal_state() {
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_in_mock = polls.clone();

    let mut api = MockApi::new();
    api.expect_get_status().returning(move |_| {
        let n = polls_in_mock.fetch_add(1, Ordering::SeqCst);
        // Mixed case on the terminal answer: the compare is
        // case-insensitive.
        if n < 2 {
            Ok(status("Processing", vec![]))
        } else {
            Ok(status("Completed", vec![]))
        }
    });

    let job = job_with(api, MockStore::new());
    let final_status = job
        .wait_until_complete(Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();
    assert!(final_status.is_successful());
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_until_complete_returns_failed_status() {
    let mut api = MockApi::new();
    api.expect_get_status()
        .returning(|_| Ok(status("FAILED", vec![])));

    let job = job_with(api, MockStore::new());
    let final_status = job
        .wait_until_complete(Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();
    assert!(final_status.is_failed());
    assert!(final_status.is_terminal());
}

#[tokio::test]
async fn test_wait_until_complete_deadline() {
    let mut api = MockApi::new();
    api.expect_get_status()
        .returning(|_| Ok(status("processing", vec![])));

    let job = job_with(api, MockStore::new());
    let timeout = Duration::from_millis(25);
    let start = Instant::now();
    let err = job
        .wait_until_complete(Duration::from_millis(10), timeout)
        .await
        .unwrap_err();
    assert!(start.elapsed() >= timeout);
    match err {
        BatchError::DeadlineExceeded {
            job_id,
            timeout: reported,
        } => {
            assert_eq!(job_id, "job-1");
            assert_eq!(reported, timeout);
        }
        other => panic!("expected deadline error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exists_maps_status_errors() {
    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Err(BatchError::NotFound {
            job_id: "job-1".to_string(),
        })
    });
    let job = job_with(api, MockStore::new());
    assert!(!job.exists().await.unwrap());

    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Err(BatchError::Api {
            status: 500,
            message: "boom".to_string(),
        })
    });
    let job = job_with(api, MockStore::new());
    assert!(!job.exists().await.unwrap());

    let mut api = MockApi::new();
    api.expect_get_status()
        .returning(|_| Ok(status("pending", vec![])));
    let job = job_with(api, MockStore::new());
    assert!(job.exists().await.unwrap());
}

#[tokio::test]
async fn test_exists_propagates_transport_failure() {
    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Err(BatchError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    });
    let job = job_with(api, MockStore::new());
    assert!(matches!(job.exists().await, Err(BatchError::Io(_))));
}

#[tokio::test]
async fn test_upload_files_puts_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let wav_path = dir.path().join("hello.wav");
    std::fs::File::create(&wav_path)
        .unwrap()
        .write_all(b"RIFFdata")
        .unwrap();
    let json_path = dir.path().join("meta.json");
    std::fs::File::create(&json_path)
        .unwrap()
        .write_all(b"{}")
        .unwrap();

    let mut api = MockApi::new();
    api.expect_get_upload_links().returning(|_, files| {
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], "hello.wav");
        assert_eq!(files[1], "meta.json");
        Ok(links(&[
            ("hello.wav", "https://blob/hello"),
            ("meta.json", "https://blob/meta"),
        ]))
    });

    let uploaded = Arc::new(Mutex::new(Vec::new()));
    let uploaded_in_mock = uploaded.clone();
    let mut store = MockStore::new();
    store
        .expect_put()
        .returning(move |url, body, content_type, _| {
            uploaded_in_mock.lock().unwrap().push((
                url.to_string(),
                body.len(),
                content_type.to_string(),
            ));
            Ok(201)
        });

    let job = job_with(api, store);
    job.upload_files(&[&wav_path, &json_path], Duration::from_secs(60))
        .await
        .unwrap();

    let uploaded = uploaded.lock().unwrap();
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0].0, "https://blob/hello");
    assert_eq!(uploaded[0].1, 8);
    assert_eq!(uploaded[1].2, "application/json");
}

#[tokio::test]
async fn test_upload_default_content_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noext");
    std::fs::write(&path, b"samples").unwrap();

    let mut api = MockApi::new();
    api.expect_get_upload_links()
        .returning(|_, _| Ok(links(&[("noext", "https://blob/noext")])));

    let mut store = MockStore::new();
    store.expect_put().returning(|_, _, content_type, _| {
        assert_eq!(content_type, "audio/wav");
        Ok(200)
    });

    let job = job_with(api, store);
    job.upload_files(&[&path], Duration::from_secs(60))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_aborts_on_first_rejected_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.wav");
    let second = dir.path().join("b.wav");
    std::fs::write(&first, b"a").unwrap();
    std::fs::write(&second, b"b").unwrap();

    let mut api = MockApi::new();
    api.expect_get_upload_links().returning(|_, _| {
        Ok(links(&[
            ("a.wav", "https://blob/a"),
            ("b.wav", "https://blob/b"),
        ]))
    });

    let puts = Arc::new(AtomicUsize::new(0));
    let puts_in_mock = puts.clone();
    let mut store = MockStore::new();
    store.expect_put().returning(move |url, _, _, _| {
        puts_in_mock.fetch_add(1, Ordering::SeqCst);
        if url.ends_with("/b") {
            Ok(403)
        } else {
            Ok(200)
        }
    });

    let job = job_with(api, store);
    let err = job
        .upload_files(&[&first, &second], Duration::from_secs(60))
        .await
        .unwrap_err();
    match err {
        BatchError::Upload { file, status } => {
            assert_eq!(file, "b.wav");
            assert_eq!(status, 403);
        }
        other => panic!("expected upload error, got {:?}", other),
    }
    // The first file went through before the abort; nothing rolls it back.
    assert_eq!(puts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_upload_missing_link() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    std::fs::write(&path, b"a").unwrap();

    let mut api = MockApi::new();
    api.expect_get_upload_links().returning(|_, _| Ok(links(&[])));

    let job = job_with(api, MockStore::new());
    let err = job
        .upload_files(&[&path], Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::MissingLink { file } if file == "a.wav"));
}

#[tokio::test]
async fn test_download_outputs_writes_mapped_files() {
    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Ok(status(
            "completed",
            vec![
                detail(Some("a.wav"), Some("a-out.json")),
                detail(Some("b.wav"), Some("b-out.json")),
            ],
        ))
    });
    api.expect_get_download_links().returning(|_, files| {
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], "a-out.json");
        assert_eq!(files[1], "b-out.json");
        Ok(DownloadLinks {
            download_urls: files
                .iter()
                .map(|f| {
                    (
                        f.clone(),
                        FileUrl {
                            file_url: format!("https://blob/{}", f),
                        },
                    )
                })
                .collect(),
        })
    });

    let mut store = MockStore::new();
    store
        .expect_get()
        .returning(|url| Ok((200, format!("{{\"from\":\"{}\"}}", url).into_bytes())));

    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("outputs");
    let job = job_with(api, store);
    job.download_outputs(&out_dir).await.unwrap();

    let a = std::fs::read_to_string(out_dir.join("a.wav.json")).unwrap();
    assert_eq!(a, "{\"from\":\"https://blob/a-out.json\"}");
    assert!(out_dir.join("b.wav.json").exists());
}

#[tokio::test]
async fn test_download_aborts_but_keeps_earlier_files() {
    let mut api = MockApi::new();
    api.expect_get_status().returning(|_| {
        Ok(status(
            "completed",
            vec![
                detail(Some("a.wav"), Some("a-out.json")),
                detail(Some("b.wav"), Some("b-out.json")),
            ],
        ))
    });
    api.expect_get_download_links().returning(|_, files| {
        Ok(DownloadLinks {
            download_urls: files
                .iter()
                .map(|f| {
                    (
                        f.clone(),
                        FileUrl {
                            file_url: format!("https://blob/{}", f),
                        },
                    )
                })
                .collect(),
        })
    });

    let mut store = MockStore::new();
    store.expect_get().returning(|url| {
        if url.ends_with("b-out.json") {
            Ok((500, Vec::new()))
        } else {
            Ok((200, b"{}".to_vec()))
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("outputs");
    let job = job_with(api, store);
    let err = job.download_outputs(&out_dir).await.unwrap_err();
    match err {
        BatchError::Download { file, status } => {
            assert_eq!(file, "b-out.json");
            assert_eq!(status, 500);
        }
        other => panic!("expected download error, got {:?}", other),
    }
    assert!(out_dir.join("a.wav.json").exists());
    assert!(!out_dir.join("b.wav.json").exists());
}

#[tokio::test]
async fn test_predicates_refetch_every_call() {
    let polls = Arc::new(AtomicUsize::new(0));
    let polls_in_mock = polls.clone();
    let mut api = MockApi::new();
    api.expect_get_status().returning(move |_| {
        let n = polls_in_mock.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            Ok(status("processing", vec![]))
        } else {
            Ok(status("completed", vec![]))
        }
    });

    // Two consecutive calls may observe different answers; nothing is
    // cached between them.
    let job = job_with(api, MockStore::new());
    assert!(!job.is_complete().await.unwrap());
    assert!(job.is_complete().await.unwrap());
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_is_success_range() {
    assert!(is_success(200));
    assert!(is_success(201));
    assert!(is_success(226));
    assert!(!is_success(199));
    assert!(!is_success(227));
    assert!(!is_success(302));
    assert!(!is_success(404));
}
