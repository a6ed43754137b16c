//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - Config text → `build_sink` → write → close
//! - Rotation, compression and retention through the assembled stack
//! - Ordering and backpressure through the batching layer

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::DEFAULT_QUEUE_CAPACITY, 1024);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Context, ContractError, Sink};
    use delivery::build_sink;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    fn load(toml: &str) -> contracts::LogsinkConfig {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    fn sink_toml(path: &Path, extra: &str) -> String {
        format!(
            "[sink]\npath = {:?}\n{extra}",
            path.display().to_string()
        )
    }

    fn backups(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("app.log."))
            .collect();
        names.sort();
        names
    }

    /// Batched stack: every accepted line lands in the file, in order
    #[tokio::test]
    async fn test_e2e_batched_file_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = load(&sink_toml(
            &path,
            "[sink.batch]\nqueue_capacity = 64\nmax_entries = 8\ninterval_ms = 10\n",
        ));

        let sink = build_sink(&config.sink).unwrap();
        assert_eq!(sink.name(), "batch(file(app.log))");

        let ctx = Context::background();
        let mut expected = Vec::new();
        for i in 0..200 {
            let line = format!("entry-{i:03}\n");
            sink.write(&ctx, line.as_bytes()).await.unwrap();
            expected.extend_from_slice(line.as_bytes());
        }
        sink.close(&ctx).await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), expected);
        let metrics = sink.metrics().unwrap();
        assert_eq!(metrics.accepted_count, 200);
        assert_eq!(metrics.delivered_count, 200);
        assert_eq!(metrics.failure_count, 0);
    }

    /// Pre-existing content over the size threshold is archived on the first write
    #[tokio::test]
    async fn test_e2e_threshold_exceeded_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"old").unwrap();

        let config = load(&sink_toml(&path, "[sink.rotation]\nmax_size_bytes = 1\n"));
        let sink = build_sink(&config.sink).unwrap();
        let ctx = Context::background();
        sink.write(&ctx, b"X").await.unwrap();
        sink.close(&ctx).await.unwrap();

        let backups = backups(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read(dir.path().join(&backups[0])).unwrap(), b"old");
        assert_eq!(fs::read(&path).unwrap(), b"X");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    /// Repeated rotations with compression and a retention limit
    #[tokio::test]
    async fn test_e2e_rotation_compression_retention() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = load(&sink_toml(
            &path,
            "[sink.rotation]\nmax_size_bytes = 8\nmax_backups = 2\ncompress = true\n",
        ));
        let sink = build_sink(&config.sink).unwrap();
        let ctx = Context::background();

        // Each 8-byte line fills the file, so every later write rotates
        for i in 0..5 {
            sink.write(&ctx, format!("line-{i:02}\n").as_bytes()).await.unwrap();
        }
        sink.close(&ctx).await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"line-04\n");

        let backups = backups(dir.path());
        assert_eq!(backups.len(), 2, "got {backups:?}");
        let mut restored = Vec::new();
        for name in &backups {
            assert!(name.ends_with(".gz"), "got {name}");
            let mut content = String::new();
            GzDecoder::new(fs::File::open(dir.path().join(name)).unwrap())
                .read_to_string(&mut content)
                .unwrap();
            restored.push(content);
        }
        restored.sort();
        assert_eq!(restored, vec!["line-02\n".to_string(), "line-03\n".to_string()]);
    }

    /// Drop backpressure rejects without blocking once the queue is full
    #[tokio::test]
    async fn test_e2e_drop_backpressure_never_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = load(&sink_toml(
            &path,
            "[sink.batch]\nqueue_capacity = 1\nbackpressure = \"drop\"\n",
        ));
        let sink = build_sink(&config.sink).unwrap();
        let ctx = Context::background();

        let mut accepted = 0u64;
        let mut rejected = 0u64;
        let writes = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            for i in 0..500 {
                match sink.write(&ctx, format!("{i}\n").as_bytes()).await {
                    Ok(()) => accepted += 1,
                    Err(ContractError::QueueFull) => rejected += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        })
        .await;
        assert!(writes.is_ok(), "drop mode must not block");
        sink.close(&ctx).await.unwrap();

        assert_eq!(accepted + rejected, 500);
        let metrics = sink.metrics().unwrap();
        assert_eq!(metrics.accepted_count, accepted);
        assert_eq!(metrics.dropped_count, rejected);

        let lines = fs::read_to_string(&path).unwrap().lines().count() as u64;
        assert_eq!(lines, accepted);
    }

    /// After close every layer reports Closed and a second close is a no-op
    #[tokio::test]
    async fn test_e2e_closed_contract_full_stack() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = load(&sink_toml(
            &path,
            "[sink.batch]\nmax_entries = 4\n\n[sink.retry]\nenable = true\n",
        ));
        let sink = build_sink(&config.sink).unwrap();
        let ctx = Context::background();

        sink.write(&ctx, b"only\n").await.unwrap();
        sink.close(&ctx).await.unwrap();

        assert!(sink.write(&ctx, b"late\n").await.unwrap_err().is_closed());
        assert!(sink.flush(&ctx).await.unwrap_err().is_closed());
        sink.close(&ctx).await.unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"only\n");
    }

    #[tokio::test]
    async fn test_e2e_empty_path_never_builds() {
        let mut config = load("[sink]\npath = \"/tmp/placeholder.log\"\n");
        config.sink.path = Default::default();
        assert!(matches!(build_sink(&config.sink), Err(ContractError::EmptyPath)));
    }
}
