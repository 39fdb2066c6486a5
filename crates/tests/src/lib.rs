//! # Integration Tests
//!
//! Cross-crate end-to-end tests: configuration file to event log.

#[cfg(test)]
mod support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use config_loader::ConfigLoader;
    use contracts::NodeConfig;
    use dispatcher::JsonlEventSink;
    use node_runtime::{DriveLoop, LoopConfig, NodeRunner, RunStats};
    use serde_json::Value;

    pub fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    pub fn load(path: &Path) -> NodeConfig {
        ConfigLoader::load_from_path(path).unwrap()
    }

    /// Full lifecycle the way the CLI drives it, with a fast pacing clock.
    pub async fn run_once(config: &NodeConfig, config_path: &Path) -> (RunStats, PathBuf) {
        let mut runner = NodeRunner::new(config.clone(), config_path);
        let mut sink = JsonlEventSink::new().with_latest(config.output.write_latest);
        runner.start(&mut sink).unwrap();
        let log = sink.path().unwrap().to_path_buf();

        let mut source = ingestion::source_from_config(&config.input);
        source.open().unwrap();

        let loop_config = LoopConfig {
            tick_period: Duration::from_millis(1),
            ..LoopConfig::from_node_config(config)
        };
        let result = DriveLoop::new(loop_config)
            .run(&runner, &mut sink, source.as_mut(), std::future::pending())
            .await;

        source.close();
        runner.stop(&mut sink);
        (result.unwrap(), log)
    }

    pub fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// `key=value` token from a frame_stats message
    pub fn message_field(event: &Value, key: &str) -> String {
        let prefix = format!("{key}=");
        event["message"]
            .as_str()
            .unwrap()
            .split(' ')
            .find_map(|tok| tok.strip_prefix(prefix.as_str()))
            .unwrap()
            .to_string()
    }
}

#[cfg(test)]
mod fingerprint_tests {
    use super::support::{load, write_config};
    use fingerprint::{hash_calibration, hash_config};
    use tempfile::tempdir;

    #[test]
    fn identical_files_hash_identically() {
        let dir = tempdir().unwrap();
        let body = "node_id = \"edge_1\"\n[mapping]\nvoxel_size_m = 0.05\n";
        let a = load(&write_config(dir.path(), "a.toml", body));
        let b = load(&write_config(dir.path(), "b.toml", body));
        assert_eq!(hash_config(&a), hash_config(&b));
        assert_eq!(hash_calibration(&a.calibration), hash_calibration(&b.calibration));
    }

    #[test]
    fn include_layering_is_transparent_to_the_hash() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "base.toml", "[input]\ntick_hz = 20.0\n");
        let layered = load(&write_config(
            dir.path(),
            "node.toml",
            "includes = [\"base.toml\"]\nnode_id = \"edge_1\"\n",
        ));
        let flat = load(&write_config(
            dir.path(),
            "flat.toml",
            "node_id = \"edge_1\"\n[input]\ntick_hz = 20.0\n",
        ));
        assert_eq!(hash_config(&layered), hash_config(&flat));
    }

    #[test]
    fn calibration_changes_move_both_hashes_others_only_one() {
        let dir = tempdir().unwrap();
        let base = load(&write_config(dir.path(), "base.toml", ""));
        let calib = load(&write_config(
            dir.path(),
            "calib.toml",
            "[calibration]\ncalibration_version = \"site_b\"\n",
        ));
        let other = load(&write_config(
            dir.path(),
            "other.toml",
            "[output]\nframe_stats_every = 2\n",
        ));

        assert_ne!(hash_config(&base), hash_config(&calib));
        assert_ne!(
            hash_calibration(&base.calibration),
            hash_calibration(&calib.calibration)
        );

        assert_ne!(hash_config(&base), hash_config(&other));
        assert_eq!(
            hash_calibration(&base.calibration),
            hash_calibration(&other.calibration)
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::time::Duration;

    use contracts::{Frame, PointXyzi, TimestampNs};
    use dispatcher::{event_log_file_name, parse_event_log_name, LATEST_FILE_NAME};
    use fingerprint::{hash_calibration, hash_config};
    use ingestion::FrameDirWriter;
    use node_runtime::StopReason;
    use tempfile::tempdir;

    use super::support::{load, message_field, read_lines, run_once, write_config};

    /// Synthetic run at 10 Hz: the obstacle joins the frame at exactly 8.0 s.
    #[tokio::test]
    async fn test_e2e_obstacle_appears_at_eight_seconds() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let path = write_config(
            dir.path(),
            "node.toml",
            &format!(
                "[input]\ntype = \"synth\"\ntick_hz = 10.0\nheartbeat_every_s = 0\nmax_ticks = 90\n\n\
                 [input.synth]\nnum_points = 1600\nbaseline_s = 5.0\nobstacle_start_s = 8.0\n\n\
                 [output]\nout_dir = \"{}\"\n",
                out.display()
            ),
        );
        let config = load(&path);

        let (stats, log) = run_once(&config, &path).await;
        assert_eq!(stats.stop_reason, StopReason::MaxTicks);
        assert_eq!(stats.frames, 90);

        let events = read_lines(&log);
        let frame_stats: Vec<_> = events
            .iter()
            .filter(|e| e["type"] == "frame_stats")
            .collect();
        assert_eq!(frame_stats.len(), 90);

        let first_with_obstacle = frame_stats
            .iter()
            .find(|e| message_field(e, "num_points") != "1600")
            .unwrap();
        assert_eq!(message_field(first_with_obstacle, "t_ns"), "8000000000");
        assert_eq!(message_field(first_with_obstacle, "frame_id"), "synth_80");
        assert_eq!(message_field(first_with_obstacle, "num_points"), "2200");
    }

    #[tokio::test]
    async fn test_e2e_event_log_shape() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let path = write_config(
            dir.path(),
            "node.toml",
            &format!(
                "node_id = \"edge \\\"quoted\\\"\"\n\
                 [input]\ntick_hz = 50.0\nmax_ticks = 3\n\n[input.synth]\nnum_points = 9\n\n\
                 [output]\nout_dir = \"{}\"\n",
                out.display()
            ),
        );
        let config = load(&path);
        let (_, log) = run_once(&config, &path).await;

        let ns = parse_event_log_name(log.file_name().unwrap().to_str().unwrap()).unwrap();
        assert!(ns > 0);

        let lines = read_lines(&log);
        let header = &lines[0];
        assert_eq!(header["type"], "run_started");
        assert_eq!(header["t_ns"], 0);
        assert_eq!(header["t_wall_ns"], ns);
        assert_eq!(header["node_id"], "edge \"quoted\"");
        assert_eq!(header["config_hash"], hash_config(&config).to_string());
        assert_eq!(
            header["calibration_hash"],
            hash_calibration(&config.calibration).to_string()
        );

        for event in &lines[1..] {
            let t_ns = event["t_ns"].as_i64().unwrap();
            let t_s = event["t_s"].as_f64().unwrap();
            assert!((t_s - t_ns as f64 / 1e9).abs() < 1e-6, "{event}");
            assert!(event["t_wall_ns"].as_i64().unwrap() >= ns);
            assert!(event.get("confidence").is_none());
        }

        let kinds: Vec<&str> = lines.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "run_started",
                "heartbeat",
                "frame_stats",
                "frame_stats",
                "frame_stats",
                "shutdown"
            ]
        );

        // latest mirrors the primary log
        assert_eq!(read_lines(&out.join(LATEST_FILE_NAME)), lines);
    }

    /// Directory replay plays files in name order, then reports end-of-stream.
    #[tokio::test]
    async fn test_e2e_frame_dir_replay_until_eof() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        let mut writer = FrameDirWriter::create(&frames).unwrap();
        for i in 0..3_i64 {
            let points = vec![PointXyzi::new(1.0, 2.0, 3.0, 0.5); (i + 1) as usize];
            writer
                .write_frame(&Frame::new(
                    TimestampNs::from_nanos(i * 50_000_000),
                    "recorded",
                    points,
                ))
                .unwrap();
        }
        writer.finish().unwrap();

        let out = dir.path().join("out");
        let path = write_config(
            dir.path(),
            "node.toml",
            &format!(
                "mode = \"replay\"\n[input]\ntype = \"frame_dir\"\n\n\
                 [input.frame_dir]\npath = \"{}\"\n\n[output]\nout_dir = \"{}\"\n",
                frames.display(),
                out.display()
            ),
        );
        let config = load(&path);
        let (stats, log) = run_once(&config, &path).await;
        assert_eq!(stats.stop_reason, StopReason::EndOfStream);
        assert_eq!(stats.frames, 3);

        let events = read_lines(&log);
        let ids: Vec<String> = events
            .iter()
            .filter(|e| e["type"] == "frame_stats")
            .map(|e| message_field(e, "frame_id"))
            .collect();
        assert_eq!(ids, vec!["000000.bin", "000001.bin", "000002.bin"]);

        let t_values: Vec<String> = events
            .iter()
            .filter(|e| e["type"] == "frame_stats")
            .map(|e| message_field(e, "t_ns"))
            .collect();
        assert_eq!(t_values, vec!["0", "50000000", "100000000"]);

        let last = events.last().unwrap();
        assert_eq!(last["type"], "input_eof");
        assert_eq!(last["message"], "input source reached end");
    }

    /// Repeated runs keep at most `keep_last_runs` primary logs plus latest.
    #[tokio::test]
    async fn test_e2e_pruning_bound_across_runs() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        // pre-existing ancient logs
        for ns in [1_i64, 2, 3] {
            fs::write(out.join(event_log_file_name(ns)), "{}\n").unwrap();
        }

        let path = write_config(
            dir.path(),
            "node.toml",
            &format!(
                "[input]\nmax_ticks = 1\n\n[input.synth]\nnum_points = 4\n\n\
                 [output]\nout_dir = \"{}\"\nkeep_last_runs = 2\n",
                out.display()
            ),
        );
        let config = load(&path);

        let mut logs = Vec::new();
        for _ in 0..4 {
            let (_, log) = run_once(&config, &path).await;
            logs.push(log);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let mut primaries: Vec<i64> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| parse_event_log_name(e.unwrap().file_name().to_str()?))
            .collect();
        primaries.sort_unstable();

        // pruning runs before each new log is created: 2 kept + the last run
        assert_eq!(primaries.len(), 3);
        assert!(primaries.iter().all(|&ns| ns > 3));
        assert!(logs[3].exists());
        assert!(logs[2].exists());
        assert!(logs[1].exists());
        assert!(!logs[0].exists());
        assert!(out.join(LATEST_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_e2e_without_latest_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let path = write_config(
            dir.path(),
            "node.toml",
            &format!(
                "[input]\nmax_ticks = 2\n\n[input.synth]\nnum_points = 4\n\n\
                 [output]\nout_dir = \"{}\"\nwrite_latest = false\n",
                out.display()
            ),
        );
        let config = load(&path);
        let (_, log) = run_once(&config, &path).await;
        assert!(log.exists());
        assert!(!out.join(LATEST_FILE_NAME).exists());
    }
}
