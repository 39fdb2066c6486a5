//! # Fingerprint
//!
//! Reproducibility fingerprints for a node run.
//!
//! Two pure functions:
//! - [`hash_config`]: every meaningful field of [`NodeConfig`]
//! - [`hash_calibration`]: the calibration sub-tree only
//!
//! Fields are absorbed in a fixed explicit order. Reordering, adding or
//! removing an absorbed field changes every fingerprint; renumbering an enum
//! requires bumping [`ConfigVersion`](contracts::ConfigVersion).

mod hasher;

pub use hasher::Fnv1a64;

use contracts::{CalibrationConfig, Fingerprint, NodeConfig};

/// Fingerprint of the calibration payload that affects geometry alignment.
pub fn hash_calibration(calib: &CalibrationConfig) -> Fingerprint {
    let mut h = Fnv1a64::new();
    absorb_calibration(&mut h, calib);
    h.finish()
}

/// Fingerprint of the full configuration. Invalid configurations hash too.
pub fn hash_config(cfg: &NodeConfig) -> Fingerprint {
    let mut h = Fnv1a64::new();

    h.write_u32(cfg.version.as_u32());

    h.write_i32(cfg.mode.stable_id());
    h.write_str(&cfg.node_id);

    let frames = &cfg.frames;
    h.write_str(&frames.lidar_frame);
    h.write_str(&frames.node_frame);
    h.write_str(&frames.site_frame);

    absorb_calibration(&mut h, &cfg.calibration);

    h.write_i64(cfg.baseline.capture_duration_ns);
    h.write_i64(cfg.baseline.warmup_duration_ns);

    let mapping = &cfg.mapping;
    h.write_f32(mapping.voxel_size_m);
    h.write_i32(mapping.block_size_vox);
    h.write_aabb(&mapping.roi.aabb());
    h.write_f32(mapping.min_range_m);
    h.write_f32(mapping.max_range_m);
    h.write_bool(mapping.use_intensity);
    h.write_i32(mapping.integrate_hz);

    let budgets = &cfg.budgets;
    h.write_i64(budgets.max_points_per_sec);
    h.write_i32(budgets.target_fps);
    h.write_f32(budgets.downsample_voxel_m);

    let change = &cfg.change;
    h.write_i64(change.persistence_ns);
    h.write_f32(change.min_cluster_volume_m3);
    h.write_f32(change.min_aabb_edge_m);
    h.write_f32(change.min_confidence);
    h.write_bool(change.prefer_site_frame);

    let replay = &cfg.replay;
    h.write_path(&replay.dataset_path);
    h.write_f64(replay.time_scale);
    h.write_i64(replay.start_offset_ns);
    h.write_i64(replay.end_offset_ns);
    h.write_bool(replay.loop_playback);

    let input = &cfg.input;
    h.write_str(input.kind.as_str());
    h.write_f64(input.tick_hz);
    h.write_i32(input.heartbeat_every_s);
    h.write_i64(input.max_ticks);
    h.write_f64(input.max_run_s);

    let synth = &input.synth;
    h.write_u32(synth.seed);
    h.write_i32(synth.num_points);
    h.write_bool(synth.enable_obstacle);
    h.write_f64(synth.obstacle_start_s);
    h.write_bool(synth.moving_obstacle);
    h.write_f32(synth.obstacle_speed_mps);
    h.write_f64(synth.baseline_s);

    let frame_dir = &input.frame_dir;
    h.write_path(&frame_dir.path);
    h.write_bool(frame_dir.loop_playback);
    h.write_f64(frame_dir.fps);

    let output = &cfg.output;
    h.write_path(&output.out_dir);
    h.write_i32(output.heartbeat_period_s);
    h.write_bool(output.write_latest);
    h.write_u32(output.keep_last_runs);
    h.write_u32(output.frame_stats_every);

    h.finish()
}

fn absorb_calibration(h: &mut Fnv1a64, calib: &CalibrationConfig) {
    h.write_path(&calib.calibration_path);
    h.write_str(&calib.calibration_version);
    h.write_transform(&calib.t_node_lidar);
    h.write_transform(&calib.t_site_node);
}
