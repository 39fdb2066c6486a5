//! 配置验证
//!
//! 按 section 逐项检查：
//! - 标识符与坐标系名称非空
//! - 标定变换有限且为刚体变换
//! - 时长、范围与预算在允许区间内
//! - 所选输入源的必要参数 (`frame_dir.path`)
//! - 输出目录已配置
//!
//! 比较写成 `!(x > 0.0)` 的形式，NaN 会判为失败。

use contracts::{ContractError, InputKind, NodeConfig, TransformSe3};

/// 标定变换刚体检查的容差
const RIGID_TOLERANCE: f32 = 1e-3;

/// 验证 NodeConfig
///
/// 返回遇到的第一个错误，或 Ok(())
pub fn validate(cfg: &NodeConfig) -> Result<(), ContractError> {
    validate_identity(cfg)?;
    validate_calibration(cfg)?;
    validate_baseline(cfg)?;
    validate_mapping(cfg)?;
    validate_budgets(cfg)?;
    validate_change(cfg)?;
    validate_replay(cfg)?;
    validate_input(cfg)?;
    validate_output(cfg)?;
    Ok(())
}

fn ensure(ok: bool, field: &str, message: impl Into<String>) -> Result<(), ContractError> {
    if ok {
        Ok(())
    } else {
        Err(ContractError::config_validation(field, message))
    }
}

fn validate_identity(cfg: &NodeConfig) -> Result<(), ContractError> {
    ensure(!cfg.node_id.trim().is_empty(), "node_id", "node_id cannot be empty")?;

    let frames = &cfg.frames;
    for (field, value) in [
        ("frames.lidar_frame", &frames.lidar_frame),
        ("frames.node_frame", &frames.node_frame),
        ("frames.site_frame", &frames.site_frame),
    ] {
        ensure(!value.is_empty(), field, "frame name cannot be empty")?;
    }
    Ok(())
}

fn validate_transform(field: &str, t: &TransformSe3) -> Result<(), ContractError> {
    ensure(t.is_finite(), field, "transform contains non-finite values")?;
    ensure(
        t.is_rigid(RIGID_TOLERANCE),
        field,
        "transform must be rigid: bottom row [0, 0, 0, 1] and orthonormal rotation",
    )
}

fn validate_calibration(cfg: &NodeConfig) -> Result<(), ContractError> {
    let calib = &cfg.calibration;
    validate_transform("calibration.T_node_lidar", &calib.t_node_lidar)?;
    validate_transform("calibration.T_site_node", &calib.t_site_node)
}

fn validate_baseline(cfg: &NodeConfig) -> Result<(), ContractError> {
    let baseline = &cfg.baseline;
    ensure(
        baseline.capture_duration_ns >= 0,
        "baseline.capture_duration_s",
        "capture duration must be >= 0",
    )?;
    ensure(
        baseline.warmup_duration_ns >= 0,
        "baseline.warmup_duration_s",
        "warmup duration must be >= 0",
    )
}

fn validate_mapping(cfg: &NodeConfig) -> Result<(), ContractError> {
    let mapping = &cfg.mapping;
    ensure(
        mapping.voxel_size_m > 0.0,
        "mapping.voxel_size_m",
        format!("voxel_size_m must be > 0, got {}", mapping.voxel_size_m),
    )?;
    ensure(
        mapping.block_size_vox > 0,
        "mapping.block_size_vox",
        format!("block_size_vox must be > 0, got {}", mapping.block_size_vox),
    )?;

    let roi = mapping.roi.aabb();
    let finite = [roi.min.x, roi.min.y, roi.min.z, roi.max.x, roi.max.y, roi.max.z]
        .iter()
        .all(|v| v.is_finite());
    ensure(finite && roi.is_valid(), "mapping.roi", "roi min must be <= max on every axis")?;

    ensure(
        mapping.min_range_m >= 0.0,
        "mapping.min_range_m",
        "min_range_m must be >= 0",
    )?;
    ensure(
        mapping.min_range_m < mapping.max_range_m,
        "mapping.min_range_m / mapping.max_range_m",
        format!(
            "min_range_m ({}) must be < max_range_m ({})",
            mapping.min_range_m, mapping.max_range_m
        ),
    )?;
    ensure(
        mapping.integrate_hz > 0,
        "mapping.integrate_hz",
        "integrate_hz must be > 0",
    )
}

fn validate_budgets(cfg: &NodeConfig) -> Result<(), ContractError> {
    let budgets = &cfg.budgets;
    ensure(
        budgets.max_points_per_sec > 0,
        "budgets.max_points_per_sec",
        "max_points_per_sec must be > 0",
    )?;
    ensure(budgets.target_fps > 0, "budgets.target_fps", "target_fps must be > 0")?;
    ensure(
        budgets.downsample_voxel_m > 0.0,
        "budgets.downsample_voxel_m",
        "downsample_voxel_m must be > 0",
    )
}

fn validate_change(cfg: &NodeConfig) -> Result<(), ContractError> {
    let change = &cfg.change;
    ensure(
        change.persistence_ns >= 0,
        "change.persistence_s",
        "persistence must be >= 0",
    )?;
    ensure(
        change.min_cluster_volume_m3 >= 0.0,
        "change.min_cluster_volume_m3",
        "min_cluster_volume_m3 must be >= 0",
    )?;
    ensure(
        change.min_aabb_edge_m >= 0.0,
        "change.min_aabb_edge_m",
        "min_aabb_edge_m must be >= 0",
    )?;
    ensure(
        (0.0..=1.0).contains(&change.min_confidence),
        "change.min_confidence",
        format!("min_confidence must be in [0, 1], got {}", change.min_confidence),
    )
}

fn validate_replay(cfg: &NodeConfig) -> Result<(), ContractError> {
    let replay = &cfg.replay;
    ensure(
        replay.time_scale >= 0.0 && replay.time_scale.is_finite(),
        "replay.time_scale",
        "time_scale must be >= 0",
    )?;
    ensure(
        replay.start_offset_ns >= 0,
        "replay.start_offset_s",
        "start offset must be >= 0",
    )?;
    ensure(
        replay.end_offset_ns >= 0,
        "replay.end_offset_s",
        "end offset must be >= 0",
    )
}

fn validate_input(cfg: &NodeConfig) -> Result<(), ContractError> {
    let input = &cfg.input;
    ensure(
        input.tick_hz.is_finite() && input.tick_hz > 0.0,
        "input.tick_hz",
        format!("tick_hz must be > 0, got {}", input.tick_hz),
    )?;
    ensure(
        input.heartbeat_every_s >= 0,
        "input.heartbeat_every_s",
        "heartbeat_every_s must be >= 0",
    )?;
    ensure(input.max_ticks >= 0, "input.max_ticks", "max_ticks must be >= 0")?;
    ensure(
        input.max_run_s >= 0.0 && input.max_run_s.is_finite(),
        "input.max_run_s",
        "max_run_s must be >= 0",
    )?;

    let synth = &input.synth;
    ensure(
        synth.num_points > 0,
        "input.synth.num_points",
        format!("num_points must be > 0, got {}", synth.num_points),
    )?;
    ensure(
        synth.baseline_s >= 0.0 && synth.baseline_s.is_finite(),
        "input.synth.baseline_s",
        "baseline_s must be >= 0",
    )?;
    ensure(
        synth.obstacle_start_s >= 0.0 && synth.obstacle_start_s.is_finite(),
        "input.synth.obstacle_start_s",
        "obstacle_start_s must be >= 0",
    )?;
    ensure(
        synth.obstacle_speed_mps.is_finite(),
        "input.synth.obstacle_speed_mps",
        "obstacle_speed_mps must be finite",
    )?;

    let frame_dir = &input.frame_dir;
    if input.kind == InputKind::FrameDir {
        ensure(
            !frame_dir.path.as_os_str().is_empty(),
            "input.frame_dir.path",
            "frame_dir.path is required when input.type = \"frame_dir\"",
        )?;
    }
    ensure(
        frame_dir.fps >= 0.0 && frame_dir.fps.is_finite(),
        "input.frame_dir.fps",
        "fps must be >= 0",
    )
}

fn validate_output(cfg: &NodeConfig) -> Result<(), ContractError> {
    let output = &cfg.output;
    ensure(
        !output.out_dir.as_os_str().is_empty(),
        "output.out_dir",
        "out_dir cannot be empty",
    )?;
    ensure(
        output.heartbeat_period_s >= 0,
        "output.heartbeat_period_s",
        "heartbeat_period_s must be >= 0",
    )?;
    ensure(
        output.frame_stats_every > 0,
        "output.frame_stats_every",
        "frame_stats_every must be > 0",
    )?;
    ensure(
        output.keep_last_runs > 0,
        "output.keep_last_runs",
        "keep_last_runs must be > 0",
    )
}
