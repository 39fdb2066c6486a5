//! NodeConfig - Config Loader output
//!
//! Describes a complete node run: identity, coordinate frames, calibration,
//! baseline capture, mapping/budget/change parameters, replay, input and
//! output routing.
//!
//! Units policy:
//! - Distances in metres
//! - Durations in nanoseconds (`i64`) in memory, seconds in files

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{serde_seconds, seconds_to_ns, Aabb, ContractError, DurationNs, TransformSe3, Vec3f};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

impl ConfigVersion {
    /// 指纹 schema 标记使用的稳定编号
    pub fn as_u32(self) -> u32 {
        match self {
            Self::V1 => 1,
        }
    }
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Replay,
    /// 实时传感器（占位）
    Live,
}

impl RunMode {
    /// 指纹使用的稳定 id。重新编号必须同时升级 `ConfigVersion`。
    pub fn stable_id(self) -> i32 {
        match self {
            Self::Replay => 1,
            Self::Live => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replay => "replay",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replay" => Ok(Self::Replay),
            "live" => Ok(Self::Live),
            other => Err(ContractError::invalid_argument(format!(
                "unknown mode: {other}"
            ))),
        }
    }
}

/// 完整的节点配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// 配置版本
    pub version: ConfigVersion,

    pub mode: RunMode,

    /// 节点标识，例如 "node_001"
    pub node_id: String,

    pub frames: FramesConfig,
    pub calibration: CalibrationConfig,
    pub baseline: BaselineConfig,
    pub mapping: MappingConfig,
    pub budgets: BudgetsConfig,
    pub change: ChangeDetectionConfig,
    pub replay: ReplayConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            mode: RunMode::Replay,
            node_id: "node_001".to_string(),
            frames: FramesConfig::default(),
            calibration: CalibrationConfig::default(),
            baseline: BaselineConfig::default(),
            mapping: MappingConfig::default(),
            budgets: BudgetsConfig::default(),
            change: ChangeDetectionConfig::default(),
            replay: ReplayConfig::default(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// 坐标系名称
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramesConfig {
    pub lidar_frame: String,
    pub node_frame: String,
    /// 场地对齐实现前可为空
    pub site_frame: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            lidar_frame: "lidar".to_string(),
            node_frame: "node".to_string(),
            site_frame: "site".to_string(),
        }
    }
}

/// 标定配置；标定指纹只依赖这一部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    /// 标定文件路径（以后也可以是标识符）
    pub calibration_path: PathBuf,

    /// 自定义的版本字符串
    pub calibration_version: String,

    /// lidar -> node 外参。单位矩阵表示 lidar_frame == node_frame。
    #[serde(rename = "T_node_lidar", alias = "t_node_lidar")]
    pub t_node_lidar: TransformSe3,

    /// node -> site。未知时为单位矩阵。
    #[serde(rename = "T_site_node", alias = "t_site_node")]
    pub t_site_node: TransformSe3,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            calibration_path: PathBuf::new(),
            calibration_version: "dev".to_string(),
            t_node_lidar: TransformSe3::identity(),
            t_site_node: TransformSe3::identity(),
        }
    }
}

/// 基线采集
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineConfig {
    /// 冻结基线前学习“正常”状态的时长
    #[serde(rename = "capture_duration_s", with = "serde_seconds")]
    pub capture_duration_ns: DurationNs,

    /// 启动时忽略的稳定时间
    #[serde(rename = "warmup_duration_s", with = "serde_seconds")]
    pub warmup_duration_ns: DurationNs,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            capture_duration_ns: seconds_to_ns(30.0),
            warmup_duration_ns: 0,
        }
    }
}

/// node 坐标系下的感兴趣区域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoiConfig {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl RoiConfig {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            min: Vec3f::new(-10.0, -10.0, -2.0),
            max: Vec3f::new(10.0, 10.0, 5.0),
        }
    }
}

/// 建图 / 精度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// 稀疏体素分辨率
    pub voxel_size_m: f32,
    /// 每个 block 边长的体素数
    pub block_size_vox: i32,
    pub roi: RoiConfig,
    pub min_range_m: f32,
    pub max_range_m: f32,
    pub use_intensity: bool,
    pub integrate_hz: i32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            voxel_size_m: 0.02,
            block_size_vox: 8,
            roi: RoiConfig::default(),
            min_range_m: 0.2,
            max_range_m: 50.0,
            use_intensity: true,
            integrate_hz: 10,
        }
    }
}

/// 预算 / 限流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BudgetsConfig {
    /// 硬上限；超过时输入必须降采样
    pub max_points_per_sec: i64,
    pub target_fps: i32,
    pub downsample_voxel_m: f32,
}

impl Default for BudgetsConfig {
    fn default() -> Self {
        Self {
            max_points_per_sec: 2_000_000,
            target_fps: 10,
            downsample_voxel_m: 0.03,
        }
    }
}

/// 变化检测参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangeDetectionConfig {
    /// 变化持续超过该时长才发出事件
    #[serde(rename = "persistence_s", with = "serde_seconds")]
    pub persistence_ns: DurationNs,
    pub min_cluster_volume_m3: f32,
    pub min_aabb_edge_m: f32,
    /// 0..1
    pub min_confidence: f32,
    pub prefer_site_frame: bool,
}

impl Default for ChangeDetectionConfig {
    fn default() -> Self {
        Self {
            persistence_ns: seconds_to_ns(2.0),
            min_cluster_volume_m3: 0.01,
            min_aabb_edge_m: 0.10,
            min_confidence: 0.6,
            prefer_site_frame: true,
        }
    }
}

/// 回放输入（确定性）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    pub dataset_path: PathBuf,

    /// 1.0 = 实时，0 = 尽可能快
    pub time_scale: f64,

    #[serde(rename = "start_offset_s", with = "serde_seconds")]
    pub start_offset_ns: DurationNs,

    #[serde(rename = "end_offset_s", with = "serde_seconds")]
    pub end_offset_ns: DurationNs,

    #[serde(rename = "loop")]
    pub loop_playback: bool,
}

/// 输入源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Synth,
    FrameDir,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synth => "synth",
            Self::FrameDir => "frame_dir",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成数据生成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSynthConfig {
    pub seed: u32,
    pub num_points: i32,
    pub enable_obstacle: bool,
    /// 逻辑时间低于该值时不出现障碍物
    pub baseline_s: f64,
    pub obstacle_start_s: f64,
    pub moving_obstacle: bool,
    pub obstacle_speed_mps: f32,
}

impl Default for InputSynthConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            num_points: 1600,
            enable_obstacle: true,
            baseline_s: 5.0,
            obstacle_start_s: 8.0,
            moving_obstacle: false,
            obstacle_speed_mps: 0.25,
        }
    }
}

/// 基于目录的帧输入
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputFrameDirConfig {
    pub path: PathBuf,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    /// <= 0 时使用 `input.tick_hz` 生成时间戳
    pub fps: f64,
}

/// 输入节拍与数据源选择
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub tick_hz: f64,
    /// 0 disables
    pub heartbeat_every_s: i32,
    /// 0 disables
    pub max_ticks: i64,
    /// 0 disables
    pub max_run_s: f64,
    pub synth: InputSynthConfig,
    pub frame_dir: InputFrameDirConfig,
}

impl InputConfig {
    /// 生成目录时间戳所用的速率
    pub fn effective_frame_dir_fps(&self) -> f64 {
        if self.frame_dir.fps > 0.0 {
            self.frame_dir.fps
        } else {
            self.tick_hz
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            kind: InputKind::Synth,
            tick_hz: 10.0,
            heartbeat_every_s: 5,
            max_ticks: 0,
            max_run_s: 0.0,
            synth: InputSynthConfig::default(),
            frame_dir: InputFrameDirConfig::default(),
        }
    }
}

/// 输出（事件 + 日志）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// 事件日志目录
    pub out_dir: PathBuf,
    /// 为兼容旧配置保留；驱动循环使用 `input.heartbeat_every_s`
    pub heartbeat_period_s: i32,
    /// 同时维护 `events_latest.jsonl`
    pub write_latest: bool,
    /// 启动清理时保留的运行日志数
    pub keep_last_runs: u32,
    /// 每 N 帧发出一次 `frame_stats`
    pub frame_stats_every: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            heartbeat_period_s: 5,
            write_latest: true,
            keep_last_runs: 50,
            frame_stats_every: 1,
        }
    }
}
