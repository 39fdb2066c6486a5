//! 合成帧数据源
//!
//! 确定性、无限输出：带种子的地面点云，加上可选的立方体障碍物。
//! 逻辑时间同时超过 baseline 窗口和障碍物出现时间后，障碍物才出现。

use contracts::{
    hz_to_period_ns, seconds_to_ns, ContractError, DurationNs, Frame, FrameSource, InputConfig,
    PointXyzi, TimestampNs, Vec3f,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// 正方形地面的半边长 (米)
const FLOOR_HALF_EXTENT_M: f32 = 8.0;

const OBSTACLE_CENTER: Vec3f = Vec3f::new(2.0, 0.0, 0.5);
const OBSTACLE_SIZE: Vec3f = Vec3f::new(1.0, 1.0, 1.0);
/// 每条面边的采样数；6 个面，每面 `n * n` 个点
const OBSTACLE_GRID_N: usize = 10;

/// 合成数据源配置
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSourceConfig {
    pub tick_hz: f64,
    pub seed: u32,
    pub num_points: i32,
    pub enable_obstacle: bool,
    pub baseline_s: f64,
    pub obstacle_start_s: f64,
    pub moving_obstacle: bool,
    pub obstacle_speed_mps: f32,
}

impl Default for SynthSourceConfig {
    fn default() -> Self {
        Self::from_input(&InputConfig::default())
    }
}

impl SynthSourceConfig {
    pub fn from_input(input: &InputConfig) -> Self {
        let synth = &input.synth;
        Self {
            tick_hz: input.tick_hz,
            seed: synth.seed,
            num_points: synth.num_points,
            enable_obstacle: synth.enable_obstacle,
            baseline_s: synth.baseline_s,
            obstacle_start_s: synth.obstacle_start_s,
            moving_obstacle: synth.moving_obstacle,
            obstacle_speed_mps: synth.obstacle_speed_mps,
        }
    }
}

/// 合成帧数据源
pub struct SynthFrameSource {
    config: SynthSourceConfig,
    period_ns: DurationNs,
    baseline_ns: DurationNs,
    obstacle_start_ns: DurationNs,
    floor: Vec<PointXyzi>,
    tick: i64,
    opened: bool,
}

impl SynthFrameSource {
    pub fn new(config: SynthSourceConfig) -> Self {
        Self {
            period_ns: hz_to_period_ns(config.tick_hz),
            baseline_ns: seconds_to_ns(config.baseline_s),
            obstacle_start_ns: seconds_to_ns(config.obstacle_start_s),
            config,
            floor: Vec::new(),
            tick: 0,
            opened: false,
        }
    }

    pub fn config(&self) -> &SynthSourceConfig {
        &self.config
    }

    /// Whether the obstacle is part of the frame at logical time `t_ns`
    pub fn obstacle_visible_at(&self, t_ns: i64) -> bool {
        self.config.enable_obstacle && t_ns >= self.baseline_ns && t_ns >= self.obstacle_start_ns
    }

    fn obstacle_center_at(&self, t_ns: i64) -> Vec3f {
        let mut center = OBSTACLE_CENTER;
        if self.config.moving_obstacle {
            let dt_s = (t_ns - self.obstacle_start_ns).max(0) as f64 / 1e9;
            center.x += (f64::from(self.config.obstacle_speed_mps) * dt_s) as f32;
        }
        center
    }
}

/// 带种子的地面：`ceil(sqrt(n))` 网格上的 `n` 个点，每格随机抖动
fn build_floor(num_points: usize, seed: u32) -> Vec<PointXyzi> {
    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    let grid = (num_points as f64).sqrt().ceil().max(1.0) as usize;
    let cell = 2.0 * FLOOR_HALF_EXTENT_M / grid as f32;

    (0..num_points)
        .map(|i| {
            let (row, col) = (i / grid, i % grid);
            let jx: f32 = rng.random_range(-0.25..0.25);
            let jy: f32 = rng.random_range(-0.25..0.25);
            let intensity: f32 = rng.random_range(0.1..0.3);
            PointXyzi::new(
                -FLOOR_HALF_EXTENT_M + (col as f32 + 0.5 + jx) * cell,
                -FLOOR_HALF_EXTENT_M + (row as f32 + 0.5 + jy) * cell,
                0.0,
                intensity,
            )
        })
        .collect()
}

/// 空心立方体，在六个面上采样
fn append_box_surface(points: &mut Vec<PointXyzi>, center: Vec3f, size: Vec3f, grid_n: usize) {
    let n = grid_n.max(2);
    let (x0, x1) = (center.x - 0.5 * size.x, center.x + 0.5 * size.x);
    let (y0, y1) = (center.y - 0.5 * size.y, center.y + 0.5 * size.y);
    let (z0, z1) = (center.z - 0.5 * size.z, center.z + 0.5 * size.z);
    let lerp = |a: f32, b: f32, t: f32| a + t * (b - a);

    points.reserve(6 * n * n);
    for i in 0..n {
        let u = i as f32 / (n - 1) as f32;
        let x = lerp(x0, x1, u);
        let y = lerp(y0, y1, u);
        for j in 0..n {
            let v = j as f32 / (n - 1) as f32;
            let xx = lerp(x0, x1, v);
            let yy = lerp(y0, y1, v);
            let z = lerp(z0, z1, v);

            points.push(PointXyzi::new(xx, y, z0, 1.0));
            points.push(PointXyzi::new(xx, y, z1, 1.0));
            points.push(PointXyzi::new(x0, yy, lerp(z0, z1, u), 1.0));
            points.push(PointXyzi::new(x1, yy, lerp(z0, z1, u), 1.0));
            points.push(PointXyzi::new(x, y0, z, 1.0));
            points.push(PointXyzi::new(x, y1, z, 1.0));
        }
    }
}

impl FrameSource for SynthFrameSource {
    fn name(&self) -> &str {
        "synth"
    }

    fn open(&mut self) -> Result<(), ContractError> {
        let num_points = usize::try_from(self.config.num_points)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ContractError::invalid_argument(format!(
                    "synth num_points must be > 0, got {}",
                    self.config.num_points
                ))
            })?;

        self.floor = build_floor(num_points, self.config.seed);
        self.tick = 0;
        self.opened = true;

        debug!(
            seed = self.config.seed,
            num_points,
            period_ns = self.period_ns,
            obstacle = self.config.enable_obstacle,
            "synth source opened"
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        if !self.opened {
            return Err(ContractError::invalid_argument("synth source is not open"));
        }

        let t_ns = self.tick.saturating_mul(self.period_ns);
        let mut points = self.floor.clone();
        if self.obstacle_visible_at(t_ns) {
            let center = self.obstacle_center_at(t_ns);
            append_box_surface(&mut points, center, OBSTACLE_SIZE, OBSTACLE_GRID_N);
        }

        let frame = Frame::new(
            TimestampNs::from_nanos(t_ns),
            format!("synth_{}", self.tick),
            points,
        );
        self.tick += 1;
        Ok(Some(frame))
    }

    fn reset(&mut self) -> Result<(), ContractError> {
        self.tick = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.floor = Vec::new();
        self.tick = 0;
    }
}
