//! 运行循环指标
//!
//! 计数器经由 `metrics` facade 记录，未安装 recorder 时为空操作。
//! `RunningStats` 在内存中聚合，用于运行结束时的摘要。

use metrics::{counter, gauge, histogram};

/// 记录一次 tick 完成
pub fn record_tick(tick: u64) {
    counter!("wm_node_ticks_total").increment(1);
    gauge!("wm_node_last_tick").set(tick as f64);
}

/// 记录从数据源取到的一帧
pub fn record_frame(num_points: usize) {
    counter!("wm_node_frames_total").increment(1);
    counter!("wm_node_points_total").increment(num_points as u64);
    gauge!("wm_node_frame_points").set(num_points as f64);
}

/// 记录交给 sink 的事件
pub fn record_event_emitted(kind: &str) {
    counter!("wm_node_events_emitted_total", "type" => kind.to_string()).increment(1);
}

pub fn record_heartbeat() {
    counter!("wm_node_heartbeats_total").increment(1);
}

/// 记录数据源到达末尾后的回绕
pub fn record_input_loop() {
    counter!("wm_node_input_loops_total").increment(1);
}

/// 记录 tick 工作超出周期
pub fn record_tick_overrun() {
    counter!("wm_node_tick_overruns_total").increment(1);
}

pub fn record_tick_work_ms(ms: f64) {
    histogram!("wm_node_tick_work_ms").record(ms);
}

/// `RunningStats` 的统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线均值/方差统计 (Welford 算法)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
