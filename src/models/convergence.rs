//! # 收敛数据模型
//!
//! ONETEP 输出文件中提取的最终能量与几何优化迭代记录。
//!
//! ## 依赖关系
//! - 被 `parsers/onetep_out.rs` 构造
//! - 被 `commands/enerconv.rs`, `commands/geomconv.rs` 使用

/// 最终能量提取结果
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyReport {
    /// 计算完成，`text` 为输出文件中的原始数字
    Finished { value: f64, text: String },
    /// 计算完成但没有找到能量行
    NoEnergy,
    /// 缺少 `Job completed` 标记
    NotFinished,
}

impl EnergyReport {
    pub fn value(&self) -> Option<f64> {
        match self {
            EnergyReport::Finished { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// 单个收敛判据（dE/ion, |F|max, |dR|max …）
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub name: String,
    pub value: f64,
    pub tolerance: f64,
    pub units: String,
    pub converged: bool,
}

/// 一次几何优化迭代
#[derive(Debug, Clone, PartialEq)]
pub struct GeomIteration {
    pub iteration: usize,
    /// 焓 (Eh)
    pub enthalpy: f64,
    pub criteria: Vec<Criterion>,
}

impl GeomIteration {
    pub fn new(iteration: usize, enthalpy: f64) -> Self {
        GeomIteration {
            iteration,
            enthalpy,
            criteria: Vec::new(),
        }
    }

    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    /// 所有判据均已收敛
    pub fn is_converged(&self) -> bool {
        !self.criteria.is_empty() && self.criteria.iter().all(|c| c.converged)
    }
}

/// 一个输出文件中的几何优化记录
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomSeries {
    pub iterations: Vec<GeomIteration>,
    /// 含有 `Job completed` 标记
    pub finished: bool,
}

impl GeomSeries {
    /// 最后一次迭代的所有判据均已收敛
    pub fn is_converged(&self) -> bool {
        self.iterations.last().is_some_and(GeomIteration::is_converged)
    }
}
