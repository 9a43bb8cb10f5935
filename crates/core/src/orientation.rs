//! 方向搜索
//!
//! 证件可能以任意 90° 倍数方向扫描。依次在四个方向上提取候选，
//! 每个方向找到号码就立即遮盖，再逆时针转 90° 进入下一个方向。
//! 四次旋转后图像回到原方向。

use std::collections::BTreeSet;
use std::time::Instant;

use uid_render::{correct_skew, rotate_quarter_ccw, ContrastMode, PageImage, SkewOptions};
use uid_rules::{CandidateSet, Identifier};

use crate::extract::CandidateExtractor;
use crate::redact::RedactionEngine;

/// 当前工作图像相对原图逆时针旋转的角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quarter {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Quarter {
    /// 下一个方向，`Deg270` 之后结束
    pub fn next(self) -> Option<Quarter> {
        match self {
            Quarter::Deg0 => Some(Quarter::Deg90),
            Quarter::Deg90 => Some(Quarter::Deg180),
            Quarter::Deg180 => Some(Quarter::Deg270),
            Quarter::Deg270 => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Quarter::Deg0 => 0,
            Quarter::Deg90 => 90,
            Quarter::Deg180 => 180,
            Quarter::Deg270 => 270,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrientationResult {
    /// 遮盖后的图像，方向与输入一致
    pub image: PageImage,
    /// 所有方向、所有对比度模式的原始候选
    pub candidates: CandidateSet,
    /// 通过校验的号码
    pub identifiers: BTreeSet<Identifier>,
    /// 第一次找到号码的方向
    pub first_found: Option<Quarter>,
    /// 遮盖区域总数
    pub masked_regions: usize,
}

impl OrientationResult {
    pub fn found(&self) -> bool {
        !self.identifiers.is_empty()
    }
}

pub struct OrientationNormalizer {
    extractor: CandidateExtractor,
    redactor: RedactionEngine,
    skew: Option<SkewOptions>,
    strict_checksum: bool,
}

impl OrientationNormalizer {
    pub fn new(
        extractor: CandidateExtractor,
        redactor: RedactionEngine,
        skew: Option<SkewOptions>,
        strict_checksum: bool,
    ) -> Self {
        Self {
            extractor,
            redactor,
            skew,
            strict_checksum,
        }
    }

    pub fn redactor(&self) -> &RedactionEngine {
        &self.redactor
    }

    fn to_identifier(&self, candidate: &str) -> Option<Identifier> {
        if self.strict_checksum {
            Identifier::parse(candidate)
        } else {
            Identifier::parse_lenient(candidate)
        }
    }

    pub fn find_and_mask(&self, image: PageImage) -> OrientationResult {
        let start = Instant::now();

        // 只在第一个方向之前校正一次
        let mut working = match &self.skew {
            Some(options) => correct_skew(&image, options).unwrap_or(image),
            None => image,
        };

        let mut candidates = CandidateSet::new();
        let mut identifiers = BTreeSet::new();
        let mut first_found = None;
        let mut masked_regions = 0;

        let mut state = Some(Quarter::Deg0);
        while let Some(quarter) = state {
            let mut fresh = CandidateSet::new();
            for mode in ContrastMode::ALL {
                fresh.extend_from(&self.extractor.extract_candidates(&working, mode));
            }
            candidates.extend_from(&fresh);

            let found: Vec<Identifier> = fresh.iter().filter_map(|c| self.to_identifier(c)).collect();
            log::info!(
                "[Orientation] {}°: 候选 {} 个，有效号码 {} 个",
                quarter.degrees(),
                fresh.len(),
                found.len()
            );

            if !found.is_empty() {
                first_found.get_or_insert(quarter);
                masked_regions += self.redactor.mask(&mut working, &found);
                identifiers.extend(found);
            }

            working = rotate_quarter_ccw(&working);
            state = quarter.next();
        }

        log::info!(
            "[Orientation] 方向搜索完成，号码 {} 个，耗时: {} ms",
            identifiers.len(),
            start.elapsed().as_millis()
        );

        OrientationResult {
            image: working,
            candidates,
            identifiers,
            first_found,
            masked_regions,
        }
    }
}
