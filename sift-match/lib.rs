pub mod config;

pub use config::MatchConfig;

use std::io::{self, Write};

use rayon::prelude::*;
use sift_parse::ParsedFeature;

const TWO_PI: f32 = 2.0 * std::f32::consts::PI;

#[derive(Debug, Clone)]
pub enum MatchError {
    /// A query has no candidates to compare against
    EmptyReferenceSet,
    InvalidThreadCount(usize),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::EmptyReferenceSet => {
                write!(f, "Reference set is empty, no minimum distance exists")
            }
            MatchError::InvalidThreadCount(n) => {
                write!(f, "Invalid thread count: {} (must be >= 1)", n)
            }
        }
    }
}

impl std::error::Error for MatchError {}

pub type MatchResult<T> = Result<T, MatchError>;

/// L2 distance over the 128 descriptor components in fixed order
pub fn descriptor_distance(l: &ParsedFeature, r: &ParsedFeature) -> f32 {
    let mut sum = 0.0f32;
    for (a, b) in l.desc.iter().zip(r.desc.iter()) {
        let diff = a - b;
        sum += diff * diff;
    }
    sum.sqrt()
}

/// Planar pixel distance between two keypoint positions
pub fn pixel_distance(l: &ParsedFeature, r: &ParsedFeature) -> f32 {
    ((l.x - r.x) * (l.x - r.x) + (l.y - r.y) * (l.y - r.y)).sqrt()
}

/// Absolute difference of orientations after converting radians to
/// degrees. No wraparound normalization is applied, so the result may
/// exceed 180 degrees (legacy behavior, kept).
pub fn angle_distance_degrees(l: &ParsedFeature, r: &ParsedFeature) -> f32 {
    (l.ori / TWO_PI * 360.0 - r.ori / TWO_PI * 360.0).abs()
}

/// One query-to-reference comparison, emitted for every reference
#[derive(Debug, Clone)]
pub struct Comparison {
    pub desc_dist: f32,
    /// Whether this reference is the selected minimum for the query
    pub is_min: bool,
    pub pix_dist: f32,
    pub angle_dist: f32,
}

/// Full comparison block for one query against the reference set
#[derive(Debug, Clone)]
pub struct QueryReport {
    /// Index of the minimum-distance reference (first occurrence wins)
    pub best: usize,
    /// One entry per reference, in reference iteration order
    pub comparisons: Vec<Comparison>,
}

/// Compare one query against every reference.
///
/// The minimum is the first occurrence of the smallest descriptor
/// distance in reference order (stable argmin). An empty reference set
/// has no minimum and is reported as an error, recoverable per query.
pub fn match_one(query: &ParsedFeature, references: &[ParsedFeature]) -> MatchResult<QueryReport> {
    if references.is_empty() {
        return Err(MatchError::EmptyReferenceSet);
    }

    let distances: Vec<f32> = references
        .iter()
        .map(|r| descriptor_distance(query, r))
        .collect();

    let mut best = 0;
    for (index, &distance) in distances.iter().enumerate() {
        if distance < distances[best] {
            best = index;
        }
    }

    let comparisons = references
        .iter()
        .zip(distances.iter())
        .enumerate()
        .map(|(index, (reference, &desc_dist))| Comparison {
            desc_dist,
            is_min: index == best,
            pix_dist: pixel_distance(query, reference),
            angle_dist: angle_distance_degrees(query, reference),
        })
        .collect();

    Ok(QueryReport { best, comparisons })
}

/// Match every query in order. O(|L| * |R| * 128), deliberately
/// exhaustive; results keep query iteration order.
pub fn match_all(queries: &[ParsedFeature], references: &[ParsedFeature]) -> Vec<MatchResult<QueryReport>> {
    queries.iter().map(|q| match_one(q, references)).collect()
}

/// Parallel variant over the query set. Each query scans an immutable
/// reference snapshot and its comparisons stay in reference order;
/// collecting preserves query order regardless of scheduling.
pub fn match_all_par(queries: &[ParsedFeature], references: &[ParsedFeature]) -> Vec<MatchResult<QueryReport>> {
    queries
        .par_iter()
        .map(|q| match_one(q, references))
        .collect()
}

/// Write one comparison block in the legacy report format
pub fn write_report<W: Write>(writer: &mut W, report: &QueryReport) -> io::Result<()> {
    writeln!(writer, "==========")?;
    for comparison in &report.comparisons {
        let marker = if comparison.is_min { " MIN " } else { "     " };
        writeln!(
            writer,
            "desc dist {}{} pixdist={} angledist={}",
            comparison.desc_dist, marker, comparison.pix_dist, comparison.angle_dist
        )?;
    }
    Ok(())
}
