//! Region merging.
//!
//! Rebuilds a file from its untouched spans and freshly synthesized region
//! interiors in one pass over the regions.

use std::collections::BTreeMap;

use crate::domain::marker::{MarkerRegion, Segment, segments};

/// Result of merging synthesized content into a scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    /// Regions re-positioned against `text`.
    pub regions: Vec<MarkerRegion>,
    /// `false` when every rendered interior equals the one already on disk.
    pub changed: bool,
    /// Ids of regions whose interior was replaced with different text.
    pub rewritten: Vec<String>,
}

/// Merge `content` (keyed by region id) into `text`.
///
/// `regions` must come from scanning `text`: ordered, non-overlapping and with
/// unique ids. Regions without an entry in `content` are copied unchanged.
pub fn merge(
    text: &str,
    regions: &[MarkerRegion],
    content: &BTreeMap<String, String>,
) -> MergeOutcome {
    let mut out = String::with_capacity(text.len());
    let mut merged_regions = Vec::with_capacity(regions.len());
    let mut rewritten = Vec::new();

    for segment in segments(text, regions) {
        match segment {
            Segment::Untouched(span) => out.push_str(span),
            Segment::Region(region) => {
                let interior = match content.get(&region.id) {
                    Some(synthesized) => region.layout.render(synthesized),
                    None => region.raw_content.clone(),
                };
                if interior != region.raw_content {
                    rewritten.push(region.id.clone());
                }

                let start_offset = out.len();
                out.push_str(&interior);
                merged_regions.push(MarkerRegion {
                    start_offset,
                    end_offset: out.len(),
                    raw_content: interior,
                    ..region.clone()
                });
            }
        }
    }

    MergeOutcome {
        changed: !rewritten.is_empty(),
        text: out,
        regions: merged_regions,
        rewritten,
    }
}
