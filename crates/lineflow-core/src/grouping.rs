//! Grouping engine
//!
//! Partitions the controllable panels into zones that are driven as one
//! light. Two modes exist:
//!
//! - **Automatic**: panels sorted by angle, cut into runs of `group_size`.
//! - **Manual**: an explicit list of index lists. Indices refer to positions
//!   in the *layout order* panel list (the order the device reports them),
//!   not to panel ids and not to the angle order.
//!
//! A non-empty manual definition always wins over automatic grouping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::layout::sort_by_angle;
use crate::panel::{Panel, PanelId};

/// Panels per automatic group when nothing else is configured.
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// A zone of panels driven as a single light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Zero-based position in the fixture's group list.
    pub index: usize,
    /// Member panel ids, in group order.
    pub panel_ids: Vec<PanelId>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.panel_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panel_ids.is_empty()
    }
}

/// Sorts by angle (stable) and cuts into consecutive chunks.
///
/// The last chunk may be shorter. A `group_size` of zero is treated as one.
pub fn group_by_position(panels: &[Panel], group_size: usize) -> Vec<Group> {
    sort_by_angle(panels)
        .chunks(group_size.max(1))
        .enumerate()
        .map(|(index, chunk)| Group {
            index,
            panel_ids: chunk.iter().map(|p| p.id).collect(),
        })
        .collect()
}

/// Maps each index list onto the layout-ordered panels.
///
/// Out-of-range indices are skipped and groups left empty are dropped;
/// surviving groups are renumbered from zero. Never fails.
pub fn group_by_indices(panels: &[Panel], index_lists: &[Vec<usize>]) -> Vec<Group> {
    index_lists
        .iter()
        .map(|indices| {
            indices
                .iter()
                .filter_map(|&i| panels.get(i).map(|p| p.id))
                .collect::<Vec<_>>()
        })
        .filter(|ids| !ids.is_empty())
        .enumerate()
        .map(|(index, panel_ids)| Group { index, panel_ids })
        .collect()
}

/// Builds the fixture's groups, preferring a non-empty manual definition.
pub fn build_groups(
    panels: &[Panel],
    manual: Option<&ManualGroups>,
    group_size: usize,
) -> Vec<Group> {
    match manual {
        Some(manual) if !manual.is_empty() => {
            let groups = group_by_indices(panels, manual.as_slice());
            tracing::debug!(
                "Built {} manual groups from {} definitions",
                groups.len(),
                manual.len()
            );
            groups
        }
        _ => group_by_position(panels, group_size),
    }
}

/// A manual group definition, written as `"0,1,2; 3,4,5"`.
///
/// Groups are separated by `;`, indices by `,`. Blank groups are ignored;
/// a blank or non-numeric index is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ManualGroups(Vec<Vec<usize>>);

impl ManualGroups {
    pub fn new(groups: Vec<Vec<usize>>) -> Self {
        Self(groups)
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for ManualGroups {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut groups = Vec::new();
        for group in s.trim().split(';') {
            let group = group.trim();
            if group.is_empty() {
                continue;
            }
            let indices = group
                .split(',')
                .map(|token| {
                    let token = token.trim();
                    token.parse::<usize>().map_err(|_| {
                        CoreError::InvalidGroupConfig(format!(
                            "'{}' is not a segment index in group '{}'",
                            token, group
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            groups.push(indices);
        }
        Ok(Self(groups))
    }
}

impl fmt::Display for ManualGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|g| {
                g.iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        f.write_str(&rendered.join("; "))
    }
}

impl TryFrom<String> for ManualGroups {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ManualGroups> for String {
    fn from(value: ManualGroups) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::ShapeType;

    fn panel(id: PanelId, angle: f64) -> Panel {
        Panel {
            id,
            x: 0.0,
            y: 0.0,
            orientation: 0.0,
            shape_type: ShapeType::LineSegment,
            angle,
        }
    }

    #[test]
    fn test_nine_panels_make_three_groups_in_angle_order() {
        // Layout order deliberately scrambled relative to angle order
        let angles = [170.0, 10.0, 330.0, 90.0, 250.0, 50.0, 210.0, 290.0, 130.0];
        let panels: Vec<Panel> = angles
            .iter()
            .enumerate()
            .map(|(i, &a)| panel(i as PanelId + 1, a))
            .collect();

        let groups = group_by_position(&panels, 3);
        assert_eq!(groups.len(), 3);
        // angle -> id: 10->2, 50->6, 90->4, 130->9, 170->1, 210->7, 250->5, 290->8, 330->3
        assert_eq!(groups[0].panel_ids, vec![2, 6, 4]);
        assert_eq!(groups[1].panel_ids, vec![9, 1, 7]);
        assert_eq!(groups[2].panel_ids, vec![5, 8, 3]);
        assert_eq!(groups[2].index, 2);
    }

    #[test]
    fn test_last_group_may_be_short() {
        let panels: Vec<Panel> = (0..7).map(|i| panel(i, i as f64)).collect();
        let sizes: Vec<usize> = group_by_position(&panels, 3).iter().map(Group::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_zero_group_size_does_not_panic() {
        let panels: Vec<Panel> = (0..2).map(|i| panel(i, 0.0)).collect();
        assert_eq!(group_by_position(&panels, 0).len(), 2);
    }

    #[test]
    fn test_manual_groups_use_layout_order() {
        let panels: Vec<Panel> = [300.0, 10.0, 200.0, 5.0, 90.0, 45.0]
            .iter()
            .enumerate()
            .map(|(i, &a)| panel(100 + i as PanelId, a))
            .collect();
        let manual: ManualGroups = "0,1,2; 3,4,5".parse().unwrap();

        let groups = group_by_indices(&panels, manual.as_slice());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].panel_ids, vec![100, 101, 102]);
        assert_eq!(groups[1].panel_ids, vec![103, 104, 105]);
    }

    #[test]
    fn test_out_of_range_indices_are_dropped() {
        let panels: Vec<Panel> = (0..3).map(|i| panel(i, 0.0)).collect();
        let groups = group_by_indices(&panels, &[vec![9, 10], vec![2, 7, 0], vec![]]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].index, 0);
        assert_eq!(groups[0].panel_ids, vec![2, 0]);
    }

    #[test]
    fn test_manual_definition_takes_precedence() {
        let panels: Vec<Panel> = (0..6).map(|i| panel(i, 60.0 - i as f64)).collect();
        let manual = ManualGroups::new(vec![vec![0, 5]]);

        let groups = build_groups(&panels, Some(&manual), 3);
        assert_eq!(groups, vec![Group { index: 0, panel_ids: vec![0, 5] }]);

        let automatic = build_groups(&panels, Some(&ManualGroups::default()), 3);
        assert_eq!(automatic.len(), 2);
        assert_eq!(automatic[0].panel_ids, vec![5, 4, 3]);
    }

    #[test]
    fn test_parse_rejects_blank_and_non_numeric_indices() {
        let err = "0,1,; abc".parse::<ManualGroups>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidGroupConfig(_)));
        assert!("abc".parse::<ManualGroups>().is_err());
        assert!("1,-2".parse::<ManualGroups>().is_err());
    }

    #[test]
    fn test_parse_skips_blank_groups_and_whitespace() {
        let manual: ManualGroups = " 0 , 1 ;; 2;  ".parse().unwrap();
        assert_eq!(manual.as_slice(), &[vec![0, 1], vec![2]]);
        assert!("   ".parse::<ManualGroups>().unwrap().is_empty());
    }

    #[test]
    fn test_display_matches_config_syntax() {
        let manual = ManualGroups::new(vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(manual.to_string(), "0,1,2; 3,4,5");
        assert_eq!(manual.to_string().parse::<ManualGroups>().unwrap(), manual);
    }
}
