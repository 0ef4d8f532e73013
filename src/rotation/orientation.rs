//! Orientation labels, edge rules, and the tilt classifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::accelerometer::Sample;
use crate::consts::GRAVITY_RANGE;

/// The four screen orientations xrandr can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Normal,
    Inverted,
    Left,
    Right,
}

impl Orientation {
    /// All orientations, in the order their edge rules are evaluated.
    pub const ALL: [Orientation; 4] = [
        Orientation::Normal,
        Orientation::Inverted,
        Orientation::Left,
        Orientation::Right,
    ];

    /// The `xrandr -o` argument for this orientation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Normal => "normal",
            Orientation::Inverted => "inverted",
            Orientation::Left => "left",
            Orientation::Right => "right",
        }
    }

    /// Row-major 3x3 coordinate transformation matrix handed to xinput for
    /// touch devices tracking this orientation.
    pub fn transform_matrix(&self) -> [i32; 9] {
        match self {
            Orientation::Normal => [1, 0, 0, 0, 1, 0, 0, 0, 1],
            Orientation::Inverted => [-1, 0, 1, 0, -1, 1, 0, 0, 1],
            Orientation::Left => [0, -1, 1, 1, 0, 0, 0, 0, 1],
            Orientation::Right => [0, 1, 0, -1, 0, 1, 0, 0, 1],
        }
    }

    /// The edge rule whose range is evidence for this orientation at the
    /// given tilt threshold.
    ///
    /// Normal and Inverted read the y axis, Left and Right the x axis; each
    /// range runs from the threshold out to the gravity bound, so for any
    /// positive threshold the two rules on one axis never overlap.
    pub fn edge(&self, threshold: f64) -> Edge {
        match self {
            Orientation::Normal => Edge {
                axis: Axis::Y,
                min: -GRAVITY_RANGE,
                max: -threshold,
            },
            Orientation::Inverted => Edge {
                axis: Axis::Y,
                min: threshold,
                max: GRAVITY_RANGE,
            },
            Orientation::Left => Edge {
                axis: Axis::X,
                min: threshold,
                max: GRAVITY_RANGE,
            },
            Orientation::Right => Edge {
                axis: Axis::X,
                min: -GRAVITY_RANGE,
                max: -threshold,
            },
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Orientation::Normal),
            "inverted" => Ok(Orientation::Inverted),
            "left" => Ok(Orientation::Left),
            "right" => Ok(Orientation::Right),
            other => Err(format!("unknown orientation: {other}")),
        }
    }
}

/// Which sample component an edge rule examines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Half-open interval `[min, max)` on one axis. A sample whose component
/// falls inside is evidence for the rule's target orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub axis: Axis,
    pub min: f64,
    pub max: f64,
}

impl Edge {
    /// Whether the sample's relevant component lies in `[min, max)`.
    pub fn contains(&self, sample: Sample) -> bool {
        let v = match self.axis {
            Axis::X => sample.x,
            Axis::Y => sample.y,
        };
        v >= self.min && v < self.max
    }
}

/// Map a sample to the orientation it is evidence for.
///
/// Every orientation other than `current` is tested against its edge rule;
/// the current orientation is skipped so a reading cannot re-confirm itself.
/// Rules are evaluated in the fixed order Normal, Inverted, Left, Right and
/// the first hit wins. With no hit the sample carries no evidence of change
/// and `current` is returned.
pub fn classify(sample: Sample, current: Orientation, threshold: f64) -> Orientation {
    for orientation in Orientation::ALL {
        if orientation == current {
            continue;
        }
        if orientation.edge(threshold).contains(sample) {
            return orientation;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 7.0;

    fn sample(x: f64, y: f64) -> Sample {
        Sample { x, y }
    }

    #[test]
    fn test_classify_each_orientation() {
        assert_eq!(
            classify(sample(0.0, -20.0), Orientation::Left, THRESHOLD),
            Orientation::Normal
        );
        assert_eq!(
            classify(sample(0.0, 9.0), Orientation::Normal, THRESHOLD),
            Orientation::Inverted
        );
        assert_eq!(
            classify(sample(9.0, 0.0), Orientation::Normal, THRESHOLD),
            Orientation::Left
        );
        assert_eq!(
            classify(sample(-9.0, 0.0), Orientation::Normal, THRESHOLD),
            Orientation::Right
        );
    }

    #[test]
    fn test_classify_returns_current_when_nothing_matches() {
        // Tilt below the threshold on both axes is no evidence of change.
        assert_eq!(
            classify(sample(3.0, -3.0), Orientation::Normal, THRESHOLD),
            Orientation::Normal
        );
        assert_eq!(
            classify(sample(0.0, 0.0), Orientation::Left, THRESHOLD),
            Orientation::Left
        );
    }

    #[test]
    fn test_classify_skips_current_orientation_edge() {
        // y = -20 matches the Normal edge, but while Normal is current that
        // edge is excluded, so the sample is no evidence of change.
        assert_eq!(
            classify(sample(0.0, -20.0), Orientation::Normal, THRESHOLD),
            Orientation::Normal
        );
        // Once another orientation is current the same sample flips back.
        assert_eq!(
            classify(sample(0.0, -20.0), Orientation::Inverted, THRESHOLD),
            Orientation::Normal
        );
    }

    #[test]
    fn test_edge_ranges_are_half_open() {
        let inverted = Orientation::Inverted.edge(THRESHOLD);
        // min is inclusive, max is exclusive.
        assert!(inverted.contains(sample(0.0, THRESHOLD)));
        assert!(!inverted.contains(sample(0.0, GRAVITY_RANGE)));

        let normal = Orientation::Normal.edge(THRESHOLD);
        assert!(normal.contains(sample(0.0, -GRAVITY_RANGE)));
        // The upper bound -threshold itself is outside the Normal range.
        assert!(!normal.contains(sample(0.0, -THRESHOLD)));
    }

    #[test]
    fn test_same_axis_edges_are_disjoint() {
        // For any positive threshold no sample component can satisfy both
        // rules on one axis.
        for t in [0.5, 7.0, 50.0] {
            let normal = Orientation::Normal.edge(t);
            let inverted = Orientation::Inverted.edge(t);
            let left = Orientation::Left.edge(t);
            let right = Orientation::Right.edge(t);

            let mut v = -GRAVITY_RANGE;
            while v < GRAVITY_RANGE {
                let s = sample(v, v);
                assert!(
                    !(normal.contains(s) && inverted.contains(s)),
                    "y = {v} matches Normal and Inverted at threshold {t}"
                );
                assert!(
                    !(left.contains(s) && right.contains(s)),
                    "x = {v} matches Left and Right at threshold {t}"
                );
                v += 0.25;
            }
        }
    }

    #[test]
    fn test_classify_tie_break_is_declaration_order() {
        // A sample tilted past the threshold on both axes satisfies one
        // edge per axis; the earlier rule in declaration order wins.
        assert_eq!(
            classify(sample(9.0, 9.0), Orientation::Normal, THRESHOLD),
            Orientation::Inverted
        );
        // With Inverted current and excluded, the x-axis Left rule is next.
        assert_eq!(
            classify(sample(9.0, 9.0), Orientation::Inverted, THRESHOLD),
            Orientation::Left
        );
    }

    #[test]
    fn test_orientation_strings_round_trip() {
        for orientation in Orientation::ALL {
            assert_eq!(
                orientation.as_str().parse::<Orientation>().unwrap(),
                orientation
            );
        }
        assert!("upside-down".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_transform_matrices() {
        assert_eq!(
            Orientation::Normal.transform_matrix(),
            [1, 0, 0, 0, 1, 0, 0, 0, 1]
        );
        assert_eq!(
            Orientation::Inverted.transform_matrix(),
            [-1, 0, 1, 0, -1, 1, 0, 0, 1]
        );
        assert_eq!(
            Orientation::Left.transform_matrix(),
            [0, -1, 1, 1, 0, 0, 0, 0, 1]
        );
        assert_eq!(
            Orientation::Right.transform_matrix(),
            [0, 1, 0, -1, 0, 1, 0, 0, 1]
        );
    }
}
