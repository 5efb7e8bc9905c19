//! # Voxel model
//!
//! A model is an unordered list of colored unit cubes. Models come from the
//! provider's text output, so decoding is lenient about number formats, and
//! the structural rules the system instruction asks for (everything above
//! ground, one connected piece) are measured by [`ModelReport`] rather than
//! enforced.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashSet, VecDeque};

/// Color used by the renderer when a voxel carries none.
pub const DEFAULT_COLOR: &str = "#cccccc";

/// A unit cube at integer grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    #[serde(deserialize_with = "coordinate")]
    pub x: i32,
    #[serde(deserialize_with = "coordinate")]
    pub y: i32,
    #[serde(deserialize_with = "coordinate")]
    pub z: i32,
    #[serde(default = "default_color", deserialize_with = "color_or_default")]
    pub color: String,
}

impl Voxel {
    pub fn new(x: i32, y: i32, z: i32, color: impl Into<String>) -> Self {
        Self { x, y, z, color: color.into() }
    }

    pub fn position(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Decode a JSON value into a model, if it has the shape of one
    pub fn model_from_value(value: &serde_json::Value) -> Option<Vec<Voxel>> {
        Vec::<Voxel>::deserialize(value).ok()
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn color_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_color))
}

/// Models often come back with `1.0` instead of `1`; round floats to the grid.
fn coordinate<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    let wide = match Number::deserialize(deserializer)? {
        Number::Int(n) => n,
        Number::Float(f) if f.is_finite() => f.round() as i64,
        Number::Float(f) => {
            return Err(serde::de::Error::custom(format!("non-finite coordinate {}", f)))
        }
    };
    i32::try_from(wide)
        .map_err(|_| serde::de::Error::custom(format!("coordinate {} out of range", wide)))
}

/// Axis-aligned bounds of a model, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl Bounds {
    /// Number of cells along each axis. The full i32 span is 2^32 cells.
    pub fn size(&self) -> [u64; 3] {
        let mut size = [0u64; 3];
        for axis in 0..3 {
            size[axis] = (i64::from(self.max[axis]) - i64::from(self.min[axis]) + 1) as u64;
        }
        size
    }
}

/// Structural summary of a model.
///
/// Connectivity is face adjacency (6-neighbourhood); voxels that only touch
/// along an edge or a corner belong to different components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelReport {
    pub voxel_count: usize,
    pub bounds: Option<Bounds>,
    pub below_ground: usize,
    pub components: usize,
    pub duplicates: usize,
    pub colors: usize,
}

impl ModelReport {
    pub fn analyze(voxels: &[Voxel]) -> Self {
        let mut cells: HashSet<[i32; 3]> = HashSet::with_capacity(voxels.len());
        let mut duplicates = 0;
        let mut below_ground = 0;
        let mut colors: HashSet<String> = HashSet::new();
        let mut bounds: Option<Bounds> = None;

        for voxel in voxels {
            let pos = voxel.position();
            if !cells.insert(pos) {
                duplicates += 1;
            }
            if voxel.y < 0 {
                below_ground += 1;
            }
            colors.insert(voxel.color.to_ascii_lowercase());
            bounds = Some(match bounds {
                None => Bounds { min: pos, max: pos },
                Some(mut b) => {
                    for axis in 0..3 {
                        b.min[axis] = b.min[axis].min(pos[axis]);
                        b.max[axis] = b.max[axis].max(pos[axis]);
                    }
                    b
                }
            });
        }

        Self {
            voxel_count: voxels.len(),
            bounds,
            below_ground,
            components: count_components(&cells),
            duplicates,
            colors: colors.len(),
        }
    }

    /// No voxel sits below the ground plane
    pub fn is_grounded(&self) -> bool {
        self.below_ground == 0
    }

    /// The model is a single piece (an empty model counts as connected)
    pub fn is_connected(&self) -> bool {
        self.components <= 1
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let extent = match self.bounds {
            Some(b) => {
                let [w, h, d] = b.size();
                format!("{}x{}x{}", w, h, d)
            }
            None => "empty".to_string(),
        };
        format!(
            "{} voxels, {} extent, {} component(s), {} below ground, {} duplicate(s), {} color(s)",
            self.voxel_count, extent, self.components, self.below_ground, self.duplicates, self.colors
        )
    }
}

const NEIGHBOURS: [[i32; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

fn count_components(cells: &HashSet<[i32; 3]>) -> usize {
    let mut seen: HashSet<[i32; 3]> = HashSet::with_capacity(cells.len());
    let mut components = 0;
    let mut queue = VecDeque::new();

    for &start in cells {
        if !seen.insert(start) {
            continue;
        }
        components += 1;
        queue.push_back(start);

        while let Some([x, y, z]) = queue.pop_front() {
            for [dx, dy, dz] in NEIGHBOURS {
                // Nothing lies past the edge of the grid
                let next = match (x.checked_add(dx), y.checked_add(dy), z.checked_add(dz)) {
                    (Some(nx), Some(ny), Some(nz)) => [nx, ny, nz],
                    _ => continue,
                };
                if cells.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(w: i32, h: i32, d: i32) -> Vec<Voxel> {
        let mut voxels = Vec::new();
        for x in 0..w {
            for y in 0..h {
                for z in 0..d {
                    voxels.push(Voxel::new(x, y, z, "#ff4d4d"));
                }
            }
        }
        voxels
    }

    #[test]
    fn test_decode_lenient_coordinates() {
        let voxel: Voxel =
            serde_json::from_value(json!({"x": 1.0, "y": 2.4, "z": -3, "color": "#00ff00"}))
                .unwrap();
        assert_eq!(voxel, Voxel::new(1, 2, -3, "#00ff00"));
    }

    #[test]
    fn test_decode_defaults_color() {
        let voxel: Voxel = serde_json::from_value(json!({"x": 0, "y": 0, "z": 0})).unwrap();
        assert_eq!(voxel.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let result = serde_json::from_value::<Voxel>(json!({"x": 1e12, "y": 0, "z": 0}));
        assert!(result.is_err());

        let result = serde_json::from_value::<Voxel>(json!({"x": "one", "y": 0, "z": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_model_from_value() {
        let value = json!([{"x": 0, "y": 0, "z": 0, "color": "#fff"}]);
        assert_eq!(Voxel::model_from_value(&value).map(|m| m.len()), Some(1));

        assert!(Voxel::model_from_value(&json!({"voxels": []})).is_none());
    }

    #[test]
    fn test_report_solid_block() {
        let report = ModelReport::analyze(&block(3, 2, 3));
        assert_eq!(report.voxel_count, 18);
        assert_eq!(report.components, 1);
        assert_eq!(report.colors, 1);
        assert!(report.is_grounded());
        assert!(report.is_connected());
        assert_eq!(report.bounds.unwrap().size(), [3, 2, 3]);
    }

    #[test]
    fn test_report_diagonal_is_disconnected() {
        let voxels = vec![Voxel::new(0, 0, 0, "#000"), Voxel::new(1, 1, 0, "#000")];
        let report = ModelReport::analyze(&voxels);
        assert_eq!(report.components, 2);
        assert!(!report.is_connected());
    }

    #[test]
    fn test_report_below_ground_and_duplicates() {
        let voxels = vec![
            Voxel::new(0, -1, 0, "#ABC"),
            Voxel::new(0, 0, 0, "#abc"),
            Voxel::new(0, 0, 0, "#def"),
        ];
        let report = ModelReport::analyze(&voxels);
        assert_eq!(report.below_ground, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.colors, 2);
        assert_eq!(report.components, 1);
        assert!(!report.is_grounded());
    }

    #[test]
    fn test_decode_null_color() {
        let voxel: Voxel =
            serde_json::from_value(json!({"x": 0, "y": 0, "z": 0, "color": null})).unwrap();
        assert_eq!(voxel.color, DEFAULT_COLOR);
    }

    #[test]
    fn test_report_grid_edges_do_not_wrap() {
        let voxels = vec![
            Voxel::new(i32::MAX, 0, 0, "#000"),
            Voxel::new(i32::MIN, 0, 0, "#000"),
        ];
        let report = ModelReport::analyze(&voxels);
        assert_eq!(report.components, 2);
        assert_eq!(report.bounds.unwrap().size(), [1u64 << 32, 1, 1]);
    }

    #[test]
    fn test_report_empty_model() {
        let report = ModelReport::analyze(&[]);
        assert_eq!(report.components, 0);
        assert!(report.is_connected());
        assert!(report.bounds.is_none());
        assert!(report.summary().contains("empty"));
    }
}
