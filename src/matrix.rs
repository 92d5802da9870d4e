//! Pairwise great-circle distance table.
//!
//! Row and column indices follow the order of the waypoint slice the matrix
//! was built from, not waypoint identity. Callers keep that mapping.

use crate::geo;
use crate::waypoint::Waypoint;
use std::path::Path;

/// Dense symmetric n×n distance matrix in kilometers, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Compute the matrix over `waypoints`.
    ///
    /// Only the `i < j` half is evaluated and mirrored, so the result is
    /// exactly symmetric with a zero diagonal. Coordinates must already be
    /// validated.
    pub fn build(waypoints: &[Waypoint]) -> Self {
        let n = waypoints.len();
        let mut data = vec![0.0; n * n];

        for i in 0..n {
            for j in i + 1..n {
                let d = geo::distance(&waypoints[i], &waypoints[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        DistanceMatrix { data, size: n }
    }

    /// Build from explicit rows. Returns `None` unless the rows form a square.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Some(DistanceMatrix { data: rows.into_iter().flatten().collect(), size })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Length of the open path visiting `order` (no closing edge)
    pub fn path_length(&self, order: &[usize]) -> f64 {
        let mut length = 0.0;
        for pair in order.windows(2) {
            length += self.get(pair[0], pair[1]);
        }
        length
    }

    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in i + 1..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Copy of the matrix as nested rows
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.size.max(1)).take(self.size).map(|r| r.to_vec()).collect()
    }

    /// Write the matrix as CSV with waypoint ids as header and first column
    pub fn export_csv<P: AsRef<Path>>(&self, waypoints: &[Waypoint], path: P) -> crate::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![String::new()];
        header.extend(waypoints.iter().map(|w| w.id.clone()));
        writer.write_record(&header)?;

        for (i, w) in waypoints.iter().enumerate().take(self.size) {
            let mut record = vec![w.id.clone()];
            record.extend((0..self.size).map(|j| format!("{:.6}", self.get(i, j))));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seoul() -> Vec<Waypoint> {
        vec![
            Waypoint::new("A", "City Hall", 37.5665, 126.9780),
            Waypoint::new("B", "Seoul Station", 37.5600, 126.9700),
            Waypoint::new("C", "Gwanghwamun", 37.5700, 126.9850),
            Waypoint::new("D", "Myeongdong", 37.5636, 126.9869),
        ]
    }

    #[test]
    fn test_matrix_is_symmetric_with_zero_diagonal() {
        let waypoints = seoul();
        let m = DistanceMatrix::build(&waypoints);

        assert_eq!(m.size(), 4);
        for i in 0..4 {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..4 {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!(m.get(i, j) >= 0.0);
            }
        }
        assert!(m.is_symmetric(0.0));
        assert_eq!(m.get(0, 1), waypoints[0].distance_to(&waypoints[1]));
    }

    #[test]
    fn test_indices_follow_input_order() {
        let mut waypoints = seoul();
        let m = DistanceMatrix::build(&waypoints);
        waypoints.swap(0, 3);
        let swapped = DistanceMatrix::build(&waypoints);

        assert_eq!(m.get(0, 1), swapped.get(3, 1));
        assert_eq!(m.get(3, 2), swapped.get(0, 2));
    }

    #[test]
    fn test_path_length_is_open() {
        let m = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 5.0],
            vec![1.0, 0.0, 2.0],
            vec![5.0, 2.0, 0.0],
        ])
        .unwrap();

        assert_eq!(m.path_length(&[0, 1, 2]), 3.0);
        assert_eq!(m.path_length(&[1]), 0.0);
        assert_eq!(m.path_length(&[]), 0.0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).is_none());
        assert!(DistanceMatrix::from_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_rows_round_shape() {
        let m = DistanceMatrix::build(&seoul());
        let rows = m.rows();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert!(DistanceMatrix::build(&[]).rows().is_empty());
    }
}
