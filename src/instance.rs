//! Instance parsing and validation.
//!
//! `Instance` is the input contract the planning core consumes: a
//! capacity, a dense crate demand matrix, and each plane's starting city.
//! This module owns the one on-disk textual format the surrounding CLI
//! reads and writes; the planning core itself never touches a file.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A planning problem: crate demand between cities, plus where each plane
/// starts.
///
/// Textual format read by [`Instance::from_reader`]:
///
/// ```text
/// CAPACITY <n>
/// CITIES <n>
/// PLANES <n>
/// CRATES
/// <n_cities lines of n_cities space-separated non-negative integers>
/// PLANE_START
/// <n_planes space-separated city indices>
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub capacity: u64,
    pub n_cities: usize,
    /// `crates[i][j]` = crates demanded from city `i` to city `j`.
    pub crates: Vec<Vec<u64>>,
    pub plane_start: Vec<usize>,
}

impl Instance {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PlanError> {
        let reader = BufReader::new(reader);

        let mut capacity: Option<u64> = None;
        let mut n_cities: Option<usize> = None;
        let mut n_planes: Option<usize> = None;
        let mut crates: Vec<Vec<u64>> = Vec::new();
        let mut plane_start: Vec<usize> = Vec::new();

        let mut section = String::new();
        let mut crate_rows_read = 0usize;

        for line in reader.lines() {
            let line = line.map_err(PlanError::Io)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("CAPACITY") {
                capacity = Some(
                    rest.trim()
                        .parse()
                        .map_err(|_| PlanError::Parse(format!("invalid CAPACITY: {}", rest)))?,
                );
                continue;
            }
            if let Some(rest) = line.strip_prefix("CITIES") {
                n_cities = Some(
                    rest.trim()
                        .parse()
                        .map_err(|_| PlanError::Parse(format!("invalid CITIES: {}", rest)))?,
                );
                continue;
            }
            if let Some(rest) = line.strip_prefix("PLANES") {
                n_planes = Some(
                    rest.trim()
                        .parse()
                        .map_err(|_| PlanError::Parse(format!("invalid PLANES: {}", rest)))?,
                );
                continue;
            }
            if line == "CRATES" {
                section = "crates".to_string();
                continue;
            }
            if line == "PLANE_START" {
                section = "plane_start".to_string();
                continue;
            }

            match section.as_str() {
                "crates" => {
                    let n = n_cities.ok_or_else(|| {
                        PlanError::Parse("CRATES section before CITIES".to_string())
                    })?;
                    let this_row = crate_rows_read;
                    let row: Vec<u64> = line
                        .split_whitespace()
                        .enumerate()
                        .map(|(col, tok)| {
                            let value: i64 = tok.parse().map_err(|_| {
                                PlanError::Parse(format!("invalid crate count: {}", tok))
                            })?;
                            if value < 0 {
                                return Err(PlanError::NegativeDemand {
                                    from: this_row,
                                    to: col,
                                    amount: value,
                                });
                            }
                            Ok(value as u64)
                        })
                        .collect::<Result<_, PlanError>>()?;
                    if row.len() != n {
                        return Err(PlanError::Parse(format!(
                            "crate row has {} entries, expected {}",
                            row.len(),
                            n
                        )));
                    }
                    crates.push(row);
                    crate_rows_read += 1;
                }
                "plane_start" => {
                    let n = n_planes.ok_or_else(|| {
                        PlanError::Parse("PLANE_START section before PLANES".to_string())
                    })?;
                    plane_start = line
                        .split_whitespace()
                        .map(|tok| {
                            tok.parse()
                                .map_err(|_| PlanError::Parse(format!("invalid city index: {}", tok)))
                        })
                        .collect::<Result<_, _>>()?;
                    if plane_start.len() != n {
                        return Err(PlanError::Parse(format!(
                            "PLANE_START has {} entries, expected {}",
                            plane_start.len(),
                            n
                        )));
                    }
                }
                _ => {}
            }
        }

        let capacity = capacity.ok_or_else(|| PlanError::Parse("missing CAPACITY".to_string()))?;
        let n_cities = n_cities.ok_or_else(|| PlanError::Parse("missing CITIES".to_string()))?;
        if crate_rows_read != n_cities {
            return Err(PlanError::Parse(format!(
                "expected {} CRATES rows, got {}",
                n_cities, crate_rows_read
            )));
        }

        let instance = Instance {
            capacity,
            n_cities,
            crates,
            plane_start,
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Checks the malformed-input taxonomy. Called before a
    /// [`crate::demand::DemandModel`] is ever built, so the planning core
    /// never has to reason about invalid input.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.capacity == 0 {
            return Err(PlanError::NonPositiveCapacity(0));
        }
        if self.crates.len() != self.n_cities {
            return Err(PlanError::Parse(format!(
                "crate matrix has {} rows, expected {}",
                self.crates.len(),
                self.n_cities
            )));
        }
        for (i, row) in self.crates.iter().enumerate() {
            if row.len() != self.n_cities {
                return Err(PlanError::Parse(format!(
                    "crate row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    self.n_cities
                )));
            }
            if row[i] != 0 {
                return Err(PlanError::NonZeroDiagonal { city: i });
            }
        }
        for (plane, &start) in self.plane_start.iter().enumerate() {
            if start >= self.n_cities {
                return Err(PlanError::PlaneOutOfRange {
                    plane,
                    city: start,
                    n_cities: self.n_cities,
                });
            }
        }
        let total_demand: u64 = self.crates.iter().flatten().sum();
        if total_demand > 0 && self.plane_start.is_empty() {
            return Err(PlanError::NoPlanesWithDemand);
        }
        Ok(())
    }

    /// Trivial lower bound on the number of edges any plan must use: the
    /// larger of the per-origin and per-destination bin-packing bounds.
    pub fn min_flights(&self) -> u64 {
        let cap = self.capacity;
        let mut min_takeoffs = 0u64;
        for i in 0..self.n_cities {
            let out: u64 = self.crates[i].iter().sum();
            min_takeoffs += (out + cap - 1) / cap.max(1);
        }
        let mut min_landings = 0u64;
        for j in 0..self.n_cities {
            let inbound: u64 = (0..self.n_cities).map(|i| self.crates[i][j]).sum();
            min_landings += (inbound + cap - 1) / cap.max(1);
        }
        min_takeoffs.max(min_landings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_instance(s: &str) -> Result<Instance, PlanError> {
        Instance::from_reader(std::io::Cursor::new(s.to_string()))
    }

    #[test]
    fn parses_well_formed_instance() {
        let inst = text_instance(
            "CAPACITY 30\nCITIES 2\nPLANES 1\nCRATES\n0 15\n0 0\nPLANE_START\n0\n",
        )
        .unwrap();
        assert_eq!(inst.capacity, 30);
        assert_eq!(inst.crates, vec![vec![0, 15], vec![0, 0]]);
        assert_eq!(inst.plane_start, vec![0]);
    }

    #[test]
    fn rejects_nonzero_diagonal() {
        let err = text_instance(
            "CAPACITY 30\nCITIES 2\nPLANES 1\nCRATES\n1 15\n0 0\nPLANE_START\n0\n",
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::NonZeroDiagonal { city: 0 }));
    }

    #[test]
    fn rejects_negative_demand() {
        let err = text_instance(
            "CAPACITY 30\nCITIES 2\nPLANES 1\nCRATES\n0 -5\n0 0\nPLANE_START\n0\n",
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::NegativeDemand { from: 0, to: 1, amount: -5 }));
    }

    #[test]
    fn rejects_plane_out_of_range() {
        let err = text_instance(
            "CAPACITY 30\nCITIES 2\nPLANES 1\nCRATES\n0 15\n0 0\nPLANE_START\n5\n",
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::PlaneOutOfRange { .. }));
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = text_instance(
            "CAPACITY 0\nCITIES 2\nPLANES 1\nCRATES\n0 15\n0 0\nPLANE_START\n0\n",
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::NonPositiveCapacity(0)));
    }

    #[test]
    fn rejects_demand_with_no_planes() {
        let err = text_instance("CAPACITY 30\nCITIES 2\nPLANES 0\nCRATES\n0 15\n0 0\nPLANE_START\n")
            .unwrap_err();
        assert!(matches!(err, PlanError::NoPlanesWithDemand));
    }

    #[test]
    fn min_flights_matches_bin_packing_bound() {
        let inst = text_instance(
            "CAPACITY 30\nCITIES 2\nPLANES 1\nCRATES\n0 65\n0 0\nPLANE_START\n0\n",
        )
        .unwrap();
        assert_eq!(inst.min_flights(), 3);
    }
}
