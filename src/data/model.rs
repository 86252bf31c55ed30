//! Dataset Model Module
//! Schools, clusters and the root dataset as read from the JSON document.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Opaque year label (e.g. "FY26"), ordered by the dataset sequence.
pub type Year = String;

/// Geographic position of a school.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

/// A single school with its fixed capacity and sparse per-year enrollment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub enrollment: BTreeMap<Year, u32>,
    #[serde(default, alias = "coordinates")]
    pub location: Option<Coordinates>,
    /// Grade band used to group schools in the chart legend
    #[serde(default)]
    pub level: Option<String>,
}

impl School {
    /// Enrollment for `year`, if the school reported a non-zero count.
    ///
    /// A recorded zero is treated the same as a missing entry.
    pub fn enrollment_for(&self, year: &str) -> Option<u32> {
        self.enrollment.get(year).copied().filter(|&e| e > 0)
    }

    pub fn capacity_or_zero(&self) -> u64 {
        u64::from(self.capacity.unwrap_or(0))
    }
}

/// Named grouping of schools used for mid-level aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub schools: Vec<String>,
}

#[derive(Deserialize)]
struct ClusterBody {
    name: String,
    #[serde(default, alias = "schoolIds")]
    schools: Vec<String>,
}

/// Root aggregate of the enrollment document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub years: Vec<Year>,
    #[serde(default)]
    pub schools: Vec<School>,
    #[serde(default, deserialize_with = "ordered_clusters")]
    pub clusters: Vec<Cluster>,
    /// Ring of `[lng, lat]` pairs, passed through to the map unchanged
    #[serde(default, rename = "cityBoundary", alias = "districtBoundary")]
    pub district_boundary: Option<Vec<[f64; 2]>>,
}

impl Dataset {
    /// Parse a dataset from JSON bytes and log any inconsistencies.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let dataset: Dataset = serde_json::from_slice(bytes)?;
        for warning in dataset.validate() {
            log::warn!("{}", warning);
        }
        Ok(dataset)
    }

    /// Non-fatal problems with the loaded document.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut ids = HashSet::new();

        for school in &self.schools {
            if !ids.insert(school.id.as_str()) {
                warnings.push(format!("Duplicate school id '{}'", school.id));
            }
            for year in school.enrollment.keys() {
                if !self.years.contains(year) {
                    warnings.push(format!(
                        "School '{}' has enrollment for undeclared year '{}'",
                        school.id, year
                    ));
                }
            }
        }

        for cluster in &self.clusters {
            let mut members = HashSet::new();
            for member in &cluster.schools {
                if !members.insert(member.as_str()) {
                    warnings.push(format!(
                        "Cluster '{}' lists school '{}' more than once",
                        cluster.id, member
                    ));
                    continue;
                }
                if !ids.contains(member.as_str()) {
                    warnings.push(format!(
                        "Cluster '{}' references unknown school '{}'",
                        cluster.id, member
                    ));
                }
            }
        }

        warnings
    }

    pub fn school(&self, id: &str) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }

    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Member schools of a cluster that exist in the dataset, each once.
    pub fn cluster_members<'a>(&'a self, cluster: &'a Cluster) -> impl Iterator<Item = &'a School> {
        let mut seen = HashSet::new();
        cluster
            .schools
            .iter()
            .filter(move |&id| seen.insert(id.as_str()))
            .filter_map(|id| self.school(id))
    }
}

/// Deserialize the `clusters` object keeping document order.
fn ordered_clusters<'de, D>(deserializer: D) -> Result<Vec<Cluster>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ClustersVisitor;

    impl<'de> Visitor<'de> for ClustersVisitor {
        type Value = Vec<Cluster>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of cluster id to cluster")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut clusters = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, body)) = map.next_entry::<String, ClusterBody>()? {
                clusters.push(Cluster {
                    id,
                    name: body.name,
                    schools: body.schools,
                });
            }
            Ok(clusters)
        }
    }

    deserializer.deserialize_map(ClustersVisitor)
}
