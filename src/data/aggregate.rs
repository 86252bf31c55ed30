//! Aggregation Module
//! Derived utilization queries over a loaded dataset.
//!
//! Every query is a pure function of the dataset. Schools without a
//! reported enrollment for a year drop out of that year's sums entirely.

use crate::data::model::{Coordinates, Dataset, School};
use crate::stats::{utilization, Aggregate, YearUtilization};
use geo::{Centroid, MultiPoint, Point};

/// Entity whose utilization history can be charted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    District,
    Cluster(String),
    School(String),
}

/// A school paired with its enrollment for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolEnrollment {
    pub school: School,
    pub enrollment: u32,
}

impl SchoolEnrollment {
    pub fn utilization(&self) -> Option<u32> {
        utilization(
            u64::from(self.enrollment),
            self.school.capacity.map(u64::from),
        )
    }
}

impl Dataset {
    /// Schools reporting an enrollment for `year`, in dataset order.
    pub fn schools_for_year(&self, year: &str) -> Vec<SchoolEnrollment> {
        self.schools
            .iter()
            .filter_map(|school| {
                school.enrollment_for(year).map(|enrollment| SchoolEnrollment {
                    school: school.clone(),
                    enrollment,
                })
            })
            .collect()
    }

    /// District-wide totals for `year`.
    pub fn aggregate(&self, year: &str) -> Aggregate {
        sum_reporting(self.schools.iter(), year)
    }

    /// Totals for the reporting members of a cluster, `None` for unknown ids.
    ///
    /// Utilization is undefined when no member reports an enrollment.
    pub fn cluster_aggregate(&self, cluster_id: &str, year: &str) -> Option<Aggregate> {
        let cluster = self.cluster(cluster_id)?;
        let mut aggregate = sum_reporting(self.cluster_members(cluster), year);
        if aggregate.total_enrollment == 0 {
            aggregate.utilization = None;
        }
        Some(aggregate)
    }

    /// Mean location of the cluster members reporting for `year`.
    pub fn cluster_centroid(&self, cluster_id: &str, year: &str) -> Option<Coordinates> {
        let cluster = self.cluster(cluster_id)?;
        let points: Vec<Point<f64>> = self
            .cluster_members(cluster)
            .filter(|school| school.enrollment_for(year).is_some())
            .filter_map(|school| school.location)
            .map(|c| Point::new(c.lng, c.lat))
            .collect();
        MultiPoint::from(points)
            .centroid()
            .map(|p| Coordinates { lat: p.y(), lng: p.x() })
    }

    /// Centroid of the district boundary ring, if one was provided.
    pub fn boundary_centroid(&self) -> Option<Coordinates> {
        let ring = self.district_boundary.as_ref()?;
        let exterior: geo::LineString<f64> = ring.iter().map(|&[lng, lat]| (lng, lat)).collect();
        geo::Polygon::new(exterior, vec![])
            .centroid()
            .map(|p| Coordinates { lat: p.y(), lng: p.x() })
    }

    /// Mean location of every school with coordinates.
    pub fn schools_centroid(&self) -> Option<Coordinates> {
        let points: Vec<Point<f64>> = self
            .schools
            .iter()
            .filter_map(|s| s.location)
            .map(|c| Point::new(c.lng, c.lat))
            .collect();
        MultiPoint::from(points)
            .centroid()
            .map(|p| Coordinates { lat: p.y(), lng: p.x() })
    }

    /// Utilization per declared year for an entity.
    ///
    /// Unknown school or cluster ids produce an empty series.
    pub fn utilization_history(&self, entity: &EntityRef) -> Vec<YearUtilization> {
        match entity {
            EntityRef::District => self.series(|year| self.aggregate(year).utilization),
            EntityRef::Cluster(id) => {
                if self.cluster(id).is_none() {
                    return Vec::new();
                }
                self.series(|year| {
                    self.cluster_aggregate(id, year)
                        .and_then(|agg| agg.utilization)
                })
            }
            EntityRef::School(id) => {
                let Some(school) = self.school(id) else {
                    return Vec::new();
                };
                self.series(|year| {
                    school.enrollment_for(year).and_then(|enrollment| {
                        utilization(u64::from(enrollment), school.capacity.map(u64::from))
                    })
                })
            }
        }
    }

    fn series<F>(&self, mut value: F) -> Vec<YearUtilization>
    where
        F: FnMut(&str) -> Option<u32>,
    {
        self.years
            .iter()
            .map(|year| YearUtilization {
                year: year.clone(),
                utilization: value(year),
            })
            .collect()
    }
}

fn sum_reporting<'a>(schools: impl Iterator<Item = &'a School>, year: &str) -> Aggregate {
    let (enrollment, capacity) = schools
        .filter_map(|school| {
            school
                .enrollment_for(year)
                .map(|e| (u64::from(e), school.capacity_or_zero()))
        })
        .fold((0u64, 0u64), |(te, tc), (e, c)| (te + e, tc + c));
    Aggregate::from_totals(enrollment, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Cluster;
    use crate::stats::Severity;
    use std::collections::BTreeMap;

    fn school(id: &str, capacity: u32, enrollment: &[(&str, u32)]) -> School {
        School {
            id: id.to_string(),
            name: id.to_uppercase(),
            capacity: Some(capacity),
            enrollment: enrollment
                .iter()
                .map(|(y, e)| (y.to_string(), *e))
                .collect::<BTreeMap<_, _>>(),
            location: None,
            level: None,
        }
    }

    fn two_school_dataset() -> Dataset {
        Dataset {
            years: vec!["FY25".into(), "FY26".into()],
            schools: vec![
                school("a", 100, &[("FY25", 80), ("FY26", 95)]),
                school("b", 50, &[("FY26", 60)]),
            ],
            clusters: vec![Cluster {
                id: "north".into(),
                name: "North".into(),
                schools: vec!["b".into()],
            }],
            district_boundary: None,
        }
    }

    fn history(values: &[(&str, Option<u32>)]) -> Vec<YearUtilization> {
        values
            .iter()
            .map(|(year, utilization)| YearUtilization {
                year: year.to_string(),
                utilization: *utilization,
            })
            .collect()
    }

    #[test]
    fn single_school_end_to_end() {
        let mut dataset = two_school_dataset();
        dataset.schools.truncate(1);

        assert_eq!(
            dataset.utilization_history(&EntityRef::School("a".into())),
            history(&[("FY25", Some(80)), ("FY26", Some(95))])
        );
        assert_eq!(
            dataset.aggregate("FY25"),
            Aggregate {
                total_enrollment: 80,
                total_capacity: 100,
                utilization: Some(80)
            }
        );
        let fy26 = dataset.schools_for_year("FY26");
        assert_eq!(Severity::classify(fy26[0].utilization()), Severity::Medium);
    }

    #[test]
    fn absent_schools_drop_out_of_totals() {
        let dataset = two_school_dataset();

        let fy25 = dataset.aggregate("FY25");
        assert_eq!((fy25.total_enrollment, fy25.total_capacity, fy25.utilization), (80, 100, Some(80)));

        let fy26 = dataset.aggregate("FY26");
        assert_eq!((fy26.total_enrollment, fy26.total_capacity, fy26.utilization), (155, 150, Some(103)));
        assert_eq!(fy26.severity(), Severity::High);
    }

    #[test]
    fn schools_for_year_omits_missing_entries() {
        let dataset = two_school_dataset();
        let rows = dataset.schools_for_year("FY25");
        let fy25: Vec<&str> = rows.iter().map(|s| s.school.id.as_str()).collect();
        assert_eq!(fy25, vec!["a"]);
        assert_eq!(dataset.schools_for_year("FY26").len(), 2);
        assert!(dataset.schools_for_year("FY99").is_empty());
    }

    #[test]
    fn recorded_zero_enrollment_is_not_reporting() {
        let mut dataset = two_school_dataset();
        dataset.schools[1].enrollment.insert("FY25".into(), 0);

        assert_eq!(dataset.schools_for_year("FY25").len(), 1);
        assert_eq!(dataset.aggregate("FY25").total_capacity, 100);
        assert_eq!(
            dataset.utilization_history(&EntityRef::School("b".into())),
            history(&[("FY25", None), ("FY26", Some(120))])
        );
    }

    #[test]
    fn cluster_history_marks_non_reporting_years_undefined() {
        let dataset = two_school_dataset();
        let north = dataset.utilization_history(&EntityRef::Cluster("north".into()));

        assert_eq!(north.len(), dataset.years.len());
        assert_eq!(north, history(&[("FY25", None), ("FY26", Some(120))]));
    }

    #[test]
    fn cluster_aggregate_ignores_unknown_members() {
        let mut dataset = two_school_dataset();
        dataset.clusters[0].schools.push("ghost".into());
        dataset.clusters[0].schools.push("a".into());

        let agg = dataset.cluster_aggregate("north", "FY26").unwrap();
        assert_eq!(agg.total_enrollment, 155);
        assert_eq!(agg.total_capacity, 150);
        assert!(dataset.cluster_aggregate("nowhere", "FY26").is_none());
    }

    #[test]
    fn repeated_cluster_members_count_once() {
        let mut dataset = two_school_dataset();
        dataset.schools[0].location = Some(Coordinates { lat: 10.0, lng: 20.0 });
        dataset.schools[1].location = Some(Coordinates { lat: 12.0, lng: 24.0 });
        dataset.clusters[0].schools = vec!["a".into(), "a".into(), "b".into()];

        let agg = dataset.cluster_aggregate("north", "FY26").unwrap();
        assert_eq!(
            (agg.total_enrollment, agg.total_capacity, agg.utilization),
            (155, 150, Some(103))
        );

        let center = dataset.cluster_centroid("north", "FY26").unwrap();
        assert!((center.lat - 11.0).abs() < 1e-9);
        assert!((center.lng - 22.0).abs() < 1e-9);

        assert_eq!(
            dataset.utilization_history(&EntityRef::Cluster("north".into())),
            history(&[("FY25", Some(80)), ("FY26", Some(103))])
        );
    }

    #[test]
    fn district_history_matches_aggregate() {
        let dataset = two_school_dataset();
        assert_eq!(
            dataset.utilization_history(&EntityRef::District),
            history(&[("FY25", Some(80)), ("FY26", Some(103))])
        );
    }

    #[test]
    fn unknown_entities_yield_empty_history() {
        let dataset = two_school_dataset();
        assert!(dataset
            .utilization_history(&EntityRef::School("missing".into()))
            .is_empty());
        assert!(dataset
            .utilization_history(&EntityRef::Cluster("missing".into()))
            .is_empty());
    }

    #[test]
    fn centroid_averages_reporting_members_only() {
        let mut dataset = two_school_dataset();
        dataset.schools[0].location = Some(Coordinates { lat: 10.0, lng: 20.0 });
        dataset.schools[1].location = Some(Coordinates { lat: 12.0, lng: 24.0 });
        dataset.clusters[0].schools.push("a".into());

        let fy25 = dataset.cluster_centroid("north", "FY25").unwrap();
        assert_eq!((fy25.lat, fy25.lng), (10.0, 20.0));

        let fy26 = dataset.cluster_centroid("north", "FY26").unwrap();
        assert!((fy26.lat - 11.0).abs() < 1e-9);
        assert!((fy26.lng - 22.0).abs() < 1e-9);

        assert!(dataset.cluster_centroid("north", "FY20").is_none());
    }

    #[test]
    fn boundary_centroid_of_square() {
        let mut dataset = two_school_dataset();
        dataset.district_boundary = Some(vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ]);
        let center = dataset.boundary_centroid().unwrap();
        assert!((center.lat - 1.0).abs() < 1e-9);
        assert!((center.lng - 1.0).abs() < 1e-9);
    }
}
