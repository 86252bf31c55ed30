//! Test fixtures shared by the data and view tests.

use crate::data::model::Dataset;
use crate::data::source::{DataSource, FetchError};
use crate::data::DataStore;
use futures::executor::block_on;
use futures::future::BoxFuture;
use futures::FutureExt;

/// Source that resolves immediately with a fixed dataset.
pub struct StaticSource(pub Dataset);

impl DataSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    fn fetch(&self) -> BoxFuture<'static, Result<Dataset, FetchError>> {
        futures::future::ready(Ok(self.0.clone())).boxed()
    }
}

/// Two schools in one cluster plus an unclustered school with no coordinates.
pub const DISTRICT_JSON: &str = r#"{
    "years": ["FY24", "FY25", "FY26"],
    "schools": [
        {
            "id": "westchester", "name": "Westchester", "capacity": 400,
            "level": "Elementary (K-2)",
            "enrollment": {"FY24": 300, "FY25": 340, "FY26": 420},
            "location": {"lat": 33.780, "lng": -84.300}
        },
        {
            "id": "oakhurst", "name": "oakhurst", "capacity": 500,
            "level": "Elementary (K-2)",
            "enrollment": {"FY25": 450, "FY26": 500},
            "location": {"lat": 33.760, "lng": -84.280}
        },
        {
            "id": "decatur_high", "name": "Decatur High", "capacity": 1000,
            "level": "High School (9-12)",
            "enrollment": {"FY24": 900, "FY25": 950, "FY26": 980}
        }
    ],
    "clusters": {
        "north": {"name": "North Decatur", "schools": ["westchester"]},
        "south": {"name": "South Decatur", "schools": ["oakhurst", "westchester"]}
    },
    "cityBoundary": [[-84.31, 33.75], [-84.27, 33.75], [-84.27, 33.79], [-84.31, 33.79]]
}"#;

pub fn loaded_store(json: &str) -> DataStore {
    let dataset = Dataset::from_slice(json.as_bytes()).expect("fixture parses");
    let store = DataStore::new(Box::new(StaticSource(dataset)));
    block_on(store.load()).expect("fixture loads");
    store
}

pub fn district_store() -> DataStore {
    loaded_store(DISTRICT_JSON)
}
