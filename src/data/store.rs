//! Data Store Module
//! Single source of truth for the dataset with single-flight loading.

use crate::data::aggregate::{EntityRef, SchoolEnrollment};
use crate::data::model::{Cluster, Coordinates, Dataset, School, Year};
use crate::data::source::{DataSource, FetchError};
use crate::stats::{Aggregate, YearUtilization};
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use std::cell::RefCell;
use std::sync::Arc;
use thiserror::Error;

/// The dataset could not be fetched or parsed.
#[derive(Error, Debug, Clone)]
#[error("Data unavailable from {location}: {source}")]
pub struct DataUnavailable {
    pub location: String,
    #[source]
    pub source: Arc<FetchError>,
}

pub type LoadResult = Result<Arc<Dataset>, DataUnavailable>;

/// Pending load shared by every caller of [`DataStore::load`].
pub type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum LoadState {
    Empty,
    InFlight(SharedLoad),
    Loaded(Arc<Dataset>),
}

/// Holds the dataset and answers every aggregation query.
///
/// Queries issued before the dataset is available return empty results.
pub struct DataStore {
    source: Box<dyn DataSource>,
    state: RefCell<LoadState>,
}

impl DataStore {
    pub fn new(source: Box<dyn DataSource>) -> Self {
        Self {
            source,
            state: RefCell::new(LoadState::Empty),
        }
    }

    pub fn location(&self) -> String {
        self.source.describe()
    }

    /// Load the dataset, sharing a fetch that is already in flight.
    ///
    /// A failed load clears the in-flight marker so the next call retries.
    pub fn load(&self) -> SharedLoad {
        let mut state = self.state.borrow_mut();
        Self::settle(&mut state);

        match &*state {
            LoadState::Loaded(dataset) => {
                let ready: BoxFuture<'static, LoadResult> =
                    future::ready(Ok(Arc::clone(dataset))).boxed();
                return ready.shared();
            }
            LoadState::InFlight(pending) => return pending.clone(),
            LoadState::Empty => {}
        }

        let location = self.source.describe();
        log::info!("Loading school data from {}", location);

        let fetch = self.source.fetch();
        let pending = async move {
            match fetch.await {
                Ok(dataset) => {
                    log::info!(
                        "School data loaded: {} years, {} schools, {} clusters",
                        dataset.years.len(),
                        dataset.schools.len(),
                        dataset.clusters.len()
                    );
                    Ok(Arc::new(dataset))
                }
                Err(e) => {
                    log::error!("Error loading school data from {}: {}", location, e);
                    Err(DataUnavailable {
                        location,
                        source: Arc::new(e),
                    })
                }
            }
        }
        .boxed()
        .shared();

        *state = LoadState::InFlight(pending.clone());
        pending
    }

    /// Promote a finished in-flight load to its terminal state.
    fn settle(state: &mut LoadState) {
        let next = match &*state {
            LoadState::InFlight(pending) => match pending.peek() {
                Some(Ok(dataset)) => Some(LoadState::Loaded(Arc::clone(dataset))),
                Some(Err(_)) => Some(LoadState::Empty),
                None => None,
            },
            _ => None,
        };
        if let Some(next) = next {
            *state = next;
        }
    }

    /// Read-only snapshot of the loaded dataset.
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        let mut state = self.state.borrow_mut();
        Self::settle(&mut state);
        match &*state {
            LoadState::Loaded(dataset) => Some(Arc::clone(dataset)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.dataset().is_some()
    }

    pub fn is_loading(&self) -> bool {
        let mut state = self.state.borrow_mut();
        Self::settle(&mut state);
        matches!(&*state, LoadState::InFlight(_))
    }

    /// Drop the dataset and any pending load.
    pub fn reset(&self) {
        *self.state.borrow_mut() = LoadState::Empty;
    }

    fn query<T: Default>(&self, f: impl FnOnce(&Dataset) -> T) -> T {
        self.dataset().map(|d| f(&d)).unwrap_or_default()
    }

    pub fn years(&self) -> Vec<Year> {
        self.query(|d| d.years.clone())
    }

    pub fn schools(&self) -> Vec<School> {
        self.query(|d| d.schools.clone())
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        self.query(|d| d.clusters.clone())
    }

    pub fn district_boundary(&self) -> Option<Vec<[f64; 2]>> {
        self.query(|d| d.district_boundary.clone())
    }

    pub fn schools_for_year(&self, year: &str) -> Vec<SchoolEnrollment> {
        self.query(|d| d.schools_for_year(year))
    }

    pub fn aggregate(&self, year: &str) -> Aggregate {
        self.query(|d| d.aggregate(year))
    }

    pub fn cluster_aggregate(&self, cluster_id: &str, year: &str) -> Option<Aggregate> {
        self.query(|d| d.cluster_aggregate(cluster_id, year))
    }

    pub fn cluster_centroid(&self, cluster_id: &str, year: &str) -> Option<Coordinates> {
        self.query(|d| d.cluster_centroid(cluster_id, year))
    }

    pub fn utilization_history(&self, entity: &EntityRef) -> Vec<YearUtilization> {
        self.query(|d| d.utilization_history(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Responder = oneshot::Sender<Result<Dataset, FetchError>>;

    /// Source whose fetches are resolved by the test.
    #[derive(Clone, Default)]
    struct ManualSource {
        fetches: Arc<AtomicUsize>,
        responders: Arc<Mutex<Vec<Responder>>>,
    }

    impl ManualSource {
        fn respond(&self, result: Result<Dataset, FetchError>) {
            let responder = self.responders.lock().unwrap().remove(0);
            responder.send(result).ok();
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl DataSource for ManualSource {
        fn describe(&self) -> String {
            "manual".to_string()
        }

        fn fetch(&self) -> BoxFuture<'static, Result<Dataset, FetchError>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = oneshot::channel();
            self.responders.lock().unwrap().push(tx);
            async move { rx.await.unwrap_or(Err(FetchError::Cancelled)) }.boxed()
        }
    }

    fn sample() -> Dataset {
        Dataset::from_slice(
            br#"{
                "years": ["FY25", "FY26"],
                "schools": [
                    {"id": "a", "name": "A", "capacity": 100, "enrollment": {"FY25": 80, "FY26": 95}},
                    {"id": "b", "name": "B", "capacity": 50, "enrollment": {"FY26": 60}}
                ],
                "clusters": {"north": {"name": "North", "schools": ["a", "b"]}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn concurrent_loads_share_one_fetch() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));

        let first = store.load();
        let second = store.load();
        assert_eq!(source.fetch_count(), 1);
        assert!(store.is_loading());

        source.respond(Ok(sample()));
        let (a, b) = block_on(future::join(first, second));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn loaded_dataset_is_memoized() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));

        let first = store.load();
        source.respond(Ok(sample()));
        let a = block_on(first).unwrap();

        let b = block_on(store.load()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.fetch_count(), 1);
        assert!(store.is_ready());
    }

    #[test]
    fn failed_load_can_be_retried() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));

        let first = store.load();
        source.respond(Err(FetchError::Cancelled));
        let err = block_on(first).unwrap_err();
        assert_eq!(err.location, "manual");

        assert!(!store.is_ready());
        assert!(!store.is_loading());
        assert!(store.years().is_empty());

        let retry = store.load();
        assert_eq!(source.fetch_count(), 2);
        source.respond(Ok(sample()));
        assert!(block_on(retry).is_ok());
        assert_eq!(store.years(), vec!["FY25", "FY26"]);
    }

    #[test]
    fn queries_before_load_are_empty() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));
        let _pending = store.load();

        assert!(store.years().is_empty());
        assert!(store.schools_for_year("FY26").is_empty());
        assert_eq!(store.aggregate("FY26"), Aggregate::default());
        assert!(store.utilization_history(&EntityRef::District).is_empty());
        assert!(store.cluster_aggregate("north", "FY26").is_none());
        assert!(store.district_boundary().is_none());
    }

    #[test]
    fn queries_delegate_to_dataset() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));
        let pending = store.load();
        source.respond(Ok(sample()));
        block_on(pending).unwrap();

        assert_eq!(store.aggregate("FY26").utilization, Some(103));
        assert_eq!(store.schools_for_year("FY25").len(), 1);
        assert_eq!(
            store
                .utilization_history(&EntityRef::Cluster("north".into()))
                .len(),
            2
        );
        assert_eq!(store.clusters().len(), 1);
    }

    #[test]
    fn reset_drops_dataset() {
        let source = ManualSource::default();
        let store = DataStore::new(Box::new(source.clone()));
        let pending = store.load();
        source.respond(Ok(sample()));
        block_on(pending).unwrap();

        store.reset();
        assert!(!store.is_ready());
        let _again = store.load();
        assert_eq!(source.fetch_count(), 2);
    }
}
