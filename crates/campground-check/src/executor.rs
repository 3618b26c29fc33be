use std::sync::Arc;

use metrics_publisher::MetricsSink;
use notification_services::{DeliveryReport, EmailDispatcher};
use snapshot_compare::ResultComparator;
use snapshot_store::{SnapshotStore, StoredSnapshot};
use tracing::{debug, error, info};

use crate::check_types::{CampgroundConfig, SearchWindow};
use crate::email_content::{notification_html_body, notification_subject, notification_text_body};
use crate::search_types::AvailabilitySearcher;

/// Why a campground produced no notification this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Results are identical to the previous snapshot
    NoChanges,
    /// Results changed but contain no bookable sites
    NoAvailableSites,
    /// The upstream search failed for this cycle
    SearchError,
}

impl SkipReason {
    /// Metric dimension value for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoChanges => "no_changes",
            SkipReason::NoAvailableSites => "no_available_sites",
            SkipReason::SearchError => "search_error",
        }
    }
}

/// Outcome of one campground's check cycle.
#[derive(Debug)]
pub struct CampgroundOutcome {
    /// Campground the outcome belongs to
    pub campground_id: String,
    /// Whether a notification dispatch was attempted
    pub notified: bool,
    /// Why the campground was skipped, when it was
    pub skip_reason: Option<SkipReason>,
    /// Delivery accounting when a dispatch was attempted
    pub delivery: Option<DeliveryReport>,
}

/// Aggregate outcome of one full pass.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Per-campground outcomes, in processing order
    pub outcomes: Vec<CampgroundOutcome>,
}

impl RunSummary {
    /// Number of campgrounds for which a notification was dispatched.
    pub fn notified_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.notified).count()
    }

    /// Number of campgrounds skipped this pass.
    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.skip_reason.is_some()).count()
    }
}

/// Runs one availability-check pass over all monitored campgrounds.
///
/// Single-threaded, run-to-completion: campgrounds are processed
/// sequentially in priority order, and any failure is contained to the
/// campground it occurred in. Metrics publishing never propagates errors.
pub struct CheckExecutor {
    searcher: Arc<dyn AvailabilitySearcher>,
    store: Arc<dyn SnapshotStore>,
    dispatcher: EmailDispatcher,
    metrics: Arc<dyn MetricsSink>,
    comparator: ResultComparator,
}

impl CheckExecutor {
    /// Wire an executor from its collaborators.
    pub fn new(
        searcher: Arc<dyn AvailabilitySearcher>,
        store: Arc<dyn SnapshotStore>,
        dispatcher: EmailDispatcher,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            searcher,
            store,
            dispatcher,
            metrics,
            comparator: ResultComparator::new(),
        }
    }

    /// Run one pass over the configured campgrounds.
    ///
    /// Disabled campgrounds are skipped outright; the rest are processed in
    /// descending priority order.
    pub async fn run_once(
        &self,
        campgrounds: &[CampgroundConfig],
        window: &SearchWindow,
    ) -> RunSummary {
        let mut active: Vec<&CampgroundConfig> =
            campgrounds.iter().filter(|c| c.enabled).collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));

        info!(
            "Checking {} campground(s) ({} configured) for {} to {}",
            active.len(),
            campgrounds.len(),
            window.start_date,
            window.end_date
        );

        let mut summary = RunSummary::default();
        for campground in active {
            summary.outcomes.push(self.check_campground(campground, window).await);
        }

        info!(
            "Check pass complete: {} notified, {} skipped",
            summary.notified_count(),
            summary.skipped_count()
        );
        summary
    }

    /// Check one campground and notify when its availability changed.
    async fn check_campground(
        &self,
        campground: &CampgroundConfig,
        window: &SearchWindow,
    ) -> CampgroundOutcome {
        info!("Searching for {} ({})", campground.name, campground.id);

        let results = match self.searcher.search(campground, window).await {
            Ok(results) => results,
            Err(e) => {
                error!("Search failed for {}: {}", campground.name, e);
                return self.skip(campground, SkipReason::SearchError).await;
            }
        };

        let current = results.to_snapshot_value();
        let previous = self.store.retrieve(&campground.id).await;
        let changed = self
            .comparator
            .results_changed(&current, previous.as_ref().map(|p| &p.results));

        // Persist before deciding: the next cycle compares against what we
        // saw now, whether or not a notification goes out. A storage
        // failure is recorded but does not stop this cycle.
        let hash = self.comparator.content_hash(&self.comparator.normalize(&current));
        let snapshot = StoredSnapshot::new(&campground.id, current, hash);
        if !self.store.store(&snapshot).await {
            self.metrics
                .publish_store_failure("put", "snapshot-cache", &campground.id)
                .await;
        }

        if !changed {
            debug!("No changes for {}", campground.name);
            return self.skip(campground, SkipReason::NoChanges).await;
        }

        if results.available_sites.is_empty() {
            info!(
                "Results changed for {} but no sites are available",
                campground.name
            );
            return self.skip(campground, SkipReason::NoAvailableSites).await;
        }

        info!(
            "Found {} available site(s) at {}, dispatching notifications",
            results.available_sites.len(),
            campground.name
        );

        let subject = notification_subject(&results);
        let text_body = notification_text_body(&results);
        let html_body = notification_html_body(&results);

        let report = self.dispatcher.send_all(&subject, &text_body, Some(&html_body)).await;

        self.metrics
            .publish_delivery_metrics(
                &campground.id,
                &campground.name,
                report.success_count,
                report.failure_count,
                &report.recipients(),
            )
            .await;

        CampgroundOutcome {
            campground_id: campground.id.clone(),
            notified: true,
            skip_reason: None,
            delivery: Some(report),
        }
    }

    async fn skip(&self, campground: &CampgroundConfig, reason: SkipReason) -> CampgroundOutcome {
        self.metrics
            .publish_notification_skipped(&campground.id, &campground.name, reason.as_str())
            .await;
        CampgroundOutcome {
            campground_id: campground.id.clone(),
            notified: false,
            skip_reason: Some(reason),
            delivery: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check_types::{CheckError, Provider};
    use crate::search_types::{AvailableSite, SearchResults};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use notification_services::{EmailTransport, NotificationError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn campground(id: &str, name: &str, priority: i32) -> CampgroundConfig {
        CampgroundConfig {
            id: id.to_string(),
            name: name.to_string(),
            provider: Provider::RecreationDotGov,
            priority,
            enabled: true,
        }
    }

    fn site(id: &str) -> AvailableSite {
        AvailableSite {
            campsite_id: id.to_string(),
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            campsite_site_name: format!("Site {id}"),
            facility_name: "Test Area".to_string(),
            booking_url: format!("https://www.recreation.gov/camping/campsites/{id}"),
            campsite_type: None,
            recreation_area: None,
            num_nights: 1,
            permitted_equipment: None,
        }
    }

    fn window() -> SearchWindow {
        SearchWindow::next_days(14)
    }

    /// Searcher returning canned results (or an error) per campground id.
    #[derive(Default)]
    struct MockSearcher {
        results: HashMap<String, Vec<AvailableSite>>,
        failing: Vec<String>,
        searched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AvailabilitySearcher for MockSearcher {
        async fn search(
            &self,
            campground: &CampgroundConfig,
            _window: &SearchWindow,
        ) -> Result<SearchResults, CheckError> {
            self.searched.lock().unwrap().push(campground.id.clone());
            if self.failing.contains(&campground.id) {
                return Err(CheckError::ApiError("upstream down".to_string()));
            }
            let sites = self.results.get(&campground.id).cloned().unwrap_or_default();
            Ok(SearchResults::new(campground, sites))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        snapshots: Mutex<HashMap<String, StoredSnapshot>>,
        fail_puts: bool,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn retrieve(&self, campground_id: &str) -> Option<StoredSnapshot> {
            self.snapshots.lock().unwrap().get(campground_id).cloned()
        }

        async fn store(&self, snapshot: &StoredSnapshot) -> bool {
            if self.fail_puts {
                return false;
            }
            self.snapshots
                .lock()
                .unwrap()
                .insert(snapshot.campground_id.clone(), snapshot.clone());
            true
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum MetricEvent {
        Delivery { campground_id: String, success: usize, failure: usize },
        Skipped { campground_id: String, reason: String },
        StoreFailure { operation: String },
    }

    #[derive(Default)]
    struct RecordingMetrics {
        events: Mutex<Vec<MetricEvent>>,
    }

    #[async_trait]
    impl MetricsSink for RecordingMetrics {
        async fn publish_delivery_metrics(
            &self,
            campground_id: &str,
            _campground_name: &str,
            success_count: usize,
            failure_count: usize,
            _recipients: &[String],
        ) {
            self.events.lock().unwrap().push(MetricEvent::Delivery {
                campground_id: campground_id.to_string(),
                success: success_count,
                failure: failure_count,
            });
        }

        async fn publish_notification_skipped(
            &self,
            campground_id: &str,
            _campground_name: &str,
            reason: &str,
        ) {
            self.events.lock().unwrap().push(MetricEvent::Skipped {
                campground_id: campground_id.to_string(),
                reason: reason.to_string(),
            });
        }

        async fn publish_store_failure(&self, operation: &str, _target: &str, _key: &str) {
            self.events
                .lock()
                .unwrap()
                .push(MetricEvent::StoreFailure { operation: operation.to_string() });
        }
    }

    struct CountingTransport {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmailTransport for CountingTransport {
        async fn send(
            &self,
            to: &str,
            _subject: &str,
            _text_body: &str,
            _html_body: Option<&str>,
        ) -> Result<String, NotificationError> {
            self.sent.lock().unwrap().push(to.to_string());
            Ok("mock-id".to_string())
        }
    }

    fn executor(
        searcher: Arc<MockSearcher>,
        store: Arc<MemoryStore>,
        metrics: Arc<RecordingMetrics>,
        transport: Arc<CountingTransport>,
    ) -> CheckExecutor {
        let dispatcher = EmailDispatcher::new(
            transport,
            Some("one@example.com,two@example.com".to_string()),
        );
        CheckExecutor::new(searcher, store, dispatcher, metrics)
    }

    async fn seed_store(store: &MemoryStore, campground: &CampgroundConfig, sites: Vec<AvailableSite>) {
        let comparator = ResultComparator::new();
        let results = SearchResults::new(campground, sites);
        let value = results.to_snapshot_value();
        let hash = comparator.content_hash(&comparator.normalize(&value));
        store
            .store(&StoredSnapshot::new(&campground.id, value, hash))
            .await;
    }

    #[tokio::test]
    async fn unchanged_results_skip_notification() {
        let r1 = campground("R1", "Resource One", 1);
        let store = Arc::new(MemoryStore::default());
        // Seed with the same sites the searcher will return; only the
        // volatile search_timestamp will differ.
        seed_store(&store, &r1, vec![site("A")]).await;

        let searcher = Arc::new(MockSearcher {
            results: HashMap::from([("R1".to_string(), vec![site("A")])]),
            ..Default::default()
        });
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store, metrics.clone(), transport.clone());
        let summary = exec.run_once(&[r1], &window()).await;

        assert_eq!(summary.notified_count(), 0);
        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(
            *metrics.events.lock().unwrap(),
            vec![MetricEvent::Skipped {
                campground_id: "R1".to_string(),
                reason: "no_changes".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn changed_results_notify_every_recipient() {
        let r1 = campground("R1", "Resource One", 1);
        let store = Arc::new(MemoryStore::default());
        seed_store(&store, &r1, vec![site("A")]).await;

        let searcher = Arc::new(MockSearcher {
            results: HashMap::from([("R1".to_string(), vec![site("A"), site("B")])]),
            ..Default::default()
        });
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store.clone(), metrics.clone(), transport.clone());
        let summary = exec.run_once(&[r1], &window()).await;

        assert_eq!(summary.notified_count(), 1);
        let delivery = summary.outcomes[0].delivery.as_ref().unwrap();
        assert_eq!(delivery.success_count, 2);
        assert_eq!(delivery.failure_count, 0);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
        assert_eq!(
            *metrics.events.lock().unwrap(),
            vec![MetricEvent::Delivery {
                campground_id: "R1".to_string(),
                success: 2,
                failure: 0
            }]
        );
        // The stored snapshot was replaced with the new results.
        let stored = store.retrieve("R1").await.unwrap();
        assert_eq!(stored.results["available_sites"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn first_sighting_notifies() {
        let r1 = campground("R1", "Resource One", 1);
        let searcher = Arc::new(MockSearcher {
            results: HashMap::from([("R1".to_string(), vec![site("A")])]),
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::default());
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store, metrics, transport.clone());
        let summary = exec.run_once(&[r1], &window()).await;

        assert_eq!(summary.notified_count(), 1);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_failure_skips_only_that_campground() {
        let r1 = campground("R1", "Resource One", 2);
        let r2 = campground("R2", "Resource Two", 1);
        let searcher = Arc::new(MockSearcher {
            results: HashMap::from([("R2".to_string(), vec![site("A")])]),
            failing: vec!["R1".to_string()],
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::default());
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store, metrics.clone(), transport);
        let summary = exec.run_once(&[r1, r2], &window()).await;

        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.outcomes[0].skip_reason, Some(SkipReason::SearchError));
        assert!(summary.outcomes[1].notified);
        let events = metrics.events.lock().unwrap();
        assert!(events.contains(&MetricEvent::Skipped {
            campground_id: "R1".to_string(),
            reason: "search_error".to_string()
        }));
    }

    #[tokio::test]
    async fn campgrounds_run_in_priority_order_and_disabled_are_skipped() {
        let low = campground("LOW", "Low Priority", 1);
        let high = campground("HIGH", "High Priority", 9);
        let mut off = campground("OFF", "Disabled", 100);
        off.enabled = false;

        let searcher = Arc::new(MockSearcher::default());
        let store = Arc::new(MemoryStore::default());
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher.clone(), store, metrics, transport);
        exec.run_once(&[low, off, high], &window()).await;

        assert_eq!(*searcher.searched.lock().unwrap(), vec!["HIGH", "LOW"]);
    }

    #[tokio::test]
    async fn store_failure_still_notifies() {
        let r1 = campground("R1", "Resource One", 1);
        let searcher = Arc::new(MockSearcher {
            results: HashMap::from([("R1".to_string(), vec![site("A")])]),
            ..Default::default()
        });
        let store = Arc::new(MemoryStore { fail_puts: true, ..Default::default() });
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store, metrics.clone(), transport.clone());
        let summary = exec.run_once(&[r1], &window()).await;

        assert_eq!(summary.notified_count(), 1);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
        let events = metrics.events.lock().unwrap();
        assert!(events.contains(&MetricEvent::StoreFailure { operation: "put".to_string() }));
    }

    #[tokio::test]
    async fn changed_but_empty_results_skip_with_reason() {
        let r1 = campground("R1", "Resource One", 1);
        let store = Arc::new(MemoryStore::default());
        seed_store(&store, &r1, vec![site("A")]).await;

        // Searcher now reports nothing available.
        let searcher = Arc::new(MockSearcher::default());
        let metrics = Arc::new(RecordingMetrics::default());
        let transport = Arc::new(CountingTransport { sent: Mutex::new(Vec::new()) });

        let exec = executor(searcher, store, metrics.clone(), transport.clone());
        let summary = exec.run_once(&[r1], &window()).await;

        assert_eq!(summary.outcomes[0].skip_reason, Some(SkipReason::NoAvailableSites));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
