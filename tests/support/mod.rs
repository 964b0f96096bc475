//! In-memory fakes for the market and store ports.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use marketmirror::domain::Order;
use marketmirror::error::{Result, StoreError, UpstreamError};
use marketmirror::port::{
    FileEntry, OrderPage, OrderPages, PageError, PublishTarget, PublishedReader, RegionDirectory,
    RemoteContent, SnapshotStore,
};

/// One scripted response for a page fetch. Sequences are consumed one entry
/// per attempt; the final entry repeats if fetched again.
#[derive(Clone)]
pub enum PageScript {
    Orders(Vec<Order>, Option<u32>),
    RateLimited,
    NotFound,
}

impl PageScript {
    fn into_response(self) -> std::result::Result<OrderPage, PageError> {
        match self {
            Self::Orders(orders, total_pages) => Ok(OrderPage {
                orders,
                total_pages,
                records_dropped: 0,
            }),
            Self::RateLimited => Err(PageError::Retryable {
                reason: "status 429".into(),
            }),
            Self::NotFound => Err(PageError::Permanent {
                reason: "status 404".into(),
            }),
        }
    }
}

/// Fake upstream market API.
#[derive(Default)]
pub struct FakeMarket {
    pages: Mutex<HashMap<(u32, u32), Vec<PageScript>>>,
    regions: Vec<u32>,
    fail_directory: bool,
}

impl FakeMarket {
    pub fn new(regions: Vec<u32>) -> Self {
        Self {
            regions,
            ..Default::default()
        }
    }

    pub fn with_failing_directory() -> Self {
        Self {
            fail_directory: true,
            ..Default::default()
        }
    }

    pub fn script(&self, region_id: u32, page: u32, responses: Vec<PageScript>) {
        self.pages.lock().insert((region_id, page), responses);
    }

    /// Script a region as a single page of orders.
    pub fn single_page(&self, region_id: u32, orders: Vec<Order>) {
        self.script(region_id, 1, vec![PageScript::Orders(orders, Some(1))]);
    }
}

#[async_trait]
impl OrderPages for FakeMarket {
    async fn fetch_page(
        &self,
        region_id: u32,
        page: u32,
    ) -> std::result::Result<OrderPage, PageError> {
        let mut pages = self.pages.lock();
        let responses = pages
            .get_mut(&(region_id, page))
            .unwrap_or_else(|| panic!("unscripted page {page} for region {region_id}"));
        let script = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses[0].clone()
        };
        script.into_response()
    }
}

#[async_trait]
impl RegionDirectory for FakeMarket {
    async fn region_ids(&self) -> Result<Vec<u32>> {
        if self.fail_directory {
            return Err(UpstreamError::RegionDirectory("status 503".into()).into());
        }
        Ok(self.regions.clone())
    }
}

/// Fake versioned store; also serves the public read path.
#[derive(Default)]
pub struct MemoryStore {
    pub files: Mutex<HashMap<(String, String), (String, String)>>,
    pub writes: Mutex<usize>,
    pub bulk_calls: Mutex<Vec<usize>>,
}

impl MemoryStore {
    pub fn key(target: &PublishTarget, path: &str) -> (String, String) {
        (target.label(), path.to_string())
    }

    pub fn seed(&self, target: &PublishTarget, path: &str, content: &str) {
        self.files.lock().insert(
            Self::key(target, path),
            ("seeded".into(), content.to_string()),
        );
    }

    pub fn content(&self, target: &PublishTarget, path: &str) -> Option<String> {
        self.files
            .lock()
            .get(&Self::key(target, path))
            .map(|(_, content)| content.clone())
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn read(&self, target: &PublishTarget, path: &str) -> Result<Option<RemoteContent>> {
        Ok(self.files.lock().get(&Self::key(target, path)).map(
            |(version, content)| RemoteContent {
                version: version.clone(),
                content: content.clone().into_bytes(),
            },
        ))
    }

    async fn write(
        &self,
        target: &PublishTarget,
        path: &str,
        content: &str,
        _message: &str,
        expected_version: Option<&str>,
    ) -> Result<()> {
        let mut files = self.files.lock();
        let key = MemoryStore::key(target, path);
        let current = files.get(&key).map(|(version, _)| version.clone());
        if current.as_deref() != expected_version {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_version.unwrap_or("<new file>").to_string(),
            }
            .into());
        }
        let mut writes = self.writes.lock();
        *writes += 1;
        files.insert(key, (format!("v{writes}"), content.to_string()));
        Ok(())
    }

    async fn bulk_replace(
        &self,
        target: &PublishTarget,
        entries: &[FileEntry],
        _message: &str,
    ) -> Result<()> {
        self.bulk_calls.lock().push(entries.len());
        let mut files = self.files.lock();
        for entry in entries {
            files.insert(
                MemoryStore::key(target, &entry.path),
                ("bulk".into(), entry.content.clone()),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl PublishedReader for MemoryStore {
    async fn read_published(&self, target: &PublishTarget, path: &str) -> Result<Option<String>> {
        Ok(self.content(target, path))
    }
}

pub fn target(branch: &str, prefix: &str) -> PublishTarget {
    PublishTarget {
        owner: "acme".into(),
        repo: "market-cache".into(),
        branch: branch.into(),
        data_prefix: prefix.into(),
    }
}

pub fn order(instrument_id: u32, price: &str, is_buy: bool, venue_id: i64) -> Order {
    Order {
        instrument_id,
        venue_id,
        price: price.parse().unwrap(),
        volume_remain: 100,
        is_buy_order: is_buy,
        range: None,
        issued: None,
        duration: None,
    }
}

/// Keep fakes behind `Arc` so tests can hold a handle after wiring.
pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
