#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use wagedash::{
    source::{TableKind, TableSource},
    MetricTable, Result,
};

pub const NOMINAL: &str = concat!(
    "sector,2000,2001,2002\n",
    "Education,10,20,30\n",
    "Mining,5,6,7\n",
    "Finance,50,60,70\n",
    "Agriculture,1,2,3\n",
);
pub const REAL: &str = concat!(
    "sector,2000,2001,2002\n",
    "Education,10,18,25\n",
    "Mining,5,5.5,6\n",
    "Finance,50,55,58\n",
    "Agriculture,1,1.8,2.5\n",
);
pub const GROWTH_NOM: &str = concat!(
    "sector,2001,2002\n",
    "Education,100,50\n",
    "Mining,20,16.7\n",
    "Finance,20,16.7\n",
    "Agriculture,100,50\n",
);
pub const GROWTH_REAL: &str = concat!(
    "sector,2001,2002\n",
    "Education,80,38.9\n",
    "Mining,10,9.1\n",
    "Finance,10,5.5\n",
    "Agriculture,80,38.9\n",
);

/// Write the four wide CSV tables into `dir`.
pub fn write_csv_fixtures(dir: &Path) {
    for (name, body) in [
        ("nominal", NOMINAL),
        ("real", REAL),
        ("growth_nom", GROWTH_NOM),
        ("growth_real", GROWTH_REAL),
    ] {
        fs::write(dir.join(format!("{}.csv", name)), body).unwrap();
    }
}

/// Counts how often each load reaches the wrapped source.
pub struct CountingSource<S> {
    inner: S,
    count: Arc<AtomicUsize>,
}

impl<S> CountingSource<S> {
    pub fn new(inner: S, count: Arc<AtomicUsize>) -> Self {
        Self { inner, count }
    }
}

pub fn loads(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}

#[async_trait]
impl<S: TableSource> TableSource for CountingSource<S> {
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.load(name).await
    }

    fn table_name(&self, kind: TableKind) -> &str {
        self.inner.table_name(kind)
    }

    fn describe(&self) -> String {
        format!("counting({})", self.inner.describe())
    }
}
