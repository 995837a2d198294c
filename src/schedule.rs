// src/schedule.rs
//! Day-of-week workflow dispatch: a lookup table keyed by ISO weekday
//! number. The cron shell that fires it lives outside this crate.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Weekday;

#[async_trait::async_trait]
pub trait Workflow: Send + Sync {
    async fn refresh(&self);
    async fn process(&self) -> Result<()>;
}

/// Monday = 1 .. Sunday = 7.
#[derive(Default)]
pub struct WorkflowTable {
    by_day: HashMap<u8, Arc<dyn Workflow>>,
}

impl WorkflowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, day: u8, workflow: Arc<dyn Workflow>) -> &mut Self {
        self.by_day.insert(day, workflow);
        self
    }

    pub fn for_day(&self, day: u8) -> Option<&Arc<dyn Workflow>> {
        self.by_day.get(&day)
    }

    pub fn for_weekday(&self, weekday: Weekday) -> Option<&Arc<dyn Workflow>> {
        self.for_day(weekday.number_from_monday() as u8)
    }
}
