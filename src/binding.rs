//! Binds the configuration form to the device's config API
//!
//! On start the form is loaded with [`ConfigFormBinding::initialize`]. Every
//! edit is sent with [`ConfigFormBinding::send_change`], and the form is
//! refreshed from the configuration the device answers with.

use crate::{
    form::{ConfigForm, FormControl},
    http_client::ConfigApi,
    types::{ChangeSet, Configuration},
};
use anyhow::Result;
use log::{debug, error, warn};
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};

/// Which response may update the form when requests overlap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// Every response updates the form; whichever arrives last wins
    #[default]
    LastResponseWins,
    /// Responses to requests older than the newest one are discarded
    LatestRequestWins,
}

pub struct ConfigFormBinding<Api, Brightness, ClockFormat>
where
    Api: ConfigApi,
    Brightness: FormControl,
    ClockFormat: FormControl,
{
    api: Api,
    form: ConfigForm<Brightness, ClockFormat>,
    ordering: ResponseOrdering,
    latest_request: AtomicU64,
}

impl<Api, Brightness, ClockFormat> ConfigFormBinding<Api, Brightness, ClockFormat>
where
    Api: ConfigApi,
    Brightness: FormControl,
    ClockFormat: FormControl,
{
    pub fn new(api: Api, form: ConfigForm<Brightness, ClockFormat>) -> Self {
        Self {
            api,
            form,
            ordering: ResponseOrdering::default(),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Builder pattern: choose how overlapping responses are handled
    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn form(&self) -> &ConfigForm<Brightness, ClockFormat> {
        &self.form
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Load the current configuration into the form
    ///
    /// Resolves to `true` if the form was populated from the response.
    pub fn initialize(&self) -> impl Future<Output = Result<bool>> + '_ {
        let request_id = self.next_request_id();

        async move {
            debug!("initialize() called (request {request_id})");
            let result = self.api.fetch_config().await;
            self.apply("initialize", request_id, result)
        }
    }

    /// Send `change_set` and refresh the form from the device's answer
    ///
    /// The request is tagged when this is called, so the call order decides
    /// which request is the latest one. On failure the form keeps its values.
    /// Resolves to `true` if the form was populated from the response.
    pub fn send_change(&self, change_set: ChangeSet) -> impl Future<Output = Result<bool>> + '_ {
        let request_id = self.next_request_id();

        async move {
            debug!(
                "send_change() called (request {request_id}) with {}",
                change_set.to_query_string()
            );
            let result = self.api.send_change(change_set).await;
            self.apply("send_change", request_id, result)
        }
    }

    fn next_request_id(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(
        &self,
        operation: &str,
        request_id: u64,
        result: Result<Configuration>,
    ) -> Result<bool> {
        let config = result.inspect_err(|e| error!("{operation} failed: {e:#}"))?;

        if self.ordering == ResponseOrdering::LatestRequestWins
            && request_id != self.latest_request.load(Ordering::SeqCst)
        {
            warn!("{operation}: discarding stale response to request {request_id}");
            return Ok(false);
        }

        self.form.populate(&config);
        Ok(true)
    }
}
