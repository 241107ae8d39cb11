//! Background country loading for the task forms.
//!
//! Fetches run on the tokio runtime; results come back over an mpsc channel
//! that the UI loop drains every tick, so form state is only touched on the
//! UI thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::{country::CountryClient, error::FetchError, task::DEFAULT_COUNTRY, tui::enums::FormTarget};

/// A finished lookup, tagged with the request it answers.
#[derive(Debug)]
pub struct CountryDelivery {
    pub target: FormTarget,
    pub ticket: u64,
    pub result: Result<Vec<String>, FetchError>,
}

/// Spawns country fetches and collects their results.
pub struct CountryLoader {
    runtime: Handle,
    client: Result<Arc<CountryClient>, (String, String)>,
    tx: Sender<CountryDelivery>,
    rx: Receiver<CountryDelivery>,
    next_ticket: u64,
}

impl CountryLoader {
    /// Build a loader for `url`. An unusable URL is kept and reported on every request.
    pub fn new(runtime: Handle, url: &str, timeout: Option<Duration>) -> Self {
        let client = match CountryClient::new(url, timeout) {
            Ok(client) => Ok(Arc::new(client)),
            Err(FetchError::InvalidUrl { url, reason }) => Err((url, reason)),
            Err(e) => Err((url.to_string(), e.to_string())),
        };
        if let Err((url, reason)) = &client {
            warn!(%url, %reason, "country lookup disabled");
        }
        let (tx, rx) = mpsc::channel();
        CountryLoader {
            runtime,
            client,
            tx,
            rx,
            next_ticket: 0,
        }
    }

    /// Start one independent fetch for `target` and return its ticket.
    pub fn request(&mut self, target: FormTarget) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let tx = self.tx.clone();

        match &self.client {
            Ok(client) => {
                let client = Arc::clone(client);
                debug!(?target, ticket, url = %client.url(), "country fetch started");
                self.runtime.spawn(async move {
                    let result = client.fetch_country_names().await;
                    // The receiver only disappears when the app is shutting down.
                    let _ = tx.send(CountryDelivery { target, ticket, result });
                });
            }
            Err((url, reason)) => {
                let _ = tx.send(CountryDelivery {
                    target,
                    ticket,
                    result: Err(FetchError::InvalidUrl {
                        url: url.clone(),
                        reason: reason.clone(),
                    }),
                });
            }
        }
        ticket
    }

    /// All results delivered since the last call, without blocking.
    pub fn drain(&self) -> Vec<CountryDelivery> {
        self.rx.try_iter().collect()
    }
}

/// Load state of a country selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Country selector of one form.
#[derive(Debug, Clone)]
pub struct CountryPicker {
    pub state: LoadState,
    names: Vec<String>,
    /// `None` until the user picks from the list; `preferred` applies meanwhile.
    selected: Option<usize>,
    preferred: String,
    ticket: Option<u64>,
}

impl Default for CountryPicker {
    fn default() -> Self {
        Self::with_preferred(DEFAULT_COUNTRY)
    }
}

impl CountryPicker {
    /// A picker that falls back to `preferred` until a list arrives.
    pub fn with_preferred(preferred: &str) -> Self {
        CountryPicker {
            state: LoadState::Idle,
            names: Vec::new(),
            selected: None,
            preferred: preferred.to_string(),
            ticket: None,
        }
    }

    /// Mark the picker as waiting for `ticket`.
    pub fn begin(&mut self, ticket: u64) {
        self.ticket = Some(ticket);
        self.state = LoadState::Loading;
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Apply a delivered result. Results for another ticket are ignored.
    ///
    /// The loading state is left on success and on failure alike.
    pub fn apply(&mut self, ticket: u64, result: Result<Vec<String>, FetchError>) -> bool {
        if self.ticket != Some(ticket) {
            return false;
        }
        self.ticket = None;
        match result {
            Ok(names) => {
                self.selected = None;
                self.names = names;
                self.state = LoadState::Ready;
            }
            Err(e) => {
                self.names.clear();
                self.selected = None;
                self.state = LoadState::Failed(e.to_string());
            }
        }
        true
    }

    /// The country a submit would record.
    ///
    /// Stays on `preferred` until the user cycles, even when the loaded list
    /// does not contain it.
    pub fn selected_name(&self) -> &str {
        self.selected
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
            .unwrap_or(&self.preferred)
    }

    /// Make `name` the current choice again.
    pub fn prefer(&mut self, name: &str) {
        self.preferred = name.to_string();
        self.selected = None;
    }

    /// Step through the loaded list, starting next to the current choice.
    pub fn cycle(&mut self, forward: bool) {
        if self.names.is_empty() {
            return;
        }
        let len = self.names.len();
        let current = self
            .selected
            .or_else(|| self.names.iter().position(|n| *n == self.preferred));
        let next = match (current, forward) {
            (Some(idx), true) => (idx + 1) % len,
            (Some(0), false) => len - 1,
            (Some(idx), false) => idx - 1,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.selected = Some(next);
        self.preferred = self.names[next].clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::tests::serve_once;
    use std::time::Instant;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_picker_defaults_while_loading() {
        let mut picker = CountryPicker::default();
        picker.begin(1);
        assert!(picker.is_loading());
        assert_eq!(picker.selected_name(), DEFAULT_COUNTRY);
    }

    #[test]
    fn test_picker_selects_preferred_on_arrival() {
        let mut picker = CountryPicker::with_preferred("France");
        picker.begin(4);
        assert!(picker.apply(4, Ok(names(&["Belgique", "France", "Italie"]))));
        assert_eq!(picker.state, LoadState::Ready);
        assert_eq!(picker.selected_name(), "France");

        picker.cycle(true);
        assert_eq!(picker.selected_name(), "Italie");
        picker.cycle(true);
        assert_eq!(picker.selected_name(), "Belgique");
        picker.cycle(false);
        assert_eq!(picker.selected_name(), "Italie");
    }

    #[test]
    fn test_picker_failure_clears_loading() {
        let mut picker = CountryPicker::default();
        picker.begin(2);
        assert!(picker.apply(2, Err(FetchError::Status(503))));
        assert!(!picker.is_loading());
        assert!(matches!(picker.state, LoadState::Failed(_)));
        assert!(picker.names().is_empty());
        assert_eq!(picker.selected_name(), DEFAULT_COUNTRY);
    }

    #[test]
    fn test_picker_ignores_stale_ticket() {
        let mut picker = CountryPicker::default();
        picker.begin(1);
        picker.begin(2);
        assert!(!picker.apply(1, Ok(names(&["Belgique"]))));
        assert!(picker.is_loading());
        assert!(picker.apply(2, Ok(names(&["Belgique"]))));
        assert!(!picker.is_loading());
        picker.cycle(true);
        assert_eq!(picker.selected_name(), "Belgique");
    }

    #[test]
    fn test_picker_keeps_country_missing_from_list() {
        let mut picker = CountryPicker::with_preferred("Atlantis");
        picker.begin(1);
        assert!(picker.apply(1, Ok(names(&["Belgique", "France"]))));
        assert_eq!(picker.selected_name(), "Atlantis");

        picker.cycle(false);
        assert_eq!(picker.selected_name(), "France");
        picker.cycle(true);
        assert_eq!(picker.selected_name(), "Belgique");

        picker.prefer("Atlantis");
        assert_eq!(picker.selected_name(), "Atlantis");
    }

    #[test]
    fn test_loader_reports_invalid_url() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut loader = CountryLoader::new(rt.handle().clone(), "::nope::", None);
        let ticket = loader.request(FormTarget::Add);

        let delivered = loader.drain();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].ticket, ticket);
        assert!(matches!(delivered[0].result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_loader_delivers_fetch_result() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let url = rt.block_on(serve_once(
            "200 OK",
            r#"{"result":{"result":{"FR":"France","BE":"Belgique"}}}"#,
        ));
        let mut loader = CountryLoader::new(rt.handle().clone(), &url, Some(Duration::from_secs(5)));
        let ticket = loader.request(FormTarget::Edit);

        let deadline = Instant::now() + Duration::from_secs(5);
        let delivery = loop {
            if let Some(d) = loader.drain().pop() {
                break d;
            }
            assert!(Instant::now() < deadline, "no country delivery");
            std::thread::sleep(Duration::from_millis(10));
        };

        assert_eq!(delivery.target, FormTarget::Edit);
        assert_eq!(delivery.ticket, ticket);
        assert_eq!(delivery.result.unwrap(), names(&["Belgique", "France"]));
    }
}
