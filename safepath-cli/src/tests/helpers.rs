//! Test helpers: offline provider stubs and command-line plumbing.

use super::*;
use crate::providers::ReputationSettings;
use safepath_core::test_support::{CountingReputationProvider, StubRoutingProvider};
use safepath_engine::{ReputationProvider, RoutingProvider};
use std::cell::RefCell;
use std::sync::Arc;

/// Hands out offline providers and records what it was asked for.
#[derive(Debug, Default)]
pub(super) struct StubProviderBuilder {
    pub(super) reputation_requests: RefCell<Vec<ReputationSettings>>,
    pub(super) routing_requests: RefCell<Vec<String>>,
}

impl ProviderBuilder for StubProviderBuilder {
    fn reputation(
        &self,
        settings: &ReputationSettings,
    ) -> Result<Arc<dyn ReputationProvider>, CliError> {
        self.reputation_requests.borrow_mut().push(settings.clone());
        Ok(Arc::new(CountingReputationProvider::unavailable()))
    }

    fn routing(&self, base_url: &str) -> Result<Arc<dyn RoutingProvider>, CliError> {
        self.routing_requests.borrow_mut().push(base_url.to_owned());
        Ok(Arc::new(StubRoutingProvider::failing()))
    }
}

pub(super) fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

/// Parse `args` as if typed after the binary name.
pub(super) fn parse(args: &[&str]) -> Result<Command, CliError> {
    let invocation = std::iter::once("safepath").chain(args.iter().copied());
    Cli::try_parse_from(invocation)
        .map(|cli| cli.command)
        .map_err(CliError::from)
}

/// Parse and run `args` against `builder`, capturing stdout.
pub(super) fn run_args(
    args: &[&str],
    builder: &StubProviderBuilder,
) -> (Result<(), CliError>, String) {
    let mut stdout = Vec::new();
    let result =
        parse(args).and_then(|command| dispatch(command, &runtime(), builder, &mut stdout));
    let printed = String::from_utf8(stdout).expect("stdout utf-8");
    (result, printed)
}
