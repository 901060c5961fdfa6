//! Behavioural tests for the HTTP adapters against a loopback server.

mod support;

use std::cell::RefCell;
use std::thread::JoinHandle;

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use safepath_core::{
    AreaReport, DirectionsRequest, ProviderError, ProviderRoute, ReputationProvider,
    RoutingProvider, TravelMode,
};
use safepath_data::{HttpReputationProvider, OsrmRoutingProvider};
use support::{block_on, closed_port, serve_once};

const ROUTE_BODY: &str = r#"{"code":"Ok","routes":[{"geometry":"_p~iF~ps|U_ulLnnqC","distance":1200.0,"duration":860.0,"legs":[{"steps":[{"name":"Strand","distance":1200.0,"duration":860.0,"maneuver":{"type":"depart"}}]}]}]}"#;
const NO_ROUTE_BODY: &str = r#"{"code":"NoRoute","message":"Impossible route between points"}"#;
const REPORT_BODY: &str = r#"{"score":72.0,"confidence":80.0,"factors":{"lighting":"good","crime_rate":18.0}}"#;

/// Base URL of the service under test and the server thread, if any.
#[derive(Default)]
struct Service {
    base_url: String,
    server: Option<JoinHandle<String>>,
    request_line: Option<String>,
}

type ServiceCell = RefCell<Service>;
type RoutesCell = RefCell<Option<Result<Vec<ProviderRoute>, ProviderError>>>;
type ReportCell = RefCell<Option<Result<AreaReport, ProviderError>>>;

#[fixture]
fn service() -> ServiceCell {
    RefCell::new(Service::default())
}

#[fixture]
fn routes() -> RoutesCell {
    RefCell::new(None)
}

#[fixture]
fn report() -> ReportCell {
    RefCell::new(None)
}

fn serve(service: &ServiceCell, status: &str, body: &str) {
    let (base_url, server) = serve_once(status, body);
    *service.borrow_mut() = Service {
        base_url,
        server: Some(server),
        request_line: None,
    };
}

fn finish(service: &ServiceCell) {
    let mut service = service.borrow_mut();
    if let Some(server) = service.server.take() {
        service.request_line = Some(server.join().expect("server thread"));
    }
}

// --- Given steps ---

#[given("an OSRM service returning one route")]
fn osrm_returning_route(#[from(service)] service: &ServiceCell) {
    serve(service, "200 OK", ROUTE_BODY);
}

#[given("an OSRM service reporting no route")]
fn osrm_no_route(#[from(service)] service: &ServiceCell) {
    serve(service, "200 OK", NO_ROUTE_BODY);
}

#[given("an OSRM service that is not running")]
fn osrm_not_running(#[from(service)] service: &ServiceCell) {
    service.borrow_mut().base_url = closed_port();
}

#[given("a reputation service returning a report")]
fn reputation_returning_report(#[from(service)] service: &ServiceCell) {
    serve(service, "200 OK", REPORT_BODY);
}

#[given("a reputation service answering with status 503")]
fn reputation_unavailable(#[from(service)] service: &ServiceCell) {
    serve(service, "503 Service Unavailable", "{}");
}

// --- When steps ---

#[when("I request walking directions")]
fn request_directions(#[from(service)] service: &ServiceCell, #[from(routes)] routes: &RoutesCell) {
    let provider =
        OsrmRoutingProvider::new(service.borrow().base_url.clone()).expect("provider should build");
    let request = DirectionsRequest::direct(
        Coord { x: -0.1233, y: 51.5101 },
        Coord { x: -0.1131, y: 51.5117 },
        TravelMode::Walking,
    );
    *routes.borrow_mut() = Some(block_on(provider.directions(&request)));
    finish(service);
}

#[when("I analyse central London")]
fn analyse_london(#[from(service)] service: &ServiceCell, #[from(report)] report: &ReportCell) {
    let provider = HttpReputationProvider::new(service.borrow().base_url.clone())
        .expect("provider should build");
    *report.borrow_mut() = Some(block_on(provider.analyse(Coord {
        x: -0.1276,
        y: 51.5072,
    })));
    finish(service);
}

// --- Then steps ---

#[then("one route with decoded geometry is returned")]
fn one_route(#[from(routes)] routes: &RoutesCell) {
    let borrowed = routes.borrow();
    let routes = borrowed
        .as_ref()
        .expect("request made")
        .as_ref()
        .expect("expected Ok result");
    assert_eq!(routes.len(), 1);
    assert!(routes.iter().all(|r| r.geometry.len() == 2 && r.steps.len() == 1));
}

#[then("the request used the foot profile")]
fn used_foot_profile(#[from(service)] service: &ServiceCell) {
    let service = service.borrow();
    let line = service.request_line.as_deref().expect("request received");
    assert!(line.starts_with("GET /route/v1/foot/"), "got {line}");
    assert!(line.contains("geometries=polyline"), "got {line}");
}

#[then("a NoRoute service error is returned")]
fn no_route_error(#[from(routes)] routes: &RoutesCell) {
    let borrowed = routes.borrow();
    assert!(
        matches!(
            borrowed.as_ref(),
            Some(Err(ProviderError::ServiceError { code, .. })) if code == "NoRoute"
        ),
        "expected NoRoute, got {borrowed:?}"
    );
}

#[then("a network error is returned")]
fn network_error(#[from(routes)] routes: &RoutesCell) {
    let borrowed = routes.borrow();
    assert!(
        matches!(borrowed.as_ref(), Some(Err(ProviderError::NetworkError { .. }))),
        "expected NetworkError, got {borrowed:?}"
    );
}

#[then("the report score is 72")]
fn report_score(#[from(report)] report: &ReportCell) {
    let borrowed = report.borrow();
    let report = borrowed
        .as_ref()
        .expect("request made")
        .as_ref()
        .expect("expected Ok result");
    assert!((report.score - 72.0).abs() < f64::EPSILON);
    assert_eq!(report.factors.populated_dimensions(), 2);
}

#[then("an HTTP error with status 503 is returned")]
fn http_error(#[from(report)] report: &ReportCell) {
    let borrowed = report.borrow();
    assert!(
        matches!(
            borrowed.as_ref(),
            Some(Err(ProviderError::HttpError { status: 503, .. }))
        ),
        "expected HTTP 503, got {borrowed:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/http_providers.feature", name = $title)]
        fn $fn_name(service: ServiceCell, routes: RoutesCell, report: ReportCell) {
            let _ = (service, routes, report);
        }
    };
}

register_scenario!(osrm_directions, "fetching walking directions from OSRM");
register_scenario!(osrm_reports_no_route, "OSRM reports no route");
register_scenario!(osrm_unreachable, "the routing service is unreachable");
register_scenario!(area_report, "fetching an area report");
register_scenario!(reputation_failure, "the reputation service fails");
