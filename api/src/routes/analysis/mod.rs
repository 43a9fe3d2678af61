pub mod results_response;
pub mod results_route;
pub mod status_response;
pub mod status_route;
pub mod submit_request;
pub mod submit_response;
pub mod submit_route;

pub use results_route::get_results_route;
pub use status_route::get_status_route;
pub use submit_route::submit_analysis_route;
