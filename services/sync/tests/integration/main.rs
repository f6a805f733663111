mod api_test;
mod helpers;
mod pull_test;
mod push_test;
mod scenario_test;
mod status_test;
