pub mod join_properties_test;
pub mod stream_join_scenarios_test;
